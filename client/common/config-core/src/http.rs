//! HTTP client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct HttpConfig {
    /// Whole-request timeout
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,

    #[validate(length(min = 1))]
    pub user_agent: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
