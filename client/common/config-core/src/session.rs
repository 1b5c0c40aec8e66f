//! Local session marker configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// File holding the fallback cookie between runs
    pub marker_path: PathBuf,
}
