//! Writes that invalidate cached reads on success

use crate::cache::QueryCache;
use crate::QueryKey;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// Last observed state of a mutation
#[derive(Debug, Clone)]
pub struct MutationState {
    pub status: MutationStatus,
    pub error: Option<String>,
    /// Keys invalidated by the last successful run
    pub invalidated: Vec<QueryKey>,
}

impl Default for MutationState {
    fn default() -> Self {
        Self {
            status: MutationStatus::Idle,
            error: None,
            invalidated: Vec::new(),
        }
    }
}

impl MutationState {
    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }
}

/// Named mutation handle
///
/// Invalidation runs only after the write succeeds; a failed write leaves
/// the cache untouched.
#[derive(Clone)]
pub struct Mutation {
    cache: QueryCache,
    name: &'static str,
    state: Arc<Mutex<MutationState>>,
}

impl Mutation {
    pub fn new(cache: &QueryCache, name: &'static str) -> Self {
        Self {
            cache: cache.clone(),
            name,
            state: Arc::new(Mutex::new(MutationState::default())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run `write`, then invalidate the keys `invalidates` derives from its result
    pub async fn mutate<T, E, Fut, I>(&self, write: Fut, invalidates: I) -> Result<T, E>
    where
        E: Display,
        Fut: Future<Output = Result<T, E>>,
        I: FnOnce(&T) -> Vec<QueryKey>,
    {
        self.set_state(MutationState {
            status: MutationStatus::Pending,
            ..MutationState::default()
        });

        match write.await {
            Ok(value) => {
                let keys = invalidates(&value);
                let matched = self.cache.invalidate_many(&keys, Some(self.name));
                debug!(
                    mutation = self.name,
                    keys = keys.len(),
                    matched,
                    "Mutation succeeded, queries invalidated"
                );
                self.set_state(MutationState {
                    status: MutationStatus::Success,
                    error: None,
                    invalidated: keys,
                });
                Ok(value)
            }
            Err(e) => {
                warn!(mutation = self.name, error = %e, "Mutation failed");
                self.set_state(MutationState {
                    status: MutationStatus::Error,
                    error: Some(e.to_string()),
                    invalidated: Vec::new(),
                });
                Err(e)
            }
        }
    }

    pub fn state(&self) -> MutationState {
        match self.state.lock() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state().is_pending()
    }

    fn set_state(&self, next: MutationState) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        *state = next;
    }
}
