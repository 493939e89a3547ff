//! Store error types.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures of a store backend.
///
/// Missing or expired entries are never reported through this type: they surface as
/// `None` from lookups and `false` from state validation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{store} backend error: {message}")]
    Backend {
        store: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn backend(store: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            store,
            message: message.into(),
        }
    }
}
