use thiserror::Error;

/// Errors returned by store operations.
///
/// All of them are per-operation: the store's in-memory state is left as it
/// was before the failed call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A collaborator call failed; surfaced verbatim, never retried.
    #[error("Remote operation failed: {0}")]
    Remote(#[from] anyhow::Error),

    /// The targeted notification is no longer loaded in the store.
    #[error("Notification not found in store: {0}")]
    NotFound(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),
}
