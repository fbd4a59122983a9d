use fleet_core::repository::BoxError;
use fleet_core::transitions::InvalidTransition;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("booking not found: {0}")]
    NotFound(Uuid),

    #[error("booking {0} does not belong to the requesting customer")]
    Forbidden(Uuid),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The store's conditional write lost a race: the booking changed between
    /// the read and the write. Benign for the sweep, retryable for callers.
    #[error("booking {0} changed concurrently, transition not applied")]
    Conflict(Uuid),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("{operation} failed: {source}")]
    Dependency {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
}
