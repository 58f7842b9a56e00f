use thiserror::Error;

/// Errors returned by [`TopKTracker`](crate::TopKTracker).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// The identity key was empty. Nothing was counted.
    #[error("identity key must not be empty")]
    InvalidKey,
}
