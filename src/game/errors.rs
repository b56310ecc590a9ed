use thiserror::Error;

/// Errors that can arise while running game operations.
///
/// Every variant is recovered where it occurs and rendered as a chat
/// reply; none of these crash the process.
#[derive(Debug, Error)]
pub enum GameError {
    /// A non-admin invoked an admin-only operation.
    #[error("permission denied")]
    PermissionDenied,

    /// Unknown room, player or category.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate display name, identical swap players, room already open.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The allocator cannot satisfy a draw after exclusions.
    #[error("not enough unique values in the pool: need {needed}, have {available}")]
    PoolExhausted { needed: usize, available: usize },

    /// Empty or malformed free-text input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Wrapper around the relational store's error type.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
