use kyber_core::DataKind;
use thiserror::Error;

/// Errors returned when the store refuses a value.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The value is malformed for its kind.
    #[error("{kind} rejected: {reason}")]
    Rejected { kind: DataKind, reason: String },

    /// The value is older than what is already stored.
    #[error("{kind} is stale: stored {stored}, got {got}")]
    Stale { kind: DataKind, stored: u64, got: u64 },

    /// No backend is registered under this name.
    #[error("unknown persister backend: {0}")]
    UnknownBackend(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;
