use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Error type that captures the core's failure taxonomy.
///
/// `Validation`, `NotFound`, and `Conflict` are rejected before any write is
/// applied. `Configuration` signals incomplete automation settings and is a
/// normal data-completeness state rather than a fault.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("configuration: {0}")]
    Configuration(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CoreError {
    /// True for failures the caller should treat as "already done" or
    /// "not allowed" rather than escalate.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Conflict(_))
    }
}
