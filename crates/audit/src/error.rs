use thiserror::Error;

/// Errors surfaced by audit storage backends.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backend could not persist or serve records.
    #[error("audit backend error: {0}")]
    Backend(String),
}
