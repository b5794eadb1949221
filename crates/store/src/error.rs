use thiserror::Error;

/// Errors surfaced by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not serve the request (connectivity, I/O, ...).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// The referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}
