use thiserror::Error;

use crate::signature::SignatureError;

/// Errors produced while admitting a webhook request.
#[derive(Debug, Error)]
pub enum IngressError {
    /// Signature verification failed. Maps to 401.
    #[error("signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    /// The integration key resolved to no (enabled) service. Maps to 401.
    #[error("unknown integration key")]
    UnknownIntegration,

    /// The payload failed schema validation. Maps to 400.
    #[error("invalid payload: {0}")]
    Validation(String),

    /// The request was already processed. Maps to 409.
    #[error("duplicate request")]
    Duplicate,
}
