use thiserror::Error;

use alertflow_store::StoreError;

/// Errors surfaced by the gateway pipeline.
///
/// Action failures are not errors here: they are recorded per-action in
/// the returned results. Only faults that prevent the pipeline from
/// running at all (storage) surface as `GatewayError`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A storage backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The gateway was built with an incomplete configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
