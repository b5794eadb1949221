//! Webhook ingress: the edge of the routing pipeline.
//!
//! Each producer shape (Alertmanager, Grafana, Generic) gets payload types,
//! schema validation, and normalization into the canonical
//! [`alertflow_core::Alert`]. Shared across shapes: HMAC-SHA256 request
//! signatures compared in constant time, and the idempotency gate that
//! makes webhook delivery at-most-once.

pub mod alertmanager;
pub mod error;
pub mod generic;
pub mod grafana;
pub mod idempotency;
pub mod signature;

pub use alertmanager::{AlertmanagerAlert, AlertmanagerWebhook, normalize_alertmanager};
pub use error::IngressError;
pub use generic::{GenericWebhook, normalize_generic};
pub use grafana::{EvalMatch, GrafanaWebhook, normalize_grafana};
pub use idempotency::{GateOutcome, IdempotencyGate, derive_idempotency_key};
pub use signature::{SignatureError, sign_body, verify_signature};
