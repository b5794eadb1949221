//! The routing gateway: one alert in, rule evaluations and action results
//! out.
//!
//! `Gateway::process` is the pipeline a webhook handler calls once per
//! normalized alert: dedup upsert, rule evaluation, in-order action
//! execution, and a best-effort audit record.

pub mod builder;
pub mod context;
pub mod error;
pub mod gateway;

pub use builder::GatewayBuilder;
pub use context::{ContextResolver, NoopContextResolver, ResolvedContext};
pub use error::GatewayError;
pub use gateway::{Gateway, ProcessedAlert};
