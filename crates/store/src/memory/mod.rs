//! `DashMap`-backed in-memory store implementations.
//!
//! Used by tests and single-node deployments. TTL handling is lazy: expired
//! idempotency entries are treated as absent on access and physically
//! removed by the periodic cleanup sweep.

mod alert;
mod idempotency;
mod rule;
mod service;

pub use alert::MemoryAlertStore;
pub use idempotency::MemoryIdempotencyStore;
pub use rule::MemoryRuleStore;
pub use service::MemoryServiceStore;
