//! Storage contracts consumed by the routing pipeline.
//!
//! The core treats persistence as an interface: any backend that honors
//! these traits can serve the pipeline. The `memory` module provides the
//! `DashMap`-backed implementations used for tests and single-node
//! deployments.

pub mod alert;
pub mod error;
pub mod idempotency;
pub mod memory;
pub mod rule;
pub mod service;

pub use alert::AlertStore;
pub use error::StoreError;
pub use idempotency::IdempotencyStore;
pub use memory::{
    MemoryAlertStore, MemoryIdempotencyStore, MemoryRuleStore, MemoryServiceStore,
};
pub use rule::RuleStore;
pub use service::ServiceStore;
