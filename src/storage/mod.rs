//! Storage module.
//!
//! Event row models, the `EventStore` seam and the TTL-evicting key-value
//! store used for rate limits and quotas. Persistent backends implement
//! `EventStore` in the host process; this crate ships the in-memory one.

pub mod models;
pub mod store;
pub mod ttl;

pub use models::*;
pub use store::*;
pub use ttl::*;
