//! # queuemesh-broker
//!
//! The storage node: an in-memory keyed store exposed over HTTP, accepting
//! primary writes (with replication fan-out to followers), replica writes,
//! fetches, and promotion (spec.md §4.2, §6).

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod wire;

pub use error::BrokerError;
pub use router::build_router;
pub use state::BrokerState;
