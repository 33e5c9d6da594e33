//! # queuemesh-coordinator
//!
//! The control-plane service: owns the consistent-hash ring, drives
//! synchronous replication fan-out, runs the health detector and failover
//! controller, and exposes the JSON HTTP surface from spec.md §6.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod wire;

pub use error::RouterError;
pub use router::build_router;
pub use state::CoordinatorState;
