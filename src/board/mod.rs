//! Shared task board for agents and humans.
//!
//! Tasks move through a fixed set of columns under dependency and review
//! gates, failed tasks retry a bounded number of times, and completed tasks
//! may spawn a successor. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
