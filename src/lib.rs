//! Taskboard: task lifecycle engine for agent and human task boards.
//!
//! This crate coordinates work items across autonomous agents and humans.
//! Tasks advance through a fixed set of columns, guarded by dependency and
//! review gates, over a file-backed store that serializes writers per
//! collection. Every accepted mutation is recorded in an append-only audit
//! ledger.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (JSON files, memory)
//!
//! # Modules
//!
//! - [`board`]: Projects, tasks, agents, and the lifecycle engine
//! - [`audit`]: Append-only mutation ledger
//! - [`config`]: Environment-driven settings
//! - [`telemetry`]: Tracing subscriber setup

pub mod audit;
pub mod board;
pub mod config;
pub mod telemetry;
