//! Step definitions for task gate scenarios.

mod given;
mod then;
mod when;
pub mod world;
