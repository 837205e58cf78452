//! Store adapters for the board.
//!
//! Both adapters share the same collection semantics; they differ only in
//! where the serialized collections live.

mod collection;
pub mod json_file;
pub mod memory;
