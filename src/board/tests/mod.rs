//! Unit tests for the board module.
//!
//! Domain rules are tested directly; store, lifecycle, and service
//! behaviour runs against the in-memory store. File store specifics live
//! in the integration tests.

mod store_tests;
