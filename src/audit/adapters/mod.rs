//! Audit ledger adapters.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlAuditLedger;
pub use memory::InMemoryAuditLedger;
