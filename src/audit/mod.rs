//! Append-only audit ledger for board mutations.
//!
//! Entries are written after the store accepts a mutation and are never
//! changed afterwards. Queries return the newest entries first.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use domain::{AuditAction, AuditEntry, AuditQuery, DEFAULT_AUDIT_LIMIT, ParseAuditActionError};
pub use ports::{AuditError, AuditLedger, AuditResult};
