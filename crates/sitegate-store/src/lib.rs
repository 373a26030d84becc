//! sitegate-store: append-only SQLite audit trail for gating decisions.
//!
//! Stores only: timestamp, zone id, missing PPE (comma list), action taken.
//! No images, no identities. The schema itself is the privacy contract, and
//! the crate exposes no update or delete operation.

mod audit;

pub use audit::{AuditLog, AuditRow};
