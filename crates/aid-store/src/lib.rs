//! Transactional ledger store for the mutual-aid engagement service.
//!
//! The engagement components never touch rows directly: every mutation runs
//! inside a [`LedgerTransaction`] that holds row-level locks on the affected
//! cause (and, for enrollment reviews, the enrollment) for the whole
//! read-count-write sequence.
//!
//! # Storage Backends
//!
//! All backends implement the [`LedgerStore`] trait:
//!
//! - [`InMemoryLedgerStore`] -- `HashMap`-based store with per-row async locks
//!
//! # Design Rules
//!
//! 1. Derived counters are written in the same transaction as the rows they
//!    count.
//! 2. Lock order is cause row, then enrollment row.
//! 3. Writes become visible atomically at commit; dropping a transaction
//!    rolls it back.
//! 4. Lock waits are bounded; a timeout is an error, never a silent skip.

pub mod config;
pub mod error;
pub mod memory;
pub mod traits;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryLedgerStore, MemoryTransaction};
pub use traits::{LedgerStore, LedgerTransaction};
