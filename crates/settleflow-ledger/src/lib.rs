//! # settleflow-ledger
//!
//! The **Obligation Ledger**: source of truth for tier-1 payable documents.
//!
//! ## Architecture
//!
//! 1. **ObligationLedger**: versioned in-memory store of obligations
//! 2. **Concurrency Guard**: `update_obligation` rejects stale versions
//!    instead of merging — the caller refetches and retries
//! 3. **Audit log**: every edit appends a before/after `ChangeLog` snapshot
//!
//! ## Edit Flow
//!
//! ```text
//! caller → read obligation (version v) → update_obligation(id, v, patch)
//!        → stale? SF_ERR_300 : apply + version v+1 + ChangeLog row
//! ```
//!
//! The Settlement Aggregator is the only collaborator allowed to move an
//! obligation out of `PENDING` (into `SETTLING`); the Disbursement Executor
//! finishes the lifecycle (`SETTLED`) when the owning statement is paid off.

pub mod store;

pub use store::ObligationLedger;
