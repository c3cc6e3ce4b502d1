//! # settleflow-matching
//!
//! **Rebate Substantiation Plane**: matches export-declaration line-item
//! quantities against a pool of incoming tax invoices using a greedy,
//! chronological (oldest invoice first), all-or-nothing algorithm.
//!
//! ## Architecture
//!
//! 1. **MatchingEngine**: owns invoices, declarations and match records;
//!    `match_declaration` previews, `confirm_match` commits,
//!    `cancel_match` inverts
//! 2. **CommodityCatalog**: the capability seam resolving a `ProductId` to
//!    the declared commodity name on fiscal documents
//! 3. **MatchPreview / ItemPlan**: pure plan data, per-item outcomes
//!
//! ## Matching Flow
//!
//! ```text
//! match_declaration() → MatchPreview (pure, per-item outcomes)
//! confirm_match()     → recompute under current data → MatchRecords
//!                       + invoice status recompute + PRE_DECLARED
//! cancel_match()      → delete records + recompute → EDITABLE
//! ```
//!
//! Confirmation is all-or-nothing across the whole declaration: a single
//! short item leaves zero records behind.

pub mod catalog;
pub mod engine;
pub mod plan;

pub use catalog::{CommodityCatalog, StaticCatalog};
pub use engine::MatchingEngine;
pub use plan::{ItemOutcome, ItemPlan, MatchPreview, PlannedTake};
