//! Matching plans — the preview produced by `match_declaration`.
//!
//! A plan is pure data: nothing in it mutates engine state. `confirm_match`
//! recomputes a fresh plan under current data and commits that one, so a
//! preview may go stale without harm.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use settleflow_types::{DeclarationId, DeclarationItemId, InvoiceId, InvoiceLineId};

/// One planned consumption: take `quantity` from an invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTake {
    pub invoice_id: InvoiceId,
    pub invoice_line_id: InvoiceLineId,
    pub quantity: Decimal,
}

/// Per-item verdict of the greedy pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemOutcome {
    /// The full required quantity was covered.
    Satisfied,
    /// Eligible invoice quantity fell short by this much. The partial plan
    /// is discarded, never committed.
    Shortfall { available: Decimal, shortfall: Decimal },
    /// The item's product has no declared commodity name in the catalog.
    MissingMapping,
}

/// The plan for one declaration item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPlan {
    pub item_id: DeclarationItemId,
    pub commodity: Option<String>,
    pub required_qty: Decimal,
    pub outcome: ItemOutcome,
    /// Non-empty only when `outcome` is `Satisfied`.
    pub takes: Vec<PlannedTake>,
}

impl ItemPlan {
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.outcome == ItemOutcome::Satisfied
    }
}

/// The full preview for a declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPreview {
    pub declaration_id: DeclarationId,
    pub items: Vec<ItemPlan>,
}

impl MatchPreview {
    /// Whether every item can be fully satisfied.
    #[must_use]
    pub fn is_matchable(&self) -> bool {
        self.items.iter().all(ItemPlan::is_satisfied)
    }

    /// Number of items that failed (shortfall or missing mapping).
    #[must_use]
    pub fn failed_items(&self) -> usize {
        self.items.iter().filter(|p| !p.is_satisfied()).count()
    }
}
