//! Obligation types — the tier-1 payable documents.
//!
//! Obligations are created by upstream business flows (procurement
//! deliveries, logistics statements, expense claims). This core mutates them
//! in exactly two ways: the Settlement Aggregator locks them into `SETTLING`,
//! and the Concurrency Guard applies versioned edits while still `PENDING`.
//! An obligation is never deleted once it leaves `PENDING`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, CounterpartyId, Currency, ObligationId};

/// Lifecycle status of an obligation. Transitions are forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ObligationStatus {
    /// Editable, not yet pulled into a settlement.
    Pending,
    /// Locked into a settlement statement; no further edits.
    Settling,
    /// Fully covered by executed payments.
    Settled,
}

impl std::fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Settling => write!(f, "SETTLING"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// One child line of an obligation (e.g., a delivery row on a contract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationLine {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl ObligationLine {
    #[must_use]
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// Line amount, rounded to the monetary scale.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        (self.quantity * self.unit_price).round_dp(constants::AMOUNT_SCALE)
    }
}

/// Core obligation struct. `version` is the optimistic-lock stamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: ObligationId,
    pub counterparty: CounterpartyId,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: ObligationStatus,
    pub lines: Vec<ObligationLine>,
    /// Incremented by exactly 1 on every successful edit.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Obligation {
    #[must_use]
    pub fn new(counterparty: CounterpartyId, amount: Decimal, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: ObligationId::new(),
            counterparty,
            amount,
            currency,
            status: ObligationStatus::Pending,
            lines: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sum of child line amounts (the derived total when lines are present).
    #[must_use]
    pub fn lines_total(&self) -> Decimal {
        self.lines
            .iter()
            .map(ObligationLine::amount)
            .sum::<Decimal>()
            .round_dp(constants::AMOUNT_SCALE)
    }

    /// Whether the obligation may still be edited or aggregated.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ObligationStatus::Pending
    }
}

/// A partial update applied through the Concurrency Guard.
///
/// When `lines` is present the obligation's child lines are fully replaced
/// and `amount` is recomputed from the new lines, overriding any explicit
/// `amount` in the same patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObligationPatch {
    pub amount: Option<Decimal>,
    pub lines: Option<Vec<ObligationLine>>,
}

impl ObligationPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.lines.is_none()
    }

    #[must_use]
    pub fn amount(amount: Decimal) -> Self {
        Self {
            amount: Some(amount),
            lines: None,
        }
    }

    #[must_use]
    pub fn lines(lines: Vec<ObligationLine>) -> Self {
        Self {
            amount: None,
            lines: Some(lines),
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Obligation {
    pub fn dummy(counterparty: CounterpartyId, amount: Decimal) -> Self {
        Self::new(counterparty, amount, constants::DEFAULT_CURRENCY.to_string())
    }
}
