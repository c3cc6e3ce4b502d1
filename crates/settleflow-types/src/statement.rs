//! Settlement statement types — the tier-2 aggregates.
//!
//! A statement groups same-counterparty obligations into one billable unit.
//! `payment_status` and the per-detail `allocated_payment` are derived state,
//! written only by the Disbursement Executor.
//!
//! Conservation invariant, enforced after every payment round:
//! ```text
//! statement.paid_amount == Σ detail.allocated_payment   (exact)
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CounterpartyId, Currency, ObligationId, Result, SettleflowError, StatementId};

/// Derived payment progress of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unpaid => write!(f, "UNPAID"),
            Self::Partial => write!(f, "PARTIAL"),
            Self::Paid => write!(f, "PAID"),
        }
    }
}

/// One detail row per underlying obligation.
///
/// Invariant: `0 ≤ allocated_payment ≤ source_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementDetail {
    pub obligation_id: ObligationId,
    /// The obligation's amount at aggregation time.
    pub source_amount: Decimal,
    /// Cumulative payment back-allocated to this obligation.
    pub allocated_payment: Decimal,
}

impl SettlementDetail {
    #[must_use]
    pub fn new(obligation_id: ObligationId, source_amount: Decimal) -> Self {
        Self {
            obligation_id,
            source_amount,
            allocated_payment: Decimal::ZERO,
        }
    }

    /// Unallocated headroom on this detail.
    #[must_use]
    pub fn headroom(&self) -> Decimal {
        self.source_amount - self.allocated_payment
    }
}

/// An aggregated, billable settlement statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementStatement {
    pub id: StatementId,
    pub counterparty: CounterpartyId,
    pub currency: Currency,
    pub total_payable: Decimal,
    pub paid_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub details: Vec<SettlementDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SettlementStatement {
    /// Build a fresh, unpaid statement over the given (obligation, amount)
    /// pairs. `total_payable` is the sum of the source amounts.
    #[must_use]
    pub fn new(
        counterparty: CounterpartyId,
        currency: Currency,
        sources: Vec<(ObligationId, Decimal)>,
    ) -> Self {
        let total_payable = sources.iter().map(|(_, amt)| *amt).sum();
        let details = sources
            .into_iter()
            .map(|(id, amt)| SettlementDetail::new(id, amt))
            .collect();
        let now = Utc::now();
        Self {
            id: StatementId::new(),
            counterparty,
            currency,
            total_payable,
            paid_amount: Decimal::ZERO,
            payment_status: PaymentStatus::Unpaid,
            details,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amount still owed on this statement.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.total_payable - self.paid_amount
    }

    #[must_use]
    pub fn is_fully_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Sum of all detail allocations.
    #[must_use]
    pub fn allocated_total(&self) -> Decimal {
        self.details.iter().map(|d| d.allocated_payment).sum()
    }

    /// Verify the conservation invariant: `paid_amount == Σ allocated`.
    ///
    /// # Errors
    /// Returns [`SettleflowError::AllocationDrift`] on any discrepancy.
    pub fn verify_conservation(&self) -> Result<()> {
        let allocated = self.allocated_total();
        if allocated != self.paid_amount {
            return Err(SettleflowError::AllocationDrift {
                statement: self.id,
                paid: self.paid_amount,
                allocated,
            });
        }
        Ok(())
    }
}
