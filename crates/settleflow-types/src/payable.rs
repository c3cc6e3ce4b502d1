//! Generalized payable types — the source-agnostic approval path.
//!
//! A `Payable` wraps any obligation-like document (supply contract,
//! logistics statement, expense claim) behind one lifecycle:
//!
//! ```text
//! PENDING ──approve──► APPROVED ──add_to_pool──► IN_POOL ──full payment──► PAID
//!    │
//!    ├─reject (reason, callback)──► REJECTED
//!    └─cancel (creator)───────────► CANCELLED
//! ```
//!
//! Rejection and full payment notify the originating module through the
//! per-source callback registry.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, PayableId, PayeeSnapshot, PoolId};

/// The module a payable originated from. Closed set — unregistered source
/// types fail loudly at callback dispatch rather than silently no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum SourceType {
    SupplyContract,
    Logistics,
    Expense,
    Other,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SupplyContract => write!(f, "SUPPLY_CONTRACT"),
            Self::Logistics => write!(f, "LOGISTICS"),
            Self::Expense => write!(f, "EXPENSE"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// Lifecycle status of a payable. Forward-only; no resurrection from
/// `PAID`, `REJECTED` or `CANCELLED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum PayableStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    InPool,
    Paid,
}

impl std::fmt::Display for PayableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::InPool => write!(f, "IN_POOL"),
            Self::Paid => write!(f, "PAID"),
        }
    }
}

/// A generalized payable obligation under approval-workflow governance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payable {
    pub id: PayableId,
    pub source_type: SourceType,
    /// Id of the originating document in its own module.
    pub source_id: Uuid,
    pub payee: PayeeSnapshot,
    pub payable_amount: Decimal,
    pub paid_amount: Decimal,
    pub currency: Currency,
    pub status: PayableStatus,
    /// Required when `status == REJECTED`.
    pub rejection_reason: Option<String>,
    /// Set when the payable is admitted to a disbursement pool.
    pub pool_id: Option<PoolId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payable {
    #[must_use]
    pub fn new(
        source_type: SourceType,
        source_id: Uuid,
        payee: PayeeSnapshot,
        payable_amount: Decimal,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PayableId::new(),
            source_type,
            source_id,
            payee,
            payable_amount,
            paid_amount: Decimal::ZERO,
            currency,
            status: PayableStatus::Pending,
            rejection_reason: None,
            pool_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amount still owed.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.payable_amount - self.paid_amount
    }

    /// Full payment is defined as exact coverage.
    #[must_use]
    pub fn is_fully_paid(&self) -> bool {
        self.paid_amount == self.payable_amount
    }

    /// Whether payments may currently be applied.
    #[must_use]
    pub fn is_payable(&self) -> bool {
        matches!(self.status, PayableStatus::Approved | PayableStatus::InPool)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Payable {
    pub fn dummy(source_type: SourceType, amount: Decimal) -> Self {
        Self::new(
            source_type,
            Uuid::now_v7(),
            PayeeSnapshot::dummy(),
            amount,
            crate::constants::DEFAULT_CURRENCY.to_string(),
        )
    }
}
