//! Disbursement queue types: pool entries, batching pools, and the
//! tier-3 payment execution record.
//!
//! A `PoolEntry` is an approved, not-yet-paid amount waiting in the queue.
//! Each entry back-references exactly one settlement statement or payable.
//! Entries become immutable once `PAID`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BankAccount, EntryId, ExecutionId, PayableId, PoolId, SourceType, StatementId};

/// Commercial flavor of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum EntryType {
    Deposit,
    Balance,
    Prepay,
    Other,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deposit => write!(f, "DEPOSIT"),
            Self::Balance => write!(f, "BALANCE"),
            Self::Prepay => write!(f, "PREPAY"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// Status of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum EntryStatus {
    PendingApproval,
    Paid,
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingApproval => write!(f, "PENDING_APPROVAL"),
            Self::Paid => write!(f, "PAID"),
        }
    }
}

/// Back-reference to the entity a queue entry disburses against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryRef {
    Statement(StatementId),
    Payable(PayableId),
}

impl std::fmt::Display for EntryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Statement(id) => write!(f, "{id}"),
            Self::Payable(id) => write!(f, "{id}"),
        }
    }
}

/// An approved, not-yet-paid amount in the disbursement queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    pub id: EntryId,
    pub entry_ref: EntryRef,
    pub amount: Decimal,
    pub entry_type: EntryType,
    /// Higher priority is worked first.
    pub priority: u32,
    pub status: EntryStatus,
    /// The batching pool this entry belongs to, if any.
    pub pool_id: Option<PoolId>,
    pub created_at: DateTime<Utc>,
}

impl PoolEntry {
    #[must_use]
    pub fn new(entry_ref: EntryRef, amount: Decimal, entry_type: EntryType, priority: u32) -> Self {
        Self {
            id: EntryId::new(),
            entry_ref,
            amount,
            entry_type,
            priority,
            status: EntryStatus::PendingApproval,
            pool_id: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == EntryStatus::Paid
    }
}

/// A batching pool container, keyed by source type and accounting period.
///
/// `total_amount` / `total_count` are derived values, recomputed from member
/// entries alongside every entry mutation — never incremented independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisbursementPool {
    pub id: PoolId,
    pub source_type: SourceType,
    /// Accounting period, `YYYY-MM`.
    pub period: String,
    pub total_amount: Decimal,
    pub total_count: usize,
    pub created_at: DateTime<Utc>,
}

impl DisbursementPool {
    #[must_use]
    pub fn new(source_type: SourceType, period: impl Into<String>) -> Self {
        Self {
            id: PoolId::new(),
            source_type,
            period: period.into(),
            total_amount: Decimal::ZERO,
            total_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// A batched payment execution consuming one or more queue entries
/// atomically together. A bookkeeping event, not a bank transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentExecution {
    pub id: ExecutionId,
    pub total_amount: Decimal,
    pub bank_account: BankAccount,
    pub entry_ids: Vec<EntryId>,
    pub executed_at: DateTime<Utc>,
}

impl PaymentExecution {
    #[must_use]
    pub fn new(total_amount: Decimal, bank_account: BankAccount, entry_ids: Vec<EntryId>) -> Self {
        Self {
            id: ExecutionId::deterministic(&entry_ids),
            total_amount,
            bank_account,
            entry_ids,
            executed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_pending() {
        let entry = PoolEntry::new(
            EntryRef::Statement(StatementId::new()),
            Decimal::new(3000, 0),
            EntryType::Balance,
            0,
        );
        assert_eq!(entry.status, EntryStatus::PendingApproval);
        assert!(!entry.is_paid());
        assert!(entry.pool_id.is_none());
    }

    #[test]
    fn new_pool_has_zero_totals() {
        let pool = DisbursementPool::new(SourceType::Logistics, "2026-08");
        assert_eq!(pool.total_amount, Decimal::ZERO);
        assert_eq!(pool.total_count, 0);
    }

    #[test]
    fn execution_id_is_deterministic_over_entries() {
        let e1 = EntryId::new();
        let e2 = EntryId::new();
        let acct = BankAccount::new("h", "b", "a");
        let x = PaymentExecution::new(Decimal::ONE, acct.clone(), vec![e1, e2]);
        let y = PaymentExecution::new(Decimal::ONE, acct, vec![e2, e1]);
        assert_eq!(x.id, y.id);
    }

    #[test]
    fn entry_status_display() {
        assert_eq!(format!("{}", EntryStatus::PendingApproval), "PENDING_APPROVAL");
        assert_eq!(format!("{}", EntryType::Balance), "BALANCE");
    }
}
