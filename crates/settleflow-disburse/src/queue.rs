//! The disbursement queue — approved, not-yet-paid amounts.
//!
//! Entries reference exactly one settlement statement or payable. Amounts
//! may be adjusted only while `PENDING_APPROVAL`; a `PAID` entry is
//! immutable. Batching pools are created lazily per (source type, period)
//! and their running totals are derived values, recomputed from member
//! entries on every mutation — never incremented independently.

use std::collections::HashMap;

use rust_decimal::Decimal;
use settleflow_types::{
    DisbursementPool, EngineConfig, EntryId, EntryRef, EntryStatus, EntryType, PoolEntry, PoolId,
    Result, SettleflowError, SourceType,
};

/// Holds queue entries and batching pools.
pub struct DisbursementQueue {
    entries: HashMap<EntryId, PoolEntry>,
    pools: HashMap<PoolId, DisbursementPool>,
    /// Lazy default-pool index: (source type, period) → pool.
    pool_index: HashMap<(SourceType, String), PoolId>,
    config: EngineConfig,
}

impl DisbursementQueue {
    /// Create an empty queue with the given configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            entries: HashMap::new(),
            pools: HashMap::new(),
            pool_index: HashMap::new(),
            config,
        }
    }

    /// Append a queue entry. If `pool_id` is given the entry joins that
    /// pool and the pool's derived totals are recomputed.
    ///
    /// # Errors
    /// - `InvalidAmount` for a non-positive amount
    /// - `PoolNotFound` if `pool_id` does not exist
    pub fn enqueue(
        &mut self,
        entry_ref: EntryRef,
        amount: Decimal,
        entry_type: EntryType,
        priority: u32,
        pool_id: Option<PoolId>,
    ) -> Result<EntryId> {
        if amount <= Decimal::ZERO {
            return Err(SettleflowError::InvalidAmount {
                reason: format!("queue entry amount must be positive, got {amount}"),
            });
        }
        if let Some(pool_id) = pool_id {
            if !self.pools.contains_key(&pool_id) {
                return Err(SettleflowError::PoolNotFound(pool_id));
            }
        }

        let mut entry = PoolEntry::new(entry_ref, amount, entry_type, priority);
        entry.pool_id = pool_id;
        let id = entry.id;
        self.entries.insert(id, entry);

        if let Some(pool_id) = pool_id {
            self.recompute_pool_totals(pool_id);
        }

        tracing::debug!(
            entry = %id,
            reference = %entry_ref,
            %amount,
            kind = %entry_type,
            "Queue entry added"
        );
        Ok(id)
    }

    /// Adjust the amount of a `PENDING_APPROVAL` entry.
    ///
    /// # Errors
    /// - `EntryNotFound` if the id is unknown
    /// - `EntryNotAdjustable` once the entry is `PAID`
    /// - `InvalidAmount` for a non-positive amount
    pub fn adjust_amount(&mut self, id: EntryId, new_amount: Decimal) -> Result<()> {
        if new_amount <= Decimal::ZERO {
            return Err(SettleflowError::InvalidAmount {
                reason: format!("adjusted amount must be positive, got {new_amount}"),
            });
        }
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(SettleflowError::EntryNotFound(id))?;
        if entry.status != EntryStatus::PendingApproval {
            return Err(SettleflowError::EntryNotAdjustable {
                id,
                status: entry.status,
            });
        }
        entry.amount = new_amount;
        let pool_id = entry.pool_id;
        if let Some(pool_id) = pool_id {
            self.recompute_pool_totals(pool_id);
        }
        Ok(())
    }

    /// Resolve the default pool for a source type in the current period,
    /// creating it lazily on first use.
    pub fn default_pool_for(&mut self, source_type: SourceType) -> PoolId {
        let period = self.config.period();
        if let Some(id) = self.pool_index.get(&(source_type, period.clone())) {
            return *id;
        }
        let pool = DisbursementPool::new(source_type, period.clone());
        let id = pool.id;
        tracing::info!(pool = %id, source = %source_type, period, "Disbursement pool created");
        self.pools.insert(id, pool);
        self.pool_index.insert((source_type, period), id);
        id
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn entry(&self, id: EntryId) -> Option<&PoolEntry> {
        self.entries.get(&id)
    }

    /// Look up an entry, failing with `EntryNotFound`.
    pub fn expect_entry(&self, id: EntryId) -> Result<&PoolEntry> {
        self.entries
            .get(&id)
            .ok_or(SettleflowError::EntryNotFound(id))
    }

    /// Look up a pool by id.
    #[must_use]
    pub fn pool(&self, id: PoolId) -> Option<&DisbursementPool> {
        self.pools.get(&id)
    }

    /// Member entries of a pool, highest priority first, oldest first
    /// within a priority band — the order a disbursement clerk works in.
    #[must_use]
    pub fn entries_for_pool(&self, pool_id: PoolId) -> Vec<&PoolEntry> {
        let mut members: Vec<&PoolEntry> = self
            .entries
            .values()
            .filter(|e| e.pool_id == Some(pool_id))
            .collect();
        members.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        members
    }

    /// Mark an entry paid. Executor-internal: validation happened upstream.
    pub(crate) fn commit_paid(&mut self, id: EntryId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.status = EntryStatus::Paid;
            let pool_id = entry.pool_id;
            if let Some(pool_id) = pool_id {
                self.recompute_pool_totals(pool_id);
            }
        }
    }

    /// Recompute a pool's derived totals from its member entries.
    fn recompute_pool_totals(&mut self, pool_id: PoolId) {
        let (amount, count) = self
            .entries
            .values()
            .filter(|e| e.pool_id == Some(pool_id))
            .fold((Decimal::ZERO, 0usize), |(amt, cnt), e| {
                (amt + e.amount, cnt + 1)
            });
        if let Some(pool) = self.pools.get_mut(&pool_id) {
            pool.total_amount = amount;
            pool.total_count = count;
        }
    }

    /// Number of entries in the queue (any status).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settleflow_types::StatementId;

    fn queue() -> DisbursementQueue {
        DisbursementQueue::new(EngineConfig::with_period("2026-08"))
    }

    fn stmt_ref() -> EntryRef {
        EntryRef::Statement(StatementId::new())
    }

    #[test]
    fn enqueue_and_lookup() {
        let mut q = queue();
        let id = q
            .enqueue(stmt_ref(), Decimal::new(3000, 0), EntryType::Balance, 0, None)
            .unwrap();
        let entry = q.entry(id).unwrap();
        assert_eq!(entry.amount, Decimal::new(3000, 0));
        assert_eq!(entry.status, EntryStatus::PendingApproval);
    }

    #[test]
    fn enqueue_rejects_non_positive_amount() {
        let mut q = queue();
        let err = q
            .enqueue(stmt_ref(), Decimal::ZERO, EntryType::Balance, 0, None)
            .unwrap_err();
        assert!(matches!(err, SettleflowError::InvalidAmount { .. }));
        assert!(q.is_empty());
    }

    #[test]
    fn default_pool_is_lazily_created_once() {
        let mut q = queue();
        let a = q.default_pool_for(SourceType::Logistics);
        let b = q.default_pool_for(SourceType::Logistics);
        assert_eq!(a, b);
        // A different source type gets its own pool.
        let c = q.default_pool_for(SourceType::Expense);
        assert_ne!(a, c);

        let pool = q.pool(a).unwrap();
        assert_eq!(pool.period, "2026-08");
        assert_eq!(pool.source_type, SourceType::Logistics);
    }

    #[test]
    fn pool_totals_are_recomputed_on_mutation() {
        let mut q = queue();
        let pool = q.default_pool_for(SourceType::Logistics);
        let e1 = q
            .enqueue(stmt_ref(), Decimal::new(100, 0), EntryType::Balance, 0, Some(pool))
            .unwrap();
        q.enqueue(stmt_ref(), Decimal::new(250, 0), EntryType::Prepay, 0, Some(pool))
            .unwrap();

        let p = q.pool(pool).unwrap();
        assert_eq!(p.total_amount, Decimal::new(350, 0));
        assert_eq!(p.total_count, 2);

        q.adjust_amount(e1, Decimal::new(150, 0)).unwrap();
        let p = q.pool(pool).unwrap();
        assert_eq!(p.total_amount, Decimal::new(400, 0));
        assert_eq!(p.total_count, 2);
    }

    #[test]
    fn paid_entry_amount_is_frozen() {
        let mut q = queue();
        let id = q
            .enqueue(stmt_ref(), Decimal::new(100, 0), EntryType::Balance, 0, None)
            .unwrap();
        q.commit_paid(id);
        let err = q.adjust_amount(id, Decimal::new(200, 0)).unwrap_err();
        assert!(matches!(err, SettleflowError::EntryNotAdjustable { .. }));
        assert_eq!(q.entry(id).unwrap().amount, Decimal::new(100, 0));
    }

    #[test]
    fn unknown_pool_rejected() {
        let mut q = queue();
        let err = q
            .enqueue(
                stmt_ref(),
                Decimal::ONE,
                EntryType::Balance,
                0,
                Some(PoolId::new()),
            )
            .unwrap_err();
        assert!(matches!(err, SettleflowError::PoolNotFound(_)));
    }

    #[test]
    fn pool_listing_orders_by_priority_then_age() {
        let mut q = queue();
        let pool = q.default_pool_for(SourceType::Other);
        let low_old = q
            .enqueue(stmt_ref(), Decimal::ONE, EntryType::Balance, 1, Some(pool))
            .unwrap();
        let high = q
            .enqueue(stmt_ref(), Decimal::ONE, EntryType::Balance, 5, Some(pool))
            .unwrap();
        let low_new = q
            .enqueue(stmt_ref(), Decimal::ONE, EntryType::Balance, 1, Some(pool))
            .unwrap();

        let order: Vec<EntryId> = q.entries_for_pool(pool).iter().map(|e| e.id).collect();
        assert_eq!(order, vec![high, low_old, low_new]);
    }
}
