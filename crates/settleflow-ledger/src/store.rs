//! Versioned obligation store with optimistic locking and audit snapshots.
//!
//! All mutations are atomic: either the full operation succeeds or the
//! obligation is unchanged. The stale-version check happens before any
//! write; no merge is ever attempted.

use std::collections::HashMap;

use rust_decimal::Decimal;
use settleflow_types::{
    constants, ChangeLog, Obligation, ObligationId, ObligationPatch, ObligationSnapshot,
    ObligationStatus, Result, SettleflowError,
};

/// The source of truth for obligation state.
///
/// The aggregator and executor call into it to lock obligations into a
/// settlement and to finish them once fully paid.
pub struct ObligationLedger {
    /// All obligations indexed by id.
    obligations: HashMap<ObligationId, Obligation>,
    /// Append-only audit trail, oldest first.
    change_log: Vec<ChangeLog>,
}

impl ObligationLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            obligations: HashMap::new(),
            change_log: Vec::new(),
        }
    }

    /// Register an obligation created by an upstream business flow.
    ///
    /// # Errors
    /// Returns `InvalidAmount` for a non-positive amount.
    pub fn register(&mut self, obligation: Obligation) -> Result<ObligationId> {
        if obligation.amount <= Decimal::ZERO {
            return Err(SettleflowError::InvalidAmount {
                reason: format!(
                    "obligation amount must be positive, got {}",
                    obligation.amount
                ),
            });
        }
        let id = obligation.id;
        tracing::debug!(obligation = %id, amount = %obligation.amount, "Obligation registered");
        self.obligations.insert(id, obligation);
        Ok(id)
    }

    /// Look up an obligation by id.
    #[must_use]
    pub fn get(&self, id: ObligationId) -> Option<&Obligation> {
        self.obligations.get(&id)
    }

    /// Look up an obligation, failing with `ObligationNotFound`.
    pub fn expect(&self, id: ObligationId) -> Result<&Obligation> {
        self.obligations
            .get(&id)
            .ok_or(SettleflowError::ObligationNotFound(id))
    }

    /// Apply a versioned edit to a `PENDING` obligation.
    ///
    /// The stale-version check runs first; on mismatch the caller must
    /// refetch and retry. A patch that replaces the child lines recomputes
    /// the obligation amount from the new lines before the after-snapshot is
    /// taken. The version increments by exactly 1 and one [`ChangeLog`] row
    /// is appended.
    ///
    /// # Errors
    /// - `ObligationNotFound` if the id is unknown
    /// - `ObligationLocked` unless the obligation is `PENDING`
    /// - `StaleVersion` on an optimistic-lock mismatch
    /// - `EmptyPatch` / `InvalidAmount` on an invalid patch
    pub fn update_obligation(
        &mut self,
        id: ObligationId,
        expected_version: u64,
        patch: ObligationPatch,
        actor: &str,
        reason: &str,
    ) -> Result<u64> {
        if patch.is_empty() {
            return Err(SettleflowError::EmptyPatch);
        }

        let obligation = self
            .obligations
            .get_mut(&id)
            .ok_or(SettleflowError::ObligationNotFound(id))?;

        if obligation.status != ObligationStatus::Pending {
            return Err(SettleflowError::ObligationLocked {
                id,
                status: obligation.status,
            });
        }

        if obligation.version != expected_version {
            return Err(SettleflowError::StaleVersion {
                id,
                expected: expected_version,
                actual: obligation.version,
            });
        }

        // Validate the effective new amount before touching anything.
        let new_amount = match (&patch.lines, patch.amount) {
            (Some(lines), _) => lines
                .iter()
                .map(settleflow_types::ObligationLine::amount)
                .sum::<Decimal>()
                .round_dp(constants::AMOUNT_SCALE),
            (None, Some(amount)) => amount,
            (None, None) => unreachable!("empty patch rejected above"),
        };
        if new_amount <= Decimal::ZERO {
            return Err(SettleflowError::InvalidAmount {
                reason: format!("patched amount must be positive, got {new_amount}"),
            });
        }

        let before = ObligationSnapshot::from(&*obligation);

        if let Some(lines) = patch.lines {
            obligation.lines = lines;
        }
        obligation.amount = new_amount;
        obligation.version += 1;
        obligation.updated_at = chrono::Utc::now();

        let after = ObligationSnapshot::from(&*obligation);
        let version = obligation.version;
        let row = ChangeLog::record(id, version, actor, reason, before, after)?;
        self.change_log.push(row);

        tracing::info!(
            obligation = %id,
            version,
            actor,
            amount = %new_amount,
            "Obligation updated"
        );
        Ok(version)
    }

    /// Lock a `PENDING` obligation into a settlement (`PENDING → SETTLING`).
    ///
    /// The aggregator validates the whole selection before calling this, so
    /// the state check here is a final guard, not the primary validation.
    ///
    /// # Errors
    /// - `ObligationNotFound` if the id is unknown
    /// - `ObligationNotPending` unless the obligation is `PENDING`
    pub fn mark_settling(&mut self, id: ObligationId) -> Result<()> {
        let obligation = self
            .obligations
            .get_mut(&id)
            .ok_or(SettleflowError::ObligationNotFound(id))?;
        if obligation.status != ObligationStatus::Pending {
            return Err(SettleflowError::ObligationNotPending {
                id,
                status: obligation.status,
            });
        }
        obligation.status = ObligationStatus::Settling;
        obligation.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Finish a `SETTLING` obligation (`SETTLING → SETTLED`) once its
    /// statement is fully paid. Obligations already settled are left alone.
    ///
    /// # Errors
    /// Returns `ObligationNotFound` if the id is unknown.
    pub fn mark_settled(&mut self, id: ObligationId) -> Result<()> {
        let obligation = self
            .obligations
            .get_mut(&id)
            .ok_or(SettleflowError::ObligationNotFound(id))?;
        if obligation.status == ObligationStatus::Settling {
            obligation.status = ObligationStatus::Settled;
            obligation.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    /// The audit trail for one obligation, oldest first.
    #[must_use]
    pub fn history(&self, id: ObligationId) -> Vec<&ChangeLog> {
        self.change_log
            .iter()
            .filter(|row| row.obligation_id == id)
            .collect()
    }

    /// Number of obligations tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.obligations.len()
    }

    /// Whether the ledger holds no obligations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obligations.is_empty()
    }
}

impl Default for ObligationLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settleflow_types::{CounterpartyId, ObligationLine, ObligationPatch};

    fn ledger_with(amount: i64) -> (ObligationLedger, ObligationId) {
        let mut ledger = ObligationLedger::new();
        let id = ledger
            .register(Obligation::dummy(CounterpartyId::new(), Decimal::new(amount, 0)))
            .unwrap();
        (ledger, id)
    }

    #[test]
    fn register_and_get() {
        let (ledger, id) = ledger_with(1000);
        let ob = ledger.get(id).unwrap();
        assert_eq!(ob.amount, Decimal::new(1000, 0));
        assert_eq!(ob.version, 1);
    }

    #[test]
    fn register_rejects_non_positive_amount() {
        let mut ledger = ObligationLedger::new();
        let err = ledger
            .register(Obligation::dummy(CounterpartyId::new(), Decimal::ZERO))
            .unwrap_err();
        assert!(matches!(err, SettleflowError::InvalidAmount { .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn update_bumps_version_and_logs() {
        let (mut ledger, id) = ledger_with(1000);
        let v = ledger
            .update_obligation(
                id,
                1,
                ObligationPatch::amount(Decimal::new(1200, 0)),
                "ops.chen",
                "freight surcharge",
            )
            .unwrap();
        assert_eq!(v, 2);

        let ob = ledger.get(id).unwrap();
        assert_eq!(ob.amount, Decimal::new(1200, 0));
        assert_eq!(ob.version, 2);

        let history = ledger.history(id);
        assert_eq!(history.len(), 1);
        let row = history[0];
        assert_eq!(row.version, 2);
        assert_eq!(row.before.amount, Decimal::new(1000, 0));
        assert_eq!(row.after.amount, Decimal::new(1200, 0));
        assert_eq!(row.actor, "ops.chen");
        assert!(row.verify_digest().unwrap());
    }

    #[test]
    fn stale_version_rejected_without_side_effects() {
        let (mut ledger, id) = ledger_with(1000);
        let err = ledger
            .update_obligation(
                id,
                7,
                ObligationPatch::amount(Decimal::new(1, 0)),
                "ops.chen",
                "stale write",
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SettleflowError::StaleVersion { expected: 7, actual: 1, .. }
        ));

        // Version and amount unchanged, no audit row appended.
        let ob = ledger.get(id).unwrap();
        assert_eq!(ob.version, 1);
        assert_eq!(ob.amount, Decimal::new(1000, 0));
        assert!(ledger.history(id).is_empty());
    }

    #[test]
    fn line_replacement_recomputes_amount() {
        let (mut ledger, id) = ledger_with(1000);
        let lines = vec![
            ObligationLine::new("crates", Decimal::new(10, 0), Decimal::new(35, 0)),
            ObligationLine::new("pallets", Decimal::new(4, 0), Decimal::new(125, 1)), // 12.5
        ];
        ledger
            .update_obligation(id, 1, ObligationPatch::lines(lines), "ops.chen", "re-count")
            .unwrap();

        let ob = ledger.get(id).unwrap();
        // 10×35 + 4×12.5 = 400
        assert_eq!(ob.amount, Decimal::new(40000, 2));
        assert_eq!(ob.lines.len(), 2);
        let history = ledger.history(id);
        assert_eq!(history[0].after.lines.len(), 2);
    }

    #[test]
    fn settling_obligation_is_locked_against_edits() {
        let (mut ledger, id) = ledger_with(1000);
        ledger.mark_settling(id).unwrap();
        let err = ledger
            .update_obligation(
                id,
                1,
                ObligationPatch::amount(Decimal::ONE),
                "ops.chen",
                "too late",
            )
            .unwrap_err();
        assert!(matches!(err, SettleflowError::ObligationLocked { .. }));
    }

    #[test]
    fn empty_patch_rejected() {
        let (mut ledger, id) = ledger_with(1000);
        let err = ledger
            .update_obligation(id, 1, ObligationPatch::default(), "ops.chen", "noop")
            .unwrap_err();
        assert!(matches!(err, SettleflowError::EmptyPatch));
        assert_eq!(ledger.get(id).unwrap().version, 1);
    }

    #[test]
    fn settle_lifecycle_is_forward_only() {
        let (mut ledger, id) = ledger_with(1000);
        ledger.mark_settling(id).unwrap();
        assert_eq!(ledger.get(id).unwrap().status, ObligationStatus::Settling);

        // Cannot lock twice.
        let err = ledger.mark_settling(id).unwrap_err();
        assert!(matches!(err, SettleflowError::ObligationNotPending { .. }));

        ledger.mark_settled(id).unwrap();
        assert_eq!(ledger.get(id).unwrap().status, ObligationStatus::Settled);

        // Idempotent once settled.
        ledger.mark_settled(id).unwrap();
        assert_eq!(ledger.get(id).unwrap().status, ObligationStatus::Settled);
    }

    #[test]
    fn sequential_updates_version_monotonic() {
        let (mut ledger, id) = ledger_with(1000);
        for i in 0..5u64 {
            let v = ledger
                .update_obligation(
                    id,
                    1 + i,
                    ObligationPatch::amount(Decimal::new(1000 + i64::try_from(i).unwrap(), 0)),
                    "ops.chen",
                    "tick",
                )
                .unwrap();
            assert_eq!(v, 2 + i);
        }
        assert_eq!(ledger.history(id).len(), 5);
    }

    #[test]
    fn missing_obligation_errors() {
        let mut ledger = ObligationLedger::new();
        let id = ObligationId::new();
        assert!(matches!(
            ledger.expect(id).unwrap_err(),
            SettleflowError::ObligationNotFound(_)
        ));
        assert!(matches!(
            ledger.mark_settling(id).unwrap_err(),
            SettleflowError::ObligationNotFound(_)
        ));
    }
}
