//! Approval workflow for generalized payables.
//!
//! Only a `PENDING` payable may be approved, rejected or cancelled.
//! Rejection requires a reason and fires the source module's `on_rejected`
//! callback; reaching exact full payment fires `on_paid`. Callbacks run on
//! the staged (post-transition) payable *before* anything is committed, so
//! a callback failure leaves the payable untouched.

use std::collections::HashMap;

use rust_decimal::Decimal;
use settleflow_types::{
    constants, Currency, EntryRef, EntryType, Payable, PayableId, PayableStatus, PayeeSnapshot,
    PoolId, Result, SettleflowError, SourceType,
};
use uuid::Uuid;

use crate::callback::CallbackRegistry;
use crate::queue::DisbursementQueue;

/// A reviewer's decision on a pending payable.
#[derive(Debug, Clone)]
pub enum ApprovalDecision {
    /// Approve; optionally admit to a disbursement pool in the same step.
    /// `pool: None` with `add_to_pool: true` resolves the lazy default pool
    /// for the payable's source type and the current period.
    Approve {
        add_to_pool: bool,
        pool: Option<PoolId>,
    },
    /// Reject with a mandatory reason.
    Reject { reason: String },
}

/// Owns the generalized payables and drives their lifecycle.
pub struct PayableBook {
    payables: HashMap<PayableId, Payable>,
}

impl PayableBook {
    /// Create an empty payable book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            payables: HashMap::new(),
        }
    }

    /// Create a payable submitted by a source module.
    ///
    /// # Errors
    /// - `InvalidAmount` for a non-positive amount
    /// - `InvalidPayee` for an incomplete payee / bank snapshot
    pub fn create_payable(
        &mut self,
        source_type: SourceType,
        source_id: Uuid,
        payee: PayeeSnapshot,
        payable_amount: Decimal,
        currency: Currency,
    ) -> Result<PayableId> {
        if payable_amount <= Decimal::ZERO {
            return Err(SettleflowError::InvalidAmount {
                reason: format!("payable amount must be positive, got {payable_amount}"),
            });
        }
        if payee.name.is_empty() || !payee.account.is_complete() {
            return Err(SettleflowError::InvalidPayee {
                reason: "payee name and full bank snapshot are required".into(),
            });
        }

        let payable = Payable::new(source_type, source_id, payee, payable_amount, currency);
        let id = payable.id;
        tracing::info!(payable = %id, source = %source_type, amount = %payable_amount, "Payable created");
        self.payables.insert(id, payable);
        Ok(id)
    }

    /// Approve or reject a `PENDING` payable.
    ///
    /// # Errors
    /// - `PayableNotFound` / `PayableNotPending`
    /// - `MissingRejectionReason` on a reason-less rejection
    /// - `CallbackNotRegistered` / `CallbackFailed` on rejection dispatch
    /// - `PoolNotFound` when an explicit pool id does not exist
    pub fn approve_payable(
        &mut self,
        queue: &mut DisbursementQueue,
        callbacks: &mut CallbackRegistry,
        id: PayableId,
        decision: ApprovalDecision,
        actor: &str,
    ) -> Result<PayableStatus> {
        let payable = self.expect(id)?;
        if payable.status != PayableStatus::Pending {
            return Err(SettleflowError::PayableNotPending {
                id,
                status: payable.status,
            });
        }

        match decision {
            ApprovalDecision::Approve { add_to_pool, pool } => {
                // Validate the target pool up front so a failed admission
                // cannot leave the payable stranded in APPROVED.
                if add_to_pool {
                    if let Some(pool_id) = pool {
                        if queue.pool(pool_id).is_none() {
                            return Err(SettleflowError::PoolNotFound(pool_id));
                        }
                    }
                }
                let mut staged = payable.clone();
                staged.status = PayableStatus::Approved;
                staged.updated_at = chrono::Utc::now();
                let status = staged.status;
                self.commit(staged);
                tracing::info!(payable = %id, actor, "Payable approved");

                if add_to_pool {
                    return self.add_to_pool(queue, id, pool);
                }
                Ok(status)
            }
            ApprovalDecision::Reject { reason } => {
                if reason.trim().is_empty() {
                    return Err(SettleflowError::MissingRejectionReason);
                }
                let mut staged = payable.clone();
                staged.status = PayableStatus::Rejected;
                staged.rejection_reason = Some(reason.clone());
                staged.updated_at = chrono::Utc::now();

                // Callback first: a failing handler must leave the payable
                // in PENDING with no reason recorded.
                callbacks.dispatch_rejected(&staged)?;

                self.commit(staged);
                tracing::warn!(payable = %id, actor, reason, "Payable rejected");
                Ok(PayableStatus::Rejected)
            }
        }
    }

    /// Withdraw a mis-filed `PENDING` payable before review. No callback.
    ///
    /// # Errors
    /// - `PayableNotFound` / `PayableNotPending`
    pub fn cancel_payable(&mut self, id: PayableId, actor: &str) -> Result<()> {
        let payable = self.expect(id)?;
        if payable.status != PayableStatus::Pending {
            return Err(SettleflowError::PayableNotPending {
                id,
                status: payable.status,
            });
        }
        let mut staged = payable.clone();
        staged.status = PayableStatus::Cancelled;
        staged.updated_at = chrono::Utc::now();
        self.commit(staged);
        tracing::info!(payable = %id, actor, "Payable cancelled");
        Ok(())
    }

    /// Admit an `APPROVED` payable to a disbursement pool, enqueueing its
    /// remaining amount as a `BALANCE` entry.
    ///
    /// # Errors
    /// - `PayableNotFound` / `PayableNotApproved`
    /// - `PoolNotFound` when an explicit pool id does not exist
    pub fn add_to_pool(
        &mut self,
        queue: &mut DisbursementQueue,
        id: PayableId,
        pool: Option<PoolId>,
    ) -> Result<PayableStatus> {
        let payable = self.expect(id)?;
        if payable.status != PayableStatus::Approved {
            return Err(SettleflowError::PayableNotApproved {
                id,
                status: payable.status,
            });
        }

        let pool_id = match pool {
            Some(pool_id) => {
                if queue.pool(pool_id).is_none() {
                    return Err(SettleflowError::PoolNotFound(pool_id));
                }
                pool_id
            }
            None => queue.default_pool_for(payable.source_type),
        };

        let remaining = payable.remaining();
        queue.enqueue(
            EntryRef::Payable(id),
            remaining,
            EntryType::Balance,
            constants::DEFAULT_ENTRY_PRIORITY,
            Some(pool_id),
        )?;

        let mut staged = self.expect(id)?.clone();
        staged.status = PayableStatus::InPool;
        staged.pool_id = Some(pool_id);
        staged.updated_at = chrono::Utc::now();
        self.commit(staged);

        tracing::info!(payable = %id, pool = %pool_id, amount = %remaining, "Payable added to pool");
        Ok(PayableStatus::InPool)
    }

    /// Apply a payment to an `APPROVED` or `IN_POOL` payable.
    ///
    /// Accumulates `paid_amount`; transitions to `PAID` only at exact full
    /// coverage, at which point the source module's `on_paid` callback fires
    /// exactly once — before the new state is committed.
    ///
    /// # Errors
    /// - `PayableNotFound` / `PayableNotPayable`
    /// - `InvalidAmount` for a non-positive amount
    /// - `OverPayment` if the amount exceeds the remaining balance
    /// - `CallbackNotRegistered` / `CallbackFailed` on completion dispatch
    pub fn mark_as_paid(
        &mut self,
        callbacks: &mut CallbackRegistry,
        id: PayableId,
        amount: Decimal,
    ) -> Result<PayableStatus> {
        let staged = self.stage_payment(id, amount)?;
        if staged.is_fully_paid() {
            callbacks.dispatch_paid(&staged)?;
        }
        let status = staged.status;
        let paid = staged.paid_amount;
        self.commit(staged);
        tracing::info!(payable = %id, %amount, total_paid = %paid, %status, "Payment recorded");
        Ok(status)
    }

    /// Validate a payment and produce the post-payment payable without
    /// committing it. Used by `mark_as_paid` and by the batch executor's
    /// two-phase commit.
    pub(crate) fn stage_payment(&self, id: PayableId, amount: Decimal) -> Result<Payable> {
        let payable = self.expect(id)?;
        if !payable.is_payable() {
            return Err(SettleflowError::PayableNotPayable {
                id,
                status: payable.status,
            });
        }
        if amount <= Decimal::ZERO {
            return Err(SettleflowError::InvalidAmount {
                reason: format!("payment amount must be positive, got {amount}"),
            });
        }
        let remaining = payable.remaining();
        if amount > remaining {
            return Err(SettleflowError::OverPayment {
                id,
                attempted: amount,
                remaining,
            });
        }

        let mut staged = payable.clone();
        staged.paid_amount += amount;
        if staged.is_fully_paid() {
            staged.status = PayableStatus::Paid;
        }
        staged.updated_at = chrono::Utc::now();
        Ok(staged)
    }

    /// Write a staged payable back. Infallible by construction.
    pub(crate) fn commit(&mut self, payable: Payable) {
        self.payables.insert(payable.id, payable);
    }

    /// Look up a payable by id.
    #[must_use]
    pub fn payable(&self, id: PayableId) -> Option<&Payable> {
        self.payables.get(&id)
    }

    /// Look up a payable, failing with `PayableNotFound`.
    pub fn expect(&self, id: PayableId) -> Result<&Payable> {
        self.payables
            .get(&id)
            .ok_or(SettleflowError::PayableNotFound(id))
    }

    /// Number of payables tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payables.len()
    }

    /// Whether the book holds no payables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payables.is_empty()
    }
}

impl Default for PayableBook {
    fn default() -> Self {
        Self::new()
    }
}
