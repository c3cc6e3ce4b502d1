//! Batched payment execution with proportional back-allocation.
//!
//! `execute_payment` consumes a set of queue entries atomically together.
//! The round runs in three phases: a read-only validation over every entry
//! and its target, a staging phase that computes the post-payment state of
//! every touched statement and payable on clones (callbacks fire here), and
//! an infallible commit. A failure in either of the first two phases leaves
//! the queue, the statements, the payables and the ledger untouched.
//!
//! Back-allocation spreads a statement payment across its detail rows
//! proportionally to their source amounts, rounded to the amount scale.
//! Rounding residue lands on the last row with headroom, and a payment that
//! completes the statement snaps every allocation to its exact source
//! amount, so the conservation invariant
//! `paid_amount == Σ allocated_payment` holds after every round.

use std::collections::HashSet;

use rust_decimal::Decimal;
use settleflow_ledger::ObligationLedger;
use settleflow_types::{
    constants, BankAccount, EntryId, EntryRef, ExecutionId, Payable, PayableId, PaymentExecution,
    PaymentStatus, Result, SettleflowError, SettlementStatement, StatementId,
};

use crate::approval::PayableBook;
use crate::callback::CallbackRegistry;
use crate::queue::DisbursementQueue;
use crate::SettlementBook;

impl SettlementBook {
    /// Execute one payment round over the selected queue entries.
    ///
    /// Entries referencing the same statement or payable are summed into a
    /// single payment against that target. On success:
    /// 1. every selected entry flips to `PAID` and pool totals recompute
    /// 2. each referenced statement absorbs its payment: `paid_amount`
    ///    grows, details are back-allocated, `payment_status` is derived
    /// 3. a statement reaching exact full payment settles its obligations
    /// 4. each referenced payable accumulates `paid_amount`; full payment
    ///    transitions it to `PAID` and fires its source's `on_paid`
    /// 5. one `PaymentExecution` records the batch
    ///
    /// # Errors
    /// - `EmptySelection` / `DuplicateEntrySelection`
    /// - `InvalidAmount` if the batch exceeds the execution cap
    /// - `InvalidPayee` for an incomplete disbursing bank account
    /// - `EntryNotFound` / `EntryAlreadyPaid`
    /// - `StatementNotFound` / `StatementOverPayment`
    /// - `PayableNotFound` / `PayableNotPayable` / `OverPayment`
    /// - `CallbackNotRegistered` / `CallbackFailed` from completion dispatch
    pub fn execute_payment(
        &mut self,
        queue: &mut DisbursementQueue,
        ledger: &mut ObligationLedger,
        payables: &mut PayableBook,
        callbacks: &mut CallbackRegistry,
        entry_ids: &[EntryId],
        bank_account: BankAccount,
    ) -> Result<ExecutionId> {
        if entry_ids.is_empty() {
            return Err(SettleflowError::EmptySelection);
        }
        if entry_ids.len() > constants::MAX_ENTRIES_PER_EXECUTION {
            return Err(SettleflowError::InvalidAmount {
                reason: format!(
                    "batch of {} exceeds the execution cap of {}",
                    entry_ids.len(),
                    constants::MAX_ENTRIES_PER_EXECUTION
                ),
            });
        }
        if !bank_account.is_complete() {
            return Err(SettleflowError::InvalidPayee {
                reason: "disbursing bank account must be complete".into(),
            });
        }

        // --- Phase 1: validate entries and group payments per target ---
        let mut seen: HashSet<EntryId> = HashSet::with_capacity(entry_ids.len());
        let mut statement_payments: Vec<(StatementId, Decimal)> = Vec::new();
        let mut payable_payments: Vec<(PayableId, Decimal)> = Vec::new();
        let mut total = Decimal::ZERO;

        for &id in entry_ids {
            if !seen.insert(id) {
                return Err(SettleflowError::DuplicateEntrySelection(id));
            }
            let entry = queue.expect_entry(id)?;
            if entry.is_paid() {
                return Err(SettleflowError::EntryAlreadyPaid(id));
            }
            total += entry.amount;
            match entry.entry_ref {
                EntryRef::Statement(stmt_id) => {
                    accumulate(&mut statement_payments, stmt_id, entry.amount);
                }
                EntryRef::Payable(payable_id) => {
                    accumulate(&mut payable_payments, payable_id, entry.amount);
                }
            }
        }

        // --- Phase 2: stage post-payment state on clones ---
        let mut staged_statements: Vec<SettlementStatement> =
            Vec::with_capacity(statement_payments.len());
        for &(stmt_id, amount) in &statement_payments {
            let statement = self.expect_statement(stmt_id)?;
            let remaining = statement.remaining();
            if amount > remaining {
                return Err(SettleflowError::StatementOverPayment {
                    id: stmt_id,
                    attempted: amount,
                    remaining,
                });
            }
            let mut staged = statement.clone();
            apply_statement_payment(&mut staged, amount);
            staged.verify_conservation()?;
            staged_statements.push(staged);
        }

        let mut staged_payables: Vec<Payable> = Vec::with_capacity(payable_payments.len());
        for &(payable_id, amount) in &payable_payments {
            staged_payables.push(payables.stage_payment(payable_id, amount)?);
        }

        // Completion callbacks run last in the fallible window, on the
        // staged payables, so a failing handler aborts the whole round.
        for staged in &staged_payables {
            if staged.is_fully_paid() {
                callbacks.dispatch_paid(staged)?;
            }
        }

        // --- Phase 3: commit, infallible ---
        for &id in entry_ids {
            queue.commit_paid(id);
        }
        for staged in staged_statements {
            if staged.is_fully_paid() {
                for detail in &staged.details {
                    ledger
                        .mark_settled(detail.obligation_id)
                        .expect("settling obligation backing a paid statement");
                }
            }
            self.statements.insert(staged.id, staged);
        }
        for staged in staged_payables {
            payables.commit(staged);
        }

        let execution = PaymentExecution::new(total, bank_account, entry_ids.to_vec());
        let execution_id = execution.id;
        tracing::info!(
            execution = %execution_id,
            entries = entry_ids.len(),
            total_amount = %total,
            "Payment batch executed"
        );
        self.executions.push(execution);
        Ok(execution_id)
    }
}

/// Sum payments per target, preserving first-seen order.
fn accumulate<K: Copy + PartialEq>(payments: &mut Vec<(K, Decimal)>, key: K, amount: Decimal) {
    if let Some((_, acc)) = payments.iter_mut().find(|(k, _)| *k == key) {
        *acc += amount;
    } else {
        payments.push((key, amount));
    }
}

/// Absorb a payment into a statement and back-allocate it across details.
///
/// Caller guarantees `0 < amount ≤ statement.remaining()`.
fn apply_statement_payment(statement: &mut SettlementStatement, amount: Decimal) {
    statement.paid_amount += amount;
    statement.updated_at = chrono::Utc::now();

    if statement.paid_amount == statement.total_payable {
        // Full payment: snap every allocation to its exact source amount,
        // absorbing any residue left by earlier proportional rounds.
        for detail in &mut statement.details {
            detail.allocated_payment = detail.source_amount;
        }
        statement.payment_status = PaymentStatus::Paid;
        return;
    }

    // Partial payment: spread proportionally to source amounts, rounded to
    // the amount scale and clamped to per-detail headroom.
    let mut left = amount;
    let last = statement.details.len() - 1;
    for (i, detail) in statement.details.iter_mut().enumerate() {
        let share = if i == last {
            left
        } else {
            (amount * detail.source_amount / statement.total_payable)
                .round_dp(constants::AMOUNT_SCALE)
        };
        let take = share.min(detail.headroom()).min(left);
        detail.allocated_payment += take;
        left -= take;
        if left == Decimal::ZERO {
            break;
        }
    }
    // Clamping may leave residue when late rows had little headroom; sweep
    // it into whatever headroom remains. Σ headroom ≥ amount, so this
    // terminates with zero residue.
    if left > Decimal::ZERO {
        for detail in &mut statement.details {
            let take = left.min(detail.headroom());
            detail.allocated_payment += take;
            left -= take;
            if left == Decimal::ZERO {
                break;
            }
        }
    }
    statement.payment_status = PaymentStatus::Partial;
}
