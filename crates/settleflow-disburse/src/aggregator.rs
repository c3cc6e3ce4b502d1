//! Settlement aggregation — turning pending obligations into one billable
//! statement.
//!
//! `generate_settlement` runs a read-only validation pass over the whole
//! selection first; only once every precondition holds does it flip the
//! obligations to `SETTLING`, open the statement with zeroed details, and
//! enqueue the covering `BALANCE` entry. A failure anywhere in validation
//! leaves zero visible state.

use std::collections::HashMap;

use rust_decimal::Decimal;
use settleflow_ledger::ObligationLedger;
use settleflow_types::{
    constants, EntryRef, EntryType, ObligationId, ObligationStatus, PaymentExecution, Result,
    SettleflowError, SettlementStatement, StatementId,
};

use crate::queue::DisbursementQueue;

/// Owns settlement statements and their payment executions.
pub struct SettlementBook {
    pub(crate) statements: HashMap<StatementId, SettlementStatement>,
    pub(crate) executions: Vec<PaymentExecution>,
}

impl SettlementBook {
    /// Create an empty settlement book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            statements: HashMap::new(),
            executions: Vec::new(),
        }
    }

    /// Aggregate same-counterparty `PENDING` obligations into one statement.
    ///
    /// Atomic effect on success:
    /// 1. every selected obligation moves `PENDING → SETTLING`
    /// 2. one statement opens with `total_payable = Σ amounts`, zero paid,
    ///    one zero-allocated detail per obligation
    /// 3. one `BALANCE` queue entry covering the full total is enqueued
    ///
    /// # Errors
    /// - `EmptySelection` for an empty id list
    /// - `InvalidAmount` if the selection exceeds the aggregation cap
    /// - `ObligationNotFound` / `ObligationNotPending` naming the offender
    /// - `CounterpartyMismatch` / `CurrencyMismatch` naming the offender
    pub fn generate_settlement(
        &mut self,
        ledger: &mut ObligationLedger,
        queue: &mut DisbursementQueue,
        obligation_ids: &[ObligationId],
    ) -> Result<StatementId> {
        if obligation_ids.is_empty() {
            return Err(SettleflowError::EmptySelection);
        }
        if obligation_ids.len() > constants::MAX_OBLIGATIONS_PER_STATEMENT {
            return Err(SettleflowError::InvalidAmount {
                reason: format!(
                    "selection of {} exceeds the aggregation cap of {}",
                    obligation_ids.len(),
                    constants::MAX_OBLIGATIONS_PER_STATEMENT
                ),
            });
        }

        // --- Validation pass: read-only, fail without side effects ---
        let mut counterparty = None;
        let mut currency: Option<String> = None;
        let mut sources: Vec<(ObligationId, Decimal)> = Vec::with_capacity(obligation_ids.len());

        for &id in obligation_ids {
            let obligation = ledger.expect(id)?;
            if obligation.status != ObligationStatus::Pending {
                return Err(SettleflowError::ObligationNotPending {
                    id,
                    status: obligation.status,
                });
            }
            let expected_cp = *counterparty.get_or_insert(obligation.counterparty);
            if obligation.counterparty != expected_cp {
                return Err(SettleflowError::CounterpartyMismatch {
                    obligation: id,
                    expected: expected_cp,
                    actual: obligation.counterparty,
                });
            }
            let expected_ccy =
                currency.get_or_insert_with(|| obligation.currency.clone()).clone();
            if obligation.currency != expected_ccy {
                return Err(SettleflowError::CurrencyMismatch {
                    obligation: id,
                    expected: expected_ccy,
                    actual: obligation.currency.clone(),
                });
            }
            sources.push((id, obligation.amount));
        }

        let counterparty = counterparty.expect("non-empty selection");
        let currency = currency.expect("non-empty selection");
        let total: Decimal = sources.iter().map(|(_, amt)| *amt).sum();

        // --- Mutation pass: validated above, each step is infallible ---
        for &(id, _) in &sources {
            ledger
                .mark_settling(id)
                .expect("validated pending obligation");
        }

        let statement = SettlementStatement::new(counterparty, currency, sources);
        let statement_id = statement.id;
        self.statements.insert(statement_id, statement);

        queue
            .enqueue(
                EntryRef::Statement(statement_id),
                total,
                EntryType::Balance,
                constants::DEFAULT_ENTRY_PRIORITY,
                None,
            )
            .expect("positive validated total");

        tracing::info!(
            statement = %statement_id,
            %counterparty,
            obligations = obligation_ids.len(),
            total_payable = %total,
            "Settlement statement generated"
        );
        Ok(statement_id)
    }

    /// Look up a statement by id.
    #[must_use]
    pub fn statement(&self, id: StatementId) -> Option<&SettlementStatement> {
        self.statements.get(&id)
    }

    /// Look up a statement, failing with `StatementNotFound`.
    pub fn expect_statement(&self, id: StatementId) -> Result<&SettlementStatement> {
        self.statements
            .get(&id)
            .ok_or(SettleflowError::StatementNotFound(id))
    }

    /// All payment executions, oldest first.
    #[must_use]
    pub fn executions(&self) -> &[PaymentExecution] {
        &self.executions
    }

    /// Number of statements tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the book holds no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl Default for SettlementBook {
    fn default() -> Self {
        Self::new()
    }
}
