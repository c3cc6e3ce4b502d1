//! End-to-end disbursement flows: obligations → statement → queue →
//! batched execution with back-allocation, and the payable approval
//! lifecycle with source callbacks.

use std::cell::RefCell;
use std::rc::Rc;

use rust_decimal::Decimal;
use settleflow_disburse::{
    ApprovalDecision, CallbackRegistry, DisbursementQueue, PayableBook, SettlementBook,
    SourceCallback,
};
use settleflow_ledger::ObligationLedger;
use settleflow_types::{
    BankAccount, CounterpartyId, EngineConfig, EntryId, EntryRef, EntryStatus, EntryType,
    Obligation, ObligationStatus, Payable, PayableStatus, PayeeSnapshot, PaymentStatus, Result,
    SettleflowError, SourceType,
};
use uuid::Uuid;

struct World {
    book: SettlementBook,
    ledger: ObligationLedger,
    queue: DisbursementQueue,
    payables: PayableBook,
    callbacks: CallbackRegistry,
}

impl World {
    fn new() -> Self {
        Self {
            book: SettlementBook::new(),
            ledger: ObligationLedger::new(),
            queue: DisbursementQueue::new(EngineConfig::with_period("2026-08")),
            payables: PayableBook::new(),
            callbacks: CallbackRegistry::new(),
        }
    }

    fn execute(&mut self, entries: &[EntryId]) -> Result<()> {
        self.book.execute_payment(
            &mut self.queue,
            &mut self.ledger,
            &mut self.payables,
            &mut self.callbacks,
            entries,
            account(),
        )?;
        Ok(())
    }
}

fn account() -> BankAccount {
    BankAccount::new("SettleFlow Ops", "Demo Bank", "6222-0000-1111")
}

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

#[derive(Default)]
struct Log {
    rejected: Vec<String>,
    paid: usize,
    fail_on_paid: bool,
}

struct LogHandler(Rc<RefCell<Log>>);

impl SourceCallback for LogHandler {
    fn on_rejected(&mut self, payable: &Payable) -> Result<()> {
        self.0.borrow_mut().rejected.push(
            payable
                .rejection_reason
                .clone()
                .unwrap_or_else(|| "<missing>".into()),
        );
        Ok(())
    }

    fn on_paid(&mut self, payable: &Payable) -> Result<()> {
        let mut log = self.0.borrow_mut();
        if log.fail_on_paid {
            return Err(SettleflowError::CallbackFailed {
                source_type: payable.source_type,
                reason: "ERP write failed".into(),
            });
        }
        log.paid += 1;
        Ok(())
    }
}

/// Two same-counterparty obligations are aggregated and paid off over two
/// partial rounds; allocations stay proportional and snap exact at the end.
#[test]
fn statement_lifecycle_with_two_partial_rounds() {
    let mut w = World::new();
    let cp = CounterpartyId::new();
    let ob_x = w.ledger.register(Obligation::dummy(cp, dec(1000))).unwrap();
    let ob_y = w.ledger.register(Obligation::dummy(cp, dec(2000))).unwrap();

    let stmt_id = w
        .book
        .generate_settlement(&mut w.ledger, &mut w.queue, &[ob_x, ob_y])
        .unwrap();

    // Round one: 1500 of 3000.
    let e1 = w
        .queue
        .enqueue(EntryRef::Statement(stmt_id), dec(1500), EntryType::Prepay, 0, None)
        .unwrap();
    w.execute(&[e1]).unwrap();

    let stmt = w.book.statement(stmt_id).unwrap();
    assert_eq!(stmt.payment_status, PaymentStatus::Partial);
    assert_eq!(stmt.paid_amount, dec(1500));
    assert_eq!(stmt.details[0].allocated_payment, dec(500));
    assert_eq!(stmt.details[1].allocated_payment, dec(1000));
    stmt.verify_conservation().unwrap();
    assert_eq!(w.ledger.get(ob_x).unwrap().status, ObligationStatus::Settling);

    // Round two: the remaining 1500 completes the statement.
    let e2 = w
        .queue
        .enqueue(EntryRef::Statement(stmt_id), dec(1500), EntryType::Balance, 0, None)
        .unwrap();
    w.execute(&[e2]).unwrap();

    let stmt = w.book.statement(stmt_id).unwrap();
    assert_eq!(stmt.payment_status, PaymentStatus::Paid);
    assert_eq!(stmt.paid_amount, dec(3000));
    for d in &stmt.details {
        assert_eq!(d.allocated_payment, d.source_amount);
    }
    stmt.verify_conservation().unwrap();

    // Completion settles the underlying obligations.
    assert_eq!(w.ledger.get(ob_x).unwrap().status, ObligationStatus::Settled);
    assert_eq!(w.ledger.get(ob_y).unwrap().status, ObligationStatus::Settled);

    // Both entries consumed, two executions on record.
    assert!(w.queue.entry(e1).unwrap().is_paid());
    assert!(w.queue.entry(e2).unwrap().is_paid());
    assert_eq!(w.book.executions().len(), 2);
    assert_eq!(w.book.executions()[1].total_amount, dec(1500));
}

/// A round that would push a statement past its total is rejected with no
/// state change anywhere.
#[test]
fn statement_over_payment_rejected_atomically() {
    let mut w = World::new();
    let cp = CounterpartyId::new();
    let ob = w.ledger.register(Obligation::dummy(cp, dec(1000))).unwrap();
    let stmt_id = w
        .book
        .generate_settlement(&mut w.ledger, &mut w.queue, &[ob])
        .unwrap();

    let e1 = w
        .queue
        .enqueue(EntryRef::Statement(stmt_id), dec(800), EntryType::Prepay, 0, None)
        .unwrap();
    let e2 = w
        .queue
        .enqueue(EntryRef::Statement(stmt_id), dec(300), EntryType::Balance, 0, None)
        .unwrap();

    // The two entries sum to 1100 against a 1000 statement.
    let err = w.execute(&[e1, e2]).unwrap_err();
    assert!(matches!(
        err,
        SettleflowError::StatementOverPayment { attempted, remaining, .. }
            if attempted == dec(1100) && remaining == dec(1000)
    ));

    let stmt = w.book.statement(stmt_id).unwrap();
    assert_eq!(stmt.paid_amount, Decimal::ZERO);
    assert_eq!(stmt.payment_status, PaymentStatus::Unpaid);
    assert_eq!(w.queue.entry(e1).unwrap().status, EntryStatus::PendingApproval);
    assert_eq!(w.queue.entry(e2).unwrap().status, EntryStatus::PendingApproval);
    assert!(w.book.executions().is_empty());
}

#[test]
fn duplicate_and_spent_entries_rejected() {
    let mut w = World::new();
    let cp = CounterpartyId::new();
    let ob = w.ledger.register(Obligation::dummy(cp, dec(1000))).unwrap();
    let stmt_id = w
        .book
        .generate_settlement(&mut w.ledger, &mut w.queue, &[ob])
        .unwrap();
    let e1 = w
        .queue
        .enqueue(EntryRef::Statement(stmt_id), dec(100), EntryType::Prepay, 0, None)
        .unwrap();

    let err = w.execute(&[e1, e1]).unwrap_err();
    assert!(matches!(err, SettleflowError::DuplicateEntrySelection(id) if id == e1));

    w.execute(&[e1]).unwrap();
    let err = w.execute(&[e1]).unwrap_err();
    assert!(matches!(err, SettleflowError::EntryAlreadyPaid(id) if id == e1));

    let err = w.execute(&[]).unwrap_err();
    assert!(matches!(err, SettleflowError::EmptySelection));
}

/// Full payable lifecycle: create → approve into the default pool →
/// batch-pay the pool entry → `on_paid` fires exactly once.
#[test]
fn payable_pool_entry_paid_through_executor() {
    let mut w = World::new();
    let log = Rc::new(RefCell::new(Log::default()));
    w.callbacks
        .register(SourceType::Logistics, Box::new(LogHandler(Rc::clone(&log))));

    let payable_id = w
        .payables
        .create_payable(
            SourceType::Logistics,
            Uuid::now_v7(),
            PayeeSnapshot::dummy(),
            dec(2400),
            "CNY".into(),
        )
        .unwrap();
    w.payables
        .approve_payable(
            &mut w.queue,
            &mut w.callbacks,
            payable_id,
            ApprovalDecision::Approve {
                add_to_pool: true,
                pool: None,
            },
            "fin.liu",
        )
        .unwrap();

    let pool_id = w.payables.payable(payable_id).unwrap().pool_id.unwrap();
    let entries: Vec<EntryId> = w
        .queue
        .entries_for_pool(pool_id)
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(entries.len(), 1);

    w.execute(&entries).unwrap();

    let payable = w.payables.payable(payable_id).unwrap();
    assert_eq!(payable.status, PayableStatus::Paid);
    assert!(payable.is_fully_paid());
    assert_eq!(log.borrow().paid, 1);

    // The pool totals still count the (now paid) member entry.
    let pool = w.queue.pool(pool_id).unwrap();
    assert_eq!(pool.total_count, 1);
    assert!(w.queue.entry(entries[0]).unwrap().is_paid());
}

/// A failing `on_paid` handler aborts the whole batch: the statement in the
/// same batch is untouched and every entry stays pending.
#[test]
fn failing_completion_callback_rolls_back_whole_batch() {
    let mut w = World::new();
    let log = Rc::new(RefCell::new(Log {
        fail_on_paid: true,
        ..Log::default()
    }));
    w.callbacks
        .register(SourceType::Expense, Box::new(LogHandler(Rc::clone(&log))));

    let cp = CounterpartyId::new();
    let ob = w.ledger.register(Obligation::dummy(cp, dec(1000))).unwrap();
    let stmt_id = w
        .book
        .generate_settlement(&mut w.ledger, &mut w.queue, &[ob])
        .unwrap();
    let stmt_entry = w
        .queue
        .enqueue(EntryRef::Statement(stmt_id), dec(400), EntryType::Prepay, 0, None)
        .unwrap();

    let payable_id = w
        .payables
        .create_payable(
            SourceType::Expense,
            Uuid::now_v7(),
            PayeeSnapshot::dummy(),
            dec(500),
            "CNY".into(),
        )
        .unwrap();
    w.payables
        .approve_payable(
            &mut w.queue,
            &mut w.callbacks,
            payable_id,
            ApprovalDecision::Approve {
                add_to_pool: true,
                pool: None,
            },
            "fin.liu",
        )
        .unwrap();
    let pool_id = w.payables.payable(payable_id).unwrap().pool_id.unwrap();
    let payable_entry = w.queue.entries_for_pool(pool_id)[0].id;

    let err = w.execute(&[stmt_entry, payable_entry]).unwrap_err();
    assert!(matches!(err, SettleflowError::CallbackFailed { .. }));

    // Nothing moved.
    let stmt = w.book.statement(stmt_id).unwrap();
    assert_eq!(stmt.paid_amount, Decimal::ZERO);
    assert_eq!(stmt.payment_status, PaymentStatus::Unpaid);
    assert_eq!(
        w.payables.payable(payable_id).unwrap().status,
        PayableStatus::InPool
    );
    assert_eq!(w.payables.payable(payable_id).unwrap().paid_amount, Decimal::ZERO);
    assert_eq!(w.queue.entry(stmt_entry).unwrap().status, EntryStatus::PendingApproval);
    assert_eq!(w.queue.entry(payable_entry).unwrap().status, EntryStatus::PendingApproval);
    assert!(w.book.executions().is_empty());
}

/// Rejection reverts nothing in finance but notifies the source module with
/// the reviewer's reason.
#[test]
fn rejection_notifies_source_module() {
    let mut w = World::new();
    let log = Rc::new(RefCell::new(Log::default()));
    w.callbacks
        .register(SourceType::SupplyContract, Box::new(LogHandler(Rc::clone(&log))));

    let payable_id = w
        .payables
        .create_payable(
            SourceType::SupplyContract,
            Uuid::now_v7(),
            PayeeSnapshot::dummy(),
            dec(980),
            "CNY".into(),
        )
        .unwrap();
    w.payables
        .approve_payable(
            &mut w.queue,
            &mut w.callbacks,
            payable_id,
            ApprovalDecision::Reject {
                reason: "duplicate freight bill".into(),
            },
            "fin.liu",
        )
        .unwrap();

    assert_eq!(
        w.payables.payable(payable_id).unwrap().status,
        PayableStatus::Rejected
    );
    assert_eq!(log.borrow().rejected, vec!["duplicate freight bill".to_string()]);
}

/// A mixed batch pays one statement round and one payable in a single
/// execution, recorded under one deterministic execution id.
#[test]
fn mixed_batch_single_execution_record() {
    let mut w = World::new();
    let log = Rc::new(RefCell::new(Log::default()));
    w.callbacks
        .register(SourceType::Other, Box::new(LogHandler(Rc::clone(&log))));

    let cp = CounterpartyId::new();
    let ob = w.ledger.register(Obligation::dummy(cp, dec(600))).unwrap();
    let stmt_id = w
        .book
        .generate_settlement(&mut w.ledger, &mut w.queue, &[ob])
        .unwrap();
    let stmt_entry = w
        .queue
        .enqueue(EntryRef::Statement(stmt_id), dec(600), EntryType::Balance, 0, None)
        .unwrap();

    let payable_id = w
        .payables
        .create_payable(
            SourceType::Other,
            Uuid::now_v7(),
            PayeeSnapshot::dummy(),
            dec(150),
            "CNY".into(),
        )
        .unwrap();
    w.payables
        .approve_payable(
            &mut w.queue,
            &mut w.callbacks,
            payable_id,
            ApprovalDecision::Approve {
                add_to_pool: true,
                pool: None,
            },
            "fin.liu",
        )
        .unwrap();
    let pool_id = w.payables.payable(payable_id).unwrap().pool_id.unwrap();
    let payable_entry = w.queue.entries_for_pool(pool_id)[0].id;

    w.execute(&[stmt_entry, payable_entry]).unwrap();

    assert_eq!(w.book.executions().len(), 1);
    let execution = &w.book.executions()[0];
    assert_eq!(execution.total_amount, dec(750));
    assert_eq!(execution.entry_ids.len(), 2);

    assert!(w.book.statement(stmt_id).unwrap().is_fully_paid());
    assert_eq!(w.ledger.get(ob).unwrap().status, ObligationStatus::Settled);
    assert_eq!(w.payables.payable(payable_id).unwrap().status, PayableStatus::Paid);
    assert_eq!(log.borrow().paid, 1);
}
