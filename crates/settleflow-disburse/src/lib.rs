//! # settleflow-disburse
//!
//! **Disbursement Plane**: settlement aggregation, the disbursement queue,
//! batched payment execution with proportional back-allocation, and the
//! approval workflow with per-source callbacks.
//!
//! ## Architecture
//!
//! 1. **SettlementBook**: owns settlement statements and payment executions;
//!    `generate_settlement` locks obligations and opens a statement,
//!    `execute_payment` consumes queue entries and back-allocates
//! 2. **DisbursementQueue**: approved, not-yet-paid amounts plus the lazy
//!    per-(source, period) batching pools with derived totals
//! 3. **PayableBook**: the generalized payable lifecycle —
//!    create / approve / reject / cancel / add-to-pool / mark-as-paid
//! 4. **CallbackRegistry**: per-source-type handlers notified on rejection
//!    and on full payment
//!
//! ## Payment Flow
//!
//! ```text
//! ObligationLedger → SettlementBook.generate_settlement() → DisbursementQueue
//!                  → SettlementBook.execute_payment() → back-allocation
//!                  → CallbackRegistry.on_paid() for completed payables
//! ```
//!
//! Every multi-entity mutation is atomic: validation and callbacks run
//! before any state is committed, so a failure partway leaves no visible
//! partial state.

pub mod aggregator;
pub mod approval;
pub mod callback;
pub mod executor;
pub mod queue;

pub use aggregator::SettlementBook;
pub use approval::{ApprovalDecision, PayableBook};
pub use callback::{CallbackRegistry, SourceCallback};
pub use queue::DisbursementQueue;
