//! # settleflow-types
//!
//! Shared types, errors, and configuration for the **SettleFlow**
//! settlement and disbursement core.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`ObligationId`], [`StatementId`], [`PayableId`], [`PoolId`],
//!   [`EntryId`], [`ExecutionId`], [`InvoiceId`], [`InvoiceLineId`], [`DeclarationId`],
//!   [`DeclarationItemId`], [`MatchRecordId`], [`CounterpartyId`], [`ProductId`]
//! - **Obligation model**: [`Obligation`], [`ObligationLine`], [`ObligationStatus`], [`ObligationPatch`]
//! - **Statement model**: [`SettlementStatement`], [`SettlementDetail`], [`PaymentStatus`]
//! - **Payable model**: [`Payable`], [`SourceType`], [`PayableStatus`]
//! - **Queue model**: [`PoolEntry`], [`EntryRef`], [`EntryType`], [`EntryStatus`],
//!   [`DisbursementPool`], [`PaymentExecution`]
//! - **Invoice model**: [`Invoice`], [`InvoiceLine`], [`InvoiceStatus`], [`MatchRecord`]
//! - **Declaration model**: [`Declaration`], [`DeclarationItem`], [`DeclarationStatus`]
//! - **Audit model**: [`ChangeLog`], [`ObligationSnapshot`]
//! - **Money model**: [`Currency`], [`BankAccount`], [`PayeeSnapshot`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`SettleflowError`] with `SF_ERR_` prefix codes

pub mod audit;
pub mod config;
pub mod constants;
pub mod declaration;
pub mod error;
pub mod ids;
pub mod invoice;
pub mod money;
pub mod obligation;
pub mod payable;
pub mod pool;
pub mod statement;

// Re-export all primary types at crate root for ergonomic imports:
//   use settleflow_types::{Obligation, Payable, SettlementStatement, ...};

pub use audit::*;
pub use config::*;
pub use declaration::*;
pub use error::*;
pub use ids::*;
pub use invoice::*;
pub use money::*;
pub use obligation::*;
pub use payable::*;
pub use pool::*;
pub use statement::*;

// Constants are accessed via `settleflow_types::constants::FOO`
// (not re-exported to avoid name collisions).
