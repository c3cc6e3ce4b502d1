//! Error types for the SettleFlow settlement core.
//!
//! All errors use the `SF_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors
//! - 2xx: State-conflict errors
//! - 3xx: Concurrency (optimistic lock) errors
//! - 4xx: Not-found errors
//! - 5xx: Invoice matching errors
//! - 6xx: Disbursement / callback errors
//! - 9xx: General / internal errors
//!
//! Every error carries enough structured context (entity id, expected vs.
//! actual state or version) for the caller to decide retry vs.
//! surface-to-user. `StaleVersion` is meant to be retried after a refetch;
//! `MatchShortfall` is an actionable business message, never auto-retried.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    CounterpartyId, DeclarationId, DeclarationItemId, DeclarationStatus, EntryId, EntryStatus,
    InvoiceId, InvoiceLineId, ObligationId, ObligationStatus, PayableId, PayableStatus, PoolId,
    ProductId,
    SourceType, StatementId,
};

/// Central error enum for all SettleFlow operations.
#[derive(Debug, Error)]
pub enum SettleflowError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// A monetary amount or quantity failed validation.
    #[error("SF_ERR_100: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// An operation was invoked with an empty id selection.
    #[error("SF_ERR_101: Empty selection: at least one id is required")]
    EmptySelection,

    /// Obligations selected for one statement belong to different counterparties.
    #[error(
        "SF_ERR_102: Counterparty mismatch on {obligation}: expected {expected}, got {actual}"
    )]
    CounterpartyMismatch {
        obligation: ObligationId,
        expected: CounterpartyId,
        actual: CounterpartyId,
    },

    /// Obligations selected for one statement carry different currencies.
    #[error("SF_ERR_103: Currency mismatch on {obligation}: expected {expected}, got {actual}")]
    CurrencyMismatch {
        obligation: ObligationId,
        expected: String,
        actual: String,
    },

    /// An obligation selected for settlement is not in `PENDING` state.
    #[error("SF_ERR_104: Obligation {id} is {status}, not PENDING")]
    ObligationNotPending {
        id: ObligationId,
        status: ObligationStatus,
    },

    /// A rejection was submitted without a reason.
    #[error("SF_ERR_105: Rejection requires a non-empty reason")]
    MissingRejectionReason,

    /// The payee identity or bank snapshot is incomplete.
    #[error("SF_ERR_106: Invalid payee: {reason}")]
    InvalidPayee { reason: String },

    /// An invoice failed intake validation.
    #[error("SF_ERR_107: Invalid invoice: {reason}")]
    InvalidInvoice { reason: String },

    /// A declaration failed intake validation.
    #[error("SF_ERR_108: Invalid declaration: {reason}")]
    InvalidDeclaration { reason: String },

    /// The same queue entry appears twice in one execution request.
    #[error("SF_ERR_109: Duplicate entry in selection: {0}")]
    DuplicateEntrySelection(EntryId),

    /// An obligation update carried no changes.
    #[error("SF_ERR_110: Obligation patch is empty")]
    EmptyPatch,

    // =================================================================
    // State-Conflict Errors (2xx)
    // =================================================================
    /// Only a `PENDING` payable may be approved, rejected or cancelled.
    #[error("SF_ERR_200: Payable {id} is {status}, not PENDING")]
    PayableNotPending {
        id: PayableId,
        status: PayableStatus,
    },

    /// Pool admission requires an `APPROVED` payable.
    #[error("SF_ERR_201: Payable {id} is {status}, not APPROVED")]
    PayableNotApproved {
        id: PayableId,
        status: PayableStatus,
    },

    /// A queue entry selected for execution was already paid.
    #[error("SF_ERR_202: Queue entry {0} is already PAID")]
    EntryAlreadyPaid(EntryId),

    /// Entry amounts may only be adjusted while pending approval.
    #[error("SF_ERR_203: Queue entry {id} is {status}, amount is frozen")]
    EntryNotAdjustable { id: EntryId, status: EntryStatus },

    /// A payment would push a payable past its payable amount.
    #[error("SF_ERR_204: Over-payment on {id}: attempted {attempted}, remaining {remaining}")]
    OverPayment {
        id: PayableId,
        attempted: Decimal,
        remaining: Decimal,
    },

    /// The declaration is not in an editable state.
    #[error("SF_ERR_205: Declaration {id} is {status}, not EDITABLE")]
    DeclarationNotEditable {
        id: DeclarationId,
        status: DeclarationStatus,
    },

    /// Cancellation is only permitted from the PRE_DECLARED state.
    #[error("SF_ERR_206: Declaration {id} is {status}, not PRE_DECLARED")]
    DeclarationNotPreDeclared {
        id: DeclarationId,
        status: DeclarationStatus,
    },

    /// Obligations locked into a settlement (or settled) cannot be edited.
    #[error("SF_ERR_207: Obligation {id} is {status} and locked against edits")]
    ObligationLocked {
        id: ObligationId,
        status: ObligationStatus,
    },

    /// A payable cannot receive payments in its current state.
    #[error("SF_ERR_208: Payable {id} is {status} and cannot receive payments")]
    PayableNotPayable {
        id: PayableId,
        status: PayableStatus,
    },

    /// A payment round would push a statement past its total payable.
    #[error(
        "SF_ERR_209: Over-payment on {id}: round amount {attempted}, remaining {remaining}"
    )]
    StatementOverPayment {
        id: StatementId,
        attempted: Decimal,
        remaining: Decimal,
    },

    // =================================================================
    // Concurrency Errors (3xx)
    // =================================================================
    /// Optimistic-lock version mismatch. Refetch and retry.
    #[error("SF_ERR_300: Stale version on {id}: expected {expected}, actual {actual}")]
    StaleVersion {
        id: ObligationId,
        expected: u64,
        actual: u64,
    },

    // =================================================================
    // Not-Found Errors (4xx)
    // =================================================================
    /// The requested obligation does not exist.
    #[error("SF_ERR_400: Obligation not found: {0}")]
    ObligationNotFound(ObligationId),

    /// The requested settlement statement does not exist.
    #[error("SF_ERR_401: Statement not found: {0}")]
    StatementNotFound(StatementId),

    /// The requested payable does not exist.
    #[error("SF_ERR_402: Payable not found: {0}")]
    PayableNotFound(PayableId),

    /// The requested queue entry does not exist.
    #[error("SF_ERR_403: Queue entry not found: {0}")]
    EntryNotFound(EntryId),

    /// The requested disbursement pool does not exist.
    #[error("SF_ERR_404: Pool not found: {0}")]
    PoolNotFound(PoolId),

    /// The requested invoice does not exist.
    #[error("SF_ERR_405: Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// The requested declaration does not exist.
    #[error("SF_ERR_406: Declaration not found: {0}")]
    DeclarationNotFound(DeclarationId),

    /// The requested invoice line does not exist.
    #[error("SF_ERR_407: Invoice line not found: {0}")]
    InvoiceLineNotFound(InvoiceLineId),

    // =================================================================
    // Invoice Matching Errors (5xx)
    // =================================================================
    /// Invoice quantity is insufficient to satisfy a declaration item.
    #[error(
        "SF_ERR_500: Shortfall on {item} ({commodity}): required {required}, \
         available {available}, short {shortfall}"
    )]
    MatchShortfall {
        item: DeclarationItemId,
        commodity: String,
        required: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },

    /// A declaration item's product has no declared commodity name.
    #[error("SF_ERR_501: Missing commodity mapping for {product} on item {item}")]
    MissingCommodityMapping {
        item: DeclarationItemId,
        product: ProductId,
    },

    /// `confirm_match` refused because not every item is satisfiable.
    #[error("SF_ERR_502: Declaration {id} is not fully matchable: {failed_items} item(s) failed")]
    DeclarationNotMatchable {
        id: DeclarationId,
        failed_items: usize,
    },

    // =================================================================
    // Disbursement / Callback Errors (6xx)
    // =================================================================
    /// No callback handler registered for a payable's source type.
    #[error("SF_ERR_600: No callback registered for source type {0}")]
    CallbackNotRegistered(SourceType),

    /// A source-module callback reported failure.
    #[error("SF_ERR_601: Callback for {source_type} failed: {reason}")]
    CallbackFailed {
        source_type: SourceType,
        reason: String,
    },

    /// Conservation breach: allocated details drifted from the paid amount.
    #[error(
        "SF_ERR_602: Allocation drift on {statement}: paid {paid}, allocated sum {allocated}"
    )]
    AllocationDrift {
        statement: StatementId,
        paid: Decimal,
        allocated: Decimal,
    },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SF_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SF_ERR_901: Serialization error: {0}")]
    Serialization(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SettleflowError>;

impl From<serde_json::Error> for SettleflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = SettleflowError::ObligationNotFound(ObligationId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("SF_ERR_400"), "Got: {msg}");
    }

    #[test]
    fn over_payment_display() {
        let err = SettleflowError::OverPayment {
            id: PayableId::new(),
            attempted: Decimal::new(150, 0),
            remaining: Decimal::new(100, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("SF_ERR_204"));
        assert!(msg.contains("150"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn stale_version_display() {
        let err = SettleflowError::StaleVersion {
            id: ObligationId::new(),
            expected: 3,
            actual: 5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("SF_ERR_300"));
        assert!(msg.contains("expected 3"));
        assert!(msg.contains("actual 5"));
    }

    #[test]
    fn all_errors_have_sf_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(SettleflowError::EmptySelection),
            Box::new(SettleflowError::MissingRejectionReason),
            Box::new(SettleflowError::EmptyPatch),
            Box::new(SettleflowError::CallbackNotRegistered(SourceType::Logistics)),
            Box::new(SettleflowError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("SF_ERR_"),
                "Error missing SF_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn shortfall_carries_amounts() {
        let err = SettleflowError::MatchShortfall {
            item: DeclarationItemId::new(),
            commodity: "Widget".into(),
            required: Decimal::new(100, 0),
            available: Decimal::new(80, 0),
            shortfall: Decimal::new(20, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("SF_ERR_500"));
        assert!(msg.contains("short 20"));
    }
}
