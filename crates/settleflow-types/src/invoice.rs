//! Incoming tax invoices and the match records that consume them.
//!
//! An invoice's status is derived from the aggregate consumption of its
//! line items:
//! - `LOCKED`  — every line fully consumed
//! - `RESERVED` — some consumption, but not all lines exhausted
//! - `FREE`    — no consumption at all
//!
//! Consumption is recorded as `MatchRecord` rows; a line's *remaining
//! quantity* is `quantity − Σ matched_quantity` over its records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CounterpartyId, DeclarationItemId, InvoiceId, InvoiceLineId, MatchRecordId};

/// Derived consumption status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Free,
    Reserved,
    Locked,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "FREE"),
            Self::Reserved => write!(f, "RESERVED"),
            Self::Locked => write!(f, "LOCKED"),
        }
    }
}

/// An incoming tax invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub counterparty: CounterpartyId,
    /// The fiscal invoice number printed on the document.
    pub invoice_no: String,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    #[must_use]
    pub fn new(counterparty: CounterpartyId, invoice_no: impl Into<String>) -> Self {
        Self {
            id: InvoiceId::new(),
            counterparty,
            invoice_no: invoice_no.into(),
            status: InvoiceStatus::Free,
            created_at: Utc::now(),
        }
    }
}

/// One commodity line on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: InvoiceLineId,
    pub invoice_id: InvoiceId,
    /// Declared commodity name, the matching key.
    pub commodity: String,
    pub quantity: Decimal,
}

impl InvoiceLine {
    #[must_use]
    pub fn new(invoice_id: InvoiceId, commodity: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            id: InvoiceLineId::new(),
            invoice_id,
            commodity: commodity.into(),
            quantity,
        }
    }
}

/// Bridge entity tying a declaration item to an invoice line.
///
/// Created by `confirm_match`, physically deleted by `cancel_match`.
/// `matched_quantity` is always strictly positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchRecordId,
    pub declaration_item_id: DeclarationItemId,
    pub invoice_line_id: InvoiceLineId,
    pub matched_quantity: Decimal,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    #[must_use]
    pub fn new(
        declaration_item_id: DeclarationItemId,
        invoice_line_id: InvoiceLineId,
        matched_quantity: Decimal,
    ) -> Self {
        Self {
            id: MatchRecordId::new(),
            declaration_item_id,
            invoice_line_id,
            matched_quantity,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_invoice_is_free() {
        let inv = Invoice::new(CounterpartyId::new(), "INV-001");
        assert_eq!(inv.status, InvoiceStatus::Free);
    }

    #[test]
    fn invoice_status_display() {
        assert_eq!(format!("{}", InvoiceStatus::Free), "FREE");
        assert_eq!(format!("{}", InvoiceStatus::Reserved), "RESERVED");
        assert_eq!(format!("{}", InvoiceStatus::Locked), "LOCKED");
    }

    #[test]
    fn invoice_ids_are_time_ordered() {
        // FIFO candidate ordering tie-breaks on InvoiceId, which is UUIDv7
        // and ordered across distinct milliseconds.
        let a = Invoice::new(CounterpartyId::new(), "A");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = Invoice::new(CounterpartyId::new(), "B");
        assert!(a.id < b.id);
        assert!(a.created_at < b.created_at);
    }
}
