//! Export declarations under rebate substantiation.
//!
//! A declaration lists required commodity quantities. Matching reserves
//! invoice quantity against those items; a confirmed declaration advances
//! to `PRE_DECLARED` until the (out-of-scope) filing step finalizes it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{DeclarationId, DeclarationItemId, ProductId};

/// Matching-relevant status of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum DeclarationStatus {
    /// Items may be edited; matching may be confirmed.
    Editable,
    /// Matched but not yet filed; the only state `cancel_match` accepts.
    PreDeclared,
}

impl std::fmt::Display for DeclarationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Editable => write!(f, "EDITABLE"),
            Self::PreDeclared => write!(f, "PRE_DECLARED"),
        }
    }
}

/// One line item of a declaration: a product and the quantity that must be
/// substantiated with invoice quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclarationItem {
    pub id: DeclarationItemId,
    pub declaration_id: DeclarationId,
    /// Resolved to a declared commodity name via the commodity catalog.
    pub product: ProductId,
    pub required_qty: Decimal,
}

impl DeclarationItem {
    #[must_use]
    pub fn new(declaration_id: DeclarationId, product: ProductId, required_qty: Decimal) -> Self {
        Self {
            id: DeclarationItemId::new(),
            declaration_id,
            product,
            required_qty,
        }
    }
}

/// An export declaration with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub id: DeclarationId,
    pub status: DeclarationStatus,
    pub items: Vec<DeclarationItem>,
    pub created_at: DateTime<Utc>,
}

impl Declaration {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: DeclarationId::new(),
            status: DeclarationStatus::Editable,
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

impl Default for Declaration {
    fn default() -> Self {
        Self::new()
    }
}
