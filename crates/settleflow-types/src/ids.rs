//! Globally unique identifiers used throughout SettleFlow.
//!
//! All entity IDs use UUIDv7 for time-ordered lexicographic sorting.
//! `ExecutionId` additionally offers a deterministic constructor derived
//! from the set of consumed queue entries, so replaying the same entry
//! selection yields the same execution identifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            #[must_use]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if $prefix.is_empty() {
                    write!(f, "{}", self.0)
                } else {
                    write!(f, "{}:{}", $prefix, self.0)
                }
            }
        }
    };
}

entity_id!(
    /// A single tier-1 payable document (e.g., one delivery contract).
    ObligationId,
    "ob"
);
entity_id!(
    /// An aggregated, billable settlement statement (tier-2).
    StatementId,
    "stmt"
);
entity_id!(
    /// A generalized payable governed by the approval workflow.
    PayableId,
    "pay"
);
entity_id!(
    /// A batching pool container in the disbursement queue.
    PoolId,
    "pool"
);
entity_id!(
    /// A single disbursement queue entry.
    EntryId,
    "entry"
);
entity_id!(
    /// An invoice received from a counterparty.
    InvoiceId,
    "inv"
);
entity_id!(
    /// One commodity line on an invoice.
    InvoiceLineId,
    "line"
);
entity_id!(
    /// An export declaration under rebate substantiation.
    DeclarationId,
    "decl"
);
entity_id!(
    /// One line item of an export declaration.
    DeclarationItemId,
    "item"
);
entity_id!(
    /// A persisted (declaration item, invoice line) match.
    MatchRecordId,
    "match"
);
entity_id!(
    /// A supplier / carrier / employee the core owes money to.
    CounterpartyId,
    ""
);
entity_id!(
    /// A product in the external commodity catalog.
    ProductId,
    "prod"
);

// ---------------------------------------------------------------------------
// ExecutionId
// ---------------------------------------------------------------------------

/// A batched payment execution (tier-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ExecutionId(pub Uuid);

impl ExecutionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Deterministic `ExecutionId` from the set of consumed queue entries.
    ///
    /// The entry ids are sorted before hashing, so the same selection in any
    /// order produces the same execution identifier. The out-of-scope
    /// persistence layer can use this as an idempotency key.
    #[must_use]
    pub fn deterministic(entry_ids: &[EntryId]) -> Self {
        use sha2::{Digest, Sha256};
        let mut sorted: Vec<EntryId> = entry_ids.to_vec();
        sorted.sort_unstable();
        let mut hasher = Sha256::new();
        hasher.update(b"settleflow:execution_id:v1:");
        for id in &sorted {
            hasher.update(id.0.as_bytes());
        }
        let hash = hasher.finalize();
        let bytes: [u8; 16] = hash[..16].try_into().expect("SHA-256 produces 32 bytes");
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exec:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
