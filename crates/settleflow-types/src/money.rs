//! Money-adjacent value objects.
//!
//! All monetary amounts in SettleFlow are `rust_decimal::Decimal` held at
//! [`crate::constants::AMOUNT_SCALE`] decimal places. This module carries the
//! currency alias and the bank/payee snapshots captured on payables.

use serde::{Deserialize, Serialize};

/// Type alias for ISO-style currency codes (e.g., "CNY", "USD").
pub type Currency = String;

/// A bank account snapshot: enough to route a disbursement.
///
/// Captured at payable creation time and immutable thereafter — a payee
/// changing their master-data account later must not retarget an already
/// approved payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Account holder name as registered at the bank.
    pub holder: String,
    /// Bank (and branch) name.
    pub bank_name: String,
    /// Account number.
    pub account_no: String,
}

impl BankAccount {
    #[must_use]
    pub fn new(
        holder: impl Into<String>,
        bank_name: impl Into<String>,
        account_no: impl Into<String>,
    ) -> Self {
        Self {
            holder: holder.into(),
            bank_name: bank_name.into(),
            account_no: account_no.into(),
        }
    }

    /// Whether all routing fields are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.holder.is_empty() && !self.bank_name.is_empty() && !self.account_no.is_empty()
    }
}

/// Payee identity plus bank snapshot, as stored on a [`crate::Payable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeeSnapshot {
    /// Display name of the payee (supplier, carrier, employee).
    pub name: String,
    /// Bank account the disbursement should target.
    pub account: BankAccount,
}

impl PayeeSnapshot {
    #[must_use]
    pub fn new(name: impl Into<String>, account: BankAccount) -> Self {
        Self {
            name: name.into(),
            account,
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl PayeeSnapshot {
    pub fn dummy() -> Self {
        Self::new(
            "Acme Trading Co.",
            BankAccount::new("Acme Trading Co.", "First Commercial Bank", "6222-0001-0001"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_account() {
        let acct = BankAccount::new("A", "B", "C");
        assert!(acct.is_complete());
    }

    #[test]
    fn incomplete_account() {
        let acct = BankAccount::new("A", "", "C");
        assert!(!acct.is_complete());
    }

    #[test]
    fn payee_serde_roundtrip() {
        let payee = PayeeSnapshot::dummy();
        let json = serde_json::to_string(&payee).unwrap();
        let back: PayeeSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(payee, back);
    }
}
