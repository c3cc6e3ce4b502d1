//! Engine configuration.
//!
//! The core is constructed per request/transaction scope with an explicit
//! `EngineConfig` — there are no module-level singletons. Tests pin the
//! pool period to get deterministic pool identities.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{constants, Currency};

/// Configuration for the settlement / disbursement engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Currency applied when upstream documents supply none.
    pub default_currency: Currency,
    /// Fixed pool period override (`YYYY-MM`). `None` means "current month".
    pub pool_period: Option<String>,
}

impl EngineConfig {
    /// The accounting period used for lazy disbursement-pool creation.
    #[must_use]
    pub fn period(&self) -> String {
        self.pool_period
            .clone()
            .unwrap_or_else(|| Utc::now().format(constants::POOL_PERIOD_FORMAT).to_string())
    }

    /// Config with a pinned pool period (deterministic pool identities).
    #[must_use]
    pub fn with_period(period: impl Into<String>) -> Self {
        Self {
            pool_period: Some(period.into()),
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_currency: constants::DEFAULT_CURRENCY.to_string(),
            pool_period: None,
        }
    }
}
