//! System-wide constants for the SettleFlow core.

/// Decimal places kept on every monetary amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Decimal places kept on invoice / declaration quantities.
pub const QTY_SCALE: u32 = 4;

/// Default priority assigned to auto-created queue entries.
pub const DEFAULT_ENTRY_PRIORITY: u32 = 0;

/// Maximum queue entries consumable by a single payment execution.
pub const MAX_ENTRIES_PER_EXECUTION: usize = 1_000;

/// Maximum obligations aggregatable into a single settlement statement.
pub const MAX_OBLIGATIONS_PER_STATEMENT: usize = 500;

/// `chrono` format string for disbursement pool periods.
pub const POOL_PERIOD_FORMAT: &str = "%Y-%m";

/// Default currency applied when the caller supplies none.
pub const DEFAULT_CURRENCY: &str = "CNY";
