//! Per-source callback protocol.
//!
//! Each source module (procurement, logistics, expense) registers one
//! handler for its `SourceType`. The engine resolves handlers at call time
//! through an explicit registry — a closed tagged dispatch, not open-ended
//! duck typing — so an unregistered source type fails loudly with
//! `SF_ERR_600` instead of silently no-opping.
//!
//! On rejection the handler reverts the originating document to its
//! pre-submission status, clears any finance-linkage id it holds, and
//! appends an audit note carrying the rejection reason. On full payment the
//! handler advances its document to a terminal "paid" sub-state and
//! propagates that state to the document's own dependent child records.

use std::collections::HashMap;

use settleflow_types::{Payable, Result, SettleflowError, SourceType};

/// Capability a source module registers for its own payables.
pub trait SourceCallback {
    /// The payable was rejected; `payable.rejection_reason` carries the
    /// reviewer's reason.
    fn on_rejected(&mut self, payable: &Payable) -> Result<()>;

    /// The payable reached exact full payment.
    fn on_paid(&mut self, payable: &Payable) -> Result<()>;
}

/// Registry of per-source-type callback handlers.
///
/// Constructed per transaction scope and injected into the `PayableBook`
/// operations — never a global.
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<SourceType, Box<dyn SourceCallback>>,
}

impl CallbackRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register (or replace) the handler for a source type.
    pub fn register(&mut self, source_type: SourceType, handler: Box<dyn SourceCallback>) {
        self.handlers.insert(source_type, handler);
    }

    /// Whether a handler is registered for the source type.
    #[must_use]
    pub fn is_registered(&self, source_type: SourceType) -> bool {
        self.handlers.contains_key(&source_type)
    }

    /// Fail with `CallbackNotRegistered` unless a handler exists.
    ///
    /// Engines call this *before* mutating state, so a missing handler
    /// aborts with zero side effects.
    pub fn ensure_registered(&self, source_type: SourceType) -> Result<()> {
        if self.is_registered(source_type) {
            Ok(())
        } else {
            Err(SettleflowError::CallbackNotRegistered(source_type))
        }
    }

    /// Dispatch the rejection callback for a payable.
    pub fn dispatch_rejected(&mut self, payable: &Payable) -> Result<()> {
        self.handler(payable.source_type)?.on_rejected(payable)
    }

    /// Dispatch the full-payment callback for a payable.
    pub fn dispatch_paid(&mut self, payable: &Payable) -> Result<()> {
        self.handler(payable.source_type)?.on_paid(payable)
    }

    fn handler(&mut self, source_type: SourceType) -> Result<&mut Box<dyn SourceCallback>> {
        self.handlers
            .get_mut(&source_type)
            .ok_or(SettleflowError::CallbackNotRegistered(source_type))
    }
}
