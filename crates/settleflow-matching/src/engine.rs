//! The matching engine: greedy, chronological, all-or-nothing.
//!
//! `match_declaration` computes a pure preview. `confirm_match` recomputes
//! the plan under current data immediately before mutating, closing the
//! preview-to-commit race window, and commits only a fully matchable
//! result. `cancel_match` is the exact logical inverse: it deletes the
//! declaration's match records and recomputes every touched invoice's
//! status from scratch, never by decrementing deltas.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use settleflow_types::{
    constants, CounterpartyId, Declaration, DeclarationId, DeclarationItem, DeclarationStatus,
    Invoice, InvoiceId, InvoiceLine, InvoiceLineId, InvoiceStatus, MatchRecord, MatchRecordId,
    ProductId, Result, SettleflowError,
};

use crate::catalog::CommodityCatalog;
use crate::plan::{ItemOutcome, ItemPlan, MatchPreview, PlannedTake};

/// Owns invoices, declarations and the match records bridging them.
pub struct MatchingEngine {
    invoices: HashMap<InvoiceId, Invoice>,
    lines: HashMap<InvoiceLineId, InvoiceLine>,
    declarations: HashMap<DeclarationId, Declaration>,
    records: HashMap<MatchRecordId, MatchRecord>,
}

impl MatchingEngine {
    /// Create an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            invoices: HashMap::new(),
            lines: HashMap::new(),
            declarations: HashMap::new(),
            records: HashMap::new(),
        }
    }

    /// Intake an invoice with its commodity lines. Quantities are rounded
    /// to the quantity scale.
    ///
    /// # Errors
    /// `InvalidInvoice` for an empty invoice number, no lines, a blank
    /// commodity name or a non-positive quantity.
    pub fn register_invoice(
        &mut self,
        counterparty: CounterpartyId,
        invoice_no: &str,
        lines: &[(&str, Decimal)],
    ) -> Result<InvoiceId> {
        if invoice_no.trim().is_empty() {
            return Err(SettleflowError::InvalidInvoice {
                reason: "invoice number is required".into(),
            });
        }
        if lines.is_empty() {
            return Err(SettleflowError::InvalidInvoice {
                reason: "an invoice needs at least one commodity line".into(),
            });
        }
        for &(commodity, quantity) in lines {
            if commodity.trim().is_empty() {
                return Err(SettleflowError::InvalidInvoice {
                    reason: "commodity name must be non-empty".into(),
                });
            }
            if quantity <= Decimal::ZERO {
                return Err(SettleflowError::InvalidInvoice {
                    reason: format!("line quantity must be positive, got {quantity}"),
                });
            }
        }

        let invoice = Invoice::new(counterparty, invoice_no);
        let id = invoice.id;
        for &(commodity, quantity) in lines {
            let line =
                InvoiceLine::new(id, commodity, quantity.round_dp(constants::QTY_SCALE));
            self.lines.insert(line.id, line);
        }
        tracing::debug!(invoice = %id, invoice_no, lines = lines.len(), "Invoice registered");
        self.invoices.insert(id, invoice);
        Ok(id)
    }

    /// Intake a declaration with its required quantities.
    ///
    /// # Errors
    /// `InvalidDeclaration` for an empty item list or a non-positive
    /// required quantity.
    pub fn register_declaration(
        &mut self,
        items: &[(ProductId, Decimal)],
    ) -> Result<DeclarationId> {
        if items.is_empty() {
            return Err(SettleflowError::InvalidDeclaration {
                reason: "a declaration needs at least one item".into(),
            });
        }
        for &(_, qty) in items {
            if qty <= Decimal::ZERO {
                return Err(SettleflowError::InvalidDeclaration {
                    reason: format!("required quantity must be positive, got {qty}"),
                });
            }
        }

        let mut declaration = Declaration::new();
        let id = declaration.id;
        declaration.items = items
            .iter()
            .map(|&(product, qty)| {
                DeclarationItem::new(id, product, qty.round_dp(constants::QTY_SCALE))
            })
            .collect();
        tracing::debug!(declaration = %id, items = items.len(), "Declaration registered");
        self.declarations.insert(id, declaration);
        Ok(id)
    }

    /// Compute the matching preview for an `EDITABLE` declaration. Pure:
    /// no state changes.
    ///
    /// # Errors
    /// - `DeclarationNotFound` / `DeclarationNotEditable`
    pub fn match_declaration(
        &self,
        catalog: &dyn CommodityCatalog,
        declaration_id: DeclarationId,
    ) -> Result<MatchPreview> {
        let declaration = self.expect_declaration(declaration_id)?;
        if declaration.status != DeclarationStatus::Editable {
            return Err(SettleflowError::DeclarationNotEditable {
                id: declaration_id,
                status: declaration.status,
            });
        }
        Ok(self.compute_plan(catalog, declaration))
    }

    /// Confirm a match: recompute the plan under current data, and if every
    /// item is satisfiable, persist one `MatchRecord` per planned take,
    /// recompute touched invoice statuses, and advance the declaration to
    /// `PRE_DECLARED`. Refuses with zero side effects otherwise.
    ///
    /// # Errors
    /// - `DeclarationNotFound` / `DeclarationNotEditable`
    /// - `DeclarationNotMatchable` when any item falls short or lacks a
    ///   commodity mapping
    pub fn confirm_match(
        &mut self,
        catalog: &dyn CommodityCatalog,
        declaration_id: DeclarationId,
    ) -> Result<MatchPreview> {
        let preview = self.match_declaration(catalog, declaration_id)?;
        if !preview.is_matchable() {
            return Err(SettleflowError::DeclarationNotMatchable {
                id: declaration_id,
                failed_items: preview.failed_items(),
            });
        }

        let mut touched: HashSet<InvoiceId> = HashSet::new();
        for plan in &preview.items {
            for take in &plan.takes {
                let record = MatchRecord::new(plan.item_id, take.invoice_line_id, take.quantity);
                self.records.insert(record.id, record);
                touched.insert(take.invoice_id);
            }
        }
        for invoice_id in touched {
            self.recompute_invoice_status(invoice_id);
        }

        let declaration = self
            .declarations
            .get_mut(&declaration_id)
            .expect("declaration present since preview");
        declaration.status = DeclarationStatus::PreDeclared;

        tracing::info!(
            declaration = %declaration_id,
            items = preview.items.len(),
            records = preview.items.iter().map(|p| p.takes.len()).sum::<usize>(),
            "Match confirmed"
        );
        Ok(preview)
    }

    /// Cancel a confirmed match: delete every match record tied to the
    /// declaration's items, recompute touched invoice statuses from
    /// scratch, and revert the declaration to `EDITABLE`. Returns the
    /// number of records removed.
    ///
    /// # Errors
    /// - `DeclarationNotFound` / `DeclarationNotPreDeclared`
    pub fn cancel_match(&mut self, declaration_id: DeclarationId) -> Result<usize> {
        let declaration = self.expect_declaration(declaration_id)?;
        if declaration.status != DeclarationStatus::PreDeclared {
            return Err(SettleflowError::DeclarationNotPreDeclared {
                id: declaration_id,
                status: declaration.status,
            });
        }

        let item_ids: HashSet<_> = declaration.items.iter().map(|i| i.id).collect();
        let doomed: Vec<MatchRecordId> = self
            .records
            .values()
            .filter(|r| item_ids.contains(&r.declaration_item_id))
            .map(|r| r.id)
            .collect();

        let mut touched: HashSet<InvoiceId> = HashSet::new();
        for id in &doomed {
            if let Some(record) = self.records.remove(id) {
                if let Some(line) = self.lines.get(&record.invoice_line_id) {
                    touched.insert(line.invoice_id);
                }
            }
        }
        for invoice_id in touched {
            self.recompute_invoice_status(invoice_id);
        }

        let declaration = self
            .declarations
            .get_mut(&declaration_id)
            .expect("declaration present since status check");
        declaration.status = DeclarationStatus::Editable;

        tracing::info!(declaration = %declaration_id, records = doomed.len(), "Match cancelled");
        Ok(doomed.len())
    }

    /// Quantity on a line not yet consumed by committed match records.
    ///
    /// # Errors
    /// `InvoiceLineNotFound` if the line id is unknown.
    pub fn remaining_quantity(&self, line_id: InvoiceLineId) -> Result<Decimal> {
        let line = self
            .lines
            .get(&line_id)
            .ok_or(SettleflowError::InvoiceLineNotFound(line_id))?;
        Ok(line.quantity - self.matched_quantity(line_id))
    }

    /// Current derived status of an invoice.
    ///
    /// # Errors
    /// `InvoiceNotFound` if the id is unknown.
    pub fn invoice_status(&self, id: InvoiceId) -> Result<InvoiceStatus> {
        self.invoices
            .get(&id)
            .map(|inv| inv.status)
            .ok_or(SettleflowError::InvoiceNotFound(id))
    }

    /// Look up an invoice by id.
    #[must_use]
    pub fn invoice(&self, id: InvoiceId) -> Option<&Invoice> {
        self.invoices.get(&id)
    }

    /// Look up a declaration by id.
    #[must_use]
    pub fn declaration(&self, id: DeclarationId) -> Option<&Declaration> {
        self.declarations.get(&id)
    }

    /// Look up a declaration, failing with `DeclarationNotFound`.
    pub fn expect_declaration(&self, id: DeclarationId) -> Result<&Declaration> {
        self.declarations
            .get(&id)
            .ok_or(SettleflowError::DeclarationNotFound(id))
    }

    /// Lines of an invoice, in stable id order.
    #[must_use]
    pub fn lines_for_invoice(&self, invoice_id: InvoiceId) -> Vec<&InvoiceLine> {
        let mut lines: Vec<&InvoiceLine> = self
            .lines
            .values()
            .filter(|l| l.invoice_id == invoice_id)
            .collect();
        lines.sort_by_key(|l| l.id);
        lines
    }

    /// Committed match records backing a declaration, oldest first.
    #[must_use]
    pub fn records_for(&self, declaration_id: DeclarationId) -> Vec<&MatchRecord> {
        let Some(declaration) = self.declarations.get(&declaration_id) else {
            return Vec::new();
        };
        let item_ids: HashSet<_> = declaration.items.iter().map(|i| i.id).collect();
        let mut records: Vec<&MatchRecord> = self
            .records
            .values()
            .filter(|r| item_ids.contains(&r.declaration_item_id))
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// The greedy pass. Items of the same declaration compete for quantity
    /// through a shared `planned` map, but a failed item's tentative takes
    /// are discarded and never constrain later items.
    fn compute_plan(
        &self,
        catalog: &dyn CommodityCatalog,
        declaration: &Declaration,
    ) -> MatchPreview {
        let mut planned: HashMap<InvoiceLineId, Decimal> = HashMap::new();
        let mut items = Vec::with_capacity(declaration.items.len());

        for item in &declaration.items {
            let Some(commodity) = catalog.declared_name(item.product) else {
                items.push(ItemPlan {
                    item_id: item.id,
                    commodity: None,
                    required_qty: item.required_qty,
                    outcome: ItemOutcome::MissingMapping,
                    takes: Vec::new(),
                });
                continue;
            };

            let mut need = item.required_qty;
            let mut tentative: Vec<PlannedTake> = Vec::new();
            for line in self.candidates(commodity) {
                let already = self.matched_quantity(line.id)
                    + planned.get(&line.id).copied().unwrap_or(Decimal::ZERO);
                let available = line.quantity - already;
                if available <= Decimal::ZERO {
                    continue;
                }
                let take = available.min(need);
                tentative.push(PlannedTake {
                    invoice_id: line.invoice_id,
                    invoice_line_id: line.id,
                    quantity: take,
                });
                need -= take;
                if need == Decimal::ZERO {
                    break;
                }
            }

            if need == Decimal::ZERO {
                for take in &tentative {
                    *planned.entry(take.invoice_line_id).or_insert(Decimal::ZERO) +=
                        take.quantity;
                }
                items.push(ItemPlan {
                    item_id: item.id,
                    commodity: Some(commodity.to_string()),
                    required_qty: item.required_qty,
                    outcome: ItemOutcome::Satisfied,
                    takes: tentative,
                });
            } else {
                items.push(ItemPlan {
                    item_id: item.id,
                    commodity: Some(commodity.to_string()),
                    required_qty: item.required_qty,
                    outcome: ItemOutcome::Shortfall {
                        available: item.required_qty - need,
                        shortfall: need,
                    },
                    takes: Vec::new(),
                });
            }
        }

        MatchPreview {
            declaration_id: declaration.id,
            items,
        }
    }

    /// Eligible lines for a commodity: lines of non-`LOCKED` invoices,
    /// oldest invoice first, stable ids as tie-break.
    fn candidates(&self, commodity: &str) -> Vec<&InvoiceLine> {
        let mut lines: Vec<&InvoiceLine> = self
            .lines
            .values()
            .filter(|l| l.commodity == commodity)
            .filter(|l| {
                self.invoices
                    .get(&l.invoice_id)
                    .is_some_and(|inv| inv.status != InvoiceStatus::Locked)
            })
            .collect();
        lines.sort_by(|a, b| {
            let inv_a = &self.invoices[&a.invoice_id];
            let inv_b = &self.invoices[&b.invoice_id];
            inv_a
                .created_at
                .cmp(&inv_b.created_at)
                .then_with(|| inv_a.id.cmp(&inv_b.id))
                .then_with(|| a.id.cmp(&b.id))
        });
        lines
    }

    /// Total committed consumption on a line.
    fn matched_quantity(&self, line_id: InvoiceLineId) -> Decimal {
        self.records
            .values()
            .filter(|r| r.invoice_line_id == line_id)
            .map(|r| r.matched_quantity)
            .sum()
    }

    /// Re-derive an invoice's three-way status from current consumption.
    fn recompute_invoice_status(&mut self, invoice_id: InvoiceId) {
        let lines = self.lines_for_invoice(invoice_id);
        let mut all_exhausted = !lines.is_empty();
        let mut any_consumed = false;
        let consumption: Vec<(Decimal, Decimal)> = lines
            .iter()
            .map(|l| (l.quantity, self.matched_quantity(l.id)))
            .collect();
        for (quantity, matched) in consumption {
            if matched > Decimal::ZERO {
                any_consumed = true;
            }
            if matched < quantity {
                all_exhausted = false;
            }
        }
        let status = if all_exhausted {
            InvoiceStatus::Locked
        } else if any_consumed {
            InvoiceStatus::Reserved
        } else {
            InvoiceStatus::Free
        };
        if let Some(invoice) = self.invoices.get_mut(&invoice_id) {
            if invoice.status != status {
                tracing::debug!(invoice = %invoice_id, %status, "Invoice status recomputed");
            }
            invoice.status = status;
        }
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
