//! The invoice book: one draft, the archived history, the number counter.

use chrono::{DateTime, Utc};
use partsbin_core::{DomainError, InvoiceId, InvoiceNumber, PartId};
use partsbin_inventory::{InventoryError, InventoryStore};
use partsbin_storage::{KeyValueStore, StorageError, keys};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::invoice::{Invoice, InvoiceStatus, LineItem};

/// Failures surfaced by invoice operations.
#[derive(Debug, Error)]
pub enum InvoicingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// Owns the draft invoice, the history and the persistent counter.
///
/// Timestamps are supplied by the caller (`now`), so ids and commit stamps
/// stay deterministic under test. Inventory access is passed in per call:
/// invoicing reads and decrements stock, the inventory never looks back.
#[derive(Debug)]
pub struct InvoiceBook<S: KeyValueStore> {
    kv: S,
    draft: Invoice,
    history: Vec<Invoice>,
    /// Next sequence to issue. Persisted on every draw.
    counter: u64,
}

impl<S: KeyValueStore> InvoiceBook<S> {
    /// Restore history and the counter, then open the first draft.
    ///
    /// Counter recovery order: the persisted value if present, else the
    /// highest sequence found in history + 1, else 1. Opening the draft
    /// already consumes a number; an abandoned draft burns its number
    /// permanently. Intentional, not a bug.
    pub fn load(kv: S, now: DateTime<Utc>) -> Result<Self, InvoicingError> {
        let history = kv
            .get_json::<Vec<Invoice>>(keys::INVOICE_HISTORY)?
            .unwrap_or_default();
        let counter = match kv.get_json::<u64>(keys::INVOICE_COUNTER)? {
            Some(value) => value,
            None => history
                .iter()
                .filter_map(|invoice| invoice.invoice_number.sequence())
                .max()
                .map_or(1, |max| max + 1),
        };
        tracing::debug!(history = history.len(), counter, "loaded invoice book");

        let mut book = Self {
            kv,
            draft: Invoice::draft(InvoiceId::at(now), InvoiceNumber::from_sequence(counter)),
            history,
            counter: counter + 1,
        };
        book.persist_counter()?;
        Ok(book)
    }

    pub fn draft(&self) -> &Invoice {
        &self.draft
    }

    pub fn history(&self) -> &[Invoice] {
        &self.history
    }

    /// Start a fresh draft, discarding the current one.
    ///
    /// Draws (and persists) the next invoice number; the discarded draft's
    /// number is permanently consumed.
    pub fn create_draft(&mut self, now: DateTime<Utc>) -> Result<&Invoice, InvoicingError> {
        let number = InvoiceNumber::from_sequence(self.counter);
        self.counter += 1;
        self.persist_counter()?;
        self.draft = Invoice::draft(InvoiceId::at(now), number);
        tracing::info!(number = %self.draft.invoice_number, "opened invoice draft");
        Ok(&self.draft)
    }

    /// Update the draft's customer fields (free-form; validated at commit).
    pub fn set_customer(
        &mut self,
        name: &str,
        phone: &str,
        date: &str,
    ) -> Result<(), InvoicingError> {
        self.ensure_draft()?;
        self.draft.customer_name = name.to_string();
        self.draft.customer_phone = phone.to_string();
        self.draft.date = date.to_string();
        Ok(())
    }

    /// Add a stock-sourced line, merging by part id.
    ///
    /// The stock check runs against the cumulative requested quantity: adding
    /// 3 more to an existing line of 2 validates 5 against the part's stock,
    /// not just the delta. The check is an early warning at add time;
    /// commit-time clamping stays the authoritative guard.
    pub fn add_from_stock<T: KeyValueStore>(
        &mut self,
        inventory: &InventoryStore<T>,
        part_id: PartId,
        quantity: u32,
    ) -> Result<(), InvoicingError> {
        self.ensure_draft()?;
        if quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1").into());
        }
        let part = inventory.get(part_id).ok_or(DomainError::NotFound)?;

        let already = self
            .draft
            .items
            .iter()
            .find_map(|item| match item {
                LineItem::Stock { part_id: id, quantity, .. } if *id == part_id => Some(*quantity),
                _ => None,
            })
            .unwrap_or(0);

        let requested = already + quantity;
        if requested > part.quantity {
            return Err(DomainError::insufficient_stock(requested, part.quantity).into());
        }

        if already > 0 {
            for item in &mut self.draft.items {
                if let LineItem::Stock { part_id: id, quantity: line_quantity, .. } = item {
                    if *id == part_id {
                        *line_quantity += quantity;
                    }
                }
            }
        } else {
            self.draft.items.push(LineItem::Stock {
                part_id,
                code: part.product_code.clone(),
                description: part.part_name.clone(),
                unit_price: part.sell_price,
                car_model: part.car_model.clone(),
                quantity,
            });
        }
        self.draft.recompute_totals();
        Ok(())
    }

    /// Add a hand-entered line. Manual lines never merge.
    pub fn add_manual(
        &mut self,
        description: &str,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<(), InvoicingError> {
        self.ensure_draft()?;
        if description.trim().is_empty() {
            return Err(DomainError::validation("description cannot be empty").into());
        }
        if unit_price <= Decimal::ZERO {
            return Err(DomainError::validation("unit price must be positive").into());
        }

        // Zero means the quantity field was left blank.
        let quantity = quantity.max(1);
        self.draft.items.push(LineItem::Manual {
            description: description.to_string(),
            unit_price,
            quantity,
        });
        self.draft.recompute_totals();
        Ok(())
    }

    /// Remove a line by position; confirmation is the caller's job.
    pub fn remove_line(&mut self, index: usize) -> Result<(), InvoicingError> {
        self.ensure_draft()?;
        if index >= self.draft.items.len() {
            return Err(DomainError::not_found().into());
        }
        self.draft.items.remove(index);
        self.draft.recompute_totals();
        Ok(())
    }

    /// Commit the draft: archive it and decrement the stock it sold.
    ///
    /// Decrements floor at zero: a committed invoice never drives a part's
    /// quantity negative, whatever the lines requested. On success the
    /// archived copy is returned and a fresh draft (with the next number) is
    /// opened.
    pub fn commit<T: KeyValueStore>(
        &mut self,
        inventory: &mut InventoryStore<T>,
        now: DateTime<Utc>,
    ) -> Result<Invoice, InvoicingError> {
        self.ensure_draft()?;
        if self.draft.customer_name.trim().is_empty() {
            return Err(DomainError::validation("customer name is required").into());
        }
        if self.draft.items.is_empty() {
            return Err(DomainError::validation("invoice needs at least one item").into());
        }

        self.draft.recompute_totals();

        let decrements: Vec<(PartId, u32)> = self
            .draft
            .items
            .iter()
            .filter_map(|item| match item {
                LineItem::Stock { part_id, quantity, .. } => Some((*part_id, *quantity)),
                LineItem::Manual { .. } => None,
            })
            .collect();
        inventory.apply_sale(decrements)?;

        self.draft.status = InvoiceStatus::Archived;
        self.draft.committed_at = Some(now);

        let archived = self.draft.clone();
        self.history.push(archived.clone());
        self.persist_history()?;
        tracing::info!(
            number = %archived.invoice_number,
            total = %archived.grand_total,
            "committed invoice"
        );

        self.create_draft(now)?;
        Ok(archived)
    }

    /// Load an archived invoice into the draft slot for viewing/printing.
    ///
    /// Touches neither stock nor the counter. The viewed copy keeps its
    /// Archived status, so every mutating operation (including a second
    /// commit) is rejected until `create_draft` opens a real draft again.
    pub fn view_from_history(&mut self, id: InvoiceId) -> Result<&Invoice, InvoicingError> {
        let archived = self
            .history
            .iter()
            .find(|invoice| invoice.id == id)
            .ok_or(DomainError::NotFound)?;
        self.draft = archived.clone();
        Ok(&self.draft)
    }

    /// Remove an archived invoice by id. Idempotent; persists.
    pub fn delete_from_history(&mut self, id: InvoiceId) -> Result<(), InvoicingError> {
        let before = self.history.len();
        self.history.retain(|invoice| invoice.id != id);
        if self.history.len() != before {
            tracing::info!(id = %id, "deleted invoice from history");
        }
        self.persist_history()
    }

    fn ensure_draft(&self) -> Result<(), InvoicingError> {
        if self.draft.status != InvoiceStatus::Draft {
            return Err(DomainError::conflict(
                "a viewed archived invoice cannot be modified; start a new draft",
            )
            .into());
        }
        Ok(())
    }

    fn persist_counter(&mut self) -> Result<(), InvoicingError> {
        self.kv.put_json(keys::INVOICE_COUNTER, &self.counter)?;
        Ok(())
    }

    fn persist_history(&mut self) -> Result<(), InvoicingError> {
        self.kv.put_json(keys::INVOICE_HISTORY, &self.history)?;
        Ok(())
    }
}
