use chrono::{DateTime, Utc};
use partsbin_core::{InvoiceId, InvoiceNumber, PartId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice lifecycle. `commit` is the only Draft -> Archived transition and
/// there is no way back; archived entries only ever leave the history by
/// explicit deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Archived,
}

/// One invoice row: sourced from stock (with a snapshot of the part at add
/// time) or entered by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LineItem {
    /// Stock-sourced line. Merged by part id: adding the same part again
    /// raises `quantity` instead of appending a second row.
    #[serde(rename = "inventory")]
    #[serde(rename_all = "camelCase")]
    Stock {
        part_id: PartId,
        code: String,
        description: String,
        unit_price: Decimal,
        car_model: String,
        quantity: u32,
    },
    /// Hand-entered line. Never merged, even with an identical description.
    #[serde(rename_all = "camelCase")]
    Manual {
        description: String,
        unit_price: Decimal,
        quantity: u32,
    },
}

impl LineItem {
    pub fn quantity(&self) -> u32 {
        match self {
            LineItem::Stock { quantity, .. } | LineItem::Manual { quantity, .. } => *quantity,
        }
    }

    pub fn unit_price(&self) -> Decimal {
        match self {
            LineItem::Stock { unit_price, .. } | LineItem::Manual { unit_price, .. } => *unit_price,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            LineItem::Stock { description, .. } | LineItem::Manual { description, .. } => {
                description
            }
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity())
    }
}

/// A customer invoice: either the single mutable draft or an archived
/// history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: InvoiceNumber,
    pub customer_name: String,
    pub customer_phone: String,
    pub date: String,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub grand_total: Decimal,
    pub status: InvoiceStatus,
    pub committed_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub(crate) fn draft(id: InvoiceId, invoice_number: InvoiceNumber) -> Self {
        Self {
            id,
            invoice_number,
            customer_name: String::new(),
            customer_phone: String::new(),
            date: String::new(),
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            status: InvoiceStatus::Draft,
            committed_at: None,
        }
    }

    /// `subtotal = sum(unit_price * quantity)`; the grand total mirrors it
    /// (no tax or discount layer).
    pub fn recompute_totals(&mut self) {
        self.subtotal = self.items.iter().map(LineItem::line_total).sum();
        self.grand_total = self.subtotal;
    }
}
