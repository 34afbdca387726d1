//! Invoicing domain module.
//!
//! Owns the single draft invoice, the archived history and the persistent
//! invoice-number counter. Reads part state from `partsbin-inventory` and
//! decrements stock on commit; the inventory never depends on this crate.

pub mod book;
pub mod invoice;

pub use book::{InvoiceBook, InvoicingError};
pub use invoice::{Invoice, InvoiceStatus, LineItem};
