//! Names of the persisted keys.
//!
//! Key names are part of the on-disk format; renaming one orphans the data
//! already stored under it.

/// JSON array of parts.
pub const INVENTORY: &str = "inventory";

/// JSON array of archived invoices.
pub const INVOICE_HISTORY: &str = "invoiceHistory";

/// Integer counter backing invoice numbers.
pub const INVOICE_COUNTER: &str = "invoiceCounter";
