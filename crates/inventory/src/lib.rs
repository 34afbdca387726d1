//! Inventory domain module.
//!
//! Owns the list of stocked parts: create with duplicate-code routing,
//! in-place update, delete, filtered queries, derived aggregates, CSV
//! round-trip and QR label payloads. State is mirrored to the key-value
//! store after every mutation.

pub mod csv;
pub mod label;
pub mod part;
pub mod store;

pub use csv::{ImportReport, template_csv};
pub use label::{LabelArt, LabelRenderer, label_payload, render_label_with_fallback};
pub use part::{CreateOutcome, Part, PartDraft, PendingPart};
pub use store::{Aggregates, InventoryError, InventoryStore, LOW_STOCK_THRESHOLD, PartFilter};
