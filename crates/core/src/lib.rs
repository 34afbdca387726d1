//! `partsbin-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage or IO concerns).

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{InvoiceId, InvoiceNumber, PartId};
pub use money::{Decimal, coerce_amount, coerce_quantity};
