//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a stocked part.
///
/// Assigned monotonically at creation: max existing id + 1, or 1 when the
/// inventory is empty.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(u64);

/// Identifier of an invoice: its creation timestamp in Unix milliseconds.
///
/// Monotonic enough for a single-user, single-tab lifetime; never used for
/// ordering guarantees beyond that.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $int:ty, $name:literal) => {
        impl $t {
            pub fn from_raw(value: $int) -> Self {
                Self(value)
            }

            pub fn as_raw(&self) -> $int {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$int> for $t {
            fn from(value: $int) -> Self {
                Self(value)
            }
        }

        impl From<$t> for $int {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<$int>()
                    .map_err(|e| DomainError::validation(format!("{}: {}", $name, e)))?;
                Ok(Self(raw))
            }
        }
    };
}

impl_int_newtype!(PartId, u64, "PartId");
impl_int_newtype!(InvoiceId, i64, "InvoiceId");

impl PartId {
    /// First id handed out on an empty inventory.
    pub const FIRST: PartId = PartId(1);

    pub fn next(self) -> PartId {
        PartId(self.0 + 1)
    }
}

impl InvoiceId {
    /// Stamp an id from the creation instant.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(now.timestamp_millis())
    }
}

/// Printed invoice number: fixed prefix plus a 7-digit zero-padded sequence,
/// e.g. `INV-0000001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    pub const PREFIX: &'static str = "INV-";
    const SEQUENCE_WIDTH: usize = 7;

    /// Format a counter value into a printed number.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!(
            "{}{:0width$}",
            Self::PREFIX,
            sequence,
            width = Self::SEQUENCE_WIDTH
        ))
    }

    /// Parse the sequence back out of a stored number.
    ///
    /// Returns `None` when the stored text does not carry the expected
    /// prefix; counter recovery skips such entries.
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
