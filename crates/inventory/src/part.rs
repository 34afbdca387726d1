use partsbin_core::{DomainError, DomainResult, PartId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One stocked auto part.
///
/// Serialized camelCase so persisted JSON and the CSV headers share one set
/// of field names. `product_code` is the natural dedup key; uniqueness is
/// routed at create time, never enforced structurally (the shop legitimately
/// re-stocks the same code as a distinct record after `resolve_as_new`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: PartId,
    pub company: String,
    pub product_code: String,
    pub part_name: String,
    pub car_model: String,
    pub model_year: String,
    pub quantity: u32,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}

/// Field values for a part as entered in the add/edit form (or one CSV row).
///
/// Raw text goes through `partsbin_core::money` coercion before it lands
/// here; this struct is already typed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartDraft {
    pub company: String,
    pub product_code: String,
    pub part_name: String,
    pub car_model: String,
    pub model_year: String,
    pub quantity: u32,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}

impl PartDraft {
    /// Price rules checked at create/update time.
    ///
    /// CSV import never calls this: imported rows are merged as-is.
    pub(crate) fn validate_prices(&self) -> DomainResult<()> {
        if self.buy_price < Decimal::ZERO || self.sell_price < Decimal::ZERO {
            return Err(DomainError::validation("prices cannot be negative"));
        }
        if self.sell_price < self.buy_price {
            return Err(DomainError::validation(
                "sell price cannot be below buy price",
            ));
        }
        Ok(())
    }

    pub(crate) fn into_part(self, id: PartId) -> Part {
        Part {
            id,
            company: self.company,
            product_code: self.product_code,
            part_name: self.part_name,
            car_model: self.car_model,
            model_year: self.model_year,
            quantity: self.quantity,
            buy_price: self.buy_price,
            sell_price: self.sell_price,
        }
    }
}

/// A validated draft whose product code collided with an existing part.
///
/// Carries no id and is not persisted; the caller must route it through
/// `resolve_as_new` (keep both) or `resolve_as_edit` (edit the existing one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPart {
    pub(crate) draft: PartDraft,
}

impl PendingPart {
    pub fn draft(&self) -> &PartDraft {
        &self.draft
    }
}

/// Result of `create`: either a stored part or a routed duplicate decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Part),
    Duplicate(PendingPart),
}
