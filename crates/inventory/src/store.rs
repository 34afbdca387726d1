//! The inventory store: the in-memory part list plus its persistence handle.

use partsbin_core::{DomainError, PartId};
use partsbin_storage::{KeyValueStore, StorageError, keys};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::part::{CreateOutcome, Part, PartDraft, PendingPart};

/// Quantity at or below which a part counts as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 2;

/// Failures surfaced by inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Free-text and exact-match filters applied by `query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartFilter {
    /// Case-insensitive substring matched across part name, car model, model
    /// year, company and product code.
    pub text: Option<String>,
    pub company: Option<String>,
    pub car_model: Option<String>,
    pub model_year: Option<String>,
}

impl PartFilter {
    pub fn matches(&self, part: &Part) -> bool {
        if let Some(text) = &self.text {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty() {
                let hit = [
                    &part.part_name,
                    &part.car_model,
                    &part.model_year,
                    &part.company,
                    &part.product_code,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
                if !hit {
                    return false;
                }
            }
        }
        if let Some(company) = &self.company {
            if part.company != *company {
                return false;
            }
        }
        if let Some(car_model) = &self.car_model {
            if part.car_model != *car_model {
                return false;
            }
        }
        if let Some(model_year) = &self.model_year {
            if part.model_year != *model_year {
                return false;
            }
        }
        true
    }
}

/// Derived inventory totals, recomputed on demand.
///
/// The list is small and mutation infrequent, so there is no cache to keep
/// consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregates {
    pub total_items: usize,
    /// Sum of buy prices.
    pub total_cost: Decimal,
    /// Sum of (sell price - buy price). Can go negative after an import that
    /// carried inverted prices; import does not validate.
    pub total_profit: Decimal,
    pub low_stock_count: usize,
}

/// Owns the part list; constructed once at process start via `load`.
///
/// Every mutating operation persists synchronously before returning, so the
/// store and its key-value mirror never drift by more than the operation in
/// flight.
#[derive(Debug)]
pub struct InventoryStore<S: KeyValueStore> {
    pub(crate) kv: S,
    pub(crate) parts: Vec<Part>,
}

impl<S: KeyValueStore> InventoryStore<S> {
    /// Load the part list from the `inventory` key (empty list if absent).
    pub fn load(kv: S) -> Result<Self, InventoryError> {
        let parts = kv.get_json::<Vec<Part>>(keys::INVENTORY)?.unwrap_or_default();
        tracing::debug!(count = parts.len(), "loaded inventory");
        Ok(Self { kv, parts })
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.parts.iter().find(|part| part.id == id)
    }

    pub fn find_by_code(&self, product_code: &str) -> Option<&Part> {
        self.parts
            .iter()
            .find(|part| part.product_code == product_code)
    }

    /// Create a part from a validated draft.
    ///
    /// A colliding product code is not an error: the draft comes back as
    /// `CreateOutcome::Duplicate` and the caller decides between
    /// `resolve_as_new` and `resolve_as_edit`. Nothing is persisted on that
    /// path.
    pub fn create(&mut self, draft: PartDraft) -> Result<CreateOutcome, InventoryError> {
        draft.validate_prices()?;

        if self.find_by_code(&draft.product_code).is_some() {
            tracing::debug!(code = %draft.product_code, "duplicate product code routed");
            return Ok(CreateOutcome::Duplicate(PendingPart { draft }));
        }

        let part = draft.into_part(self.next_id());
        tracing::info!(id = %part.id, code = %part.product_code, "created part");
        self.parts.push(part.clone());
        self.persist()?;
        Ok(CreateOutcome::Created(part))
    }

    /// Keep a routed duplicate as a distinct part under a fresh id.
    pub fn resolve_as_new(&mut self, pending: PendingPart) -> Result<Part, InventoryError> {
        let part = pending.draft.into_part(self.next_id());
        tracing::info!(id = %part.id, code = %part.product_code, "kept duplicate as new part");
        self.parts.push(part.clone());
        self.persist()?;
        Ok(part)
    }

    /// Locate the existing part behind a routed duplicate for the edit flow.
    pub fn resolve_as_edit(&self, product_code: &str) -> Result<&Part, InventoryError> {
        self.find_by_code(product_code)
            .ok_or_else(|| DomainError::not_found().into())
    }

    /// Replace a part's fields in place, re-validating the price rules.
    pub fn update(&mut self, id: PartId, draft: PartDraft) -> Result<Part, InventoryError> {
        draft.validate_prices()?;

        let index = self
            .parts
            .iter()
            .position(|part| part.id == id)
            .ok_or(DomainError::NotFound)?;
        self.parts[index] = draft.into_part(id);
        let updated = self.parts[index].clone();
        self.persist()?;
        tracing::info!(id = %id, "updated part");
        Ok(updated)
    }

    /// Remove a part by id. Idempotent; confirmation is the caller's job.
    pub fn delete(&mut self, id: PartId) -> Result<(), InventoryError> {
        let before = self.parts.len();
        self.parts.retain(|part| part.id != id);
        if self.parts.len() != before {
            tracing::info!(id = %id, "deleted part");
        }
        self.persist()
    }

    /// Lazily filtered view over the part list, in insertion order.
    pub fn query<'a>(&'a self, filter: &'a PartFilter) -> impl Iterator<Item = &'a Part> + 'a {
        self.parts.iter().filter(move |part| filter.matches(part))
    }

    pub fn aggregates(&self) -> Aggregates {
        let mut total_cost = Decimal::ZERO;
        let mut total_profit = Decimal::ZERO;
        let mut low_stock_count = 0;
        for part in &self.parts {
            total_cost += part.buy_price;
            total_profit += part.sell_price - part.buy_price;
            if part.quantity <= LOW_STOCK_THRESHOLD {
                low_stock_count += 1;
            }
        }
        Aggregates {
            total_items: self.parts.len(),
            total_cost,
            total_profit,
            low_stock_count,
        }
    }

    /// Apply the stock decrements of a committed invoice, then persist once.
    ///
    /// Quantities floor at zero: a committed sale never drives stock
    /// negative, whatever the line requested. A part deleted since it was
    /// added to the draft is skipped.
    pub fn apply_sale(
        &mut self,
        lines: impl IntoIterator<Item = (PartId, u32)>,
    ) -> Result<(), InventoryError> {
        for (id, quantity) in lines {
            match self.parts.iter_mut().find(|part| part.id == id) {
                Some(part) => part.quantity = part.quantity.saturating_sub(quantity),
                None => {
                    tracing::warn!(id = %id, "sold part no longer in inventory; skipping decrement")
                }
            }
        }
        self.persist()
    }

    pub(crate) fn next_id(&self) -> PartId {
        self.parts
            .iter()
            .map(|part| part.id)
            .max()
            .map_or(PartId::FIRST, PartId::next)
    }

    pub(crate) fn persist(&mut self) -> Result<(), InventoryError> {
        self.kv.put_json(keys::INVENTORY, &self.parts)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partsbin_storage::MemoryStore;

    fn empty_store() -> InventoryStore<MemoryStore> {
        InventoryStore::load(MemoryStore::new()).unwrap()
    }

    fn draft(code: &str, name: &str, buy: i64, sell: i64, quantity: u32) -> PartDraft {
        PartDraft {
            company: "Toyota".to_string(),
            product_code: code.to_string(),
            part_name: name.to_string(),
            car_model: "Camry".to_string(),
            model_year: "2023".to_string(),
            quantity,
            buy_price: Decimal::from(buy),
            sell_price: Decimal::from(sell),
        }
    }

    fn create_part(store: &mut InventoryStore<MemoryStore>, code: &str, name: &str) -> Part {
        match store.create(draft(code, name, 10, 20, 5)).unwrap() {
            CreateOutcome::Created(part) => part,
            CreateOutcome::Duplicate(_) => panic!("unexpected duplicate for {code}"),
        }
    }

    #[test]
    fn create_assigns_monotonic_ids_from_one() {
        let mut store = empty_store();
        let first = create_part(&mut store, "TYT-1", "Brake Pad");
        let second = create_part(&mut store, "TYT-2", "Oil Filter");

        assert_eq!(first.id, PartId::from_raw(1));
        assert_eq!(second.id, PartId::from_raw(2));
    }

    #[test]
    fn next_id_is_max_plus_one_after_deletes() {
        let mut store = empty_store();
        create_part(&mut store, "TYT-1", "Brake Pad");
        let second = create_part(&mut store, "TYT-2", "Oil Filter");
        create_part(&mut store, "TYT-3", "Air Filter");

        store.delete(second.id).unwrap();
        let fourth = create_part(&mut store, "TYT-4", "Spark Plug");
        assert_eq!(fourth.id, PartId::from_raw(4));
    }

    #[test]
    fn create_rejects_sell_below_buy_without_mutation() {
        let mut store = empty_store();
        let err = store.create(draft("TYT-1", "Brake Pad", 10, 5, 1)).unwrap_err();
        match err {
            InventoryError::Domain(DomainError::Validation(_)) => {}
            _ => panic!("Expected Validation error for sell < buy"),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn duplicate_code_routes_instead_of_overwriting() {
        let mut store = empty_store();
        let original = create_part(&mut store, "TYT-1", "Brake Pad");

        let outcome = store.create(draft("TYT-1", "Brake Pad v2", 12, 25, 3)).unwrap();
        let pending = match outcome {
            CreateOutcome::Duplicate(pending) => pending,
            CreateOutcome::Created(_) => panic!("Expected duplicate routing"),
        };

        // Nothing persisted yet; the original is untouched.
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(original.id).unwrap().part_name, "Brake Pad");
        assert_eq!(pending.draft().part_name, "Brake Pad v2");
    }

    #[test]
    fn resolve_as_new_keeps_both_parts_under_the_same_code() {
        let mut store = empty_store();
        create_part(&mut store, "TYT-1", "Brake Pad");

        let pending = match store.create(draft("TYT-1", "Brake Pad v2", 12, 25, 3)).unwrap() {
            CreateOutcome::Duplicate(pending) => pending,
            CreateOutcome::Created(_) => panic!("Expected duplicate routing"),
        };
        let added = store.resolve_as_new(pending).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(added.id, PartId::from_raw(2));
        assert_eq!(added.product_code, "TYT-1");
    }

    #[test]
    fn resolve_as_edit_finds_the_existing_part() {
        let mut store = empty_store();
        let original = create_part(&mut store, "TYT-1", "Brake Pad");

        let found = store.resolve_as_edit("TYT-1").unwrap();
        assert_eq!(found.id, original.id);

        let err = store.resolve_as_edit("NOPE").unwrap_err();
        match err {
            InventoryError::Domain(DomainError::NotFound) => {}
            _ => panic!("Expected NotFound for unknown code"),
        }
    }

    #[test]
    fn update_replaces_fields_in_place() {
        let mut store = empty_store();
        let part = create_part(&mut store, "TYT-1", "Brake Pad");

        let updated = store
            .update(part.id, draft("TYT-1", "Brake Pad Pro", 15, 30, 8))
            .unwrap();
        assert_eq!(updated.id, part.id);
        assert_eq!(updated.part_name, "Brake Pad Pro");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_rejects_bad_prices_and_leaves_stored_values() {
        let mut store = empty_store();
        let part = create_part(&mut store, "TYT-1", "Brake Pad");

        let err = store
            .update(part.id, draft("TYT-1", "Brake Pad", 10, 5, 5))
            .unwrap_err();
        match err {
            InventoryError::Domain(DomainError::Validation(_)) => {}
            _ => panic!("Expected Validation error"),
        }

        let stored = store.get(part.id).unwrap();
        assert_eq!(stored.buy_price, Decimal::from(10));
        assert_eq!(stored.sell_price, Decimal::from(20));
    }

    #[test]
    fn update_of_missing_id_is_not_found() {
        let mut store = empty_store();
        let err = store
            .update(PartId::from_raw(9), draft("TYT-1", "Brake Pad", 10, 20, 1))
            .unwrap_err();
        match err {
            InventoryError::Domain(DomainError::NotFound) => {}
            _ => panic!("Expected NotFound for missing id"),
        }
    }

    #[test]
    fn delete_is_idempotent() {
        let mut store = empty_store();
        let part = create_part(&mut store, "TYT-1", "Brake Pad");

        store.delete(part.id).unwrap();
        store.delete(part.id).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn query_free_text_is_case_insensitive_across_fields() {
        let mut store = empty_store();
        create_part(&mut store, "TYT-1", "Brake Pad");
        create_part(&mut store, "HND-9", "Oil Filter");

        let filter = PartFilter {
            text: Some("BRAKE".to_string()),
            ..PartFilter::default()
        };
        let hits: Vec<_> = store.query(&filter).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].part_name, "Brake Pad");

        // Product code is searched too.
        let filter = PartFilter {
            text: Some("hnd".to_string()),
            ..PartFilter::default()
        };
        assert_eq!(store.query(&filter).count(), 1);
    }

    #[test]
    fn query_intersects_exact_filters_with_text() {
        let mut store = empty_store();
        create_part(&mut store, "TYT-1", "Brake Pad");
        store
            .create(PartDraft {
                company: "Honda".to_string(),
                car_model: "Civic".to_string(),
                ..draft("HND-1", "Brake Pad", 10, 20, 5)
            })
            .unwrap();

        let filter = PartFilter {
            text: Some("brake".to_string()),
            company: Some("Honda".to_string()),
            ..PartFilter::default()
        };
        let hits: Vec<_> = store.query(&filter).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].company, "Honda");
    }

    #[test]
    fn query_preserves_insertion_order() {
        let mut store = empty_store();
        create_part(&mut store, "TYT-1", "Brake Pad");
        create_part(&mut store, "TYT-2", "Brake Line");
        create_part(&mut store, "TYT-3", "Brake Disc");

        let filter = PartFilter {
            text: Some("brake".to_string()),
            ..PartFilter::default()
        };
        let codes: Vec<_> = store.query(&filter).map(|p| p.product_code.as_str()).collect();
        assert_eq!(codes, ["TYT-1", "TYT-2", "TYT-3"]);
    }

    #[test]
    fn aggregates_sum_costs_profits_and_low_stock() {
        let mut store = empty_store();
        store.create(draft("TYT-1", "Brake Pad", 10, 25, 5)).unwrap();
        store.create(draft("TYT-2", "Oil Filter", 4, 6, 2)).unwrap();
        store.create(draft("TYT-3", "Air Filter", 3, 5, 1)).unwrap();

        let totals = store.aggregates();
        assert_eq!(totals.total_items, 3);
        assert_eq!(totals.total_cost, Decimal::from(17));
        assert_eq!(totals.total_profit, Decimal::from(19));
        // Threshold is inclusive: quantities 2 and 1 count, 5 does not.
        assert_eq!(totals.low_stock_count, 2);
    }

    #[test]
    fn apply_sale_floors_at_zero_and_skips_missing_parts() {
        let mut store = empty_store();
        let part = create_part(&mut store, "TYT-1", "Brake Pad");

        store
            .apply_sale([(part.id, 99), (PartId::from_raw(42), 1)])
            .unwrap();
        assert_eq!(store.get(part.id).unwrap().quantity, 0);
    }

    #[test]
    fn reload_from_shared_store_reconstructs_parts() {
        let kv = MemoryStore::new();
        {
            let mut store = InventoryStore::load(kv.clone()).unwrap();
            create_part(&mut store, "TYT-1", "Brake Pad");
            create_part(&mut store, "TYT-2", "Oil Filter");
        }

        let reloaded = InventoryStore::load(kv).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.find_by_code("TYT-2").unwrap().part_name, "Oil Filter");
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Create { code: String, buy: u32, sell_markup: u32, quantity: u32 },
            UpdateFirst { buy: u32, sell_markup: u32 },
            DeleteFirst,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                ("[A-Z]{3}-[0-9]{1,3}", 0u32..500, 0u32..200, 0u32..10).prop_map(
                    |(code, buy, sell_markup, quantity)| Op::Create {
                        code,
                        buy,
                        sell_markup,
                        quantity,
                    }
                ),
                (0u32..500, 0u32..200)
                    .prop_map(|(buy, sell_markup)| Op::UpdateFirst { buy, sell_markup }),
                Just(Op::DeleteFirst),
            ]
        }

        fn priced_draft(code: &str, buy: u32, sell_markup: u32, quantity: u32) -> PartDraft {
            PartDraft {
                product_code: code.to_string(),
                part_name: "Part".to_string(),
                quantity,
                buy_price: Decimal::from(buy),
                sell_price: Decimal::from(buy + sell_markup),
                ..PartDraft::default()
            }
        }

        proptest! {
            /// Property: total_cost always equals the sum of buy prices over
            /// the current list, for any mutation sequence.
            #[test]
            fn total_cost_tracks_buy_prices(ops in proptest::collection::vec(op_strategy(), 0..40)) {
                let mut store = empty_store();

                for op in ops {
                    match op {
                        Op::Create { code, buy, sell_markup, quantity } => {
                            let outcome = store.create(priced_draft(&code, buy, sell_markup, quantity)).unwrap();
                            if let CreateOutcome::Duplicate(pending) = outcome {
                                store.resolve_as_new(pending).unwrap();
                            }
                        }
                        Op::UpdateFirst { buy, sell_markup } => {
                            if let Some(part) = store.parts().first() {
                                let id = part.id;
                                let code = part.product_code.clone();
                                let quantity = part.quantity;
                                store.update(id, priced_draft(&code, buy, sell_markup, quantity)).unwrap();
                            }
                        }
                        Op::DeleteFirst => {
                            if let Some(part) = store.parts().first() {
                                let id = part.id;
                                store.delete(id).unwrap();
                            }
                        }
                    }

                    let expected: Decimal = store.parts().iter().map(|p| p.buy_price).sum();
                    prop_assert_eq!(store.aggregates().total_cost, expected);
                }
            }

            /// Property: a rejected create leaves the list untouched.
            #[test]
            fn rejected_create_changes_nothing(buy in 1u32..500, shortfall in 1u32..100) {
                let mut store = empty_store();
                store.create(priced_draft("TYT-1", 10, 10, 5)).unwrap();
                let before = store.parts().to_vec();

                let bad = PartDraft {
                    product_code: "TYT-2".to_string(),
                    part_name: "Part".to_string(),
                    buy_price: Decimal::from(buy),
                    sell_price: Decimal::from(buy.saturating_sub(shortfall)),
                    ..PartDraft::default()
                };
                if bad.sell_price < bad.buy_price {
                    prop_assert!(store.create(bad).is_err());
                    prop_assert_eq!(store.parts(), before.as_slice());
                }
            }

            /// Property: apply_sale never leaves a negative quantity and
            /// decrements by exactly min(requested, available).
            #[test]
            fn apply_sale_clamps_at_zero(stock in 0u32..50, requested in 0u32..100) {
                let mut store = empty_store();
                let outcome = store.create(priced_draft("TYT-1", 10, 10, stock)).unwrap();
                let part = match outcome {
                    CreateOutcome::Created(part) => part,
                    CreateOutcome::Duplicate(_) => unreachable!(),
                };

                store.apply_sale([(part.id, requested)]).unwrap();
                let after = store.get(part.id).unwrap().quantity;
                prop_assert_eq!(after, stock.saturating_sub(requested));
            }
        }
    }
}
