//! CSV round-trip for the part list.
//!
//! The format is what the shop's spreadsheets already consume: UTF-8 with a
//! byte-order marker, a header row, string fields double-quoted, numeric
//! fields bare. Import maps columns by header name (order-independent) and
//! splits rows on commas with NO quote-escape handling. That is a known,
//! documented limitation: commas inside quoted fields will corrupt parsing.

use std::collections::HashMap;

use partsbin_core::{coerce_amount, coerce_quantity};
use partsbin_storage::KeyValueStore;

use crate::part::PartDraft;
use crate::store::{InventoryError, InventoryStore};

/// Byte-order marker prefixed to exports for spreadsheet compatibility.
const BOM: char = '\u{feff}';

const HEADERS: [&str; 8] = [
    "company",
    "productCode",
    "partName",
    "carModel",
    "modelYear",
    "quantity",
    "buyPrice",
    "sellPrice",
];

/// Outcome of a CSV import. Per-row errors never abort the run: malformed
/// rows are skipped and reported, valid rows still commit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportReport {
    /// Rows merged or appended.
    pub success: usize,
    /// One message per rejected row, tagged with its 1-based data line.
    pub errors: Vec<String>,
    /// Data rows processed (blank lines excluded).
    pub total: usize,
}

/// Header row plus one example row, for download as a starting template.
pub fn template_csv() -> String {
    let example = [
        "Toyota",
        "TYT-2023-BRK",
        "Brake Pad",
        "Camry",
        "2023",
        "10",
        "25.50",
        "45.99",
    ];
    format!("{BOM}{}\n{}", HEADERS.join(","), example.join(","))
}

/// Strip one pair of surrounding double quotes, the way export writes them.
fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(raw)
}

impl<S: KeyValueStore> InventoryStore<S> {
    /// Render the whole part list as CSV, in storage order.
    pub fn export_csv(&self) -> String {
        let mut out = String::new();
        out.push(BOM);
        out.push_str(&HEADERS.join(","));
        for part in self.parts() {
            out.push('\n');
            out.push_str(&format!(
                "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",{},{},{}",
                part.company,
                part.product_code,
                part.part_name,
                part.car_model,
                part.model_year,
                part.quantity,
                part.buy_price,
                part.sell_price,
            ));
        }
        out
    }

    /// Apply a CSV payload: rows whose product code matches an existing part
    /// overwrite its fields in place (id kept), the rest append under fresh
    /// ids. No price validation happens here; import merges as-is.
    ///
    /// Persists at the end regardless of per-row errors.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportReport, InventoryError> {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());

        let Some(header_line) = lines.next() else {
            return Ok(ImportReport::default());
        };
        let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();

        let mut report = ImportReport::default();
        for (index, line) in lines.enumerate() {
            report.total += 1;
            let line_no = index + 1;

            let values: Vec<&str> = line.split(',').collect();
            let mut record: HashMap<&str, &str> = HashMap::new();
            for (position, header) in headers.iter().enumerate() {
                let value = values.get(position).map(|v| unquote(v.trim())).unwrap_or("");
                record.insert(header, value);
            }
            let field = |name: &str| record.get(name).copied().unwrap_or("");

            let product_code = field("productCode");
            let part_name = field("partName");
            if product_code.is_empty() || part_name.is_empty() {
                report
                    .errors
                    .push(format!("Line {line_no}: missing required fields"));
                continue;
            }

            let draft = PartDraft {
                company: field("company").to_string(),
                product_code: product_code.to_string(),
                part_name: part_name.to_string(),
                car_model: field("carModel").to_string(),
                model_year: field("modelYear").to_string(),
                quantity: coerce_quantity(field("quantity"), 1),
                buy_price: coerce_amount(field("buyPrice")),
                sell_price: coerce_amount(field("sellPrice")),
            };

            match self
                .parts
                .iter()
                .position(|part| part.product_code == draft.product_code)
            {
                Some(index) => {
                    let id = self.parts[index].id;
                    self.parts[index] = draft.into_part(id);
                }
                None => {
                    let id = self.next_id();
                    self.parts.push(draft.into_part(id));
                }
            }
            report.success += 1;
        }

        self.persist()?;
        tracing::info!(
            success = report.success,
            errors = report.errors.len(),
            "imported csv"
        );
        Ok(report)
    }
}
