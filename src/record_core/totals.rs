//! Per-category totals over the unique records

use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::dedup::UniqueSet;
use super::diagnostics::{Diagnostics, SkipReason, Stage, ValidationSkip};
use super::record::{Record, ID_FIELD};

pub const CATEGORY_FIELD: &str = "category";
pub const PRICE_FIELD: &str = "price";

/// Running price sum. Stays integral until a float or an overflow shows up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PriceSum {
    Integer(i64),
    Float(f64),
}

impl PriceSum {
    pub const ZERO: PriceSum = PriceSum::Integer(0);

    pub fn add(self, price: &Number) -> Self {
        match (self, price.as_i64()) {
            (PriceSum::Integer(total), Some(p)) => match total.checked_add(p) {
                Some(sum) => PriceSum::Integer(sum),
                None => PriceSum::Float(total as f64 + p as f64),
            },
            _ => PriceSum::Float(self.as_f64() + price.as_f64().unwrap_or(0.0)),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            PriceSum::Integer(i) => *i as f64,
            PriceSum::Float(f) => *f,
        }
    }
}

impl Default for PriceSum {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for PriceSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSum::Integer(i) => write!(f, "{}", i),
            PriceSum::Float(v) => write!(f, "{:?}", v),
        }
    }
}

/// Category → summed price and category → item count
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub price_totals: BTreeMap<String, PriceSum>,
    pub item_totals: BTreeMap<String, u64>,
}

impl CategoryTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single pass over `records`, taking each skip's id from the record
    pub fn from_records<'a, I>(records: I, diagnostics: &mut dyn Diagnostics) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut totals = Self::new();
        for record in records {
            totals.add_record(record, record.get(ID_FIELD), diagnostics);
        }
        totals
    }

    /// Single pass over a unique set, rebuilding each key into a record
    pub fn from_unique_set(uniques: &UniqueSet, diagnostics: &mut dyn Diagnostics) -> Self {
        let mut totals = Self::new();
        for (key, id) in uniques.iter() {
            let record = key.to_record(uniques.fields());
            totals.add_record(&record, Some(id), diagnostics);
        }
        totals
    }

    /// Apply one record. Each mapping runs its own validity check, so a bad
    /// price still counts toward item totals.
    pub fn add_record(
        &mut self,
        record: &Record,
        id: Option<&Value>,
        diagnostics: &mut dyn Diagnostics,
    ) {
        let category = match category_of(record) {
            Ok(category) => category,
            Err(reason) => {
                report(diagnostics, Stage::PriceTotals, reason.clone(), id);
                report(diagnostics, Stage::ItemTotals, reason, id);
                return;
            }
        };

        match price_of(record) {
            Ok(price) => {
                let total = self
                    .price_totals
                    .entry(category.clone())
                    .or_insert(PriceSum::ZERO);
                *total = total.add(&price);
            }
            Err(reason) => report(diagnostics, Stage::PriceTotals, reason, id),
        }

        *self.item_totals.entry(category).or_insert(0) += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.price_totals.is_empty() && self.item_totals.is_empty()
    }
}

/// Category key for a record. Any truthy scalar counts and is keyed by its
/// text (`5` → `"5"`); null, `""`, `false` and zero count as missing.
fn category_of(record: &Record) -> Result<String, SkipReason> {
    match record.get(CATEGORY_FIELD) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Err(SkipReason::MissingCategory),
        Some(Value::String(s)) if s.is_empty() => Err(SkipReason::MissingCategory),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(SkipReason::MissingCategory),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(true)) => Ok("true".to_string()),
        Some(Value::Array(_) | Value::Object(_)) => Err(SkipReason::InvalidCategory),
    }
}

/// An absent price counts as zero
fn price_of(record: &Record) -> Result<Number, SkipReason> {
    match record.get(PRICE_FIELD) {
        None => Ok(Number::from(0)),
        Some(Value::Number(n)) => Ok(n.clone()),
        Some(_) => Err(SkipReason::NonNumericPrice),
    }
}

fn report(diagnostics: &mut dyn Diagnostics, stage: Stage, reason: SkipReason, id: Option<&Value>) {
    diagnostics.skipped(&ValidationSkip {
        stage,
        reason,
        element: None,
        id: id.cloned(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_core::diagnostics::RecordingDiagnostics;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_sums_and_counts_per_category() {
        let recs = records(vec![
            json!({"owner": "a", "price": 10, "category": "x"}),
            json!({"owner": "b", "price": 5, "category": "y"}),
            json!({"owner": "c", "price": 7, "category": "x"}),
        ]);
        let mut diag = RecordingDiagnostics::new();
        let totals = CategoryTotals::from_records(&recs, &mut diag);

        assert_eq!(totals.price_totals["x"], PriceSum::Integer(17));
        assert_eq!(totals.price_totals["y"], PriceSum::Integer(5));
        assert_eq!(totals.item_totals["x"], 2);
        assert_eq!(totals.item_totals["y"], 1);
        assert!(diag.skips.is_empty());
    }

    #[test]
    fn test_non_numeric_price_still_counts_item() {
        let recs = records(vec![json!({"owner": "a", "price": "ten", "category": "x"})]);
        let mut diag = RecordingDiagnostics::new();
        let totals = CategoryTotals::from_records(&recs, &mut diag);

        assert!(totals.price_totals.is_empty());
        assert_eq!(totals.item_totals["x"], 1);
        assert_eq!(diag.skips_in(Stage::PriceTotals).len(), 1);
        assert_eq!(diag.skips[0].reason, SkipReason::NonNumericPrice);
    }

    #[test]
    fn test_null_price_is_not_numeric() {
        let recs = records(vec![json!({"owner": "a", "price": null, "category": "x"})]);
        let totals = CategoryTotals::from_records(&recs, &mut RecordingDiagnostics::new());
        assert!(totals.price_totals.is_empty());
        assert_eq!(totals.item_totals["x"], 1);
    }

    #[test]
    fn test_absent_price_defaults_to_zero() {
        let recs = records(vec![json!({"owner": "a", "category": "x"})]);
        let totals = CategoryTotals::from_records(&recs, &mut RecordingDiagnostics::new());
        assert_eq!(totals.price_totals["x"], PriceSum::ZERO);
    }

    #[test]
    fn test_missing_category_skips_both_mappings() {
        let recs = records(vec![
            json!({"owner": "a", "price": 3, "category": null}),
            json!({"owner": "a", "price": 3, "category": ""}),
            json!({"owner": "a", "price": 3, "category": false}),
            json!({"owner": "a", "price": 3, "category": 0}),
            json!({"id": 9, "owner": "a", "price": 3, "category": ["x"]}),
        ]);
        let mut diag = RecordingDiagnostics::new();
        let totals = CategoryTotals::from_records(&recs, &mut diag);

        assert!(totals.is_empty());
        assert_eq!(diag.skips_in(Stage::PriceTotals).len(), 5);
        assert_eq!(diag.skips_in(Stage::ItemTotals).len(), 5);
        assert_eq!(diag.skips[0].reason, SkipReason::MissingCategory);
        assert_eq!(diag.skips[8].reason, SkipReason::InvalidCategory);
        assert_eq!(diag.skips[8].id, Some(json!(9)));
    }

    #[test]
    fn test_scalar_categories_are_keyed_by_text() {
        let recs = records(vec![
            json!({"owner": "a", "price": 10, "category": 5}),
            json!({"owner": "b", "price": 3, "category": true}),
            json!({"owner": "c", "price": 1, "category": 2.5}),
        ]);
        let mut diag = RecordingDiagnostics::new();
        let totals = CategoryTotals::from_records(&recs, &mut diag);

        assert_eq!(totals.price_totals["5"], PriceSum::Integer(10));
        assert_eq!(totals.price_totals["true"], PriceSum::Integer(3));
        assert_eq!(totals.item_totals["2.5"], 1);
        assert_eq!(totals.item_totals.len(), 3);
        assert!(diag.skips.is_empty());
    }

    #[test]
    fn test_unique_set_skips_carry_the_unique_id() {
        use crate::record_core::dedup::DuplicateFilter;

        let elements = vec![json!({"id": 41, "owner": "a", "price": "n/a", "category": "x"})];
        let mut diag = RecordingDiagnostics::new();
        let uniques = DuplicateFilter::default()
            .run(elements.into_iter().map(Ok), &mut diag)
            .unwrap();
        let totals = CategoryTotals::from_unique_set(&uniques, &mut diag);

        assert_eq!(totals.item_totals["x"], 1);
        let skips = diag.skips_in(Stage::PriceTotals);
        assert_eq!(skips.len(), 1);
        assert_eq!(skips[0].id, Some(json!(41)));
    }

    #[test]
    fn test_float_prices_switch_to_float_sum() {
        let recs = records(vec![
            json!({"owner": "a", "price": 1, "category": "x"}),
            json!({"owner": "b", "price": 0.5, "category": "x"}),
        ]);
        let totals = CategoryTotals::from_records(&recs, &mut RecordingDiagnostics::new());
        assert_eq!(totals.price_totals["x"], PriceSum::Float(1.5));
        assert_eq!(totals.price_totals["x"].to_string(), "1.5");
    }

    #[test]
    fn test_integer_overflow_falls_back_to_float() {
        let sum = PriceSum::Integer(i64::MAX).add(&Number::from(1));
        assert!(matches!(sum, PriceSum::Float(_)));
    }

    #[test]
    fn test_serializes_as_plain_numbers() {
        let recs = records(vec![
            json!({"owner": "a", "price": 10, "category": "x"}),
            json!({"owner": "b", "price": 2.5, "category": "y"}),
        ]);
        let totals = CategoryTotals::from_records(&recs, &mut RecordingDiagnostics::new());
        let rendered = serde_json::to_value(&totals).unwrap();
        assert_eq!(
            rendered,
            json!({
                "price_totals": {"x": 10, "y": 2.5},
                "item_totals": {"x": 1, "y": 1},
            })
        );
    }
}
