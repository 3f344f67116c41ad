//! Diagnostics capability handed to each pipeline stage
//!
//! Stages never log per-record decisions on their own. They report skips and
//! summaries here, and the caller decides where those go.

use serde_json::Value;
use std::fmt;

use super::dedup::ScanStats;

/// Stage that excluded a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Grouping,
    PriceTotals,
    ItemTotals,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Grouping => "grouping",
            Stage::PriceTotals => "price_totals",
            Stage::ItemTotals => "item_totals",
        }
    }
}

/// Why a record was excluded from a computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotAnObject,
    MissingField(String),
    UnsupportedValue(String),
    MissingId,
    MissingCategory,
    InvalidCategory,
    NonNumericPrice,
}

impl SkipReason {
    /// Stable label used for per-reason counters
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::NotAnObject => "not_an_object",
            SkipReason::MissingField(_) => "missing_field",
            SkipReason::UnsupportedValue(_) => "unsupported_value",
            SkipReason::MissingId => "missing_id",
            SkipReason::MissingCategory => "missing_category",
            SkipReason::InvalidCategory => "invalid_category",
            SkipReason::NonNumericPrice => "non_numeric_price",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAnObject => write!(f, "element is not an object"),
            SkipReason::MissingField(field) => write!(f, "missing field '{}'", field),
            SkipReason::UnsupportedValue(field) => {
                write!(f, "field '{}' holds an array or object", field)
            }
            SkipReason::MissingId => write!(f, "missing field 'id'"),
            SkipReason::MissingCategory => write!(f, "missing or empty category"),
            SkipReason::InvalidCategory => write!(f, "category is an array or object"),
            SkipReason::NonNumericPrice => write!(f, "price is not numeric"),
        }
    }
}

/// A record excluded from one computation. Never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSkip {
    pub stage: Stage,
    pub reason: SkipReason,
    /// Position in the input array, when the record came straight from it
    pub element: Option<usize>,
    pub id: Option<Value>,
}

impl fmt::Display for ValidationSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage.as_str(), self.reason)?;
        if let Some(element) = self.element {
            write!(f, " at element {}", element)?;
        }
        match &self.id {
            Some(id) => write!(f, " (id={})", id),
            None => Ok(()),
        }
    }
}

/// Sink for skip and progress reports
pub trait Diagnostics {
    /// A record was excluded from `skip.stage`
    fn skipped(&mut self, skip: &ValidationSkip);

    /// The duplicate scan consumed the whole stream
    fn scan_finished(&mut self, _stats: &ScanStats) {}
}

/// Forwards reports to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn skipped(&mut self, skip: &ValidationSkip) {
        log::debug!("Skipping record: {}", skip);
    }

    fn scan_finished(&mut self, stats: &ScanStats) {
        log::info!(
            "📖 Scanned {} elements: {} grouped, {} skipped",
            stats.elements_seen,
            stats.records_grouped,
            stats.skipped_total()
        );
        if stats.unique_keys == 0 {
            log::debug!("No unique combinations found");
        } else {
            log::debug!(
                "Found {} unique combinations out of {}",
                stats.unique_keys,
                stats.distinct_keys
            );
        }
    }
}

/// Keeps every report in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingDiagnostics {
    pub skips: Vec<ValidationSkip>,
    pub scans: Vec<ScanStats>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skips_in(&self, stage: Stage) -> Vec<&ValidationSkip> {
        self.skips.iter().filter(|s| s.stage == stage).collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn skipped(&mut self, skip: &ValidationSkip) {
        self.skips.push(skip.clone());
    }

    fn scan_finished(&mut self, stats: &ScanStats) {
        self.scans.push(stats.clone());
    }
}
