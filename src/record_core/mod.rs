//! Record Core - Unique Combination Totals
//!
//! Finds the records whose `(owner, price, category)` combination occurs
//! exactly once in a JSON array file, then totals them per category.
//!
//! # Architecture
//!
//! ```text
//! JSON array file → RecordStream (one element at a time)
//!     ↓
//! DuplicateFilter (combination key → occurrence list)
//!     ↓
//! UniqueSet (keys seen exactly once)
//!     ↓
//! CategoryTotals (price sum, item count)
//!     ↓
//! report → text or JSON
//! ```
//!
//! Every stage reports skipped records through a [`Diagnostics`] value
//! supplied by the caller.

pub mod dedup;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod report;
pub mod totals;

pub use dedup::{DuplicateFilter, MissingIdPolicy, ScanStats, UniqueSet};
pub use diagnostics::{
    Diagnostics, LogDiagnostics, RecordingDiagnostics, SkipReason, Stage, ValidationSkip,
};
pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineOutput};
pub use reader::RecordStream;
pub use record::{CombinationKey, FieldValue, Record, COMBINATION_FIELDS};
pub use report::{render, OutputFormat, TotalsReport};
pub use totals::{CategoryTotals, PriceSum};
