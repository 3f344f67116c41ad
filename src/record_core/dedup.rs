//! Duplicate filter: groups records by combination key across the whole
//! stream and keeps the keys seen exactly once

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use super::diagnostics::{Diagnostics, SkipReason, Stage, ValidationSkip};
use super::error::PipelineError;
use super::record::{default_fields, CombinationKey, Record, ID_FIELD};

/// What to do with a record that has every combination field but no `id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingIdPolicy {
    /// Stop the scan with `PipelineError::MalformedRecord`
    #[default]
    Abort,
    /// Report a skip and keep scanning
    Skip,
}

impl MissingIdPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingIdPolicy::Abort => "abort",
            MissingIdPolicy::Skip => "skip",
        }
    }
}

impl FromStr for MissingIdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(MissingIdPolicy::Abort),
            "skip" => Ok(MissingIdPolicy::Skip),
            other => Err(format!("unknown missing-id policy '{}'", other)),
        }
    }
}

/// Counters for one scan. `elements_seen == records_grouped + skipped_total()`
/// once the scan completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub elements_seen: usize,
    pub records_grouped: usize,
    pub skipped: BTreeMap<&'static str, usize>,
    pub distinct_keys: usize,
    pub unique_keys: usize,
}

impl ScanStats {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    fn record_skip(&mut self, reason: &SkipReason) {
        *self.skipped.entry(reason.label()).or_insert(0) += 1;
    }
}

/// Single-pass accumulator of occurrence lists
pub struct DuplicateFilter {
    fields: Vec<String>,
    missing_id: MissingIdPolicy,
    /// Ids seen per key, in stream order. Never empty.
    occurrences: HashMap<CombinationKey, Vec<Value>>,
    stats: ScanStats,
}

impl DuplicateFilter {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            missing_id: MissingIdPolicy::default(),
            occurrences: HashMap::new(),
            stats: ScanStats::default(),
        }
    }

    pub fn with_missing_id(mut self, policy: MissingIdPolicy) -> Self {
        self.missing_id = policy;
        self
    }

    /// Consume one array element
    pub fn observe(
        &mut self,
        element: Value,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<(), PipelineError> {
        let index = self.stats.elements_seen;
        self.stats.elements_seen += 1;

        let record = match element {
            Value::Object(record) => record,
            _ => {
                self.skip(index, None, SkipReason::NotAnObject, diagnostics);
                return Ok(());
            }
        };

        let key = match CombinationKey::extract(&record, &self.fields) {
            Ok(key) => key,
            Err(reason) => {
                let id = record.get(ID_FIELD).cloned();
                self.skip(index, id, reason, diagnostics);
                return Ok(());
            }
        };

        let id = match record_id(&record) {
            Some(id) => id.clone(),
            None => match self.missing_id {
                MissingIdPolicy::Abort => {
                    return Err(PipelineError::MalformedRecord {
                        element: index,
                        key: key.to_string(),
                    })
                }
                MissingIdPolicy::Skip => {
                    self.skip(index, None, SkipReason::MissingId, diagnostics);
                    return Ok(());
                }
            },
        };

        self.occurrences.entry(key).or_insert_with(Vec::new).push(id);
        self.stats.records_grouped += 1;
        Ok(())
    }

    fn skip(
        &mut self,
        index: usize,
        id: Option<Value>,
        reason: SkipReason,
        diagnostics: &mut dyn Diagnostics,
    ) {
        self.stats.record_skip(&reason);
        diagnostics.skipped(&ValidationSkip {
            stage: Stage::Grouping,
            reason,
            element: Some(index),
            id,
        });
    }

    /// Keep the keys whose occurrence list has exactly one id
    pub fn finish(self, diagnostics: &mut dyn Diagnostics) -> UniqueSet {
        let mut stats = self.stats;
        stats.distinct_keys = self.occurrences.len();

        let entries: BTreeMap<CombinationKey, Value> = self
            .occurrences
            .into_iter()
            .filter(|(_, ids)| ids.len() == 1)
            .filter_map(|(key, mut ids)| ids.pop().map(|id| (key, id)))
            .collect();

        stats.unique_keys = entries.len();
        diagnostics.scan_finished(&stats);

        UniqueSet {
            fields: self.fields,
            entries,
            stats,
        }
    }

    /// Drain `records` and return the unique set. The first stream error ends
    /// the scan and no partial set is returned.
    pub fn run<I>(
        mut self,
        records: I,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<UniqueSet, PipelineError>
    where
        I: IntoIterator<Item = Result<Value, PipelineError>>,
    {
        for element in records {
            self.observe(element?, diagnostics)?;
        }
        Ok(self.finish(diagnostics))
    }
}

impl Default for DuplicateFilter {
    fn default() -> Self {
        Self::new(default_fields())
    }
}

fn record_id(record: &Record) -> Option<&Value> {
    record.get(ID_FIELD)
}

/// Combination keys that occurred exactly once, each with its single id
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueSet {
    fields: Vec<String>,
    entries: BTreeMap<CombinationKey, Value>,
    stats: ScanStats,
}

impl UniqueSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &CombinationKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CombinationKey, &Value)> {
        self.entries.iter()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Rebuild field-keyed records from the unique keys, using the same
    /// field order the keys were built with
    pub fn to_records(&self) -> Vec<Record> {
        self.entries
            .keys()
            .map(|key| key.to_record(&self.fields))
            .collect()
    }
}
