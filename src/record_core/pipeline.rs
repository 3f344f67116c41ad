//! Reader → duplicate filter → aggregator, in one linear pass

use std::io::BufRead;
use std::path::Path;

use super::dedup::{DuplicateFilter, MissingIdPolicy, UniqueSet};
use super::diagnostics::Diagnostics;
use super::error::PipelineError;
use super::reader::RecordStream;
use super::record::default_fields;
use super::totals::CategoryTotals;

/// Result of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub uniques: UniqueSet,
    pub totals: CategoryTotals,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    fields: Vec<String>,
    missing_id: MissingIdPolicy,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            fields: default_fields(),
            missing_id: MissingIdPolicy::default(),
        }
    }

    pub fn with_missing_id(mut self, policy: MissingIdPolicy) -> Self {
        self.missing_id = policy;
        self
    }

    /// Stream the file at `path`. The file is closed before this returns,
    /// on success and on error alike.
    pub fn run_path(
        &self,
        path: &Path,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<PipelineOutput, PipelineError> {
        let records = RecordStream::open(path)?;
        self.run_stream(records, diagnostics)
    }

    pub fn run_reader<R: BufRead>(
        &self,
        reader: R,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<PipelineOutput, PipelineError> {
        self.run_stream(RecordStream::new(reader), diagnostics)
    }

    fn run_stream<R: BufRead>(
        &self,
        records: RecordStream<R>,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<PipelineOutput, PipelineError> {
        let uniques = DuplicateFilter::new(self.fields.clone())
            .with_missing_id(self.missing_id)
            .run(records, diagnostics)?;

        let totals = CategoryTotals::from_unique_set(&uniques, diagnostics);

        Ok(PipelineOutput { uniques, totals })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
