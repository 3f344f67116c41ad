//! Rendering of the two category mappings

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::dedup::ScanStats;
use super::pipeline::PipelineOutput;
use super::totals::PriceSum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Price totals on one line, item totals on the next
    #[default]
    Text,
    /// One pretty-printed JSON document
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TotalsReport<'a> {
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub unique_records: usize,
    pub price_totals: &'a BTreeMap<String, PriceSum>,
    pub item_totals: &'a BTreeMap<String, u64>,
    pub scan: &'a ScanStats,
}

impl<'a> TotalsReport<'a> {
    pub fn new(source: impl Into<String>, output: &'a PipelineOutput) -> Self {
        Self {
            source: source.into(),
            generated_at: Utc::now(),
            unique_records: output.uniques.len(),
            price_totals: &output.totals.price_totals,
            item_totals: &output.totals.item_totals,
            scan: output.uniques.stats(),
        }
    }
}

pub fn render(
    format: OutputFormat,
    source: &str,
    output: &PipelineOutput,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => render_text(output),
        OutputFormat::Json => serde_json::to_string_pretty(&TotalsReport::new(source, output)),
    }
}

fn render_text(output: &PipelineOutput) -> Result<String, serde_json::Error> {
    Ok(format!(
        "{}\n{}",
        serde_json::to_string(&output.totals.price_totals)?,
        serde_json::to_string(&output.totals.item_totals)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_core::diagnostics::RecordingDiagnostics;
    use crate::record_core::pipeline::Pipeline;
    use serde_json::{json, Value};
    use std::io::Cursor;

    fn output(input: &str) -> PipelineOutput {
        Pipeline::new()
            .run_reader(Cursor::new(input.to_string()), &mut RecordingDiagnostics::new())
            .unwrap()
    }

    #[test]
    fn test_text_rendering() {
        let out = output(
            r#"[{"id":1,"owner":"a","price":10,"category":"x"},{"id":2,"owner":"b","price":5,"category":"y"}]"#,
        );
        let text = render(OutputFormat::Text, "f.json", &out).unwrap();
        assert_eq!(text, "{\"x\":10,\"y\":5}\n{\"x\":1,\"y\":1}");
    }

    #[test]
    fn test_empty_text_rendering() {
        let out = output("[]");
        assert_eq!(render(OutputFormat::Text, "f.json", &out).unwrap(), "{}\n{}");
    }

    #[test]
    fn test_json_rendering() {
        let out = output(r#"[{"id":1,"owner":"a","price":2.5,"category":"x"}]"#);
        let rendered: Value =
            serde_json::from_str(&render(OutputFormat::Json, "f.json", &out).unwrap()).unwrap();

        assert_eq!(rendered["source"], json!("f.json"));
        assert_eq!(rendered["unique_records"], json!(1));
        assert_eq!(rendered["price_totals"], json!({"x": 2.5}));
        assert_eq!(rendered["item_totals"], json!({"x": 1}));
        assert_eq!(rendered["scan"]["elements_seen"], json!(1));
        assert!(rendered["generated_at"].is_string());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
