//! Unique Totals Binary - per-category totals of unique listings
//!
//! Streams a JSON array of records, keeps the records whose
//! `(owner, price, category)` combination occurs exactly once, and prints
//! the summed price and item count per category.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin unique_totals -- [FILE] [--format text|json] [--missing-id abort|skip]
//! ```
//!
//! ## Environment Variables
//!
//! - UNIQUES_DATA_FILE - Input file name (default: f.json)
//! - UNIQUES_BASE_DIR - Directory the file name resolves against (default: current directory)
//! - UNIQUES_OUTPUT_FORMAT - text or json (default: text)
//! - UNIQUES_MISSING_ID - abort or skip records lacking an id (default: abort)
//! - RUST_LOG - Logging level (optional, default: info)

use unique_totals::config::Config;
use unique_totals::paths::resolve_data_path;
use unique_totals::record_core::{render, LogDiagnostics, Pipeline};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Configuration error: {}", e);
            return Err(e.into());
        }
    };

    log::info!("🚀 Starting Unique Totals");
    log::info!("   Data file: {}", config.data_file);
    log::info!("   Base dir: {}", config.base_dir.display());
    log::info!("   Output format: {}", config.output_format.as_str());
    log::info!("   Missing id policy: {}", config.missing_id.as_str());

    let path = resolve_data_path(&config.base_dir, &config.data_file);

    let pipeline = Pipeline::new().with_missing_id(config.missing_id);
    let output = match pipeline.run_path(&path, &mut LogDiagnostics) {
        Ok(output) => output,
        Err(e) => {
            log::error!("❌ {}: {}", e.kind(), e);
            return Err(e.into());
        }
    };

    if output.uniques.is_empty() {
        log::debug!("Unique combinations not found.");
    } else {
        log::debug!("Found {} unique combinations.", output.uniques.len());
    }

    let rendered = render(config.output_format, &path.display().to_string(), &output)?;
    println!("{}", rendered);

    log::info!(
        "✅ Totalled {} categories from {} unique records",
        output.totals.item_totals.len(),
        output.uniques.len()
    );

    Ok(())
}
