use std::env;
use std::path::PathBuf;

use crate::record_core::{MissingIdPolicy, OutputFormat};

/// Runtime configuration from environment variables and command-line flags
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_file: String,
    pub base_dir: PathBuf,
    pub output_format: OutputFormat,
    pub missing_id: MissingIdPolicy,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load from the process environment and arguments
    ///
    /// - UNIQUES_DATA_FILE - input file name (default: f.json), overridden by
    ///   the first positional argument
    /// - UNIQUES_BASE_DIR - directory the name resolves against (default: cwd)
    /// - UNIQUES_OUTPUT_FORMAT / --format - text or json (default: text)
    /// - UNIQUES_MISSING_ID / --missing-id - abort or skip (default: abort)
    pub fn from_env() -> Result<Self, ConfigError> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::from_sources(|name| env::var(name).ok(), &args)
    }

    /// Same as [`Config::from_env`] with an injectable variable lookup
    pub fn from_sources<F>(var: F, args: &[String]) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_file = positional_arg(args)
            .or_else(|| var("UNIQUES_DATA_FILE"))
            .unwrap_or_else(|| "f.json".to_string());

        if data_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "data file name cannot be empty".to_string(),
            ));
        }

        let base_dir = base_dir_or_cwd(var("UNIQUES_BASE_DIR"), env::current_dir)?;

        let output_format = match flag_value(args, "--format").or_else(|| var("UNIQUES_OUTPUT_FORMAT")) {
            Some(s) => s.parse::<OutputFormat>().map_err(ConfigError::InvalidValue)?,
            None => OutputFormat::default(),
        };

        let missing_id = match flag_value(args, "--missing-id").or_else(|| var("UNIQUES_MISSING_ID")) {
            Some(s) => s.parse::<MissingIdPolicy>().map_err(ConfigError::InvalidValue)?,
            None => MissingIdPolicy::default(),
        };

        Ok(Self {
            data_file,
            base_dir,
            output_format,
            missing_id,
        })
    }
}

fn base_dir_or_cwd<F>(dir: Option<String>, cwd: F) -> Result<PathBuf, ConfigError>
where
    F: FnOnce() -> std::io::Result<PathBuf>,
{
    match dir {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => cwd().map_err(|e| {
            ConfigError::InvalidValue(format!("cannot read current directory: {}", e))
        }),
    }
}

const VALUE_FLAGS: [&str; 2] = ["--format", "--missing-id"];

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let idx = args.iter().position(|x| x == flag)?;
    args.get(idx + 1).cloned()
}

/// First argument that is neither a flag nor a flag's value
fn positional_arg(args: &[String]) -> Option<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
            continue;
        }
        if !arg.starts_with("--") {
            return Some(arg.clone());
        }
    }
    None
}
