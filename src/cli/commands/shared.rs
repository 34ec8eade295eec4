//! Shared components for CLI commands
//!
//! This module contains common types, utilities, and functions used across
//! multiple CLI command implementations.

use crate::app::services::template_store::TemplateStore;
use crate::cli::args::ProcessArgs;
use crate::config::Config;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Run statistics for reporting across all commands
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Number of input files processed successfully
    pub files_processed: usize,
    /// Number of input files that failed
    pub files_failed: usize,
    /// Number of records read across all files
    pub records_processed: usize,
    /// Records written to NEW files
    pub new_records: usize,
    /// Records written to DUP files
    pub dup_records: usize,
    /// Records written to DEDUPED files
    pub deduped_records: usize,
    /// Barcodes lost during partitioning, across all files
    pub missing_barcodes: usize,
    /// Records whose call number disagrees with the resolved target's
    pub call_number_mismatches: usize,
    /// Total processing time
    pub processing_time: Duration,
    /// Files written
    pub output_files: Vec<PathBuf>,
}

impl RunStats {
    /// Whether every file kept all of its barcodes
    pub fn has_integrity(&self) -> bool {
        self.missing_barcodes == 0
    }

    /// Total records written across the three partitions
    pub fn records_written(&self) -> usize {
        self.new_records + self.dup_records + self.deduped_records
    }
}

/// Set up structured logging on stderr
///
/// `RUST_LOG` takes precedence over the level derived from the command line.
pub fn setup_logging(log_level: &str, quiet: bool) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bibrecon={}", log_level)));

    let result = if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    result.map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (defaults -> file -> args)
pub fn load_configuration(args: &ProcessArgs) -> Result<Config> {
    info!("Loading configuration");

    let default_config_path = if args.config_file.is_none() {
        Config::default_config_path().ok()
    } else {
        None
    };

    let config_file = match &args.config_file {
        Some(path) => Some(path.as_path()),
        None => default_config_path
            .as_ref()
            .filter(|path| path.exists())
            .map(|path| path.as_path()),
    };

    if let Some(config_path) = config_file {
        info!("Using config file: {}", config_path.display());
    } else {
        info!("No config file found, using defaults");
    }

    let mut config = Config::load_layered(config_file)?;
    apply_cli_overrides(&mut config, args);
    config.validate()?;

    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut Config, args: &ProcessArgs) {
    if let Some(workers) = args.workers {
        config.processing.workers = workers;
    }
    if let Some(policy) = args.on_lookup_failure {
        config.processing.on_lookup_failure = policy;
    }
    config.processing.show_progress = config.processing.show_progress && args.show_progress();
    config.processing.output_format = args.output_format;
}

/// Template store for an explicit directory, or the platform default
pub fn open_template_store(dir: Option<&Path>) -> Result<TemplateStore> {
    match dir {
        Some(dir) => Ok(TemplateStore::new(dir)),
        None => TemplateStore::open_default(),
    }
}

/// Expand input paths and glob patterns into a sorted list of files
///
/// A pattern that names an existing file is taken as is. Each file appears
/// once even when several patterns match it.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for pattern in patterns {
        let literal = Path::new(pattern);
        if literal.is_file() {
            files.insert(literal.to_path_buf());
            continue;
        }

        let paths = glob::glob(pattern).map_err(|e| {
            Error::configuration(format!("Invalid input pattern '{}': {}", pattern, e))
        })?;

        let before = files.len();
        for path in paths {
            let path = path.map_err(|e| {
                Error::io(
                    format!("Failed to read path matched by '{}'", pattern),
                    e.into_error(),
                )
            })?;
            if path.is_file() {
                files.insert(path);
            }
        }

        if files.len() == before {
            return Err(Error::file_not_found(pattern.clone()));
        }
    }

    debug!("Expanded {} input patterns to {} files", patterns.len(), files.len());
    Ok(files.into_iter().collect())
}

/// Check if an error is critical enough to stop processing other files
pub fn is_critical_error(error: &Error) -> bool {
    error.is_batch_fatal()
}

/// Create a progress bar with appropriate styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} [{per_sec}] ETA: {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}
