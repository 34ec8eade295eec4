//! Command-line argument definitions for bibrecon
//!
//! This module defines the CLI interface using the clap derive API.

use crate::app::models::{Collection, Library, RecordType};
use crate::config::{LookupFailurePolicy, OutputFormat};
use crate::constants::MAX_PARALLEL_WORKERS;
use crate::{Error, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the bibliographic record reconciler
///
/// Matches vendor records against a catalog snapshot, edits them for loading
/// and splits each batch into new, duplicate and deduplicated files.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bibrecon",
    version,
    about = "Reconcile vendor bibliographic records against a library catalog",
    long_about = "Processes batches of vendor bibliographic records before they are loaded into \
                  a library catalog. Each record is matched against the catalog by prioritized \
                  identifiers, edited with order template values and structural field updates, \
                  and the batch is partitioned into NEW, DUP and DEDUPED output files with a \
                  per-batch JSON summary."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Reconcile record files against a catalog snapshot
    Process(ProcessArgs),
    /// Manage stored order templates
    Templates(TemplatesArgs),
}

/// Arguments for the process command
#[derive(Debug, Clone, Parser)]
pub struct ProcessArgs {
    /// Record files to process
    ///
    /// Each file is an independent batch. Glob patterns such as `in/*.json`
    /// are expanded.
    #[arg(
        short = 'i',
        long = "input",
        value_name = "FILES",
        num_args = 1..,
        required = true,
        help = "Record files or glob patterns to process"
    )]
    pub inputs: Vec<String>,

    /// JSON snapshot of catalog records used for matching
    #[arg(long = "catalog", value_name = "FILE", help = "Catalog snapshot (JSON)")]
    pub catalog: PathBuf,

    /// Library system the batch is loaded into
    #[arg(long = "library", value_name = "LIBRARY", help = "Library system: nypl or bpl")]
    pub library: Library,

    /// Workflow of the batch
    #[arg(
        long = "record-type",
        value_name = "TYPE",
        help = "Record type: acq, cat or sel"
    )]
    pub record_type: RecordType,

    /// Collection the batch is destined for
    #[arg(
        long = "collection",
        value_name = "COLLECTION",
        default_value = "NONE",
        help = "Destination collection: BL, RL or NONE"
    )]
    pub collection: Collection,

    /// Name of a stored order template (required for acq and sel)
    #[arg(long = "template", value_name = "NAME", help = "Order template name")]
    pub template: Option<String>,

    /// Directory holding stored templates
    #[arg(
        long = "templates-dir",
        value_name = "DIR",
        help = "Template directory (defaults to the platform data directory)"
    )]
    pub templates_dir: Option<PathBuf>,

    /// Treat every cataloging record as coming from this vendor
    #[arg(long = "vendor", value_name = "NAME", help = "Force a configured vendor rule")]
    pub vendor: Option<String>,

    /// Output directory for partitioned record files and summaries
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        default_value = "./output",
        help = "Output directory"
    )]
    pub output_path: PathBuf,

    /// Configuration file path
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Configuration file (TOML)"
    )]
    pub config_file: Option<PathBuf>,

    /// Number of files processed concurrently
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "N",
        help = "Number of files processed in parallel"
    )]
    pub workers: Option<usize>,

    /// Check inputs and preconditions without querying the catalog or writing files
    #[arg(long = "dry-run", help = "Validate inputs without processing")]
    pub dry_run: bool,

    /// What to do when a catalog lookup fails
    #[arg(
        long = "on-lookup-failure",
        value_enum,
        value_name = "POLICY",
        help = "Lookup failure handling: abort the batch or skip the record"
    )]
    pub on_lookup_failure: Option<LookupFailurePolicy>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress bars and non-error logging
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report format
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Final report format"
    )]
    pub output_format: OutputFormat,
}

impl ProcessArgs {
    /// Validate argument combinations that clap cannot express
    pub fn validate(&self) -> Result<()> {
        if !self.catalog.exists() {
            return Err(Error::configuration(format!(
                "Catalog snapshot does not exist: {}",
                self.catalog.display()
            )));
        }

        if let Some(workers) = self.workers {
            if workers == 0 || workers > MAX_PARALLEL_WORKERS {
                return Err(Error::configuration(format!(
                    "Number of workers must be between 1 and {}",
                    MAX_PARALLEL_WORKERS
                )));
            }
        }

        if self.record_type.is_order_level() && self.template.is_none() {
            return Err(Error::missing_template(self.record_type.as_str()));
        }

        if self.vendor.is_some() && self.record_type.is_order_level() {
            return Err(Error::configuration(
                "--vendor only applies to the cat record type",
            ));
        }

        if self.library == Library::Bpl
            && matches!(self.collection, Collection::Branch | Collection::Research)
        {
            return Err(Error::configuration(
                "BPL batches have no collection; use --collection NONE",
            ));
        }

        if self.library == Library::Nypl && self.collection == Collection::Mixed {
            return Err(Error::configuration(
                "A batch cannot be destined for the MIXED collection",
            ));
        }

        Ok(())
    }

    /// Log level derived from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            log_level_for(self.verbose)
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Arguments for the templates command
#[derive(Debug, Clone, Parser)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    pub action: TemplateAction,

    /// Directory holding stored templates
    #[arg(
        long = "templates-dir",
        value_name = "DIR",
        global = true,
        help = "Template directory (defaults to the platform data directory)"
    )]
    pub templates_dir: Option<PathBuf>,

    /// Increase logging verbosity
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Report format
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        global = true,
        help = "Output format"
    )]
    pub output_format: OutputFormat,
}

/// Template store operations
#[derive(Debug, Clone, Subcommand)]
pub enum TemplateAction {
    /// List stored templates
    List,
    /// Show one template
    Show {
        /// Template name
        name: String,
    },
    /// Add or replace a template from a TOML file
    Add {
        /// Template file
        file: PathBuf,
    },
    /// Remove a stored template
    Remove {
        /// Template name
        name: String,
    },
}

impl TemplatesArgs {
    pub fn get_log_level(&self) -> &'static str {
        log_level_for(self.verbose)
    }
}

fn log_level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn process_args(catalog: PathBuf) -> ProcessArgs {
        ProcessArgs {
            inputs: vec!["orders.json".to_string()],
            catalog,
            library: Library::Nypl,
            record_type: RecordType::Acq,
            collection: Collection::Branch,
            template: Some("firm orders".to_string()),
            templates_dir: None,
            vendor: None,
            output_path: PathBuf::from("./output"),
            config_file: None,
            workers: None,
            dry_run: false,
            on_lookup_failure: None,
            verbose: 0,
            quiet: false,
            output_format: OutputFormat::Human,
        }
    }

    fn catalog_file(temp_dir: &TempDir) -> PathBuf {
        let path = temp_dir.path().join("catalog.json");
        std::fs::write(&path, "[]").unwrap();
        path
    }

    #[test]
    fn test_parse_process_command() {
        let args = Args::try_parse_from([
            "bibrecon",
            "process",
            "-i",
            "a.json",
            "b/*.json",
            "--catalog",
            "catalog.json",
            "--library",
            "nypl",
            "--record-type",
            "sel",
            "--collection",
            "RL",
            "--template",
            "standing",
            "-j",
            "4",
            "-vv",
            "--on-lookup-failure",
            "skip",
            "--output-format",
            "json",
        ])
        .unwrap();

        let Commands::Process(process) = args.command else {
            panic!("expected process command");
        };
        assert_eq!(process.inputs, vec!["a.json", "b/*.json"]);
        assert_eq!(process.library, Library::Nypl);
        assert_eq!(process.record_type, RecordType::Sel);
        assert_eq!(process.collection, Collection::Research);
        assert_eq!(process.workers, Some(4));
        assert_eq!(process.verbose, 2);
        assert_eq!(process.on_lookup_failure, Some(LookupFailurePolicy::Skip));
        assert_eq!(process.output_format, OutputFormat::Json);
        assert_eq!(process.output_path, PathBuf::from("./output"));
    }

    #[test]
    fn test_collection_defaults_to_none() {
        let args = Args::try_parse_from([
            "bibrecon",
            "process",
            "-i",
            "a.json",
            "--catalog",
            "c.json",
            "--library",
            "bpl",
            "--record-type",
            "cat",
        ])
        .unwrap();

        let Commands::Process(process) = args.command else {
            panic!("expected process command");
        };
        assert_eq!(process.collection, Collection::Unassigned);
        assert!(process.template.is_none());
    }

    #[test]
    fn test_invalid_library_rejected_by_parser() {
        let result = Args::try_parse_from([
            "bibrecon",
            "process",
            "-i",
            "a.json",
            "--catalog",
            "c.json",
            "--library",
            "lapl",
            "--record-type",
            "cat",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Args::try_parse_from([
            "bibrecon",
            "process",
            "-i",
            "a.json",
            "--catalog",
            "c.json",
            "--library",
            "bpl",
            "--record-type",
            "cat",
            "-q",
            "-v",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_templates_command() {
        let args = Args::try_parse_from([
            "bibrecon",
            "templates",
            "show",
            "Leased Print",
            "--templates-dir",
            "/tmp/templates",
        ])
        .unwrap();

        let Commands::Templates(templates) = args.command else {
            panic!("expected templates command");
        };
        assert!(matches!(
            templates.action,
            TemplateAction::Show { ref name } if name == "Leased Print"
        ));
        assert_eq!(templates.templates_dir, Some(PathBuf::from("/tmp/templates")));
    }

    #[test]
    fn test_validate() {
        let temp_dir = TempDir::new().unwrap();
        let args = process_args(catalog_file(&temp_dir));
        assert!(args.validate().is_ok());

        let missing_catalog = process_args(temp_dir.path().join("absent.json"));
        assert!(missing_catalog.validate().is_err());

        let mut no_template = process_args(catalog_file(&temp_dir));
        no_template.template = None;
        assert!(matches!(
            no_template.validate(),
            Err(Error::MissingTemplate { .. })
        ));

        let mut too_many_workers = process_args(catalog_file(&temp_dir));
        too_many_workers.workers = Some(MAX_PARALLEL_WORKERS + 1);
        assert!(too_many_workers.validate().is_err());

        let mut bpl_branch = process_args(catalog_file(&temp_dir));
        bpl_branch.library = Library::Bpl;
        assert!(bpl_branch.validate().is_err());

        let mut vendor_on_acq = process_args(catalog_file(&temp_dir));
        vendor_on_acq.vendor = Some("BT".to_string());
        assert!(vendor_on_acq.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = process_args(catalog_file(&temp_dir));

        assert_eq!(args.get_log_level(), "warn");
        args.verbose = 1;
        assert_eq!(args.get_log_level(), "info");
        args.verbose = 2;
        assert_eq!(args.get_log_level(), "debug");
        args.verbose = 5;
        assert_eq!(args.get_log_level(), "trace");

        args.verbose = 0;
        args.quiet = true;
        assert_eq!(args.get_log_level(), "error");
        assert!(!args.show_progress());
    }
}
