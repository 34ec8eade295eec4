//! Process command implementation for bibrecon CLI
//!
//! This module contains the complete batch workflow: configuration loading,
//! input expansion, parallel reconciliation of each file and report generation.

use super::shared::{
    RunStats, create_progress_bar, expand_inputs, is_critical_error, load_configuration,
    open_template_store, setup_logging,
};
use crate::app::models::{BatchContext, Template};
use crate::app::services::batch_writer::{BatchWriter, WrittenFiles};
use crate::app::services::catalog::{CatalogLookup, LocalCatalog};
use crate::app::services::reconciler::{BatchProcessor, BatchSummary, ProcessingStats};
use crate::app::services::record_codec::{JsonRecordCodec, RecordCodec, RecordMapper};
use crate::cli::args::ProcessArgs;
use crate::config::{Config, OutputFormat};
use crate::{Error, Result};
use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::HumanDuration;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of one successfully processed input file
#[derive(Debug, Clone)]
struct FileResult {
    summary: BatchSummary,
    stats: ProcessingStats,
    written: Option<WrittenFiles>,
}

/// Everything a worker needs to process one file
struct BatchPipeline {
    codec: Arc<dyn RecordCodec>,
    mapper: RecordMapper,
    processor: BatchProcessor,
    writer: BatchWriter,
}

impl BatchPipeline {
    fn build(
        args: &ProcessArgs,
        config: &Config,
        template: Option<Template>,
        catalog: Arc<dyn CatalogLookup>,
        show_record_progress: bool,
    ) -> Result<Self> {
        let context = BatchContext::new(args.library, args.collection, args.record_type);

        let mut mapper = RecordMapper::new(config, context)?;
        if let Some(vendor) = &args.vendor {
            mapper = mapper.with_forced_vendor(vendor)?;
        }

        let mut processor =
            BatchProcessor::new(config, context, catalog).with_show_progress(show_record_progress);
        if let Some(template) = template {
            processor = processor.with_template(template);
        }

        let codec: Arc<dyn RecordCodec> = Arc::new(JsonRecordCodec::new());
        let writer = BatchWriter::new(&args.output_path, codec.clone());

        Ok(Self {
            codec,
            mapper,
            processor,
            writer,
        })
    }

    /// Read, reconcile and write one file
    fn process_file(&self, path: &Path) -> Result<FileResult> {
        let raw_records = self.codec.read_file(path)?;
        let records = self.mapper.map_all(raw_records);
        debug!("Mapped {} records from {}", records.len(), path.display());

        let outcome = self.processor.process_batch(&file_name(path), records)?;
        let written = self.writer.write(path, &outcome)?;

        Ok(FileResult {
            summary: outcome.summary,
            stats: outcome.stats,
            written: Some(written),
        })
    }

    /// Read one file and check preconditions without querying the catalog
    fn check_file(&self, path: &Path) -> Result<FileResult> {
        let raw_records = self.codec.read_file(path)?;
        let records = self.mapper.map_all(raw_records);
        self.processor.check_preconditions(&records)?;

        let mut stats = ProcessingStats::new();
        stats.total_input = records.len();
        let summary = BatchSummary {
            total_records: records.len(),
            ..BatchSummary::new(
                file_name(path),
                self.processor.context(),
                &Default::default(),
                &[],
                Vec::new(),
            )
        };

        Ok(FileResult {
            summary,
            stats,
            written: None,
        })
    }
}

/// Process command runner
///
/// This function orchestrates the entire workflow:
/// 1. Set up logging and configuration
/// 2. Expand inputs, load the catalog snapshot and template
/// 3. Process files in parallel, each as an independent batch
/// 4. Generate the final report
pub async fn run_process(
    args: ProcessArgs,
    cancellation_token: CancellationToken,
) -> Result<RunStats> {
    let start_time = Instant::now();

    setup_logging(args.get_log_level(), args.quiet)?;

    info!("Starting bibrecon");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;

    let config = load_configuration(&args)?;
    debug!("Loaded configuration: {:?}", config);

    let files = expand_inputs(&args.inputs)?;
    info!("Processing {} files", files.len());

    let template = match &args.template {
        Some(name) => {
            let store = open_template_store(args.templates_dir.as_deref())?;
            let template = store.get(name)?;
            info!("Using template '{}' from {}", template.name, store.dir().display());
            Some(template)
        }
        None => None,
    };

    let catalog: Arc<dyn CatalogLookup> = Arc::new(LocalCatalog::from_json_file(&args.catalog)?);

    let workers = config.processing.workers.min(files.len()).max(1);
    let show_record_progress = config.processing.show_progress && files.len() == 1;
    let pipeline = Arc::new(BatchPipeline::build(
        &args,
        &config,
        template,
        catalog,
        show_record_progress,
    )?);

    if args.dry_run {
        info!("Performing dry run - no catalog queries, no files written");
    }

    let file_pb = (config.processing.show_progress && files.len() > 1)
        .then(|| create_progress_bar(files.len() as u64, "Processing files"));

    let semaphore = Arc::new(Semaphore::new(workers));
    let dry_run = args.dry_run;

    let mut results = stream::iter(files.into_iter())
        .map(|path| {
            let sem = semaphore.clone();
            let pipeline = pipeline.clone();
            let token = cancellation_token.clone();
            let file_pb = file_pb.clone();
            async move {
                let result = run_file(pipeline, path.clone(), sem, token, dry_run).await;
                if let Some(pb) = &file_pb {
                    pb.inc(1);
                }
                (path, result)
            }
        })
        .buffer_unordered(workers)
        .collect::<Vec<_>>()
        .await;

    if let Some(pb) = file_pb {
        pb.finish_with_message("Processing complete");
    }

    results.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut stats = RunStats::default();
    for (path, result) in &results {
        match result {
            Ok(file_result) => {
                stats.files_processed += 1;
                stats.records_processed += file_result.summary.total_records;
                stats.new_records += file_result.summary.new_records;
                stats.dup_records += file_result.summary.dup_records;
                stats.deduped_records += file_result.summary.deduped_records;
                stats.missing_barcodes += file_result.summary.missing_barcodes.len();
                stats.call_number_mismatches += file_result.summary.call_number_mismatches;
                if let Some(written) = &file_result.written {
                    stats.output_files.extend(written.record_files().cloned());
                    stats.output_files.push(written.summary.clone());
                }
                info!(
                    "Completed {}: {} records ({} new, {} dup, {} deduped)",
                    path.display(),
                    file_result.summary.total_records,
                    file_result.summary.new_records,
                    file_result.summary.dup_records,
                    file_result.summary.deduped_records
                );
            }
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                stats.files_failed += 1;
            }
        }
    }

    // A fatal error on any file stops the run
    if let Some(position) = results
        .iter()
        .position(|(_, result)| result.as_ref().is_err_and(is_critical_error))
    {
        if let (_, Err(e)) = results.swap_remove(position) {
            return Err(e);
        }
    }

    if !stats.has_integrity() {
        warn!(
            "{} barcodes were lost during partitioning; check the batch summaries",
            stats.missing_barcodes
        );
    }

    stats.processing_time = start_time.elapsed();

    generate_final_report(&args, &stats, &results)?;

    Ok(stats)
}

/// Process one file on the blocking pool once a worker slot is free
async fn run_file(
    pipeline: Arc<BatchPipeline>,
    path: PathBuf,
    semaphore: Arc<Semaphore>,
    cancellation_token: CancellationToken,
    dry_run: bool,
) -> Result<FileResult> {
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|_| Error::processing_interrupted("Worker pool closed"))?;
    if cancellation_token.is_cancelled() {
        return Err(Error::processing_interrupted("Processing cancelled"));
    }

    task::spawn_blocking(move || {
        if dry_run {
            pipeline.check_file(&path)
        } else {
            pipeline.process_file(&path)
        }
    })
    .await
    .map_err(|e| Error::processing_interrupted(format!("Worker task failed: {}", e)))?
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Generate final processing report
fn generate_final_report(
    args: &ProcessArgs,
    stats: &RunStats,
    results: &[(PathBuf, Result<FileResult>)],
) -> Result<()> {
    info!("Generating final report");

    match args.output_format {
        OutputFormat::Human => generate_human_report(args, stats, results),
        OutputFormat::Json => generate_json_report(stats, results),
    }
}

/// Generate human-readable report
fn generate_human_report(
    args: &ProcessArgs,
    stats: &RunStats,
    results: &[(PathBuf, Result<FileResult>)],
) -> Result<()> {
    let title = if args.dry_run {
        "Dry Run Complete"
    } else {
        "Reconciliation Complete"
    };

    println!("\n{}", title.bright_green().bold());
    println!(
        "  {} {}",
        "Time elapsed:".bright_cyan(),
        HumanDuration(stats.processing_time).to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "Records:".bright_cyan(),
        stats.records_processed.to_string().bright_white().bold()
    );

    if !args.dry_run {
        println!(
            "  {} {} new, {} dup, {} deduped",
            "Partitions:".bright_cyan(),
            stats.new_records.to_string().bright_white(),
            stats.dup_records.to_string().bright_white(),
            stats.deduped_records.to_string().bright_white()
        );
        if stats.has_integrity() {
            println!("  {} {}", "Integrity:".bright_cyan(), "ok".bright_green());
        } else {
            println!(
                "  {} {} barcodes missing",
                "Integrity:".bright_red(),
                stats.missing_barcodes.to_string().bright_red().bold()
            );
        }
        if stats.call_number_mismatches > 0 {
            println!(
                "  {} {} records",
                "Call number mismatches:".bright_yellow(),
                stats.call_number_mismatches.to_string().bright_yellow()
            );
        }
    }

    for (path, result) in results {
        match result {
            Ok(file_result) => {
                let summary = &file_result.summary;
                println!(
                    "\n  {} {} records, {} matched, {} catalog duplicates",
                    file_name(path).bright_white().bold(),
                    summary.total_records,
                    file_result.stats.matched,
                    file_result.stats.catalog_duplicates
                );
                for (vendor, tally) in &summary.vendor_breakdown {
                    println!(
                        "    {} {} attach, {} insert",
                        format!("{}:", vendor).bright_cyan(),
                        tally.attach,
                        tally.insert
                    );
                }
                if file_result.stats.errors > 0 {
                    println!(
                        "    {} {}",
                        "Skipped lookups:".bright_yellow(),
                        file_result.stats.errors
                    );
                }
                if let Some(written) = &file_result.written {
                    for output in written.record_files() {
                        println!("    -> {}", output.display());
                    }
                    println!("    -> {}", written.summary.display());
                }
            }
            Err(e) => {
                println!(
                    "\n  {} {}",
                    file_name(path).bright_red().bold(),
                    e.to_string().bright_red()
                );
            }
        }
    }

    println!();
    Ok(())
}

/// Generate JSON report for machine consumption
fn generate_json_report(stats: &RunStats, results: &[(PathBuf, Result<FileResult>)]) -> Result<()> {
    let files: serde_json::Map<String, serde_json::Value> = results
        .iter()
        .map(|(path, result)| {
            let value = match result {
                Ok(file_result) => serde_json::json!({
                    "status": "ok",
                    "summary": file_result.summary,
                    "matched": file_result.stats.matched,
                    "lookups": file_result.stats.lookups,
                    "skipped_lookups": file_result.stats.errors,
                    "outputs": file_result.written.as_ref().map(|written| {
                        written
                            .record_files()
                            .chain(std::iter::once(&written.summary))
                            .map(|p| p.display().to_string())
                            .collect::<Vec<_>>()
                    }),
                }),
                Err(e) => serde_json::json!({
                    "status": "failed",
                    "error": e.to_string(),
                }),
            };
            (file_name(path), value)
        })
        .collect();

    let report = serde_json::json!({
        "files_processed": stats.files_processed,
        "files_failed": stats.files_failed,
        "records_processed": stats.records_processed,
        "new_records": stats.new_records,
        "dup_records": stats.dup_records,
        "deduped_records": stats.deduped_records,
        "missing_barcodes": stats.missing_barcodes,
        "call_number_mismatches": stats.call_number_mismatches,
        "processing_integrity": stats.has_integrity(),
        "processing_time_seconds": stats.processing_time.as_secs_f64(),
        "files": files,
    });

    let output = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::json("report", "Failed to serialize report", e))?;
    println!("{}", output);
    Ok(())
}
