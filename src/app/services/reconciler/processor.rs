//! Batch processor and pipeline orchestration
//!
//! This module contains the BatchProcessor struct, which runs every record of a
//! batch through matching, classification, template application and field
//! updates, then partitions the batch and checks barcode integrity.

use crate::app::models::{
    BatchContext, Matchpoint, Matchpoints, Record, RecordType, Template,
};
use crate::app::services::catalog::CatalogLookup;
use crate::config::{Config, LookupFailurePolicy};
use crate::constants::FALLBACK_MATCHPOINT;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    classifier::CandidateClassifier,
    deduplication::{BatchDeduplicator, collect_barcodes},
    field_updates::{FieldRules, FieldUpdatePipeline},
    matcher::MatchExecutor,
    stats::{BatchOutcome, BatchSummary, ProcessingStats, RecordReport},
    template::TemplateApplier,
};

/// Reconciles batches of records against the catalog
///
/// One processor serves one batch context (library, collection, workflow). It
/// holds no state between batches, so a processor can be shared across threads
/// and each batch run independently.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use bibrecon::app::models::{BatchContext, Collection, Library, RecordType, Template};
/// use bibrecon::app::services::catalog::LocalCatalog;
/// use bibrecon::app::services::reconciler::BatchProcessor;
/// use bibrecon::config::Config;
///
/// # fn example(records: Vec<bibrecon::Record>) -> bibrecon::Result<()> {
/// let context = BatchContext::new(Library::Nypl, Collection::Branch, RecordType::Acq);
/// let catalog = Arc::new(LocalCatalog::new(Vec::new()));
/// let processor = BatchProcessor::new(&Config::default(), context, catalog)
///     .with_template(Template::new("standing order"));
///
/// let outcome = processor.process_batch("orders.json", records)?;
/// println!("{} new records", outcome.summary.new_records);
/// # Ok(())
/// # }
/// ```
pub struct BatchProcessor {
    context: BatchContext,
    matcher: MatchExecutor,
    classifier: CandidateClassifier,
    applier: TemplateApplier,
    rules: FieldRules,
    pipeline: FieldUpdatePipeline,
    deduplicator: BatchDeduplicator,
    template: Option<Template>,
    on_lookup_failure: LookupFailurePolicy,
    show_progress: bool,
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("context", &self.context)
            .field("matcher", &self.matcher)
            .field("template", &self.template.as_ref().map(|t| &t.name))
            .field("on_lookup_failure", &self.on_lookup_failure)
            .finish()
    }
}

impl BatchProcessor {
    /// Create a processor for one batch context
    ///
    /// # Arguments
    ///
    /// * `config` - Library conventions, order mapping and processing options
    /// * `context` - Library, collection and workflow of the batches
    /// * `catalog` - Lookup service queried for candidates
    pub fn new(config: &Config, context: BatchContext, catalog: Arc<dyn CatalogLookup>) -> Self {
        let rules = FieldRules::new(config, context);
        let pipeline = rules.pipeline();

        Self {
            context,
            matcher: MatchExecutor::new(catalog),
            classifier: CandidateClassifier::new(),
            applier: TemplateApplier::new(),
            rules,
            pipeline,
            deduplicator: BatchDeduplicator::new(),
            template: None,
            on_lookup_failure: config.processing.on_lookup_failure,
            show_progress: false,
        }
    }

    /// Use a template for order-level workflows
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_lookup_failure_policy(mut self, policy: LookupFailurePolicy) -> Self {
        self.on_lookup_failure = policy;
        self
    }

    pub fn context(&self) -> BatchContext {
        self.context
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// Check everything that must hold before any catalog query is made
    ///
    /// # Errors
    ///
    /// * `Error::DuplicateBarcodes` - two records share a barcode
    /// * `Error::MissingTemplate` - order-level workflow without a template
    /// * `Error::MissingVendorInfo` - cataloging record without vendor matchpoints
    pub fn check_preconditions(&self, records: &[Record]) -> Result<()> {
        self.deduplicator.ensure_unique(records)?;

        if self.context.record_type.is_order_level() {
            if self.template.is_none() {
                return Err(Error::missing_template(self.context.record_type.as_str()));
            }
        } else if let Some(record) = records.iter().find(|record| record.vendor_info.is_none()) {
            return Err(Error::missing_vendor_info(
                record.resource_id().unwrap_or("record without identifiers"),
            ));
        }

        Ok(())
    }

    /// Reconcile a batch and partition it
    ///
    /// This method applies the complete pipeline:
    /// 1. Precondition checks over the whole batch (no lookups before they pass)
    /// 2. Per record: match, classify, apply template, apply field updates
    /// 3. Partitioning into NEW, DUP and DEDUPED
    /// 4. Barcode integrity check
    ///
    /// # Arguments
    ///
    /// * `file_name` - Name the batch is reported under
    /// * `records` - Records in batch order
    ///
    /// # Returns
    ///
    /// A `BatchOutcome` with the partitions, per-record reports and summary
    ///
    /// # Errors
    ///
    /// Precondition violations, and lookup failures unless the lookup failure
    /// policy is `Skip`. No partial outcome is produced on error.
    pub fn process_batch(&self, file_name: &str, mut records: Vec<Record>) -> Result<BatchOutcome> {
        self.check_preconditions(&records)?;

        let mut stats = ProcessingStats::new();
        stats.total_input = records.len();
        let original_barcodes = collect_barcodes(&records);

        info!(
            "Reconciling {} records from {} ({})",
            records.len(),
            file_name,
            self.context
        );

        let reconcile_pb = self
            .show_progress
            .then(|| Self::create_processing_progress_bar(records.len() as u64, "Reconciling"));

        let mut reports = Vec::with_capacity(records.len());
        for record in &mut records {
            reports.push(self.process_record(record, &mut stats)?);
            if let Some(pb) = &reconcile_pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = reconcile_pb {
            pb.finish_with_message(format!(
                "Reconciliation complete: {} matched of {}",
                stats.matched, stats.total_input
            ));
        }

        let dedup_pb = self
            .show_progress
            .then(|| Self::create_processing_progress_bar(records.len() as u64, "Partitioning"));
        let partitions = self.deduplicator.deduplicate(records, dedup_pb.as_ref());
        if let Some(pb) = dedup_pb {
            pb.finish_with_message("Partitioning complete");
        }

        let missing = self
            .deduplicator
            .ensure_preserved(&partitions, &original_barcodes);
        let summary = BatchSummary::new(file_name, self.context, &partitions, &reports, missing);

        info!("{}", stats.summary());
        if stats.errors > 0 {
            debug!("Skipped lookup failures: {:?}", stats.error_messages);
        }

        Ok(BatchOutcome {
            partitions,
            reports,
            summary,
            stats,
        })
    }

    /// Run one record through matching, classification and updates
    fn process_record(&self, record: &mut Record, stats: &mut ProcessingStats) -> Result<RecordReport> {
        let matchpoints = self.matchpoints_for(record);

        let outcome = match self.matcher.search(record, &matchpoints) {
            Ok(outcome) => Some(outcome),
            Err(error) if self.skips(&error) => {
                warn!(
                    "Lookup failed for {}, treating as unmatched: {}",
                    record.resource_id().unwrap_or("record"),
                    error
                );
                stats.add_error(error.to_string());
                None
            }
            Err(error) => return Err(error),
        };

        let report = match outcome {
            Some(outcome) => {
                stats.lookups += outcome.queries;
                let reviewed = self.classifier.classify(record, outcome.candidates);
                record.target_id = reviewed.target_id.clone();
                if reviewed.has_duplicates() {
                    stats.catalog_duplicates += 1;
                }
                RecordReport::new(record, &reviewed, outcome.matched_on)
            }
            None => {
                record.target_id = None;
                RecordReport::unmatched(record)
            }
        };

        if record.target_id.is_some() {
            stats.matched += 1;
        } else {
            stats.unmatched += 1;
        }

        if let Some(template) = &self.template {
            if self.context.record_type.is_order_level() {
                stats.template_fields_applied += self.applier.apply(record, template);
            }
        }

        let updates = self.rules.updates_for(record, self.template.as_ref());
        self.pipeline.apply_updates(&mut record.marc, &updates);
        self.rules.update_leader(&mut record.marc);
        stats.fields_inserted += updates.iter().filter(|update| update.inserts()).count();

        debug!(
            "Processed {}: target {:?}, {} field updates",
            report.resource_id.as_deref().unwrap_or("record"),
            report.target_id,
            updates.len()
        );

        Ok(report)
    }

    /// Matchpoints a record is searched with: the template's for order-level
    /// workflows, the vendor's for cataloging
    fn matchpoints_for(&self, record: &Record) -> Matchpoints {
        let matchpoints = match self.context.record_type {
            RecordType::Acq | RecordType::Sel => self
                .template
                .as_ref()
                .map(|template| template.matchpoints.clone()),
            RecordType::Cat => record
                .vendor_info
                .as_ref()
                .map(|vendor| vendor.matchpoints.clone()),
        };

        match matchpoints {
            Some(matchpoints) if !matchpoints.is_empty() => matchpoints,
            _ => fallback_matchpoints(),
        }
    }

    fn skips(&self, error: &Error) -> bool {
        self.on_lookup_failure == LookupFailurePolicy::Skip
            && matches!(
                error,
                Error::LookupFailure { .. } | Error::NotSupported { .. }
            )
    }

    /// Create a progress bar for processing operations
    fn create_processing_progress_bar(total: u64, operation: &str) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} [{per_sec}] ETA: {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message(operation.to_string());
        pb
    }
}

fn fallback_matchpoints() -> Matchpoints {
    let primary = FALLBACK_MATCHPOINT.parse::<Matchpoint>().ok();
    Matchpoints::new(primary, None, None).unwrap_or_default()
}
