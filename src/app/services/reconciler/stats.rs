//! Processing statistics, per-record reports and batch summaries
//!
//! These types carry everything a caller reports after a batch: running counters
//! kept during reconciliation, one analysis row per record, and the serializable
//! summary written next to the output groups.

use super::classifier::ReviewedResult;
use super::deduplication::BatchPartitions;
use crate::app::models::{BatchContext, Collection, Library, Matchpoint, Record, RecordType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters kept while reconciling a batch
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingStats {
    /// Number of records in the batch
    pub total_input: usize,
    /// Catalog queries issued
    pub lookups: usize,
    /// Records resolved to a catalog identifier
    pub matched: usize,
    /// Records with no resolved identifier
    pub unmatched: usize,
    /// Records whose matched bucket held more than one candidate
    pub catalog_duplicates: usize,
    /// Order attribute assignments made from the template
    pub template_fields_applied: usize,
    /// Fields inserted by field updates
    pub fields_inserted: usize,
    /// Lookups that failed and were skipped
    pub errors: usize,
    /// Messages for each skipped failure
    pub error_messages: Vec<String>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self {
            total_input: 0,
            lookups: 0,
            matched: 0,
            unmatched: 0,
            catalog_duplicates: 0,
            template_fields_applied: 0,
            fields_inserted: 0,
            errors: 0,
            error_messages: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: String) {
        self.errors += 1;
        self.error_messages.push(message);
    }

    /// Share of records resolved to a catalog identifier, as a percentage
    pub fn match_rate(&self) -> f64 {
        if self.total_input == 0 {
            0.0
        } else {
            (self.matched as f64 / self.total_input as f64) * 100.0
        }
    }

    /// Average catalog queries per record
    pub fn lookups_per_record(&self) -> f64 {
        if self.total_input == 0 {
            0.0
        } else {
            self.lookups as f64 / self.total_input as f64
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciliation Summary: {} records | Matched: {} ({:.1}%) | Unmatched: {} | \
             Catalog duplicates: {} | Lookups: {} ({:.2}/record) | Errors: {}",
            self.total_input,
            self.matched,
            self.match_rate(),
            self.unmatched,
            self.catalog_duplicates,
            self.lookups,
            self.lookups_per_record(),
            self.errors
        )
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

/// What loading a record into the catalog will do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordAction {
    /// Overlay the resolved catalog record
    Attach,
    /// Create a new catalog record
    Insert,
}

/// Analysis row for one processed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReport {
    pub vendor: Option<String>,
    pub resource_id: Option<String>,
    pub target_id: Option<String>,
    pub matched_on: Option<Matchpoint>,
    pub duplicate_ids: Vec<String>,
    pub mixed_ids: Vec<String>,
    pub other_ids: Vec<String>,
    pub input_call_no: Option<String>,
    pub target_call_no: Option<String>,
    pub call_number_match: bool,
    pub action: RecordAction,
}

impl RecordReport {
    pub fn new(record: &Record, reviewed: &ReviewedResult, matched_on: Option<Matchpoint>) -> Self {
        let action = if reviewed.target_id.is_some() {
            RecordAction::Attach
        } else {
            RecordAction::Insert
        };

        Self {
            vendor: record.vendor.clone(),
            resource_id: reviewed.resource_id.clone(),
            target_id: reviewed.target_id.clone(),
            matched_on,
            duplicate_ids: reviewed.duplicate_ids.clone(),
            mixed_ids: reviewed.mixed_ids(),
            other_ids: reviewed.other_ids(),
            input_call_no: reviewed.input_call_no.clone(),
            target_call_no: reviewed.target_call_no.clone(),
            call_number_match: reviewed.call_number_match,
            action,
        }
    }

    /// Report for a record whose lookup failed and was skipped
    pub fn unmatched(record: &Record) -> Self {
        Self {
            vendor: record.vendor.clone(),
            resource_id: record.resource_id().map(str::to_string),
            target_id: None,
            matched_on: None,
            duplicate_ids: Vec::new(),
            mixed_ids: Vec::new(),
            other_ids: Vec::new(),
            input_call_no: record.input_call_number().map(str::to_string),
            target_call_no: None,
            call_number_match: true,
            action: RecordAction::Insert,
        }
    }
}

/// Per-vendor record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorTally {
    pub records: usize,
    pub attach: usize,
    pub insert: usize,
    pub duplicates: usize,
}

/// Serializable summary of one processed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub file_name: String,
    pub library: Library,
    pub collection: Collection,
    pub record_type: RecordType,
    pub total_records: usize,
    pub new_records: usize,
    pub dup_records: usize,
    pub deduped_records: usize,
    pub missing_barcodes: Vec<String>,
    /// Whether every input barcode survived partitioning
    pub processing_integrity: bool,
    /// Records whose call number disagrees with the resolved target's
    pub call_number_mismatches: usize,
    pub vendor_breakdown: BTreeMap<String, VendorTally>,
}

impl BatchSummary {
    pub fn new(
        file_name: impl Into<String>,
        context: BatchContext,
        partitions: &BatchPartitions,
        reports: &[RecordReport],
        missing_barcodes: Vec<String>,
    ) -> Self {
        let mut vendor_breakdown: BTreeMap<String, VendorTally> = BTreeMap::new();
        for report in reports {
            let Some(vendor) = &report.vendor else {
                continue;
            };
            let tally = vendor_breakdown.entry(vendor.clone()).or_default();
            tally.records += 1;
            match report.action {
                RecordAction::Attach => tally.attach += 1,
                RecordAction::Insert => tally.insert += 1,
            }
            if !report.duplicate_ids.is_empty() {
                tally.duplicates += 1;
            }
        }

        Self {
            file_name: file_name.into(),
            library: context.library,
            collection: context.collection,
            record_type: context.record_type,
            total_records: reports.len(),
            new_records: partitions.new.len(),
            dup_records: partitions.dup.len(),
            deduped_records: partitions.deduped.len(),
            processing_integrity: missing_barcodes.is_empty(),
            missing_barcodes,
            call_number_mismatches: reports
                .iter()
                .filter(|report| !report.call_number_match)
                .count(),
            vendor_breakdown,
        }
    }
}

/// Everything a processed batch produces
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub partitions: BatchPartitions,
    pub reports: Vec<RecordReport>,
    pub summary: BatchSummary,
    pub stats: ProcessingStats,
}

impl BatchOutcome {
    pub fn missing_barcodes(&self) -> &[String] {
        &self.summary.missing_barcodes
    }

    pub fn has_integrity(&self) -> bool {
        self.summary.processing_integrity
    }

    /// Reports whose call number disagrees with the resolved target's
    pub fn call_number_mismatches(&self) -> impl Iterator<Item = &RecordReport> {
        self.reports.iter().filter(|report| !report.call_number_match)
    }
}
