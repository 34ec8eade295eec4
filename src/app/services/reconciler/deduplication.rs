//! Batch partitioning by resolved target identifier
//!
//! Once every record in a batch carries its resolved target id, the batch is
//! split into three groups:
//!
//! - **NEW**: records without a target id
//! - **DEDUPED**: the first record (batch order) for each distinct target id
//! - **DUP**: every later record sharing a target id already seen
//!
//! Barcodes are unique across a batch on the way in and must all survive
//! partitioning; a lost barcode is reported, not raised.

use crate::app::models::Record;
use crate::{Error, Result};
use indicatif::ProgressBar;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, error, info};

/// The three record groups produced for a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPartitions {
    pub new: Vec<Record>,
    pub dup: Vec<Record>,
    pub deduped: Vec<Record>,
}

impl BatchPartitions {
    pub fn total(&self) -> usize {
        self.new.len() + self.dup.len() + self.deduped.len()
    }

    /// Every barcode across all three groups
    pub fn barcodes(&self) -> HashSet<&str> {
        self.new
            .iter()
            .chain(&self.dup)
            .chain(&self.deduped)
            .flat_map(|record| record.barcodes.iter().map(String::as_str))
            .collect()
    }
}

/// Every barcode in a batch, in record order
pub fn collect_barcodes(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.barcodes.iter().cloned())
        .collect()
}

/// Partitions processed batches and checks barcode integrity
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchDeduplicator;

impl BatchDeduplicator {
    pub fn new() -> Self {
        Self
    }

    /// Reject a batch in which two barcodes are identical
    ///
    /// # Errors
    ///
    /// `Error::DuplicateBarcodes` listing each repeated barcode once, sorted
    pub fn ensure_unique(&self, records: &[Record]) -> Result<()> {
        let mut seen = HashSet::new();
        let duplicates: BTreeSet<&str> = records
            .iter()
            .flat_map(|record| record.barcodes.iter().map(String::as_str))
            .filter(|barcode| !seen.insert(*barcode))
            .collect();

        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(Error::duplicate_barcodes(
                duplicates.into_iter().map(str::to_string).collect(),
            ))
        }
    }

    /// Split records into NEW, DUP and DEDUPED, keeping batch order within each group
    ///
    /// # Arguments
    ///
    /// * `records` - Records with resolved target ids, in batch order
    /// * `progress_bar` - Optional progress bar advanced once per record
    pub fn deduplicate(
        &self,
        records: Vec<Record>,
        progress_bar: Option<&ProgressBar>,
    ) -> BatchPartitions {
        let mut partitions = BatchPartitions::default();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for record in records {
            if let Some(pb) = progress_bar {
                pb.inc(1);
            }

            let Some(target_id) = record
                .target_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
            else {
                partitions.new.push(record);
                continue;
            };

            let count = seen.entry(target_id).or_insert(0);
            *count += 1;
            if *count == 1 {
                partitions.deduped.push(record);
            } else {
                debug!(
                    "Record {} duplicates an earlier record in the batch",
                    record.resource_id().unwrap_or("without identifiers")
                );
                partitions.dup.push(record);
            }
        }

        info!(
            "Partitioned batch: {} new, {} duplicate, {} deduplicated",
            partitions.new.len(),
            partitions.dup.len(),
            partitions.deduped.len()
        );

        partitions
    }

    /// Barcodes present before partitioning but missing from every group
    ///
    /// # Returns
    ///
    /// Missing barcodes, sorted and unique; empty when nothing was lost
    pub fn ensure_preserved(
        &self,
        partitions: &BatchPartitions,
        original_barcodes: &[String],
    ) -> Vec<String> {
        let present = partitions.barcodes();
        let missing: BTreeSet<&str> = original_barcodes
            .iter()
            .map(String::as_str)
            .filter(|barcode| !present.contains(barcode))
            .collect();

        if !missing.is_empty() {
            error!(
                "{} barcodes lost during deduplication: {:?}",
                missing.len(),
                missing
            );
        }

        missing.into_iter().map(str::to_string).collect()
    }
}
