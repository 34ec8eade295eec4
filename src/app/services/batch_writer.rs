//! Output writing for processed batches
//!
//! A batch read from `orders.json` produces, in the output directory:
//!
//! - `orders_NEW.json`, `orders_DUP.json`, `orders_DEDUPED.json` for non-empty groups
//! - `orders_summary.json` with a timestamp, the batch summary and one analysis
//!   row per record

use crate::app::models::RawRecord;
use crate::app::services::reconciler::{BatchOutcome, BatchSummary, RecordReport};
use crate::app::services::record_codec::RecordCodec;
use crate::constants::{OUTPUT_EXTENSION, SUMMARY_FILE_SUFFIX, partitions};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Files written for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenFiles {
    pub new: Option<PathBuf>,
    pub dup: Option<PathBuf>,
    pub deduped: Option<PathBuf>,
    pub summary: PathBuf,
}

impl WrittenFiles {
    pub fn record_files(&self) -> impl Iterator<Item = &PathBuf> {
        [&self.new, &self.dup, &self.deduped].into_iter().flatten()
    }
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    summary: &'a BatchSummary,
    records: &'a [RecordReport],
}

/// Writes batch partitions through a record codec
pub struct BatchWriter {
    output_dir: PathBuf,
    codec: Arc<dyn RecordCodec>,
}

impl std::fmt::Debug for BatchWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriter")
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl BatchWriter {
    pub fn new(output_dir: impl Into<PathBuf>, codec: Arc<dyn RecordCodec>) -> Self {
        Self {
            output_dir: output_dir.into(),
            codec,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Output path for a batch stem and suffix (`<stem>_<suffix>.json`)
    pub fn output_path(&self, stem: &str, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.{}", stem, suffix, OUTPUT_EXTENSION))
    }

    /// Write the groups and summary of a processed batch
    ///
    /// # Arguments
    ///
    /// * `input` - Input file the batch came from; its stem names the outputs
    /// * `outcome` - The processed batch
    pub fn write(&self, input: &Path, outcome: &BatchOutcome) -> Result<WrittenFiles> {
        let stem = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| {
                Error::configuration(format!("Cannot derive output name from {}", input.display()))
            })?;

        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            Error::io(
                format!("Failed to create output directory {}", self.output_dir.display()),
                e,
            )
        })?;

        let groups = &outcome.partitions;
        let written = WrittenFiles {
            new: self.write_group(stem, partitions::NEW, groups.new.iter().map(|r| &r.marc))?,
            dup: self.write_group(stem, partitions::DUP, groups.dup.iter().map(|r| &r.marc))?,
            deduped: self.write_group(
                stem,
                partitions::DEDUPED,
                groups.deduped.iter().map(|r| &r.marc),
            )?,
            summary: self.write_summary(stem, &outcome.summary, &outcome.reports)?,
        };

        info!(
            "Wrote {} record files and summary for {}",
            written.record_files().count(),
            input.display()
        );
        Ok(written)
    }

    fn write_group<'a>(
        &self,
        stem: &str,
        suffix: &str,
        records: impl Iterator<Item = &'a RawRecord>,
    ) -> Result<Option<PathBuf>> {
        let records: Vec<RawRecord> = records.cloned().collect();
        if records.is_empty() {
            debug!("No {} records for {}", suffix, stem);
            return Ok(None);
        }

        let path = self.output_path(stem, suffix);
        self.codec.write_file(&path, &records)?;
        debug!("Wrote {} {} records to {}", records.len(), suffix, path.display());
        Ok(Some(path))
    }

    fn write_summary(
        &self,
        stem: &str,
        summary: &BatchSummary,
        reports: &[RecordReport],
    ) -> Result<PathBuf> {
        let path = self.output_path(stem, SUMMARY_FILE_SUFFIX);
        let document = SummaryDocument {
            generated_at: Utc::now(),
            summary,
            records: reports,
        };
        let content = serde_json::to_string_pretty(&document).map_err(|e| {
            Error::json(path.display().to_string(), "Failed to serialize summary", e)
        })?;
        std::fs::write(&path, content)
            .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{BatchContext, Collection, Field, Library, Record, RecordType};
    use crate::app::services::reconciler::{BatchPartitions, ProcessingStats};
    use crate::app::services::record_codec::JsonRecordCodec;
    use tempfile::TempDir;

    fn context() -> BatchContext {
        BatchContext::new(Library::Nypl, Collection::Branch, RecordType::Acq)
    }

    fn record(barcode: &str) -> Record {
        let mut record = Record::new(Library::Nypl, Collection::Branch, RecordType::Acq);
        record.barcodes = vec![barcode.to_string()];
        record
            .marc
            .fields
            .push(Field::new("949", ' ', '1').with_subfield('i', barcode));
        record
    }

    fn outcome(partitions: BatchPartitions) -> BatchOutcome {
        let summary = BatchSummary::new("orders.json", context(), &partitions, &[], Vec::new());
        BatchOutcome {
            partitions,
            reports: Vec::new(),
            summary,
            stats: ProcessingStats::new(),
        }
    }

    #[test]
    fn test_writes_non_empty_groups_and_summary() {
        let temp_dir = TempDir::new().unwrap();
        let writer = BatchWriter::new(temp_dir.path().join("out"), Arc::new(JsonRecordCodec::new()));
        let outcome = outcome(BatchPartitions {
            new: vec![record("1"), record("2")],
            dup: Vec::new(),
            deduped: vec![record("3")],
        });

        let written = writer.write(Path::new("in/orders.json"), &outcome).unwrap();

        assert!(written.new.as_ref().unwrap().ends_with("orders_NEW.json"));
        assert!(written.dup.is_none());
        assert!(written.deduped.as_ref().unwrap().ends_with("orders_DEDUPED.json"));
        assert!(written.summary.ends_with("orders_summary.json"));
        assert_eq!(written.record_files().count(), 2);

        let new_records = JsonRecordCodec::new()
            .read_file(written.new.as_ref().unwrap())
            .unwrap();
        assert_eq!(new_records.len(), 2);
        assert_eq!(new_records[1].fields[0].get('i'), Some("2"));

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written.summary).unwrap()).unwrap();
        assert_eq!(summary["file_name"], "orders.json");
        assert!(summary["generated_at"].is_string());
        assert_eq!(summary["new_records"], 2);
        assert_eq!(summary["deduped_records"], 1);
        assert!(summary["records"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_empty_batch_writes_only_summary() {
        let temp_dir = TempDir::new().unwrap();
        let writer = BatchWriter::new(temp_dir.path(), Arc::new(JsonRecordCodec::new()));

        let written = writer
            .write(Path::new("empty.json"), &outcome(BatchPartitions::default()))
            .unwrap();

        assert_eq!(written.record_files().count(), 0);
        assert!(written.summary.exists());
    }
}
