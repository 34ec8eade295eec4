//! Record reconciliation and batch deduplication
//!
//! This module decides, for every record in a batch, whether it already exists in
//! the catalog and under which identifier, edits the record accordingly, and then
//! partitions the batch into new, duplicate and deduplicated groups.
//!
//! # Architecture
//!
//! - [`matcher`] - Catalog queries by prioritized matchpoints with first-success short-circuit
//! - [`classifier`] - Candidate bucketing and target identifier resolution
//! - [`template`] - Template values merged onto record orders
//! - [`field_updates`] - Structural field edits and the rules that build them
//! - [`deduplication`] - Batch partitioning and barcode integrity checks
//! - [`processor`] - BatchProcessor orchestration
//! - [`stats`] - Counters, per-record reports and batch summaries
//!
//! # Processing Pipeline
//!
//! 1. **Preconditions**: unique barcodes, and a template or vendor matchpoints
//!    depending on the workflow, checked before any catalog query
//! 2. **Matching**: one query per matchpoint until one yields candidates
//! 3. **Classification**: matched / mixed / other buckets and a single target id
//! 4. **Record updates**: template values, then field updates and the leader
//! 5. **Partitioning**: NEW, DUP and DEDUPED, then the barcode integrity check
//!
//! Records are processed one at a time and in batch order; partitioning needs
//! every record's resolved target id.
//!
//! # Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use bibrecon::app::models::{BatchContext, Collection, Library, Matchpoints, RecordType, Template};
//! use bibrecon::app::services::catalog::LocalCatalog;
//! use bibrecon::app::services::reconciler::BatchProcessor;
//! use bibrecon::config::Config;
//!
//! # fn example(records: Vec<bibrecon::Record>) -> bibrecon::Result<()> {
//! let template = Template::new("firm orders")
//!     .with_matchpoints(Matchpoints::from_keys(&["isbn", "oclc_number"])?)
//!     .with_field("fund", "10001adbk");
//!
//! let context = BatchContext::new(Library::Nypl, Collection::Branch, RecordType::Acq);
//! let processor = BatchProcessor::new(&Config::default(), context, Arc::new(LocalCatalog::new(Vec::new())))
//!     .with_template(template);
//!
//! let outcome = processor.process_batch("orders.json", records)?;
//! println!("Missing barcodes: {:?}", outcome.missing_barcodes());
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod deduplication;
pub mod field_updates;
pub mod matcher;
pub mod processor;
pub mod stats;
pub mod template;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use classifier::{CandidateClassifier, ReviewedResult};
pub use deduplication::{BatchDeduplicator, BatchPartitions, collect_barcodes};
pub use field_updates::{FieldRules, FieldUpdate, FieldUpdatePipeline};
pub use matcher::{MatchExecutor, MatchOutcome};
pub use processor::BatchProcessor;
pub use stats::{
    BatchOutcome, BatchSummary, ProcessingStats, RecordAction, RecordReport, VendorTally,
};
pub use template::TemplateApplier;
