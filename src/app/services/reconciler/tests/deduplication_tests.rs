//! Tests for batch partitioning and barcode integrity

use super::*;
use crate::app::services::reconciler::deduplication::{
    BatchDeduplicator, BatchPartitions, collect_barcodes,
};

fn record_with_target(target_id: Option<&str>, barcode: &str) -> Record {
    let mut record = create_test_record(nypl_branch_acq(), "9780306406157", &[barcode]);
    record.target_id = target_id.map(str::to_string);
    record
}

fn barcodes_of(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .flat_map(|record| record.barcodes.iter().map(String::as_str))
        .collect()
}

#[test]
fn test_dedup_batch_scenario() {
    let records = vec![
        record_with_target(Some("b1"), "00001"),
        record_with_target(Some("b1"), "00002"),
        record_with_target(None, "00003"),
    ];
    let original = collect_barcodes(&records);

    let deduplicator = BatchDeduplicator::new();
    let partitions = deduplicator.deduplicate(records, None);

    assert_eq!(barcodes_of(&partitions.deduped), vec!["00001"]);
    assert_eq!(barcodes_of(&partitions.dup), vec!["00002"]);
    assert_eq!(barcodes_of(&partitions.new), vec!["00003"]);
    assert!(deduplicator.ensure_preserved(&partitions, &original).is_empty());
    assert_eq!(partitions.total(), 3);
}

#[test]
fn test_single_matches_go_to_deduped_in_batch_order() {
    let records = vec![
        record_with_target(Some("b3"), "1"),
        record_with_target(Some("b1"), "2"),
        record_with_target(Some("b2"), "3"),
    ];

    let partitions = BatchDeduplicator::new().deduplicate(records, None);

    assert_eq!(barcodes_of(&partitions.deduped), vec!["1", "2", "3"]);
    assert!(partitions.dup.is_empty());
    assert!(partitions.new.is_empty());
}

#[test]
fn test_every_later_duplicate_goes_to_dup() {
    let records = vec![
        record_with_target(Some("b1"), "1"),
        record_with_target(Some("b2"), "2"),
        record_with_target(Some("b1"), "3"),
        record_with_target(Some("b1"), "4"),
        record_with_target(Some(""), "5"),
    ];

    let partitions = BatchDeduplicator::new().deduplicate(records, None);

    assert_eq!(barcodes_of(&partitions.deduped), vec!["1", "2"]);
    assert_eq!(barcodes_of(&partitions.dup), vec!["3", "4"]);
    assert_eq!(barcodes_of(&partitions.new), vec!["5"]);
}

#[test]
fn test_unmatched_records_never_deduplicated_against_each_other() {
    let records = vec![
        record_with_target(None, "1"),
        record_with_target(None, "2"),
    ];

    let partitions = BatchDeduplicator::new().deduplicate(records, None);

    assert_eq!(partitions.new.len(), 2);
    assert!(partitions.deduped.is_empty());
}

#[test]
fn test_ensure_unique_rejects_repeated_barcode() {
    let records = vec![
        record_with_target(None, "00001"),
        record_with_target(None, "00002"),
        record_with_target(None, "00001"),
    ];

    let result = BatchDeduplicator::new().ensure_unique(&records);

    match result {
        Err(Error::DuplicateBarcodes { barcodes }) => assert_eq!(barcodes, vec!["00001"]),
        other => panic!("expected duplicate barcodes error, got {:?}", other),
    }
}

#[test]
fn test_ensure_unique_within_one_record() {
    let records = vec![create_test_record(nypl_branch_acq(), "1", &["7", "7"])];
    assert!(BatchDeduplicator::new().ensure_unique(&records).is_err());

    let records = vec![create_test_record(nypl_branch_acq(), "1", &["7", "8"])];
    assert!(BatchDeduplicator::new().ensure_unique(&records).is_ok());
}

#[test]
fn test_ensure_preserved_reports_lost_barcodes() {
    let records = vec![
        record_with_target(Some("b1"), "1"),
        record_with_target(None, "2"),
    ];
    let mut original = collect_barcodes(&records);
    original.push("9".to_string());
    original.push("0".to_string());

    let deduplicator = BatchDeduplicator::new();
    let partitions = deduplicator.deduplicate(records, None);
    let missing = deduplicator.ensure_preserved(&partitions, &original);

    assert_eq!(missing, vec!["0", "9"]);
}

#[test]
fn test_ensure_preserved_on_empty_partitions() {
    let missing = BatchDeduplicator::new()
        .ensure_preserved(&BatchPartitions::default(), &["1".to_string()]);
    assert_eq!(missing, vec!["1"]);
}
