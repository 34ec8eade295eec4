//! Tests for statistics, reports and batch summaries

use super::*;
use crate::app::services::reconciler::classifier::CandidateClassifier;
use crate::app::services::reconciler::deduplication::BatchPartitions;
use crate::app::services::reconciler::stats::{
    BatchSummary, ProcessingStats, RecordAction, RecordReport,
};

#[test]
fn test_processing_stats_rates() {
    let mut stats = ProcessingStats::new();
    assert_eq!(stats.match_rate(), 0.0);
    assert_eq!(stats.lookups_per_record(), 0.0);

    stats.total_input = 4;
    stats.matched = 3;
    stats.lookups = 6;
    stats.add_error("timeout".to_string());

    assert_eq!(stats.match_rate(), 75.0);
    assert_eq!(stats.lookups_per_record(), 1.5);
    assert_eq!(stats.errors, 1);
    assert!(stats.summary().contains("Matched: 3 (75.0%)"));
    assert_eq!(ProcessingStats::default().total_input, 0);
}

#[test]
fn test_record_report_actions() {
    let record = create_test_record(nypl_branch_acq(), "9780306406157", &[]);
    let classifier = CandidateClassifier::new();

    let matched = classifier.classify(&record, vec![create_candidate("1", Collection::Branch)]);
    let report = RecordReport::new(&record, &matched, Some(Matchpoint::Isbn));
    assert_eq!(report.action, RecordAction::Attach);
    assert_eq!(report.target_id.as_deref(), Some("1"));
    assert_eq!(report.resource_id.as_deref(), Some("9780306406157"));

    let unmatched = classifier.classify(&record, vec![create_candidate("2", Collection::Mixed)]);
    let report = RecordReport::new(&record, &unmatched, Some(Matchpoint::Isbn));
    assert_eq!(report.action, RecordAction::Insert);
    assert_eq!(report.mixed_ids, vec!["2"]);

    assert_eq!(RecordReport::unmatched(&record).action, RecordAction::Insert);
}

#[test]
fn test_batch_summary_counts_and_vendor_breakdown() {
    let mut record = create_test_record(nypl_branch_acq(), "9780306406157", &["1"]);
    record.vendor = Some("INGRAM".to_string());
    let classifier = CandidateClassifier::new();

    let attach = classifier.classify(
        &record,
        vec![
            create_candidate("1", Collection::Branch),
            create_candidate("2", Collection::Branch).with_branch_call_number("FIC"),
        ],
    );
    let insert = classifier.classify(&record, Vec::new());
    let reports = vec![
        RecordReport::new(&record, &attach, Some(Matchpoint::Isbn)),
        RecordReport::new(&record, &insert, None),
    ];

    let partitions = BatchPartitions {
        new: vec![record.clone()],
        dup: Vec::new(),
        deduped: vec![record],
    };
    let summary = BatchSummary::new(
        "orders.json",
        nypl_branch_acq(),
        &partitions,
        &reports,
        vec!["9".to_string()],
    );

    assert_eq!(summary.total_records, 2);
    assert_eq!(summary.new_records, 1);
    assert_eq!(summary.deduped_records, 1);
    assert!(!summary.processing_integrity);

    let tally = summary.vendor_breakdown["INGRAM"];
    assert_eq!(tally.records, 2);
    assert_eq!(tally.attach, 1);
    assert_eq!(tally.insert, 1);
    assert_eq!(tally.duplicates, 1);
}

#[test]
fn test_batch_summary_json_shape() {
    let summary = BatchSummary::new(
        "orders.json",
        nypl_branch_acq(),
        &BatchPartitions::default(),
        &[],
        Vec::new(),
    );

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["file_name"], "orders.json");
    assert_eq!(json["library"], "nypl");
    assert_eq!(json["collection"], "BL");
    assert_eq!(json["record_type"], "acq");
    assert_eq!(json["processing_integrity"], true);
    assert!(json["missing_barcodes"].as_array().unwrap().is_empty());
}

#[test]
fn test_call_number_mismatch_reported_and_counted() {
    let classifier = CandidateClassifier::new();
    let mut record = create_test_record(nypl_branch_acq(), "9780306406157", &[]);
    record.branch_call_number = Some("FIC SMITH".to_string());

    let agreeing = classifier.classify(
        &record,
        vec![create_candidate("1", Collection::Branch).with_branch_call_number("FIC SMITH")],
    );
    let disagreeing = classifier.classify(
        &record,
        vec![create_candidate("2", Collection::Branch).with_branch_call_number("FIC JONES")],
    );
    let unmatched = classifier.classify(&record, Vec::new());

    let reports = vec![
        RecordReport::new(&record, &agreeing, Some(Matchpoint::Isbn)),
        RecordReport::new(&record, &disagreeing, Some(Matchpoint::Isbn)),
        RecordReport::new(&record, &unmatched, None),
        RecordReport::unmatched(&record),
    ];

    assert!(reports[0].call_number_match);
    assert_eq!(reports[1].target_call_no.as_deref(), Some("FIC JONES"));
    assert_eq!(reports[1].input_call_no.as_deref(), Some("FIC SMITH"));
    assert!(!reports[1].call_number_match);
    assert!(reports[2].call_number_match);
    assert!(reports[2].target_call_no.is_none());
    assert!(reports[3].call_number_match);

    let summary = BatchSummary::new(
        "orders.json",
        nypl_branch_acq(),
        &BatchPartitions::default(),
        &reports,
        Vec::new(),
    );
    assert_eq!(summary.call_number_mismatches, 1);

    let json = serde_json::to_value(&reports[1]).unwrap();
    assert_eq!(json["call_number_match"], false);
    assert_eq!(json["target_call_no"], "FIC JONES");
}
