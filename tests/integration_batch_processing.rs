//! Integration tests for batch reconciliation
//!
//! These tests run record files through the full pipeline using public APIs:
//! JSON codec -> record mapper -> batch processor -> batch writer.

use bibrecon::app::models::{
    BatchContext, Collection, Field, Library, MarcRecord, Matchpoints, RawRecord, RecordType,
    Template,
};
use bibrecon::app::services::batch_writer::BatchWriter;
use bibrecon::app::services::catalog::{CatalogLookup, LocalCatalog};
use bibrecon::app::services::reconciler::BatchProcessor;
use bibrecon::app::services::record_codec::{JsonRecordCodec, RecordCodec, RecordMapper};
use bibrecon::app::services::template_store::TemplateStore;
use bibrecon::config::Config;
use bibrecon::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const CATALOG_SNAPSHOT: &str = r#"[
    {"bib_id": "100", "collection": "BL", "branch_call_number": "FIC SMITH", "isbn": ["9780000000001"]},
    {"bib_id": "50", "collection": "BL", "isbn": ["9780000000001"]},
    {"bib_id": "10", "collection": "RL", "isbn": ["9780000000001"]},
    {"bib_id": "200", "collection": "BL", "isbn": ["9780000000002"]},
    {"bib_id": "300", "isbn": ["9780000000003"], "unknown_key": "ignored"}
]"#;

/// Order-level record with an ISBN, one order and one item barcode
fn order_record(isbn: &str, barcode: &str) -> RawRecord {
    let mut record = MarcRecord::new("00000nam  2200000 a 4500");
    record.fields.push(Field::control("001", format!("vendor-{}", barcode)));
    record
        .fields
        .push(Field::new("020", ' ', ' ').with_subfield('a', isbn));
    record.fields.push(
        Field::new("245", '1', '0').with_subfield('a', format!("Title {} /", barcode)),
    );
    record.fields.push(
        Field::new("960", ' ', ' ')
            .with_subfield('t', "mya0n")
            .with_subfield('u', "old-fund"),
    );
    record
        .fields
        .push(Field::new("949", ' ', '1').with_subfield('i', barcode));
    record
}

fn write_input(dir: &Path, name: &str, records: &[RawRecord]) -> Result<PathBuf> {
    let path = dir.join(name);
    JsonRecordCodec::new().write_file(&path, records)?;
    Ok(path)
}

fn write_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("catalog.json");
    std::fs::write(&path, CATALOG_SNAPSHOT).unwrap();
    path
}

fn firm_orders_template() -> Template {
    Template::new("Firm Orders")
        .with_matchpoints(Matchpoints::from_keys(&["isbn"]).unwrap())
        .with_field("fund", "10001adbk")
        .with_field("vendor_notes", "")
}

/// Read, reconcile and write one file the way the process command does
fn run_pipeline(
    input: &Path,
    output_dir: &Path,
    context: BatchContext,
    template: Option<Template>,
    catalog: Arc<dyn CatalogLookup>,
) -> Result<bibrecon::app::services::batch_writer::WrittenFiles> {
    let config = Config::default();
    let codec: Arc<dyn RecordCodec> = Arc::new(JsonRecordCodec::new());

    let records = RecordMapper::new(&config, context)?.map_all(codec.read_file(input)?);
    let mut processor = BatchProcessor::new(&config, context, catalog);
    if let Some(template) = template {
        processor = processor.with_template(template);
    }
    let outcome = processor.process_batch("orders.json", records)?;

    BatchWriter::new(output_dir, codec).write(input, &outcome)
}

fn tag_value<'a>(record: &'a RawRecord, tag: &str, code: char) -> Option<&'a str> {
    record.first(tag).and_then(|field| field.get(code))
}

#[test]
fn test_acquisitions_batch_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_path = write_catalog(temp_dir.path());
    let input = write_input(
        temp_dir.path(),
        "orders.json",
        &[
            order_record("9780000000001", "33333000000001"),
            order_record("9780000000002", "33333000000002"),
            order_record("978-0-00-000000-2", "33333000000003"),
            order_record("9780000000009", "33333000000004"),
        ],
    )
    .unwrap();

    let catalog = Arc::new(LocalCatalog::from_json_file(&catalog_path).unwrap());
    let context = BatchContext::new(Library::Nypl, Collection::Branch, RecordType::Acq);
    let output_dir = temp_dir.path().join("out");

    let written = run_pipeline(
        &input,
        &output_dir,
        context,
        Some(firm_orders_template()),
        catalog,
    )
    .unwrap();

    let codec = JsonRecordCodec::new();
    let new = codec.read_file(written.new.as_ref().unwrap()).unwrap();
    let dup = codec.read_file(written.dup.as_ref().unwrap()).unwrap();
    let deduped = codec.read_file(written.deduped.as_ref().unwrap()).unwrap();

    assert_eq!(new.len(), 1);
    assert_eq!(dup.len(), 1);
    assert_eq!(deduped.len(), 2);

    // Unmatched record: no target id, collection still stamped
    assert_eq!(tag_value(&new[0], "949", 'i'), Some("33333000000004"));
    assert!(new[0].first("907").is_none());
    assert_eq!(tag_value(&new[0], "910", 'a'), Some("BL"));

    // Several branch matches resolve to the one with a call number
    assert_eq!(tag_value(&deduped[0], "907", 'a'), Some(".b100"));
    assert_eq!(tag_value(&deduped[1], "907", 'a'), Some(".b200"));
    assert_eq!(tag_value(&dup[0], "907", 'a'), Some(".b200"));
    assert_eq!(tag_value(&dup[0], "949", 'i'), Some("33333000000003"));

    // Template fund replaced the order field; leader marked Unicode
    let orders: Vec<&Field> = deduped[0].fields_with_tag("960").collect();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].get('u'), Some("10001adbk"));
    assert_eq!(orders[0].get('t'), Some("mya0n"));
    assert_eq!(deduped[0].leader.chars().nth(9), Some('a'));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written.summary).unwrap()).unwrap();
    assert_eq!(summary["total_records"], 4);
    assert_eq!(summary["new_records"], 1);
    assert_eq!(summary["dup_records"], 1);
    assert_eq!(summary["deduped_records"], 2);
    assert_eq!(summary["processing_integrity"], true);

    let rows = summary["records"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["target_id"], "100");
    assert_eq!(rows[0]["action"], "attach");
    assert_eq!(rows[0]["duplicate_ids"], serde_json::json!(["50", "100"]));
    assert_eq!(rows[0]["other_ids"], serde_json::json!(["10"]));
    assert_eq!(rows[3]["action"], "insert");
}

#[test]
fn test_duplicate_barcodes_abort_without_output() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_path = write_catalog(temp_dir.path());
    let input = write_input(
        temp_dir.path(),
        "orders.json",
        &[
            order_record("9780000000001", "00001"),
            order_record("9780000000002", "00001"),
        ],
    )
    .unwrap();

    let catalog = Arc::new(LocalCatalog::from_json_file(&catalog_path).unwrap());
    let output_dir = temp_dir.path().join("out");
    let result = run_pipeline(
        &input,
        &output_dir,
        BatchContext::new(Library::Nypl, Collection::Branch, RecordType::Acq),
        Some(firm_orders_template()),
        catalog,
    );

    match result {
        Err(Error::DuplicateBarcodes { barcodes }) => assert_eq!(barcodes, vec!["00001"]),
        other => panic!("expected duplicate barcodes error, got {:?}", other),
    }
    assert!(!output_dir.exists());
}

#[test]
fn test_cataloging_batch_uses_vendor_fallback() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_path = write_catalog(temp_dir.path());

    let mut record = MarcRecord::new("00000nam  2200000 a 4500");
    record
        .fields
        .push(Field::new("020", ' ', ' ').with_subfield('a', "9780000000003"));
    record
        .fields
        .push(Field::new("960", ' ', ' ').with_subfield('i', "34444000000001"));
    let input = write_input(temp_dir.path(), "cat.json", &[record]).unwrap();

    let catalog = Arc::new(LocalCatalog::from_json_file(&catalog_path).unwrap());
    let written = run_pipeline(
        &input,
        temp_dir.path(),
        BatchContext::new(Library::Bpl, Collection::Unassigned, RecordType::Cat),
        None,
        catalog,
    )
    .unwrap();

    let deduped = JsonRecordCodec::new()
        .read_file(written.deduped.as_ref().unwrap())
        .unwrap();
    assert_eq!(deduped.len(), 1);
    assert_eq!(tag_value(&deduped[0], "907", 'a'), Some(".b300"));
    assert!(deduped[0].first("910").is_none());
    assert!(written.new.is_none());

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written.summary).unwrap()).unwrap();
    assert_eq!(summary["vendor_breakdown"]["UNKNOWN"]["attach"], 1);
}

#[test]
fn test_order_batch_requires_template() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_path = write_catalog(temp_dir.path());
    let input = write_input(
        temp_dir.path(),
        "orders.json",
        &[order_record("9780000000001", "33333000000001")],
    )
    .unwrap();

    let catalog = Arc::new(LocalCatalog::from_json_file(&catalog_path).unwrap());
    let result = run_pipeline(
        &input,
        temp_dir.path(),
        BatchContext::new(Library::Nypl, Collection::Branch, RecordType::Sel),
        None,
        catalog,
    );

    assert!(matches!(result, Err(Error::MissingTemplate { .. })));
}

#[test]
fn test_template_store_feeds_processor() {
    let temp_dir = TempDir::new().unwrap();
    let store = TemplateStore::new(temp_dir.path().join("templates"));
    store.save(&firm_orders_template()).unwrap();

    let template = store.get("Firm Orders").unwrap();
    assert_eq!(template, firm_orders_template());

    let catalog_path = write_catalog(temp_dir.path());
    let input = write_input(
        temp_dir.path(),
        "single.json",
        &[order_record("9780000000002", "33333000000010")],
    )
    .unwrap();

    let catalog = Arc::new(LocalCatalog::from_json_file(&catalog_path).unwrap());
    let written = run_pipeline(
        &input,
        &temp_dir.path().join("out"),
        BatchContext::new(Library::Nypl, Collection::Branch, RecordType::Acq),
        Some(template),
        catalog,
    )
    .unwrap();

    assert!(written.summary.ends_with("single_summary.json"));
    assert!(written.deduped.unwrap().ends_with("single_DEDUPED.json"));
}
