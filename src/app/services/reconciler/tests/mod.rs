//! Tests for the reconciler module
//!
//! Unit tests for each reconciliation component plus batch-level scenarios.

pub mod deduplication_tests;
pub mod stats_tests;
pub mod template_tests;

// Test helper functions and fixtures
use crate::app::models::{
    BatchContext, CandidateRecord, Collection, Field, Library, MarcRecord, Matchpoint,
    Matchpoints, Order, Record, RecordType, Template,
};
use crate::app::services::catalog::CatalogLookup;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Fake catalog that records every query it receives
#[derive(Default)]
pub struct CountingCatalog {
    responses: HashMap<(Matchpoint, String), Vec<CandidateRecord>>,
    failing: HashSet<Matchpoint>,
    calls: Mutex<Vec<(Matchpoint, String)>>,
}

impl CountingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(
        mut self,
        matchpoint: Matchpoint,
        value: &str,
        candidates: Vec<CandidateRecord>,
    ) -> Self {
        self.responses
            .insert((matchpoint, value.to_string()), candidates);
        self
    }

    /// Every lookup on `matchpoint` fails with a lookup failure
    pub fn failing_on(mut self, matchpoint: Matchpoint) -> Self {
        self.failing.insert(matchpoint);
        self
    }

    pub fn calls(&self) -> Vec<(Matchpoint, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl CatalogLookup for CountingCatalog {
    fn lookup(&self, value: &str, matchpoint: Matchpoint) -> Result<Vec<CandidateRecord>> {
        self.calls
            .lock()
            .unwrap()
            .push((matchpoint, value.to_string()));

        if self.failing.contains(&matchpoint) {
            return Err(Error::lookup_failure(
                matchpoint.as_str(),
                value,
                "connection refused",
            ));
        }

        Ok(self
            .responses
            .get(&(matchpoint, value.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn backend_name(&self) -> &str {
        "counting"
    }
}

pub fn nypl_branch_acq() -> BatchContext {
    BatchContext::new(Library::Nypl, Collection::Branch, RecordType::Acq)
}

/// Create a test record with an ISBN and barcodes
pub fn create_test_record(context: BatchContext, isbn: &str, barcodes: &[&str]) -> Record {
    let mut record = Record::new(context.library, context.collection, context.record_type);
    record.isbn = Some(isbn.to_string());
    record.barcodes = barcodes.iter().map(|b| b.to_string()).collect();
    record.marc = MarcRecord::new("00000nam  2200000 a 4500");
    record
        .marc
        .fields
        .push(Field::new("020", ' ', ' ').with_subfield('a', isbn));
    record
}

/// Create an order-level record carrying one order and its 960 field
pub fn create_order_record(context: BatchContext, isbn: &str, barcode: &str) -> Record {
    let mut record = create_test_record(context, isbn, &[barcode]);
    record.orders.push(Order {
        fund: Some("old-fund".to_string()),
        locations: vec!["mya0n".to_string()],
        ..Order::default()
    });
    record.marc.fields.push(
        Field::new("960", ' ', ' ')
            .with_subfield('t', "mya0n")
            .with_subfield('u', "old-fund"),
    );
    record
        .marc
        .fields
        .push(Field::new("949", ' ', '1').with_subfield('i', barcode));
    record
}

pub fn create_candidate(id: &str, collection: Collection) -> CandidateRecord {
    CandidateRecord::new(id).with_collection(collection)
}

pub fn create_test_template(keys: &[&str]) -> Template {
    Template::new("test template")
        .with_matchpoints(Matchpoints::from_keys(keys).unwrap())
        .with_field("fund", "10001adbk")
        .with_field("copies", 2i64)
        .with_field("vendor_notes", "")
}

pub fn ids(candidates: &[CandidateRecord]) -> Vec<&str> {
    candidates.iter().map(CandidateRecord::target_id).collect()
}
