//! Candidate classification and target identifier resolution
//!
//! Candidates are sorted by numeric identifier and bucketed relative to the
//! incoming record's collection:
//!
//! - `mixed`: the candidate's holdings span collections
//! - `matched`: same collection as the record
//! - `other`: any other collection
//!
//! Only `matched` candidates can supply a target. With one matched candidate it
//! is the target; with several, the first in identifier order that carries a
//! call number for the record's collection wins, and all of them are reported
//! as duplicates.
//!
//! The resolved candidate's call number is compared with the record's own; a
//! record without a target, or a side without a call number, counts as a match.

use crate::app::models::{CandidateRecord, Collection, Record};
use serde::Serialize;
use tracing::debug;

/// Classification of one record's candidates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewedResult {
    pub matched: Vec<CandidateRecord>,
    pub mixed: Vec<CandidateRecord>,
    pub other: Vec<CandidateRecord>,
    /// Resolved catalog identifier, if any
    pub target_id: Option<String>,
    /// Identifiers of all matched candidates when more than one matched
    pub duplicate_ids: Vec<String>,
    /// The record's own call number
    pub input_call_no: Option<String>,
    /// The resolved candidate's call number for the record's collection
    pub target_call_no: Option<String>,
    /// Whether the input and target call numbers agree
    pub call_number_match: bool,
    /// First identifier the record carries
    pub resource_id: Option<String>,
}

fn ids(candidates: &[CandidateRecord]) -> Vec<String> {
    candidates
        .iter()
        .map(|candidate| candidate.target_id().to_string())
        .collect()
}

impl ReviewedResult {
    pub fn matched_ids(&self) -> Vec<String> {
        ids(&self.matched)
    }

    pub fn mixed_ids(&self) -> Vec<String> {
        ids(&self.mixed)
    }

    pub fn other_ids(&self) -> Vec<String> {
        ids(&self.other)
    }

    pub fn has_duplicates(&self) -> bool {
        !self.duplicate_ids.is_empty()
    }
}

/// Buckets candidates and resolves a single target identifier
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateClassifier;

impl CandidateClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify candidates for a record
    ///
    /// No match is a normal outcome (`target_id == None`); this never fails.
    pub fn classify(&self, record: &Record, mut candidates: Vec<CandidateRecord>) -> ReviewedResult {
        // Unparsable identifiers sort last, keeping their relative order
        candidates.sort_by_key(|candidate| candidate.numeric_id().unwrap_or(u64::MAX));

        let mut result = ReviewedResult {
            input_call_no: record.input_call_number().map(str::to_string),
            resource_id: record.resource_id().map(str::to_string),
            ..ReviewedResult::default()
        };

        for candidate in candidates {
            if candidate.collection() == Collection::Mixed {
                result.mixed.push(candidate);
            } else if candidate.collection() == record.collection {
                result.matched.push(candidate);
            } else {
                result.other.push(candidate);
            }
        }

        if result.matched.len() > 1 {
            result.duplicate_ids = result.matched_ids();
        }

        let target = match result.matched.as_slice() {
            [] => None,
            [only] => Some(only),
            several => several
                .iter()
                .find(|candidate| candidate.has_call_number(record.collection)),
        };
        result.target_id = target.map(|candidate| candidate.target_id().to_string());
        result.target_call_no = target
            .and_then(|candidate| candidate.call_number(record.collection))
            .map(str::to_string);
        result.call_number_match = match (&result.input_call_no, &result.target_call_no) {
            (Some(input), Some(target)) => input.trim() == target.trim(),
            _ => true,
        };

        debug!(
            "Classified {}: {} matched, {} mixed, {} other, target {:?}",
            result.resource_id.as_deref().unwrap_or("record"),
            result.matched.len(),
            result.mixed.len(),
            result.other.len(),
            result.target_id
        );

        result
    }
}
