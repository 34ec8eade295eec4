//! Candidate records returned by a catalog lookup

use super::record::Collection;
use crate::constants::TARGET_ID_PREFIX_CHARS;
use serde::{Deserialize, Serialize};

/// A catalog record returned as a possible match for an incoming record
///
/// Candidates are read-only once returned by the lookup service. Keys the model
/// does not know about are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(alias = "bib_id")]
    target_id: String,

    #[serde(default)]
    collection: Collection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch_call_number: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    research_call_number: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    isbn: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    issn: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    oclc_number: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    upc: Vec<String>,
}

impl CandidateRecord {
    /// Create a candidate with only an identifier; use the `with_*` methods for the rest
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            collection: Collection::Unassigned,
            branch_call_number: None,
            research_call_number: Vec::new(),
            title: None,
            isbn: Vec::new(),
            issn: Vec::new(),
            oclc_number: Vec::new(),
            upc: Vec::new(),
        }
    }

    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.collection = collection;
        self
    }

    pub fn with_branch_call_number(mut self, call_number: impl Into<String>) -> Self {
        self.branch_call_number = Some(call_number.into());
        self
    }

    pub fn with_research_call_number(mut self, call_number: impl Into<String>) -> Self {
        self.research_call_number.push(call_number.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn.push(isbn.into());
        self
    }

    pub fn with_issn(mut self, issn: impl Into<String>) -> Self {
        self.issn.push(issn.into());
        self
    }

    pub fn with_oclc_number(mut self, oclc_number: impl Into<String>) -> Self {
        self.oclc_number.push(oclc_number.into());
        self
    }

    pub fn with_upc(mut self, upc: impl Into<String>) -> Self {
        self.upc.push(upc.into());
        self
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn branch_call_number(&self) -> Option<&str> {
        self.branch_call_number.as_deref()
    }

    pub fn research_call_number(&self) -> &[String] {
        &self.research_call_number
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn isbn(&self) -> &[String] {
        &self.isbn
    }

    pub fn issn(&self) -> &[String] {
        &self.issn
    }

    pub fn oclc_number(&self) -> &[String] {
        &self.oclc_number
    }

    pub fn upc(&self) -> &[String] {
        &self.upc
    }

    /// Identifier with its prefix characters stripped, parsed as a number
    pub fn numeric_id(&self) -> Option<u64> {
        self.target_id
            .trim()
            .trim_matches(TARGET_ID_PREFIX_CHARS)
            .parse()
            .ok()
    }

    /// The candidate's call number for the given collection.
    ///
    /// Research records are judged by their research call numbers, branch and
    /// unassigned records by the branch call number, mixed records by either.
    pub fn call_number(&self, collection: Collection) -> Option<&str> {
        let branch = self
            .branch_call_number
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let research = self
            .research_call_number
            .iter()
            .map(|value| value.trim())
            .find(|value| !value.is_empty());

        match collection {
            Collection::Research => research,
            Collection::Branch | Collection::Unassigned => branch,
            Collection::Mixed => branch.or(research),
        }
    }

    /// Whether the candidate carries a call number for the given collection
    pub fn has_call_number(&self, collection: Collection) -> bool {
        self.call_number(collection).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_strips_prefix() {
        assert_eq!(CandidateRecord::new(".b12345678").numeric_id(), Some(12345678));
        assert_eq!(CandidateRecord::new("b100").numeric_id(), Some(100));
        assert_eq!(CandidateRecord::new("50").numeric_id(), Some(50));
        assert_eq!(CandidateRecord::new("abc").numeric_id(), None);
    }

    #[test]
    fn test_deserialize_ignores_unknown_keys() {
        let candidate: CandidateRecord = serde_json::from_str(
            r#"{"target_id": "100", "collection": "BL", "cat_source": "inhouse", "varFields": []}"#,
        )
        .unwrap();

        assert_eq!(candidate.target_id(), "100");
        assert_eq!(candidate.collection(), Collection::Branch);
        assert!(candidate.branch_call_number().is_none());
    }

    #[test]
    fn test_deserialize_accepts_bib_id_alias() {
        let candidate: CandidateRecord =
            serde_json::from_str(r#"{"bib_id": "b200", "collection": "MIXED"}"#).unwrap();

        assert_eq!(candidate.target_id(), "b200");
        assert_eq!(candidate.collection(), Collection::Mixed);
    }

    #[test]
    fn test_has_call_number_by_collection() {
        let branch = CandidateRecord::new("1").with_branch_call_number("FIC SMITH");
        let research = CandidateRecord::new("2").with_research_call_number("ReCAP 23-1");
        let blank = CandidateRecord::new("3").with_branch_call_number("  ");

        assert!(branch.has_call_number(Collection::Branch));
        assert!(!branch.has_call_number(Collection::Research));
        assert!(research.has_call_number(Collection::Research));
        assert!(!research.has_call_number(Collection::Unassigned));
        assert!(research.has_call_number(Collection::Mixed));
        assert!(!blank.has_call_number(Collection::Branch));

        assert_eq!(branch.call_number(Collection::Mixed), Some("FIC SMITH"));
        assert_eq!(research.call_number(Collection::Research), Some("ReCAP 23-1"));
        assert_eq!(blank.call_number(Collection::Branch), None);
    }
}
