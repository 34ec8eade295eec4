//! In-memory catalog backed by a JSON snapshot
//!
//! The snapshot is either a JSON array of catalog records or an object with a
//! `records` array and an optional `unsupported` list of matchpoints the
//! back-end refuses to search on.

use super::CatalogLookup;
use crate::app::models::{CandidateRecord, Matchpoint};
use crate::constants::TARGET_ID_PREFIX_CHARS;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

const BACKEND_NAME: &str = "local";

#[derive(Deserialize)]
#[serde(untagged)]
enum Snapshot {
    Records(Vec<CandidateRecord>),
    Document {
        records: Vec<CandidateRecord>,
        #[serde(default)]
        unsupported: Vec<Matchpoint>,
    },
}

/// Catalog snapshot indexed by every supported matchpoint
#[derive(Debug, Clone, Default)]
pub struct LocalCatalog {
    /// Catalog records in snapshot order
    records: Vec<CandidateRecord>,

    /// (matchpoint, normalized value) to record positions
    index: HashMap<(Matchpoint, String), Vec<usize>>,

    /// Matchpoints this catalog refuses to search on
    unsupported: HashSet<Matchpoint>,
}

/// Normalize an identifier for index keys and queries
fn normalize(matchpoint: Matchpoint, value: &str) -> String {
    let value = value.trim();
    match matchpoint {
        Matchpoint::BibId => value.trim_matches(TARGET_ID_PREFIX_CHARS).to_string(),
        Matchpoint::Isbn | Matchpoint::Issn => value.replace('-', "").to_ascii_uppercase(),
        Matchpoint::OclcNumber => value.trim_start_matches('0').to_string(),
        Matchpoint::Upc => value.to_string(),
    }
}

impl LocalCatalog {
    /// Build a catalog from records
    pub fn new(records: Vec<CandidateRecord>) -> Self {
        let mut index: HashMap<(Matchpoint, String), Vec<usize>> = HashMap::new();

        for (position, record) in records.iter().enumerate() {
            let mut keys: Vec<(Matchpoint, &str)> = vec![(Matchpoint::BibId, record.target_id())];
            keys.extend(record.isbn().iter().map(|v| (Matchpoint::Isbn, v.as_str())));
            keys.extend(record.issn().iter().map(|v| (Matchpoint::Issn, v.as_str())));
            keys.extend(
                record
                    .oclc_number()
                    .iter()
                    .map(|v| (Matchpoint::OclcNumber, v.as_str())),
            );
            keys.extend(record.upc().iter().map(|v| (Matchpoint::Upc, v.as_str())));

            for (matchpoint, value) in keys {
                let key = normalize(matchpoint, value);
                if key.is_empty() {
                    continue;
                }
                let positions = index.entry((matchpoint, key)).or_default();
                if !positions.contains(&position) {
                    positions.push(position);
                }
            }
        }

        debug!(
            "Indexed {} catalog records under {} keys",
            records.len(),
            index.len()
        );

        Self {
            records,
            index,
            unsupported: HashSet::new(),
        }
    }

    /// Declare a matchpoint this catalog does not support
    pub fn with_unsupported(mut self, matchpoint: Matchpoint) -> Self {
        self.unsupported.insert(matchpoint);
        self
    }

    /// Parse a snapshot from JSON text
    pub fn from_json_str(content: &str, source: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(content)
            .map_err(|e| Error::json(source, "Invalid catalog snapshot", e))?;

        let catalog = match snapshot {
            Snapshot::Records(records) => Self::new(records),
            Snapshot::Document {
                records,
                unsupported,
            } => unsupported
                .into_iter()
                .fold(Self::new(records), Self::with_unsupported),
        };
        Ok(catalog)
    }

    /// Load a snapshot file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read catalog snapshot {}", path.display()), e)
        })?;
        let catalog = Self::from_json_str(&content, &path.display().to_string())?;

        info!(
            "Loaded catalog snapshot {} ({} records)",
            path.display(),
            catalog.len()
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn supports(&self, matchpoint: Matchpoint) -> bool {
        !self.unsupported.contains(&matchpoint)
    }
}

impl CatalogLookup for LocalCatalog {
    fn lookup(&self, value: &str, matchpoint: Matchpoint) -> Result<Vec<CandidateRecord>> {
        if !self.supports(matchpoint) {
            return Err(Error::not_supported(matchpoint.as_str(), BACKEND_NAME));
        }

        let key = normalize(matchpoint, value);
        let candidates: Vec<CandidateRecord> = self
            .index
            .get(&(matchpoint, key))
            .map(|positions| {
                positions
                    .iter()
                    .map(|&position| self.records[position].clone())
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            "Catalog lookup {}={} returned {} candidates",
            matchpoint,
            value,
            candidates.len()
        );
        Ok(candidates)
    }

    fn backend_name(&self) -> &str {
        BACKEND_NAME
    }
}
