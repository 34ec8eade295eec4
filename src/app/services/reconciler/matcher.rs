//! Catalog queries by prioritized matchpoints
//!
//! Matchpoints are tried in priority order. A matchpoint the record has no value
//! for is skipped without a query, and the first query that returns candidates
//! ends the search: lower-priority matchpoints are never tried after that.

use crate::Result;
use crate::app::models::{CandidateRecord, Matchpoint, Matchpoints, Record};
use crate::app::services::catalog::CatalogLookup;
use std::sync::Arc;
use tracing::debug;

/// Candidates found for a record and how they were found
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub candidates: Vec<CandidateRecord>,
    /// Matchpoint whose query returned the candidates
    pub matched_on: Option<Matchpoint>,
    /// Number of catalog queries issued
    pub queries: usize,
}

/// Queries the catalog for candidate matches
#[derive(Clone)]
pub struct MatchExecutor {
    catalog: Arc<dyn CatalogLookup>,
}

impl std::fmt::Debug for MatchExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchExecutor")
            .field("catalog", &self.catalog.backend_name())
            .finish()
    }
}

impl MatchExecutor {
    pub fn new(catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { catalog }
    }

    /// Candidates from the first matchpoint that yields any
    ///
    /// # Errors
    ///
    /// Lookup failures are propagated unchanged.
    pub fn find_candidates(
        &self,
        record: &Record,
        matchpoints: &Matchpoints,
    ) -> Result<Vec<CandidateRecord>> {
        Ok(self.search(record, matchpoints)?.candidates)
    }

    /// Same search as [`find_candidates`](Self::find_candidates), also reporting
    /// which matchpoint produced the candidates
    pub fn search(&self, record: &Record, matchpoints: &Matchpoints) -> Result<MatchOutcome> {
        let mut outcome = MatchOutcome::default();

        for matchpoint in matchpoints.keys() {
            let Some(value) = record.matchpoint_value(matchpoint) else {
                debug!("Skipping {}: record has no value", matchpoint);
                continue;
            };

            outcome.queries += 1;
            let candidates = self.catalog.lookup(value, matchpoint)?;
            if !candidates.is_empty() {
                debug!(
                    "{} candidates found on {}={}",
                    candidates.len(),
                    matchpoint,
                    value
                );
                outcome.candidates = candidates;
                outcome.matched_on = Some(matchpoint);
                return Ok(outcome);
            }
        }

        debug!(
            "No candidates found after {} queries for {}",
            outcome.queries,
            record.resource_id().unwrap_or("record without identifiers")
        );
        Ok(outcome)
    }
}
