//! Catalog lookup service
//!
//! The reconciler queries the catalog through the [`CatalogLookup`] trait. A
//! lookup takes an identifier value and its type and returns every catalog
//! record carrying that identifier. Implementations are shared across batches
//! processed in parallel, so they must be `Send + Sync` and must not hold
//! batch-specific state.
//!
//! [`LocalCatalog`] answers lookups from a JSON snapshot of catalog records held
//! in memory and is what the command-line tool uses.

pub mod local;

pub use local::LocalCatalog;

use crate::Result;
use crate::app::models::{CandidateRecord, Matchpoint};

/// Read-only query interface to a library catalog
pub trait CatalogLookup: Send + Sync {
    /// Find catalog records whose `matchpoint` identifier equals `value`
    ///
    /// # Errors
    ///
    /// * `Error::NotSupported` when the back-end does not implement the matchpoint
    /// * `Error::LookupFailure` when the back-end could not answer
    fn lookup(&self, value: &str, matchpoint: Matchpoint) -> Result<Vec<CandidateRecord>>;

    /// Lookup by matchpoint key; unknown keys fail with `Error::UnsupportedMatchpoint`
    fn lookup_by_key(&self, value: &str, key: &str) -> Result<Vec<CandidateRecord>> {
        let matchpoint: Matchpoint = key.parse()?;
        self.lookup(value, matchpoint)
    }

    /// Short back-end name used in logs and errors
    fn backend_name(&self) -> &str;
}
