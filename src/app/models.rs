//! Data models for bibliographic record reconciliation
//!
//! This module contains the core data structures: records and their orders, the
//! structural MARC representation edited during processing, matchpoints, catalog
//! candidates, and order templates.

pub mod candidate;
pub mod marc;
pub mod matchpoints;
pub mod record;
pub mod template;

pub use candidate::CandidateRecord;
pub use marc::{Field, MarcRecord, RawRecord, Subfield};
pub use matchpoints::{Matchpoint, Matchpoints};
pub use record::{
    BatchContext, BibField, Collection, Library, Order, Record, RecordType, VendorInfo,
};
pub use template::{Template, TemplateValue};
