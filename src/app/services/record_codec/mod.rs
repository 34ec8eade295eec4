//! Record codec and raw record mapping
//!
//! This module turns serialized record data into typed [`Record`]s and back:
//!
//! - [`RecordCodec`] parses bytes into structural [`RawRecord`]s and serializes them
//! - [`JsonRecordCodec`] is the codec used by the command-line tool
//! - [`RecordMapper`] reads identifiers, call numbers, barcodes, orders and the
//!   collection off a raw record following each library's tag conventions
//! - [`VendorIdentifier`] decides which vendor produced a cataloging record
//!
//! [`Record`]: crate::app::models::Record

pub mod json;
pub mod mapper;
pub mod vendor;

pub use json::JsonRecordCodec;
pub use mapper::RecordMapper;
pub use vendor::VendorIdentifier;

use crate::app::models::RawRecord;
use crate::{Error, Result};
use std::path::Path;

/// Parses and serializes a record format
///
/// Serializing the parsed output of an input reproduces every field losslessly.
pub trait RecordCodec: Send + Sync {
    /// Parse serialized data into raw records
    fn parse(&self, data: &[u8]) -> Result<Vec<RawRecord>>;

    /// Serialize raw records
    fn serialize(&self, records: &[RawRecord]) -> Result<Vec<u8>>;

    /// Read and parse a file, attaching the file name to format errors
    fn read_file(&self, path: &Path) -> Result<Vec<RawRecord>> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        let data = std::fs::read(path)
            .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;

        self.parse(&data).map_err(|error| match error {
            Error::Json {
                message, source, ..
            } => Error::json(path.display().to_string(), message, source),
            Error::RecordFormat { message, .. } => {
                Error::record_format(path.display().to_string(), message)
            }
            other => other,
        })
    }

    /// Serialize records and write them to a file
    fn write_file(&self, path: &Path, records: &[RawRecord]) -> Result<()> {
        let data = self.serialize(records)?;
        std::fs::write(path, data)
            .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))
    }
}
