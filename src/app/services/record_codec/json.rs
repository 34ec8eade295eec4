//! JSON record codec
//!
//! Records are stored as a JSON array of `{ "leader": ..., "fields": [...] }`
//! objects. Control fields carry `data`; data fields carry `ind1`, `ind2` and
//! `subfields`.

use super::RecordCodec;
use crate::app::models::RawRecord;
use crate::{Error, Result};

/// Codec for JSON record files
#[derive(Debug, Clone, Copy)]
pub struct JsonRecordCodec {
    pretty: bool,
}

impl Default for JsonRecordCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRecordCodec {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Write compact JSON instead of pretty-printed
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl RecordCodec for JsonRecordCodec {
    fn parse(&self, data: &[u8]) -> Result<Vec<RawRecord>> {
        let records: Vec<RawRecord> = serde_json::from_slice(data)
            .map_err(|e| Error::json("input", "Invalid record data", e))?;

        for (index, record) in records.iter().enumerate() {
            if let Some(field) = record.fields.iter().find(|field| field.tag.len() != 3) {
                return Err(Error::record_format(
                    "input",
                    format!("Record {} has invalid tag '{}'", index + 1, field.tag),
                ));
            }
        }

        Ok(records)
    }

    fn serialize(&self, records: &[RawRecord]) -> Result<Vec<u8>> {
        let data = if self.pretty {
            serde_json::to_vec_pretty(records)
        } else {
            serde_json::to_vec(records)
        };
        data.map_err(|e| Error::json("output", "Failed to serialize records", e))
    }
}
