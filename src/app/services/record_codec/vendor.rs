//! Vendor identification for cataloging records

use crate::app::models::{Library, Matchpoint, Matchpoints, RawRecord, VendorInfo};
use crate::config::{Config, VendorRule, VendorTag};
use crate::constants::UNKNOWN_VENDOR;
use crate::{Error, Result};
use tracing::debug;

/// Picks the vendor rule that matches a raw record
#[derive(Debug, Clone)]
pub struct VendorIdentifier {
    rules: Vec<VendorRule>,
    forced: Option<VendorRule>,
}

impl VendorIdentifier {
    /// Identifier using the rules configured for a library
    pub fn new(config: &Config, library: Library) -> Self {
        Self {
            rules: config.vendor_rules(library).cloned().collect(),
            forced: None,
        }
    }

    /// Skip identification and attribute every record to the named vendor
    pub fn with_forced_vendor(mut self, name: &str) -> Result<Self> {
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                Error::configuration(format!("No vendor rule named '{}' is configured", name))
            })?;
        self.forced = Some(rule);
        Ok(self)
    }

    /// Vendor information for a record, falling back to the unknown vendor
    pub fn identify(&self, record: &RawRecord) -> VendorInfo {
        if let Some(rule) = &self.forced {
            return vendor_info(rule);
        }

        for rule in &self.rules {
            if tags_match(record, &rule.tags) || tags_match(record, &rule.alternate_tags) {
                debug!("Identified vendor {}", rule.name);
                return vendor_info(rule);
            }
        }

        debug!("No vendor rule matched, using {}", UNKNOWN_VENDOR);
        unknown_vendor()
    }
}

/// The fallback vendor: searched by ISBN only, adds no fields
pub fn unknown_vendor() -> VendorInfo {
    VendorInfo {
        name: UNKNOWN_VENDOR.to_string(),
        matchpoints: Matchpoints::new(Some(Matchpoint::Isbn), None, None).unwrap_or_default(),
        bib_fields: Vec::new(),
    }
}

fn vendor_info(rule: &VendorRule) -> VendorInfo {
    VendorInfo {
        name: rule.name.clone(),
        matchpoints: rule.matchpoints.clone(),
        bib_fields: rule.bib_fields.clone(),
    }
}

/// Every tag must be present with the expected subfield value
fn tags_match(record: &RawRecord, tags: &[VendorTag]) -> bool {
    !tags.is_empty()
        && tags.iter().all(|expected| {
            record
                .fields_with_tag(&expected.tag)
                .any(|field| field.get_all(expected.code).any(|value| value == expected.value))
        })
}
