//! Mapping raw records onto typed bibliographic records
//!
//! Tag conventions:
//!
//! | Attribute            | Source                                            |
//! |----------------------|---------------------------------------------------|
//! | control number       | `001`                                             |
//! | target id            | target-id tag `$a` (`907` by default)             |
//! | ISBN                 | `020 $a`, qualifiers stripped                     |
//! | ISSN                 | `022 $a`                                          |
//! | OCLC numbers         | `001` with `ocm`/`ocn`/`on` prefix, `035 $a (OCoLC)` |
//! | UPC                  | `024` first indicator `1`, `$a`                   |
//! | title                | `245 $a`                                          |
//! | branch call number   | `091` (NYPL) / `099` (BPL), whole field           |
//! | research call number | `852` first indicator `8`, `$h`                   |
//! | barcodes             | item tag with configured second indicator, `$i`   |
//! | collection           | `910 $a` (NYPL), otherwise the batch collection   |
//! | orders               | order tags through the order mapping              |

use super::vendor::VendorIdentifier;
use crate::app::models::{BatchContext, Collection, Field, Library, Order, RawRecord, Record};
use crate::config::{Config, LibraryConfig};
use crate::constants::{OCLC_NUMBER_PATTERN, OCLC_PREFIX, tags};
use crate::{Error, Result};
use regex::Regex;
use tracing::debug;

/// Builds [`Record`]s from raw records for one batch context
#[derive(Debug, Clone)]
pub struct RecordMapper {
    context: BatchContext,
    library: LibraryConfig,
    order_mapping: Vec<(String, Vec<(char, String)>)>,
    vendors: Option<VendorIdentifier>,
    oclc_pattern: Regex,
}

impl RecordMapper {
    /// Create a mapper; cataloging batches also identify each record's vendor
    pub fn new(config: &Config, context: BatchContext) -> Result<Self> {
        let oclc_pattern = Regex::new(OCLC_NUMBER_PATTERN)
            .map_err(|e| Error::configuration(format!("Invalid OCLC pattern: {}", e)))?;

        let vendors = (!context.record_type.is_order_level())
            .then(|| VendorIdentifier::new(config, context.library));

        Ok(Self {
            context,
            library: config.library(context.library).clone(),
            order_mapping: config.order_mapping_entries(),
            vendors,
            oclc_pattern,
        })
    }

    /// Attribute every cataloging record to the named vendor
    pub fn with_forced_vendor(mut self, name: &str) -> Result<Self> {
        if let Some(vendors) = self.vendors.take() {
            self.vendors = Some(vendors.with_forced_vendor(name)?);
        }
        Ok(self)
    }

    pub fn context(&self) -> BatchContext {
        self.context
    }

    /// Map a batch of raw records, preserving order
    pub fn map_all(&self, raw_records: Vec<RawRecord>) -> Vec<Record> {
        raw_records.into_iter().map(|raw| self.map(raw)).collect()
    }

    /// Map a single raw record
    pub fn map(&self, raw: RawRecord) -> Record {
        let mut record = Record::new(
            self.context.library,
            self.context.collection,
            self.context.record_type,
        );

        record.control_number = raw
            .first(tags::CONTROL_NUMBER)
            .and_then(|field| field.data.clone())
            .map(|data| data.trim().to_string())
            .filter(|data| !data.is_empty());
        record.target_id = first_subfield(&raw, &self.library.target_id_tag, 'a');
        record.isbn = first_subfield(&raw, tags::ISBN, 'a').and_then(|isbn| clean_isbn(&isbn));
        record.issn = first_subfield(&raw, tags::ISSN, 'a');
        record.oclc_number = self.oclc_numbers(&raw);
        record.upc = raw
            .fields_with_tag(tags::UPC)
            .filter(|field| field.ind1 == '1')
            .find_map(|field| field.get('a'))
            .map(|upc| upc.trim().to_string());
        record.title = first_subfield(&raw, tags::TITLE, 'a')
            .map(|title| title.trim_end_matches([' ', '/', ':', ';', ',']).to_string());
        record.branch_call_number = raw
            .first(&self.library.branch_call_number_tag)
            .map(Field::value)
            .filter(|value| !value.is_empty());
        record.research_call_number = raw
            .fields_with_tag(tags::RESEARCH_CALL_NUMBER)
            .filter(|field| field.ind1 == '8')
            .flat_map(|field| field.get_all('h'))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect();
        record.barcodes = raw
            .fields_with_tag(&self.library.item_tag)
            .filter(|field| self.library.is_item_field(field))
            .flat_map(|field| field.get_all('i'))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect();

        if self.context.library == Library::Nypl {
            if let Some(collection) = first_subfield(&raw, tags::COLLECTION, 'a')
                .and_then(|value| value.parse::<Collection>().ok())
                .filter(|collection| *collection != Collection::Unassigned)
            {
                record.collection = collection;
            }
        }

        if self.context.record_type.is_order_level() {
            record.orders = self.orders(&raw);
        }

        if let Some(vendors) = &self.vendors {
            let info = vendors.identify(&raw);
            record.vendor = Some(info.name.clone());
            record.vendor_info = Some(info);
        }

        debug!(
            "Mapped record {} ({} barcodes, {} orders)",
            record.resource_id().unwrap_or("without identifiers"),
            record.barcodes.len(),
            record.orders.len()
        );

        record.marc = raw;
        record
    }

    /// OCLC numbers from the control number and 035 fields, without duplicates
    fn oclc_numbers(&self, raw: &RawRecord) -> Vec<String> {
        let mut numbers: Vec<String> = Vec::new();

        let control = raw
            .first(tags::CONTROL_NUMBER)
            .and_then(|field| field.data.as_deref())
            .filter(|data| data.starts_with("ocm") || data.starts_with("ocn") || data.starts_with("on"));

        let system_numbers = raw
            .fields_with_tag(tags::SYSTEM_CONTROL_NUMBER)
            .flat_map(|field| field.get_all('a'))
            .filter(|value| value.trim().starts_with(OCLC_PREFIX));

        for value in control.into_iter().chain(system_numbers) {
            if let Some(number) = self
                .oclc_pattern
                .captures(value.trim())
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str().to_string())
            {
                if !numbers.contains(&number) {
                    numbers.push(number);
                }
            }
        }
        numbers
    }

    /// Orders from order fields: each primary order field starts a new order,
    /// other mapped tags extend the most recent one. Item fields are skipped.
    fn orders(&self, raw: &RawRecord) -> Vec<Order> {
        let Some((primary_tag, _)) = self.order_mapping.first() else {
            return Vec::new();
        };

        let mut orders: Vec<Order> = Vec::new();
        for field in raw.fields.iter().filter(|field| !self.library.is_item_field(field)) {
            let Some((tag, codes)) = self.order_mapping.iter().find(|(tag, _)| *tag == field.tag)
            else {
                continue;
            };
            if tag == primary_tag {
                orders.push(Order::default());
            }
            let Some(order) = orders.last_mut() else {
                continue;
            };
            for (code, attribute) in codes {
                let values: Vec<String> = field.get_all(*code).map(str::to_string).collect();
                if !values.is_empty() {
                    order.assign(attribute, values);
                }
            }
        }
        orders
    }
}

fn first_subfield(raw: &RawRecord, tag: &str, code: char) -> Option<String> {
    raw.fields_with_tag(tag)
        .find_map(|field| field.get(code))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// ISBN without qualifiers such as `(pbk.)` or hyphens
fn clean_isbn(value: &str) -> Option<String> {
    value
        .split_whitespace()
        .next()
        .map(|isbn| isbn.replace('-', ""))
        .filter(|isbn| !isbn.is_empty())
}
