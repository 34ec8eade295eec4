//! Bibliographic records under reconciliation and their order sub-entities

use super::marc::MarcRecord;
use super::matchpoints::{Matchpoint, Matchpoints};
use super::template::TemplateValue;
use crate::constants::MIXED_COLLECTION;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// Library, Collection and Record Type
// =============================================================================

/// Library system that owns the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Library {
    Bpl,
    Nypl,
}

impl Library {
    pub fn as_str(self) -> &'static str {
        match self {
            Library::Bpl => "bpl",
            Library::Nypl => "nypl",
        }
    }
}

impl FromStr for Library {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bpl" => Ok(Library::Bpl),
            "nypl" => Ok(Library::Nypl),
            other => Err(Error::configuration(format!(
                "Invalid library '{}': must be 'bpl' or 'nypl'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog partition used to judge whether a candidate is a true duplicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Collection {
    /// Branch holdings
    #[serde(rename = "BL")]
    Branch,
    /// Research holdings
    #[serde(rename = "RL")]
    Research,
    /// Holdings spanning branch and research
    #[serde(rename = "MIXED")]
    Mixed,
    /// Library without collection partitions
    #[default]
    #[serde(rename = "NONE")]
    Unassigned,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Branch => "BL",
            Collection::Research => "RL",
            Collection::Mixed => MIXED_COLLECTION,
            Collection::Unassigned => "NONE",
        }
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BL" => Ok(Collection::Branch),
            "RL" => Ok(Collection::Research),
            "MIXED" => Ok(Collection::Mixed),
            "NONE" | "" => Ok(Collection::Unassigned),
            other => Err(Error::configuration(format!(
                "Invalid collection '{}': must be BL, RL, MIXED or NONE",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow a batch of records belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Acquisitions (order-level records)
    Acq,
    /// Full cataloging records from a vendor
    Cat,
    /// Selection (order-level records with a command tag)
    Sel,
}

impl RecordType {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Acq => "acq",
            RecordType::Cat => "cat",
            RecordType::Sel => "sel",
        }
    }

    /// Whether records of this type carry orders and need a template
    pub fn is_order_level(self) -> bool {
        matches!(self, RecordType::Acq | RecordType::Sel)
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "acq" => Ok(RecordType::Acq),
            "cat" => Ok(RecordType::Cat),
            "sel" => Ok(RecordType::Sel),
            other => Err(Error::configuration(format!(
                "Invalid record type '{}': must be 'acq', 'cat' or 'sel'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Library, collection and workflow shared by every record in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchContext {
    pub library: Library,
    pub collection: Collection,
    pub record_type: RecordType,
}

impl BatchContext {
    pub fn new(library: Library, collection: Collection, record_type: RecordType) -> Self {
        Self {
            library,
            collection,
            record_type,
        }
    }
}

impl std::fmt::Display for BatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.library, self.collection, self.record_type)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Acquisition and shelving data attached to a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub audience: Vec<String>,
    pub blanket_po: Option<String>,
    pub branches: Vec<String>,
    pub copies: Option<String>,
    pub country: Option<String>,
    pub create_date: Option<String>,
    pub format: Option<String>,
    pub fund: Option<String>,
    pub internal_note: Option<String>,
    pub lang: Option<String>,
    pub locations: Vec<String>,
    pub order_code_1: Option<String>,
    pub order_code_2: Option<String>,
    pub order_code_3: Option<String>,
    pub order_code_4: Option<String>,
    pub order_id: Option<String>,
    pub order_type: Option<String>,
    pub price: Option<String>,
    pub selector_note: Option<String>,
    pub shelves: Vec<String>,
    pub status: Option<String>,
    pub var_field_isbn: Option<String>,
    pub vendor_code: Option<String>,
    pub vendor_notes: Option<String>,
    pub vendor_title_no: Option<String>,
}

/// View of a single order attribute
enum AttributeSlot<S, L> {
    Scalar(S),
    List(L),
}

/// Attribute name to field dispatch for both the shared and mutable accessors
macro_rules! order_slot {
    ($order:expr, $name:expr, $($mutability:tt)*) => {{
        use AttributeSlot::{List, Scalar};

        match $name {
            "audience" => Some(List(& $($mutability)* $order.audience)),
            "blanket_po" => Some(Scalar(& $($mutability)* $order.blanket_po)),
            "branches" => Some(List(& $($mutability)* $order.branches)),
            "copies" => Some(Scalar(& $($mutability)* $order.copies)),
            "country" => Some(Scalar(& $($mutability)* $order.country)),
            "create_date" => Some(Scalar(& $($mutability)* $order.create_date)),
            "format" => Some(Scalar(& $($mutability)* $order.format)),
            "fund" => Some(Scalar(& $($mutability)* $order.fund)),
            "internal_note" => Some(Scalar(& $($mutability)* $order.internal_note)),
            "lang" => Some(Scalar(& $($mutability)* $order.lang)),
            "locations" => Some(List(& $($mutability)* $order.locations)),
            "order_code_1" => Some(Scalar(& $($mutability)* $order.order_code_1)),
            "order_code_2" => Some(Scalar(& $($mutability)* $order.order_code_2)),
            "order_code_3" => Some(Scalar(& $($mutability)* $order.order_code_3)),
            "order_code_4" => Some(Scalar(& $($mutability)* $order.order_code_4)),
            "order_id" => Some(Scalar(& $($mutability)* $order.order_id)),
            "order_type" => Some(Scalar(& $($mutability)* $order.order_type)),
            "price" => Some(Scalar(& $($mutability)* $order.price)),
            "selector_note" => Some(Scalar(& $($mutability)* $order.selector_note)),
            "shelves" => Some(List(& $($mutability)* $order.shelves)),
            "status" => Some(Scalar(& $($mutability)* $order.status)),
            "var_field_isbn" => Some(Scalar(& $($mutability)* $order.var_field_isbn)),
            "vendor_code" => Some(Scalar(& $($mutability)* $order.vendor_code)),
            "vendor_notes" => Some(Scalar(& $($mutability)* $order.vendor_notes)),
            "vendor_title_no" => Some(Scalar(& $($mutability)* $order.vendor_title_no)),
            _ => None,
        }
    }};
}

type SlotRef<'a> = AttributeSlot<&'a Option<String>, &'a Vec<String>>;
type SlotMut<'a> = AttributeSlot<&'a mut Option<String>, &'a mut Vec<String>>;

impl Order {
    fn slot(&self, name: &str) -> Option<SlotRef<'_>> {
        order_slot!(self, name,)
    }

    fn slot_mut(&mut self, name: &str) -> Option<SlotMut<'_>> {
        order_slot!(self, name, mut)
    }

    /// Overwrite an attribute from a template value.
    ///
    /// Returns `false` when the attribute is unknown or the value's shape does not
    /// fit it (a list for a single-valued attribute, an integer for a list).
    pub fn apply_value(&mut self, name: &str, value: &TemplateValue) -> bool {
        match self.slot_mut(name) {
            Some(AttributeSlot::Scalar(slot)) => match value.as_scalar() {
                Some(text) => {
                    *slot = Some(text);
                    true
                }
                None => false,
            },
            Some(AttributeSlot::List(slot)) => match value.as_list() {
                Some(values) => {
                    *slot = values;
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Set an attribute from raw field values; single-valued attributes take the first
    pub fn assign(&mut self, name: &str, mut values: Vec<String>) -> bool {
        values.retain(|value| !value.trim().is_empty());
        match self.slot_mut(name) {
            Some(AttributeSlot::Scalar(slot)) => {
                *slot = values.into_iter().next();
                true
            }
            Some(AttributeSlot::List(slot)) => {
                *slot = values;
                true
            }
            None => false,
        }
    }

    /// Current values of an attribute, empty when unset or unknown
    pub fn values(&self, name: &str) -> Vec<String> {
        match self.slot(name) {
            Some(AttributeSlot::Scalar(value)) => value.iter().cloned().collect(),
            Some(AttributeSlot::List(values)) => values.clone(),
            None => Vec::new(),
        }
    }
}

// =============================================================================
// Vendor Information
// =============================================================================

/// A single-subfield field a vendor rule adds to cataloging records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibField {
    pub tag: String,
    #[serde(default = "blank")]
    pub ind1: char,
    #[serde(default = "blank")]
    pub ind2: char,
    pub code: char,
    pub value: String,
}

fn blank() -> char {
    ' '
}

/// Vendor identified for a cataloging record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorInfo {
    pub name: String,
    pub matchpoints: Matchpoints,
    #[serde(default)]
    pub bib_fields: Vec<BibField>,
}

// =============================================================================
// Record
// =============================================================================

/// A bibliographic record being reconciled against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub library: Library,
    pub collection: Collection,
    pub record_type: RecordType,
    /// Resolved catalog identifier
    pub target_id: Option<String>,
    pub control_number: Option<String>,
    pub isbn: Option<String>,
    pub issn: Option<String>,
    pub oclc_number: Vec<String>,
    pub upc: Option<String>,
    pub title: Option<String>,
    pub branch_call_number: Option<String>,
    pub research_call_number: Vec<String>,
    /// Item barcodes, unique across a batch
    pub barcodes: Vec<String>,
    pub orders: Vec<Order>,
    pub vendor: Option<String>,
    pub vendor_info: Option<VendorInfo>,
    /// Structural representation edited by field updates
    pub marc: MarcRecord,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl Record {
    /// Create an empty record for the given context
    pub fn new(library: Library, collection: Collection, record_type: RecordType) -> Self {
        Self {
            library,
            collection,
            record_type,
            target_id: None,
            control_number: None,
            isbn: None,
            issn: None,
            oclc_number: Vec::new(),
            upc: None,
            title: None,
            branch_call_number: None,
            research_call_number: Vec::new(),
            barcodes: Vec::new(),
            orders: Vec::new(),
            vendor: None,
            vendor_info: None,
            marc: MarcRecord::default(),
        }
    }

    /// Value the record holds for a matchpoint, if non-empty
    pub fn matchpoint_value(&self, matchpoint: Matchpoint) -> Option<&str> {
        match matchpoint {
            Matchpoint::BibId => non_empty(self.target_id.as_ref()),
            Matchpoint::Isbn => non_empty(self.isbn.as_ref()),
            Matchpoint::Issn => non_empty(self.issn.as_ref()),
            Matchpoint::OclcNumber => non_empty(self.oclc_number.first()),
            Matchpoint::Upc => non_empty(self.upc.as_ref()),
        }
    }

    /// The record's own call number for its library and collection
    pub fn input_call_number(&self) -> Option<&str> {
        match (self.library, self.collection) {
            (Library::Bpl, _) => non_empty(self.branch_call_number.as_ref()),
            (Library::Nypl, Collection::Branch) => non_empty(self.branch_call_number.as_ref()),
            (Library::Nypl, Collection::Research) => non_empty(self.research_call_number.first()),
            (Library::Nypl, _) => None,
        }
    }

    /// First identifier the record carries, used to label it in reports
    pub fn resource_id(&self) -> Option<&str> {
        non_empty(self.target_id.as_ref())
            .or_else(|| non_empty(self.control_number.as_ref()))
            .or_else(|| non_empty(self.isbn.as_ref()))
            .or_else(|| non_empty(self.oclc_number.first()))
            .or_else(|| non_empty(self.upc.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nypl_record(collection: Collection) -> Record {
        Record::new(Library::Nypl, collection, RecordType::Acq)
    }

    #[test]
    fn test_collection_from_str_and_serde() {
        assert_eq!("bl".parse::<Collection>().unwrap(), Collection::Branch);
        assert_eq!("MIXED".parse::<Collection>().unwrap(), Collection::Mixed);
        assert_eq!("".parse::<Collection>().unwrap(), Collection::Unassigned);
        assert!("XX".parse::<Collection>().is_err());

        let json = serde_json::to_string(&Collection::Research).unwrap();
        assert_eq!(json, "\"RL\"");
    }

    #[test]
    fn test_library_and_record_type_parse() {
        assert_eq!("NYPL".parse::<Library>().unwrap(), Library::Nypl);
        assert!("qpl".parse::<Library>().is_err());
        assert_eq!("sel".parse::<RecordType>().unwrap(), RecordType::Sel);
        assert!(RecordType::Acq.is_order_level());
        assert!(!RecordType::Cat.is_order_level());
    }

    #[test]
    fn test_matchpoint_value_skips_empty() {
        let mut record = nypl_record(Collection::Branch);
        record.isbn = Some("  ".to_string());
        record.oclc_number = vec!["123".to_string(), "456".to_string()];

        assert_eq!(record.matchpoint_value(Matchpoint::Isbn), None);
        assert_eq!(record.matchpoint_value(Matchpoint::OclcNumber), Some("123"));
        assert_eq!(record.matchpoint_value(Matchpoint::Upc), None);
    }

    #[test]
    fn test_input_call_number_by_library_and_collection() {
        let mut research = nypl_record(Collection::Research);
        research.branch_call_number = Some("FIC SMITH".to_string());
        research.research_call_number = vec!["ReCAP 1".to_string()];
        assert_eq!(research.input_call_number(), Some("ReCAP 1"));

        let mut branch = research.clone();
        branch.collection = Collection::Branch;
        assert_eq!(branch.input_call_number(), Some("FIC SMITH"));

        let mut mixed = research.clone();
        mixed.collection = Collection::Mixed;
        assert_eq!(mixed.input_call_number(), None);

        let mut bpl = Record::new(Library::Bpl, Collection::Unassigned, RecordType::Cat);
        bpl.branch_call_number = Some("J FIC".to_string());
        assert_eq!(bpl.input_call_number(), Some("J FIC"));
    }

    #[test]
    fn test_resource_id_priority() {
        let mut record = nypl_record(Collection::Branch);
        record.upc = Some("0123".to_string());
        assert_eq!(record.resource_id(), Some("0123"));

        record.isbn = Some("9781234567890".to_string());
        assert_eq!(record.resource_id(), Some("9781234567890"));

        record.control_number = Some("ocn1".to_string());
        assert_eq!(record.resource_id(), Some("ocn1"));

        record.target_id = Some(".b123".to_string());
        assert_eq!(record.resource_id(), Some(".b123"));
    }

    #[test]
    fn test_order_apply_value_respects_shape() {
        let mut order = Order::default();

        assert!(order.apply_value("fund", &TemplateValue::from("adult")));
        assert!(order.apply_value("copies", &TemplateValue::from(3i64)));
        assert!(order.apply_value("locations", &TemplateValue::from("mya")));
        assert!(!order.apply_value("fund", &TemplateValue::List(vec!["x".to_string()])));
        assert!(!order.apply_value("locations", &TemplateValue::from(1i64)));
        assert!(!order.apply_value("not_an_attribute", &TemplateValue::from("x")));

        assert_eq!(order.fund.as_deref(), Some("adult"));
        assert_eq!(order.copies.as_deref(), Some("3"));
        assert_eq!(order.locations, vec!["mya".to_string()]);
    }

    #[test]
    fn test_order_assign_and_values() {
        let mut order = Order::default();
        assert!(order.assign("price", vec!["12.50".to_string(), "99".to_string()]));
        assert!(order.assign("locations", vec!["mya".to_string(), "".to_string(), "myb".to_string()]));

        assert_eq!(order.values("price"), vec!["12.50".to_string()]);
        assert_eq!(order.values("locations"), vec!["mya".to_string(), "myb".to_string()]);
        assert!(order.values("fund").is_empty());
        assert!(order.values("bogus").is_empty());
    }
}
