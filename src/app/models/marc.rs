//! Structural MARC representation
//!
//! Records are kept as a leader plus an ordered list of variable fields. This is
//! the representation the codec reads and writes and the one field updates edit.

use crate::constants::LAST_CONTROL_TAG;
use serde::{Deserialize, Serialize};

/// A raw record as produced by a [`RecordCodec`](crate::app::services::record_codec::RecordCodec)
pub type RawRecord = MarcRecord;

/// A single coded value inside a data field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfield {
    pub code: char,
    pub value: String,
}

impl Subfield {
    pub fn new(code: char, value: impl Into<String>) -> Self {
        Self {
            code,
            value: value.into(),
        }
    }
}

fn blank_indicator() -> char {
    ' '
}

/// A MARC field: control fields carry `data`, data fields carry indicators and subfields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub tag: String,

    #[serde(default = "blank_indicator")]
    pub ind1: char,

    #[serde(default = "blank_indicator")]
    pub ind2: char,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subfields: Vec<Subfield>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Field {
    /// Create an empty data field
    pub fn new(tag: impl Into<String>, ind1: char, ind2: char) -> Self {
        Self {
            tag: tag.into(),
            ind1,
            ind2,
            subfields: Vec::new(),
            data: None,
        }
    }

    /// Create a control field holding `data`
    pub fn control(tag: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ind1: ' ',
            ind2: ' ',
            subfields: Vec::new(),
            data: Some(data.into()),
        }
    }

    /// Builder-style subfield append
    pub fn with_subfield(mut self, code: char, value: impl Into<String>) -> Self {
        self.add_subfield(code, value);
        self
    }

    pub fn add_subfield(&mut self, code: char, value: impl Into<String>) {
        self.subfields.push(Subfield::new(code, value));
    }

    /// Whether the tag falls in the control field range (`001`-`009`)
    pub fn is_control_field(&self) -> bool {
        self.tag.len() == 3
            && self.tag.chars().all(|c| c.is_ascii_digit())
            && self.tag.as_str() <= LAST_CONTROL_TAG
    }

    /// First value of the given subfield code
    pub fn get(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|subfield| subfield.code == code)
            .map(|subfield| subfield.value.as_str())
    }

    /// All values of the given subfield code, in field order
    pub fn get_all(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields
            .iter()
            .filter(move |subfield| subfield.code == code)
            .map(|subfield| subfield.value.as_str())
    }

    /// Whole field value: control data, or subfield values joined by spaces
    pub fn value(&self) -> String {
        match &self.data {
            Some(data) => data.clone(),
            None => self
                .subfields
                .iter()
                .map(|subfield| subfield.value.trim())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    fn tag_number(&self) -> Option<u32> {
        self.tag.parse().ok()
    }
}

/// A structural record: leader plus ordered fields
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarcRecord {
    #[serde(default)]
    pub leader: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl MarcRecord {
    pub fn new(leader: impl Into<String>) -> Self {
        Self {
            leader: leader.into(),
            fields: Vec::new(),
        }
    }

    /// Iterate all fields with the given tag
    pub fn fields_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |field| field.tag == tag)
    }

    /// First field with the given tag
    pub fn first(&self, tag: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.tag == tag)
    }

    /// Remove every field with the given tag, returning how many were removed
    pub fn remove_fields(&mut self, tag: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|field| field.tag != tag);
        before - self.fields.len()
    }

    /// Remove the first field equal to `target`
    pub fn remove_field(&mut self, target: &Field) -> bool {
        match self.fields.iter().position(|field| field == target) {
            Some(index) => {
                self.fields.remove(index);
                true
            }
            None => false,
        }
    }

    /// Insert a field before the first field with a numerically greater tag.
    ///
    /// Fields with non-numeric tags end the numeric run, so a new field lands in
    /// front of them. Fields with equal tags keep insertion order.
    pub fn add_ordered_field(&mut self, field: Field) {
        let Some(number) = field.tag_number() else {
            self.fields.push(field);
            return;
        };

        let position = self
            .fields
            .iter()
            .position(|existing| match existing.tag_number() {
                Some(existing_number) => existing_number > number,
                None => true,
            });

        match position {
            Some(index) => self.fields.insert(index, field),
            None => self.fields.push(field),
        }
    }

    /// Overwrite one character position in the leader, padding if needed
    pub fn set_leader_position(&mut self, position: usize, value: char) {
        let mut chars: Vec<char> = self.leader.chars().collect();
        if chars.len() <= position {
            chars.resize(position + 1, ' ');
        }
        chars[position] = value;
        self.leader = chars.into_iter().collect();
    }
}
