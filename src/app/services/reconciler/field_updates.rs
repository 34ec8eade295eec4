//! Structural field edits and the rules that produce them
//!
//! [`FieldUpdatePipeline`] applies an ordered list of [`FieldUpdate`]s to a
//! [`MarcRecord`]. Each update runs to completion before the next one starts:
//!
//! 1. `delete` removes every existing field with the update's tag
//! 2. `original` removes one specific pre-existing field
//! 3. the new field is inserted in tag order, unless the update has no subfields
//!
//! The target identifier field is always replaced, never appended next to a
//! stale copy, whatever the update's `delete` flag says. A record without a
//! target gets a removal-only update so an incoming identifier cannot survive.
//!
//! [`FieldRules`] builds the update list for a processed record from its
//! workflow: vendor fields for cataloging records, regenerated order fields for
//! acquisitions and selection, a command tag for selection, then the target id
//! and (NYPL only) the collection field.

use crate::app::models::{
    BatchContext, Collection, Field, Library, MarcRecord, Record, RecordType, Subfield, Template,
};
use crate::config::{Config, LibraryConfig};
use crate::constants::{
    COMMAND_TAG_PREFIX, DEFAULT_LOCATION_KEY, LEADER_ENCODING_POSITION, LEADER_UNICODE_MARKER,
    TARGET_ID_PREFIX, TARGET_ID_PREFIX_CHARS, tags,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A single structural edit: replace, delete or insert one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub tag: String,
    #[serde(default = "blank")]
    pub ind1: char,
    #[serde(default = "blank")]
    pub ind2: char,
    pub subfields: Vec<Subfield>,
    /// Remove every existing field with this tag first
    #[serde(default)]
    pub delete: bool,
    /// Remove this specific pre-existing field first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<Field>,
}

fn blank() -> char {
    ' '
}

impl FieldUpdate {
    pub fn new(tag: impl Into<String>, ind1: char, ind2: char) -> Self {
        Self {
            tag: tag.into(),
            ind1,
            ind2,
            subfields: Vec::new(),
            delete: false,
            original: None,
        }
    }

    pub fn with_subfield(mut self, code: char, value: impl Into<String>) -> Self {
        self.subfields.push(Subfield::new(code, value));
        self
    }

    pub fn with_delete(mut self) -> Self {
        self.delete = true;
        self
    }

    pub fn with_original(mut self, original: Field) -> Self {
        self.original = Some(original);
        self
    }

    /// Update that deletes every field with `tag` and inserts nothing
    pub fn removal(tag: impl Into<String>) -> Self {
        Self::new(tag, ' ', ' ').with_delete()
    }

    /// Whether applying this update inserts a field
    pub fn inserts(&self) -> bool {
        !self.subfields.is_empty()
    }

    /// The field this update inserts
    pub fn to_field(&self) -> Field {
        let field = Field {
            tag: self.tag.clone(),
            ind1: self.ind1,
            ind2: self.ind2,
            subfields: self.subfields.clone(),
            data: None,
        };

        if field.is_control_field() {
            let data = field.value();
            Field::control(self.tag.clone(), data)
        } else {
            field
        }
    }
}

/// Applies field updates in list order
#[derive(Debug, Clone)]
pub struct FieldUpdatePipeline {
    target_id_tag: String,
}

impl FieldUpdatePipeline {
    /// Pipeline that always fully replaces fields with `target_id_tag`
    pub fn new(target_id_tag: impl Into<String>) -> Self {
        Self {
            target_id_tag: target_id_tag.into(),
        }
    }

    /// Apply updates to a record's fields
    ///
    /// # Returns
    ///
    /// Number of fields removed
    pub fn apply_updates(&self, marc: &mut MarcRecord, updates: &[FieldUpdate]) -> usize {
        let mut removed = 0;

        for update in updates {
            if update.delete || update.tag == self.target_id_tag {
                removed += marc.remove_fields(&update.tag);
            }
            if let Some(original) = &update.original {
                if marc.remove_field(original) {
                    removed += 1;
                } else {
                    debug!("Original {} field no longer present", original.tag);
                }
            }
            if update.inserts() {
                marc.add_ordered_field(update.to_field());
            }
        }

        removed
    }
}

/// Builds the field updates a processed record needs
#[derive(Debug, Clone)]
pub struct FieldRules {
    context: BatchContext,
    library: LibraryConfig,
    order_mapping: Vec<(String, Vec<(char, String)>)>,
}

impl FieldRules {
    pub fn new(config: &Config, context: BatchContext) -> Self {
        Self {
            context,
            library: config.library(context.library).clone(),
            order_mapping: config.order_mapping_entries(),
        }
    }

    /// Pipeline configured for this library's target identifier tag
    pub fn pipeline(&self) -> FieldUpdatePipeline {
        FieldUpdatePipeline::new(self.library.target_id_tag.clone())
    }

    /// Ordered updates for a record whose target id has been resolved
    pub fn updates_for(&self, record: &Record, template: Option<&Template>) -> Vec<FieldUpdate> {
        let mut updates = Vec::new();

        match self.context.record_type {
            RecordType::Cat => updates.extend(self.vendor_fields(record)),
            RecordType::Acq => updates.extend(self.order_fields(record)),
            RecordType::Sel => {
                updates.extend(self.order_fields(record));
                updates.extend(self.command_tag(record, template));
            }
        }

        updates.push(self.target_id_field(record));
        updates.extend(self.collection_field(record));
        updates
    }

    /// Mark the record's character encoding as Unicode
    pub fn update_leader(&self, marc: &mut MarcRecord) {
        marc.set_leader_position(LEADER_ENCODING_POSITION, LEADER_UNICODE_MARKER);
    }

    fn vendor_fields(&self, record: &Record) -> Vec<FieldUpdate> {
        let Some(vendor) = &record.vendor_info else {
            return Vec::new();
        };

        vendor
            .bib_fields
            .iter()
            .map(|field| {
                FieldUpdate::new(field.tag.clone(), field.ind1, field.ind2)
                    .with_subfield(field.code, field.value.clone())
            })
            .collect()
    }

    /// Regenerated order fields, each replacing the existing order field at the same position
    fn order_fields(&self, record: &Record) -> Vec<FieldUpdate> {
        let mut existing: HashMap<&str, Vec<&Field>> = HashMap::new();
        for (tag, _) in &self.order_mapping {
            let fields = record
                .marc
                .fields_with_tag(tag)
                .filter(|field| !self.library.is_item_field(field))
                .collect();
            existing.insert(tag.as_str(), fields);
        }

        let mut used: HashMap<&str, usize> = HashMap::new();
        let mut updates = Vec::new();

        for order in &record.orders {
            for (tag, codes) in &self.order_mapping {
                let subfields: Vec<Subfield> = codes
                    .iter()
                    .flat_map(|(code, attribute)| {
                        order
                            .values(attribute)
                            .into_iter()
                            .map(move |value| Subfield::new(*code, value))
                    })
                    .collect();
                if subfields.is_empty() {
                    continue;
                }

                let position = used.entry(tag.as_str()).or_insert(0);
                let original = existing
                    .get(tag.as_str())
                    .and_then(|fields| fields.get(*position))
                    .map(|field| (*field).clone());
                *position += 1;

                let (ind1, ind2) = original
                    .as_ref()
                    .map(|field| (field.ind1, field.ind2))
                    .unwrap_or((' ', ' '));
                let mut update = FieldUpdate::new(tag.clone(), ind1, ind2);
                update.subfields = subfields;
                update.original = original;
                updates.push(update);
            }
        }

        updates
    }

    /// Existing selection command field: `949` with blank indicators and `$a` starting `*`
    fn existing_command(record: &Record) -> Option<&Field> {
        record.marc.fields_with_tag(tags::COMMAND).find(|field| {
            field.ind1 == ' '
                && field.ind2 == ' '
                && field
                    .get('a')
                    .is_some_and(|value| value.starts_with(COMMAND_TAG_PREFIX))
        })
    }

    fn command_tag(&self, record: &Record, template: Option<&Template>) -> Option<FieldUpdate> {
        let format = template
            .and_then(|template| template.value("format"))
            .and_then(|value| value.as_scalar())
            .or_else(|| record.orders.iter().find_map(|order| order.format.clone()))
            .filter(|format| !format.trim().is_empty());
        let location = self.library.default_location(record.collection.as_str());

        let command = match Self::existing_command(record) {
            None => {
                let value = match (format, location) {
                    (None, None) => return None,
                    (Some(format), Some(location)) => {
                        format!("*b2={};{}{};", format, DEFAULT_LOCATION_KEY, location)
                    }
                    (Some(format), None) => format!("*b2={};", format),
                    (None, Some(location)) => format!("*{}{};", DEFAULT_LOCATION_KEY, location),
                };
                FieldUpdate::new(tags::COMMAND, ' ', ' ').with_subfield('a', value)
            }
            Some(field) => {
                let location = location?;
                let current = field.get('a').unwrap_or_default().trim();
                if current.contains(DEFAULT_LOCATION_KEY) {
                    return None;
                }
                let value = if current.ends_with(';') {
                    format!("{}{}{};", current, DEFAULT_LOCATION_KEY, location)
                } else {
                    format!("{};{}{};", current, DEFAULT_LOCATION_KEY, location)
                };
                FieldUpdate::new(tags::COMMAND, ' ', ' ')
                    .with_subfield('a', value)
                    .with_original(field.clone())
            }
        };

        Some(command)
    }

    /// The resolved target id, or removal of any incoming one
    fn target_id_field(&self, record: &Record) -> FieldUpdate {
        let bare = record
            .target_id
            .as_deref()
            .map(|target_id| target_id.trim().trim_matches(TARGET_ID_PREFIX_CHARS))
            .filter(|bare| !bare.is_empty());

        match bare {
            Some(bare) => FieldUpdate::new(self.library.target_id_tag.clone(), ' ', ' ')
                .with_subfield('a', format!("{}{}", TARGET_ID_PREFIX, bare))
                .with_delete(),
            None => FieldUpdate::removal(self.library.target_id_tag.clone()),
        }
    }

    fn collection_field(&self, record: &Record) -> Option<FieldUpdate> {
        if self.context.library != Library::Nypl {
            return None;
        }
        if !matches!(record.collection, Collection::Branch | Collection::Research) {
            return None;
        }

        Some(
            FieldUpdate::new(tags::COLLECTION, ' ', ' ')
                .with_subfield('a', record.collection.as_str())
                .with_delete(),
        )
    }
}
