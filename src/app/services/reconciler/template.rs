//! Template merging onto record orders

use crate::app::models::{Record, Template};
use tracing::debug;

/// Overwrites order attributes with a template's non-empty values
///
/// Templates only add or replace: a template key with an empty, zero or missing
/// value never clears an attribute. Keys that no order attribute answers to are
/// ignored, as are values whose shape does not fit the attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateApplier;

impl TemplateApplier {
    pub fn new() -> Self {
        Self
    }

    /// Apply a template to every order of a record
    ///
    /// # Returns
    ///
    /// Number of attribute assignments made across all orders
    pub fn apply(&self, record: &mut Record, template: &Template) -> usize {
        let mut applied = 0;

        for order in &mut record.orders {
            for (name, value) in template.truthy_fields() {
                if order.apply_value(name, value) {
                    applied += 1;
                } else {
                    debug!("Template '{}' key '{}' not applied", template.name, name);
                }
            }
        }

        applied
    }
}
