//! Order templates: named, reusable field overrides plus matchpoints

use super::matchpoints::Matchpoints;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single template value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateValue {
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl TemplateValue {
    /// Whether the value should overwrite an order attribute.
    ///
    /// Empty text, zero and empty lists never overwrite. Whitespace is text.
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Integer(value) => *value != 0,
            TemplateValue::Text(value) => !value.is_empty(),
            TemplateValue::List(values) => !values.is_empty(),
        }
    }

    /// Scalar rendering for single-valued attributes; lists have none
    pub fn as_scalar(&self) -> Option<String> {
        match self {
            TemplateValue::Integer(value) => Some(value.to_string()),
            TemplateValue::Text(value) => Some(value.clone()),
            TemplateValue::List(_) => None,
        }
    }

    /// List rendering for multi-valued attributes; integers have none
    pub fn as_list(&self) -> Option<Vec<String>> {
        match self {
            TemplateValue::Integer(_) => None,
            TemplateValue::Text(value) => Some(vec![value.clone()]),
            TemplateValue::List(values) => Some(values.clone()),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::Text(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::Text(value)
    }
}

impl From<i64> for TemplateValue {
    fn from(value: i64) -> Self {
        TemplateValue::Integer(value)
    }
}

impl From<Vec<String>> for TemplateValue {
    fn from(values: Vec<String>) -> Self {
        TemplateValue::List(values)
    }
}

/// A named set of order field overrides and the matchpoints to search with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    #[serde(default)]
    pub matchpoints: Matchpoints,

    /// Order attribute name to value
    #[serde(default)]
    pub fields: BTreeMap<String, TemplateValue>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            agent: None,
            matchpoints: Matchpoints::default(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_matchpoints(mut self, matchpoints: Matchpoints) -> Self {
        self.matchpoints = matchpoints;
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<TemplateValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Value of a field if present and truthy
    pub fn value(&self, name: &str) -> Option<&TemplateValue> {
        self.fields.get(name).filter(|value| value.is_truthy())
    }

    /// Fields that would overwrite order attributes
    pub fn truthy_fields(&self) -> impl Iterator<Item = (&str, &TemplateValue)> {
        self.fields
            .iter()
            .filter(|(_, value)| value.is_truthy())
            .map(|(name, value)| (name.as_str(), value))
    }
}
