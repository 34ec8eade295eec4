//! Matchpoints: prioritized identifier keys used to query the catalog

use crate::constants::MAX_MATCHPOINTS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier type understood by the catalog lookup service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Matchpoint {
    BibId,
    Isbn,
    Issn,
    OclcNumber,
    Upc,
}

impl Matchpoint {
    /// Key as used by the catalog and in configuration files
    pub fn as_str(self) -> &'static str {
        match self {
            Matchpoint::BibId => "bib_id",
            Matchpoint::Isbn => "isbn",
            Matchpoint::Issn => "issn",
            Matchpoint::OclcNumber => "oclc_number",
            Matchpoint::Upc => "upc",
        }
    }

    pub fn all() -> [Matchpoint; 5] {
        [
            Matchpoint::BibId,
            Matchpoint::Isbn,
            Matchpoint::Issn,
            Matchpoint::OclcNumber,
            Matchpoint::Upc,
        ]
    }
}

impl FromStr for Matchpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "bib_id" => Ok(Matchpoint::BibId),
            "isbn" => Ok(Matchpoint::Isbn),
            "issn" => Ok(Matchpoint::Issn),
            "oclc_number" => Ok(Matchpoint::OclcNumber),
            "upc" => Ok(Matchpoint::Upc),
            other => Err(Error::unsupported_matchpoint(other)),
        }
    }
}

impl TryFrom<String> for Matchpoint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Matchpoint> for String {
    fn from(matchpoint: Matchpoint) -> Self {
        matchpoint.as_str().to_string()
    }
}

impl std::fmt::Display for Matchpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of up to three matchpoints
///
/// A tertiary matchpoint requires a secondary one. The invariant is enforced on
/// construction and on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MatchpointSlots")]
pub struct Matchpoints {
    #[serde(skip_serializing_if = "Option::is_none")]
    primary: Option<Matchpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secondary: Option<Matchpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tertiary: Option<Matchpoint>,
}

#[derive(Deserialize)]
struct MatchpointSlots {
    #[serde(default)]
    primary: Option<Matchpoint>,
    #[serde(default)]
    secondary: Option<Matchpoint>,
    #[serde(default)]
    tertiary: Option<Matchpoint>,
}

impl TryFrom<MatchpointSlots> for Matchpoints {
    type Error = Error;

    fn try_from(slots: MatchpointSlots) -> Result<Self> {
        Matchpoints::new(slots.primary, slots.secondary, slots.tertiary)
    }
}

impl Matchpoints {
    /// Create a validated matchpoint set
    pub fn new(
        primary: Option<Matchpoint>,
        secondary: Option<Matchpoint>,
        tertiary: Option<Matchpoint>,
    ) -> Result<Self> {
        if tertiary.is_some() && secondary.is_none() {
            return Err(Error::configuration(
                "Cannot have tertiary matchpoint without secondary matchpoint",
            ));
        }
        Ok(Self {
            primary,
            secondary,
            tertiary,
        })
    }

    /// Build from an ordered list of keys, highest priority first
    pub fn from_keys<S: AsRef<str>>(keys: &[S]) -> Result<Self> {
        if keys.len() > MAX_MATCHPOINTS {
            return Err(Error::configuration(format!(
                "At most {} matchpoints may be given, found {}",
                MAX_MATCHPOINTS,
                keys.len()
            )));
        }
        let parsed = keys
            .iter()
            .map(|key| key.as_ref().parse())
            .collect::<Result<Vec<Matchpoint>>>()?;
        let mut iter = parsed.into_iter();
        Self::new(iter.next(), iter.next(), iter.next())
    }

    pub fn primary(&self) -> Option<Matchpoint> {
        self.primary
    }

    pub fn secondary(&self) -> Option<Matchpoint> {
        self.secondary
    }

    pub fn tertiary(&self) -> Option<Matchpoint> {
        self.tertiary
    }

    /// Matchpoints in priority order, skipping unset slots
    pub fn keys(&self) -> Vec<Matchpoint> {
        [self.primary, self.secondary, self.tertiary]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

impl std::fmt::Display for Matchpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.keys().into_iter().map(Matchpoint::as_str).collect();
        write!(f, "[{}]", keys.join(", "))
    }
}
