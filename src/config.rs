//! Configuration management and validation.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file, then
//! command-line overrides. It covers processing parameters, per-library MARC
//! conventions, the order field mapping and vendor identification rules.

use crate::app::models::{BibField, Field, Library, Matchpoints};
use crate::constants::{
    self, APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_ORDER_MAPPING, MAX_PARALLEL_WORKERS,
    TEMPLATES_DIR_NAME, tags,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Report format for command output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output with colors and formatting
    #[default]
    Human,
    /// JSON output for machine processing
    Json,
}

/// What a batch does when a catalog lookup fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LookupFailurePolicy {
    /// Abort the batch; nothing is written for it
    #[default]
    Abort,
    /// Log the failure, count it and treat the record as unmatched
    Skip,
}

/// Processing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of batches processed concurrently
    pub workers: usize,

    /// Show progress bars during reconciliation
    pub show_progress: bool,

    /// Format of the final report
    pub output_format: OutputFormat,

    /// Handling of failed catalog lookups
    pub on_lookup_failure: LookupFailurePolicy,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().clamp(1, MAX_PARALLEL_WORKERS),
            show_progress: true,
            output_format: OutputFormat::Human,
            on_lookup_failure: LookupFailurePolicy::Abort,
        }
    }
}

/// MARC conventions for one library system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Tag holding the resolved catalog identifier
    pub target_id_tag: String,

    /// Tag of item fields carrying barcodes
    pub item_tag: String,

    /// Second indicator identifying item fields
    pub item_ind2: char,

    /// Tag of the branch call number field
    pub branch_call_number_tag: String,

    /// Default location code per collection, written into selection command tags
    #[serde(default)]
    pub default_locations: BTreeMap<String, String>,
}

impl LibraryConfig {
    /// New York Public Library conventions
    pub fn nypl() -> Self {
        let mut default_locations = BTreeMap::new();
        default_locations.insert("BL".to_string(), "zzzzz".to_string());
        default_locations.insert("RL".to_string(), "xxx".to_string());

        Self {
            target_id_tag: tags::TARGET_ID.to_string(),
            item_tag: tags::NYPL_ITEM.to_string(),
            item_ind2: '1',
            branch_call_number_tag: tags::NYPL_BRANCH_CALL_NUMBER.to_string(),
            default_locations,
        }
    }

    /// Brooklyn Public Library conventions
    pub fn bpl() -> Self {
        Self {
            target_id_tag: tags::TARGET_ID.to_string(),
            item_tag: tags::BPL_ITEM.to_string(),
            item_ind2: ' ',
            branch_call_number_tag: tags::BPL_CALL_NUMBER.to_string(),
            default_locations: BTreeMap::new(),
        }
    }

    /// Whether a field is an item field: item tag and second indicator, with a `$i` barcode.
    ///
    /// BPL shares tag `960` between orders and items, so the barcode subfield
    /// is what tells them apart.
    pub fn is_item_field(&self, field: &Field) -> bool {
        field.tag == self.item_tag && field.ind2 == self.item_ind2 && field.get('i').is_some()
    }

    /// Default location for a collection, if one is configured
    pub fn default_location(&self, collection: &str) -> Option<&str> {
        self.default_locations
            .get(collection)
            .map(String::as_str)
            .filter(|location| !location.is_empty())
    }
}

/// Per-library conventions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrariesConfig {
    #[serde(default = "LibraryConfig::nypl")]
    pub nypl: LibraryConfig,
    #[serde(default = "LibraryConfig::bpl")]
    pub bpl: LibraryConfig,
}

impl Default for LibrariesConfig {
    fn default() -> Self {
        Self {
            nypl: LibraryConfig::nypl(),
            bpl: LibraryConfig::bpl(),
        }
    }
}

/// A tag, subfield and value that must be present for a vendor rule to match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorTag {
    pub tag: String,
    pub code: char,
    pub value: String,
}

/// Vendor identification rule for cataloging records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRule {
    pub name: String,

    /// Library the rule applies to; applies to both when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<Library>,

    pub matchpoints: Matchpoints,

    /// Identifying tags; all must match
    #[serde(default)]
    pub tags: Vec<VendorTag>,

    /// Alternate identifying tags, tried when `tags` do not match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_tags: Vec<VendorTag>,

    /// Fields added to every record from this vendor
    #[serde(default)]
    pub bib_fields: Vec<BibField>,
}

/// Global configuration for bibrecon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub processing: ProcessingConfig,

    pub libraries: LibrariesConfig,

    /// Order field tag to (subfield code to order attribute)
    pub order_mapping: BTreeMap<String, BTreeMap<String, String>>,

    pub vendors: Vec<VendorRule>,
}

impl Default for Config {
    fn default() -> Self {
        let order_mapping = DEFAULT_ORDER_MAPPING
            .iter()
            .map(|(tag, codes)| {
                let codes = codes
                    .iter()
                    .map(|(code, attribute)| (code.to_string(), attribute.to_string()))
                    .collect();
                (tag.to_string(), codes)
            })
            .collect();

        Self {
            processing: ProcessingConfig::default(),
            libraries: LibrariesConfig::default(),
            order_mapping,
            vendors: Vec::new(),
        }
    }
}

impl Config {
    /// Default config file location (`<config_dir>/bibrecon/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::configuration("Could not determine config directory"))
    }

    /// Default template directory (`<data_dir>/bibrecon/templates`)
    pub fn default_templates_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(TEMPLATES_DIR_NAME))
            .ok_or_else(|| Error::configuration("Could not determine data directory"))
    }

    /// Parse configuration from TOML text, filling unset sections with defaults
    pub fn from_toml_str(content: &str, source: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::toml(source, e.to_string()))
    }

    /// Load defaults, then overlay the config file if one is given
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let config = match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::file_not_found(path.display().to_string()));
                }
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::io(format!("Failed to read config file {}", path.display()), e)
                })?;
                let config = Self::from_toml_str(&content, &path.display().to_string())?;
                debug!("Loaded configuration from {}", path.display());
                config
            }
            None => {
                debug!("Using default configuration");
                Self::default()
            }
        };

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.processing.workers == 0 || self.processing.workers > MAX_PARALLEL_WORKERS {
            return Err(Error::configuration(format!(
                "Worker count must be between 1 and {}, got {}",
                MAX_PARALLEL_WORKERS, self.processing.workers
            )));
        }

        for (library, settings) in [
            (Library::Nypl, &self.libraries.nypl),
            (Library::Bpl, &self.libraries.bpl),
        ] {
            for tag in [
                &settings.target_id_tag,
                &settings.item_tag,
                &settings.branch_call_number_tag,
            ] {
                validate_tag(tag).map_err(|message| {
                    Error::configuration(format!("libraries.{}: {}", library, message))
                })?;
            }
        }

        for (tag, codes) in &self.order_mapping {
            validate_tag(tag)
                .map_err(|message| Error::configuration(format!("order_mapping: {}", message)))?;
            for code in codes.keys() {
                if code.chars().count() != 1 {
                    return Err(Error::configuration(format!(
                        "order_mapping.{}: subfield code '{}' must be a single character",
                        tag, code
                    )));
                }
            }
        }

        for rule in &self.vendors {
            if rule.name.trim().is_empty() {
                return Err(Error::configuration("Vendor rule name cannot be empty"));
            }
            if rule.name == constants::UNKNOWN_VENDOR {
                return Err(Error::configuration(format!(
                    "Vendor name '{}' is reserved",
                    constants::UNKNOWN_VENDOR
                )));
            }
            if rule.matchpoints.is_empty() {
                return Err(Error::configuration(format!(
                    "Vendor rule '{}' needs at least one matchpoint",
                    rule.name
                )));
            }
            if rule.tags.is_empty() && rule.alternate_tags.is_empty() {
                return Err(Error::configuration(format!(
                    "Vendor rule '{}' needs identifying tags",
                    rule.name
                )));
            }
        }

        Ok(())
    }

    /// MARC conventions for a library
    pub fn library(&self, library: Library) -> &LibraryConfig {
        match library {
            Library::Nypl => &self.libraries.nypl,
            Library::Bpl => &self.libraries.bpl,
        }
    }

    /// Order mapping as typed (tag, [(code, attribute)]) pairs
    pub fn order_mapping_entries(&self) -> Vec<(String, Vec<(char, String)>)> {
        self.order_mapping
            .iter()
            .map(|(tag, codes)| {
                let codes = codes
                    .iter()
                    .filter_map(|(code, attribute)| {
                        code.chars().next().map(|c| (c, attribute.clone()))
                    })
                    .collect();
                (tag.clone(), codes)
            })
            .collect()
    }

    /// Vendor rules that apply to a library, in configuration order
    pub fn vendor_rules(&self, library: Library) -> impl Iterator<Item = &VendorRule> {
        self.vendors
            .iter()
            .filter(move |rule| rule.library.is_none_or(|only| only == library))
    }

    /// Create configuration with a lookup failure policy
    pub fn with_lookup_failure_policy(mut self, policy: LookupFailurePolicy) -> Self {
        self.processing.on_lookup_failure = policy;
        self
    }

    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.processing.workers = workers;
        self
    }

    /// Enable or disable progress bars
    pub fn with_show_progress(mut self, show_progress: bool) -> Self {
        self.processing.show_progress = show_progress;
        self
    }

    /// Set report format
    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.processing.output_format = output_format;
        self
    }

    /// Add a vendor identification rule
    pub fn with_vendor(mut self, rule: VendorRule) -> Self {
        self.vendors.push(rule);
        self
    }

    /// Replace the conventions for one library
    pub fn with_library(mut self, library: Library, settings: LibraryConfig) -> Self {
        match library {
            Library::Nypl => self.libraries.nypl = settings,
            Library::Bpl => self.libraries.bpl = settings,
        }
        self
    }
}

fn validate_tag(tag: &str) -> std::result::Result<(), String> {
    if tag.len() == 3 && tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid three character tag", tag))
    }
}
