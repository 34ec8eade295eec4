//! Application constants for bibrecon
//!
//! This module contains MARC tag conventions, catalog markers, default values
//! and mappings used throughout the reconciliation pipeline.

// =============================================================================
// Matchpoints
// =============================================================================

/// Identifier keys the catalog lookup service understands
pub const SUPPORTED_MATCHPOINTS: &[&str] = &["bib_id", "isbn", "issn", "oclc_number", "upc"];

/// Maximum number of matchpoints in a single identifier set
pub const MAX_MATCHPOINTS: usize = 3;

/// Matchpoint used when a vendor cannot be identified
pub const FALLBACK_MATCHPOINT: &str = "isbn";

/// Vendor name assigned when no vendor rule matches a record
pub const UNKNOWN_VENDOR: &str = "UNKNOWN";

// =============================================================================
// Catalog Identifiers
// =============================================================================

/// Characters stripped from both ends of a catalog identifier before numeric
/// comparison (Sierra-style `.b12345678` ids)
pub const TARGET_ID_PREFIX_CHARS: &[char] = &['.', 'b'];

/// Prefix written in front of a target identifier in the target-id field
pub const TARGET_ID_PREFIX: &str = ".b";

/// Collection marker for candidates whose holdings span branch and research
pub const MIXED_COLLECTION: &str = "MIXED";

// =============================================================================
// MARC Tags
// =============================================================================

/// Standard MARC tags read or written by the pipeline
pub mod tags {
    pub const CONTROL_NUMBER: &str = "001";
    pub const ISBN: &str = "020";
    pub const ISSN: &str = "022";
    pub const UPC: &str = "024";
    pub const SYSTEM_CONTROL_NUMBER: &str = "035";
    pub const TITLE: &str = "245";
    pub const RESEARCH_CALL_NUMBER: &str = "852";
    pub const TARGET_ID: &str = "907";
    pub const COLLECTION: &str = "910";
    pub const COMMAND: &str = "949";
    pub const ORDER: &str = "960";
    pub const ORDER_VARIABLE: &str = "961";
    pub const NYPL_ITEM: &str = "949";
    pub const BPL_ITEM: &str = "960";
    pub const NYPL_BRANCH_CALL_NUMBER: &str = "091";
    pub const BPL_CALL_NUMBER: &str = "099";
}

/// Highest tag number treated as a control field (no indicators or subfields)
pub const LAST_CONTROL_TAG: &str = "009";

/// Prefix used by OCLC numbers in 035 fields
pub const OCLC_PREFIX: &str = "(OCoLC)";

/// Regex extracting the numeric part of an OCLC control number
pub const OCLC_NUMBER_PATTERN: &str = r"^(?:\(OCoLC\))?(?:ocm|ocn|on)?0*(\d+)";

/// Leader position marking a record as Unicode encoded
pub const LEADER_ENCODING_POSITION: usize = 9;

/// Value written at the leader encoding position
pub const LEADER_UNICODE_MARKER: char = 'a';

/// Prefix of a Sierra command tag stored in 949 $a
pub const COMMAND_TAG_PREFIX: char = '*';

/// Command tag key for a default location
pub const DEFAULT_LOCATION_KEY: &str = "bn=";

// =============================================================================
// Order Field Mapping
// =============================================================================

/// Default mapping of order sub-field codes onto order attributes, per tag
pub const DEFAULT_ORDER_MAPPING: &[(&str, &[(char, &str)])] = &[
    (
        tags::ORDER,
        &[
            ('c', "order_code_1"),
            ('d', "order_code_2"),
            ('e', "order_code_3"),
            ('f', "order_code_4"),
            ('g', "format"),
            ('i', "order_type"),
            ('m', "status"),
            ('o', "copies"),
            ('q', "create_date"),
            ('s', "price"),
            ('t', "locations"),
            ('u', "fund"),
            ('v', "vendor_code"),
            ('w', "lang"),
            ('x', "country"),
            ('z', "order_id"),
        ],
    ),
    (
        tags::ORDER_VARIABLE,
        &[
            ('d', "internal_note"),
            ('f', "selector_note"),
            ('h', "vendor_notes"),
            ('i', "vendor_title_no"),
            ('m', "blanket_po"),
        ],
    ),
];

// =============================================================================
// Batch Output
// =============================================================================

/// Partition names used in output file names and summaries
pub mod partitions {
    pub const NEW: &str = "NEW";
    pub const DUP: &str = "DUP";
    pub const DEDUPED: &str = "DEDUPED";
}

/// Suffix of the per-batch summary file
pub const SUMMARY_FILE_SUFFIX: &str = "summary";

/// Extension for record and summary files
pub const OUTPUT_EXTENSION: &str = "json";

/// Extension for stored templates
pub const TEMPLATE_EXTENSION: &str = "toml";

// =============================================================================
// Processing Configuration Defaults
// =============================================================================

/// Upper bound on concurrent batch workers
pub const MAX_PARALLEL_WORKERS: usize = 16;

/// Application directory name under the platform config/data directories
pub const APP_DIR_NAME: &str = "bibrecon";

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default templates directory name
pub const TEMPLATES_DIR_NAME: &str = "templates";
