//! bibrecon library
//!
//! A Rust library for reconciling batches of vendor bibliographic records
//! against a library catalog before they are loaded.
//!
//! This library provides tools for:
//! - Parsing raw records and mapping them onto typed bibliographic records
//! - Querying a catalog by prioritized matchpoints (ISBN, OCLC number, UPC, ...)
//! - Classifying catalog candidates and resolving a single target identifier
//! - Applying order templates and structural field updates to each record
//! - Partitioning a processed batch into new, duplicate and deduplicated groups
//! - Verifying that no item barcode is lost along the way

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod batch_writer;
        pub mod catalog;
        pub mod reconciler;
        pub mod record_codec;
        pub mod template_store;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{
    CandidateRecord, Collection, Library, Matchpoint, Matchpoints, Order, Record, RecordType,
    Template,
};
pub use config::Config;

/// Result type alias for bibrecon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for record reconciliation and batch processing
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed
    #[error("JSON error in '{file}': {message}")]
    Json {
        file: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// TOML configuration or template could not be parsed
    #[error("TOML error in '{file}': {message}")]
    Toml { file: String, message: String },

    /// Raw record data could not be mapped onto a record
    #[error("Record format error in '{file}': {message}")]
    RecordFormat { file: String, message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Matchpoint key is not one the catalog understands
    #[error("Unsupported matchpoint '{key}'. Available matchpoints are: {supported}")]
    UnsupportedMatchpoint { key: String, supported: String },

    /// Catalog back-end does not implement a supported matchpoint
    #[error("Matchpoint '{matchpoint}' is not supported by the {backend} catalog")]
    NotSupported { matchpoint: String, backend: String },

    /// Catalog query failed (network, authentication, back-end error)
    #[error("Catalog lookup on {matchpoint} = '{value}' failed: {message}")]
    LookupFailure {
        matchpoint: String,
        value: String,
        message: String,
    },

    /// Two or more incoming records share a barcode
    #[error("Duplicate barcodes found in file: {barcodes:?}")]
    DuplicateBarcodes { barcodes: Vec<String> },

    /// Cataloging record arrived without vendor matchpoints
    #[error("Vendor index required for cataloging workflow (record: {record})")]
    MissingVendorInfo { record: String },

    /// Order-level workflow started without a template
    #[error("Order template required for {record_type} workflow")]
    MissingTemplate { record_type: String },

    /// Named template does not exist in the store
    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Directory traversal error
    #[error("Directory traversal error: {message}")]
    DirectoryTraversal {
        message: String,
        #[source]
        source: walkdir::Error,
    },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a JSON error with file context
    pub fn json(
        file: impl Into<String>,
        message: impl Into<String>,
        source: serde_json::Error,
    ) -> Self {
        Self::Json {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a TOML error with file context
    pub fn toml(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Toml {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a record format error
    pub fn record_format(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordFormat {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unsupported matchpoint error
    pub fn unsupported_matchpoint(key: impl Into<String>) -> Self {
        Self::UnsupportedMatchpoint {
            key: key.into(),
            supported: crate::constants::SUPPORTED_MATCHPOINTS.join(", "),
        }
    }

    /// Create a not-supported error for a catalog back-end
    pub fn not_supported(matchpoint: impl Into<String>, backend: impl Into<String>) -> Self {
        Self::NotSupported {
            matchpoint: matchpoint.into(),
            backend: backend.into(),
        }
    }

    /// Create a lookup failure error
    pub fn lookup_failure(
        matchpoint: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::LookupFailure {
            matchpoint: matchpoint.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate barcodes error
    pub fn duplicate_barcodes(barcodes: Vec<String>) -> Self {
        Self::DuplicateBarcodes { barcodes }
    }

    /// Create a missing vendor info error
    pub fn missing_vendor_info(record: impl Into<String>) -> Self {
        Self::MissingVendorInfo {
            record: record.into(),
        }
    }

    /// Create a missing template error
    pub fn missing_template(record_type: impl Into<String>) -> Self {
        Self::MissingTemplate {
            record_type: record_type.into(),
        }
    }

    /// Create a template not found error
    pub fn template_not_found(name: impl Into<String>) -> Self {
        Self::TemplateNotFound { name: name.into() }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a directory traversal error
    pub fn directory_traversal(message: impl Into<String>, source: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: message.into(),
            source,
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Whether the error is a precondition violation that aborts a batch
    /// before any matching begins
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateBarcodes { .. }
                | Self::MissingVendorInfo { .. }
                | Self::MissingTemplate { .. }
        )
    }

    /// Whether the error should stop the whole run rather than a single batch
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::UnsupportedMatchpoint { .. }
                | Self::ProcessingInterrupted { .. }
        )
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json {
            file: "unknown".to_string(),
            message: "JSON processing failed".to_string(),
            source: error,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: "Directory traversal failed".to_string(),
            source: error,
        }
    }
}
