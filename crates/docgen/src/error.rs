//! Error types for template compilation and conversion

use odt_engine::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while compiling or converting a template
#[derive(Debug, Error)]
pub enum DocgenError {
    /// Error from the template engine
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// IO error reading/writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing a values or settings file
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template file type that cannot be compiled
    #[error("Unsupported template format: {0}")]
    UnsupportedFormat(String),

    /// The converter ran and reported failure;
    /// `status` is `None` when the process was killed by a signal.
    #[error("Conversion failed (exit status {status:?}): {stderr}")]
    ConversionFailed { status: Option<i32>, stderr: String },

    /// The converter succeeded but the expected output is not there
    #[error("Converted file missing: {}", .0.display())]
    MissingConvertedOutput(PathBuf),

    /// A value binding that cannot be applied
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// Settings file exists but cannot be read
    #[error("Settings error: {0}")]
    Settings(String),
}

impl DocgenError {
    /// Create an invalid value error
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for compilation operations
pub type DocgenResult<T> = std::result::Result<T, DocgenError>;
