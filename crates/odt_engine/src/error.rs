//! Error types for template operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while opening, editing or saving a template
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No writable temporary location for the working copy
    #[error("Could not create temporary working file: {0}")]
    CreateTempFile(#[source] std::io::Error),

    /// The template could not be copied into the working file
    #[error("Could not copy template {from} to {to}: {source}")]
    CopyTemplate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// Missing required member in the package
    #[error("Missing required member: {0}")]
    MissingMember(String),

    /// Block body would leave unbalanced tags when repeated
    #[error("Block '{0}' does not enclose balanced markup")]
    UnbalancedBlock(String),
}

impl From<quick_xml::Error> for TemplateError {
    fn from(err: quick_xml::Error) -> Self {
        TemplateError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for TemplateError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        TemplateError::Xml(format!("Attribute error: {}", err))
    }
}

impl From<std::string::FromUtf8Error> for TemplateError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        TemplateError::Xml(format!("Member is not valid UTF-8: {}", err))
    }
}

impl TemplateError {
    /// Create a missing member error
    pub fn missing_member(name: impl Into<String>) -> Self {
        Self::MissingMember(name.into())
    }
}

/// Result type for template operations
pub type TemplateResult<T> = std::result::Result<T, TemplateError>;
