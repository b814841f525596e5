//! Engine settings
//!
//! Settings are read from a JSON file. A missing file gives the defaults; a
//! file that does not parse is logged and also gives the defaults.

use crate::error::{DocgenError, DocgenResult};
use odt_engine::MarkerSyntax;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for compiling and converting templates
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Placeholder and block marker syntax of the templates
    pub marker_syntax: MarkerSyntax,
    /// How image bindings are embedded
    pub image_mode: ImageMode,
    /// External converter invocation
    pub converter: ConverterSettings,
    /// Parent directory for build directories (system temp dir when unset)
    pub temp_root: Option<PathBuf>,
}

/// Image embedding strategy
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Fill frames named after the placeholder
    #[default]
    Frame,
    /// Replace the placeholder text with a new frame
    Inline,
}

/// Office suite used for format conversion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConverterSettings {
    /// Executable to run
    pub program: String,
    /// Profile directory URI passed as `-env:UserInstallation`
    pub user_installation: String,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            program: "lowriter".to_string(),
            user_installation: "file:///tmp/dummy".to_string(),
        }
    }
}

impl EngineSettings {
    /// Load settings from `path`, or return defaults if the file doesn't exist
    pub fn load(path: impl AsRef<Path>) -> DocgenResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DocgenError::Settings(format!("{}: {}", path.display(), e)))?;
        match serde_json::from_str::<EngineSettings>(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!("Failed to parse settings file, using defaults: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Save settings as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> DocgenResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
