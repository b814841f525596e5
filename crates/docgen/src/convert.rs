//! Format conversion through an office suite
//!
//! Conversion runs the configured executable once, headless:
//!
//! ```text
//! lowriter -env:UserInstallation=<uri> --convert-to <format> --outdir <dir> <input>
//! ```
//!
//! Success is judged by the exit status, then by the presence of
//! `<dir>/<input stem>.<format>`. There is no retry.

use crate::error::{DocgenError, DocgenResult};
use crate::settings::ConverterSettings;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs the external converter
#[derive(Debug, Clone)]
pub struct Converter {
    settings: ConverterSettings,
}

impl Converter {
    pub fn new(settings: ConverterSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ConverterSettings {
        &self.settings
    }

    /// Path the converter writes for `input`
    pub fn output_path(input: &Path, format: &str, outdir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        outdir.join(format!("{}.{}", stem, format))
    }

    fn command(&self, input: &Path, format: &str, outdir: &Path) -> Command {
        let mut cmd = Command::new(&self.settings.program);
        cmd.arg(format!("-env:UserInstallation={}", self.settings.user_installation))
            .arg("--convert-to")
            .arg(format)
            .arg("--outdir")
            .arg(outdir)
            .arg(input);
        cmd
    }

    /// Convert `input` to `format`, writing into `outdir`
    pub fn convert(&self, input: &Path, format: &str, outdir: &Path) -> DocgenResult<PathBuf> {
        tracing::info!("Converting {} to {} with {}", input.display(), format, self.settings.program);

        let output = self.command(input, format, outdir).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!("Converter exited with {:?}: {}", output.status.code(), stderr);
            return Err(DocgenError::ConversionFailed {
                status: output.status.code(),
                stderr,
            });
        }

        let converted = Self::output_path(input, format, outdir);
        if !converted.exists() {
            return Err(DocgenError::MissingConvertedOutput(converted));
        }
        Ok(converted)
    }
}
