//! Template compilation
//!
//! `Template` turns a template file and a set of values into a compiled
//! document inside a fresh build context, and converts compiled documents to
//! other formats.

use crate::context::BuildContext;
use crate::convert::Converter;
use crate::error::{DocgenError, DocgenResult};
use crate::settings::{EngineSettings, ImageMode};
use crate::values::{TemplateValue, Values};
use odt_engine::PackagedDocument;
use std::path::{Path, PathBuf};

/// File extensions accepted as templates
pub const TEMPLATE_EXTENSIONS: &[&str] = &["odt", "ott"];

/// Compiles templates with a fixed set of settings
#[derive(Debug, Clone)]
pub struct Template {
    settings: EngineSettings,
    converter: Converter,
}

/// A compiled document; its build directory lives as long as it does
#[derive(Debug)]
pub struct CompiledDocument {
    context: BuildContext,
}

impl Template {
    pub fn new(settings: EngineSettings) -> Self {
        let converter = Converter::new(settings.converter.clone());
        Self { settings, converter }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Fill `template` with `values`.
    ///
    /// Blocks are applied first so their copies see every scalar value, then
    /// images, then scalar values. Within a kind, keys are applied in order.
    pub fn compile(&self, template: impl AsRef<Path>, values: &Values) -> DocgenResult<CompiledDocument> {
        let template = template.as_ref();
        check_extension(template)?;

        let context = BuildContext::new(template, self.settings.temp_root.as_deref())?;
        tracing::info!("Compiling {} [{}]", template.display(), context.id());

        let mut doc = PackagedDocument::open_in(context.dir(), template)?.with_syntax(self.settings.marker_syntax);

        for (key, value) in values {
            if let TemplateValue::Block(sets) = value {
                let found = doc.clone_block(key, sets.len(), sets)?;
                tracing::debug!("Block '{}': {} copies in {} members", key, sets.len(), found);
            }
        }

        for (key, value) in values {
            if let TemplateValue::Image(image) = value {
                let embedded = match self.settings.image_mode {
                    ImageMode::Frame => doc.insert_image(key, image)?,
                    ImageMode::Inline => doc.insert_image_inline(key, image)?,
                };
                if !embedded {
                    tracing::debug!("Image '{}' was not embedded", key);
                }
            }
        }

        for (key, value) in values {
            if let Some(text) = value.as_text() {
                doc.set_value(key, text);
            }
        }

        doc.save_as(context.compiled_path())?;
        tracing::info!("Compiled {} [{}]", context.compiled_path().display(), context.id());
        Ok(CompiledDocument { context })
    }

    /// Convert a compiled document to `format` and copy the result to `destination`
    pub fn convert(
        &self,
        compiled: &CompiledDocument,
        format: &str,
        destination: impl AsRef<Path>,
    ) -> DocgenResult<PathBuf> {
        let destination = destination.as_ref();
        let converted = self.converter.convert(compiled.path(), format, compiled.context.dir())?;
        std::fs::copy(&converted, destination)?;
        Ok(destination.to_path_buf())
    }

    /// Convert a compiled document to PDF
    pub fn to_pdf(&self, compiled: &CompiledDocument, destination: impl AsRef<Path>) -> DocgenResult<PathBuf> {
        self.convert(compiled, "pdf", destination)
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl CompiledDocument {
    /// Path of the compiled document inside the build directory
    pub fn path(&self) -> &Path {
        self.context.compiled_path()
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Copy the compiled document to `destination`
    pub fn save_to(&self, destination: impl AsRef<Path>) -> DocgenResult<()> {
        std::fs::copy(self.path(), destination)?;
        Ok(())
    }

    /// Read the compiled document
    pub fn to_bytes(&self) -> DocgenResult<Vec<u8>> {
        Ok(std::fs::read(self.path())?)
    }
}

fn check_extension(template: &Path) -> DocgenResult<()> {
    let extension = template
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if TEMPLATE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(DocgenError::UnsupportedFormat(template.display().to_string()))
    }
}
