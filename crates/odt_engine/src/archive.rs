//! Packaged document - the archive-backed template being filled
//!
//! Opening a template copies it into a private working file; the caller's
//! file is never written. `content.xml` and `styles.xml` are loaded into text
//! buffers and cleaned of editor-split placeholders, then every operation
//! edits those buffers. `save_as` consumes the document: it drops orphaned
//! pictures, writes the buffers and new pictures into a fresh archive and
//! copies it to the destination.

use crate::block::{clone_block_in, Replacements};
use crate::error::{TemplateError, TemplateResult};
use crate::frame::{place_inline, rewrite_frames};
use crate::image::Image;
use crate::manifest::Manifest;
use crate::orphans::find_orphans;
use crate::sanitize::sanitize;
use crate::substitute::{replace_key, MarkerSyntax};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Document content member
pub const CONTENT_MEMBER: &str = "content.xml";
/// Style definitions member (headers, footers, master pages)
pub const STYLES_MEMBER: &str = "styles.xml";
/// Package manifest member
pub const MANIFEST_MEMBER: &str = "META-INF/manifest.xml";

/// An open template and its pending edits
#[derive(Debug)]
pub struct PackagedDocument {
    template: PathBuf,
    working: NamedTempFile,
    content: String,
    styles: Option<String>,
    manifest: Option<Manifest>,
    /// Other members replaced by the caller
    replaced: BTreeMap<String, String>,
    deleted: BTreeSet<String>,
    images: Vec<Image>,
    syntax: MarkerSyntax,
}

impl PackagedDocument {
    /// Open a template, placing the working copy in the system temp directory
    pub fn open(template: impl AsRef<Path>) -> TemplateResult<Self> {
        Self::open_in(std::env::temp_dir(), template)
    }

    /// Open a template, placing the working copy in `dir`
    pub fn open_in(dir: impl AsRef<Path>, template: impl AsRef<Path>) -> TemplateResult<Self> {
        let template = template.as_ref().to_path_buf();

        let working = tempfile::Builder::new()
            .prefix("odt-template-")
            .suffix(".odt")
            .tempfile_in(dir)
            .map_err(TemplateError::CreateTempFile)?;

        fs::copy(&template, working.path()).map_err(|source| TemplateError::CopyTemplate {
            from: template.clone(),
            to: working.path().to_path_buf(),
            source,
        })?;

        let mut archive = ZipArchive::new(File::open(working.path())?)?;

        let content = read_member(&mut archive, CONTENT_MEMBER)?
            .ok_or_else(|| TemplateError::missing_member(CONTENT_MEMBER))?;
        let styles = read_member(&mut archive, STYLES_MEMBER)?;
        let manifest = read_member(&mut archive, MANIFEST_MEMBER)?
            .map(Manifest::parse)
            .transpose()?;

        tracing::debug!(
            "Opened template {} ({} entries, manifest: {})",
            template.display(),
            archive.len(),
            manifest.is_some()
        );

        Ok(Self {
            template,
            working,
            content: sanitize(&content),
            styles: styles.map(|styles| sanitize(&styles)),
            manifest,
            replaced: BTreeMap::new(),
            deleted: BTreeSet::new(),
            images: Vec::new(),
            syntax: MarkerSyntax::default(),
        })
    }

    /// Use a different placeholder and block marker syntax
    pub fn with_syntax(mut self, syntax: MarkerSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn syntax(&self) -> MarkerSyntax {
        self.syntax
    }

    /// Path of the template this document was opened from
    pub fn template_path(&self) -> &Path {
        &self.template
    }

    /// Current text of `content.xml`
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Current text of `styles.xml`, empty when the package has none
    pub fn styles(&self) -> &str {
        self.styles.as_deref().unwrap_or_default()
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    /// Images that will be written on save
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// Read a member as text, including pending edits
    pub fn read_member(&self, name: &str) -> TemplateResult<String> {
        if self.deleted.contains(name) {
            return Err(TemplateError::missing_member(name));
        }
        match name {
            CONTENT_MEMBER => Ok(self.content.clone()),
            STYLES_MEMBER => self
                .styles
                .clone()
                .ok_or_else(|| TemplateError::missing_member(name)),
            MANIFEST_MEMBER => self
                .manifest
                .as_ref()
                .map(|manifest| manifest.as_str().to_string())
                .ok_or_else(|| TemplateError::missing_member(name)),
            _ => match self.replaced.get(name) {
                Some(text) => Ok(text.clone()),
                None => {
                    let mut archive = ZipArchive::new(File::open(self.working.path())?)?;
                    read_member(&mut archive, name)?.ok_or_else(|| TemplateError::missing_member(name))
                }
            },
        }
    }

    /// Replace the text of a member
    pub fn replace_member(&mut self, name: &str, text: impl Into<String>) -> TemplateResult<()> {
        let text = text.into();
        self.deleted.remove(name);
        match name {
            CONTENT_MEMBER => self.content = text,
            STYLES_MEMBER => self.styles = Some(text),
            MANIFEST_MEMBER => self.manifest = Some(Manifest::parse(text)?),
            _ => {
                self.replaced.insert(name.to_string(), text);
            }
        }
        Ok(())
    }

    /// Drop a member from the saved archive
    pub fn delete_member(&mut self, name: &str) {
        self.replaced.remove(name);
        self.deleted.insert(name.to_string());
    }

    fn buffers_mut(&mut self) -> impl Iterator<Item = &mut String> {
        std::iter::once(&mut self.content).chain(self.styles.as_mut())
    }

    /// Replace `${key}` with `value` in content and styles
    pub fn set_value(&mut self, key: &str, value: &str) {
        let syntax = self.syntax;
        for buffer in self.buffers_mut() {
            *buffer = replace_key(buffer, key, value, syntax);
        }
    }

    /// Repeat block `name` `times` times, substituting copy `i` with
    /// `replacements[i]`. Returns how many members held the block.
    pub fn clone_block(&mut self, name: &str, times: usize, replacements: &[Replacements]) -> TemplateResult<usize> {
        let syntax = self.syntax;
        let mut found = 0;
        for buffer in self.buffers_mut() {
            if let Some(text) = clone_block_in(buffer, name, times, replacements, syntax)? {
                *buffer = text;
                found += 1;
            }
        }
        if found == 0 {
            tracing::debug!("Block '{}' not found in template", name);
        }
        Ok(found)
    }

    /// Remove block `name` and its markers
    pub fn delete_block(&mut self, name: &str) -> TemplateResult<usize> {
        self.clone_block(name, 0, &[])
    }

    /// Fill the frames named `${key}` with `image`.
    ///
    /// A missing file or a type other than PNG/JPEG is not an error: the
    /// placeholder is left as it is and `false` is returned.
    pub fn insert_image(&mut self, key: &str, image: &Image) -> TemplateResult<bool> {
        if !image.is_valid() {
            tracing::debug!("Skipping image {} for '{}': missing or unsupported", image.path.display(), key);
            return Ok(false);
        }

        let ratio = if image.keep_ratio {
            image.pixel_size().map(|(width, height)| width as f64 / height as f64)
        } else {
            None
        };

        let mut claimed = 0;
        for buffer in self.buffers_mut() {
            let rewrite = rewrite_frames(buffer, key, image, ratio)?;
            if rewrite.claimed > 0 {
                *buffer = rewrite.text;
                claimed += rewrite.claimed;
            }
        }

        if claimed == 0 {
            tracing::debug!("No frame named '${{{}}}' for image {}", key, image.path.display());
            return Ok(false);
        }

        self.images.push(image.clone());
        Ok(true)
    }

    /// Replace the text placeholder `${key}` with a complete frame for
    /// `image`, sized from the image's explicit position and size.
    pub fn insert_image_inline(&mut self, key: &str, image: &Image) -> TemplateResult<bool> {
        if !image.is_valid() {
            tracing::debug!("Skipping image {} for '{}': missing or unsupported", image.path.display(), key);
            return Ok(false);
        }

        let syntax = self.syntax;
        let mut claimed = 0;
        for buffer in self.buffers_mut() {
            let rewrite = place_inline(buffer, key, image, syntax)?;
            if rewrite.claimed > 0 {
                *buffer = rewrite.text;
                claimed += rewrite.claimed;
            }
        }

        if claimed == 0 {
            tracing::debug!("No text placeholder '${{{}}}' for image {}", key, image.path.display());
            return Ok(false);
        }

        self.images.push(image.clone());
        Ok(true)
    }

    /// Write the filled template to `destination`
    pub fn save_as(mut self, destination: impl AsRef<Path>) -> TemplateResult<()> {
        let destination = destination.as_ref();
        let mut archive = ZipArchive::new(File::open(self.working.path())?)?;

        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        let orphans = find_orphans(names.iter().map(String::as_str), &[self.content.as_str(), self.styles()]);
        for orphan in &orphans {
            tracing::debug!("Removing unreferenced picture {}", orphan);
            if let Some(manifest) = self.manifest.as_mut() {
                manifest.remove_entry(orphan)?;
            }
        }

        let mut new_images: Vec<&Image> = Vec::new();
        for image in &self.images {
            if !new_images.iter().any(|known| known.archive_name() == image.archive_name()) {
                new_images.push(image);
            }
        }
        if let Some(manifest) = self.manifest.as_mut() {
            for image in &new_images {
                let mime = image.mime().ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("Image no longer readable: {}", image.path.display()),
                    )
                })?;
                manifest.add_entry(&image.archive_path(), mime)?;
            }
        }

        let dir = self.working.path().parent().map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
        let staged = NamedTempFile::new_in(dir)?;
        let mut zip = ZipWriter::new(staged.reopen()?);
        let text_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let binary_options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let mut written = BTreeSet::new();
        for index in 0..archive.len() {
            let name = names[index].clone();
            if self.deleted.contains(&name) || orphans.contains(&name) {
                continue;
            }

            let replacement = match name.as_str() {
                CONTENT_MEMBER => Some(self.content.as_str()),
                STYLES_MEMBER => self.styles.as_deref(),
                MANIFEST_MEMBER => self.manifest.as_ref().map(Manifest::as_str),
                other => self.replaced.get(other).map(String::as_str),
            };

            match replacement {
                Some(text) => {
                    zip.start_file(name.as_str(), text_options)?;
                    zip.write_all(text.as_bytes())?;
                }
                None => zip.raw_copy_file(archive.by_index_raw(index)?)?,
            }
            written.insert(name);
        }

        for (name, text) in &self.replaced {
            if !written.contains(name) {
                zip.start_file(name.as_str(), text_options)?;
                zip.write_all(text.as_bytes())?;
            }
        }

        for image in &new_images {
            let data = fs::read(&image.path)?;
            zip.start_file(image.archive_path(), binary_options)?;
            zip.write_all(&data)?;
        }

        zip.finish()?;
        fs::copy(staged.path(), destination)?;

        tracing::info!(
            "Saved {} to {} ({} pictures added, {} removed)",
            self.template.display(),
            destination.display(),
            new_images.len(),
            orphans.len()
        );
        Ok(())
    }
}

/// Read a member as text; `None` when the archive has no such member
fn read_member<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> TemplateResult<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(TemplateError::from(e)),
    };

    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(Some(contents))
}
