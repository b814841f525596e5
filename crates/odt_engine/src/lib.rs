//! ODT Template Engine
//!
//! This crate fills OpenDocument Text templates. A template is an ordinary
//! `.odt` package whose text contains placeholders:
//!
//! - `${key}` - replaced with a value
//! - `${name}` ... `${/name}` - a block, repeated once per replacement set or removed
//! - a frame named `${key}` - receives an embedded image
//!
//! ## ODT Structure
//!
//! An ODT file is a ZIP archive containing:
//! - `content.xml` - Document content
//! - `styles.xml` - Style definitions (headers and footers live here)
//! - `Pictures/` - Embedded images
//! - `META-INF/manifest.xml` - Package manifest
//!
//! Members are edited as text. Placeholders are cleaned of editor-inserted
//! markup when the package is opened, and every structural edit is a splice
//! over byte ranges found by the markup tokenizer, so markup the template
//! does not touch is written back unchanged.
//!
//! # Example
//!
//! ```ignore
//! use odt_engine::{Image, PackagedDocument};
//!
//! let mut doc = PackagedDocument::open("invoice.odt")?;
//! doc.set_value("customer", "Alice");
//! doc.clone_block("items", 2, &[row_a, row_b])?;
//! doc.insert_image("logo", &Image::new("logo.png").keep_ratio(true))?;
//! doc.save_as("out.odt")?;
//! ```

mod archive;
mod block;
mod error;
mod frame;
mod image;
mod manifest;
mod markup;
mod orphans;
mod sanitize;
mod substitute;

pub use archive::{PackagedDocument, CONTENT_MEMBER, MANIFEST_MEMBER, STYLES_MEMBER};
pub use block::{clone_block_in, Replacements};
pub use error::{TemplateError, TemplateResult};
pub use frame::{inline_fragment, place_inline, rewrite_frames, FrameRewrite};
pub use image::{Image, ImageFormat, ALLOWED_IMAGE_FORMATS};
pub use manifest::{Manifest, ManifestEntry};
pub use orphans::find_orphans;
pub use sanitize::sanitize;
pub use substitute::{escape_value, replace_key, MarkerSyntax, LINE_BREAK};

/// Archive directory holding embedded images
pub const PICTURES_DIR: &str = "Pictures/";

/// Qualified element names the engine looks for
pub mod elements {
    // Paragraph-level text elements
    pub const P: &str = "text:p";
    pub const H: &str = "text:h";

    // Drawing elements
    pub const FRAME: &str = "draw:frame";
    pub const IMAGE: &str = "draw:image";

    // Manifest elements
    pub const MANIFEST: &str = "manifest:manifest";
    pub const FILE_ENTRY: &str = "manifest:file-entry";
}

/// Qualified attribute names the engine reads or writes
pub mod attributes {
    pub const DRAW_NAME: &str = "draw:name";
    pub const SVG_WIDTH: &str = "svg:width";
    pub const SVG_HEIGHT: &str = "svg:height";
    pub const HREF: &str = "xlink:href";
    pub const FULL_PATH: &str = "manifest:full-path";
    pub const MEDIA_TYPE: &str = "manifest:media-type";
}
