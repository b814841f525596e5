//! Build context
//!
//! Every compilation gets its own context: an id for log correlation and a
//! private directory that holds the compiled document and any converted
//! outputs. The directory is removed when the context is dropped.

use crate::error::DocgenResult;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

/// Immutable state of one compilation
#[derive(Debug)]
pub struct BuildContext {
    id: Uuid,
    dir: TempDir,
    compiled_path: PathBuf,
}

impl BuildContext {
    /// Create a context for compiling `template`, with its directory under
    /// `temp_root` (the system temp dir when `None`)
    pub fn new(template: &Path, temp_root: Option<&Path>) -> DocgenResult<Self> {
        let id = Uuid::new_v4();
        let mut builder = tempfile::Builder::new();
        builder.prefix("docgen-");
        let dir = match temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        let stem = template
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let compiled_path = dir.path().join(format!("{}.odt", stem));

        Ok(Self { id, dir, compiled_path })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Private working directory
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Where the compiled document is written
    pub fn compiled_path(&self) -> &Path {
        &self.compiled_path
    }
}
