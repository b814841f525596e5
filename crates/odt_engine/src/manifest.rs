//! Package manifest (`META-INF/manifest.xml`)
//!
//! The manifest lists every member of the package with its media type.
//! Entries are added and removed by splicing the manifest text, so the rest
//! of the document (namespace declarations, version, encryption data) is
//! preserved as written.

use crate::attributes::{FULL_PATH, MEDIA_TYPE};
use crate::elements::{FILE_ENTRY, MANIFEST};
use crate::error::{TemplateError, TemplateResult};
use crate::markup::{attribute, matching_close, splice, tag_attributes, tokenize, TokenKind};

/// A manifest file entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub full_path: String,
    pub media_type: String,
}

/// Editable package manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    xml: String,
}

impl Manifest {
    /// Parse manifest XML, checking that it has a `manifest:manifest` root
    pub fn parse(xml: impl Into<String>) -> TemplateResult<Self> {
        let xml = xml.into();
        let tokens = tokenize(&xml)?;
        let has_root = tokens
            .iter()
            .any(|t| matches!(t.kind, TokenKind::Open | TokenKind::Empty) && t.name == MANIFEST);
        if !has_root {
            return Err(TemplateError::Xml("manifest has no manifest:manifest root".into()));
        }
        Ok(Self { xml })
    }

    /// All file entries in document order
    pub fn entries(&self) -> TemplateResult<Vec<ManifestEntry>> {
        let tokens = tokenize(&self.xml)?;
        let mut entries = Vec::new();
        for token in tokens.iter().filter(|t| is_file_entry(t.kind, &t.name)) {
            let attributes = tag_attributes(token.slice(&self.xml))?;
            entries.push(ManifestEntry {
                full_path: attribute(&attributes, FULL_PATH).unwrap_or_default().to_string(),
                media_type: attribute(&attributes, MEDIA_TYPE).unwrap_or_default().to_string(),
            });
        }
        Ok(entries)
    }

    /// Whether an entry exists for `path`
    pub fn contains(&self, path: &str) -> TemplateResult<bool> {
        Ok(self.entries()?.iter().any(|entry| entry.full_path == path))
    }

    /// Append an entry before the closing root tag
    pub fn add_entry(&mut self, path: &str, media_type: &str) -> TemplateResult<()> {
        let entry = format!(
            r#"<{} {}="{}" {}="{}"/>"#,
            FILE_ENTRY, FULL_PATH, path, MEDIA_TYPE, media_type
        );
        let tokens = tokenize(&self.xml)?;

        let root = tokens
            .iter()
            .position(|t| matches!(t.kind, TokenKind::Open | TokenKind::Empty) && t.name == MANIFEST)
            .ok_or_else(|| TemplateError::Xml("manifest has no manifest:manifest root".into()))?;

        let edit = if tokens[root].kind == TokenKind::Empty {
            // <manifest:manifest .../> has to be opened up first
            let tag = tokens[root].slice(&self.xml);
            let open = format!("{}>", tag.trim_end_matches("/>").trim_end());
            (tokens[root].range(), format!("{}{}</{}>", open, entry, MANIFEST))
        } else {
            let close = matching_close(&tokens, root)
                .ok_or_else(|| TemplateError::Xml("unterminated manifest root".into()))?;
            let at = tokens[close].start;
            (at..at, entry)
        };

        self.xml = splice(&self.xml, vec![edit]);
        Ok(())
    }

    /// Remove every entry for `path`; returns how many were removed
    pub fn remove_entry(&mut self, path: &str) -> TemplateResult<usize> {
        let tokens = tokenize(&self.xml)?;
        let mut edits = Vec::new();

        for (index, token) in tokens.iter().enumerate() {
            if !is_file_entry(token.kind, &token.name) {
                continue;
            }
            let attributes = tag_attributes(token.slice(&self.xml))?;
            if attribute(&attributes, FULL_PATH) != Some(path) {
                continue;
            }
            let end = match token.kind {
                TokenKind::Open => {
                    let close = matching_close(&tokens, index)
                        .ok_or_else(|| TemplateError::Xml("unterminated manifest entry".into()))?;
                    tokens[close].end
                }
                _ => token.end,
            };
            edits.push((token.start..end, String::new()));
        }

        let removed = edits.len();
        if removed > 0 {
            self.xml = splice(&self.xml, edits);
        }
        Ok(removed)
    }

    pub fn as_str(&self) -> &str {
        &self.xml
    }

    pub fn into_string(self) -> String {
        self.xml
    }
}

fn is_file_entry(kind: TokenKind, name: &str) -> bool {
    matches!(kind, TokenKind::Open | TokenKind::Empty) && name == FILE_ENTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST_XML: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        "\n",
        r#"<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.3">"#,
        "\n ",
        r#"<manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.text"/>"#,
        "\n ",
        r#"<manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>"#,
        "\n ",
        r#"<manifest:file-entry manifest:full-path="Pictures/old.png" manifest:media-type="image/png"/>"#,
        "\n",
        "</manifest:manifest>"
    );

    #[test]
    fn test_entries() {
        let manifest = Manifest::parse(MANIFEST_XML).unwrap();
        let entries = manifest.entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].full_path, "Pictures/old.png");
        assert_eq!(entries[2].media_type, "image/png");
    }

    #[test]
    fn test_add_entry() {
        let mut manifest = Manifest::parse(MANIFEST_XML).unwrap();
        manifest.add_entry("Pictures/new.jpg", "image/jpeg").unwrap();
        assert!(manifest.contains("Pictures/new.jpg").unwrap());
        assert!(manifest
            .as_str()
            .ends_with(r#"<manifest:file-entry manifest:full-path="Pictures/new.jpg" manifest:media-type="image/jpeg"/></manifest:manifest>"#));
        assert!(manifest.as_str().contains(r#"manifest:version="1.3""#));
    }

    #[test]
    fn test_remove_entry() {
        let mut manifest = Manifest::parse(MANIFEST_XML).unwrap();
        assert_eq!(manifest.remove_entry("Pictures/old.png").unwrap(), 1);
        assert!(!manifest.contains("Pictures/old.png").unwrap());
        assert_eq!(manifest.entries().unwrap().len(), 2);
        assert_eq!(manifest.remove_entry("Pictures/old.png").unwrap(), 0);
    }

    #[test]
    fn test_add_to_empty_root() {
        let mut manifest = Manifest::parse(r#"<manifest:manifest xmlns:manifest="urn:x"/>"#).unwrap();
        manifest.add_entry("Pictures/a.png", "image/png").unwrap();
        assert_eq!(
            manifest.as_str(),
            r#"<manifest:manifest xmlns:manifest="urn:x"><manifest:file-entry manifest:full-path="Pictures/a.png" manifest:media-type="image/png"/></manifest:manifest>"#
        );
    }

    #[test]
    fn test_rejects_non_manifest() {
        assert!(Manifest::parse("<office:document/>").is_err());
    }
}
