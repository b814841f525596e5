//! Integration tests for filling templates
//!
//! Each test builds a small but complete ODT package on disk, fills it
//! through the public API and inspects the saved archive.

use odt_engine::{
    Image, MarkerSyntax, PackagedDocument, Replacements, CONTENT_MEMBER, MANIFEST_MEMBER, STYLES_MEMBER,
};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::tempdir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:draw="urn:oasis:names:tc:opendocument:xmlns:drawing:1.0" xmlns:svg="urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0" xmlns:xlink="http://www.w3.org/1999/xlink" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0">
<office:body>
<office:text>
<text:p text:style-name="P1">Hello <text:span text:style-name="T1">${na</text:span><text:span text:style-name="T2">me}</text:span>,</text:p>
<text:p>${address}</text:p>
<text:p text:style-name="P2">${items}</text:p>
<text:p>- ${item}</text:p>
<text:p text:style-name="P2">${/items}</text:p>
<text:p><draw:frame draw:name="${logo}" text:anchor-type="paragraph" svg:width="5cm" svg:height="5cm"><draw:image xlink:href="Pictures/placeholder.png" xlink:type="simple"/></draw:frame></text:p>
<text:p><draw:frame draw:name="${stamp}" svg:width="2cm" svg:height="2cm"><draw:image xlink:href="Pictures/stamp.png"/></draw:frame></text:p>
</office:text>
</office:body>
</office:document-content>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0">
<office:master-styles><style:master-page style:name="Standard"><style:header><text:p>${company}</text:p></style:header></style:master-page></office:master-styles>
</office:document-styles>"#;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.3">
 <manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.text"/>
 <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
 <manifest:file-entry manifest:full-path="styles.xml" manifest:media-type="text/xml"/>
 <manifest:file-entry manifest:full-path="Pictures/placeholder.png" manifest:media-type="image/png"/>
 <manifest:file-entry manifest:full-path="Pictures/stamp.png" manifest:media-type="image/png"/>
</manifest:manifest>"#;

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data
}

fn build_template(path: &Path, content: &str) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/vnd.oasis.opendocument.text").unwrap();
    zip.start_file(CONTENT_MEMBER, deflated).unwrap();
    zip.write_all(content.as_bytes()).unwrap();
    zip.start_file(STYLES_MEMBER, deflated).unwrap();
    zip.write_all(STYLES.as_bytes()).unwrap();
    zip.start_file("meta.xml", deflated).unwrap();
    zip.write_all(b"<office:document-meta/>").unwrap();
    zip.start_file("Pictures/placeholder.png", stored).unwrap();
    zip.write_all(&png(1, 1)).unwrap();
    zip.start_file("Pictures/stamp.png", stored).unwrap();
    zip.write_all(&png(1, 1)).unwrap();
    zip.start_file(MANIFEST_MEMBER, deflated).unwrap();
    zip.write_all(MANIFEST.as_bytes()).unwrap();
    zip.finish().unwrap();
}

/// Saved archive, opened for inspection
struct Saved {
    archive: ZipArchive<File>,
}

impl Saved {
    fn open(path: &Path) -> Self {
        Self {
            archive: ZipArchive::new(File::open(path).unwrap()).unwrap(),
        }
    }

    fn text(&mut self, name: &str) -> String {
        let mut text = String::new();
        self.archive.by_name(name).unwrap().read_to_string(&mut text).unwrap();
        text
    }

    fn has(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }
}

fn row(item: &str) -> Replacements {
    [("item".to_string(), item.to_string())].into_iter().collect()
}

#[test]
fn test_fill_complete_template() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("letter.odt");
    build_template(&template, CONTENT);
    let logo_path = dir.path().join("logo.png");
    fs::write(&logo_path, png(400, 100)).unwrap();

    let mut doc = PackagedDocument::open_in(dir.path(), &template).unwrap();
    doc.set_value("name", "Alice");
    doc.set_value("address", "1 Main St\nSpringfield");
    doc.set_value("company", "Smith & Co");
    assert_eq!(doc.clone_block("items", 3, &[row("a"), row("b"), row("c")]).unwrap(), 1);
    let logo = Image::new(&logo_path).keep_ratio(true);
    assert!(doc.insert_image("logo", &logo).unwrap());

    let out = dir.path().join("filled.odt");
    doc.save_as(&out).unwrap();

    let mut saved = Saved::open(&out);
    let content = saved.text(CONTENT_MEMBER);
    assert!(content.contains("Hello <text:span text:style-name=\"T1\">Alice</text:span>,"));
    assert!(content.contains("<text:p>1 Main St<text:line-break/>Springfield</text:p>"));
    let positions: Vec<usize> = ["- a", "- b", "- c"]
        .iter()
        .map(|item| content.find(&format!("<text:p>{}</text:p>", item)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(!content.contains("${item}"));
    assert!(!content.contains("${items}"));
    assert!(!content.contains("${/items}"));
    assert!(content.contains(&format!("xlink:href=\"{}\"", logo.archive_path())));
    assert!(content.contains("svg:width=\"5cm\" svg:height=\"1.25cm\""));

    let styles = saved.text(STYLES_MEMBER);
    assert!(styles.contains("<text:p>Smith &amp; Co</text:p>"));

    // The replaced placeholder picture is gone, the untouched one stays
    assert!(saved.has(&logo.archive_path()));
    assert!(!saved.has("Pictures/placeholder.png"));
    assert!(saved.has("Pictures/stamp.png"));
    assert_eq!(saved.text("meta.xml"), "<office:document-meta/>");

    let manifest = saved.text(MANIFEST_MEMBER);
    assert!(manifest.contains(&logo.archive_path()));
    assert!(!manifest.contains("Pictures/placeholder.png"));
    assert!(manifest.contains("Pictures/stamp.png"));
}

#[test]
fn test_deleted_block_and_unfilled_placeholders() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("letter.odt");
    build_template(&template, CONTENT);

    let mut doc = PackagedDocument::open_in(dir.path(), &template).unwrap();
    doc.delete_block("items").unwrap();
    let out = dir.path().join("filled.odt");
    doc.save_as(&out).unwrap();

    let content = Saved::open(&out).text(CONTENT_MEMBER);
    assert!(!content.contains("${item}"));
    assert!(!content.contains("${items}"));
    assert!(content.contains("<text:p>${address}</text:p>"));
    assert!(content.contains("<text:span text:style-name=\"T1\">${name}</text:span>"));
}

#[test]
fn test_unusable_images_change_nothing() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("letter.odt");
    build_template(&template, CONTENT);
    let bmp = dir.path().join("logo.bmp");
    fs::write(&bmp, b"BM\x00\x00\x00\x00").unwrap();

    let mut doc = PackagedDocument::open_in(dir.path(), &template).unwrap();
    let before = doc.content().to_string();
    assert!(!doc.insert_image("logo", &Image::new(dir.path().join("absent.png"))).unwrap());
    assert!(!doc.insert_image("logo", &Image::new(&bmp)).unwrap());
    assert_eq!(doc.content(), before);

    let out = dir.path().join("filled.odt");
    doc.save_as(&out).unwrap();
    let mut saved = Saved::open(&out);
    assert!(saved.text(CONTENT_MEMBER).contains("draw:name=\"${logo}\""));
    assert!(saved.has("Pictures/placeholder.png"));
}

#[test]
fn test_legacy_placeholders() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("legacy.odt");
    let content = "<office:text><text:p>{name} / ${name}</text:p><text:p>{rows}</text:p><text:p>{v}</text:p><text:p>{/rows}</text:p></office:text>";
    build_template(&template, content);

    let mut doc = PackagedDocument::open_in(dir.path(), &template)
        .unwrap()
        .with_syntax(MarkerSyntax::Legacy);
    doc.set_value("name", "Bob");
    let sets: Vec<Replacements> = ["x", "y"]
        .iter()
        .map(|v| [("v".to_string(), v.to_string())].into_iter().collect())
        .collect();
    doc.clone_block("rows", 2, &sets).unwrap();

    assert_eq!(
        doc.content(),
        "<office:text><text:p>Bob / Bob</text:p><text:p>x</text:p><text:p>y</text:p></office:text>"
    );
}

#[test]
fn test_same_image_in_two_frames() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("twice.odt");
    let content = concat!(
        "<office:text>",
        r#"<text:p><draw:frame draw:name="${sig}" svg:width="3cm"><draw:image xlink:href="Pictures/placeholder.png"/></draw:frame></text:p>"#,
        r#"<text:p><draw:frame draw:name="${sig}" svg:width="3cm"><draw:image xlink:href="Pictures/stamp.png"/></draw:frame></text:p>"#,
        "</office:text>"
    );
    build_template(&template, content);
    let sig = dir.path().join("sig.png");
    fs::write(&sig, png(10, 10)).unwrap();

    let mut doc = PackagedDocument::open_in(dir.path(), &template).unwrap();
    let image = Image::new(&sig);
    assert!(doc.insert_image("sig", &image).unwrap());
    assert_eq!(doc.content().matches(&image.archive_path()).count(), 2);

    let out = dir.path().join("filled.odt");
    doc.save_as(&out).unwrap();
    let mut saved = Saved::open(&out);
    assert!(!saved.has("Pictures/placeholder.png"));
    assert!(!saved.has("Pictures/stamp.png"));
    assert_eq!(saved.text(MANIFEST_MEMBER).matches(&image.archive_path()).count(), 1);
}
