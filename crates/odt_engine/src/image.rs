//! Images to embed into a template
//!
//! The MIME type of an image is determined from its content (magic bytes),
//! never from its file name. Only PNG and JPEG are accepted.

use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// Image formats recognised by content sniffing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Unknown,
}

/// Formats that may be embedded
pub const ALLOWED_IMAGE_FORMATS: &[ImageFormat] = &[ImageFormat::Png, ImageFormat::Jpeg];

impl ImageFormat {
    /// Detect format from magic bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // GIF: 47 49 46 38
        if data.starts_with(&[0x47, 0x49, 0x46, 0x38]) {
            return Self::Gif;
        }

        // BMP: 42 4D
        if data.starts_with(&[0x42, 0x4D]) {
            return Self::Bmp;
        }

        Self::Unknown
    }

    /// Get the MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Whether images of this format may be embedded
    pub fn is_allowed(&self) -> bool {
        ALLOWED_IMAGE_FORMATS.contains(self)
    }

    /// Pixel dimensions read from the image header
    pub fn dimensions(&self, data: &[u8]) -> Option<(u32, u32)> {
        let (width, height) = match self {
            Self::Png => png_dimensions(data)?,
            Self::Jpeg => jpeg_dimensions(data)?,
            _ => return None,
        };
        (width > 0 && height > 0).then_some((width, height))
    }
}

fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // IHDR is the first chunk: width at byte 16, height at byte 20
    if data.len() < 24 {
        return None;
    }
    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    Some((width, height))
}

fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // Walk the marker segments until a start-of-frame marker
    let mut i = 2;
    while i + 9 <= data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        match marker {
            // SOF0..SOF15, except DHT (C4), JPG (C8) and DAC (CC)
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
                let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
                return Some((width, height));
            }
            // Fill bytes and standalone markers carry no length
            0xFF | 0x01 | 0xD0..=0xD9 => i += if marker == 0xFF { 1 } else { 2 },
            _ => {
                let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
                i += 2 + length;
            }
        }
    }
    None
}

/// An image bound to a placeholder
///
/// Each image gets a unique archive name (`<uuid>.<extension>`) when it is
/// created. Position and size are in centimetres and are only used by the
/// inline embedding mode; frame embedding keeps the frame's own geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub path: PathBuf,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    pub keep_ratio: bool,
    archive_name: String,
}

impl Image {
    /// Create an image for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let archive_name = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        Self {
            path,
            position_x: 0.0,
            position_y: 0.0,
            width: 0.0,
            height: 0.0,
            keep_ratio: false,
            archive_name,
        }
    }

    /// Set the position of the image (cm)
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position_x = x;
        self.position_y = y;
        self
    }

    /// Set the size of the image (cm)
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Preserve the source aspect ratio when filling a frame
    pub fn keep_ratio(mut self, keep: bool) -> Self {
        self.keep_ratio = keep;
        self
    }

    /// Unique file name inside the archive's `Pictures/` directory
    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    /// Full archive path of the image
    pub fn archive_path(&self) -> String {
        format!("{}{}", crate::PICTURES_DIR, self.archive_name)
    }

    /// Sniff the image format; `None` when the file cannot be read
    pub fn format(&self) -> Option<ImageFormat> {
        fs::read(&self.path).ok().map(|data| ImageFormat::from_bytes(&data))
    }

    /// MIME type from file inspection
    pub fn mime(&self) -> Option<&'static str> {
        self.format().map(|format| format.mime_type())
    }

    /// The file exists and holds an allowed image type
    pub fn is_valid(&self) -> bool {
        self.format().is_some_and(|format| format.is_allowed())
    }

    /// Pixel dimensions of the source image
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        let data = fs::read(&self.path).ok()?;
        ImageFormat::from_bytes(&data).dimensions(&data)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A PNG header with the given dimensions; enough for sniffing and sizing
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data
    }

    /// A JPEG with an APP0 segment followed by SOF0
    pub fn jpeg_bytes(width: u16, height: u16) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[1, 1, 0, 0, 1, 0, 1, 0, 0]);
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&[3, 1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]);
        data
    }
}
