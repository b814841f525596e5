//! Template value bindings
//!
//! Values map a placeholder key to what fills it. They are usually read from
//! a JSON object:
//!
//! ```json
//! {
//!   "customer": "Alice",
//!   "note": null,
//!   "items": [{"item": "a"}, {"item": "b"}],
//!   "logo": {"path": "logo.png", "keep_ratio": true}
//! }
//! ```
//!
//! Strings, numbers and booleans become text. An array of objects, or an
//! object keyed by `"0"`, `"1"`, ... becomes a block with one replacement set
//! per copy. An object with a `path` field becomes an image.

use crate::error::{DocgenError, DocgenResult};
use odt_engine::{Image, Replacements};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::path::Path;

/// Bindings for one compilation, applied in key order within each kind
pub type Values = BTreeMap<String, TemplateValue>;

/// What a placeholder is filled with
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    /// Text value
    Text(String),
    /// Null/missing value; renders as empty text
    Null,
    /// Block copies, one replacement set each
    Block(Vec<Replacements>),
    /// Image for a frame or inline placeholder
    Image(Image),
}

impl TemplateValue {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Create a block from rows of `(key, value)` pairs
    pub fn block<I, R, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Block(
            rows.into_iter()
                .map(|row| row.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
                .collect(),
        )
    }

    /// Text to substitute for scalar values; `None` for blocks and images
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Null => Some(""),
            _ => None,
        }
    }

    /// Build a value from JSON. Relative image paths are resolved against
    /// `base_dir` when given.
    pub fn from_json(key: &str, json: &JsonValue, base_dir: Option<&Path>) -> DocgenResult<Self> {
        match json {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Array(rows) => {
                let sets = rows
                    .iter()
                    .enumerate()
                    .map(|(index, row)| replacement_set(key, index, row))
                    .collect::<DocgenResult<Vec<_>>>()?;
                Ok(Self::Block(sets))
            }
            JsonValue::Object(map) if map.contains_key("path") => image_binding(key, map, base_dir).map(Self::Image),
            JsonValue::Object(map) => indexed_block(key, map),
            scalar => scalar_text(scalar)
                .map(Self::Text)
                .ok_or_else(|| DocgenError::invalid_value(key, "unsupported JSON value")),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Image> for TemplateValue {
    fn from(image: Image) -> Self {
        Self::Image(image)
    }
}

/// Parse values from a JSON object
pub fn values_from_json(data: &str, base_dir: Option<&Path>) -> DocgenResult<Values> {
    let json: JsonValue = serde_json::from_str(data)?;
    let JsonValue::Object(map) = json else {
        return Err(DocgenError::invalid_value("<root>", "expected a JSON object"));
    };

    map.iter()
        .map(|(key, value)| Ok::<_, DocgenError>((key.clone(), TemplateValue::from_json(key, value, base_dir)?)))
        .collect()
}

/// Parse values from a JSON file; image paths are relative to the file
pub fn values_from_file(path: impl AsRef<Path>) -> DocgenResult<Values> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    values_from_json(&content, path.parent())
}

/// Text for a JSON scalar, formatting integers without a fraction
fn scalar_text(json: &JsonValue) -> Option<String> {
    match json {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null => Some(String::new()),
        _ => None,
    }
}

fn replacement_set(key: &str, index: usize, row: &JsonValue) -> DocgenResult<Replacements> {
    let JsonValue::Object(fields) = row else {
        return Err(DocgenError::invalid_value(key, format!("block row {} is not an object", index)));
    };

    fields
        .iter()
        .map(|(field, value)| {
            scalar_text(value)
                .map(|text| (field.clone(), text))
                .ok_or_else(|| DocgenError::invalid_value(key, format!("block row {} field '{}' is not a scalar", index, field)))
        })
        .collect()
}

/// A block given as `{"0": {...}, "1": {...}}`, ordered by index
fn indexed_block(key: &str, map: &Map<String, JsonValue>) -> DocgenResult<TemplateValue> {
    let mut rows = map
        .iter()
        .map(|(index, row)| {
            index
                .parse::<usize>()
                .map(|index| (index, row))
                .map_err(|_| DocgenError::invalid_value(key, format!("block index '{}' is not a number", index)))
        })
        .collect::<DocgenResult<Vec<_>>>()?;
    rows.sort_by_key(|(index, _)| *index);

    let sets = rows
        .into_iter()
        .map(|(index, row)| replacement_set(key, index, row))
        .collect::<DocgenResult<Vec<_>>>()?;
    Ok(TemplateValue::Block(sets))
}

fn image_binding(key: &str, map: &Map<String, JsonValue>, base_dir: Option<&Path>) -> DocgenResult<Image> {
    let path = map
        .get("path")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| DocgenError::invalid_value(key, "image path must be a string"))?;
    let path = match base_dir {
        Some(dir) if Path::new(path).is_relative() => dir.join(path),
        _ => Path::new(path).to_path_buf(),
    };

    let number = |field: &str| -> DocgenResult<f64> {
        match map.get(field) {
            None | Some(JsonValue::Null) => Ok(0.0),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| DocgenError::invalid_value(key, format!("image {} must be a number", field))),
        }
    };

    let keep_ratio = match map.get("keep_ratio") {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Bool(keep)) => *keep,
        Some(_) => return Err(DocgenError::invalid_value(key, "image keep_ratio must be a boolean")),
    };

    Ok(Image::new(path)
        .with_position(number("x")?, number("y")?)
        .with_size(number("width")?, number("height")?)
        .keep_ratio(keep_ratio))
}
