//! Placeholder substitution
//!
//! Substitution is plain text replacement over a member buffer. The member is
//! never parsed or re-serialized here.

use serde::{Deserialize, Serialize};

/// ODF markup for a line break inside a paragraph
pub const LINE_BREAK: &str = "<text:line-break/>";

/// Placeholder and block delimiter syntax
///
/// `Dollar` (`${key}`, `${name}` ... `${/name}`) is the canonical form.
/// `Legacy` additionally recognises the bracket-only form (`{key}`,
/// `{name}` ... `{/name}`) of older templates. When both forms are present the
/// `$` form is replaced first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerSyntax {
    #[default]
    Dollar,
    Legacy,
}

impl MarkerSyntax {
    /// Placeholder forms for `key`, in replacement order
    pub fn placeholders(self, key: &str) -> Vec<String> {
        let mut forms = vec![format!("${{{}}}", key)];
        if self == MarkerSyntax::Legacy {
            forms.push(format!("{{{}}}", key));
        }
        forms
    }

    /// Start and end marker pairs for block `name`, in lookup order
    pub fn block_markers(self, name: &str) -> Vec<(String, String)> {
        let mut forms = vec![(format!("${{{}}}", name), format!("${{/{}}}", name))];
        if self == MarkerSyntax::Legacy {
            forms.push((format!("{{{}}}", name), format!("{{/{}}}", name)));
        }
        forms
    }
}

/// Escape a value for insertion into ODF text.
///
/// Newlines become line-break elements, then ampersands are normalised so
/// that an already escaped `&amp;` is not escaped twice.
pub fn escape_value(value: &str) -> String {
    value
        .replace("\r\n", LINE_BREAK)
        .replace('\n', LINE_BREAK)
        .replace("&amp;", "&")
        .replace('&', "&amp;")
}

/// Replace every placeholder for `key` in `text` with the escaped `value`
pub fn replace_key(text: &str, key: &str, value: &str, syntax: MarkerSyntax) -> String {
    let escaped = escape_value(value);
    let mut result = text.to_string();
    for placeholder in syntax.placeholders(key) {
        if result.contains(&placeholder) {
            result = result.replace(&placeholder, &escaped);
        }
    }
    result
}
