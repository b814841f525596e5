//! Placeholder cleanup
//!
//! Office editors split runs of text whenever formatting, spell-check state
//! or revision data changes, so a placeholder typed as `${customer}` is often
//! stored as `${cust</text:span><text:span text:style-name="T2">omer}`.
//! [`sanitize`] removes markup found inside placeholders so the substitution
//! and block engines can match them literally.

use regex_lite::Regex;
use std::sync::OnceLock;

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    MaybeStarted,
    Inside,
}

/// Strip markup from inside every `${...}` token of `text`.
///
/// Text outside tokens is copied through untouched. A token still open at the
/// end of the input is copied through as-is.
pub fn sanitize(text: &str) -> String {
    let mut clean = String::with_capacity(text.len());
    let mut candidate = String::new();
    let mut state = ScanState::Outside;

    for ch in text.chars() {
        match state {
            ScanState::Outside => {
                clean.push(ch);
                if ch == '$' {
                    state = ScanState::MaybeStarted;
                }
            }
            ScanState::MaybeStarted => {
                clean.push(ch);
                state = match ch {
                    '{' => {
                        candidate.clear();
                        ScanState::Inside
                    }
                    '$' => ScanState::MaybeStarted,
                    _ => ScanState::Outside,
                };
            }
            ScanState::Inside => {
                candidate.push(ch);
                if ch == '}' {
                    clean.push_str(&tag_pattern().replace_all(&candidate, ""));
                    candidate.clear();
                    state = ScanState::Outside;
                }
            }
        }
    }

    if state == ScanState::Inside {
        clean.push_str(&candidate);
    }

    clean
}
