//! Image frames
//!
//! Templates reserve room for an image with a frame (`draw:frame`) named after
//! the placeholder, e.g. `${logo}`, holding a stand-in `draw:image`. Filling
//! the frame points the image at the embedded picture and renames the frame
//! so it cannot be claimed twice.

use crate::attributes::{DRAW_NAME, HREF, SVG_HEIGHT, SVG_WIDTH};
use crate::elements::{FRAME, IMAGE};
use crate::error::TemplateResult;
use crate::image::Image;
use crate::markup::{attribute, matching_close, render_tag, set_attribute, splice, tag_attributes, tokenize, Token, TokenKind};
use crate::substitute::{replace_key, MarkerSyntax};

/// Outcome of rewriting the frames of one member
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRewrite {
    pub text: String,
    /// Number of frames, or text nodes when placing inline, that now show the image
    pub claimed: usize,
}

/// Point every frame named `${key}` at `image`.
///
/// `ratio` is the source width divided by its height; when given, each
/// frame's height is recomputed from its width.
pub fn rewrite_frames(text: &str, key: &str, image: &Image, ratio: Option<f64>) -> TemplateResult<FrameRewrite> {
    let placeholder = format!("${{{}}}", key);
    let tokens = tokenize(text)?;
    let mut edits = Vec::new();
    let mut claimed = 0;

    for (index, token) in tokens.iter().enumerate() {
        let is_frame = matches!(token.kind, TokenKind::Open | TokenKind::Empty) && token.name == FRAME;
        if !is_frame {
            continue;
        }

        let mut frame_attributes = tag_attributes(token.slice(text))?;
        if attribute(&frame_attributes, DRAW_NAME) != Some(placeholder.as_str()) {
            continue;
        }

        set_attribute(&mut frame_attributes, DRAW_NAME, image.archive_name());
        if let Some(ratio) = ratio {
            let height = attribute(&frame_attributes, SVG_WIDTH)
                .and_then(parse_length)
                .map(|(width, unit)| format_length(width / ratio, unit));
            if let Some(height) = height {
                set_attribute(&mut frame_attributes, SVG_HEIGHT, &height);
            }
        }
        edits.push((
            token.range(),
            render_tag(FRAME, &frame_attributes, token.kind == TokenKind::Empty),
        ));

        if token.kind == TokenKind::Open {
            let close = matching_close(&tokens, index).unwrap_or(tokens.len());
            if let Some(inner) = child_image(&tokens[index + 1..close]) {
                let mut image_attributes = tag_attributes(inner.slice(text))?;
                set_attribute(&mut image_attributes, HREF, &image.archive_path());
                edits.push((
                    inner.range(),
                    render_tag(IMAGE, &image_attributes, inner.kind == TokenKind::Empty),
                ));
            }
        }

        claimed += 1;
    }

    let text = if edits.is_empty() { text.to_string() } else { splice(text, edits) };
    Ok(FrameRewrite { text, claimed })
}

/// Replace the text placeholder `${key}` with an inline frame for `image`.
///
/// Only character data is rewritten; a frame whose `draw:name` is `${key}` is
/// left for `rewrite_frames`. `claimed` counts the text nodes changed.
pub fn place_inline(text: &str, key: &str, image: &Image, syntax: MarkerSyntax) -> TemplateResult<FrameRewrite> {
    let fragment = inline_fragment(image);
    let mut edits = Vec::new();

    for token in tokenize(text)?.iter().filter(|t| t.kind == TokenKind::Text) {
        let original = token.slice(text);
        let replaced = replace_key(original, key, &fragment, syntax);
        if replaced != original {
            edits.push((token.range(), replaced));
        }
    }

    let claimed = edits.len();
    let text = if edits.is_empty() { text.to_string() } else { splice(text, edits) };
    Ok(FrameRewrite { text, claimed })
}

/// First `draw:image` directly inside a frame, given the frame's inner tokens.
/// Images of nested frames belong to those frames.
fn child_image(inner: &[Token]) -> Option<&Token> {
    let mut depth = 0usize;
    for token in inner {
        match token.kind {
            TokenKind::Open | TokenKind::Empty if depth == 0 && token.name == IMAGE => return Some(token),
            TokenKind::Open => depth += 1,
            TokenKind::Close => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// A complete frame for `image`, sized from its explicit geometry (cm)
pub fn inline_fragment(image: &Image) -> String {
    format!(
        concat!(
            r#"<draw:frame draw:name="{name}" text:anchor-type="as-char" "#,
            r#"svg:x="{x}" svg:y="{y}" svg:width="{w}" svg:height="{h}" draw:z-index="0">"#,
            r#"<draw:image xlink:href="{href}" xlink:type="simple" xlink:show="embed" xlink:actuate="onLoad"/>"#,
            "</draw:frame>"
        ),
        name = image.archive_name(),
        x = format_length(image.position_x, "cm"),
        y = format_length(image.position_y, "cm"),
        w = format_length(image.width, "cm"),
        h = format_length(image.height, "cm"),
        href = image.archive_path(),
    )
}

/// Split an ODF length such as `4.5cm` into value and unit
fn parse_length(value: &str) -> Option<(f64, &str)> {
    let value = value.trim();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(value.len());
    let number = value[..split].parse::<f64>().ok()?;
    Some((number, &value[split..]))
}

fn format_length(value: f64, unit: &str) -> String {
    let number = format!("{:.4}", value);
    let number = number.trim_end_matches('0').trim_end_matches('.');
    let number = if number.is_empty() || number == "-" { "0" } else { number };
    format!("{}{}", number, unit)
}
