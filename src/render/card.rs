//! Decoding object cards and diagrams from their base64 wire form.
//!
//! A card is either a PNG image or SVG markup. PNG cards are detected by the
//! base64 text starting with the encoded PNG signature; everything else is
//! decoded and parsed as SVG. SVG hyperlinks carry the id of another object
//! in the last segment of their target path; they are rewritten so that
//! following one navigates within the session instead of leaving it.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::{Captures, Regex};

/// Base64 of the first bytes of the PNG signature.
pub const PNG_BASE64_MAGIC: &str = "iVBORw0KGgo";

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<a\b([^>]*)>").expect("Invalid regex"));
static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s*(?:xlink:)?href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid regex")
});
static TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b[^>]*>(.*?)</text>").expect("Invalid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardEncoding {
    Png,
    Svg,
}

/// Guess the encoding from the base64 text alone.
///
/// Only the prefix is inspected, so an SVG payload that happens to start
/// with the PNG magic would be misread as PNG.
pub fn detect_encoding(base64: &str) -> CardEncoding {
    if base64.trim_start().starts_with(PNG_BASE64_MAGIC) {
        CardEncoding::Png
    } else {
        CardEncoding::Svg
    }
}

/// Parsed SVG card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgDocument {
    /// Markup with every object link rewritten to an in-session target.
    pub markup: String,
    /// Referenced object ids, in document order.
    pub links: Vec<String>,
    /// Text content of the `<text>` elements, in document order.
    pub text: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardBody {
    Png { width: u32, height: u32 },
    Svg(SvgDocument),
    /// The card could not be rendered; other cards are unaffected.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCard {
    pub id: String,
    pub encoding: CardEncoding,
    pub body: CardBody,
}

impl RenderedCard {
    pub fn links(&self) -> &[String] {
        match &self.body {
            CardBody::Svg(doc) => &doc.links,
            _ => &[],
        }
    }
}

/// Render one card. Never fails; broken payloads become [`CardBody::Unavailable`].
pub fn render_card(id: &str, base64: &str) -> RenderedCard {
    let encoding = detect_encoding(base64);
    let body = match decode_body(encoding, base64) {
        Ok(body) => body,
        Err(reason) => {
            tracing::warn!(%id, %reason, "card not renderable");
            CardBody::Unavailable(reason)
        }
    };
    RenderedCard {
        id: id.to_string(),
        encoding,
        body,
    }
}

fn decode_body(encoding: CardEncoding, base64: &str) -> Result<CardBody, String> {
    let compact: String = base64.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err("empty payload".to_string());
    }
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| format!("invalid base64: {e}"))?;
    match encoding {
        CardEncoding::Png => {
            let (width, height) =
                png_dimensions(&bytes).ok_or_else(|| "truncated PNG header".to_string())?;
            Ok(CardBody::Png { width, height })
        }
        CardEncoding::Svg => {
            let markup = String::from_utf8(bytes).map_err(|_| "SVG is not UTF-8".to_string())?;
            if !markup.contains("<svg") {
                return Err("no <svg> element".to_string());
            }
            Ok(CardBody::Svg(parse_svg(&markup)))
        }
    }
}

/// Width and height from the IHDR chunk of a PNG.
pub fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || bytes[..8] != crate::protocol::legacy::PNG_SIGNATURE {
        return None;
    }
    if &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}

/// Rewrite object links and collect the text of an SVG document.
pub fn parse_svg(markup: &str) -> SvgDocument {
    let mut links = Vec::new();
    let rewritten = ANCHOR.replace_all(markup, |caps: &Captures| {
        let attrs = &caps[1];
        let target = HREF
            .captures(attrs)
            .and_then(|href| href.get(1).or_else(|| href.get(2)))
            .map(|m| m.as_str());
        match target.and_then(target_id) {
            Some(id) => {
                let stripped = HREF.replace_all(attrs, "");
                let attrs = stripped.trim_end();
                let anchor = format!(r##"<a href="#" data-refid="{id}"{attrs}>"##);
                links.push(id);
                anchor
            }
            None => caps[0].to_string(),
        }
    });

    let text = TEXT
        .captures_iter(markup)
        .map(|caps| unescape(TAG.replace_all(&caps[1], "").trim()))
        .filter(|t| !t.is_empty())
        .collect();

    SvgDocument {
        markup: rewritten.into_owned(),
        links,
        text,
    }
}

/// Object id encoded in a link target: its last non-empty path segment.
fn target_id(target: &str) -> Option<String> {
    let path = target.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/')
        .map(str::trim)
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#160;", " ")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X2: [u8; 24] = [
        0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, // signature
        0, 0, 0, 13, b'I', b'H', b'D', b'R', // chunk header
        0, 0, 0, 1, 0, 0, 0, 2, // width, height
    ];

    fn b64(s: impl AsRef<[u8]>) -> String {
        STANDARD.encode(s)
    }

    #[test]
    fn test_png_detected_by_magic_prefix() {
        let encoded = b64(PNG_1X2);
        assert!(encoded.starts_with(PNG_BASE64_MAGIC));
        let card = render_card("7", &encoded);
        assert_eq!(card.encoding, CardEncoding::Png);
        assert_eq!(
            card.body,
            CardBody::Png {
                width: 1,
                height: 2
            }
        );
    }

    #[test]
    fn test_svg_links_are_rewritten() {
        let svg = r#"<svg><a href="/objects/42" xlink:href="/objects/42" target="_top"><text x="1">Node &amp; co</text></a></svg>"#;
        let card = render_card("1", &b64(svg));
        let CardBody::Svg(doc) = card.body else {
            panic!("expected svg body");
        };
        assert_eq!(doc.links, vec!["42"]);
        assert!(doc.markup.contains(r##"<a href="#" data-refid="42" target="_top">"##));
        assert!(!doc.markup.contains("/objects/42"));
        assert_eq!(doc.text, vec!["Node & co"]);
    }

    #[test]
    fn test_link_target_trailing_slash_and_query() {
        assert_eq!(target_id("http://h/x/9/"), Some("9".to_string()));
        assert_eq!(target_id("/a/b/11?x=1#f"), Some("11".to_string()));
        assert_eq!(target_id("#"), None);
    }

    #[test]
    fn test_anchor_without_target_is_left_alone() {
        let doc = parse_svg(r##"<svg><a name="top"></a><a href="#"></a></svg>"##);
        assert!(doc.links.is_empty());
        assert!(doc.markup.contains(r#"<a name="top">"#));
    }

    #[test]
    fn test_broken_payloads_degrade() {
        assert!(matches!(render_card("1", "").body, CardBody::Unavailable(_)));
        assert!(matches!(render_card("1", "!!!").body, CardBody::Unavailable(_)));
        assert!(matches!(
            render_card("1", &b64("plain text")).body,
            CardBody::Unavailable(_)
        ));
        assert!(matches!(
            render_card("1", &b64(&PNG_1X2[..10])).body,
            CardBody::Unavailable(_)
        ));
    }
}
