//! Splitting composite value text into plain text and `refid:<id>` links.
//!
//! The rewrite happens only at render time; the [`ValueView`] in session
//! state keeps the raw text.

use std::sync::LazyLock;

use regex::Regex;

use crate::protocol::{ValueKind, ValueView};

static REFID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"refid:([A-Za-z0-9_.\-]+)").expect("Invalid regex"));

/// One piece of a rendered value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSegment {
    Text(String),
    /// A navigable reference to another object's card.
    Link { id: String },
}

/// Segment a value for display. Primitive values are never scanned.
pub fn segments(value: &ValueView) -> Vec<ValueSegment> {
    match value.kind {
        ValueKind::Primitive => vec![ValueSegment::Text(value.repr.clone())],
        ValueKind::Composite => segment_refs(&value.repr),
    }
}

fn segment_refs(text: &str) -> Vec<ValueSegment> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in REFID.captures_iter(text) {
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push(ValueSegment::Text(text[last..whole.start()].to_string()));
        }
        out.push(ValueSegment::Link {
            id: id.as_str().to_string(),
        });
        last = whole.end();
    }
    if last < text.len() || out.is_empty() {
        out.push(ValueSegment::Text(text[last..].to_string()));
    }
    out
}

/// Ids of all links in `segments`, in display order.
pub fn link_ids(segments: &[ValueSegment]) -> Vec<&str> {
    segments
        .iter()
        .filter_map(|segment| match segment {
            ValueSegment::Link { id } => Some(id.as_str()),
            ValueSegment::Text(_) => None,
        })
        .collect()
}

/// Break segments into display lines at `\n`. Composite values arrive as
/// one `name: value` attribute per line. Never returns an empty list.
pub fn lines(segments: &[ValueSegment]) -> Vec<Vec<ValueSegment>> {
    let mut out = vec![Vec::new()];
    for segment in segments {
        match segment {
            ValueSegment::Link { .. } => {
                if let Some(line) = out.last_mut() {
                    line.push(segment.clone());
                }
            }
            ValueSegment::Text(text) => {
                for (i, piece) in text.split('\n').enumerate() {
                    if i > 0 {
                        out.push(Vec::new());
                    }
                    if !piece.is_empty() {
                        if let Some(line) = out.last_mut() {
                            line.push(ValueSegment::Text(piece.to_string()));
                        }
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str) -> ValueSegment {
        ValueSegment::Link { id: id.to_string() }
    }

    fn text(s: &str) -> ValueSegment {
        ValueSegment::Text(s.to_string())
    }

    #[test]
    fn test_bare_refid_becomes_single_link() {
        assert_eq!(segments(&ValueView::composite("refid:7")), vec![link("7")]);
    }

    #[test]
    fn test_refids_inside_text() {
        let segs = segments(&ValueView::composite("[refid:1, refid:22]"));
        assert_eq!(
            segs,
            vec![text("["), link("1"), text(", "), link("22"), text("]")]
        );
        assert_eq!(link_ids(&segs), vec!["1", "22"]);
    }

    #[test]
    fn test_primitive_is_never_rewritten() {
        let segs = segments(&ValueView::primitive("refid:7"));
        assert_eq!(segs, vec![text("refid:7")]);
        assert!(link_ids(&segs).is_empty());
    }

    #[test]
    fn test_composite_without_refs_is_plain_text() {
        assert_eq!(
            segments(&ValueView::composite("<object>")),
            vec![text("<object>")]
        );
        assert_eq!(segments(&ValueView::composite("")), vec![text("")]);
    }

    #[test]
    fn test_multiline_composite_splits_per_attribute() {
        let segs = segments(&ValueView::composite("next: refid:7\nval: 3"));
        assert_eq!(
            lines(&segs),
            vec![vec![text("next: "), link("7")], vec![text("val: 3")]]
        );
        assert_eq!(link_ids(&segs), vec!["7"]);
    }

    #[test]
    fn test_single_line_value_is_one_line() {
        assert_eq!(lines(&[text("5")]), vec![vec![text("5")]]);
        assert_eq!(lines(&[]), vec![Vec::<ValueSegment>::new()]);
    }

    #[test]
    fn test_rewrite_does_not_touch_model() {
        let value = ValueView::composite("refid:9");
        let _ = segments(&value);
        assert_eq!(value.repr, "refid:9");
    }
}
