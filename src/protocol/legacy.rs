//! Legacy `<tag>:<data>` frames.
//!
//! Only the first colon separates the tag; everything after it is data and
//! may itself contain colons (console text, `refid:` values, ...).
//!
//! | tag         | data                                              |
//! |-------------|---------------------------------------------------|
//! | `variables` | `id=names,type,value,scope;` rows                 |
//! | `oc`        | `id|base64###` blocks                             |
//! | `od`        | base64 diagram                                    |
//! | `console`   | raw text                                          |
//! | `threads`   | `name=STATE;` rows                                |
//! | `callstack` | `frame;` rows                                     |
//!
//! Inside a variables row the name field is a `###`-separated alias list
//! and `~` separates nested list items in a primitive value.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::{
    Action, CallstackPayload, CardEntry, ConsolePayload, DiagramPayload, Event, ObjectCardsPayload,
    Payload, ResourceKind, ThreadDescriptor, ThreadState, ThreadsPayload, ValueKind, ValueView,
    VariableEntry, VariablesPayload,
};
use crate::{Error, Result};

const ROW_SEPARATOR: char = ';';
const KEY_VALUE_SEPARATOR: char = '=';
const FIELD_SEPARATOR: char = ',';
const BLOCK_SEPARATOR: &str = "###";
const PAIR_SEPARATOR: char = '|';
const NESTED_LIST_SEPARATOR: char = '~';

/// Python types the bridge renders inline rather than as object cards.
pub const PRIMITIVE_TYPES: [&str; 8] = [
    "int", "float", "str", "bool", "list", "dict", "tuple", "set",
];

/// First bytes of every PNG file.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Decode one legacy frame.
pub fn decode(raw: &str) -> Result<Event> {
    let Some((tag, data)) = raw.split_once(':') else {
        return decode_untagged(raw);
    };

    let payload = match tag {
        "variables" => Payload::Variables(parse_variables(data)),
        "oc" => Payload::ObjectCards(parse_cards(data)),
        "od" => Payload::ClassDiagram(DiagramPayload {
            svg_base64: data.trim().to_string(),
        }),
        "console" => Payload::Console(ConsolePayload {
            text: data.to_string(),
        }),
        "threads" => Payload::Threads(parse_threads(data)),
        "callstack" => Payload::Callstack(CallstackPayload {
            frames: rows(data).map(str::to_string).collect(),
        }),
        other => return Err(Error::Decode(format!("unknown legacy tag `{other}`"))),
    };
    Ok(Event::new(payload))
}

/// The legacy bridge answers `get:cd` with bare base64 and no tag.
///
/// Accepted only when the whole frame decodes and the content is a PNG or
/// SVG/XML markup.
fn decode_untagged(raw: &str) -> Result<Event> {
    let data = raw.trim();
    if data.is_empty() {
        return Err(Error::Decode("empty frame".to_string()));
    }
    let bytes = STANDARD
        .decode(data)
        .map_err(|_| Error::Decode("frame has no tag".to_string()))?;
    let is_png = bytes.starts_with(&PNG_SIGNATURE);
    let is_markup = bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'<');
    if !is_png && !is_markup {
        return Err(Error::Decode(
            "untagged frame is not a diagram".to_string(),
        ));
    }
    Ok(Event::new(Payload::ClassDiagram(DiagramPayload {
        svg_base64: data.to_string(),
    })))
}

/// Non-blank `;`-separated rows.
fn rows(data: &str) -> impl Iterator<Item = &str> {
    data.split(ROW_SEPARATOR)
        .map(str::trim)
        .filter(|row| !row.is_empty())
}

fn parse_variables(data: &str) -> VariablesPayload {
    let variables = rows(data)
        .filter_map(|row| {
            let entry = parse_variable_row(row);
            if entry.is_none() {
                tracing::warn!(%row, "skipping malformed variables row");
            }
            entry
        })
        .collect();
    VariablesPayload { variables }
}

fn parse_variable_row(row: &str) -> Option<VariableEntry> {
    let (id, rest) = row.split_once(KEY_VALUE_SEPARATOR)?;
    let fields: Vec<&str> = rest.split(FIELD_SEPARATOR).collect();
    if fields.len() < 4 || id.trim().is_empty() {
        return None;
    }

    let names = fields[0]
        .split(BLOCK_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    let py_type = fields[1].trim().to_string();
    let scope = fields[fields.len() - 1].trim().to_string();
    // Values may contain commas of their own; everything between type and scope is value.
    let raw = fields[2..fields.len() - 1].join(",");

    let (kind, repr) = if PRIMITIVE_TYPES.contains(&py_type.as_str()) {
        (ValueKind::Primitive, raw.replace(NESTED_LIST_SEPARATOR, ", "))
    } else {
        (ValueKind::Composite, raw)
    };

    Some(VariableEntry {
        names,
        py_type,
        value: ValueView { kind, repr },
        scope,
        id: id.trim().to_string(),
    })
}

fn parse_cards(data: &str) -> ObjectCardsPayload {
    let cards = data
        .split(BLOCK_SEPARATOR)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .filter_map(|block| match block.split_once(PAIR_SEPARATOR) {
            Some((id, base64)) if !id.trim().is_empty() => Some(CardEntry {
                id: id.trim().to_string(),
                svg_base64: base64.trim().to_string(),
            }),
            _ => {
                tracing::warn!(block = %super::preview(block), "skipping malformed object card");
                None
            }
        })
        .collect();
    ObjectCardsPayload { cards }
}

fn parse_threads(data: &str) -> ThreadsPayload {
    let threads = rows(data)
        .map(|row| match row.rsplit_once(KEY_VALUE_SEPARATOR) {
            Some((name, state)) => ThreadDescriptor {
                name: name.trim().to_string(),
                state: ThreadState::parse(state),
            },
            None => ThreadDescriptor {
                name: row.to_string(),
                state: ThreadState::Unknown,
            },
        })
        .collect();
    ThreadsPayload { threads }
}

// ============================================================================
// Outbound
// ============================================================================

/// Resource name the legacy bridge expects after `get:`.
pub fn resource_name(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Threads => "threads",
        ResourceKind::Callstack => "callstack",
        ResourceKind::Variables => "variables",
        ResourceKind::ObjectCards => "oc",
        ResourceKind::ClassDiagram => "cd",
        ResourceKind::Console => "console",
    }
}

fn resource_from_name(name: &str) -> Option<ResourceKind> {
    match name {
        "oc" => Some(ResourceKind::ObjectCards),
        "cd" | "od" => Some(ResourceKind::ClassDiagram),
        other => ResourceKind::parse(other),
    }
}

pub fn encode_action(action: &Action) -> String {
    match action {
        Action::Get(kind) => format!("get:{}", resource_name(*kind)),
        Action::Navigate => "navigate:".to_string(),
        other => match other.argument() {
            Some(argument) => format!("action:{}:{}", other.command(), argument),
            None => format!("action:{}", other.command()),
        },
    }
}

/// Read a legacy outbound frame back into an [`Action`].
pub fn parse_action(raw: &str) -> Option<Action> {
    let (tag, rest) = raw.split_once(':')?;
    match tag {
        "get" => resource_from_name(rest.trim()).map(Action::Get),
        "navigate" => Some(Action::Navigate),
        "action" => match rest.split_once(':') {
            Some(("thread-selected", name)) => Some(Action::ThreadSelected(name.to_string())),
            Some(("console-input", text)) => Some(Action::ConsoleInput(text.to_string())),
            Some(_) => None,
            None => Action::control(rest),
        },
        _ => None,
    }
}
