//! Inbound patch instructions.

use crate::error::{ProtocolError, ProtocolResult};
use crate::id::NodeId;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{trace, warn};

/// A server-issued directive describing one document mutation.
///
/// Serializes to the canonical single-key wire form, e.g.
/// `{"replace":{"id":"panel","html":"<p>ok</p>"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Instruction {
    /// Replace the content of the addressed node with new markup.
    Replace {
        /// Target node.
        id: NodeId,
        /// Markup fragment.
        html: String,
    },
    /// Append markup as the last children of the addressed node.
    #[serde(rename = "insert")]
    Append {
        /// Target node.
        id: NodeId,
        /// Markup fragment.
        html: String,
    },
    /// Detach the addressed node from its parent.
    Remove {
        /// Target node.
        id: NodeId,
    },
    /// The server accepted the field's value.
    Valid {
        /// Field identifier.
        id: NodeId,
    },
    /// The server rejected the field's value.
    Invalid {
        /// Field identifier.
        id: NodeId,
    },
    /// Replace the whole view held by the root container.
    NewContent {
        /// Markup fragment.
        content: String,
    },
}

/// Discriminant of an [`Instruction`], as recognized from a wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    /// `replace`, `replaceContent`
    Replace,
    /// `insert`, `append`, `appendContent`
    Append,
    /// `remove`
    Remove,
    /// `valid`, `valueOk`
    Valid,
    /// `invalid`, `valueError`
    Invalid,
    /// `newContent`
    NewContent,
}

/// Recognized tags, in priority order. The first one present in an
/// object decides the instruction; later ones are ignored.
const TAGS: &[(&str, InstructionKind)] = &[
    ("replace", InstructionKind::Replace),
    ("replaceContent", InstructionKind::Replace),
    ("insert", InstructionKind::Append),
    ("append", InstructionKind::Append),
    ("appendContent", InstructionKind::Append),
    ("remove", InstructionKind::Remove),
    ("valid", InstructionKind::Valid),
    ("valueOk", InstructionKind::Valid),
    ("invalid", InstructionKind::Invalid),
    ("valueError", InstructionKind::Invalid),
    ("newContent", InstructionKind::NewContent),
];

/// Fields that may carry the markup fragment.
const MARKUP_FIELDS: &[&str] = &["html", "content", "component"];

const OK_ENVELOPE: &str = "Ok";
const ERR_ENVELOPE: &str = "Err";

impl InstructionKind {
    /// Resolves a wire tag, including legacy aliases.
    pub fn from_tag(tag: &str) -> Option<Self> {
        TAGS.iter().find(|(t, _)| *t == tag).map(|(_, kind)| *kind)
    }

    /// Returns true for instructions that change the document structure.
    pub fn is_structural(&self) -> bool {
        !matches!(self, InstructionKind::Valid | InstructionKind::Invalid)
    }
}

impl Instruction {
    /// Creates a replace instruction.
    pub fn replace(id: impl Into<NodeId>, html: impl Into<String>) -> Self {
        Instruction::Replace {
            id: id.into(),
            html: html.into(),
        }
    }

    /// Creates an append instruction.
    pub fn append(id: impl Into<NodeId>, html: impl Into<String>) -> Self {
        Instruction::Append {
            id: id.into(),
            html: html.into(),
        }
    }

    /// Creates a remove instruction.
    pub fn remove(id: impl Into<NodeId>) -> Self {
        Instruction::Remove { id: id.into() }
    }

    /// Creates a valid acknowledgment.
    pub fn valid(id: impl Into<NodeId>) -> Self {
        Instruction::Valid { id: id.into() }
    }

    /// Creates an invalid rejection.
    pub fn invalid(id: impl Into<NodeId>) -> Self {
        Instruction::Invalid { id: id.into() }
    }

    /// Creates a full-view refresh.
    pub fn new_content(content: impl Into<String>) -> Self {
        Instruction::NewContent {
            content: content.into(),
        }
    }

    /// Returns the instruction kind.
    pub fn kind(&self) -> InstructionKind {
        match self {
            Instruction::Replace { .. } => InstructionKind::Replace,
            Instruction::Append { .. } => InstructionKind::Append,
            Instruction::Remove { .. } => InstructionKind::Remove,
            Instruction::Valid { .. } => InstructionKind::Valid,
            Instruction::Invalid { .. } => InstructionKind::Invalid,
            Instruction::NewContent { .. } => InstructionKind::NewContent,
        }
    }

    /// Returns the addressed node, if the instruction has one.
    ///
    /// `NewContent` targets the root container, which is a client setting.
    pub fn target(&self) -> Option<&NodeId> {
        match self {
            Instruction::Replace { id, .. }
            | Instruction::Append { id, .. }
            | Instruction::Remove { id }
            | Instruction::Valid { id }
            | Instruction::Invalid { id } => Some(id),
            Instruction::NewContent { .. } => None,
        }
    }

    /// Encodes to a single-object JSON text frame.
    pub fn encode(&self) -> ProtocolResult<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

/// Encodes a batch of instructions as a JSON array.
pub fn encode_instructions(instructions: &[Instruction]) -> ProtocolResult<String> {
    serde_json::to_string(instructions).map_err(ProtocolError::Encode)
}

/// Decodes an inbound message into zero or more instructions.
///
/// Accepted shapes:
/// - a single object: `{"remove":{"id":"a"}}`
/// - an array of objects, decoded in order
/// - an envelope `{"Ok": ...}` or `{"Err": ...}` around either of the above;
///   inside `Err`, every entry carrying an `id` is a rejection of that field
///
/// Unknown tags are ignored. An entry with a recognized tag but an unusable
/// payload is logged and skipped. Only malformed JSON, or a top-level value
/// that is neither an object nor an array, fails the whole message.
pub fn decode_instructions(raw: &str) -> ProtocolResult<Vec<Instruction>> {
    let value: Value = serde_json::from_str(raw).map_err(ProtocolError::Malformed)?;
    let mut instructions = Vec::new();
    decode_value(&value, Envelope::Ok, &mut instructions)?;
    Ok(instructions)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Envelope {
    Ok,
    Err,
}

fn decode_value(value: &Value, envelope: Envelope, out: &mut Vec<Instruction>) -> ProtocolResult<()> {
    match value {
        Value::Object(map) => {
            decode_object(map, envelope, out);
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(map) => decode_object(map, envelope, out),
                    other => warn!(kind = shape_name(other), "skipping non-object batch entry"),
                }
            }
            Ok(())
        }
        other => Err(ProtocolError::UnexpectedShape(shape_name(other).into())),
    }
}

fn decode_object(map: &Map<String, Value>, envelope: Envelope, out: &mut Vec<Instruction>) {
    for (key, nested) in [(OK_ENVELOPE, Envelope::Ok), (ERR_ENVELOPE, Envelope::Err)] {
        if let Some(inner) = map.get(key) {
            if let Err(e) = decode_value(inner, nested, out) {
                warn!(envelope = key, error = %e, "skipping envelope");
            }
            return;
        }
    }

    match envelope {
        Envelope::Ok => match decode_entry(map) {
            Some(Ok(instruction)) => out.push(instruction),
            Some(Err(e)) => warn!(error = %e, "skipping instruction"),
            None => trace!(keys = ?map.keys().collect::<Vec<_>>(), "no recognized tag"),
        },
        Envelope::Err => decode_rejections(map, out),
    }
}

fn decode_entry(map: &Map<String, Value>) -> Option<ProtocolResult<Instruction>> {
    let (tag, kind, payload) = TAGS
        .iter()
        .find_map(|(tag, kind)| map.get(*tag).map(|payload| (*tag, *kind, payload)))?;
    Some(build(tag, kind, payload))
}

fn build(tag: &str, kind: InstructionKind, payload: &Value) -> ProtocolResult<Instruction> {
    let fields = payload
        .as_object()
        .ok_or_else(|| ProtocolError::invalid_payload(tag, "expected object"))?;

    let instruction = match kind {
        InstructionKind::Replace => Instruction::Replace {
            id: node_id(tag, fields)?,
            html: markup(tag, fields)?,
        },
        InstructionKind::Append => Instruction::Append {
            id: node_id(tag, fields)?,
            html: markup(tag, fields)?,
        },
        InstructionKind::Remove => Instruction::Remove {
            id: node_id(tag, fields)?,
        },
        InstructionKind::Valid => Instruction::Valid {
            id: node_id(tag, fields)?,
        },
        InstructionKind::Invalid => Instruction::Invalid {
            id: node_id(tag, fields)?,
        },
        InstructionKind::NewContent => Instruction::NewContent {
            content: markup(tag, fields)?,
        },
    };
    Ok(instruction)
}

fn decode_rejections(map: &Map<String, Value>, out: &mut Vec<Instruction>) {
    for (tag, payload) in map {
        match payload.as_object().map(|fields| node_id(tag, fields)) {
            Some(Ok(id)) => out.push(Instruction::Invalid { id }),
            Some(Err(e)) => warn!(error = %e, "skipping rejection"),
            None => warn!(tag = %tag, "skipping rejection without payload object"),
        }
    }
}

fn node_id(tag: &str, fields: &Map<String, Value>) -> ProtocolResult<NodeId> {
    match fields.get("id") {
        Some(Value::String(id)) => Ok(NodeId::new(id.as_str())),
        Some(other) => Err(ProtocolError::invalid_payload(
            tag,
            format!("id must be a string, got {}", shape_name(other)),
        )),
        None => Err(ProtocolError::invalid_payload(tag, "missing id")),
    }
}

fn markup(tag: &str, fields: &Map<String, Value>) -> ProtocolResult<String> {
    let (field, value) = MARKUP_FIELDS
        .iter()
        .find_map(|f| fields.get(*f).map(|v| (*f, v)))
        .ok_or_else(|| ProtocolError::invalid_payload(tag, "missing markup"))?;

    value.as_str().map(str::to_string).ok_or_else(|| {
        ProtocolError::invalid_payload(
            tag,
            format!("`{field}` must be a string, got {}", shape_name(value)),
        )
    })
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
