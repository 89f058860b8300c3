//! Outbound user actions.

use crate::error::{ProtocolError, ProtocolResult};
use crate::id::NodeId;
use serde::{Deserialize, Serialize};

/// A user action sent from the client to the server.
///
/// Exactly one top-level key distinguishes the kind on the wire:
/// `update` for field edits, `press` for button presses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// The value of an editable field changed.
    Update {
        /// Field identifier.
        id: NodeId,
        /// The new value, as the input reports it.
        value: String,
    },
    /// A button was pressed.
    Press {
        /// Button identifier.
        id: NodeId,
    },
}

impl Action {
    /// Creates a field update.
    pub fn update(id: impl Into<NodeId>, value: impl Into<String>) -> Self {
        Action::Update {
            id: id.into(),
            value: value.into(),
        }
    }

    /// Creates a button press.
    pub fn press(id: impl Into<NodeId>) -> Self {
        Action::Press { id: id.into() }
    }

    /// Returns the addressed element.
    pub fn id(&self) -> &NodeId {
        match self {
            Action::Update { id, .. } | Action::Press { id } => id,
        }
    }

    /// Returns the wire tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Action::Update { .. } => "update",
            Action::Press { .. } => "press",
        }
    }

    /// Encodes to a JSON text frame.
    pub fn encode(&self) -> ProtocolResult<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Decodes a JSON text frame.
    ///
    /// This is the server-side view of the codec, used by mock and test servers.
    pub fn decode(raw: &str) -> ProtocolResult<Self> {
        serde_json::from_str(raw).map_err(ProtocolError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_wire_format() {
        let action = Action::update("name", "Alice");
        assert_eq!(
            action.encode().unwrap(),
            r#"{"update":{"id":"name","value":"Alice"}}"#
        );
    }

    #[test]
    fn press_wire_format() {
        let action = Action::press("submit");
        assert_eq!(action.encode().unwrap(), r#"{"press":{"id":"submit"}}"#);
    }

    #[test]
    fn update_roundtrip_preserves_id_and_value() {
        let action = Action::update("x", "y");
        let decoded = Action::decode(&action.encode().unwrap()).unwrap();
        match decoded {
            Action::Update { id, value } => {
                assert_eq!(id.as_str(), "x");
                assert_eq!(value, "y");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn value_escaping() {
        let action = Action::update("f", "line\n\"quoted\"");
        let decoded = Action::decode(&action.encode().unwrap()).unwrap();
        assert_eq!(decoded, action);
    }

    #[test]
    fn decode_rejects_unknown_kind() {
        assert!(Action::decode(r#"{"drag":{"id":"a"}}"#).is_err());
        assert!(Action::decode("not json").is_err());
    }

    #[test]
    fn accessors() {
        assert_eq!(Action::press("b").id().as_str(), "b");
        assert_eq!(Action::press("b").tag(), "press");
        assert_eq!(Action::update("f", "").tag(), "update");
    }
}
