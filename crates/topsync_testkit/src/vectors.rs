//! Wire test vectors.
//!
//! Shared with the browser bindings and any server implementation so every
//! side agrees on the accepted message shapes. `expected` holds the
//! canonical re-encoding of what `input` decodes to.

use serde::{Deserialize, Serialize};

/// A wire-format test vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Raw message text.
    pub input: String,
    /// Canonical encoding of the decoded value.
    pub expected: Option<String>,
    /// Expected error kind (if this should fail).
    pub expected_error: Option<String>,
}

impl WireVector {
    fn ok(id: &str, description: &str, input: &str, expected: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            input: input.into(),
            expected: Some(expected.into()),
            expected_error: None,
        }
    }

    fn err(id: &str, description: &str, input: &str, error: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            input: input.into(),
            expected: None,
            expected_error: Some(error.into()),
        }
    }
}

/// Inbound message vectors. `expected` is a JSON array of canonical
/// instructions.
pub fn inbound_vectors() -> Vec<WireVector> {
    vec![
        WireVector::ok(
            "in_replace",
            "single replace object",
            r#"{"replace":{"id":"panel","html":"<p>ok</p>"}}"#,
            r#"[{"replace":{"id":"panel","html":"<p>ok</p>"}}]"#,
        ),
        WireVector::ok(
            "in_replace_content_alias",
            "replaceContent with a content field",
            r#"{"replaceContent":{"id":"panel","content":"<b>x</b>"}}"#,
            r#"[{"replace":{"id":"panel","html":"<b>x</b>"}}]"#,
        ),
        WireVector::ok(
            "in_insert",
            "insert appends",
            r#"{"insert":{"id":"list","html":"<li>1</li>"}}"#,
            r#"[{"insert":{"id":"list","html":"<li>1</li>"}}]"#,
        ),
        WireVector::ok(
            "in_append_component",
            "appendContent with a component field",
            r#"{"appendContent":{"id":"list","component":"<li>2</li>"}}"#,
            r#"[{"insert":{"id":"list","html":"<li>2</li>"}}]"#,
        ),
        WireVector::ok(
            "in_remove",
            "remove",
            r#"{"remove":{"id":"a"}}"#,
            r#"[{"remove":{"id":"a"}}]"#,
        ),
        WireVector::ok(
            "in_value_aliases",
            "valueOk and valueError aliases",
            r#"[{"valueOk":{"id":"a"}},{"valueError":{"id":"b"}}]"#,
            r#"[{"valid":{"id":"a"}},{"invalid":{"id":"b"}}]"#,
        ),
        WireVector::ok(
            "in_new_content",
            "full view refresh",
            r#"{"newContent":{"content":"<form id=\"f\"></form>"}}"#,
            r#"[{"newContent":{"content":"<form id=\"f\"></form>"}}]"#,
        ),
        WireVector::ok(
            "in_array_order",
            "array entries keep their order",
            r#"[{"valid":{"id":"a"}},{"invalid":{"id":"a"}}]"#,
            r#"[{"valid":{"id":"a"}},{"invalid":{"id":"a"}}]"#,
        ),
        WireVector::ok(
            "in_ok_envelope",
            "Ok envelope around an array",
            r#"{"Ok":[{"remove":{"id":"a"}},{"valid":{"id":"b"}}]}"#,
            r#"[{"remove":{"id":"a"}},{"valid":{"id":"b"}}]"#,
        ),
        WireVector::ok(
            "in_err_envelope",
            "Err envelope rejects every addressed field",
            r#"{"Err":{"age":{"id":"age"}}}"#,
            r#"[{"invalid":{"id":"age"}}]"#,
        ),
        WireVector::ok(
            "in_unknown_tag",
            "unknown tags are ignored",
            r#"{"ping":{}}"#,
            "[]",
        ),
        WireVector::ok(
            "in_tag_priority",
            "replace wins over remove in one object",
            r#"{"remove":{"id":"a"},"replace":{"id":"b","html":""}}"#,
            r#"[{"replace":{"id":"b","html":""}}]"#,
        ),
        WireVector::ok(
            "in_bad_entry_skipped",
            "entry without id is skipped, the rest applies",
            r#"[{"remove":{}},{"remove":{"id":"c"}}]"#,
            r#"[{"remove":{"id":"c"}}]"#,
        ),
        WireVector::ok("in_empty_array", "empty batch", "[]", "[]"),
        WireVector::err("in_malformed", "truncated JSON", r#"{"remove":"#, "malformed"),
        WireVector::err("in_scalar", "top-level string", r#""hello""#, "shape"),
        WireVector::err("in_null", "top-level null", "null", "shape"),
    ]
}

/// Outbound action vectors. `expected` is the canonical action encoding.
pub fn outbound_vectors() -> Vec<WireVector> {
    vec![
        WireVector::ok(
            "out_update",
            "field update",
            r#"{"update":{"id":"name","value":"Alice"}}"#,
            r#"{"update":{"id":"name","value":"Alice"}}"#,
        ),
        WireVector::ok(
            "out_update_escapes",
            "quotes and non-ASCII survive",
            r#"{"update":{"id":"q","value":"say \"hi\" – ok"}}"#,
            r#"{"update":{"id":"q","value":"say \"hi\" – ok"}}"#,
        ),
        WireVector::ok(
            "out_press",
            "button press",
            r#"{"press":{"id":"submit"}}"#,
            r#"{"press":{"id":"submit"}}"#,
        ),
        WireVector::err(
            "out_update_missing_value",
            "update without value",
            r#"{"update":{"id":"name"}}"#,
            "malformed",
        ),
    ]
}

#[derive(Debug, Serialize, Deserialize)]
struct AllWireVectors {
    inbound: Vec<WireVector>,
    outbound: Vec<WireVector>,
}

/// Exports all vectors as pretty JSON.
pub fn all_vectors_json() -> String {
    let vectors = AllWireVectors {
        inbound: inbound_vectors(),
        outbound: outbound_vectors(),
    };
    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[cfg(test)]
mod tests {
    use super::*;
    use topsync_protocol::{decode_instructions, encode_instructions, Action, ProtocolError};

    #[test]
    fn test_inbound_vectors() {
        for vector in inbound_vectors() {
            let result = decode_instructions(&vector.input);
            match (&vector.expected, &vector.expected_error) {
                (Some(expected), None) => {
                    let decoded = result.unwrap_or_else(|e| panic!("{}: {e}", vector.id));
                    assert_eq!(
                        &encode_instructions(&decoded).unwrap(),
                        expected,
                        "Vector {} failed: {}",
                        vector.id,
                        vector.description
                    );
                }
                (None, Some(kind)) => {
                    let err = result.expect_err(&vector.id);
                    let matches = match kind.as_str() {
                        "malformed" => matches!(err, ProtocolError::Malformed(_)),
                        "shape" => matches!(err, ProtocolError::UnexpectedShape(_)),
                        _ => false,
                    };
                    assert!(matches, "Vector {} failed: got {err:?}", vector.id);
                }
                _ => panic!("Vector {} is ill-formed", vector.id),
            }
        }
    }

    #[test]
    fn test_outbound_vectors() {
        for vector in outbound_vectors() {
            let result = Action::decode(&vector.input);
            match &vector.expected {
                Some(expected) => {
                    let action = result.unwrap_or_else(|e| panic!("{}: {e}", vector.id));
                    assert_eq!(&action.encode().unwrap(), expected, "Vector {}", vector.id);
                }
                None => assert!(result.is_err(), "Vector {} should fail", vector.id),
            }
        }
    }

    #[test]
    fn test_all_vectors_json() {
        let json = all_vectors_json();
        assert!(json.contains("inbound"));
        assert!(json.contains("in_err_envelope"));
    }
}
