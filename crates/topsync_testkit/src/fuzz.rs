//! Fuzz targets for the client.
//!
//! Each target takes arbitrary bytes and must never panic. They can be
//! driven by cargo-fuzz or by proptest.

use crate::fixtures::Harness;
use topsync_client::parse_fragment;
use topsync_protocol::{decode_instructions, Action};

/// Fuzz target for inbound message decoding.
pub fn fuzz_decode(data: &[u8]) {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = decode_instructions(text);
    }
}

/// Fuzz target for outbound action decoding and re-encoding.
pub fn fuzz_action_roundtrip(data: &[u8]) {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(action) = Action::decode(text) {
        let encoded = action.encode().expect("Decoded action must encode");
        let decoded = Action::decode(&encoded).expect("Encoded action must decode");
        assert_eq!(action, decoded, "Roundtrip mismatch");
    }
}

/// Fuzz target for the markup parser.
pub fn fuzz_markup(data: &[u8]) {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_fragment(text);
    }
}

/// Fuzz target feeding arbitrary lines to a connected client.
///
/// Each line of the input is delivered as one inbound message.
pub fn fuzz_client_messages(data: &[u8]) {
    let mut harness = Harness::connected();
    for line in String::from_utf8_lossy(data).lines() {
        harness.receive(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_survive_samples() {
        let samples: &[&[u8]] = &[
            b"",
            b"{",
            b"[1,2,3]",
            br#"{"Err":{"Ok":{"Err":[]}}}"#,
            br#"{"replace":{"id":"panel","html":"<p><b></p>"}}"#,
            r#"{"update":{"id":"x","value":"é"}}"#.as_bytes(),
            b"<div id=\"a\"><<</div>",
            &[0xff, 0xfe, 0x00],
        ];
        for sample in samples {
            fuzz_decode(sample);
            fuzz_action_roundtrip(sample);
            fuzz_markup(sample);
            fuzz_client_messages(sample);
        }
    }
}
