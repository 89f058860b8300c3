//! Decode command implementation.

use serde::Serialize;
use std::io::BufRead;
use topsync_protocol::{decode_instructions, Instruction};

/// One decoded input line.
#[derive(Debug, Serialize)]
pub struct DecodedLine {
    /// 1-based input line number.
    pub line: usize,
    /// Decoded instructions, in order.
    pub instructions: Vec<Instruction>,
    /// Decode error, if the whole message was dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the decode command.
pub fn run(format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    for (index, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let decoded = decode_line(index + 1, &line);
        match format {
            "json" => println!("{}", serde_json::to_string(&decoded)?),
            _ => print_text(&decoded),
        }
    }
    Ok(())
}

fn decode_line(line: usize, raw: &str) -> DecodedLine {
    match decode_instructions(raw) {
        Ok(instructions) => DecodedLine {
            line,
            instructions,
            error: None,
        },
        Err(e) => DecodedLine {
            line,
            instructions: Vec::new(),
            error: Some(e.to_string()),
        },
    }
}

fn print_text(decoded: &DecodedLine) {
    if let Some(error) = &decoded.error {
        println!("{:>4}: error: {error}", decoded.line);
        return;
    }
    if decoded.instructions.is_empty() {
        println!("{:>4}: (no instructions)", decoded.line);
    }
    for instruction in &decoded.instructions {
        println!("{:>4}: {}", decoded.line, describe(instruction));
    }
}

fn describe(instruction: &Instruction) -> String {
    match instruction {
        Instruction::Replace { id, html } => format!("replace  #{id} <- {html}"),
        Instruction::Append { id, html } => format!("append   #{id} += {html}"),
        Instruction::Remove { id } => format!("remove   #{id}"),
        Instruction::Valid { id } => format!("valid    #{id}"),
        Instruction::Invalid { id } => format!("invalid  #{id}"),
        Instruction::NewContent { content } => format!("content  <- {content}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_reports_errors() {
        let ok = decode_line(1, r#"[{"remove":{"id":"a"}},{"valueOk":{"id":"b"}}]"#);
        assert_eq!(
            ok.instructions,
            vec![Instruction::remove("a"), Instruction::valid("b")]
        );
        assert!(ok.error.is_none());

        let bad = decode_line(2, "{oops");
        assert!(bad.instructions.is_empty());
        assert!(bad.error.is_some());
    }

    #[test]
    fn json_output_shape() {
        let decoded = decode_line(3, r#"{"insert":{"id":"list","html":"<li>1</li>"}}"#);
        assert_eq!(
            serde_json::to_string(&decoded).unwrap(),
            r#"{"line":3,"instructions":[{"insert":{"id":"list","html":"<li>1</li>"}}]}"#
        );
    }

    #[test]
    fn text_descriptions() {
        assert_eq!(describe(&Instruction::remove("a")), "remove   #a");
        assert_eq!(
            describe(&Instruction::replace("p", "<b></b>")),
            "replace  #p <- <b></b>"
        );
    }
}
