//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::Rng;
use topsync_protocol::{encode_instructions, Instruction};

/// Markup for a form with `fields` inputs (`f0`, `f1`, ...) and a panel.
pub fn form_markup(fields: usize) -> String {
    let mut markup = String::from(r#"<form id="form">"#);
    for i in 0..fields {
        markup.push_str(&format!(r#"<label>Field {i}<input id="f{i}" type="text"></label>"#));
    }
    markup.push_str(r#"<div id="panel"><p>idle</p></div></form>"#);
    markup
}

/// A random table fragment with `rows` rows, as a server would render it.
pub fn random_table(rows: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut markup = String::from("<table><tbody>");
    for i in 0..rows {
        let value: u32 = rng.gen_range(0..100_000);
        markup.push_str(&format!(r#"<tr id="r{i}"><td>{i}</td><td class="num">{value}</td></tr>"#));
    }
    markup.push_str("</tbody></table>");
    markup
}

/// An inbound message acknowledging `count` random fields of a
/// [`form_markup`] form.
pub fn ack_message(fields: usize, count: usize) -> String {
    let mut rng = rand::thread_rng();
    let instructions: Vec<Instruction> = (0..count)
        .map(|_| {
            let id = format!("f{}", rng.gen_range(0..fields.max(1)));
            if rng.gen_bool(0.8) {
                Instruction::valid(id)
            } else {
                Instruction::invalid(id)
            }
        })
        .collect();
    encode_instructions(&instructions).unwrap_or_default()
}
