//! Property-based test generators using proptest.
//!
//! Ids are drawn from a small pool so generated instructions hit the nodes
//! of [`FORM_MARKUP`](crate::fixtures::FORM_MARKUP) often enough to matter.

use proptest::prelude::*;
use topsync_protocol::{Action, Instruction, NodeId};

/// Ids present in the standard test form.
pub const FORM_IDS: &[&str] = &["form", "a", "b", "c", "panel", "list"];

/// Ids that may or may not be present.
pub const ANY_IDS: &[&str] = &["form", "a", "b", "c", "panel", "list", "ghost", "gone"];

const SPAN_IDS: &[&str] = &["x", "y", "z"];

/// Strategy for arbitrary well-formed node ids.
pub fn node_id_strategy() -> impl Strategy<Value = NodeId> {
    prop::string::string_regex("[a-z][a-z0-9_-]{0,15}")
        .expect("Invalid regex")
        .prop_map(NodeId::new)
}

/// Strategy for ids drawn from [`ANY_IDS`].
pub fn pooled_id_strategy() -> impl Strategy<Value = NodeId> {
    prop::sample::select(ANY_IDS).prop_map(NodeId::from)
}

/// Strategy for field values, including quotes, backslashes and non-ASCII.
pub fn field_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::string::string_regex("[a-zA-Z0-9 ]{0,24}").expect("Invalid regex"),
        1 => any::<String>(),
        1 => Just(r#"say "hi" \ bye"#.to_string()),
    ]
}

/// Strategy for outbound actions.
pub fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (node_id_strategy(), field_value_strategy())
            .prop_map(|(id, value)| Action::Update { id, value }),
        1 => node_id_strategy().prop_map(|id| Action::Press { id }),
    ]
}

/// Strategy for small well-formed markup fragments.
pub fn markup_strategy() -> impl Strategy<Value = String> {
    let text = || prop::string::string_regex("[a-z ]{0,8}").expect("Invalid regex");
    prop_oneof![
        text(),
        text().prop_map(|t| format!("<p>{t}</p>")),
        (prop::sample::select(SPAN_IDS), text())
            .prop_map(|(id, t)| format!(r#"<span id="{id}">{t}</span>"#)),
        Just(r#"<input id="n"><br>"#.to_string()),
    ]
}

/// Strategy for inbound instructions over [`ANY_IDS`].
pub fn instruction_strategy() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        2 => (pooled_id_strategy(), markup_strategy())
            .prop_map(|(id, html)| Instruction::Replace { id, html }),
        2 => (pooled_id_strategy(), markup_strategy())
            .prop_map(|(id, html)| Instruction::Append { id, html }),
        2 => pooled_id_strategy().prop_map(|id| Instruction::Remove { id }),
        2 => pooled_id_strategy().prop_map(|id| Instruction::Valid { id }),
        2 => pooled_id_strategy().prop_map(|id| Instruction::Invalid { id }),
        1 => markup_strategy().prop_map(|content| Instruction::NewContent { content }),
    ]
}

/// Strategy for a batch of instructions, as carried by one array message.
pub fn instruction_batch_strategy(
    min: usize,
    max: usize,
) -> impl Strategy<Value = Vec<Instruction>> {
    prop::collection::vec(instruction_strategy(), min..max)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn node_ids_are_non_empty(id in node_id_strategy()) {
            prop_assert!(!id.as_str().is_empty());
        }

        #[test]
        fn batches_respect_bounds(batch in instruction_batch_strategy(1, 5)) {
            prop_assert!((1..5).contains(&batch.len()));
        }
    }
}
