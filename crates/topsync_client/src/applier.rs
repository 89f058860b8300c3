//! Applies structural patch instructions to a document.

use crate::config::{ClientConfig, ReplaceMode};
use crate::document::Document;
use crate::error::{SyncError, SyncResult};
use topsync_protocol::{Instruction, NodeId};

/// Applies `replace`, `append`, `remove` and `newContent` instructions.
///
/// Every operation is idempotent under node absence: a missing target
/// yields [`DocumentError::TargetMissing`](crate::DocumentError::TargetMissing)
/// and leaves the document untouched. Status acknowledgments are not
/// structural and are rejected here; the client routes them to the
/// field tracker.
#[derive(Debug, Clone)]
pub struct PatchApplier {
    root_id: NodeId,
    replace_mode: ReplaceMode,
}

impl PatchApplier {
    /// Creates an applier.
    pub fn new(root_id: impl Into<NodeId>, replace_mode: ReplaceMode) -> Self {
        Self {
            root_id: root_id.into(),
            replace_mode,
        }
    }

    /// Creates an applier from client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.root_id.as_str(), config.replace_mode)
    }

    /// Returns the root container id.
    pub fn root_id(&self) -> &NodeId {
        &self.root_id
    }

    /// Applies one instruction.
    pub fn apply<D: Document + ?Sized>(&self, doc: &mut D, instruction: &Instruction) -> SyncResult<()> {
        match instruction {
            Instruction::Replace { id, html } => match self.replace_mode {
                ReplaceMode::Inner => doc.replace_children(id, html)?,
                ReplaceMode::Outer => doc.replace_node(id, html)?,
            },
            Instruction::Append { id, html } => doc.append_children(id, html)?,
            Instruction::Remove { id } => doc.remove_node(id)?,
            Instruction::NewContent { content } => doc.replace_children(&self.root_id, content)?,
            Instruction::Valid { .. } | Instruction::Invalid { .. } => {
                return Err(SyncError::Config(format!(
                    "{:?} is not a structural instruction",
                    instruction.kind()
                )))
            }
        }
        Ok(())
    }

    /// Applies a batch in order, continuing past failed instructions.
    ///
    /// Returns the errors of the instructions that were skipped.
    pub fn apply_all<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        instructions: &[Instruction],
    ) -> Vec<SyncError> {
        instructions
            .iter()
            .filter_map(|instruction| self.apply(doc, instruction).err())
            .collect()
    }
}

impl Default for PatchApplier {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ROOT_ID, ReplaceMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    fn doc(markup: &str) -> MemoryDocument {
        MemoryDocument::from_markup(markup).unwrap()
    }

    #[test]
    fn replace_inner() {
        let mut d = doc(r#"<div id="panel"><span>old</span></div><p id="after"></p>"#);
        PatchApplier::default()
            .apply(&mut d, &Instruction::replace("panel", "<p>ok</p>"))
            .unwrap();
        assert_eq!(d.inner_html("panel").unwrap(), "<p>ok</p>");
        assert!(d.contains(&"after".into()));
    }

    #[test]
    fn replace_outer() {
        let mut d = doc(r#"<i></i><div id="panel">old</div><b></b>"#);
        let applier = PatchApplier::new("root", ReplaceMode::Outer);
        applier
            .apply(&mut d, &Instruction::replace("panel", r#"<div id="panel2">new</div>"#))
            .unwrap();
        assert_eq!(d.to_html(), r#"<i></i><div id="panel2">new</div><b></b>"#);
    }

    #[test]
    fn append_as_last_child() {
        let mut d = doc(r#"<ul id="list"><li>1</li></ul>"#);
        PatchApplier::default()
            .apply(&mut d, &Instruction::append("list", "<li>2</li><li>3</li>"))
            .unwrap();
        assert_eq!(d.inner_html("list").unwrap(), "<li>1</li><li>2</li><li>3</li>");
    }

    #[test]
    fn remove_is_idempotent() {
        let mut d = doc(r#"<div id="a"></div><div id="b"></div>"#);
        let applier = PatchApplier::default();
        let remove = Instruction::remove("a");

        applier.apply(&mut d, &remove).unwrap();
        let after_first = d.clone();
        let err = applier.apply(&mut d, &remove).unwrap_err();
        assert!(err.is_target_missing());
        assert_eq!(d, after_first);
    }

    #[test]
    fn missing_targets_are_no_ops() {
        let mut d = doc(r#"<div id="a">x</div>"#);
        let before = d.clone();
        let applier = PatchApplier::default();
        for instruction in [
            Instruction::replace("ghost", "<p></p>"),
            Instruction::append("ghost", "<p></p>"),
            Instruction::remove("ghost"),
            Instruction::new_content("<p></p>"),
        ] {
            assert!(applier.apply(&mut d, &instruction).unwrap_err().is_target_missing());
        }
        assert_eq!(d, before);
    }

    #[test]
    fn new_content_replaces_root() {
        let mut d = MemoryDocument::new("app");
        let applier = PatchApplier::new("app", ReplaceMode::Inner);
        applier
            .apply(&mut d, &Instruction::new_content(r#"<form id="f"></form>"#))
            .unwrap();
        applier
            .apply(&mut d, &Instruction::new_content(r#"<form id="g"></form>"#))
            .unwrap();
        assert_eq!(d.inner_html("app").unwrap(), r#"<form id="g"></form>"#);
    }

    #[test]
    fn status_instructions_are_not_structural() {
        let mut d = MemoryDocument::default();
        assert!(PatchApplier::default()
            .apply(&mut d, &Instruction::valid("x"))
            .is_err());
    }

    #[test]
    fn batch_continues_past_failures() {
        let mut d = doc(r#"<div id="a"></div>"#);
        let errors = PatchApplier::default().apply_all(
            &mut d,
            &[
                Instruction::remove("ghost"),
                Instruction::append("a", "<b>1</b>"),
                Instruction::append("a", "<b>2</b>"),
            ],
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(d.inner_html("a").unwrap(), "<b>1</b><b>2</b>");
    }
}
