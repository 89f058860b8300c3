//! Per-field sync status.

use crate::document::{Document, Flag};
use crate::error::DocumentError;
use std::collections::HashMap;
use topsync_protocol::NodeId;

/// Whether a field's latest local edit has been acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldStatus {
    /// No edit sent yet. Mirrored as the absence of any marker.
    #[default]
    Idle,
    /// An edit was sent and no acknowledgment has arrived.
    Syncing,
    /// The server accepted the value.
    Synced,
    /// The server rejected the value.
    Failed,
}

impl FieldStatus {
    /// Status after a local edit is sent. Re-entrant from any state.
    pub fn on_send(self) -> Self {
        FieldStatus::Syncing
    }

    /// Status after a server acknowledgment.
    ///
    /// Applied whatever the current state: the protocol carries no
    /// correlation id, so an ack for a superseded edit still lands.
    pub fn on_ack(self, accepted: bool) -> Self {
        if accepted {
            FieldStatus::Synced
        } else {
            FieldStatus::Failed
        }
    }

    /// Returns true while waiting on the server.
    pub fn is_pending(&self) -> bool {
        matches!(self, FieldStatus::Syncing)
    }
}

/// The flags used to mirror each non-idle status onto an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMarkers {
    /// Flag while syncing.
    pub syncing: Flag,
    /// Flag once accepted.
    pub synced: Flag,
    /// Flag once rejected.
    pub failed: Flag,
}

impl StatusMarkers {
    /// Bare attributes `syncing`, `synced`, `failed`.
    pub fn attributes() -> Self {
        Self {
            syncing: Flag::attribute("syncing"),
            synced: Flag::attribute("synced"),
            failed: Flag::attribute("failed"),
        }
    }

    /// Classes `is-loading`, `is-success`, `is-danger`.
    pub fn classes() -> Self {
        Self {
            syncing: Flag::class("is-loading"),
            synced: Flag::class("is-success"),
            failed: Flag::class("is-danger"),
        }
    }

    /// Returns the flag for a status, or `None` for idle.
    pub fn flag_for(&self, status: FieldStatus) -> Option<&Flag> {
        match status {
            FieldStatus::Idle => None,
            FieldStatus::Syncing => Some(&self.syncing),
            FieldStatus::Synced => Some(&self.synced),
            FieldStatus::Failed => Some(&self.failed),
        }
    }

    /// Writes `status` onto the node, clearing the other two flags.
    pub fn apply<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        id: &NodeId,
        status: FieldStatus,
    ) -> Result<(), DocumentError> {
        for (flag, owner) in [
            (&self.syncing, FieldStatus::Syncing),
            (&self.synced, FieldStatus::Synced),
            (&self.failed, FieldStatus::Failed),
        ] {
            doc.set_flag(id, flag, owner == status)?;
        }
        Ok(())
    }
}

impl Default for StatusMarkers {
    fn default() -> Self {
        Self::attributes()
    }
}

/// Tracks the status of every field that has been edited.
///
/// Fields without an entry are idle.
#[derive(Debug, Default)]
pub struct FieldTracker {
    fields: HashMap<NodeId, FieldStatus>,
}

impl FieldTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status of a field.
    pub fn status(&self, id: &NodeId) -> FieldStatus {
        self.fields.get(id).copied().unwrap_or_default()
    }

    /// Records that an edit for `id` was sent. Returns the new status.
    pub fn begin_sync(&mut self, id: &NodeId) -> FieldStatus {
        let entry = self.fields.entry(id.clone()).or_default();
        *entry = entry.on_send();
        *entry
    }

    /// Records a server acknowledgment. Returns the new status.
    pub fn acknowledge(&mut self, id: &NodeId, accepted: bool) -> FieldStatus {
        let entry = self.fields.entry(id.clone()).or_default();
        *entry = entry.on_ack(accepted);
        *entry
    }

    /// Drops a field's entry.
    pub fn forget(&mut self, id: &NodeId) -> Option<FieldStatus> {
        self.fields.remove(id)
    }

    /// Keeps only the fields for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&NodeId) -> bool) {
        self.fields.retain(|id, _| keep(id));
    }

    /// Iterates over tracked fields and their status.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, FieldStatus)> {
        self.fields.iter().map(|(id, status)| (id, *status))
    }

    /// Number of tracked fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is tracked.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields waiting on the server.
    pub fn pending(&self) -> usize {
        self.fields.values().filter(|s| s.is_pending()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        assert_eq!(FieldStatus::Idle.on_send(), FieldStatus::Syncing);
        assert_eq!(FieldStatus::Synced.on_send(), FieldStatus::Syncing);
        assert_eq!(FieldStatus::Failed.on_send(), FieldStatus::Syncing);
        assert_eq!(FieldStatus::Syncing.on_ack(true), FieldStatus::Synced);
        assert_eq!(FieldStatus::Syncing.on_ack(false), FieldStatus::Failed);
    }

    #[test]
    fn tracker_defaults_to_idle() {
        let tracker = FieldTracker::new();
        assert_eq!(tracker.status(&"name".into()), FieldStatus::Idle);
        assert!(tracker.is_empty());
    }

    #[test]
    fn tracker_round_trip() {
        let mut tracker = FieldTracker::new();
        let id = NodeId::from("name");

        assert_eq!(tracker.begin_sync(&id), FieldStatus::Syncing);
        assert_eq!(tracker.pending(), 1);
        assert_eq!(tracker.acknowledge(&id, true), FieldStatus::Synced);
        assert_eq!(tracker.begin_sync(&id), FieldStatus::Syncing);
        assert_eq!(tracker.acknowledge(&id, false), FieldStatus::Failed);
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn acks_for_other_fields_do_not_interfere() {
        let mut tracker = FieldTracker::new();
        tracker.begin_sync(&"a".into());
        tracker.acknowledge(&"b".into(), true);
        assert_eq!(tracker.status(&"a".into()), FieldStatus::Syncing);
    }

    #[test]
    fn retain_and_forget() {
        let mut tracker = FieldTracker::new();
        tracker.begin_sync(&"a".into());
        tracker.begin_sync(&"b".into());
        tracker.retain(|id| id.as_str() != "a");
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.forget(&"b".into()), Some(FieldStatus::Syncing));
        assert!(tracker.is_empty());
    }

    #[test]
    fn marker_lookup() {
        let markers = StatusMarkers::classes();
        assert_eq!(markers.flag_for(FieldStatus::Idle), None);
        assert_eq!(
            markers.flag_for(FieldStatus::Failed),
            Some(&Flag::class("is-danger"))
        );
        assert_eq!(StatusMarkers::default(), StatusMarkers::attributes());
    }
}
