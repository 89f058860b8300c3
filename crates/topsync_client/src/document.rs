//! The document capability the client mutates.

use crate::error::DocumentError;
use topsync_protocol::NodeId;

/// A boolean marker on an element: a bare attribute or a class name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// An attribute present without a value, e.g. `<input syncing>`.
    Attribute(String),
    /// A token in the `class` attribute.
    Class(String),
}

impl Flag {
    /// Creates an attribute flag.
    pub fn attribute(name: impl Into<String>) -> Self {
        Flag::Attribute(name.into())
    }

    /// Creates a class flag.
    pub fn class(name: impl Into<String>) -> Self {
        Flag::Class(name.into())
    }
}

/// A live document tree addressed by unique node identifiers.
///
/// Every method that takes an id returns
/// [`DocumentError::TargetMissing`] when the node does not resolve, and
/// leaves the document unchanged in that case. Markup is parsed by the
/// document; the client never inspects it.
pub trait Document {
    /// Returns true if a node with this id is in the document.
    fn contains(&self, id: &NodeId) -> bool;

    /// Replaces the node's children with the parsed fragment.
    fn replace_children(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError>;

    /// Replaces the node itself with the parsed fragment, keeping its siblings.
    fn replace_node(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError>;

    /// Appends the parsed fragment as the node's last children.
    fn append_children(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError>;

    /// Detaches the node from its parent.
    fn remove_node(&mut self, id: &NodeId) -> Result<(), DocumentError>;

    /// Sets or clears a flag on the node.
    fn set_flag(&mut self, id: &NodeId, flag: &Flag, present: bool) -> Result<(), DocumentError>;
}

impl<D: Document + ?Sized> Document for &mut D {
    fn contains(&self, id: &NodeId) -> bool {
        (**self).contains(id)
    }

    fn replace_children(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError> {
        (**self).replace_children(id, markup)
    }

    fn replace_node(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError> {
        (**self).replace_node(id, markup)
    }

    fn append_children(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError> {
        (**self).append_children(id, markup)
    }

    fn remove_node(&mut self, id: &NodeId) -> Result<(), DocumentError> {
        (**self).remove_node(id)
    }

    fn set_flag(&mut self, id: &NodeId, flag: &Flag, present: bool) -> Result<(), DocumentError> {
        (**self).set_flag(id, flag, present)
    }
}
