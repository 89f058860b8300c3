//! The browser DOM as a [`Document`].

use topsync_client::{Document, DocumentError, Flag};
use topsync_protocol::NodeId;
use wasm_bindgen::JsValue;
use web_sys::Element;

/// A [`Document`] backed by a `web_sys::Document`.
///
/// Markup is parsed by the browser. Nodes are resolved with
/// `getElementById` on every call, so nodes created by patches are
/// addressable immediately.
#[derive(Debug, Clone)]
pub struct DomDocument {
    inner: web_sys::Document,
}

impl DomDocument {
    /// Wraps a browser document.
    pub fn new(inner: web_sys::Document) -> Self {
        Self { inner }
    }

    /// Returns the wrapped document.
    pub fn inner(&self) -> &web_sys::Document {
        &self.inner
    }

    fn element(&self, id: &NodeId) -> Result<Element, DocumentError> {
        self.inner
            .get_element_by_id(id.as_str())
            .ok_or_else(|| DocumentError::TargetMissing(id.clone()))
    }
}

fn markup_error(err: JsValue) -> DocumentError {
    DocumentError::Markup(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl Document for DomDocument {
    fn contains(&self, id: &NodeId) -> bool {
        self.inner.get_element_by_id(id.as_str()).is_some()
    }

    fn replace_children(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError> {
        self.element(id)?.set_inner_html(markup);
        Ok(())
    }

    fn replace_node(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError> {
        let element = self.element(id)?;
        // outerHTML throws on a node without a parent element
        if element.parent_element().is_none() {
            return Err(DocumentError::Markup(format!("`{id}` has no parent element")));
        }
        element.set_outer_html(markup);
        Ok(())
    }

    fn append_children(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError> {
        self.element(id)?
            .insert_adjacent_html("beforeend", markup)
            .map_err(markup_error)
    }

    fn remove_node(&mut self, id: &NodeId) -> Result<(), DocumentError> {
        self.element(id)?.remove();
        Ok(())
    }

    fn set_flag(&mut self, id: &NodeId, flag: &Flag, present: bool) -> Result<(), DocumentError> {
        let element = self.element(id)?;
        let result = match flag {
            Flag::Attribute(name) if present => element.set_attribute(name, ""),
            Flag::Attribute(name) => element.remove_attribute(name),
            Flag::Class(name) => element.class_list().toggle_with_force(name, present).map(|_| ()),
        };
        result.map_err(markup_error)
    }
}
