//! In-memory document tree.
//!
//! `MemoryDocument` implements [`Document`] over an owned element tree so the
//! client can run headless (CLI sessions, tests) without a rendering engine.
//! Its markup parser is deliberately lenient in the way browsers are:
//! unclosed elements are closed at the end of the fragment, void elements
//! need no close tag, comments and doctypes are dropped. A close tag with no
//! matching open element is rejected.

use crate::config::DEFAULT_ROOT_ID;
use crate::document::{Document, Flag};
use crate::error::DocumentError;
use std::fmt::Write as _;
use topsync_protocol::NodeId;

/// Deepest element nesting a [`MemoryDocument`] accepts, counted from the
/// body. Deeper markup is rejected as [`DocumentError::Markup`].
pub const MAX_DEPTH: usize = 512;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node in a [`MemoryDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element.
    Element(Element),
    /// Raw text, kept verbatim.
    Text(String),
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, Option<String>)>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute value, replacing any previous one.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attrs.retain(|(n, _)| n != name);
        self.attrs.push((name.to_string(), Some(value.to_string())));
        self
    }

    /// Returns the tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Returns an attribute's value; bare attributes yield `""`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    /// Returns true if the `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Returns the children.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    fn set_flag(&mut self, flag: &Flag, present: bool) {
        match flag {
            Flag::Attribute(name) => {
                let exists = self.attrs.iter().any(|(n, _)| n == name);
                if present && !exists {
                    self.attrs.push((name.clone(), None));
                } else if !present {
                    self.attrs.retain(|(n, _)| n != name);
                }
            }
            Flag::Class(class) => {
                let mut classes: Vec<String> = self
                    .attribute("class")
                    .map(|c| c.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default();
                let has = classes.iter().any(|c| c == class);
                if present == has {
                    return;
                }
                if present {
                    classes.push(class.clone());
                } else {
                    classes.retain(|c| c != class);
                }
                self.attrs.retain(|(n, _)| n != "class");
                if !classes.is_empty() {
                    self.attrs.push(("class".into(), Some(classes.join(" "))));
                }
            }
        }
    }

    fn write_inner(&self, out: &mut String) {
        for child in &self.children {
            child.write(out);
        }
    }

    fn write_outer(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            match value {
                Some(v) => {
                    let _ = write!(out, " {name}=\"{}\"", v.replace('"', "&quot;"));
                }
                None => {
                    let _ = write!(out, " {name}");
                }
            }
        }
        out.push('>');
        if is_void(&self.tag) {
            return;
        }
        self.write_inner(out);
        let _ = write!(out, "</{}>", self.tag);
    }

    /// Finds the child index path to the element with `id`.
    fn locate(&self, id: &str, path: &mut Vec<usize>) -> bool {
        for (idx, child) in self.children.iter().enumerate() {
            if let Node::Element(el) = child {
                path.push(idx);
                if el.id() == Some(id) || el.locate(id, path) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }

    fn element_at(&self, path: &[usize]) -> Option<&Element> {
        path.iter().try_fold(self, |el, idx| match el.children.get(*idx) {
            Some(Node::Element(child)) => Some(child),
            _ => None,
        })
    }

    fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        path.iter().try_fold(self, |el, idx| match el.children.get_mut(*idx) {
            Some(Node::Element(child)) => Some(child),
            _ => None,
        })
    }

    fn count_elements(&self) -> usize {
        self.children
            .iter()
            .map(|c| match c {
                Node::Element(el) => 1 + el.count_elements(),
                Node::Text(_) => 0,
            })
            .sum()
    }
}

impl Node {
    fn write(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.write_outer(out),
            Node::Text(text) => out.push_str(text),
        }
    }
}

/// An in-memory [`Document`].
///
/// The tree hangs off an anonymous body; the root container created by
/// [`MemoryDocument::new`] is its only initial child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDocument {
    body: Element,
}

impl MemoryDocument {
    /// Creates a document holding an empty root container with `root_id`.
    pub fn new(root_id: &str) -> Self {
        let root = Element::new("div").with_attribute("id", root_id);
        Self {
            body: Element {
                tag: "body".into(),
                attrs: Vec::new(),
                children: vec![Node::Element(root)],
            },
        }
    }

    /// Creates a document from body markup.
    pub fn from_markup(markup: &str) -> Result<Self, DocumentError> {
        Ok(Self {
            body: Element {
                tag: "body".into(),
                attrs: Vec::new(),
                children: parse_fragment(markup)?,
            },
        })
    }

    /// Returns the element with `id`.
    pub fn element(&self, id: &str) -> Option<&Element> {
        let path = self.path_to(id)?;
        self.body.element_at(&path)
    }

    /// Serializes the children of the element with `id`.
    pub fn inner_html(&self, id: &str) -> Option<String> {
        self.element(id).map(|el| {
            let mut out = String::new();
            el.write_inner(&mut out);
            out
        })
    }

    /// Serializes the element with `id`, including itself.
    pub fn outer_html(&self, id: &str) -> Option<String> {
        self.element(id).map(|el| {
            let mut out = String::new();
            el.write_outer(&mut out);
            out
        })
    }

    /// Serializes the whole document body.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.body.write_inner(&mut out);
        out
    }

    /// Returns an attribute of the element with `id`.
    pub fn attribute(&self, id: &str, name: &str) -> Option<&str> {
        self.element(id)?.attribute(name)
    }

    /// Returns true if the element with `id` has the class.
    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    /// Total number of elements.
    pub fn element_count(&self) -> usize {
        self.body.count_elements()
    }

    fn path_to(&self, id: &str) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        self.body.locate(id, &mut path).then_some(path)
    }

    fn resolve_mut(&mut self, id: &NodeId) -> Result<&mut Element, DocumentError> {
        self.resolve_with_depth(id).map(|(el, _)| el)
    }

    /// Resolves `id` along with its depth below the body.
    fn resolve_with_depth(&mut self, id: &NodeId) -> Result<(&mut Element, usize), DocumentError> {
        let path = self
            .path_to(id.as_str())
            .ok_or_else(|| DocumentError::TargetMissing(id.clone()))?;
        let depth = path.len();
        self.body
            .element_at_mut(&path)
            .map(|el| (el, depth))
            .ok_or_else(|| DocumentError::TargetMissing(id.clone()))
    }

    /// Resolves the parent of `id` and the node's index within it.
    fn resolve_parent_mut(&mut self, id: &NodeId) -> Result<(&mut Element, usize), DocumentError> {
        let mut path = self
            .path_to(id.as_str())
            .ok_or_else(|| DocumentError::TargetMissing(id.clone()))?;
        let index = path
            .pop()
            .ok_or_else(|| DocumentError::TargetMissing(id.clone()))?;
        let parent = self
            .body
            .element_at_mut(&path)
            .ok_or_else(|| DocumentError::TargetMissing(id.clone()))?;
        Ok((parent, index))
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_ID)
    }
}

impl Document for MemoryDocument {
    fn contains(&self, id: &NodeId) -> bool {
        self.path_to(id.as_str()).is_some()
    }

    fn replace_children(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError> {
        let (target, depth) = self.resolve_with_depth(id)?;
        target.children = parse_nested(markup, depth)?;
        Ok(())
    }

    fn replace_node(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError> {
        let depth = self
            .path_to(id.as_str())
            .map(|path| path.len() - 1)
            .ok_or_else(|| DocumentError::TargetMissing(id.clone()))?;
        let fragment = parse_nested(markup, depth)?;
        let (parent, index) = self.resolve_parent_mut(id)?;
        parent.children.splice(index..=index, fragment);
        Ok(())
    }

    fn append_children(&mut self, id: &NodeId, markup: &str) -> Result<(), DocumentError> {
        let (target, depth) = self.resolve_with_depth(id)?;
        let fragment = parse_nested(markup, depth)?;
        target.children.extend(fragment);
        Ok(())
    }

    fn remove_node(&mut self, id: &NodeId) -> Result<(), DocumentError> {
        let (parent, index) = self.resolve_parent_mut(id)?;
        parent.children.remove(index);
        Ok(())
    }

    fn set_flag(&mut self, id: &NodeId, flag: &Flag, present: bool) -> Result<(), DocumentError> {
        self.resolve_mut(id)?.set_flag(flag, present);
        Ok(())
    }
}

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Parses a markup fragment into a list of nodes.
///
/// Fails if elements nest more than [`MAX_DEPTH`] levels.
pub fn parse_fragment(markup: &str) -> Result<Vec<Node>, DocumentError> {
    parse_nested(markup, 0)
}

/// Parses a fragment that will hang `depth` levels below the body.
fn parse_nested(markup: &str, depth: usize) -> Result<Vec<Node>, DocumentError> {
    Parser {
        src: markup,
        pos: 0,
        max_open: MAX_DEPTH.saturating_sub(depth),
    }
    .parse()
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    max_open: usize,
}

impl<'a> Parser<'a> {
    fn parse(mut self) -> Result<Vec<Node>, DocumentError> {
        let mut top: Vec<Node> = Vec::new();
        let mut open: Vec<Element> = Vec::new();

        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                let end = rest
                    .find("-->")
                    .ok_or_else(|| self.error("unterminated comment"))?;
                self.pos += end + 3;
            } else if rest.starts_with("<!") {
                let end = rest
                    .find('>')
                    .ok_or_else(|| self.error("unterminated declaration"))?;
                self.pos += end + 1;
            } else if rest.starts_with("</") {
                let end = rest
                    .find('>')
                    .ok_or_else(|| self.error("unterminated close tag"))?;
                let name = rest[2..end].trim().to_ascii_lowercase();
                self.pos += end + 1;
                close(&mut open, &mut top, &name).map_err(|_| self.error(&format!("stray </{name}>")))?;
            } else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                let (element, self_closing) = self.open_tag()?;
                if open.len() >= self.max_open {
                    return Err(self.error(&format!("nesting deeper than {MAX_DEPTH} levels")));
                }
                if self_closing || is_void(&element.tag) {
                    attach(&mut open, &mut top, Node::Element(element));
                } else {
                    open.push(element);
                }
            } else {
                let first = rest.chars().next().map_or(1, char::len_utf8);
                let len = rest[first..].find('<').map_or(rest.len(), |i| i + first);
                attach(&mut open, &mut top, Node::Text(rest[..len].to_string()));
                self.pos += len;
            }
        }

        while let Some(element) = open.pop() {
            attach(&mut open, &mut top, Node::Element(element));
        }
        Ok(top)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, reason: &str) -> DocumentError {
        DocumentError::Markup(format!("{reason} at byte {}", self.pos))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    /// Parses `<name attr...>` or `<name attr.../>`.
    fn open_tag(&mut self) -> Result<(Element, bool), DocumentError> {
        self.pos += 1;
        let tag = self
            .take_while(|c| c.is_ascii_alphanumeric() || c == '-')
            .to_ascii_lowercase();
        let mut element = Element::new(tag);

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error("unterminated tag"));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok((element, true));
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok((element, false));
            }

            let name = self
                .take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\''))
                .to_ascii_lowercase();
            if name.is_empty() {
                return Err(self.error("malformed attribute"));
            }

            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                Some(self.attribute_value()?)
            } else {
                None
            };
            element.attrs.retain(|(n, _)| *n != name);
            element.attrs.push((name, value));
        }
    }

    fn attribute_value(&mut self) -> Result<String, DocumentError> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let end = rest[1..]
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                self.pos += end + 2;
                Ok(rest[1..=end].to_string())
            }
            Some(_) => Ok(self
                .take_while(|c| !c.is_whitespace() && c != '>')
                .to_string()),
            None => Err(self.error("missing attribute value")),
        }
    }
}

fn attach(open: &mut [Element], top: &mut Vec<Node>, node: Node) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

/// Closes the innermost open element named `name`, implicitly closing any
/// elements opened after it.
fn close(open: &mut Vec<Element>, top: &mut Vec<Node>, name: &str) -> Result<(), ()> {
    let depth = open.iter().rposition(|el| el.tag == name).ok_or(())?;
    while open.len() > depth {
        if let Some(element) = open.pop() {
            attach(open, top, Node::Element(element));
        }
    }
    Ok(())
}
