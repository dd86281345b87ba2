//! Owned tree representation of upstream XML documents.
//!
//! The game API emits loosely structured XML: a repeated element appears as
//! one node when there is a single occurrence and as several siblings when
//! there are many. `XmlNode` keeps the document shape as-is and exposes
//! `children_named`, which iterates zero, one, or many same-named children
//! uniformly, so callers never special-case the single-vs-list asymmetry.

use std::collections::BTreeMap;

/// One element of an upstream XML document, with its attributes, direct
/// text content, and child elements.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    name: String,
    attrs: BTreeMap<String, String>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parse a response body into an owned tree rooted at the document
    /// element.
    pub fn parse(body: &str) -> Result<XmlNode, roxmltree::Error> {
        let doc = roxmltree::Document::parse(body)?;
        Ok(Self::from_element(doc.root_element()))
    }

    fn from_element(el: roxmltree::Node<'_, '_>) -> XmlNode {
        let mut text = String::new();
        let mut children = Vec::new();
        for child in el.children() {
            if child.is_element() {
                children.push(Self::from_element(child));
            } else if let Some(t) = child.text() {
                text.push_str(t);
            }
        }
        XmlNode {
            name: el.tag_name().name().to_string(),
            attrs: el
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            text: text.trim().to_string(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed text content of this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given name. Yields one item for a
    /// collapsed single occurrence and many for repeated siblings.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn children(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter()
    }

    /// Walk a path of child names, first match at each step.
    pub fn get(&self, path: &[&str]) -> Option<&XmlNode> {
        let mut node = self;
        for name in path {
            node = node.child(name)?;
        }
        Some(node)
    }

    /// Depth-first search for the first descendant with the given name.
    pub fn descendant(&self, name: &str) -> Option<&XmlNode> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Text of the named child, if present.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(XmlNode::text)
    }
}
