//! Node types for the document tree
#![allow(clippy::must_use_candidate)] // Accessors are clear at call sites without #[must_use].
#![allow(clippy::return_self_not_must_use)] // Fluent builder methods return Self for ergonomics.

use crate::metadata::Position;
use serde::{Deserialize, Serialize};

/// An element in the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Local name of the element
    pub name: String,

    /// Namespace URI, if the element is qualified
    pub namespace: Option<String>,

    /// Attributes in document order
    pub attributes: Vec<Attribute>,

    /// Child elements in document order
    pub children: Vec<Node>,

    /// Concatenated character data directly inside this element
    pub text: String,

    /// Where the element starts in the source
    pub position: Position,
}

/// An attribute on an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Local name of the attribute
    pub name: String,

    /// Namespace URI, if the attribute is qualified
    pub namespace: Option<String>,

    /// Attribute value with entities already expanded
    pub value: String,
}

impl Node {
    /// Create a new element node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
            position: Position::default(),
        }
    }

    /// Set the namespace URI
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the source position
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set the character data
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Add an unqualified attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Node) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Value of the unqualified attribute `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Find the first child element by local name
    pub fn find_child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Whether the element holds any non-whitespace character data
    pub fn has_significant_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

impl Attribute {
    /// Create an unqualified attribute
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_builder() {
        let mut group = Node::new("safety-sources-group")
            .with_attribute("id", "group")
            .at(Position::new(3, 5));
        group.add_child(Node::new("static-safety-source"));

        assert_eq!(group.attribute("id"), Some("group"));
        assert_eq!(group.attribute("title"), None);
        assert_eq!(group.position, Position::new(3, 5));
        assert!(group.find_child("static-safety-source").is_some());
        assert!(group.find_child("dynamic-safety-source").is_none());
    }

    #[test]
    fn test_qualified_attribute_is_not_matched_by_local_name() {
        let mut node = Node::new("root");
        node.attributes.push(Attribute {
            name: "lang".to_string(),
            namespace: Some("http://www.w3.org/XML/1998/namespace".to_string()),
            value: "en".to_string(),
        });

        assert_eq!(node.attribute("lang"), None);
    }

    #[test]
    fn test_significant_text() {
        assert!(!Node::new("a").with_text("  \n\t ").has_significant_text());
        assert!(Node::new("a").with_text(" x ").has_significant_text());
    }
}
