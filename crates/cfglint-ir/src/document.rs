//! Parsed documents and the config artifact under test
#![allow(clippy::must_use_candidate)] // Constructor helpers are clear at call sites without #[must_use].

use crate::metadata::Position;
use crate::node::{Attribute, Node};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// Deepest element nesting accepted in a document; the root is at depth 1
pub const MAX_DEPTH: usize = 128;

/// A parsed XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Document element
    pub root: Node,
}

impl Document {
    /// Create a document from its root element
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// Parse XML text into the IR.
    ///
    /// Document type declarations are rejected, so no external entities are
    /// ever resolved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] with the parser's position when the text is
    /// not well-formed, or at the first element nested deeper than
    /// [`MAX_DEPTH`].
    pub fn parse(text: &str) -> Result<Self> {
        let xml = roxmltree::Document::parse(text).map_err(|e| {
            let pos = e.pos();
            Error::parse(e.to_string(), Position::new(pos.row, pos.col))
        })?;

        Ok(Self::new(convert(&xml, xml.root_element(), 1)?))
    }
}

fn convert(
    xml: &roxmltree::Document<'_>,
    element: roxmltree::Node<'_, '_>,
    depth: usize,
) -> Result<Node> {
    let pos = xml.text_pos_at(element.range().start);
    let tag = element.tag_name();

    if depth > MAX_DEPTH {
        return Err(Error::parse(
            format!(
                "Element '{}' is nested deeper than the maximum depth of {MAX_DEPTH}.",
                tag.name()
            ),
            Position::new(pos.row, pos.col),
        ));
    }

    let mut node = Node::new(tag.name()).at(Position::new(pos.row, pos.col));
    node.namespace = tag.namespace().map(str::to_string);
    node.attributes = element
        .attributes()
        .map(|attr| Attribute {
            name: attr.name().to_string(),
            namespace: attr.namespace().map(str::to_string),
            value: attr.value().to_string(),
        })
        .collect();

    for child in element.children() {
        if child.is_element() {
            node.children.push(convert(xml, child, depth + 1)?);
        } else if child.is_text() {
            if let Some(text) = child.text() {
                node.text.push_str(text);
            }
        }
    }

    Ok(node)
}

/// Where the content of a [`ConfigDocument`] comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentContent {
    /// Read from the document's location on every access
    OnDisk,
    /// Held in memory; the location only carries the version qualifier
    InMemory(Arc<str>),
}

/// The config artifact under test.
///
/// The platform version of a config is derived from its location, never from
/// its content, so in-memory documents still carry a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    location: PathBuf,
    content: DocumentContent,
}

impl ConfigDocument {
    /// A document read from `location` whenever it is validated
    pub fn on_disk(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            content: DocumentContent::OnDisk,
        }
    }

    /// A document with in-memory content attributed to `location`
    pub fn in_memory(location: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> Self {
        Self {
            location: location.into(),
            content: DocumentContent::InMemory(text.into()),
        }
    }

    /// Storage location of the document
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Content source of the document
    pub fn content(&self) -> &DocumentContent {
        &self.content
    }

    /// File name component of the location
    pub fn file_name(&self) -> Option<&str> {
        self.location.file_name().and_then(|n| n.to_str())
    }

    /// Read the raw document text.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when an on-disk document cannot be read.
    pub fn read_to_string(&self) -> std::io::Result<String> {
        match &self.content {
            DocumentContent::OnDisk => {
                trace!("Reading config document from {:?}", self.location);
                std::fs::read_to_string(&self.location)
            }
            DocumentContent::InMemory(text) => Ok(text.to_string()),
        }
    }

    /// Read and parse the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the content cannot be read and
    /// [`Error::Parse`] when it is not well-formed XML.
    pub fn load(&self) -> Result<Document> {
        let text = self.read_to_string()?;
        Document::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<safety-center-config>
    <safety-sources-config>
        <safety-sources-group id="group" title="@string/title">
            <static-safety-source id="source" />
        </safety-sources-group>
    </safety-sources-config>
</safety-center-config>
"#;

    #[test]
    fn test_parse_builds_tree_with_positions() {
        let doc = Document::parse(CONFIG).unwrap();

        assert_eq!(doc.root.name, "safety-center-config");
        assert_eq!(doc.root.position, Position::new(2, 1));

        let sources = doc.root.find_child("safety-sources-config").unwrap();
        let group = sources.find_child("safety-sources-group").unwrap();
        assert_eq!(group.attribute("id"), Some("group"));
        assert_eq!(group.attribute("title"), Some("@string/title"));
        assert_eq!(group.position, Position::new(4, 9));
        assert_eq!(group.children.len(), 1);
        assert!(!group.has_significant_text());
    }

    #[test]
    fn test_parse_keeps_namespaces() {
        let doc = Document::parse(
            r#"<c:config xmlns:c="urn:config" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="a.xsd"/>"#,
        )
        .unwrap();

        assert_eq!(doc.root.name, "config");
        assert_eq!(doc.root.namespace.as_deref(), Some("urn:config"));
        assert_eq!(doc.root.attributes.len(), 1);
        assert_eq!(
            doc.root.attributes[0].namespace.as_deref(),
            Some("http://www.w3.org/2001/XMLSchema-instance")
        );
    }

    #[test]
    fn test_parse_collects_text() {
        let doc = Document::parse("<a>one<b/>two<![CDATA[three]]></a>").unwrap();
        assert_eq!(doc.root.text, "onetwothree");
    }

    #[test]
    fn test_parse_error_has_position() {
        let err = Document::parse("<a>\n  <b>\n</a>").unwrap_err();
        let position = err.position().unwrap();
        assert_eq!(position.line, 3);
        assert!(!err.to_string().is_empty());
    }

    fn nested(depth: usize) -> String {
        let mut text = "<a>".repeat(depth);
        text.push_str(&"</a>".repeat(depth));
        text
    }

    #[test]
    fn test_parse_accepts_nesting_up_to_max_depth() {
        let doc = Document::parse(&nested(MAX_DEPTH)).unwrap();

        let mut depth = 1;
        let mut node = &doc.root;
        while let Some(child) = node.children.first() {
            node = child;
            depth += 1;
        }
        assert_eq!(depth, MAX_DEPTH);
    }

    #[test]
    fn test_parse_rejects_excessive_nesting() {
        let text = format!("<config>\n{}</config>", nested(5_000));
        let err = Document::parse(&text).unwrap_err();

        assert_eq!(
            err.to_string(),
            format!("Element 'a' is nested deeper than the maximum depth of {MAX_DEPTH}.")
        );
        let position = err.position().unwrap();
        assert_eq!(position.line, 2);
        assert_eq!(position.column, u32::try_from(3 * (MAX_DEPTH - 1) + 1).unwrap());
    }

    #[test]
    fn test_parse_rejects_dtd() {
        let text = r#"<?xml version="1.0"?>
<!DOCTYPE a [<!ENTITY e SYSTEM "file:///etc/passwd">]>
<a>&e;</a>"#;
        assert!(matches!(Document::parse(text), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_in_memory_document() {
        let doc = ConfigDocument::in_memory("res/raw-v34/safety_center_config.xml", CONFIG);

        assert_eq!(doc.file_name(), Some("safety_center_config.xml"));
        assert_eq!(
            doc.location(),
            Path::new("res/raw-v34/safety_center_config.xml")
        );
        assert_eq!(doc.load().unwrap().root.name, "safety-center-config");
    }

    #[test]
    fn test_on_disk_document_is_read_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("safety_center_config.xml");
        std::fs::write(&path, "<a/>").unwrap();

        let doc = ConfigDocument::on_disk(&path);
        assert_eq!(doc.load().unwrap().root.name, "a");

        std::fs::write(&path, "<b/>").unwrap();
        assert_eq!(doc.load().unwrap().root.name, "b");

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(doc.load(), Err(Error::Io(_))));
    }
}
