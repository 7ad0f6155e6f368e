#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cfglint-ir
//!
//! Owned tree representation of XML configuration documents.
//!
//! Documents are parsed once per validation attempt into a [`Document`] whose
//! nodes carry their source [`Position`], so that schema violations can be
//! reported against a line and column. [`ConfigDocument`] is the artifact under
//! test: a location on disk plus the source its content is read from.

/// Parsed documents and the config artifact under test.
pub mod document;
/// Source positions for diagnostics.
pub mod metadata;
/// Element and attribute nodes.
pub mod node;

pub use document::{ConfigDocument, Document, DocumentContent, MAX_DEPTH};
pub use metadata::Position;
pub use node::{Attribute, Node};

use thiserror::Error;

/// Errors that can occur when loading a document into the IR
#[derive(Error, Debug)]
pub enum Error {
    /// The document is not well-formed XML.
    #[error("{message}")]
    Parse { message: String, position: Position },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a parse error at the given position.
    pub fn parse(message: impl Into<String>, position: Position) -> Self {
        Self::Parse {
            message: message.into(),
            position,
        }
    }

    /// Source position of the error, when it has one.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Parse { position, .. } => Some(*position),
            Self::Io(_) => None,
        }
    }
}

/// Crate-local result type for IR operations.
pub type Result<T> = std::result::Result<T, Error>;
