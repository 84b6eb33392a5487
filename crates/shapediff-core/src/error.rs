//! Error types for adapting documents and evaluating paths.
//!
//! Data differences are never errors: they are reported as annotations in a
//! [`crate::DiffResult`]. Only unreadable input and malformed or unsatisfiable
//! paths surface here.

use thiserror::Error;

/// The input could not be turned into a canonical tree.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The input string was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[source] serde_json::Error),

    /// The input string was not well-formed XML.
    #[error("XML parse error at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// An attribute could not be read (bad quoting, duplicate name, bad escape).
    #[error("XML attribute error: {0}")]
    XmlAttribute(String),

    /// Element text or a name was not valid UTF-8 or contained a bad escape.
    #[error("XML text error: {0}")]
    XmlText(String),

    /// The XML input has no root element, or closes an element it never opened.
    #[error("XML structure error: {0}")]
    XmlStructure(String),

    /// An element mixes child names with differing multiplicities, which maps
    /// to neither an object (all names unique) nor an array (one repeated name).
    #[error("unsupported XML shape in <{element}>: children {names:?} are neither all unique nor a single repeated name")]
    UnsupportedXmlShape { element: String, names: Vec<String> },

    /// A host value could not be serialized into its JSON form.
    #[error("serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A path could not be parsed, or a strict evaluation found no match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Malformed path text. `position` is the character offset of the problem.
    #[error("invalid path at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// Strict evaluation was asked for a token that is not there.
    #[error("{0}")]
    NoMatch(String),

    /// `select_token` matched more than one token.
    #[error("path '{0}' returned multiple tokens")]
    MultipleMatches(String),
}

impl PathError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// A structural edit would break a tree invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The target node is not the kind of container the operation needs.
    #[error("expected {expected} token, found {found}")]
    WrongTokenType {
        expected: crate::tree::TokenType,
        found: crate::tree::TokenType,
    },

    /// The node would become its own ancestor.
    #[error("a token cannot be added to itself or to one of its descendants")]
    Cycle,

    /// Properties only live directly inside objects.
    #[error("a property can only be owned by an object")]
    MisplacedProperty,
}

/// Any failure raised by the public entry points.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Convenience alias used throughout shapediff-core.
pub type Result<T> = std::result::Result<T, Error>;
