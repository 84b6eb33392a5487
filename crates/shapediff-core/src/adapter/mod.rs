//! Adapters from serialized documents to [`Tree`]s.
//!
//! Every adapter fails fast with a [`FormatError`]; no partial tree is ever
//! returned.

mod json;
mod xml;

pub use json::{from_json, from_json_value};
pub use xml::from_xml;

use crate::error::FormatError;
use crate::tree::Tree;
use serde::Serialize;
use std::path::Path;

/// Serialize any value to JSON and adapt the result.
///
/// ```
/// use serde::Serialize;
/// use shapediff_core::from_object;
///
/// #[derive(Serialize)]
/// struct Order { id: u32, total: f64 }
///
/// let tree = from_object(&Order { id: 7, total: 9.5 }).unwrap();
/// assert_eq!(tree.to_json_string(tree.root()), r#"{"id":7,"total":9.5}"#);
/// ```
pub fn from_object<T: Serialize + ?Sized>(value: &T) -> Result<Tree, FormatError> {
    let text = serde_json::to_string(value).map_err(FormatError::Serialize)?;
    from_json(&text)
}

/// Serialization formats an adapter exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Xml,
}

impl DocumentFormat {
    /// Format named by a file extension (`.json`, `.xml`), ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    /// Guess from content: markup starts with `<`, everything else is JSON.
    pub fn sniff(text: &str) -> Self {
        if text.trim_start_matches('\u{feff}').trim_start().starts_with('<') {
            Self::Xml
        } else {
            Self::Json
        }
    }

    pub fn adapt(self, text: &str) -> Result<Tree, FormatError> {
        match self {
            Self::Json => from_json(text),
            Self::Xml => from_xml(text),
        }
    }
}
