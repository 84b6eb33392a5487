//! # shapediff-core
//!
//! Structural comparison of JSON and XML documents.
//!
//! Documents are adapted into one canonical tree model (objects, arrays,
//! properties, values) and then compared recursively. Differences come back as
//! annotations located by path, never as errors. Callers steer the comparison
//! with path-scoped settings: *hints* choose how array items are aligned
//! (by position, by a key property, or by longest common subsequence) and
//! *caveats* allow numeric values to drift by a tolerance.
//!
//! ## Quick start
//!
//! ```rust
//! use shapediff_core::{compare_json, DiffSettings};
//!
//! let a = r#"{"total":10.00,"items":[{"id":1,"qty":2},{"id":2,"qty":1}]}"#;
//! let b = r#"{"total":10.02,"items":[{"id":2,"qty":1},{"id":1,"qty":2}]}"#;
//!
//! let settings = DiffSettings::new()
//!     .keyed_by("$.items", "id")
//!     .can_vary_by("$.total", 0.05);
//!
//! let result = compare_json(a, b, &settings).unwrap();
//! assert!(result.are_same());
//! assert_eq!(
//!     result.to_string(),
//!     "DiffResult, AreSame=true\n$.total: values differ: '10' vs. '10.02'\n"
//! );
//! ```
//!
//! ## Modules
//!
//! - [`tree`] -- arena-backed canonical tree, navigation and structural equality
//! - [`value`] -- scalar kinds and their type-aware comparison
//! - [`adapter`] -- JSON text, XML text or any `Serialize` value to a tree
//! - [`path`] -- JSONPath-like addressing and queries over a tree
//! - [`align`] -- array alignment strategies and edit groups
//! - [`settings`] -- hints and caveats
//! - [`engine`] -- the recursive comparator
//! - [`result`] -- annotations and the aggregated result
//! - [`error`] -- error types for adapters, paths and tree edits

pub mod adapter;
pub mod align;
pub mod engine;
pub mod error;
pub mod path;
pub mod result;
pub mod settings;
pub mod tree;
pub mod value;
mod writer;

pub use adapter::{from_json, from_json_value, from_object, from_xml, DocumentFormat};
pub use engine::{compare, compare_json, compare_xml};
pub use error::{Error, FormatError, PathError, Result, TreeError};
pub use path::JsonPath;
pub use result::{Annotation, DiffResult, Side};
pub use settings::{ArrayStrategy, Caveat, DiffSettings, Hint};
pub use tree::{NodeId, Token, TokenType, Tree};
pub use value::{Scalar, ValueType};
