//! Path language for addressing tokens in a [`Tree`].
//!
//! A JSONPath-like syntax:
//!
//! - `$` the root, `.name` or `['name']` a property, `.*` every property value
//! - `['a','b']` several properties
//! - `[2]`, `[-1]` an array item, `[*]` every item
//! - `[start:end:step]` an array slice
//! - `..name` every descendant property called `name`, `..*` every descendant
//! - `[?(@.price < 10 && @.tags)]` items or property values matching a predicate
//!
//! Evaluation is lazy. [`Tree::select_tokens`] never fails and skips steps that
//! do not apply; [`Tree::select_tokens_strict`] reports them as
//! [`PathError::NoMatch`] items instead.
//!
//! ```
//! use shapediff_core::{from_json, JsonPath};
//!
//! let tree = from_json(r#"{"items": [{"id": 1}, {"id": 2}]}"#).unwrap();
//! let path: JsonPath = "$.items[?(@.id > 1)].id".parse().unwrap();
//! let hits: Vec<_> = tree.select_tokens(&path).collect();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(tree.path(hits[0]).to_string(), "$.items[1].id");
//! ```

mod ast;
mod evaluator;
mod parser;

pub use ast::{Filter, JsonPath, QueryExpr, QueryOperator};

use crate::error::PathError;
use crate::tree::{NodeId, Tree};
use std::str::FromStr;

impl FromStr for JsonPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse(s)
    }
}

impl Tree {
    /// Every token matched by `path` from the root, in document order.
    pub fn select_tokens<'a>(&'a self, path: &'a JsonPath) -> impl Iterator<Item = NodeId> + 'a {
        self.select_tokens_from(self.root(), path)
    }

    /// Like [`Tree::select_tokens`], evaluated from an arbitrary token.
    pub fn select_tokens_from<'a>(
        &'a self,
        start: NodeId,
        path: &'a JsonPath,
    ) -> impl Iterator<Item = NodeId> + 'a {
        evaluator::evaluate(self, start, path.filters(), false).filter_map(Result::ok)
    }

    /// Matches of `path`, with an error item wherever a step cannot apply
    /// (missing property, index out of bounds, wrong token type).
    pub fn select_tokens_strict<'a>(
        &'a self,
        path: &'a JsonPath,
    ) -> impl Iterator<Item = Result<NodeId, PathError>> + 'a {
        evaluator::evaluate(self, self.root(), path.filters(), true)
    }

    /// The single token matched by `path`, if any.
    ///
    /// More than one match is an error.
    pub fn select_token(&self, path: &JsonPath) -> Result<Option<NodeId>, PathError> {
        let mut matches = self.select_tokens(path);
        let first = matches.next();
        if matches.next().is_some() {
            return Err(PathError::MultipleMatches(path.to_string()));
        }
        Ok(first)
    }

    /// The single token matched by `path`; no match and multiple matches are errors.
    pub fn select_token_strict(&self, path: &JsonPath) -> Result<NodeId, PathError> {
        let mut matches = self.select_tokens_strict(path);
        let first = matches
            .next()
            .transpose()?
            .ok_or_else(|| PathError::NoMatch(format!("Path '{path}' returned no tokens.")))?;
        if matches.next().transpose()?.is_some() {
            return Err(PathError::MultipleMatches(path.to_string()));
        }
        Ok(first)
    }
}
