//! Lazy evaluation of filters against a tree.
//!
//! Each filter turns one candidate into zero or more matches; a path is the
//! sequential composition of its filters, so nothing is materialized until the
//! caller pulls from the final iterator.

use super::ast::{Filter, QueryExpr, QueryOperator};
use crate::error::PathError;
use crate::tree::{NodeId, Token, Tree};
use crate::value::Scalar;
use std::cmp::Ordering;
use std::iter;

pub(crate) type Matches<'a> = Box<dyn Iterator<Item = Result<NodeId, PathError>> + 'a>;

/// Thread `root` through `filters`. With `strict`, a step that cannot apply to
/// its candidate yields an error item instead of silently yielding nothing.
pub(crate) fn evaluate<'a>(tree: &'a Tree, root: NodeId, filters: &'a [Filter], strict: bool) -> Matches<'a> {
    let mut current: Matches<'a> = Box::new(iter::once(Ok(root)));
    for filter in filters {
        current = Box::new(current.flat_map(move |candidate| -> Matches<'a> {
            match candidate {
                Ok(node) => apply(tree, node, filter, strict),
                Err(err) => fail(err),
            }
        }));
    }
    current
}

fn none<'a>() -> Matches<'a> {
    Box::new(iter::empty())
}

fn one<'a>(node: NodeId) -> Matches<'a> {
    Box::new(iter::once(Ok(node)))
}

fn fail<'a>(err: PathError) -> Matches<'a> {
    Box::new(iter::once(Err(err)))
}

fn miss<'a>(strict: bool, message: impl FnOnce() -> String) -> Matches<'a> {
    if strict {
        fail(PathError::NoMatch(message()))
    } else {
        none()
    }
}

fn apply<'a>(tree: &'a Tree, node: NodeId, filter: &'a Filter, strict: bool) -> Matches<'a> {
    let token = tree.token(node);
    match filter {
        Filter::Field(Some(name)) => match token {
            Token::Object(_) => match tree.get(node, name) {
                Some(value) => one(value),
                None => miss(strict, || format!("Property '{name}' does not exist on Object.")),
            },
            _ => miss(strict, || {
                format!("Property '{name}' not valid on {}.", tree.token_type(node))
            }),
        },
        Filter::Field(None) => match token {
            Token::Object(_) => Box::new(tree.properties(node).map(|(_, value)| Ok(value))),
            _ => miss(strict, || format!("Property '*' not valid on {}.", tree.token_type(node))),
        },
        Filter::Fields(names) => match token {
            Token::Object(_) => Box::new(names.iter().filter_map(move |name| {
                match tree.get(node, name) {
                    Some(value) => Some(Ok(value)),
                    None if strict => Some(Err(PathError::NoMatch(format!(
                        "Property '{name}' does not exist on Object."
                    )))),
                    None => None,
                }
            })),
            _ => miss(strict, || {
                let quoted: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
                format!("Properties {} not valid on {}.", quoted.join(", "), tree.token_type(node))
            }),
        },
        Filter::Index(Some(index)) => match token {
            Token::Array(array) => {
                let len = array.len() as i64;
                let resolved = if *index < 0 { len + index } else { *index };
                match usize::try_from(resolved).ok().and_then(|i| array.items().get(i)) {
                    Some(&item) => one(item),
                    None => miss(strict, || format!("Index {index} outside the bounds of Array.")),
                }
            }
            _ => miss(strict, || format!("Index {index} not valid on {}.", tree.token_type(node))),
        },
        Filter::Index(None) => match token {
            Token::Array(array) => Box::new(array.items().iter().map(|&item| Ok(item))),
            _ => miss(strict, || format!("Index * not valid on {}.", tree.token_type(node))),
        },
        Filter::Slice { start, end, step } => match token {
            Token::Array(array) => {
                let indices = slice_indices(array.len(), *start, *end, step.map_or(1, |s| s.get()));
                if indices.is_empty() {
                    let show = |bound: &Option<i64>| bound.map_or_else(|| "*".to_string(), |b| b.to_string());
                    return miss(strict, || {
                        format!("Array slice of {} to {} returned no results.", show(start), show(end))
                    });
                }
                let items = array.items();
                Box::new(indices.into_iter().map(move |i| Ok(items[i])))
            }
            _ => miss(strict, || format!("Array slice is not valid on {}.", tree.token_type(node))),
        },
        Filter::Scan(name) => scan(tree, node, name.as_deref()),
        Filter::Query(expr) => {
            let candidates: Box<dyn Iterator<Item = NodeId> + 'a> = match token {
                Token::Array(array) => Box::new(array.items().iter().copied()),
                Token::Object(_) => Box::new(tree.properties(node).map(|(_, value)| value)),
                _ => Box::new(iter::empty()),
            };
            Box::new(
                candidates
                    .filter(move |&candidate| expr.is_match(tree, candidate))
                    .map(Ok),
            )
        }
    }
}

/// Positions selected by `[start:end:step]` on an array of `len` items.
pub(crate) fn slice_indices(len: usize, start: Option<i64>, end: Option<i64>, step: i64) -> Vec<usize> {
    let len = len as i64;
    let forward = step > 0;

    let mut from = start.unwrap_or(if forward { 0 } else { len - 1 });
    let mut to = end.unwrap_or(if forward { len } else { -1 });
    if start.is_some_and(|s| s < 0) {
        from += len;
    }
    if end.is_some_and(|e| e < 0) {
        to += len;
    }

    if forward {
        from = from.clamp(0, len);
    } else {
        from = from.min(len - 1);
    }
    to = to.clamp(-1, len);

    let in_range = |i: i64| if forward { i < to } else { i > to };
    let mut indices = Vec::new();
    let mut i = from;
    while in_range(i) {
        if let Ok(index) = usize::try_from(i) {
            indices.push(index);
        }
        i += step;
    }
    indices
}

/// Depth-first walk below `root` in document order.
///
/// With a name, yields the values of properties with that name. Without one,
/// yields `root` itself and then every descendant that is not a property.
fn scan<'a>(tree: &'a Tree, root: NodeId, name: Option<&'a str>) -> Matches<'a> {
    let mut pending_root = name.is_none();
    let mut cursor = Some(root);
    Box::new(iter::from_fn(move || {
        if pending_root {
            pending_root = false;
            return Some(Ok(root));
        }
        loop {
            let mut node = cursor?;
            if let Some(first) = tree.first_child(node) {
                node = first;
            } else {
                while node != root && tree.next(node).is_none() {
                    node = tree.parent(node)?;
                }
                if node == root {
                    cursor = None;
                    return None;
                }
                node = tree.next(node)?;
            }
            cursor = Some(node);

            match tree.token(node) {
                Token::Property(p) => {
                    if name == Some(p.name()) {
                        return Some(Ok(p.value()));
                    }
                }
                _ if name.is_none() => return Some(Ok(node)),
                _ => {}
            }
        }
    }))
}

impl QueryExpr {
    /// Whether `node` satisfies this predicate. Sub-paths are evaluated leniently.
    pub(crate) fn is_match(&self, tree: &Tree, node: NodeId) -> bool {
        match self {
            Self::And(parts) => parts.iter().all(|p| p.is_match(tree, node)),
            Self::Or(parts) => parts.iter().any(|p| p.is_match(tree, node)),
            Self::Compare { path, op, value } => {
                let mut results = evaluate(tree, node, path, false).filter_map(Result::ok);
                if *op == QueryOperator::Exists {
                    return results.next().is_some();
                }
                let right = value.as_ref().unwrap_or(&Scalar::Null);
                results.any(|r| tree.scalar(r).is_some_and(|left| holds(left, *op, right)))
            }
        }
    }
}

fn holds(left: &Scalar, op: QueryOperator, right: &Scalar) -> bool {
    let ordering = left.compare(right);
    match op {
        QueryOperator::Equals => ordering == Some(Ordering::Equal),
        QueryOperator::NotEquals => ordering != Some(Ordering::Equal),
        QueryOperator::Exists => true,
        QueryOperator::LessThan => ordering == Some(Ordering::Less),
        QueryOperator::LessThanOrEquals => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        QueryOperator::GreaterThan => ordering == Some(Ordering::Greater),
        QueryOperator::GreaterThanOrEquals => {
            matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
        }
    }
}
