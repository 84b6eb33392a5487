//! The recursive comparator.
//!
//! [`compare`] binds the settings to both trees, then walks them in lock-step.
//! Every sub-comparison returns its own [`DiffResult`] and the results are
//! merged on the way back up; nothing is accumulated in shared state.

use crate::adapter;
use crate::align::{self, ArrayPair, EditGroup};
use crate::error::Result;
use crate::path::JsonPath;
use crate::result::{Annotation, DiffResult, Side};
use crate::settings::{ArrayStrategy, Bindings, DiffSettings};
use crate::tree::{NodeId, Token, Tree};

/// Compare two trees under `settings`.
///
/// Fails only when a hint or caveat path does not parse; every difference in
/// the data is reported as an annotation.
///
/// ```
/// use shapediff_core::{compare, from_json, DiffSettings};
///
/// let a = from_json(r#"{"a": 1, "b": 2}"#).unwrap();
/// let b = from_json(r#"{"a": 1}"#).unwrap();
/// let result = compare(&a, &b, &DiffSettings::default()).unwrap();
/// assert!(!result.are_same());
/// assert_eq!(
///     result.annotations()[0].message(),
///     "property 'b' missing from second document"
/// );
/// ```
pub fn compare(a: &Tree, b: &Tree, settings: &DiffSettings) -> Result<DiffResult> {
    let comparator = Comparator {
        a,
        b,
        bindings_a: Bindings::bind(a, settings)?,
        bindings_b: Bindings::bind(b, settings)?,
    };
    let result = comparator.diff(a.root(), b.root(), &JsonPath::root());
    tracing::debug!(
        are_same = result.are_same(),
        annotations = result.annotations().len(),
        "comparison finished"
    );
    Ok(result)
}

/// Adapt two JSON documents and compare them.
pub fn compare_json(a: &str, b: &str, settings: &DiffSettings) -> Result<DiffResult> {
    compare(&adapter::from_json(a)?, &adapter::from_json(b)?, settings)
}

/// Adapt two XML documents and compare them.
pub fn compare_xml(a: &str, b: &str, settings: &DiffSettings) -> Result<DiffResult> {
    compare(&adapter::from_xml(a)?, &adapter::from_xml(b)?, settings)
}

struct Comparator<'t, 's> {
    a: &'t Tree,
    b: &'t Tree,
    bindings_a: Bindings<'s>,
    bindings_b: Bindings<'s>,
}

impl Comparator<'_, '_> {
    /// Compare `x` and `y`, both located at `path` in the first document.
    fn diff(&self, x: NodeId, y: NodeId, path: &JsonPath) -> DiffResult {
        match (self.a.token(x), self.b.token(y)) {
            (Token::Object(_), Token::Object(_)) => self.diff_objects(x, y, path),
            (Token::Array(_), Token::Array(_)) => self.diff_arrays(x, y, path),
            (Token::Value(_), Token::Value(_)) => self.diff_values(x, y, path),
            (Token::Property(p), Token::Property(q)) => self.diff(p.value(), q.value(), path),
            _ => Annotation::InconsistentTypes {
                path: path.clone(),
                type_a: self.a.token_type(x),
                type_b: self.b.token_type(y),
            }
            .into(),
        }
    }

    /// Full outer join on property name: first-document order, then names
    /// only the second document has.
    fn diff_objects(&self, x: NodeId, y: NodeId, path: &JsonPath) -> DiffResult {
        let mut result = DiffResult::SAME;
        for (name, value_a) in self.a.properties(x) {
            result = match self.b.get(y, name) {
                Some(value_b) => result.merge(self.diff(value_a, value_b, &path.field(name))),
                None => result.merge(missing(path, name, Side::Second)),
            };
        }
        for (name, _) in self.b.properties(y) {
            if self.a.property(x, name).is_none() {
                result = result.merge(missing(path, name, Side::First));
            }
        }
        result
    }

    fn diff_values(&self, x: NodeId, y: NodeId, path: &JsonPath) -> DiffResult {
        let (Some(value_a), Some(value_b)) = (self.a.scalar(x), self.b.scalar(y)) else {
            return DiffResult::SAME;
        };
        if value_a == value_b {
            return DiffResult::SAME;
        }

        let (text_a, text_b) = (value_a.to_string(), value_b.to_string());
        let within_tolerance = !value_a.is_null()
            && !value_b.is_null()
            && (self.bindings_a.accepts(x, &text_a, &text_b)
                || self.bindings_b.accepts(y, &text_a, &text_b));
        Annotation::DifferingValues {
            path: path.clone(),
            value_a: text_a,
            value_b: text_b,
            type_a: value_a.value_type(),
            type_b: value_b.value_type(),
            within_tolerance,
        }
        .into()
    }

    fn diff_arrays(&self, x: NodeId, y: NodeId, path: &JsonPath) -> DiffResult {
        let strategy = self
            .bindings_a
            .strategy(x)
            .or_else(|| self.bindings_b.strategy(y))
            .cloned()
            .unwrap_or(ArrayStrategy::Indexed);
        let pair = ArrayPair::new(self.a, x, self.b, y).with_caveats(&self.bindings_a, &self.bindings_b);
        let groups = align::align(&pair, &strategy);

        let (items_a, items_b) = (self.a.items(x), self.b.items(y));
        let mut result = DiffResult::SAME;
        for group in groups {
            let annotation = match group {
                EditGroup::Equal { .. } => continue,
                EditGroup::Insert { b } => Annotation::ItemsInserted {
                    path: path.clone(),
                    start: b.start,
                    end: b.end,
                },
                EditGroup::Delete { a } => Annotation::ItemsDeleted {
                    path: path.clone(),
                    start: a.start,
                    end: a.end,
                },
                EditGroup::Replace { a, b } => {
                    result = result.merge(
                        Annotation::ItemsReplaced {
                            path: path.clone(),
                            start_a: a.start,
                            end_a: a.end,
                            start_b: b.start,
                            end_b: b.end,
                        }
                        .into(),
                    );
                    for (i, j) in a.indices().zip(b.indices()) {
                        result = result.merge(self.diff(items_a[i], items_b[j], &path.index(i)));
                    }
                    continue;
                }
            };
            result = result.merge(annotation.into());
        }
        result
    }
}

fn missing(object: &JsonPath, property: &str, missing_from: Side) -> DiffResult {
    Annotation::MissingProperty {
        path: object.clone(),
        property: property.to_string(),
        missing_from,
    }
    .into()
}
