//! Comparison output: annotations and the result that aggregates them.

use crate::path::JsonPath;
use crate::tree::TokenType;
use crate::value::ValueType;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Which of the two compared documents something refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    First,
    Second,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::First => "first",
            Self::Second => "second",
        })
    }
}

/// One fact found by a comparison, located by the path of the token in the
/// first document (arrays are located by the array itself, with index ranges).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// The two tokens are of different kinds (object vs array, say).
    InconsistentTypes {
        path: JsonPath,
        type_a: TokenType,
        type_b: TokenType,
    },
    /// An object property exists on only one side.
    MissingProperty {
        path: JsonPath,
        property: String,
        missing_from: Side,
    },
    /// Two scalars differ; `within_tolerance` marks a difference a caveat accepts.
    DifferingValues {
        path: JsonPath,
        value_a: String,
        value_b: String,
        type_a: ValueType,
        type_b: ValueType,
        within_tolerance: bool,
    },
    /// Items `start..=end` of the second array have no counterpart in the first.
    ItemsInserted { path: JsonPath, start: usize, end: usize },
    /// Items `start..=end` of the first array have no counterpart in the second.
    ItemsDeleted { path: JsonPath, start: usize, end: usize },
    /// Items of the first array were replaced by as many items of the second.
    ItemsReplaced {
        path: JsonPath,
        start_a: usize,
        end_a: usize,
        start_b: usize,
        end_b: usize,
    },
}

impl Annotation {
    pub fn path(&self) -> &JsonPath {
        match self {
            Self::InconsistentTypes { path, .. }
            | Self::MissingProperty { path, .. }
            | Self::DifferingValues { path, .. }
            | Self::ItemsInserted { path, .. }
            | Self::ItemsDeleted { path, .. }
            | Self::ItemsReplaced { path, .. } => path,
        }
    }

    /// Only a tolerated value difference leaves the documents the same.
    pub fn are_same(&self) -> bool {
        matches!(
            self,
            Self::DifferingValues {
                within_tolerance: true,
                ..
            }
        )
    }

    pub fn message(&self) -> String {
        match self {
            Self::InconsistentTypes { type_a, type_b, .. } => {
                format!("inconsistent types: {type_a} vs. {type_b}")
            }
            Self::MissingProperty {
                property,
                missing_from,
                ..
            } => format!("property '{property}' missing from {missing_from} document"),
            Self::DifferingValues {
                value_a,
                value_b,
                type_a,
                type_b,
                ..
            } if value_a == value_b => {
                format!("values differ: '{value_a}' ({type_a}) vs. '{value_b}' ({type_b})")
            }
            Self::DifferingValues {
                value_a, value_b, ..
            } => format!("values differ: '{value_a}' vs. '{value_b}'"),
            Self::ItemsInserted { start, end, .. } if start == end => format!("Item [{start}] added."),
            Self::ItemsInserted { start, end, .. } => format!("Items [{start}..{end}] added."),
            Self::ItemsDeleted { start, end, .. } if start == end => format!("Item [{start}] removed."),
            Self::ItemsDeleted { start, end, .. } => format!("Items [{start}..{end}] removed."),
            Self::ItemsReplaced {
                start_a,
                end_a,
                start_b,
                end_b,
                ..
            } => match (start_a == start_b, start_a == end_a) {
                (true, true) => format!("Element [{start_a}] changed."),
                (true, false) => format!("Elements [{start_a}..{end_a}] changed."),
                (false, true) => format!("Element [{start_a}] replaced by element [{start_b}]."),
                (false, false) => format!(
                    "Elements [{start_a}..{end_a}] replaced by elements [{start_b}..{end_b}]."
                ),
            },
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path(), self.message())
    }
}

/// Outcome of a comparison.
///
/// Results combine with [`DiffResult::merge`]: `are_same` is the AND of both
/// sides and the annotations are their union in order of first appearance.
/// [`DiffResult::SAME`] is the identity.
#[derive(Debug, Clone, Serialize)]
pub struct DiffResult {
    are_same: bool,
    annotations: Vec<Annotation>,
    /// Keys of `annotations`, built on the first merge that needs them.
    #[serde(skip)]
    seen: Option<HashSet<String>>,
}

impl PartialEq for DiffResult {
    fn eq(&self, other: &Self) -> bool {
        self.are_same == other.are_same && self.annotations == other.annotations
    }
}

/// Identity of an annotation for the union in [`DiffResult::merge`].
fn key(annotation: &Annotation) -> String {
    format!("{annotation:?}")
}

impl Default for DiffResult {
    fn default() -> Self {
        Self::SAME
    }
}

impl DiffResult {
    /// No differences at all.
    pub const SAME: DiffResult = DiffResult {
        are_same: true,
        annotations: Vec::new(),
        seen: None,
    };

    pub fn from_annotation(annotation: Annotation) -> Self {
        Self {
            are_same: annotation.are_same(),
            annotations: vec![annotation],
            seen: None,
        }
    }

    /// True when every annotation is a tolerated difference (or there are none).
    pub fn are_same(&self) -> bool {
        self.are_same
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn into_annotations(self) -> Vec<Annotation> {
        self.annotations
    }

    pub fn merge(mut self, other: DiffResult) -> DiffResult {
        self.are_same &= other.are_same;
        if self.annotations.is_empty() {
            self.annotations = other.annotations;
            self.seen = other.seen;
            return self;
        }
        if other.annotations.is_empty() {
            return self;
        }
        let annotations = &self.annotations;
        let seen = self
            .seen
            .get_or_insert_with(|| annotations.iter().map(key).collect());
        for annotation in other.annotations {
            if seen.insert(key(&annotation)) {
                self.annotations.push(annotation);
            }
        }
        self
    }
}

impl From<Annotation> for DiffResult {
    fn from(annotation: Annotation) -> Self {
        Self::from_annotation(annotation)
    }
}

impl FromIterator<DiffResult> for DiffResult {
    fn from_iter<I: IntoIterator<Item = DiffResult>>(iter: I) -> Self {
        iter.into_iter().fold(Self::SAME, Self::merge)
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DiffResult, AreSame={}", self.are_same)?;
        for annotation in &self.annotations {
            writeln!(f, "{annotation}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(start: usize, end: usize) -> Annotation {
        Annotation::ItemsDeleted {
            path: JsonPath::root().field("items"),
            start,
            end,
        }
    }

    #[test]
    fn replace_messages_distinguish_shifted_ranges() {
        let replaced = |start_a, end_a, start_b, end_b| Annotation::ItemsReplaced {
            path: JsonPath::root(),
            start_a,
            end_a,
            start_b,
            end_b,
        };
        assert_eq!(replaced(1, 1, 1, 1).message(), "Element [1] changed.");
        assert_eq!(replaced(1, 2, 1, 2).message(), "Elements [1..2] changed.");
        assert_eq!(replaced(1, 1, 3, 3).message(), "Element [1] replaced by element [3].");
        assert_eq!(
            replaced(0, 1, 3, 4).message(),
            "Elements [0..1] replaced by elements [3..4]."
        );
    }

    #[test]
    fn merge_is_an_and_with_deduplicated_union() {
        let tolerated = DiffResult::from_annotation(Annotation::DifferingValues {
            path: JsonPath::root().field("price"),
            value_a: "10".into(),
            value_b: "10.02".into(),
            type_a: ValueType::Integer,
            type_b: ValueType::Float,
            within_tolerance: true,
        });
        assert!(tolerated.are_same());

        let merged = tolerated
            .clone()
            .merge(deleted(2, 3).into())
            .merge(deleted(2, 3).into());
        assert!(!merged.are_same());
        assert_eq!(merged.annotations().len(), 2);

        assert_eq!(DiffResult::SAME.merge(tolerated.clone()), tolerated);
    }

    #[test]
    fn merge_keeps_first_appearance_order() {
        let result: DiffResult = [0, 1, 0, 2, 1]
            .into_iter()
            .map(|i| DiffResult::from(deleted(i, i)))
            .collect();
        let starts: Vec<_> = result
            .annotations()
            .iter()
            .map(|a| match a {
                Annotation::ItemsDeleted { start, .. } => *start,
                other => panic!("unexpected annotation {other:?}"),
            })
            .collect();
        assert_eq!(starts, vec![0, 1, 2]);
    }

    #[test]
    fn same_looking_values_name_their_kinds() {
        let annotation = Annotation::DifferingValues {
            path: JsonPath::root().field("n"),
            value_a: "1".into(),
            value_b: "1".into(),
            type_a: ValueType::String,
            type_b: ValueType::Integer,
            within_tolerance: false,
        };
        assert_eq!(
            annotation.to_string(),
            "$.n: values differ: '1' (String) vs. '1' (Integer)"
        );
    }

    #[test]
    fn renders_header_and_one_line_per_annotation() {
        let result: DiffResult = vec![DiffResult::SAME, deleted(2, 2).into()].into_iter().collect();
        assert_eq!(
            result.to_string(),
            "DiffResult, AreSame=false\n$.items: Item [2] removed.\n"
        );
    }
}
