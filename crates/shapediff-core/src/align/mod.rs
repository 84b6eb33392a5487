//! Array alignment.
//!
//! A [`Subsequencer`] turns two arrays into an ordered list of [`EditGroup`]s
//! whose spans, read in order, cover every index of both arrays exactly once.
//! Strategies only emit `Equal`, `Delete` and `Insert`; [`post_process`] is the
//! single place where a `Delete` directly followed by an `Insert` of the same
//! length becomes a `Replace`.
//!
//! - [`Indexed`] -- position by position (the default)
//! - [`Keyed`] -- objects joined on a key property
//! - [`Lcs`] -- minimal edit script by longest common subsequence

mod indexed;
mod keyed;
mod lcs;

pub use indexed::Indexed;
pub use keyed::Keyed;
pub use lcs::Lcs;

use crate::settings::{ArrayStrategy, Bindings};
use crate::tree::{NodeId, Token, Tree};
use std::fmt;

/// Inclusive index range `start..=end` within one array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(index: usize) -> Self {
        Self::new(index, index)
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false; a span covers at least one index.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Whether `index` is the next index after this span.
    fn continues_with(&self, index: usize) -> bool {
        self.end + 1 == index
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A contiguous run of one edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditGroup {
    Equal { a: Span, b: Span },
    Insert { b: Span },
    Delete { a: Span },
    Replace { a: Span, b: Span },
}

impl EditGroup {
    pub fn equal(a: usize, b: usize) -> Self {
        Self::Equal {
            a: Span::single(a),
            b: Span::single(b),
        }
    }

    pub fn insert(b: usize) -> Self {
        Self::Insert { b: Span::single(b) }
    }

    pub fn delete(a: usize) -> Self {
        Self::Delete { a: Span::single(a) }
    }

    /// Source span, absent for an insert.
    pub fn span_a(&self) -> Option<Span> {
        match *self {
            Self::Equal { a, .. } | Self::Delete { a } | Self::Replace { a, .. } => Some(a),
            Self::Insert { .. } => None,
        }
    }

    /// Destination span, absent for a delete.
    pub fn span_b(&self) -> Option<Span> {
        match *self {
            Self::Equal { b, .. } | Self::Insert { b } | Self::Replace { b, .. } => Some(b),
            Self::Delete { .. } => None,
        }
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, Self::Equal { .. })
    }

    /// Grow every span of the group by one index.
    fn extend(&mut self) {
        match self {
            Self::Equal { a, b } | Self::Replace { a, b } => {
                a.end += 1;
                b.end += 1;
            }
            Self::Insert { b } => b.end += 1,
            Self::Delete { a } => a.end += 1,
        }
    }
}

fn write_pair(f: &mut fmt::Formatter<'_>, tag: &str, a: Span, b: Span) -> fmt::Result {
    if a.len() == 1 && b.len() == 1 {
        write!(f, "{tag}({},{})", a.start, b.start)
    } else if a == b {
        write!(f, "{tag}({a})")
    } else {
        write!(f, "{tag}({a},{b})")
    }
}

impl fmt::Display for EditGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Equal { a, b } => write_pair(f, "E", a, b),
            Self::Insert { b } => write!(f, "I({b})"),
            Self::Delete { a } => write!(f, "D({a})"),
            Self::Replace { a, b } => write_pair(f, "R", a, b),
        }
    }
}

/// Extend the last group when `group` directly continues it, otherwise push it.
fn push_or_extend(groups: &mut Vec<EditGroup>, group: EditGroup) {
    if let Some(last) = groups.last_mut() {
        let contiguous = match (*last, group) {
            (EditGroup::Equal { a, b }, EditGroup::Equal { a: na, b: nb }) => {
                a.continues_with(na.start) && b.continues_with(nb.start)
            }
            (EditGroup::Insert { b }, EditGroup::Insert { b: nb }) => b.continues_with(nb.start),
            (EditGroup::Delete { a }, EditGroup::Delete { a: na }) => a.continues_with(na.start),
            _ => false,
        };
        if contiguous {
            last.extend();
            return;
        }
    }
    groups.push(group);
}

/// Record a mismatched pair: extend a trailing `Delete`+`Insert` pair when both
/// indices continue it, otherwise append a fresh singleton pair.
fn push_mismatch(groups: &mut Vec<EditGroup>, a: usize, b: usize) {
    if let [.., EditGroup::Delete { a: del }, EditGroup::Insert { b: ins }] = groups.as_mut_slice() {
        if del.continues_with(a) && ins.continues_with(b) {
            del.end += 1;
            ins.end += 1;
            return;
        }
    }
    groups.push(EditGroup::delete(a));
    groups.push(EditGroup::insert(b));
}

/// Merge every `Delete` immediately followed by an `Insert` of the same length
/// into one `Replace`. Applying it twice changes nothing.
pub fn post_process(groups: Vec<EditGroup>) -> Vec<EditGroup> {
    let mut out = Vec::with_capacity(groups.len());
    let mut iter = groups.into_iter().peekable();
    while let Some(group) = iter.next() {
        if let EditGroup::Delete { a } = group {
            if let Some(&EditGroup::Insert { b }) = iter.peek() {
                if a.len() == b.len() {
                    iter.next();
                    out.push(EditGroup::Replace { a, b });
                    continue;
                }
            }
        }
        out.push(group);
    }
    out
}

/// Two arrays to be aligned, possibly from different trees.
#[derive(Clone, Copy)]
pub struct ArrayPair<'a> {
    tree_a: &'a Tree,
    array_a: NodeId,
    tree_b: &'a Tree,
    array_b: NodeId,
    caveats: Option<(&'a Bindings<'a>, &'a Bindings<'a>)>,
}

impl<'a> ArrayPair<'a> {
    pub fn new(tree_a: &'a Tree, array_a: NodeId, tree_b: &'a Tree, array_b: NodeId) -> Self {
        Self {
            tree_a,
            array_a,
            tree_b,
            array_b,
            caveats: None,
        }
    }

    /// Let caveats bound to items of either array soften value mismatches.
    pub(crate) fn with_caveats(mut self, bindings_a: &'a Bindings<'a>, bindings_b: &'a Bindings<'a>) -> Self {
        self.caveats = Some((bindings_a, bindings_b));
        self
    }

    pub fn tree_a(&self) -> &'a Tree {
        self.tree_a
    }

    pub fn tree_b(&self) -> &'a Tree {
        self.tree_b
    }

    pub fn items_a(&self) -> &'a [NodeId] {
        self.tree_a.items(self.array_a)
    }

    pub fn items_b(&self) -> &'a [NodeId] {
        self.tree_b.items(self.array_b)
    }

    /// Deep equality of item `i` of the first array and item `j` of the second.
    pub fn items_equal(&self, i: usize, j: usize) -> bool {
        self.tree_a
            .deep_eq(self.items_a()[i], self.tree_b, self.items_b()[j])
    }

    /// Two differing scalar items whose drift a caveat on either item accepts.
    pub(crate) fn within_tolerance(&self, i: usize, j: usize) -> bool {
        let Some((bindings_a, bindings_b)) = self.caveats else {
            return false;
        };
        let (node_a, node_b) = (self.items_a()[i], self.items_b()[j]);
        match (self.tree_a.token(node_a), self.tree_b.token(node_b)) {
            (Token::Value(x), Token::Value(y)) if !x.is_null() && !y.is_null() => {
                let (text_a, text_b) = (x.to_string(), y.to_string());
                bindings_a.accepts(node_a, &text_a, &text_b) || bindings_b.accepts(node_b, &text_a, &text_b)
            }
            _ => false,
        }
    }
}

/// An array alignment strategy.
pub trait Subsequencer {
    /// Edit groups covering both arrays in order, already post-processed.
    fn subsequences(&self, pair: &ArrayPair<'_>) -> Vec<EditGroup>;
}

/// Run the strategy named by `strategy`.
pub(crate) fn align(pair: &ArrayPair<'_>, strategy: &ArrayStrategy) -> Vec<EditGroup> {
    let groups = match strategy {
        ArrayStrategy::Indexed => Indexed.subsequences(pair),
        ArrayStrategy::Keyed(key) => Keyed::new(key.as_str()).subsequences(pair),
        ArrayStrategy::Subsequence => Lcs.subsequences(pair),
    };
    tracing::trace!(strategy = ?strategy, groups = groups.len(), "aligned arrays");
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_like_edit_scripts() {
        assert_eq!(EditGroup::equal(0, 0).to_string(), "E(0,0)");
        assert_eq!(EditGroup::equal(2, 1).to_string(), "E(2,1)");
        let same = EditGroup::Equal {
            a: Span::new(0, 2),
            b: Span::new(0, 2),
        };
        assert_eq!(same.to_string(), "E(0..2)");
        let shifted = EditGroup::Replace {
            a: Span::new(0, 1),
            b: Span::new(3, 4),
        };
        assert_eq!(shifted.to_string(), "R(0..1,3..4)");
        assert_eq!(EditGroup::delete(1).to_string(), "D(1..1)");
    }

    #[test]
    fn post_process_merges_equal_length_pairs_only() {
        let groups = vec![
            EditGroup::Delete { a: Span::new(0, 1) },
            EditGroup::Insert { b: Span::new(0, 1) },
            EditGroup::equal(2, 2),
            EditGroup::delete(3),
            EditGroup::Insert { b: Span::new(3, 4) },
        ];
        let merged = post_process(groups);
        assert_eq!(
            merged,
            vec![
                EditGroup::Replace {
                    a: Span::new(0, 1),
                    b: Span::new(0, 1),
                },
                EditGroup::equal(2, 2),
                EditGroup::delete(3),
                EditGroup::Insert { b: Span::new(3, 4) },
            ]
        );
        assert_eq!(post_process(merged.clone()), merged);
    }

    #[test]
    fn extends_only_contiguous_runs() {
        let mut groups = Vec::new();
        push_or_extend(&mut groups, EditGroup::equal(0, 0));
        push_or_extend(&mut groups, EditGroup::equal(1, 1));
        push_or_extend(&mut groups, EditGroup::equal(3, 2));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].to_string(), "E(0..1)");

        push_mismatch(&mut groups, 4, 3);
        push_mismatch(&mut groups, 5, 4);
        assert_eq!(groups[2].to_string(), "D(4..5)");
        assert_eq!(groups[3].to_string(), "I(3..4)");
    }
}
