//! Comparison settings: hints (how to align arrays) and caveats (how much a
//! value may drift), each scoped by a path.
//!
//! Settings hold paths as text. [`Bindings::bind`] parses them and resolves
//! them against one tree, producing a side table keyed by [`NodeId`] that
//! lives for a single comparison.

use crate::error::PathError;
use crate::path::JsonPath;
use crate::tree::{NodeId, Tree};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the items of two arrays are paired up before comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayStrategy {
    /// Position by position.
    #[default]
    Indexed,
    /// Join object items on the named property.
    Keyed(String),
    /// Minimal edit script by longest common subsequence.
    Subsequence,
}

/// Alignment strategy for the arrays matched by `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hint {
    pub path: String,
    pub strategy: ArrayStrategy,
}

/// Numeric tolerance for the values matched by `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caveat {
    pub path: String,
    pub variance: f64,
}

impl Caveat {
    /// Whether two renderings are close enough: both must read as numbers no
    /// more than `variance` apart.
    pub fn is_acceptable(&self, a: &str, b: &str) -> bool {
        let (Ok(x), Ok(y)) = (a.trim().parse::<f64>(), b.trim().parse::<f64>()) else {
            return false;
        };
        let delta = (x - y).abs();
        // Decimal inputs like 10.00 vs 10.05 land a hair above 0.05 in binary.
        let slack = 1e-9 * x.abs().max(y.abs()).max(self.variance.abs()).max(1.0);
        delta <= self.variance + slack
    }
}

/// Everything a caller can configure about one comparison.
///
/// ```
/// use shapediff_core::DiffSettings;
///
/// let settings = DiffSettings::new()
///     .keyed_by("$.orders", "id")
///     .can_vary_by("$.orders[*].total", 0.01);
/// assert_eq!(settings.hints.len(), 1);
/// assert_eq!(settings.caveats.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    pub hints: Vec<Hint>,
    pub caveats: Vec<Caveat>,
}

impl DiffSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Align the arrays at `path` with `strategy`.
    pub fn aligned_by(mut self, path: impl Into<String>, strategy: ArrayStrategy) -> Self {
        self.hints.push(Hint {
            path: path.into(),
            strategy,
        });
        self
    }

    /// Align the arrays at `path` by joining their objects on property `key`.
    pub fn keyed_by(self, path: impl Into<String>, key: impl Into<String>) -> Self {
        self.aligned_by(path, ArrayStrategy::Keyed(key.into()))
    }

    /// Align the arrays at `path` by longest common subsequence.
    pub fn aligned_by_subsequence(self, path: impl Into<String>) -> Self {
        self.aligned_by(path, ArrayStrategy::Subsequence)
    }

    /// Tolerate numeric drift up to `amount` in the values at `path`.
    pub fn can_vary_by(mut self, path: impl Into<String>, amount: f64) -> Self {
        self.caveats.push(Caveat {
            path: path.into(),
            variance: amount,
        });
        self
    }

    /// Append another set of settings after this one.
    pub fn extend(&mut self, other: DiffSettings) {
        self.hints.extend(other.hints);
        self.caveats.extend(other.caveats);
    }
}

/// Hints and caveats of one [`DiffSettings`] resolved against one tree.
#[derive(Debug, Default)]
pub(crate) struct Bindings<'s> {
    hints: HashMap<NodeId, Vec<&'s Hint>>,
    caveats: HashMap<NodeId, Vec<&'s Caveat>>,
}

impl<'s> Bindings<'s> {
    /// Attach every hint and caveat to each token its path selects.
    pub(crate) fn bind(tree: &Tree, settings: &'s DiffSettings) -> Result<Self, PathError> {
        let mut bindings = Self::default();
        for hint in &settings.hints {
            let path: JsonPath = hint.path.parse()?;
            let mut count = 0usize;
            for node in tree.select_tokens(&path) {
                bindings.hints.entry(node).or_default().push(hint);
                count += 1;
            }
            tracing::debug!(path = %hint.path, strategy = ?hint.strategy, matches = count, "bound hint");
        }
        for caveat in &settings.caveats {
            let path: JsonPath = caveat.path.parse()?;
            let mut count = 0usize;
            for node in tree.select_tokens(&path) {
                bindings.caveats.entry(node).or_default().push(caveat);
                count += 1;
            }
            tracing::debug!(path = %caveat.path, variance = caveat.variance, matches = count, "bound caveat");
        }
        Ok(bindings)
    }

    /// Strategy from the first hint bound to `node`.
    pub(crate) fn strategy(&self, node: NodeId) -> Option<&'s ArrayStrategy> {
        self.hints
            .get(&node)
            .and_then(|hints| hints.first())
            .map(|hint| &hint.strategy)
    }

    pub(crate) fn caveats(&self, node: NodeId) -> &[&'s Caveat] {
        self.caveats.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any caveat bound to `node` accepts the two renderings.
    pub(crate) fn accepts(&self, node: NodeId, a: &str, b: &str) -> bool {
        self.caveats(node).iter().any(|c| c.is_acceptable(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_is_inclusive() {
        let caveat = Caveat {
            path: "$".into(),
            variance: 0.05,
        };
        assert!(caveat.is_acceptable("10.00", "10.05"));
        assert!(caveat.is_acceptable("10", "10.02"));
        assert!(!caveat.is_acceptable("10", "10.06"));
        assert!(!caveat.is_acceptable("ten", "10"));
    }

    #[test]
    fn settings_read_from_json() {
        let settings: DiffSettings = serde_json::from_str(
            r#"{"hints":[{"path":"$.items","strategy":{"keyed":"id"}},
                         {"path":"$.tags","strategy":"subsequence"}],
                "caveats":[{"path":"$..price","variance":0.05}]}"#,
        )
        .unwrap();
        assert_eq!(
            settings,
            DiffSettings::new()
                .keyed_by("$.items", "id")
                .aligned_by_subsequence("$.tags")
                .can_vary_by("$..price", 0.05)
        );
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let settings: DiffSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, DiffSettings::default());
    }
}
