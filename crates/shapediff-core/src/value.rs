//! Scalar payloads held by leaf tokens.
//!
//! Every supported scalar kind is a variant of [`Scalar`], and comparison is an
//! explicit per-kind function ([`Scalar::compare`]). Integers and floats
//! compare with each other numerically; floats use a relative epsilon so that
//! binary rounding noise (`0.1 + 0.2` vs `0.3`) is not reported as a change.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// The kind tag of a [`Scalar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Date,
    Guid,
    Uri,
    TimeSpan,
    Comment,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A leaf value.
///
/// `Integer` is held as `i128` so that the full `i64` and `u64` ranges produced
/// by JSON parsers fit in one variant.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Boolean(bool),
    Integer(i128),
    Float(f64),
    String(String),
    Date(DateTime<FixedOffset>),
    Guid(Uuid),
    Uri(String),
    TimeSpan(TimeDelta),
    Comment(String),
}

impl Scalar {
    /// Build a `Uri` scalar. URIs are compared by their text.
    pub fn uri(text: impl Into<String>) -> Self {
        Self::Uri(text.into())
    }

    /// Build a `Comment` scalar. Comments compare like strings.
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Integer(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::String(_) => ValueType::String,
            Self::Date(_) => ValueType::Date,
            Self::Guid(_) => ValueType::Guid,
            Self::Uri(_) => ValueType::Uri,
            Self::TimeSpan(_) => ValueType::TimeSpan,
            Self::Comment(_) => ValueType::Comment,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the scalar, if it is an integer or a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Type-aware ordering.
    ///
    /// Returns `None` when the two kinds are not comparable (a string and a
    /// date, say) or when a float is NaN.
    ///
    /// - `Integer`/`Float` compare numerically across kinds.
    /// - `String` and `Comment` compare ordinally (byte order) with each other.
    /// - `Date` compares instants, so differing offsets of the same moment are equal.
    /// - Every other kind only compares with itself.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        use Scalar::*;
        match (self, other) {
            (Null, Null) => Some(Ordering::Equal),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Integer(a), Float(b)) => compare_float(*a as f64, *b),
            (Float(a), Integer(b)) => compare_float(*a, *b as f64),
            (Float(a), Float(b)) => compare_float(*a, *b),
            (String(a) | Comment(a), String(b) | Comment(b)) => Some(a.as_str().cmp(b.as_str())),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Guid(a), Guid(b)) => Some(a.cmp(b)),
            (Uri(a), Uri(b)) => Some(a.cmp(b)),
            (TimeSpan(a), TimeSpan(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub(crate) fn from_json_number(n: &serde_json::Number) -> Self {
        if let Some(i) = n.as_i64() {
            Self::Integer(i128::from(i))
        } else if let Some(u) = n.as_u64() {
            Self::Integer(i128::from(u))
        } else {
            // serde_json only hands out finite floats.
            Self::Float(n.as_f64().unwrap_or(f64::NAN))
        }
    }
}

/// Float equality with a tolerance scaled to the operands' magnitude.
fn compare_float(a: f64, b: f64) -> Option<Ordering> {
    if approx_eq(a, b) {
        return Some(Ordering::Equal);
    }
    a.partial_cmp(&b)
}

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let tolerance = (a.abs() + b.abs() + 10.0) * f64::EPSILON;
    let delta = a - b;
    -tolerance < delta && delta < tolerance
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

/// The textual rendering used in annotation messages and by caveats.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) | Self::Uri(s) | Self::Comment(s) => f.write_str(s),
            Self::Date(d) => f.write_str(&format_date(d)),
            Self::Guid(g) => write!(f, "{}", g.hyphenated()),
            Self::TimeSpan(t) => f.write_str(&format_time_span(t)),
        }
    }
}

pub(crate) fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Render a duration as `[-][d.]hh:mm:ss[.fffffffff]`.
pub(crate) fn format_time_span(span: &TimeDelta) -> String {
    let negative = *span < TimeDelta::zero();
    let magnitude = span.abs();
    let total_seconds = magnitude.num_seconds();
    let nanos = magnitude.subsec_nanos();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if nanos > 0 {
        let fraction = format!("{nanos:09}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Integer(i128::from(value))
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(i128::from(value))
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Self::Integer(i128::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<DateTime<FixedOffset>> for Scalar {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Date(value)
    }
}

impl From<Uuid> for Scalar {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}

impl From<TimeDelta> for Scalar {
    fn from(value: TimeDelta) -> Self {
        Self::TimeSpan(value)
    }
}
