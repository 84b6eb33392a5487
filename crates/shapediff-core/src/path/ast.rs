//! Parsed form of a path expression.

use crate::value::Scalar;
use serde::{Serialize, Serializer};
use std::fmt;
use std::num::NonZeroI64;

/// A parsed path: filters applied left to right, starting from a root token.
///
/// Renders back to text with `Display` (`$`, `$.a`, `$.a[2]`, `$['odd key']`)
/// and parses with `FromStr`, so a rendered path selects the token it names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonPath {
    filters: Vec<Filter>,
}

impl JsonPath {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    /// The path that selects only the root (`$`).
    pub fn root() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_root(&self) -> bool {
        self.filters.is_empty()
    }

    /// This path extended by one property step.
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut filters = self.filters.clone();
        filters.push(Filter::Field(Some(name.into())));
        Self { filters }
    }

    /// This path extended by one array index.
    pub fn index(&self, index: usize) -> Self {
        let mut filters = self.filters.clone();
        filters.push(Filter::Index(Some(index as i64)));
        Self { filters }
    }
}

/// One step of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `.name` / `['name']`; `None` is the wildcard `.*`.
    Field(Option<String>),
    /// `['a','b']`
    Fields(Vec<String>),
    /// `[n]` (negative counts from the end); `None` is `[*]`.
    Index(Option<i64>),
    /// `[start:end:step]`, Python-style.
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<NonZeroI64>,
    },
    /// `..name`; `None` is `..*`, every descendant.
    Scan(Option<String>),
    /// `[?(expr)]`
    Query(QueryExpr),
}

/// Boolean predicate inside `[?( )]`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpr {
    /// `@<path> <op> <literal>`, or a bare `@<path>` for [`QueryOperator::Exists`].
    Compare {
        path: Vec<Filter>,
        op: QueryOperator,
        value: Option<Scalar>,
    },
    And(Vec<QueryExpr>),
    Or(Vec<QueryExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equals,
    NotEquals,
    Exists,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
}

impl QueryOperator {
    fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::Exists => "",
            Self::LessThan => "<",
            Self::LessThanOrEquals => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEquals => ">=",
        }
    }
}

/// Names that can be written after a dot without quoting.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn write_quoted(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in name.chars() {
        if c == '\'' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("'")
}

fn write_filters(f: &mut fmt::Formatter<'_>, filters: &[Filter]) -> fmt::Result {
    filters.iter().try_for_each(|filter| write!(f, "{filter}"))
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        write_filters(f, &self.filters)
    }
}

impl Serialize for JsonPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(None) => f.write_str(".*"),
            Self::Field(Some(name)) if is_plain_name(name) => write!(f, ".{name}"),
            Self::Field(Some(name)) => {
                f.write_str("[")?;
                write_quoted(f, name)?;
                f.write_str("]")
            }
            Self::Fields(names) => {
                f.write_str("[")?;
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_quoted(f, name)?;
                }
                f.write_str("]")
            }
            Self::Index(None) => f.write_str("[*]"),
            Self::Index(Some(i)) => write!(f, "[{i}]"),
            Self::Slice { start, end, step } => {
                f.write_str("[")?;
                if let Some(s) = start {
                    write!(f, "{s}")?;
                }
                f.write_str(":")?;
                if let Some(e) = end {
                    write!(f, "{e}")?;
                }
                if let Some(st) = step {
                    write!(f, ":{st}")?;
                }
                f.write_str("]")
            }
            Self::Scan(None) => f.write_str("..*"),
            Self::Scan(Some(name)) if is_plain_name(name) => write!(f, "..{name}"),
            Self::Scan(Some(name)) => {
                f.write_str("..[")?;
                write_quoted(f, name)?;
                f.write_str("]")
            }
            Self::Query(expr) => write!(f, "[?({expr})]"),
        }
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { path, op, value } => {
                f.write_str("@")?;
                write_filters(f, path)?;
                if *op == QueryOperator::Exists {
                    return Ok(());
                }
                write!(f, " {} ", op.symbol())?;
                match value {
                    Some(Scalar::String(s)) => write_quoted(f, s),
                    Some(v) => write!(f, "{v}"),
                    None => f.write_str("null"),
                }
            }
            Self::And(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" && ")?;
                    }
                    match part {
                        Self::Or(_) => write!(f, "({part})")?,
                        _ => write!(f, "{part}")?,
                    }
                }
                Ok(())
            }
            Self::Or(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" || ")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}
