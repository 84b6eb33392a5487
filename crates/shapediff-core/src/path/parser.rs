//! Recursive-descent parser for path text.
//!
//! Grammar, loosely:
//!
//! ```text
//! path     := ['$'] [name] step*
//! step     := '.' name | '.*' | '..' name | '..*' | '[' bracket ']'
//! bracket  := quoted (',' quoted)* | int | '*' | [int] ':' [int] [':' [int]] | '?(' or ')'
//! or       := and ('||' and)*
//! and      := atom ('&&' atom)*
//! atom     := '(' or ')' | '@' step* [op literal]
//! ```

use super::ast::{Filter, JsonPath, QueryExpr, QueryOperator};
use crate::error::PathError;
use crate::value::Scalar;
use std::num::NonZeroI64;

type ParseResult<T> = Result<T, PathError>;

pub(crate) fn parse(text: &str) -> ParseResult<JsonPath> {
    let mut parser = Parser {
        chars: text.chars().collect(),
        pos: 0,
    };
    parser.skip_whitespace();
    let filters = parser.parse_filters(false)?;
    parser.skip_whitespace();
    if let Some(c) = parser.peek() {
        return Err(parser.error(format!("Unexpected character while parsing path: {c}")));
    }
    Ok(JsonPath::new(filters))
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let matches = s
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c));
        if matches {
            self.pos += s.chars().count();
        }
        matches
    }

    fn expect(&mut self, c: char) -> ParseResult<()> {
        if self.eat(c) {
            return Ok(());
        }
        match self.peek() {
            Some(found) => Err(self.error(format!("Expected '{c}', found '{found}'"))),
            None => Err(self.error(format!("Unexpected end while parsing path, expected '{c}'"))),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> PathError {
        PathError::syntax(self.pos, message)
    }

    /// Characters that end an unquoted name.
    fn ends_name(c: char, in_query: bool) -> bool {
        matches!(c, '.' | '[' | ']' | '(' | ')' | '\'' | '"' | ',')
            || c.is_whitespace()
            || (in_query && matches!(c, '=' | '!' | '<' | '>' | '&' | '|'))
    }

    fn read_name(&mut self, in_query: bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| !Self::ends_name(c, in_query)) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Filters up to the end of input, or, inside a query, up to the first
    /// character that cannot continue a sub-path.
    fn parse_filters(&mut self, in_query: bool) -> ParseResult<Vec<Filter>> {
        let mut filters = Vec::new();
        let root = if in_query { '@' } else { '$' };
        let mut had_root = false;
        if self.peek() == Some(root)
            && self
                .peek_at(1)
                .map_or(true, |c| matches!(c, '.' | '[') || Self::ends_name(c, in_query))
        {
            self.pos += 1;
            had_root = true;
        } else if in_query {
            return Err(self.error("Query sub-paths must start with '@'"));
        }

        loop {
            match self.peek() {
                None => break,
                Some('.') if self.peek_at(1) == Some('.') => {
                    self.pos += 2;
                    filters.push(self.parse_scan(in_query)?);
                }
                Some('.') => {
                    self.pos += 1;
                    if self.eat('*') {
                        filters.push(Filter::Field(None));
                    } else {
                        let name = self.read_name(in_query);
                        if name.is_empty() {
                            return Err(match self.peek() {
                                Some(c) => self.error(format!("Unexpected character while parsing path: {c}")),
                                None => self.error("Unexpected end while parsing path"),
                            });
                        }
                        filters.push(Filter::Field(Some(name)));
                    }
                }
                Some('[') => {
                    self.pos += 1;
                    filters.push(self.parse_bracket()?);
                }
                Some(c) if in_query && Self::ends_name(c, true) => break,
                Some(_) if filters.is_empty() && !had_root => {
                    let name = self.read_name(in_query);
                    if name.is_empty() {
                        break;
                    }
                    filters.push(Filter::Field(Some(name)));
                }
                Some(c) if !in_query && c.is_whitespace() => break,
                Some(c) => {
                    return Err(self.error(format!("Unexpected character while parsing path: {c}")));
                }
            }
        }
        Ok(filters)
    }

    fn parse_scan(&mut self, in_query: bool) -> ParseResult<Filter> {
        // `..[` leaves the bracket to be parsed as the next step.
        if self.peek().is_none() || self.peek() == Some('[') {
            return Ok(Filter::Scan(None));
        }
        if self.eat('*') {
            return Ok(Filter::Scan(None));
        }
        let name = self.read_name(in_query);
        if name.is_empty() {
            return Err(self.error("Unexpected character following recursive descent"));
        }
        Ok(Filter::Scan(Some(name)))
    }

    /// Everything after `[` up to and including the matching `]`.
    fn parse_bracket(&mut self) -> ParseResult<Filter> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("Path ended with open indexer")),
            Some('?') => {
                self.pos += 1;
                self.expect('(')?;
                let expr = self.parse_or()?;
                self.skip_whitespace();
                self.expect(')')?;
                self.skip_whitespace();
                self.expect(']')?;
                Ok(Filter::Query(expr))
            }
            Some('\'' | '"') => {
                let mut names = vec![self.read_quoted()?];
                loop {
                    self.skip_whitespace();
                    if self.eat(']') {
                        break;
                    }
                    self.expect(',')?;
                    self.skip_whitespace();
                    names.push(self.read_quoted()?);
                }
                Ok(if names.len() == 1 {
                    Filter::Field(names.pop())
                } else {
                    Filter::Fields(names)
                })
            }
            Some('*') => {
                self.pos += 1;
                self.skip_whitespace();
                self.expect(']')?;
                Ok(Filter::Index(None))
            }
            Some(_) => self.parse_index_or_slice(),
        }
    }

    fn parse_index_or_slice(&mut self) -> ParseResult<Filter> {
        let start = self.pos;
        let Some(offset) = self.chars[start..].iter().position(|&c| c == ']') else {
            self.pos = self.chars.len();
            return Err(self.error("Path ended with open indexer"));
        };
        let body: String = self.chars[start..start + offset].iter().collect();
        let parts: Vec<&str> = body.split(':').map(str::trim).collect();

        let number = |text: &str, at: usize| -> ParseResult<Option<i64>> {
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<i64>()
                .map(Some)
                .map_err(|_| PathError::syntax(at, format!("Could not read array index '{text}'")))
        };

        let filter = match parts.as_slice() {
            [index] => match number(*index, start)? {
                Some(i) => Filter::Index(Some(i)),
                None => return Err(PathError::syntax(start, "Array index expected")),
            },
            [s, e] => Filter::Slice {
                start: number(*s, start)?,
                end: number(*e, start)?,
                step: None,
            },
            [s, e, st] => {
                let step = match number(*st, start)? {
                    Some(raw) => Some(
                        NonZeroI64::new(raw)
                            .ok_or_else(|| PathError::syntax(start, "Step cannot be zero"))?,
                    ),
                    None => None,
                };
                Filter::Slice {
                    start: number(*s, start)?,
                    end: number(*e, start)?,
                    step,
                }
            }
            _ => return Err(PathError::syntax(start, "Too many ':' in array slice")),
        };
        self.pos = start + offset + 1;
        Ok(filter)
    }

    fn read_quoted(&mut self) -> ParseResult<String> {
        let Some(quote) = self.peek().filter(|c| matches!(c, '\'' | '"')) else {
            return Err(self.error("Expected a quoted name"));
        };
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("Path ended with an open string")),
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c @ ('\\' | '\'' | '"' | '/')) => out.push(c),
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some('r') => out.push('\r'),
                        Some(c) => return Err(self.error(format!("Unknown escape character: \\{c}"))),
                        None => return Err(self.error("Path ended with an open string")),
                    }
                    self.pos += 1;
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Query expressions
    // ------------------------------------------------------------------

    fn parse_or(&mut self) -> ParseResult<QueryExpr> {
        let mut parts = vec![self.parse_and()?];
        loop {
            self.skip_whitespace();
            if !self.eat_str("||") {
                break;
            }
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            QueryExpr::Or(parts)
        })
    }

    fn parse_and(&mut self) -> ParseResult<QueryExpr> {
        let mut parts = vec![self.parse_atom()?];
        loop {
            self.skip_whitespace();
            if !self.eat_str("&&") {
                break;
            }
            parts.push(self.parse_atom()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            QueryExpr::And(parts)
        })
    }

    fn parse_atom(&mut self) -> ParseResult<QueryExpr> {
        self.skip_whitespace();
        if self.eat('(') {
            let inner = self.parse_or()?;
            self.skip_whitespace();
            self.expect(')')?;
            return Ok(inner);
        }
        let path = self.parse_filters(true)?;
        self.skip_whitespace();
        let Some(op) = self.parse_operator() else {
            return Ok(QueryExpr::Compare {
                path,
                op: QueryOperator::Exists,
                value: None,
            });
        };
        self.skip_whitespace();
        let value = self.parse_literal()?;
        Ok(QueryExpr::Compare {
            path,
            op,
            value: Some(value),
        })
    }

    fn parse_operator(&mut self) -> Option<QueryOperator> {
        const OPERATORS: [(&str, QueryOperator); 7] = [
            ("==", QueryOperator::Equals),
            ("!=", QueryOperator::NotEquals),
            ("<=", QueryOperator::LessThanOrEquals),
            (">=", QueryOperator::GreaterThanOrEquals),
            ("=", QueryOperator::Equals),
            ("<", QueryOperator::LessThan),
            (">", QueryOperator::GreaterThan),
        ];
        OPERATORS
            .iter()
            .find(|(symbol, _)| self.eat_str(symbol))
            .map(|&(_, op)| op)
    }

    fn parse_literal(&mut self) -> ParseResult<Scalar> {
        match self.peek() {
            Some('\'' | '"') => Ok(Scalar::String(self.read_quoted()?)),
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
                {
                    self.pos += 1;
                }
                let text: String = self.chars[start..self.pos].iter().collect();
                if let Ok(i) = text.parse::<i64>() {
                    Ok(Scalar::from(i))
                } else {
                    text.parse::<f64>()
                        .map(Scalar::from)
                        .map_err(|_| PathError::syntax(start, format!("Could not read query value '{text}'")))
                }
            }
            _ if self.eat_str("true") => Ok(Scalar::Boolean(true)),
            _ if self.eat_str("false") => Ok(Scalar::Boolean(false)),
            _ if self.eat_str("null") => Ok(Scalar::Null),
            Some(c) => Err(self.error(format!("Unexpected character while parsing query value: {c}"))),
            None => Err(self.error("Path ended while parsing query value")),
        }
    }
}
