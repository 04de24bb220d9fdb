//! Typed construction of query predicates.
//!
//! The server owns the grammar; this only renders well-formed predicate
//! text such as `name == w'*.jpg' or (attribute.name == 'exif')`.

use crate::error::ApiError;
use std::fmt;
use std::str::FromStr;

/// Literal flavours, written as a one-letter prefix before the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// `'x'`
    Plain,
    /// `u'x'`: explicit string
    Fixed,
    /// `r'x'`: regular expression
    Regex,
    /// `w'x'`: glob wildcard with `*` and `?`
    Wildcard,
    /// `f'x'`: fuzzy match
    Fuzzy,
    /// `t'x'`: text match over both UTF-8 and UTF-16 encodings
    Text,
}

impl LiteralKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            LiteralKind::Plain => "",
            LiteralKind::Fixed => "u",
            LiteralKind::Regex => "r",
            LiteralKind::Wildcard => "w",
            LiteralKind::Fuzzy => "f",
            LiteralKind::Text => "t",
        }
    }
}

/// A quoted literal on the right-hand side of `==`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    kind: LiteralKind,
    text: String,
}

impl Literal {
    /// The grammar has no quote escape, so `'` cannot appear in a literal.
    pub fn new(kind: LiteralKind, text: impl Into<String>) -> Result<Self, ApiError> {
        let text = text.into();
        if text.contains('\'') {
            return Err(ApiError::InvalidPredicate(format!(
                "literal cannot contain a single quote: {}",
                text
            )));
        }
        Ok(Self { kind, text })
    }

    pub fn plain(text: impl Into<String>) -> Result<Self, ApiError> {
        Self::new(LiteralKind::Plain, text)
    }

    pub fn fixed(text: impl Into<String>) -> Result<Self, ApiError> {
        Self::new(LiteralKind::Fixed, text)
    }

    pub fn regex(text: impl Into<String>) -> Result<Self, ApiError> {
        Self::new(LiteralKind::Regex, text)
    }

    pub fn wildcard(text: impl Into<String>) -> Result<Self, ApiError> {
        Self::new(LiteralKind::Wildcard, text)
    }

    pub fn fuzzy(text: impl Into<String>) -> Result<Self, ApiError> {
        Self::new(LiteralKind::Fuzzy, text)
    }

    pub fn text(text: impl Into<String>) -> Result<Self, ApiError> {
        Self::new(LiteralKind::Text, text)
    }

    /// Bytes written as `\xHH` escapes, e.g. an ELF magic `\x7F\x45\x4C\x46`.
    pub fn escaped_bytes(kind: LiteralKind, bytes: &[u8]) -> Self {
        let text = bytes.iter().map(|b| format!("\\x{:02X}", b)).collect();
        Self { kind, text }
    }

    pub fn kind(&self) -> LiteralKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'{}'", self.kind.prefix(), self.text)
    }
}

/// Left-hand side of a comparison: a dotted attribute path, where any
/// segment may use `*`/`?` wildcards (`exif.*.model`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    segments: Vec<String>,
}

impl AttributePath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.contains('*') || s.contains('?'))
    }
}

impl FromStr for AttributePath {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        for segment in s.split('.') {
            if segment.is_empty() {
                return Err(ApiError::InvalidPredicate(format!(
                    "empty segment in attribute path '{}'",
                    s
                )));
            }
            if let Some(bad) = segment
                .chars()
                .find(|c| c.is_whitespace() || matches!(c, '\'' | '(' | ')' | '=' | '"'))
            {
                return Err(ApiError::InvalidPredicate(format!(
                    "character {:?} not allowed in attribute path '{}'",
                    bad, s
                )));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Boolean predicate tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Equals {
        target: AttributePath,
        literal: Literal,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// `target == literal`
    pub fn eq(target: &str, literal: Literal) -> Result<Self, ApiError> {
        Ok(Predicate::Equals {
            target: target.parse()?,
            literal,
        })
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    fn is_composite(&self) -> bool {
        !matches!(self, Predicate::Equals { .. })
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_composite() {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Composite operands are always parenthesized; the server applies no
/// precedence the client relies on.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals { target, literal } => write!(f, "{} == {}", target, literal),
            Predicate::And(lhs, rhs) => {
                lhs.fmt_operand(f)?;
                f.write_str(" and ")?;
                rhs.fmt_operand(f)
            }
            Predicate::Or(lhs, rhs) => {
                lhs.fmt_operand(f)?;
                f.write_str(" or ")?;
                rhs.fmt_operand(f)
            }
        }
    }
}
