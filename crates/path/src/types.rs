//! Type definitions for property paths.

use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Reserved path denoting the entire state tree as one unit.
pub const FULL_STATE_SELECTOR: &str = "@@STATE";

/// One step of a property path.
///
/// A token keeps its source text. When the text is an integer literal the
/// parsed value is kept alongside it; whether it addresses an array slot or a
/// map key is only decided when the token meets a concrete container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    text: String,
    index: Option<i64>,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let index = parse_integer(&text);
        Self { text, index }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The integer value of this token, negative values included.
    pub fn index(&self) -> Option<i64> {
        self.index
    }

    pub fn is_negative_index(&self) -> bool {
        self.index.is_some_and(|i| i < 0)
    }

    /// Resolves this token to a concrete position in a sequence of `len`
    /// items. Negative tokens count from the end. Returns `None` when the
    /// token is not an integer or falls outside `[0, len)`.
    pub fn resolve_index(&self, len: usize) -> Option<usize> {
        let i = self.index?;
        let resolved = if i < 0 { len as i64 + i } else { i };
        if resolved < 0 || resolved >= len as i64 {
            None
        } else {
            Some(resolved as usize)
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "[{}]", i),
            None => f.write_str(&self.text),
        }
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token::new(s)
    }
}

impl From<i64> for Token {
    fn from(i: i64) -> Self {
        Token {
            text: i.to_string(),
            index: Some(i),
        }
    }
}

/// Accepts `0`, `17`, `-3`; rejects `01`, `+1`, `1.5`, `-0`.
pub fn parse_integer(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if text.starts_with('-') && digits == "0" {
        return None;
    }
    text.parse().ok()
}

/// A parsed property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyPath {
    /// The whole-tree sentinel.
    Whole,
    Tokens(Vec<Token>),
}

impl PropertyPath {
    pub fn is_whole(&self) -> bool {
        matches!(self, PropertyPath::Whole)
    }

    /// Tokens of this path. The whole-tree sentinel has none.
    pub fn tokens(&self) -> &[Token] {
        match self {
            PropertyPath::Whole => &[],
            PropertyPath::Tokens(tokens) => tokens,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens().is_empty()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format_property_path(self))
    }
}

impl From<&str> for PropertyPath {
    fn from(s: &str) -> Self {
        crate::parse_property_path(s)
    }
}

/// The outcome of resolving a [`PropertyPath`] against a tree.
///
/// When the path exists, `container` and `key` locate the value inside its
/// parent and `trail` holds the concrete keys leading to that parent. When it
/// does not, `container` is the deepest value that was reached, `key` the
/// first step that could not be followed and `trail` the keys leading to
/// `container`. Negative indices appear in `trail` already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference<'a> {
    pub exists: bool,
    pub value: Option<Cow<'a, Value>>,
    pub container: Option<&'a Value>,
    pub key: Option<String>,
    pub trail: Vec<String>,
}

impl<'a> Reference<'a> {
    /// The resolved value, or `null` when the path does not exist.
    pub fn value_or_null(&self) -> Value {
        match &self.value {
            Some(v) => v.as_ref().clone(),
            None => Value::Null,
        }
    }

    /// Concrete keys of the existing part of the path, `key` included when
    /// the path exists.
    pub fn concrete_path(&self) -> Vec<String> {
        let mut out = self.trail.clone();
        if self.exists {
            out.extend(self.key.iter().cloned());
        }
        out
    }
}
