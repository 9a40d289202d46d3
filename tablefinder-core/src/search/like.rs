//! SQL LIKE pattern handling.
//!
//! Patterns are used in two places: partial-match parameters bound into
//! column queries, and the `--table-pattern` filter, which is evaluated in
//! process against catalog names.

use crate::config::WildcardMode;
use regex::Regex;

/// Escape character used in every rendered `LIKE ... ESCAPE` clause.
pub const LIKE_ESCAPE: char = '\\';

/// Piece of a parsed LIKE pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToken {
    /// `%`
    AnySequence,
    /// `_`
    AnyChar,
    Literal(char),
}

/// Splits a LIKE pattern into tokens.
///
/// When `escape` is set, the character following it is always literal and a
/// trailing escape character stands for itself.
pub fn tokenize(pattern: &str, escape: Option<char>) -> Vec<LikeToken> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if Some(c) == escape {
            tokens.push(LikeToken::Literal(chars.next().unwrap_or(c)));
            continue;
        }
        tokens.push(match c {
            '%' => LikeToken::AnySequence,
            '_' => LikeToken::AnyChar,
            other => LikeToken::Literal(other),
        });
    }
    tokens
}

/// Escapes `%`, `_` and the escape character so `value` matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len().saturating_add(4));
    for c in value.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the `%value%` parameter for a partial match.
pub fn contains_pattern(value: &str, mode: WildcardMode) -> String {
    match mode {
        WildcardMode::Escaped => format!("%{}%", escape_like(value)),
        WildcardMode::Raw => format!("%{}%", value),
    }
}

/// Translates a LIKE pattern into an SQLite GLOB pattern.
///
/// GLOB is case-sensitive, which makes it the way to express a
/// case-sensitive partial match on SQLite. GLOB metacharacters that appear
/// literally are wrapped in a one-character class.
pub fn like_to_glob(pattern: &str, escape: Option<char>) -> String {
    let mut glob = String::with_capacity(pattern.len().saturating_add(2));
    for token in tokenize(pattern, escape) {
        match token {
            LikeToken::AnySequence => glob.push('*'),
            LikeToken::AnyChar => glob.push('?'),
            LikeToken::Literal(c @ ('*' | '?' | '[')) => {
                glob.push('[');
                glob.push(c);
                glob.push(']');
            }
            LikeToken::Literal(c) => glob.push(c),
        }
    }
    glob
}

/// In-process matcher with SQL LIKE semantics, case-insensitive.
///
/// # Example
/// ```rust
/// use tablefinder_core::search::like::LikeMatcher;
///
/// let matcher = LikeMatcher::new("cust%").unwrap();
/// assert!(matcher.is_match("Customers"));
/// assert!(!matcher.is_match("Orders"));
/// ```
#[derive(Debug, Clone)]
pub struct LikeMatcher {
    pattern: String,
    regex: Regex,
}

impl LikeMatcher {
    /// Compiles `pattern`, honouring `\` as the escape character.
    ///
    /// # Errors
    /// Returns a configuration error if the resulting expression is too large.
    pub fn new(pattern: &str) -> crate::Result<Self> {
        let mut expr = String::from("(?is)^");
        for token in tokenize(pattern, Some(LIKE_ESCAPE)) {
            match token {
                LikeToken::AnySequence => expr.push_str(".*"),
                LikeToken::AnyChar => expr.push('.'),
                LikeToken::Literal(c) => {
                    let mut buf = [0u8; 4];
                    expr.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                }
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| {
            crate::error::TableFinderError::configuration(format!(
                "Invalid table pattern '{}': {}",
                pattern, e
            ))
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Returns true when the whole of `name` satisfies the pattern.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// The pattern as supplied.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}
