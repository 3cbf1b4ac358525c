//! Signed modifiers and the lenient number parsing used on sheet values.

use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// A signed bonus or penalty, always rendered with its sign ("+2", "-1", "+0").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Modifier(pub i64);

impl Modifier {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

impl FromStr for Modifier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_lenient_int(s)
            .map(Modifier)
            .ok_or_else(|| DomainError::parse(format!("Not a modifier: '{}'", s)))
    }
}

impl From<i64> for Modifier {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Parse an integer the way sheet exports write them.
///
/// Surrounding whitespace and a leading `+` are accepted; anything else
/// that is not a plain integer yields `None`.
pub fn parse_lenient_int(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed).trim_start();
    if digits.starts_with('+') {
        return None;
    }
    digits.parse().ok()
}

/// Upper-case the first character and lower-case the rest ("wisdom" -> "Wisdom").
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
