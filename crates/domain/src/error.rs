//! Unified error types for the domain layer
//!
//! Provides a common error type that can be used across all domain operations,
//! so adapters can report rule and record problems without resorting to String or anyhow.

use thiserror::Error;

use crate::value_objects::NodePathError;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A rule definition is incomplete or contradictory
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// A path expression failed to compile
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] NodePathError),
}

impl DomainError {
    /// Creates an invalid rule error.
    ///
    /// Use this when a rule set entry is missing a required key or names
    /// something the engine cannot act on:
    /// - A list rule without `name`, `container`, `item_pattern` or `fields`
    /// - A structured field spec without a `path`
    ///
    /// # Example
    /// ```ignore
    /// if item_pattern.is_empty() {
    ///     return Err(DomainError::invalid_rule("list rule 'Weapons' has no item_pattern"));
    /// }
    /// ```
    pub fn invalid_rule(msg: impl Into<String>) -> Self {
        Self::InvalidRule(msg.into())
    }
}
