//! Game system traits for deriving sheet values.
//!
//! These traits define the interface every enrichment strategy implements,
//! so callers can treat any ruleset (or none at all) identically.

use thiserror::Error;

use crate::record::Record;

/// Core trait all enrichment strategies must implement.
///
/// An enricher derives new fields from what extraction produced. It may add
/// or overwrite the keys it documents as derived and must leave everything
/// else alone.
pub trait EnrichmentStrategy: Send + Sync {
    /// Unique identifier for this strategy (e.g., "dnd5e", "none").
    fn system_id(&self) -> &str;

    /// Human-readable display name (e.g., "D&D 5th Edition").
    fn display_name(&self) -> &str;

    /// Derive fields in place.
    ///
    /// On error the record may be partially enriched; callers report the
    /// error and carry on with whatever was derived.
    fn enrich(&self, record: &mut Record) -> Result<(), EnrichError>;
}

/// Calculation rules that vary per game system.
///
/// Returns `None` when the result does not fit in an `i64`.
pub trait CalculationEngine: Send + Sync {
    /// Calculate ability modifier from score.
    ///
    /// For D&D-like systems: floor((score - 10) / 2)
    fn ability_modifier(&self, score: i64) -> Option<i64>;

    /// Calculate proficiency bonus from total character level.
    ///
    /// For D&D 5e: ((level - 1) / 4) + 2
    fn proficiency_bonus(&self, total_level: i64) -> Option<i64>;

    /// Calculate spell save DC.
    ///
    /// For D&D 5e: 8 + proficiency + casting stat modifier
    fn spell_save_dc(&self, proficiency_bonus: i64, ability_modifier: i64) -> Option<i64>;

    /// Calculate a passive score from a skill total (passive perception).
    fn passive_score(&self, skill_total: i64) -> Option<i64>;
}

/// A derivation stage failed as a whole.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnrichError {
    #[error("Stage '{stage}' overflowed computing {field}")]
    Overflow { stage: &'static str, field: String },

    #[error("Stage '{stage}' produced a non-finite value for {field}")]
    NonFinite { stage: &'static str, field: String },
}

impl EnrichError {
    pub fn overflow(stage: &'static str, field: impl Into<String>) -> Self {
        Self::Overflow {
            stage,
            field: field.into(),
        }
    }

    pub fn non_finite(stage: &'static str, field: impl Into<String>) -> Self {
        Self::NonFinite {
            stage,
            field: field.into(),
        }
    }
}
