pub mod error;
pub mod game_systems;
pub mod record;
pub mod rule_set;
pub mod value_objects;

pub use error::DomainError;

// Re-export record model
pub use record::{Item, Presence, Record, Value};

// Re-export rule set types
pub use rule_set::{
    FieldRule, FieldSpec, FlattenSpec, ListRule, RawFieldSpec, RawListRule, RawStructuredField,
    RuleSet, ScalarRule,
};

// Re-export game system traits and types
pub use game_systems::{
    Ability, CalculationEngine, Dnd5eEnricher, EnrichError, EnricherRegistry, EnrichmentStrategy,
    NoOpEnricher,
};

pub use value_objects::{DiceFormula, DiceParseError, DocumentNode, Modifier, NodePath, NodePathError};
