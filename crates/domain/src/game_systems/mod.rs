//! Enrichment strategies for supported game systems.
//!
//! Each strategy derives game-specific values from an extracted record and
//! implements the traits defined in `traits.rs`.
//!
//! # Supported Systems
//!
//! - D&D 5th Edition (`dnd5e`)
//! - No enrichment (`none`), also the fallback for unknown keys

mod dnd5e;
mod noop;
mod pipeline;
mod traits;

pub use dnd5e::{keys as dnd5e_keys, modifier_key as dnd5e_modifier_key, Ability, Dnd5eEnricher};
pub use noop::NoOpEnricher;
pub use pipeline::{ordering_violations, run_stages, FieldRef, Stage};
pub use traits::{CalculationEngine, EnrichError, EnrichmentStrategy};

use std::sync::Arc;

/// Registry of available enrichment strategies.
pub struct EnricherRegistry {
    strategies: Vec<Arc<dyn EnrichmentStrategy>>,
    fallback: Arc<dyn EnrichmentStrategy>,
}

impl Default for EnricherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EnricherRegistry {
    /// Create a new registry with all built-in strategies.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(Dnd5eEnricher::new()));
        registry.register(Arc::new(NoOpEnricher::new()));
        registry
    }

    /// Create an empty registry. Selection still falls back to no-op.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
            fallback: Arc::new(NoOpEnricher::new()),
        }
    }

    /// Register a strategy. A later registration shadows an earlier one
    /// with the same id.
    pub fn register(&mut self, strategy: Arc<dyn EnrichmentStrategy>) {
        self.strategies.push(strategy);
    }

    /// Get a strategy by its ID, case-insensitively.
    pub fn get(&self, system_id: &str) -> Option<Arc<dyn EnrichmentStrategy>> {
        let system_id = system_id.trim();
        self.strategies
            .iter()
            .rev()
            .find(|s| s.system_id().eq_ignore_ascii_case(system_id))
            .cloned()
    }

    /// Resolve a selector key. Unknown, empty or missing keys get the
    /// no-op strategy; selection never fails.
    pub fn select(&self, key: Option<&str>) -> Arc<dyn EnrichmentStrategy> {
        match key.filter(|k| !k.trim().is_empty()).and_then(|k| self.get(k)) {
            Some(strategy) => {
                tracing::info!(system = strategy.system_id(), "Selected enrichment strategy");
                strategy
            }
            None => {
                if let Some(key) = key {
                    tracing::info!(key, "Unknown enrichment key, leaving records as extracted");
                }
                Arc::clone(&self.fallback)
            }
        }
    }

    /// List all registered strategy IDs.
    pub fn list_systems(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.system_id()).collect()
    }

    /// List all registered strategies with their display names.
    pub fn list_systems_with_names(&self) -> Vec<(&str, &str)> {
        self.strategies
            .iter()
            .map(|s| (s.system_id(), s.display_name()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    struct Shouting;

    impl EnrichmentStrategy for Shouting {
        fn system_id(&self) -> &str {
            "shout"
        }

        fn display_name(&self) -> &str {
            "Shouting"
        }

        fn enrich(&self, record: &mut Record) -> Result<(), EnrichError> {
            record.set_scalar("Name", "LOUD");
            Ok(())
        }
    }

    #[test]
    fn registry_includes_builtin_strategies() {
        let registry = EnricherRegistry::new();
        assert_eq!(registry.list_systems(), vec!["dnd5e", "none"]);
        assert!(registry.get("dnd5e").is_some());
    }

    #[test]
    fn selection_is_case_insensitive() {
        let registry = EnricherRegistry::new();
        assert_eq!(registry.select(Some("DnD5E")).system_id(), "dnd5e");
        assert_eq!(registry.select(Some("NONE")).system_id(), "none");
    }

    #[test]
    fn unknown_or_missing_keys_fall_back_to_noop() {
        let registry = EnricherRegistry::new();
        assert_eq!(registry.select(Some("pf2e")).system_id(), "none");
        assert_eq!(registry.select(Some("")).system_id(), "none");
        assert_eq!(registry.select(None).system_id(), "none");
    }

    #[test]
    fn empty_registry_still_selects_noop() {
        let registry = EnricherRegistry::empty();
        assert!(registry.list_systems().is_empty());
        assert_eq!(registry.select(Some("dnd5e")).system_id(), "none");
    }

    #[test]
    fn registry_list_with_names() {
        let registry = EnricherRegistry::new();
        let systems = registry.list_systems_with_names();
        assert!(systems.contains(&("dnd5e", "D&D 5th Edition")));
        assert!(systems.contains(&("none", "No enrichment")));
    }

    #[test]
    fn registered_strategy_is_selectable() {
        let mut registry = EnricherRegistry::new();
        registry.register(Arc::new(Shouting));

        let mut record = Record::new();
        registry
            .select(Some("Shout"))
            .enrich(&mut record)
            .expect("enrichment succeeds");
        assert_eq!(record.scalar_text("Name"), Some("LOUD"));
    }
}
