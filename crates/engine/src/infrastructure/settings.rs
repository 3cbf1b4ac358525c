//! Runtime settings read from the environment.

use std::path::{Path, PathBuf};

pub const RULES_ENV: &str = "SHEETFORGE_RULES";
pub const ENRICHER_ENV: &str = "SHEETFORGE_ENRICHER";
pub const OUTPUT_DIR_ENV: &str = "SHEETFORGE_OUTPUT_DIR";

const DEFAULT_RULES: &str = "config/dnd5e_rules.yaml";
const DEFAULT_ENRICHER: &str = "dnd5e";
const DEFAULT_OUTPUT_DIR: &str = "output";

/// Where rules come from, which enricher runs, and where output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub rules_path: PathBuf,
    pub enricher: String,
    pub output_dir: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from(DEFAULT_RULES),
            enricher: DEFAULT_ENRICHER.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl AppSettings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();
        Self {
            rules_path: get(RULES_ENV).map(PathBuf::from).unwrap_or(defaults.rules_path),
            enricher: get(ENRICHER_ENV).unwrap_or(defaults.enricher),
            output_dir: get(OUTPUT_DIR_ENV).map(PathBuf::from).unwrap_or(defaults.output_dir),
        }
    }

    /// Default output path for an input sheet: `<output_dir>/<stem>.json`.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "character".to_string());
        self.output_dir.join(format!("{}.json", stem))
    }
}
