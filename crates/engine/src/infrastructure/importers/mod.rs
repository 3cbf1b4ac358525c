//! Importers for sheet documents and extraction rules.
//!
//! This module turns files on disk into the inputs the extraction engine
//! works on: a document tree for the character sheet and a compiled rule set.

mod document;
mod rules;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use document::{DocumentError, Element};
pub use rules::{load_rules, parse_rules};

/// Errors that can occur during import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Rule file is not valid YAML: {0}")]
    Rules(#[from] serde_yml::Error),
    #[error("Rule file must be a mapping with 'single' and 'lists' keys")]
    RulesShape,
    #[error("Sheet is not a readable document: {0}")]
    Document(#[from] DocumentError),
}

/// Read and parse a character sheet document.
pub fn load_document(path: &Path) -> Result<Element, ImportError> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Element::parse_bytes(bytes)?)
}
