//! Port traits for infrastructure boundaries.
//!
//! Output formats sit behind [`RecordWriter`] so the export use case never
//! knows which renderer it is driving. Enrichment strategies are the other
//! seam and live in the domain crate.

use std::path::{Path, PathBuf};

use sheetforge_domain::Record;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// Writer Ports
// =============================================================================

/// Renders a finished record to a destination file.
pub trait RecordWriter: Send + Sync {
    /// Short name of the output format (e.g., "json").
    fn format(&self) -> &str;

    /// Write the record, creating parent directories as needed.
    fn write(&self, record: &Record, destination: &Path) -> Result<(), ExportError>;
}
