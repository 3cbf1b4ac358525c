//! Sheet export errors.

use crate::infrastructure::importers::ImportError;
use crate::infrastructure::ports::ExportError;

/// Errors that stop a sheet export.
///
/// Extraction misses and enrichment failures are not errors; they are
/// reported alongside the record.
#[derive(Debug, thiserror::Error)]
pub enum SheetExportError {
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}
