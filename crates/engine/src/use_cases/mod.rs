//! Use cases - Sheet processing orchestration.

pub mod extraction;
pub mod sheet_export;

pub use extraction::{Extraction, ExtractionMiss, Extractor};
pub use sheet_export::{SheetExportError, SheetExporter, SheetReport};
