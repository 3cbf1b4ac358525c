//! Sheet export use case.
//!
//! Reads a character sheet, extracts a record with the configured rules,
//! enriches it with the selected strategy and hands it to a writer.

mod error;

pub use error::SheetExportError;

use std::path::Path;
use std::sync::Arc;

use sheetforge_domain::{EnrichError, EnrichmentStrategy, Record, RuleSet};

use super::extraction::{ExtractionMiss, Extractor};
use crate::infrastructure::importers::{load_document, Element, ImportError};
use crate::infrastructure::ports::RecordWriter;

// =============================================================================
// Result Types
// =============================================================================

/// Outcome of processing one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetReport {
    /// The enriched (possibly partially enriched) record.
    pub record: Record,
    /// Everything the rules expected but the sheet did not provide.
    pub misses: Vec<ExtractionMiss>,
    /// Set when enrichment stopped early.
    pub enrich_error: Option<EnrichError>,
}

// =============================================================================
// Use Case
// =============================================================================

pub struct SheetExporter {
    extractor: Extractor,
    strategy: Arc<dyn EnrichmentStrategy>,
    writer: Arc<dyn RecordWriter>,
}

impl SheetExporter {
    pub fn new(
        rules: RuleSet,
        strategy: Arc<dyn EnrichmentStrategy>,
        writer: Arc<dyn RecordWriter>,
    ) -> Self {
        Self {
            extractor: Extractor::new(rules),
            strategy,
            writer,
        }
    }

    pub fn strategy(&self) -> &dyn EnrichmentStrategy {
        self.strategy.as_ref()
    }

    /// Process the sheet at `input` and write the result to `output`.
    pub fn export(&self, input: &Path, output: &Path) -> Result<SheetReport, SheetExportError> {
        tracing::info!(input = %input.display(), "Reading character sheet");
        let root = load_document(input)?;
        let report = self.process(&root);
        self.writer.write(&report.record, output)?;
        Ok(report)
    }

    /// Process sheet XML held in memory.
    pub fn process_str(&self, xml: &str) -> Result<SheetReport, SheetExportError> {
        let root = Element::parse(xml).map_err(ImportError::from)?;
        Ok(self.process(&root))
    }

    fn process(&self, root: &Element) -> SheetReport {
        let extraction = self.extractor.extract(root);
        if !extraction.misses.is_empty() {
            tracing::info!(misses = extraction.misses.len(), "Sheet is missing some fields");
        }

        let mut record = extraction.record;
        let enrich_error = match self.strategy.enrich(&mut record) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    system = self.strategy.system_id(),
                    error = %e,
                    "Enrichment stopped early, keeping partial results"
                );
                Some(e)
            }
        };

        SheetReport {
            record,
            misses: extraction.misses,
            enrich_error,
        }
    }
}
