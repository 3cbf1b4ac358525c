//! JSON writer for enriched records
//!
//! Writes the record as a pretty-printed `{"scalars": ..., "lists": ...}`
//! document that sheet renderers and other tools can consume.

use std::path::Path;

use sheetforge_domain::Record;

use crate::infrastructure::ports::{ExportError, RecordWriter};

/// Writes records as pretty-printed JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRecordWriter;

impl JsonRecordWriter {
    pub fn new() -> Self {
        Self
    }

    /// Render a record to a JSON string.
    pub fn to_json(&self, record: &Record) -> Result<String, ExportError> {
        serde_json::to_string_pretty(record).map_err(|e| ExportError::Serialization(e.to_string()))
    }
}

impl RecordWriter for JsonRecordWriter {
    fn format(&self) -> &str {
        "json"
    }

    fn write(&self, record: &Record, destination: &Path) -> Result<(), ExportError> {
        let io_error = |source| ExportError::Io {
            path: destination.to_path_buf(),
            source,
        };

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = self.to_json(record)?;
        std::fs::write(destination, json).map_err(io_error)?;

        tracing::info!(path = %destination.display(), "Wrote record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetforge_domain::Item;

    fn record() -> Record {
        let mut record = Record::new();
        record.set_scalar("Name", "Rook");
        record.set_scalar("Current HP", "");
        record.set_list("Notes", vec![Item::from_iter([("Name", "Passive Perception: 12")])]);
        record
    }

    #[test]
    fn writes_pretty_json_and_creates_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let destination = dir.path().join("out").join("rook.json");

        JsonRecordWriter::new()
            .write(&record(), &destination)
            .expect("write succeeds");

        let written = std::fs::read_to_string(&destination).expect("file exists");
        assert!(written.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&written).expect("valid json");
        assert_eq!(value["scalars"]["Name"], "Rook");
        assert_eq!(value["scalars"]["Current HP"], "");
        assert_eq!(value["lists"]["Notes"][0]["Name"], "Passive Perception: 12");
    }

    #[test]
    fn written_json_reads_back_as_record() {
        let json = JsonRecordWriter::new().to_json(&record()).expect("serializes");
        let parsed: Record = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(parsed, record());
    }

    #[test]
    fn unwritable_destination_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").expect("write blocker");

        let result = JsonRecordWriter::new().write(&record(), &blocker.join("rook.json"));
        assert!(matches!(result, Err(ExportError::Io { .. })));
    }
}
