//! Ordered derivation stages with declared field dependencies.
//!
//! Stages run in a fixed order. Each one lists the record fields it reads and
//! writes so the order can be checked: a field read by a stage must not be
//! produced only by a stage that runs after it.

use std::fmt;

use super::traits::EnrichError;
use crate::record::Record;

/// A record field a stage touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef {
    /// A scalar field.
    Scalar(&'static str),
    /// A whole list (items added, removed or reordered).
    List(&'static str),
    /// One field of every item in a list.
    ListField(&'static str, &'static str),
}

impl FieldRef {
    /// Whether writing `self` can change what reading `other` observes.
    fn feeds(&self, other: &FieldRef) -> bool {
        match (self, other) {
            (FieldRef::List(a), FieldRef::List(b))
            | (FieldRef::List(a), FieldRef::ListField(b, _))
            | (FieldRef::ListField(a, _), FieldRef::List(b)) => a == b,
            _ => self == other,
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Scalar(key) => write!(f, "{}", key),
            FieldRef::List(name) => write!(f, "{}[]", name),
            FieldRef::ListField(name, field) => write!(f, "{}[].{}", name, field),
        }
    }
}

/// One derivation stage of an enricher `E`.
pub struct Stage<E> {
    pub name: &'static str,
    pub reads: &'static [FieldRef],
    pub writes: &'static [FieldRef],
    pub run: fn(&E, &mut Record) -> Result<(), EnrichError>,
}

/// Run stages in order, stopping at the first failure.
pub fn run_stages<E>(engine: &E, stages: &[Stage<E>], record: &mut Record) -> Result<(), EnrichError> {
    for stage in stages {
        tracing::trace!(stage = stage.name, "Running enrichment stage");
        (stage.run)(engine, record)?;
    }
    Ok(())
}

/// Reads that are only satisfied by a later stage, as `(stage, field)` pairs.
///
/// An empty result means the order is consistent with the declarations.
pub fn ordering_violations<E>(stages: &[Stage<E>]) -> Vec<(&'static str, FieldRef)> {
    let mut violations = Vec::new();
    for (idx, stage) in stages.iter().enumerate() {
        for read in stage.reads {
            let written_later = stages[idx + 1..]
                .iter()
                .any(|later| later.writes.iter().any(|w| w.feeds(read)));
            let written_before = stages[..=idx]
                .iter()
                .any(|earlier| earlier.writes.iter().any(|w| w.feeds(read)));
            if written_later && !written_before {
                violations.push((stage.name, *read));
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter;

    fn write_total(_: &Counter, record: &mut Record) -> Result<(), EnrichError> {
        record.set_scalar("Total", "3");
        Ok(())
    }

    fn read_total(_: &Counter, record: &mut Record) -> Result<(), EnrichError> {
        let total = record.scalar_int_or("Total", 0).unwrap_or(0);
        record.set_scalar("Double", (total * 2).to_string());
        Ok(())
    }

    fn fail(_: &Counter, _: &mut Record) -> Result<(), EnrichError> {
        Err(EnrichError::overflow("fail", "Total"))
    }

    const WRITER: Stage<Counter> = Stage {
        name: "writer",
        reads: &[],
        writes: &[FieldRef::Scalar("Total")],
        run: write_total,
    };

    const READER: Stage<Counter> = Stage {
        name: "reader",
        reads: &[FieldRef::Scalar("Total")],
        writes: &[FieldRef::Scalar("Double")],
        run: read_total,
    };

    const FAILING: Stage<Counter> = Stage {
        name: "fail",
        reads: &[],
        writes: &[],
        run: fail,
    };

    #[test]
    fn stages_run_in_order() {
        let mut record = Record::new();
        run_stages(&Counter, &[WRITER, READER], &mut record).expect("stages succeed");
        assert_eq!(record.scalar_text("Double"), Some("6"));
    }

    #[test]
    fn failure_stops_later_stages() {
        let mut record = Record::new();
        let result = run_stages(&Counter, &[WRITER, FAILING, READER], &mut record);
        assert!(result.is_err());
        assert_eq!(record.scalar_text("Total"), Some("3"));
        assert_eq!(record.scalar_text("Double"), None);
    }

    #[test]
    fn detects_reads_satisfied_only_later() {
        assert!(ordering_violations(&[WRITER, READER]).is_empty());
        assert_eq!(
            ordering_violations(&[READER, WRITER]),
            vec![("reader", FieldRef::Scalar("Total"))]
        );
    }

    #[test]
    fn list_writes_feed_item_field_reads() {
        assert!(FieldRef::List("Notes").feeds(&FieldRef::ListField("Notes", "Name")));
        assert!(!FieldRef::List("Notes").feeds(&FieldRef::Scalar("Notes")));
        assert_eq!(FieldRef::ListField("Skills", "Total").to_string(), "Skills[].Total");
    }
}
