//! Pass-through strategy for sheets of unsupported systems.

use super::traits::{EnrichError, EnrichmentStrategy};
use crate::record::Record;

/// Leaves the record exactly as extracted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEnricher;

impl NoOpEnricher {
    pub fn new() -> Self {
        Self
    }
}

impl EnrichmentStrategy for NoOpEnricher {
    fn system_id(&self) -> &str {
        "none"
    }

    fn display_name(&self) -> &str {
        "No enrichment"
    }

    fn enrich(&self, _record: &mut Record) -> Result<(), EnrichError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Item;

    #[test]
    fn leaves_record_untouched() {
        let mut record = Record::new();
        record.set_scalar("Strength", "14");
        record.set_list("Classes", vec![Item::from_iter([("Level", "3")])]);
        let before = record.clone();

        NoOpEnricher::new().enrich(&mut record).expect("no-op never fails");
        assert_eq!(record, before);
    }
}
