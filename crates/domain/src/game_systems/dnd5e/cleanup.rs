//! Final tidy-up so the sheet is ready for a fresh session.

use super::{keys, Dnd5eEnricher};
use crate::game_systems::traits::EnrichError;
use crate::record::{Item, Record};

/// Blanks current HP and pins passive perception to the top of the notes.
///
/// Not idempotent: every run prepends another note.
pub(super) fn clean_data(_: &Dnd5eEnricher, record: &mut Record) -> Result<(), EnrichError> {
    record.set_scalar(keys::CURRENT_HP, "");

    let passive = record
        .scalar_text(keys::PASSIVE_PERCEPTION)
        .filter(|pp| !pp.is_empty())
        .map(|pp| format!("Passive Perception: {}", pp));
    if let Some(note) = passive {
        record
            .list_entry(keys::NOTES)
            .insert(0, Item::from_iter([("Name", note)]));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blanks_current_hp() {
        let mut record = Record::new();
        record.set_scalar(keys::CURRENT_HP, "31");
        clean_data(&Dnd5eEnricher, &mut record).expect("stage succeeds");
        assert_eq!(record.scalar_text(keys::CURRENT_HP), Some(""));
        assert!(!record.has_list(keys::NOTES));
    }

    #[test]
    fn prepends_passive_perception_note() {
        let mut record = Record::new();
        record.set_scalar(keys::PASSIVE_PERCEPTION, "14");
        record.set_list(keys::NOTES, vec![Item::from_iter([("Name", "Owes the guild 40gp")])]);

        clean_data(&Dnd5eEnricher, &mut record).expect("stage succeeds");
        clean_data(&Dnd5eEnricher, &mut record).expect("stage succeeds");

        let notes: Vec<_> = record
            .list(keys::NOTES)
            .iter()
            .filter_map(|n| n.text("Name"))
            .collect();
        assert_eq!(
            notes,
            vec![
                "Passive Perception: 14",
                "Passive Perception: 14",
                "Owes the guild 40gp"
            ]
        );
    }
}
