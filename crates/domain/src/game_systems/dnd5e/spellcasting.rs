//! Spell save DC and per-spell save text.

use std::collections::BTreeMap;

use super::{keys, modifier_key, Ability, Dnd5eEnricher};
use crate::game_systems::traits::{CalculationEngine, EnrichError};
use crate::record::{Item, Record, Value};
use crate::value_objects::parse_lenient_int;

/// Stat of a power group: `Stat`, else `SaveStat`.
fn group_stat(group: &Item) -> Option<&str> {
    group
        .non_empty_text("Stat")
        .or_else(|| group.non_empty_text("SaveStat"))
}

/// The ability governing the character's spell save DC.
fn governing_spell_stat(record: &Record) -> Option<String> {
    let groups = record.list(keys::POWER_GROUPS);

    let spell_group = groups.iter().find_map(|g| {
        let name = g.text("Name").unwrap_or_default().to_lowercase();
        if name.contains("spell") {
            group_stat(g)
        } else {
            None
        }
    });
    let any_group = || groups.iter().find_map(group_stat);
    let class_ability = || {
        record
            .list(keys::CLASSES)
            .iter()
            .find_map(|c| c.non_empty_text("SpellAbility"))
    };

    spell_group
        .or_else(any_group)
        .or_else(class_ability)
        .map(str::to_string)
}

pub(super) fn spell_save_dc(system: &Dnd5eEnricher, record: &mut Record) -> Result<(), EnrichError> {
    if record.presence(keys::SPELL_SAVE_DC).is_present() {
        return Ok(());
    }
    let Some(stat) = governing_spell_stat(record) else {
        return Ok(());
    };

    let (Some(proficiency), Some(modifier)) = (
        record.scalar_int_or(keys::PROFICIENCY_BONUS, 0),
        record.scalar_int_or(&modifier_key(&stat), 0),
    ) else {
        tracing::debug!(stat = %stat, "Non-numeric spellcasting inputs, leaving DC unset");
        return Ok(());
    };

    let dc = system
        .spell_save_dc(proficiency, modifier)
        .ok_or_else(|| EnrichError::overflow("spell_save_dc", keys::SPELL_SAVE_DC))?;
    tracing::info!(stat = %stat, dc, "Calculated spell save DC");
    record.set_scalar(keys::SPELL_SAVE_DC, dc.to_string());
    Ok(())
}

// =============================================================================
// Per-spell save text
// =============================================================================

/// A save found on one of a spell's cast actions.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ActionSave {
    /// The action carries its own DC.
    Fixed { dc: i64, save: String },
    /// The action defers to the DC of the spell's power group.
    Group { save: String },
}

impl ActionSave {
    fn render(&self, group_dc: Option<i64>) -> String {
        match (self, group_dc) {
            (ActionSave::Fixed { dc, save }, _) => format!("DC {} {}", dc, save),
            (ActionSave::Group { save }, Some(dc)) => format!("DC {} {}", dc, save),
            (ActionSave::Group { save }, None) => save.clone(),
        }
    }
}

fn save_abbreviation(save: &str) -> String {
    save.chars().take(3).collect::<String>().to_uppercase()
}

fn map_text<'a>(map: &'a BTreeMap<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_text)
}

/// Action records under a spell's `actions` subtree: keyed by id (in id
/// order), a sequence, or repeated same-tag siblings collected into a list.
fn action_records(actions: &Value) -> Vec<&BTreeMap<String, Value>> {
    match actions {
        Value::Map(map) => map
            .values()
            .flat_map(|value| match value {
                Value::List(list) => list.iter().filter_map(Value::as_map).collect(),
                other => other.as_map().into_iter().collect::<Vec<_>>(),
            })
            .collect(),
        Value::List(list) => list.iter().filter_map(Value::as_map).collect(),
        Value::Text(_) => Vec::new(),
    }
}

/// Integer modifier for a stat name; absent counts as zero.
fn stat_modifier(record: &Record, stat: &str) -> Option<i64> {
    record.scalar_int_or(&modifier_key(stat), 0)
}

fn action_save(
    system: &Dnd5eEnricher,
    spell: &Item,
    record: &Record,
    proficiency: i64,
) -> Result<Option<ActionSave>, EnrichError> {
    let Some(actions) = spell.get("actions") else {
        return Ok(None);
    };

    for action in action_records(actions) {
        if map_text(action, "type") != Some("cast") {
            continue;
        }
        let Some(save_type) = map_text(action, "savetype").filter(|s| !s.is_empty()) else {
            continue;
        };
        let save = save_abbreviation(save_type);

        let dc = match map_text(action, "savedcbase").unwrap_or("group") {
            "group" => return Ok(Some(ActionSave::Group { save })),
            "fixed" => map_text(action, "savedcmod")
                .map_or(Some(0), parse_lenient_int)
                .unwrap_or(0),
            "ability" => match map_text(action, "savedcstat")
                .filter(|s| !s.is_empty())
                .and_then(|stat| stat_modifier(record, stat))
            {
                Some(modifier) => system
                    .spell_save_dc(proficiency, modifier)
                    .ok_or_else(|| EnrichError::overflow("spell_saves", "action save DC"))?,
                None => 0,
            },
            _ => 0,
        };

        if dc > 0 {
            return Ok(Some(ActionSave::Fixed { dc, save }));
        }
    }
    Ok(None)
}

/// DC of the power group a spell belongs to.
fn group_dc(
    system: &Dnd5eEnricher,
    record: &Record,
    group: &str,
    proficiency: i64,
) -> Result<Option<i64>, EnrichError> {
    // Later groups with the same name win
    let power_group = record
        .list(keys::POWER_GROUPS)
        .iter()
        .rev()
        .find(|g| g.text("Name").unwrap_or_default() == group);

    let group_stat = power_group.and_then(|g| {
        g.non_empty_text("SaveStat")
            .or_else(|| g.non_empty_text("Stat"))
    });
    // "Spells (Wizard)" names its class inside the parentheses
    let class_stat = || {
        group.split_once('(').and_then(|(_, rest)| {
            let class_name = rest.replace(')', "");
            let class_name = class_name.trim();
            record
                .list(keys::CLASSES)
                .iter()
                .find(|c| c.text("Class") == Some(class_name))
                .and_then(|c| c.non_empty_text("SpellAbility"))
        })
    };
    let stat = group_stat.or_else(class_stat);

    let Some(ability) = stat.and_then(Ability::parse) else {
        return Ok(None);
    };
    let Some(modifier) = record.scalar_int_or(ability.modifier_key(), 0) else {
        return Ok(None);
    };
    system
        .spell_save_dc(proficiency, modifier)
        .map(Some)
        .ok_or_else(|| EnrichError::overflow("spell_saves", "group save DC"))
}

pub(super) fn spell_saves(system: &Dnd5eEnricher, record: &mut Record) -> Result<(), EnrichError> {
    let proficiency = record.scalar_int_or(keys::PROFICIENCY_BONUS, 0).unwrap_or(0);

    let mut updates = Vec::new();
    for (idx, spell) in record.list(keys::SPELLS).iter().enumerate() {
        let group = spell.text("Group").unwrap_or_default();
        let dc = group_dc(system, record, group, proficiency)?;

        let save = match action_save(system, spell, record, proficiency)? {
            Some(action) => Some(action.render(dc)),
            None => match (dc, spell.non_empty_text("Save")) {
                (Some(dc), Some(raw)) if !raw.starts_with("DC ") => {
                    Some(format!("DC {} {}", dc, save_abbreviation(raw)))
                }
                _ => None,
            },
        };
        if let Some(save) = save {
            updates.push((idx, save));
        }
    }

    if let Some(spells) = record.list_mut(keys::SPELLS) {
        for (idx, save) in updates {
            if let Some(spell) = spells.get_mut(idx) {
                spell.insert("Save", save);
            }
        }
    }
    Ok(())
}
