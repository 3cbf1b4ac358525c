//! Ability modifiers, proficiency, hit dice and passive perception.

use super::{keys, Ability, Dnd5eEnricher};
use crate::game_systems::traits::{CalculationEngine, EnrichError};
use crate::record::{Presence, Record};
use crate::value_objects::{parse_lenient_int, DiceFormula, Modifier};

pub(super) fn ability_modifiers(system: &Dnd5eEnricher, record: &mut Record) -> Result<(), EnrichError> {
    for ability in Ability::ALL {
        if !record.presence(ability.name()).is_present() {
            continue;
        }
        let key = ability.modifier_key();

        let modifier = match record.presence(key) {
            // Normalize whatever the sheet carried ("3", " +3") to "+3"
            Presence::Present(value) => match value.as_text().and_then(parse_lenient_int) {
                Some(m) => m,
                None => continue,
            },
            Presence::Absent | Presence::Empty => {
                let Some(score) = record.scalar_text(ability.name()).and_then(parse_lenient_int) else {
                    continue;
                };
                system
                    .ability_modifier(score)
                    .ok_or_else(|| EnrichError::overflow("ability_modifiers", key))?
            }
        };

        tracing::debug!(ability = ability.name(), modifier, "Ability modifier");
        record.set_scalar(key, Modifier(modifier).to_string());
    }
    Ok(())
}

pub(super) fn proficiency_bonus(system: &Dnd5eEnricher, record: &mut Record) -> Result<(), EnrichError> {
    if record.presence(keys::PROFICIENCY_BONUS).is_present() {
        return Ok(());
    }

    let mut total_level: i64 = 0;
    for class in record.list(keys::CLASSES) {
        let level = class.int_or("Level", 0).unwrap_or(0);
        total_level = total_level
            .checked_add(level)
            .ok_or_else(|| EnrichError::overflow("proficiency_bonus", "total level"))?;
    }
    if total_level <= 0 {
        return Ok(());
    }

    let bonus = system
        .proficiency_bonus(total_level)
        .ok_or_else(|| EnrichError::overflow("proficiency_bonus", keys::PROFICIENCY_BONUS))?;
    tracing::info!(total_level, bonus, "Calculated proficiency bonus");
    record.set_scalar(keys::PROFICIENCY_BONUS, Modifier(bonus).to_string());
    Ok(())
}

pub(super) fn hit_dice(_: &Dnd5eEnricher, record: &mut Record) -> Result<(), EnrichError> {
    let parts: Vec<String> = record
        .list(keys::CLASSES)
        .iter()
        .filter_map(|class| {
            let level = class.non_empty_text("Level")?;
            let die = class.non_empty_text("HitDice")?;
            let level = parse_lenient_int(level).and_then(|l| u32::try_from(l).ok())?;
            match DiceFormula::parse(die) {
                Ok(formula) => Some(formula.with_count(level).to_string()),
                Err(e) => {
                    tracing::debug!(hit_dice = die, error = %e, "Skipping unreadable hit dice");
                    None
                }
            }
        })
        .collect();

    if !parts.is_empty() {
        record.set_scalar(keys::HIT_DICE, parts.join(" + "));
    }
    Ok(())
}

pub(super) fn passive_perception(system: &Dnd5eEnricher, record: &mut Record) -> Result<(), EnrichError> {
    let Some(perception) = record
        .list(keys::SKILLS)
        .iter()
        .find(|skill| skill.text("Skill") == Some("Perception"))
    else {
        return Ok(());
    };
    let Some(total) = perception.int_or("Total", 0) else {
        return Ok(());
    };

    let passive = system
        .passive_score(total)
        .ok_or_else(|| EnrichError::overflow("passive_perception", keys::PASSIVE_PERCEPTION))?;
    record.set_scalar(keys::PASSIVE_PERCEPTION, passive.to_string());
    Ok(())
}
