//! Weapon attack totals and damage strings.

use std::collections::BTreeMap;

use super::{keys, modifier_key, Ability, Dnd5eEnricher};
use crate::game_systems::traits::EnrichError;
use crate::record::{Item, Record, Value};
use crate::value_objects::{capitalize, parse_lenient_int, with_explicit_count, Modifier};

const STAGE: &str = "weapons";

fn map_text<'a>(map: &'a BTreeMap<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_text)
}

fn is_ranged(weapon: &Item) -> bool {
    weapon.text("type") == Some("1")
}

fn default_stat(weapon: &Item) -> Ability {
    if is_ranged(weapon) {
        Ability::Dexterity
    } else {
        Ability::Strength
    }
}

fn modifier_or_zero(record: &Record, stat: &str) -> i64 {
    record.scalar_int_or(&modifier_key(stat), 0).unwrap_or(0)
}

/// Damage components keyed by id, iterated in ascending id order.
fn damage_components(weapon: &Item) -> Option<&BTreeMap<String, Value>> {
    weapon.get("DamageData").and_then(Value::as_map)
}

/// Ability used for the attack roll.
fn attack_stat(record: &Record, weapon: &Item) -> String {
    let declared = weapon.non_empty_text("Stat").map(capitalize);
    let properties = weapon.text("Properties").unwrap_or_default().to_lowercase();

    let mut stat = declared;
    if properties.contains("finesse") {
        let strength = record.scalar_int_or(Ability::Strength.modifier_key(), 0);
        let dexterity = record.scalar_int_or(Ability::Dexterity.modifier_key(), 0);
        if let (Some(strength), Some(dexterity)) = (strength, dexterity) {
            if dexterity > strength {
                stat = Some(Ability::Dexterity.name().to_string());
            } else if stat.is_none() {
                stat = Some(Ability::Strength.name().to_string());
            }
        }
    }
    stat.unwrap_or_else(|| default_stat(weapon).name().to_string())
}

fn attack_total(record: &Record, weapon: &Item, proficiency: i64) -> Result<Option<String>, EnrichError> {
    if weapon.presence("Total Attack").is_present() {
        return Ok(None);
    }

    let stat = attack_stat(record, weapon);
    let stat_modifier = modifier_or_zero(record, &stat);
    let proficiency = if weapon.text("Proficient") == Some("1") {
        proficiency
    } else {
        0
    };
    let mut attack_bonus = weapon.int_or("Attack Bonus", 0).unwrap_or(0);
    let magic_bonus = weapon.int_or("Magic Bonus", 0).unwrap_or(0);

    // Some sheets only carry the bonus on the first damage component
    if attack_bonus == 0 && magic_bonus == 0 {
        if let Some((_, first)) = damage_components(weapon).and_then(|c| c.first_key_value()) {
            if let Some(first) = first.as_map() {
                attack_bonus = map_text(first, "bonus")
                    .and_then(parse_lenient_int)
                    .unwrap_or(0);
            }
        }
    }

    let total = [proficiency, attack_bonus, magic_bonus]
        .into_iter()
        .try_fold(stat_modifier, i64::checked_add)
        .ok_or_else(|| EnrichError::overflow(STAGE, "Total Attack"))?;

    tracing::debug!(
        weapon = weapon.text("Name").unwrap_or_default(),
        stat = %stat,
        stat_modifier,
        proficiency,
        bonus = attack_bonus.saturating_add(magic_bonus),
        "Weapon attack"
    );

    Ok((total != 0).then(|| Modifier(total).to_string()))
}

/// Render one damage component.
///
/// `"1d6 + 3 fire"`, `"1d6 - 1 fire"`, `"1d6 fire"`, or just the value when
/// there are no dice. `None` when there is nothing to show.
pub(crate) fn render_damage_component(dice: &str, value: i64, damage_type: &str) -> Option<String> {
    let mut part = if !dice.is_empty() {
        match value {
            v if v > 0 => format!("{} + {}", dice, v),
            v if v < 0 => format!("{} - {}", dice, v.unsigned_abs()),
            _ => dice.to_string(),
        }
    } else if value != 0 {
        value.to_string()
    } else {
        return None;
    };

    if !damage_type.is_empty() {
        part.push(' ');
        part.push_str(damage_type);
    }
    Some(part)
}

fn damage_string(record: &Record, weapon: &Item) -> Result<Option<String>, EnrichError> {
    let Some(components) = damage_components(weapon) else {
        return Ok(None);
    };

    let mut parts = Vec::new();
    for (id, component) in components {
        let Some(component) = component.as_map() else {
            continue;
        };

        let dice = with_explicit_count(map_text(component, "dice").unwrap_or_default());
        let bonus = map_text(component, "bonus")
            .and_then(parse_lenient_int)
            .unwrap_or(0);

        let stat = match map_text(component, "stat").filter(|s| !s.is_empty()) {
            Some("base") => Some(
                weapon
                    .non_empty_text("Stat")
                    .unwrap_or_else(|| default_stat(weapon).name())
                    .to_string(),
            ),
            Some(stat) if stat.eq_ignore_ascii_case("na") => None,
            other => other.map(str::to_string),
        };
        let modifier = stat.map_or(0, |s| modifier_or_zero(record, &s));

        let multiplier = map_text(component, "statmult")
            .and_then(|m| m.trim().parse::<f64>().ok())
            .unwrap_or(1.0);
        let scaled = (modifier as f64 * multiplier).floor();
        if !scaled.is_finite() {
            return Err(EnrichError::non_finite(STAGE, format!("DamageData.{}", id)));
        }
        if scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return Err(EnrichError::overflow(STAGE, format!("DamageData.{}", id)));
        }
        let value = (scaled as i64)
            .checked_add(bonus)
            .ok_or_else(|| EnrichError::overflow(STAGE, format!("DamageData.{}", id)))?;

        let damage_type = map_text(component, "type").unwrap_or_default();
        if let Some(part) = render_damage_component(&dice, value, damage_type) {
            parts.push(part);
        }
    }

    Ok((!parts.is_empty()).then(|| parts.join(" + ")))
}

pub(super) fn weapon_computations(_: &Dnd5eEnricher, record: &mut Record) -> Result<(), EnrichError> {
    let proficiency = record.scalar_int_or(keys::PROFICIENCY_BONUS, 0).unwrap_or(0);

    let mut updates = Vec::new();
    for (idx, weapon) in record.list(keys::WEAPONS).iter().enumerate() {
        let attack = attack_total(record, weapon, proficiency)?;
        let damage = damage_string(record, weapon)?;
        if attack.is_some() || damage.is_some() {
            tracing::info!(
                weapon = weapon.text("Name").unwrap_or_default(),
                attack = attack.as_deref().or(weapon.text("Total Attack")).unwrap_or_default(),
                damage = damage.as_deref().unwrap_or_default(),
                "Weapon enriched"
            );
        }
        updates.push((idx, attack, damage));
    }

    if let Some(weapons) = record.list_mut(keys::WEAPONS) {
        for (idx, attack, damage) in updates {
            let Some(weapon) = weapons.get_mut(idx) else {
                continue;
            };
            if let Some(attack) = attack {
                weapon.insert("Total Attack", attack);
            }
            if let Some(damage) = damage {
                weapon.insert("Damage", damage);
            }
        }
    }
    Ok(())
}
