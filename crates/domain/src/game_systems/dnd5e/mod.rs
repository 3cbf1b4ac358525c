//! D&D 5th Edition enrichment.
//!
//! Derives modifiers, proficiency, hit dice, spell save DCs, passive
//! perception, weapon attack/damage strings and spell save text from an
//! extracted sheet, then tidies the record for play.

mod cleanup;
mod core_stats;
mod spellcasting;
mod weapons;

use super::pipeline::{run_stages, FieldRef, Stage};
use super::traits::{CalculationEngine, EnrichError, EnrichmentStrategy};
use crate::record::Record;
use crate::value_objects::capitalize;

/// Record keys read and written by the D&D 5e pipeline.
pub mod keys {
    pub const PROFICIENCY_BONUS: &str = "Proficiency Bonus";
    pub const HIT_DICE: &str = "Hit Dice";
    pub const SPELL_SAVE_DC: &str = "Spell Save DC";
    pub const PASSIVE_PERCEPTION: &str = "Passive Perception";
    pub const CURRENT_HP: &str = "Current HP";

    pub const CLASSES: &str = "Classes";
    pub const POWER_GROUPS: &str = "Power Groups";
    pub const SKILLS: &str = "Skills";
    pub const WEAPONS: &str = "Weapons";
    pub const SPELLS: &str = "Spells & Powers";
    pub const NOTES: &str = "Notes";
}

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn modifier_key(self) -> &'static str {
        match self {
            Ability::Strength => "Strength Modifier",
            Ability::Dexterity => "Dexterity Modifier",
            Ability::Constitution => "Constitution Modifier",
            Ability::Intelligence => "Intelligence Modifier",
            Ability::Wisdom => "Wisdom Modifier",
            Ability::Charisma => "Charisma Modifier",
        }
    }

    /// Parse a full ability name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
    }
}

/// Record key holding the modifier for a stat name as written on a sheet.
pub fn modifier_key(stat: &str) -> String {
    format!("{} Modifier", capitalize(stat.trim()))
}

const ABILITY_SCORES: &[FieldRef] = &[
    FieldRef::Scalar("Strength"),
    FieldRef::Scalar("Dexterity"),
    FieldRef::Scalar("Constitution"),
    FieldRef::Scalar("Intelligence"),
    FieldRef::Scalar("Wisdom"),
    FieldRef::Scalar("Charisma"),
];

const ABILITY_MODIFIERS: &[FieldRef] = &[
    FieldRef::Scalar("Strength Modifier"),
    FieldRef::Scalar("Dexterity Modifier"),
    FieldRef::Scalar("Constitution Modifier"),
    FieldRef::Scalar("Intelligence Modifier"),
    FieldRef::Scalar("Wisdom Modifier"),
    FieldRef::Scalar("Charisma Modifier"),
];

/// The pipeline, in execution order.
pub(crate) const STAGES: &[Stage<Dnd5eEnricher>] = &[
    Stage {
        name: "ability_modifiers",
        reads: ABILITY_SCORES,
        writes: ABILITY_MODIFIERS,
        run: core_stats::ability_modifiers,
    },
    Stage {
        name: "proficiency_bonus",
        reads: &[
            FieldRef::Scalar(keys::PROFICIENCY_BONUS),
            FieldRef::ListField(keys::CLASSES, "Level"),
        ],
        writes: &[FieldRef::Scalar(keys::PROFICIENCY_BONUS)],
        run: core_stats::proficiency_bonus,
    },
    Stage {
        name: "hit_dice",
        reads: &[
            FieldRef::ListField(keys::CLASSES, "Level"),
            FieldRef::ListField(keys::CLASSES, "HitDice"),
        ],
        writes: &[FieldRef::Scalar(keys::HIT_DICE)],
        run: core_stats::hit_dice,
    },
    Stage {
        name: "spell_save_dc",
        reads: &[
            FieldRef::Scalar(keys::SPELL_SAVE_DC),
            FieldRef::Scalar(keys::PROFICIENCY_BONUS),
            FieldRef::ListField(keys::POWER_GROUPS, "Name"),
            FieldRef::ListField(keys::POWER_GROUPS, "Stat"),
            FieldRef::ListField(keys::POWER_GROUPS, "SaveStat"),
            FieldRef::ListField(keys::CLASSES, "SpellAbility"),
            FieldRef::Scalar("Strength Modifier"),
            FieldRef::Scalar("Dexterity Modifier"),
            FieldRef::Scalar("Constitution Modifier"),
            FieldRef::Scalar("Intelligence Modifier"),
            FieldRef::Scalar("Wisdom Modifier"),
            FieldRef::Scalar("Charisma Modifier"),
        ],
        writes: &[FieldRef::Scalar(keys::SPELL_SAVE_DC)],
        run: spellcasting::spell_save_dc,
    },
    Stage {
        name: "passive_perception",
        reads: &[
            FieldRef::ListField(keys::SKILLS, "Skill"),
            FieldRef::ListField(keys::SKILLS, "Total"),
        ],
        writes: &[FieldRef::Scalar(keys::PASSIVE_PERCEPTION)],
        run: core_stats::passive_perception,
    },
    Stage {
        name: "weapons",
        reads: &[
            FieldRef::Scalar(keys::PROFICIENCY_BONUS),
            FieldRef::Scalar("Strength Modifier"),
            FieldRef::Scalar("Dexterity Modifier"),
            FieldRef::Scalar("Constitution Modifier"),
            FieldRef::Scalar("Intelligence Modifier"),
            FieldRef::Scalar("Wisdom Modifier"),
            FieldRef::Scalar("Charisma Modifier"),
            FieldRef::ListField(keys::WEAPONS, "Stat"),
            FieldRef::ListField(keys::WEAPONS, "Properties"),
            FieldRef::ListField(keys::WEAPONS, "DamageData"),
            FieldRef::ListField(keys::WEAPONS, "Total Attack"),
        ],
        writes: &[
            FieldRef::ListField(keys::WEAPONS, "Total Attack"),
            FieldRef::ListField(keys::WEAPONS, "Damage"),
        ],
        run: weapons::weapon_computations,
    },
    Stage {
        name: "spell_saves",
        reads: &[
            FieldRef::Scalar(keys::PROFICIENCY_BONUS),
            FieldRef::ListField(keys::POWER_GROUPS, "Name"),
            FieldRef::ListField(keys::POWER_GROUPS, "SaveStat"),
            FieldRef::ListField(keys::POWER_GROUPS, "Stat"),
            FieldRef::Scalar("Strength Modifier"),
            FieldRef::Scalar("Dexterity Modifier"),
            FieldRef::Scalar("Constitution Modifier"),
            FieldRef::Scalar("Intelligence Modifier"),
            FieldRef::Scalar("Wisdom Modifier"),
            FieldRef::Scalar("Charisma Modifier"),
            FieldRef::ListField(keys::CLASSES, "Class"),
            FieldRef::ListField(keys::CLASSES, "SpellAbility"),
            FieldRef::ListField(keys::SPELLS, "Group"),
            FieldRef::ListField(keys::SPELLS, "actions"),
            FieldRef::ListField(keys::SPELLS, "Save"),
        ],
        writes: &[FieldRef::ListField(keys::SPELLS, "Save")],
        run: spellcasting::spell_saves,
    },
    Stage {
        name: "cleanup",
        reads: &[FieldRef::Scalar(keys::PASSIVE_PERCEPTION)],
        writes: &[
            FieldRef::Scalar(keys::CURRENT_HP),
            FieldRef::List(keys::NOTES),
        ],
        run: cleanup::clean_data,
    },
];

/// D&D 5th Edition enrichment strategy.
pub struct Dnd5eEnricher;

impl Default for Dnd5eEnricher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dnd5eEnricher {
    pub fn new() -> Self {
        Self
    }
}

impl EnrichmentStrategy for Dnd5eEnricher {
    fn system_id(&self) -> &str {
        "dnd5e"
    }

    fn display_name(&self) -> &str {
        "D&D 5th Edition"
    }

    fn enrich(&self, record: &mut Record) -> Result<(), EnrichError> {
        run_stages(self, STAGES, record)
    }
}

impl CalculationEngine for Dnd5eEnricher {
    fn ability_modifier(&self, score: i64) -> Option<i64> {
        // D&D uses floor division, Rust's / rounds toward zero
        score.checked_sub(10).map(|diff| diff.div_euclid(2))
    }

    fn proficiency_bonus(&self, total_level: i64) -> Option<i64> {
        total_level
            .checked_sub(1)
            .map(|l| l.div_euclid(4))
            .and_then(|l| l.checked_add(2))
    }

    fn spell_save_dc(&self, proficiency_bonus: i64, ability_modifier: i64) -> Option<i64> {
        8i64.checked_add(proficiency_bonus)?
            .checked_add(ability_modifier)
    }

    fn passive_score(&self, skill_total: i64) -> Option<i64> {
        10i64.checked_add(skill_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_systems::pipeline::ordering_violations;
    use crate::record::{Item, Value};
    use std::collections::BTreeMap;

    fn map(entries: &[(&str, &str)]) -> Value {
        Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), Value::text(*v)))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn sample_sheet() -> Record {
        let mut record = Record::new();
        record.set_scalar("Strength", "16");
        record.set_scalar("Dexterity", "14");
        record.set_scalar("Constitution", "13");
        record.set_scalar("Intelligence", "18");
        record.set_scalar("Wisdom", "9");
        record.set_scalar("Charisma", "10");
        record.set_scalar(keys::CURRENT_HP, "27");
        record.set_list(
            keys::CLASSES,
            vec![Item::from_iter([
                ("Class", "Wizard"),
                ("Level", "5"),
                ("HitDice", "d6"),
                ("SpellAbility", "intelligence"),
            ])],
        );
        record.set_list(
            keys::SKILLS,
            vec![
                Item::from_iter([("Skill", "Arcana"), ("Total", "+7")]),
                Item::from_iter([("Skill", "Perception"), ("Total", "+2")]),
            ],
        );

        let mut dagger = Item::from_iter([
            ("Name", "Dagger"),
            ("Properties", "Finesse, Light, Thrown"),
            ("Proficient", "1"),
            ("type", "0"),
        ]);
        let mut damage = BTreeMap::new();
        damage.insert(
            "id-00001".to_string(),
            map(&[("dice", "d4"), ("stat", "base"), ("type", "piercing")]),
        );
        dagger.insert("DamageData", Value::Map(damage));
        record.set_list(keys::WEAPONS, vec![dagger]);
        record
    }

    #[test]
    fn ability_modifier_calculation() {
        let system = Dnd5eEnricher::new();
        assert_eq!(system.ability_modifier(1), Some(-5));
        assert_eq!(system.ability_modifier(8), Some(-1));
        assert_eq!(system.ability_modifier(9), Some(-1));
        assert_eq!(system.ability_modifier(10), Some(0));
        assert_eq!(system.ability_modifier(11), Some(0));
        assert_eq!(system.ability_modifier(14), Some(2));
        assert_eq!(system.ability_modifier(20), Some(5));
        assert_eq!(system.ability_modifier(i64::MIN), None);
    }

    #[test]
    fn proficiency_bonus_progression() {
        let system = Dnd5eEnricher::new();
        assert_eq!(system.proficiency_bonus(1), Some(2));
        assert_eq!(system.proficiency_bonus(4), Some(2));
        assert_eq!(system.proficiency_bonus(5), Some(3));
        assert_eq!(system.proficiency_bonus(9), Some(4));
        assert_eq!(system.proficiency_bonus(17), Some(6));
        assert_eq!(system.proficiency_bonus(20), Some(6));
    }

    #[test]
    fn spell_dc_and_passive_formulas() {
        let system = Dnd5eEnricher::new();
        assert_eq!(system.spell_save_dc(3, 4), Some(15));
        assert_eq!(system.spell_save_dc(i64::MAX, 1), None);
        assert_eq!(system.passive_score(5), Some(15));
    }

    #[test]
    fn stage_order_satisfies_declared_reads() {
        assert!(ordering_violations(STAGES).is_empty());
    }

    #[test]
    fn stage_order_is_fixed() {
        let names: Vec<_> = STAGES.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "ability_modifiers",
                "proficiency_bonus",
                "hit_dice",
                "spell_save_dc",
                "passive_perception",
                "weapons",
                "spell_saves",
                "cleanup",
            ]
        );
    }

    #[test]
    fn stat_resolving_stages_read_every_ability_modifier() {
        for name in ["spell_save_dc", "weapons", "spell_saves"] {
            let stage = STAGES
                .iter()
                .find(|s| s.name == name)
                .expect("stage exists");
            for modifier in ABILITY_MODIFIERS {
                assert!(
                    stage.reads.contains(modifier),
                    "{} does not declare {}",
                    name,
                    modifier
                );
            }
        }
    }

    #[test]
    fn ability_lookup_is_case_insensitive() {
        assert_eq!(Ability::parse("wisdom"), Some(Ability::Wisdom));
        assert_eq!(Ability::parse("CHARISMA "), Some(Ability::Charisma));
        assert_eq!(Ability::parse("luck"), None);
        assert_eq!(modifier_key("intelligence"), "Intelligence Modifier");
    }

    #[test]
    fn enriches_sample_sheet() {
        let mut record = sample_sheet();
        Dnd5eEnricher::new().enrich(&mut record).expect("enrichment succeeds");

        assert_eq!(record.scalar_text("Strength Modifier"), Some("+3"));
        assert_eq!(record.scalar_text("Wisdom Modifier"), Some("-1"));
        assert_eq!(record.scalar_text("Charisma Modifier"), Some("+0"));
        assert_eq!(record.scalar_text(keys::PROFICIENCY_BONUS), Some("+3"));
        assert_eq!(record.scalar_text(keys::HIT_DICE), Some("5d6"));
        assert_eq!(record.scalar_text(keys::SPELL_SAVE_DC), Some("15"));
        assert_eq!(record.scalar_text(keys::PASSIVE_PERCEPTION), Some("12"));
        assert_eq!(record.scalar_text(keys::CURRENT_HP), Some(""));

        let dagger = &record.list(keys::WEAPONS)[0];
        // Strength +3 beats Dexterity +2 for a finesse weapon
        assert_eq!(dagger.text("Total Attack"), Some("+6"));
        assert_eq!(dagger.text("Damage"), Some("1d4 + 3 piercing"));

        let notes = record.list(keys::NOTES);
        assert_eq!(notes[0].text("Name"), Some("Passive Perception: 12"));
    }

    #[test]
    fn rerun_keeps_derived_values_and_adds_note() {
        let system = Dnd5eEnricher::new();
        let mut record = sample_sheet();
        system.enrich(&mut record).expect("first run");
        record.set_scalar(keys::CURRENT_HP, "11");
        let first = record.clone();

        system.enrich(&mut record).expect("second run");

        for key in [keys::PROFICIENCY_BONUS, keys::SPELL_SAVE_DC, keys::PASSIVE_PERCEPTION] {
            assert_eq!(record.scalar(key), first.scalar(key), "{} changed", key);
        }
        assert_eq!(record.scalar_text(keys::CURRENT_HP), Some(""));
        assert_eq!(record.list(keys::NOTES).len(), 2);
    }

    #[test]
    fn empty_record_gains_only_cleanup_fields() {
        let mut record = Record::new();
        Dnd5eEnricher::new().enrich(&mut record).expect("enrichment succeeds");

        let scalars: Vec<_> = record.scalars().map(|(k, _)| k.as_str()).collect();
        assert_eq!(scalars, vec![keys::CURRENT_HP]);
        assert!(!record.has_list(keys::NOTES));
    }
}
