//! Rule set loader.
//!
//! Reads the YAML rule file and compiles it into a [`RuleSet`]. Individual
//! bad entries are reported and skipped; only an unreadable or non-YAML file
//! is an error.

use std::collections::BTreeMap;
use std::path::Path;

use serde_yml::Value;
use sheetforge_domain::{ListRule, RawFieldSpec, RawListRule, RuleSet, ScalarRule};

use super::ImportError;

/// Load and compile a rule file.
pub fn load_rules(path: &Path) -> Result<RuleSet, ImportError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rules = parse_rules(&contents)?;
    tracing::info!(
        path = %path.display(),
        scalars = rules.single.len(),
        lists = rules.lists.len(),
        "Loaded extraction rules"
    );
    Ok(rules)
}

/// Compile rules from YAML text. An empty document is an empty rule set.
pub fn parse_rules(yaml: &str) -> Result<RuleSet, ImportError> {
    let raw: Value = if yaml.trim().is_empty() {
        Value::Null
    } else {
        serde_yml::from_str(yaml)?
    };

    let map = match raw {
        Value::Null => return Ok(RuleSet::default()),
        Value::Mapping(map) => map,
        _ => return Err(ImportError::RulesShape),
    };

    let single = match map.get("single") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Mapping(entries)) => compile_scalars(entries),
        Some(_) => {
            tracing::warn!("'single' must be a mapping of key to path, ignoring it");
            Vec::new()
        }
    };

    let lists = match map.get("lists") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(entries)) => compile_lists(entries),
        Some(_) => {
            tracing::warn!("'lists' must be a sequence of list rules, ignoring it");
            Vec::new()
        }
    };

    Ok(RuleSet::new(single, lists))
}

fn compile_scalars(entries: &serde_yml::Mapping) -> Vec<ScalarRule> {
    let mut rules = Vec::with_capacity(entries.len());
    for (key, path) in entries {
        let Some(key) = key.as_str() else {
            tracing::warn!(key = ?key, "Scalar rule key is not a string, skipping");
            continue;
        };
        let Some(path) = path.as_str() else {
            tracing::warn!(key, "Scalar rule path is not a string, skipping");
            continue;
        };
        match ScalarRule::compile(key, path) {
            Ok(rule) => rules.push(rule),
            Err(e) => tracing::warn!(key, error = %e, "Skipping scalar rule"),
        }
    }
    rules
}

fn compile_lists(entries: &[Value]) -> Vec<ListRule> {
    let mut rules = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let mut entry = entry.clone();
        let fields = take_fields(&mut entry, idx);
        let mut raw: RawListRule = match serde_yml::from_value(entry) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(index = idx, error = %e, "Skipping malformed list rule");
                continue;
            }
        };
        raw.fields = fields;
        match ListRule::compile(raw) {
            Ok(rule) => rules.push(rule),
            Err(e) => tracing::warn!(index = idx, error = %e, "Skipping malformed list rule"),
        }
    }
    rules
}

/// Pull `fields` out of a list rule entry, deserializing each field spec on
/// its own so one bad spec only drops that field.
fn take_fields(entry: &mut Value, idx: usize) -> Option<BTreeMap<String, RawFieldSpec>> {
    let Value::Mapping(map) = entry else {
        return None;
    };
    let fields = match map.remove("fields")? {
        Value::Mapping(fields) => fields,
        Value::Null => return None,
        _ => {
            tracing::warn!(index = idx, "List rule 'fields' must be a mapping");
            return None;
        }
    };

    let mut specs = BTreeMap::new();
    for (name, spec) in fields {
        let Some(name) = name.as_str() else {
            tracing::warn!(index = idx, field = ?name, "Field name is not a string, skipping");
            continue;
        };
        match serde_yml::from_value::<RawFieldSpec>(spec) {
            Ok(spec) => {
                specs.insert(name.to_string(), spec);
            }
            Err(e) => {
                tracing::warn!(index = idx, field = name, error = %e, "Dropping field rule");
            }
        }
    }
    Some(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetforge_domain::FieldSpec;
    use std::io::Write;

    const RULES: &str = r#"
single:
  Name: character/name
  Strength: character/abilities/strength/score
  Broken: /absolute/path
lists:
  - name: Weapons
    container: character/weaponlist
    item_pattern: id-
    required_field: Name
    fields:
      Name: name
      Properties:
        path: properties
        type: flatten
        sub_fields: [name]
      DamageData:
        path: damagelist
        type: subtree
  - name: Incomplete
    container: character/featlist
  - "not a mapping"
"#;

    #[test]
    fn compiles_valid_rules_and_skips_bad_ones() {
        let rules = parse_rules(RULES).expect("valid yaml");

        let keys: Vec<_> = rules.single.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Name", "Strength"]);

        assert_eq!(rules.lists.len(), 1);
        let weapons = &rules.lists[0];
        assert_eq!(weapons.name, "Weapons");
        assert_eq!(weapons.required_field.as_deref(), Some("Name"));
        assert!(weapons
            .fields
            .iter()
            .any(|f| f.name == "DamageData" && matches!(f.spec, FieldSpec::Subtree { .. })));
    }

    #[test]
    fn bad_field_spec_drops_only_that_field() {
        let rules = parse_rules(
            "lists:\n  - name: Skills\n    container: skilllist\n    item_pattern: id-\n    fields:\n      Skill: name\n      Rank: 5\n      Hidden: true\n",
        )
        .expect("valid yaml");

        assert_eq!(rules.lists.len(), 1);
        let names: Vec<_> = rules.lists[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Skill"]);
    }

    #[test]
    fn list_rule_with_only_bad_fields_is_skipped() {
        let rules = parse_rules(
            "lists:\n  - name: Skills\n    container: skilllist\n    item_pattern: id-\n    fields:\n      Rank: 5\n",
        )
        .expect("valid yaml");
        assert!(rules.lists.is_empty());
    }

    #[test]
    fn empty_or_null_document_is_empty_rule_set() {
        assert!(parse_rules("").expect("empty").is_empty());
        assert!(parse_rules("~").expect("null").is_empty());
        assert!(parse_rules("single:\nlists:\n").expect("null keys").is_empty());
    }

    #[test]
    fn rejects_non_mapping_documents() {
        assert!(matches!(parse_rules("- a\n- b\n"), Err(ImportError::RulesShape)));
        assert!(matches!(parse_rules("single: [unclosed"), Err(ImportError::Rules(_))));
    }

    #[test]
    fn loads_rules_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(RULES.as_bytes()).expect("write rules");

        let rules = load_rules(file.path()).expect("loads");
        assert_eq!(rules.single.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = load_rules(&dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(ImportError::Io { .. })));
    }
}
