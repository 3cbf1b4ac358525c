//! Extraction rule sets.
//!
//! A rule set says which document nodes become which record fields. It is
//! written by hand in a configuration file, so it arrives in two shapes:
//!
//! - `Raw*` types mirror the file loosely (every key optional) so a single bad
//!   entry can be reported and skipped instead of rejecting the whole file.
//! - [`RuleSet`], [`ListRule`] and [`FieldSpec`] are the compiled form: paths
//!   parsed, defaults filled in, field-spec variants decided once.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::DomainError;
use crate::value_objects::NodePath;

const DEFAULT_SEPARATOR: &str = " ";
const DEFAULT_ITEM_SEPARATOR: &str = ", ";

// =============================================================================
// Raw configuration shapes
// =============================================================================

/// A list rule as written in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawListRule {
    pub name: Option<String>,
    pub container: Option<String>,
    pub item_pattern: Option<String>,
    pub required_field: Option<String>,
    pub fields: Option<BTreeMap<String, RawFieldSpec>>,
}

/// A field spec as written: either a bare path or a structured spec.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawFieldSpec {
    Path(String),
    Structured(RawStructuredField),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawStructuredField {
    pub path: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sub_fields: Vec<String>,
    pub separator: Option<String>,
    pub item_separator: Option<String>,
    pub fallback_path: Option<String>,
}

// =============================================================================
// Compiled rules
// =============================================================================

/// How one item field is read from a candidate node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// Concatenated text of the node at `path`.
    Text { path: NodePath },
    /// Children of the node at `path`, each reduced to its joined sub-fields.
    Flatten(FlattenSpec),
    /// The whole subtree at `path` as nested values.
    Subtree { path: NodePath },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenSpec {
    pub path: NodePath,
    pub sub_fields: Vec<NodePath>,
    pub separator: String,
    pub item_separator: String,
    pub fallback_path: Option<NodePath>,
}

impl FieldSpec {
    pub fn compile(raw: RawFieldSpec) -> Result<Self, DomainError> {
        let structured = match raw {
            RawFieldSpec::Path(path) => {
                return Ok(FieldSpec::Text {
                    path: NodePath::parse(&path)?,
                })
            }
            RawFieldSpec::Structured(structured) => structured,
        };

        let path = structured
            .path
            .as_deref()
            .ok_or_else(|| DomainError::invalid_rule("structured field spec has no path"))?;
        let path = NodePath::parse(path)?;

        match structured.kind.as_deref() {
            Some("flatten") => {
                let sub_fields = structured
                    .sub_fields
                    .iter()
                    .map(|p| NodePath::parse(p))
                    .collect::<Result<Vec<_>, _>>()?;
                let fallback_path = structured
                    .fallback_path
                    .as_deref()
                    .map(NodePath::parse)
                    .transpose()?;
                Ok(FieldSpec::Flatten(FlattenSpec {
                    path,
                    sub_fields,
                    separator: structured
                        .separator
                        .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
                    item_separator: structured
                        .item_separator
                        .unwrap_or_else(|| DEFAULT_ITEM_SEPARATOR.to_string()),
                    fallback_path,
                }))
            }
            Some("subtree") => Ok(FieldSpec::Subtree { path }),
            None => Ok(FieldSpec::Text { path }),
            Some(other) => {
                tracing::warn!(kind = other, path = %path, "Unknown field type, reading as text");
                Ok(FieldSpec::Text { path })
            }
        }
    }
}

/// A scalar rule: record key and the path its text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarRule {
    pub key: String,
    pub path: NodePath,
}

impl ScalarRule {
    pub fn compile(key: impl Into<String>, path: &str) -> Result<Self, DomainError> {
        Ok(Self {
            key: key.into(),
            path: NodePath::parse(path)?,
        })
    }
}

/// A named field inside a list rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub name: String,
    pub spec: FieldSpec,
}

/// A list rule: which children of a container become items, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRule {
    pub name: String,
    pub container: NodePath,
    pub item_pattern: String,
    pub required_field: Option<String>,
    pub fields: Vec<FieldRule>,
}

impl ListRule {
    /// Compile a raw list rule.
    ///
    /// A rule missing `name`, `container`, `item_pattern` or `fields` is an
    /// error. Individual fields that fail to compile are dropped with a
    /// warning; a rule left with no fields is an error.
    pub fn compile(raw: RawListRule) -> Result<Self, DomainError> {
        let name = non_empty(raw.name).ok_or_else(|| DomainError::invalid_rule("list rule has no name"))?;
        let missing = |key: &str| DomainError::invalid_rule(format!("list rule '{}' has no {}", name, key));

        let container = non_empty(raw.container).ok_or_else(|| missing("container"))?;
        let item_pattern = non_empty(raw.item_pattern).ok_or_else(|| missing("item_pattern"))?;
        let raw_fields = raw.fields.filter(|f| !f.is_empty()).ok_or_else(|| missing("fields"))?;
        let container = NodePath::parse(&container)?;

        let mut fields = Vec::with_capacity(raw_fields.len());
        for (field_name, raw_spec) in raw_fields {
            match FieldSpec::compile(raw_spec) {
                Ok(spec) => fields.push(FieldRule {
                    name: field_name,
                    spec,
                }),
                Err(e) => {
                    tracing::warn!(list = %name, field = %field_name, error = %e, "Dropping field rule");
                }
            }
        }
        if fields.is_empty() {
            return Err(missing("usable fields"));
        }

        let required_field = non_empty(raw.required_field);
        if let Some(required) = &required_field {
            if !fields.iter().any(|f| &f.name == required) {
                tracing::warn!(
                    list = %name,
                    required_field = %required,
                    "Required field is not extracted by this rule; every item will be dropped"
                );
            }
        }

        Ok(Self {
            name,
            container,
            item_pattern,
            required_field,
            fields,
        })
    }
}

/// Compiled extraction rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub single: Vec<ScalarRule>,
    pub lists: Vec<ListRule>,
}

impl RuleSet {
    pub fn new(single: Vec<ScalarRule>, lists: Vec<ListRule>) -> Self {
        Self { single, lists }
    }

    pub fn is_empty(&self) -> bool {
        self.single.is_empty() && self.lists.is_empty()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
