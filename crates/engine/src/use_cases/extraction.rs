//! Rule-driven extraction of a record from a document tree.
//!
//! Extraction never fails: a path that matches nothing is logged, reported
//! as an [`ExtractionMiss`] and treated as nothing extracted.

use std::collections::BTreeMap;
use std::fmt;

use sheetforge_domain::{
    DocumentNode, FieldSpec, FlattenSpec, Item, ListRule, Record, RuleSet, ScalarRule, Value,
};

// =============================================================================
// Result Types
// =============================================================================

/// Something a rule expected but the document did not provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionMiss {
    /// A scalar path matched nothing, or only blank text.
    ScalarMissing { key: String, path: String },
    /// A list container path matched nothing; the list is stored empty.
    ContainerMissing { list: String, container: String },
    /// A candidate was dropped because its required field came back empty.
    GhostItem {
        list: String,
        index: usize,
        required_field: String,
    },
    /// A candidate produced no field values at all.
    EmptyItem { list: String, index: usize },
}

impl fmt::Display for ExtractionMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMiss::ScalarMissing { key, path } => {
                write!(f, "field '{}' not found at '{}'", key, path)
            }
            ExtractionMiss::ContainerMissing { list, container } => {
                write!(f, "container '{}' for list '{}' not found", container, list)
            }
            ExtractionMiss::GhostItem {
                list,
                index,
                required_field,
            } => write!(
                f,
                "{} item #{} has no '{}', dropped",
                list, index, required_field
            ),
            ExtractionMiss::EmptyItem { list, index } => {
                write!(f, "{} item #{} is empty, dropped", list, index)
            }
        }
    }
}

/// The extracted record plus everything that was missing along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub record: Record,
    pub misses: Vec<ExtractionMiss>,
}

// =============================================================================
// Extractor
// =============================================================================

/// Applies a compiled rule set to documents.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    rules: RuleSet,
}

impl Extractor {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Extract a record from the document rooted at `root`.
    pub fn extract<N: DocumentNode>(&self, root: &N) -> Extraction {
        let mut extraction = Extraction::default();

        for rule in &self.rules.single {
            extract_scalar(root, rule, &mut extraction);
        }
        for rule in &self.rules.lists {
            extract_list(root, rule, &mut extraction);
        }

        tracing::debug!(
            scalars = extraction.record.scalars().count(),
            lists = extraction.record.lists().count(),
            misses = extraction.misses.len(),
            "Extraction finished"
        );
        extraction
    }
}

fn extract_scalar<N: DocumentNode>(root: &N, rule: &ScalarRule, extraction: &mut Extraction) {
    match rule.path.text(root).filter(|text| !text.is_empty()) {
        Some(text) => extraction.record.set_scalar(rule.key.clone(), text),
        None => {
            tracing::warn!(key = %rule.key, path = %rule.path, "Field not found");
            extraction.misses.push(ExtractionMiss::ScalarMissing {
                key: rule.key.clone(),
                path: rule.path.to_string(),
            });
        }
    }
}

fn extract_list<N: DocumentNode>(root: &N, rule: &ListRule, extraction: &mut Extraction) {
    let Some(container) = rule.container.find(root) else {
        tracing::warn!(list = %rule.name, container = %rule.container, "Container not found");
        extraction.misses.push(ExtractionMiss::ContainerMissing {
            list: rule.name.clone(),
            container: rule.container.to_string(),
        });
        extraction.record.set_list(rule.name.clone(), Vec::new());
        return;
    };

    let candidates = container
        .children()
        .iter()
        .filter(|child| child.tag().contains(rule.item_pattern.as_str()));

    let mut items = Vec::new();
    for (index, candidate) in candidates.enumerate() {
        let item: Item = rule
            .fields
            .iter()
            .filter_map(|field| {
                field_value(candidate, &field.spec).map(|value| (field.name.clone(), value))
            })
            .collect();

        if item.is_empty() {
            tracing::debug!(list = %rule.name, index, "Skipping empty item");
            extraction.misses.push(ExtractionMiss::EmptyItem {
                list: rule.name.clone(),
                index,
            });
            continue;
        }
        if let Some(required) = &rule.required_field {
            if !item.presence(required).is_present() {
                tracing::warn!(list = %rule.name, index, required_field = %required, "Skipping ghost item");
                extraction.misses.push(ExtractionMiss::GhostItem {
                    list: rule.name.clone(),
                    index,
                    required_field: required.clone(),
                });
                continue;
            }
        }
        items.push(item);
    }

    if items.is_empty() {
        tracing::warn!(list = %rule.name, container = %rule.container, "No items found");
    }
    extraction.record.set_list(rule.name.clone(), items);
}

/// Value of one field spec for a candidate node; `None` when nothing usable.
fn field_value<N: DocumentNode>(node: &N, spec: &FieldSpec) -> Option<Value> {
    let value = match spec {
        FieldSpec::Text { path } => path.text(node).map(Value::Text),
        FieldSpec::Flatten(flatten) => flatten_value(node, flatten).map(Value::Text),
        FieldSpec::Subtree { path } => path.find(node).map(subtree_value),
    }?;

    let blank = matches!(&value, Value::Text(text) if text.trim().is_empty());
    (!blank).then_some(value)
}

fn flatten_value<N: DocumentNode>(node: &N, spec: &FlattenSpec) -> Option<String> {
    let Some(container) = spec.path.find(node) else {
        return spec.fallback_path.as_ref().and_then(|path| path.text(node));
    };

    let entries: Vec<String> = container
        .children()
        .iter()
        .filter_map(|entry| {
            let parts: Vec<String> = spec
                .sub_fields
                .iter()
                .filter_map(|sub_field| sub_field.text(entry))
                .filter(|text| !text.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(spec.separator.as_str()))
        })
        .collect();

    (!entries.is_empty()).then(|| entries.join(spec.item_separator.as_str()))
}

/// Convert a subtree: leaves become their text, branches become maps keyed
/// by child tag, and repeated tags collect into a list.
pub fn subtree_value<N: DocumentNode>(node: &N) -> Value {
    if node.children().is_empty() {
        return Value::Text(node.own_text());
    }

    let mut map: BTreeMap<String, Value> = BTreeMap::new();
    for child in node.children() {
        let value = subtree_value(child);
        match map.remove(child.tag()) {
            None => {
                map.insert(child.tag().to_string(), value);
            }
            Some(Value::List(mut values)) => {
                values.push(value);
                map.insert(child.tag().to_string(), Value::List(values));
            }
            Some(previous) => {
                map.insert(child.tag().to_string(), Value::List(vec![previous, value]));
            }
        }
    }
    Value::Map(map)
}
