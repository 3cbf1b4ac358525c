//! Path expressions for locating nodes inside a character sheet document.
//!
//! Paths are compiled once when a rule set is loaded and evaluated against
//! anything implementing [`DocumentNode`]. The grammar is the ElementTree
//! subset sheet rule files are written in:
//!
//! - `abilities/strength/score` - child steps by tag
//! - `.` - the context node itself, `*` - any child element
//! - `.//name` or `a//b` - descendants at any depth
//! - `[2]`, `[last()]` - position among the nodes a step selected (1-based)
//! - `[@type]`, `[@type='melee']` - attribute presence / equality
//! - `[name]`, `[name='Perception']` - child presence / child text equality
//!
//! Absolute paths and parent steps (`..`) are rejected.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The node capabilities the extraction engine relies on.
pub trait DocumentNode: Sized {
    /// Tag name of the node.
    fn tag(&self) -> &str;

    /// Attribute value by name.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Element children in document order.
    fn children(&self) -> &[Self];

    /// All text inside the node, including nested elements, in document order.
    fn text_content(&self) -> String;

    /// Text directly inside the node, excluding nested elements.
    fn own_text(&self) -> String;
}

/// Error when compiling a path expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodePathError {
    #[error("Empty path expression")]
    Empty,
    #[error("Absolute paths are not supported: '{0}'")]
    Absolute(String),
    #[error("Parent steps are not supported: '{0}'")]
    ParentStep(String),
    #[error("Path ends with a separator: '{0}'")]
    TrailingSeparator(String),
    #[error("Invalid step '{step}' in '{path}'")]
    InvalidStep { path: String, step: String },
    #[error("Invalid predicate '[{predicate}]' in '{path}'")]
    InvalidPredicate { path: String, predicate: String },
    #[error("Unclosed predicate in '{0}'")]
    UnclosedPredicate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    SelfNode,
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Tag(String),
}

impl NameTest {
    fn matches<N: DocumentNode>(&self, node: &N) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Tag(tag) => node.tag() == tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Last,
    HasAttribute(String),
    AttributeEquals(String, String),
    HasChild(String),
    ChildTextEquals(String, String),
}

impl Predicate {
    fn apply<'a, N: DocumentNode>(&self, nodes: Vec<&'a N>) -> Vec<&'a N> {
        match self {
            Predicate::Position(n) => nodes.into_iter().nth(n - 1).into_iter().collect(),
            Predicate::Last => nodes.last().copied().into_iter().collect(),
            Predicate::HasAttribute(name) => nodes
                .into_iter()
                .filter(|node| node.attribute(name).is_some())
                .collect(),
            Predicate::AttributeEquals(name, value) => nodes
                .into_iter()
                .filter(|node| node.attribute(name) == Some(value.as_str()))
                .collect(),
            Predicate::HasChild(tag) => nodes
                .into_iter()
                .filter(|node| node.children().iter().any(|c| c.tag() == tag))
                .collect(),
            Predicate::ChildTextEquals(tag, value) => nodes
                .into_iter()
                .filter(|node| {
                    node.children()
                        .iter()
                        .any(|c| c.tag() == tag && c.text_content() == *value)
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    raw: String,
    steps: Vec<Step>,
}

impl NodePath {
    /// Compile a path expression.
    pub fn parse(expr: &str) -> Result<Self, NodePathError> {
        let raw = expr.trim();
        if raw.is_empty() {
            return Err(NodePathError::Empty);
        }
        if raw.starts_with('/') {
            return Err(NodePathError::Absolute(raw.to_string()));
        }

        let segments = split_segments(raw)?;
        let mut steps = Vec::with_capacity(segments.len());
        let mut descend = false;

        for (idx, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                if idx + 1 == segments.len() {
                    return Err(NodePathError::TrailingSeparator(raw.to_string()));
                }
                if descend {
                    return Err(NodePathError::InvalidStep {
                        path: raw.to_string(),
                        step: String::new(),
                    });
                }
                descend = true;
                continue;
            }
            steps.push(parse_step(raw, segment, descend)?);
            descend = false;
        }

        Ok(Self {
            raw: raw.to_string(),
            steps,
        })
    }

    /// The expression as written in the rule set.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// First matching node in document order.
    pub fn find<'a, N: DocumentNode>(&self, node: &'a N) -> Option<&'a N> {
        self.find_all(node).into_iter().next()
    }

    /// Every matching node in document order.
    pub fn find_all<'a, N: DocumentNode>(&self, node: &'a N) -> Vec<&'a N> {
        let mut current = vec![node];
        for step in &self.steps {
            let mut next: Vec<&'a N> = Vec::new();
            for ctx in current {
                let selected: Vec<&'a N> = match step.axis {
                    Axis::SelfNode => vec![ctx],
                    Axis::Child => ctx
                        .children()
                        .iter()
                        .filter(|child| step.test.matches(*child))
                        .collect(),
                    Axis::Descendant => {
                        let mut found = Vec::new();
                        collect_descendants(ctx, &step.test, &mut found);
                        found
                    }
                };
                let selected = step
                    .predicates
                    .iter()
                    .fold(selected, |nodes, predicate| predicate.apply(nodes));
                for node in selected {
                    if !next.iter().any(|seen| std::ptr::eq(*seen, node)) {
                        next.push(node);
                    }
                }
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }
        current
    }

    /// Concatenated, trimmed text of the first match; `None` when nothing matched.
    pub fn text<N: DocumentNode>(&self, node: &N) -> Option<String> {
        self.find(node).map(|found| found.text_content().trim().to_string())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for NodePath {
    type Err = NodePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn collect_descendants<'a, N: DocumentNode>(node: &'a N, test: &NameTest, out: &mut Vec<&'a N>) {
    for child in node.children() {
        if test.matches(child) {
            out.push(child);
        }
        collect_descendants(child, test, out);
    }
}

/// Split on `/` outside of predicates and quoted strings.
fn split_segments(raw: &str) -> Result<Vec<&str>, NodePathError> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (idx, ch) in raw.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') if depth > 0 => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth = depth.checked_sub(1).ok_or_else(|| NodePathError::InvalidStep {
                    path: raw.to_string(),
                    step: raw[start..=idx].to_string(),
                })?;
            }
            (None, '/') if depth == 0 => {
                segments.push(&raw[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    if depth > 0 || quote.is_some() {
        return Err(NodePathError::UnclosedPredicate(raw.to_string()));
    }
    segments.push(&raw[start..]);
    Ok(segments)
}

fn parse_step(raw: &str, segment: &str, descend: bool) -> Result<Step, NodePathError> {
    let invalid_step = || NodePathError::InvalidStep {
        path: raw.to_string(),
        step: segment.to_string(),
    };

    let (name, mut rest) = match segment.find('[') {
        Some(pos) => (&segment[..pos], &segment[pos..]),
        None => (segment, ""),
    };

    let (axis, test) = match name {
        ".." => return Err(NodePathError::ParentStep(raw.to_string())),
        "." if descend => return Err(invalid_step()),
        "." => (Axis::SelfNode, NameTest::Any),
        "*" if descend => (Axis::Descendant, NameTest::Any),
        "*" => (Axis::Child, NameTest::Any),
        tag if is_valid_name(tag) => {
            let axis = if descend { Axis::Descendant } else { Axis::Child };
            (axis, NameTest::Tag(tag.to_string()))
        }
        _ => return Err(invalid_step()),
    };

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let body_end = closing_bracket(rest).ok_or_else(|| NodePathError::UnclosedPredicate(raw.to_string()))?;
        let body = &rest[1..body_end];
        predicates.push(parse_predicate(raw, body)?);
        rest = &rest[body_end + 1..];
        if !rest.is_empty() && !rest.starts_with('[') {
            return Err(invalid_step());
        }
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

/// Index of the `]` closing the predicate that opens at `s[0]`.
fn closing_bracket(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, ch) in s.char_indices().skip(1) {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, ']') => return Some(idx),
            _ => {}
        }
    }
    None
}

fn parse_predicate(raw: &str, body: &str) -> Result<Predicate, NodePathError> {
    let invalid = || NodePathError::InvalidPredicate {
        path: raw.to_string(),
        predicate: body.to_string(),
    };
    let body = body.trim();

    if body == "last()" {
        return Ok(Predicate::Last);
    }
    if body.chars().all(|c| c.is_ascii_digit()) && !body.is_empty() {
        return match body.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Predicate::Position(n)),
            _ => Err(invalid()),
        };
    }

    let (lhs, value) = match body.split_once('=') {
        Some((lhs, rhs)) => (lhs.trim(), Some(unquote(rhs.trim()).ok_or_else(invalid)?)),
        None => (body, None),
    };

    match lhs.strip_prefix('@') {
        Some(attr) if is_valid_name(attr) => Ok(match value {
            Some(v) => Predicate::AttributeEquals(attr.to_string(), v.to_string()),
            None => Predicate::HasAttribute(attr.to_string()),
        }),
        Some(_) => Err(invalid()),
        None if is_valid_name(lhs) => Ok(match value {
            Some(v) => Predicate::ChildTextEquals(lhs.to_string(), v.to_string()),
            None => Predicate::HasChild(lhs.to_string()),
        }),
        None => Err(invalid()),
    }
}

fn unquote(s: &str) -> Option<&str> {
    let quote = s.chars().next()?;
    if (quote == '\'' || quote == '"') && s.len() >= 2 && s.ends_with(quote) {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        && !name.starts_with('.')
        && !name.starts_with('-')
}
