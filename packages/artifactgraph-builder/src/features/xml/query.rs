//! Restricted path query facility
//!
//! A small, XPath-shaped language over a parsed tree:
//!
//! ```text
//! expr      := 'string(' path ')' | path
//! path      := ('/' | '//')? step (('/' | '//') step)*
//! step      := '.' | '..' | 'text()' | '@' name | nametest predicate*
//! nametest  := '*' | prefix ':' '*' | prefix ':' local | local
//! predicate := '[' ( integer | '@' name ( '=' literal )? | nametest ( '=' literal )? ) ']'
//! ```
//!
//! Prefixes are bound at compile time through [`NamespaceBindings`]; an
//! unbound prefix is a compile error, not an empty result.

use roxmltree::Node;
use tracing::trace;

use super::namespace::NamespaceBindings;
use crate::errors::{BuilderError, Result};

/// Shape requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    String,
    Node,
    NodeSet,
}

/// Query result, shaped per [`ReturnShape`]
#[derive(Debug, Clone)]
pub enum QueryValue<'a, 'input> {
    String(String),
    Node(Option<Node<'a, 'input>>),
    NodeSet(Vec<Node<'a, 'input>>),
}

impl<'a, 'input> QueryValue<'a, 'input> {
    pub fn into_string(self) -> String {
        match self {
            QueryValue::String(s) => s,
            QueryValue::Node(n) => n.map(string_value).unwrap_or_default(),
            QueryValue::NodeSet(nodes) => nodes.first().copied().map(string_value).unwrap_or_default(),
        }
    }

    pub fn into_nodes(self) -> Vec<Node<'a, 'input>> {
        match self {
            QueryValue::String(_) => Vec::new(),
            QueryValue::Node(n) => n.into_iter().collect(),
            QueryValue::NodeSet(nodes) => nodes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    AnyIn(String),
    Exact {
        namespace: Option<String>,
        local: String,
    },
}

impl NameTest {
    fn matches_element(&self, node: Node<'_, '_>) -> bool {
        if !node.is_element() {
            return false;
        }
        let tag = node.tag_name();
        match self {
            NameTest::Any => true,
            NameTest::AnyIn(ns) => tag.namespace() == Some(ns.as_str()),
            NameTest::Exact { namespace, local } => {
                tag.name() == local && tag.namespace() == namespace.as_deref()
            }
        }
    }

    fn attribute_value<'a>(&self, node: Node<'a, '_>) -> Option<&'a str> {
        node.attributes()
            .find(|attr| match self {
                NameTest::Any => true,
                NameTest::AnyIn(ns) => attr.namespace() == Some(ns.as_str()),
                NameTest::Exact { namespace, local } => {
                    attr.name() == local && attr.namespace() == namespace.as_deref()
                }
            })
            .map(|attr| attr.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    HasAttribute(NameTest),
    AttributeEquals(NameTest, String),
    HasChild(NameTest),
    ChildEquals(NameTest, String),
}

impl Predicate {
    fn keep(&self, node: Node<'_, '_>) -> bool {
        match self {
            Predicate::Position(_) => true,
            Predicate::HasAttribute(test) => test.attribute_value(node).is_some(),
            Predicate::AttributeEquals(test, value) => test.attribute_value(node) == Some(value.as_str()),
            Predicate::HasChild(test) => node.children().any(|c| test.matches_element(c)),
            Predicate::ChildEquals(test, value) => node
                .children()
                .filter(|c| test.matches_element(*c))
                .any(|c| string_value(c) == *value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    SelfNode,
    Parent,
    DescendantOrSelf,
    Text,
    Child(NameTest, Vec<Predicate>),
    Attribute(NameTest),
}

/// Compiled path expression
#[derive(Debug, Clone)]
pub struct PathQuery {
    expression: String,
    string_fn: bool,
    absolute: bool,
    steps: Vec<Step>,
}

enum Selection<'a, 'input> {
    Nodes(Vec<Node<'a, 'input>>),
    Values(Vec<&'a str>),
}

impl PathQuery {
    /// Compile `expression` against `bindings`
    pub fn compile(expression: &str, bindings: &NamespaceBindings) -> Result<Self> {
        let trimmed = expression.trim();
        let (string_fn, path) = match trimmed.strip_prefix("string(") {
            Some(rest) => match rest.strip_suffix(')') {
                Some(inner) => (true, inner.trim()),
                None => return Err(BuilderError::unsupported_query(expression, "unterminated string()")),
            },
            None => (false, trimmed),
        };
        if path.is_empty() {
            return Err(BuilderError::unsupported_query(expression, "empty path"));
        }

        let segments = split_segments(path).map_err(|reason| BuilderError::unsupported_query(expression, reason))?;
        let absolute = segments.first().is_some_and(|s| s.is_empty());
        let body = if absolute { &segments[1..] } else { &segments[..] };

        let mut steps = Vec::with_capacity(body.len());
        for (idx, segment) in body.iter().enumerate() {
            let last = idx + 1 == body.len();
            if segment.is_empty() {
                if last {
                    if absolute && body.len() == 1 {
                        // bare "/"
                        break;
                    }
                    return Err(BuilderError::unsupported_query(expression, "path ends with '/'"));
                }
                steps.push(Step::DescendantOrSelf);
                continue;
            }
            let step = parse_step(segment, bindings).map_err(|reason| BuilderError::unsupported_query(expression, reason))?;
            if matches!(step, Step::Attribute(_)) && !last {
                return Err(BuilderError::unsupported_query(expression, "attribute step must be last"));
            }
            steps.push(step);
        }

        Ok(Self {
            expression: expression.to_string(),
            string_fn,
            absolute,
            steps,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluate against `scope`
    pub fn evaluate<'a, 'input>(
        &self,
        scope: Node<'a, 'input>,
        shape: ReturnShape,
    ) -> Result<QueryValue<'a, 'input>> {
        let start = if self.absolute { scope.document().root() } else { scope };
        let selection = self.select(start);
        trace!(expression = %self.expression, "evaluated path query");

        if self.string_fn || shape == ReturnShape::String {
            let value = match selection {
                Selection::Nodes(nodes) => nodes.first().copied().map(string_value).unwrap_or_default(),
                Selection::Values(values) => values.first().map(|v| v.to_string()).unwrap_or_default(),
            };
            return Ok(QueryValue::String(value));
        }

        match selection {
            Selection::Nodes(nodes) => Ok(match shape {
                ReturnShape::Node => QueryValue::Node(nodes.first().copied()),
                _ => QueryValue::NodeSet(nodes),
            }),
            Selection::Values(_) => Err(BuilderError::unsupported_query(
                &self.expression,
                "attribute results can only be read as strings",
            )),
        }
    }

    fn select<'a, 'input>(&self, start: Node<'a, 'input>) -> Selection<'a, 'input> {
        let mut current = vec![start];

        for step in &self.steps {
            let mut next: Vec<Node<'a, 'input>> = Vec::new();
            match step {
                Step::SelfNode => next = current.clone(),
                Step::Parent => next.extend(current.iter().filter_map(|n| n.parent())),
                Step::DescendantOrSelf => {
                    for node in &current {
                        next.extend(node.descendants());
                    }
                }
                Step::Text => {
                    for node in &current {
                        next.extend(node.children().filter(|c| c.is_text()));
                    }
                }
                Step::Child(test, predicates) => {
                    for node in &current {
                        let mut candidates: Vec<_> =
                            node.children().filter(|c| test.matches_element(*c)).collect();
                        for predicate in predicates {
                            candidates = match predicate {
                                Predicate::Position(n) => candidates.get(n - 1).copied().into_iter().collect(),
                                other => candidates.into_iter().filter(|c| other.keep(*c)).collect(),
                            };
                        }
                        next.extend(candidates);
                    }
                }
                Step::Attribute(test) => {
                    let values = current
                        .iter()
                        .filter_map(|n| test.attribute_value(*n))
                        .collect();
                    return Selection::Values(values);
                }
            }
            next.sort_by_key(|n| n.id().get());
            next.dedup_by_key(|n| n.id().get());
            current = next;
        }

        Selection::Nodes(current)
    }
}

/// XPath string-value of a node
pub fn string_value(node: Node<'_, '_>) -> String {
    if node.is_text() {
        return node.text().unwrap_or_default().to_string();
    }
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Split on '/' outside of predicates and quoted literals
fn split_segments(path: &str) -> std::result::Result<Vec<String>, String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in path.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '\'') | (None, '"') => {
                quote = Some(ch);
                current.push(ch);
            }
            (None, '[') => {
                depth += 1;
                current.push(ch);
            }
            (None, ']') => {
                depth = depth.checked_sub(1).ok_or("unbalanced ']'")?;
                current.push(ch);
            }
            (None, '/') if depth == 0 => segments.push(std::mem::take(&mut current)),
            (None, c) => current.push(c),
        }
    }
    if quote.is_some() {
        return Err("unterminated string literal".to_string());
    }
    if depth != 0 {
        return Err("unterminated predicate".to_string());
    }
    segments.push(current);
    Ok(segments.into_iter().map(|s| s.trim().to_string()).collect())
}

fn parse_step(segment: &str, bindings: &NamespaceBindings) -> std::result::Result<Step, String> {
    match segment {
        "." => return Ok(Step::SelfNode),
        ".." => return Ok(Step::Parent),
        "text()" => return Ok(Step::Text),
        _ => {}
    }

    if let Some(attr) = segment.strip_prefix('@') {
        if attr.contains('[') {
            return Err(format!("predicates are not supported on attribute step '{}'", segment));
        }
        return Ok(Step::Attribute(parse_name_test(attr, bindings)?));
    }

    let (name, mut rest) = match segment.find('[') {
        Some(idx) => (&segment[..idx], &segment[idx..]),
        None => (segment, ""),
    };
    let test = parse_name_test(name.trim(), bindings)?;

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let inner_end = matching_bracket(rest).ok_or_else(|| format!("unterminated predicate in '{}'", segment))?;
        predicates.push(parse_predicate(rest[1..inner_end].trim(), bindings)?);
        rest = rest[inner_end + 1..].trim_start();
        if !rest.is_empty() && !rest.starts_with('[') {
            return Err(format!("unexpected text after predicate in '{}'", segment));
        }
    }

    Ok(Step::Child(test, predicates))
}

/// Index of the ']' closing the '[' at position 0
fn matching_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in s.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'') | (None, '"') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_predicate(inner: &str, bindings: &NamespaceBindings) -> std::result::Result<Predicate, String> {
    if inner.is_empty() {
        return Err("empty predicate".to_string());
    }
    if inner.chars().all(|c| c.is_ascii_digit()) {
        let position: usize = inner.parse().map_err(|_| format!("bad position '{}'", inner))?;
        if position == 0 {
            return Err("positions start at 1".to_string());
        }
        return Ok(Predicate::Position(position));
    }

    let (lhs, literal) = match inner.split_once('=') {
        Some((lhs, rhs)) => (lhs.trim(), Some(parse_literal(rhs.trim())?)),
        None => (inner, None),
    };

    match (lhs.strip_prefix('@'), literal) {
        (Some(attr), None) => Ok(Predicate::HasAttribute(parse_name_test(attr, bindings)?)),
        (Some(attr), Some(value)) => Ok(Predicate::AttributeEquals(parse_name_test(attr, bindings)?, value)),
        (None, None) => Ok(Predicate::HasChild(parse_name_test(lhs, bindings)?)),
        (None, Some(value)) => Ok(Predicate::ChildEquals(parse_name_test(lhs, bindings)?, value)),
    }
}

fn parse_literal(raw: &str) -> std::result::Result<String, String> {
    let mut chars = raw.chars();
    match (chars.next(), raw.chars().last()) {
        (Some(open), Some(close)) if (open == '\'' || open == '"') && open == close && raw.len() >= 2 => {
            Ok(raw[1..raw.len() - 1].to_string())
        }
        _ => Err(format!("expected a quoted literal, found '{}'", raw)),
    }
}

fn parse_name_test(raw: &str, bindings: &NamespaceBindings) -> std::result::Result<NameTest, String> {
    if raw == "*" {
        return Ok(NameTest::Any);
    }
    let (prefix, local) = match raw.split_once(':') {
        Some((p, l)) => (Some(p), l),
        None => (None, raw),
    };
    if !is_valid_local(local) && local != "*" {
        return Err(format!("unsupported name test '{}'", raw));
    }

    let namespace = match prefix {
        Some(p) => Some(
            bindings
                .uri(p)
                .ok_or_else(|| format!("unbound prefix '{}'", p))?
                .to_string(),
        ),
        None => None,
    };

    Ok(match (namespace, local) {
        (Some(ns), "*") => NameTest::AnyIn(ns),
        (None, "*") => NameTest::Any,
        (namespace, local) => NameTest::Exact {
            namespace,
            local: local.to_string(),
        },
    })
}

fn is_valid_local(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
