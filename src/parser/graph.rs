//! Reference-indexed structured data embedded in listing pages.
//!
//! The payload is a flat JSON array; integers inside records point at other
//! entries of that array, and some entries are `{ "value": <ref> }` boxes
//! around the real value. References may form cycles, so every walk here is
//! bounded by a depth ceiling.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

static HANDOVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script type="framer/handover"[^>]*>(.+?)</script>"#).unwrap()
});

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Str(String),
    Array(Vec<Node>),
    Object(Vec<(String, Node)>),
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => Node::Number(n),
            Value::String(s) => Node::Str(s),
            Value::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => {
                Node::Object(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl Node {
    pub fn field(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Object(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// True when every key is present with a non-empty value.
    pub fn has_fields(&self, keys: &[&str]) -> bool {
        keys.iter()
            .all(|k| self.field(k).is_some_and(|v| v.is_truthy()))
    }

    fn is_truthy(&self) -> bool {
        match self {
            Node::Null => false,
            Node::Bool(b) => *b,
            Node::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Node::Str(s) => !s.is_empty(),
            Node::Array(_) | Node::Object(_) => true,
        }
    }

    fn as_index(&self) -> Option<usize> {
        match self {
            Node::Number(n) => n.as_u64().map(|i| i as usize),
            _ => None,
        }
    }
}

/// Outcome of following a reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'g> {
    Literal(&'g str),
    /// The reference pointed at something that is neither a string nor a box.
    Unresolved(&'g Node),
    Missing,
}

impl<'g> Resolved<'g> {
    pub fn as_text(&self) -> Option<&'g str> {
        match self {
            Resolved::Literal(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StructuredGraph {
    nodes: Vec<Node>,
    depth_limit: usize,
}

impl StructuredGraph {
    pub fn new(nodes: Vec<Node>, depth_limit: usize) -> Self {
        StructuredGraph { nodes, depth_limit }
    }

    /// Parse the serialized payload. A top-level object is accepted too; its
    /// entries become the table in document order.
    pub fn parse(payload: &str, depth_limit: usize) -> serde_json::Result<Self> {
        let nodes = match serde_json::from_str::<Value>(payload)? {
            Value::Array(items) => items.into_iter().map(Node::from).collect(),
            Value::Object(map) => map.into_iter().map(|(_, v)| Node::from(v)).collect(),
            other => vec![Node::from(other)],
        };
        Ok(Self::new(nodes, depth_limit))
    }

    /// Locate the handover script in a listing page and parse it.
    /// Absent or malformed payloads yield `None`.
    pub fn from_html(html: &str, depth_limit: usize) -> Option<Self> {
        let Some(caps) = HANDOVER_RE.captures(html) else {
            debug!("No structured-data payload in listing page");
            return None;
        };
        match Self::parse(&caps[1], depth_limit) {
            Ok(graph) => Some(graph),
            Err(e) => {
                warn!("Structured data failed to parse, ignoring it: {}", e);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn resolve<'g>(&'g self, reference: &'g Node) -> Resolved<'g> {
        self.resolve_at(reference, 0)
    }

    fn resolve_at<'g>(&'g self, reference: &'g Node, depth: usize) -> Resolved<'g> {
        if depth > self.depth_limit {
            debug!("Reference chain exceeded depth {}", self.depth_limit);
            return Resolved::Missing;
        }
        match reference {
            Node::Str(s) => Resolved::Literal(s),
            Node::Number(_) => {
                let Some(target) = reference.as_index().and_then(|i| self.nodes.get(i)) else {
                    return Resolved::Missing;
                };
                if let Some(inner) = target.field("value") {
                    return self.resolve_at(inner, depth + 1);
                }
                match target {
                    Node::Str(s) => Resolved::Literal(s),
                    _ => Resolved::Unresolved(reference),
                }
            }
            _ => Resolved::Missing,
        }
    }

    /// First record in depth-first pre-order satisfying `predicate`.
    /// Branches deeper than the ceiling are abandoned.
    pub fn find_record<F>(&self, predicate: F) -> Option<&Node>
    where
        F: Fn(&Node) -> bool,
    {
        self.nodes
            .iter()
            .find_map(|node| self.search(node, &predicate, 1))
    }

    fn search<'g, F>(&'g self, node: &'g Node, predicate: &F, depth: usize) -> Option<&'g Node>
    where
        F: Fn(&Node) -> bool,
    {
        if depth > self.depth_limit {
            return None;
        }
        match node {
            Node::Array(items) => items
                .iter()
                .find_map(|item| self.search(item, predicate, depth + 1)),
            Node::Object(fields) => {
                if predicate(node) {
                    return Some(node);
                }
                fields
                    .iter()
                    .find_map(|(_, v)| self.search(v, predicate, depth + 1))
            }
            _ => None,
        }
    }
}
