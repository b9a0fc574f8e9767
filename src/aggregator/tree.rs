//! Arena-backed result tree.
//!
//! Groups write into the tree by top-level key (last write wins) or by
//! appending rows at a dotted path (concatenation). Paths are created on
//! demand; JSON objects met along a path are exploded into nodes so later
//! writes can descend into them.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

pub type NodeId = usize;

#[derive(Debug, Clone)]
enum Node {
    Map(BTreeMap<String, Slot>),
    List(Vec<Value>),
}

#[derive(Debug, Clone)]
enum Slot {
    Node(NodeId),
    Value(Value),
}

#[derive(Debug, Clone)]
pub struct ResultTree {
    nodes: Vec<Node>,
}

impl Default for ResultTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Map(BTreeMap::new())],
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Set `key` in map node `parent`, replacing whatever was there.
    pub fn insert(&mut self, parent: NodeId, key: &str, value: Value) {
        if let Some(Node::Map(m)) = self.nodes.get_mut(parent) {
            m.insert(key.to_string(), Slot::Value(value));
        }
    }

    /// Child map node `key` of `parent`, creating it (or exploding an object
    /// value into it). `None` when a non-object value is in the way.
    fn child_map(&mut self, parent: NodeId, key: &str) -> Option<NodeId> {
        let existing = match self.nodes.get(parent) {
            Some(Node::Map(m)) => m.get(key).cloned(),
            _ => return None,
        };
        let id = match existing {
            Some(Slot::Node(id)) => match self.nodes.get(id) {
                Some(Node::Map(_)) => return Some(id),
                _ => return None,
            },
            Some(Slot::Value(Value::Object(obj))) => self.explode(obj),
            Some(Slot::Value(_)) => return None,
            None => self.alloc(Node::Map(BTreeMap::new())),
        };
        if let Some(Node::Map(m)) = self.nodes.get_mut(parent) {
            m.insert(key.to_string(), Slot::Node(id));
        }
        Some(id)
    }

    fn explode(&mut self, obj: Map<String, Value>) -> NodeId {
        let slots = obj.into_iter().map(|(k, v)| (k, Slot::Value(v))).collect();
        self.alloc(Node::Map(slots))
    }

    /// Map node at `path`, created as needed. Logs and returns `None` on a
    /// conflicting value.
    pub fn ensure_map(&mut self, path: &[&str]) -> Option<NodeId> {
        let mut current = Self::ROOT;
        for segment in path {
            match self.child_map(current, segment) {
                Some(id) => current = id,
                None => {
                    tracing::warn!(path = %path.join("."), segment, "path blocked by a non-map value");
                    return None;
                }
            }
        }
        Some(current)
    }

    /// Append `rows` to the list at `path`, creating intermediate maps.
    pub fn append(&mut self, path: &[&str], rows: Vec<Value>) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let Some(parent) = self.ensure_map(parents) else {
            return;
        };

        let existing = match self.nodes.get(parent) {
            Some(Node::Map(m)) => m.get(*last).cloned(),
            _ => return,
        };
        match existing {
            Some(Slot::Node(id)) => match self.nodes.get_mut(id) {
                Some(Node::List(list)) => list.extend(rows),
                _ => {
                    tracing::warn!(path = %path.join("."), "cannot append rows to a map");
                }
            },
            Some(Slot::Value(Value::Array(mut list))) => {
                list.extend(rows);
                self.set_list(parent, last, list);
            }
            Some(Slot::Value(Value::Object(obj))) if obj.is_empty() => {
                self.set_list(parent, last, rows);
            }
            Some(Slot::Value(_)) => {
                tracing::warn!(path = %path.join("."), "cannot append rows to a scalar");
            }
            None => self.set_list(parent, last, rows),
        }
    }

    fn set_list(&mut self, parent: NodeId, key: &str, rows: Vec<Value>) {
        let id = self.alloc(Node::List(rows));
        if let Some(Node::Map(m)) = self.nodes.get_mut(parent) {
            m.insert(key.to_string(), Slot::Node(id));
        }
    }

    pub fn into_value(self) -> Value {
        self.node_value(Self::ROOT)
    }

    fn node_value(&self, id: NodeId) -> Value {
        match &self.nodes[id] {
            Node::List(rows) => Value::Array(rows.clone()),
            Node::Map(m) => Value::Object(
                m.iter()
                    .map(|(k, slot)| {
                        let v = match slot {
                            Slot::Node(child) => self.node_value(*child),
                            Slot::Value(v) => v.clone(),
                        };
                        (k.clone(), v)
                    })
                    .collect(),
            ),
        }
    }
}

/// Split a dotted path into segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('.').filter(|s| !s.is_empty()).collect()
}
