use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RenderError, Result};

/// A single named input on a workflow node.
///
/// Inputs are either literal parameters (numbers, strings, booleans) or
/// references to another node's output slot. References serialize to the
/// two-element array `["<node_id>", <slot>]` the render server expects;
/// literals serialize as themselves.
///
/// Deserialization is by shape, so a *literal* two-element
/// `["string", uint]` array parses back as a `Slot`. The wire format
/// cannot distinguish the two, and no standard node takes such a literal;
/// re-loaded graphs treat the shape as a reference, and `validate()` will
/// reject it if the named node is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeInput {
    /// Reference to `(node_id, output_slot)` of another node in the graph.
    Slot(String, u32),
    /// Literal parameter value.
    Value(Value),
}

impl NodeInput {
    /// Reference another node's output slot.
    pub fn slot(node_id: impl Into<String>, output_slot: u32) -> Self {
        NodeInput::Slot(node_id.into(), output_slot)
    }
}

impl From<&str> for NodeInput {
    fn from(v: &str) -> Self {
        NodeInput::Value(Value::from(v))
    }
}

impl From<String> for NodeInput {
    fn from(v: String) -> Self {
        NodeInput::Value(Value::from(v))
    }
}

impl From<bool> for NodeInput {
    fn from(v: bool) -> Self {
        NodeInput::Value(Value::from(v))
    }
}

impl From<u32> for NodeInput {
    fn from(v: u32) -> Self {
        NodeInput::Value(Value::from(v))
    }
}

impl From<i64> for NodeInput {
    fn from(v: i64) -> Self {
        NodeInput::Value(Value::from(v))
    }
}

impl From<f64> for NodeInput {
    fn from(v: f64) -> Self {
        NodeInput::Value(Value::from(v))
    }
}

impl From<Value> for NodeInput {
    fn from(v: Value) -> Self {
        NodeInput::Value(v)
    }
}

/// A named operation in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub class_type: String,
    pub inputs: BTreeMap<String, NodeInput>,
}

impl Node {
    pub fn new(class_type: impl Into<String>) -> Self {
        Self {
            class_type: class_type.into(),
            inputs: BTreeMap::new(),
        }
    }

    /// Add an input, consuming and returning the node for chaining.
    pub fn input(mut self, name: impl Into<String>, value: impl Into<NodeInput>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }
}

/// A directed workflow graph, keyed by node id.
///
/// No ordering invariant is maintained; the render server executes the
/// graph topologically. Cycles are not detected here, only dangling
/// references are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Graph {
    nodes: BTreeMap<String, Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under the given id, replacing any previous node.
    pub fn add(&mut self, id: impl Into<String>, node: Node) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Check that every slot reference resolves to a node id present in
    /// this graph.
    pub fn validate(&self) -> Result<()> {
        for (id, node) in &self.nodes {
            for (name, input) in &node.inputs {
                if let NodeInput::Slot(target, _) = input {
                    if !self.nodes.contains_key(target) {
                        return Err(RenderError::DanglingReference {
                            node: id.clone(),
                            input: name.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Serialize to the wire shape the render server consumes.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
