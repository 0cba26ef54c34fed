//! String-keyed graph model handed over by parsers
//!
//! The layered pipeline works on petgraph node indices. [`GraphModel::lower`]
//! turns the model into a `petgraph::Graph` whose indices follow node
//! declaration order, dropping whatever cannot be laid out.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// A node as declared by the input graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub id: String,

    /// Category tag, only used to look up a display height
    #[serde(default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_hint: Option<f32>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            height_hint: None,
        }
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height_hint = Some(height);
        self
    }
}

/// A directed edge between two declared node ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
}

impl EdgeSpec {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Abstract node/edge set, read-only to the layout engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

/// Non-fatal findings attached to a computed layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Diagnostic {
    /// An edge named an endpoint that was never declared and was dropped
    DanglingEdge { source: String, target: String },

    /// A node id was declared more than once; only the first is laid out
    DuplicateNode { id: String },

    /// These nodes sit on or behind a cycle and were put on layer 0
    Cycle { nodes: Vec<String> },
}

/// Model lowered onto petgraph, with the declaration that owns each index
#[derive(Debug)]
pub(crate) struct LoweredGraph<'a> {
    pub graph: DiGraph<(), ()>,
    pub nodes: Vec<&'a NodeSpec>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoweredGraph<'_> {
    pub fn spec(&self, node: NodeIndex) -> &NodeSpec {
        self.nodes[node.index()]
    }
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: NodeSpec) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.edges.push(EdgeSpec::new(source, target));
        self
    }

    /// Build the petgraph representation used by the layered pipeline
    ///
    /// Node indices follow declaration order. Parallel edges are kept, each
    /// one counting on its own. Edges with an unknown endpoint and repeated
    /// node ids are dropped and reported.
    pub(crate) fn lower(&self) -> LoweredGraph<'_> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut index_of: HashMap<&str, NodeIndex> = HashMap::with_capacity(self.nodes.len());
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut diagnostics = Vec::new();

        for node in &self.nodes {
            if index_of.contains_key(node.id.as_str()) {
                warn!("Dropping duplicate declaration of node {:?}", node.id);
                diagnostics.push(Diagnostic::DuplicateNode {
                    id: node.id.clone(),
                });
                continue;
            }
            index_of.insert(node.id.as_str(), graph.add_node(()));
            nodes.push(node);
        }

        for edge in &self.edges {
            let (Some(&source), Some(&target)) = (
                index_of.get(edge.source.as_str()),
                index_of.get(edge.target.as_str()),
            ) else {
                warn!(
                    "Dropping edge {:?} -> {:?} with an unknown endpoint",
                    edge.source, edge.target
                );
                diagnostics.push(Diagnostic::DanglingEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                });
                continue;
            };
            graph.add_edge(source, target, ());
        }

        LoweredGraph {
            graph,
            nodes,
            diagnostics,
        }
    }
}
