mod canvas;
mod crossings;
mod layers;
mod positions;

use crate::cancel::{CancelToken, Cancelled};
use crate::config::{ConfigError, CyclePolicy};
use crate::{CanvasSize, LayoutConfig, LayoutEngine, NodeSizes, Rect};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{IntoNeighborsDirected, IntoNodeIdentifiers};
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;
use tracing::{debug, warn};

use canvas::canvas_size;
use crossings::minimize_crossings;
use layers::{assign_layers, LayerAssignment};
use positions::assign_coordinates;

/// Errors that can occur during layered layout computation
#[derive(Debug, Error)]
pub enum LayeredLayoutError<N>
where
    N: fmt::Debug,
{
    /// Some nodes never reached in-degree zero and cycles are rejected.
    /// The node is the first unresolved one in declaration order.
    #[error("graph contains a cycle through or upstream of node {0:?}")]
    GraphHasCycle(N),

    #[error("layout was cancelled")]
    Cancelled,

    #[error("invalid layout configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl<N: fmt::Debug> From<Cancelled> for LayeredLayoutError<N> {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl<N: fmt::Debug> LayeredLayoutError<N> {
    /// Translate the node carried by the error, e.g. from an index to an id
    pub fn map_node<M: fmt::Debug>(self, f: impl FnOnce(N) -> M) -> LayeredLayoutError<M> {
        match self {
            Self::GraphHasCycle(node) => LayeredLayoutError::GraphHasCycle(f(node)),
            Self::Cancelled => LayeredLayoutError::Cancelled,
            Self::InvalidConfig(err) => LayeredLayoutError::InvalidConfig(err),
        }
    }
}

/// Left-to-right layered (Sugiyama-style) DAG layout
#[derive(Debug, Clone, Default)]
pub struct LayeredLayout {
    pub config: LayoutConfig,
}

impl LayeredLayout {
    /// Create a new layered layout with the given configuration
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }
}

/// Layer structure that can be cached and reused
#[derive(Debug, Clone)]
pub struct Layers<N>
where
    N: Copy + Ord + Hash,
{
    /// Internal graph for edge lookups, weighted by edge multiplicity
    pub(crate) graph: DiGraphMap<N, usize>,

    /// Nodes organized into layers, each in its crossing-minimized order
    pub nodes: Vec<Vec<N>>,

    /// Number of edge crossings between adjacent layers (quality metric)
    pub crossings: usize,

    /// Nodes put on layer 0 because a cycle kept them from being reached
    pub unresolved: Vec<N>,
}

impl<N> Layers<N>
where
    N: Copy + Ord + Hash,
{
    /// Number of layers, zero for an empty graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Layer holding the given node
    pub fn layer_of(&self, node: N) -> Option<usize> {
        self.nodes.iter().position(|layer| layer.contains(&node))
    }
}

impl LayeredLayout {
    /// Compute layer structure (cache this)
    ///
    /// This phase assigns nodes to layers and minimizes edge crossings.
    /// It only depends on the graph structure, not on node sizes.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid, or if the graph
    /// has a cycle and the configuration rejects them
    pub fn compute_layers<G>(&self, graph: G) -> Result<Layers<G::NodeId>, LayeredLayoutError<G::NodeId>>
    where
        G: IntoNodeIdentifiers + IntoNeighborsDirected,
        G::NodeId: Copy + Ord + Hash + fmt::Debug,
    {
        self.compute_layers_with_cancel(graph, &CancelToken::new())
    }

    /// Same as [`compute_layers`](Self::compute_layers), polling `cancel` as it goes
    pub fn compute_layers_with_cancel<G>(
        &self,
        graph: G,
        cancel: &CancelToken,
    ) -> Result<Layers<G::NodeId>, LayeredLayoutError<G::NodeId>>
    where
        G: IntoNodeIdentifiers + IntoNeighborsDirected,
        G::NodeId: Copy + Ord + Hash + fmt::Debug,
    {
        self.config.validate()?;

        let LayerAssignment {
            layers: mut nodes,
            unresolved,
        } = assign_layers(graph, cancel)?;

        if let Some(&node) = unresolved.first() {
            if self.config.cycles == CyclePolicy::Reject {
                return Err(LayeredLayoutError::GraphHasCycle(node));
            }
            warn!(
                "{} nodes are on or behind a cycle and were put on layer 0, first is {node:?}",
                unresolved.len()
            );
        }

        let crossings = minimize_crossings(graph, &mut nodes, cancel)?;

        // Convert graph to DiGraphMap for efficient lookups during positioning
        let mut internal_graph = DiGraphMap::new();
        for node in graph.node_identifiers() {
            internal_graph.add_node(node);
        }
        for node in graph.node_identifiers() {
            for succ in graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(multiplicity) = internal_graph.edge_weight_mut(node, succ) {
                    *multiplicity += 1;
                } else {
                    internal_graph.add_edge(node, succ, 1);
                }
            }
        }

        Ok(Layers {
            graph: internal_graph,
            nodes,
            crossings,
            unresolved,
        })
    }

    /// Compute positions from cached layers (cheap, rerun when sizes change)
    ///
    /// This phase assigns coordinates to nodes based on their layer structure
    /// and current sizes. It can be called repeatedly as node sizes change.
    pub fn compute_positions<N, S>(
        &self,
        layers: &Layers<N>,
        sizes: &S,
    ) -> Result<HashMap<N, Rect>, LayeredLayoutError<N>>
    where
        N: Copy + Ord + Hash + fmt::Debug,
        S: NodeSizes<N>,
    {
        self.compute_positions_with_cancel(layers, sizes, &CancelToken::new())
    }

    /// Same as [`compute_positions`](Self::compute_positions), polling `cancel` between layers
    pub fn compute_positions_with_cancel<N, S>(
        &self,
        layers: &Layers<N>,
        sizes: &S,
        cancel: &CancelToken,
    ) -> Result<HashMap<N, Rect>, LayeredLayoutError<N>>
    where
        N: Copy + Ord + Hash + fmt::Debug,
        S: NodeSizes<N>,
    {
        self.config.validate()?;

        Ok(assign_coordinates(
            &layers.nodes,
            &layers.graph,
            sizes,
            &self.config,
            cancel,
        )?)
    }

    /// Size of the canvas holding the given positions
    pub fn canvas_size<N>(&self, layers: &Layers<N>, positions: &HashMap<N, Rect>) -> CanvasSize
    where
        N: Copy + Ord + Hash,
    {
        let canvas = canvas_size(layers.len(), positions.values(), &self.config);
        debug!("Canvas is {}x{}", canvas.width, canvas.height);
        canvas
    }
}

// Implement LayoutEngine for any graph with the required capabilities
impl<G> LayoutEngine<G> for LayeredLayout
where
    G: IntoNodeIdentifiers + IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash + fmt::Debug,
{
    type NodeId = G::NodeId;
    type Error = LayeredLayoutError<G::NodeId>;

    fn layout_with_cancel<S>(
        &self,
        graph: G,
        sizes: &S,
        cancel: &CancelToken,
    ) -> Result<HashMap<Self::NodeId, Rect>, Self::Error>
    where
        S: NodeSizes<Self::NodeId>,
    {
        let layers = self.compute_layers_with_cancel(graph, cancel)?;
        self.compute_positions_with_cancel(&layers, sizes, cancel)
    }
}
