use crate::{CancelToken, NodeSizes, Rect};
use std::collections::HashMap;
use std::hash::Hash;

/// A layout engine that can compute node boxes for a graph
///
/// This trait is generic over the graph type `G`, so an engine can state
/// which petgraph capabilities it needs. [`LayeredLayout`](crate::LayeredLayout)
/// implements it for every graph that can list its nodes and walk edges in
/// both directions.
pub trait LayoutEngine<G> {
    /// The type used to identify nodes in the graph
    type NodeId: Copy + Ord + Hash;

    /// Error returned when no layout can be produced
    type Error: std::error::Error;

    /// Compute node boxes, aborting early once `cancel` is tripped
    ///
    /// # Errors
    /// Returns an error if the layout is cancelled or if layout-specific
    /// constraints are violated
    fn layout_with_cancel<S>(
        &self,
        graph: G,
        sizes: &S,
        cancel: &CancelToken,
    ) -> Result<HashMap<Self::NodeId, Rect>, Self::Error>
    where
        S: NodeSizes<Self::NodeId>;

    /// Compute node boxes for the given graph
    fn layout<S>(&self, graph: G, sizes: &S) -> Result<HashMap<Self::NodeId, Rect>, Self::Error>
    where
        S: NodeSizes<Self::NodeId>,
    {
        self.layout_with_cancel(graph, sizes, &CancelToken::new())
    }
}
