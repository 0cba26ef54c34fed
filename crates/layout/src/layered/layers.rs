use crate::cancel::{CancelToken, Cancelled};
use petgraph::visit::{IntoNeighborsDirected, IntoNodeIdentifiers};
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use tracing::{debug, trace};

/// Result of the longest-path layering
#[derive(Debug, Clone)]
pub(crate) struct LayerAssignment<N> {
    /// Nodes grouped by layer, each layer in declaration order
    pub layers: Vec<Vec<N>>,

    /// Nodes left with a positive in-degree once the queue drained
    pub unresolved: Vec<N>,
}

/// Assign every node the length of the longest path reaching it from a source
///
/// Breadth-first propagation from the in-degree zero nodes, seeded in
/// declaration order so the result is reproducible. A node is only expanded
/// once all of its incoming edges were visited, at which point its recorded
/// layer is final. Nodes that never get there (cycles and whatever sits
/// behind them) land on layer 0.
pub(crate) fn assign_layers<G>(
    graph: G,
    cancel: &CancelToken,
) -> Result<LayerAssignment<G::NodeId>, Cancelled>
where
    G: IntoNodeIdentifiers + IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash,
{
    let nodes: Vec<_> = graph.node_identifiers().collect();

    let mut in_degree: HashMap<_, usize> = nodes
        .iter()
        .map(|&node| {
            (
                node,
                graph.neighbors_directed(node, Direction::Incoming).count(),
            )
        })
        .collect();

    let mut layer_map: HashMap<_, usize> = HashMap::with_capacity(nodes.len());
    let mut queue = VecDeque::new();
    for &node in &nodes {
        if in_degree[&node] == 0 {
            layer_map.insert(node, 0);
            queue.push_back(node);
        }
    }

    while let Some(node) = queue.pop_front() {
        cancel.check()?;

        let next_layer = layer_map[&node] + 1;
        for succ in graph.neighbors_directed(node, Direction::Outgoing) {
            let layer = layer_map.entry(succ).or_insert(next_layer);
            *layer = (*layer).max(next_layer);

            let Some(remaining) = in_degree.get_mut(&succ) else {
                continue;
            };
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                queue.push_back(succ);
            }
        }
    }

    let mut unresolved = Vec::new();
    for &node in &nodes {
        if in_degree[&node] > 0 {
            layer_map.insert(node, 0);
            unresolved.push(node);
        }
    }

    // Group nodes by layer, keeping declaration order inside each layer
    let max_layer = layer_map.values().copied().max().unwrap_or(0);
    let mut layers = if nodes.is_empty() {
        Vec::new()
    } else {
        vec![Vec::new(); max_layer + 1]
    };
    for &node in &nodes {
        layers[layer_map[&node]].push(node);
    }

    debug!(
        "Assigned {} nodes to {} layers ({} unresolved)",
        nodes.len(),
        layers.len(),
        unresolved.len()
    );
    trace!("Layer sizes: {:?}", layers.iter().map(Vec::len).collect::<Vec<_>>());

    Ok(LayerAssignment { layers, unresolved })
}
