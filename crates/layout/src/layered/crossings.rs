use crate::cancel::{CancelToken, Cancelled};
use petgraph::visit::IntoNeighborsDirected;
use petgraph::Direction;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    /// Order each layer by its predecessors in the layer before
    Forward,
    /// Order each layer by its successors in the layer after
    Backward,
}

/// Always exactly these sweeps, whatever the resulting crossing count
const SWEEPS: [Sweep; 3] = [Sweep::Forward, Sweep::Backward, Sweep::Forward];

/// Reorder nodes inside their layers with the barycenter heuristic
///
/// Nodes never change layer. Returns the number of crossings left between
/// adjacent layers.
pub(crate) fn minimize_crossings<G>(
    graph: G,
    layers: &mut [Vec<G::NodeId>],
    cancel: &CancelToken,
) -> Result<usize, Cancelled>
where
    G: IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash,
{
    for sweep in SWEEPS {
        match sweep {
            Sweep::Forward => {
                for layer in 1..layers.len() {
                    cancel.check()?;
                    reorder_layer(graph, layers, layer, layer - 1, Direction::Incoming);
                }
            }
            Sweep::Backward => {
                for layer in (0..layers.len().saturating_sub(1)).rev() {
                    cancel.check()?;
                    reorder_layer(graph, layers, layer, layer + 1, Direction::Outgoing);
                }
            }
        }
        trace!("{sweep:?} sweep: {} crossings", count_crossings(graph, layers));
    }

    let crossings = count_crossings(graph, layers);
    debug!("Crossing minimization left {crossings} crossings");
    Ok(crossings)
}

/// Stable-sort `layers[layer]` by the barycenter of its neighbors in `layers[fixed]`
fn reorder_layer<G>(
    graph: G,
    layers: &mut [Vec<G::NodeId>],
    layer: usize,
    fixed: usize,
    direction: Direction,
) where
    G: IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash,
{
    let fixed_index = index_in_layer(&layers[fixed]);

    let mut keyed: Vec<(f32, G::NodeId)> = layers[layer]
        .iter()
        .map(|&node| (barycenter(graph, node, direction, &fixed_index), node))
        .collect();

    // `sort_by` is stable: nodes without neighbors keep their relative order
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    layers[layer] = keyed.into_iter().map(|(_, node)| node).collect();
}

/// Mean position of the node's neighbors in the fixed layer, or +inf without any
fn barycenter<G>(
    graph: G,
    node: G::NodeId,
    direction: Direction,
    fixed_index: &HashMap<G::NodeId, usize>,
) -> f32
where
    G: IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash,
{
    let mut sum = 0.0;
    let mut count = 0;

    for neighbor in graph.neighbors_directed(node, direction) {
        if let Some(&index) = fixed_index.get(&neighbor) {
            sum += index as f32;
            count += 1;
        }
    }

    if count > 0 {
        sum / count as f32
    } else {
        f32::INFINITY
    }
}

fn index_in_layer<N: Copy + Hash + Eq>(layer: &[N]) -> HashMap<N, usize> {
    layer
        .iter()
        .enumerate()
        .map(|(index, &node)| (node, index))
        .collect()
}

/// Count the edge crossings between every pair of adjacent layers
///
/// Only edges joining two adjacent layers are considered; longer edges have
/// no fixed route at this stage.
pub(crate) fn count_crossings<G>(graph: G, layers: &[Vec<G::NodeId>]) -> usize
where
    G: IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash,
{
    layers
        .windows(2)
        .map(|pair| two_layer_crossings(graph, &pair[0], &pair[1]))
        .sum()
}

/// Accumulator-tree crossing count between two layers
fn two_layer_crossings<G>(graph: G, upper: &[G::NodeId], lower: &[G::NodeId]) -> usize
where
    G: IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash,
{
    if lower.is_empty() {
        return 0;
    }

    let lower_index = index_in_layer(lower);

    // Lower endpoints of all edges, sorted by upper then lower position
    let mut targets = Vec::new();
    for &node in upper {
        let start = targets.len();
        targets.extend(
            graph
                .neighbors_directed(node, Direction::Outgoing)
                .filter_map(|succ| lower_index.get(&succ).copied()),
        );
        targets[start..].sort_unstable();
    }

    let mut first_leaf = 1;
    while first_leaf < lower.len() {
        first_leaf <<= 1;
    }
    let mut tree = vec![0usize; 2 * first_leaf - 1];
    first_leaf -= 1;

    let mut crossings = 0;
    for target in targets {
        let mut index = target + first_leaf;
        tree[index] += 1;
        while index > 0 {
            // Left children add the weight of edges already ending to their right
            if index % 2 == 1 {
                crossings += tree[index + 1];
            }
            index = (index - 1) / 2;
            tree[index] += 1;
        }
    }

    crossings
}
