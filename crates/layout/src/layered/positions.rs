use crate::cancel::{CancelToken, Cancelled};
use crate::{LayoutConfig, NodeSizes, Point, Rect};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, trace};

/// Assign coordinates to nodes based on their layer structure and sizes
///
/// Edge weights of `graph` are edge multiplicities: parallel edges pull a
/// node toward their endpoint once per edge.
pub(crate) fn assign_coordinates<N, S>(
    layers: &[Vec<N>],
    graph: &DiGraphMap<N, usize>,
    sizes: &S,
    config: &LayoutConfig,
    cancel: &CancelToken,
) -> Result<HashMap<N, Rect>, Cancelled>
where
    N: Copy + Ord + Hash,
    S: NodeSizes<N>,
{
    let mut ys = HashMap::with_capacity(graph.node_count());

    place_top_down(layers, graph, &mut ys, config, cancel)?;
    refine_bottom_up(layers, graph, &mut ys, config, cancel)?;

    let mut positions = HashMap::with_capacity(ys.len());
    for (layer_index, layer) in layers.iter().enumerate() {
        let x = column_x(layer_index, config);
        for &node in layer {
            positions.insert(node, Rect::from_min_size(Point::new(x, ys[&node]), sizes.size(node)));
        }
    }

    debug!("Placed {} nodes", positions.len());
    Ok(positions)
}

/// Left edge of every node in the given layer
pub(crate) fn column_x(layer_index: usize, config: &LayoutConfig) -> f32 {
    config.padding + layer_index as f32 * config.column_step
}

/// First pass: walk the layers in causal order behind a per-layer cursor
///
/// Each node goes to the mean height of its already placed predecessors,
/// unless that is above the cursor.
fn place_top_down<N>(
    layers: &[Vec<N>],
    graph: &DiGraphMap<N, usize>,
    ys: &mut HashMap<N, f32>,
    config: &LayoutConfig,
    cancel: &CancelToken,
) -> Result<(), Cancelled>
where
    N: Copy + Ord + Hash,
{
    for layer in layers {
        cancel.check()?;

        let mut cursor = config.padding;
        for &node in layer {
            let y = match neighbor_mean(graph, node, Direction::Incoming, ys) {
                Some(ideal) => cursor.max(ideal),
                None => cursor,
            };
            ys.insert(node, y);
            cursor = y + config.vertical_step;
        }
    }

    Ok(())
}

/// Second pass: pull nodes toward their successors, last layer first
///
/// A node moves to the mean height of its successors, clamped so it stays
/// below the padding, at least one step under the node above it and at least
/// one step over the node below it. Nodes without successors stay put.
fn refine_bottom_up<N>(
    layers: &[Vec<N>],
    graph: &DiGraphMap<N, usize>,
    ys: &mut HashMap<N, f32>,
    config: &LayoutConfig,
    cancel: &CancelToken,
) -> Result<(), Cancelled>
where
    N: Copy + Ord + Hash,
{
    for layer in layers.iter().rev() {
        cancel.check()?;

        for (index, &node) in layer.iter().enumerate().rev() {
            let Some(ideal) = neighbor_mean(graph, node, Direction::Outgoing, ys) else {
                continue;
            };

            let lower = match index.checked_sub(1) {
                Some(above) => config.padding.max(ys[&layer[above]] + config.vertical_step),
                None => config.padding,
            };
            let upper = layer
                .get(index + 1)
                .map_or(f32::INFINITY, |below| ys[below] - config.vertical_step);

            // Rounding can leave no room at all; the node then keeps its place
            if lower > upper {
                continue;
            }

            let y = ideal.max(lower).min(upper);
            if let Some(current) = ys.insert(node, y) {
                if current != y {
                    trace!("Moved node from y={current} to y={y}");
                }
            }
        }
    }

    Ok(())
}

/// Mean y of the placed neighbors in `direction`, counting parallel edges
fn neighbor_mean<N>(
    graph: &DiGraphMap<N, usize>,
    node: N,
    direction: Direction,
    ys: &HashMap<N, f32>,
) -> Option<f32>
where
    N: Copy + Ord + Hash,
{
    let mut sum = 0.0;
    let mut count = 0;

    for neighbor in graph.neighbors_directed(node, direction) {
        let Some(&y) = ys.get(&neighbor) else {
            continue;
        };
        let edge = match direction {
            Direction::Incoming => (neighbor, node),
            Direction::Outgoing => (node, neighbor),
        };
        let multiplicity = graph.edge_weight(edge.0, edge.1).copied().unwrap_or(1);
        sum += y * multiplicity as f32;
        count += multiplicity;
    }

    if count > 0 {
        Some(sum / count as f32)
    } else {
        None
    }
}
