use crate::Vec2;
use std::collections::HashMap;
use std::hash::Hash;

/// Trait for providing node sizes during coordinate assignment
///
/// Only the height influences the canvas; the width is reported back on
/// each placed [`Rect`](crate::Rect) so renderers can draw the box.
pub trait NodeSizes<N> {
    /// Get the size of a node
    fn size(&self, node: N) -> Vec2;
}

// Blanket implementation for closures
impl<N, F> NodeSizes<N> for F
where
    F: Fn(N) -> Vec2,
{
    fn size(&self, node: N) -> Vec2 {
        self(node)
    }
}

// Unknown nodes collapse to a zero-sized box
impl<N: Eq + Hash + Copy> NodeSizes<N> for HashMap<N, Vec2> {
    fn size(&self, node: N) -> Vec2 {
        self.get(&node).copied().unwrap_or(Vec2::zero())
    }
}
