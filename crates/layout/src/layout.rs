use crate::layered::LayeredLayoutError;
use crate::model::{Diagnostic, GraphModel};
use crate::{CancelToken, CanvasSize, LayeredLayout, Rect, Vec2};
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

/// Error of the string-keyed pipeline, naming nodes by their id
pub type LayoutError = LayeredLayoutError<String>;

/// Computed layout of a [`GraphModel`], ready to hand to a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Box of every laid out node, in declaration order
    pub positions: IndexMap<String, Rect>,

    pub canvas: CanvasSize,

    pub layer_count: usize,

    /// Crossings left between adjacent layers
    pub crossings: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl Layout {
    pub fn position(&self, id: &str) -> Option<&Rect> {
        self.positions.get(id)
    }
}

impl LayeredLayout {
    /// Lay out a parsed graph model
    ///
    /// Edges with unknown endpoints and repeated node ids are skipped and
    /// listed in [`Layout::diagnostics`], as are nodes caught in a cycle
    /// unless the configuration rejects cycles.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or cycles are rejected
    pub fn layout_model(&self, model: &GraphModel) -> Result<Layout, LayoutError> {
        self.layout_model_with_cancel(model, &CancelToken::new())
    }

    /// Same as [`layout_model`](Self::layout_model), aborting once `cancel` is tripped
    pub fn layout_model_with_cancel(
        &self,
        model: &GraphModel,
        cancel: &CancelToken,
    ) -> Result<Layout, LayoutError> {
        let _span = info_span!("layout_model", nodes = model.nodes.len(), edges = model.edges.len())
            .entered();

        let lowered = model.lower();
        let name = |node: NodeIndex| lowered.spec(node).id.clone();

        let layers = self
            .compute_layers_with_cancel(&lowered.graph, cancel)
            .map_err(|err| err.map_node(name))?;

        let sizes = |node: NodeIndex| {
            let spec = lowered.spec(node);
            Vec2::new(
                self.config.node_width,
                self.config.resolve_height(&spec.kind, spec.height_hint),
            )
        };
        let positions = self
            .compute_positions_with_cancel(&layers, &sizes, cancel)
            .map_err(|err| err.map_node(name))?;
        let canvas = self.canvas_size(&layers, &positions);

        let mut diagnostics = lowered.diagnostics.clone();
        if !layers.unresolved.is_empty() {
            diagnostics.push(Diagnostic::Cycle {
                nodes: layers.unresolved.iter().map(|&node| name(node)).collect(),
            });
        }

        let positions: IndexMap<String, Rect> = lowered
            .graph
            .node_indices()
            .filter_map(|node| Some((name(node), *positions.get(&node)?)))
            .collect();

        debug!(
            "Laid out {} nodes on {} layers with {} crossings",
            positions.len(),
            layers.len(),
            layers.crossings
        );

        Ok(Layout {
            positions,
            canvas,
            layer_count: layers.len(),
            crossings: layers.crossings,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CyclePolicy, LayoutConfig, NodeSpec};
    use test_log::test;

    fn engine() -> LayeredLayout {
        LayeredLayout::new(LayoutConfig {
            column_step: 330.0,
            vertical_step: 220.0,
            padding: 60.0,
            ..Default::default()
        })
    }

    fn model(nodes: &[&str], edges: &[(&str, &str)]) -> GraphModel {
        let mut model = GraphModel::new();
        for id in nodes {
            model.add_node(NodeSpec::new(*id, "Op").with_height(100.0));
        }
        for (source, target) in edges {
            model.add_edge(*source, *target);
        }
        model
    }

    fn y(layout: &Layout, id: &str) -> f32 {
        layout.positions[id].y
    }

    #[test]
    fn linear_chain_is_straight() {
        let layout = engine()
            .layout_model(&model(&["A", "B", "C"], &[("A", "B"), ("B", "C")]))
            .unwrap();

        let xs: Vec<f32> = layout.positions.values().map(|r| r.x).collect();
        assert_eq!(xs, vec![60.0, 390.0, 720.0]);
        assert_eq!(y(&layout, "A"), y(&layout, "B"));
        assert_eq!(y(&layout, "B"), y(&layout, "C"));
        assert_eq!(layout.layer_count, 3);
        assert_eq!(layout.canvas.width, 2.0 * 60.0 + 3.0 * 330.0);
        assert!(layout.diagnostics.is_empty());
    }

    #[test]
    fn diamond_joins_in_the_middle() {
        let layout = engine()
            .layout_model(&model(
                &["A", "B", "C", "D"],
                &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
            ))
            .unwrap();

        assert_eq!(layout.positions["B"].x, layout.positions["C"].x);
        assert!((y(&layout, "B") - y(&layout, "C")).abs() >= 220.0);
        assert_eq!(y(&layout, "D"), (y(&layout, "B") + y(&layout, "C")) / 2.0);
        assert_eq!(layout.positions["D"].x, 720.0);
    }

    #[test]
    fn empty_model_has_empty_layout() {
        let layout = engine().layout_model(&GraphModel::new()).unwrap();

        assert!(layout.positions.is_empty());
        assert_eq!(layout.canvas, CanvasSize::new(0.0, 0.0));
        assert_eq!(layout.layer_count, 0);
    }

    #[test]
    fn dangling_edge_is_dropped() {
        let layout = engine()
            .layout_model(&model(&["A", "B"], &[("X", "A"), ("A", "B")]))
            .unwrap();

        assert_eq!(layout.positions.len(), 2);
        assert_eq!(layout.positions["A"].x, 60.0);
        assert_eq!(layout.positions["B"].x, 390.0);
        assert_eq!(
            layout.diagnostics,
            vec![Diagnostic::DanglingEdge {
                source: "X".into(),
                target: "A".into()
            }]
        );
    }

    #[test]
    fn isolated_nodes_share_layer_zero() {
        let layout = engine().layout_model(&model(&["A", "B"], &[])).unwrap();

        assert_eq!(layout.positions["A"].x, 60.0);
        assert_eq!(layout.positions["B"].x, 60.0);
        assert!((y(&layout, "B") - y(&layout, "A")).abs() >= 220.0);
        assert_eq!(layout.canvas.width, 2.0 * 60.0 + 330.0);
    }

    #[test]
    fn heights_come_from_hint_then_kind_then_default() {
        let mut config = LayoutConfig::default();
        config.kind_heights.insert("Conv".into(), 160.0);

        let mut graph = GraphModel::new();
        graph
            .add_node(NodeSpec::new("hinted", "Conv").with_height(50.0))
            .add_node(NodeSpec::new("conv", "Conv"))
            .add_node(NodeSpec::new("other", "Mystery"));

        let layout = LayeredLayout::new(config).layout_model(&graph).unwrap();

        assert_eq!(layout.positions["hinted"].height, 50.0);
        assert_eq!(layout.positions["conv"].height, 160.0);
        assert_eq!(layout.positions["other"].height, 100.0);
        assert!(layout.positions.values().all(|r| r.width == 240.0));
        // Three nodes stacked on layer 0, the last one 100 high
        assert_eq!(layout.canvas.height, 60.0 + 60.0 + 2.0 * 220.0 + 100.0);
    }

    #[test]
    fn cycle_is_reported_by_id() {
        let graph = model(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "B")]);

        let layout = engine().layout_model(&graph).unwrap();
        assert_eq!(layout.positions.len(), 3);
        assert_eq!(
            layout.diagnostics,
            vec![Diagnostic::Cycle {
                nodes: vec!["B".into(), "C".into()]
            }]
        );

        let mut strict = engine();
        strict.config.cycles = CyclePolicy::Reject;
        assert!(matches!(
            strict.layout_model(&graph),
            Err(LayoutError::GraphHasCycle(id)) if id == "B"
        ));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let graph = model(
            &["in", "a", "b", "c", "d", "out"],
            &[
                ("in", "a"),
                ("in", "b"),
                ("in", "c"),
                ("a", "d"),
                ("c", "d"),
                ("b", "out"),
                ("d", "out"),
            ],
        );

        let first = engine().layout_model(&graph).unwrap();
        let second = engine().layout_model(&graph).unwrap();

        assert_eq!(first, second);
        for (a, b) in first.positions.values().zip(second.positions.values()) {
            assert_eq!(a.y.to_bits(), b.y.to_bits());
        }
    }

    #[test]
    fn layer_invariants_hold_on_a_wide_graph() {
        let graph = model(
            &["s1", "s2", "a", "b", "c", "d", "e", "t"],
            &[
                ("s1", "a"),
                ("s1", "b"),
                ("s2", "b"),
                ("s2", "c"),
                ("a", "d"),
                ("b", "d"),
                ("b", "e"),
                ("c", "e"),
                ("d", "t"),
                ("e", "t"),
                ("s1", "t"),
            ],
        );
        let config = engine().config;
        let layout = engine().layout_model(&graph).unwrap();

        // Group by column and check spacing inside each one
        let mut columns: IndexMap<u32, Vec<f32>> = IndexMap::new();
        for rect in layout.positions.values() {
            columns.entry(rect.x.to_bits()).or_default().push(rect.y);
        }
        assert_eq!(columns.len(), layout.layer_count);
        for ys in columns.values_mut() {
            ys.sort_by(f32::total_cmp);
            assert!(ys[0] >= config.padding);
            for pair in ys.windows(2) {
                assert!(pair[1] - pair[0] >= config.vertical_step - 1e-3);
            }
        }

        let bottom = layout
            .positions
            .values()
            .map(|r| r.y + r.height)
            .fold(0.0, f32::max);
        assert!(layout.canvas.height >= config.padding + bottom);
        assert_eq!(
            layout.canvas.width,
            2.0 * config.padding + layout.layer_count as f32 * config.column_step
        );
    }

    #[test]
    fn tripped_token_cancels_model_layout() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = engine().layout_model_with_cancel(&model(&["A"], &[]), &cancel);
        assert!(matches!(result, Err(LayoutError::Cancelled)));
    }

    #[test]
    fn layout_serializes_as_camel_case_json() {
        let layout = engine()
            .layout_model(&model(&["A", "B"], &[("A", "B"), ("A", "Z")]))
            .unwrap();

        let json = serde_json::to_value(&layout).unwrap();
        assert_eq!(json["positions"]["B"]["x"], 390.0);
        assert_eq!(json["layerCount"], 2);
        assert_eq!(json["diagnostics"][0]["type"], "danglingEdge");

        let back: Layout = serde_json::from_value(json).unwrap();
        assert_eq!(back, layout);
    }
}
