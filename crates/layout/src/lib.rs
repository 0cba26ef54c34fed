//! Left-to-right layered layout for directed acyclic graphs
//!
//! This crate computes where to draw the boxes of a DAG so that edges flow
//! from left to right, nodes of a layer share a column, and chains of nodes
//! stay on a straight line. Its stages work on any graph implementing
//! petgraph's visitor traits; [`GraphModel`] is a string-keyed front door for
//! graphs coming out of a parser.
//!
//! The pipeline runs from scratch on every call:
//!
//! 1. layers: longest path from the sources
//! 2. ordering: three fixed barycenter sweeps to reduce crossings
//! 3. coordinates: a cursor-driven top-down pass, then a bottom-up
//!    straightening pass
//! 4. canvas: bounding box of the result, padding included
//!
//! # Example
//!
//! ```
//! use layerflow_layout::{GraphModel, LayeredLayout, LayoutEngine, NodeSpec, Vec2};
//! use petgraph::graphmap::DiGraphMap;
//!
//! // Lay out a parsed model
//! let mut model = GraphModel::new();
//! model
//!     .add_node(NodeSpec::new("input", "Input"))
//!     .add_node(NodeSpec::new("conv", "Conv"))
//!     .add_edge("input", "conv");
//!
//! let engine = LayeredLayout::default();
//! let layout = engine.layout_model(&model).unwrap();
//! assert_eq!(layout.positions["conv"].x, 390.0);
//!
//! // Or any petgraph graph, calling each step for better control
//! let mut graph = DiGraphMap::new();
//! graph.add_edge(1, 2, ());
//! graph.add_edge(2, 3, ());
//!
//! let sizes = |_node: i32| Vec2::new(240.0, 100.0);
//! let positions = engine.layout(&graph, &sizes).unwrap();
//! assert_eq!(positions[&1].y, positions[&3].y);
//!
//! let layers = engine.compute_layers(&graph).unwrap();
//! let positions = engine.compute_positions(&layers, &sizes).unwrap();
//! let canvas = engine.canvas_size(&layers, &positions);
//! assert_eq!(canvas.width, 2.0 * 60.0 + 3.0 * 330.0);
//! ```

mod cancel;
mod config;
mod engine;
mod geometry;
mod layout;
mod model;
mod sizes;

pub mod layered;

// Re-export core types and traits
pub use cancel::CancelToken;
pub use config::{ConfigError, CyclePolicy, LayoutConfig};
pub use engine::LayoutEngine;
pub use geometry::{CanvasSize, Point, Rect, Vec2};
pub use layout::{Layout, LayoutError};
pub use model::{Diagnostic, EdgeSpec, GraphModel, NodeSpec};
pub use sizes::NodeSizes;

// Re-export petgraph visitor traits for graph abstraction
pub use petgraph::visit::{GraphBase, IntoNeighborsDirected, IntoNodeIdentifiers};
pub use petgraph::Direction;

// Re-export layered layout types
pub use layered::{LayeredLayout, LayeredLayoutError, Layers};
