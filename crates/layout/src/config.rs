use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the pipeline does when some nodes never reach in-degree zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclePolicy {
    /// Put the unresolved nodes on layer 0 and report them as a diagnostic
    #[default]
    Fallback,
    /// Abort the layout with an error naming one of the unresolved nodes
    Reject,
}

/// Errors reported by [`LayoutConfig::validate`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("`{field}` must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("`padding` must be a non-negative finite number, got {0}")]
    InvalidPadding(f32),

    #[error("height for kind `{kind}` must be a positive finite number, got {value}")]
    InvalidKindHeight { kind: String, value: f32 },
}

/// Visual theme of the layered layout
///
/// Every field has a default, so a partial configuration file only needs to
/// name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width shared by every node box
    pub node_width: f32,

    /// Horizontal distance between the left edges of adjacent layers
    pub column_step: f32,

    /// Minimum vertical distance between two nodes of the same layer
    pub vertical_step: f32,

    /// Blank space kept around the drawing on every side
    pub padding: f32,

    /// Height used for kinds missing from `kind_heights`
    pub default_height: f32,

    /// Display height per node kind
    pub kind_heights: IndexMap<String, f32>,

    pub cycles: CyclePolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 240.0,
            column_step: 330.0,
            vertical_step: 220.0,
            padding: 60.0,
            default_height: 100.0,
            kind_heights: IndexMap::new(),
            cycles: CyclePolicy::Fallback,
        }
    }
}

impl LayoutConfig {
    /// Display height of a node kind, falling back to `default_height`
    pub fn height_for(&self, kind: &str) -> f32 {
        self.kind_heights
            .get(kind)
            .copied()
            .unwrap_or(self.default_height)
    }

    /// Resolve the height of a node: a usable hint wins over the kind table
    pub fn resolve_height(&self, kind: &str, hint: Option<f32>) -> f32 {
        match hint {
            Some(h) if h.is_finite() && h > 0.0 => h,
            _ => self.height_for(kind),
        }
    }

    /// Check that every distance is usable for layout
    ///
    /// # Errors
    /// Returns the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("node_width", self.node_width),
            ("column_step", self.column_step),
            ("vertical_step", self.vertical_step),
            ("default_height", self.default_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(ConfigError::InvalidPadding(self.padding));
        }

        if let Some((kind, &value)) = self
            .kind_heights
            .iter()
            .find(|(_, h)| !(h.is_finite() && **h > 0.0))
        {
            return Err(ConfigError::InvalidKindHeight {
                kind: kind.clone(),
                value,
            });
        }

        Ok(())
    }
}
