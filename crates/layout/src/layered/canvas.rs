use crate::{CanvasSize, LayoutConfig, Rect};

/// Bounding box of the drawing, padding included
///
/// The width only depends on the number of layers, since columns are evenly
/// spaced. An empty drawing has a zero-sized canvas.
pub(crate) fn canvas_size<'a>(
    layer_count: usize,
    positions: impl IntoIterator<Item = &'a Rect>,
    config: &LayoutConfig,
) -> CanvasSize {
    if layer_count == 0 {
        return CanvasSize::default();
    }

    let width = 2.0 * config.padding + layer_count as f32 * config.column_step;
    let bottom = positions
        .into_iter()
        .map(|rect| rect.max().y)
        .fold(0.0, f32::max);

    CanvasSize::new(width, config.padding + bottom)
}
