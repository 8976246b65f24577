//! Layout engine: pure geometry over node positions.
//!
//! DESIGN
//! ======
//! Stateless functions, no rendering dependency. Initial placement is a
//! near-square grid with spacing floors; interactive drops are snapped,
//! clamped to the canvas, and nudged off other nodes by a bounded spiral
//! search. The spiral is a best-effort local fix, not a solver: when every
//! candidate collides the caller gets the original target back.
//!
//! Positions are node centres. A node occupies `footprint.width` ×
//! `footprint.height` around its centre.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    BOUNDS_PAD_X, BOUNDS_PAD_Y, CANVAS_EDGE_MARGIN, CANVAS_HEIGHT, CANVAS_WIDTH, COLLISION_BUFFER, GRID_MARGIN,
    MIN_SPACING_X, MIN_SPACING_Y, NODE_HEIGHT, NODE_WIDTH, SNAP_GRID_SIZE, SPIRAL_DIRECTIONS, SPIRAL_MAX_ATTEMPTS,
    SPIRAL_STEP,
};
use crate::diagram::{Diagram, Node, Position};

// =============================================================================
// TYPES
// =============================================================================

/// Size of the drawing area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self { width: CANVAS_WIDTH, height: CANVAS_HEIGHT }
    }
}

/// Space a node occupies, plus the clearance kept around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub width: f64,
    pub height: f64,
    pub buffer: f64,
}

impl Default for Footprint {
    fn default() -> Self {
        Self { width: NODE_WIDTH, height: NODE_HEIGHT, buffer: COLLISION_BUFFER }
    }
}

/// Parameters of the expanding spiral search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralSearch {
    /// Radius growth per ring of eight directions.
    pub step_size: f64,
    pub max_attempts: usize,
}

impl Default for SpiralSearch {
    fn default() -> Self {
        Self { step_size: SPIRAL_STEP, max_attempts: SPIRAL_MAX_ATTEMPTS }
    }
}

/// Everything the drop pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub canvas: CanvasSize,
    pub footprint: Footprint,
    pub search: SpiralSearch,
    pub grid_size: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            footprint: Footprint::default(),
            search: SpiralSearch::default(),
            grid_size: SNAP_GRID_SIZE,
        }
    }
}

/// Padded extent of a diagram's node positions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub width: f64,
    pub height: f64,
}

// =============================================================================
// GRID PLACEMENT
// =============================================================================

/// Position of item `index` when `total` items share a near-square grid.
///
/// Columns are `ceil(sqrt(total))`; spacing divides the canvas evenly
/// between the margins but never drops below the spacing floors, so small
/// canvases overflow rather than overlap.
#[must_use]
pub fn grid_position(index: usize, total: usize, canvas: CanvasSize) -> Position {
    let total = total.max(1);
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cols = ((total as f64).sqrt().ceil() as usize).max(1);
    let rows = total.div_ceil(cols);

    #[allow(clippy::cast_precision_loss)]
    let (col, row) = ((index % cols) as f64, (index / cols) as f64);
    #[allow(clippy::cast_precision_loss)]
    let (col_gaps, row_gaps) = (cols.saturating_sub(1).max(1) as f64, rows.saturating_sub(1).max(1) as f64);

    let spacing_x = ((canvas.width - 2.0 * GRID_MARGIN) / col_gaps).max(MIN_SPACING_X);
    let spacing_y = ((canvas.height - 2.0 * GRID_MARGIN) / row_gaps).max(MIN_SPACING_Y);

    Position { x: GRID_MARGIN + col * spacing_x, y: GRID_MARGIN + row * spacing_y }
}

/// Re-place every node of `diagram` on the grid, keeping everything else.
#[must_use]
pub fn arrange(diagram: &Diagram, canvas: CanvasSize) -> Diagram {
    let total = diagram.nodes.len();
    let nodes = diagram
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| Node { position: grid_position(index, total, canvas), ..node.clone() })
        .collect();
    Diagram { nodes, ..diagram.clone() }
}

// =============================================================================
// SNAP / CLAMP
// =============================================================================

/// Round each coordinate to the nearest multiple of `grid_size`.
///
/// A non-positive or non-finite grid size leaves the position unchanged.
#[must_use]
pub fn snap_to_grid(position: Position, grid_size: f64) -> Position {
    if !(grid_size.is_finite() && grid_size > 0.0) {
        return position;
    }
    Position { x: (position.x / grid_size).round() * grid_size, y: (position.y / grid_size).round() * grid_size }
}

/// Keep the node's whole footprint within `[20, dim - 20]` on both axes.
///
/// On a canvas too small for the footprint the lower bound wins.
#[must_use]
pub fn clamp_to_bounds(position: Position, canvas: CanvasSize, footprint: Footprint) -> Position {
    let half_w = footprint.width / 2.0;
    let half_h = footprint.height / 2.0;
    let min_x = CANVAS_EDGE_MARGIN + half_w;
    let min_y = CANVAS_EDGE_MARGIN + half_h;
    let max_x = (canvas.width - CANVAS_EDGE_MARGIN - half_w).max(min_x);
    let max_y = (canvas.height - CANVAS_EDGE_MARGIN - half_h).max(min_y);
    Position { x: position.x.clamp(min_x, max_x), y: position.y.clamp(min_y, max_y) }
}

// =============================================================================
// COLLISION
// =============================================================================

/// Whether a node centred at `position` would overlap any node in `nodes`
/// other than `exclude_id`, with `footprint.buffer` of clearance.
#[must_use]
pub fn check_collision(position: Position, nodes: &[Node], exclude_id: Option<&str>, footprint: Footprint) -> bool {
    let reach_x = footprint.width + footprint.buffer;
    let reach_y = footprint.height + footprint.buffer;
    nodes
        .iter()
        .filter(|node| exclude_id != Some(node.id.as_str()))
        .any(|node| (position.x - node.position.x).abs() < reach_x && (position.y - node.position.y).abs() < reach_y)
}

/// Nearest free spot around `target`, searched along an expanding spiral.
///
/// Attempt `k` tests `target + r·(cos θ, sin θ)` with `r = ⌊k/8⌋·step` and
/// `θ = (k mod 8)·45°`, clamped into the canvas. Returns the first candidate
/// with no collision, or `target` unchanged when every attempt collides.
#[must_use]
pub fn find_nearest_valid_position(
    target: Position,
    nodes: &[Node],
    exclude_id: Option<&str>,
    canvas: CanvasSize,
    footprint: Footprint,
    search: SpiralSearch,
) -> Position {
    for attempt in 0..search.max_attempts {
        #[allow(clippy::cast_precision_loss)]
        let radius = (attempt / SPIRAL_DIRECTIONS) as f64 * search.step_size;
        #[allow(clippy::cast_precision_loss)]
        let angle = ((attempt % SPIRAL_DIRECTIONS) as f64 * 45.0).to_radians();
        let candidate = clamp_to_bounds(
            Position { x: target.x + radius * angle.cos(), y: target.y + radius * angle.sin() },
            canvas,
            footprint,
        );
        if !check_collision(candidate, nodes, exclude_id, footprint) {
            return candidate;
        }
    }
    target
}

/// Drop pipeline for a dragged node: snap, clamp, then step off neighbours.
#[must_use]
pub fn settle_position(raw: Position, nodes: &[Node], exclude_id: Option<&str>, options: LayoutOptions) -> Position {
    let snapped = snap_to_grid(raw, options.grid_size);
    let clamped = clamp_to_bounds(snapped, options.canvas, options.footprint);
    find_nearest_valid_position(clamped, nodes, exclude_id, options.canvas, options.footprint, options.search)
}

// =============================================================================
// BOUNDS
// =============================================================================

/// Extent of all node positions, padded 100 px horizontally and 50 px
/// vertically. All zero for a diagram without nodes.
#[must_use]
pub fn compute_bounds(diagram: &Diagram) -> Bounds {
    let Some(first) = diagram.nodes.first() else {
        return Bounds::default();
    };

    let (mut min_x, mut max_x, mut min_y, mut max_y) =
        (first.position.x, first.position.x, first.position.y, first.position.y);
    for node in &diagram.nodes[1..] {
        min_x = min_x.min(node.position.x);
        max_x = max_x.max(node.position.x);
        min_y = min_y.min(node.position.y);
        max_y = max_y.max(node.position.y);
    }

    let (min_x, max_x) = (min_x - BOUNDS_PAD_X, max_x + BOUNDS_PAD_X);
    let (min_y, max_y) = (min_y - BOUNDS_PAD_Y, max_y + BOUNDS_PAD_Y);
    Bounds { min_x, max_x, min_y, max_y, width: max_x - min_x, height: max_y - min_y }
}
