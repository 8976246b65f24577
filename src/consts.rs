//! Shared numeric constants for layout and export.

// ── Canvas ──────────────────────────────────────────────────────

/// Default canvas width in logical pixels.
pub const CANVAS_WIDTH: f64 = 1200.0;

/// Default canvas height in logical pixels.
pub const CANVAS_HEIGHT: f64 = 800.0;

/// Minimum distance between a node's footprint and the canvas edge.
pub const CANVAS_EDGE_MARGIN: f64 = 20.0;

// ── Grid placement ──────────────────────────────────────────────

/// Margin on each axis before the first grid row/column.
pub const GRID_MARGIN: f64 = 120.0;

/// Horizontal spacing floor between grid columns.
pub const MIN_SPACING_X: f64 = 180.0;

/// Vertical spacing floor between grid rows.
pub const MIN_SPACING_Y: f64 = 120.0;

/// Default snap grid size.
pub const SNAP_GRID_SIZE: f64 = 20.0;

// ── Node footprint ──────────────────────────────────────────────

/// Node width used for collision and clamping.
pub const NODE_WIDTH: f64 = 120.0;

/// Node height used for collision and clamping.
pub const NODE_HEIGHT: f64 = 60.0;

/// Extra clearance around a node when testing for collisions.
pub const COLLISION_BUFFER: f64 = 20.0;

// ── Spiral search ───────────────────────────────────────────────

/// Radius increment per ring of the spiral search.
pub const SPIRAL_STEP: f64 = 20.0;

/// Candidates tested before the spiral search gives up.
pub const SPIRAL_MAX_ATTEMPTS: usize = 50;

/// Directions tested per ring (every 45°).
pub const SPIRAL_DIRECTIONS: usize = 8;

// ── Bounds ──────────────────────────────────────────────────────

/// Horizontal padding added around node positions by `compute_bounds`.
pub const BOUNDS_PAD_X: f64 = 100.0;

/// Vertical padding added around node positions by `compute_bounds`.
pub const BOUNDS_PAD_Y: f64 = 50.0;

// ── Labels ──────────────────────────────────────────────────────

/// Longest label, in characters, before truncation with `...`.
pub const MAX_LABEL_CHARS: usize = 30;
