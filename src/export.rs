//! Export — diagram snapshot → SVG / PNG / PDF bytes.
//!
//! DESIGN
//! ======
//! SVG is the master format: it is written directly from node positions and
//! types, and PNG and PDF are produced from that SVG text with resvg and
//! svg2pdf (feature `raster`). Without the feature those two formats fail
//! with a render error instead of disappearing from the catalogue.
//!
//! The viewBox is the padded extent from [`layout::compute_bounds`], so an
//! export frames the diagram rather than the editor canvas. Quality maps to
//! DPI and only scales raster output; PDF stays vector.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::{NODE_HEIGHT, NODE_WIDTH, SNAP_GRID_SIZE};
use crate::diagram::{Diagram, Node, NodeShape, Position};
use crate::layout;

/// DPI that corresponds to one SVG user unit per pixel.
const BASE_DPI: f64 = 72.0;

/// Horizontal skew of a data parallelogram.
const SKEW: f64 = 15.0;

const LABEL_COLOR: &str = "#1f2937";
const EDGE_COLOR: &str = "#6b7280";
const GRID_COLOR: &str = "#e5e7eb";
const FONT_FAMILY: &str = "Inter, sans-serif";

// =============================================================================
// OPTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Svg,
    Pdf,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
            Self::Pdf => "application/pdf",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Png => "PNG Image",
            Self::Svg => "SVG Vector",
            Self::Pdf => "PDF Document",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown export format '{other}' (expected png, svg or pdf)")),
        }
    }
}

/// Output resolution for raster exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    #[default]
    High,
}

impl Quality {
    #[must_use]
    pub fn dpi(self) -> u32 {
        match self {
            Self::Low => 72,
            Self::Medium => 150,
            Self::High => 300,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low (72 DPI)",
            Self::Medium => "Medium (150 DPI)",
            Self::High => "High (300 DPI)",
        }
    }

    /// Pixels per SVG user unit.
    #[must_use]
    pub fn scale(self) -> f64 {
        f64::from(self.dpi()) / BASE_DPI
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown quality '{other}' (expected low, medium or high)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub quality: Quality,
    /// Output file name; `flowchart.<ext>` when absent.
    pub filename: Option<String>,
    /// Paint a white background behind the diagram.
    pub include_background: bool,
    /// Paint the snap grid behind the diagram.
    pub include_grid: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            quality: Quality::default(),
            filename: None,
            include_background: true,
            include_grid: false,
        }
    }
}

impl ExportOptions {
    #[must_use]
    pub fn new(format: ExportFormat) -> Self {
        Self { format, ..Self::default() }
    }

    /// The file name the export will be saved under.
    #[must_use]
    pub fn resolved_filename(&self) -> String {
        match &self.filename {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("flowchart.{}", self.format.extension()),
        }
    }
}

/// One entry of the format picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatOption {
    pub value: ExportFormat,
    pub label: &'static str,
    pub extension: &'static str,
}

/// One entry of the quality picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityOption {
    pub value: Quality,
    pub label: &'static str,
    pub dpi: u32,
}

#[must_use]
pub fn export_formats() -> Vec<FormatOption> {
    [ExportFormat::Png, ExportFormat::Svg, ExportFormat::Pdf]
        .into_iter()
        .map(|value| FormatOption { value, label: value.label(), extension: value.extension() })
        .collect()
}

#[must_use]
pub fn quality_options() -> Vec<QualityOption> {
    [Quality::Low, Quality::Medium, Quality::High]
        .into_iter()
        .map(|value| QualityOption { value, label: value.label(), dpi: value.dpi() })
        .collect()
}

// =============================================================================
// RESULT / ERROR
// =============================================================================

/// Rendered export ready to be saved or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to export diagram as {format}: {reason}")]
    Render { format: ExportFormat, reason: String },
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    fn render(format: ExportFormat, reason: impl fmt::Display) -> Self {
        Self::Render { format, reason: reason.to_string() }
    }
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Render `diagram` in the requested format.
///
/// # Errors
///
/// Returns [`ExportError::Render`] naming the format when rendering fails or
/// a raster format is requested without the `raster` feature.
pub fn export_diagram(diagram: &Diagram, options: &ExportOptions) -> Result<ExportedFile, ExportError> {
    let format = options.format;
    let svg = render_svg(diagram, options.include_background, options.include_grid)
        .map_err(|e| ExportError::render(format, e))?;

    let bytes = match format {
        ExportFormat::Svg => svg.into_bytes(),
        ExportFormat::Png => raster::svg_to_png(&svg, options.quality.scale()).map_err(|e| ExportError::render(format, e))?,
        ExportFormat::Pdf => raster::svg_to_pdf(&svg).map_err(|e| ExportError::render(format, e))?,
    };

    let file = ExportedFile { filename: options.resolved_filename(), mime: format.mime(), bytes };
    info!(
        diagram_id = %diagram.id,
        %format,
        dpi = options.quality.dpi(),
        bytes = file.bytes.len(),
        "export: diagram exported"
    );
    Ok(file)
}

/// Write `file` into `dir`, creating the directory if needed.
///
/// Only the final component of the file name is used, so a name cannot
/// escape `dir`.
///
/// # Errors
///
/// Returns [`ExportError::Io`] when the name is empty or the write fails.
pub async fn save_export(file: &ExportedFile, dir: &Path) -> Result<PathBuf, ExportError> {
    let Some(name) = Path::new(&file.filename).file_name() else {
        return Err(ExportError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid export file name '{}'", file.filename),
        )));
    };
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, &file.bytes).await?;
    info!(path = %path.display(), bytes = file.bytes.len(), "export: file written");
    Ok(path)
}

// =============================================================================
// SVG
// =============================================================================

/// Serialize `diagram` as a standalone SVG document.
///
/// # Errors
///
/// Propagates formatter errors; writing into a `String` does not produce any
/// in practice.
pub fn render_svg(diagram: &Diagram, include_background: bool, include_grid: bool) -> Result<String, fmt::Error> {
    let bounds = layout::compute_bounds(diagram);
    let (min_x, min_y) = (bounds.min_x, bounds.min_y);
    let width = bounds.width.max(NODE_WIDTH);
    let height = bounds.height.max(NODE_HEIGHT);

    let mut out = String::new();
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="{min_x} {min_y} {width} {height}">"#
    )?;
    writeln!(out, "<defs>")?;
    writeln!(
        out,
        r#"<marker id="arrowhead" markerWidth="10" markerHeight="7" refX="9" refY="3.5" orient="auto"><polygon points="0 0, 10 3.5, 0 7" fill="{EDGE_COLOR}"/></marker>"#
    )?;
    if include_grid {
        writeln!(
            out,
            r#"<pattern id="grid" width="{g}" height="{g}" patternUnits="userSpaceOnUse"><path d="M {g} 0 L 0 0 0 {g}" fill="none" stroke="{GRID_COLOR}" stroke-width="1"/></pattern>"#,
            g = SNAP_GRID_SIZE
        )?;
    }
    writeln!(out, "</defs>")?;

    if include_background {
        writeln!(
            out,
            r#"<rect class="background" x="{min_x}" y="{min_y}" width="{width}" height="{height}" fill="white"/>"#
        )?;
    }
    if include_grid {
        writeln!(
            out,
            r#"<rect class="grid" x="{min_x}" y="{min_y}" width="{width}" height="{height}" fill="url(#grid)"/>"#
        )?;
    }

    // Edges first so nodes paint over the line ends.
    for connection in &diagram.connections {
        let (Some(source), Some(target)) = (diagram.node(&connection.source_id), diagram.node(&connection.target_id))
        else {
            continue;
        };
        write_edge(&mut out, source, target, connection.label.as_deref())?;
    }

    for node in &diagram.nodes {
        write_node(&mut out, node)?;
    }

    writeln!(out, "</svg>")?;
    Ok(out)
}

fn write_edge(out: &mut String, source: &Node, target: &Node, label: Option<&str>) -> fmt::Result {
    let start = boundary_point(source.position, target.position);
    let end = boundary_point(target.position, source.position);
    writeln!(
        out,
        r#"<line class="edge" x1="{}" y1="{}" x2="{}" y2="{}" stroke="{EDGE_COLOR}" stroke-width="2" marker-end="url(#arrowhead)"/>"#,
        start.x, start.y, end.x, end.y
    )?;
    if let Some(label) = label.filter(|l| !l.is_empty()) {
        let mid = Position::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0);
        writeln!(
            out,
            r#"<text class="edge-label" x="{}" y="{}" text-anchor="middle" dy="-0.4em" font-family="{FONT_FAMILY}" font-size="11" fill="{EDGE_COLOR}">{}</text>"#,
            mid.x,
            mid.y,
            htmlize::escape_text(label)
        )?;
    }
    Ok(())
}

fn write_node(out: &mut String, node: &Node) -> fmt::Result {
    let Position { x, y } = node.position;
    let (hw, hh) = (NODE_WIDTH / 2.0, NODE_HEIGHT / 2.0);
    let stroke = htmlize::escape_attribute(node.effective_color());
    let paint = format!(r#"fill="white" stroke="{stroke}" stroke-width="2""#);

    writeln!(
        out,
        r#"<g class="node" data-id="{}" data-type="{}">"#,
        htmlize::escape_attribute(node.id.as_str()),
        node.node_type
    )?;
    match node.node_type.shape() {
        NodeShape::Ellipse => writeln!(out, r#"<ellipse cx="{x}" cy="{y}" rx="{hw}" ry="{hh}" {paint}/>"#)?,
        NodeShape::Rectangle => writeln!(
            out,
            r#"<rect x="{}" y="{}" width="{NODE_WIDTH}" height="{NODE_HEIGHT}" rx="8" {paint}/>"#,
            x - hw,
            y - hh
        )?,
        NodeShape::Diamond => writeln!(
            out,
            r#"<polygon points="{x},{} {},{y} {x},{} {},{y}" {paint}/>"#,
            y - hh,
            x + hw,
            y + hh,
            x - hw
        )?,
        NodeShape::Parallelogram => writeln!(
            out,
            r#"<polygon points="{},{top} {},{top} {},{bottom} {},{bottom}" {paint}/>"#,
            x - hw + SKEW,
            x + hw,
            x + hw - SKEW,
            x - hw,
            top = y - hh,
            bottom = y + hh
        )?,
        NodeShape::Circle => writeln!(out, r#"<circle cx="{x}" cy="{y}" r="{hh}" {paint}/>"#)?,
    }
    writeln!(
        out,
        r#"<text x="{x}" y="{y}" text-anchor="middle" dy="0.35em" font-family="{FONT_FAMILY}" font-size="12" fill="{LABEL_COLOR}">{}</text>"#,
        htmlize::escape_text(node.label.as_str())
    )?;
    writeln!(out, "</g>")
}

/// Where the segment from `from` towards `to` leaves the node box around
/// `from`.
fn boundary_point(from: Position, to: Position) -> Position {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    if dx == 0.0 && dy == 0.0 {
        return from;
    }
    let tx = if dx == 0.0 { f64::INFINITY } else { (NODE_WIDTH / 2.0) / dx.abs() };
    let ty = if dy == 0.0 { f64::INFINITY } else { (NODE_HEIGHT / 2.0) / dy.abs() };
    let t = tx.min(ty).min(1.0);
    Position::new(from.x + dx * t, from.y + dy * t)
}

// =============================================================================
// RASTER
// =============================================================================

#[cfg(feature = "raster")]
mod raster {
    #[derive(Debug, thiserror::Error)]
    pub enum RasterError {
        #[error("failed to parse SVG")]
        SvgParse,
        #[error("failed to allocate {width}x{height} pixmap")]
        PixmapAlloc { width: u32, height: u32 },
        #[error("failed to encode PNG")]
        PngEncode,
        #[error("failed to convert SVG to PDF")]
        PdfConvert,
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn svg_to_png(svg: &str, scale: f64) -> Result<Vec<u8>, RasterError> {
        let mut opt = usvg::Options::default();
        opt.fontdb_mut().load_system_fonts();
        let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;
        let scale = scale as f32;
        let size = tree.size();
        let width = (size.width() * scale).ceil().max(1.0) as u32;
        let height = (size.height() * scale).ceil().max(1.0) as u32;

        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(RasterError::PixmapAlloc { width, height })?;
        resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());
        pixmap.encode_png().map_err(|_| RasterError::PngEncode)
    }

    pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>, RasterError> {
        let mut opt = svg2pdf::usvg::Options::default();
        opt.fontdb_mut().load_system_fonts();
        let tree = svg2pdf::usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;
        svg2pdf::to_pdf(&tree, svg2pdf::ConversionOptions::default(), svg2pdf::PageOptions::default())
            .map_err(|_| RasterError::PdfConvert)
    }
}

#[cfg(not(feature = "raster"))]
mod raster {
    #[derive(Debug, thiserror::Error)]
    pub enum RasterError {
        #[error("raster output is not available in this build")]
        Unsupported,
    }

    pub fn svg_to_png(_svg: &str, _scale: f64) -> Result<Vec<u8>, RasterError> {
        Err(RasterError::Unsupported)
    }

    pub fn svg_to_pdf(_svg: &str) -> Result<Vec<u8>, RasterError> {
        Err(RasterError::Unsupported)
    }
}
