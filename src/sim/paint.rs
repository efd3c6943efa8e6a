//! Paint surface logic
//!
//! Tool state and pointer handling produce `PaintOp`s for the canvas layer to
//! draw. Flood fill runs here directly on an RGBA buffer.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

pub const BRUSH_WIDTH: f32 = 7.0;
pub const ERASER_WIDTH: f32 = 18.0;
pub const SPRAY_RADIUS: f32 = 10.0;
/// Dots per spray sample
pub const SPRAY_DENSITY: usize = 18;
pub const SPRAY_DOT_SIZE: f32 = 1.8;
/// Per-channel match tolerance for flood fill
pub const FILL_TOLERANCE: u8 = 8;

/// An RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);

    /// `#rrggbb` (the `#` is optional); anything else is opaque black
    pub fn parse_hex(hex: &str) -> Self {
        let digits = hex.replace('#', "");
        if digits.len() != 6 || !digits.is_ascii() {
            return Self::BLACK;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0);
        Rgba([channel(0), channel(2), channel(4), 255])
    }

    pub fn to_css(self) -> String {
        let [r, g, b, _] = self.0;
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Every channel within `tolerance`
    pub fn matches(self, other: Rgba, tolerance: u8) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| a.abs_diff(*b) <= tolerance)
    }
}

/// Available tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaintTool {
    #[default]
    Brush,
    Eraser,
    Spray,
    Line,
    Ellipse,
    Fill,
}

impl PaintTool {
    /// Parse a `data-tool` value
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "brush" => Some(PaintTool::Brush),
            "eraser" => Some(PaintTool::Eraser),
            "spray" => Some(PaintTool::Spray),
            "line" => Some(PaintTool::Line),
            "ellipse" => Some(PaintTool::Ellipse),
            "fill" => Some(PaintTool::Fill),
            _ => None,
        }
    }

    /// Previewed against a snapshot until release
    pub fn is_shape(self) -> bool {
        matches!(self, PaintTool::Line | PaintTool::Ellipse)
    }

    pub fn cursor(self) -> &'static str {
        if self == PaintTool::Eraser { "cell" } else { "crosshair" }
    }
}

/// RGBA8 pixel buffer, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Raster {
    /// All-white surface
    pub fn new(width: usize, height: usize) -> Self {
        let mut raster = Self {
            width,
            height,
            data: vec![0; width * height * 4],
        };
        raster.clear(Rgba::WHITE);
        raster
    }

    /// Wrap existing pixel data; `None` if the length does not match
    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == width * height * 4).then_some(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn clear(&mut self, color: Rgba) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&color.0);
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some(Rgba([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]))
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y * self.width + x) * 4;
        self.data[i..i + 4].copy_from_slice(&color.0);
    }

    /// Fill a solid rectangle, clipped to the surface
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: Rgba) {
        for py in y..(y + h).min(self.height) {
            for px in x..(x + w).min(self.width) {
                self.set_pixel(px, py, color);
            }
        }
    }
}

/// 4-connected flood fill from `at`, clamped onto the surface
///
/// Pixels within `FILL_TOLERANCE` of the seed colour are replaced. Filling
/// with the seed's exact colour is a no-op. Returns the number of pixels
/// written.
pub fn flood_fill(raster: &mut Raster, at: Vec2, color: Rgba) -> usize {
    if raster.width == 0 || raster.height == 0 {
        return 0;
    }
    let sx = (at.x.floor().max(0.0) as usize).min(raster.width - 1);
    let sy = (at.y.floor().max(0.0) as usize).min(raster.height - 1);
    let Some(seed) = raster.pixel(sx, sy) else {
        return 0;
    };
    if seed == color {
        return 0;
    }

    let mut visited = vec![false; raster.width * raster.height];
    let mut stack = vec![(sx, sy)];
    let mut filled = 0;

    while let Some((x, y)) = stack.pop() {
        let slot = y * raster.width + x;
        if visited[slot] {
            continue;
        }
        visited[slot] = true;

        let Some(current) = raster.pixel(x, y) else {
            continue;
        };
        if !current.matches(seed, FILL_TOLERANCE) {
            continue;
        }
        raster.set_pixel(x, y, color);
        filled += 1;

        if x + 1 < raster.width {
            stack.push((x + 1, y));
        }
        if x > 0 {
            stack.push((x - 1, y));
        }
        if y + 1 < raster.height {
            stack.push((x, y + 1));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
    }
    filled
}

/// Outline previewed by the shape tools
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeOutline {
    Line { from: Vec2, to: Vec2 },
    Ellipse { center: Vec2, radii: Vec2 },
}

/// Drawing command for the canvas layer
#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    /// Round-capped segment; `from == to` draws a dot
    Stroke { from: Vec2, to: Vec2, color: Rgba, width: f32 },
    /// Square dots of `size`
    Dots { points: Vec<Vec2>, size: f32, color: Rgba },
    /// Remember the current pixels for previews
    Snapshot,
    /// Restore the snapshot, then outline `shape`
    Preview { shape: ShapeOutline, color: Rgba, width: f32 },
    /// Forget the snapshot
    ReleaseSnapshot,
    Fill { at: Vec2, color: Rgba },
    Clear,
}

/// Pointer-driven paint state
#[derive(Debug, Clone)]
pub struct PaintSession {
    tool: PaintTool,
    color: Rgba,
    drawing: bool,
    start: Option<Vec2>,
    last: Option<Vec2>,
    rng: Pcg32,
}

impl PaintSession {
    pub fn new(color: Rgba, seed: u64) -> Self {
        Self {
            tool: PaintTool::Brush,
            color,
            drawing: false,
            start: None,
            last: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn tool(&self) -> PaintTool {
        self.tool
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn set_tool(&mut self, tool: PaintTool) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    /// Eraser paints white
    pub fn stroke_color(&self) -> Rgba {
        if self.tool == PaintTool::Eraser {
            Rgba::WHITE
        } else {
            self.color
        }
    }

    pub fn line_width(&self) -> f32 {
        if self.tool == PaintTool::Eraser {
            ERASER_WIDTH
        } else {
            BRUSH_WIDTH
        }
    }

    fn spray(&mut self, center: Vec2) -> PaintOp {
        let points = (0..SPRAY_DENSITY)
            .map(|_| {
                let angle = self.rng.random::<f32>() * TAU;
                let radius = self.rng.random::<f32>() * SPRAY_RADIUS;
                center + Vec2::new(angle.cos(), angle.sin()) * radius
            })
            .collect();
        PaintOp::Dots {
            points,
            size: SPRAY_DOT_SIZE,
            color: self.stroke_color(),
        }
    }

    fn preview(&self, start: Vec2, point: Vec2) -> PaintOp {
        let shape = match self.tool {
            PaintTool::Line => ShapeOutline::Line { from: start, to: point },
            _ => {
                let min = start.min(point);
                let size = (point - start).abs();
                ShapeOutline::Ellipse {
                    center: min + size * 0.5,
                    radii: size * 0.5,
                }
            }
        };
        PaintOp::Preview {
            shape,
            color: self.stroke_color(),
            width: self.line_width(),
        }
    }

    pub fn pointer_down(&mut self, point: Vec2) -> Vec<PaintOp> {
        match self.tool {
            PaintTool::Fill => {
                self.end_stroke();
                vec![PaintOp::Fill {
                    at: point,
                    color: self.stroke_color(),
                }]
            }
            tool => {
                self.drawing = true;
                self.start = Some(point);
                self.last = Some(point);
                if tool.is_shape() {
                    vec![PaintOp::Snapshot]
                } else if tool == PaintTool::Spray {
                    vec![self.spray(point)]
                } else {
                    vec![PaintOp::Stroke {
                        from: point,
                        to: point,
                        color: self.stroke_color(),
                        width: self.line_width(),
                    }]
                }
            }
        }
    }

    pub fn pointer_move(&mut self, point: Vec2) -> Vec<PaintOp> {
        if !self.drawing {
            return Vec::new();
        }
        let Some(last) = self.last else {
            return Vec::new();
        };

        if self.tool.is_shape() {
            return self.start.map(|start| self.preview(start, point)).into_iter().collect();
        }

        let op = if self.tool == PaintTool::Spray {
            self.spray(point)
        } else {
            PaintOp::Stroke {
                from: last,
                to: point,
                color: self.stroke_color(),
                width: self.line_width(),
            }
        };
        self.last = Some(point);
        vec![op]
    }

    /// Pointer released or left the canvas
    pub fn pointer_up(&mut self) -> Vec<PaintOp> {
        let was_shape = self.drawing && self.tool.is_shape();
        self.end_stroke();
        if was_shape {
            vec![PaintOp::ReleaseSnapshot]
        } else {
            Vec::new()
        }
    }

    fn end_stroke(&mut self) {
        self.drawing = false;
        self.start = None;
        self.last = None;
    }

    /// Repaint white; also abandons any stroke in progress
    pub fn clear(&mut self) -> PaintOp {
        self.end_stroke();
        PaintOp::Clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba([255, 0, 0, 255]);

    /// 10x10 white surface with a black square outline from (2,2) to (7,7)
    fn boxed() -> Raster {
        let mut raster = Raster::new(10, 10);
        for i in 2..=7 {
            raster.set_pixel(i, 2, Rgba::BLACK);
            raster.set_pixel(i, 7, Rgba::BLACK);
            raster.set_pixel(2, i, Rgba::BLACK);
            raster.set_pixel(7, i, Rgba::BLACK);
        }
        raster
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgba::parse_hex("#FF0000"), RED);
        assert_eq!(Rgba::parse_hex("00ff00"), Rgba([0, 255, 0, 255]));
        assert_eq!(Rgba::parse_hex("#fff"), Rgba::BLACK);
        assert_eq!(Rgba::parse_hex("#zz0000"), Rgba([0, 0, 0, 255]));
        assert_eq!(Rgba([18, 52, 86, 255]).to_css(), "#123456");
    }

    #[test]
    fn test_fill_enclosed_region_only() {
        let mut raster = boxed();
        let before = raster.clone();
        let filled = flood_fill(&mut raster, Vec2::new(4.5, 4.5), Rgba::parse_hex("#FF0000"));

        // Interior is 4x4
        assert_eq!(filled, 16);
        for y in 0..10 {
            for x in 0..10 {
                let inside = (3..=6).contains(&x) && (3..=6).contains(&y);
                let expected = if inside { Some(RED) } else { before.pixel(x, y) };
                assert_eq!(raster.pixel(x, y), expected, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn test_fill_respects_tolerance() {
        let mut raster = Raster::new(3, 1);
        raster.set_pixel(1, 0, Rgba([250, 250, 250, 255]));
        raster.set_pixel(2, 0, Rgba([240, 255, 255, 255]));
        let filled = flood_fill(&mut raster, Vec2::ZERO, RED);
        assert_eq!(filled, 2);
        assert_eq!(raster.pixel(2, 0), Some(Rgba([240, 255, 255, 255])));
    }

    #[test]
    fn test_fill_same_color_is_noop() {
        let mut raster = boxed();
        let before = raster.clone();
        assert_eq!(flood_fill(&mut raster, Vec2::new(4.0, 4.0), Rgba::WHITE), 0);
        assert_eq!(raster, before);
    }

    #[test]
    fn test_fill_near_seed_color_terminates() {
        let mut raster = Raster::new(4, 4);
        let almost_white = Rgba([252, 252, 252, 255]);
        assert_eq!(flood_fill(&mut raster, Vec2::new(1.0, 1.0), almost_white), 16);
        assert!(raster.data().chunks_exact(4).all(|px| px == almost_white.0));
    }

    #[test]
    fn test_fill_clamps_start_point() {
        let mut raster = Raster::new(4, 4);
        assert_eq!(flood_fill(&mut raster, Vec2::new(-20.0, 99.0), RED), 16);
        assert_eq!(flood_fill(&mut Raster::new(0, 0), Vec2::ZERO, RED), 0);
    }

    #[test]
    fn test_brush_stroke_sequence() {
        let mut session = PaintSession::new(RED, 1);
        let a = Vec2::new(1.0, 1.0);
        let b = Vec2::new(5.0, 3.0);
        assert_eq!(
            session.pointer_down(a),
            vec![PaintOp::Stroke { from: a, to: a, color: RED, width: BRUSH_WIDTH }]
        );
        assert_eq!(
            session.pointer_move(b),
            vec![PaintOp::Stroke { from: a, to: b, color: RED, width: BRUSH_WIDTH }]
        );
        assert!(session.pointer_up().is_empty());
        assert!(session.pointer_move(a).is_empty());
    }

    #[test]
    fn test_eraser_paints_white_and_wide() {
        let mut session = PaintSession::new(RED, 1);
        session.set_tool(PaintTool::Eraser);
        let ops = session.pointer_down(Vec2::ZERO);
        assert_eq!(
            ops,
            vec![PaintOp::Stroke {
                from: Vec2::ZERO,
                to: Vec2::ZERO,
                color: Rgba::WHITE,
                width: ERASER_WIDTH
            }]
        );
        assert_eq!(PaintTool::Eraser.cursor(), "cell");
    }

    #[test]
    fn test_spray_dots_stay_in_radius() {
        let mut session = PaintSession::new(RED, 42);
        session.set_tool(PaintTool::Spray);
        let center = Vec2::new(50.0, 50.0);
        let ops = session.pointer_down(center);
        let [PaintOp::Dots { points, size, color }] = ops.as_slice() else {
            panic!("expected dots, got {ops:?}");
        };
        assert_eq!(points.len(), SPRAY_DENSITY);
        assert_eq!(*size, SPRAY_DOT_SIZE);
        assert_eq!(*color, RED);
        assert!(points.iter().all(|p| p.distance(center) <= SPRAY_RADIUS + 1e-3));
    }

    #[test]
    fn test_ellipse_preview_and_release() {
        let mut session = PaintSession::new(RED, 1);
        session.set_tool(PaintTool::Ellipse);
        assert_eq!(session.pointer_down(Vec2::new(10.0, 20.0)), vec![PaintOp::Snapshot]);

        let ops = session.pointer_move(Vec2::new(4.0, 30.0));
        assert_eq!(
            ops,
            vec![PaintOp::Preview {
                shape: ShapeOutline::Ellipse {
                    center: Vec2::new(7.0, 25.0),
                    radii: Vec2::new(3.0, 5.0)
                },
                color: RED,
                width: BRUSH_WIDTH
            }]
        );
        assert_eq!(session.pointer_up(), vec![PaintOp::ReleaseSnapshot]);
        assert!(session.pointer_up().is_empty());
    }

    #[test]
    fn test_line_preview_anchors_at_start() {
        let mut session = PaintSession::new(RED, 1);
        session.set_tool(PaintTool::Line);
        let start = Vec2::new(1.0, 1.0);
        session.pointer_down(start);
        session.pointer_move(Vec2::new(3.0, 3.0));
        let ops = session.pointer_move(Vec2::new(9.0, 2.0));
        assert_eq!(
            ops,
            vec![PaintOp::Preview {
                shape: ShapeOutline::Line {
                    from: start,
                    to: Vec2::new(9.0, 2.0)
                },
                color: RED,
                width: BRUSH_WIDTH
            }]
        );
    }

    #[test]
    fn test_fill_tool_emits_single_op() {
        let mut session = PaintSession::new(RED, 1);
        session.set_tool(PaintTool::Fill);
        let at = Vec2::new(3.0, 4.0);
        assert_eq!(session.pointer_down(at), vec![PaintOp::Fill { at, color: RED }]);
        assert!(!session.is_drawing());
        assert!(session.pointer_move(Vec2::ZERO).is_empty());
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(PaintTool::from_name("spray"), Some(PaintTool::Spray));
        assert_eq!(PaintTool::from_name("lasso"), None);
        assert!(PaintTool::Line.is_shape());
        assert!(!PaintTool::Fill.is_shape());
    }
}
