use ab_glyph::{Font as _, FontArc, ScaleFont as _};
use kurbo::Shape as _;
use serde::{Serialize, Deserialize};
use crate::raster::{CompositeMode, Paint, Surface};
use crate::replay;
use crate::types::{parse_color, ElementKind, Point};

/// Shapes whose drawn size is below this are discarded before any action is
/// created, so the log never holds drawable-but-invisible garbage.
pub const MIN_ELEMENT_SIZE: f64 = 4.0;

/// Per-kind attribute set for a live (not yet flattened) vector element.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementShape {
    Rect { x: f64, y: f64, width: f64, height: f64 },
    Circle { x: f64, y: f64, radius: f64 },
    Arrow { start: Point, end: Point },
    DoubleArrow { start: Point, end: Point },
    Text { x: f64, y: f64, text: String, font_size: f64 },
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Element {
    pub id: u32,
    pub stroke: String,
    pub stroke_width: f64,
    pub fill: String,
    pub draggable: bool,
    #[serde(flatten)]
    pub shape: ElementShape,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self.shape {
            ElementShape::Rect { .. } => ElementKind::Rectangle,
            ElementShape::Circle { .. } => ElementKind::Circle,
            ElementShape::Arrow { .. } => ElementKind::Arrow,
            ElementShape::DoubleArrow { .. } => ElementKind::DoubleArrow,
            ElementShape::Text { .. } => ElementKind::Text,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        match &self.shape {
            ElementShape::Rect { width, height, .. } => {
                *width < MIN_ELEMENT_SIZE || *height < MIN_ELEMENT_SIZE
            }
            ElementShape::Circle { radius, .. } => *radius * 2.0 < MIN_ELEMENT_SIZE,
            ElementShape::Arrow { start, end } | ElementShape::DoubleArrow { start, end } => {
                let dx = end.x - start.x;
                let dy = end.y - start.y;
                (dx * dx + dy * dy).sqrt() < MIN_ELEMENT_SIZE
            }
            ElementShape::Text { text, .. } => text.trim().is_empty(),
        }
    }
}

/// Live element collection, keyed by stable element id and kept in insertion
/// order so flatten and z-order stay deterministic.
#[derive(Default, Clone, Debug)]
pub struct ElementStore {
    elements: Vec<Element>,
}

impl ElementStore {
    pub fn new() -> ElementStore {
        ElementStore::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.kind() == kind)
    }

    pub fn insert(&mut self, element: Element) -> bool {
        if element.is_degenerate() || self.contains(element.id) {
            return false;
        }
        self.elements.push(element);
        true
    }

    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != id);
        self.elements.len() < before
    }

    /// Wholesale snapshot replacement; moves never patch in place.
    pub fn replace(&mut self, id: u32, element: Element) -> bool {
        if let Some(slot) = self.elements.iter_mut().find(|e| e.id == id) {
            *slot = element;
            true
        } else {
            false
        }
    }

    /// Renders all live elements onto `surface` in insertion order and
    /// returns their snapshots (the payload of a flatten action).
    pub fn render_all(&self, surface: &mut Surface, font: Option<&FontArc>) -> Vec<Element> {
        for element in &self.elements {
            render_element(surface, element, font);
        }
        self.elements.clone()
    }
}

fn render_element(surface: &mut Surface, element: &Element, font: Option<&FontArc>) {
    let paint = Paint::solid(&element.stroke, element.stroke_width);
    match &element.shape {
        ElementShape::Rect { x, y, width, height } => {
            fill_rect(surface, *x, *y, *width, *height, &element.fill);
            let path = kurbo::Rect::new(*x, *y, x + width, y + height).to_path(0.1);
            replay::stroke_path(surface, &path, &paint);
        }
        ElementShape::Circle { x, y, radius } => {
            fill_circle(surface, *x, *y, *radius, &element.fill);
            let path = kurbo::Circle::new((*x, *y), *radius).to_path(0.1);
            replay::stroke_path(surface, &path, &paint);
        }
        ElementShape::Arrow { start, end } => {
            let mut path = kurbo::BezPath::new();
            path.move_to(start.to_kurbo());
            path.line_to(end.to_kurbo());
            replay::stroke_path(surface, &path, &paint);
            replay::draw_arrowhead(surface, end.to_kurbo(), start.to_kurbo(), &paint);
        }
        ElementShape::DoubleArrow { start, end } => {
            let mut path = kurbo::BezPath::new();
            path.move_to(start.to_kurbo());
            path.line_to(end.to_kurbo());
            replay::stroke_path(surface, &path, &paint);
            replay::draw_arrowhead(surface, end.to_kurbo(), start.to_kurbo(), &paint);
            replay::draw_arrowhead(surface, start.to_kurbo(), end.to_kurbo(), &paint);
        }
        ElementShape::Text { x, y, text, font_size } => {
            render_text(surface, *x, *y, text, *font_size, element, font);
        }
    }
}

fn fill_rect(surface: &mut Surface, x: f64, y: f64, width: f64, height: f64, fill: &str) {
    if fill.is_empty() || fill == "transparent" {
        return;
    }
    let color = parse_color(fill);
    for iy in y.floor() as i64..(y + height).ceil() as i64 {
        for ix in x.floor() as i64..(x + width).ceil() as i64 {
            surface.blend_pixel(ix, iy, color, CompositeMode::SourceOver);
        }
    }
}

fn fill_circle(surface: &mut Surface, cx: f64, cy: f64, radius: f64, fill: &str) {
    if fill.is_empty() || fill == "transparent" {
        return;
    }
    let color = parse_color(fill);
    let r2 = radius * radius;
    for iy in (cy - radius).floor() as i64..=(cy + radius).ceil() as i64 {
        for ix in (cx - radius).floor() as i64..=(cx + radius).ceil() as i64 {
            let dx = ix as f64 + 0.5 - cx;
            let dy = iy as f64 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                surface.blend_pixel(ix, iy, color, CompositeMode::SourceOver);
            }
        }
    }
}

/// Rasterizes text with the host-registered font. Without a font the text
/// stays vector-only; flatten quietly skips it rather than failing.
fn render_text(
    surface: &mut Surface,
    x: f64,
    y: f64,
    text: &str,
    font_size: f64,
    element: &Element,
    font: Option<&FontArc>,
) {
    let Some(font) = font else { return; };
    let color = if element.fill.is_empty() || element.fill == "transparent" {
        parse_color(&element.stroke)
    } else {
        parse_color(&element.fill)
    };
    let scale = ab_glyph::PxScale::from(font_size.max(1.0) as f32);
    let scaled = font.as_scaled(scale);
    let baseline = y as f32 + scaled.ascent();
    let mut pen_x = x as f32;
    let mut prev = None;
    for ch in text.chars() {
        let gid = font.glyph_id(ch);
        if let Some(p) = prev {
            pen_x += scaled.kern(p, gid);
        }
        let glyph = gid.with_scale_and_position(scale, ab_glyph::point(pen_x, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + gx as i64;
                let py = bounds.min.y as i64 + gy as i64;
                let alpha = (coverage.clamp(0.0, 1.0) * color[3] as f32) as u8;
                surface.blend_pixel(px, py, [color[0], color[1], color[2], alpha], CompositeMode::SourceOver);
            });
        }
        pen_x += scaled.h_advance(gid);
        prev = Some(gid);
    }
}
