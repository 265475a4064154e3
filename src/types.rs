use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum ActionTarget {
    Drawing,
    Konva,
    Base,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum DrawingKind {
    Pencil,
    Eraser,
    Line,
    Curve,
    CurveArrow,
}

impl DrawingKind {
    pub fn is_eraser(self) -> bool {
        matches!(self, DrawingKind::Eraser)
    }

    pub fn from_name(name: &str) -> Option<DrawingKind> {
        match name {
            "pencil" => Some(DrawingKind::Pencil),
            "eraser" => Some(DrawingKind::Eraser),
            "line" => Some(DrawingKind::Line),
            "curve" => Some(DrawingKind::Curve),
            "curve_arrow" => Some(DrawingKind::CurveArrow),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DrawingKind::Pencil => "pencil",
            DrawingKind::Eraser => "eraser",
            DrawingKind::Line => "line",
            DrawingKind::Curve => "curve",
            DrawingKind::CurveArrow => "curve_arrow",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    pub fn from_name(name: &str) -> Option<StrokeStyle> {
        match name {
            "solid" => Some(StrokeStyle::Solid),
            "dashed" => Some(StrokeStyle::Dashed),
            "dotted" => Some(StrokeStyle::Dotted),
            _ => None,
        }
    }

    /// Dash pattern as `[on, off]` run lengths scaled by the stroke width.
    pub fn dash_pattern(self, width: f64) -> Option<[f64; 2]> {
        match self {
            StrokeStyle::Solid => None,
            StrokeStyle::Dashed => Some([3.0 * width, 2.0 * width]),
            StrokeStyle::Dotted => Some([width, width]),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Rectangle,
    Circle,
    Arrow,
    DoubleArrow,
    Text,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }
}

/// Parses `#rrggbb` / `#rrggbbaa` into RGBA bytes. Anything unparsable comes
/// back as opaque black so a bad color never aborts a replay.
pub fn parse_color(color: &str) -> [u8; 4] {
    let hex = color.trim_start_matches('#');
    match hex.len() {
        6 => match u32::from_str_radix(hex, 16) {
            Ok(v) => [((v >> 16) & 0xff) as u8, ((v >> 8) & 0xff) as u8, (v & 0xff) as u8, 255],
            Err(_) => [0, 0, 0, 255],
        },
        8 => match u32::from_str_radix(hex, 16) {
            Ok(v) => [((v >> 24) & 0xff) as u8, ((v >> 16) & 0xff) as u8, ((v >> 8) & 0xff) as u8, (v & 0xff) as u8],
            Err(_) => [0, 0, 0, 255],
        },
        _ => [0, 0, 0, 255],
    }
}
