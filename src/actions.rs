use serde::{Serialize, Deserialize};
use crate::elements::Element;
use crate::filters::{CropRegion, FilterKind};
use crate::types::{ActionTarget, DrawingKind, Point, StrokeStyle};

/// Full-surface RGBA8 pixel snapshot. Base-target actions carry these in both
/// directions so undo/redo is a byte-exact restore, never a recomputation.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Snapshot {
    pub fn is_consistent(&self) -> bool {
        self.pixels.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

/// One immutable, replayable record of a single user edit.
///
/// `id` and `seq` both come from monotonic per-engine counters; `seq` is the
/// logical clock replay sorts by, so two actions can never collide even when
/// created back-to-back in the same tick.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Action {
    pub id: u64,
    pub seq: u64,
    #[serde(flatten)]
    pub payload: ActionPayload,
}

impl Action {
    pub fn target(&self) -> ActionTarget {
        match &self.payload {
            ActionPayload::Drawing(_) => ActionTarget::Drawing,
            ActionPayload::Konva(_) => ActionTarget::Konva,
            ActionPayload::Base(_) => ActionTarget::Base,
        }
    }

    pub fn label(&self) -> &'static str {
        match &self.payload {
            ActionPayload::Drawing(d) => d.kind.name(),
            ActionPayload::Konva(ElementAction::Add { .. }) => "add_element",
            ActionPayload::Konva(ElementAction::Move { .. }) => "move_element",
            ActionPayload::Base(BaseAction::ApplyFilter { .. }) => "apply_filter",
            ActionPayload::Base(BaseAction::CropImage { .. }) => "crop_image",
            ActionPayload::Base(BaseAction::LoadImage { .. }) => "load_image",
            ActionPayload::Base(BaseAction::FlattenLayers { .. }) => "flatten_layers",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum ActionPayload {
    Drawing(DrawingAction),
    Konva(ElementAction),
    Base(BaseAction),
}

/// Raster stroke payload. Line kinds use the first and last point as explicit
/// start/end; freehand kinds use the whole point sequence.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct DrawingAction {
    pub kind: DrawingKind,
    pub points: Vec<Point>,
    pub color: String,
    pub width: f64,
    pub style: StrokeStyle,
}

impl DrawingAction {
    pub fn start(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }

    pub fn end(&self) -> Point {
        self.points.last().copied().unwrap_or_default()
    }
}

/// Vector element payload. Moves carry full before/after snapshots so they
/// are reversible by snapshot swap, never by inverse transform.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementAction {
    Add { element: Element },
    Move { element_id: u32, previous: Element, data: Element },
}

/// Whole-surface operations on the base (photograph) layer, plus the logged
/// flatten of live vector elements into the drawing layer.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BaseAction {
    ApplyFilter {
        filter: FilterKind,
        previous: Snapshot,
        new: Snapshot,
    },
    CropImage {
        region: CropRegion,
        previous: Snapshot,
        new: Snapshot,
    },
    LoadImage {
        previous: Snapshot,
        image: Snapshot,
    },
    FlattenLayers {
        previous_drawing: Snapshot,
        new_drawing: Snapshot,
        elements: Vec<Element>,
    },
}
