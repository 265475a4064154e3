use ab_glyph::FontArc;
use tracing::debug;
use wasm_bindgen::prelude::*;
use crate::actions::{Action, ActionPayload, BaseAction, DrawingAction, ElementAction, Snapshot};
use crate::elements::{Element, ElementStore};
use crate::filters::{CropRegion, FilterKind};
use crate::history::History;
use crate::raster::Surface;
use crate::replay;
use crate::types::{DrawingKind, Point, StrokeStyle};

/// The annotation editor core: the history log, the two raster layers (base
/// photograph + drawing/annotation), and the live vector element store, kept
/// consistent with the log cursor.
#[wasm_bindgen]
pub struct AnnotationEngine {
    pub(crate) history: History,
    pub(crate) base: Surface,
    pub(crate) drawing: Surface,
    pub(crate) elements: ElementStore,
    pub(crate) font: Option<FontArc>,
    pub(crate) next_action_id: u64,
    pub(crate) next_element_id: u32,
    pub(crate) seq: u64,
}

#[wasm_bindgen]
impl AnnotationEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> AnnotationEngine {
        console_error_panic_hook::set_once();

        AnnotationEngine {
            history: History::new(),
            base: Surface::new(width, height),
            drawing: Surface::new(width, height),
            elements: ElementStore::new(),
            font: None,
            next_action_id: 1,
            next_element_id: 1,
            seq: 1,
        }
    }

    pub fn undo(&mut self) -> bool {
        let action = match self.history.start_undo() {
            Some(a) => a,
            None => return false,
        };
        match &action.payload {
            ActionPayload::Drawing(_) => self.replay_drawing(),
            ActionPayload::Konva(ElementAction::Add { element }) => {
                self.elements.remove(element.id);
            }
            ActionPayload::Konva(ElementAction::Move { element_id, previous, .. }) => {
                self.elements.replace(*element_id, previous.clone());
            }
            ActionPayload::Base(base) => self.apply_base(base, false),
        }
        true
    }

    pub fn redo(&mut self) -> bool {
        let action = match self.history.start_redo() {
            Some(a) => a,
            None => return false,
        };
        // Same path as a fresh apply: drawing targets get a full replay
        // through the new cursor, mirroring undo.
        self.apply_forward(&action);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn action_count(&self) -> usize {
        self.history.action_count()
    }

    pub fn width(&self) -> u32 {
        self.drawing.width()
    }

    pub fn height(&self) -> u32 {
        self.drawing.height()
    }

    pub fn base_width(&self) -> u32 {
        self.base.width()
    }

    pub fn base_height(&self) -> u32 {
        self.base.height()
    }

    pub fn drawing_pixels(&self) -> Vec<u8> {
        self.drawing.to_vec()
    }

    pub fn base_pixels(&self) -> Vec<u8> {
        self.base.to_vec()
    }

    /// Applied-prefix action labels, oldest first.
    pub fn get_history(&self) -> String {
        let labels: Vec<&str> = self.history.applied().iter().map(|a| a.label()).collect();
        serde_json::to_string(&labels).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn get_elements(&self) -> String {
        let elements: Vec<&Element> = self.elements.iter().collect();
        serde_json::to_string(&elements).unwrap_or_else(|_| "[]".to_string())
    }

    /// Registers the font used to rasterize text elements at flatten time.
    /// Text elements stay vector-only until a font is provided.
    pub fn register_font(&mut self, data: &[u8]) -> bool {
        match FontArc::try_from_vec(data.to_vec()) {
            Ok(font) => {
                self.font = Some(font);
                true
            }
            Err(_) => false,
        }
    }
}

impl AnnotationEngine {
    pub(crate) fn allocate(&mut self, payload: ActionPayload) -> Action {
        let action = Action { id: self.next_action_id, seq: self.seq, payload };
        self.next_action_id += 1;
        self.seq += 1;
        action
    }

    /// Appends an action to the log and applies its side effect. Appending
    /// after undos truncates the undone suffix for good; the redo buffer is
    /// always cleared.
    pub fn add_action(&mut self, action: Action) {
        let forward = action.clone();
        self.history.push(action);
        self.apply_forward(&forward);
    }

    fn apply_forward(&mut self, action: &Action) {
        match &action.payload {
            ActionPayload::Drawing(_) => self.replay_drawing(),
            ActionPayload::Konva(ElementAction::Add { element }) => {
                self.elements.insert(element.clone());
            }
            ActionPayload::Konva(ElementAction::Move { element_id, data, .. }) => {
                self.elements.replace(*element_id, data.clone());
            }
            ActionPayload::Base(base) => self.apply_base(base, true),
        }
    }

    fn apply_base(&mut self, base: &BaseAction, forward: bool) {
        match base {
            BaseAction::ApplyFilter { previous, new, .. }
            | BaseAction::CropImage { previous, new, .. } => {
                self.base.restore(if forward { new } else { previous });
            }
            BaseAction::LoadImage { previous, image } => {
                self.base.restore(if forward { image } else { previous });
            }
            BaseAction::FlattenLayers { previous_drawing, new_drawing, elements } => {
                if forward {
                    self.drawing.restore(new_drawing);
                    for element in elements {
                        self.elements.remove(element.id);
                    }
                } else {
                    self.drawing.restore(previous_drawing);
                    for element in elements {
                        self.elements.insert(element.clone());
                    }
                }
            }
        }
    }

    fn replay_drawing(&mut self) {
        // Seed from the latest applied flatten: those pixels are not
        // reproducible from drawing-target actions alone.
        let base_seq = match self.history.flatten_base() {
            Some((seq, snapshot)) => {
                self.drawing.restore(snapshot);
                seq
            }
            None => {
                self.drawing.clear();
                0
            }
        };
        let actions = self.history.drawing_prefix_after(base_seq);
        debug!(count = actions.len(), base_seq, "replaying drawing prefix");
        for action in actions {
            replay::apply_drawing_action(&mut self.drawing, action);
        }
    }

    /// Records a raster stroke. Returns the action id, or `None` for an
    /// empty point list (which never reaches the log).
    pub fn draw_stroke(
        &mut self,
        kind: DrawingKind,
        points: Vec<Point>,
        color: &str,
        width: f64,
        style: StrokeStyle,
    ) -> Option<u64> {
        if points.is_empty() {
            return None;
        }
        let action = self.allocate(ActionPayload::Drawing(DrawingAction {
            kind,
            points,
            color: color.to_string(),
            width,
            style,
        }));
        let id = action.id;
        self.add_action(action);
        Some(id)
    }

    /// Records an element add. A zero id gets a fresh one from the monotonic
    /// counter; degenerate shapes are discarded before any action exists.
    pub fn add_element(&mut self, mut element: Element) -> Option<u32> {
        if element.is_degenerate() {
            return None;
        }
        if element.id == 0 {
            element.id = self.next_element_id;
        }
        if self.elements.contains(element.id) {
            return None;
        }
        self.next_element_id = self.next_element_id.max(element.id) + 1;
        let id = element.id;
        let action = self.allocate(ActionPayload::Konva(ElementAction::Add { element }));
        self.add_action(action);
        Some(id)
    }

    /// Records an element move carrying both full snapshots, so undo/redo is
    /// a swap in either direction.
    pub fn move_element(&mut self, element_id: u32, data: Element) -> bool {
        let previous = match self.elements.get(element_id) {
            Some(e) => e.clone(),
            None => return false,
        };
        let mut data = data;
        data.id = element_id;
        if data.is_degenerate() {
            return false;
        }
        let action = self.allocate(ActionPayload::Konva(ElementAction::Move {
            element_id,
            previous,
            data,
        }));
        self.add_action(action);
        true
    }

    /// Applies a whole-surface filter to the base layer, logging byte-exact
    /// before/after snapshots.
    pub fn apply_filter(&mut self, filter: FilterKind) -> bool {
        if self.base.is_empty() {
            return false;
        }
        let previous = self.base.snapshot();
        let mut pixels = previous.pixels.clone();
        filter.apply(&mut pixels);
        let new = Snapshot { width: previous.width, height: previous.height, pixels };
        let action = self.allocate(ActionPayload::Base(BaseAction::ApplyFilter {
            filter,
            previous,
            new,
        }));
        self.add_action(action);
        true
    }

    pub fn crop(&mut self, region: CropRegion) -> bool {
        let region = region.clamped(self.base.width(), self.base.height());
        if region.width == 0 || region.height == 0 {
            return false;
        }
        let previous = self.base.snapshot();
        let new = self.base.cropped(&region);
        let action = self.allocate(ActionPayload::Base(BaseAction::CropImage {
            region,
            previous,
            new,
        }));
        self.add_action(action);
        true
    }

    /// Replaces the base layer with a decoded image snapshot.
    pub fn load_base(&mut self, image: Snapshot) -> bool {
        if !image.is_consistent() || image.width == 0 || image.height == 0 {
            return false;
        }
        let previous = self.base.snapshot();
        let action = self.allocate(ActionPayload::Base(BaseAction::LoadImage { previous, image }));
        self.add_action(action);
        true
    }

    /// Commits every live vector element into the drawing layer as one
    /// reversible action: undo restores the pre-flatten pixels and brings
    /// the elements back as editable vectors.
    pub fn flatten(&mut self) -> bool {
        if self.elements.is_empty() {
            return false;
        }
        let previous_drawing = self.drawing.snapshot();
        let mut scratch = Surface::from_snapshot(&previous_drawing);
        let flattened = self.elements.render_all(&mut scratch, self.font.as_ref());
        let new_drawing = scratch.snapshot();
        let action = self.allocate(ActionPayload::Base(BaseAction::FlattenLayers {
            previous_drawing,
            new_drawing,
            elements: flattened,
        }));
        self.add_action(action);
        true
    }

    pub fn element(&self, id: u32) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn live_elements(&self) -> &ElementStore {
        &self.elements
    }

    pub fn drawing_surface(&self) -> &Surface {
        &self.drawing
    }

    pub fn base_surface(&self) -> &Surface {
        &self.base
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}
