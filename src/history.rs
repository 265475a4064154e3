use tracing::{debug, trace};
use crate::actions::{Action, ActionPayload, BaseAction, DrawingAction, Snapshot};

/// The action log: an append-only (until truncated) action list, a cursor
/// counting applied actions, and a redo buffer. Pure bookkeeping — surface
/// and store mutation live in the engine.
///
/// Invariant: `redo_stack` always mirrors, most-recent-last, the contiguous
/// suffix of `actions` that undos walked back over since the last push.
/// Pushing any new action truncates that suffix and clears the buffer;
/// history is linear, never a tree.
#[derive(Default, Clone, Debug)]
pub struct History {
    actions: Vec<Action>,
    cursor: usize,
    redo_stack: Vec<Action>,
}

impl History {
    pub fn new() -> History {
        History::default()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.truncate(self.cursor);
        if !self.redo_stack.is_empty() {
            debug!(discarded = self.redo_stack.len(), "new action invalidates the redo buffer");
        }
        self.redo_stack.clear();
        trace!(id = action.id, seq = action.seq, label = action.label(), "append action");
        self.actions.push(action);
        self.cursor = self.actions.len();
    }

    /// Moves the cursor back one step and hands out the action to unapply.
    /// No-op (`None`) on an empty applied prefix.
    pub fn start_undo(&mut self) -> Option<Action> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        let action = self.actions[self.cursor].clone();
        self.redo_stack.push(action.clone());
        trace!(id = action.id, cursor = self.cursor, "undo");
        Some(action)
    }

    /// Consumes the most recently undone action, advancing the cursor over
    /// it. No-op (`None`) when nothing has been undone.
    pub fn start_redo(&mut self) -> Option<Action> {
        let action = self.redo_stack.pop()?;
        debug_assert_eq!(self.actions[self.cursor].id, action.id);
        self.cursor += 1;
        trace!(id = action.id, cursor = self.cursor, "redo");
        Some(action)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Number of applied actions.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn applied(&self) -> &[Action] {
        &self.actions[..self.cursor]
    }

    /// The drawing-target subsequence of the applied prefix, in ascending
    /// `seq` order regardless of storage order.
    pub fn drawing_prefix(&self) -> Vec<&DrawingAction> {
        self.drawing_prefix_after(0)
    }

    /// Like [`drawing_prefix`](Self::drawing_prefix), restricted to actions
    /// with `seq` strictly greater than `min_seq`. Replay uses this to skip
    /// strokes already baked into a flatten snapshot.
    pub fn drawing_prefix_after(&self, min_seq: u64) -> Vec<&DrawingAction> {
        let mut drawing: Vec<(u64, &DrawingAction)> = self
            .applied()
            .iter()
            .filter_map(|a| match &a.payload {
                ActionPayload::Drawing(d) if a.seq > min_seq => Some((a.seq, d)),
                _ => None,
            })
            .collect();
        drawing.sort_by_key(|(seq, _)| *seq);
        drawing.into_iter().map(|(_, d)| d).collect()
    }

    /// The most recently applied flatten's committed drawing pixels, with its
    /// `seq`. Replay seeds the drawing layer from this snapshot instead of a
    /// blank surface, so flattened pixels survive later replays.
    pub fn flatten_base(&self) -> Option<(u64, &Snapshot)> {
        self.applied()
            .iter()
            .filter_map(|a| match &a.payload {
                ActionPayload::Base(BaseAction::FlattenLayers { new_drawing, .. }) => {
                    Some((a.seq, new_drawing))
                }
                _ => None,
            })
            .max_by_key(|(seq, _)| *seq)
    }
}
