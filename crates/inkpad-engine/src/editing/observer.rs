//! Decides, event by event, whether the floating toolbar is shown.
//!
//! ```text
//!            selection-change (qualifying)
//!   Hidden ---------------------------------> Visible(state)
//!     ^                                          |
//!     +-- selection-change (other), key-down, ---+
//!         collapsed click, outside pointer-down,
//!         reset
//! ```
//!
//! A qualifying selection is non-collapsed, covers at least one character,
//! and has both ends inside the surface's document. Every event supersedes
//! the previous state; nothing computed for an earlier event is reused.

use log::debug;

use crate::document::EditableDocument;
use crate::editing::offsets::compute_offsets;
use crate::editing::selection::{SelectionRange, SelectionState, TextOffsets};
use crate::events::{EditorEvent, KeyInput, PointerTarget};
use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ToolbarState {
    #[default]
    Hidden,
    Visible(SelectionState),
}

impl ToolbarState {
    pub fn is_visible(&self) -> bool {
        matches!(self, ToolbarState::Visible(_))
    }

    pub fn selection(&self) -> Option<&SelectionState> {
        match self {
            ToolbarState::Visible(state) => Some(state),
            ToolbarState::Hidden => None,
        }
    }
}

/// How key-down events inside the surface affect a visible toolbar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Any key hides the toolbar.
    #[default]
    HideOnAnyKey,
    /// Navigation and shift-selection keys leave the toolbar to the
    /// selection-change that follows them; other keys hide it.
    RecomputeOnNavigation,
}

/// Layout information the observer needs from whatever renders the surface.
pub trait SurfaceGeometry {
    /// Bounding box of the editable surface.
    fn surface_bounds(&self) -> Rect;

    /// Rectangles covering the rendered text between `offsets`, in document
    /// order. An empty list is allowed.
    fn selection_rects(&self, doc: &EditableDocument, offsets: &TextOffsets) -> Vec<Rect>;
}

#[derive(Debug, Default)]
pub struct SelectionObserver {
    state: ToolbarState,
    policy: KeyPolicy,
}

impl SelectionObserver {
    pub fn new(policy: KeyPolicy) -> Self {
        Self {
            state: ToolbarState::Hidden,
            policy,
        }
    }

    pub fn state(&self) -> &ToolbarState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_visible()
    }

    pub fn hide(&mut self) {
        if self.state.is_visible() {
            debug!("toolbar hidden");
        }
        self.state = ToolbarState::Hidden;
    }

    /// Returns to the initial state. Used when the surface unmounts.
    pub fn reset(&mut self) {
        self.hide();
    }

    /// Applies one event and returns the resulting state.
    pub fn handle(
        &mut self,
        event: &EditorEvent,
        doc: &EditableDocument,
        geometry: &dyn SurfaceGeometry,
    ) -> &ToolbarState {
        match event {
            EditorEvent::SelectionChange(selection) => {
                self.on_selection_change(selection.as_ref(), doc, geometry);
            }
            EditorEvent::PointerDown {
                target: PointerTarget::Outside,
            } => self.hide(),
            EditorEvent::PointerDown { .. } => {}
            EditorEvent::Click {
                target: PointerTarget::Surface,
                collapsed: true,
            } => self.hide(),
            EditorEvent::Click { .. } => {}
            EditorEvent::KeyDown(input) => self.on_key_down(input),
        }
        &self.state
    }

    fn on_selection_change(
        &mut self,
        selection: Option<&SelectionRange>,
        doc: &EditableDocument,
        geometry: &dyn SurfaceGeometry,
    ) {
        let Some(offsets) = selection.and_then(|range| qualifying_offsets(doc, range)) else {
            self.hide();
            return;
        };
        let anchor = anchor_for(doc, &offsets, geometry);
        debug!(
            "toolbar visible for {}..{} at ({}, {})",
            offsets.start, offsets.end, anchor.x, anchor.y
        );
        self.state = ToolbarState::Visible(SelectionState { offsets, anchor });
    }

    fn on_key_down(&mut self, input: &KeyInput) {
        if !input.inside_surface {
            return;
        }
        match self.policy {
            KeyPolicy::HideOnAnyKey => self.hide(),
            KeyPolicy::RecomputeOnNavigation => {
                if !input.key.is_navigation() {
                    self.hide();
                }
            }
        }
    }
}

/// Offsets of `range` when it should show the toolbar.
pub fn qualifying_offsets(doc: &EditableDocument, range: &SelectionRange) -> Option<TextOffsets> {
    if range.is_collapsed() {
        return None;
    }
    compute_offsets(doc, range).filter(|offsets| !offsets.is_empty())
}

/// Top-right corner of the last selection rectangle, or of the surface when
/// the renderer reports none.
fn anchor_for(doc: &EditableDocument, offsets: &TextOffsets, geometry: &dyn SurfaceGeometry) -> Point {
    geometry
        .selection_rects(doc, offsets)
        .last()
        .map(Rect::top_right)
        .unwrap_or_else(|| geometry.surface_bounds().top_right())
}
