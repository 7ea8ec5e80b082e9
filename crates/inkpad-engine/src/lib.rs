pub mod document;
pub mod editing;
pub mod editor;
pub mod events;
pub mod geometry;
pub mod io;
pub mod models;
pub mod surface;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use document::{EditableDocument, NodeId, Tag, TextRun, TreeId};
pub use editing::{
    Affinity, BoundaryPoint, DeleteDirection, EditError, KeyPolicy, SelectionObserver,
    SelectionRange, SelectionState, SurfaceGeometry, TextEdit, TextOffsets, ToolbarLayout,
    ToolbarMetrics, ToolbarState, ToolbarView, WRAP_ACTIONS, WrapAction, WrapOutcome, WrapTag,
};
pub use editor::Editor;
pub use events::{
    EditorEvent, Key, KeyInput, Listeners, PointerTarget, SelectionEvents, Subscription,
};
pub use geometry::{Point, Rect, Size};
pub use io::*;
pub use models::*;
pub use surface::{ContentChanged, EditableSurface};
