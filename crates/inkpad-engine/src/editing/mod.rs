//! Selection tracking and structural edits over an [`EditableDocument`].
//!
//! The pieces are layered leaf-first: [`offsets`] maps boundary points to
//! flattened text offsets, [`wrap`] applies and removes annotations and
//! [`typing`] inserts and deletes text. [`observer`] decides when the
//! toolbar is shown and [`toolbar`] lays it out.
//!
//! [`EditableDocument`]: crate::document::EditableDocument

pub mod actions;
pub mod observer;
pub mod offsets;
pub mod selection;
pub mod toolbar;
pub mod typing;
pub mod utf16;
pub mod wrap;

use thiserror::Error;

pub use actions::{WRAP_ACTIONS, WrapAction, WrapTag};
pub use observer::{KeyPolicy, SelectionObserver, SurfaceGeometry, ToolbarState};
pub use offsets::compute_offsets;
pub use selection::{Affinity, BoundaryPoint, SelectionRange, SelectionState, TextOffsets};
pub use toolbar::{ToolbarButton, ToolbarLayout, ToolbarMetrics, ToolbarView};
pub use typing::{DeleteDirection, TextEdit};
pub use wrap::WrapOutcome;

/// Why an edit was refused. Refused edits never touch the document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Selection no longer points into the document")]
    StaleSelection,
}
