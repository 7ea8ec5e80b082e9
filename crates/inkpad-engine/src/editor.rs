//! A surface mounted on a page: the document, the selection observer and the
//! toolbar wired to the global event source.
//!
//! The editor subscribes to [`SelectionEvents`] when mounted and releases
//! that subscription when torn down or dropped, so the global source never
//! keeps calling into an editor that is gone.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info};

use crate::document::EditableDocument;
use crate::editing::actions::WrapTag;
use crate::editing::observer::{KeyPolicy, SelectionObserver, SurfaceGeometry, ToolbarState};
use crate::editing::offsets::compute_offsets;
use crate::editing::selection::{SelectionRange, TextOffsets};
use crate::editing::toolbar::{ToolbarLayout, ToolbarView};
use crate::editing::typing::{DeleteDirection, TextEdit};
use crate::editing::wrap::WrapOutcome;
use crate::editing::EditError;
use crate::events::{EditorEvent, Listeners, SelectionEvents, Subscription};
use crate::surface::{ContentChanged, EditableSurface};

struct EditorState {
    surface: EditableSurface,
    observer: SelectionObserver,
    selection: Option<SelectionRange>,
    geometry: Box<dyn SurfaceGeometry>,
    toolbar: ToolbarView,
}

impl EditorState {
    fn dispatch(&mut self, event: &EditorEvent) {
        if let EditorEvent::SelectionChange(selection) = event {
            self.selection = *selection;
        }
        let EditorState {
            surface,
            observer,
            geometry,
            ..
        } = self;
        observer.handle(event, surface.document(), &**geometry);
    }
}

pub struct Editor {
    state: Rc<RefCell<EditorState>>,
    changes: Listeners<ContentChanged>,
    subscription: Option<Subscription>,
}

impl Editor {
    /// Mounts a surface seeded with `initial_markup` and starts listening to
    /// `events`.
    pub fn mount(
        events: &SelectionEvents,
        initial_markup: &str,
        geometry: impl SurfaceGeometry + 'static,
        policy: KeyPolicy,
    ) -> Self {
        let surface = EditableSurface::mount(initial_markup);
        let changes = surface.changes().clone();
        let state = Rc::new(RefCell::new(EditorState {
            surface,
            observer: SelectionObserver::new(policy),
            selection: None,
            geometry: Box::new(geometry),
            toolbar: ToolbarView::default(),
        }));

        let weak: Weak<RefCell<EditorState>> = Rc::downgrade(&state);
        let subscription = events.subscribe(move |event| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            // An event raised while the editor itself is busy is dropped
            // rather than handled against a half-updated state.
            match state.try_borrow_mut() {
                Ok(mut state) => state.dispatch(event),
                Err(_) => debug!("editor busy, dropped {event:?}"),
            };
        });

        info!("Editor mounted with {policy:?}");
        Self {
            state,
            changes,
            subscription: Some(subscription),
        }
    }

    pub fn with_toolbar(self, toolbar: ToolbarView) -> Self {
        self.state.borrow_mut().toolbar = toolbar;
        self
    }

    /// Feeds one event straight to this editor.
    pub fn handle_event(&self, event: &EditorEvent) {
        self.state.borrow_mut().dispatch(event);
    }

    pub fn toolbar_state(&self) -> ToolbarState {
        *self.state.borrow().observer.state()
    }

    pub fn toolbar_layout(&self) -> Option<ToolbarLayout> {
        let state = self.state.borrow();
        state
            .toolbar
            .layout(state.observer.state(), state.geometry.surface_bounds())
    }

    /// The last selection the host reported, wherever it lies.
    pub fn selection(&self) -> Option<SelectionRange> {
        self.state.borrow().selection
    }

    /// Offsets of the current selection when it lies in this document.
    pub fn selection_offsets(&self) -> Option<TextOffsets> {
        let state = self.state.borrow();
        let range = state.selection?;
        compute_offsets(state.surface.document(), &range)
    }

    pub fn with_document<R>(&self, read: impl FnOnce(&EditableDocument) -> R) -> R {
        read(self.state.borrow().surface.document())
    }

    pub fn content(&self) -> String {
        self.state.borrow().surface.content()
    }

    /// Replaces the document. The toolbar hides and the old selection is
    /// forgotten, since none of its nodes survive.
    pub fn set_content(&self, markup: &str) {
        let change = {
            let mut state = self.state.borrow_mut();
            state.selection = None;
            state.observer.hide();
            state.surface.replace_content(markup)
        };
        self.changes.emit(&change);
    }

    pub fn on_change(&self, listener: impl FnMut(&ContentChanged) + 'static) -> Subscription {
        self.changes.subscribe(listener)
    }

    pub fn set_geometry(&self, geometry: impl SurfaceGeometry + 'static) {
        self.state.borrow_mut().geometry = Box::new(geometry);
    }

    /// Applies a toolbar action to the current selection. The toolbar is
    /// hidden afterwards whatever the outcome.
    pub fn activate(&self, tag: WrapTag) -> Result<WrapOutcome, EditError> {
        let (result, change) = {
            let mut state = self.state.borrow_mut();
            let selection = state.selection;
            let result = match selection {
                Some(range) => state.surface.apply_wrap(&range, tag),
                None => Ok((WrapOutcome::NoOp, None)),
            };
            state.observer.hide();
            match result {
                Ok((outcome, change)) => {
                    if let Some(range) = outcome.selection() {
                        state.selection = Some(*range);
                    }
                    (Ok(outcome), change)
                }
                Err(err) => {
                    debug!("<{tag}> not applied: {err}");
                    (Err(err), None)
                }
            }
        };
        if let Some(change) = change {
            self.changes.emit(&change);
        }
        result
    }

    /// Same as [`activate`](Self::activate) with the tag given by name.
    pub fn wrap_selection(&self, tag_name: &str) -> Result<WrapOutcome, EditError> {
        match tag_name.parse::<WrapTag>() {
            Ok(tag) => self.activate(tag),
            Err(err) => {
                self.state.borrow_mut().observer.hide();
                debug!("wrap refused: {err}");
                Err(err)
            }
        }
    }

    /// Applies a typing edit at the current selection, which then collapses
    /// to the caret the edit leaves. Typing always hides the toolbar.
    pub fn edit(&self, edit: TextEdit<'_>) -> Result<Option<SelectionRange>, EditError> {
        let (result, change) = {
            let mut state = self.state.borrow_mut();
            state.observer.hide();
            let selection = state.selection;
            let result = match selection {
                Some(range) => state.surface.apply_edit(&range, edit),
                None => Ok((None, None)),
            };
            match result {
                Ok((caret, change)) => {
                    if caret.is_some() {
                        state.selection = caret;
                    }
                    (Ok(caret), change)
                }
                Err(err) => {
                    debug!("{edit:?} not applied: {err}");
                    (Err(err), None)
                }
            }
        };
        if let Some(change) = change {
            self.changes.emit(&change);
        }
        result
    }

    pub fn insert_text(&self, text: &str) -> Result<Option<SelectionRange>, EditError> {
        self.edit(TextEdit::Insert(text))
    }

    pub fn delete(&self, direction: DeleteDirection) -> Result<Option<SelectionRange>, EditError> {
        self.edit(TextEdit::Delete(direction))
    }

    pub fn insert_paragraph(&self) -> Result<Option<SelectionRange>, EditError> {
        self.edit(TextEdit::Paragraph)
    }

    /// Unmounts: the toolbar returns to hidden and every subscription held
    /// by the editor is released.
    pub fn teardown(self) {}

    fn release(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
            info!("Editor unmounted");
        }
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.observer.reset();
            state.selection = None;
        }
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        self.release();
    }
}
