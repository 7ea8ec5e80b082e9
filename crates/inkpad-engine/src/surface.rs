use log::info;

use crate::document::EditableDocument;
use crate::editing::actions::WrapTag;
use crate::editing::selection::SelectionRange;
use crate::editing::typing::{self, DeleteDirection, TextEdit};
use crate::editing::wrap::{self, WrapOutcome};
use crate::editing::EditError;
use crate::events::{Listeners, Subscription};

/// Payload of the content-changed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChanged {
    pub markup: String,
    pub version: u64,
}

/// Owns the document being edited and announces every change to it.
///
/// Structural edits go through [`wrap`](Self::wrap), the typing calls such
/// as [`insert_text`](Self::insert_text) or
/// [`set_content`](Self::set_content); each one that changes the document
/// fires the content-changed notification exactly once. Consuming the surface with
/// [`teardown`](Self::teardown) ends its life, so no mutation can follow.
pub struct EditableSurface {
    document: EditableDocument,
    changes: Listeners<ContentChanged>,
}

impl EditableSurface {
    pub fn mount(initial_markup: &str) -> Self {
        let document = EditableDocument::from_markup(initial_markup);
        info!(
            "Mounted surface with {} characters of text",
            document.text_len()
        );
        Self {
            document,
            changes: Listeners::new(),
        }
    }

    pub fn document(&self) -> &EditableDocument {
        &self.document
    }

    /// Current markup.
    pub fn content(&self) -> String {
        self.document.to_markup()
    }

    /// Replaces the whole tree. Selections taken before the call no longer
    /// resolve.
    pub fn set_content(&mut self, markup: &str) {
        let change = self.replace_content(markup);
        self.changes.emit(&change);
    }

    pub fn on_change(&self, listener: impl FnMut(&ContentChanged) + 'static) -> Subscription {
        self.changes.subscribe(listener)
    }

    /// Toggles the annotation named `tag_name` over `range`.
    pub fn wrap(
        &mut self,
        range: &SelectionRange,
        tag_name: &str,
    ) -> Result<WrapOutcome, EditError> {
        let tag: WrapTag = tag_name.parse()?;
        self.wrap_tag(range, tag)
    }

    pub fn wrap_tag(
        &mut self,
        range: &SelectionRange,
        tag: WrapTag,
    ) -> Result<WrapOutcome, EditError> {
        let (outcome, change) = self.apply_wrap(range, tag)?;
        if let Some(change) = change {
            self.changes.emit(&change);
        }
        Ok(outcome)
    }

    /// Applies a typing edit at `range` and returns the caret, or `None`
    /// when there was nothing to do.
    pub fn edit(
        &mut self,
        range: &SelectionRange,
        edit: TextEdit<'_>,
    ) -> Result<Option<SelectionRange>, EditError> {
        let (caret, change) = self.apply_edit(range, edit)?;
        if let Some(change) = change {
            self.changes.emit(&change);
        }
        Ok(caret)
    }

    /// Replaces the selected span with `text`.
    pub fn insert_text(
        &mut self,
        range: &SelectionRange,
        text: &str,
    ) -> Result<Option<SelectionRange>, EditError> {
        self.edit(range, TextEdit::Insert(text))
    }

    /// Removes the selected span. A collapsed range removes nothing.
    pub fn delete_range(
        &mut self,
        range: &SelectionRange,
    ) -> Result<Option<SelectionRange>, EditError> {
        self.insert_text(range, "")
    }

    /// Backspace or Delete at `range`.
    pub fn delete(
        &mut self,
        range: &SelectionRange,
        direction: DeleteDirection,
    ) -> Result<Option<SelectionRange>, EditError> {
        self.edit(range, TextEdit::Delete(direction))
    }

    pub fn insert_paragraph(
        &mut self,
        range: &SelectionRange,
    ) -> Result<Option<SelectionRange>, EditError> {
        self.edit(range, TextEdit::Paragraph)
    }

    /// Releases every content-changed listener.
    pub fn teardown(self) {
        info!("Surface torn down at version {}", self.document.version());
    }

    /// Runs the wrap and returns the notification still to be sent, so a
    /// caller holding a borrow can emit once it has let go.
    pub(crate) fn apply_wrap(
        &mut self,
        range: &SelectionRange,
        tag: WrapTag,
    ) -> Result<(WrapOutcome, Option<ContentChanged>), EditError> {
        let outcome = wrap::wrap_tag(&mut self.document, range, tag)?;
        let change = (!outcome.is_noop()).then(|| self.snapshot());
        Ok((outcome, change))
    }

    pub(crate) fn apply_edit(
        &mut self,
        range: &SelectionRange,
        edit: TextEdit<'_>,
    ) -> Result<(Option<SelectionRange>, Option<ContentChanged>), EditError> {
        let caret = typing::apply(&mut self.document, range, edit)?;
        let change = caret.is_some().then(|| self.snapshot());
        Ok((caret, change))
    }

    pub(crate) fn replace_content(&mut self, markup: &str) -> ContentChanged {
        self.document.replace(markup);
        self.snapshot()
    }

    pub(crate) fn changes(&self) -> &Listeners<ContentChanged> {
        &self.changes
    }

    fn snapshot(&self) -> ContentChanged {
        ContentChanged {
            markup: self.document.to_markup(),
            version: self.document.version(),
        }
    }
}
