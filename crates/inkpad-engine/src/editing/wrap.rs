//! Wrapping and unwrapping a selected span in an annotation element.
//!
//! A wrap splits the tree at both ends of the selection, up to the nearest
//! element containing both, and moves everything in between into a new
//! element. An unwrap replaces an enclosing element of the same family with
//! a single text node. Neither changes the flattened plain text.

use log::debug;

use crate::document::tree::Tree;
use crate::document::{Element, EditableDocument, NodeId};
use crate::editing::EditError;
use crate::editing::actions::WrapTag;
use crate::editing::offsets::{boundary_offset, common_ancestor, ordered_points};
use crate::editing::selection::{BoundaryPoint, SelectionRange, TextOffsets};
use crate::editing::utf16;

/// Result of a wrap request that was not refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapOutcome {
    /// A new element now encloses the span; the range selects its contents.
    Wrapped(SelectionRange),
    /// An enclosing element was removed; the range covers the same text
    /// inside the replacement text node.
    Unwrapped(SelectionRange),
    /// Nothing was selected, the document is untouched.
    NoOp,
}

impl WrapOutcome {
    pub fn selection(&self) -> Option<&SelectionRange> {
        match self {
            WrapOutcome::Wrapped(range) | WrapOutcome::Unwrapped(range) => Some(range),
            WrapOutcome::NoOp => None,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, WrapOutcome::NoOp)
    }
}

/// Toggles the annotation named `tag_name` over `range`.
///
/// Unknown tags fail with [`EditError::InvalidArgument`] and ranges that no
/// longer point into `doc` with [`EditError::StaleSelection`]; in both cases
/// the document is left as it was. An empty span is a [`WrapOutcome::NoOp`].
pub fn wrap(
    doc: &mut EditableDocument,
    range: &SelectionRange,
    tag_name: &str,
) -> Result<WrapOutcome, EditError> {
    let tag: WrapTag = tag_name.parse()?;
    wrap_tag(doc, range, tag)
}

pub fn wrap_tag(
    doc: &mut EditableDocument,
    range: &SelectionRange,
    tag: WrapTag,
) -> Result<WrapOutcome, EditError> {
    let (start, end) = ordered_points(doc, range)?;
    let offsets = TextOffsets::new(boundary_offset(doc, &start)?, boundary_offset(doc, &end)?);
    // Both ends inside one surrogate pair select no whole character
    let text = doc.plain_text();
    let snap = |offset| utf16::offset_of_byte(text, utf16::byte_index(text, offset));
    if snap(offsets.start) == snap(offsets.end) {
        debug!("wrap {tag}: empty selection, nothing to do");
        return Ok(WrapOutcome::NoOp);
    }

    let ancestor = common_ancestor(doc, start.node, end.node).ok_or(EditError::StaleSelection)?;
    let container = match doc.node(ancestor) {
        Some(node) if node.is_text() => doc.parent(ancestor).ok_or(EditError::StaleSelection)?,
        Some(_) => ancestor,
        None => return Err(EditError::StaleSelection),
    };

    if let Some(existing) = enclosing_match(doc, container, tag) {
        return unwrap_node(doc, existing, offsets);
    }
    wrap_range(doc, container, start, end, tag)
}

/// Nearest element at or above `from`, below the root, that already applies
/// `tag`.
fn enclosing_match(doc: &EditableDocument, from: NodeId, tag: WrapTag) -> Option<NodeId> {
    doc.ancestors(from)
        .into_iter()
        .take_while(|id| *id != doc.root())
        .find(|id| {
            doc.node(*id)
                .and_then(|node| node.tag())
                .is_some_and(|existing| tag.matches(existing))
        })
}

fn unwrap_node(
    doc: &mut EditableDocument,
    node: NodeId,
    offsets: TextOffsets,
) -> Result<WrapOutcome, EditError> {
    let parent = doc.parent(node).ok_or(EditError::StaleSelection)?;
    let index = doc.index_in_parent(node).ok_or(EditError::StaleSelection)?;
    let base = boundary_offset(doc, &BoundaryPoint::new(doc.id(), parent, index))?;
    let text = doc.text_content(node);
    let len = doc.text_len_of(node);

    let replacement = doc.mutate(|tree, _| {
        tree.detach(node);
        tree.remove_subtree(node);
        if text.is_empty() {
            return None;
        }
        let replacement = tree.new_text(text);
        tree.insert_child(parent, index, replacement);
        Some(replacement)
    });

    let tree_id = doc.id();
    let range = match replacement {
        Some(text_node) => {
            let local = |offset: usize| offset.saturating_sub(base).min(len);
            SelectionRange::new(
                BoundaryPoint::new(tree_id, text_node, local(offsets.start)),
                BoundaryPoint::new(tree_id, text_node, local(offsets.end)),
            )
        }
        None => SelectionRange::collapsed(BoundaryPoint::new(tree_id, parent, index)),
    };
    debug!("unwrapped element covering {}..{}", offsets.start, offsets.end);
    Ok(WrapOutcome::Unwrapped(range))
}

fn wrap_range(
    doc: &mut EditableDocument,
    container: NodeId,
    start: BoundaryPoint,
    end: BoundaryPoint,
    tag: WrapTag,
) -> Result<WrapOutcome, EditError> {
    let wrapper = doc.mutate(|tree, _| {
        // Split the end first so the start point keeps addressing the same
        // node; the child that follows the end is tracked across the second
        // split, which can shift indices.
        let end_index = split_up_to(tree, container, &end)?;
        let end_marker = tree.children(container).get(end_index).copied();
        let start_index = split_up_to(tree, container, &start)?;
        let end_index = match end_marker {
            Some(marker) => tree.index_in_parent(marker)?,
            None => tree.children(container).len(),
        };

        let moved = tree.children(container)[start_index..end_index.max(start_index)].to_vec();
        let wrapper = tree.new_element(Element::new(tag.tag()));
        for child in moved {
            tree.detach(child);
            tree.append_child(wrapper, child);
        }
        tree.insert_child(container, start_index, wrapper);
        Some(wrapper)
    });

    let wrapper = wrapper.ok_or(EditError::StaleSelection)?;
    debug!("wrapped selection in <{tag}>");
    Ok(WrapOutcome::Wrapped(SelectionRange::contents_of(doc, wrapper)))
}

/// Splits the tree at `point` up to `container` and returns the child index
/// in `container` where the split falls. Nothing is split at the very start
/// or end of a node, so no empty text nodes or elements appear.
pub(crate) fn split_up_to(
    tree: &mut Tree,
    container: NodeId,
    point: &BoundaryPoint,
) -> Option<usize> {
    let node = tree.get(point.node)?;
    let (mut parent, mut index) = if let Some(text) = node.text() {
        let len = node.max_offset();
        // A point inside a surrogate pair moves to the end of that character
        let offset = utf16::offset_of_byte(text, utf16::byte_index(text, point.offset));
        let parent = tree.parent(point.node)?;
        let index = tree.index_in_parent(point.node)?;
        if offset == 0 {
            (parent, index)
        } else if offset >= len {
            (parent, index + 1)
        } else {
            tree.split_text(point.node, offset)?;
            (parent, index + 1)
        }
    } else {
        (point.node, point.offset.min(node.max_offset()))
    };

    while parent != container {
        let grandparent = tree.parent(parent)?;
        let position = tree.index_in_parent(parent)?;
        let count = tree.children(parent).len();
        index = if index == 0 {
            position
        } else if index >= count {
            position + 1
        } else {
            tree.split_element(parent, index)?;
            position + 1
        };
        parent = grandparent;
    }
    Some(index)
}
