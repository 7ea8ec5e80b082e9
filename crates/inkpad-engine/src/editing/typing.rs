//! Typing into the document: inserting text, deleting spans and breaking
//! blocks in two.
//!
//! Every edit first cuts the selected span out of each text node it touches
//! and then inserts at the start of the span. Text nodes and inline elements
//! left empty are dropped. Block elements stay, so an emptied paragraph can
//! still take the caret. Each edit is one mutation of the document.

use std::ops::Range;

use log::debug;

use crate::document::tree::Tree;
use crate::document::{EditableDocument, Element, Node, NodeId, Tag};
use crate::editing::EditError;
use crate::editing::offsets::{boundary_offset, ordered_points};
use crate::editing::selection::{Affinity, BoundaryPoint, SelectionRange};
use crate::editing::utf16;
use crate::editing::wrap::split_up_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDirection {
    /// Backspace: the character before a collapsed selection.
    Backward,
    /// Delete: the character after it.
    Forward,
}

/// One edit made at the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEdit<'a> {
    Insert(&'a str),
    Delete(DeleteDirection),
    /// Breaks the block around the caret in two.
    Paragraph,
}

/// Where inserted text lands.
#[derive(Debug, Clone, Copy)]
enum Target {
    /// Inside an existing text node, at a UTF-16 offset.
    Text(NodeId, usize),
    /// A new text node at a child index of an element.
    Slot(NodeId, usize),
}

/// A span to cut, resolved against the document before it changes.
#[derive(Debug)]
struct Cut {
    target: Target,
    spans: Vec<(NodeId, Range<usize>)>,
}

/// What lies past the edge of the block a collapsed delete starts in.
enum BlockEdge {
    /// The caret is not on the edge; an ordinary character goes.
    Inside,
    /// Nothing to join with.
    Closed,
    /// A void element such as `<hr>`, which is removed.
    Void(NodeId),
    /// The second block's children move into the first.
    Join(NodeId, NodeId),
}

/// Applies `edit` at `range` and returns the collapsed selection where the
/// caret ends up. `Ok(None)` means the edit had nothing to do and the
/// document is untouched.
pub fn apply(
    doc: &mut EditableDocument,
    range: &SelectionRange,
    edit: TextEdit<'_>,
) -> Result<Option<SelectionRange>, EditError> {
    match edit {
        TextEdit::Insert(text) => replace_range(doc, range, text),
        TextEdit::Delete(direction) => delete(doc, range, direction),
        TextEdit::Paragraph => insert_paragraph(doc, range).map(Some),
    }
}

/// Replaces the text selected by `range` with `text`. The caret lands right
/// after the inserted text.
pub fn replace_range(
    doc: &mut EditableDocument,
    range: &SelectionRange,
    text: &str,
) -> Result<Option<SelectionRange>, EditError> {
    let (start, span) = resolve(doc, range)?;
    if span.is_empty() && text.is_empty() {
        return Ok(None);
    }
    let cut = plan(doc, &start, span)?;
    Ok(Some(splice(doc, &cut, text)))
}

/// Deletes the selected text, or one character next to a collapsed
/// selection. At the edge of a block the neighbouring block is joined on
/// instead; at the edges of the document nothing happens.
pub fn delete(
    doc: &mut EditableDocument,
    range: &SelectionRange,
    direction: DeleteDirection,
) -> Result<Option<SelectionRange>, EditError> {
    let (start, span) = resolve(doc, range)?;
    if !span.is_empty() {
        let cut = plan(doc, &start, span)?;
        return Ok(Some(splice(doc, &cut, "")));
    }

    let tree_id = doc.id();
    match block_edge(doc, &start, span.start, direction)? {
        BlockEdge::Inside => {}
        BlockEdge::Closed => {
            debug!("delete {direction:?}: at the edge of a block, nothing to join");
            return Ok(None);
        }
        BlockEdge::Void(node) => {
            doc.mutate(|tree, _| {
                tree.detach(node);
                tree.remove_subtree(node);
            });
            return Ok(Some(SelectionRange::collapsed(start)));
        }
        BlockEdge::Join(first, second) => {
            let (node, offset) = doc.mutate(|tree, _| join_blocks(tree, first, second));
            debug!("joined blocks");
            return Ok(Some(SelectionRange::collapsed(BoundaryPoint::new(
                tree_id, node, offset,
            ))));
        }
    }

    let text = doc.plain_text();
    let byte = utf16::byte_index(text, span.start);
    let neighbour = match direction {
        DeleteDirection::Backward => text[..byte]
            .chars()
            .next_back()
            .map(|ch| span.start - ch.len_utf16()..span.start),
        DeleteDirection::Forward => text[byte..]
            .chars()
            .next()
            .map(|ch| span.start..span.start + ch.len_utf16()),
    };
    let Some(neighbour) = neighbour else {
        debug!("delete {direction:?}: at the edge of the document");
        return Ok(None);
    };
    let start = match direction {
        DeleteDirection::Backward => doc.point_at_offset(neighbour.start, Affinity::Forward),
        DeleteDirection::Forward => start,
    };
    let cut = plan(doc, &start, neighbour)?;
    Ok(Some(splice(doc, &cut, "")))
}

/// Deletes the selection and then splits the block holding the caret. Text
/// sitting directly under the root is first gathered into a paragraph. The
/// caret lands at the start of the second block.
pub fn insert_paragraph(
    doc: &mut EditableDocument,
    range: &SelectionRange,
) -> Result<SelectionRange, EditError> {
    let (start, span) = resolve(doc, range)?;
    let cut = plan(doc, &start, span)?;
    let tree_id = doc.id();
    let caret = doc.mutate(|tree, root| {
        let (node, offset) = cut_and_insert(tree, &cut, "");
        break_block(tree, root, BoundaryPoint::new(tree_id, node, offset))
    });
    let (node, offset) = caret.ok_or(EditError::StaleSelection)?;
    debug!("split block");
    Ok(SelectionRange::collapsed(BoundaryPoint::new(
        tree_id, node, offset,
    )))
}

/// Start point and flattened span of `range`, with both ends moved off the
/// middle of a surrogate pair.
fn resolve(
    doc: &EditableDocument,
    range: &SelectionRange,
) -> Result<(BoundaryPoint, Range<usize>), EditError> {
    let (start, end) = ordered_points(doc, range)?;
    let from = snap(doc, boundary_offset(doc, &start)?);
    let to = snap(doc, boundary_offset(doc, &end)?);
    Ok((start, from..to.max(from)))
}

fn snap(doc: &EditableDocument, offset: usize) -> usize {
    let text = doc.plain_text();
    utf16::offset_of_byte(text, utf16::byte_index(text, offset))
}

fn plan(
    doc: &EditableDocument,
    start: &BoundaryPoint,
    span: Range<usize>,
) -> Result<Cut, EditError> {
    let target = insertion_target(doc, start).ok_or(EditError::StaleSelection)?;
    let spans = doc
        .text_runs()
        .into_iter()
        .filter(|run| run.range.start < span.end && run.range.end > span.start)
        .map(|run| {
            let from = span.start.max(run.range.start) - run.range.start;
            let to = span.end.min(run.range.end) - run.range.start;
            (run.node, from..to)
        })
        .collect();
    Ok(Cut { target, spans })
}

/// Where text typed at `point` goes. Element points prefer the text node
/// just before them, then descend into what follows, so typing next to
/// existing text extends it rather than adding a sibling.
fn insertion_target(doc: &EditableDocument, point: &BoundaryPoint) -> Option<Target> {
    let node = doc.node(point.node)?;
    if let Some(text) = node.text() {
        let local = utf16::offset_of_byte(text, utf16::byte_index(text, point.offset));
        return Some(Target::Text(point.node, local));
    }

    let (mut parent, mut index) = (point.node, point.offset.min(node.max_offset()));
    loop {
        let children = doc.children(parent);
        if let Some(before) = index.checked_sub(1).and_then(|i| children.get(i))
            && doc.node(*before).is_some_and(Node::is_text)
        {
            return Some(Target::Text(*before, doc.text_len_of(*before)));
        }
        let next = children.get(index).copied();
        match next.and_then(|id| doc.node(id)) {
            Some(node) if node.is_text() => return next.map(|id| Target::Text(id, 0)),
            Some(node) if node.tag().is_some_and(|tag| !tag.is_void()) => {
                parent = next?;
                index = 0;
            }
            _ => return Some(Target::Slot(parent, index)),
        }
    }
}

fn splice(doc: &mut EditableDocument, cut: &Cut, text: &str) -> SelectionRange {
    let tree_id = doc.id();
    let (node, offset) = doc.mutate(|tree, _| cut_and_insert(tree, cut, text));
    debug!(
        "replaced {} text span(s) with {} characters",
        cut.spans.len(),
        utf16::len(text)
    );
    SelectionRange::collapsed(BoundaryPoint::new(tree_id, node, offset))
}

/// Cuts every span, inserts `text` at the target and prunes what the cut
/// emptied. Returns the caret.
fn cut_and_insert(tree: &mut Tree, cut: &Cut, text: &str) -> (NodeId, usize) {
    for (node, span) in &cut.spans {
        tree.splice_text(*node, span.clone(), "");
    }

    let inserted = utf16::len(text);
    let (anchor, caret) = match cut.target {
        Target::Text(node, local) => {
            tree.splice_text(node, local..local, text);
            (node, (node, local + inserted))
        }
        Target::Slot(parent, index) if !text.is_empty() => {
            let node = tree.new_text(text);
            tree.insert_child(parent, index, node);
            (node, (node, inserted))
        }
        Target::Slot(parent, index) => (parent, (parent, index)),
    };

    let keep = tree.ancestors(anchor);
    for (node, _) in &cut.spans {
        if *node != anchor {
            prune(tree, *node, &keep);
        }
    }

    // A caret left in an emptied text node moves to where the node was
    if tree.text(anchor).is_some_and(str::is_empty) {
        return match prune(tree, anchor, &[]) {
            Some((parent, index)) => join_text(tree, parent, index),
            None => caret,
        };
    }
    match cut.target {
        Target::Slot(parent, index) if inserted == 0 => {
            let index = index.min(tree.children(parent).len());
            join_text(tree, parent, index)
        }
        _ => caret,
    }
}

/// Removes `node` when it is an empty text node, then every inline ancestor
/// it leaves without children. Blocks and anything in `keep` stay. Returns
/// where the highest removed node used to sit.
fn prune(tree: &mut Tree, node: NodeId, keep: &[NodeId]) -> Option<(NodeId, usize)> {
    if !tree.text(node).is_some_and(str::is_empty) {
        return None;
    }
    let mut removed = None;
    let mut current = node;
    while let Some(parent) = tree.parent(current) {
        let Some(index) = tree.detach(current) else {
            break;
        };
        tree.remove_subtree(current);
        removed = Some((parent, index));

        let emptied_inline = tree.children(parent).is_empty()
            && !keep.contains(&parent)
            && tree
                .get(parent)
                .and_then(Node::tag)
                .is_some_and(|tag| !tag.is_block());
        if !emptied_inline {
            break;
        }
        current = parent;
    }
    removed
}

/// Merges the text nodes on either side of child `index`, if both are text.
/// Returns the caret at the joint.
fn join_text(tree: &mut Tree, parent: NodeId, index: usize) -> (NodeId, usize) {
    let before = index
        .checked_sub(1)
        .and_then(|i| tree.children(parent).get(i).copied());
    let after = tree.children(parent).get(index).copied();
    if let (Some(before), Some(after)) = (before, after)
        && let (Some(head), Some(tail)) = (tree.text(before), tree.text(after))
    {
        let joint = utf16::len(head);
        let tail = tail.to_string();
        tree.append_text(before, &tail);
        tree.detach(after);
        tree.remove_subtree(after);
        return (before, joint);
    }
    (parent, index)
}

fn is_block(tree: &Tree, id: NodeId) -> bool {
    tree.get(id).and_then(Node::tag).is_some_and(Tag::is_block)
}

/// Nearest block at or above `node`, below the root.
fn enclosing_block(doc: &EditableDocument, node: NodeId) -> Option<NodeId> {
    doc.ancestors(node)
        .into_iter()
        .take_while(|id| *id != doc.root())
        .find(|id| doc.node(*id).and_then(Node::tag).is_some_and(Tag::is_block))
}

fn block_edge(
    doc: &EditableDocument,
    point: &BoundaryPoint,
    offset: usize,
    direction: DeleteDirection,
) -> Result<BlockEdge, EditError> {
    let Some(block) = enclosing_block(doc, point.node) else {
        return Ok(BlockEdge::Inside);
    };
    let parent = doc.parent(block).ok_or(EditError::StaleSelection)?;
    let position = doc.index_in_parent(block).ok_or(EditError::StaleSelection)?;
    let siblings = doc.children(parent);
    let (edge, neighbour) = match direction {
        DeleteDirection::Backward => (
            0,
            position.checked_sub(1).and_then(|i| siblings.get(i)).copied(),
        ),
        DeleteDirection::Forward => (
            doc.children(block).len(),
            siblings.get(position + 1).copied(),
        ),
    };
    if boundary_offset(doc, &BoundaryPoint::new(doc.id(), block, edge))? != offset {
        return Ok(BlockEdge::Inside);
    }

    let Some(neighbour) = neighbour else {
        return Ok(BlockEdge::Closed);
    };
    let Some(tag) = doc.node(neighbour).and_then(Node::tag) else {
        return Ok(BlockEdge::Inside);
    };
    Ok(if tag.is_void() {
        BlockEdge::Void(neighbour)
    } else if !tag.is_block() {
        BlockEdge::Inside
    } else if direction == DeleteDirection::Backward {
        BlockEdge::Join(neighbour, block)
    } else {
        BlockEdge::Join(block, neighbour)
    })
}

/// Moves the children of `second` to the end of `first` and drops `second`.
fn join_blocks(tree: &mut Tree, first: NodeId, second: NodeId) -> (NodeId, usize) {
    let joint = tree.children(first).len();
    for child in tree.children(second).to_vec() {
        tree.detach(child);
        tree.append_child(first, child);
    }
    tree.detach(second);
    tree.remove_subtree(second);
    join_text(tree, first, joint)
}

fn break_block(tree: &mut Tree, root: NodeId, point: BoundaryPoint) -> Option<(NodeId, usize)> {
    let enclosing = tree
        .ancestors(point.node)
        .into_iter()
        .take_while(|id| *id != root)
        .find(|id| is_block(tree, *id));
    let (block, point) = match enclosing {
        Some(block) => (block, point),
        None => {
            let (paragraph, point) = gather_paragraph(tree, root, point)?;
            if tree.children(paragraph).is_empty() {
                // The new paragraph already is the break
                return Some((paragraph, 0));
            }
            (paragraph, point)
        }
    };

    let container = tree.parent(block)?;
    let position = tree.index_in_parent(block)?;
    let count = tree.children(container).len();
    let element = tree.get(block)?.element()?.clone();
    let index = split_up_to(tree, container, &point)?;

    if index == position {
        let fresh = tree.new_element(element);
        tree.insert_child(container, position, fresh);
        Some((block, 0))
    } else if tree.children(container).len() == count {
        let fresh = tree.new_element(element);
        tree.insert_child(container, position + 1, fresh);
        Some((fresh, 0))
    } else {
        tree.children(container).get(index).map(|fresh| (*fresh, 0))
    }
}

/// Wraps the run of non-block root children around `point` in a new `<p>`.
fn gather_paragraph(
    tree: &mut Tree,
    root: NodeId,
    point: BoundaryPoint,
) -> Option<(NodeId, BoundaryPoint)> {
    let children = tree.children(root).to_vec();
    let (mut lo, mut hi) = if point.node == root {
        let index = point.offset.min(children.len());
        (index, index)
    } else {
        let top = tree
            .ancestors(point.node)
            .into_iter()
            .find(|id| tree.parent(*id) == Some(root))?;
        let index = tree.index_in_parent(top)?;
        (index, index + 1)
    };
    while lo > 0 && !is_block(tree, children[lo - 1]) {
        lo -= 1;
    }
    while hi < children.len() && !is_block(tree, children[hi]) {
        hi += 1;
    }

    let paragraph = tree.new_element(Element::new(Tag::P));
    for child in &children[lo..hi] {
        tree.detach(*child);
        tree.append_child(paragraph, *child);
    }
    tree.insert_child(root, lo, paragraph);

    let point = if point.node == root {
        BoundaryPoint::new(point.tree, paragraph, point.offset - lo)
    } else {
        point
    };
    Some((paragraph, point))
}
