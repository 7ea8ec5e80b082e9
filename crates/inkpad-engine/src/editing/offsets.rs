//! Maps selection boundary points to offsets into the flattened plain text.
//!
//! The offset of a boundary is the rendered text length between the start of
//! the document and that boundary. Both ends of a selection are measured
//! independently and then ordered, because a selection made right-to-left
//! reports its focus before its anchor.

use std::cmp::Ordering;

use crate::document::{EditableDocument, NodeId};
use crate::editing::EditError;
use crate::editing::selection::{BoundaryPoint, SelectionRange, TextOffsets};
use crate::editing::utf16;

/// Checks that `point` belongs to this document, still hangs off its root
/// and carries an offset within its node.
pub fn validate_point(doc: &EditableDocument, point: &BoundaryPoint) -> Result<(), EditError> {
    if point.tree != doc.id() || !doc.is_attached(point.node) {
        return Err(EditError::StaleSelection);
    }
    match doc.node(point.node) {
        Some(node) if point.offset <= node.max_offset() => Ok(()),
        _ => Err(EditError::StaleSelection),
    }
}

/// Flattened text offset of a single boundary point.
pub fn boundary_offset(doc: &EditableDocument, point: &BoundaryPoint) -> Result<usize, EditError> {
    validate_point(doc, point)?;

    let Some(node) = doc.node(point.node) else {
        return Err(EditError::StaleSelection);
    };
    let inside = if node.is_text() {
        point.offset
    } else {
        node.children()[..point.offset]
            .iter()
            .map(|child| doc.text_len_of(*child))
            .sum()
    };
    Ok(inside + text_before(doc, point.node))
}

/// Text length of everything that precedes `node` in document order,
/// excluding its own contents.
fn text_before(doc: &EditableDocument, node: NodeId) -> usize {
    let mut total = 0;
    let mut current = node;
    while let Some(parent) = doc.parent(current) {
        for sibling in doc.children(parent) {
            if *sibling == current {
                break;
            }
            total += doc.text_len_of(*sibling);
        }
        current = parent;
    }
    total
}

/// Offsets of `range`, ordered so that `start <= end`.
///
/// Returns `None` when either end is outside the document or no longer
/// attached to it. A collapsed range maps to `start == end`.
pub fn compute_offsets(doc: &EditableDocument, range: &SelectionRange) -> Option<TextOffsets> {
    let anchor = boundary_offset(doc, &range.anchor).ok()?;
    let focus = boundary_offset(doc, &range.focus).ok()?;
    Some(TextOffsets::new(anchor, focus))
}

/// Child-index path from the root to `point`, with the point's own offset as
/// the last step. Comparing two paths lexicographically orders the points
/// the way a DOM range does.
fn path_to(doc: &EditableDocument, point: &BoundaryPoint) -> Vec<usize> {
    let mut path: Vec<usize> = doc
        .ancestors(point.node)
        .iter()
        .filter_map(|id| doc.index_in_parent(*id))
        .collect();
    path.reverse();
    path.push(point.offset);
    path
}

/// Document-order comparison of two boundary points. `None` when either
/// point is not valid in `doc`.
pub fn compare_points(
    doc: &EditableDocument,
    a: &BoundaryPoint,
    b: &BoundaryPoint,
) -> Option<Ordering> {
    validate_point(doc, a).ok()?;
    validate_point(doc, b).ok()?;
    Some(path_to(doc, a).cmp(&path_to(doc, b)))
}

/// The two ends of `range` in document order.
pub fn ordered_points(
    doc: &EditableDocument,
    range: &SelectionRange,
) -> Result<(BoundaryPoint, BoundaryPoint), EditError> {
    match compare_points(doc, &range.anchor, &range.focus) {
        Some(Ordering::Greater) => Ok((range.focus, range.anchor)),
        Some(_) => Ok((range.anchor, range.focus)),
        None => Err(EditError::StaleSelection),
    }
}

/// Deepest node containing both `a` and `b`, inclusive.
pub fn common_ancestor(doc: &EditableDocument, a: NodeId, b: NodeId) -> Option<NodeId> {
    let of_b = doc.ancestors(b);
    doc.ancestors(a)
        .into_iter()
        .find(|candidate| of_b.contains(candidate))
}

/// Plain text covered by `range`.
pub fn selected_text(doc: &EditableDocument, range: &SelectionRange) -> Option<String> {
    let offsets = compute_offsets(doc, range)?;
    Some(utf16::slice(doc.plain_text(), offsets.start, offsets.end).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::selection::Affinity;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn point(doc: &EditableDocument, node: NodeId, offset: usize) -> BoundaryPoint {
        BoundaryPoint::new(doc.id(), node, offset)
    }

    #[test]
    fn test_offsets_inside_single_text_node() {
        // Given
        let doc = EditableDocument::from_markup("hello world");
        let text = doc.text_nodes()[0];

        // When
        let offsets = compute_offsets(
            &doc,
            &SelectionRange::new(point(&doc, text, 6), point(&doc, text, 11)),
        );

        // Then
        assert_eq!(offsets, Some(TextOffsets { start: 6, end: 11 }));
    }

    #[test]
    fn test_backward_selection_is_normalized() {
        let doc = EditableDocument::from_markup("<p>The <em>quick</em> fox</p>");
        let texts = doc.text_nodes();

        let range = SelectionRange::new(point(&doc, texts[2], 2), point(&doc, texts[0], 1));

        assert_eq!(compute_offsets(&doc, &range), Some(TextOffsets::new(1, 11)));
        let (start, end) = ordered_points(&doc, &range).unwrap();
        assert_eq!(start.node, texts[0]);
        assert_eq!(end.node, texts[2]);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 4)]
    #[case(2, 9)]
    #[case(3, 13)]
    fn test_element_boundaries_count_preceding_children(
        #[case] child_index: usize,
        #[case] expected: usize,
    ) {
        let doc = EditableDocument::from_markup("<p>The <em>quick</em> fox</p>");
        let p = doc.children(doc.root())[0];

        let offset = boundary_offset(&doc, &point(&doc, p, child_index)).unwrap();

        assert_eq!(offset, expected);
    }

    #[test]
    fn test_offsets_count_utf16_units() {
        let doc = EditableDocument::from_markup("😀 <strong>안녕</strong>");
        let texts = doc.text_nodes();

        let range = SelectionRange::new(point(&doc, texts[1], 0), point(&doc, texts[1], 2));

        assert_eq!(compute_offsets(&doc, &range), Some(TextOffsets::new(3, 5)));
        assert_eq!(selected_text(&doc, &range).as_deref(), Some("안녕"));
    }

    #[test]
    fn test_point_from_other_document_is_rejected() {
        let doc = EditableDocument::from_markup("inside");
        let other = EditableDocument::from_markup("outside");
        let foreign = other.text_nodes()[0];

        let range = SelectionRange::new(
            BoundaryPoint::new(other.id(), foreign, 0),
            BoundaryPoint::new(other.id(), foreign, 3),
        );

        assert_eq!(compute_offsets(&doc, &range), None);
    }

    #[test]
    fn test_offset_past_node_end_is_stale() {
        let doc = EditableDocument::from_markup("abc");
        let text = doc.text_nodes()[0];

        assert_eq!(
            boundary_offset(&doc, &point(&doc, text, 4)),
            Err(EditError::StaleSelection)
        );
    }

    #[test]
    fn test_collapsed_range_maps_to_empty_offsets() {
        let doc = EditableDocument::from_markup("abc");
        let range = SelectionRange::collapsed(doc.point_at_offset(2, Affinity::Forward));

        let offsets = compute_offsets(&doc, &range).unwrap();

        assert!(offsets.is_empty());
        assert_eq!(offsets.start, 2);
    }

    #[test]
    fn test_compare_element_point_with_descendant() {
        let doc = EditableDocument::from_markup("<p>a<em>b</em>c</p>");
        let p = doc.children(doc.root())[0];
        let em_text = doc.text_nodes()[1];

        // Gap before <em> precedes anything inside it; gap after it follows
        let before_em = point(&doc, p, 1);
        let after_em = point(&doc, p, 2);
        let inside = point(&doc, em_text, 0);

        assert_eq!(compare_points(&doc, &before_em, &inside), Some(Ordering::Less));
        assert_eq!(compare_points(&doc, &after_em, &inside), Some(Ordering::Greater));
        assert_eq!(compare_points(&doc, &inside, &inside), Some(Ordering::Equal));
    }

    #[test]
    fn test_common_ancestor() {
        let doc = EditableDocument::from_markup("<p>a<em>b</em></p><p>c</p>");
        let texts = doc.text_nodes();
        let first_p = doc.children(doc.root())[0];

        assert_eq!(common_ancestor(&doc, texts[0], texts[1]), Some(first_p));
        assert_eq!(common_ancestor(&doc, texts[0], texts[2]), Some(doc.root()));
        assert_eq!(common_ancestor(&doc, texts[1], texts[1]), Some(texts[1]));
    }
}
