use crate::document::{EditableDocument, NodeId, TreeId};
use crate::geometry::Point;

/// One end of a selection: a node plus an offset inside it.
///
/// For text nodes the offset counts UTF-16 code units; for elements it is a
/// child index, so `offset == children.len()` means "after the last child".
/// `tree` names the text tree the node belongs to, which lets a selection
/// made anywhere on the page be told apart from one inside the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    pub tree: TreeId,
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(tree: TreeId, node: NodeId, offset: usize) -> Self {
        Self { tree, node, offset }
    }
}

/// Which neighbour a flattened offset resolves to when it sits exactly on
/// the boundary between two text nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// End of the preceding text node.
    Backward,
    /// Start of the following text node.
    Forward,
}

/// A live selection as the host reports it. Anchor and focus are in
/// gesture order, not document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionRange {
    pub anchor: BoundaryPoint,
    pub focus: BoundaryPoint,
}

impl SelectionRange {
    pub fn new(anchor: BoundaryPoint, focus: BoundaryPoint) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: BoundaryPoint) -> Self {
        Self::new(point, point)
    }

    /// True when both ends are the same boundary point. A selection whose
    /// ends differ but enclose no text is not collapsed by this definition.
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Builds a forward selection from flattened text offsets, choosing the
    /// text nodes a user would expect: the start binds forward and the end
    /// binds backward, so selecting exactly the text of an inline element
    /// lands both ends inside it.
    pub fn from_offsets(document: &EditableDocument, start: usize, end: usize) -> Self {
        let (start, end) = (start.min(end), start.max(end));
        if start == end {
            return Self::collapsed(document.point_at_offset(start, Affinity::Forward));
        }
        Self::new(
            document.point_at_offset(start, Affinity::Forward),
            document.point_at_offset(end, Affinity::Backward),
        )
    }

    /// Selection covering every child of `node`.
    pub fn contents_of(document: &EditableDocument, node: NodeId) -> Self {
        let len = document.node(node).map(|n| n.max_offset()).unwrap_or(0);
        Self::new(
            BoundaryPoint::new(document.id(), node, 0),
            BoundaryPoint::new(document.id(), node, len),
        )
    }
}

/// Flattened plain-text offsets of a selection, in UTF-16 code units.
/// `start <= end`; `end` is exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextOffsets {
    pub start: usize,
    pub end: usize,
}

impl TextOffsets {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// What the toolbar needs to know about a qualifying selection. Derived on
/// every event and never kept across a document mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionState {
    pub offsets: TextOffsets,
    /// Where the toolbar is anchored, in surface coordinates.
    pub anchor: Point,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_offsets_normalize_order() {
        let offsets = TextOffsets::new(9, 4);
        assert_eq!(offsets, TextOffsets { start: 4, end: 9 });
        assert_eq!(offsets.len(), 5);
        assert!(!offsets.is_empty());
        assert!(TextOffsets::new(3, 3).is_empty());
    }

    #[test]
    fn test_from_offsets_binds_inside_inline_element() {
        let doc = EditableDocument::from_markup("The <em>quick</em> fox");
        let range = SelectionRange::from_offsets(&doc, 4, 9);

        let em_text = doc.children(doc.children(doc.root())[1])[0];
        assert_eq!(range.anchor.node, em_text);
        assert_eq!(range.anchor.offset, 0);
        assert_eq!(range.focus.node, em_text);
        assert_eq!(range.focus.offset, 5);
    }

    #[test]
    fn test_from_offsets_collapsed() {
        let doc = EditableDocument::from_markup("hello");
        let range = SelectionRange::from_offsets(&doc, 2, 2);
        assert!(range.is_collapsed());
    }

    #[test]
    fn test_contents_of_spans_all_children() {
        let doc = EditableDocument::from_markup("<p>a<br>b</p>");
        let p = doc.children(doc.root())[0];
        let range = SelectionRange::contents_of(&doc, p);
        assert_eq!(range.anchor.offset, 0);
        assert_eq!(range.focus.offset, 3);
    }
}
