//! The styled-text tree owned by an editable surface.
//!
//! An [`EditableDocument`] is an arena of element and text nodes under a
//! synthetic root. Its flattened plain text is the concatenation of every
//! text node in document order; markup boundaries and void elements such as
//! `<br>` contribute nothing to it.

pub mod markup;
pub mod tag;
pub mod tree;

use std::cell::OnceCell;
use std::fmt::Write as _;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

pub use tag::Tag;
pub use tree::{Attribute, Element, Node, NodeData, NodeId};

use crate::editing::selection::{Affinity, BoundaryPoint};
use crate::editing::utf16;
use tree::Tree;

/// Identity of one text tree. Replacing a document's content issues a new
/// id, so selections taken before the replacement no longer match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u64);

impl TreeId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TreeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A run of text with the elements enclosing it, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub node: NodeId,
    /// Flattened offsets covered by the run (UTF-16 code units).
    pub range: Range<usize>,
    pub text: String,
    pub tags: Vec<Tag>,
}

impl TextRun {
    pub fn has(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }
}

pub struct EditableDocument {
    id: TreeId,
    tree: Tree,
    root: NodeId,
    plain_text: OnceCell<String>,
    version: u64,
}

impl EditableDocument {
    /// Parses `markup` into a fresh tree. The markup is opaque input: it is
    /// never rejected.
    pub fn from_markup(markup: &str) -> Self {
        let mut tree = Tree::new();
        let root = tree.new_element(Element::new(Tag::Root));
        markup::parse_into(&mut tree, root, markup);
        Self {
            id: TreeId::next(),
            tree,
            root,
            plain_text: OnceCell::new(),
            version: 0,
        }
    }

    pub fn empty() -> Self {
        Self::from_markup("")
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Incremented once per mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn to_markup(&self) -> String {
        markup::serialize(&self.tree, self.root)
    }

    /// Flattened plain text, computed on first use after each mutation.
    pub fn plain_text(&self) -> &str {
        self.plain_text
            .get_or_init(|| self.tree.text_content(self.root))
    }

    /// Length of the flattened text in UTF-16 code units.
    pub fn text_len(&self) -> usize {
        utf16::len(self.plain_text())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.tree.get(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.parent(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.tree.children(id)
    }

    pub fn text_content(&self, id: NodeId) -> String {
        self.tree.text_content(id)
    }

    pub(crate) fn text_len_of(&self, id: NodeId) -> usize {
        self.tree.text_len(id)
    }

    pub(crate) fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        self.tree.index_in_parent(id)
    }

    /// `id` and its ancestors up to the root, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        self.tree.ancestors(id)
    }

    /// True when `id` still exists and hangs off this document's root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.tree.ancestors(id).last() == Some(&self.root)
    }

    /// Inclusive descendant test.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.tree.ancestors(node).contains(&ancestor)
    }

    /// Text nodes in document order.
    pub fn text_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match self.tree.get(id).map(Node::data) {
                Some(NodeData::Text(_)) => out.push(id),
                Some(NodeData::Element { children, .. }) => {
                    stack.extend(children.iter().rev().copied());
                }
                None => {}
            }
        }
        out
    }

    /// Resolves a flattened offset to a point inside a text node.
    ///
    /// Offsets past the end clamp to the end of the last text node. A
    /// document without text resolves to the start of the root.
    pub fn point_at_offset(&self, offset: usize, affinity: Affinity) -> BoundaryPoint {
        let mut consumed = 0;
        let mut last = None;
        for id in self.text_nodes() {
            let len = self.tree.text_len(id);
            let end = consumed + len;
            let hit = match affinity {
                Affinity::Forward => offset < end || (offset == end && len == 0),
                Affinity::Backward => offset <= end && (offset > consumed || len == 0),
            };
            if hit || (affinity == Affinity::Backward && offset == 0 && consumed == 0) {
                return BoundaryPoint::new(self.id, id, offset - consumed);
            }
            consumed = end;
            last = Some((id, len));
        }
        match last {
            Some((id, len)) => BoundaryPoint::new(self.id, id, len),
            None => BoundaryPoint::new(self.id, self.root, 0),
        }
    }

    /// Styled runs for presentation layers, one per non-empty text node.
    pub fn text_runs(&self) -> Vec<TextRun> {
        let mut runs = Vec::new();
        let mut consumed = 0;
        for id in self.text_nodes() {
            let Some(text) = self.tree.text(id) else {
                continue;
            };
            let len = utf16::len(text);
            if len == 0 {
                continue;
            }
            let mut tags: Vec<Tag> = self
                .tree
                .ancestors(id)
                .into_iter()
                .skip(1)
                .filter(|ancestor| *ancestor != self.root)
                .filter_map(|ancestor| self.tree.get(ancestor).and_then(Node::tag).cloned())
                .collect();
            tags.reverse();
            runs.push(TextRun {
                node: id,
                range: consumed..consumed + len,
                text: text.to_string(),
                tags,
            });
            consumed += len;
        }
        runs
    }

    /// Indented dump of the tree, one node per line. Text nodes are shown
    /// quoted; the root is omitted.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for child in self.tree.children(self.root) {
            self.write_outline(*child, 0, &mut out);
        }
        out
    }

    fn write_outline(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        match node.data() {
            NodeData::Text(text) => {
                let _ = writeln!(out, "{indent}{text:?}");
            }
            NodeData::Element { element, children } => {
                let _ = writeln!(out, "{indent}<{}>", element.tag);
                for child in children {
                    self.write_outline(*child, depth + 1, out);
                }
            }
        }
    }

    /// Runs a structural edit and records it as one mutation.
    pub(crate) fn mutate<R>(&mut self, edit: impl FnOnce(&mut Tree, NodeId) -> R) -> R {
        let result = edit(&mut self.tree, self.root);
        self.touch();
        result
    }

    /// Replaces the whole tree. Every previously issued node id and the
    /// tree id are invalidated.
    pub(crate) fn replace(&mut self, markup: &str) {
        self.tree.clear();
        self.root = self.tree.new_element(Element::new(Tag::Root));
        markup::parse_into(&mut self.tree, self.root, markup);
        self.id = TreeId::next();
        self.touch();
    }

    fn touch(&mut self) {
        self.plain_text = OnceCell::new();
        self.version += 1;
    }
}

impl std::fmt::Debug for EditableDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditableDocument")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("markup", &self.to_markup())
            .finish()
    }
}
