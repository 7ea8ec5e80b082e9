use std::ops::Range;

use slotmap::{SlotMap, new_key_type};

use crate::document::tag::Tag;
use crate::editing::utf16;

new_key_type! {
    /// Handle to a node of an [`EditableDocument`](super::EditableDocument).
    ///
    /// Handles are generational: once a node is removed from the arena its
    /// id never resolves again, even after the slot is reused. This is what
    /// lets a selection that outlived a mutation be recognised as stale.
    pub struct NodeId;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// `None` for boolean attributes written without a value.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    pub attrs: Vec<Attribute>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Element {
        element: Element,
        children: Vec<NodeId>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) data: NodeData,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    pub fn text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }

    pub fn element(&self) -> Option<&Element> {
        match &self.data {
            NodeData::Element { element, .. } => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.element().map(|element| &element.tag)
    }

    /// Children in document order; always empty for text nodes.
    pub fn children(&self) -> &[NodeId] {
        match &self.data {
            NodeData::Element { children, .. } => children,
            NodeData::Text(_) => &[],
        }
    }

    /// Largest valid boundary offset inside this node: UTF-16 length for
    /// text, child count for elements.
    pub fn max_offset(&self) -> usize {
        match &self.data {
            NodeData::Text(text) => utf16::len(text),
            NodeData::Element { children, .. } => children.len(),
        }
    }
}

/// Arena-backed node store. Parent links are plain indices, so walking
/// upward never chases owning pointers.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tree {
    nodes: SlotMap<NodeId, Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_element(&mut self, element: Element) -> NodeId {
        self.nodes.insert(Node {
            parent: None,
            data: NodeData::Element {
                element,
                children: Vec::new(),
            },
        })
    }

    pub fn new_text(&mut self, text: impl Into<String>) -> NodeId {
        self.nodes.insert(Node {
            parent: None,
            data: NodeData::Text(text.into()),
        })
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(Node::children).unwrap_or(&[])
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).and_then(Node::text)
    }

    /// Appends to an existing text node. Returns false when `id` is not text.
    pub fn append_text(&mut self, id: NodeId, text: &str) -> bool {
        match self.nodes.get_mut(id).map(|node| &mut node.data) {
            Some(NodeData::Text(existing)) => {
                existing.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// Replaces the UTF-16 span `range` of a text node with `insert`.
    /// Returns false when `id` is not text.
    pub fn splice_text(&mut self, id: NodeId, range: Range<usize>, insert: &str) -> bool {
        match self.nodes.get_mut(id).map(|node| &mut node.data) {
            Some(NodeData::Text(text)) => {
                let start = utf16::byte_index(text, range.start);
                let end = utf16::byte_index(text, range.end).max(start);
                text.replace_range(start..end, insert);
                true
            }
            _ => false,
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    /// Inserts a detached node into `parent` at `index` (clamped).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let Some(NodeData::Element { children, .. }) =
            self.nodes.get_mut(parent).map(|node| &mut node.data)
        {
            let index = index.min(children.len());
            children.insert(index, child);
        } else {
            return;
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child);
    }

    /// Unlinks `id` from its parent and returns the index it occupied.
    pub fn detach(&mut self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        if let Some(NodeData::Element { children, .. }) =
            self.nodes.get_mut(parent).map(|node| &mut node.data)
        {
            children.remove(index);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
        Some(index)
    }

    /// Frees `id` and all of its descendants. The node should already be
    /// detached.
    pub fn remove_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(next) {
                pending.extend_from_slice(node.children());
            }
        }
    }

    /// Drops every node. Previously issued ids stay invalid.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Rendered text length of the subtree in UTF-16 code units.
    pub fn text_len(&self, id: NodeId) -> usize {
        match self.nodes.get(id).map(|node| &node.data) {
            Some(NodeData::Text(text)) => utf16::len(text),
            Some(NodeData::Element { children, .. }) => {
                children.iter().map(|child| self.text_len(*child)).sum()
            }
            None => 0,
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.nodes.get(id).map(|node| &node.data) {
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Element { children, .. }) => {
                for child in children {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    /// Splits a text node at a UTF-16 offset. The head stays in `id`; the
    /// tail becomes a new node inserted right after it.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let tail = match self.nodes.get_mut(id).map(|node| &mut node.data) {
            Some(NodeData::Text(text)) => {
                let byte = utf16::byte_index(text, offset);
                text.split_off(byte)
            }
            _ => return None,
        };
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        let tail = self.new_text(tail);
        self.insert_child(parent, index + 1, tail);
        Some(tail)
    }

    /// Splits an element before child `index`. Children from `index` on move
    /// into a shallow clone of the element inserted right after it.
    pub fn split_element(&mut self, id: NodeId, index: usize) -> Option<NodeId> {
        let (element, moved) = match self.nodes.get_mut(id).map(|node| &mut node.data) {
            Some(NodeData::Element { element, children }) => {
                let index = index.min(children.len());
                (element.clone(), children.split_off(index))
            }
            _ => return None,
        };
        let parent = self.parent(id)?;
        let position = self.index_in_parent(id)?;
        let clone = self.new_element(element);
        for child in moved {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = None;
            }
            self.append_child(clone, child);
        }
        self.insert_child(parent, position + 1, clone);
        Some(clone)
    }

    /// Collects `id` and its ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if !self.nodes.contains_key(node) {
                break;
            }
            chain.push(node);
            current = self.parent(node);
        }
        chain
    }
}
