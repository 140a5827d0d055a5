use bitflags::bitflags;

use crate::document::Document;
use crate::node::{Node, NodeData};

/// Depth-first pre-order iterator over a subtree's node ids
pub(crate) struct TreeTraverser<'a> {
    doc: &'a Document,
    stack: Vec<usize>,
}

impl<'a> TreeTraverser<'a> {
    pub(crate) fn new(doc: &'a Document, root_id: usize) -> Self {
        let stack = if doc.get_node(root_id).is_some() {
            vec![root_id]
        } else {
            Vec::new()
        };
        Self { doc, stack }
    }
}

impl Iterator for TreeTraverser<'_> {
    type Item = usize;
    fn next(&mut self) -> Option<usize> {
        let id = self.stack.pop()?;
        let node = self.doc.get_node(id)?;
        self.stack.extend(node.children.iter().rev());
        Some(id)
    }
}

bitflags! {
    /// Bitmask of node types a cursor will consider, using the DOM's
    /// `NodeFilter.SHOW_*` numbering
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WhatToShow: u32 {
        const ELEMENT = 1 << 0;
        const ATTRIBUTE = 1 << 1;
        const TEXT = 1 << 2;
        const COMMENT = 1 << 7;
        const DOCUMENT = 1 << 8;
        const DOCUMENT_FRAGMENT = 1 << 10;
        const ALL = 0xFFFF_FFFF;
    }
}

impl WhatToShow {
    /// The `SHOW_*` bit for a node.
    ///
    /// Attributes are not nodes in this tree (they live in the element's
    /// attribute store), so the ATTRIBUTE bit never matches anything.
    pub fn bit_for(node: &Node) -> WhatToShow {
        match node.data {
            NodeData::Document => WhatToShow::DOCUMENT,
            NodeData::DocumentFragment => WhatToShow::DOCUMENT_FRAGMENT,
            NodeData::Element(_) => WhatToShow::ELEMENT,
            NodeData::Text(_) => WhatToShow::TEXT,
            NodeData::Comment(_) => WhatToShow::COMMENT,
        }
    }
}

/// Verdict of a traversal filter for a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// Include the node
    Accept,
    /// Exclude the node. A [`TreeWalker`] also prunes its whole subtree;
    /// a [`NodeIterator`] treats this identically to [`FilterResult::Skip`].
    Reject,
    /// Exclude the node but still consider its descendants
    Skip,
}

/// A user-supplied per-node traversal filter
pub type NodeFilter = Box<dyn Fn(&Node) -> FilterResult>;

/// A cursor positioned *on* a node, navigating a filtered view of a subtree.
///
/// The walker holds node ids only and borrows the document per call, so it
/// stays valid across mutations: a move from a node that has since been
/// detached or freed simply finds nothing in that direction.
///
/// The current node is allowed to be a node the filter would not accept
/// (including the root itself); filtering applies to where the cursor can
/// move, not where it is.
pub struct TreeWalker {
    root: usize,
    current: usize,
    what_to_show: WhatToShow,
    filter: Option<NodeFilter>,
}

impl TreeWalker {
    pub fn new(root: usize, what_to_show: WhatToShow, filter: Option<NodeFilter>) -> Self {
        Self {
            root,
            current: root,
            what_to_show,
            filter,
        }
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn current_node(&self) -> usize {
        self.current
    }

    /// Reposition the cursor. The new node may be anywhere, even outside
    /// the root's subtree; subsequent moves are still clipped to the root.
    pub fn set_current_node(&mut self, node_id: usize) {
        self.current = node_id;
    }

    fn verdict(&self, doc: &Document, node_id: usize) -> FilterResult {
        let Some(node) = doc.get_node(node_id) else {
            return FilterResult::Reject;
        };
        if !self.what_to_show.intersects(WhatToShow::bit_for(node)) {
            return FilterResult::Skip;
        }
        match &self.filter {
            Some(filter) => filter(node),
            None => FilterResult::Accept,
        }
    }

    /// Move to the nearest accepted ancestor, stopping at the root
    pub fn parent_node(&mut self, doc: &Document) -> Option<usize> {
        let mut id = self.current;
        while id != self.root {
            id = doc.get_node(id)?.parent?;
            if self.verdict(doc, id) == FilterResult::Accept {
                self.current = id;
                return Some(id);
            }
        }
        None
    }

    pub fn first_child(&mut self, doc: &Document) -> Option<usize> {
        self.traverse_children(doc, false)
    }

    pub fn last_child(&mut self, doc: &Document) -> Option<usize> {
        self.traverse_children(doc, true)
    }

    fn traverse_children(&mut self, doc: &Document, reversed: bool) -> Option<usize> {
        let mut node_id = self.child_of(doc, self.current, reversed)?;
        loop {
            match self.verdict(doc, node_id) {
                FilterResult::Accept => {
                    self.current = node_id;
                    return Some(node_id);
                }
                // Skipped nodes are transparent: descend into them
                FilterResult::Skip => {
                    if let Some(child) = self.child_of(doc, node_id, reversed) {
                        node_id = child;
                        continue;
                    }
                }
                FilterResult::Reject => {}
            }
            // Walk to the next candidate, climbing back out of skipped
            // nodes but never above the original cursor position
            loop {
                if let Some(sibling) = self.sibling_of(doc, node_id, reversed) {
                    node_id = sibling;
                    break;
                }
                let parent = doc.get_node(node_id)?.parent?;
                if parent == self.current || parent == self.root {
                    return None;
                }
                node_id = parent;
            }
        }
    }

    pub fn next_sibling(&mut self, doc: &Document) -> Option<usize> {
        self.traverse_siblings(doc, false)
    }

    pub fn previous_sibling(&mut self, doc: &Document) -> Option<usize> {
        self.traverse_siblings(doc, true)
    }

    fn traverse_siblings(&mut self, doc: &Document, reversed: bool) -> Option<usize> {
        if self.current == self.root {
            return None;
        }
        let mut node_id = self.current;
        loop {
            let mut sibling = self.sibling_of(doc, node_id, reversed);
            while let Some(sibling_id) = sibling {
                match self.verdict(doc, sibling_id) {
                    FilterResult::Accept => {
                        self.current = sibling_id;
                        return Some(sibling_id);
                    }
                    FilterResult::Skip => {
                        // A skipped sibling's children are candidates
                        if let Some(child) = self.child_of(doc, sibling_id, reversed) {
                            sibling = Some(child);
                            continue;
                        }
                    }
                    FilterResult::Reject => {}
                }
                sibling = self.sibling_of(doc, sibling_id, reversed);
            }
            let parent = doc.get_node(node_id)?.parent?;
            if parent == self.root {
                return None;
            }
            if self.verdict(doc, parent) == FilterResult::Accept {
                return None;
            }
            node_id = parent;
        }
    }

    /// Move to the next accepted node in document order, clipped to the
    /// root's subtree. Rejected nodes hide their whole subtree.
    pub fn next_node(&mut self, doc: &Document) -> Option<usize> {
        let mut node_id = self.current;
        let mut verdict = FilterResult::Accept;
        loop {
            while verdict != FilterResult::Reject {
                let Some(child) = self.child_of(doc, node_id, false) else {
                    break;
                };
                node_id = child;
                verdict = self.verdict(doc, node_id);
                if verdict == FilterResult::Accept {
                    self.current = node_id;
                    return Some(node_id);
                }
            }
            // No usable descendant: move to the following node
            node_id = self.following(doc, node_id)?;
            verdict = self.verdict(doc, node_id);
            if verdict == FilterResult::Accept {
                self.current = node_id;
                return Some(node_id);
            }
        }
    }

    /// Move to the previous accepted node in document order. The root
    /// itself is never returned.
    pub fn previous_node(&mut self, doc: &Document) -> Option<usize> {
        let mut node_id = self.current;
        while node_id != self.root {
            let mut sibling = self.sibling_of(doc, node_id, true);
            while let Some(sibling_id) = sibling {
                node_id = sibling_id;
                let mut verdict = self.verdict(doc, node_id);
                // The previous node in document order is the deepest last
                // descendant of the previous sibling, unless pruned
                while verdict != FilterResult::Reject {
                    let Some(child) = self.child_of(doc, node_id, true) else {
                        break;
                    };
                    node_id = child;
                    verdict = self.verdict(doc, node_id);
                }
                if verdict == FilterResult::Accept {
                    self.current = node_id;
                    return Some(node_id);
                }
                sibling = self.sibling_of(doc, node_id, true);
            }
            node_id = doc.get_node(node_id)?.parent?;
            if node_id == self.root {
                return None;
            }
            if self.verdict(doc, node_id) == FilterResult::Accept {
                self.current = node_id;
                return Some(node_id);
            }
        }
        None
    }

    fn child_of(&self, doc: &Document, node_id: usize, reversed: bool) -> Option<usize> {
        let children = &doc.get_node(node_id)?.children;
        if reversed {
            children.last().copied()
        } else {
            children.first().copied()
        }
    }

    fn sibling_of(&self, doc: &Document, node_id: usize, reversed: bool) -> Option<usize> {
        if node_id == self.root {
            return None;
        }
        if reversed {
            doc.previous_sibling_id(node_id)
        } else {
            doc.next_sibling_id(node_id)
        }
    }

    /// The next node in document order after `node_id`, not entering its
    /// subtree, clipped to the root
    fn following(&self, doc: &Document, mut node_id: usize) -> Option<usize> {
        loop {
            if node_id == self.root {
                return None;
            }
            if let Some(sibling) = self.sibling_of(doc, node_id, false) {
                return Some(sibling);
            }
            node_id = doc.get_node(node_id)?.parent?;
        }
    }
}

/// A cursor positioned *between* nodes, enumerating a filtered subtree in
/// document order.
///
/// The iterator remembers a reference node and whether the cursor sits
/// before or after it; alternating `next_node`/`previous_node` calls
/// therefore return the same node twice as the cursor crosses back over it.
///
/// Unlike [`TreeWalker`], a rejected node's descendants are still
/// considered.
pub struct NodeIterator {
    root: usize,
    reference: usize,
    pointer_before_reference: bool,
    what_to_show: WhatToShow,
    filter: Option<NodeFilter>,
}

impl NodeIterator {
    pub fn new(root: usize, what_to_show: WhatToShow, filter: Option<NodeFilter>) -> Self {
        Self {
            root,
            reference: root,
            pointer_before_reference: true,
            what_to_show,
            filter,
        }
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn reference_node(&self) -> usize {
        self.reference
    }

    pub fn pointer_before_reference_node(&self) -> bool {
        self.pointer_before_reference
    }

    fn accepts(&self, doc: &Document, node_id: usize) -> bool {
        let Some(node) = doc.get_node(node_id) else {
            return false;
        };
        if !self.what_to_show.intersects(WhatToShow::bit_for(node)) {
            return false;
        }
        match &self.filter {
            Some(filter) => filter(node) == FilterResult::Accept,
            None => true,
        }
    }

    pub fn next_node(&mut self, doc: &Document) -> Option<usize> {
        self.traverse(doc, false)
    }

    pub fn previous_node(&mut self, doc: &Document) -> Option<usize> {
        self.traverse(doc, true)
    }

    fn traverse(&mut self, doc: &Document, backwards: bool) -> Option<usize> {
        let mut node_id = self.reference;
        let mut before = self.pointer_before_reference;
        loop {
            if backwards {
                if !before {
                    before = true;
                } else {
                    node_id = self.preceding(doc, node_id)?;
                }
            } else if before {
                before = false;
            } else {
                node_id = self.following(doc, node_id)?;
            }
            if self.accepts(doc, node_id) {
                break;
            }
        }
        self.reference = node_id;
        self.pointer_before_reference = backwards;
        Some(node_id)
    }

    /// Next node in document order within the root's subtree
    fn following(&self, doc: &Document, node_id: usize) -> Option<usize> {
        let node = doc.get_node(node_id)?;
        if let Some(first) = node.children.first() {
            return Some(*first);
        }
        let mut current = node_id;
        loop {
            if current == self.root {
                return None;
            }
            if let Some(sibling) = doc.next_sibling_id(current) {
                return Some(sibling);
            }
            current = doc.get_node(current)?.parent?;
        }
    }

    /// Previous node in document order within the root's subtree
    fn preceding(&self, doc: &Document, node_id: usize) -> Option<usize> {
        if node_id == self.root {
            return None;
        }
        match doc.previous_sibling_id(node_id) {
            Some(mut current) => {
                // Deepest last descendant of the previous sibling
                while let Some(last) = doc.get_node(current)?.children.last() {
                    current = *last;
                }
                Some(current)
            }
            None => doc.get_node(node_id)?.parent,
        }
    }
}
