use markup5ever::{QualName, local_name};

use crate::DomError;
use crate::document::Document;
use crate::node::{Attribute, ElementKind, NodeData, NodeFlags, TextNodeData};
use crate::script::PostponedAction;

/// Write API for the document's tree.
///
/// All tree mutation goes through this type so that the side-table state the
/// document maintains (id lookup map, form-owner cache, the mutation
/// generation, postponed script and frame actions) stays consistent with the
/// tree. Dropping the mutator runs any actions the batch postponed.
pub struct DocumentMutator<'doc> {
    doc: &'doc mut Document,
}

impl Drop for DocumentMutator<'_> {
    fn drop(&mut self) {
        self.doc.process_postponed_actions();
    }
}

impl<'doc> DocumentMutator<'doc> {
    pub fn new(doc: &'doc mut Document) -> Self {
        Self { doc }
    }

    // Read methods

    pub fn node_has_parent(&self, node_id: usize) -> bool {
        self.doc.nodes[node_id].parent.is_some()
    }

    pub fn parent_id(&self, node_id: usize) -> Option<usize> {
        self.doc.nodes[node_id].parent
    }

    pub fn last_child_id(&self, node_id: usize) -> Option<usize> {
        self.doc.nodes[node_id].children.last().copied()
    }

    pub fn previous_sibling_id(&self, node_id: usize) -> Option<usize> {
        self.doc.previous_sibling_id(node_id)
    }

    pub fn element_name(&self, node_id: usize) -> Option<&QualName> {
        self.doc.nodes[node_id].tag_name()
    }

    // Node creation

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> usize {
        self.doc.create_element(name, attrs)
    }

    pub fn create_text_node(&mut self, text: &str) -> usize {
        self.doc
            .create_node(NodeData::Text(TextNodeData::new(text.to_string())))
    }

    pub fn create_comment_node(&mut self, text: &str) -> usize {
        self.doc
            .create_node(NodeData::Comment(TextNodeData::new(text.to_string())))
    }

    /// Create a detached subtree root. Inserting a fragment splices its
    /// children into the target, never the fragment node itself.
    pub fn create_document_fragment(&mut self) -> usize {
        self.doc.create_node(NodeData::DocumentFragment)
    }

    /// Deep or shallow copy of a node. The copy is created detached.
    ///
    /// Durable element state (attributes, id) is copied; transient session
    /// state is re-derived from the copied attributes. A cloned script is
    /// freshly executable, a cloned frame is unloaded, and a cloned text
    /// input starts with a collapsed selection at offset 0.
    pub fn clone_node(&mut self, node_id: usize, deep: bool) -> Option<usize> {
        let node = self.doc.get_node(node_id)?;
        let mut data = node.data.clone();
        let child_ids = if deep { node.children.clone() } else { Vec::new() };

        if let NodeData::Element(element) = &mut data {
            element.reset_transient_state(self.doc.checkbox_clone_copies_state);
        }

        let clone_id = self.doc.create_node(data);
        for child_id in child_ids {
            if let Some(child_clone) = self.clone_node(child_id, true) {
                self.doc.nodes[child_clone].parent = Some(clone_id);
                self.doc.nodes[clone_id].children.push(child_clone);
            }
        }
        Some(clone_id)
    }

    // Tree mutation

    /// Append children to a parent, detaching each from its current parent
    /// first. A child that is an ancestor of the parent is skipped.
    pub fn append_children(&mut self, parent_id: usize, child_ids: &[usize]) {
        for child_id in child_ids {
            if self.doc.is_inclusive_ancestor_of(*child_id, parent_id) {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "append_children: skipping insertion of {child_id} into its own subtree"
                );
                continue;
            }
            self.detach(*child_id);
            self.doc.nodes[parent_id].children.push(*child_id);
            self.doc.nodes[*child_id].parent = Some(parent_id);
            self.on_insert(*child_id);
        }
        self.doc.bump_generation();
        self.doc.note_changed(parent_id);
    }

    /// Insert nodes as siblings immediately before `anchor_node_id`
    pub fn insert_nodes_before(&mut self, anchor_node_id: usize, new_node_ids: &[usize]) {
        let Some(parent_id) = self.doc.nodes[anchor_node_id].parent else {
            #[cfg(feature = "tracing")]
            tracing::warn!("insert_nodes_before: anchor {anchor_node_id} has no parent");
            return;
        };
        for new_node_id in new_node_ids {
            if self.insert_before(parent_id, *new_node_id, Some(anchor_node_id)).is_err() {
                #[cfg(feature = "tracing")]
                tracing::warn!("insert_nodes_before: skipping invalid insertion of {new_node_id}");
            }
        }
    }

    /// Insert `new_child_id` into `parent_id` before `reference_id`, or at
    /// the end when no reference is given.
    ///
    /// The insertion also removes the node from its previous parent, so a
    /// node is never in two places at once. Inserting a node into its own
    /// subtree is a [`DomError::HierarchyRequest`]; a reference that is not
    /// a child of the parent is a [`DomError::NotFound`].
    pub fn insert_before(
        &mut self,
        parent_id: usize,
        new_child_id: usize,
        reference_id: Option<usize>,
    ) -> Result<(), DomError> {
        if self.doc.get_node(parent_id).is_none() {
            return Err(DomError::NoSuchNode(parent_id));
        }
        if self.doc.get_node(new_child_id).is_none() {
            return Err(DomError::NoSuchNode(new_child_id));
        }
        if self.doc.is_inclusive_ancestor_of(new_child_id, parent_id) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(reference_id) = reference_id {
            if self.doc.nodes[reference_id].parent != Some(parent_id) {
                return Err(DomError::NotFound);
            }
        }

        // A fragment contributes its children, not itself
        if matches!(self.doc.nodes[new_child_id].data, NodeData::DocumentFragment) {
            let children = std::mem::take(&mut self.doc.nodes[new_child_id].children);
            for child_id in &children {
                self.doc.nodes[*child_id].parent = None;
            }
            for child_id in children {
                self.insert_before(parent_id, child_id, reference_id)?;
            }
            return Ok(());
        }

        self.detach(new_child_id);
        let index = match reference_id {
            Some(reference_id) => self.doc.nodes[parent_id]
                .index_of_child(reference_id)
                .ok_or(DomError::NotFound)?,
            None => self.doc.nodes[parent_id].children.len(),
        };
        self.doc.nodes[parent_id].children.insert(index, new_child_id);
        self.doc.nodes[new_child_id].parent = Some(parent_id);

        self.on_insert(new_child_id);
        self.doc.bump_generation();
        self.doc.note_changed(parent_id);
        Ok(())
    }

    /// Remove `child_id` from `parent_id`. The removed node survives as the
    /// root of a detached subtree and keeps its children.
    pub fn remove_child(&mut self, parent_id: usize, child_id: usize) -> Result<usize, DomError> {
        if self.doc.nodes[child_id].parent != Some(parent_id) {
            return Err(DomError::NotFound);
        }
        self.remove_node(child_id);
        Ok(child_id)
    }

    /// Detach a node from its parent, leaving it as the root of a live
    /// detached subtree.
    pub fn remove_node(&mut self, node_id: usize) {
        let was_in_document = self.doc.nodes[node_id].flags.is_in_document();
        self.detach(node_id);
        if was_in_document {
            self.on_remove(node_id);
        }
        self.doc.bump_generation();
        self.doc.note_changed(node_id);
    }

    /// Move all children of `old_parent_id` to the end of `new_parent_id`
    pub fn reparent_children(&mut self, old_parent_id: usize, new_parent_id: usize) {
        let children = std::mem::take(&mut self.doc.nodes[old_parent_id].children);
        for child_id in &children {
            self.doc.nodes[*child_id].parent = None;
        }
        self.append_children(new_parent_id, &children);
        self.doc.note_changed(old_parent_id);
    }

    // Text mutation

    /// Append text to a node. If the node's last child is a text node the
    /// text is merged into it, otherwise a new text node is appended.
    pub fn append_text_to_node(&mut self, node_id: usize, text: &str) -> Result<(), DomError> {
        let last_child_id = self.last_child_id(node_id);
        let merged = match last_child_id {
            Some(id) if self.doc.nodes[id].is_text_node() => {
                if let Some(data) = self.doc.nodes[id].character_data_mut() {
                    data.append_data(text);
                }
                true
            }
            _ => false,
        };
        if !merged {
            let text_id = self.create_text_node(text);
            self.append_children(node_id, &[text_id]);
        }
        self.doc.bump_generation();
        self.doc.note_changed(node_id);
        Ok(())
    }

    /// Split a text node at a character offset.
    ///
    /// The original node keeps the prefix. The suffix moves into a new text
    /// node which is inserted as the next sibling of the original (or left
    /// detached when the original has no parent). Returns the new node's id.
    pub fn split_text(&mut self, node_id: usize, offset: usize) -> Result<usize, DomError> {
        let node = self
            .doc
            .get_node_mut(node_id)
            .ok_or(DomError::NoSuchNode(node_id))?;
        if !node.is_text_node() {
            return Err(DomError::NotFound);
        }
        let suffix = match node.character_data_mut() {
            Some(data) => data.split_at(offset)?,
            None => return Err(DomError::NotFound),
        };

        let new_id = self.create_text_node(&suffix);
        if self.doc.nodes[node_id].parent.is_some() {
            match self.doc.next_sibling_id(node_id) {
                Some(next_id) => self.insert_nodes_before(next_id, &[new_id]),
                None => {
                    if let Some(parent_id) = self.doc.nodes[node_id].parent {
                        self.append_children(parent_id, &[new_id]);
                    }
                }
            }
        }
        self.doc.bump_generation();
        self.doc.note_changed(node_id);
        Ok(new_id)
    }

    // Attribute mutation

    /// Add attributes the element doesn't already have. Used by parsers for
    /// duplicate top-level `<html>`/`<body>` tags; first occurrence wins.
    pub fn add_attrs_if_missing(&mut self, node_id: usize, attrs: Vec<Attribute>) {
        let Some(element) = self.doc.nodes[node_id].element_data_mut() else {
            return;
        };
        let mut added = Vec::new();
        for attr in attrs {
            if !element.attrs.contains(&attr.name.local) {
                added.push(attr.name.local.clone());
                element.attrs.set(attr.name, attr.value);
            }
        }
        for name in added {
            self.apply_attribute_side_effects(node_id, &name);
        }
        self.doc.bump_generation();
        self.doc.note_changed(node_id);
    }

    pub fn set_attribute(&mut self, node_id: usize, name: QualName, value: String) {
        let Some(element) = self.doc.nodes[node_id].element_data_mut() else {
            return;
        };
        element.attrs.set(name.clone(), value);
        self.apply_attribute_side_effects(node_id, &name.local);
        self.doc.bump_generation();
        self.doc.note_changed(node_id);
    }

    pub fn remove_attribute(&mut self, node_id: usize, name: &markup5ever::LocalName) {
        let Some(element) = self.doc.nodes[node_id].element_data_mut() else {
            return;
        };
        if element.attrs.remove(name).is_none() {
            return;
        }
        self.apply_attribute_side_effects(node_id, name);
        self.doc.bump_generation();
        self.doc.note_changed(node_id);
    }

    /// Keep derived element state in sync with an attribute change
    fn apply_attribute_side_effects(&mut self, node_id: usize, name: &markup5ever::LocalName) {
        let in_document = self.doc.nodes[node_id].flags.is_in_document();

        match *name {
            local_name!("id") => {
                let Some(element) = self.doc.nodes[node_id].element_data_mut() else {
                    return;
                };
                let new_id = element.attrs.get(&local_name!("id")).map(String::from);
                let old_id = std::mem::replace(&mut element.id, new_id.clone());
                if in_document {
                    if let Some(old_id) = old_id {
                        if self.doc.nodes_to_id.get(&old_id) == Some(&node_id) {
                            self.doc.nodes_to_id.remove(&old_id);
                        }
                    }
                    if let Some(new_id) = new_id {
                        self.doc.nodes_to_id.insert(new_id, node_id);
                    }
                }
            }
            local_name!("form") => {
                self.doc.controls_to_form.remove(&node_id);
            }
            local_name!("src") => {
                let is_frame = self.doc.nodes[node_id]
                    .element_data()
                    .is_some_and(|elem| elem.kind == ElementKind::Frame);
                if is_frame && in_document {
                    self.queue_frame_load(node_id);
                }
            }
            _ => {
                let Some(element) = self.doc.nodes[node_id].element_data_mut() else {
                    return;
                };
                match *name {
                    local_name!("type") => element.recompute_kind(),
                    local_name!("checked") => {
                        let present = element.attrs.contains(&local_name!("checked"));
                        if let Some(checked) = element.checkbox_input_checked_mut() {
                            *checked = present;
                        }
                    }
                    local_name!("selected") => {
                        let present = element.attrs.contains(&local_name!("selected"));
                        if let Some(option) = element.option_data_mut() {
                            option.selected = present;
                        }
                    }
                    local_name!("value") => {
                        let value = element
                            .attrs
                            .get(&local_name!("value"))
                            .map(String::from)
                            .unwrap_or_default();
                        // The value attribute only tracks through to the live
                        // value while the user hasn't edited the control
                        if let Some(input) = element.text_input_data_mut() {
                            if !input.has_value_changed() {
                                input.set_value(&value);
                                input.capture_original_value();
                            }
                        }
                    }
                    local_name!("disabled") | local_name!("tabindex") | local_name!("href") => {
                        element.flush_is_focussable();
                    }
                    _ => {}
                }
            }
        }
    }

    // Insertion and removal hooks

    fn detach(&mut self, node_id: usize) {
        let Some(parent_id) = self.doc.nodes[node_id].parent.take() else {
            return;
        };
        let parent = &mut self.doc.nodes[parent_id];
        parent.children.retain(|id| *id != node_id);
    }

    /// Runs after a node (and its subtree) gains a parent. Connection state,
    /// the id map, and kind-specific load/execute actions all key off the
    /// transition from detached to in-document.
    fn on_insert(&mut self, node_id: usize) {
        let parent_in_document = self.doc.nodes[node_id]
            .parent
            .is_some_and(|parent_id| self.doc.nodes[parent_id].flags.is_in_document());
        if !parent_in_document {
            return;
        }

        let subtree: Vec<usize> = self.doc.iter_subtree(node_id).collect();
        for id in subtree {
            let (id_attr, kind, script_pending) = {
                let node = &mut self.doc.nodes[id];
                node.flags.insert(NodeFlags::IS_IN_DOCUMENT);
                match node.data.downcast_element_mut() {
                    Some(element) => {
                        let pending = element
                            .script_data_mut()
                            .is_some_and(|script| !script.already_executed);
                        (element.id.clone(), Some(element.kind), pending)
                    }
                    None => (None, None, false),
                }
            };

            if let Some(id_attr) = id_attr {
                self.doc.nodes_to_id.insert(id_attr, id);
            }
            match kind {
                // A script runs once, after the insertion completes
                Some(ElementKind::Script) if script_pending => {
                    self.doc
                        .enqueue_postponed(PostponedAction::ExecuteScript { node_id: id });
                }
                Some(ElementKind::Frame) => self.queue_frame_load(id),
                _ => {}
            }
        }
        self.doc.reset_form_owners(node_id);
    }

    /// Runs after a node is detached from an in-document parent
    fn on_remove(&mut self, node_id: usize) {
        let subtree: Vec<usize> = self.doc.iter_subtree(node_id).collect();
        for id in &subtree {
            let id_attr = {
                let node = &mut self.doc.nodes[*id];
                node.flags.remove(NodeFlags::IS_IN_DOCUMENT);
                node.element_data().and_then(|elem| elem.id.clone())
            };

            if let Some(id_attr) = id_attr {
                if self.doc.nodes_to_id.get(&id_attr) == Some(id) {
                    self.doc.nodes_to_id.remove(&id_attr);
                }
            }
            self.doc.controls_to_form.remove(id);

            // Focus does not survive leaving the document
            if self.doc.focussed_node_id == Some(*id) {
                self.doc.clear_focus();
            }
        }
    }

    fn queue_frame_load(&mut self, node_id: usize) {
        let src = self.doc.nodes[node_id]
            .attr(local_name!("src"))
            .map(String::from);
        if let Some(src) = src {
            self.doc.enqueue_postponed(PostponedAction::LoadFrame {
                node_id,
                src,
            });
        }
    }
}
