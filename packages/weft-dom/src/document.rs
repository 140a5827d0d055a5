use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use markup5ever::{QualName, local_name};
use slab::Slab;
use weft_traits::navigation::{DummyNavigationProvider, NavigationProvider};
use weft_traits::net::{DummyPageLoader, PageLoader};
use weft_traits::script::{DummyScriptHost, ScriptHost};

use crate::DomError;
use crate::config::DocumentConfig;
use crate::mutator::DocumentMutator;
use crate::node::{ElementData, ElementKind, Node, NodeData, NodeFlags};
use crate::script::PostponedAction;
use crate::url::DocumentUrl;
use crate::util::walk_tree;

/// Global counter from which document ids are allocated. Navigation replaces
/// one document with another, and handler outcomes identify the surviving
/// page by this id.
static DOCUMENT_ID_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// A headless HTML document.
///
/// Nodes live in a slab arena and are addressed by `usize` ids. Id 0 is
/// always the document root node. All tree mutation goes through
/// [`DocumentMutator`] (obtained via [`Document::mutate`]) so that the
/// side-table state (id map, form owners, postponed actions, the mutation
/// generation) stays consistent with the tree.
pub struct Document {
    /// A unique identifier for this document
    id: usize,

    /// The node arena. Box here to prevent the slab from being moved when
    /// the document itself moves.
    pub(crate) nodes: Box<Slab<Node>>,

    /// The document's base URL
    pub(crate) url: DocumentUrl,

    /// The node which is currently focussed, if any
    pub(crate) focussed_node_id: Option<usize>,

    /// Map of `id` attribute values to in-document node ids
    pub(crate) nodes_to_id: HashMap<String, usize>,

    /// Cached form-owner resolution for form controls
    pub(crate) controls_to_form: HashMap<usize, usize>,

    /// Nodes touched since the last time the set was drained
    pub(crate) changed_nodes: HashSet<usize>,

    /// Incremented on every tree mutation. Live node lists compare their
    /// cached generation against this to decide whether to recompute.
    pub(crate) mutation_generation: u64,

    /// Actions queued during mutation to run after the current operation
    /// completes (script execution, frame loads)
    pub(crate) postponed_actions: VecDeque<PostponedAction>,

    /// Guards against re-entrant draining of the postponed queue when an
    /// action's side effects mutate the document
    pub(crate) processing_postponed: bool,

    /// Report DOM contract violations as errors instead of ignoring them
    pub(crate) strict_errors: bool,

    /// Failures recorded from postponed actions and default actions while
    /// `strict_errors` is set
    pub(crate) deferred_failures: Vec<DomError>,

    /// Cloned checkboxes copy live checked state instead of re-deriving it
    /// from the `checked` attribute
    pub(crate) checkbox_clone_copies_state: bool,

    pub(crate) navigation_provider: Arc<dyn NavigationProvider>,
    pub(crate) page_loader: Arc<dyn PageLoader>,
    pub(crate) script_host: Arc<dyn ScriptHost>,
}

impl Document {
    pub fn new(config: DocumentConfig) -> Self {
        let url = config
            .base_url
            .as_deref()
            .and_then(|url| DocumentUrl::from_str(url).ok())
            .unwrap_or_default();

        let navigation_provider = config
            .navigation_provider
            .unwrap_or_else(|| Arc::new(DummyNavigationProvider));
        let page_loader = config
            .page_loader
            .unwrap_or_else(|| Arc::new(DummyPageLoader));
        let script_host = config
            .script_host
            .unwrap_or_else(|| Arc::new(DummyScriptHost));

        let mut nodes = Box::new(Slab::new());
        let root_id = nodes.insert(Node::new(0, NodeData::Document));
        nodes[root_id].flags.insert(NodeFlags::IS_IN_DOCUMENT);
        debug_assert_eq!(root_id, 0);

        Self {
            id: DOCUMENT_ID_COUNTER.fetch_add(1, Ordering::SeqCst),
            nodes,
            url,
            focussed_node_id: None,
            nodes_to_id: HashMap::new(),
            controls_to_form: HashMap::new(),
            changed_nodes: HashSet::new(),
            mutation_generation: 0,
            postponed_actions: VecDeque::new(),
            processing_postponed: false,
            strict_errors: config.strict_errors,
            deferred_failures: Vec::new(),
            checkbox_clone_copies_state: config.checkbox_clone_copies_state,
            navigation_provider,
            page_loader,
            script_host,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn url(&self) -> &DocumentUrl {
        &self.url
    }

    pub fn set_base_url(&mut self, url: &str) {
        if let Ok(parsed) = DocumentUrl::from_str(url) {
            self.url = parsed;
        }
    }

    pub fn strict_errors(&self) -> bool {
        self.strict_errors
    }

    /// Take the failures recorded since the last drain. Always empty on a
    /// lenient document.
    pub fn drain_deferred_failures(&mut self) -> Vec<DomError> {
        std::mem::take(&mut self.deferred_failures)
    }

    /// Apply the strictness policy to a resource-resolution failure: a
    /// strict document records it as a typed error, a lenient one warns
    /// and moves on
    pub(crate) fn report_resource_failure(&mut self, message: String) {
        if self.strict_errors {
            self.deferred_failures.push(DomError::Deferred(message));
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::warn!("{message}");
    }

    pub fn mutation_generation(&self) -> u64 {
        self.mutation_generation
    }

    /// Obtain a mutator for batch-updating the document's tree
    pub fn mutate(&mut self) -> DocumentMutator<'_> {
        DocumentMutator::new(self)
    }

    // Node accessors

    pub fn root_node(&self) -> &Node {
        &self.nodes[0]
    }

    /// The root element of the document (the `<html>` element in a complete
    /// document), if the document has one
    pub fn root_element(&self) -> Option<&Node> {
        self.root_node()
            .children
            .iter()
            .map(|id| &self.nodes[*id])
            .find(|node| node.is_element())
    }

    pub fn get_node(&self, node_id: usize) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn get_node_mut(&mut self, node_id: usize) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    /// Look up an in-document element by the value of its `id` attribute
    pub fn element_from_id(&self, id: &str) -> Option<usize> {
        self.nodes_to_id.get(id).copied()
    }

    pub fn focussed_node_id(&self) -> Option<usize> {
        self.focussed_node_id
    }

    pub(crate) fn create_node(&mut self, data: NodeData) -> usize {
        let entry = self.nodes.vacant_entry();
        let id = entry.key();
        entry.insert(Node::new(id, data));
        id
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<crate::node::Attribute>) -> usize {
        let data = ElementData::new(name, attrs);
        self.create_node(NodeData::Element(data))
    }

    // Tree order helpers

    /// The next sibling of a node, derived from the parent's child list
    pub fn next_sibling_id(&self, node_id: usize) -> Option<usize> {
        let node = self.get_node(node_id)?;
        let parent = self.get_node(node.parent?)?;
        let index = parent.index_of_child(node_id)?;
        parent.children.get(index + 1).copied()
    }

    pub fn previous_sibling_id(&self, node_id: usize) -> Option<usize> {
        let node = self.get_node(node_id)?;
        let parent = self.get_node(node.parent?)?;
        let index = parent.index_of_child(node_id)?;
        index.checked_sub(1).and_then(|i| parent.children.get(i)).copied()
    }

    /// Whether `ancestor_id` is `node_id` or one of its ancestors
    pub fn is_inclusive_ancestor_of(&self, ancestor_id: usize, node_id: usize) -> bool {
        let mut current = Some(node_id);
        while let Some(id) = current {
            if id == ancestor_id {
                return true;
            }
            current = self.get_node(id).and_then(|node| node.parent);
        }
        false
    }

    /// Iterate a subtree in tree order (depth-first, root first)
    pub fn iter_subtree(&self, root_id: usize) -> impl Iterator<Item = usize> + '_ {
        crate::traversal::TreeTraverser::new(self, root_id)
    }

    /// Concatenated text content of a node's subtree
    pub fn text_content(&self, node_id: usize) -> String {
        let mut out = String::new();
        for id in self.iter_subtree(node_id) {
            if let Some(text) = self.nodes[id].text_content() {
                out.push_str(text);
            }
        }
        out
    }

    // Mutation bookkeeping

    pub(crate) fn bump_generation(&mut self) {
        self.mutation_generation += 1;
    }

    pub(crate) fn note_changed(&mut self, node_id: usize) {
        self.changed_nodes.insert(node_id);
    }

    /// Drain the set of nodes touched since the last drain
    pub fn drain_changed_nodes(&mut self) -> Vec<usize> {
        self.changed_nodes.drain().collect()
    }

    pub(crate) fn enqueue_postponed(&mut self, action: PostponedAction) {
        self.postponed_actions.push_back(action);
    }

    // Focus management

    /// Move focus to the given node. Returns false if the node is not
    /// focussable or not in the document.
    pub fn set_focus_to(&mut self, focus_node_id: usize) -> bool {
        if Some(focus_node_id) == self.focussed_node_id {
            return true;
        }

        let Some(node) = self.get_node(focus_node_id) else {
            return false;
        };
        if !node.flags.is_in_document() {
            return false;
        }
        let Some(element) = node.element_data() else {
            return false;
        };
        if !element.is_focussable {
            return false;
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Focussed node {}", focus_node_id);

        self.focussed_node_id = Some(focus_node_id);

        // Capture the value at focus time for change detection and the
        // Escape-key revert
        if let Some(input) = self
            .get_node_mut(focus_node_id)
            .and_then(|node| node.element_data_mut())
            .and_then(|elem| elem.text_input_data_mut())
        {
            input.capture_original_value();
        }
        true
    }

    pub fn clear_focus(&mut self) {
        self.focussed_node_id = None;
    }

    pub fn focus_next_node(&mut self) -> Option<usize> {
        let next_id = self.nearest_focussable(1)?;
        self.set_focus_to(next_id);
        Some(next_id)
    }

    pub fn focus_previous_node(&mut self) -> Option<usize> {
        let next_id = self.nearest_focussable(-1)?;
        self.set_focus_to(next_id);
        Some(next_id)
    }

    /// The focussable element before or after the current focus in tree
    /// order, wrapping at the ends. Does not move focus.
    pub fn nearest_focussable(&self, direction: isize) -> Option<usize> {
        let focussable: Vec<usize> = self
            .iter_subtree(0)
            .filter(|id| {
                self.nodes[*id]
                    .element_data()
                    .is_some_and(|elem| elem.is_focussable)
            })
            .collect();
        if focussable.is_empty() {
            return None;
        }

        match self
            .focussed_node_id
            .and_then(|id| focussable.iter().position(|fid| *fid == id))
        {
            Some(index) => {
                let len = focussable.len() as isize;
                let next = (index as isize + direction).rem_euclid(len);
                Some(focussable[next as usize])
            }
            None if direction < 0 => focussable.last().copied(),
            None => Some(focussable[0]),
        }
    }

    // Form control state

    /// Toggle a checkbox input's checked state, returning the new state
    pub fn toggle_checkbox(element: &mut ElementData) -> bool {
        let Some(checked) = element.checkbox_input_checked_mut() else {
            return false;
        };
        *checked = !*checked;
        *checked
    }

    /// Check the target radio and uncheck every other radio in its group.
    ///
    /// A radio group is the set of radio inputs sharing a `name` attribute
    /// and a form owner (or sharing "no form owner").
    pub fn toggle_radio(&mut self, radio_set_name: String, target_radio_id: usize) {
        let target_form = self.form_owner(target_radio_id);
        let group: Vec<usize> = self
            .nodes
            .iter()
            .filter_map(|(id, node)| {
                let element = node.element_data()?;
                (element.kind == ElementKind::Radio
                    && node.flags.is_in_document()
                    && element.attr(local_name!("name")) == Some(radio_set_name.as_str()))
                .then_some(id)
            })
            .collect();

        for id in group {
            if self.form_owner(id) != target_form && id != target_radio_id {
                continue;
            }
            let updated = match self.nodes[id]
                .element_data_mut()
                .and_then(|elem| elem.checkbox_input_checked_mut())
            {
                Some(checked) => {
                    *checked = id == target_radio_id;
                    true
                }
                None => false,
            };
            if updated {
                self.note_changed(id);
            }
        }
    }

    /// Check a radio input. Named radios deselect the rest of their group;
    /// a radio without a `name` attribute forms a group of one.
    pub fn check_radio(&mut self, target_radio_id: usize) {
        let name = self
            .get_node(target_radio_id)
            .and_then(|node| node.attr(local_name!("name")))
            .map(String::from);
        match name {
            Some(name) => self.toggle_radio(name, target_radio_id),
            None => {
                if let Some(checked) = self
                    .get_node_mut(target_radio_id)
                    .and_then(|node| node.element_data_mut())
                    .and_then(|elem| elem.checkbox_input_checked_mut())
                {
                    *checked = true;
                    self.note_changed(target_radio_id);
                }
            }
        }
    }

    /// Resolve a form control's owning form: the form referenced by its
    /// `form` attribute if there is one, otherwise the nearest `<form>`
    /// ancestor. Resolutions are cached until the tree around the control
    /// changes.
    pub fn form_owner(&mut self, control_id: usize) -> Option<usize> {
        if let Some(form_id) = self.controls_to_form.get(&control_id) {
            return Some(*form_id);
        }

        let node = self.get_node(control_id)?;
        let explicit = node
            .element_data()
            .and_then(|elem| elem.attr(local_name!("form")))
            .map(|id| id.to_string());

        let form_id = match explicit {
            Some(form_attr) => self.element_from_id(&form_attr).filter(|id| {
                self.nodes[*id]
                    .data
                    .is_element_with_tag_name(&local_name!("form"))
            })?,
            None => {
                let mut current = node.parent;
                loop {
                    let id = current?;
                    let node = self.get_node(id)?;
                    if node.data.is_element_with_tag_name(&local_name!("form")) {
                        break id;
                    }
                    current = node.parent;
                }
            }
        };

        self.controls_to_form.insert(control_id, form_id);
        Some(form_id)
    }

    /// Invalidate cached form-owner resolutions under `subtree_root`
    pub(crate) fn reset_form_owners(&mut self, subtree_root: usize) {
        let affected: Vec<usize> = self.iter_subtree(subtree_root).collect();
        for id in affected {
            self.controls_to_form.remove(&id);
        }
    }

    // Debug

    pub fn print_tree(&self) {
        walk_tree(0, self.root_node(), self);
    }
}

impl Index<usize> for Document {
    type Output = Node;
    fn index(&self, index: usize) -> &Self::Output {
        &self.nodes[index]
    }
}

impl IndexMut<usize> for Document {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

#[cfg(test)]
mod tests {
    use markup5ever::{QualName, local_name, namespace_url, ns};

    use super::*;
    use crate::node::Attribute;

    fn input_attrs(pairs: &[(&str, &str)]) -> Vec<Attribute> {
        pairs
            .iter()
            .map(|(name, value)| {
                Attribute::new(
                    QualName::new(None, ns!(), markup5ever::LocalName::from(*name)),
                    value.to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn root_node_has_id_zero() {
        let doc = Document::new(DocumentConfig::default());
        assert_eq!(doc.root_node().id, 0);
        assert!(doc.root_node().flags.is_in_document());
    }

    #[test]
    fn radio_group_is_mutually_exclusive() {
        let mut doc = Document::new(DocumentConfig::default());
        let (a, b) = {
            let mut mutr = doc.mutate();
            let a = mutr.create_element(
                QualName::new(None, ns!(), local_name!("input")),
                input_attrs(&[("type", "radio"), ("name", "color"), ("checked", "")]),
            );
            let b = mutr.create_element(
                QualName::new(None, ns!(), local_name!("input")),
                input_attrs(&[("type", "radio"), ("name", "color")]),
            );
            mutr.append_children(0, &[a, b]);
            (a, b)
        };

        doc.toggle_radio("color".to_string(), b);
        let checked = |doc: &Document, id: usize| {
            doc[id].element_data().unwrap().checkbox_input_checked().unwrap()
        };
        assert!(!checked(&doc, a));
        assert!(checked(&doc, b));
    }

    #[test]
    fn unnamed_radio_forms_its_own_group() {
        let mut doc = Document::new(DocumentConfig::default());
        let (named, unnamed) = {
            let mut mutr = doc.mutate();
            let named = mutr.create_element(
                QualName::new(None, ns!(), local_name!("input")),
                input_attrs(&[("type", "radio"), ("name", "color"), ("checked", "")]),
            );
            let unnamed = mutr.create_element(
                QualName::new(None, ns!(), local_name!("input")),
                input_attrs(&[("type", "radio")]),
            );
            mutr.append_children(0, &[named, unnamed]);
            (named, unnamed)
        };

        doc.check_radio(unnamed);
        let checked = |doc: &Document, id: usize| {
            doc[id].element_data().unwrap().checkbox_input_checked().unwrap()
        };
        assert!(checked(&doc, unnamed));
        // The named radio belongs to a different group and keeps its state
        assert!(checked(&doc, named));
    }

    #[test]
    fn focus_requires_focussable_in_document_element() {
        let mut doc = Document::new(DocumentConfig::default());
        let detached = doc.create_element(
            QualName::new(None, ns!(), local_name!("input")),
            Vec::new(),
        );
        assert!(!doc.set_focus_to(detached));

        doc.mutate().append_children(0, &[detached]);
        assert!(doc.set_focus_to(detached));
        assert_eq!(doc.focussed_node_id(), Some(detached));
    }

    #[test]
    fn focus_next_wraps_in_tree_order() {
        let mut doc = Document::new(DocumentConfig::default());
        let (a, b) = {
            let mut mutr = doc.mutate();
            let a = mutr.create_element(
                QualName::new(None, ns!(), local_name!("input")),
                Vec::new(),
            );
            let b = mutr.create_element(
                QualName::new(None, ns!(), local_name!("input")),
                Vec::new(),
            );
            mutr.append_children(0, &[a, b]);
            (a, b)
        };

        assert_eq!(doc.focus_next_node(), Some(a));
        assert_eq!(doc.focus_next_node(), Some(b));
        assert_eq!(doc.focus_next_node(), Some(a));
        assert_eq!(doc.focus_previous_node(), Some(b));
    }

    #[test]
    fn form_owner_resolution() {
        let mut doc = Document::new(DocumentConfig::default());
        let (form, inside, outside) = {
            let mut mutr = doc.mutate();
            let form = mutr.create_element(
                QualName::new(None, ns!(), local_name!("form")),
                input_attrs(&[("id", "f")]),
            );
            let inside = mutr.create_element(
                QualName::new(None, ns!(), local_name!("input")),
                Vec::new(),
            );
            let outside = mutr.create_element(
                QualName::new(None, ns!(), local_name!("input")),
                input_attrs(&[("form", "f")]),
            );
            mutr.append_children(0, &[form, outside]);
            mutr.append_children(form, &[inside]);
            (form, inside, outside)
        };

        assert_eq!(doc.form_owner(inside), Some(form));
        assert_eq!(doc.form_owner(outside), Some(form));
        assert_eq!(doc.form_owner(form), None);
    }
}
