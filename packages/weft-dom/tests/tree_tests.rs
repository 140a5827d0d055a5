//! Tree-shape invariants exercised through the public mutation API.

use std::collections::HashMap;

use weft_dom::node::Attribute;
use weft_dom::{
    Document, DocumentConfig, DomError, LiveNodeList, LocalName, QualName, TreeWalker, WhatToShow,
    namespace_url, ns,
};

fn qual(name: &str) -> QualName {
    QualName::new(None, ns!(), LocalName::from(name))
}

/// Every in-document node appears exactly once as a child, and its parent
/// pointer agrees with the child list that contains it.
fn assert_tree_consistent(doc: &Document) {
    let mut seen_as_child: HashMap<usize, usize> = HashMap::new();
    for id in doc.iter_subtree(0) {
        let node = &doc[id];
        for child_id in &node.children {
            *seen_as_child.entry(*child_id).or_default() += 1;
            assert_eq!(doc[*child_id].parent, Some(id));
        }
    }
    for (child_id, count) in seen_as_child {
        assert_eq!(count, 1, "node {child_id} appears {count} times as a child");
    }
}

#[test]
fn moves_never_duplicate_nodes() {
    let mut doc = Document::new(DocumentConfig::default());
    let (a, b, span) = {
        let mut mutr = doc.mutate();
        let a = mutr.create_element(qual("div"), Vec::new());
        let b = mutr.create_element(qual("div"), Vec::new());
        let span = mutr.create_element(qual("span"), Vec::new());
        mutr.append_children(0, &[a, b]);
        mutr.append_children(a, &[span]);
        (a, b, span)
    };

    // Move the span back and forth a few times, also re-appending it to
    // the parent it is already in
    let mut mutr = doc.mutate();
    mutr.append_children(b, &[span]);
    mutr.append_children(a, &[span]);
    mutr.append_children(a, &[span]);
    mutr.insert_before(b, span, None).unwrap();
    drop(mutr);

    assert_tree_consistent(&doc);
    assert_eq!(doc[span].parent, Some(b));
    assert!(doc[a].children.is_empty());
}

#[test]
fn insert_into_own_subtree_fails_and_changes_nothing() {
    let mut doc = Document::new(DocumentConfig::default());
    let (outer, inner) = {
        let mut mutr = doc.mutate();
        let outer = mutr.create_element(qual("div"), Vec::new());
        let inner = mutr.create_element(qual("div"), Vec::new());
        mutr.append_children(0, &[outer]);
        mutr.append_children(outer, &[inner]);
        (outer, inner)
    };

    let result = doc.mutate().insert_before(inner, outer, None);
    assert_eq!(result, Err(DomError::HierarchyRequest));
    assert_tree_consistent(&doc);
    assert_eq!(doc[outer].parent, Some(0));
    assert_eq!(doc[inner].parent, Some(outer));
}

#[test]
fn split_text_round_trip() {
    let mut doc = Document::new(DocumentConfig::default());
    let (p, text) = {
        let mut mutr = doc.mutate();
        let p = mutr.create_element(qual("p"), Vec::new());
        let text = mutr.create_text_node("hello world");
        mutr.append_children(0, &[p]);
        mutr.append_children(p, &[text]);
        (p, text)
    };

    let tail = doc.mutate().split_text(text, 5).unwrap();
    assert_eq!(doc[text].text_content(), Some("hello"));
    assert_eq!(doc[tail].text_content(), Some(" world"));
    assert_eq!(doc[p].children, vec![text, tail]);

    // The concatenated text content is unchanged by the split
    assert_eq!(doc.text_content(p), "hello world");
    assert_tree_consistent(&doc);
}

#[test]
fn detached_subtrees_remain_navigable() {
    let mut doc = Document::new(DocumentConfig::default());
    let (div, inner) = {
        let mut mutr = doc.mutate();
        let div = mutr.create_element(qual("div"), Vec::new());
        let inner = mutr.create_element(qual("span"), Vec::new());
        let text = mutr.create_text_node("still here");
        mutr.append_children(0, &[div]);
        mutr.append_children(div, &[inner]);
        mutr.append_children(inner, &[text]);
        (div, inner)
    };

    doc.mutate().remove_node(div);

    // A walker rooted at the detached subtree still traverses it
    let mut walker = TreeWalker::new(div, WhatToShow::ALL, None);
    assert_eq!(walker.next_node(&doc), Some(inner));
    assert_eq!(doc.text_content(div), "still here");
}

#[test]
fn live_list_tracks_mutations_across_batches() {
    let mut doc = Document::new(DocumentConfig::default());
    let container = {
        let mut mutr = doc.mutate();
        let container = mutr.create_element(qual("div"), Vec::new());
        mutr.append_children(0, &[container]);
        container
    };

    let items = LiveNodeList::by_tag_name(container, LocalName::from("li"));
    assert!(items.is_empty(&doc));

    let first = {
        let mut mutr = doc.mutate();
        let li = mutr.create_element(qual("li"), Vec::new());
        mutr.append_children(container, &[li]);
        li
    };
    assert_eq!(items.ids(&doc), vec![first]);

    // An unrelated attribute change also counts as a mutation; the list
    // simply recomputes to the same answer
    doc.mutate()
        .set_attribute(container, qual("class"), "x".into());
    assert_eq!(items.ids(&doc), vec![first]);

    doc.mutate().remove_node(first);
    assert!(items.is_empty(&doc));
}

#[test]
fn id_lookup_follows_attribute_and_tree_changes() {
    let mut doc = Document::new(DocumentConfig::default());
    let div = {
        let mut mutr = doc.mutate();
        let div = mutr.create_element(
            qual("div"),
            vec![Attribute::new(qual("id"), "target".into())],
        );
        mutr.append_children(0, &[div]);
        div
    };
    assert_eq!(doc.element_from_id("target"), Some(div));

    doc.mutate().remove_node(div);
    assert_eq!(doc.element_from_id("target"), None);

    doc.mutate().append_children(0, &[div]);
    assert_eq!(doc.element_from_id("target"), Some(div));

    doc.mutate().remove_attribute(div, &LocalName::from("id"));
    assert_eq!(doc.element_from_id("target"), None);
}
