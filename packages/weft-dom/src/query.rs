use std::cell::RefCell;

use markup5ever::{LocalName, local_name};

use crate::document::Document;
use crate::node::Node;

/// A live list of nodes under an anchor node.
///
/// The list is defined by a predicate over the anchor's descendants and
/// re-evaluates itself lazily: results are cached together with the
/// document's mutation generation, and any tree mutation (which bumps the
/// generation) invalidates the cache. Reads between mutations are answered
/// from the cache.
pub struct LiveNodeList {
    anchor: usize,
    matcher: Box<dyn Fn(&Node) -> bool>,
    cache: RefCell<Option<(u64, Vec<usize>)>>,
}

impl LiveNodeList {
    pub fn new(anchor: usize, matcher: Box<dyn Fn(&Node) -> bool>) -> Self {
        Self {
            anchor,
            matcher,
            cache: RefCell::new(None),
        }
    }

    /// All descendants of the anchor with the given tag name, in tree order
    pub fn by_tag_name(anchor: usize, tag: LocalName) -> Self {
        Self::new(
            anchor,
            Box::new(move |node| node.data.is_element_with_tag_name(&tag)),
        )
    }

    /// All descendant elements with a matching `name` attribute
    pub fn by_name_attr(anchor: usize, name: String) -> Self {
        Self::new(
            anchor,
            Box::new(move |node| node.attr(local_name!("name")) == Some(name.as_str())),
        )
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// The matching node ids, in tree order
    pub fn ids(&self, doc: &Document) -> Vec<usize> {
        let generation = doc.mutation_generation();
        let mut cache = self.cache.borrow_mut();
        match &*cache {
            Some((cached_generation, ids)) if *cached_generation == generation => ids.clone(),
            _ => {
                let ids = self.compute(doc);
                *cache = Some((generation, ids.clone()));
                ids
            }
        }
    }

    pub fn len(&self, doc: &Document) -> usize {
        self.ids(doc).len()
    }

    pub fn is_empty(&self, doc: &Document) -> bool {
        self.len(doc) == 0
    }

    pub fn item(&self, doc: &Document, index: usize) -> Option<usize> {
        self.ids(doc).get(index).copied()
    }

    /// Evaluate the matcher over the anchor's descendants (the anchor
    /// itself is not a candidate)
    fn compute(&self, doc: &Document) -> Vec<usize> {
        doc.iter_subtree(self.anchor)
            .skip(1)
            .filter(|id| {
                doc.get_node(*id)
                    .is_some_and(|node| (self.matcher)(node))
            })
            .collect()
    }
}
