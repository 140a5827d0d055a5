//! Weft-dom is a headless HTML document implementation designed to emulate
//! how a browser-rendered page behaves without rendering anything.
//!
//! It provides a [`Document`] with a slab-backed node tree, a mutation API
//! ([`DocumentMutator`]), DOM cursors ([`TreeWalker`], [`NodeIterator`]),
//! and an event driver ([`EventDriver`]) that models per-element interaction
//! state machines for clicks and keyboard input.
//!
//! The nodes in the tree are laid out in a slab and addressed by `usize`
//! ids. Tree shape is a parent id plus an ordered child list on every node,
//! so each node has exactly one position in the tree at any time.

mod config;
mod document;
mod mutator;
mod query;
mod select;
mod serialize;
mod traversal;
mod url;
mod util;

pub mod events;
pub mod form;
pub mod node;
pub mod script;

pub use config::DocumentConfig;
pub use document::Document;
pub use events::{EventDriver, EventHandler, NoopEventHandler};
pub use mutator::DocumentMutator;
pub use node::{Attribute, Attributes, ElementData, ElementKind, Node, NodeData, TextNodeData};
pub use query::LiveNodeList;
pub use script::PostponedAction;
pub use select::SelectionMode;
pub use serialize::HtmlSerializer;
pub use traversal::{FilterResult, NodeFilter, NodeIterator, TreeWalker, WhatToShow};
pub use url::DocumentUrl;

pub use markup5ever::{LocalName, Namespace, Prefix, QualName, local_name, namespace_url, ns};

/// Errors reported by the DOM mutation and CharacterData APIs.
///
/// Whether a given failure is reported or silently ignored is governed by
/// the document's strictness policy; operations that can fail always return
/// `Result` and the policy is applied by the caller-facing layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The requested tree mutation would violate the tree structure, for
    /// example inserting a node into its own subtree
    #[error("hierarchy request error")]
    HierarchyRequest,

    /// The reference node passed to a mutation was not where the caller
    /// claimed it was (e.g. removeChild of a non-child)
    #[error("node not found")]
    NotFound,

    /// A character offset was out of range for the data it indexes
    #[error("index {index} out of range for data of length {len}")]
    IndexSize { index: usize, len: usize },

    /// A node id did not resolve to a live node in the document's arena
    #[error("no node with id {0}")]
    NoSuchNode(usize),

    /// A postponed action failed after the mutation that queued it had
    /// already completed; carries a description of the failure
    #[error("deferred action failed: {0}")]
    Deferred(String),
}
