use bitflags::bitflags;
use markup5ever::{LocalName, QualName, local_name};

use super::{Attribute, ElementData, TextNodeData};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u32 {
        /// Whether the node is connected to the document's root
        const IS_IN_DOCUMENT = 0b0000_0001;
    }
}

impl NodeFlags {
    pub fn is_in_document(&self) -> bool {
        self.contains(Self::IS_IN_DOCUMENT)
    }
}

/// A node in the DOM tree.
///
/// Tree shape is stored as a parent id plus an ordered child id list.
/// Sibling relationships are derived from the parent's child list, which
/// makes "a node appears at most once among its parent's children" hold
/// by construction.
#[derive(Debug, Clone)]
pub struct Node {
    /// The node's id within the document's arena
    pub id: usize,
    /// The parent's id, or None for detached nodes and the document root
    pub parent: Option<usize>,
    /// Child ids, in tree order
    pub children: Vec<usize>,
    pub flags: NodeFlags,
    /// Node type (Element, Text, Comment) and associated data
    pub data: NodeData,
}

/// The different kinds of nodes in the DOM tree
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The document root node
    Document,
    /// A detached subtree root created by the mutation API
    DocumentFragment,
    /// An element node
    Element(ElementData),
    /// A text node
    Text(TextNodeData),
    /// A comment node
    Comment(TextNodeData),
}

impl NodeData {
    pub fn downcast_element(&self) -> Option<&ElementData> {
        match self {
            Self::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn downcast_element_mut(&mut self) -> Option<&mut ElementData> {
        match self {
            Self::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_element_with_tag_name(&self, name: &impl PartialEq<LocalName>) -> bool {
        match self.downcast_element() {
            Some(elem) => *name == elem.name.local,
            None => false,
        }
    }
}

impl Node {
    pub fn new(id: usize, data: NodeData) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            flags: NodeFlags::empty(),
            data,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn is_text_node(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Whether this node's data participates in CharacterData operations
    pub fn is_character_data(&self) -> bool {
        matches!(self.data, NodeData::Text(_) | NodeData::Comment(_))
    }

    pub fn element_data(&self) -> Option<&ElementData> {
        self.data.downcast_element()
    }

    pub fn element_data_mut(&mut self) -> Option<&mut ElementData> {
        self.data.downcast_element_mut()
    }

    /// The string payload of a text or comment node
    pub fn character_data(&self) -> Option<&TextNodeData> {
        match &self.data {
            NodeData::Text(data) | NodeData::Comment(data) => Some(data),
            _ => None,
        }
    }

    pub fn character_data_mut(&mut self) -> Option<&mut TextNodeData> {
        match &mut self.data {
            NodeData::Text(data) | NodeData::Comment(data) => Some(data),
            _ => None,
        }
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(data) => Some(&data.content),
            _ => None,
        }
    }

    pub fn attrs(&self) -> Option<&[Attribute]> {
        Some(self.element_data()?.attrs())
    }

    pub fn attr(&self, name: LocalName) -> Option<&str> {
        self.element_data()?.attr(name)
    }

    /// The index of `child_id` within this node's child list
    pub fn index_of_child(&self, child_id: usize) -> Option<usize> {
        self.children.iter().position(|id| *id == child_id)
    }

    pub fn tag_name(&self) -> Option<&QualName> {
        self.element_data().map(|elem| &elem.name)
    }

    /// Whether this element can be activated through a `<label>`
    pub fn is_labelable_control(&self) -> bool {
        self.element_data().is_some_and(|elem| {
            matches!(
                elem.name.local,
                local_name!("input")
                    | local_name!("select")
                    | local_name!("textarea")
                    | local_name!("button")
            )
        })
    }

    /// One-line description for tree debug output
    pub fn node_debug_str(&self) -> String {
        match &self.data {
            NodeData::Document => "DOCUMENT".to_string(),
            NodeData::DocumentFragment => "FRAGMENT".to_string(),
            NodeData::Text(data) => {
                let content = data.content.trim();
                if content.len() > 10 {
                    let content: String = content.chars().take(10).collect();
                    format!("TEXT {:?}...", content)
                } else {
                    format!("TEXT {:?}", content)
                }
            }
            NodeData::Comment(_) => "COMMENT".to_string(),
            NodeData::Element(data) => {
                let name = &data.name.local;
                match &data.id {
                    Some(id) => format!("<{} id={:?}>", name, id),
                    None => format!("<{}>", name),
                }
            }
        }
    }
}
