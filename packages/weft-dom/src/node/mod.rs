#![allow(clippy::module_inception)]

mod attributes;
pub mod element;
mod node;
mod text;

pub use attributes::{Attribute, Attributes};
pub use element::{
    ElementData, ElementKind, FrameData, OptionData, ScriptData, SelectData, SpecialElementData,
    TextInputData,
};
pub use node::*;
pub use text::TextNodeData;
