//! Shared traits and types for the Weft headless browser engine.
//!
//! The core DOM crate ([weft-dom](https://docs.rs/weft-dom)) is designed to be
//! embedded in and "driven" by external code. The collaborator seams it needs -
//! event plumbing, navigation, page loading and script execution - are defined
//! here so that embedders can provide their own implementations without
//! depending on the DOM crate itself.

pub mod events;
pub mod navigation;
pub mod net;
pub mod script;
