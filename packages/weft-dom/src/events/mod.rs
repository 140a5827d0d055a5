//! The event driver: entry point for synthetic user interaction.
//!
//! The driver owns the per-element interaction state machines. An embedder
//! feeds it clicks and key presses; the driver updates element state, runs
//! the script handler chain through its [`EventHandler`], and performs
//! default actions (navigation, form submission, text editing) unless a
//! handler vetoed them.

mod keyboard;
mod mouse;

pub use weft_traits::events::{
    DomEvent, DomEventData, HandlerOutcome, InputEvent, KeyEvent, KeyState, MouseButtonEvent,
    MouseEventButton,
};

use crate::document::Document;

/// The embedder's script side of event dispatch.
///
/// For every event the DOM dispatches, the handler runs whatever script
/// handlers are registered along the event's path (the handler owns
/// bubbling) and reports the result as an opaque [`HandlerOutcome`]. The
/// handler may mutate the document through normal APIs while doing so.
pub trait EventHandler {
    fn handle_event(&mut self, doc: &mut Document, event: &mut DomEvent) -> HandlerOutcome;
}

/// An [`EventHandler`] for documents without script: no handler ever runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventHandler;

impl EventHandler for NoopEventHandler {
    fn handle_event(&mut self, _doc: &mut Document, _event: &mut DomEvent) -> HandlerOutcome {
        HandlerOutcome::NoHandler
    }
}

/// Drives user interaction against a document.
pub struct EventDriver<'doc, Handler: EventHandler> {
    doc: &'doc mut Document,
    handler: Handler,
}

impl<'doc, Handler: EventHandler> EventDriver<'doc, Handler> {
    pub fn new(doc: &'doc mut Document, handler: Handler) -> Self {
        Self { doc, handler }
    }

    pub fn doc(&self) -> &Document {
        self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        self.doc
    }

    /// Dispatch an event through the handler chain. Postponed actions the
    /// handlers caused are drained before returning.
    pub(crate) fn dispatch(&mut self, event: &mut DomEvent) -> HandlerOutcome {
        #[cfg(feature = "tracing")]
        tracing::debug!("Dispatching {} (target {})", event.name(), event.target);
        let outcome = self.handler.handle_event(self.doc, event);
        self.doc.process_postponed_actions();
        outcome
    }

    /// Whether this document is still the current page after a handler ran
    pub(crate) fn page_survived(&self, outcome: HandlerOutcome) -> bool {
        match outcome {
            HandlerOutcome::Navigated(doc_id) => doc_id == self.doc.id(),
            _ => true,
        }
    }

    /// Move focus, firing the change/blur/focus sequence.
    ///
    /// An edited text input fires its change event when it loses focus.
    /// Returns false when a handler navigated away mid-sequence.
    pub(crate) fn shift_focus(&mut self, new_target: Option<usize>) -> bool {
        let old_target = self.doc.focussed_node_id();
        if old_target == new_target {
            return true;
        }

        if let Some(old_id) = old_target {
            let edited = self
                .doc
                .get_node(old_id)
                .and_then(|node| node.element_data())
                .and_then(|elem| elem.text_input_data())
                .is_some_and(|input| input.has_value_changed());
            if edited {
                if let Some(input) = self
                    .doc
                    .get_node_mut(old_id)
                    .and_then(|node| node.element_data_mut())
                    .and_then(|elem| elem.text_input_data_mut())
                {
                    input.capture_original_value();
                }
                let mut change = DomEvent::new(old_id, DomEventData::Change);
                let outcome = self.dispatch(&mut change);
                if !self.page_survived(outcome) {
                    return false;
                }
            }
            let mut blur = DomEvent::new(old_id, DomEventData::Blur);
            let outcome = self.dispatch(&mut blur);
            if !self.page_survived(outcome) {
                return false;
            }
        }

        match new_target {
            Some(new_id) => {
                if self.doc.set_focus_to(new_id) {
                    let mut focus = DomEvent::new(new_id, DomEventData::Focus);
                    let outcome = self.dispatch(&mut focus);
                    if !self.page_survived(outcome) {
                        return false;
                    }
                } else {
                    self.doc.clear_focus();
                }
            }
            None => self.doc.clear_focus(),
        }
        true
    }
}
