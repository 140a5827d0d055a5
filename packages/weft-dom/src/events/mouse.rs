//! The click protocol.
//!
//! A click runs in a fixed order: kind-specific state updates that scripts
//! must observe mid-event (checkbox toggles, radio checks, option
//! selection) commit *before* the click event is dispatched and are never
//! rolled back; the default action (change events, navigation, form
//! submission) runs after dispatch and only if no handler vetoed it.

use keyboard_types::Modifiers;
use markup5ever::local_name;
use weft_traits::events::{DomEvent, DomEventData, MouseButtonEvent, MouseEventButton};
use weft_traits::navigation::NavigationOptions;

use super::{EventDriver, EventHandler};
use crate::form;
use crate::node::ElementKind;
use crate::select::{self, SelectionMode};

impl<Handler: EventHandler> EventDriver<'_, Handler> {
    /// Click a node.
    ///
    /// Returns true while this document is still the current page; false
    /// means a handler or the default action navigated away.
    pub fn click(&mut self, target: usize, mouse: MouseButtonEvent) -> bool {
        let Some(element_id) = self.nearest_element(target) else {
            return true;
        };
        if mouse.button != MouseEventButton::Main {
            // Only main-button clicks run the interaction protocol
            let mut event = DomEvent::new(element_id, DomEventData::Click(mouse));
            let outcome = self.dispatch(&mut event);
            return self.page_survived(outcome);
        }

        let actionable = self.actionable_ancestor(element_id);

        // State-update-first kinds commit their mutation before dispatch
        let mut state_changed = false;
        if let Some((action_id, kind)) = actionable {
            if kind.state_update_first() {
                state_changed = self.apply_pre_click_state(action_id, kind, &mouse);
            }
        }

        // Clicking moves focus before the click event fires
        if !self.shift_focus(Some(element_id)) {
            return false;
        }

        let mut event = DomEvent::new(element_id, DomEventData::Click(mouse.clone()));
        let outcome = self.dispatch(&mut event);
        if !self.page_survived(outcome) {
            return false;
        }
        if event.default_prevented || outcome.vetoes_default() {
            return true;
        }

        match actionable {
            Some((action_id, kind)) => {
                self.run_click_default_action(action_id, kind, state_changed, &mouse)
            }
            None => true,
        }
    }

    /// Double-click a node: replays the click protocol, then fires the
    /// dblclick event only if the first click left this page current.
    pub fn double_click(&mut self, target: usize, mouse: MouseButtonEvent) -> bool {
        if !self.click(target, mouse.clone()) {
            return false;
        }
        let Some(element_id) = self.nearest_element(target) else {
            return true;
        };
        let mut event = DomEvent::new(element_id, DomEventData::DoubleClick(mouse));
        let outcome = self.dispatch(&mut event);
        self.page_survived(outcome)
    }

    /// Clicks on text and comment nodes hit their containing element
    fn nearest_element(&self, node_id: usize) -> Option<usize> {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = self.doc.get_node(id)?;
            if node.is_element() {
                return Some(id);
            }
            current = node.parent;
        }
        None
    }

    /// The innermost ancestor-or-self with interaction behavior of its own
    fn actionable_ancestor(&self, element_id: usize) -> Option<(usize, ElementKind)> {
        let mut current = Some(element_id);
        while let Some(id) = current {
            let node = self.doc.get_node(id)?;
            if let Some(element) = node.element_data() {
                if element.kind != ElementKind::Other {
                    return Some((id, element.kind));
                }
            }
            current = node.parent;
        }
        None
    }

    /// Returns whether the element's state actually changed
    fn apply_pre_click_state(
        &mut self,
        element_id: usize,
        kind: ElementKind,
        mouse: &MouseButtonEvent,
    ) -> bool {
        match kind {
            ElementKind::Checkbox => {
                let toggled = self
                    .doc
                    .get_node_mut(element_id)
                    .and_then(|node| node.element_data_mut())
                    .map(|element| {
                        crate::Document::toggle_checkbox(element);
                    })
                    .is_some();
                if toggled {
                    self.doc.note_changed(element_id);
                }
                toggled
            }
            ElementKind::Radio => {
                let already_checked = self
                    .doc
                    .get_node(element_id)
                    .and_then(|node| node.element_data())
                    .and_then(|elem| elem.checkbox_input_checked())
                    .unwrap_or(false);
                if already_checked {
                    return false;
                }
                self.doc.check_radio(element_id);
                true
            }
            ElementKind::OptionElement => {
                let Some((select_id, _)) = self
                    .doc
                    .get_node(element_id)
                    .and_then(|node| node.parent)
                    .and_then(|parent| self.ancestor_select(parent))
                else {
                    return false;
                };
                let mode = if mouse.mods.contains(Modifiers::CONTROL) {
                    SelectionMode::Toggle
                } else if mouse.mods.contains(Modifiers::SHIFT) {
                    SelectionMode::Range
                } else {
                    SelectionMode::Single
                };
                select::select_option(self.doc, select_id, element_id, mode)
            }
            _ => false,
        }
    }

    fn ancestor_select(&self, node_id: usize) -> Option<(usize, ElementKind)> {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = self.doc.get_node(id)?;
            if node
                .element_data()
                .is_some_and(|elem| elem.kind == ElementKind::Select)
            {
                return Some((id, ElementKind::Select));
            }
            current = node.parent;
        }
        None
    }

    fn run_click_default_action(
        &mut self,
        element_id: usize,
        kind: ElementKind,
        state_changed: bool,
        mouse: &MouseButtonEvent,
    ) -> bool {
        match kind {
            // The change event fires exactly once, as part of the default
            // action, and only when the pre-click state update changed
            // something
            ElementKind::Checkbox | ElementKind::Radio => {
                if state_changed {
                    let mut change = DomEvent::new(element_id, DomEventData::Change);
                    let outcome = self.dispatch(&mut change);
                    return self.page_survived(outcome);
                }
                true
            }
            ElementKind::OptionElement => {
                if state_changed {
                    // The change event belongs to the select, not the option
                    if let Some((select_id, _)) = self
                        .doc
                        .get_node(element_id)
                        .and_then(|node| node.parent)
                        .and_then(|parent| self.ancestor_select(parent))
                    {
                        let mut change = DomEvent::new(select_id, DomEventData::Change);
                        let outcome = self.dispatch(&mut change);
                        return self.page_survived(outcome);
                    }
                }
                true
            }
            ElementKind::Anchor => self.follow_link(element_id),
            ElementKind::SubmitInput | ElementKind::ImageInput => {
                self.submit_via_control(element_id)
            }
            ElementKind::Button => {
                let button_type = self
                    .doc
                    .get_node(element_id)
                    .and_then(|node| node.attr(local_name!("type")))
                    .unwrap_or("submit")
                    .to_ascii_lowercase();
                match button_type.as_str() {
                    "submit" => self.submit_via_control(element_id),
                    "reset" => {
                        self.reset_form_of(element_id);
                        true
                    }
                    _ => true,
                }
            }
            ElementKind::Label => {
                // Clicking a label activates its control
                match self.labeled_control(element_id) {
                    Some(control_id) => self.click(control_id, mouse.clone()),
                    None => true,
                }
            }
            ElementKind::TextInput | ElementKind::TextArea => {
                // No coordinates in a headless click: the caret lands at
                // the end of the value
                if let Some(input) = self
                    .doc
                    .get_node_mut(element_id)
                    .and_then(|node| node.element_data_mut())
                    .and_then(|elem| elem.text_input_data_mut())
                {
                    input.move_end(false);
                }
                true
            }
            _ => true,
        }
    }

    /// Navigate to an anchor's href. Returns false (page replaced) when a
    /// navigation was issued.
    fn follow_link(&mut self, element_id: usize) -> bool {
        let Some(href) = self
            .doc
            .get_node(element_id)
            .and_then(|node| node.attr(local_name!("href")))
            .map(String::from)
        else {
            return true;
        };
        // Fragment-only links stay on this page
        if href.starts_with('#') || href.is_empty() {
            return true;
        }
        let Some(url) = self.doc.url().resolve_relative(&href) else {
            let message = format!(
                "href {href:?} does not resolve against {}",
                self.doc.url().as_str()
            );
            self.doc.report_resource_failure(message);
            return true;
        };
        #[cfg(feature = "tracing")]
        tracing::info!("Following link to {}", url.as_str());
        let options = NavigationOptions::new(url, String::new(), self.doc.id());
        self.doc.navigation_provider.navigate_to(options);
        false
    }

    /// Submit the form owning `control_id`, firing the cancelable submit
    /// event first
    pub(crate) fn submit_via_control(&mut self, control_id: usize) -> bool {
        let Some(form_id) = self.doc.form_owner(control_id) else {
            return true;
        };
        let mut submit = DomEvent::new(form_id, DomEventData::Submit);
        let outcome = self.dispatch(&mut submit);
        if !self.page_survived(outcome) {
            return false;
        }
        if submit.default_prevented || outcome.vetoes_default() {
            return true;
        }
        form::submit_form(self.doc, form_id, Some(control_id)).is_none()
    }

    /// Reset every control of the clicked button's form to the state its
    /// attributes describe
    fn reset_form_of(&mut self, control_id: usize) {
        let Some(form_id) = self.doc.form_owner(control_id) else {
            return;
        };
        let controls: Vec<usize> = self.doc.iter_subtree(form_id).skip(1).collect();
        for id in controls {
            if let Some(element) = self
                .doc
                .get_node_mut(id)
                .and_then(|node| node.element_data_mut())
            {
                element.reset_transient_state(false);
            }
            self.doc.note_changed(id);
        }
    }

    /// The control a label activates: the element its `for` attribute
    /// names, or its first labelable descendant.
    ///
    /// Only labelable controls qualify; a `for` attribute pointing at
    /// anything else (another label included) activates nothing.
    fn labeled_control(&self, label_id: usize) -> Option<usize> {
        if let Some(for_attr) = self
            .doc
            .get_node(label_id)
            .and_then(|node| node.attr(local_name!("for")))
        {
            return self.doc.element_from_id(for_attr).filter(|id| {
                self.doc
                    .get_node(*id)
                    .is_some_and(|node| node.is_labelable_control())
            });
        }
        self.doc.iter_subtree(label_id).skip(1).find(|id| {
            self.doc
                .get_node(*id)
                .is_some_and(|node| node.is_labelable_control())
        })
    }
}