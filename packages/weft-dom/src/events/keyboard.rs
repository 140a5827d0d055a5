//! Keyboard interaction: dispatch plus the default editing actions of the
//! focussed element.

use keyboard_types::{Key, Modifiers, NamedKey};
use weft_traits::events::{DomEvent, DomEventData, InputEvent, KeyEvent};

use super::{EventDriver, EventHandler};
use crate::node::ElementKind;

impl<Handler: EventHandler> EventDriver<'_, Handler> {
    /// Press a key against the focussed element (or the document when
    /// nothing is focussed).
    ///
    /// Dispatches keydown (and keypress for character keys), then runs the
    /// default action unless a handler vetoed it. Returns true while this
    /// document is still the current page.
    pub fn key_down(&mut self, key_event: KeyEvent) -> bool {
        let target = self.doc.focussed_node_id().unwrap_or(0);

        let mut down = DomEvent::new(target, DomEventData::KeyDown(key_event.clone()));
        let outcome = self.dispatch(&mut down);
        if !self.page_survived(outcome) {
            return false;
        }
        let mut vetoed = down.default_prevented || outcome.vetoes_default();

        if matches!(key_event.key, Key::Character(_)) {
            let mut press = DomEvent::new(target, DomEventData::KeyPress(key_event.clone()));
            let outcome = self.dispatch(&mut press);
            if !self.page_survived(outcome) {
                return false;
            }
            vetoed |= press.default_prevented || outcome.vetoes_default();
        }

        if vetoed {
            return true;
        }
        self.run_key_default_action(target, &key_event)
    }

    pub fn key_up(&mut self, key_event: KeyEvent) -> bool {
        let target = self.doc.focussed_node_id().unwrap_or(0);
        let mut up = DomEvent::new(target, DomEventData::KeyUp(key_event));
        let outcome = self.dispatch(&mut up);
        self.page_survived(outcome)
    }

    /// Type a string into the focussed element, one key press per character
    pub fn type_text(&mut self, text: &str) -> bool {
        for ch in text.chars() {
            let key = Key::Character(ch.to_string().into());
            if !self.key_down(KeyEvent::press(key, Modifiers::empty())) {
                return false;
            }
        }
        true
    }

    fn run_key_default_action(&mut self, target: usize, key_event: &KeyEvent) -> bool {
        let shift = key_event.modifiers.contains(Modifiers::SHIFT);

        // Tab moves focus whether or not anything is focussed
        if key_event.key == Key::Named(NamedKey::Tab) {
            let direction = if shift { -1 } else { 1 };
            let next = self.doc.nearest_focussable(direction);
            return self.shift_focus(next);
        }

        let Some(kind) = self
            .doc
            .get_node(target)
            .and_then(|node| node.element_data())
            .map(|elem| elem.kind)
        else {
            return true;
        };

        match kind {
            ElementKind::TextInput | ElementKind::TextArea => {
                self.apply_text_editing(target, kind, key_event)
            }
            ElementKind::Checkbox | ElementKind::Radio => {
                // Space activates like a click
                if key_event.key == Key::Character(" ".into()) {
                    let changed = self.apply_pre_click_state_for_key(target, kind);
                    if changed {
                        let mut change = DomEvent::new(target, DomEventData::Change);
                        let outcome = self.dispatch(&mut change);
                        return self.page_survived(outcome);
                    }
                }
                true
            }
            ElementKind::Anchor => {
                if key_event.key == Key::Named(NamedKey::Enter) {
                    return self.click(target, Default::default());
                }
                true
            }
            ElementKind::SubmitInput | ElementKind::Button => {
                if key_event.key == Key::Named(NamedKey::Enter) {
                    return self.submit_via_control(target);
                }
                true
            }
            _ => true,
        }
    }

    /// Keyboard activation of a checkbox or radio mirrors the pre-click
    /// state update of the click protocol
    fn apply_pre_click_state_for_key(&mut self, target: usize, kind: ElementKind) -> bool {
        match kind {
            ElementKind::Checkbox => {
                let toggled = self
                    .doc
                    .get_node_mut(target)
                    .and_then(|node| node.element_data_mut())
                    .map(|element| {
                        crate::Document::toggle_checkbox(element);
                    })
                    .is_some();
                if toggled {
                    self.doc.note_changed(target);
                }
                toggled
            }
            ElementKind::Radio => {
                let already_checked = self
                    .doc
                    .get_node(target)
                    .and_then(|node| node.element_data())
                    .and_then(|elem| elem.checkbox_input_checked())
                    .unwrap_or(false);
                if already_checked {
                    return false;
                }
                self.doc.check_radio(target);
                true
            }
            _ => false,
        }
    }

    /// The text-editing state machine of input and textarea elements.
    ///
    /// Every edit that changes the value fires an input event carrying the
    /// new value. Caret motion fires nothing.
    fn apply_text_editing(&mut self, target: usize, kind: ElementKind, key_event: &KeyEvent) -> bool {
        let shift = key_event.modifiers.contains(Modifiers::SHIFT);
        let word = key_event.modifiers.contains(Modifiers::CONTROL);
        let is_multiline = kind == ElementKind::TextArea;

        enum Outcome {
            Edited(String),
            Moved,
            SubmitLine,
            Ignored,
        }

        let outcome = {
            let Some(input) = self
                .doc
                .get_node_mut(target)
                .and_then(|node| node.element_data_mut())
                .and_then(|elem| elem.text_input_data_mut())
            else {
                return true;
            };

            match &key_event.key {
                Key::Character(text) => {
                    input.insert_str(text);
                    Outcome::Edited(input.value().to_string())
                }
                Key::Named(NamedKey::Backspace) => {
                    if input.backspace() {
                        Outcome::Edited(input.value().to_string())
                    } else {
                        // Backspace with the caret at offset 0 edits nothing
                        Outcome::Ignored
                    }
                }
                Key::Named(NamedKey::Delete) => {
                    if input.delete_forward() {
                        Outcome::Edited(input.value().to_string())
                    } else {
                        Outcome::Ignored
                    }
                }
                Key::Named(NamedKey::ArrowLeft) => {
                    input.move_left(shift, word);
                    Outcome::Moved
                }
                Key::Named(NamedKey::ArrowRight) => {
                    input.move_right(shift, word);
                    Outcome::Moved
                }
                Key::Named(NamedKey::Home) => {
                    input.move_home(shift);
                    Outcome::Moved
                }
                Key::Named(NamedKey::End) => {
                    input.move_end(shift);
                    Outcome::Moved
                }
                Key::Named(NamedKey::Enter) => {
                    if is_multiline {
                        input.insert_str("\n");
                        Outcome::Edited(input.value().to_string())
                    } else {
                        Outcome::SubmitLine
                    }
                }
                Key::Named(NamedKey::Escape) => {
                    if input.has_value_changed() {
                        input.revert_to_original_value();
                        Outcome::Edited(input.value().to_string())
                    } else {
                        Outcome::Ignored
                    }
                }
                _ => Outcome::Ignored,
            }
        };

        match outcome {
            Outcome::Edited(value) => {
                self.doc.note_changed(target);
                let mut input_event =
                    DomEvent::new(target, DomEventData::Input(InputEvent { value }));
                let outcome = self.dispatch(&mut input_event);
                self.page_survived(outcome)
            }
            // Enter in a single-line input submits the owning form
            Outcome::SubmitLine => self.submit_via_control(target),
            Outcome::Moved | Outcome::Ignored => true,
        }
    }
}
