//! Event types passed between the DOM and its embedder.

use keyboard_types::{Key, Modifiers};
pub use smol_str::SmolStr;

/// An event targeted at a specific node in the document.
#[derive(Debug, Clone)]
pub struct DomEvent {
    /// The id of the node that the event is targeted at
    pub target: usize,
    /// The event payload
    pub data: DomEventData,
    /// Whether the event bubbles up the tree from its target
    pub bubbles: bool,
    /// Whether the event's default action can be prevented
    pub cancelable: bool,
    /// Set when a handler called `prevent_default`
    pub default_prevented: bool,
}

impl DomEvent {
    pub fn new(target: usize, data: DomEventData) -> Self {
        let bubbles = data.bubbles();
        let cancelable = data.cancelable();
        Self {
            target,
            data,
            bubbles,
            cancelable,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// The DOM name of the event ("click", "input", etc)
    pub fn name(&self) -> &'static str {
        self.data.name()
    }
}

/// The per-event-kind payload of a [`DomEvent`]
#[derive(Debug, Clone)]
pub enum DomEventData {
    Click(MouseButtonEvent),
    DoubleClick(MouseButtonEvent),
    KeyDown(KeyEvent),
    KeyPress(KeyEvent),
    KeyUp(KeyEvent),
    Input(InputEvent),
    Change,
    Focus,
    Blur,
    Submit,
}

impl DomEventData {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Click(_) => "click",
            Self::DoubleClick(_) => "dblclick",
            Self::KeyDown(_) => "keydown",
            Self::KeyPress(_) => "keypress",
            Self::KeyUp(_) => "keyup",
            Self::Input(_) => "input",
            Self::Change => "change",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Submit => "submit",
        }
    }

    pub fn bubbles(&self) -> bool {
        // Focus and blur are the two non-bubbling events we emit
        !matches!(self, Self::Focus | Self::Blur)
    }

    pub fn cancelable(&self) -> bool {
        !matches!(self, Self::Focus | Self::Blur | Self::Change | Self::Input(_))
    }
}

/// A mouse button press targeted at a node.
///
/// There is no layout engine in a headless document, so clicks carry no
/// coordinates: they are addressed directly at a node id by the driver.
#[derive(Debug, Clone, Default)]
pub struct MouseButtonEvent {
    pub button: MouseEventButton,
    pub mods: Modifiers,
}

impl MouseButtonEvent {
    pub fn new(button: MouseEventButton, mods: Modifiers) -> Self {
        Self { button, mods }
    }
}

/// The button that triggered a mouse event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MouseEventButton {
    #[default]
    Main,
    Auxiliary,
    Secondary,
}

/// Whether a key event represents a press or a release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

impl KeyState {
    pub fn is_pressed(self) -> bool {
        self == Self::Pressed
    }
}

/// A keyboard event targeted at the focused node
#[derive(Debug, Clone)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub state: KeyState,
    pub is_auto_repeating: bool,
    pub is_composing: bool,
}

impl KeyEvent {
    pub fn press(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            state: KeyState::Pressed,
            is_auto_repeating: false,
            is_composing: false,
        }
    }
}

/// An input event carrying the control's new value
#[derive(Debug, Clone)]
pub struct InputEvent {
    pub value: String,
}

/// The result of running script event handlers for a dispatched event.
///
/// The DOM treats this as an opaque three-valued signal: no handler ran,
/// a handler vetoed the default action, or a handler triggered navigation
/// to a (possibly different) document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// No script handler was registered for the event
    NoHandler,
    /// A handler ran and its result vetoes the default action
    Veto,
    /// A handler ran and navigation occurred; carries the id of the
    /// document that is current after the handler returned
    Navigated(usize),
}

impl HandlerOutcome {
    /// Whether this outcome suppresses the event's default action
    pub fn vetoes_default(&self) -> bool {
        matches!(self, Self::Veto)
    }
}
