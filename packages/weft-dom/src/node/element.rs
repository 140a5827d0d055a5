use std::str::FromStr;

use markup5ever::{LocalName, QualName, local_name};
use url::Url;

use super::{Attribute, Attributes};

#[derive(Debug, Clone)]
pub struct ElementData {
    /// The element's tag name, namespace and prefix
    pub name: QualName,

    /// The element's id attribute (if it has one)
    pub id: Option<String>,

    /// The element's attributes
    pub attrs: Attributes,

    /// Whether the element is focussable
    pub is_focussable: bool,

    /// The interaction kind of the element, resolved once from the tag name
    /// and `type` attribute
    pub kind: ElementKind,

    /// Heterogeneous data that depends on the element's type.
    /// For example:
    ///   - The selection delegate for input/textarea elements
    ///   - The checked state for checkbox/radio inputs
    ///   - The selectedness for option elements
    pub special_data: SpecialElementData,
}

/// The closed set of element kinds with interaction behavior of their own.
///
/// Everything the engine doesn't know falls into `Other`, which carries no
/// special state and no default click action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Anchor,
    Button,
    SubmitInput,
    ImageInput,
    Checkbox,
    Radio,
    TextInput,
    TextArea,
    Select,
    OptionElement,
    Label,
    Script,
    Frame,
    Form,
    Other,
}

impl ElementKind {
    /// Resolve the kind from a tag name and (for `<input>`) the `type`
    /// attribute. Total over all inputs: unknown tags map to `Other`.
    pub fn from_name(name: &QualName, attrs: &Attributes) -> Self {
        match name.local {
            local_name!("a") | local_name!("area") => ElementKind::Anchor,
            local_name!("button") => ElementKind::Button,
            local_name!("select") => ElementKind::Select,
            local_name!("option") => ElementKind::OptionElement,
            local_name!("label") => ElementKind::Label,
            local_name!("script") => ElementKind::Script,
            local_name!("frame") | local_name!("iframe") => ElementKind::Frame,
            local_name!("form") => ElementKind::Form,
            local_name!("textarea") => ElementKind::TextArea,
            local_name!("input") => match attrs.get(&local_name!("type")) {
                Some("checkbox") => ElementKind::Checkbox,
                Some("radio") => ElementKind::Radio,
                Some("submit") => ElementKind::SubmitInput,
                Some("image") => ElementKind::ImageInput,
                Some("hidden" | "button" | "reset" | "file") => ElementKind::Other,
                _ => ElementKind::TextInput,
            },
            _ => ElementKind::Other,
        }
    }

    /// Whether the element mutates its internal state *before* the click
    /// event is dispatched, so that script observers see the post-toggle
    /// state during the event.
    pub fn state_update_first(self) -> bool {
        matches!(
            self,
            ElementKind::Checkbox | ElementKind::Radio | ElementKind::OptionElement
        )
    }
}

/// Heterogeneous data that depends on the element's type.
#[derive(Debug, Clone, Default)]
pub enum SpecialElementData {
    /// Selection delegate for text inputs and textareas
    TextInput(TextInputData),
    /// Checkbox/radio checked state
    CheckboxInput(bool),
    /// Session state for `<select>` elements
    Select(SelectData),
    /// Selectedness for `<option>` elements
    OptionElement(OptionData),
    /// Execution state for `<script>` elements
    Script(ScriptData),
    /// Load state for `<frame>`/`<iframe>` elements
    Frame(FrameData),
    /// No data (for nodes that don't need any node-specific data)
    #[default]
    None,
}

impl SpecialElementData {
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl ElementData {
    pub fn new(name: QualName, attrs: Vec<Attribute>) -> Self {
        let attrs = Attributes::new(attrs);
        let id_attr = attrs.get(&local_name!("id")).map(|value| value.to_string());
        let kind = ElementKind::from_name(&name, &attrs);
        let special_data = initial_special_data(kind, &attrs);

        let mut data = ElementData {
            name,
            id: id_attr,
            attrs,
            is_focussable: false,
            kind,
            special_data,
        };
        data.flush_is_focussable();
        data
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    pub fn attr(&self, name: impl PartialEq<LocalName>) -> Option<&str> {
        let attr = self.attrs.iter().find(|attr| name == attr.name.local)?;
        Some(&attr.value)
    }

    pub fn attr_parsed<T: FromStr>(&self, name: impl PartialEq<LocalName>) -> Option<T> {
        let attr = self.attrs.iter().find(|attr| name == attr.name.local)?;
        attr.value.parse::<T>().ok()
    }

    /// Detects the presence of the attribute, treating *any* value as truthy.
    pub fn has_attr(&self, name: impl PartialEq<LocalName>) -> bool {
        self.attrs.iter().any(|attr| name == attr.name.local)
    }

    pub fn text_input_data(&self) -> Option<&TextInputData> {
        match &self.special_data {
            SpecialElementData::TextInput(data) => Some(data),
            _ => None,
        }
    }

    pub fn text_input_data_mut(&mut self) -> Option<&mut TextInputData> {
        match &mut self.special_data {
            SpecialElementData::TextInput(data) => Some(data),
            _ => None,
        }
    }

    pub fn checkbox_input_checked(&self) -> Option<bool> {
        match self.special_data {
            SpecialElementData::CheckboxInput(checked) => Some(checked),
            _ => None,
        }
    }

    pub fn checkbox_input_checked_mut(&mut self) -> Option<&mut bool> {
        match self.special_data {
            SpecialElementData::CheckboxInput(ref mut checked) => Some(checked),
            _ => None,
        }
    }

    pub fn select_data(&self) -> Option<&SelectData> {
        match &self.special_data {
            SpecialElementData::Select(data) => Some(data),
            _ => None,
        }
    }

    pub fn select_data_mut(&mut self) -> Option<&mut SelectData> {
        match &mut self.special_data {
            SpecialElementData::Select(data) => Some(data),
            _ => None,
        }
    }

    pub fn option_data(&self) -> Option<&OptionData> {
        match &self.special_data {
            SpecialElementData::OptionElement(data) => Some(data),
            _ => None,
        }
    }

    pub fn option_data_mut(&mut self) -> Option<&mut OptionData> {
        match &mut self.special_data {
            SpecialElementData::OptionElement(data) => Some(data),
            _ => None,
        }
    }

    pub fn script_data_mut(&mut self) -> Option<&mut ScriptData> {
        match &mut self.special_data {
            SpecialElementData::Script(data) => Some(data),
            _ => None,
        }
    }

    pub fn frame_data(&self) -> Option<&FrameData> {
        match &self.special_data {
            SpecialElementData::Frame(data) => Some(data),
            _ => None,
        }
    }

    pub fn frame_data_mut(&mut self) -> Option<&mut FrameData> {
        match &mut self.special_data {
            SpecialElementData::Frame(data) => Some(data),
            _ => None,
        }
    }

    /// Whether this element's select mode allows multiple selected options
    pub fn is_multiple_select(&self) -> bool {
        self.kind == ElementKind::Select && self.has_attr(local_name!("multiple"))
    }

    /// Recompute the element's kind after a `type` attribute change. A kind
    /// change discards the old kind's state and initializes the new kind's
    /// state from the current attributes.
    pub fn recompute_kind(&mut self) {
        let kind = ElementKind::from_name(&self.name, &self.attrs);
        if kind != self.kind {
            self.kind = kind;
            self.special_data = initial_special_data(kind, &self.attrs);
        }
    }

    /// Re-derive element-kind-specific state for a clone.
    ///
    /// Transient session state (selection delegates, executed flags, frame
    /// loads, last-selected indices) is freshly initialized rather than
    /// copied; durable state is recomputed from the copied attributes. When
    /// `checkbox_clone_copies_state` is set, a cloned checkbox keeps the
    /// original's live checked state instead (browser compatibility quirk).
    pub fn reset_transient_state(&mut self, checkbox_clone_copies_state: bool) {
        let live_checked = self.checkbox_input_checked();
        self.special_data = initial_special_data(self.kind, &self.attrs);
        if checkbox_clone_copies_state {
            if let (Some(live), Some(checked)) = (live_checked, self.checkbox_input_checked_mut()) {
                *checked = live;
            }
        }
    }

    pub fn flush_is_focussable(&mut self) {
        let disabled: bool = self.attr_parsed(local_name!("disabled")).unwrap_or(false);
        let tabindex: Option<i32> = self.attr_parsed(local_name!("tabindex"));

        self.is_focussable = !disabled
            && match tabindex {
                Some(index) => index >= 0,
                None => {
                    // Some focusable HTML elements have a default tabindex value of 0 set under the hood by the user agent.
                    // These elements are:
                    //   - <a> or <area> with href attribute
                    //   - <button>, <frame>, <iframe>, <input>, <select>, <textarea>
                    if [local_name!("a"), local_name!("area")].contains(&self.name.local) {
                        self.attr(local_name!("href")).is_some()
                    } else {
                        const DEFAULT_FOCUSSABLE_ELEMENTS: [LocalName; 6] = [
                            local_name!("button"),
                            local_name!("input"),
                            local_name!("select"),
                            local_name!("textarea"),
                            local_name!("frame"),
                            local_name!("iframe"),
                        ];
                        DEFAULT_FOCUSSABLE_ELEMENTS.contains(&self.name.local)
                    }
                }
            }
    }
}

fn initial_special_data(kind: ElementKind, attrs: &Attributes) -> SpecialElementData {
    match kind {
        ElementKind::TextInput => SpecialElementData::TextInput(TextInputData::new(
            attrs.get(&local_name!("value")).unwrap_or(""),
            false,
        )),
        ElementKind::TextArea => SpecialElementData::TextInput(TextInputData::new("", true)),
        ElementKind::Checkbox | ElementKind::Radio => {
            SpecialElementData::CheckboxInput(attrs.contains(&local_name!("checked")))
        }
        ElementKind::Select => SpecialElementData::Select(SelectData::default()),
        ElementKind::OptionElement => SpecialElementData::OptionElement(OptionData {
            selected: attrs.contains(&local_name!("selected")),
        }),
        ElementKind::Script => SpecialElementData::Script(ScriptData::default()),
        ElementKind::Frame => SpecialElementData::Frame(FrameData::default()),
        _ => SpecialElementData::None,
    }
}

/// The selection delegate of a text-editable element: the element's current
/// value plus a `[start, end]` character range into it.
///
/// Both offsets are clamped to `[0, len]` and `start <= end` always holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInputData {
    value: String,
    selection_start: usize,
    selection_end: usize,
    /// Whether the input is a singleline or multiline input
    pub is_multiline: bool,
    /// Value when focus was gained, for change-event detection and
    /// Escape-key revert
    pub original_value: String,
}

impl TextInputData {
    pub fn new(value: &str, is_multiline: bool) -> Self {
        Self {
            value: value.to_string(),
            selection_start: 0,
            selection_end: 0,
            is_multiline,
            original_value: value.to_string(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the whole value and collapse the selection to the end
    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        let len = self.char_len();
        self.selection_start = len;
        self.selection_end = len;
    }

    pub fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn selection_start(&self) -> usize {
        self.selection_start
    }

    pub fn selection_end(&self) -> usize {
        self.selection_end
    }

    pub fn set_selection_start(&mut self, start: usize) {
        self.selection_start = start.min(self.char_len());
        if self.selection_end < self.selection_start {
            self.selection_end = self.selection_start;
        }
    }

    pub fn set_selection_end(&mut self, end: usize) {
        self.selection_end = end.min(self.char_len());
        if self.selection_start > self.selection_end {
            self.selection_start = self.selection_end;
        }
    }

    pub fn select_all(&mut self) {
        self.selection_start = 0;
        self.selection_end = self.char_len();
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len())
    }

    /// Replace the selected range with `text` and collapse the cursor to
    /// just after the insertion.
    pub fn insert_str(&mut self, text: &str) {
        let start = self.byte_index(self.selection_start);
        let end = self.byte_index(self.selection_end);
        self.value.replace_range(start..end, text);
        let cursor = self.selection_start + text.chars().count();
        self.selection_start = cursor;
        self.selection_end = cursor;
    }

    /// Delete the selection, or the character immediately before the cursor.
    /// A no-op when the cursor is collapsed at offset 0.
    pub fn backspace(&mut self) -> bool {
        if self.selection_start != self.selection_end {
            self.insert_str("");
            return true;
        }
        if self.selection_start == 0 {
            return false;
        }
        self.selection_start -= 1;
        self.insert_str("");
        true
    }

    /// Delete the selection, or the character immediately after the cursor
    pub fn delete_forward(&mut self) -> bool {
        if self.selection_start != self.selection_end {
            self.insert_str("");
            return true;
        }
        if self.selection_end >= self.char_len() {
            return false;
        }
        self.selection_end += 1;
        self.insert_str("");
        true
    }

    /// Move the cursor left. With `extend`, grows the selection instead of
    /// collapsing it; with `word`, jumps to the previous whitespace-delimited
    /// word boundary.
    pub fn move_left(&mut self, extend: bool, word: bool) {
        let target = if word {
            self.previous_word_boundary(self.selection_start)
        } else {
            self.selection_start.saturating_sub(1)
        };
        if extend {
            self.selection_start = target;
        } else if self.selection_start != self.selection_end {
            // Collapse a non-empty selection to its left edge
            self.selection_end = self.selection_start;
        } else {
            self.selection_start = target;
            self.selection_end = target;
        }
    }

    pub fn move_right(&mut self, extend: bool, word: bool) {
        let target = if word {
            self.next_word_boundary(self.selection_end)
        } else {
            (self.selection_end + 1).min(self.char_len())
        };
        if extend {
            self.selection_end = target;
        } else if self.selection_start != self.selection_end {
            self.selection_start = self.selection_end;
        } else {
            self.selection_start = target;
            self.selection_end = target;
        }
    }

    /// Jump to the start of the text, extending the selection only when
    /// `extend` is set
    pub fn move_home(&mut self, extend: bool) {
        self.selection_start = 0;
        if !extend {
            self.selection_end = 0;
        }
    }

    pub fn move_end(&mut self, extend: bool) {
        self.selection_end = self.char_len();
        if !extend {
            self.selection_start = self.selection_end;
        }
    }

    fn previous_word_boundary(&self, from: usize) -> usize {
        let chars: Vec<char> = self.value.chars().collect();
        let mut pos = from;
        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && !chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        pos
    }

    fn next_word_boundary(&self, from: usize) -> usize {
        let chars: Vec<char> = self.value.chars().collect();
        let mut pos = from;
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        while pos < chars.len() && !chars[pos].is_whitespace() {
            pos += 1;
        }
        pos
    }

    /// Capture the current value as the original value (called when focus is gained)
    pub fn capture_original_value(&mut self) {
        self.original_value = self.value.clone();
    }

    /// Whether the current value differs from the original value
    pub fn has_value_changed(&self) -> bool {
        self.value != self.original_value
    }

    /// Revert to the original value (Escape key handling)
    pub fn revert_to_original_value(&mut self) {
        let original = self.original_value.clone();
        self.set_value(&original);
    }
}

/// Session state for a `<select>` element.
///
/// `last_selected_index` anchors shift-range selection in multi-select mode.
/// It is cleared and recomputed only by a real (non-range) click selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectData {
    pub last_selected_index: Option<usize>,
}

/// Selectedness of an `<option>`, tracked live and separately from the
/// `selected` attribute it was initialized from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionData {
    pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptData {
    /// A script element executes at most once, no matter how often it is
    /// moved within the document
    pub already_executed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameData {
    /// The URL most recently loaded into this frame, if any
    pub loaded_url: Option<Url>,
    /// The id of the document the loader produced for this frame
    pub content_document: Option<usize>,
}
