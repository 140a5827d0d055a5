//! Selection coordination between `<select>` elements and their options.
//!
//! A select element owns the selectedness of its descendant options: in
//! single-select mode choosing one option atomically deselects the rest,
//! and in multi-select mode modifier keys toggle options or extend a range
//! anchored at the most recent plainly-selected index.

use crate::document::Document;
use crate::node::ElementKind;

/// How a click combines with the existing selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// A plain click: the clicked option becomes the selection
    Single,
    /// Ctrl-click: toggle the clicked option (multi-select only)
    Toggle,
    /// Shift-click: select the range from the last selected index to the
    /// clicked option (multi-select only)
    Range,
}

/// The descendant option elements of a select, in tree order
pub fn options_of(doc: &Document, select_id: usize) -> Vec<usize> {
    doc.iter_subtree(select_id)
        .skip(1)
        .filter(|id| {
            doc[*id]
                .element_data()
                .is_some_and(|elem| elem.kind == ElementKind::OptionElement)
        })
        .collect()
}

/// The currently selected options of a select, in tree order.
///
/// A single select never answers an empty selection while it has options:
/// when nothing is explicitly selected the first option is implicitly
/// selected, matching how browsers render a dropdown.
pub fn selected_options(doc: &Document, select_id: usize) -> Vec<usize> {
    let options = options_of(doc, select_id);
    let selected: Vec<usize> = options
        .iter()
        .copied()
        .filter(|id| {
            doc[*id]
                .element_data()
                .and_then(|elem| elem.option_data())
                .is_some_and(|option| option.selected)
        })
        .collect();

    let is_multiple = doc[select_id]
        .element_data()
        .is_some_and(|elem| elem.is_multiple_select());
    if selected.is_empty() && !is_multiple {
        return options.into_iter().take(1).collect();
    }
    selected
}

/// Apply a click selection to an option of a select.
///
/// Returns whether the clicked option's selectedness changed, which is what
/// decides whether a change event fires.
pub fn select_option(
    doc: &mut Document,
    select_id: usize,
    option_id: usize,
    mode: SelectionMode,
) -> bool {
    let options = options_of(doc, select_id);
    let Some(index) = options.iter().position(|id| *id == option_id) else {
        return false;
    };

    let is_multiple = doc[select_id]
        .element_data()
        .is_some_and(|elem| elem.is_multiple_select());
    let was_selected = option_selected(doc, option_id);

    // Modifier-driven modes only exist for multi-selects
    let mode = if is_multiple { mode } else { SelectionMode::Single };

    match mode {
        SelectionMode::Single => {
            for (i, id) in options.iter().enumerate() {
                set_option_selected(doc, *id, i == index);
            }
            set_last_selected_index(doc, select_id, Some(index));
        }
        SelectionMode::Toggle => {
            set_option_selected(doc, option_id, !was_selected);
            set_last_selected_index(
                doc,
                select_id,
                (!was_selected).then_some(index),
            );
        }
        SelectionMode::Range => {
            let anchor = doc[select_id]
                .element_data()
                .and_then(|elem| elem.select_data())
                .and_then(|data| data.last_selected_index)
                .unwrap_or(0);
            let (low, high) = if anchor <= index {
                (anchor, index)
            } else {
                (index, anchor)
            };
            for (i, id) in options.iter().enumerate() {
                set_option_selected(doc, *id, (low..=high).contains(&i));
            }
            // A range selection keeps its anchor for further extension
        }
    }

    option_selected(doc, option_id) != was_selected
}

fn option_selected(doc: &Document, option_id: usize) -> bool {
    doc[option_id]
        .element_data()
        .and_then(|elem| elem.option_data())
        .is_some_and(|option| option.selected)
}

fn set_option_selected(doc: &mut Document, option_id: usize, selected: bool) {
    let changed = match doc[option_id]
        .element_data_mut()
        .and_then(|elem| elem.option_data_mut())
    {
        Some(option) if option.selected != selected => {
            option.selected = selected;
            true
        }
        _ => false,
    };
    if changed {
        doc.note_changed(option_id);
    }
}

fn set_last_selected_index(doc: &mut Document, select_id: usize, index: Option<usize>) {
    if let Some(data) = doc[select_id]
        .element_data_mut()
        .and_then(|elem| elem.select_data_mut())
    {
        data.last_selected_index = index;
    }
}
