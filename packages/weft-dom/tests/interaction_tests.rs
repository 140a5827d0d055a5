//! End-to-end interaction scenarios: clicks, keyboard input, form
//! submission, and the events they produce.

use std::sync::{Arc, Mutex};

use weft_dom::events::{DomEvent, DomEventData, HandlerOutcome, MouseButtonEvent};
use weft_dom::node::Attribute;
use weft_dom::{
    Document, DocumentConfig, EventDriver, EventHandler, LocalName, NoopEventHandler, QualName,
    namespace_url, ns,
};
use weft_traits::navigation::{NavigationOptions, NavigationProvider};

fn qual(name: &str) -> QualName {
    QualName::new(None, ns!(), LocalName::from(name))
}

fn attrs(pairs: &[(&str, &str)]) -> Vec<Attribute> {
    pairs
        .iter()
        .map(|(name, value)| Attribute::new(qual(name), value.to_string()))
        .collect()
}

/// Records every dispatched event name, handles nothing
#[derive(Default, Clone)]
struct RecordingHandler {
    events: Arc<Mutex<Vec<(String, usize)>>>,
}

impl RecordingHandler {
    fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(event, _)| event == name)
            .count()
    }
}

impl EventHandler for RecordingHandler {
    fn handle_event(&mut self, _doc: &mut Document, event: &mut DomEvent) -> HandlerOutcome {
        self.events
            .lock()
            .unwrap()
            .push((event.name().to_string(), event.target));
        HandlerOutcome::NoHandler
    }
}

/// Records navigations instead of performing them
#[derive(Default)]
struct RecordingNavigation {
    navigations: Mutex<Vec<NavigationOptions>>,
}

impl NavigationProvider for RecordingNavigation {
    fn navigate_to(&self, options: NavigationOptions) {
        self.navigations.lock().unwrap().push(options);
    }
}

fn checkbox_doc() -> (Document, usize) {
    let mut doc = Document::new(DocumentConfig::default());
    let checkbox = {
        let mut mutr = doc.mutate();
        let form = mutr.create_element(qual("form"), Vec::new());
        let checkbox = mutr.create_element(
            qual("input"),
            attrs(&[("type", "checkbox"), ("name", "agree")]),
        );
        mutr.append_children(0, &[form]);
        mutr.append_children(form, &[checkbox]);
        checkbox
    };
    (doc, checkbox)
}

#[test]
fn clicking_checkbox_checks_it_and_fires_one_change_event() {
    let (mut doc, checkbox) = checkbox_doc();
    let handler = RecordingHandler::default();
    let mut driver = EventDriver::new(&mut doc, handler.clone());
    assert!(driver.click(checkbox, MouseButtonEvent::default()));

    assert_eq!(
        doc[checkbox].element_data().unwrap().checkbox_input_checked(),
        Some(true)
    );
    assert_eq!(handler.count("change"), 1);
    // The click event saw the post-toggle state and fired before change
    let names = handler.names();
    let click_pos = names.iter().position(|n| n == "click").unwrap();
    let change_pos = names.iter().position(|n| n == "change").unwrap();
    assert!(click_pos < change_pos);
}

#[test]
fn checked_checkbox_submits_on_by_default() {
    let (mut doc, checkbox) = checkbox_doc();
    {
        let mut driver = EventDriver::new(&mut doc, NoopEventHandler);
        driver.click(checkbox, MouseButtonEvent::default());
    }

    let form = doc.form_owner(checkbox).unwrap();
    let entries = weft_dom::form::form_entries(&mut doc, form, None);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "agree");
    assert_eq!(entries[0].value, "on");
}

#[test]
fn clicking_checkbox_twice_restores_unchecked() {
    let (mut doc, checkbox) = checkbox_doc();
    let handler = RecordingHandler::default();
    let mut driver = EventDriver::new(&mut doc, handler.clone());
    driver.click(checkbox, MouseButtonEvent::default());
    driver.click(checkbox, MouseButtonEvent::default());

    assert_eq!(
        doc[checkbox].element_data().unwrap().checkbox_input_checked(),
        Some(false)
    );
    // Each toggle is a real change
    assert_eq!(handler.count("change"), 2);
}

#[test]
fn vetoed_click_keeps_state_but_skips_default_action() {
    struct VetoingHandler;
    impl EventHandler for VetoingHandler {
        fn handle_event(&mut self, _doc: &mut Document, event: &mut DomEvent) -> HandlerOutcome {
            if matches!(event.data, DomEventData::Click(_)) {
                return HandlerOutcome::Veto;
            }
            HandlerOutcome::NoHandler
        }
    }

    let (mut doc, checkbox) = checkbox_doc();
    let mut driver = EventDriver::new(&mut doc, VetoingHandler);
    assert!(driver.click(checkbox, MouseButtonEvent::default()));

    // The pre-click state update is never rolled back, but the change
    // event (the default action) is suppressed
    assert_eq!(
        doc[checkbox].element_data().unwrap().checkbox_input_checked(),
        Some(true)
    );
}

#[test]
fn clicking_option_selects_it_and_change_targets_the_select() {
    let mut doc = Document::new(DocumentConfig::default());
    let (select, options) = {
        let mut mutr = doc.mutate();
        let select = mutr.create_element(qual("select"), attrs(&[("name", "s")]));
        mutr.append_children(0, &[select]);
        let options: Vec<usize> = (0..3)
            .map(|i| {
                let option =
                    mutr.create_element(qual("option"), attrs(&[("value", &format!("v{i}"))]));
                mutr.append_children(select, &[option]);
                option
            })
            .collect();
        (select, options)
    };

    let handler = RecordingHandler::default();
    let mut driver = EventDriver::new(&mut doc, handler.clone());
    assert!(driver.click(options[1], MouseButtonEvent::default()));

    let selected: Vec<bool> = options
        .iter()
        .map(|id| {
            doc[*id]
                .element_data()
                .unwrap()
                .option_data()
                .unwrap()
                .selected
        })
        .collect();
    assert_eq!(selected, vec![false, true, false]);

    let events = handler.events.lock().unwrap().clone();
    let change_events: Vec<_> = events.iter().filter(|(name, _)| name == "change").collect();
    assert_eq!(change_events.len(), 1);
    assert_eq!(change_events[0].1, select);
}

#[test]
fn reclicking_selected_option_fires_no_change() {
    let mut doc = Document::new(DocumentConfig::default());
    let option = {
        let mut mutr = doc.mutate();
        let select = mutr.create_element(qual("select"), Vec::new());
        let option = mutr.create_element(qual("option"), attrs(&[("selected", "")]));
        mutr.append_children(0, &[select]);
        mutr.append_children(select, &[option]);
        option
    };

    let handler = RecordingHandler::default();
    let mut driver = EventDriver::new(&mut doc, handler.clone());
    driver.click(option, MouseButtonEvent::default());
    assert_eq!(handler.count("change"), 0);
}

#[test]
fn anchor_click_navigates_through_the_provider() {
    let navigation = Arc::new(RecordingNavigation::default());
    let mut doc = Document::new(DocumentConfig {
        base_url: Some("https://example.com/a/b".to_string()),
        navigation_provider: Some(Arc::clone(&navigation) as _),
        ..Default::default()
    });
    let (anchor, text) = {
        let mut mutr = doc.mutate();
        let anchor = mutr.create_element(qual("a"), attrs(&[("href", "../other")]));
        let text = mutr.create_text_node("go");
        mutr.append_children(0, &[anchor]);
        mutr.append_children(anchor, &[text]);
        (anchor, text)
    };
    assert!(doc[anchor].element_data().is_some());

    let mut driver = EventDriver::new(&mut doc, NoopEventHandler);
    // Clicking the text inside the anchor follows the link
    assert!(!driver.click(text, MouseButtonEvent::default()));

    let navigations = navigation.navigations.lock().unwrap();
    assert_eq!(navigations.len(), 1);
    assert_eq!(navigations[0].url.as_str(), "https://example.com/other");
}

#[test]
fn double_click_aborts_after_navigating_click() {
    let navigation = Arc::new(RecordingNavigation::default());
    let mut doc = Document::new(DocumentConfig {
        base_url: Some("https://example.com/".to_string()),
        navigation_provider: Some(Arc::clone(&navigation) as _),
        ..Default::default()
    });
    let anchor = {
        let mut mutr = doc.mutate();
        let anchor = mutr.create_element(qual("a"), attrs(&[("href", "next")]));
        mutr.append_children(0, &[anchor]);
        anchor
    };

    let handler = RecordingHandler::default();
    let mut driver = EventDriver::new(&mut doc, handler.clone());
    assert!(!driver.double_click(anchor, MouseButtonEvent::default()));

    // The first click navigated away, so no dblclick event fired
    assert_eq!(handler.count("click"), 1);
    assert_eq!(handler.count("dblclick"), 0);
}

#[test]
fn submit_button_click_submits_the_form() {
    let navigation = Arc::new(RecordingNavigation::default());
    let mut doc = Document::new(DocumentConfig {
        base_url: Some("https://example.com/page".to_string()),
        navigation_provider: Some(Arc::clone(&navigation) as _),
        ..Default::default()
    });
    let submit = {
        let mut mutr = doc.mutate();
        let form = mutr.create_element(qual("form"), attrs(&[("action", "/search")]));
        let input = mutr.create_element(qual("input"), attrs(&[("name", "q"), ("value", "x")]));
        let submit = mutr.create_element(qual("input"), attrs(&[("type", "submit")]));
        mutr.append_children(0, &[form]);
        mutr.append_children(form, &[input, submit]);
        submit
    };

    let handler = RecordingHandler::default();
    let mut driver = EventDriver::new(&mut doc, handler.clone());
    assert!(!driver.click(submit, MouseButtonEvent::default()));

    assert_eq!(handler.count("submit"), 1);
    let navigations = navigation.navigations.lock().unwrap();
    assert_eq!(navigations.len(), 1);
    assert_eq!(
        navigations[0].url.as_str(),
        "https://example.com/search?q=x"
    );
}

#[test]
fn editing_then_blurring_fires_change_once() {
    let mut doc = Document::new(DocumentConfig::default());
    let (input, other) = {
        let mut mutr = doc.mutate();
        let input = mutr.create_element(qual("input"), attrs(&[("value", "before")]));
        let other = mutr.create_element(qual("input"), Vec::new());
        mutr.append_children(0, &[input, other]);
        (input, other)
    };

    let handler = RecordingHandler::default();
    let mut driver = EventDriver::new(&mut doc, handler.clone());
    driver.click(input, MouseButtonEvent::default());
    driver.type_text("!");
    assert_eq!(handler.count("change"), 0);

    // Focus moves away: the edited input fires its change event
    driver.click(other, MouseButtonEvent::default());
    assert_eq!(handler.count("change"), 1);

    // Blurring again without edits fires nothing further
    driver.click(input, MouseButtonEvent::default());
    assert_eq!(handler.count("change"), 1);
}

#[test]
fn clicking_unnamed_radio_checks_it() {
    let mut doc = Document::new(DocumentConfig::default());
    let radio = {
        let mut mutr = doc.mutate();
        let radio = mutr.create_element(qual("input"), attrs(&[("type", "radio")]));
        mutr.append_children(0, &[radio]);
        radio
    };

    let handler = RecordingHandler::default();
    let mut driver = EventDriver::new(&mut doc, handler.clone());
    assert!(driver.click(radio, MouseButtonEvent::default()));

    // A radio without a name is a group of one
    assert_eq!(
        doc[radio].element_data().unwrap().checkbox_input_checked(),
        Some(true)
    );
    assert_eq!(handler.count("change"), 1);

    // Reclicking a checked radio changes nothing
    let mut driver = EventDriver::new(&mut doc, handler.clone());
    driver.click(radio, MouseButtonEvent::default());
    assert_eq!(handler.count("change"), 1);
}

#[test]
fn label_click_activates_its_control() {
    let mut doc = Document::new(DocumentConfig::default());
    let (label, checkbox) = {
        let mut mutr = doc.mutate();
        let label = mutr.create_element(qual("label"), attrs(&[("for", "c")]));
        let text = mutr.create_text_node("toggle me");
        let checkbox = mutr.create_element(
            qual("input"),
            attrs(&[("type", "checkbox"), ("id", "c")]),
        );
        mutr.append_children(0, &[label, checkbox]);
        mutr.append_children(label, &[text]);
        (label, checkbox)
    };

    let mut driver = EventDriver::new(&mut doc, NoopEventHandler);
    driver.click(label, MouseButtonEvent::default());
    assert_eq!(
        doc[checkbox].element_data().unwrap().checkbox_input_checked(),
        Some(true)
    );
}

#[test]
fn label_pointing_at_non_labelable_element_is_inert() {
    let mut doc = Document::new(DocumentConfig::default());
    let (label, div) = {
        let mut mutr = doc.mutate();
        let label = mutr.create_element(qual("label"), attrs(&[("for", "d")]));
        let div = mutr.create_element(qual("div"), attrs(&[("id", "d")]));
        mutr.append_children(0, &[label, div]);
        (label, div)
    };
    assert!(doc[div].element_data().is_some());

    let handler = RecordingHandler::default();
    let mut driver = EventDriver::new(&mut doc, handler.clone());
    assert!(driver.click(label, MouseButtonEvent::default()));
    // No forwarded click: the label fires one click and nothing else
    assert_eq!(handler.count("click"), 1);
}

#[test]
fn label_referencing_itself_terminates() {
    let mut doc = Document::new(DocumentConfig::default());
    let label = {
        let mut mutr = doc.mutate();
        let label = mutr.create_element(qual("label"), attrs(&[("for", "x"), ("id", "x")]));
        mutr.append_children(0, &[label]);
        label
    };

    let handler = RecordingHandler::default();
    let mut driver = EventDriver::new(&mut doc, handler.clone());
    // A self-referential `for` must not re-enter the click protocol
    assert!(driver.click(label, MouseButtonEvent::default()));
    assert_eq!(handler.count("click"), 1);
}
