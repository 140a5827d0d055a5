//! Form data extraction and submission.
//!
//! The entry list is built from the form's live control state (selection
//! delegates, checked flags, option selectedness), not from the attributes
//! the controls were parsed with.

use markup5ever::local_name;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;
use weft_traits::navigation::NavigationOptions;

use crate::document::Document;
use crate::node::ElementKind;
use crate::select;

/// A name/value pair destined for a submitted form data set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormEntry {
    pub name: String,
    pub value: String,
}

/// Collect the form's entry list in tree order.
///
/// `submitter` is the control that triggered the submission; submit buttons
/// contribute their entry only when they are the submitter.
pub fn form_entries(
    doc: &mut Document,
    form_id: usize,
    submitter: Option<usize>,
) -> Vec<FormEntry> {
    let candidates: Vec<usize> = doc
        .iter_subtree(0)
        .filter(|id| doc[*id].flags.is_in_document())
        .collect();

    let mut entries = Vec::new();
    for id in candidates {
        let Some(element) = doc[id].element_data() else {
            continue;
        };
        let kind = element.kind;
        if !matches!(
            kind,
            ElementKind::TextInput
                | ElementKind::TextArea
                | ElementKind::Checkbox
                | ElementKind::Radio
                | ElementKind::Select
                | ElementKind::SubmitInput
                | ElementKind::ImageInput
                | ElementKind::Other
        ) {
            continue;
        }
        // Only input-family "Other" elements (hidden inputs etc) submit
        if kind == ElementKind::Other && element.name.local != local_name!("input") {
            continue;
        }
        if element.has_attr(local_name!("disabled")) {
            continue;
        }
        let Some(name) = element.attr(local_name!("name")).map(String::from) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        if doc.form_owner(id) != Some(form_id) {
            continue;
        }

        let Some(element) = doc[id].element_data() else {
            continue;
        };
        match kind {
            ElementKind::TextInput | ElementKind::TextArea => {
                if let Some(input) = element.text_input_data() {
                    entries.push(FormEntry {
                        name,
                        value: input.value().to_string(),
                    });
                }
            }
            ElementKind::Checkbox | ElementKind::Radio => {
                if element.checkbox_input_checked() == Some(true) {
                    let value = element
                        .attr(local_name!("value"))
                        .unwrap_or("on")
                        .to_string();
                    entries.push(FormEntry { name, value });
                }
            }
            ElementKind::Select => {
                for option_id in select::selected_options(doc, id) {
                    let value = option_value(doc, option_id);
                    entries.push(FormEntry {
                        name: name.clone(),
                        value,
                    });
                }
            }
            ElementKind::SubmitInput => {
                if submitter == Some(id) {
                    let value = element
                        .attr(local_name!("value"))
                        .unwrap_or_default()
                        .to_string();
                    entries.push(FormEntry { name, value });
                }
            }
            ElementKind::ImageInput => {
                // An image submitter contributes click coordinates; a
                // headless click is always at the origin
                if submitter == Some(id) {
                    entries.push(FormEntry {
                        name: format!("{name}.x"),
                        value: "0".to_string(),
                    });
                    entries.push(FormEntry {
                        name: format!("{name}.y"),
                        value: "0".to_string(),
                    });
                }
            }
            _ => {
                let value = element
                    .attr(local_name!("value"))
                    .unwrap_or_default()
                    .to_string();
                entries.push(FormEntry { name, value });
            }
        }
    }
    entries
}

/// An option submits its `value` attribute, falling back to its text content
fn option_value(doc: &Document, option_id: usize) -> String {
    match doc[option_id].attr(local_name!("value")) {
        Some(value) => value.to_string(),
        None => doc.text_content(option_id).trim().to_string(),
    }
}

/// The escape set of application/x-www-form-urlencoded: everything except
/// ASCII alphanumerics, `*`, `-`, `.` and `_`. Space is handled separately.
const FORM_URLENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// Serialize entries as application/x-www-form-urlencoded
pub fn urlencode_entries(entries: &[FormEntry]) -> String {
    let encode = |s: &str| {
        // Space becomes '+', the rest of the escape set is percent-escaped
        let mut out = String::new();
        for part in s.split(' ') {
            if !out.is_empty() {
                out.push('+');
            }
            out.extend(utf8_percent_encode(part, FORM_URLENCODE));
        }
        out
    };
    entries
        .iter()
        .map(|entry| format!("{}={}", encode(&entry.name), encode(&entry.value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Serialize entries as text/plain. Line endings inside values are
/// normalized to CRLF and each entry ends with CRLF.
pub fn plaintext_entries(entries: &[FormEntry]) -> String {
    let normalize = |s: &str| s.replace("\r\n", "\n").replace('\n', "\r\n");
    entries
        .iter()
        .map(|entry| format!("{}={}\r\n", normalize(&entry.name), normalize(&entry.value)))
        .collect()
}

/// Submit a form through the document's navigation provider.
///
/// Returns the navigation options that were handed to the provider, or None
/// when the form's action does not resolve to a URL.
pub fn submit_form(
    doc: &mut Document,
    form_id: usize,
    submitter: Option<usize>,
) -> Option<NavigationOptions> {
    let entries = form_entries(doc, form_id, submitter);

    let form = doc[form_id].element_data()?;
    let method = form
        .attr(local_name!("method"))
        .map(|method| method.to_ascii_lowercase())
        .unwrap_or_default();
    let enctype = form
        .attr(local_name!("enctype"))
        .unwrap_or("application/x-www-form-urlencoded")
        .to_string();
    let action = form.attr(local_name!("action")).unwrap_or("").to_string();

    let mut url: Url = if action.is_empty() {
        doc.url().url().clone()
    } else {
        doc.url().resolve_relative(&action)?
    };

    let options = if method == "post" {
        let (content_type, body) = if enctype == "text/plain" {
            ("text/plain".to_string(), plaintext_entries(&entries))
        } else {
            (
                "application/x-www-form-urlencoded".to_string(),
                urlencode_entries(&entries),
            )
        };
        NavigationOptions::new(url, content_type, doc.id())
            .set_document_resource(Some(body.into_bytes().into()))
    } else {
        // GET: the entry list replaces the action URL's query string
        url.set_query(Some(&urlencode_entries(&entries)));
        NavigationOptions::new(url, String::new(), doc.id())
    };

    #[cfg(feature = "tracing")]
    tracing::info!("Submitting form (node {}) to {}", form_id, options.url.as_str());

    let provider = std::sync::Arc::clone(&doc.navigation_provider);
    provider.navigate_to(options.clone());
    Some(options)
}

#[cfg(test)]
mod tests {
    use markup5ever::{QualName, namespace_url, ns};

    use super::*;
    use crate::DocumentConfig;
    use crate::node::Attribute;

    fn qual(name: &str) -> QualName {
        QualName::new(None, ns!(), markup5ever::LocalName::from(name))
    }

    fn attrs(pairs: &[(&str, &str)]) -> Vec<Attribute> {
        pairs
            .iter()
            .map(|(name, value)| Attribute::new(qual(name), value.to_string()))
            .collect()
    }

    fn build_form() -> (Document, usize) {
        let mut doc = Document::new(DocumentConfig {
            base_url: Some("https://example.com/page".to_string()),
            ..Default::default()
        });
        let form = {
            let mut mutr = doc.mutate();
            let form = mutr.create_element(qual("form"), attrs(&[("action", "/submit")]));
            mutr.append_children(0, &[form]);
            form
        };
        (doc, form)
    }

    #[test]
    fn text_inputs_submit_their_live_value() {
        let (mut doc, form) = build_form();
        let input = {
            let mut mutr = doc.mutate();
            let input = mutr.create_element(
                qual("input"),
                attrs(&[("name", "q"), ("value", "initial")]),
            );
            mutr.append_children(form, &[input]);
            input
        };

        // Edit the live value; the attribute still says "initial"
        doc[input]
            .element_data_mut()
            .unwrap()
            .text_input_data_mut()
            .unwrap()
            .set_value("edited");

        let entries = form_entries(&mut doc, form, None);
        assert_eq!(
            entries,
            vec![FormEntry {
                name: "q".into(),
                value: "edited".into()
            }]
        );
    }

    #[test]
    fn unchecked_and_unnamed_controls_are_skipped() {
        let (mut doc, form) = build_form();
        {
            let mut mutr = doc.mutate();
            let unchecked = mutr.create_element(
                qual("input"),
                attrs(&[("type", "checkbox"), ("name", "c")]),
            );
            let unnamed = mutr.create_element(qual("input"), attrs(&[("value", "v")]));
            let checked = mutr.create_element(
                qual("input"),
                attrs(&[("type", "checkbox"), ("name", "d"), ("checked", "")]),
            );
            mutr.append_children(form, &[unchecked, unnamed, checked]);
        }

        let entries = form_entries(&mut doc, form, None);
        assert_eq!(
            entries,
            vec![FormEntry {
                name: "d".into(),
                value: "on".into()
            }]
        );
    }

    #[test]
    fn select_submits_selected_option_values() {
        let (mut doc, form) = build_form();
        {
            let mut mutr = doc.mutate();
            let sel = mutr.create_element(qual("select"), attrs(&[("name", "s")]));
            let a = mutr.create_element(qual("option"), attrs(&[("value", "a")]));
            let b = mutr.create_element(qual("option"), attrs(&[("selected", "")]));
            let text = mutr.create_text_node(" bee ");
            mutr.append_children(form, &[sel]);
            mutr.append_children(sel, &[a, b]);
            mutr.append_children(b, &[text]);
        }

        let entries = form_entries(&mut doc, form, None);
        // The selected option has no value attribute: its text submits
        assert_eq!(
            entries,
            vec![FormEntry {
                name: "s".into(),
                value: "bee".into()
            }]
        );
    }

    #[test]
    fn get_submission_builds_query_string() {
        let (mut doc, form) = build_form();
        {
            let mut mutr = doc.mutate();
            let input = mutr.create_element(
                qual("input"),
                attrs(&[("name", "a b"), ("value", "x&y")]),
            );
            mutr.append_children(form, &[input]);
        }

        let options = submit_form(&mut doc, form, None).unwrap();
        assert_eq!(
            options.url.as_str(),
            "https://example.com/submit?a+b=x%26y"
        );
        assert!(options.document_resource.is_none());
    }

    #[test]
    fn post_submission_encodes_body() {
        let (mut doc, form) = build_form();
        {
            let mut mutr = doc.mutate();
            mutr.set_attribute(form, qual("method"), "post".into());
            let input = mutr.create_element(
                qual("input"),
                attrs(&[("name", "a"), ("value", "1")]),
            );
            mutr.append_children(form, &[input]);
        }

        let options = submit_form(&mut doc, form, None).unwrap();
        assert_eq!(options.content_type, "application/x-www-form-urlencoded");
        assert_eq!(options.document_resource.unwrap().as_ref(), b"a=1");
    }

    #[test]
    fn urlencoding_keeps_form_safe_characters_literal() {
        let entries = vec![FormEntry {
            name: "file.name".into(),
            value: "a-b_c*d&e f".into(),
        }];
        assert_eq!(urlencode_entries(&entries), "file.name=a-b_c*d%26e+f");
    }

    #[test]
    fn plaintext_encoding_normalizes_newlines() {
        let entries = vec![FormEntry {
            name: "msg".into(),
            value: "line one\nline two".into(),
        }];
        assert_eq!(
            plaintext_entries(&entries),
            "msg=line one\r\nline two\r\n"
        );
    }

    #[test]
    fn submit_buttons_submit_only_as_submitter() {
        let (mut doc, form) = build_form();
        let (s1, _s2) = {
            let mut mutr = doc.mutate();
            let s1 = mutr.create_element(
                qual("input"),
                attrs(&[("type", "submit"), ("name", "go"), ("value", "Go")]),
            );
            let s2 = mutr.create_element(
                qual("input"),
                attrs(&[("type", "submit"), ("name", "stop"), ("value", "Stop")]),
            );
            mutr.append_children(form, &[s1, s2]);
            (s1, s2)
        };

        let entries = form_entries(&mut doc, form, Some(s1));
        assert_eq!(
            entries,
            vec![FormEntry {
                name: "go".into(),
                value: "Go".into()
            }]
        );
    }
}
