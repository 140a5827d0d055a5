//! HTML and plain-text serialization of subtrees.
//!
//! Markup serialization reflects live interaction state: an option selected
//! by clicking serializes with a `selected` attribute even though none was
//! parsed, and a checkbox unchecked by clicking loses its `checked`
//! attribute in the output.

use markup5ever::{LocalName, local_name};

use crate::document::Document;
use crate::node::{ElementData, NodeData};

const VOID_ELEMENTS: [LocalName; 14] = [
    local_name!("area"),
    local_name!("base"),
    local_name!("br"),
    local_name!("col"),
    local_name!("embed"),
    local_name!("hr"),
    local_name!("img"),
    local_name!("input"),
    local_name!("link"),
    local_name!("meta"),
    local_name!("param"),
    local_name!("source"),
    local_name!("track"),
    local_name!("wbr"),
];

const BLOCK_ELEMENTS: [LocalName; 16] = [
    local_name!("p"),
    local_name!("div"),
    local_name!("section"),
    local_name!("article"),
    local_name!("h1"),
    local_name!("h2"),
    local_name!("h3"),
    local_name!("h4"),
    local_name!("h5"),
    local_name!("h6"),
    local_name!("li"),
    local_name!("ul"),
    local_name!("ol"),
    local_name!("table"),
    local_name!("tr"),
    local_name!("blockquote"),
];

pub struct HtmlSerializer<'doc> {
    doc: &'doc Document,
}

impl<'doc> HtmlSerializer<'doc> {
    pub fn new(doc: &'doc Document) -> Self {
        Self { doc }
    }

    /// Markup for the node including its own tag
    pub fn outer_html(&self, node_id: usize) -> String {
        let mut out = String::new();
        self.write_node(node_id, &mut out);
        out
    }

    /// Markup for the node's children only
    pub fn inner_html(&self, node_id: usize) -> String {
        let mut out = String::new();
        if let Some(node) = self.doc.get_node(node_id) {
            for child_id in &node.children {
                self.write_node(*child_id, &mut out);
            }
        }
        out
    }

    fn write_node(&self, node_id: usize, out: &mut String) {
        let Some(node) = self.doc.get_node(node_id) else {
            return;
        };
        match &node.data {
            NodeData::Document | NodeData::DocumentFragment => {
                for child_id in &node.children {
                    self.write_node(*child_id, out);
                }
            }
            NodeData::Text(data) => {
                out.push_str(&html_escape::encode_text(&data.content));
            }
            NodeData::Comment(data) => {
                out.push_str("<!--");
                out.push_str(&data.content);
                out.push_str("-->");
            }
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.name.local);
                self.write_attributes(element, out);
                out.push('>');
                if VOID_ELEMENTS.contains(&element.name.local) {
                    return;
                }
                for child_id in &node.children {
                    self.write_node(*child_id, out);
                }
                out.push_str("</");
                out.push_str(&element.name.local);
                out.push('>');
            }
        }
    }

    /// Attributes are written in store order. The boolean state attributes
    /// `checked` and `selected` are rewritten from live state: present when
    /// the state is on, absent when it is off, whatever the parsed markup
    /// said.
    fn write_attributes(&self, element: &ElementData, out: &mut String) {
        let live_checked = element.checkbox_input_checked();
        let live_selected = element.option_data().map(|option| option.selected);

        for attr in element.attrs.iter() {
            match attr.name.local {
                local_name!("checked") if live_checked == Some(false) => continue,
                local_name!("selected") if live_selected == Some(false) => continue,
                _ => {}
            }
            out.push(' ');
            out.push_str(&attr.name.local);
            if !attr.value.is_empty() {
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(&attr.value));
                out.push('"');
            }
        }

        if live_checked == Some(true) && !element.attrs.contains(&local_name!("checked")) {
            out.push_str(" checked");
        }
        if live_selected == Some(true) && !element.attrs.contains(&local_name!("selected")) {
            out.push_str(" selected");
        }
    }

    /// Render the subtree the way a text-only user agent would show it:
    /// inline text runs with collapsed whitespace, block boundaries as
    /// newlines, `<br>` as a forced newline, table cells separated by tabs.
    pub fn to_text(&self, node_id: usize) -> String {
        let mut tokens = Vec::new();
        self.collect_text_tokens(node_id, &mut tokens);
        render_tokens(&tokens)
    }

    fn collect_text_tokens(&self, node_id: usize, tokens: &mut Vec<TextToken>) {
        let Some(node) = self.doc.get_node(node_id) else {
            return;
        };
        match &node.data {
            NodeData::Text(data) => tokens.push(TextToken::Text(data.content.clone())),
            NodeData::Comment(_) => {}
            NodeData::Element(element) => {
                match element.name.local {
                    local_name!("script")
                    | local_name!("style")
                    | local_name!("head")
                    | local_name!("title") => return,
                    local_name!("br") => {
                        tokens.push(TextToken::Newline);
                        return;
                    }
                    _ => {}
                }
                let block = BLOCK_ELEMENTS.contains(&element.name.local);
                if block {
                    tokens.push(TextToken::BlockSep);
                }
                for child_id in &node.children {
                    self.collect_text_tokens(*child_id, tokens);
                }
                if matches!(
                    element.name.local,
                    local_name!("td") | local_name!("th")
                ) {
                    tokens.push(TextToken::Tab);
                }
                if block {
                    tokens.push(TextToken::BlockSep);
                }
            }
            NodeData::Document | NodeData::DocumentFragment => {
                for child_id in &node.children {
                    self.collect_text_tokens(*child_id, tokens);
                }
            }
        }
    }
}

enum TextToken {
    Text(String),
    /// Block boundary; consecutive boundaries collapse into one newline
    BlockSep,
    /// A forced line break that never collapses
    Newline,
    Tab,
}

fn render_tokens(tokens: &[TextToken]) -> String {
    let mut out = String::new();
    let mut pending_break = false;
    for token in tokens {
        match token {
            TextToken::BlockSep => {
                if !out.is_empty() {
                    pending_break = true;
                }
            }
            TextToken::Newline => {
                out.push('\n');
                pending_break = false;
            }
            TextToken::Tab => {
                out.push('\t');
                pending_break = false;
            }
            TextToken::Text(text) => {
                let collapsed = collapse_whitespace(text);
                if collapsed.is_empty() {
                    continue;
                }
                if pending_break {
                    out.push('\n');
                    pending_break = false;
                } else if out.ends_with(|c: char| !c.is_whitespace())
                    && text.starts_with(char::is_whitespace)
                {
                    out.push(' ');
                }
                out.push_str(&collapsed);
            }
        }
    }
    out.trim().to_string()
}

/// Collapse whitespace runs to single spaces and trim the ends
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
