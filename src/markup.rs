//! Structural markup tree.
//!
//! Everything the renderer produces is an [`Element`] tree rather than a
//! string, so the repeater controller can clone a wrapper and reassign
//! `name` / `id` attributes directly. Serialization happens once, at the edge,
//! through [`Element::to_html`] / `Display`.
//!
//! Opaque markup (e.g. produced by an embedded sub-widget) is carried as
//! [`Node::Raw`] and emitted verbatim.

use std::fmt;

use serde_json::Value;

use crate::config::HtmlOptions;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

// ---------------------------------------------------------------------------
// Node / Attribute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Text content, escaped on output.
    Text(String),
    /// Pre-rendered markup, emitted as-is.
    Raw(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.write_html(out),
            Node::Text(text) => out.push_str(&escape_html_text(text)),
            Node::Raw(raw) => out.push_str(raw),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// A single attribute. `value: None` is a boolean flag (`<option selected>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    attrs: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.set_flag(name);
        self
    }

    pub fn with_class(mut self, classes: &str) -> Self {
        self.add_class(classes);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.children.push(Node::Raw(raw.into()));
        self
    }

    pub fn with_options(mut self, options: &HtmlOptions) -> Self {
        self.apply_options(options);
        self
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_deref())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Set or replace an attribute, keeping its original position.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.put(name.into(), Some(value.into()));
    }

    pub fn set_flag(&mut self, name: impl Into<String>) {
        self.put(name.into(), None);
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        self.attrs.remove(pos).value
    }

    fn put(&mut self, name: String, value: Option<String>) {
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attrs.push(Attribute { name, value }),
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add whitespace-separated classes, skipping ones already present.
    pub fn add_class(&mut self, classes: &str) {
        let mut current: Vec<String> = self.classes().map(str::to_string).collect();
        for class in classes.split_whitespace() {
            if !current.iter().any(|c| c == class) {
                current.push(class.to_string());
            }
        }
        if !current.is_empty() {
            self.set_attr("class", current.join(" "));
        }
    }

    pub fn remove_class(&mut self, classes: &str) {
        let drop: Vec<&str> = classes.split_whitespace().collect();
        let kept: Vec<String> = self
            .classes()
            .filter(|c| !drop.contains(c))
            .map(str::to_string)
            .collect();
        if kept.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", kept.join(" "));
        }
    }

    /// Apply host-style options: strings and numbers become attribute
    /// values, `true` becomes a flag, `false`/`null` are skipped, `class` is
    /// merged and a nested `data` object expands to `data-*` attributes.
    pub fn apply_options(&mut self, options: &HtmlOptions) {
        for (key, value) in options.iter() {
            match (key.as_str(), value) {
                ("class", Value::String(classes)) => self.add_class(classes),
                ("data", Value::Object(entries)) => {
                    for (data_key, data_value) in entries {
                        if let Some(text) = option_value_text(data_value) {
                            self.set_attr(format!("data-{data_key}"), text);
                        }
                    }
                }
                (_, Value::Bool(true)) => self.set_flag(key.as_str()),
                (_, Value::Bool(false)) | (_, Value::Null) => {}
                (_, other) => {
                    if let Some(text) = option_value_text(other) {
                        self.set_attr(key.as_str(), text);
                    }
                }
            }
        }
    }

    // -- Queries ------------------------------------------------------------

    /// Visit this element and every descendant element, depth first.
    pub fn for_each_element_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(el) = child {
                el.for_each_element_mut(f);
            }
        }
    }

    /// Visit every raw markup fragment below this element.
    pub fn for_each_raw_mut(&mut self, f: &mut impl FnMut(&mut String)) {
        for child in &mut self.children {
            match child {
                Node::Element(el) => el.for_each_raw_mut(f),
                Node::Raw(raw) => f(raw),
                Node::Text(_) => {}
            }
        }
    }

    /// First descendant (or self) matching the predicate.
    pub fn find(&self, pred: &impl Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|el| el.find(pred))
    }

    pub fn find_mut(&mut self, pred: &impl Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find_map(|el| el.find_mut(pred))
    }

    pub fn find_all<'a>(&'a self, pred: &impl Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
        if pred(self) {
            out.push(self);
        }
        for el in self.children.iter().filter_map(Node::as_element) {
            el.find_all(pred, out);
        }
    }

    /// Concatenated text content, raw fragments included verbatim.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Element(el) => out.push_str(&el.text()),
                Node::Text(t) | Node::Raw(t) => out.push_str(t),
            }
        }
        out
    }

    // -- Serialization ------------------------------------------------------

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for attr in &self.attrs {
            out.push(' ');
            out.push_str(&attr.name);
            if let Some(value) = &attr.value {
                out.push_str("=\"");
                out.push_str(&escape_attr_value(value));
                out.push('"');
            }
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

fn option_value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

pub fn escape_html_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

pub fn escape_attr_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_attr_value`] for the entities it produces (plus the
/// common `&#39;` / `&apos;` spellings of a quote).
pub fn unescape_attr_value(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_void_element_has_no_closing_tag() {
        let input = Element::new("input")
            .with_attr("type", "text")
            .with_attr("name", "Post[tags][0]");
        assert_eq!(input.to_html(), r#"<input type="text" name="Post[tags][0]">"#);
    }

    #[test]
    fn test_attributes_and_text_are_escaped() {
        let el = Element::new("div")
            .with_attr("title", r#"a "quoted" <b>"#)
            .with_text("1 < 2 & 3");
        assert_eq!(
            el.to_html(),
            r#"<div title="a &quot;quoted&quot; &lt;b&gt;">1 &lt; 2 &amp; 3</div>"#
        );
    }

    #[test]
    fn test_raw_children_are_not_escaped() {
        let el = Element::new("button").with_raw("&ndash;");
        assert_eq!(el.to_html(), "<button>&ndash;</button>");
    }

    #[test]
    fn test_set_attr_keeps_position() {
        let mut el = Element::new("div")
            .with_attr("id", "a")
            .with_attr("class", "x");
        el.set_attr("id", "b");
        assert_eq!(el.to_html(), r#"<div id="b" class="x"></div>"#);
    }

    #[test]
    fn test_class_manipulation() {
        let mut el = Element::new("button").with_class("btn btn-success array-field-add");
        el.remove_class("btn-success array-field-add");
        el.add_class("btn-danger array-field-remove");
        el.add_class("btn");
        assert_eq!(el.attr("class"), Some("btn btn-danger array-field-remove"));
        assert!(el.has_class("array-field-remove"));
        assert!(!el.has_class("array-field-add"));
    }

    #[test]
    fn test_apply_options_expands_data_and_flags() {
        let options = HtmlOptions::from_value(json!({
            "class": "wrapper",
            "data": { "index": 3, "name": "Post[tags]" },
            "disabled": true,
            "hidden": false,
            "maxlength": 12
        }));
        let el = Element::new("div").with_options(&options);
        assert_eq!(
            el.to_html(),
            r#"<div class="wrapper" data-index="3" data-name="Post[tags]" disabled maxlength="12"></div>"#
        );
    }

    #[test]
    fn test_find_descends_into_children() {
        let tree = Element::new("div").with_child(
            Element::new("span").with_child(Element::new("input").with_attr("id", "deep")),
        );
        let found = tree.find(&|el| el.attr("id") == Some("deep"));
        assert_eq!(found.map(|el| el.tag.as_str()), Some("input"));
    }

    #[test]
    fn test_unescape_attr_value_inverts_escape() {
        let raw = r#"a&b <"c"> 'd'"#;
        assert_eq!(unescape_attr_value(&escape_attr_value(raw)), raw);
        assert_eq!(unescape_attr_value("O&#39;Brien"), "O'Brien");
        assert_eq!(unescape_attr_value("plain"), "plain");
    }
}
