//! Single-input builders.
//!
//! One builder per input kind, each rendering exactly one control for one
//! concrete name/id/value. The array field calls these once per slot.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::HtmlOptions;
use crate::markup::{Element, Node};
use crate::ArrayFieldError;

/// One `<option>` of a drop-down list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectItem {
    pub value: String,
    pub label: String,
}

impl SelectItem {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Input kind selected by a render request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum InputKind {
    /// `<input>` with an arbitrary `type`.
    Input {
        #[serde(rename = "type")]
        input_type: String,
    },
    #[default]
    Text,
    Password,
    Hidden,
    File,
    Textarea,
    DropDown {
        items: Vec<SelectItem>,
    },
    Static,
}

/// Everything a builder needs to render one slot.
#[derive(Debug, Clone)]
pub struct SlotInput<'a> {
    /// Indexed attribute expression, e.g. `tags[2]`.
    pub attribute: &'a str,
    pub name: String,
    pub id: String,
    pub value: Option<Value>,
    pub options: &'a HtmlOptions,
}

/// Text of a stored scalar; composite values render as JSON.
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => if *b { "1".into() } else { "0".into() },
        Some(other) => other.to_string(),
    }
}

pub fn input(input_type: &str, slot: &SlotInput<'_>) -> Element {
    let mut el = Element::new("input")
        .with_attr("type", input_type)
        .with_attr("id", slot.id.as_str())
        .with_options(slot.options)
        .with_attr("name", slot.name.as_str());
    if !slot.options.contains_key("value") {
        el.set_attr("value", value_text(slot.value.as_ref()));
    }
    el
}

/// Echoes the stored value like any other input; pass `value: ""` in the
/// options to blank it.
pub fn password_input(slot: &SlotInput<'_>) -> Element {
    input("password", slot)
}

pub fn file_input(slot: &SlotInput<'_>) -> Element {
    let mut el = input("file", slot);
    el.remove_attr("value");
    el
}

pub fn textarea(slot: &SlotInput<'_>) -> Element {
    Element::new("textarea")
        .with_attr("id", slot.id.as_str())
        .with_options(slot.options)
        .with_attr("name", slot.name.as_str())
        .with_text(value_text(slot.value.as_ref()))
}

/// `prompt` in the options becomes a leading empty-valued option.
pub fn drop_down_list(items: &[SelectItem], slot: &SlotInput<'_>) -> Element {
    let mut options = slot.options.clone();
    let prompt = options.remove("prompt");
    let selected = value_text(slot.value.as_ref());

    let mut select = Element::new("select")
        .with_attr("id", slot.id.as_str())
        .with_options(&options)
        .with_attr("name", slot.name.as_str());

    if let Some(Value::String(prompt)) = prompt {
        select
            .children
            .push(Element::new("option").with_attr("value", "").with_text(prompt).into());
    }
    for item in items {
        let mut option = Element::new("option").with_attr("value", item.value.as_str());
        if slot.value.is_some() && item.value == selected {
            option.set_flag("selected");
        }
        select.children.push(option.with_text(item.label.as_str()).into());
    }
    select
}

/// Read-only display of the value; carries no `name`.
pub fn static_control(slot: &SlotInput<'_>) -> Element {
    let mut options = slot.options.clone();
    options.remove("value");
    Element::new("p")
        .with_class("form-control-static")
        .with_options(&options)
        .with_text(value_text(slot.value.as_ref()))
}

// ---------------------------------------------------------------------------
// Embedded sub-widgets
// ---------------------------------------------------------------------------

/// An arbitrary embeddable widget rendered once per slot (date pickers,
/// masked inputs, ...).
pub trait SubWidget {
    fn render(&self, slot: &SlotInput<'_>) -> Result<Node, ArrayFieldError>;

    /// Input widgets receive the field's input options and aria wiring.
    fn is_input_widget(&self) -> bool {
        true
    }
}

impl<F> SubWidget for F
where
    F: Fn(&SlotInput<'_>) -> Result<Node, ArrayFieldError>,
{
    fn render(&self, slot: &SlotInput<'_>) -> Result<Node, ArrayFieldError> {
        self(slot)
    }
}
