//! Per-field configuration.
//!
//! Every knob has a default, so a render request only needs to name what it
//! changes. All structs deserialize from the JSON request the CLI reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// HtmlOptions
// ---------------------------------------------------------------------------

/// Ordered tag attributes in host form-builder shape: plain keys map to
/// attribute values, `class` is a space separated list, `data` nests
/// `data-*` attributes and the pseudo-key `tag` picks the element name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HtmlOptions(Map<String, Value>);

impl HtmlOptions {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Non-object values yield empty options.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    pub fn with_class(class: &str) -> Self {
        let mut options = Self::new();
        options.insert("class", Value::String(class.to_string()));
        options
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn class(&self) -> Option<&str> {
        self.0.get("class").and_then(Value::as_str)
    }

    /// Append classes to the `class` entry.
    pub fn add_class(&mut self, class: &str) {
        let merged = match self.class() {
            Some(existing) if !existing.split_whitespace().any(|c| c == class) => {
                format!("{existing} {class}")
            }
            Some(existing) => existing.to_string(),
            None => class.to_string(),
        };
        self.insert("class", Value::String(merged));
    }

    /// `self` overlaid with `overrides`; keys in `overrides` win.
    pub fn merged(&self, overrides: &HtmlOptions) -> HtmlOptions {
        let mut out = self.clone();
        for (key, value) in overrides.iter() {
            out.insert(key.clone(), value.clone());
        }
        out
    }

    /// Remove the `tag` pseudo-attribute and return it with the rest.
    pub fn split_tag(&self, default_tag: &str) -> (String, HtmlOptions) {
        let mut rest = self.clone();
        let tag = match rest.remove("tag") {
            Some(Value::String(tag)) if !tag.is_empty() => tag,
            _ => default_tag.to_string(),
        };
        (tag, rest)
    }
}

// ---------------------------------------------------------------------------
// ControlStyle
// ---------------------------------------------------------------------------

/// Class names and glyphs shared by the renderer, the structural controller
/// and the generated browser runtime. Marker classes identify elements;
/// style classes are swapped when an add control turns into a remove control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlStyle {
    pub group_marker: String,
    pub wrapper_marker: String,
    pub add_marker: String,
    pub remove_marker: String,
    pub button_class: String,
    pub add_style: String,
    pub remove_style: String,
    /// Raw markup.
    pub add_glyph: String,
    /// Raw markup.
    pub remove_glyph: String,
}

impl Default for ControlStyle {
    fn default() -> Self {
        Self {
            group_marker: "array-field-group".into(),
            wrapper_marker: "array-field-wrapper".into(),
            add_marker: "array-field-add".into(),
            remove_marker: "array-field-remove".into(),
            button_class: "btn".into(),
            add_style: "btn-success".into(),
            remove_style: "btn-danger".into(),
            add_glyph: "+".into(),
            remove_glyph: "&ndash;".into(),
        }
    }
}

impl ControlStyle {
    /// Full class list of an add button.
    pub fn add_button_class(&self) -> String {
        join_classes(&[&self.button_class, &self.add_style, &self.add_marker])
    }

    pub fn remove_button_class(&self) -> String {
        join_classes(&[&self.button_class, &self.remove_style, &self.remove_marker])
    }

    /// Classes dropped from an add button when it becomes a remove button.
    pub fn add_swap_classes(&self) -> String {
        join_classes(&[&self.add_style, &self.add_marker])
    }

    pub fn remove_swap_classes(&self) -> String {
        join_classes(&[&self.remove_style, &self.remove_marker])
    }
}

fn join_classes(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Client validation settings
// ---------------------------------------------------------------------------

/// Selector overrides for client validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Selectors {
    pub container: Option<String>,
    pub input: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorOptions {
    pub tag: String,
    pub class: String,
    pub encode: bool,
}

impl Default for ErrorOptions {
    fn default() -> Self {
        Self {
            tag: "p".into(),
            class: "help-block help-block-error".into(),
            encode: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationTriggers {
    pub validate_on_change: bool,
    pub validate_on_blur: bool,
    pub validate_on_type: bool,
    pub validation_delay: u32,
}

impl Default for ValidationTriggers {
    fn default() -> Self {
        Self {
            validate_on_change: true,
            validate_on_blur: true,
            validate_on_type: false,
            validation_delay: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// FieldConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldConfig {
    /// Outer container of the whole field group.
    pub group_options: HtmlOptions,
    /// Container around each slot and its control.
    pub field_wrapper_options: HtmlOptions,
    /// Container around the control in input-group mode.
    pub button_wrapper_options: HtmlOptions,
    /// Defaults merged under per-call input options.
    pub input_options: HtmlOptions,
    pub label_options: HtmlOptions,
    pub hint_options: HtmlOptions,
    pub error_options: ErrorOptions,
    /// Empty slots appended after the current values.
    pub show_new_fields: usize,
    pub input_group: bool,
    /// Name of a registered init hook invoked after each client-side add.
    pub init_hook: Option<String>,
    /// Decoration around the wrapped slots; must contain `{input}`.
    pub input_template: Option<String>,
    /// Put the host error class on inputs instead of the group container.
    pub validation_state_on_input: bool,
    pub error_css_class: String,
    pub required_css_class: String,
    pub add_aria_attributes: bool,
    pub enable_client_validation: bool,
    pub enable_ajax_validation: bool,
    pub selectors: Selectors,
    pub triggers: ValidationTriggers,
    pub controls: ControlStyle,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            group_options: HtmlOptions::with_class("form-group array-field-group"),
            field_wrapper_options: HtmlOptions::with_class("array-field-wrapper"),
            button_wrapper_options: HtmlOptions::from_value(serde_json::json!({
                "tag": "span",
                "class": "input-group-btn",
            })),
            input_options: HtmlOptions::with_class("form-control"),
            label_options: HtmlOptions::with_class("control-label"),
            hint_options: HtmlOptions::with_class("help-block"),
            error_options: ErrorOptions::default(),
            show_new_fields: 0,
            input_group: false,
            init_hook: None,
            input_template: None,
            validation_state_on_input: false,
            error_css_class: "has-error".into(),
            required_css_class: "required".into(),
            add_aria_attributes: true,
            enable_client_validation: true,
            enable_ajax_validation: false,
            selectors: Selectors::default(),
            triggers: ValidationTriggers::default(),
            controls: ControlStyle::default(),
        }
    }
}

impl FieldConfig {
    pub fn with_show_new_fields(mut self, count: usize) -> Self {
        self.show_new_fields = count;
        self
    }

    pub fn with_input_group(mut self, enabled: bool) -> Self {
        self.input_group = enabled;
        self
    }

    pub fn with_init_hook(mut self, hook: impl Into<String>) -> Self {
        self.init_hook = Some(hook.into());
        self
    }
}
