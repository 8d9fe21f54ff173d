//! Field Renderer.
//!
//! Renders one array-valued attribute as a group of indexed slots:
//!
//! ```text
//! div.form-group.array-field-group.field-post-tags
//! ├── label
//! ├── div.array-field-wrapper[data-index=0]           input  button.array-field-remove
//! ├── div.array-field-wrapper[data-index=1]           input  button.array-field-remove
//! ├── div.array-field-wrapper[data-index=2][data-id][data-name][data-init]
//! │                                                   input  button.array-field-add
//! ├── p.help-block            (hint)
//! └── p.help-block-error      (error)
//! ```
//!
//! Only the last wrapper carries the naming template, which is everything
//! the client repeater needs to clone it.

use serde_json::Value;

use crate::client_options;
use crate::config::{ControlStyle, FieldConfig, HtmlOptions};
use crate::host::FieldHost;
use crate::inputs::{self, InputKind, SelectItem, SlotInput, SubWidget};
use crate::markup::{Element, Node};
use crate::naming::{self, NamingTemplate};
use crate::slots::{self, SlotPadding};
use crate::{ArrayFieldError, ControlKind};

// ---------------------------------------------------------------------------
// Slot wrapping
// ---------------------------------------------------------------------------

/// The add / remove button of one wrapper.
pub fn control_button(kind: ControlKind, style: &ControlStyle) -> Element {
    let (class, glyph) = match kind {
        ControlKind::Add => (style.add_button_class(), style.add_glyph.as_str()),
        ControlKind::Remove => (style.remove_button_class(), style.remove_glyph.as_str()),
    };
    Element::new("button")
        .with_attr("type", "button")
        .with_class(&class)
        .with_raw(glyph)
}

/// Wrap rendered slots in field-wrapper containers.
///
/// Every wrapper gets `data-index`; the last one also gets `data-id`,
/// `data-name`, the optional `data-init` and the add control. All others
/// get a remove control.
pub fn wrap_slots(
    slots: Vec<Node>,
    template: &NamingTemplate,
    init_hook: Option<&str>,
    config: &FieldConfig,
) -> Vec<Element> {
    let style = &config.controls;
    let last = slots.len().saturating_sub(1);
    let (wrapper_tag, wrapper_options) = config.field_wrapper_options.split_tag("div");
    let (button_tag, button_options) = config.button_wrapper_options.split_tag("span");

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            let mut wrapper = Element::new(wrapper_tag.as_str()).with_options(&wrapper_options);
            wrapper.add_class(&style.wrapper_marker);
            if config.input_group {
                wrapper.add_class("input-group");
            }
            wrapper.set_attr("data-index", index.to_string());

            let kind = if index == last {
                wrapper.set_attr("data-id", template.id().as_str());
                wrapper.set_attr("data-name", template.name().as_str());
                if let Some(hook) = init_hook {
                    wrapper.set_attr("data-init", hook);
                }
                ControlKind::Add
            } else {
                ControlKind::Remove
            };

            let control = control_button(kind, style);
            wrapper.children.push(slot);
            wrapper.children.push(Node::Text(" ".into()));
            if config.input_group {
                wrapper.children.push(
                    Element::new(button_tag.as_str())
                        .with_options(&button_options)
                        .with_child(control)
                        .into(),
                );
            } else {
                wrapper.children.push(control.into());
            }
            wrapper
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ArrayField
// ---------------------------------------------------------------------------

/// Renderer for one array-valued attribute of a host model.
///
/// Call one input variant (`text_input`, `drop_down_list`, `widget`, ...)
/// and then [`ArrayField::render`]. Rendering is stateless with respect to
/// the model: nothing is written back to the host.
pub struct ArrayField<'h, H: FieldHost + ?Sized> {
    host: &'h H,
    attribute: String,
    config: FieldConfig,
    template: NamingTemplate,
    slots: Option<Vec<Element>>,
    requires_multipart: bool,
}

impl<'h, H: FieldHost + ?Sized> ArrayField<'h, H> {
    pub fn new(host: &'h H, attribute: impl Into<String>, config: FieldConfig) -> Self {
        let attribute = attribute.into();
        let template = NamingTemplate::new(host.input_id(&attribute), host.input_name(&attribute));
        Self {
            host,
            attribute,
            config,
            template,
            slots: None,
            requires_multipart: false,
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn naming(&self) -> &NamingTemplate {
        &self.template
    }

    /// Wrapped slots produced by the last input variant call.
    pub fn slots(&self) -> &[Element] {
        self.slots.as_deref().unwrap_or(&[])
    }

    /// Set once a file input was rendered; the enclosing form must use
    /// `multipart/form-data`.
    pub fn requires_multipart(&self) -> bool {
        self.requires_multipart
    }

    /// Stored value as a dense sequence; non-array values are empty.
    pub fn attribute_value(&self) -> Vec<Value> {
        let name = naming::attribute_name(&self.attribute);
        slots::normalize_value(self.host.attribute_value(name).as_ref())
    }

    pub fn slot_count(&self, values: &[Value]) -> usize {
        slots::compute_slot_count(values, self.config.show_new_fields)
    }

    /// Merge input defaults and add error / aria wiring.
    ///
    /// `id` and `name` are dropped: every slot gets its own.
    pub fn prepare_options(&self, options: &HtmlOptions, merge: bool) -> HtmlOptions {
        let mut options = if merge {
            self.config.input_options.merged(options)
        } else {
            options.clone()
        };
        options.remove("id");
        options.remove("name");

        let has_error = self.host.first_error(&self.attribute).is_some();
        if self.config.validation_state_on_input && has_error {
            options.add_class(&self.config.error_css_class);
        }
        if self.config.add_aria_attributes {
            if self.host.is_required(&self.attribute) && !options.contains_key("aria-required") {
                options.insert("aria-required", Value::String("true".into()));
            }
            if has_error && !options.contains_key("aria-invalid") {
                options.insert("aria-invalid", Value::String("true".into()));
            }
        }
        options
    }

    fn render_slots(
        &mut self,
        padding: SlotPadding,
        options: &HtmlOptions,
        mut build: impl FnMut(&SlotInput<'_>) -> Result<Node, ArrayFieldError>,
    ) -> Result<&mut Self, ArrayFieldError> {
        let values = self.attribute_value();
        let count = slots::padded_slot_count(&values, self.config.show_new_fields, padding);
        let host = self.host;
        let mut index = 0;

        let rendered = slots::build_slots(&self.attribute, count, |attribute| {
            let slot = SlotInput {
                attribute,
                name: host.input_name(attribute),
                id: host.input_id(attribute),
                value: values.get(index).cloned(),
                options,
            };
            index += 1;
            build(&slot)
        })?;

        tracing::debug!(
            attribute = %self.attribute,
            values = values.len(),
            slots = rendered.len(),
            "rendered array field slots"
        );

        self.slots = Some(wrap_slots(
            rendered,
            &self.template,
            self.config.init_hook.as_deref(),
            &self.config,
        ));
        Ok(self)
    }

    // -- Delegation variants ------------------------------------------------

    /// `<input>` of an arbitrary type.
    pub fn input(&mut self, input_type: &str, options: &HtmlOptions) -> Result<&mut Self, ArrayFieldError> {
        let options = self.prepare_options(options, true);
        self.render_slots(SlotPadding::WithBlank, &options, |slot| {
            Ok(inputs::input(input_type, slot).into())
        })
    }

    pub fn text_input(&mut self, options: &HtmlOptions) -> Result<&mut Self, ArrayFieldError> {
        self.input("text", options)
    }

    pub fn password_input(&mut self, options: &HtmlOptions) -> Result<&mut Self, ArrayFieldError> {
        let options = self.prepare_options(options, true);
        self.render_slots(SlotPadding::WithBlank, &options, |slot| {
            Ok(inputs::password_input(slot).into())
        })
    }

    /// One hidden input per stored value; no blank slots.
    pub fn hidden_input(&mut self, options: &HtmlOptions) -> Result<&mut Self, ArrayFieldError> {
        let mut options = self.config.input_options.merged(options);
        options.remove("id");
        options.remove("name");
        self.render_slots(SlotPadding::ValuesOnly, &options, |slot| {
            Ok(inputs::input("hidden", slot).into())
        })
    }

    /// File inputs only inherit input defaults that were customized, and
    /// flag the form as multipart.
    pub fn file_input(&mut self, options: &HtmlOptions) -> Result<&mut Self, ArrayFieldError> {
        let mut options = options.clone();
        if self.config.input_options != FieldConfig::default().input_options {
            options = self.config.input_options.merged(&options);
        }
        let options = self.prepare_options(&options, false);
        self.requires_multipart = true;
        self.render_slots(SlotPadding::WithBlank, &options, |slot| {
            Ok(inputs::file_input(slot).into())
        })
    }

    pub fn textarea(&mut self, options: &HtmlOptions) -> Result<&mut Self, ArrayFieldError> {
        let options = self.prepare_options(options, true);
        self.render_slots(SlotPadding::WithBlank, &options, |slot| {
            Ok(inputs::textarea(slot).into())
        })
    }

    pub fn drop_down_list(
        &mut self,
        items: &[SelectItem],
        options: &HtmlOptions,
    ) -> Result<&mut Self, ArrayFieldError> {
        let options = self.prepare_options(options, true);
        self.render_slots(SlotPadding::WithBlank, &options, |slot| {
            Ok(inputs::drop_down_list(items, slot).into())
        })
    }

    /// Read-only display of the stored values; no blank slots.
    pub fn static_control(&mut self, options: &HtmlOptions) -> Result<&mut Self, ArrayFieldError> {
        let mut options = options.clone();
        options.remove("id");
        self.render_slots(SlotPadding::ValuesOnly, &options, |slot| {
            Ok(inputs::static_control(slot).into())
        })
    }

    /// Embed `widget` once per slot. Input widgets get every input default
    /// they do not set themselves, plus error / aria wiring.
    pub fn widget(
        &mut self,
        widget: &dyn SubWidget,
        options: &HtmlOptions,
    ) -> Result<&mut Self, ArrayFieldError> {
        let options = if widget.is_input_widget() {
            let mut merged = options.clone();
            for (key, value) in self.config.input_options.iter() {
                if !merged.contains_key(key) {
                    merged.insert(key.clone(), value.clone());
                }
            }
            self.prepare_options(&merged, false)
        } else {
            options.clone()
        };
        self.render_slots(SlotPadding::WithBlank, &options, |slot| widget.render(slot))
    }

    /// Dispatch on a request's input kind.
    pub fn render_kind(
        &mut self,
        kind: &InputKind,
        options: &HtmlOptions,
    ) -> Result<&mut Self, ArrayFieldError> {
        match kind {
            InputKind::Input { input_type } => self.input(input_type, options),
            InputKind::Text => self.text_input(options),
            InputKind::Password => self.password_input(options),
            InputKind::Hidden => self.hidden_input(options),
            InputKind::File => self.file_input(options),
            InputKind::Textarea => self.textarea(options),
            InputKind::DropDown { items } => self.drop_down_list(items, options),
            InputKind::Static => self.static_control(options),
        }
    }

    // -- Output -------------------------------------------------------------

    /// Client validation options, one entry per slot.
    pub fn client_options(&self) -> Vec<Value> {
        let count = match &self.slots {
            Some(slots) => slots.len(),
            None => self.slot_count(&self.attribute_value()),
        };
        client_options::client_options(self.host, &self.attribute, &self.template, &self.config, count)
    }

    /// Full field group. Falls back to a text input when no variant ran.
    pub fn render(&mut self) -> Result<Element, ArrayFieldError> {
        if self.slots.is_none() {
            self.text_input(&HtmlOptions::new())?;
        }
        let wrappers = self.slots.clone().unwrap_or_default();
        let config = &self.config;
        let base_id = self.template.id();
        let error = self.host.first_error(&self.attribute);

        let (tag, group_options) = config.group_options.split_tag("div");
        let mut group = Element::new(tag).with_options(&group_options);
        group.add_class(&config.controls.group_marker);
        group.add_class(&format!("field-{base_id}"));
        if self.host.is_required(&self.attribute) {
            group.add_class(&config.required_css_class);
        }
        if error.is_some() && !config.validation_state_on_input {
            group.add_class(&config.error_css_class);
        }

        group.children.push(
            Element::new("label")
                .with_options(&config.label_options)
                .with_attr("for", base_id.as_str())
                .with_text(self.host.label(&self.attribute))
                .into(),
        );

        match &config.input_template {
            Some(input_template) => {
                let (before, after) = input_template.split_once("{input}").ok_or_else(|| {
                    ArrayFieldError::InvalidOptions(format!(
                        "input_template for `{}` has no {{input}} placeholder",
                        self.attribute
                    ))
                })?;
                if !before.is_empty() {
                    group.children.push(Node::Raw(before.to_string()));
                }
                group.children.extend(wrappers.into_iter().map(Node::from));
                if !after.is_empty() {
                    group.children.push(Node::Raw(after.to_string()));
                }
            }
            None => group.children.extend(wrappers.into_iter().map(Node::from)),
        }

        if let Some(hint) = self.host.hint(&self.attribute) {
            group.children.push(
                Element::new("p")
                    .with_options(&config.hint_options)
                    .with_text(hint)
                    .into(),
            );
        }

        let mut error_block = Element::new(config.error_options.tag.as_str())
            .with_class(&config.error_options.class);
        if let Some(message) = error {
            error_block = if config.error_options.encode {
                error_block.with_text(message)
            } else {
                error_block.with_raw(message)
            };
        }
        group.children.push(error_block.into());

        Ok(group)
    }
}
