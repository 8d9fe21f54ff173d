//! Client validation options.
//!
//! The host's client validation expects one attribute entry per input. An
//! array field has one input per slot, so the shared options are repeated
//! with each slot's id, name, container and input selectors. Entries equal
//! to the client-side defaults are left out.

use serde_json::{json, Map, Value};

use crate::config::FieldConfig;
use crate::host::FieldHost;
use crate::naming::{self, NamingTemplate};

/// Wraps the collected validator statements.
const VALIDATE_PREFIX: &str = "function (attribute, value, messages, deferred, $form) {";

fn client_defaults() -> Map<String, Value> {
    match json!({
        "validateOnChange": true,
        "validateOnBlur": true,
        "validateOnType": false,
        "validationDelay": 500,
        "encodeError": true,
        "error": ".help-block",
        "updateAriaInvalid": true,
    }) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// JS body of the `validate` callback, or `None` when no validator applies.
pub fn validate_function<H: FieldHost + ?Sized>(host: &H, attribute: &str) -> Option<String> {
    let statements: Vec<String> = host
        .client_validators(naming::attribute_name(attribute))
        .into_iter()
        .filter(|v| !v.js.trim().is_empty())
        .map(|v| match v.when_client {
            Some(when) => format!("if (({when})(attribute, value)) {{ {} }}", v.js),
            None => v.js,
        })
        .collect();
    if statements.is_empty() {
        None
    } else {
        Some(format!("{VALIDATE_PREFIX}{}}}", statements.concat()))
    }
}

/// Error selector: explicit override, else the error block's classes, else its tag.
pub fn error_selector(config: &FieldConfig) -> String {
    if let Some(selector) = &config.selectors.error {
        return selector.clone();
    }
    let classes: Vec<&str> = config.error_options.class.split_whitespace().collect();
    if classes.is_empty() {
        config.error_options.tag.clone()
    } else {
        format!(".{}", classes.join("."))
    }
}

fn shared_options(config: &FieldConfig, validate: Option<String>) -> Map<String, Value> {
    let mut options = Map::new();
    options.insert("error".into(), Value::String(error_selector(config)));
    options.insert("encodeError".into(), Value::Bool(config.error_options.encode));
    if config.enable_ajax_validation {
        options.insert("enableAjaxValidation".into(), Value::Bool(true));
    }
    let triggers = &config.triggers;
    options.insert("validateOnChange".into(), Value::Bool(triggers.validate_on_change));
    options.insert("validateOnBlur".into(), Value::Bool(triggers.validate_on_blur));
    options.insert("validateOnType".into(), Value::Bool(triggers.validate_on_type));
    options.insert("validationDelay".into(), json!(triggers.validation_delay));
    if let Some(validate) = validate {
        options.insert("validate".into(), Value::String(validate));
    }
    if !config.add_aria_attributes {
        options.insert("updateAriaInvalid".into(), Value::Bool(false));
    }
    options
}

/// One options object per slot index `0..slot_count`.
///
/// Empty when the attribute is inactive, or when ajax validation is off and
/// no client validator applies.
pub fn client_options<H: FieldHost + ?Sized>(
    host: &H,
    attribute: &str,
    template: &NamingTemplate,
    config: &FieldConfig,
    slot_count: usize,
) -> Vec<Value> {
    if !host.is_active_attribute(attribute) {
        return Vec::new();
    }

    let validate = if config.enable_client_validation {
        validate_function(host, attribute)
    } else {
        None
    };
    if !config.enable_ajax_validation && validate.is_none() {
        return Vec::new();
    }

    let shared = shared_options(config, validate);
    let defaults = client_defaults();
    let container = config
        .selectors
        .container
        .clone()
        .unwrap_or_else(|| format!(".field-{}", template.id()));

    (0..slot_count)
        .map(|index| {
            let indexed = naming::indexed_attribute(attribute, index);
            let id = host.input_id(&indexed);

            let mut entry = shared.clone();
            entry.insert("id".into(), Value::String(id.clone()));
            entry.insert("name".into(), Value::String(indexed));
            entry.insert("container".into(), Value::String(container.clone()));
            entry.insert(
                "input".into(),
                Value::String(config.selectors.input.clone().unwrap_or_else(|| format!("#{id}"))),
            );
            entry.retain(|key, value| defaults.get(key) != Some(&*value));
            Value::Object(entry)
        })
        .collect()
}
