//! Capabilities borrowed from the host form framework.
//!
//! The array field never subclasses a field base. It is handed a
//! [`FieldHost`] that resolves values, names, labels, hints, errors and
//! client validators for the bound model. [`ModelHost`] is a plain data
//! implementation used by the CLI, the Node binding and the tests.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::naming;

/// A client-side validator contributed by the host model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientValidator {
    /// JS statement(s) run inside the generated `validate` function.
    pub js: String,
    /// Optional JS predicate `(attribute, value) => bool` guarding `js`.
    #[serde(default)]
    pub when_client: Option<String>,
}

pub trait FieldHost {
    /// Form name used as the input-name prefix (`Post` in `Post[tags][0]`).
    fn form_name(&self) -> &str;

    /// Stored value for an attribute expression (`tags` or `tags[1]`).
    fn attribute_value(&self, attribute: &str) -> Option<Value>;

    fn input_name(&self, attribute: &str) -> String {
        naming::input_name(self.form_name(), attribute)
    }

    fn input_id(&self, attribute: &str) -> String {
        naming::input_id(self.form_name(), attribute)
    }

    fn label(&self, attribute: &str) -> String {
        naming::humanize(naming::attribute_name(attribute))
    }

    fn hint(&self, _attribute: &str) -> Option<String> {
        None
    }

    fn first_error(&self, _attribute: &str) -> Option<String> {
        None
    }

    fn is_required(&self, _attribute: &str) -> bool {
        false
    }

    /// Whether the attribute takes part in validation for the current scenario.
    fn is_active_attribute(&self, _attribute: &str) -> bool {
        true
    }

    fn client_validators(&self, _attribute: &str) -> Vec<ClientValidator> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// ModelHost
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelHost {
    pub form_name: String,
    pub attributes: Map<String, Value>,
    pub labels: HashMap<String, String>,
    pub hints: HashMap<String, String>,
    pub errors: HashMap<String, Vec<String>>,
    pub required: HashSet<String>,
    /// `None` means every attribute is active.
    pub active: Option<HashSet<String>>,
    pub validators: HashMap<String, Vec<ClientValidator>>,
}

impl ModelHost {
    pub fn new(form_name: impl Into<String>) -> Self {
        Self {
            form_name: form_name.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, attribute: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(attribute.into(), value);
        self
    }

    pub fn with_error(mut self, attribute: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors
            .entry(attribute.into())
            .or_default()
            .push(message.into());
        self
    }

    pub fn with_hint(mut self, attribute: impl Into<String>, hint: impl Into<String>) -> Self {
        self.hints.insert(attribute.into(), hint.into());
        self
    }

    pub fn with_required(mut self, attribute: impl Into<String>) -> Self {
        self.required.insert(attribute.into());
        self
    }

    pub fn with_validator(mut self, attribute: impl Into<String>, validator: ClientValidator) -> Self {
        self.validators
            .entry(attribute.into())
            .or_default()
            .push(validator);
        self
    }
}

impl FieldHost for ModelHost {
    fn form_name(&self) -> &str {
        &self.form_name
    }

    /// Walks bracket segments: `links[1][url]` reads
    /// `attributes["links"][1]["url"]`.
    fn attribute_value(&self, attribute: &str) -> Option<Value> {
        let (name, suffix) = naming::split_attribute(attribute);
        let mut current = self.attributes.get(name)?;
        for segment in naming::suffix_segments(suffix) {
            current = match current {
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                Value::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }
        Some(current.clone())
    }

    fn label(&self, attribute: &str) -> String {
        let name = naming::attribute_name(attribute);
        self.labels
            .get(name)
            .cloned()
            .unwrap_or_else(|| naming::humanize(name))
    }

    fn hint(&self, attribute: &str) -> Option<String> {
        self.hints.get(naming::attribute_name(attribute)).cloned()
    }

    fn first_error(&self, attribute: &str) -> Option<String> {
        self.errors
            .get(naming::attribute_name(attribute))
            .and_then(|messages| messages.first().cloned())
    }

    fn is_required(&self, attribute: &str) -> bool {
        self.required.contains(naming::attribute_name(attribute))
    }

    fn is_active_attribute(&self, attribute: &str) -> bool {
        match &self.active {
            Some(active) => active.contains(naming::attribute_name(attribute)),
            None => true,
        }
    }

    fn client_validators(&self, attribute: &str) -> Vec<ClientValidator> {
        self.validators
            .get(naming::attribute_name(attribute))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_value_walks_segments() {
        let host = ModelHost::new("Post").with_value(
            "links",
            json!([{ "url": "a" }, { "url": "b" }]),
        );
        assert_eq!(host.attribute_value("links[1][url]"), Some(json!("b")));
        assert_eq!(host.attribute_value("links[5]"), None);
        assert_eq!(host.attribute_value("missing"), None);
    }

    #[test]
    fn test_object_values_resolve_by_key() {
        let host = ModelHost::new("Post").with_value("tags", json!({ "7": "x" }));
        assert_eq!(host.attribute_value("tags[7]"), Some(json!("x")));
    }

    #[test]
    fn test_labels_fall_back_to_humanized_name() {
        let mut host = ModelHost::new("Post");
        assert_eq!(host.label("phone_numbers[0]"), "Phone Numbers");
        host.labels.insert("phone_numbers".into(), "Phones".into());
        assert_eq!(host.label("phone_numbers"), "Phones");
    }

    #[test]
    fn test_active_attributes() {
        let mut host = ModelHost::new("Post");
        assert!(host.is_active_attribute("tags"));
        host.active = Some(HashSet::from(["title".to_string()]));
        assert!(!host.is_active_attribute("tags"));
    }
}
