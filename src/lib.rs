//! # Zenith Array Field
//!
//! A repeatable form field for one array-valued model attribute.
//!
//! The server side renders the attribute as a group of indexed slots
//! (`Post[tags][0]`, `Post[tags][1]`, ...), each in a wrapper with an add or
//! remove control. The client side (the generated runtime in [`assets`], or
//! its structural twin [`controller::RepeaterController`]) clones and
//! removes wrappers, keeping submitted names index-addressable.
//!
//! Rendering is deterministic: the same host state and configuration always
//! produce byte-identical markup.

pub mod assets;
pub mod client_options;
pub mod config;
pub mod controller;
pub mod host;
pub mod inputs;
pub mod markup;
pub mod naming;
pub mod registry;
pub mod renderer;
pub mod slots;

#[cfg(feature = "napi")]
mod node;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use assets::ClientAssets;
pub use config::{ControlStyle, FieldConfig, HtmlOptions};
pub use controller::{AddOutcome, ControlEvent, RepeaterController};
pub use host::{FieldHost, ModelHost};
pub use inputs::{InputKind, SelectItem, SubWidget};
pub use markup::{Element, Node};
pub use naming::NamingTemplate;
pub use registry::{InitContext, InitHookRegistry};
pub use renderer::ArrayField;

// ---------------------------------------------------------------------------
// ControlKind
// ---------------------------------------------------------------------------

/// Role of the button inside a slot wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    /// Clones its wrapper. Carried by the last wrapper only.
    Add,
    /// Detaches its wrapper.
    Remove,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlKind::Add => f.write_str("add"),
            ControlKind::Remove => f.write_str("remove"),
        }
    }
}

// ---------------------------------------------------------------------------
// ArrayFieldError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ArrayFieldError {
    #[error("Wrapper {position} is missing `{attribute}`")]
    MissingDataAttribute {
        attribute: &'static str,
        position: usize,
    },

    #[error("Wrapper {position} has non-numeric data-index `{value}`")]
    InvalidIndex { value: String, position: usize },

    #[error("Wrapper position {position} out of range ({len} wrappers)")]
    WrapperOutOfRange { position: usize, len: usize },

    #[error("Wrapper {position} has no {kind} control")]
    ControlMissing { position: usize, kind: ControlKind },

    #[error("Wrapper {position} has no add or remove control")]
    NoControl { position: usize },

    #[error("Wrapper {position} clone still carries `{attribute}` of the source slot")]
    StaleAttribute { position: usize, attribute: String },

    #[error("Element is not a field group (missing class `{marker}`)")]
    NotAFieldGroup { marker: String },

    #[error("Failed to render `{attribute}`: {message}")]
    RenderError { attribute: String, message: String },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Stylesheet error: {0}")]
    StylesheetError(String),

    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Render request
// ---------------------------------------------------------------------------

/// Everything needed to render one field without Rust-side setup: the
/// stdin payload of the CLI and the argument of the Node binding.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderRequest {
    pub host: ModelHost,
    pub attribute: String,
    #[serde(default)]
    pub input: InputKind,
    #[serde(default)]
    pub options: HtmlOptions,
    #[serde(default)]
    pub config: FieldConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    pub html: String,
    pub client_options: Vec<Value>,
    pub requires_multipart: bool,
    /// Number of wrappers in `html`.
    pub slot_count: usize,
}

/// Render the field described by `request`.
pub fn render_request(request: &RenderRequest) -> Result<RenderOutput, ArrayFieldError> {
    if request.attribute.trim().is_empty() {
        return Err(ArrayFieldError::InvalidOptions(
            "attribute must be a non-empty string".into(),
        ));
    }

    let mut field = ArrayField::new(&request.host, request.attribute.as_str(), request.config.clone());
    field.render_kind(&request.input, &request.options)?;
    let group = field.render()?;

    let output = RenderOutput {
        html: group.to_html(),
        client_options: field.client_options(),
        requires_multipart: field.requires_multipart(),
        slot_count: field.slots().len(),
    };
    tracing::debug!(
        attribute = %request.attribute,
        slots = output.slot_count,
        "array field rendered"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_request_from_json() {
        let request: RenderRequest = serde_json::from_value(json!({
            "host": {
                "form_name": "Post",
                "attributes": { "tags": ["a", "b"] }
            },
            "attribute": "tags",
            "config": { "show_new_fields": 1 }
        }))
        .unwrap();

        let output = render_request(&request).unwrap();
        assert_eq!(output.slot_count, 3);
        assert!(!output.requires_multipart);
        assert!(output.html.contains(r#"name="Post[tags][2]""#));
        assert!(output.client_options.is_empty());
    }

    #[test]
    fn test_unknown_request_field_rejected() {
        let result = serde_json::from_value::<RenderRequest>(json!({
            "host": {},
            "attribute": "tags",
            "bogus": true
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_attribute_rejected() {
        let request = RenderRequest {
            host: ModelHost::new("Post"),
            attribute: " ".into(),
            input: InputKind::Text,
            options: HtmlOptions::new(),
            config: FieldConfig::default(),
        };
        assert!(matches!(render_request(&request), Err(ArrayFieldError::InvalidOptions(_))));
    }

    #[test]
    fn test_control_kind_display() {
        assert_eq!(ControlKind::Add.to_string(), "add");
        assert_eq!(ControlKind::Remove.to_string(), "remove");
    }
}
