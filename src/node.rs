//! Node.js binding (`napi` feature).

use napi_derive::napi;

use crate::assets::ClientAssets;
use crate::config::ControlStyle;
use crate::{render_request, RenderRequest};

fn parse_style(style: Option<serde_json::Value>) -> napi::Result<ControlStyle> {
    match style {
        None | Some(serde_json::Value::Null) => Ok(ControlStyle::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| napi::Error::from_reason(format!("invalid control style: {e}"))),
    }
}

/// Render one field from a JSON render request.
#[napi]
pub fn render_array_field(request: serde_json::Value) -> napi::Result<serde_json::Value> {
    let request: RenderRequest = serde_json::from_value(request)
        .map_err(|e| napi::Error::from_reason(format!("invalid render request: {e}")))?;
    let output = render_request(&request).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(output).map_err(|e| napi::Error::from_reason(e.to_string()))
}

/// Runtime script, stylesheet and their hashed file names.
#[napi]
pub fn client_assets(style: Option<serde_json::Value>) -> napi::Result<serde_json::Value> {
    let assets = ClientAssets::generate(&parse_style(style)?)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    Ok(serde_json::json!({
        "js": assets.js,
        "css": assets.css,
        "jsFile": assets.js_file,
        "cssFile": assets.css_file,
    }))
}
