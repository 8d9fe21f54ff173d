//! Client assets.
//!
//! The browser half of the repeater: a dependency-free runtime script that
//! performs the same add / remove algorithm as [`crate::controller`] on the
//! live DOM, plus a small stylesheet. Both are generated from the
//! [`ControlStyle`] so custom class names stay in sync with the markup.

use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

use crate::config::ControlStyle;
use crate::markup::Element;
use crate::ArrayFieldError;

/// Directory (relative to the output root) the assets are written to.
pub const ASSET_DIR: &str = "assets";

// ---------------------------------------------------------------------------
// Runtime script
// ---------------------------------------------------------------------------

const RUNTIME_TEMPLATE: &str = r##"(function () {
  'use strict';

  var GROUP = "__GROUP__";
  var WRAPPER = "__WRAPPER__";
  var ADD = "__ADD__";
  var REMOVE = "__REMOVE__";
  var ADD_SWAP = "__ADD_SWAP__";
  var REMOVE_SWAP = "__REMOVE_SWAP__";
  var REMOVE_GLYPH = "__REMOVE_GLYPH__";

  function escapeRegExp(value) {
    return value.replace(/[.*+?^${}()|[\]\\-]/g, '\\$&');
  }

  function swapClasses(el, from, to) {
    from.split(/\s+/).forEach(function (c) { if (c) el.classList.remove(c); });
    to.split(/\s+/).forEach(function (c) { if (c) el.classList.add(c); });
  }

  function rewrite(root, attr, pattern, replacement) {
    var nodes = root.querySelectorAll('[' + attr + ']');
    for (var i = 0; i < nodes.length; i++) {
      var value = nodes[i].getAttribute(attr);
      if (pattern.test(value)) {
        nodes[i].setAttribute(attr, value.replace(pattern, replacement));
      }
    }
  }

  function lookupHook(name) {
    if (!name) return null;
    var registry = window.arrayFieldInit;
    if (registry && typeof registry[name] === 'function') return registry[name];
    return typeof window[name] === 'function' ? window[name] : null;
  }

  function add(control) {
    var wrapper = control.closest('.' + WRAPPER);
    if (!wrapper) return;

    var id = wrapper.getAttribute('data-id');
    var name = wrapper.getAttribute('data-name');
    if (!id || !name) {
      throw new Error('array field wrapper is missing data-id or data-name');
    }
    var index = parseInt(wrapper.getAttribute('data-index'), 10);
    if (isNaN(index)) {
      throw new Error('array field wrapper has no numeric data-index');
    }

    var newIndex = index + 1;
    var newId = id + '-' + newIndex;
    var newName = name + '[' + newIndex + ']';

    var clone = wrapper.cloneNode(true);
    clone.setAttribute('data-index', String(newIndex));
    rewrite(clone, 'name', new RegExp('^' + escapeRegExp(name + '[' + index + ']')), newName);
    rewrite(clone, 'id', new RegExp('^' + escapeRegExp(id + '-' + index) + '(?![0-9])'), newId);

    swapClasses(control, ADD_SWAP, REMOVE_SWAP);
    control.innerHTML = REMOVE_GLYPH;

    wrapper.parentNode.insertBefore(clone, wrapper.nextSibling);

    var hook = lookupHook(wrapper.getAttribute('data-init'));
    if (hook) hook(clone, newId, newName, newIndex);
  }

  function remove(control) {
    var wrapper = control.closest('.' + WRAPPER);
    if (wrapper && wrapper.parentNode) wrapper.parentNode.removeChild(wrapper);
  }

  document.addEventListener('click', function (event) {
    var target = event.target;
    if (!target || typeof target.closest !== 'function') return;
    var control = target.closest('.' + ADD + ', .' + REMOVE);
    if (!control || !control.closest('.' + GROUP)) return;
    if (control.classList.contains(ADD)) {
      add(control);
    } else {
      remove(control);
    }
  });
})();
"##;

/// Escape a value for a double-quoted JS string literal.
pub fn escape_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' => out.push_str("\\u003C"),
            c => out.push(c),
        }
    }
    out
}

pub fn generate_runtime_js(style: &ControlStyle) -> String {
    let replacements = [
        ("__GROUP__", style.group_marker.clone()),
        ("__WRAPPER__", style.wrapper_marker.clone()),
        ("__ADD_SWAP__", style.add_swap_classes()),
        ("__REMOVE_SWAP__", style.remove_swap_classes()),
        ("__REMOVE_GLYPH__", style.remove_glyph.clone()),
        ("__ADD__", style.add_marker.clone()),
        ("__REMOVE__", style.remove_marker.clone()),
    ];
    replacements
        .iter()
        .fold(RUNTIME_TEMPLATE.to_string(), |js, (token, value)| {
            js.replace(token, &escape_js_string(value))
        })
}

// ---------------------------------------------------------------------------
// Stylesheet
// ---------------------------------------------------------------------------

fn stylesheet_source(style: &ControlStyle) -> String {
    format!(
        ".{group} .{wrapper} {{ display: flex; align-items: center; gap: 4px; margin-bottom: 5px; }}\n\
         .{group} .{wrapper}:last-of-type {{ margin-bottom: 0; }}\n\
         .{group} .{wrapper}.input-group {{ display: table; }}\n\
         .{group} .{add}, .{group} .{remove} {{ min-width: 34px; }}\n",
        group = style.group_marker,
        wrapper = style.wrapper_marker,
        add = style.add_marker,
        remove = style.remove_marker,
    )
}

/// Parse and minify the stylesheet for `style`.
pub fn generate_css(style: &ControlStyle) -> Result<String, ArrayFieldError> {
    let source = stylesheet_source(style);
    let mut stylesheet = StyleSheet::parse(&source, ParserOptions::default())
        .map_err(|e| ArrayFieldError::StylesheetError(format!("CSS parse error: {e}")))?;
    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| ArrayFieldError::StylesheetError(format!("CSS minify error: {e}")))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| ArrayFieldError::StylesheetError(format!("CSS print error: {e}")))?;
    Ok(result.code)
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

/// 8-hex-digit content hash used in asset file names.
pub fn stable_hash_8(content: &str) -> String {
    let mut hash: i32 = 0;
    for byte in content.bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(byte as i32);
    }
    let normalized = hash.wrapping_abs() as u32;
    format!("{normalized:08x}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAssets {
    pub js: String,
    pub css: String,
    /// `assets/array-field.<hash>.js`
    pub js_file: String,
    /// `assets/array-field.<hash>.css`
    pub css_file: String,
}

/// Paths written by [`ClientAssets::write_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAssets {
    pub js: PathBuf,
    pub css: PathBuf,
}

impl ClientAssets {
    pub fn generate(style: &ControlStyle) -> Result<Self, ArrayFieldError> {
        let js = generate_runtime_js(style);
        let css = generate_css(style)?;
        let js_file = format!("{ASSET_DIR}/array-field.{}.js", stable_hash_8(&js));
        let css_file = format!("{ASSET_DIR}/array-field.{}.css", stable_hash_8(&css));
        Ok(Self {
            js,
            css,
            js_file,
            css_file,
        })
    }

    /// `<script>` tag referencing the runtime from the site root.
    pub fn script_tag(&self) -> Element {
        Element::new("script")
            .with_attr("src", format!("/{}", self.js_file))
            .with_flag("defer")
    }

    /// `<link>` tag referencing the stylesheet from the site root.
    pub fn link_tag(&self) -> Element {
        Element::new("link")
            .with_attr("rel", "stylesheet")
            .with_attr("href", format!("/{}", self.css_file))
    }

    /// Write both files below `out_dir`, creating directories as needed.
    pub async fn write_to(&self, out_dir: &Path) -> Result<EmittedAssets, ArrayFieldError> {
        tokio::fs::create_dir_all(out_dir.join(ASSET_DIR)).await?;

        let js = out_dir.join(&self.js_file);
        let css = out_dir.join(&self.css_file);
        tokio::fs::write(&js, &self.js).await?;
        tokio::fs::write(&css, &self.css).await?;

        tracing::debug!(js = %js.display(), css = %css.display(), "array field assets written");
        Ok(EmittedAssets { js, css })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_uses_style_markers() {
        let js = generate_runtime_js(&ControlStyle::default());
        assert!(js.contains(r#"var GROUP = "array-field-group";"#));
        assert!(js.contains(r#"var ADD_SWAP = "btn-success array-field-add";"#));
        assert!(js.contains(r#"var REMOVE_GLYPH = "&ndash;";"#));
        assert!(!js.contains("__"), "unreplaced placeholder in runtime");
    }

    #[test]
    fn test_runtime_fails_loudly_on_missing_metadata() {
        let js = generate_runtime_js(&ControlStyle::default());
        assert!(js.contains("throw new Error('array field wrapper is missing data-id or data-name')"));
        assert!(js.contains("window.arrayFieldInit"));
    }

    #[test]
    fn test_runtime_reindex_patterns() {
        let js = generate_runtime_js(&ControlStyle::default());
        let lines: Vec<&str> = js.lines().map(str::trim).collect();
        for expected in [
            r#"return value.replace(/[.*+?^${}()|[\]\\-]/g, '\\$&');"#,
            r#"rewrite(clone, 'name', new RegExp('^' + escapeRegExp(name + '[' + index + ']')), newName);"#,
            r#"rewrite(clone, 'id', new RegExp('^' + escapeRegExp(id + '-' + index) + '(?![0-9])'), newId);"#,
            "var nodes = root.querySelectorAll('[' + attr + ']');",
        ] {
            assert!(lines.contains(&expected), "runtime is missing `{expected}`");
        }
    }

    #[test]
    fn test_runtime_escapes_custom_values() {
        let style = ControlStyle {
            remove_glyph: "\"x\"</script>".into(),
            ..ControlStyle::default()
        };
        let js = generate_runtime_js(&style);
        assert!(js.contains(r#"var REMOVE_GLYPH = "\"x\"\u003C/script>";"#));
    }

    #[test]
    fn test_css_is_minified_and_uses_markers() {
        let style = ControlStyle {
            wrapper_marker: "repeat-row".into(),
            ..ControlStyle::default()
        };
        let css = generate_css(&style).unwrap();
        assert!(css.contains(".array-field-group .repeat-row"));
        assert!(!css.contains('\n'));
    }

    #[test]
    fn test_invalid_marker_is_stylesheet_error() {
        let style = ControlStyle {
            group_marker: "{".into(),
            ..ControlStyle::default()
        };
        assert!(matches!(generate_css(&style), Err(ArrayFieldError::StylesheetError(_))));
    }

    #[test]
    fn test_stable_hash_8() {
        assert_eq!(stable_hash_8(""), "00000000");
        assert_eq!(stable_hash_8("a"), "00000061");
        assert_eq!(stable_hash_8("abc"), stable_hash_8("abc"));
        assert_ne!(stable_hash_8("abc"), stable_hash_8("abd"));
    }

    #[test]
    fn test_file_names_follow_content() {
        let assets = ClientAssets::generate(&ControlStyle::default()).unwrap();
        assert_eq!(assets.js_file, format!("assets/array-field.{}.js", stable_hash_8(&assets.js)));
        assert_eq!(
            assets.link_tag().to_html(),
            format!(r#"<link rel="stylesheet" href="/{}">"#, assets.css_file)
        );
    }
}
