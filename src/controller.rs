//! Repeater Controller.
//!
//! Structural counterpart of the browser runtime in [`crate::assets`]: it
//! applies add / remove clicks to a rendered field group held as an
//! [`Element`] tree.
//!
//! Add on wrapper `W` at index `i`:
//! 1. clone `W` into `W'`
//! 2. in `W'`, rewrite every `name` starting with `data-name[i]` and every
//!    `id` starting with `data-id-i` to index `i + 1`
//! 3. set `W'`'s `data-index` to `i + 1`
//! 4. turn `W`'s add control into a remove control (`W'` keeps the add control)
//! 5. insert `W'` right after `W`
//! 6. run the init hook named by `data-init`, if registered
//!
//! Remove detaches the wrapper. Sibling indices are never renumbered; the
//! next server render reindexes densely.

use regex::Regex;

use crate::config::ControlStyle;
use crate::markup::{escape_attr_value, unescape_attr_value, Element, Node};
use crate::naming::NamingTemplate;
use crate::registry::{InitContext, InitHookRegistry};
use crate::{ArrayFieldError, ControlKind};

/// Result of a successful add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub hook_invoked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    Added(AddOutcome),
    Removed(Element),
}

/// Observable state of one wrapper, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperState {
    pub index: Option<usize>,
    pub names: Vec<String>,
    pub ids: Vec<String>,
    pub control: Option<ControlKind>,
}

// ---------------------------------------------------------------------------
// Raw markup rewriting
// ---------------------------------------------------------------------------

/// Any `name` / `id` attribute inside opaque markup: double-quoted,
/// single-quoted or unquoted.
const RAW_ATTRIBUTE: &str =
    r#"(?:^|[\s"'/])((?i:name|id))\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#;

/// Rewrites `name` / `id` prefixes inside opaque markup, where no structural
/// access exists. Prefixes are regex-escaped; every quoting style is
/// accepted.
struct RawRewriter {
    name_re: Regex,
    id_re: Regex,
    attribute_re: Regex,
    template: NamingTemplate,
    from: usize,
    to: usize,
    new_name: String,
    new_id: String,
}

impl RawRewriter {
    fn new(template: &NamingTemplate, from: usize, to: usize) -> Result<Self, ArrayFieldError> {
        let old_name = regex::escape(&escape_attr_value(&template.indexed_name(from)));
        let old_id = regex::escape(&escape_attr_value(&template.indexed_id(from)));
        Ok(Self {
            name_re: Regex::new(&format!(
                r#"((?:^|[\s"'/])(?i:name)\s*=\s*["']?){old_name}"#
            ))?,
            id_re: Regex::new(&format!(
                r#"((?:^|[\s"'/])(?i:id)\s*=\s*["']?){old_id}([^0-9]|$)"#
            ))?,
            attribute_re: Regex::new(RAW_ATTRIBUTE)?,
            template: template.clone(),
            from,
            to,
            new_name: escape_attr_value(&template.indexed_name(to)),
            new_id: escape_attr_value(&template.indexed_id(to)),
        })
    }

    fn apply(&self, raw: &str) -> String {
        let renamed = self.name_re.replace_all(raw, |caps: &regex::Captures<'_>| {
            format!("{}{}", &caps[1], self.new_name)
        });
        self.id_re
            .replace_all(&renamed, |caps: &regex::Captures<'_>| {
                format!("{}{}{}", &caps[1], self.new_id, &caps[2])
            })
            .into_owned()
    }

    /// First `name` / `id` attribute in `raw` still addressing the old
    /// index, e.g. one spelled with entities the prefix patterns miss.
    fn stale_attribute(&self, raw: &str) -> Option<String> {
        self.attribute_re.captures_iter(raw).find_map(|caps| {
            let attribute = caps[1].to_ascii_lowercase();
            let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?;
            let value = unescape_attr_value(value.as_str());
            let stale = if attribute == "name" {
                self.template.reindex_name(&value, self.from, self.to).is_some()
            } else {
                self.template.reindex_id(&value, self.from, self.to).is_some()
            };
            stale.then(|| format!("{attribute}=\"{value}\""))
        })
    }
}

/// Move every name / id below `wrapper` from index `from` to `to`. The
/// wrapper's own attributes are left alone, as the browser runtime does.
///
/// Fails if opaque markup keeps a name or id of the old index after
/// rewriting: inserting it would submit two values under one name.
fn reindex_wrapper(
    wrapper: &mut Element,
    template: &NamingTemplate,
    from: usize,
    to: usize,
    position: usize,
) -> Result<(), ArrayFieldError> {
    for child in wrapper.children.iter_mut().filter_map(Node::as_element_mut) {
        child.for_each_element_mut(&mut |el| {
            if let Some(name) = el.attr("name").and_then(|n| template.reindex_name(n, from, to)) {
                el.set_attr("name", name);
            }
            if let Some(id) = el.attr("id").and_then(|v| template.reindex_id(v, from, to)) {
                el.set_attr("id", id);
            }
        });
    }

    let mut has_raw = false;
    wrapper.for_each_raw_mut(&mut |_| has_raw = true);
    if !has_raw {
        return Ok(());
    }

    let rewriter = RawRewriter::new(template, from, to)?;
    let mut stale = None;
    wrapper.for_each_raw_mut(&mut |raw| {
        *raw = rewriter.apply(raw);
        if stale.is_none() {
            stale = rewriter.stale_attribute(raw);
        }
    });
    match stale {
        Some(attribute) => {
            tracing::error!(
                position,
                %attribute,
                "array field clone keeps an attribute of the source slot, refusing to insert"
            );
            Err(ArrayFieldError::StaleAttribute {
                position,
                attribute,
            })
        }
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tree addressing
// ---------------------------------------------------------------------------

fn collect_wrapper_paths(el: &Element, marker: &str, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    for (i, child) in el.children.iter().enumerate() {
        let Node::Element(child) = child else { continue };
        path.push(i);
        if child.has_class(marker) {
            out.push(path.clone());
        } else {
            collect_wrapper_paths(child, marker, path, out);
        }
        path.pop();
    }
}

fn element_at<'a>(root: &'a Element, path: &[usize]) -> Option<&'a Element> {
    let mut current = root;
    for &i in path {
        current = current.children.get(i)?.as_element()?;
    }
    Some(current)
}

fn element_at_mut<'a>(root: &'a mut Element, path: &[usize]) -> Option<&'a mut Element> {
    let mut current = root;
    for &i in path {
        current = current.children.get_mut(i)?.as_element_mut()?;
    }
    Some(current)
}

// ---------------------------------------------------------------------------
// RepeaterController
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RepeaterController {
    style: ControlStyle,
    hooks: InitHookRegistry,
}

impl RepeaterController {
    pub fn new(style: ControlStyle, hooks: InitHookRegistry) -> Self {
        Self { style, hooks }
    }

    pub fn style(&self) -> &ControlStyle {
        &self.style
    }

    pub fn hooks(&self) -> &InitHookRegistry {
        &self.hooks
    }

    fn ensure_group(&self, group: &Element) -> Result<(), ArrayFieldError> {
        if group.has_class(&self.style.group_marker) {
            Ok(())
        } else {
            Err(ArrayFieldError::NotAFieldGroup {
                marker: self.style.group_marker.clone(),
            })
        }
    }

    fn wrapper_paths(&self, group: &Element) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        collect_wrapper_paths(group, &self.style.wrapper_marker, &mut Vec::new(), &mut out);
        out
    }

    fn locate(&self, group: &Element, position: usize) -> Result<Vec<usize>, ArrayFieldError> {
        self.ensure_group(group)?;
        let mut paths = self.wrapper_paths(group);
        let len = paths.len();
        if position >= len {
            return Err(ArrayFieldError::WrapperOutOfRange { position, len });
        }
        Ok(paths.swap_remove(position))
    }

    /// Wrappers of `group` in document order.
    pub fn wrappers<'a>(&self, group: &'a Element) -> Vec<&'a Element> {
        self.wrapper_paths(group)
            .iter()
            .filter_map(|path| element_at(group, path))
            .collect()
    }

    /// Kind of the first control found inside `wrapper`.
    pub fn control_kind(&self, wrapper: &Element) -> Option<ControlKind> {
        let add = &self.style.add_marker;
        let remove = &self.style.remove_marker;
        let control = wrapper.find(&|el| el.has_class(add) || el.has_class(remove))?;
        if control.has_class(add) {
            Some(ControlKind::Add)
        } else {
            Some(ControlKind::Remove)
        }
    }

    pub fn describe(&self, group: &Element) -> Vec<WrapperState> {
        self.wrappers(group)
            .into_iter()
            .map(|wrapper| {
                let mut named = Vec::new();
                wrapper.find_all(&|el| el.has_attr("name"), &mut named);
                let mut with_id = Vec::new();
                wrapper.find_all(&|el| el.has_attr("id"), &mut with_id);
                WrapperState {
                    index: wrapper.attr("data-index").and_then(|v| v.parse().ok()),
                    names: named.iter().filter_map(|el| el.attr("name")).map(str::to_string).collect(),
                    ids: with_id.iter().filter_map(|el| el.attr("id")).map(str::to_string).collect(),
                    control: self.control_kind(wrapper),
                }
            })
            .collect()
    }

    /// Delegated click on the control of the wrapper at `position`.
    pub fn click(&self, group: &mut Element, position: usize) -> Result<ControlEvent, ArrayFieldError> {
        let path = self.locate(group, position)?;
        let wrapper = element_at(group, &path).ok_or(ArrayFieldError::WrapperOutOfRange {
            position,
            len: position,
        })?;
        match self.control_kind(wrapper) {
            Some(ControlKind::Add) => self.add(group, position).map(ControlEvent::Added),
            Some(ControlKind::Remove) => self.remove(group, position).map(ControlEvent::Removed),
            None => Err(ArrayFieldError::NoControl { position }),
        }
    }

    /// Clone the wrapper at `position` and insert the clone after it.
    ///
    /// Fails without touching the tree when the wrapper lacks an add
    /// control, `data-index`, `data-id` or `data-name`: a clone without its
    /// naming template would duplicate the submitted field names.
    pub fn add(&self, group: &mut Element, position: usize) -> Result<AddOutcome, ArrayFieldError> {
        let path = self.locate(group, position)?;
        let Some((&child_index, parent_path)) = path.split_last() else {
            return Err(ArrayFieldError::WrapperOutOfRange { position, len: 0 });
        };

        let (clone, index, template, init) = {
            let wrapper = element_at(group, &path).ok_or(ArrayFieldError::WrapperOutOfRange {
                position,
                len: position,
            })?;

            if self.control_kind(wrapper) != Some(ControlKind::Add) {
                return Err(ArrayFieldError::ControlMissing {
                    position,
                    kind: ControlKind::Add,
                });
            }

            let raw_index = required_attr(wrapper, "data-index", position)?;
            let index: usize = raw_index.parse().map_err(|_| ArrayFieldError::InvalidIndex {
                value: raw_index.to_string(),
                position,
            })?;
            let id = required_attr(wrapper, "data-id", position)?;
            let name = required_attr(wrapper, "data-name", position)?;
            let template = NamingTemplate::new(id, name);

            let mut clone = wrapper.clone();
            reindex_wrapper(&mut clone, &template, index, index + 1, position)?;
            clone.set_attr("data-index", (index + 1).to_string());

            (clone, index, template, wrapper.attr("data-init").map(str::to_string))
        };

        let new_index = index + 1;
        let new_id = template.indexed_id(new_index);
        let new_name = template.indexed_name(new_index);

        let parent = element_at_mut(group, parent_path).ok_or(ArrayFieldError::WrapperOutOfRange {
            position,
            len: position,
        })?;
        if let Some(Node::Element(wrapper)) = parent.children.get_mut(child_index) {
            self.swap_to_remove(wrapper);
        }
        parent.children.insert(child_index + 1, Node::Element(clone));

        let hook_invoked = match (init, parent.children.get_mut(child_index + 1)) {
            (Some(init), Some(Node::Element(inserted))) => self.hooks.invoke(
                &init,
                inserted,
                &InitContext {
                    id: &new_id,
                    name: &new_name,
                    index: new_index,
                },
            ),
            _ => false,
        };

        tracing::debug!(
            position,
            index = new_index,
            name = %new_name,
            hook_invoked,
            "array field slot added"
        );

        Ok(AddOutcome {
            index: new_index,
            id: new_id,
            name: new_name,
            hook_invoked,
        })
    }

    /// Detach the wrapper at `position`. Other wrappers are left untouched.
    pub fn remove(&self, group: &mut Element, position: usize) -> Result<Element, ArrayFieldError> {
        let path = self.locate(group, position)?;
        let Some((&child_index, parent_path)) = path.split_last() else {
            return Err(ArrayFieldError::WrapperOutOfRange { position, len: 0 });
        };

        let is_remove = element_at(group, &path)
            .and_then(|wrapper| self.control_kind(wrapper))
            == Some(ControlKind::Remove);
        if !is_remove {
            return Err(ArrayFieldError::ControlMissing {
                position,
                kind: ControlKind::Remove,
            });
        }

        let parent = element_at_mut(group, parent_path).ok_or(ArrayFieldError::WrapperOutOfRange {
            position,
            len: position,
        })?;
        match parent.children.remove(child_index) {
            Node::Element(removed) => {
                tracing::debug!(position, index = ?removed.attr("data-index"), "array field slot removed");
                Ok(removed)
            }
            other => {
                parent.children.insert(child_index, other);
                Err(ArrayFieldError::WrapperOutOfRange { position, len: position })
            }
        }
    }

    fn swap_to_remove(&self, wrapper: &mut Element) {
        let add_marker = self.style.add_marker.as_str();
        if let Some(control) = wrapper.find_mut(&|el| el.has_class(add_marker)) {
            control.remove_class(&self.style.add_swap_classes());
            control.add_class(&self.style.remove_swap_classes());
            control.children = vec![Node::Raw(self.style.remove_glyph.clone())];
        }
    }
}

fn required_attr<'a>(
    wrapper: &'a Element,
    attribute: &'static str,
    position: usize,
) -> Result<&'a str, ArrayFieldError> {
    match wrapper.attr(attribute) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => {
            tracing::error!(
                position,
                attribute,
                "array field wrapper is missing its naming metadata, refusing to clone"
            );
            Err(ArrayFieldError::MissingDataAttribute {
                attribute,
                position,
            })
        }
    }
}
