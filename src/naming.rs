//! Field naming conventions.
//!
//! - Indexed attribute: `tags` + 2 → `tags[2]`
//! - Input name (host form convention): `Post` + `tags[2]` → `Post[tags][2]`
//! - Input id: `Post[tags][2]` → `post-tags-2`
//! - Naming template: base id / base name without the index, shared by all
//!   slots of one group and by every clone made on the client.

use std::fmt;

use arcstr::ArcStr;

// ---------------------------------------------------------------------------
// Attribute names
// ---------------------------------------------------------------------------

/// `tags` + 3 → `tags[3]`
pub fn indexed_attribute(attribute: &str, index: usize) -> String {
    format!("{attribute}[{index}]")
}

/// Split an attribute expression into its bare name and bracket suffix:
/// `tags[0][label]` → (`tags`, `[0][label]`).
pub fn split_attribute(attribute: &str) -> (&str, &str) {
    match attribute.find('[') {
        Some(pos) => (&attribute[..pos], &attribute[pos..]),
        None => (attribute, ""),
    }
}

/// Bare attribute name without any index suffix.
pub fn attribute_name(attribute: &str) -> &str {
    split_attribute(attribute).0
}

/// Bracket segments of a suffix: `[0][label]` → [`0`, `label`].
pub fn suffix_segments(suffix: &str) -> Vec<&str> {
    suffix
        .split('[')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches(']'))
        .collect()
}

/// Input name for an attribute of the form named `form_name`.
/// An empty form name yields the attribute as-is.
pub fn input_name(form_name: &str, attribute: &str) -> String {
    let (name, suffix) = split_attribute(attribute);
    if form_name.is_empty() {
        format!("{name}{suffix}")
    } else {
        format!("{form_name}[{name}]{suffix}")
    }
}

/// Element id derived from an input name: brackets collapse to dashes,
/// dots and spaces become dashes, everything is lowercased.
pub fn id_from_name(name: &str) -> String {
    name.replace("[]", "")
        .replace("][", "-")
        .replace('[', "-")
        .replace(']', "")
        .replace([' ', '.'], "-")
        .to_lowercase()
}

pub fn input_id(form_name: &str, attribute: &str) -> String {
    id_from_name(&input_name(form_name, attribute))
}

/// `first_name` / `firstName` → `First Name`
pub fn humanize(attribute: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in attribute.chars() {
        if ch == '_' || ch == '-' || ch == '.' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// NamingTemplate
// ---------------------------------------------------------------------------

/// Base id and base name of one field group. Concrete slot names are the
/// template plus a literal index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamingTemplate {
    id: ArcStr,
    name: ArcStr,
}

impl NamingTemplate {
    pub fn new(id: impl Into<ArcStr>, name: impl Into<ArcStr>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> &ArcStr {
        &self.id
    }

    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// `post-tags` + 2 → `post-tags-2`
    pub fn indexed_id(&self, index: usize) -> String {
        format!("{}-{}", self.id, index)
    }

    /// `Post[tags]` + 2 → `Post[tags][2]`
    pub fn indexed_name(&self, index: usize) -> String {
        format!("{}[{}]", self.name, index)
    }

    /// Replace the index suffix of a name carrying `from`'s prefix.
    /// Names outside the template are left alone (`None`).
    ///
    /// `Post[tags][1][label]` (1 → 2) → `Post[tags][2][label]`
    pub fn reindex_name(&self, candidate: &str, from: usize, to: usize) -> Option<String> {
        let rest = candidate.strip_prefix(self.indexed_name(from).as_str())?;
        Some(format!("{}{}", self.indexed_name(to), rest))
    }

    /// Replace the index suffix of an id carrying `from`'s prefix. The prefix
    /// must end at a non-digit so `post-tags-1` never matches `post-tags-10`.
    pub fn reindex_id(&self, candidate: &str, from: usize, to: usize) -> Option<String> {
        let rest = candidate.strip_prefix(self.indexed_id(from).as_str())?;
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        Some(format!("{}{}", self.indexed_id(to), rest))
    }

    /// Index carried by a concrete slot name, if it belongs to this template.
    pub fn index_of_name(&self, candidate: &str) -> Option<usize> {
        let rest = candidate.strip_prefix(self.name.as_str())?.strip_prefix('[')?;
        let end = rest.find(']')?;
        rest[..end].parse().ok()
    }
}

impl fmt::Display for NamingTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_name_and_id() {
        assert_eq!(input_name("Post", "tags[0]"), "Post[tags][0]");
        assert_eq!(input_name("", "tags[0]"), "tags[0]");
        assert_eq!(input_id("Post", "tags[0]"), "post-tags-0");
        assert_eq!(input_id("Post", "tags"), "post-tags");
    }

    #[test]
    fn test_split_attribute() {
        assert_eq!(split_attribute("tags[0][label]"), ("tags", "[0][label]"));
        assert_eq!(split_attribute("tags"), ("tags", ""));
        assert_eq!(suffix_segments("[0][label]"), vec!["0", "label"]);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("tags"), "Tags");
        assert_eq!(humanize("first_name"), "First Name");
        assert_eq!(humanize("phoneNumbers"), "Phone Numbers");
    }

    #[test]
    fn test_reindex_replaces_suffix_not_appends() {
        let template = NamingTemplate::new("form-attr", "Model[attr]");
        assert_eq!(
            template.reindex_id("form-attr-1", 1, 2).as_deref(),
            Some("form-attr-2")
        );
        assert_eq!(
            template.reindex_name("Model[attr][1]", 1, 2).as_deref(),
            Some("Model[attr][2]")
        );
    }

    #[test]
    fn test_reindex_keeps_nested_suffix() {
        let template = NamingTemplate::new("post-links", "Post[links]");
        assert_eq!(
            template.reindex_name("Post[links][3][url]", 3, 4).as_deref(),
            Some("Post[links][4][url]")
        );
        assert_eq!(
            template.reindex_id("post-links-3-url", 3, 4).as_deref(),
            Some("post-links-4-url")
        );
    }

    #[test]
    fn test_reindex_id_respects_digit_boundary() {
        let template = NamingTemplate::new("post-tags", "Post[tags]");
        assert_eq!(template.reindex_id("post-tags-10", 1, 2), None);
        assert_eq!(template.reindex_id("other-1", 1, 2), None);
    }

    #[test]
    fn test_dot_in_template_is_literal() {
        let template = NamingTemplate::new("f.oo", "f.oo");
        assert_eq!(template.reindex_id("fxoo-0", 0, 1), None);
        assert_eq!(template.reindex_id("f.oo-0", 0, 1).as_deref(), Some("f.oo-1"));
    }

    #[test]
    fn test_index_of_name() {
        let template = NamingTemplate::new("post-tags", "Post[tags]");
        assert_eq!(template.index_of_name("Post[tags][7]"), Some(7));
        assert_eq!(template.index_of_name("Post[tags][x]"), None);
        assert_eq!(template.index_of_name("Post[other][1]"), None);
    }
}
