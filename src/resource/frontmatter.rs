//! YAML frontmatter parsing for resource files.
//!
//! Resource files start with a `---` delimited YAML block followed by free
//! markdown. Extraction goes through `gray_matter`; field access is done on
//! the parsed `serde_yaml` mapping so loaders can tolerate loosely typed input
//! (for example `allowed-tools` as either a list or a comma separated string).

use gray_matter::{Matter, engine::YAML};
use serde_yaml::{Mapping, Value};

/// Parsed frontmatter block plus the body that follows it.
#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    fields: Mapping,
    /// Markdown content after the closing delimiter.
    pub body: String,
}

impl Frontmatter {
    /// Parse frontmatter from file content.
    ///
    /// Missing frontmatter and malformed YAML are both errors; the returned
    /// string is a human readable reason.
    pub fn parse(content: &str) -> Result<Self, String> {
        if !content.trim_start().starts_with("---") {
            return Err("missing frontmatter (file must start with '---')".to_string());
        }

        let matter = Matter::<YAML>::new();
        let parsed = matter
            .parse::<Value>(content)
            .map_err(|e| format!("malformed YAML frontmatter: {e}"))?;

        let fields = match parsed.data {
            Some(Value::Mapping(map)) => map,
            Some(Value::Null) | None => Mapping::new(),
            Some(_) => return Err("frontmatter must be a YAML mapping".to_string()),
        };

        Ok(Self {
            fields,
            body: parsed.content,
        })
    }

    /// Whether `key` is present (with any value).
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Whether any of `keys` is present.
    #[must_use]
    pub fn has_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.has(key))
    }

    /// String value for `key`; numbers and booleans are stringified, empty strings are `None`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        let value = match self.fields.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!value.is_empty()).then_some(value)
    }

    /// List value for `key`.
    ///
    /// Accepts a YAML sequence of scalars or a single string split on commas
    /// and whitespace.
    #[must_use]
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) => s
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}
