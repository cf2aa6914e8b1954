use std::collections::BTreeMap;
use std::fmt;

/// A message format string with named `{placeholder}`s and their values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    format: String,
    params: BTreeMap<String, String>,
}

impl MessageTemplate {
    pub(crate) fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            params: BTreeMap::new(),
        }
    }

    pub(crate) fn with_param(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    /// The unrendered format string.
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Placeholder values by name.
    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Value of a single placeholder.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Substitute the placeholders into the format string.
    #[must_use]
    pub fn render(&self) -> String {
        render(&self.format, &self.params)
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Substitute `{name}` placeholders in `format` with values from `params`.
///
/// Unknown placeholders are left as written; `{{` and `}}` produce literal
/// braces.
///
/// ```
/// use std::collections::BTreeMap;
/// use prost_validators::render;
///
/// let params = BTreeMap::from([("field".to_string(), "email".to_string())]);
/// assert_eq!(render("{field} is required", &params), "email is required");
/// ```
#[must_use]
pub fn render(format: &str, params: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;

    while let Some(idx) = rest.find(['{', '}']) {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        let Some(close) = tail.find('}') else {
            out.push_str(tail);
            rest = "";
            break;
        };
        let name = &tail[1..close];
        match params.get(name) {
            Some(value) if is_placeholder_name(name) => out.push_str(value),
            _ => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }

    out.push_str(rest);
    out
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
