use std::fmt;

use crate::template::MessageTemplate;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A field, by wire name.
    Field(String),
    /// An element of a repeated field.
    Index(usize),
    /// An entry of a map field, by stringified key.
    Key(String),
}

impl PathSegment {
    /// The segment as a plain string: the field name, the index, or the key.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Field(name) | Self::Key(name) => name.clone(),
            Self::Index(index) => index.to_string(),
        }
    }
}

/// Ordered traversal from the validated message to the offending value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path, used by message-level violations.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Path segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Path segments rendered as plain strings, e.g. `["members", "1", "name"]`.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.segments.iter().map(PathSegment::as_text).collect()
    }

    /// Whether this is the empty path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn prepend(&mut self, segment: PathSegment) {
        self.segments.insert(0, segment);
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => {
                    let encoded =
                        serde_json::to_string(key).unwrap_or_else(|_| "\"\"".to_string());
                    write!(f, "[{encoded}]")?;
                }
            }
        }
        Ok(())
    }
}

/// A single instance where a constraint was not met.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Violation {
    message_type: String,
    field_path: FieldPath,
    rule_id: String,
    template: MessageTemplate,
}

impl Violation {
    pub(crate) fn new(rule_id: impl Into<String>, template: MessageTemplate) -> Self {
        Self {
            message_type: String::new(),
            field_path: FieldPath::root(),
            rule_id: rule_id.into(),
            template,
        }
    }

    /// Fully-qualified name of the validated (root) message type.
    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Path from the root message to the offending value.
    #[must_use]
    pub fn field_path(&self) -> &FieldPath {
        &self.field_path
    }

    /// Option name of the violated constraint, e.g. `"pattern"`.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// Unrendered message template and its placeholder values.
    #[must_use]
    pub fn template(&self) -> &MessageTemplate {
        &self.template
    }

    /// Rendered human-readable message.
    #[must_use]
    pub fn message(&self) -> String {
        self.template.render()
    }

    pub(crate) fn at_field(mut self, name: &str) -> Self {
        self.prepend_field(name);
        self
    }

    pub(crate) fn prepend_field(&mut self, name: &str) {
        self.field_path
            .prepend(PathSegment::Field(name.to_string()));
    }

    pub(crate) fn prepend_segment(&mut self, segment: PathSegment) {
        self.field_path.prepend(segment);
    }

    pub(crate) fn set_message_type(&mut self, message_type: &str) {
        message_type.clone_into(&mut self.message_type);
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.field_path.is_empty() {
            write!(f, "{}: ", self.field_path)?;
        }
        let message = self.message();
        if message.is_empty() {
            write!(f, "[{}]", self.rule_id)
        } else {
            f.write_str(&message)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::collection::vec;
    use proptest::prelude::*;

    use super::{FieldPath, PathSegment, Violation};
    use crate::template::MessageTemplate;

    #[test]
    fn prepending_builds_root_to_leaf_paths() {
        let mut violation = Violation::new(
            "required",
            MessageTemplate::new("{field} is required").with_param("field", "name"),
        )
        .at_field("name");
        violation.prepend_segment(PathSegment::Index(1));
        violation.prepend_field("members");

        assert_eq!(
            violation.field_path().to_strings(),
            vec!["members", "1", "name"]
        );
        assert_eq!(violation.to_string(), "members[1].name: name is required");
    }

    #[test]
    fn map_keys_render_json_escaped() {
        let path = FieldPath::from(vec![
            PathSegment::Field("roster".into()),
            PathSegment::Key("line\n\"quoted\"".into()),
            PathSegment::Field("name".into()),
        ]);
        assert_eq!(path.to_string(), r#"roster["line\n\"quoted\""].name"#);
    }

    #[test]
    fn display_falls_back_to_rule_id_without_message() {
        let violation = Violation::new("choice", MessageTemplate::new(""));
        assert_eq!(violation.to_string(), "[choice]");

        let message_level = Violation::new(
            "require",
            MessageTemplate::new("need {fields}").with_param("fields", "id | email"),
        );
        assert_eq!(message_level.to_string(), "need id | email");
        assert!(message_level.field_path().is_empty());
    }

    proptest! {
        #[test]
        fn dotted_paths_render_field_names_in_order(
            names in vec("[a-z_][a-z0-9_]{0,8}", 1..6)
        ) {
            let path = FieldPath::from(
                names.iter().cloned().map(PathSegment::Field).collect::<Vec<_>>(),
            );
            prop_assert_eq!(path.to_string(), names.join("."));
            prop_assert_eq!(path.to_strings(), names);
        }

        #[test]
        fn indexes_render_as_subscripts(name in "[a-z_][a-z0-9_]{0,8}", index in 0_usize..10_000) {
            let path = FieldPath::from(vec![PathSegment::Field(name.clone()), PathSegment::Index(index)]);
            prop_assert_eq!(path.to_string(), format!("{name}[{index}]"));
        }
    }
}
