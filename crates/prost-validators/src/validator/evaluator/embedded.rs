use std::sync::Arc;

use prost_reflect::{DynamicMessage, FieldDescriptor, ReflectMessage};

use crate::config::ValidationConfig;
use crate::error::{Error, ValidationError};
use crate::template::MessageTemplate;
use crate::violation::{PathSegment, Violation};

use super::MessageEvaluator;
use super::message::MessageEval;

const NESTED_MESSAGE: &str = "Nested message validation failed";

/// Recursive validation of a singular message field. Unset fields are skipped.
pub(crate) struct EmbeddedMessageEval {
    pub descriptor: FieldDescriptor,
    /// The evaluator for the nested message type.
    pub message: Arc<MessageEval>,
}

impl MessageEvaluator for EmbeddedMessageEval {
    fn tautology(&self) -> bool {
        false
    }

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error> {
        if !msg.has_field(&self.descriptor) {
            return Ok(());
        }
        let value = msg.get_field(&self.descriptor);
        let Some(nested) = value.as_message() else {
            return Ok(());
        };
        let result = evaluate_nested(&self.message, nested, cfg);
        compose(self.descriptor.name(), None, result)
    }
}

/// Evaluate `nested` one level deeper than `cfg`.
pub(super) fn evaluate_nested(
    eval: &MessageEval,
    nested: &DynamicMessage,
    cfg: &ValidationConfig,
) -> Result<(), Error> {
    let cfg = cfg.descend(nested.descriptor().full_name())?;
    eval.evaluate_message(nested, &cfg)
}

/// Turn the violations of a nested message into violations of its parent:
/// one `recurse` violation at the field (or element), followed by the
/// nested violations with their paths prefixed.
pub(super) fn compose(
    field: &str,
    element: Option<PathSegment>,
    result: Result<(), Error>,
) -> Result<(), Error> {
    let nested = match result {
        Err(Error::Validation(nested)) => nested,
        other => return other,
    };

    let locate = |violation: &mut Violation| {
        if let Some(segment) = &element {
            violation.prepend_segment(segment.clone());
        }
        violation.prepend_field(field);
    };

    let mut violations = Vec::with_capacity(nested.violations.len() + 1);
    let mut parent = Violation::new(
        "recurse",
        MessageTemplate::new(NESTED_MESSAGE).with_param("field", field),
    );
    locate(&mut parent);
    violations.push(parent);
    for mut violation in nested.violations {
        locate(&mut violation);
        violations.push(violation);
    }
    Err(ValidationError::new(violations).into())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::compose;
    use crate::error::{Error, ValidationError};
    use crate::template::MessageTemplate;
    use crate::violation::{PathSegment, Violation};

    #[test]
    fn nested_violations_are_prefixed_after_a_parent_violation() {
        let nested = ValidationError::single(
            Violation::new("required", MessageTemplate::new("{field} is required"))
                .at_field("name"),
        );
        let Err(Error::Validation(err)) =
            compose("members", Some(PathSegment::Index(1)), Err(nested.into()))
        else {
            panic!("expected violations");
        };

        let paths: Vec<String> = err
            .violations
            .iter()
            .map(|v| v.field_path().to_string())
            .collect();
        assert_eq!(paths, vec!["members[1]", "members[1].name"]);
        assert_eq!(err.violations[0].rule_id(), "recurse");
        assert_eq!(err.violations[0].message(), "Nested message validation failed");
    }

    #[test]
    fn clean_results_pass_through() {
        assert!(compose("address", None, Ok(())).is_ok());
    }
}
