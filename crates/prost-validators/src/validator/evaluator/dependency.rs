use prost_reflect::{DynamicMessage, FieldDescriptor};

use crate::config::ValidationConfig;
use crate::error::{Error, ValidationError};
use crate::template::MessageTemplate;
use crate::violation::Violation;

use super::super::presence::field_is_set;
use super::MessageEvaluator;

/// When the field is set, `target` must be set too. Only presence is
/// checked: a target that violates its own rules still counts as set.
pub(crate) struct DependencyEval {
    pub descriptor: FieldDescriptor,
    pub target: FieldDescriptor,
    pub message: Option<String>,
}

impl MessageEvaluator for DependencyEval {
    fn tautology(&self) -> bool {
        false
    }

    fn evaluate_message(&self, msg: &DynamicMessage, _cfg: &ValidationConfig) -> Result<(), Error> {
        if !field_is_set(msg, &self.descriptor) || field_is_set(msg, &self.target) {
            return Ok(());
        }
        let name = self.descriptor.name();
        let template = MessageTemplate::new(
            self.message
                .as_deref()
                .unwrap_or("{field} requires {with} to be set"),
        )
        .with_param("field", name)
        .with_param("with", self.target.name());
        Err(ValidationError::single(Violation::new("goes", template).at_field(name)).into())
    }
}
