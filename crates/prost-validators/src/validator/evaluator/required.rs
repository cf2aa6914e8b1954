use prost_reflect::{DynamicMessage, FieldDescriptor};

use crate::config::ValidationConfig;
use crate::error::{Error, ValidationError};
use crate::template::MessageTemplate;
use crate::violation::Violation;

use super::super::presence::field_is_set;
use super::MessageEvaluator;

/// Fails when the field is not set.
pub(crate) struct RequiredEval {
    pub descriptor: FieldDescriptor,
}

impl MessageEvaluator for RequiredEval {
    fn tautology(&self) -> bool {
        false
    }

    fn evaluate_message(&self, msg: &DynamicMessage, _cfg: &ValidationConfig) -> Result<(), Error> {
        if field_is_set(msg, &self.descriptor) {
            return Ok(());
        }
        let name = self.descriptor.name();
        let template = MessageTemplate::new("{field} is required").with_param("field", name);
        Err(ValidationError::single(Violation::new("required", template).at_field(name)).into())
    }
}
