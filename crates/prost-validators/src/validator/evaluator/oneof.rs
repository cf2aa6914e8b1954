use prost_reflect::{DynamicMessage, OneofDescriptor};

use crate::config::ValidationConfig;
use crate::error::{Error, ValidationError};
use crate::template::MessageTemplate;
use crate::violation::Violation;

use super::MessageEvaluator;

/// Evaluator for a oneof whose choice is required: one member must be active.
pub(crate) struct ChoiceEval {
    pub descriptor: OneofDescriptor,
    pub required: bool,
    pub message: Option<String>,
}

impl MessageEvaluator for ChoiceEval {
    fn tautology(&self) -> bool {
        !self.required
    }

    fn evaluate_message(&self, msg: &DynamicMessage, _cfg: &ValidationConfig) -> Result<(), Error> {
        if !self.required || self.descriptor.fields().any(|field| msg.has_field(&field)) {
            return Ok(());
        }
        let name = self.descriptor.name();
        let template = MessageTemplate::new(
            self.message
                .as_deref()
                .unwrap_or("{oneof} requires one of its fields to be set"),
        )
        .with_param("oneof", name);
        Err(ValidationError::single(Violation::new("choice", template).at_field(name)).into())
    }
}
