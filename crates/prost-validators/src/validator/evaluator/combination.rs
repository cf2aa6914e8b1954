use std::collections::HashMap;

use prost_reflect::{DynamicMessage, FieldDescriptor};

use crate::config::ValidationConfig;
use crate::error::{Error, ValidationError};
use crate::template::MessageTemplate;
use crate::violation::Violation;

use super::super::expression::Expr;
use super::super::presence::field_is_set;
use super::MessageEvaluator;

/// Message-level required-field combination such as `"id | email"`.
/// A failing expression yields one violation with an empty path.
pub(crate) struct CombinationEval {
    pub source: String,
    pub expr: Expr,
    /// Every field the expression names, resolved at compile time.
    pub fields: HashMap<String, FieldDescriptor>,
}

impl MessageEvaluator for CombinationEval {
    fn tautology(&self) -> bool {
        false
    }

    fn evaluate_message(&self, msg: &DynamicMessage, _cfg: &ValidationConfig) -> Result<(), Error> {
        let satisfied = self.expr.evaluate(&|name: &str| {
            self.fields
                .get(name)
                .is_some_and(|field| field_is_set(msg, field))
        });
        if satisfied {
            return Ok(());
        }
        let template =
            MessageTemplate::new("message must satisfy required field combination {fields}")
                .with_param("fields", &self.source);
        Err(ValidationError::single(Violation::new("require", template)).into())
    }
}
