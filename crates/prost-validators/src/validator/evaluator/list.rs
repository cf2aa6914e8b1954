use std::sync::Arc;

use prost_reflect::{DynamicMessage, FieldDescriptor};

use crate::config::ValidationConfig;
use crate::error::{self, Error};
use crate::violation::PathSegment;

use super::MessageEvaluator;
use super::embedded::{compose, evaluate_nested};
use super::message::MessageEval;

/// Recursive validation of each element of a repeated message field.
pub(crate) struct ListEval {
    pub descriptor: FieldDescriptor,
    /// Evaluator for the element message type.
    pub message: Arc<MessageEval>,
}

impl MessageEvaluator for ListEval {
    fn tautology(&self) -> bool {
        false
    }

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error> {
        let value = msg.get_field(&self.descriptor);
        let Some(list) = value.as_list() else {
            return Ok(());
        };

        let mut acc: Option<Error> = None;
        for (index, item) in list.iter().enumerate() {
            let Some(nested) = item.as_message() else {
                continue;
            };
            let result = evaluate_nested(&self.message, nested, cfg);
            let result = compose(
                self.descriptor.name(),
                Some(PathSegment::Index(index)),
                result,
            );
            let (cont, new_acc) = error::merge_violations(acc, result, cfg.fail_fast);
            acc = new_acc;
            if !cont {
                break;
            }
        }
        error::finish(acc)
    }
}
