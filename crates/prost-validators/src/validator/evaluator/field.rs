use prost_reflect::{DynamicMessage, FieldDescriptor};

use crate::config::ValidationConfig;
use crate::error::{self, Error};
use crate::violation::PathSegment;

use super::super::rules::ValueRuleEval;
use super::{Evaluator, MessageEvaluator};

/// Applies a value rule to one field. Singular fields are checked directly;
/// repeated fields are checked element by element, or as a whole for
/// list rules such as `distinct`.
pub(crate) struct FieldEval {
    pub descriptor: FieldDescriptor,
    pub rule: ValueRuleEval,
}

impl MessageEvaluator for FieldEval {
    fn tautology(&self) -> bool {
        self.rule.tautology()
    }

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error> {
        let value = msg.get_field(&self.descriptor);
        let name = self.descriptor.name();

        let result = match value.as_list() {
            Some(items) if !self.rule.applies_to_list() => {
                let mut acc: Option<Error> = None;
                for (index, item) in items.iter().enumerate() {
                    let result = self.rule.evaluate(msg, item, cfg);
                    let result = error::map_violations(result, |violation| {
                        violation.prepend_segment(PathSegment::Index(index));
                    });
                    let (cont, new_acc) = error::merge_violations(acc, result, cfg.fail_fast);
                    acc = new_acc;
                    if !cont {
                        break;
                    }
                }
                error::finish(acc)
            }
            _ => self.rule.evaluate(msg, &value, cfg),
        };

        error::map_violations(result, |violation| violation.prepend_field(name))
    }
}
