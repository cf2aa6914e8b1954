pub(crate) mod combination;
pub(crate) mod dependency;
pub(crate) mod embedded;
pub(crate) mod field;
pub(crate) mod list;
pub(crate) mod map;
pub(crate) mod message;
pub(crate) mod oneof;
pub(crate) mod required;

use prost_reflect::{DynamicMessage, Value};

use crate::config::ValidationConfig;
use crate::error::{self, Error};

/// Evaluator for concrete field values (scalars, list elements, whole lists).
pub(crate) trait Evaluator: Send + Sync {
    /// Returns true if this evaluator always succeeds (no-op).
    fn tautology(&self) -> bool;

    /// Evaluate a value. `msg` is the containing message for context.
    fn evaluate(
        &self,
        msg: &DynamicMessage,
        val: &Value,
        cfg: &ValidationConfig,
    ) -> Result<(), Error>;
}

/// Evaluator that inspects a whole message: one field rule, a oneof, or a
/// message-level rule.
pub(crate) trait MessageEvaluator: Send + Sync {
    /// Returns true if this evaluator always succeeds.
    fn tautology(&self) -> bool;

    /// Evaluate a message.
    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error>;
}

/// A list of message evaluators applied in order.
/// Violations are merged across all evaluators.
pub(crate) struct MessageEvaluators(pub Vec<Box<dyn MessageEvaluator>>);

impl MessageEvaluators {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, eval: Box<dyn MessageEvaluator>) {
        if !eval.tautology() {
            self.0.push(eval);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for MessageEvaluators {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageEvaluator for MessageEvaluators {
    fn tautology(&self) -> bool {
        self.0.iter().all(|e| e.tautology())
    }

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error> {
        let mut acc: Option<Error> = None;
        for eval in &self.0 {
            let result = eval.evaluate_message(msg, cfg);
            let (cont, new_acc) = error::merge_violations(acc, result, cfg.fail_fast);
            acc = new_acc;
            if !cont {
                break;
            }
        }
        error::finish(acc)
    }
}
