use std::sync::{Arc, PoisonError, RwLock};

use prost_reflect::{DynamicMessage, ReflectMessage};

use crate::config::ValidationConfig;
use crate::error::{self, CompilationError, Error};

use super::{MessageEvaluator, MessageEvaluators};

/// Compiled state of one message type.
#[derive(Default)]
struct MessageEvalState {
    err: Option<CompilationError>,
    evaluators: MessageEvaluators,
}

/// Evaluator for one message type. Created empty and filled in by the
/// builder, so that recursive types can refer to their own evaluator.
pub(crate) struct MessageEval {
    state: RwLock<MessageEvalState>,
}

impl MessageEval {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MessageEvalState::default()),
        }
    }

    pub fn set_err(&self, err: CompilationError) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.evaluators = MessageEvaluators::new();
        state.err = Some(err);
    }

    pub fn compilation_error(&self) -> Option<CompilationError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.err.clone()
    }

    pub fn append(&self, eval: Box<dyn MessageEvaluator>) {
        if !eval.tautology() {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.evaluators.push(eval);
        }
    }

    pub fn evaluator_count(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.evaluators.len()
    }
}

impl MessageEvaluator for MessageEval {
    fn tautology(&self) -> bool {
        // Always false to avoid recursion-induced tautology short-circuits.
        false
    }

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(err) = &state.err {
            return Err(err.clone().into());
        }

        let result = state.evaluators.evaluate_message(msg, cfg);
        let descriptor = msg.descriptor();
        error::map_violations(result, |violation| {
            violation.set_message_type(descriptor.full_name());
        })
    }
}

impl MessageEvaluator for Arc<MessageEval> {
    fn tautology(&self) -> bool {
        MessageEval::tautology(self)
    }

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error> {
        MessageEval::evaluate_message(self, msg, cfg)
    }
}
