use prost_reflect::MessageDescriptor;

use crate::error::RuntimeError;
use crate::schema::registry::ConstraintRegistry;
use crate::schema::rule_set::RuleSet;

/// Default limit on how deep recursive validation descends into nested messages.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options for configuring the `Validator` at construction time.
#[non_exhaustive]
pub enum ValidatorOption {
    /// Stop validation on the first violation instead of collecting all.
    FailFast,

    /// Limit recursive validation to this many levels of nested messages.
    MaxDepth(usize),

    /// Recognize constraint options through this registry instead of the
    /// default `validate` package.
    Registry(ConstraintRegistry),

    /// Attach constraints programmatically, on top of option-declared ones.
    /// Several `Rules` options are merged in order.
    Rules(RuleSet),

    /// Compile these message types (and everything they reference) at
    /// construction time.
    MessageDescriptors(Vec<MessageDescriptor>),

    /// Disable lazy compilation: only types compiled at construction time
    /// (through `MessageDescriptors`) can be validated.
    DisableLazy,
}

/// Options for configuring a single `Validator::validate_with` call.
#[non_exhaustive]
pub enum ValidationOption {
    /// Stop validation on the first violation instead of collecting all.
    FailFast,
    /// Override the nesting depth limit for this call.
    MaxDepth(usize),
}

/// Runtime configuration passed to evaluators during validation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValidationConfig {
    pub fail_fast: bool,
    pub max_depth: usize,
    /// Nesting level of the message currently being evaluated; the root is 0.
    pub depth: usize,
}

impl ValidationConfig {
    /// Configuration for evaluating a message nested one level deeper.
    pub fn descend(&self, message_type: &str) -> Result<Self, RuntimeError> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(RuntimeError {
                cause: format!(
                    "maximum nesting depth of {} exceeded while descending into {message_type}",
                    self.max_depth
                ),
            });
        }
        Ok(Self { depth, ..*self })
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        }
    }
}
