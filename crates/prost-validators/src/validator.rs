use std::sync::{Arc, LazyLock};

use prost_reflect::{MessageDescriptor, ReflectMessage};

use crate::config::{ValidationConfig, ValidationOption, ValidatorOption};
use crate::error::{CompilationError, Error};
use crate::schema::MessageSchema;
use crate::schema::registry::ConstraintRegistry;
use crate::schema::rule_set::RuleSet;
use crate::violation::Violation;

mod builder;
mod evaluator;
mod expression;
mod presence;
mod rules;

use builder::Builder;
use evaluator::MessageEvaluator;

/// Thread-safe validator for Protocol Buffer messages.
///
/// Validates messages against the constraints declared as options on their
/// descriptors (and any programmatic [`RuleSet`]). Constraints are compiled
/// once per message type, lazily by default, and cached for reuse.
pub struct Validator {
    builder: Builder,
    config: ValidationConfig,
}

impl Validator {
    /// Create a new `Validator` with default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: Builder::new(),
            config: ValidationConfig::default(),
        }
    }

    /// Create a new `Validator` with the given options.
    ///
    /// Compilation errors of types listed in
    /// [`ValidatorOption::MessageDescriptors`] are reported when those types
    /// are validated; use [`Validator::try_with_options`] to surface them here.
    #[must_use]
    pub fn with_options(options: &[ValidatorOption]) -> Self {
        let (validator, _) = Self::build(options);
        validator
    }

    /// Create a new `Validator`, compiling the types listed in
    /// [`ValidatorOption::MessageDescriptors`] eagerly.
    ///
    /// # Errors
    ///
    /// Returns the first [`CompilationError`] found while compiling them.
    pub fn try_with_options(options: &[ValidatorOption]) -> Result<Self, CompilationError> {
        match Self::build(options) {
            (_, Some(err)) => Err(err),
            (validator, None) => Ok(validator),
        }
    }

    fn build(options: &[ValidatorOption]) -> (Self, Option<CompilationError>) {
        let mut config = ValidationConfig::default();
        let mut disable_lazy = false;
        let mut registry = ConstraintRegistry::default();
        let mut rules = RuleSet::new();
        let mut message_descriptors = Vec::new();

        for opt in options {
            match opt {
                ValidatorOption::FailFast => config.fail_fast = true,
                ValidatorOption::MaxDepth(depth) => config.max_depth = *depth,
                ValidatorOption::DisableLazy => disable_lazy = true,
                ValidatorOption::Registry(r) => registry = r.clone(),
                ValidatorOption::Rules(r) => rules.extend(r),
                ValidatorOption::MessageDescriptors(descriptors) => {
                    message_descriptors.extend(descriptors.iter().cloned());
                }
            }
        }

        let builder = Builder::with_config(!disable_lazy, registry, rules);
        let mut first_err = None;
        for descriptor in &message_descriptors {
            if let Err(err) = builder.preload(descriptor) {
                first_err.get_or_insert(err);
            }
        }

        (Self { builder, config }, first_err)
    }

    /// Validate a message against its constraints.
    ///
    /// # Errors
    ///
    /// Returns an `Error` containing all constraint violations found, or a
    /// compilation/runtime error if the constraints could not be evaluated.
    pub fn validate<M: ReflectMessage>(&self, msg: &M) -> Result<(), Error> {
        self.validate_with(msg, &[])
    }

    /// Validate a message with per-call validation options.
    ///
    /// # Errors
    ///
    /// Returns an `Error` containing all constraint violations found, or a
    /// compilation/runtime error if the constraints could not be evaluated.
    pub fn validate_with<M: ReflectMessage>(
        &self,
        msg: &M,
        options: &[ValidationOption],
    ) -> Result<(), Error> {
        let dynamic = msg.transcode_to_dynamic();
        let descriptor = dynamic.descriptor();
        tracing::trace!(message_type = descriptor.full_name(), "validating message");
        let eval = self.builder.load_or_build(&descriptor);
        let cfg = effective_config(&self.config, options);
        eval.evaluate_message(&dynamic, &cfg)
    }

    /// Validate a message and return its violations; an empty list means
    /// the message is valid.
    ///
    /// # Errors
    ///
    /// Returns a compilation or runtime error if the constraints could not
    /// be evaluated.
    pub fn violations<M: ReflectMessage>(&self, msg: &M) -> Result<Vec<Violation>, Error> {
        match self.validate(msg) {
            Ok(()) => Ok(Vec::new()),
            Err(Error::Validation(err)) => Ok(err.violations),
            Err(other) => Err(other),
        }
    }

    /// The resolved constraint schema of a message type.
    ///
    /// # Errors
    ///
    /// Returns a [`CompilationError`] if the constraints attached to the
    /// type cannot be resolved.
    pub fn schema(
        &self,
        descriptor: &MessageDescriptor,
    ) -> Result<Arc<MessageSchema>, CompilationError> {
        self.builder.schema(descriptor)
    }
}

fn effective_config(base: &ValidationConfig, options: &[ValidationOption]) -> ValidationConfig {
    let mut cfg = *base;
    for option in options {
        match option {
            ValidationOption::FailFast => cfg.fail_fast = true,
            ValidationOption::MaxDepth(depth) => cfg.max_depth = *depth,
        }
    }
    cfg
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_VALIDATOR: LazyLock<Validator> = LazyLock::new(Validator::new);

/// Validate a message using a global `Validator` instance.
///
/// This is a convenience function that uses a shared, lazily-initialized
/// validator with the default registry. For custom registries or rules,
/// construct a [`Validator`] with options instead.
///
/// # Errors
///
/// Returns an `Error` containing all constraint violations found, or a
/// compilation/runtime error if the constraints could not be evaluated.
pub fn validate<M: ReflectMessage>(msg: &M) -> Result<(), Error> {
    GLOBAL_VALIDATOR.validate(msg)
}
