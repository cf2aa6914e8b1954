use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use prost_reflect::{Kind, MessageDescriptor};

use crate::error::CompilationError;
use crate::schema::constraint::{ConstraintKind, ConstraintTarget};
use crate::schema::registry::ConstraintRegistry;
use crate::schema::rule_set::RuleSet;
use crate::schema::{Constrained, Constraint, FieldKind, FieldSchema, MessageSchema, ScalarType};

use super::evaluator::MessageEvaluator;
use super::evaluator::combination::CombinationEval;
use super::evaluator::dependency::DependencyEval;
use super::evaluator::embedded::EmbeddedMessageEval;
use super::evaluator::field::FieldEval;
use super::evaluator::list::ListEval;
use super::evaluator::map::MapEval;
use super::evaluator::message::MessageEval;
use super::evaluator::oneof::ChoiceEval;
use super::evaluator::required::RequiredEval;
use super::expression::Expr;
use super::rules::ValueRuleEval;
use super::rules::number::NumberRuleEval;
use super::rules::repeated::DistinctRuleEval;
use super::rules::string::PatternRuleEval;

type EvalCache = HashMap<String, Arc<MessageEval>>;

/// Build-through cache of message evaluators keyed by descriptor full name.
pub(crate) struct Builder {
    /// Serializes cache writes.
    build_lock: Mutex<()>,
    /// Evaluator cache.
    cache: RwLock<EvalCache>,
    /// Resolved schemas.
    schemas: RwLock<HashMap<String, Arc<MessageSchema>>>,
    /// Whether unknown types can be lazily built.
    lazy: bool,
    registry: ConstraintRegistry,
    rules: RuleSet,
}

impl Builder {
    fn read_cache(&self) -> RwLockReadGuard<'_, EvalCache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, EvalCache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_build(&self) -> MutexGuard<'_, ()> {
        self.build_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn new() -> Self {
        Self::with_config(true, ConstraintRegistry::default(), RuleSet::new())
    }

    pub fn with_config(lazy: bool, registry: ConstraintRegistry, rules: RuleSet) -> Self {
        Self {
            build_lock: Mutex::new(()),
            cache: RwLock::new(HashMap::new()),
            schemas: RwLock::new(HashMap::new()),
            lazy,
            registry,
            rules,
        }
    }

    /// Load a cached evaluator or build a new one.
    pub fn load_or_build(&self, desc: &MessageDescriptor) -> Arc<MessageEval> {
        let key = desc.full_name();

        // Fast path
        if let Some(eval) = self.read_cache().get(key) {
            return Arc::clone(eval);
        }

        if !self.lazy {
            let eval = Arc::new(MessageEval::new());
            eval.set_err(CompilationError {
                cause: format!("no evaluator available for {key}"),
            });
            return eval;
        }

        // Slow path
        let _guard = self.lock_build();
        if let Some(eval) = self.read_cache().get(key) {
            return Arc::clone(eval);
        }

        let mut local_cache = self.read_cache().clone();
        let eval = self.build(desc, &mut local_cache);
        *self.write_cache() = local_cache;
        eval
    }

    /// Build an evaluator into the cache, even when lazy compilation is
    /// disabled. Returns the first compilation error among the types built.
    pub fn preload(&self, desc: &MessageDescriptor) -> Result<(), CompilationError> {
        let _guard = self.lock_build();
        let mut local_cache = self.read_cache().clone();
        let before: Vec<String> = local_cache.keys().cloned().collect();
        let eval = self.build(desc, &mut local_cache);

        let mut first_err = eval.compilation_error();
        if first_err.is_none() {
            let mut built: Vec<_> = local_cache
                .iter()
                .filter(|(name, _)| !before.contains(*name))
                .collect();
            built.sort_by(|a, b| a.0.cmp(b.0));
            first_err = built
                .into_iter()
                .find_map(|(_, eval)| eval.compilation_error());
        }

        *self.write_cache() = local_cache;
        first_err.map_or(Ok(()), Err)
    }

    /// Resolve (or fetch the cached) schema of a message type.
    pub fn schema(&self, desc: &MessageDescriptor) -> Result<Arc<MessageSchema>, CompilationError> {
        let key = desc.full_name();
        if let Some(schema) = self
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(MessageSchema::resolve(desc, &self.registry, &self.rules)?);
        self.schemas
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Build an evaluator for a message descriptor.
    /// Recursive types are handled by inserting a placeholder Arc before recursing.
    fn build(&self, desc: &MessageDescriptor, cache: &mut EvalCache) -> Arc<MessageEval> {
        let key = desc.full_name();
        if let Some(eval) = cache.get(key) {
            return Arc::clone(eval);
        }

        let eval = Arc::new(MessageEval::new());
        cache.insert(key.to_string(), Arc::clone(&eval));
        match self.build_message(desc, cache) {
            Ok(evaluators) => {
                for evaluator in evaluators {
                    eval.append(evaluator);
                }
                tracing::debug!(
                    message_type = key,
                    evaluators = eval.evaluator_count(),
                    "compiled message constraints"
                );
            }
            Err(err) => {
                tracing::warn!(message_type = key, error = %err, "message constraints failed to compile");
                eval.set_err(err);
            }
        }
        eval
    }

    /// Compile every constraint of a message type, in evaluation order.
    fn build_message(
        &self,
        desc: &MessageDescriptor,
        cache: &mut EvalCache,
    ) -> Result<Vec<Box<dyn MessageEvaluator>>, CompilationError> {
        let schema = self.schema(desc)?;
        let mut evaluators: Vec<Box<dyn MessageEvaluator>> = Vec::new();

        for kind in ConstraintKind::ALL {
            match kind.target() {
                ConstraintTarget::Field => {
                    for field in schema.fields() {
                        let Some(constraint) = field.constraint(kind) else {
                            continue;
                        };
                        if let Some(eval) = self.build_field(&schema, field, constraint, cache)? {
                            evaluators.push(eval);
                        }
                    }
                }
                ConstraintTarget::Oneof => {
                    for oneof in schema.oneofs() {
                        if let Some(Constraint::Choice(rule)) = oneof.constraint(kind) {
                            evaluators.push(Box::new(ChoiceEval {
                                descriptor: oneof.descriptor().clone(),
                                required: rule.required,
                                message: rule.message.clone(),
                            }));
                        }
                    }
                }
                ConstraintTarget::Message => {
                    if let Some(Constraint::FieldCombination(source)) = schema.constraint(kind) {
                        evaluators.push(Box::new(build_combination(&schema, source)?));
                    }
                }
            }
        }

        Ok(evaluators)
    }

    fn build_field(
        &self,
        schema: &MessageSchema,
        field: &FieldSchema,
        constraint: &Constraint,
        cache: &mut EvalCache,
    ) -> Result<Option<Box<dyn MessageEvaluator>>, CompilationError> {
        let name = field.name();
        let descriptor = field.descriptor().clone();
        let wrong_kind = |expected: &str| CompilationError {
            cause: format!(
                "{}: `{}` requires {expected}",
                descriptor.full_name(),
                constraint.kind()
            ),
        };

        let rule = match constraint {
            Constraint::Required(false) | Constraint::Distinct(false) | Constraint::Recurse(false) => {
                return Ok(None);
            }
            Constraint::Required(true) => {
                return Ok(Some(Box::new(RequiredEval {
                    descriptor: descriptor.clone(),
                })));
            }
            Constraint::Pattern(rule) => {
                if !is_value_field(field) || field.scalar_type() != Some(ScalarType::String) {
                    return Err(wrong_kind("a string field"));
                }
                ValueRuleEval::Pattern(PatternRuleEval::new(name, rule)?)
            }
            Constraint::Min(rule) => match numeric_family(field) {
                Some(Family::Signed) => ValueRuleEval::Signed(NumberRuleEval::min(name, rule)?),
                Some(Family::Unsigned) => ValueRuleEval::Unsigned(NumberRuleEval::min(name, rule)?),
                Some(Family::Float) => ValueRuleEval::Float(NumberRuleEval::min(name, rule)?),
                Some(Family::Double) => ValueRuleEval::Double(NumberRuleEval::min(name, rule)?),
                None => return Err(wrong_kind("a numeric field")),
            },
            Constraint::Max(rule) => match numeric_family(field) {
                Some(Family::Signed) => ValueRuleEval::Signed(NumberRuleEval::max(name, rule)?),
                Some(Family::Unsigned) => ValueRuleEval::Unsigned(NumberRuleEval::max(name, rule)?),
                Some(Family::Float) => ValueRuleEval::Float(NumberRuleEval::max(name, rule)?),
                Some(Family::Double) => ValueRuleEval::Double(NumberRuleEval::max(name, rule)?),
                None => return Err(wrong_kind("a numeric field")),
            },
            Constraint::Range(source) => match numeric_family(field) {
                Some(Family::Signed) => ValueRuleEval::Signed(NumberRuleEval::range(name, source)?),
                Some(Family::Unsigned) => {
                    ValueRuleEval::Unsigned(NumberRuleEval::range(name, source)?)
                }
                Some(Family::Float) => ValueRuleEval::Float(NumberRuleEval::range(name, source)?),
                Some(Family::Double) => ValueRuleEval::Double(NumberRuleEval::range(name, source)?),
                None => return Err(wrong_kind("a numeric field")),
            },
            Constraint::Distinct(true) => {
                if field.kind() != FieldKind::List || field.message_type().is_some() {
                    return Err(wrong_kind("a repeated scalar or enum field"));
                }
                ValueRuleEval::Distinct(DistinctRuleEval::new(name))
            }
            Constraint::Dependency(rule) => {
                let Some(target) = schema.field(&rule.with) else {
                    return Err(CompilationError {
                        cause: format!(
                            "{}: `goes` names unknown field {}",
                            descriptor.full_name(),
                            rule.with
                        ),
                    });
                };
                return Ok(Some(Box::new(DependencyEval {
                    descriptor: descriptor.clone(),
                    target: target.descriptor().clone(),
                    message: rule.message.clone(),
                })));
            }
            Constraint::Recurse(true) => {
                let Some(nested) = nested_descriptor(field) else {
                    return Err(wrong_kind("a message, repeated message or map of messages field"));
                };
                let message = self.build(&nested, cache);
                let eval: Box<dyn MessageEvaluator> = match field.kind() {
                    FieldKind::List => Box::new(ListEval {
                        descriptor: descriptor.clone(),
                        message,
                    }),
                    FieldKind::Map => Box::new(MapEval {
                        descriptor: descriptor.clone(),
                        message,
                    }),
                    _ => Box::new(EmbeddedMessageEval {
                        descriptor: descriptor.clone(),
                        message,
                    }),
                };
                return Ok(Some(eval));
            }
            Constraint::Choice(_) | Constraint::FieldCombination(_) => {
                return Err(wrong_kind("a oneof or message target"));
            }
        };

        Ok(Some(Box::new(FieldEval { descriptor, rule })))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

fn build_combination(
    schema: &MessageSchema,
    source: &str,
) -> Result<CombinationEval, CompilationError> {
    let expr = Expr::parse(source)?;
    let mut fields = HashMap::new();
    for name in expr.fields() {
        let Some(field) = schema.field(name) else {
            return Err(CompilationError {
                cause: format!(
                    "{}: field combination `{source}` names unknown field {name}",
                    schema.full_name()
                ),
            });
        };
        fields.insert(name.to_string(), field.descriptor().clone());
    }
    Ok(CombinationEval {
        source: source.to_string(),
        expr,
        fields,
    })
}

/// Singular scalars and lists of scalars carry value rules.
fn is_value_field(field: &FieldSchema) -> bool {
    matches!(field.kind(), FieldKind::Scalar | FieldKind::List)
}

/// Precision a numeric rule is compiled at.
enum Family {
    Signed,
    Unsigned,
    Float,
    Double,
}

fn numeric_family(field: &FieldSchema) -> Option<Family> {
    if !is_value_field(field) {
        return None;
    }
    match field.scalar_type()? {
        ScalarType::Signed => Some(Family::Signed),
        ScalarType::Unsigned => Some(Family::Unsigned),
        ScalarType::Float if matches!(field.descriptor().kind(), Kind::Float) => {
            Some(Family::Float)
        }
        ScalarType::Float => Some(Family::Double),
        _ => None,
    }
}

fn nested_descriptor(field: &FieldSchema) -> Option<MessageDescriptor> {
    let descriptor = field.descriptor();
    match descriptor.kind() {
        Kind::Message(entry) if descriptor.is_map() => {
            let value = entry.map_entry_value_field().kind();
            value.as_message().cloned()
        }
        Kind::Message(message) => Some(message),
        _ => None,
    }
}
