//! Reads constraints declared as descriptor option extensions.
//!
//! Option values are accepted either in their scalar shorthand
//! (`(validate.pattern) = "^[a-z]+$"`) or as a message carrying the full
//! payload (`(validate.pattern) = { regex: "^[a-z]+$", flags: "i" }`).
//! Message payloads are read by field name so any schema with matching
//! field names works.

use prost_reflect::{DynamicMessage, Value};

use crate::error::CompilationError;

use super::constraint::{
    BoundRule, ChoiceRule, Constraint, ConstraintKind, ConstraintSet, ConstraintTarget,
    DependencyRule, PatternRule,
};
use super::registry::{ConstraintRegistry, Registration};

/// Collect the registry's constraints from an options message.
///
/// `owner` names the schema element for error messages.
pub(crate) fn constraints_from_options(
    options: &DynamicMessage,
    registry: &ConstraintRegistry,
    target: ConstraintTarget,
    owner: &str,
) -> Result<ConstraintSet, CompilationError> {
    let mut set = ConstraintSet::new();
    for (extension, value) in options.extensions() {
        let name = extension.full_name();
        let kind = match registry.lookup(name) {
            None => continue,
            Some(Registration::Unsupported) => {
                return Err(CompilationError {
                    cause: format!(
                        "{owner}: `{name}` is a stateful constraint and cannot be enforced by a per-message validator"
                    ),
                });
            }
            Some(Registration::Supported(kind)) => kind,
        };
        if kind.target() != target {
            return Err(CompilationError {
                cause: format!(
                    "{owner}: `{name}` applies to a {} but was declared on a {target}",
                    kind.target()
                ),
            });
        }
        let constraint = constraint_from_value(kind, value).map_err(|err| CompilationError {
            cause: format!("{owner}: invalid `{name}` option: {}", err.cause),
        })?;
        set.insert(constraint);
    }
    Ok(set)
}

/// Convert a single option value into a typed constraint.
pub(crate) fn constraint_from_value(
    kind: ConstraintKind,
    value: &Value,
) -> Result<Constraint, CompilationError> {
    let constraint = match kind {
        ConstraintKind::Required => Constraint::Required(flag(value, "required")?),
        ConstraintKind::Distinct => Constraint::Distinct(flag(value, "distinct")?),
        ConstraintKind::Recurse => Constraint::Recurse(flag(value, "recurse")?),
        ConstraintKind::Range => Constraint::Range(text(value, "range")?),
        ConstraintKind::FieldCombination => Constraint::FieldCombination(text(value, "fields")?),
        ConstraintKind::Pattern => Constraint::Pattern(match value {
            Value::Message(msg) => PatternRule {
                regex: text(value, "regex")?,
                flags: string_field(msg, "flags").unwrap_or_default(),
                message: string_field(msg, "message"),
            },
            other => PatternRule::new(text(other, "regex")?),
        }),
        ConstraintKind::Min => Constraint::Min(bound(value)?),
        ConstraintKind::Max => Constraint::Max(bound(value)?),
        ConstraintKind::Dependency => Constraint::Dependency(match value {
            Value::Message(msg) => DependencyRule {
                with: string_field(msg, "with").unwrap_or_default(),
                message: string_field(msg, "message"),
            },
            other => DependencyRule::new(text(other, "with")?),
        }),
        ConstraintKind::Choice => Constraint::Choice(match value {
            Value::Message(msg) => ChoiceRule {
                required: bool_field(msg, "required").unwrap_or(false),
                message: string_field(msg, "message"),
            },
            other => ChoiceRule {
                required: flag(other, "required")?,
                message: None,
            },
        }),
    };
    Ok(constraint)
}

fn bound(value: &Value) -> Result<BoundRule, CompilationError> {
    Ok(match value {
        Value::Message(msg) => BoundRule {
            value: string_field(msg, "value").unwrap_or_default(),
            exclusive: bool_field(msg, "exclusive").unwrap_or(false),
            message: string_field(msg, "message"),
        },
        other => BoundRule::new(text(other, "value")?),
    })
}

fn flag(value: &Value, field: &str) -> Result<bool, CompilationError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Message(msg) => bool_field(msg, field).ok_or_else(|| CompilationError {
            cause: format!("expected a bool `{field}` field"),
        }),
        other => Err(unexpected("bool", other)),
    }
}

fn text(value: &Value, field: &str) -> Result<String, CompilationError> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::String(_) => Err(CompilationError {
            cause: format!("expected a non-empty string `{field}` value"),
        }),
        Value::Message(msg) => string_field(msg, field).ok_or_else(|| CompilationError {
            cause: format!("expected a non-empty string `{field}` field"),
        }),
        other => Err(unexpected("string", other)),
    }
}

fn string_field(msg: &DynamicMessage, name: &str) -> Option<String> {
    let value = msg.get_field_by_name(name)?;
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn bool_field(msg: &DynamicMessage, name: &str) -> Option<bool> {
    msg.get_field_by_name(name)?.as_bool()
}

fn unexpected(expected: &str, value: &Value) -> CompilationError {
    CompilationError {
        cause: format!("expected a {expected} value, got {value:?}"),
    }
}
