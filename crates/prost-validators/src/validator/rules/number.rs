use std::fmt::Display;
use std::str::FromStr;

use prost_reflect::Value;

use crate::error::{CompilationError, Error, ValidationError};
use crate::schema::constraint::BoundRule;
use crate::template::MessageTemplate;
use crate::violation::Violation;

use super::display_value;

/// A numeric family values are compared in. 32-bit integers are widened;
/// `float` and `double` stay apart so thresholds parse at field precision.
pub(crate) trait Numeric: Copy + PartialOrd + Display + FromStr {
    fn from_value(val: &Value) -> Option<Self>;

    /// Whether a parsed threshold is usable as a bound.
    fn is_comparable(self) -> bool {
        true
    }
}

impl Numeric for i64 {
    fn from_value(val: &Value) -> Option<Self> {
        match val {
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }
}

impl Numeric for u64 {
    fn from_value(val: &Value) -> Option<Self> {
        match val {
            Value::U32(v) => Some(u64::from(*v)),
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }
}

impl Numeric for f32 {
    fn from_value(val: &Value) -> Option<Self> {
        match val {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }

    fn is_comparable(self) -> bool {
        !self.is_nan()
    }
}

impl Numeric for f64 {
    fn from_value(val: &Value) -> Option<Self> {
        match val {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    fn is_comparable(self) -> bool {
        !self.is_nan()
    }
}

/// One end of an interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bound<T> {
    pub value: T,
    pub inclusive: bool,
}

impl<T: Numeric> Bound<T> {
    fn admits_above(&self, v: T) -> bool {
        if self.inclusive {
            v >= self.value
        } else {
            v > self.value
        }
    }

    fn admits_below(&self, v: T) -> bool {
        if self.inclusive {
            v <= self.value
        } else {
            v < self.value
        }
    }
}

/// A bracket-notation interval such as `[0..24)` or `(0.0..180.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Interval<T> {
    pub min: Bound<T>,
    pub max: Bound<T>,
}

impl<T: Numeric> Interval<T> {
    pub fn parse(source: &str) -> Result<Self, CompilationError> {
        let malformed = |detail: &str| CompilationError {
            cause: format!("malformed range `{source}`: {detail}"),
        };
        let text = source.trim();
        let mut chars = text.chars();
        let min_inclusive = match chars.next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(malformed("must start with `[` or `(`")),
        };
        let max_inclusive = match chars.next_back() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(malformed("must end with `]` or `)`")),
        };
        let Some((low, high)) = chars.as_str().split_once("..") else {
            return Err(malformed("missing `..` separator"));
        };
        let min = parse_threshold::<T>(low.trim())
            .map_err(|_| malformed(&format!("`{}` is not a number", low.trim())))?;
        let max = parse_threshold::<T>(high.trim())
            .map_err(|_| malformed(&format!("`{}` is not a number", high.trim())))?;
        if min > max {
            return Err(malformed("minimum is greater than maximum"));
        }
        Ok(Self {
            min: Bound {
                value: min,
                inclusive: min_inclusive,
            },
            max: Bound {
                value: max,
                inclusive: max_inclusive,
            },
        })
    }

    pub fn contains(&self, v: T) -> bool {
        self.min.admits_above(v) && self.max.admits_below(v)
    }
}

/// Parse a threshold string into the numeric family `T`.
pub(crate) fn parse_threshold<T: Numeric>(text: &str) -> Result<T, CompilationError> {
    match text.parse::<T>() {
        Ok(v) if v.is_comparable() => Ok(v),
        _ => Err(CompilationError {
            cause: format!("`{text}` is not a valid numeric threshold"),
        }),
    }
}

enum Check<T> {
    Min { bound: Bound<T>, raw: String },
    Max { bound: Bound<T>, raw: String },
    Range { interval: Interval<T>, raw: String },
}

/// Lower bound, upper bound or range check over one numeric family.
pub(crate) struct NumberRuleEval<T> {
    field: String,
    check: Check<T>,
    message: Option<String>,
}

impl<T: Numeric> NumberRuleEval<T> {
    pub fn min(field: &str, rule: &BoundRule) -> Result<Self, CompilationError> {
        Ok(Self {
            field: field.to_string(),
            check: Check::Min {
                bound: bound(field, rule)?,
                raw: rule.value.trim().to_string(),
            },
            message: rule.message.clone(),
        })
    }

    pub fn max(field: &str, rule: &BoundRule) -> Result<Self, CompilationError> {
        Ok(Self {
            field: field.to_string(),
            check: Check::Max {
                bound: bound(field, rule)?,
                raw: rule.value.trim().to_string(),
            },
            message: rule.message.clone(),
        })
    }

    pub fn range(field: &str, source: &str) -> Result<Self, CompilationError> {
        let interval = Interval::parse(source).map_err(|err| CompilationError {
            cause: format!("field {field}: {}", err.cause),
        })?;
        Ok(Self {
            field: field.to_string(),
            check: Check::Range {
                interval,
                raw: source.trim().to_string(),
            },
            message: None,
        })
    }

    pub fn evaluate(&self, val: &Value) -> Result<(), Error> {
        let Some(v) = T::from_value(val) else {
            return Ok(());
        };
        let (rule_id, template) = match &self.check {
            Check::Min { bound, raw } => {
                if bound.admits_above(v) {
                    return Ok(());
                }
                let format = if bound.inclusive {
                    "{field} must be greater than or equal to {min}"
                } else {
                    "{field} must be greater than {min}"
                };
                ("min", self.template(format).with_param("min", raw))
            }
            Check::Max { bound, raw } => {
                if bound.admits_below(v) {
                    return Ok(());
                }
                let format = if bound.inclusive {
                    "{field} must be less than or equal to {max}"
                } else {
                    "{field} must be less than {max}"
                };
                ("max", self.template(format).with_param("max", raw))
            }
            Check::Range { interval, raw } => {
                if interval.contains(v) {
                    return Ok(());
                }
                (
                    "range",
                    self.template("{field} must be in range {range}")
                        .with_param("range", raw),
                )
            }
        };
        let template = template.with_param("value", display_value(val));
        Err(ValidationError::single(Violation::new(rule_id, template)).into())
    }

    fn template(&self, default: &str) -> MessageTemplate {
        MessageTemplate::new(self.message.as_deref().unwrap_or(default))
            .with_param("field", &self.field)
    }
}

fn bound<T: Numeric>(field: &str, rule: &BoundRule) -> Result<Bound<T>, CompilationError> {
    let value = parse_threshold(rule.value.trim()).map_err(|err| CompilationError {
        cause: format!("field {field}: {}", err.cause),
    })?;
    Ok(Bound {
        value,
        inclusive: !rule.exclusive,
    })
}
