pub(crate) mod number;
pub(crate) mod repeated;
pub(crate) mod string;

use prost_reflect::{DynamicMessage, Value};

use crate::config::ValidationConfig;
use crate::error::Error;

use super::evaluator::Evaluator;

/// A compiled value rule. Pattern and numeric rules are applied to a single
/// scalar value; `Distinct` is applied to a whole list.
pub(crate) enum ValueRuleEval {
    Pattern(string::PatternRuleEval),
    Signed(number::NumberRuleEval<i64>),
    Unsigned(number::NumberRuleEval<u64>),
    Float(number::NumberRuleEval<f32>),
    Double(number::NumberRuleEval<f64>),
    Distinct(repeated::DistinctRuleEval),
}

impl ValueRuleEval {
    /// Whether the rule checks a whole list rather than each element.
    pub fn applies_to_list(&self) -> bool {
        matches!(self, Self::Distinct(_))
    }
}

impl Evaluator for ValueRuleEval {
    fn tautology(&self) -> bool {
        false
    }

    fn evaluate(
        &self,
        _msg: &DynamicMessage,
        val: &Value,
        cfg: &ValidationConfig,
    ) -> Result<(), Error> {
        match self {
            Self::Pattern(e) => e.evaluate(val),
            Self::Signed(e) => e.evaluate(val),
            Self::Unsigned(e) => e.evaluate(val),
            Self::Float(e) => e.evaluate(val),
            Self::Double(e) => e.evaluate(val),
            Self::Distinct(e) => e.evaluate(val, cfg),
        }
    }
}

/// Render a scalar value for use as a message placeholder.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::Bool(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Bytes(v) => String::from_utf8_lossy(v).into_owned(),
        Value::EnumNumber(v) => v.to_string(),
        Value::Message(m) => format!("{m:?}"),
        Value::List(items) => format!("{} items", items.len()),
        Value::Map(entries) => format!("{} entries", entries.len()),
    }
}
