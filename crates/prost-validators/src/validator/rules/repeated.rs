use std::collections::HashMap;
use std::collections::hash_map::Entry;

use prost_reflect::Value;

use crate::config::ValidationConfig;
use crate::error::{Error, ValidationError};
use crate::template::MessageTemplate;
use crate::violation::{PathSegment, Violation};

use super::display_value;

const DEFAULT_MESSAGE: &str =
    "{field} has duplicate value {value} at index {duplicate_index}, first seen at index {first_index}";

/// Requires the elements of a repeated scalar field to be pairwise distinct.
/// Every later occurrence of an already-seen value yields one violation.
pub(crate) struct DistinctRuleEval {
    field: String,
}

impl DistinctRuleEval {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
        }
    }

    pub fn evaluate(&self, val: &Value, cfg: &ValidationConfig) -> Result<(), Error> {
        let Some(list) = val.as_list() else {
            return Ok(());
        };

        let mut first_seen: HashMap<UniqueKey, usize> = HashMap::with_capacity(list.len());
        let mut violations = Vec::new();
        for (index, item) in list.iter().enumerate() {
            let Some(key) = unique_key(item) else {
                continue;
            };
            let first_index = match first_seen.entry(key) {
                Entry::Occupied(seen) => *seen.get(),
                Entry::Vacant(slot) => {
                    slot.insert(index);
                    continue;
                }
            };
            let template = MessageTemplate::new(DEFAULT_MESSAGE)
                .with_param("field", &self.field)
                .with_param("value", display_value(item))
                .with_param("first_index", first_index)
                .with_param("duplicate_index", index);
            let mut violation = Violation::new("distinct", template);
            violation.prepend_segment(PathSegment::Index(index));
            violations.push(violation);
            if cfg.fail_fast {
                break;
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations).into())
        }
    }
}

/// Hashable key extracted from a scalar `Value` for O(n) duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum UniqueKey {
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Float(u64),
    String(String),
    Bytes(Vec<u8>),
    Enum(i32),
}

/// `None` for values that never compare equal (NaN) and for composite values.
fn unique_key(value: &Value) -> Option<UniqueKey> {
    match value {
        Value::Bool(v) => Some(UniqueKey::Bool(*v)),
        Value::I32(v) => Some(UniqueKey::Signed(i64::from(*v))),
        Value::I64(v) => Some(UniqueKey::Signed(*v)),
        Value::U32(v) => Some(UniqueKey::Unsigned(u64::from(*v))),
        Value::U64(v) => Some(UniqueKey::Unsigned(*v)),
        Value::F32(v) => float_key(f64::from(*v)),
        Value::F64(v) => float_key(*v),
        Value::String(v) => Some(UniqueKey::String(v.clone())),
        Value::Bytes(v) => Some(UniqueKey::Bytes(v.to_vec())),
        Value::EnumNumber(v) => Some(UniqueKey::Enum(*v)),
        Value::Message(_) | Value::List(_) | Value::Map(_) => None,
    }
}

fn float_key(v: f64) -> Option<UniqueKey> {
    if v.is_nan() {
        return None;
    }
    // -0.0 == 0.0
    let v = if v == 0.0 { 0.0 } else { v };
    Some(UniqueKey::Float(v.to_bits()))
}

#[cfg(test)]
mod tests {
    use prost_reflect::Value;
    use pretty_assertions::assert_eq;
    use proptest::collection::vec;
    use proptest::prelude::*;

    use super::DistinctRuleEval;
    use crate::config::ValidationConfig;
    use crate::error::Error;
    use crate::violation::Violation;

    fn violations(values: Vec<Value>, cfg: &ValidationConfig) -> Vec<Violation> {
        match DistinctRuleEval::new("samples").evaluate(&Value::List(values), cfg) {
            Ok(()) => Vec::new(),
            Err(Error::Validation(err)) => err.violations,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    fn ints(values: &[i32]) -> Vec<Value> {
        values.iter().copied().map(Value::I32).collect()
    }

    #[test]
    fn counts_later_duplicates_not_pairs() {
        let found = violations(ints(&[1, 2, 1, 3, 2, 4]), &ValidationConfig::default());
        assert_eq!(found.len(), 2);

        assert_eq!(found[0].field_path().to_strings(), vec!["2"]);
        assert_eq!(found[0].template().param("value"), Some("1"));
        assert_eq!(found[0].template().param("first_index"), Some("0"));
        assert_eq!(found[0].template().param("duplicate_index"), Some("2"));

        assert_eq!(found[1].field_path().to_strings(), vec!["4"]);
        assert_eq!(found[1].template().param("first_index"), Some("1"));
        assert_eq!(
            found[1].message(),
            "samples has duplicate value 2 at index 4, first seen at index 1"
        );
    }

    #[test]
    fn every_repeat_of_a_value_is_reported_against_its_first_occurrence() {
        let found = violations(ints(&[5, 5, 5]), &ValidationConfig::default());
        assert_eq!(found.len(), 2);
        assert!(
            found
                .iter()
                .all(|v| v.template().param("first_index") == Some("0"))
        );
    }

    #[test]
    fn strings_compare_case_sensitively() {
        let values = vec![
            Value::String("Tag".into()),
            Value::String("tag".into()),
            Value::String("Tag".into()),
        ];
        assert_eq!(violations(values, &ValidationConfig::default()).len(), 1);
    }

    #[test]
    fn zeros_are_equal_and_nan_never_repeats() {
        let values = vec![Value::F64(0.0), Value::F64(-0.0)];
        assert_eq!(violations(values, &ValidationConfig::default()).len(), 1);

        let values = vec![Value::F64(f64::NAN), Value::F64(f64::NAN)];
        assert!(violations(values, &ValidationConfig::default()).is_empty());
    }

    #[test]
    fn fail_fast_stops_at_the_first_duplicate() {
        let cfg = ValidationConfig {
            fail_fast: true,
            ..ValidationConfig::default()
        };
        assert_eq!(violations(ints(&[1, 1, 2, 2]), &cfg).len(), 1);
    }

    proptest! {
        #[test]
        fn violations_equal_length_minus_distinct_count(values in vec(0_i32..6, 0..40)) {
            let mut distinct = values.clone();
            distinct.sort_unstable();
            distinct.dedup();
            let found = violations(ints(&values), &ValidationConfig::default());
            prop_assert_eq!(found.len(), values.len() - distinct.len());
        }
    }
}
