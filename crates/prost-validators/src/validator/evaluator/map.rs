use std::sync::Arc;

use prost_reflect::{DynamicMessage, FieldDescriptor, MapKey};

use crate::config::ValidationConfig;
use crate::error::{self, Error};
use crate::violation::PathSegment;

use super::MessageEvaluator;
use super::embedded::{compose, evaluate_nested};
use super::message::MessageEval;

/// Recursive validation of each value of a map field whose values are
/// messages. Entries are visited in key order.
pub(crate) struct MapEval {
    pub descriptor: FieldDescriptor,
    /// Evaluator for the value message type.
    pub message: Arc<MessageEval>,
}

impl MessageEvaluator for MapEval {
    fn tautology(&self) -> bool {
        false
    }

    fn evaluate_message(&self, msg: &DynamicMessage, cfg: &ValidationConfig) -> Result<(), Error> {
        let value = msg.get_field(&self.descriptor);
        let Some(map) = value.as_map() else {
            return Ok(());
        };

        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_by_key(|(key, _)| SortKey::from(*key));

        let mut acc: Option<Error> = None;
        for (key, value) in entries {
            let Some(nested) = value.as_message() else {
                continue;
            };
            let result = evaluate_nested(&self.message, nested, cfg);
            let result = compose(
                self.descriptor.name(),
                Some(PathSegment::Key(map_key_to_string(key))),
                result,
            );
            let (cont, new_acc) = error::merge_violations(acc, result, cfg.fail_fast);
            acc = new_acc;
            if !cont {
                break;
            }
        }
        error::finish(acc)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey<'a> {
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    String(&'a str),
}

impl<'a> From<&'a MapKey> for SortKey<'a> {
    fn from(key: &'a MapKey) -> Self {
        match key {
            MapKey::Bool(b) => Self::Bool(*b),
            MapKey::I32(n) => Self::Signed(i64::from(*n)),
            MapKey::I64(n) => Self::Signed(*n),
            MapKey::U32(n) => Self::Unsigned(u64::from(*n)),
            MapKey::U64(n) => Self::Unsigned(*n),
            MapKey::String(s) => Self::String(s),
        }
    }
}

fn map_key_to_string(key: &MapKey) -> String {
    match key {
        MapKey::Bool(b) => b.to_string(),
        MapKey::I32(n) => n.to_string(),
        MapKey::I64(n) => n.to_string(),
        MapKey::U32(n) => n.to_string(),
        MapKey::U64(n) => n.to_string(),
        MapKey::String(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use prost_reflect::MapKey;

    use super::{SortKey, map_key_to_string};

    #[test]
    fn keys_render_unquoted_and_sort_numerically() {
        assert_eq!(map_key_to_string(&MapKey::String("bob".into())), "bob");
        assert_eq!(map_key_to_string(&MapKey::I64(-2)), "-2");

        let ten = MapKey::I32(10);
        let two = MapKey::I32(2);
        assert!(SortKey::from(&two) < SortKey::from(&ten));
    }
}
