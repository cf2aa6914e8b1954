//! Whether a field's current value counts as "set".
//!
//! Presence is decided from the value, not from wire presence: zero numbers,
//! zero enums, empty strings, bytes and collections are unset, while
//! booleans always count as set. A field explicitly assigned zero is
//! therefore indistinguishable from one never assigned, and both `required`
//! and dependency checks treat it as missing.

use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, Value};

/// Whether `field` of `msg` is set.
pub(crate) fn field_is_set(msg: &DynamicMessage, field: &FieldDescriptor) -> bool {
    if field.is_list() || field.is_map() {
        return value_is_set(&msg.get_field(field));
    }
    match field.kind() {
        Kind::Message(_) => msg.has_field(field),
        _ => value_is_set(&msg.get_field(field)),
    }
}

/// Whether a value counts as set. Message values are always set: a singular
/// message field without a value has to be checked with [`field_is_set`].
pub(crate) fn value_is_set(value: &Value) -> bool {
    match value {
        Value::Bool(_) | Value::Message(_) => true,
        Value::I32(v) => *v != 0,
        Value::I64(v) => *v != 0,
        Value::U32(v) => *v != 0,
        Value::U64(v) => *v != 0,
        Value::F32(v) => *v != 0.0,
        Value::F64(v) => *v != 0.0,
        Value::String(s) => !s.is_empty(),
        Value::Bytes(b) => !b.is_empty(),
        Value::EnumNumber(n) => *n != 0,
        Value::List(items) => !items.is_empty(),
        Value::Map(entries) => !entries.is_empty(),
    }
}
