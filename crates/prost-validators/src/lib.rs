//! Runtime constraint validation for Protocol Buffer messages.
//!
//! Constraints are declared as custom options on message, field and oneof
//! descriptors (by default in the `validate` package, e.g.
//! `[(validate.required) = true]`), or attached programmatically through a
//! [`RuleSet`]. This crate inspects `prost-reflect` descriptors at runtime,
//! compiles those constraints once per message type, and evaluates them
//! against concrete message instances.
//!
//! # Quick start
//!
//! For one-off validation, use the [`validate`] convenience function:
//!
//! ```rust,no_run
//! use prost_validators::validate;
//! # fn example(msg: impl prost_reflect::ReflectMessage) {
//! match validate(&msg) {
//!     Ok(()) => { /* message is valid */ }
//!     Err(e) => eprintln!("validation failed: {e}"),
//! }
//! # }
//! ```
//!
//! For repeated validations, or to attach constraints in code, construct a
//! [`Validator`] once to cache compiled constraints across calls:
//!
//! ```rust,no_run
//! use prost_validators::{Constraint, RuleSet, Validator, ValidatorOption};
//! # fn example(msg: impl prost_reflect::ReflectMessage) {
//! let rules = RuleSet::new()
//!     .field("acme.Reading", "hour", Constraint::range("[0..24)"))
//!     .message("acme.Reading", Constraint::require_fields("id | serial"));
//! let validator = Validator::with_options(&[ValidatorOption::Rules(rules)]);
//! for violation in validator.violations(&msg).expect("constraints compile") {
//!     eprintln!("{violation}");
//! }
//! # }
//! ```
//!
//! # Constraints
//!
//! | Option | Target | Meaning |
//! |--------|--------|---------|
//! | `required` | field | the field must be set (non-zero, non-empty) |
//! | `pattern` | string field | non-empty values must match a regex |
//! | `min` / `max` | numeric field | inclusive or exclusive threshold |
//! | `range` | numeric field | interval such as `[0..24)` |
//! | `distinct` | repeated scalar field | no duplicate elements |
//! | `goes` | field | when set, another field must be set too |
//! | `recurse` | message field | validate the nested message(s) |
//! | `choice` | oneof | one member must be set |
//! | `require` | message | boolean combination of set fields, e.g. `a \| (b & c)` |
//!
//! # Error types
//!
//! | Type | When |
//! |------|------|
//! | [`ValidationError`] | One or more constraint violations detected |
//! | [`CompilationError`] | A constraint is malformed or does not fit its target |
//! | [`RuntimeError`] | Evaluation could not complete, e.g. nesting too deep |
//!
//! All three are unified under [`Error`].

#![warn(missing_docs)]

mod config;
mod error;
mod schema;
mod template;
mod validator;
mod violation;

#[cfg(test)]
mod testing;

pub use config::{DEFAULT_MAX_DEPTH, ValidationOption, ValidatorOption};
pub use error::{CompilationError, Error, RuntimeError, ValidationError};
pub use schema::constraint::{
    BoundRule, ChoiceRule, ConstraintKind, ConstraintSet, ConstraintTarget, DependencyRule,
    PatternRule,
};
pub use schema::registry::{ConstraintRegistry, DEFAULT_PACKAGE, Registration};
pub use schema::rule_set::RuleSet;
pub use schema::{
    Constrained, Constraint, ElementKind, FieldKind, FieldSchema, MessageSchema, OneofSchema,
    ScalarType,
};
pub use template::{MessageTemplate, render};
pub use validator::{Validator, validate};
pub use violation::{FieldPath, PathSegment, Violation};
