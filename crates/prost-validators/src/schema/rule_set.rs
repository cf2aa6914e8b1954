use std::collections::HashMap;

use super::constraint::{Constraint, ConstraintSet};

/// Programmatically attached constraints, keyed by message full name.
///
/// Rules in a `RuleSet` are merged over constraints declared in descriptor
/// options; a rule replaces an option-declared constraint of the same kind
/// on the same target.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    messages: HashMap<String, MessageRules>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MessageRules {
    pub message: ConstraintSet,
    pub fields: HashMap<String, ConstraintSet>,
    pub oneofs: HashMap<String, ConstraintSet>,
}

impl RuleSet {
    /// An empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a constraint to field `field` of message type `message`.
    #[must_use]
    pub fn field(
        mut self,
        message: impl Into<String>,
        field: impl Into<String>,
        constraint: Constraint,
    ) -> Self {
        self.entry(message)
            .fields
            .entry(field.into())
            .or_default()
            .insert(constraint);
        self
    }

    /// Attach a constraint to oneof `oneof` of message type `message`.
    #[must_use]
    pub fn oneof(
        mut self,
        message: impl Into<String>,
        oneof: impl Into<String>,
        constraint: Constraint,
    ) -> Self {
        self.entry(message)
            .oneofs
            .entry(oneof.into())
            .or_default()
            .insert(constraint);
        self
    }

    /// Attach a message-level constraint to message type `message`.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>, constraint: Constraint) -> Self {
        self.entry(message).message.insert(constraint);
        self
    }

    /// Merge `other` into this set; rules from `other` win.
    pub fn extend(&mut self, other: &RuleSet) {
        for (name, rules) in &other.messages {
            let entry = self.entry(name.clone());
            for constraint in rules.message.iter() {
                entry.message.insert(constraint.clone());
            }
            merge_named(&mut entry.fields, &rules.fields);
            merge_named(&mut entry.oneofs, &rules.oneofs);
        }
    }

    /// Whether no rules are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn for_message(&self, full_name: &str) -> Option<&MessageRules> {
        self.messages.get(full_name)
    }

    fn entry(&mut self, message: impl Into<String>) -> &mut MessageRules {
        self.messages.entry(message.into()).or_default()
    }
}

fn merge_named(into: &mut HashMap<String, ConstraintSet>, from: &HashMap<String, ConstraintSet>) {
    for (name, set) in from {
        let target = into.entry(name.clone()).or_default();
        for constraint in set.iter() {
            target.insert(constraint.clone());
        }
    }
}
