use std::collections::BTreeMap;
use std::fmt;

/// A typed constraint attached to a field, a oneof or a message.
///
/// Values are read-only configuration: they carry the raw authoring input
/// (regex source, threshold strings, bracket ranges, expressions) and are
/// checked and compiled once when the owning message type is compiled.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Constraint {
    /// The field must be set.
    Required(bool),
    /// String values must match a regular expression.
    Pattern(PatternRule),
    /// Numeric values must not fall below a threshold.
    Min(BoundRule),
    /// Numeric values must not exceed a threshold.
    Max(BoundRule),
    /// Numeric values must lie in a bracket-notation interval such as `[0..24)`.
    Range(String),
    /// Repeated scalar values must be pairwise distinct.
    Distinct(bool),
    /// When this field is set, the named field must be set too.
    Dependency(DependencyRule),
    /// Nested messages are validated recursively.
    Recurse(bool),
    /// A oneof must have an active member.
    Choice(ChoiceRule),
    /// Message-level boolean combination of fields that must be set,
    /// e.g. `"id | email"`.
    FieldCombination(String),
}

impl Constraint {
    /// The kind of this constraint.
    #[must_use]
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Self::Required(_) => ConstraintKind::Required,
            Self::Pattern(_) => ConstraintKind::Pattern,
            Self::Min(_) => ConstraintKind::Min,
            Self::Max(_) => ConstraintKind::Max,
            Self::Range(_) => ConstraintKind::Range,
            Self::Distinct(_) => ConstraintKind::Distinct,
            Self::Dependency(_) => ConstraintKind::Dependency,
            Self::Recurse(_) => ConstraintKind::Recurse,
            Self::Choice(_) => ConstraintKind::Choice,
            Self::FieldCombination(_) => ConstraintKind::FieldCombination,
        }
    }

    /// Convenience constructor for a pattern without modifiers.
    #[must_use]
    pub fn pattern(regex: impl Into<String>) -> Self {
        Self::Pattern(PatternRule::new(regex))
    }

    /// Convenience constructor for an inclusive lower bound.
    #[must_use]
    pub fn min(value: impl Into<String>) -> Self {
        Self::Min(BoundRule::new(value))
    }

    /// Convenience constructor for an inclusive upper bound.
    #[must_use]
    pub fn max(value: impl Into<String>) -> Self {
        Self::Max(BoundRule::new(value))
    }

    /// Convenience constructor for a bracket-notation range.
    #[must_use]
    pub fn range(range: impl Into<String>) -> Self {
        Self::Range(range.into())
    }

    /// Convenience constructor for a dependency on another field.
    #[must_use]
    pub fn goes_with(field: impl Into<String>) -> Self {
        Self::Dependency(DependencyRule::new(field))
    }

    /// Convenience constructor for a required-field combination expression.
    #[must_use]
    pub fn require_fields(expression: impl Into<String>) -> Self {
        Self::FieldCombination(expression.into())
    }
}

/// Discriminant of [`Constraint`], used as the lookup key of a [`ConstraintSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum ConstraintKind {
    /// See [`Constraint::Required`].
    Required,
    /// See [`Constraint::Pattern`].
    Pattern,
    /// See [`Constraint::Min`].
    Min,
    /// See [`Constraint::Max`].
    Max,
    /// See [`Constraint::Range`].
    Range,
    /// See [`Constraint::Distinct`].
    Distinct,
    /// See [`Constraint::Dependency`].
    Dependency,
    /// See [`Constraint::Recurse`].
    Recurse,
    /// See [`Constraint::Choice`].
    Choice,
    /// See [`Constraint::FieldCombination`].
    FieldCombination,
}

impl ConstraintKind {
    /// Every supported kind, in orchestration order.
    pub const ALL: [Self; 10] = [
        Self::Required,
        Self::Pattern,
        Self::FieldCombination,
        Self::Min,
        Self::Max,
        Self::Range,
        Self::Distinct,
        Self::Recurse,
        Self::Dependency,
        Self::Choice,
    ];

    /// The option name this kind is declared under, also used as the
    /// violation rule id.
    #[must_use]
    pub fn option_name(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Pattern => "pattern",
            Self::Min => "min",
            Self::Max => "max",
            Self::Range => "range",
            Self::Distinct => "distinct",
            Self::Dependency => "goes",
            Self::Recurse => "recurse",
            Self::Choice => "choice",
            Self::FieldCombination => "require",
        }
    }

    /// Where constraints of this kind may be attached.
    #[must_use]
    pub fn target(self) -> ConstraintTarget {
        match self {
            Self::Choice => ConstraintTarget::Oneof,
            Self::FieldCombination => ConstraintTarget::Message,
            _ => ConstraintTarget::Field,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_name())
    }
}

/// The schema element a constraint attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintTarget {
    /// A message field.
    Field,
    /// A oneof group.
    Oneof,
    /// The message itself.
    Message,
}

impl fmt::Display for ConstraintTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => f.write_str("field"),
            Self::Oneof => f.write_str("oneof"),
            Self::Message => f.write_str("message"),
        }
    }
}

/// Payload of [`Constraint::Pattern`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatternRule {
    /// Regular expression source.
    pub regex: String,
    /// Modifier letters: `i`, `m`, `s`, `u`, `x`.
    pub flags: String,
    /// Custom message format overriding the default.
    pub message: Option<String>,
}

impl PatternRule {
    /// Pattern without modifiers or custom message.
    #[must_use]
    pub fn new(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            ..Self::default()
        }
    }

    /// Set the modifier letters.
    #[must_use]
    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = flags.into();
        self
    }

    /// Set a custom message format.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Payload of [`Constraint::Min`] and [`Constraint::Max`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundRule {
    /// Threshold, parsed into the field's numeric family at compile time.
    pub value: String,
    /// Compare strictly (`>` / `<`) instead of inclusively.
    pub exclusive: bool,
    /// Custom message format overriding the default.
    pub message: Option<String>,
}

impl BoundRule {
    /// Inclusive bound without custom message.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Make the bound exclusive.
    #[must_use]
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    /// Set a custom message format.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Payload of [`Constraint::Dependency`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencyRule {
    /// Name of the field that must be set whenever the constrained field is.
    pub with: String,
    /// Custom message format overriding the default.
    pub message: Option<String>,
}

impl DependencyRule {
    /// Dependency on `with` without custom message.
    #[must_use]
    pub fn new(with: impl Into<String>) -> Self {
        Self {
            with: with.into(),
            message: None,
        }
    }

    /// Set a custom message format.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Payload of [`Constraint::Choice`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChoiceRule {
    /// Whether one member of the oneof must be active.
    pub required: bool,
    /// Custom message format overriding the default.
    pub message: Option<String>,
}

impl ChoiceRule {
    /// A choice that must be made.
    #[must_use]
    pub fn required() -> Self {
        Self {
            required: true,
            message: None,
        }
    }

    /// Set a custom message format.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Constraints attached to one schema element, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    entries: BTreeMap<ConstraintKind, Constraint>,
}

impl ConstraintSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a constraint, replacing any existing constraint of the same kind.
    pub fn insert(&mut self, constraint: Constraint) -> Option<Constraint> {
        self.entries.insert(constraint.kind(), constraint)
    }

    /// Whether a constraint of `kind` is attached.
    #[must_use]
    pub fn has(&self, kind: ConstraintKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// The constraint of `kind`, if attached.
    #[must_use]
    pub fn get(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.entries.get(&kind)
    }

    /// Iterate attached constraints in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.entries.values()
    }

    /// Whether nothing is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of attached constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<Constraint> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        let mut set = Self::new();
        for constraint in iter {
            set.insert(constraint);
        }
        set
    }
}
