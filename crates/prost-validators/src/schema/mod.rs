//! Constraint-annotated view of a message type.
//!
//! A [`MessageSchema`] pairs a `prost-reflect` descriptor with the typed
//! constraints attached to the message, its fields and its oneofs. Schemas
//! are resolved once per message type and shared read-only by every
//! validation of that type.

pub(crate) mod constraint;
pub(crate) mod options;
pub(crate) mod registry;
pub(crate) mod rule_set;

use prost_reflect::{FieldDescriptor, Kind, MessageDescriptor, OneofDescriptor};

use crate::error::CompilationError;

use constraint::{ConstraintKind, ConstraintSet, ConstraintTarget};
use registry::ConstraintRegistry;
use rule_set::RuleSet;

pub use constraint::Constraint;

/// Typed access to the constraints attached to a schema element.
pub trait Constrained {
    /// Every constraint attached to this element.
    fn constraints(&self) -> &ConstraintSet;

    /// Whether a constraint of `kind` is attached.
    fn has_constraint(&self, kind: ConstraintKind) -> bool {
        self.constraints().has(kind)
    }

    /// The constraint of `kind`, if attached.
    fn constraint(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.constraints().get(kind)
    }
}

/// Numeric or textual family of a scalar field (or of list/map elements).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// `int32`, `int64`, `sint*`, `sfixed*`.
    Signed,
    /// `uint32`, `uint64`, `fixed*`.
    Unsigned,
    /// `float`, `double`.
    Float,
    /// `string`.
    String,
    /// `bytes`.
    Bytes,
    /// `bool`.
    Bool,
}

impl ScalarType {
    /// Whether values of this type can be compared against numeric bounds.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Signed | Self::Unsigned | Self::Float)
    }
}

/// Kind of the values held by a field (for lists and maps, of each element).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// A scalar of the given family.
    Scalar(ScalarType),
    /// An enum number.
    Enum,
    /// A message of the given fully-qualified type.
    Message(String),
}

/// Shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Singular scalar.
    Scalar,
    /// Singular enum.
    Enum,
    /// Singular message.
    Message,
    /// Repeated field.
    List,
    /// Map field.
    Map,
}

/// A field and its constraints.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    descriptor: FieldDescriptor,
    kind: FieldKind,
    element: ElementKind,
    constraints: ConstraintSet,
}

impl FieldSchema {
    fn new(descriptor: FieldDescriptor, constraints: ConstraintSet) -> Self {
        let element = match descriptor.kind() {
            Kind::Message(entry) if descriptor.is_map() => {
                element_kind(&entry.map_entry_value_field().kind())
            }
            other => element_kind(&other),
        };
        let kind = if descriptor.is_map() {
            FieldKind::Map
        } else if descriptor.is_list() {
            FieldKind::List
        } else {
            match element {
                ElementKind::Scalar(_) => FieldKind::Scalar,
                ElementKind::Enum => FieldKind::Enum,
                ElementKind::Message(_) => FieldKind::Message,
            }
        };
        Self {
            descriptor,
            kind,
            element,
            constraints,
        }
    }

    /// Wire name of the field, used in violation paths.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Accessor (JSON) name of the field.
    #[must_use]
    pub fn accessor_name(&self) -> &str {
        self.descriptor.json_name()
    }

    /// Shape of the field.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Kind of the values the field holds.
    #[must_use]
    pub fn element(&self) -> &ElementKind {
        &self.element
    }

    /// Scalar family of the field's values, if they are scalars.
    #[must_use]
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self.element {
            ElementKind::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Fully-qualified name of the nested message type, if any.
    #[must_use]
    pub fn message_type(&self) -> Option<&str> {
        match &self.element {
            ElementKind::Message(name) => Some(name),
            _ => None,
        }
    }

    /// Underlying reflection descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }
}

impl Constrained for FieldSchema {
    fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }
}

/// A oneof and its constraints.
#[derive(Debug, Clone)]
pub struct OneofSchema {
    descriptor: OneofDescriptor,
    constraints: ConstraintSet,
}

impl OneofSchema {
    /// Name of the oneof.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Member fields of the oneof.
    pub fn fields(&self) -> impl Iterator<Item = FieldDescriptor> + '_ {
        self.descriptor.fields()
    }

    /// Underlying reflection descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &OneofDescriptor {
        &self.descriptor
    }
}

impl Constrained for OneofSchema {
    fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }
}

/// A message type with the constraints attached to it, its fields and its oneofs.
#[derive(Debug, Clone)]
pub struct MessageSchema {
    descriptor: MessageDescriptor,
    fields: Vec<FieldSchema>,
    oneofs: Vec<OneofSchema>,
    constraints: ConstraintSet,
}

impl MessageSchema {
    /// Resolve the schema of `descriptor`: constraints declared as options
    /// recognized by `registry`, overlaid with the rules in `rules`.
    ///
    /// # Errors
    ///
    /// Returns a [`CompilationError`] when an option is malformed, names a
    /// stateful constraint, is attached to the wrong kind of element, or
    /// when `rules` names a field or oneof the message does not have.
    pub fn resolve(
        descriptor: &MessageDescriptor,
        registry: &ConstraintRegistry,
        rules: &RuleSet,
    ) -> Result<Self, CompilationError> {
        let full_name = descriptor.full_name();
        let overrides = rules.for_message(full_name);

        let mut constraints = options::constraints_from_options(
            &descriptor.options(),
            registry,
            ConstraintTarget::Message,
            full_name,
        )?;
        if let Some(overrides) = overrides {
            overlay(
                &mut constraints,
                &overrides.message,
                ConstraintTarget::Message,
                full_name,
            )?;
            for name in overrides.fields.keys() {
                if descriptor.get_field_by_name(name).is_none() {
                    return Err(CompilationError {
                        cause: format!("rules name unknown field {name} in message {full_name}"),
                    });
                }
            }
            for name in overrides.oneofs.keys() {
                if !descriptor
                    .oneofs()
                    .any(|oneof| !oneof.is_synthetic() && oneof.name() == name)
                {
                    return Err(CompilationError {
                        cause: format!("rules name unknown oneof {name} in message {full_name}"),
                    });
                }
            }
        }

        let mut fields = Vec::new();
        for field in descriptor.fields() {
            let owner = field.full_name().to_string();
            let mut set = options::constraints_from_options(
                &field.options(),
                registry,
                ConstraintTarget::Field,
                &owner,
            )?;
            if let Some(extra) = overrides.and_then(|o| o.fields.get(field.name())) {
                overlay(&mut set, extra, ConstraintTarget::Field, &owner)?;
            }
            fields.push(FieldSchema::new(field, set));
        }

        let mut oneofs = Vec::new();
        for oneof in descriptor.oneofs() {
            if oneof.is_synthetic() {
                continue;
            }
            let owner = oneof.full_name().to_string();
            let mut set = options::constraints_from_options(
                &oneof.options(),
                registry,
                ConstraintTarget::Oneof,
                &owner,
            )?;
            if let Some(extra) = overrides.and_then(|o| o.oneofs.get(oneof.name())) {
                overlay(&mut set, extra, ConstraintTarget::Oneof, &owner)?;
            }
            oneofs.push(OneofSchema {
                descriptor: oneof,
                constraints: set,
            });
        }

        Ok(Self {
            descriptor: descriptor.clone(),
            fields,
            oneofs,
            constraints,
        })
    }

    /// Fully-qualified name of the message type.
    #[must_use]
    pub fn full_name(&self) -> &str {
        self.descriptor.full_name()
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Non-synthetic oneofs in declaration order.
    #[must_use]
    pub fn oneofs(&self) -> &[OneofSchema] {
        &self.oneofs
    }

    /// Look up a field by wire name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Underlying reflection descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }
}

impl Constrained for MessageSchema {
    fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }
}

fn overlay(
    into: &mut ConstraintSet,
    from: &ConstraintSet,
    target: ConstraintTarget,
    owner: &str,
) -> Result<(), CompilationError> {
    for constraint in from.iter() {
        let kind = constraint.kind();
        if kind.target() != target {
            return Err(CompilationError {
                cause: format!(
                    "{owner}: `{kind}` applies to a {} but was attached to a {target}",
                    kind.target()
                ),
            });
        }
        into.insert(constraint.clone());
    }
    Ok(())
}

fn element_kind(kind: &Kind) -> ElementKind {
    match kind {
        Kind::Int32
        | Kind::Int64
        | Kind::Sint32
        | Kind::Sint64
        | Kind::Sfixed32
        | Kind::Sfixed64 => ElementKind::Scalar(ScalarType::Signed),
        Kind::Uint32 | Kind::Uint64 | Kind::Fixed32 | Kind::Fixed64 => {
            ElementKind::Scalar(ScalarType::Unsigned)
        }
        Kind::Float | Kind::Double => ElementKind::Scalar(ScalarType::Float),
        Kind::String => ElementKind::Scalar(ScalarType::String),
        Kind::Bytes => ElementKind::Scalar(ScalarType::Bytes),
        Kind::Bool => ElementKind::Scalar(ScalarType::Bool),
        Kind::Enum(_) => ElementKind::Enum,
        Kind::Message(message) => ElementKind::Message(message.full_name().to_string()),
    }
}
