use std::collections::HashMap;

use super::constraint::ConstraintKind;

/// Default package the constraint option extensions are declared in.
pub const DEFAULT_PACKAGE: &str = "validate";

/// Option names that are recognized but refused: they describe stateful,
/// cross-message rules that a pure per-message validator cannot enforce.
const STATEFUL_OPTIONS: &[&str] = &["once", "immutable"];

/// How an option name resolves in a [`ConstraintRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A supported constraint kind.
    Supported(ConstraintKind),
    /// A recognized constraint that this engine refuses to evaluate.
    Unsupported,
}

/// Immutable lookup of the constraint kinds recognized by a validator.
///
/// Built once and shared read-only by every validation; maps extension
/// full names such as `validate.required` to their [`ConstraintKind`].
#[derive(Debug, Clone)]
pub struct ConstraintRegistry {
    package: String,
    names: HashMap<String, Registration>,
}

impl ConstraintRegistry {
    /// Registry for option extensions declared in `package`.
    #[must_use]
    pub fn with_package(package: impl Into<String>) -> Self {
        let package = package.into();
        let mut names = HashMap::new();
        for kind in ConstraintKind::ALL {
            names.insert(
                qualify(&package, kind.option_name()),
                Registration::Supported(kind),
            );
        }
        for name in STATEFUL_OPTIONS {
            names.insert(qualify(&package, name), Registration::Unsupported);
        }
        Self { package, names }
    }

    /// Package the option extensions are declared in.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Resolve an extension full name.
    ///
    /// Returns `None` for extensions that do not belong to this registry,
    /// which callers ignore.
    #[must_use]
    pub fn lookup(&self, full_name: &str) -> Option<Registration> {
        self.names.get(full_name).copied()
    }

    /// Full extension name a kind is declared under.
    #[must_use]
    pub fn option_name(&self, kind: ConstraintKind) -> String {
        qualify(&self.package, kind.option_name())
    }
}

impl Default for ConstraintRegistry {
    fn default() -> Self {
        Self::with_package(DEFAULT_PACKAGE)
    }
}

fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_registry_resolves_every_kind_in_the_validate_package() {
        let registry = ConstraintRegistry::default();
        for kind in ConstraintKind::ALL {
            assert_eq!(
                registry.lookup(&registry.option_name(kind)),
                Some(Registration::Supported(kind))
            );
        }
        assert_eq!(
            registry.lookup("validate.goes"),
            Some(Registration::Supported(ConstraintKind::Dependency))
        );
    }

    #[test]
    fn stateful_options_are_recognized_but_unsupported() {
        let registry = ConstraintRegistry::default();
        assert_eq!(
            registry.lookup("validate.once"),
            Some(Registration::Unsupported)
        );
        assert_eq!(
            registry.lookup("validate.immutable"),
            Some(Registration::Unsupported)
        );
    }

    #[test]
    fn foreign_extensions_are_not_resolved() {
        let registry = ConstraintRegistry::with_package("acme.rules");
        assert_eq!(registry.lookup("validate.required"), None);
        assert_eq!(
            registry.lookup("acme.rules.required"),
            Some(Registration::Supported(ConstraintKind::Required))
        );
        assert_eq!(registry.package(), "acme.rules");
    }
}
