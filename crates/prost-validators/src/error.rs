use std::fmt;

use crate::violation::Violation;

/// Top-level error type returned by validation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// One or more constraints were violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The constraints of a message type could not be compiled.
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// Validation was aborted, e.g. because the nesting depth limit was hit.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Returned when one or more constraints are violated.
#[derive(Debug)]
pub struct ValidationError {
    /// The violations found during validation.
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violations.len() {
            0 => Ok(()),
            1 => write!(f, "validation error: {}", self.violations[0]),
            _ => {
                write!(f, "validation errors:")?;
                for v in &self.violations {
                    write!(f, "\n - {v}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub(crate) fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    pub(crate) fn violations_mut(&mut self) -> &mut Vec<Violation> {
        &mut self.violations
    }
}

/// Returned when constraint configuration is invalid: a malformed regex or
/// range, an unparseable threshold, a dangling field reference, or a
/// constraint that does not fit the field it is attached to.
#[derive(Debug, Clone, thiserror::Error)]
#[error("compilation error: {cause}")]
pub struct CompilationError {
    /// Description of why the constraint failed to compile.
    pub cause: String,
}

/// Returned when a validation call cannot complete.
#[derive(Debug, Clone, thiserror::Error)]
#[error("runtime error: {cause}")]
pub struct RuntimeError {
    /// Description of the runtime failure.
    pub cause: String,
}

/// Merge violations from a sub-evaluation into an accumulator.
///
/// Returns `(should_continue, accumulated_error)`.
/// If `fail_fast` is true, stops on the first violation.
pub(crate) fn merge_violations(
    acc: Option<Error>,
    new_err: Result<(), Error>,
    fail_fast: bool,
) -> (bool, Option<Error>) {
    let new_err = match new_err {
        Ok(()) => return (true, acc),
        Err(e) => e,
    };

    match new_err {
        Error::Compilation(_) | Error::Runtime(_) => (false, Some(new_err)),
        Error::Validation(new_val) => {
            if fail_fast {
                return (false, Some(Error::Validation(new_val)));
            }
            match acc {
                Some(Error::Validation(mut existing)) => {
                    existing.violations.extend(new_val.violations);
                    (true, Some(Error::Validation(existing)))
                }
                _ => (true, Some(Error::Validation(new_val))),
            }
        }
    }
}

/// Apply `f` to every violation of a validation error, passing other
/// results through unchanged.
pub(crate) fn map_violations(
    result: Result<(), Error>,
    mut f: impl FnMut(&mut Violation),
) -> Result<(), Error> {
    match result {
        Ok(()) => Ok(()),
        Err(Error::Validation(mut ve)) => {
            for violation in ve.violations_mut() {
                f(violation);
            }
            Err(Error::Validation(ve))
        }
        Err(other) => Err(other),
    }
}

/// Turn an accumulator into a result.
pub(crate) fn finish(acc: Option<Error>) -> Result<(), Error> {
    match acc {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
