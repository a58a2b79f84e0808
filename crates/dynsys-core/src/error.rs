//! Error types for the dynsys plugin framework.
//!
//! Organized by the point at which a failure surfaces:
//!
//! | Type | Surfaces during |
//! |------|-----------------|
//! | [`LoadError`] | opening a module and resolving its entry points |
//! | [`ArgumentError`] | validating supplied arguments, replacing `x`/`p` |
//! | [`ConstructionError`] | the module's own domain check in `construct` |
//! | [`RunError`] | stepping and driver runs (wraps [`NumericalError`]) |
//!
//! Argument and construction failures are synchronous and leave no
//! partially built instance behind. Run failures surface after side
//! effects (a partially written artifact, incomplete progress).

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use crate::role::Role;
use crate::schema::ArgKind;

// ── SchemaError ─────────────────────────────────────────────────

/// A declared schema is malformed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// An entry has an empty name.
    EmptyName {
        /// Position of the offending entry.
        index: usize,
    },
    /// Two entries share a name.
    DuplicateName {
        /// The repeated name.
        name: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName { index } => write!(f, "argument {index} has an empty name"),
            Self::DuplicateName { name } => write!(f, "argument '{name}' declared twice"),
        }
    }
}

impl Error for SchemaError {}

// ── LoadError ───────────────────────────────────────────────────

/// A module could not be turned into a usable handle.
///
/// The loader fails closed: a module missing any entry point its role
/// requires is rejected as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// Nothing exists at the path.
    NotFound {
        /// Path that was probed.
        path: PathBuf,
    },
    /// The file exists but is not a loadable module.
    Open {
        /// Module path.
        path: PathBuf,
        /// Loader diagnostic.
        reason: String,
    },
    /// A required entry point is absent.
    MissingEntryPoint {
        /// Module path.
        path: PathBuf,
        /// Symbol that could not be resolved.
        symbol: &'static str,
    },
    /// The module was built against a different ABI version.
    AbiMismatch {
        /// Module path.
        path: PathBuf,
        /// Version reported by the module.
        found: u32,
        /// Version this host speaks.
        expected: u32,
    },
    /// `ds_role` returned a value outside the known roles.
    UnknownRole {
        /// Module path.
        path: PathBuf,
        /// Raw role value.
        value: i32,
    },
    /// The module's declared role differs from where it was found.
    RoleMismatch {
        /// Module path.
        path: PathBuf,
        /// Role implied by the discovery location.
        expected: Role,
        /// Role the module declares.
        found: Role,
    },
    /// The declared name is empty or not UTF-8.
    InvalidName {
        /// Module path.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
    /// The declared argument schema is malformed.
    InvalidSchema {
        /// Module path.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "module not found: {}", path.display()),
            Self::Open { path, reason } => {
                write!(f, "cannot open module {}: {reason}", path.display())
            }
            Self::MissingEntryPoint { path, symbol } => {
                write!(f, "module {} lacks entry point `{symbol}`", path.display())
            }
            Self::AbiMismatch {
                path,
                found,
                expected,
            } => write!(
                f,
                "module {} speaks ABI v{found}, host expects v{expected}",
                path.display()
            ),
            Self::UnknownRole { path, value } => {
                write!(f, "module {} declares unknown role {value}", path.display())
            }
            Self::RoleMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "module {} declares role '{found}' but was found as '{expected}'",
                path.display()
            ),
            Self::InvalidName { path, reason } => {
                write!(f, "module {} has an invalid name: {reason}", path.display())
            }
            Self::InvalidSchema { path, reason } => {
                write!(f, "module {} has an invalid schema: {reason}", path.display())
            }
        }
    }
}

impl Error for LoadError {}

// ── ArgumentError ───────────────────────────────────────────────

/// Caller-supplied data does not fit the declared shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgumentError {
    /// Declared arguments absent from the supplied set, in schema order.
    Missing {
        /// Absent names.
        names: Vec<String>,
    },
    /// Supplied arguments the schema does not declare, in supplied order.
    Unexpected {
        /// Undeclared names.
        names: Vec<String>,
    },
    /// The same name was supplied more than once.
    Duplicate {
        /// Repeated name.
        name: String,
    },
    /// A value's type differs from the declared type.
    Type {
        /// Argument name.
        name: String,
        /// Declared type.
        expected: ArgKind,
        /// Supplied type.
        actual: ArgKind,
    },
    /// Textual input is not an exact representation of the declared type.
    Parse {
        /// Argument name.
        name: String,
        /// Declared type.
        expected: ArgKind,
        /// Offending text.
        text: String,
    },
    /// A vector replacement has the wrong number of elements.
    Length {
        /// Which vector (`"x"` or `"p"`).
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// A component index is out of range.
    Index {
        /// Which vector (`"x"` or `"p"`).
        what: &'static str,
        /// Supplied index.
        index: usize,
        /// Vector length.
        len: usize,
    },
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { names } => write!(f, "missing arguments: {}", names.join(", ")),
            Self::Unexpected { names } => {
                write!(f, "unexpected arguments: {}", names.join(", "))
            }
            Self::Duplicate { name } => write!(f, "argument '{name}' supplied twice"),
            Self::Type {
                name,
                expected,
                actual,
            } => write!(f, "argument '{name}' must be {expected}, got {actual}"),
            Self::Parse {
                name,
                expected,
                text,
            } => write!(f, "argument '{name}': {text:?} is not a valid {expected}"),
            Self::Length {
                what,
                expected,
                actual,
            } => write!(f, "{what} must have {expected} elements, got {actual}"),
            Self::Index { what, index, len } => {
                write!(f, "{what} index {index} out of range for length {len}")
            }
        }
    }
}

impl Error for ArgumentError {}

// ── ConstructionError ───────────────────────────────────────────

/// A module's constructor rejected well-typed but out-of-domain
/// arguments (e.g. a non-positive dimension).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructionError {
    /// Name of the rejecting module.
    pub module: String,
    /// The module's explanation.
    pub reason: String,
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module '{}' rejected its arguments: {}", self.module, self.reason)
    }
}

impl Error for ConstructionError {}

// ── CreateError ─────────────────────────────────────────────────

/// Failure of `Factory::create`: either side of the module boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateError {
    /// Host-side validation failed; the module was never called.
    Argument(ArgumentError),
    /// The module's constructor refused the validated arguments.
    Construction(ConstructionError),
}

impl fmt::Display for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument(e) => write!(f, "argument: {e}"),
            Self::Construction(e) => write!(f, "construction: {e}"),
        }
    }
}

impl Error for CreateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Argument(e) => Some(e),
            Self::Construction(e) => Some(e),
        }
    }
}

impl From<ArgumentError> for CreateError {
    fn from(e: ArgumentError) -> Self {
        Self::Argument(e)
    }
}

impl From<ConstructionError> for CreateError {
    fn from(e: ConstructionError) -> Self {
        Self::Construction(e)
    }
}

// ── NumericalError ──────────────────────────────────────────────

/// A step produced a non-finite state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumericalError {
    /// Diagnostic from the stepper.
    pub reason: String,
}

impl fmt::Display for NumericalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "numerical failure: {}", self.reason)
    }
}

impl Error for NumericalError {}

// ── RunError ────────────────────────────────────────────────────

/// Failure while stepping or running a driver.
///
/// By the time a `RunError` is returned the ODE state may already be
/// advanced and the driver's artifact partially written. Nothing is
/// rolled back and nothing is retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunError {
    /// The stepper produced a non-finite state.
    Numerical(NumericalError),
    /// Writing the output artifact failed.
    Io {
        /// Diagnostic from the driver.
        reason: String,
    },
    /// The driver refused the run's inputs (e.g. `t_end` not after `t`).
    Rejected {
        /// Diagnostic from the module.
        reason: String,
    },
    /// The step budget was exhausted or a step made no progress.
    StepLimit {
        /// Diagnostic from the module.
        reason: String,
    },
    /// The driver violated the progress protocol.
    Protocol {
        /// What was violated.
        reason: String,
    },
    /// Any other failure reported by a module, including panics caught
    /// at the boundary and unknown status codes.
    Plugin {
        /// Raw status code.
        code: i32,
        /// Diagnostic from the module.
        reason: String,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numerical(e) => write!(f, "{e}"),
            Self::Io { reason } => write!(f, "artifact I/O failed: {reason}"),
            Self::Rejected { reason } => write!(f, "run rejected: {reason}"),
            Self::StepLimit { reason } => write!(f, "step limit: {reason}"),
            Self::Protocol { reason } => write!(f, "progress protocol violated: {reason}"),
            Self::Plugin { code, reason } => write!(f, "module failed ({code}): {reason}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Numerical(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NumericalError> for RunError {
    fn from(e: NumericalError) -> Self {
        Self::Numerical(e)
    }
}
