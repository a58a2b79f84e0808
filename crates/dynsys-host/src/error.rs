//! Host-side errors and the status-code mapping.
//!
//! Failures a module reports through a status code become
//! [`RunError`] variants here; everything the host itself can get wrong
//! before a module is involved is a [`ConfigError`] or a
//! [`RegistryError`].

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use dynsys_abi::DsStatus;
use dynsys_core::{LoadError, NumericalError, Role, RunError};

// ── ConfigError ─────────────────────────────────────────────────

/// Invalid [`RegistryConfig`](crate::RegistryConfig).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The module root is empty.
    EmptyRoot,
    /// A role directory name is empty.
    EmptyDir {
        /// Role whose directory is unnamed.
        role: Role,
    },
    /// Two roles share a directory.
    SharedDir {
        /// The shared directory name.
        dir: String,
    },
    /// The TOML source could not be parsed.
    Parse {
        /// Parser diagnostic.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRoot => write!(f, "module root must not be empty"),
            Self::EmptyDir { role } => write!(f, "{role} directory must not be empty"),
            Self::SharedDir { dir } => write!(f, "directory '{dir}' assigned to two roles"),
            Self::Parse { reason } => write!(f, "invalid registry config: {reason}"),
        }
    }
}

impl Error for ConfigError {}

// ── RegistryError ───────────────────────────────────────────────

/// Module discovery failed. Discovery fails closed: the first error
/// aborts it and no registry is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// The configuration is invalid.
    Config(ConfigError),
    /// A role directory could not be read.
    Io {
        /// Directory being scanned.
        path: PathBuf,
        /// OS diagnostic.
        reason: String,
    },
    /// A module file name yields no usable name.
    InvalidFileName {
        /// Offending file.
        path: PathBuf,
    },
    /// A module failed to load.
    Load(LoadError),
    /// Two modules of one role share a name.
    Duplicate {
        /// Role namespace.
        role: Role,
        /// Repeated name.
        name: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Io { path, reason } => {
                write!(f, "cannot scan {}: {reason}", path.display())
            }
            Self::InvalidFileName { path } => {
                write!(f, "cannot derive a module name from {}", path.display())
            }
            Self::Load(e) => write!(f, "{e}"),
            Self::Duplicate { role, name } => write!(f, "duplicate {role} module '{name}'"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Load(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for RegistryError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<LoadError> for RegistryError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

// ── Status mapping ──────────────────────────────────────────────

/// Translate a non-zero status and its diagnostic into a [`RunError`].
pub(crate) fn run_error(code: i32, reason: String) -> RunError {
    match DsStatus::from_raw(code) {
        Some(DsStatus::NumericalFailure) => RunError::Numerical(NumericalError { reason }),
        Some(DsStatus::IoFailure) => RunError::Io { reason },
        Some(DsStatus::InvalidArgument) => RunError::Rejected { reason },
        Some(DsStatus::StepLimitExceeded) => RunError::StepLimit { reason },
        _ => RunError::Plugin { code, reason },
    }
}
