//! Safe authoring surface for plugin modules.
//!
//! A module is a plain Rust type implementing [`Construct`] plus one of
//! [`OdePlugin`], [`SolverPlugin`] or [`JobPlugin`]. The generic
//! trampolines in [`trampoline`] adapt it to the C entry points; a
//! `cdylib` exports them with [`export_ode!`](crate::export_ode),
//! [`export_solver!`](crate::export_solver) or
//! [`export_job!`](crate::export_job), and in-process hosts use
//! [`ModuleTable::ode`](crate::ModuleTable::ode) and friends instead.

mod args;
pub mod trampoline;
mod view;

use std::error::Error;
use std::fmt;

use crate::status::DsStatus;
use crate::types::DsArgSpec;

pub use args::Arguments;
pub use view::{OdeView, ProgressRef, SolverRef};

// ── PluginError ─────────────────────────────────────────────────

/// Failure reported by a plugin: a status code plus a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginError {
    code: i32,
    message: String,
}

impl PluginError {
    /// An error with an explicit status.
    pub fn new(status: DsStatus, message: impl Into<String>) -> Self {
        Self {
            code: status as i32,
            message: message.into(),
        }
    }

    /// An error carrying a raw code received from another module.
    pub fn from_raw(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Constructor domain rejection.
    pub fn construction(message: impl Into<String>) -> Self {
        Self::new(DsStatus::ConstructionFailed, message)
    }

    /// Invalid input to an operation.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(DsStatus::InvalidArgument, message)
    }

    /// Non-finite result.
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::new(DsStatus::NumericalFailure, message)
    }

    /// Artifact write failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(DsStatus::IoFailure, message)
    }

    /// Step budget exhausted or no progress.
    pub fn step_limit(message: impl Into<String>) -> Self {
        Self::new(DsStatus::StepLimitExceeded, message)
    }

    /// Raw status code.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Decoded status, `None` for codes outside [`DsStatus`].
    pub fn status(&self) -> Option<DsStatus> {
        DsStatus::from_raw(self.code)
    }

    /// The diagnostic.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message, self.code)
    }
}

impl Error for PluginError {}

impl From<std::io::Error> for PluginError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

// ── Traits ──────────────────────────────────────────────────────

/// Static description plus construction, shared by every role.
pub trait Construct: Sized + Send + 'static {
    /// Module name reported by `ds_name`.
    const NAME: &'static str;

    /// Ordered argument schema reported by `ds_schema`.
    const SCHEMA: &'static [DsArgSpec];

    /// Build an instance from arguments already validated against
    /// [`SCHEMA`](Self::SCHEMA). Domain checks belong here; return
    /// [`PluginError::construction`] to reject.
    fn construct(args: &Arguments<'_>) -> Result<Self, PluginError>;
}

/// A state-evolution rule.
pub trait OdePlugin: Construct {
    /// Length of `x`. Fixed at construction.
    fn x_size(&self) -> usize;

    /// Length of `p`. Fixed at construction.
    fn p_size(&self) -> usize;

    /// Write `dx/dt` at `(t, x)` with parameters `p` into `dxdt`.
    ///
    /// Slices always have the lengths reported by `x_size`/`p_size`.
    fn derivative(&self, t: f64, x: &[f64], p: &[f64], dxdt: &mut [f64]);
}

/// A stepping algorithm.
pub trait SolverPlugin: Construct {
    /// Advance `ode` by one step, never past `t_limit` and never
    /// backwards. Does nothing when `ode.t() >= t_limit`.
    fn step(&mut self, ode: &mut OdeView<'_>, t_limit: f64) -> Result<(), PluginError>;
}

/// A batch driver.
pub trait JobPlugin: Construct {
    /// Run the integration loop to completion.
    fn run(
        &mut self,
        ode: &mut OdeView<'_>,
        solver: &mut SolverRef<'_>,
        progress: &mut ProgressRef<'_>,
    ) -> Result<(), PluginError>;
}
