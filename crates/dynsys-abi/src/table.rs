//! Resolved entry points of one module.

use crate::symbols::{
    DsAbiVersionFn, DsConstructFn, DsDestroyFn, DsNameFn, DsOdeSizesFn, DsRoleFn, DsRunFn,
    DsSchemaFn,
};
use crate::types::{DsDerivativeFn, DsRole, DsStepFn};

/// Every entry point of a module, however it was obtained: resolved
/// from a shared library or built in-process from SDK types.
///
/// A table says nothing about validity; hosts check the version, role
/// agreement, name and schema before using it.
#[derive(Clone, Copy, Debug)]
pub struct ModuleTable {
    /// `ds_abi_version`
    pub abi_version: DsAbiVersionFn,
    /// `ds_role`
    pub role: DsRoleFn,
    /// `ds_name`
    pub name: DsNameFn,
    /// `ds_schema`
    pub schema: DsSchemaFn,
    /// `ds_construct`
    pub construct: DsConstructFn,
    /// `ds_destroy`
    pub destroy: DsDestroyFn,
    /// Role-specific entry points.
    pub entry: RoleEntryPoints,
}

/// Entry points that depend on the role.
#[derive(Clone, Copy, Debug)]
pub enum RoleEntryPoints {
    /// State-evolution rule.
    Ode {
        /// `ds_ode_sizes`
        sizes: DsOdeSizesFn,
        /// `ds_ode_derivative`
        derivative: DsDerivativeFn,
    },
    /// Stepping algorithm.
    Solver {
        /// `ds_solver_step`
        step: DsStepFn,
    },
    /// Batch driver.
    Job {
        /// `ds_job_run`
        run: DsRunFn,
    },
}

impl RoleEntryPoints {
    /// The role these entry points implement.
    pub fn role(&self) -> DsRole {
        match self {
            Self::Ode { .. } => DsRole::Ode,
            Self::Solver { .. } => DsRole::Solver,
            Self::Job { .. } => DsRole::Job,
        }
    }
}
