//! Entry-point symbol names and their function-pointer types.
//!
//! A loader resolves the common symbols for every module, then the
//! symbols of the role the module declares. Missing any of them rejects
//! the module as a whole.

use std::ffi::c_void;

use crate::types::{DsArgBlock, DsErrorBuf, DsOdeView, DsProgressSink, DsSchema, DsSolverView, DsStr};

pub use crate::types::{DsDerivativeFn, DsEmitFn, DsStepFn};

/// `u32 ds_abi_version(void)`
pub const SYM_ABI_VERSION: &str = "ds_abi_version";
/// `int32_t ds_role(void)`
pub const SYM_ROLE: &str = "ds_role";
/// `DsStr ds_name(void)`
pub const SYM_NAME: &str = "ds_name";
/// `DsSchema ds_schema(void)`
pub const SYM_SCHEMA: &str = "ds_schema";
/// `int32_t ds_construct(const DsArgBlock*, void**, DsErrorBuf*)`
pub const SYM_CONSTRUCT: &str = "ds_construct";
/// `void ds_destroy(void*)`
pub const SYM_DESTROY: &str = "ds_destroy";
/// `int32_t ds_ode_sizes(const void*, uint64_t*, uint64_t*)`
pub const SYM_ODE_SIZES: &str = "ds_ode_sizes";
/// `int32_t ds_ode_derivative(const void*, double, const double*, const double*, uint64_t, double*)`
pub const SYM_ODE_DERIVATIVE: &str = "ds_ode_derivative";
/// `int32_t ds_solver_step(void*, DsOdeView*, double, DsErrorBuf*)`
pub const SYM_SOLVER_STEP: &str = "ds_solver_step";
/// `int32_t ds_job_run(void*, DsOdeView*, const DsSolverView*, const DsProgressSink*, DsErrorBuf*)`
pub const SYM_JOB_RUN: &str = "ds_job_run";

/// `ds_abi_version`
pub type DsAbiVersionFn = unsafe extern "C" fn() -> u32;
/// `ds_role`
pub type DsRoleFn = unsafe extern "C" fn() -> i32;
/// `ds_name`
pub type DsNameFn = unsafe extern "C" fn() -> DsStr;
/// `ds_schema`
pub type DsSchemaFn = unsafe extern "C" fn() -> DsSchema;
/// `ds_construct`: on success stores a non-null handle in `out_handle`.
pub type DsConstructFn = unsafe extern "C" fn(
    args: *const DsArgBlock,
    out_handle: *mut *mut c_void,
    err: *mut DsErrorBuf,
) -> i32;
/// `ds_destroy`: release a handle from `ds_construct`. Null is a no-op.
pub type DsDestroyFn = unsafe extern "C" fn(handle: *mut c_void);
/// `ds_ode_sizes`
pub type DsOdeSizesFn =
    unsafe extern "C" fn(handle: *const c_void, out_x: *mut u64, out_p: *mut u64) -> i32;
/// `ds_job_run`
pub type DsRunFn = unsafe extern "C" fn(
    handle: *mut c_void,
    ode: *mut DsOdeView,
    solver: *const DsSolverView,
    progress: *const DsProgressSink,
    err: *mut DsErrorBuf,
) -> i32;
