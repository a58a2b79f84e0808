//! Generic `extern "C"` adapters from SDK traits to entry points.
//!
//! Each function is monomorphized per plugin type. The export macros
//! wrap them in `#[no_mangle]` symbols; [`ModuleTable::ode`] and its
//! siblings collect them into an in-process table.

use std::ffi::c_void;

use crate::errbuf::write_error;
use crate::guard::{guard, guard_void};
use crate::sdk::{
    Arguments, Construct, JobPlugin, OdePlugin, OdeView, PluginError, ProgressRef, SolverPlugin,
    SolverRef,
};
use crate::status::DsStatus;
use crate::table::{ModuleTable, RoleEntryPoints};
use crate::types::{
    DsArgBlock, DsArgValue, DsErrorBuf, DsOdeView, DsProgressSink, DsRole, DsSchema, DsSolverView,
    DsStr, DS_ABI_VERSION,
};

// ── Common ──────────────────────────────────────────────────────

/// `ds_abi_version`
pub extern "C" fn abi_version() -> u32 {
    DS_ABI_VERSION
}

/// `ds_role` for ODE modules.
pub extern "C" fn role_ode() -> i32 {
    DsRole::Ode as i32
}

/// `ds_role` for solver modules.
pub extern "C" fn role_solver() -> i32 {
    DsRole::Solver as i32
}

/// `ds_role` for job modules.
pub extern "C" fn role_job() -> i32 {
    DsRole::Job as i32
}

/// `ds_name`
pub extern "C" fn name<T: Construct>() -> DsStr {
    DsStr::from_static(T::NAME)
}

/// `ds_schema`
pub extern "C" fn schema<T: Construct>() -> DsSchema {
    DsSchema {
        specs: T::SCHEMA.as_ptr(),
        len: T::SCHEMA.len(),
    }
}

/// `ds_construct`: check the block against `T::SCHEMA`, then box the
/// instance.
///
/// # Safety
///
/// `args` must point at a block whose values are valid for the call;
/// `out_handle` must be writable; `err` per [`write_error`].
#[allow(unsafe_code)]
pub unsafe extern "C" fn construct<T: Construct>(
    args: *const DsArgBlock,
    out_handle: *mut *mut c_void,
    err: *mut DsErrorBuf,
) -> i32 {
    let body = || {
        if args.is_null() || out_handle.is_null() {
            return fail(err, PluginError::invalid("null argument block or handle slot"));
        }
        // SAFETY: non-null, valid per contract.
        let block = unsafe { &*args };
        let values: &[DsArgValue] = if block.len == 0 {
            &[]
        } else if block.values.is_null() {
            return fail(err, PluginError::invalid("null argument values"));
        } else {
            // SAFETY: non-null, valid for len values per contract.
            unsafe { std::slice::from_raw_parts(block.values, block.len) }
        };
        if values.len() != T::SCHEMA.len() {
            return fail(
                err,
                PluginError::invalid(format!(
                    "{} expects {} arguments, got {}",
                    T::NAME,
                    T::SCHEMA.len(),
                    values.len()
                )),
            );
        }
        for (index, (spec, value)) in T::SCHEMA.iter().zip(values).enumerate() {
            if spec.kind != value.kind {
                return fail(
                    err,
                    PluginError::invalid(format!(
                        "argument {index} has kind {}, declared {}",
                        value.kind, spec.kind
                    )),
                );
            }
        }
        match T::construct(&Arguments::new(T::SCHEMA, values)) {
            Ok(instance) => {
                // SAFETY: out_handle checked non-null.
                unsafe { *out_handle = Box::into_raw(Box::new(instance)).cast() };
                DsStatus::Ok as i32
            }
            Err(e) => fail(err, e),
        }
    };
    // SAFETY: err forwarded under the same contract.
    unsafe { guard(err, body) }
}

/// `ds_destroy`
///
/// # Safety
///
/// `handle` must be null or a value produced by `construct::<T>` that
/// has not been destroyed.
#[allow(unsafe_code)]
pub unsafe extern "C" fn destroy<T: Construct>(handle: *mut c_void) {
    if handle.is_null() {
        return;
    }
    // SAFETY: handle came from Box::into_raw in construct::<T>.
    guard_void(|| drop(unsafe { Box::from_raw(handle.cast::<T>()) }));
}

// ── ODE ─────────────────────────────────────────────────────────

/// `ds_ode_sizes`
///
/// # Safety
///
/// `handle` must come from `construct::<T>`; outputs must be writable.
#[allow(unsafe_code)]
pub unsafe extern "C" fn ode_sizes<T: OdePlugin>(
    handle: *const c_void,
    out_x: *mut u64,
    out_p: *mut u64,
) -> i32 {
    if handle.is_null() {
        return DsStatus::InvalidHandle as i32;
    }
    if out_x.is_null() || out_p.is_null() {
        return DsStatus::InvalidArgument as i32;
    }
    let body = || {
        // SAFETY: handle came from construct::<T>.
        let ode = unsafe { &*handle.cast::<T>() };
        // SAFETY: checked non-null above.
        unsafe {
            *out_x = ode.x_size() as u64;
            *out_p = ode.p_size() as u64;
        }
        DsStatus::Ok as i32
    };
    // SAFETY: a null error buffer is allowed.
    unsafe { guard(std::ptr::null_mut(), body) }
}

/// `ds_ode_derivative`
///
/// # Safety
///
/// `handle` must come from `construct::<T>`; `x` and `dxdt` must hold
/// `n` elements and `p` must hold `p_size` elements; `dxdt` must not
/// alias `x` or `p`.
#[allow(unsafe_code)]
pub unsafe extern "C" fn ode_derivative<T: OdePlugin>(
    handle: *const c_void,
    t: f64,
    x: *const f64,
    p: *const f64,
    n: u64,
    dxdt: *mut f64,
) -> i32 {
    if handle.is_null() {
        return DsStatus::InvalidHandle as i32;
    }
    let body = || {
        // SAFETY: handle came from construct::<T>.
        let ode = unsafe { &*handle.cast::<T>() };
        let n = n as usize;
        let p_size = ode.p_size();
        if n != ode.x_size()
            || (n > 0 && (x.is_null() || dxdt.is_null()))
            || (p_size > 0 && p.is_null())
        {
            return DsStatus::InvalidArgument as i32;
        }
        // SAFETY: lengths and non-null checked; caller guarantees validity.
        let (x, p, dxdt) = unsafe {
            (
                slice_or_empty(x, n),
                slice_or_empty(p, p_size),
                slice_or_empty_mut(dxdt, n),
            )
        };
        ode.derivative(t, x, p, dxdt);
        DsStatus::Ok as i32
    };
    // SAFETY: a null error buffer is allowed.
    unsafe { guard(std::ptr::null_mut(), body) }
}

// ── Solver ──────────────────────────────────────────────────────

/// `ds_solver_step`: run one step, then refuse a non-finite result.
///
/// # Safety
///
/// `handle` must come from `construct::<S>`; `ode` must be a valid view
/// for the duration of the call; `err` per [`write_error`].
#[allow(unsafe_code)]
pub unsafe extern "C" fn solver_step<S: SolverPlugin>(
    handle: *mut c_void,
    ode: *mut DsOdeView,
    t_limit: f64,
    err: *mut DsErrorBuf,
) -> i32 {
    if handle.is_null() {
        return fail(err, PluginError::new(DsStatus::InvalidHandle, "null solver handle"));
    }
    let body = || {
        // SAFETY: handle came from construct::<S>; the host never shares it.
        let solver = unsafe { &mut *handle.cast::<S>() };
        // SAFETY: forwarded caller contract.
        let mut view = match unsafe { OdeView::from_raw(ode) } {
            Ok(view) => view,
            Err(e) => return fail(err, e),
        };
        if t_limit.is_nan() {
            return fail(err, PluginError::invalid("step limit is NaN"));
        }
        let t0 = view.t();
        if let Err(e) = solver.step(&mut view, t_limit) {
            return fail(err, e);
        }
        if !view.is_finite() {
            return fail(
                err,
                PluginError::numerical(format!(
                    "{} produced a non-finite state stepping from t = {t0}",
                    S::NAME
                )),
            );
        }
        DsStatus::Ok as i32
    };
    // SAFETY: err forwarded under the same contract.
    unsafe { guard(err, body) }
}

// ── Job ─────────────────────────────────────────────────────────

/// `ds_job_run`
///
/// # Safety
///
/// `handle` must come from `construct::<J>`; the views must be valid
/// for the duration of the call; `err` per [`write_error`].
#[allow(unsafe_code)]
pub unsafe extern "C" fn job_run<J: JobPlugin>(
    handle: *mut c_void,
    ode: *mut DsOdeView,
    solver: *const DsSolverView,
    progress: *const DsProgressSink,
    err: *mut DsErrorBuf,
) -> i32 {
    if handle.is_null() {
        return fail(err, PluginError::new(DsStatus::InvalidHandle, "null job handle"));
    }
    let body = || {
        // SAFETY: handle came from construct::<J>; the host never shares it.
        let job = unsafe { &mut *handle.cast::<J>() };
        // SAFETY: forwarded caller contract for all three views.
        let views = unsafe {
            OdeView::from_raw(ode).and_then(|ode| {
                let solver = SolverRef::from_raw(solver)?;
                let progress = ProgressRef::from_raw(progress)?;
                Ok((ode, solver, progress))
            })
        };
        let (mut ode, mut solver, mut progress) = match views {
            Ok(views) => views,
            Err(e) => return fail(err, e),
        };
        match job.run(&mut ode, &mut solver, &mut progress) {
            Ok(()) => DsStatus::Ok as i32,
            Err(e) => fail(err, e),
        }
    };
    // SAFETY: err forwarded under the same contract.
    unsafe { guard(err, body) }
}

// ── Tables ──────────────────────────────────────────────────────

impl ModuleTable {
    /// In-process table for an ODE plugin type.
    pub fn ode<T: OdePlugin>() -> Self {
        Self {
            abi_version,
            role: role_ode,
            name: name::<T>,
            schema: schema::<T>,
            construct: construct::<T>,
            destroy: destroy::<T>,
            entry: RoleEntryPoints::Ode {
                sizes: ode_sizes::<T>,
                derivative: ode_derivative::<T>,
            },
        }
    }

    /// In-process table for a solver plugin type.
    pub fn solver<S: SolverPlugin>() -> Self {
        Self {
            abi_version,
            role: role_solver,
            name: name::<S>,
            schema: schema::<S>,
            construct: construct::<S>,
            destroy: destroy::<S>,
            entry: RoleEntryPoints::Solver {
                step: solver_step::<S>,
            },
        }
    }

    /// In-process table for a job plugin type.
    pub fn job<J: JobPlugin>() -> Self {
        Self {
            abi_version,
            role: role_job,
            name: name::<J>,
            schema: schema::<J>,
            construct: construct::<J>,
            destroy: destroy::<J>,
            entry: RoleEntryPoints::Job { run: job_run::<J> },
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────

#[allow(unsafe_code)]
fn fail(err: *mut DsErrorBuf, e: PluginError) -> i32 {
    // SAFETY: every caller forwards an err pointer under the
    // write_error contract.
    unsafe { write_error(err, e.message()) };
    e.code()
}

#[allow(unsafe_code)]
unsafe fn slice_or_empty<'a>(ptr: *const f64, len: usize) -> &'a [f64] {
    if len == 0 {
        &[]
    } else {
        // SAFETY: caller guarantees ptr is valid for len elements.
        unsafe { std::slice::from_raw_parts(ptr, len) }
    }
}

#[allow(unsafe_code)]
unsafe fn slice_or_empty_mut<'a>(ptr: *mut f64, len: usize) -> &'a mut [f64] {
    if len == 0 {
        &mut []
    } else {
        // SAFETY: caller guarantees ptr is valid and unaliased for len elements.
        unsafe { std::slice::from_raw_parts_mut(ptr, len) }
    }
}
