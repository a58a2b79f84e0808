//! `repr(C)` types crossing the module boundary.
//!
//! Every field is fixed-width or pointer-sized. Enum-like fields are
//! carried as raw `i32` so an out-of-range value from foreign code is
//! an error instead of undefined behavior.

use std::ffi::c_void;

/// Version of the calling convention described by this crate.
pub const DS_ABI_VERSION: u32 = 1;

// ── Enums ───────────────────────────────────────────────────────

/// Role declared by `ds_role`.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DsRole {
    /// State-evolution rule.
    Ode = 1,
    /// Stepping algorithm.
    Solver = 2,
    /// Batch driver.
    Job = 3,
}

impl DsRole {
    /// Decode a raw role value.
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Ode),
            2 => Some(Self::Solver),
            3 => Some(Self::Job),
            _ => None,
        }
    }
}

/// Type tag of a schema entry or argument value.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DsArgKind {
    /// `i64` payload in `DsArgValue::integer`.
    Integer = 1,
    /// `f64` payload in `DsArgValue::real`.
    Real = 2,
    /// UTF-8 payload in `DsArgValue::text`.
    Text = 3,
}

impl DsArgKind {
    /// Decode a raw kind value.
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Integer),
            2 => Some(Self::Real),
            3 => Some(Self::Text),
            _ => None,
        }
    }
}

// ── Strings ─────────────────────────────────────────────────────

/// Borrowed UTF-8 string: pointer plus byte length, not NUL-terminated.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DsStr {
    /// First byte. May be null when `len == 0`.
    pub ptr: *const u8,
    /// Length in bytes.
    pub len: usize,
}

// SAFETY: a DsStr is a read-only view. The ones a module publishes point
// at 'static data; the ones a host passes in outlive the call.
#[allow(unsafe_code)]
unsafe impl Send for DsStr {}
#[allow(unsafe_code)]
unsafe impl Sync for DsStr {}

impl DsStr {
    /// View a `'static` string.
    pub const fn from_static(s: &'static str) -> Self {
        Self {
            ptr: s.as_ptr(),
            len: s.len(),
        }
    }

    /// View a borrowed string. The result must not outlive `s`.
    pub fn borrowed(s: &str) -> Self {
        Self {
            ptr: s.as_ptr(),
            len: s.len(),
        }
    }

    /// The empty string.
    pub const fn empty() -> Self {
        Self {
            ptr: std::ptr::null(),
            len: 0,
        }
    }

    /// Decode as UTF-8. Returns `None` for a null pointer with non-zero
    /// length or invalid UTF-8.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `len` bytes for the lifetime `'a`.
    #[allow(unsafe_code)]
    pub unsafe fn as_str<'a>(&self) -> Option<&'a str> {
        if self.len == 0 {
            return Some("");
        }
        if self.ptr.is_null() {
            return None;
        }
        // SAFETY: non-null and readable for len bytes per the contract.
        let bytes = unsafe { std::slice::from_raw_parts(self.ptr, self.len) };
        std::str::from_utf8(bytes).ok()
    }
}

// ── Schema ──────────────────────────────────────────────────────

/// One declared argument: name and raw [`DsArgKind`].
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DsArgSpec {
    /// Argument name.
    pub name: DsStr,
    /// Raw [`DsArgKind`].
    pub kind: i32,
}

impl DsArgSpec {
    /// An `integer` entry.
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name: DsStr::from_static(name),
            kind: DsArgKind::Integer as i32,
        }
    }

    /// A `real` entry.
    pub const fn real(name: &'static str) -> Self {
        Self {
            name: DsStr::from_static(name),
            kind: DsArgKind::Real as i32,
        }
    }

    /// A `text` entry.
    pub const fn text(name: &'static str) -> Self {
        Self {
            name: DsStr::from_static(name),
            kind: DsArgKind::Text as i32,
        }
    }
}

/// Ordered schema returned by `ds_schema`. Points at `'static` data.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct DsSchema {
    /// First entry. May be null when `len == 0`.
    pub specs: *const DsArgSpec,
    /// Number of entries.
    pub len: usize,
}

// ── Arguments ───────────────────────────────────────────────────

/// One validated argument. Only the field selected by `kind` is
/// meaningful; the others are zeroed.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct DsArgValue {
    /// Raw [`DsArgKind`].
    pub kind: i32,
    /// Integer payload.
    pub integer: i64,
    /// Real payload.
    pub real: f64,
    /// Text payload, valid for the duration of `ds_construct`.
    pub text: DsStr,
}

impl DsArgValue {
    /// An integer value.
    pub fn integer(v: i64) -> Self {
        Self {
            kind: DsArgKind::Integer as i32,
            integer: v,
            real: 0.0,
            text: DsStr::empty(),
        }
    }

    /// A real value.
    pub fn real(v: f64) -> Self {
        Self {
            kind: DsArgKind::Real as i32,
            integer: 0,
            real: v,
            text: DsStr::empty(),
        }
    }

    /// A text value borrowing `v`.
    pub fn text(v: &str) -> Self {
        Self {
            kind: DsArgKind::Text as i32,
            integer: 0,
            real: 0.0,
            text: DsStr::borrowed(v),
        }
    }
}

/// Argument block passed to `ds_construct`: one value per schema entry,
/// in schema order.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct DsArgBlock {
    /// First value. May be null when `len == 0`.
    pub values: *const DsArgValue,
    /// Number of values.
    pub len: usize,
}

// ── Error buffer ────────────────────────────────────────────────

/// Caller-owned buffer a callee writes a UTF-8 diagnostic into.
#[repr(C)]
#[derive(Debug)]
pub struct DsErrorBuf {
    /// Storage. May be null, in which case messages are dropped.
    pub ptr: *mut u8,
    /// Capacity in bytes.
    pub cap: usize,
    /// Bytes written by the callee.
    pub len: usize,
}

// ── Views ───────────────────────────────────────────────────────

/// `ds_ode_derivative`: write `dx/dt` at `(t, x)` into `dxdt`.
pub type DsDerivativeFn = unsafe extern "C" fn(
    handle: *const c_void,
    t: f64,
    x: *const f64,
    p: *const f64,
    n: u64,
    dxdt: *mut f64,
) -> i32;

/// `ds_solver_step`: advance the viewed ODE by one step, not past `t_limit`.
pub type DsStepFn = unsafe extern "C" fn(
    handle: *mut c_void,
    ode: *mut DsOdeView,
    t_limit: f64,
    err: *mut DsErrorBuf,
) -> i32;

/// Progress callback: report `percent` in `0..=100`.
pub type DsEmitFn = unsafe extern "C" fn(context: *mut c_void, percent: u32) -> i32;

/// Mutable view of an ODE state handed to solvers and drivers.
///
/// `t` and `x` are host-owned and updated in place. `derivative`
/// evaluates the rule with `handle` as first argument; callers never go
/// through any other dispatch.
#[repr(C)]
#[derive(Debug)]
pub struct DsOdeView {
    /// ODE instance handle, first argument of `derivative`.
    pub handle: *const c_void,
    /// The ODE module's derivative entry point.
    pub derivative: DsDerivativeFn,
    /// Simulated time.
    pub t: *mut f64,
    /// State vector, `x_size` elements.
    pub x: *mut f64,
    /// Length of `x`.
    pub x_size: u64,
    /// Parameter vector, `p_size` elements.
    pub p: *const f64,
    /// Length of `p`.
    pub p_size: u64,
}

/// A solver as seen by a driver.
#[repr(C)]
#[derive(Debug)]
pub struct DsSolverView {
    /// Solver instance handle.
    pub handle: *mut c_void,
    /// The solver module's step entry point.
    pub step: DsStepFn,
}

/// Progress sink handed to drivers.
#[repr(C)]
#[derive(Debug)]
pub struct DsProgressSink {
    /// Opaque host context, first argument of `emit`.
    pub context: *mut c_void,
    /// Host callback. A non-zero return aborts the run.
    pub emit: DsEmitFn,
}

// ── Layout ──────────────────────────────────────────────────────

#[cfg(target_pointer_width = "64")]
const _: () = {
    use std::mem::{align_of, size_of};
    assert!(size_of::<DsStr>() == 16);
    assert!(size_of::<DsArgSpec>() == 24);
    assert!(align_of::<DsArgValue>() == 8);
    assert!(size_of::<DsArgValue>() == 40);
    assert!(size_of::<DsSchema>() == 16);
    assert!(size_of::<DsArgBlock>() == 16);
    assert!(size_of::<DsErrorBuf>() == 24);
    assert!(size_of::<DsOdeView>() == 56);
    assert!(size_of::<DsSolverView>() == 16);
    assert!(size_of::<DsProgressSink>() == 16);
};
