//! Safe wrappers over the raw views a module receives.

use crate::errbuf::ErrorSlot;
use crate::sdk::PluginError;
use crate::types::{DsOdeView, DsProgressSink, DsSolverView};

// ── OdeView ─────────────────────────────────────────────────────

/// The ODE state a solver or driver operates on.
///
/// `t` and `x` are host memory updated in place; `eval` calls the ODE
/// module's derivative entry point directly.
#[derive(Debug)]
pub struct OdeView<'a> {
    raw: &'a mut DsOdeView,
}

impl<'a> OdeView<'a> {
    /// Wrap a raw view after checking its pointers.
    ///
    /// # Safety
    ///
    /// Non-null pointers in `raw` must be valid for the lengths it
    /// declares for `'a`, and `x` must not alias `p`.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw(raw: *mut DsOdeView) -> Result<Self, PluginError> {
        if raw.is_null() {
            return Err(PluginError::invalid("null ODE view"));
        }
        // SAFETY: non-null, valid per contract.
        let raw = unsafe { &mut *raw };
        if raw.t.is_null()
            || (raw.x_size > 0 && raw.x.is_null())
            || (raw.p_size > 0 && raw.p.is_null())
        {
            return Err(PluginError::invalid("ODE view has null storage"));
        }
        Ok(Self { raw })
    }

    /// Simulated time.
    #[allow(unsafe_code)]
    pub fn t(&self) -> f64 {
        // SAFETY: checked non-null in from_raw.
        unsafe { *self.raw.t }
    }

    /// Set simulated time.
    #[allow(unsafe_code)]
    pub fn set_t(&mut self, t: f64) {
        // SAFETY: checked non-null in from_raw.
        unsafe { *self.raw.t = t }
    }

    /// Dimension of `x`.
    pub fn dim(&self) -> usize {
        self.raw.x_size as usize
    }

    /// State vector.
    #[allow(unsafe_code)]
    pub fn x(&self) -> &[f64] {
        if self.raw.x_size == 0 {
            return &[];
        }
        // SAFETY: non-null and valid for x_size elements per from_raw.
        unsafe { std::slice::from_raw_parts(self.raw.x, self.dim()) }
    }

    /// State vector, mutable.
    #[allow(unsafe_code)]
    pub fn x_mut(&mut self) -> &mut [f64] {
        if self.raw.x_size == 0 {
            return &mut [];
        }
        // SAFETY: non-null and valid for x_size elements per from_raw.
        unsafe { std::slice::from_raw_parts_mut(self.raw.x, self.dim()) }
    }

    /// Parameter vector.
    #[allow(unsafe_code)]
    pub fn p(&self) -> &[f64] {
        if self.raw.p_size == 0 {
            return &[];
        }
        // SAFETY: non-null and valid for p_size elements per from_raw.
        unsafe { std::slice::from_raw_parts(self.raw.p, self.raw.p_size as usize) }
    }

    /// Evaluate `dx/dt` at `(t, x)` into `dxdt` using the view's `p`.
    ///
    /// `x` need not be the view's own state; solvers pass stage vectors.
    #[allow(unsafe_code)]
    pub fn eval(&self, t: f64, x: &[f64], dxdt: &mut [f64]) -> Result<(), PluginError> {
        let n = self.dim();
        if x.len() != n || dxdt.len() != n {
            return Err(PluginError::invalid(format!(
                "derivative buffers must have {n} elements, got {} and {}",
                x.len(),
                dxdt.len()
            )));
        }
        // SAFETY: lengths checked; handle and p come from the host and
        // stay valid for 'a.
        let rc = unsafe {
            (self.raw.derivative)(
                self.raw.handle,
                t,
                x.as_ptr(),
                self.raw.p,
                n as u64,
                dxdt.as_mut_ptr(),
            )
        };
        if rc == 0 {
            Ok(())
        } else {
            Err(PluginError::from_raw(
                rc,
                format!("derivative evaluation at t = {t} failed"),
            ))
        }
    }

    /// `true` if `t` and every entry of `x` are finite.
    pub fn is_finite(&self) -> bool {
        self.t().is_finite() && self.x().iter().all(|v| v.is_finite())
    }

    pub(crate) fn as_raw(&mut self) -> *mut DsOdeView {
        &mut *self.raw
    }
}

// ── SolverRef ───────────────────────────────────────────────────

/// The solver a driver was handed.
#[derive(Debug)]
pub struct SolverRef<'a> {
    raw: &'a DsSolverView,
    slot: ErrorSlot,
}

impl<'a> SolverRef<'a> {
    /// Wrap a raw solver view.
    ///
    /// # Safety
    ///
    /// `raw`, when non-null, must stay valid for `'a`.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw(raw: *const DsSolverView) -> Result<Self, PluginError> {
        if raw.is_null() {
            return Err(PluginError::invalid("null solver view"));
        }
        Ok(Self {
            // SAFETY: non-null, valid per contract.
            raw: unsafe { &*raw },
            slot: ErrorSlot::new(),
        })
    }

    /// Step `ode` once, not past `t_limit`.
    #[allow(unsafe_code)]
    pub fn step(&mut self, ode: &mut OdeView<'_>, t_limit: f64) -> Result<(), PluginError> {
        // SAFETY: handle and step come from the host; the ODE view is live.
        let rc = unsafe {
            (self.raw.step)(self.raw.handle, ode.as_raw(), t_limit, self.slot.as_raw())
        };
        if rc == 0 {
            Ok(())
        } else {
            let message = self.slot.message_or(|| format!("solver step failed ({rc})"));
            Err(PluginError::from_raw(rc, message))
        }
    }
}

// ── ProgressRef ─────────────────────────────────────────────────

/// The host's progress sink.
#[derive(Debug)]
pub struct ProgressRef<'a> {
    raw: &'a DsProgressSink,
}

impl<'a> ProgressRef<'a> {
    /// Wrap a raw sink.
    ///
    /// # Safety
    ///
    /// `raw`, when non-null, must stay valid for `'a`.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw(raw: *const DsProgressSink) -> Result<Self, PluginError> {
        if raw.is_null() {
            return Err(PluginError::invalid("null progress sink"));
        }
        // SAFETY: non-null, valid per contract.
        Ok(Self { raw: unsafe { &*raw } })
    }

    /// Report `percent`. The first value must be 0; the host rejects
    /// values above 100, regressions and anything after 100. The run
    /// must stop on error.
    #[allow(unsafe_code)]
    pub fn emit(&mut self, percent: u8) -> Result<(), PluginError> {
        // SAFETY: context and emit come from the host.
        let rc = unsafe { (self.raw.emit)(self.raw.context, u32::from(percent)) };
        if rc == 0 {
            Ok(())
        } else {
            Err(PluginError::from_raw(
                rc,
                format!("progress value {percent} rejected"),
            ))
        }
    }
}
