//! State-evolution instances.

use std::fmt;

use dynsys_abi::types::DsDerivativeFn;
use dynsys_abi::{DsOdeView, RoleEntryPoints};
use dynsys_core::{ArgRecord, ArgumentError, ConstructionError, RunError};

use crate::error::run_error;
use crate::instance::Instance;

/// An ODE: time `t`, state `x`, parameters `p`, and the module's
/// derivative rule.
///
/// `t`, `x` and `p` live on the host side; solvers and drivers receive
/// a view of them. `x_size` and `p_size` are fixed at construction.
/// Every setter replaces all-or-nothing: a wrong length leaves the
/// state untouched.
pub struct Ode {
    instance: Instance,
    arguments: ArgRecord,
    derivative: DsDerivativeFn,
    t: f64,
    x: Vec<f64>,
    p: Vec<f64>,
}

impl Ode {
    #[allow(unsafe_code)]
    pub(crate) fn from_instance(
        instance: Instance,
        arguments: ArgRecord,
    ) -> Result<Self, ConstructionError> {
        let rejected = |reason: String| ConstructionError {
            module: instance.name().to_owned(),
            reason,
        };
        let RoleEntryPoints::Ode { sizes, derivative } = instance.module().table().entry else {
            return Err(rejected("module has no ODE entry points".into()));
        };
        let (mut x_size, mut p_size) = (0u64, 0u64);
        // SAFETY: live handle from this module; outputs are locals.
        let rc = unsafe { sizes(instance.as_ptr(), &mut x_size, &mut p_size) };
        if rc != 0 {
            return Err(rejected(format!("ds_ode_sizes returned status {rc}")));
        }
        let x_size = usize::try_from(x_size).map_err(|_| rejected("x_size overflows".into()))?;
        let p_size = usize::try_from(p_size).map_err(|_| rejected("p_size overflows".into()))?;
        Ok(Self {
            instance,
            arguments,
            derivative,
            t: 0.0,
            x: vec![0.0; x_size],
            p: vec![0.0; p_size],
        })
    }

    /// Module name.
    pub fn name(&self) -> &str {
        self.instance.name()
    }

    /// Validated construction arguments, in schema order.
    pub fn arguments(&self) -> &ArgRecord {
        &self.arguments
    }

    /// Length of `x`.
    pub fn x_size(&self) -> usize {
        self.x.len()
    }

    /// Length of `p`.
    pub fn p_size(&self) -> usize {
        self.p.len()
    }

    /// Simulated time.
    pub fn t(&self) -> f64 {
        self.t
    }

    /// Set simulated time.
    pub fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    /// State vector.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Replace the state vector. `x.len()` must equal [`x_size()`](Self::x_size).
    pub fn set_x(&mut self, x: &[f64]) -> Result<(), ArgumentError> {
        replace("x", &mut self.x, x)
    }

    /// Set one component of the state vector.
    pub fn set_x_at(&mut self, index: usize, value: f64) -> Result<(), ArgumentError> {
        replace_at("x", &mut self.x, index, value)
    }

    /// Parameter vector.
    pub fn p(&self) -> &[f64] {
        &self.p
    }

    /// Replace the parameter vector. `p.len()` must equal [`p_size()`](Self::p_size).
    pub fn set_p(&mut self, p: &[f64]) -> Result<(), ArgumentError> {
        replace("p", &mut self.p, p)
    }

    /// Set one component of the parameter vector.
    pub fn set_p_at(&mut self, index: usize, value: f64) -> Result<(), ArgumentError> {
        replace_at("p", &mut self.p, index, value)
    }

    /// Evaluate `dx/dt` at `(t, x)` with the current parameters.
    ///
    /// Does not touch the stored state.
    #[allow(unsafe_code)]
    pub fn evaluate(&self, t: f64, x: &[f64]) -> Result<Vec<f64>, RunError> {
        if x.len() != self.x.len() {
            let e = ArgumentError::Length {
                what: "x",
                expected: self.x.len(),
                actual: x.len(),
            };
            return Err(RunError::Rejected {
                reason: e.to_string(),
            });
        }
        let mut dxdt = vec![0.0; x.len()];
        // SAFETY: x, p and dxdt hold the sizes the module reported and
        // dxdt is a fresh buffer.
        let rc = unsafe {
            (self.derivative)(
                self.instance.as_ptr(),
                t,
                x.as_ptr(),
                self.p.as_ptr(),
                x.len() as u64,
                dxdt.as_mut_ptr(),
            )
        };
        if rc != 0 {
            return Err(run_error(
                rc,
                format!("{} failed to evaluate its derivative at t = {t}", self.name()),
            ));
        }
        Ok(dxdt)
    }

    /// Raw view over this ODE for one call into a solver or job.
    ///
    /// The view borrows `self` mutably through raw pointers; it must
    /// not outlive the call it is passed to.
    pub(crate) fn view(&mut self) -> DsOdeView {
        DsOdeView {
            handle: self.instance.as_ptr(),
            derivative: self.derivative,
            t: &mut self.t,
            x: self.x.as_mut_ptr(),
            x_size: self.x.len() as u64,
            p: self.p.as_ptr(),
            p_size: self.p.len() as u64,
        }
    }

    /// `true` if `t` and every entry of `x` are finite.
    pub fn is_finite(&self) -> bool {
        self.t.is_finite() && self.x.iter().all(|v| v.is_finite())
    }
}

impl fmt::Debug for Ode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ode")
            .field("name", &self.name())
            .field("t", &self.t)
            .field("x", &self.x)
            .field("p", &self.p)
            .finish()
    }
}

fn replace(what: &'static str, dst: &mut [f64], src: &[f64]) -> Result<(), ArgumentError> {
    if src.len() != dst.len() {
        return Err(ArgumentError::Length {
            what,
            expected: dst.len(),
            actual: src.len(),
        });
    }
    dst.copy_from_slice(src);
    Ok(())
}

fn replace_at(
    what: &'static str,
    dst: &mut [f64],
    index: usize,
    value: f64,
) -> Result<(), ArgumentError> {
    let len = dst.len();
    let slot = dst
        .get_mut(index)
        .ok_or(ArgumentError::Index { what, index, len })?;
    *slot = value;
    Ok(())
}
