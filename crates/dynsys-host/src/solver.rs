//! Stepper instances.

use std::fmt;

use dynsys_abi::types::DsStepFn;
use dynsys_abi::{ErrorSlot, RoleEntryPoints};
use dynsys_core::{ArgRecord, ConstructionError, RunError};
use tracing::warn;

use crate::error::run_error;
use crate::instance::Instance;
use crate::ode::Ode;

/// A stepping algorithm bound to its construction arguments.
///
/// Working buffers live inside the module and persist across steps.
pub struct Solver {
    instance: Instance,
    arguments: ArgRecord,
    step: DsStepFn,
    slot: ErrorSlot,
}

impl Solver {
    pub(crate) fn from_instance(
        instance: Instance,
        arguments: ArgRecord,
    ) -> Result<Self, ConstructionError> {
        let RoleEntryPoints::Solver { step } = instance.module().table().entry else {
            return Err(ConstructionError {
                module: instance.name().to_owned(),
                reason: "module has no solver entry points".into(),
            });
        };
        Ok(Self {
            instance,
            arguments,
            step,
            slot: ErrorSlot::new(),
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

    /// Advance `ode` by one step bounded only by the step ceiling.
    pub fn step(&mut self, ode: &mut Ode) -> Result<(), RunError> {
        self.step_towards(ode, f64::INFINITY)
    }

    /// Advance `ode` by one step, landing no later than `t_limit`.
    ///
    /// A no-op when `ode.t() >= t_limit`. On error the state may hold
    /// the failed step's non-finite values.
    #[allow(unsafe_code)]
    pub fn step_towards(&mut self, ode: &mut Ode, t_limit: f64) -> Result<(), RunError> {
        let mut view = ode.view();
        // SAFETY: the view points into `ode`, exclusively borrowed for
        // the call; the handle belongs to this solver.
        let rc = unsafe {
            (self.step)(self.instance.as_ptr(), &mut view, t_limit, self.slot.as_raw())
        };
        if rc != 0 {
            let reason = self.slot.message_or(|| format!("step returned status {rc}"));
            warn!(solver = self.name(), ode = ode.name(), t = ode.t(), %reason, "step failed");
            return Err(run_error(rc, reason));
        }
        Ok(())
    }

    pub(crate) fn view_parts(&self) -> (*mut std::ffi::c_void, DsStepFn) {
        (self.instance.as_ptr(), self.step)
    }
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("name", &self.name())
            .field("arguments", &self.arguments)
            .finish()
    }
}
