//! Driver instances and the progress bridge.
//!
//! A [`Job`] hands its module raw views of the ODE and solver plus a
//! progress sink whose callback lands in [`ProgressBridge`]. The bridge
//! enforces the protocol (starts at 0, values in `0..=100`, never
//! decreasing, nothing after 100) before anything reaches the caller's
//! [`ProgressSink`].

use std::ffi::c_void;
use std::fmt;

use dynsys_abi::guard::guard;
use dynsys_abi::symbols::DsRunFn;
use dynsys_abi::{DsProgressSink, DsSolverView, DsStatus, ErrorSlot, RoleEntryPoints};
use dynsys_core::{ArgRecord, ConstructionError, RunError};
use tracing::{debug, info, warn};

use crate::error::run_error;
use crate::instance::Instance;
use crate::ode::Ode;
use crate::progress::ProgressSink;
use crate::solver::Solver;

/// A single-use batch driver.
///
/// [`run()`](Self::run) consumes the job: one run per instance.
pub struct Job {
    instance: Instance,
    arguments: ArgRecord,
    run: DsRunFn,
}

impl Job {
    pub(crate) fn from_instance(
        instance: Instance,
        arguments: ArgRecord,
    ) -> Result<Self, ConstructionError> {
        let RoleEntryPoints::Job { run } = instance.module().table().entry else {
            return Err(ConstructionError {
                module: instance.name().to_owned(),
                reason: "module has no job entry points".into(),
            });
        };
        Ok(Self {
            instance,
            arguments,
            run,
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

    /// Drive `solver` over `ode` to completion, reporting to `progress`.
    ///
    /// Blocks for the whole computation. On error the ODE keeps
    /// whatever state the run reached and any artifact is left as
    /// written; a run that returns `Ok` has reported `100`.
    ///
    /// # Errors
    ///
    /// - [`RunError::Rejected`] if the module refused the run's inputs.
    /// - [`RunError::Numerical`] if a step produced a non-finite state.
    /// - [`RunError::StepLimit`] if stepping stalled or the budget ran out.
    /// - [`RunError::Io`] if the artifact could not be written.
    /// - [`RunError::Protocol`] if the module misreported progress.
    #[allow(unsafe_code)]
    pub fn run(
        self,
        ode: &mut Ode,
        solver: &mut Solver,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), RunError> {
        let name = self.name().to_owned();
        info!(job = %name, ode = ode.name(), solver = solver.name(), "run started");

        let mut bridge = ProgressBridge::new(&name, progress);
        let sink = DsProgressSink {
            context: (&mut bridge as *mut ProgressBridge<'_>).cast::<c_void>(),
            emit: bridge_emit,
        };
        let (solver_handle, step) = solver.view_parts();
        let solver_view = DsSolverView {
            handle: solver_handle,
            step,
        };
        let mut ode_view = ode.view();
        let mut slot = ErrorSlot::new();
        // SAFETY: every view points at state exclusively borrowed for
        // the duration of the call; the bridge outlives it.
        let rc = unsafe {
            (self.run)(
                self.instance.as_ptr(),
                &mut ode_view,
                &solver_view,
                &sink,
                slot.as_raw(),
            )
        };

        let result = if rc == 0 {
            match bridge.last {
                Some(100) => Ok(()),
                last => Err(RunError::Protocol {
                    reason: format!("run finished without reporting 100 (last: {last:?})"),
                }),
            }
        } else if let Some(reason) = bridge.violation.take() {
            Err(RunError::Protocol { reason })
        } else {
            Err(run_error(
                rc,
                slot.message_or(|| format!("run returned status {rc}")),
            ))
        };

        match &result {
            Ok(()) => info!(job = %name, t = ode.t(), "run completed"),
            Err(e) => warn!(job = %name, t = ode.t(), last = ?bridge.last, error = %e, "run failed"),
        }
        result
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name())
            .field("arguments", &self.arguments)
            .finish()
    }
}

// ── Progress bridge ─────────────────────────────────────────────

struct ProgressBridge<'a> {
    job: &'a str,
    sink: &'a mut dyn ProgressSink,
    last: Option<u8>,
    violation: Option<String>,
}

impl<'a> ProgressBridge<'a> {
    fn new(job: &'a str, sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            job,
            sink,
            last: None,
            violation: None,
        }
    }

    fn accept(&mut self, percent: u32) -> Result<(), String> {
        if percent > 100 {
            return Err(format!("progress value {percent} exceeds 100"));
        }
        let percent = percent as u8;
        match self.last {
            None if percent != 0 => {
                return Err(format!("progress must start at 0, got {percent}"));
            }
            Some(100) => return Err("progress reported after 100".to_string()),
            Some(last) if percent < last => {
                return Err(format!("progress went backwards from {last} to {percent}"));
            }
            _ => {}
        }
        self.last = Some(percent);
        debug!(job = self.job, percent, "progress");
        self.sink.emit(percent);
        Ok(())
    }
}

#[allow(unsafe_code)]
unsafe extern "C" fn bridge_emit(context: *mut c_void, percent: u32) -> i32 {
    if context.is_null() {
        return DsStatus::InvalidHandle as i32;
    }
    let body = || {
        // SAFETY: context was set to &mut ProgressBridge in Job::run
        // and is only used for the duration of that call.
        let bridge = unsafe { &mut *context.cast::<ProgressBridge<'_>>() };
        match bridge.accept(percent) {
            Ok(()) => DsStatus::Ok as i32,
            Err(reason) => {
                bridge.violation.get_or_insert(reason);
                DsStatus::InvalidArgument as i32
            }
        }
    };
    // SAFETY: a null error buffer is allowed.
    unsafe { guard(std::ptr::null_mut(), body) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingProgress;

    #[test]
    fn bridge_rejects_out_of_range_and_regressions() {
        let mut sink = RecordingProgress::new();
        let mut bridge = ProgressBridge::new("portrait", &mut sink);
        assert!(bridge.accept(0).is_ok());
        assert!(bridge.accept(5).is_ok());
        assert!(bridge.accept(5).is_ok());
        assert!(bridge.accept(4).is_err());
        assert!(bridge.accept(101).is_err());
        assert_eq!(bridge.last, Some(5));
        assert_eq!(sink.values(), [0, 5, 5]);
    }

    #[test]
    fn bridge_requires_zero_first_and_a_single_hundred() {
        let mut sink = RecordingProgress::new();
        let mut bridge = ProgressBridge::new("portrait", &mut sink);
        assert!(bridge
            .accept(3)
            .unwrap_err()
            .contains("must start at 0"));
        assert!(bridge.accept(0).is_ok());
        assert!(bridge.accept(100).is_ok());
        assert!(bridge.accept(100).unwrap_err().contains("after 100"));
        assert_eq!(sink.values(), [0, 100]);
    }

    #[test]
    #[allow(unsafe_code)]
    fn trampoline_records_violation() {
        let mut sink = RecordingProgress::new();
        let mut bridge = ProgressBridge::new("portrait", &mut sink);
        let ctx = (&mut bridge as *mut ProgressBridge<'_>).cast::<c_void>();
        // SAFETY: ctx points at a live bridge.
        unsafe {
            assert_eq!(bridge_emit(ctx, 0), 0);
            assert_eq!(bridge_emit(ctx, 7), 0);
            assert_eq!(bridge_emit(ctx, 250), DsStatus::InvalidArgument as i32);
        }
        assert!(bridge.violation.unwrap().contains("exceeds 100"));
        assert_eq!(sink.values(), [0, 7]);
    }
}
