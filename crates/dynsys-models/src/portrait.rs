//! The `portrait` driver: integrate to `t_end`, sampling the state every
//! `t_step` into a whitespace-separated text file.
//!
//! ```text
//! t x[0] x[1]
//! 0.000000 0.000000 1.000000
//! 0.100000 0.099833 0.995004
//! ...
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use dynsys_abi::sdk::{
    Arguments, Construct, JobPlugin, OdeView, PluginError, ProgressRef, SolverRef,
};
use dynsys_abi::DsArgSpec;

/// Total solver calls allowed in one run.
pub const MAX_STEPS: u64 = 1_000_000_000;

/// Batch driver writing a phase portrait.
#[derive(Clone, Debug)]
pub struct Portrait {
    t_step: f64,
    t_end: f64,
    file: PathBuf,
}

impl Portrait {
    /// Reporting interval.
    pub fn t_step(&self) -> f64 {
        self.t_step
    }

    /// Final simulated time.
    pub fn t_end(&self) -> f64 {
        self.t_end
    }

    /// Artifact path.
    pub fn file(&self) -> &Path {
        &self.file
    }

    fn check_run(&self, t0: f64) -> Result<(), PluginError> {
        if self.t_end <= t0 {
            return Err(PluginError::invalid("t_end must be greater than ODE.t"));
        }
        if self.t_step > self.t_end - t0 {
            return Err(PluginError::invalid(
                "t_step cannot be greater than (t_end - ODE.t)",
            ));
        }
        Ok(())
    }

    /// Reporting boundary `k` after `t0`, snapped onto `t_end` once the
    /// remainder is only accumulated rounding.
    fn boundary(&self, t0: f64, k: u64) -> f64 {
        let b = (t0 + k as f64 * self.t_step).min(self.t_end);
        if self.t_end - b <= self.t_step * 1e-9 {
            self.t_end
        } else {
            b
        }
    }

    fn io_error(&self, e: io::Error) -> PluginError {
        PluginError::io(format!("cannot write {}: {e}", self.file.display()))
    }
}

fn positive_finite(name: &str, value: f64) -> Result<f64, PluginError> {
    if !value.is_finite() {
        Err(PluginError::construction(format!("{name} must be finite")))
    } else if value <= 0.0 {
        Err(PluginError::construction(format!("{name} must be positive")))
    } else {
        Ok(value)
    }
}

impl Construct for Portrait {
    const NAME: &'static str = "portrait";
    const SCHEMA: &'static [DsArgSpec] = &[
        DsArgSpec::real("t_step"),
        DsArgSpec::real("t_end"),
        DsArgSpec::text("file"),
    ];

    fn construct(args: &Arguments<'_>) -> Result<Self, PluginError> {
        let t_step = positive_finite("t_step", args.real("t_step")?)?;
        let t_end = positive_finite("t_end", args.real("t_end")?)?;
        let file = args.text("file")?;
        if file.is_empty() {
            return Err(PluginError::construction("file must not be empty"));
        }
        Ok(Self {
            t_step,
            t_end,
            file: PathBuf::from(file),
        })
    }
}

// ── Artifact ────────────────────────────────────────────────────

fn write_header(out: &mut impl Write, dim: usize) -> io::Result<()> {
    out.write_all(b"t")?;
    for i in 0..dim {
        write!(out, " x[{i}]")?;
    }
    out.write_all(b"\n")
}

fn write_record(out: &mut impl Write, ode: &OdeView<'_>) -> io::Result<()> {
    write!(out, "{:.6}", ode.t())?;
    for x in ode.x() {
        write!(out, " {x:.6}")?;
    }
    out.write_all(b"\n")
}

// ── Progress ────────────────────────────────────────────────────

/// Emits every integer percentage exactly once, in order.
struct Reporter<'p, 'a> {
    sink: &'p mut ProgressRef<'a>,
    next: u8,
}

impl<'p, 'a> Reporter<'p, 'a> {
    fn new(sink: &'p mut ProgressRef<'a>) -> Self {
        Self { sink, next: 0 }
    }

    /// Emit every value from the last emitted one up to `target`.
    fn fill_to(&mut self, target: u8) -> Result<(), PluginError> {
        let target = target.min(100);
        while self.next <= target {
            self.sink.emit(self.next)?;
            self.next += 1;
        }
        Ok(())
    }
}

fn percent(t: f64, t0: f64, span: f64) -> u8 {
    let p = (100.0 * (t - t0) / span).floor();
    p.clamp(0.0, 100.0) as u8
}

impl JobPlugin for Portrait {
    fn run(
        &mut self,
        ode: &mut OdeView<'_>,
        solver: &mut SolverRef<'_>,
        progress: &mut ProgressRef<'_>,
    ) -> Result<(), PluginError> {
        let t0 = ode.t();
        self.check_run(t0)?;
        let span = self.t_end - t0;

        let file = File::create(&self.file).map_err(|e| self.io_error(e))?;
        let mut out = BufWriter::new(file);
        write_header(&mut out, ode.dim()).map_err(|e| self.io_error(e))?;
        write_record(&mut out, ode).map_err(|e| self.io_error(e))?;

        let mut reporter = Reporter::new(progress);
        reporter.fill_to(0)?;

        let mut steps: u64 = 0;
        let mut k: u64 = 0;
        while ode.t() < self.t_end {
            k += 1;
            let boundary = self.boundary(t0, k);
            while ode.t() < boundary {
                let before = ode.t();
                solver.step(ode, boundary)?;
                if ode.t() <= before {
                    return Err(PluginError::step_limit(format!(
                        "solver made no progress at t = {before}"
                    )));
                }
                steps += 1;
                if steps >= MAX_STEPS {
                    return Err(PluginError::step_limit(
                        "Job has failed to finish in 1,000,000,000 steps",
                    ));
                }
            }
            write_record(&mut out, ode).map_err(|e| self.io_error(e))?;
            // 100 is held back until the artifact is on disk.
            reporter.fill_to(percent(ode.t(), t0, span).min(99))?;
        }

        let file = out.into_inner().map_err(|e| self.io_error(e.into_error()))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        reporter.fill_to(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Linear, Rk4};
    use dynsys_core::{ArgValue, RunError};
    use dynsys_host::{Job, Ode, RecordingProgress, Solver};
    use dynsys_test_utils::{job_factory, ode_factory, solver_factory, ROTATION};

    fn rotation() -> Ode {
        let mut ode = ode_factory::<Linear>()
            .create([("n", ArgValue::Integer(2))])
            .unwrap();
        ode.set_p(&ROTATION).unwrap();
        ode.set_x(&[0.0, 1.0]).unwrap();
        ode
    }

    fn rk4() -> Solver {
        solver_factory::<Rk4>()
            .create([("h_max", ArgValue::Real(0.01))])
            .unwrap()
    }

    fn portrait(t_step: f64, t_end: f64, file: &Path) -> Job {
        job_factory::<Portrait>()
            .create([
                ("t_step", ArgValue::Real(t_step)),
                ("t_end", ArgValue::Real(t_end)),
                ("file", ArgValue::from(file.to_string_lossy().into_owned())),
            ])
            .unwrap()
    }

    #[test]
    fn percent_is_floored_and_clamped() {
        assert_eq!(percent(0.0, 0.0, 1.0), 0);
        assert_eq!(percent(0.0299, 0.0, 1.0), 2);
        assert_eq!(percent(1.0, 0.0, 1.0), 100);
        assert_eq!(percent(1.5, 0.0, 1.0), 100);
        assert_eq!(percent(-0.5, 0.0, 1.0), 0);
    }

    #[test]
    fn header_names_each_component() {
        let mut out = Vec::new();
        write_header(&mut out, 3).unwrap();
        assert_eq!(out, b"t x[0] x[1] x[2]\n");
    }

    #[test]
    fn construction_rejects_degenerate_arguments() {
        let factory = job_factory::<Portrait>();
        let cases = [
            (0.0, 1.0, "out.dat", "t_step must be positive"),
            (0.1, -1.0, "out.dat", "t_end must be positive"),
            (f64::NAN, 1.0, "out.dat", "t_step must be finite"),
            (0.1, 1.0, "", "file must not be empty"),
        ];
        for (t_step, t_end, file, message) in cases {
            let err = factory
                .create([
                    ("t_step", ArgValue::Real(t_step)),
                    ("t_end", ArgValue::Real(t_end)),
                    ("file", ArgValue::from(file)),
                ])
                .unwrap_err();
            assert!(err.to_string().contains(message), "{err}");
        }
    }

    #[test]
    fn rejects_end_before_current_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.dat");
        let mut ode = rotation();
        ode.set_t(2.0);
        let err = portrait(0.1, 1.0, &path)
            .run(&mut ode, &mut rk4(), &mut RecordingProgress::new())
            .unwrap_err();
        assert_eq!(
            err,
            RunError::Rejected {
                reason: "t_end must be greater than ODE.t".into()
            }
        );
        assert!(!path.exists());
    }

    #[test]
    fn rejects_step_wider_than_span() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.dat");
        let mut ode = rotation();
        ode.set_t(0.5);
        let err = portrait(0.6, 1.0, &path)
            .run(&mut ode, &mut rk4(), &mut RecordingProgress::new())
            .unwrap_err();
        assert!(
            err.to_string()
                .contains("t_step cannot be greater than (t_end - ODE.t)"),
            "{err}"
        );
    }

    #[test]
    fn writes_one_record_per_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rotation.dat");
        let mut ode = rotation();
        let mut progress = RecordingProgress::new();
        portrait(0.1, 1.0, &path)
            .run(&mut ode, &mut rk4(), &mut progress)
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "t x[0] x[1]");
        assert_eq!(lines[1], "0.000000 0.000000 1.000000");
        assert_eq!(lines.len(), 12);
        assert!(lines[11].starts_with("1.000000 0.841471 0.540302"), "{}", lines[11]);
        assert_eq!(ode.t(), 1.0);
        assert_eq!(progress.values(), (0..=100).collect::<Vec<u8>>());
    }

    #[test]
    fn unwritable_artifact_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut progress = RecordingProgress::new();
        let err = portrait(0.1, 1.0, dir.path())
            .run(&mut rotation(), &mut rk4(), &mut progress)
            .unwrap_err();
        assert!(matches!(err, RunError::Io { .. }), "{err:?}");
        assert!(progress.values().is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_flush_never_reports_completion() {
        let mut progress = RecordingProgress::new();
        let err = portrait(0.5, 1.0, Path::new("/dev/full"))
            .run(&mut rotation(), &mut rk4(), &mut progress)
            .unwrap_err();
        assert!(matches!(err, RunError::Io { .. }), "{err:?}");
        assert_eq!(progress.values().first(), Some(&0));
        assert!(progress.values().iter().all(|&v| v < 100));
    }
}
