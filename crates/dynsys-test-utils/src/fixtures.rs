//! Fixture modules that misbehave on purpose.
//!
//! - [`Exploding`]: ODE whose derivative turns NaN at `t_fail`.
//! - [`Stalling`]: solver that never advances time.
//! - [`Euler`]: explicit Euler, the simplest well-behaved solver.
//! - [`Liar`]: driver that breaks the progress protocol in a chosen way.
//! - [`Panicking`]: driver that panics mid-run.

use dynsys_abi::sdk::{
    Arguments, Construct, JobPlugin, OdePlugin, OdeView, PluginError, ProgressRef, SolverPlugin,
    SolverRef,
};
use dynsys_abi::DsArgSpec;

// ── ODEs ────────────────────────────────────────────────────────

/// `x' = 1` in one dimension until `t_fail`, NaN from then on.
#[derive(Debug)]
pub struct Exploding {
    pub t_fail: f64,
}

impl Construct for Exploding {
    const NAME: &'static str = "exploding";
    const SCHEMA: &'static [DsArgSpec] = &[DsArgSpec::real("t_fail")];

    fn construct(args: &Arguments<'_>) -> Result<Self, PluginError> {
        Ok(Self {
            t_fail: args.real("t_fail")?,
        })
    }
}

impl OdePlugin for Exploding {
    fn x_size(&self) -> usize {
        1
    }

    fn p_size(&self) -> usize {
        0
    }

    fn derivative(&self, t: f64, _x: &[f64], _p: &[f64], dxdt: &mut [f64]) {
        dxdt[0] = if t < self.t_fail { 1.0 } else { f64::NAN };
    }
}

// ── Solvers ─────────────────────────────────────────────────────

/// Returns success without touching the state.
#[derive(Debug)]
pub struct Stalling;

impl Construct for Stalling {
    const NAME: &'static str = "stalling";
    const SCHEMA: &'static [DsArgSpec] = &[];

    fn construct(_args: &Arguments<'_>) -> Result<Self, PluginError> {
        Ok(Self)
    }
}

impl SolverPlugin for Stalling {
    fn step(&mut self, _ode: &mut OdeView<'_>, _t_limit: f64) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Explicit Euler with step ceiling `h`.
#[derive(Debug)]
pub struct Euler {
    h: f64,
    dxdt: Vec<f64>,
}

impl Construct for Euler {
    const NAME: &'static str = "euler";
    const SCHEMA: &'static [DsArgSpec] = &[DsArgSpec::real("h")];

    fn construct(args: &Arguments<'_>) -> Result<Self, PluginError> {
        let h = args.real("h")?;
        if h.is_nan() || h <= 0.0 {
            return Err(PluginError::construction("h must be positive"));
        }
        Ok(Self {
            h,
            dxdt: Vec::new(),
        })
    }
}

impl SolverPlugin for Euler {
    fn step(&mut self, ode: &mut OdeView<'_>, t_limit: f64) -> Result<(), PluginError> {
        let t = ode.t();
        if t >= t_limit {
            return Ok(());
        }
        let h = self.h.min(t_limit - t);
        self.dxdt.resize(ode.dim(), 0.0);
        ode.eval(t, ode.x(), &mut self.dxdt)?;
        for (x, d) in ode.x_mut().iter_mut().zip(&self.dxdt) {
            *x += h * d;
        }
        ode.set_t(if h < self.h { t_limit } else { t + h });
        Ok(())
    }
}

// ── Drivers ─────────────────────────────────────────────────────

/// How [`Liar`] breaks the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lie {
    /// Emits `0..=50` and reports success.
    Short,
    /// Emits `0..=100`, then `101`.
    Overflow,
    /// Emits `0..=50`, then `10`.
    Backwards,
}

/// Driver that never steps and misreports progress. Argument
/// `lie: text` is one of `short`, `overflow`, `backwards`.
#[derive(Debug)]
pub struct Liar {
    pub lie: Lie,
}

impl Construct for Liar {
    const NAME: &'static str = "liar";
    const SCHEMA: &'static [DsArgSpec] = &[DsArgSpec::text("lie")];

    fn construct(args: &Arguments<'_>) -> Result<Self, PluginError> {
        let lie = match args.text("lie")? {
            "short" => Lie::Short,
            "overflow" => Lie::Overflow,
            "backwards" => Lie::Backwards,
            other => {
                return Err(PluginError::construction(format!("unknown lie '{other}'")))
            }
        };
        Ok(Self { lie })
    }
}

impl JobPlugin for Liar {
    fn run(
        &mut self,
        _ode: &mut OdeView<'_>,
        _solver: &mut SolverRef<'_>,
        progress: &mut ProgressRef<'_>,
    ) -> Result<(), PluginError> {
        let top = if self.lie == Lie::Overflow { 100 } else { 50 };
        for p in 0..=top {
            progress.emit(p)?;
        }
        match self.lie {
            Lie::Short => Ok(()),
            Lie::Overflow => progress.emit(101),
            Lie::Backwards => progress.emit(10),
        }
    }
}

/// Emits `0`, then panics.
#[derive(Debug)]
pub struct Panicking;

impl Construct for Panicking {
    const NAME: &'static str = "panicking";
    const SCHEMA: &'static [DsArgSpec] = &[];

    fn construct(_args: &Arguments<'_>) -> Result<Self, PluginError> {
        Ok(Self)
    }
}

impl JobPlugin for Panicking {
    fn run(
        &mut self,
        _ode: &mut OdeView<'_>,
        _solver: &mut SolverRef<'_>,
        progress: &mut ProgressRef<'_>,
    ) -> Result<(), PluginError> {
        progress.emit(0)?;
        panic!("driver gave up");
    }
}
