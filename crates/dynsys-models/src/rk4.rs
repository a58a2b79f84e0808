//! Classical fourth-order Runge–Kutta with a fixed step ceiling.

use dynsys_abi::sdk::{Arguments, Construct, OdeView, PluginError, SolverPlugin};
use dynsys_abi::DsArgSpec;

use crate::open_unit_interval;

/// RK4 stepper. Each step covers `min(h_max, t_limit - t)`.
#[derive(Clone, Debug)]
pub struct Rk4 {
    h_max: f64,
    work: Workspace,
}

/// Stage derivatives plus the intermediate state, sized on first use.
#[derive(Clone, Debug, Default)]
struct Workspace {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    stage: Vec<f64>,
}

impl Workspace {
    fn fit(&mut self, n: usize) {
        if self.stage.len() != n {
            for buf in [
                &mut self.k1,
                &mut self.k2,
                &mut self.k3,
                &mut self.k4,
                &mut self.stage,
            ] {
                buf.clear();
                buf.resize(n, 0.0);
            }
        }
    }
}

impl Rk4 {
    /// Step ceiling.
    pub fn h_max(&self) -> f64 {
        self.h_max
    }
}

impl Construct for Rk4 {
    const NAME: &'static str = "rk4";
    const SCHEMA: &'static [DsArgSpec] = &[DsArgSpec::real("h_max")];

    fn construct(args: &Arguments<'_>) -> Result<Self, PluginError> {
        let h_max = open_unit_interval("h_max", args.real("h_max")?)?;
        Ok(Self {
            h_max,
            work: Workspace::default(),
        })
    }
}

impl SolverPlugin for Rk4 {
    fn step(&mut self, ode: &mut OdeView<'_>, t_limit: f64) -> Result<(), PluginError> {
        let t = ode.t();
        if t >= t_limit {
            return Ok(());
        }
        let remaining = t_limit - t;
        let (h, t_next) = if remaining <= self.h_max {
            (remaining, t_limit)
        } else {
            (self.h_max, t + self.h_max)
        };

        let Workspace {
            k1,
            k2,
            k3,
            k4,
            stage,
        } = {
            self.work.fit(ode.dim());
            &mut self.work
        };

        let x = ode.x();
        ode.eval(t, x, k1)?;
        for ((s, x), k) in stage.iter_mut().zip(x).zip(k1.iter()) {
            *s = x + 0.5 * h * k;
        }
        ode.eval(t + 0.5 * h, stage, k2)?;
        for ((s, x), k) in stage.iter_mut().zip(x).zip(k2.iter()) {
            *s = x + 0.5 * h * k;
        }
        ode.eval(t + 0.5 * h, stage, k3)?;
        for ((s, x), k) in stage.iter_mut().zip(x).zip(k3.iter()) {
            *s = x + h * k;
        }
        ode.eval(t + h, stage, k4)?;

        for (i, x) in ode.x_mut().iter_mut().enumerate() {
            *x += h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
        }
        ode.set_t(t_next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Linear;
    use dynsys_core::ArgValue;
    use dynsys_host::{Ode, Solver};
    use dynsys_test_utils::{ode_factory, solver_factory, ROTATION};

    fn rotation() -> Ode {
        let mut ode = ode_factory::<Linear>()
            .create([("n", ArgValue::Integer(2))])
            .unwrap();
        ode.set_p(&ROTATION).unwrap();
        ode.set_x(&[0.0, 1.0]).unwrap();
        ode
    }

    fn rk4(h_max: f64) -> Solver {
        solver_factory::<Rk4>()
            .create([("h_max", ArgValue::Real(h_max))])
            .unwrap()
    }

    #[test]
    fn h_max_outside_unit_interval_is_rejected() {
        for h_max in [0.0, -0.1, 1.0, 1.5] {
            let err = solver_factory::<Rk4>()
                .create([("h_max", ArgValue::Real(h_max))])
                .unwrap_err();
            assert!(
                err.to_string().contains("h_max must satisfy: 0 < h_max < 1"),
                "{err}"
            );
        }
    }

    #[test]
    fn step_is_bounded_by_ceiling() {
        let mut ode = rotation();
        let mut solver = rk4(0.01);
        solver.step(&mut ode).unwrap();
        assert!((ode.t() - 0.01).abs() < 1e-15);
    }

    #[test]
    fn step_lands_exactly_on_limit() {
        let mut ode = rotation();
        let mut solver = rk4(0.1);
        solver.step_towards(&mut ode, 0.03).unwrap();
        assert_eq!(ode.t(), 0.03);
        solver.step_towards(&mut ode, 0.03).unwrap();
        assert_eq!(ode.t(), 0.03);
    }

    #[test]
    fn rotation_tracks_closed_form() {
        let mut ode = rotation();
        let mut solver = rk4(0.01);
        while ode.t() < 1.0 {
            solver.step_towards(&mut ode, 1.0).unwrap();
        }
        // x0' = x1, x1' = -x0 from (0, 1): x = (sin t, cos t).
        assert!((ode.x()[0] - 1f64.sin()).abs() < 1e-8, "{:?}", ode.x());
        assert!((ode.x()[1] - 1f64.cos()).abs() < 1e-8, "{:?}", ode.x());
    }

    #[test]
    fn buffers_follow_dimension_change() {
        let mut solver = rk4(0.05);
        let mut small = rotation();
        solver.step(&mut small).unwrap();
        let mut big = ode_factory::<Linear>()
            .create([("n", ArgValue::Integer(3))])
            .unwrap();
        big.set_x(&[1.0, 1.0, 1.0]).unwrap();
        solver.step(&mut big).unwrap();
        assert_eq!(big.x(), &[1.0, 1.0, 1.0]);
        assert!((big.t() - 0.05).abs() < 1e-15);
    }
}
