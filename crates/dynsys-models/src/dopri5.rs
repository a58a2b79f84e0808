//! Dormand–Prince 5(4) with error-controlled step size.
//!
//! Each [`step`](SolverPlugin::step) call performs exactly one accepted
//! step. Rejected attempts shrink `h` and retry; the step size and the
//! rejection flag carry over to the next call, so a smooth trajectory
//! settles on the largest step that meets `eps`.

use dynsys_abi::sdk::{Arguments, Construct, OdeView, PluginError, SolverPlugin};
use dynsys_abi::DsArgSpec;

use crate::open_unit_interval;

// ── Tableau ─────────────────────────────────────────────────────

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const A71: f64 = 35.0 / 384.0;
const A73: f64 = 500.0 / 1113.0;
const A74: f64 = 125.0 / 192.0;
const A75: f64 = -2187.0 / 6784.0;
const A76: f64 = 11.0 / 84.0;

const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

/// Floor of the per-component error scale.
const SCALE_FLOOR: f64 = 1e-5;

/// Consecutive rejected attempts tolerated within one call.
const MAX_REJECTIONS: usize = 100;

// ── Dopri5 ──────────────────────────────────────────────────────

/// Adaptive Dormand–Prince stepper.
#[derive(Clone, Debug)]
pub struct Dopri5 {
    h_max: f64,
    eps: f64,
    /// Step size for the next attempt. Zero until the first step.
    h: f64,
    /// The previous attempt was rejected.
    reject: bool,
    work: Workspace,
}

#[derive(Clone, Debug, Default)]
struct Workspace {
    k: [Vec<f64>; 7],
    y: Vec<f64>,
}

impl Workspace {
    fn fit(&mut self, n: usize) {
        if self.y.len() != n {
            for buf in self.k.iter_mut().chain(std::iter::once(&mut self.y)) {
                buf.clear();
                buf.resize(n, 0.0);
            }
        }
    }
}

/// `y = x + h * Σ a·k`.
fn combine(y: &mut [f64], x: &[f64], h: f64, terms: &[(f64, &[f64])]) {
    for (i, (y, x)) in y.iter_mut().zip(x).enumerate() {
        *y = x + h * terms.iter().map(|(a, k)| a * k[i]).sum::<f64>();
    }
}

impl Dopri5 {
    /// Step ceiling.
    pub fn h_max(&self) -> f64 {
        self.h_max
    }

    /// Error tolerance.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Step size the next attempt will start from.
    pub fn next_step_size(&self) -> f64 {
        if self.h > 0.0 {
            self.h
        } else {
            self.h_max
        }
    }

    /// One trial step of size `h` from `(t, x)`. Leaves the fifth-order
    /// solution in `work.y` and returns the scaled RMS error estimate.
    fn attempt(&mut self, ode: &OdeView<'_>, t: f64, h: f64) -> Result<f64, PluginError> {
        let Workspace { k, y } = &mut self.work;
        let [k1, k2, k3, k4, k5, k6, k7] = k;
        let x = ode.x();

        ode.eval(t, x, k1)?;
        combine(y, x, h, &[(A21, &k1[..])]);
        ode.eval(t + C2 * h, y, k2)?;
        combine(y, x, h, &[(A31, &k1[..]), (A32, &k2[..])]);
        ode.eval(t + C3 * h, y, k3)?;
        combine(y, x, h, &[(A41, &k1[..]), (A42, &k2[..]), (A43, &k3[..])]);
        ode.eval(t + C4 * h, y, k4)?;
        combine(
            y,
            x,
            h,
            &[(A51, &k1[..]), (A52, &k2[..]), (A53, &k3[..]), (A54, &k4[..])],
        );
        ode.eval(t + C5 * h, y, k5)?;
        combine(
            y,
            x,
            h,
            &[
                (A61, &k1[..]),
                (A62, &k2[..]),
                (A63, &k3[..]),
                (A64, &k4[..]),
                (A65, &k5[..]),
            ],
        );
        ode.eval(t + h, y, k6)?;
        combine(
            y,
            x,
            h,
            &[
                (A71, &k1[..]),
                (A73, &k3[..]),
                (A74, &k4[..]),
                (A75, &k5[..]),
                (A76, &k6[..]),
            ],
        );
        ode.eval(t + h, y, k7)?;

        let n = x.len();
        if n == 0 {
            return Ok(0.0);
        }
        let sum: f64 = (0..n)
            .map(|i| {
                let e = h
                    * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i]
                        + E7 * k7[i]);
                let scale = SCALE_FLOOR.max(x[i].abs()).max(y[i].abs());
                (e / scale).powi(2)
            })
            .sum();
        Ok((sum / n as f64).sqrt())
    }
}

impl Construct for Dopri5 {
    const NAME: &'static str = "dopri5";
    const SCHEMA: &'static [DsArgSpec] = &[DsArgSpec::real("h_max"), DsArgSpec::real("eps")];

    fn construct(args: &Arguments<'_>) -> Result<Self, PluginError> {
        let h_max = open_unit_interval("h_max", args.real("h_max")?)?;
        let eps = open_unit_interval("eps", args.real("eps")?)?;
        Ok(Self {
            h_max,
            eps,
            h: 0.0,
            reject: false,
            work: Workspace::default(),
        })
    }
}

impl SolverPlugin for Dopri5 {
    fn step(&mut self, ode: &mut OdeView<'_>, t_limit: f64) -> Result<(), PluginError> {
        let t = ode.t();
        if t >= t_limit {
            return Ok(());
        }
        if self.h <= 0.0 || self.h > self.h_max {
            self.h = self.h_max;
        }
        self.work.fit(ode.dim());

        for _ in 0..MAX_REJECTIONS {
            let remaining = t_limit - t;
            let clipped = self.h >= remaining;
            let h = if clipped { remaining } else { self.h };

            let err = self.attempt(ode, t, h)?;
            if !err.is_finite() {
                return Err(PluginError::numerical(format!(
                    "dopri5 error estimate is not finite at t = {t} with h = {h}"
                )));
            }
            let fac = (self.eps / err).powf(0.2).clamp(0.2, 5.0);
            let h_new = h * fac;

            if err < self.eps {
                ode.x_mut().copy_from_slice(&self.work.y);
                ode.set_t(if clipped { t_limit } else { t + h });
                // A step cut short by the limit says nothing about the
                // admissible size, so the carried size stays.
                if !clipped {
                    self.h = h_new.min(self.h_max);
                }
                self.reject = false;
                return Ok(());
            }

            let mut h_new = h_new.min(h);
            if self.reject {
                h_new *= 0.9;
            }
            self.reject = true;
            self.h = h_new;
        }

        Err(PluginError::step_limit(format!(
            "dopri5 rejected {MAX_REJECTIONS} consecutive steps at t = {t}"
        )))
    }
}
