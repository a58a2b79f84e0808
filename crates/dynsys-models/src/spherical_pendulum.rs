//! Amplitude equations of a parametrically forced spherical pendulum.
//!
//! State `x = [a1, b1, r, a2, b2]`, parameters `p = [c, d, e, f]`:
//!
//! ```text
//! s  = r + (a1² + b1² + a2² + b2²) / 8
//! q  = 3/4 (a1 b2 - b1 a2)
//! a1' = c a1 - s b1 - q a2 + 2 b1
//! b1' = c b1 + s a1 - q b2 + 2 a1
//! r'  = d (a1 b1 + a2 b2) + e r + f
//! a2' = c a2 - s b2 + q a1 + 2 b2
//! b2' = c b2 + s a2 + q b1 + 2 a2
//! ```

use dynsys_abi::sdk::{Arguments, Construct, OdePlugin, PluginError};
use dynsys_abi::DsArgSpec;

/// Fixed-size ODE: `x_size = 5`, `p_size = 4`, no arguments.
#[derive(Clone, Copy, Debug, Default)]
pub struct SphericalPendulum;

impl Construct for SphericalPendulum {
    const NAME: &'static str = "spherical_pendulum";
    const SCHEMA: &'static [DsArgSpec] = &[];

    fn construct(_args: &Arguments<'_>) -> Result<Self, PluginError> {
        Ok(Self)
    }
}

impl OdePlugin for SphericalPendulum {
    fn x_size(&self) -> usize {
        5
    }

    fn p_size(&self) -> usize {
        4
    }

    fn derivative(&self, _t: f64, x: &[f64], p: &[f64], dxdt: &mut [f64]) {
        let [a1, b1, r, a2, b2] = [x[0], x[1], x[2], x[3], x[4]];
        let [c, d, e, f] = [p[0], p[1], p[2], p[3]];
        let s = r + (a1 * a1 + b1 * b1 + a2 * a2 + b2 * b2) / 8.0;
        let q = 0.75 * (a1 * b2 - b1 * a2);
        dxdt[0] = c * a1 - s * b1 - q * a2 + 2.0 * b1;
        dxdt[1] = c * b1 + s * a1 - q * b2 + 2.0 * a1;
        dxdt[2] = d * (a1 * b1 + a2 * b2) + e * r + f;
        dxdt[3] = c * a2 - s * b2 + q * a1 + 2.0 * b2;
        dxdt[4] = c * b2 + s * a2 + q * b1 + 2.0 * a2;
    }
}
