//! `dx/dt = P x` with `P` an `n × n` matrix stored row-major in `p`.

use dynsys_abi::sdk::{Arguments, Construct, OdePlugin, PluginError};
use dynsys_abi::DsArgSpec;

/// Linear ODE of dimension `n`: `x_size = n`, `p_size = n * n`.
#[derive(Clone, Debug)]
pub struct Linear {
    n: usize,
}

impl Linear {
    /// Dimension.
    pub fn n(&self) -> usize {
        self.n
    }
}

impl Construct for Linear {
    const NAME: &'static str = "linear";
    const SCHEMA: &'static [DsArgSpec] = &[DsArgSpec::integer("n")];

    fn construct(args: &Arguments<'_>) -> Result<Self, PluginError> {
        let n = args.integer("n")?;
        if n <= 0 {
            return Err(PluginError::construction("n must be positive"));
        }
        let n = usize::try_from(n)
            .ok()
            .filter(|n| n.checked_mul(*n).is_some())
            .ok_or_else(|| PluginError::construction(format!("n = {n} is too large")))?;
        Ok(Self { n })
    }
}

impl OdePlugin for Linear {
    fn x_size(&self) -> usize {
        self.n
    }

    fn p_size(&self) -> usize {
        self.n * self.n
    }

    fn derivative(&self, _t: f64, x: &[f64], p: &[f64], dxdt: &mut [f64]) {
        for (row, out) in p.chunks_exact(self.n).zip(dxdt.iter_mut()) {
            *out = row.iter().zip(x).map(|(a, b)| a * b).sum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynsys_core::ArgValue;
    use dynsys_test_utils::ode_factory;
    use proptest::prelude::*;

    #[test]
    fn rotation_derivative() {
        let ode = Linear { n: 2 };
        let mut dxdt = [0.0; 2];
        ode.derivative(0.0, &[0.0, 1.0], &[0.0, 1.0, -1.0, 0.0], &mut dxdt);
        assert_eq!(dxdt, [1.0, 0.0]);
    }

    #[test]
    fn non_positive_dimension_is_rejected() {
        let factory = ode_factory::<Linear>();
        for n in [0, -1, i64::MIN] {
            let err = factory.create([("n", ArgValue::Integer(n))]).unwrap_err();
            assert!(err.to_string().contains("n must be positive"), "{err}");
        }
    }

    proptest! {
        #[test]
        fn sizes_follow_dimension(n in 1i64..48) {
            let ode = ode_factory::<Linear>().create([("n", ArgValue::Integer(n))]).unwrap();
            prop_assert_eq!(ode.x_size(), n as usize);
            prop_assert_eq!(ode.p_size(), (n * n) as usize);
        }
    }
}
