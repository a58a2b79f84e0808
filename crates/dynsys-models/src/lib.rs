//! Reference modules for the dynsys plugin framework.
//!
//! Each type implements one SDK role trait and nothing else; the
//! `plugins/*` crates export them as shared libraries, and hosts can
//! load them in-process through
//! [`ModuleTable`](dynsys_abi::ModuleTable).
//!
//! | Type | Role | Arguments |
//! |------|------|-----------|
//! | [`Linear`] | ODE | `n: integer` |
//! | [`SphericalPendulum`] | ODE | none |
//! | [`Rk4`] | solver | `h_max: real` |
//! | [`Dopri5`] | solver | `h_max: real`, `eps: real` |
//! | [`Portrait`] | job | `t_step: real`, `t_end: real`, `file: text` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dopri5;
pub mod linear;
pub mod portrait;
pub mod rk4;
pub mod spherical_pendulum;

pub use dopri5::Dopri5;
pub use linear::Linear;
pub use portrait::Portrait;
pub use rk4::Rk4;
pub use spherical_pendulum::SphericalPendulum;

use dynsys_abi::sdk::PluginError;

/// Reject `value` unless `0 < value < 1`.
pub(crate) fn open_unit_interval(name: &str, value: f64) -> Result<f64, PluginError> {
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(PluginError::construction(format!(
            "{name} must satisfy: 0 < {name} < 1"
        )))
    }
}
