//! The `spherical_pendulum` ODE module.

#![deny(unsafe_code)]

dynsys_abi::export_ode!(dynsys_models::SphericalPendulum);
