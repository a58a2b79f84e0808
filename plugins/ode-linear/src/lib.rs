//! The `linear` ODE module.

#![deny(unsafe_code)]

dynsys_abi::export_ode!(dynsys_models::Linear);
