//! The `rk4` solver module.

#![deny(unsafe_code)]

dynsys_abi::export_solver!(dynsys_models::Rk4);
