//! The `dopri5` solver module.

#![deny(unsafe_code)]

dynsys_abi::export_solver!(dynsys_models::Dopri5);
