//! The `portrait` job module.

#![deny(unsafe_code)]

dynsys_abi::export_job!(dynsys_models::Portrait);
