//! Versioned C ABI between dynsys hosts and plugin modules.
//!
//! The host side uses the `repr(C)` types, [`DsStatus`], the symbol
//! names in [`symbols`] and [`ModuleTable`]. Module authors implement
//! the traits in [`sdk`] and export them with [`export_ode!`],
//! [`export_solver!`] or [`export_job!`].
//!
//! This is the only crate in the workspace besides `dynsys-host` that
//! may contain `unsafe` code. Every unsafe item opts in explicitly.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod errbuf;
pub mod export;
pub mod guard;
pub mod sdk;
pub mod status;
pub mod symbols;
pub mod table;
pub mod types;

pub use errbuf::{write_error, ErrorSlot, ERROR_CAPACITY};
pub use status::DsStatus;
pub use table::{ModuleTable, RoleEntryPoints};
pub use types::{
    DsArgBlock, DsArgKind, DsArgSpec, DsArgValue, DsErrorBuf, DsOdeView, DsProgressSink, DsRole,
    DsSchema, DsSolverView, DsStr, DS_ABI_VERSION,
};
