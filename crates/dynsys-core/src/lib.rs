//! Core types for the dynsys plugin framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the host and by tooling built around it:
//! plugin roles, the ordered argument schema a module declares, the
//! argument values callers supply, the validated record that crosses
//! into a module's constructor, and the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod role;
pub mod schema;
pub mod value;

pub use error::{
    ArgumentError, ConstructionError, CreateError, LoadError, NumericalError, RunError,
    SchemaError,
};
pub use role::Role;
pub use schema::{ArgKind, ArgSpec, Schema};
pub use value::{ArgRecord, ArgValue};
