//! Host side of the dynsys plugin framework.
//!
//! Loads modules ([`Loader`], [`DylibLoader`], [`StaticLoader`]),
//! validates them into [`ModuleHandle`]s, and wraps each in a typed
//! factory ([`OdeFactory`], [`SolverFactory`], [`JobFactory`]) that
//! checks caller arguments before anything crosses into the module.
//! Factories produce role instances ([`Ode`], [`Solver`], [`Job`]).
//! A [`Registry`] discovers modules under a [`RegistryConfig`] root.
//!
//! Jobs report progress through a [`ProgressSink`]; [`spawn_run`] and
//! [`SupervisedProcess`] run them where they can be observed.
//!
//! Logging goes through `tracing`; this crate never installs a
//! subscriber.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod factory;
mod instance;
pub mod job;
pub mod loader;
pub mod module;
pub mod ode;
pub mod progress;
pub mod registry;
pub mod solver;
pub mod supervise;

pub use config::{RegistryConfig, MODULE_DIR_ENV};
pub use error::{ConfigError, RegistryError};
pub use factory::{JobFactory, OdeFactory, SolverFactory};
pub use job::Job;
pub use loader::{DylibLoader, Loader, StaticLoader};
pub use module::ModuleHandle;
pub use ode::Ode;
pub use progress::{
    parse_progress_line, ChannelProgress, LineProgress, ProgressLog, ProgressSink,
    RecordingProgress, StdoutProgress,
};
pub use registry::{module_name, Registry};
pub use solver::Solver;
pub use supervise::{spawn_run, FinishedRun, RunOutcome, SupervisedProcess, ThreadedRun};
