//! dynsys: a plugin framework for numerical integration of dynamical systems.
//!
//! Three kinds of modules cooperate: an ODE owns the state `(t, x, p)`
//! and evaluates `dx/dt`, a solver advances that state one step at a
//! time, and a job drives the solver to completion while reporting
//! integer progress. Modules are shared libraries discovered at run
//! time; this facade re-exports the whole stack.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use dynsys::abi::ModuleTable;
//! use dynsys::models::{Linear, Rk4};
//! use dynsys::prelude::*;
//!
//! // Serve the reference modules in-process instead of from disk.
//! let linear = ModuleHandle::from_table("mem://linear", ModuleTable::ode::<Linear>(), None)?;
//! let rk4 = ModuleHandle::from_table("mem://rk4", ModuleTable::solver::<Rk4>(), None)?;
//!
//! let mut ode = OdeFactory::new(Arc::new(linear))?.create([("n", ArgValue::Integer(2))])?;
//! ode.set_p(&[0.0, 1.0, -1.0, 0.0])?;
//! ode.set_x(&[0.0, 1.0])?;
//!
//! let mut solver = SolverFactory::new(Arc::new(rk4))?.create([("h_max", ArgValue::Real(0.01))])?;
//! while ode.t() < 1.0 {
//!     solver.step_towards(&mut ode, 1.0)?;
//! }
//! assert!((ode.x()[0] - 1f64.sin()).abs() < 1e-8);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `dynsys-core` | Roles, schemas, argument values, error types |
//! | [`abi`] | `dynsys-abi` | C ABI, status codes, plugin SDK and export macros |
//! | [`host`] | `dynsys-host` | Loaders, factories, instances, registry, supervision |
//! | [`models`] | `dynsys-models` | `linear`, `rk4`, `dopri5`, `portrait` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Roles, schemas, argument values and errors (`dynsys-core`).
pub use dynsys_core as types;

/// The module boundary (`dynsys-abi`).
///
/// Plugin authors implement [`abi::sdk::Construct`] plus one role trait
/// and export it with [`abi::export_ode!`], [`abi::export_solver!`] or
/// [`abi::export_job!`].
pub use dynsys_abi as abi;

/// Host side of the boundary (`dynsys-host`).
///
/// [`host::Registry`] discovers modules on disk; the typed factories
/// build [`host::Ode`], [`host::Solver`] and [`host::Job`] instances.
pub use dynsys_host as host;

/// Reference modules (`dynsys-models`).
pub use dynsys_models as models;

/// Common imports for typical dynsys usage.
///
/// ```rust
/// use dynsys::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use dynsys_core::{ArgKind, ArgRecord, ArgSpec, ArgValue, Role, Schema};

    // Errors
    pub use dynsys_core::{
        ArgumentError, ConstructionError, CreateError, LoadError, NumericalError, RunError,
    };

    // Host
    pub use dynsys_host::{
        DylibLoader, Job, JobFactory, Loader, ModuleHandle, Ode, OdeFactory, ProgressSink,
        Registry, RegistryConfig, Solver, SolverFactory, StdoutProgress,
    };
}
