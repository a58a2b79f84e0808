//! Turning a path into a [`ModuleHandle`].
//!
//! [`Loader`] is the seam between discovery and the platform:
//! [`DylibLoader`] opens shared libraries, [`StaticLoader`] serves
//! tables built in-process. Both end in
//! [`ModuleHandle::from_table()`], so both enforce the same contract.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dynsys_abi::symbols::{
    DsAbiVersionFn, DsConstructFn, DsDestroyFn, DsNameFn, DsOdeSizesFn, DsRoleFn, DsRunFn,
    DsSchemaFn, SYM_ABI_VERSION, SYM_CONSTRUCT, SYM_DESTROY, SYM_JOB_RUN, SYM_NAME,
    SYM_ODE_DERIVATIVE, SYM_ODE_SIZES, SYM_ROLE, SYM_SCHEMA, SYM_SOLVER_STEP,
};
use dynsys_abi::{DsRole, ModuleTable, RoleEntryPoints};
use dynsys_abi::types::{DsDerivativeFn, DsStepFn};
use dynsys_core::LoadError;
use libloading::Library;
use tracing::info;

use crate::module::{check_abi_version, ModuleHandle};

/// Resolves a path into a validated module handle.
pub trait Loader: Send + Sync {
    /// Load the module at `path`.
    fn load(&self, path: &Path) -> Result<ModuleHandle, LoadError>;
}

// ── DylibLoader ─────────────────────────────────────────────────

/// Loads platform shared libraries with `libloading`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DylibLoader;

impl DylibLoader {
    /// A new loader.
    pub fn new() -> Self {
        Self
    }
}

impl Loader for DylibLoader {
    #[allow(unsafe_code)]
    fn load(&self, path: &Path) -> Result<ModuleHandle, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound {
                path: path.to_owned(),
            });
        }
        // SAFETY: loading a library runs its initializers. Modules are
        // trusted code by contract; this is the trust boundary.
        let library = unsafe { Library::new(path) }.map_err(|e| LoadError::Open {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;

        let abi_version: DsAbiVersionFn = resolve(&library, path, SYM_ABI_VERSION)?;
        // Version first: nothing else in an incompatible module is
        // interpreted.
        // SAFETY: resolved entry point taking no arguments.
        check_abi_version(path, unsafe { abi_version() })?;

        let role: DsRoleFn = resolve(&library, path, SYM_ROLE)?;
        // SAFETY: resolved entry point taking no arguments.
        let raw_role = unsafe { role() };
        let entry = match DsRole::from_raw(raw_role) {
            Some(DsRole::Ode) => RoleEntryPoints::Ode {
                sizes: resolve::<DsOdeSizesFn>(&library, path, SYM_ODE_SIZES)?,
                derivative: resolve::<DsDerivativeFn>(&library, path, SYM_ODE_DERIVATIVE)?,
            },
            Some(DsRole::Solver) => RoleEntryPoints::Solver {
                step: resolve::<DsStepFn>(&library, path, SYM_SOLVER_STEP)?,
            },
            Some(DsRole::Job) => RoleEntryPoints::Job {
                run: resolve::<DsRunFn>(&library, path, SYM_JOB_RUN)?,
            },
            None => {
                return Err(LoadError::UnknownRole {
                    path: path.to_owned(),
                    value: raw_role,
                })
            }
        };

        let table = ModuleTable {
            abi_version,
            role,
            name: resolve::<DsNameFn>(&library, path, SYM_NAME)?,
            schema: resolve::<DsSchemaFn>(&library, path, SYM_SCHEMA)?,
            construct: resolve::<DsConstructFn>(&library, path, SYM_CONSTRUCT)?,
            destroy: resolve::<DsDestroyFn>(&library, path, SYM_DESTROY)?,
            entry,
        };
        let module = ModuleHandle::from_table(path, table, Some(library))?;
        info!(
            path = %path.display(),
            name = module.name(),
            role = %module.role(),
            args = module.schema().len(),
            "loaded module"
        );
        Ok(module)
    }
}

/// Copy a function pointer out of `library`.
///
/// The pointer is only valid while `library` stays open; the caller
/// moves the library into the resulting handle.
#[allow(unsafe_code)]
fn resolve<T: Copy>(library: &Library, path: &Path, symbol: &'static str) -> Result<T, LoadError> {
    // SAFETY: T is the function-pointer type the ABI assigns to symbol.
    unsafe { library.get::<T>(symbol.as_bytes()) }
        .map(|sym| *sym)
        .map_err(|_| LoadError::MissingEntryPoint {
            path: path.to_owned(),
            symbol,
        })
}

// ── StaticLoader ────────────────────────────────────────────────

/// Serves in-process module tables under virtual paths.
///
/// Runs exactly the validation [`DylibLoader`] runs, minus the dynamic
/// linker. Registry discovery still scans the filesystem, so the
/// registered paths are usually placeholder files in a temporary tree.
#[derive(Clone, Debug, Default)]
pub struct StaticLoader {
    modules: HashMap<PathBuf, ModuleTable>,
}

impl StaticLoader {
    /// An empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `table` under `path`, replacing any previous entry.
    pub fn insert(&mut self, path: impl Into<PathBuf>, table: ModuleTable) {
        self.modules.insert(path.into(), table);
    }

    /// Builder form of [`insert()`](Self::insert).
    pub fn with(mut self, path: impl Into<PathBuf>, table: ModuleTable) -> Self {
        self.insert(path, table);
        self
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Loader for StaticLoader {
    fn load(&self, path: &Path) -> Result<ModuleHandle, LoadError> {
        let table = self.modules.get(path).ok_or_else(|| LoadError::NotFound {
            path: path.to_owned(),
        })?;
        let module = ModuleHandle::from_table(path, *table, None)?;
        info!(
            path = %path.display(),
            name = module.name(),
            role = %module.role(),
            "registered in-process module"
        );
        Ok(module)
    }
}
