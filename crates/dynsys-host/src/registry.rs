//! Module discovery and lookup.
//!
//! A [`Registry`] is built once, at startup, and passed to whatever
//! needs factories. It is read-only afterwards and can be shared
//! across threads. There is no rescan.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dynsys_core::{LoadError, Role, Schema};
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::factory::{JobFactory, OdeFactory, SolverFactory};
use crate::loader::Loader;
use crate::module::ModuleHandle;

/// Factories by role and name.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    odes: IndexMap<String, OdeFactory>,
    solvers: IndexMap<String, SolverFactory>,
    jobs: IndexMap<String, JobFactory>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the role directories of `config` and load every module.
    ///
    /// Within a directory only files with the platform library
    /// extension are considered, in file-name order. A missing role
    /// directory contributes nothing.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable directory, unusable file name,
    /// load failure, role mismatch or duplicate name.
    pub fn discover(config: &RegistryConfig, loader: &dyn Loader) -> Result<Self, RegistryError> {
        config.validate()?;
        let mut registry = Self::new();
        for role in Role::ALL {
            let dir = config.role_dir(role);
            if !dir.is_dir() {
                debug!(role = %role, dir = %dir.display(), "role directory absent");
                continue;
            }
            for path in module_files(&dir)? {
                let name = module_name(&path)
                    .ok_or_else(|| RegistryError::InvalidFileName { path: path.clone() })?;
                let module = loader.load(&path)?;
                if module.role() != role {
                    return Err(LoadError::RoleMismatch {
                        path,
                        expected: role,
                        found: module.role(),
                    }
                    .into());
                }
                registry.insert_module(name, module)?;
            }
        }
        info!(
            root = %config.root().display(),
            odes = registry.odes.len(),
            solvers = registry.solvers.len(),
            jobs = registry.jobs.len(),
            "module registry ready"
        );
        Ok(registry)
    }

    /// Register `module` under `name` in the namespace of its role.
    pub fn insert_module(
        &mut self,
        name: impl Into<String>,
        module: ModuleHandle,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let role = module.role();
        let module = Arc::new(module);
        let duplicate = || RegistryError::Duplicate {
            role,
            name: name.clone(),
        };
        match role {
            Role::Ode => {
                if self.odes.contains_key(&name) {
                    return Err(duplicate());
                }
                self.odes.insert(name.clone(), OdeFactory::new(module)?);
            }
            Role::Solver => {
                if self.solvers.contains_key(&name) {
                    return Err(duplicate());
                }
                self.solvers.insert(name.clone(), SolverFactory::new(module)?);
            }
            Role::Job => {
                if self.jobs.contains_key(&name) {
                    return Err(duplicate());
                }
                self.jobs.insert(name.clone(), JobFactory::new(module)?);
            }
        }
        Ok(())
    }

    /// ODE factory by name.
    pub fn ode(&self, name: &str) -> Option<&OdeFactory> {
        self.odes.get(name)
    }

    /// Solver factory by name.
    pub fn solver(&self, name: &str) -> Option<&SolverFactory> {
        self.solvers.get(name)
    }

    /// Job factory by name.
    pub fn job(&self, name: &str) -> Option<&JobFactory> {
        self.jobs.get(name)
    }

    /// Registered names of `role`, in registration order.
    pub fn names(&self, role: Role) -> Vec<&str> {
        match role {
            Role::Ode => self.odes.keys().map(String::as_str).collect(),
            Role::Solver => self.solvers.keys().map(String::as_str).collect(),
            Role::Job => self.jobs.keys().map(String::as_str).collect(),
        }
    }

    /// Argument schema of a registered module.
    pub fn schema(&self, role: Role, name: &str) -> Option<&Schema> {
        match role {
            Role::Ode => self.odes.get(name).map(OdeFactory::schema),
            Role::Solver => self.solvers.get(name).map(SolverFactory::schema),
            Role::Job => self.jobs.get(name).map(JobFactory::schema),
        }
    }

    /// Total number of registered modules.
    pub fn len(&self) -> usize {
        self.odes.len() + self.solvers.len() + self.jobs.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Library files directly inside `dir`, sorted by path.
fn module_files(dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    let io_error = |e: std::io::Error| RegistryError::Io {
        path: dir.to_owned(),
        reason: e.to_string(),
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_library = path
            .extension()
            .is_some_and(|ext| ext == std::env::consts::DLL_EXTENSION);
        if is_library && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// File stem minus the platform library prefix: `librk4.so` → `rk4`.
pub fn module_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let name = stem
        .strip_prefix(std::env::consts::DLL_PREFIX)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(stem);
    (!name.is_empty()).then(|| name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_name_strips_platform_prefix_and_extension() {
        let file = format!(
            "{}rk4.{}",
            std::env::consts::DLL_PREFIX,
            std::env::consts::DLL_EXTENSION
        );
        assert_eq!(module_name(Path::new(&file)).as_deref(), Some("rk4"));
        let bare = format!("dopri5.{}", std::env::consts::DLL_EXTENSION);
        assert_eq!(module_name(Path::new(&bare)).as_deref(), Some("dopri5"));
    }

    #[test]
    fn empty_registry_lookups() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert!(registry.ode("linear").is_none());
        assert!(registry.names(Role::Job).is_empty());
        assert!(registry.schema(Role::Solver, "rk4").is_none());
    }
}
