//! Temporary module trees for registry tests.
//!
//! Discovery scans real directories, so a [`ModuleTree`] writes an empty
//! placeholder file per module and registers the in-process table for
//! that path with a [`StaticLoader`].

use std::env::consts::{DLL_EXTENSION, DLL_PREFIX};
use std::fs;
use std::path::{Path, PathBuf};

use dynsys_abi::ModuleTable;
use dynsys_core::Role;
use dynsys_host::{Registry, RegistryConfig, RegistryError, StaticLoader};
use tempfile::TempDir;

/// A module root in a temporary directory.
pub struct ModuleTree {
    dir: TempDir,
    config: RegistryConfig,
    loader: StaticLoader,
}

impl ModuleTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let config = RegistryConfig::with_root(dir.path());
        Self {
            dir,
            config,
            loader: StaticLoader::new(),
        }
    }

    /// Platform file name for module `name`: `librk4.so`, `rk4.dll`, ...
    pub fn file_name(name: &str) -> String {
        format!("{DLL_PREFIX}{name}.{DLL_EXTENSION}")
    }

    /// Place module `name` in the directory of `found_as` and serve
    /// `table` for it. The table may declare a different role.
    pub fn add(&mut self, found_as: Role, name: &str, table: ModuleTable) -> PathBuf {
        let path = self.touch(found_as, &Self::file_name(name));
        self.loader.insert(path.clone(), table);
        path
    }

    /// Create an empty file under the directory of `role` without
    /// registering anything for it.
    pub fn touch(&self, role: Role, file_name: &str) -> PathBuf {
        let dir = self.config.role_dir(role);
        fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("create {}: {e}", dir.display()));
        let path = dir.join(file_name);
        fs::write(&path, b"").unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
        path
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn loader(&self) -> &StaticLoader {
        &self.loader
    }

    pub fn discover(&self) -> Result<Registry, RegistryError> {
        Registry::discover(&self.config, &self.loader)
    }
}

impl Default for ModuleTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Exploding, Stalling};

    #[test]
    fn added_modules_are_discovered() {
        let mut tree = ModuleTree::new();
        tree.add(Role::Ode, "exploding", ModuleTable::ode::<Exploding>());
        tree.add(Role::Solver, "stalling", ModuleTable::solver::<Stalling>());
        let registry = tree.discover().unwrap();
        assert_eq!(registry.names(Role::Ode), ["exploding"]);
        assert_eq!(registry.names(Role::Solver), ["stalling"]);
        assert!(registry.names(Role::Job).is_empty());
    }

    #[test]
    fn placeholders_land_under_role_directories() {
        let tree = ModuleTree::new();
        let path = tree.touch(Role::Job, "notes.txt");
        assert_eq!(path, tree.root().join("job").join("notes.txt"));
        assert!(path.is_file());
    }
}
