//! Registry configuration.
//!
//! [`RegistryConfig`] names the module root and the per-role directory
//! names beneath it. [`validate()`](RegistryConfig::validate) runs before
//! any scan.

use std::path::{Path, PathBuf};

use dynsys_core::Role;
use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable overriding [`RegistryConfig::root`].
pub const MODULE_DIR_ENV: &str = "DYNSYS_MODULE_DIR";

/// Where the registry looks for modules.
///
/// TOML form (every key optional):
///
/// ```toml
/// root = "modules"
/// ode_dir = "ode"
/// solver_dir = "solver"
/// job_dir = "job"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Module root. Default: `modules`.
    pub root: PathBuf,
    /// ODE directory under `root`. Default: `ode`.
    pub ode_dir: String,
    /// Solver directory under `root`. Default: `solver`.
    pub solver_dir: String,
    /// Job directory under `root`. Default: `job`.
    pub job_dir: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("modules"),
            ode_dir: Role::Ode.as_str().to_owned(),
            solver_dir: Role::Solver.as_str().to_owned(),
            job_dir: Role::Job.as_str().to_owned(),
        }
    }
}

impl RegistryConfig {
    /// Defaults rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Defaults, with `root` taken from `DYNSYS_MODULE_DIR` when set
    /// and non-empty.
    pub fn from_env() -> Self {
        match std::env::var_os(MODULE_DIR_ENV) {
            Some(root) if !root.is_empty() => Self::with_root(root),
            _ => Self::default(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyRoot);
        }
        for role in Role::ALL {
            if self.dir_name(role).is_empty() {
                return Err(ConfigError::EmptyDir { role });
            }
        }
        for (i, a) in Role::ALL.iter().enumerate() {
            for b in &Role::ALL[i + 1..] {
                if self.dir_name(*a) == self.dir_name(*b) {
                    return Err(ConfigError::SharedDir {
                        dir: self.dir_name(*a).to_owned(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Directory name configured for `role`.
    pub fn dir_name(&self, role: Role) -> &str {
        match role {
            Role::Ode => &self.ode_dir,
            Role::Solver => &self.solver_dir,
            Role::Job => &self.job_dir,
        }
    }

    /// Full directory scanned for `role`.
    pub fn role_dir(&self, role: Role) -> PathBuf {
        self.root.join(self.dir_name(role))
    }

    /// The module root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let config = RegistryConfig::default();
        config.validate().unwrap();
        assert_eq!(config.role_dir(Role::Solver), Path::new("modules/solver"));
    }

    #[test]
    fn toml_overrides_selected_keys() {
        let config = RegistryConfig::from_toml_str(
            r#"
            root = "/opt/dynsys"
            job_dir = "drivers"
            "#,
        )
        .unwrap();
        assert_eq!(config.role_dir(Role::Job), Path::new("/opt/dynsys/drivers"));
        assert_eq!(config.role_dir(Role::Ode), Path::new("/opt/dynsys/ode"));
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        let err = RegistryConfig::from_toml_str("roots = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn shared_directories_are_rejected() {
        let config = RegistryConfig {
            solver_dir: "ode".into(),
            ..RegistryConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SharedDir { dir: "ode".into() })
        );
    }

    #[test]
    fn empty_fields_are_rejected() {
        let config = RegistryConfig::with_root("");
        assert_eq!(config.validate(), Err(ConfigError::EmptyRoot));
        let config = RegistryConfig {
            ode_dir: String::new(),
            ..RegistryConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyDir { role: Role::Ode }));
    }
}
