//! The three plugin roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a plugin module.
///
/// Every module implements exactly one role. The role decides which
/// entry points the loader must resolve and which directory the
/// registry scans for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// State-evolution rule: owns `t`, `x`, `p` and evaluates `dx/dt`.
    Ode,
    /// Stepping algorithm: advances an ODE state in place.
    Solver,
    /// Batch driver: runs the integration loop and reports progress.
    Job,
}

impl Role {
    /// All roles, in registry scan order.
    pub const ALL: [Role; 3] = [Role::Ode, Role::Solver, Role::Job];

    /// Lowercase name, also the default directory name for discovery.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ode => "ode",
            Self::Solver => "solver",
            Self::Job => "job",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_lowercase_directory_names() {
        let names: Vec<_> = Role::ALL.iter().map(|r| r.as_str()).collect();
        assert_eq!(names, ["ode", "solver", "job"]);
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Solver).unwrap(), "\"solver\"");
        let role: Role = serde_json::from_str("\"job\"").unwrap();
        assert_eq!(role, Role::Job);
    }
}
