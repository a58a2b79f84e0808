//! Per-module factories.
//!
//! A factory wraps one [`ModuleHandle`] of a known role. `create`
//! validates caller-supplied pairs against the cached schema, marshals
//! the resulting [`ArgRecord`] across the boundary and wraps the handle
//! in the role's instance type. Nothing reaches the module unless
//! validation passed.

use std::path::Path;
use std::sync::Arc;

use dynsys_core::{ArgRecord, ArgValue, CreateError, LoadError, Role, Schema};

use crate::instance::Instance;
use crate::job::Job;
use crate::module::ModuleHandle;
use crate::ode::Ode;
use crate::solver::Solver;

fn check_role(module: &ModuleHandle, expected: Role) -> Result<(), LoadError> {
    if module.role() != expected {
        return Err(LoadError::RoleMismatch {
            path: module.path().to_owned(),
            expected,
            found: module.role(),
        });
    }
    Ok(())
}

macro_rules! factory {
    ($(#[$doc:meta])* $factory:ident, $role:expr, $instance:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $factory {
            module: Arc<ModuleHandle>,
        }

        impl $factory {
            /// Wrap `module`, which must declare this factory's role.
            pub fn new(module: Arc<ModuleHandle>) -> Result<Self, LoadError> {
                check_role(&module, $role)?;
                Ok(Self { module })
            }

            /// Module name.
            pub fn name(&self) -> &str {
                self.module.name()
            }

            /// Always this factory's role.
            pub fn role(&self) -> Role {
                self.module.role()
            }

            /// Declared argument schema, verbatim.
            pub fn schema(&self) -> &Schema {
                self.module.schema()
            }

            /// Path the module was loaded from.
            pub fn path(&self) -> &Path {
                self.module.path()
            }

            /// The underlying module.
            pub fn module(&self) -> &Arc<ModuleHandle> {
                &self.module
            }

            /// Validate typed `(name, value)` pairs and construct.
            pub fn create<I, K>(&self, supplied: I) -> Result<$instance, CreateError>
            where
                I: IntoIterator<Item = (K, ArgValue)>,
                K: Into<String>,
            {
                let record = self.module.schema().validate(supplied)?;
                self.create_validated(record)
            }

            /// Parse textual `(name, text)` pairs exactly, then construct.
            pub fn create_from_text<I, K, V>(&self, supplied: I) -> Result<$instance, CreateError>
            where
                I: IntoIterator<Item = (K, V)>,
                K: Into<String>,
                V: AsRef<str>,
            {
                let record = self.module.schema().parse_textual(supplied)?;
                self.create_validated(record)
            }

            fn create_validated(&self, record: ArgRecord) -> Result<$instance, CreateError> {
                let instance = Instance::construct(&self.module, &record)?;
                Ok($instance::from_instance(instance, record)?)
            }
        }
    };
}

factory!(
    /// Builds [`Ode`] instances from an ODE module.
    OdeFactory,
    Role::Ode,
    Ode
);

factory!(
    /// Builds [`Solver`] instances from a solver module.
    SolverFactory,
    Role::Solver,
    Solver
);

factory!(
    /// Builds [`Job`] instances from a job module.
    JobFactory,
    Role::Job,
    Job
);
