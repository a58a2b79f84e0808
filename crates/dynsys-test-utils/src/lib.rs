//! Test utilities for dynsys development.
//!
//! Builds factories straight from SDK types (no shared library
//! involved) and lays out temporary module trees for registry tests.
//! Misbehaving fixture modules live in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod tree;

use std::sync::Arc;

use dynsys_abi::sdk::{JobPlugin, OdePlugin, SolverPlugin};
use dynsys_abi::ModuleTable;
use dynsys_core::ArgValue;
use dynsys_host::{JobFactory, ModuleHandle, OdeFactory, SolverFactory};

pub use tree::ModuleTree;

/// Row-major `P` for `x0' = x1, x1' = -x0`: from `(0, 1)` the linear ODE
/// traces `(sin t, cos t)`.
pub const ROTATION: [f64; 4] = [0.0, 1.0, -1.0, 0.0];

/// Validate `table` under a virtual path.
///
/// Panics if the table fails load-time validation.
pub fn module(table: ModuleTable) -> Arc<ModuleHandle> {
    let handle = ModuleHandle::from_table("mem://fixture", table, None)
        .unwrap_or_else(|e| panic!("fixture table rejected: {e}"));
    Arc::new(handle)
}

pub fn ode_factory<T: OdePlugin>() -> OdeFactory {
    OdeFactory::new(module(ModuleTable::ode::<T>())).unwrap_or_else(|e| panic!("{e}"))
}

pub fn solver_factory<S: SolverPlugin>() -> SolverFactory {
    SolverFactory::new(module(ModuleTable::solver::<S>())).unwrap_or_else(|e| panic!("{e}"))
}

pub fn job_factory<J: JobPlugin>() -> JobFactory {
    JobFactory::new(module(ModuleTable::job::<J>())).unwrap_or_else(|e| panic!("{e}"))
}

/// Owned `(name, value)` pairs from borrowed literals.
pub fn supplied<const N: usize>(pairs: [(&str, ArgValue); N]) -> Vec<(String, ArgValue)> {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Exploding, Stalling};
    use dynsys_core::Role;

    #[test]
    fn factories_carry_fixture_metadata() {
        let ode = ode_factory::<Exploding>();
        assert_eq!(ode.name(), "exploding");
        assert_eq!(ode.role(), Role::Ode);
        let solver = solver_factory::<Stalling>();
        assert_eq!(solver.name(), "stalling");
        assert!(solver.schema().is_empty());
    }

    #[test]
    fn supplied_keeps_order() {
        let pairs = supplied([("b", ArgValue::from(1)), ("a", ArgValue::from(2.0))]);
        let names: Vec<_> = pairs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }
}
