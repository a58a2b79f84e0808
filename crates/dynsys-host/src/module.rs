//! Validated module handles.
//!
//! A [`ModuleHandle`] is built from a [`ModuleTable`] only after the
//! table passes every check: ABI version, a known role with matching
//! entry points, a non-empty UTF-8 name and a well-formed schema. The
//! same checks run for shared libraries and in-process tables.

use std::fmt;
use std::path::{Path, PathBuf};

use dynsys_abi::symbols::{SYM_JOB_RUN, SYM_ODE_DERIVATIVE, SYM_SOLVER_STEP};
use dynsys_abi::{DsArgKind, DsRole, ModuleTable, DS_ABI_VERSION};
use dynsys_core::{ArgKind, ArgSpec, LoadError, Role, Schema};

/// A loaded module: resolved entry points plus cached metadata.
///
/// Shared through `Arc` by its factory and every instance it creates,
/// so the library stays mapped while anything can still call into it.
pub struct ModuleHandle {
    path: PathBuf,
    name: String,
    role: Role,
    schema: Schema,
    table: ModuleTable,
    // Declared last: dropped after everything above.
    _library: Option<libloading::Library>,
}

impl ModuleHandle {
    /// Validate `table` and cache its metadata.
    ///
    /// `library`, when given, is the shared object the table was
    /// resolved from and is kept open for the handle's lifetime.
    #[allow(unsafe_code)]
    pub fn from_table(
        path: impl Into<PathBuf>,
        table: ModuleTable,
        library: Option<libloading::Library>,
    ) -> Result<Self, LoadError> {
        let path = path.into();
        // SAFETY: resolved entry point taking no arguments.
        let found = unsafe { (table.abi_version)() };
        check_abi_version(&path, found)?;
        let role = decode_role(&path, &table)?;
        let name = decode_name(&path, &table)?;
        let schema = decode_schema(&path, &table)?;
        Ok(Self {
            path,
            name,
            role,
            schema,
            table,
            _library: library,
        })
    }

    /// Path the module was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name reported by the module.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Declared argument schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn table(&self) -> &ModuleTable {
        &self.table
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

// ── Checks ──────────────────────────────────────────────────────

pub(crate) fn check_abi_version(path: &Path, found: u32) -> Result<(), LoadError> {
    if found != DS_ABI_VERSION {
        return Err(LoadError::AbiMismatch {
            path: path.to_owned(),
            found,
            expected: DS_ABI_VERSION,
        });
    }
    Ok(())
}

pub(crate) fn role_from_raw(value: i32) -> Option<Role> {
    DsRole::from_raw(value).map(|role| match role {
        DsRole::Ode => Role::Ode,
        DsRole::Solver => Role::Solver,
        DsRole::Job => Role::Job,
    })
}

/// The symbol whose absence a role/entry-point disagreement stands for.
pub(crate) fn role_symbol(role: Role) -> &'static str {
    match role {
        Role::Ode => SYM_ODE_DERIVATIVE,
        Role::Solver => SYM_SOLVER_STEP,
        Role::Job => SYM_JOB_RUN,
    }
}

#[allow(unsafe_code)]
fn decode_role(path: &Path, table: &ModuleTable) -> Result<Role, LoadError> {
    // SAFETY: resolved entry point taking no arguments.
    let value = unsafe { (table.role)() };
    let role = role_from_raw(value).ok_or_else(|| LoadError::UnknownRole {
        path: path.to_owned(),
        value,
    })?;
    if role_from_raw(table.entry.role() as i32) != Some(role) {
        return Err(LoadError::MissingEntryPoint {
            path: path.to_owned(),
            symbol: role_symbol(role),
        });
    }
    Ok(role)
}

#[allow(unsafe_code)]
fn decode_name(path: &Path, table: &ModuleTable) -> Result<String, LoadError> {
    // SAFETY: resolved entry point taking no arguments; the string it
    // returns points into the module's static data.
    let raw = unsafe { (table.name)() };
    // SAFETY: see above.
    let name = unsafe { raw.as_str() }.ok_or_else(|| LoadError::InvalidName {
        path: path.to_owned(),
        reason: "not valid UTF-8".into(),
    })?;
    if name.is_empty() {
        return Err(LoadError::InvalidName {
            path: path.to_owned(),
            reason: "empty".into(),
        });
    }
    Ok(name.to_owned())
}

#[allow(unsafe_code)]
fn decode_schema(path: &Path, table: &ModuleTable) -> Result<Schema, LoadError> {
    let invalid = |reason: String| LoadError::InvalidSchema {
        path: path.to_owned(),
        reason,
    };
    // SAFETY: resolved entry point taking no arguments.
    let raw = unsafe { (table.schema)() };
    if raw.len > 0 && raw.specs.is_null() {
        return Err(invalid("null entries".into()));
    }
    let specs = if raw.len == 0 {
        &[][..]
    } else {
        // SAFETY: non-null, and the module guarantees len static entries.
        unsafe { std::slice::from_raw_parts(raw.specs, raw.len) }
    };
    let mut decoded = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        // SAFETY: names point into the module's static data.
        let name = unsafe { spec.name.as_str() }
            .ok_or_else(|| invalid(format!("entry {index} has a non-UTF-8 name")))?;
        let kind = match DsArgKind::from_raw(spec.kind) {
            Some(DsArgKind::Integer) => ArgKind::Integer,
            Some(DsArgKind::Real) => ArgKind::Real,
            Some(DsArgKind::Text) => ArgKind::Text,
            None => return Err(invalid(format!("entry '{name}' has unknown type {}", spec.kind))),
        };
        decoded.push(ArgSpec::new(name, kind));
    }
    Schema::new(decoded).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynsys_abi::sdk::{Arguments, Construct, JobPlugin, OdeView, PluginError, ProgressRef, SolverRef};
    use dynsys_abi::{DsArgSpec, DsStr, RoleEntryPoints};

    struct Twice;

    impl Construct for Twice {
        const NAME: &'static str = "twice";
        const SCHEMA: &'static [DsArgSpec] = &[DsArgSpec::real("a"), DsArgSpec::integer("a")];

        fn construct(_args: &Arguments<'_>) -> Result<Self, PluginError> {
            Ok(Self)
        }
    }

    impl JobPlugin for Twice {
        fn run(
            &mut self,
            _ode: &mut OdeView<'_>,
            _solver: &mut SolverRef<'_>,
            _progress: &mut ProgressRef<'_>,
        ) -> Result<(), PluginError> {
            Ok(())
        }
    }

    extern "C" fn future_version() -> u32 {
        DS_ABI_VERSION + 1
    }

    extern "C" fn empty_name() -> DsStr {
        DsStr::empty()
    }

    extern "C" fn solver_role() -> i32 {
        DsRole::Solver as i32
    }

    extern "C" fn bogus_role() -> i32 {
        9
    }

    #[test]
    fn duplicate_schema_names_are_rejected() {
        let err = ModuleHandle::from_table("twice", ModuleTable::job::<Twice>(), None).unwrap_err();
        assert!(matches!(err, LoadError::InvalidSchema { .. }), "{err}");
    }

    #[test]
    fn version_is_checked_first() {
        let table = ModuleTable {
            abi_version: future_version,
            ..ModuleTable::job::<Twice>()
        };
        let err = ModuleHandle::from_table("v2", table, None).unwrap_err();
        assert_eq!(
            err,
            LoadError::AbiMismatch {
                path: "v2".into(),
                found: DS_ABI_VERSION + 1,
                expected: DS_ABI_VERSION
            }
        );
    }

    #[test]
    fn empty_name_is_rejected() {
        let table = ModuleTable {
            name: empty_name,
            ..ModuleTable::job::<Twice>()
        };
        let err = ModuleHandle::from_table("anon", table, None).unwrap_err();
        assert!(matches!(err, LoadError::InvalidName { .. }));
    }

    #[test]
    fn role_must_agree_with_entry_points() {
        let table = ModuleTable {
            role: solver_role,
            ..ModuleTable::job::<Twice>()
        };
        assert!(matches!(table.entry, RoleEntryPoints::Job { .. }));
        let err = ModuleHandle::from_table("liar", table, None).unwrap_err();
        assert_eq!(
            err,
            LoadError::MissingEntryPoint {
                path: "liar".into(),
                symbol: SYM_SOLVER_STEP
            }
        );

        let table = ModuleTable {
            role: bogus_role,
            ..ModuleTable::job::<Twice>()
        };
        let err = ModuleHandle::from_table("odd", table, None).unwrap_err();
        assert_eq!(err, LoadError::UnknownRole { path: "odd".into(), value: 9 });
    }
}
