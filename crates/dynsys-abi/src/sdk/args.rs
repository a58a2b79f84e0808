//! Typed access to a constructor's argument block.

use crate::sdk::PluginError;
use crate::types::{DsArgKind, DsArgSpec, DsArgValue};

/// Arguments passed to [`Construct::construct`](crate::sdk::Construct::construct),
/// addressed by declared name.
///
/// The trampoline has already checked that there is one value per
/// schema entry and that every value carries its declared kind.
#[derive(Clone, Copy, Debug)]
pub struct Arguments<'a> {
    schema: &'static [DsArgSpec],
    values: &'a [DsArgValue],
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(schema: &'static [DsArgSpec], values: &'a [DsArgValue]) -> Self {
        Self { schema, values }
    }

    /// The named `integer` argument.
    pub fn integer(&self, name: &str) -> Result<i64, PluginError> {
        self.lookup(name, DsArgKind::Integer).map(|v| v.integer)
    }

    /// The named `real` argument.
    pub fn real(&self, name: &str) -> Result<f64, PluginError> {
        self.lookup(name, DsArgKind::Real).map(|v| v.real)
    }

    /// The named `text` argument, borrowed for the constructor call.
    #[allow(unsafe_code)]
    pub fn text(&self, name: &str) -> Result<&'a str, PluginError> {
        let value = self.lookup(name, DsArgKind::Text)?;
        // SAFETY: the host keeps text payloads alive for the whole
        // ds_construct call, which outlives 'a.
        unsafe { value.text.as_str() }
            .ok_or_else(|| PluginError::invalid(format!("argument '{name}' is not valid UTF-8")))
    }

    #[allow(unsafe_code)]
    fn lookup(&self, name: &str, kind: DsArgKind) -> Result<&'a DsArgValue, PluginError> {
        let index = self
            .schema
            .iter()
            // SAFETY: SDK schemas are built from 'static literals.
            .position(|spec| unsafe { spec.name.as_str() } == Some(name))
            .ok_or_else(|| PluginError::invalid(format!("argument '{name}' is not declared")))?;
        if self.schema[index].kind != kind as i32 {
            return Err(PluginError::invalid(format!(
                "argument '{name}' is not declared as {kind:?}"
            )));
        }
        Ok(&self.values[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SCHEMA: [DsArgSpec; 3] = [
        DsArgSpec::real("t_step"),
        DsArgSpec::integer("n"),
        DsArgSpec::text("file"),
    ];

    #[test]
    fn lookup_by_name_and_kind() {
        let values = [
            DsArgValue::real(0.5),
            DsArgValue::integer(3),
            DsArgValue::text("portrait.txt"),
        ];
        let args = Arguments::new(&SCHEMA, &values);
        assert_eq!(args.real("t_step").unwrap(), 0.5);
        assert_eq!(args.integer("n").unwrap(), 3);
        assert_eq!(args.text("file").unwrap(), "portrait.txt");
    }

    #[test]
    fn wrong_kind_or_name_is_invalid() {
        let values = [
            DsArgValue::real(0.5),
            DsArgValue::integer(3),
            DsArgValue::text("a"),
        ];
        let args = Arguments::new(&SCHEMA, &values);
        assert!(args.integer("t_step").is_err());
        assert!(args.real("h_max").is_err());
    }
}
