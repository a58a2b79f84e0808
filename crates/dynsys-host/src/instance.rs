//! Owned plugin-side instances.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Arc;

use dynsys_abi::{DsArgBlock, DsArgValue, ErrorSlot};
use dynsys_core::{ArgRecord, ArgValue, ConstructionError};
use tracing::{debug, warn};

use crate::module::ModuleHandle;

/// One live handle from `ds_construct`, destroyed on drop.
///
/// Keeps its module alive, so the entry points it calls stay mapped.
pub(crate) struct Instance {
    module: Arc<ModuleHandle>,
    handle: NonNull<c_void>,
}

// SAFETY: an instance is exclusively owned and only used through
// `&mut self` or by value; modules must tolerate being driven from a
// thread other than the one that built them. Not Sync.
#[allow(unsafe_code)]
unsafe impl Send for Instance {}

impl Instance {
    /// Marshal `record` into a flat argument block and construct.
    #[allow(unsafe_code)]
    pub(crate) fn construct(
        module: &Arc<ModuleHandle>,
        record: &ArgRecord,
    ) -> Result<Self, ConstructionError> {
        let values = marshal(record);
        let block = DsArgBlock {
            values: values.as_ptr(),
            len: values.len(),
        };
        let mut out = std::ptr::null_mut();
        let mut slot = ErrorSlot::new();
        // SAFETY: block and its text payloads borrow `values` and
        // `record`, both alive for the call.
        let rc = unsafe { (module.table().construct)(&block, &mut out, slot.as_raw()) };
        if rc != 0 {
            let reason = slot.message_or(|| format!("constructor returned status {rc}"));
            warn!(module = module.name(), code = rc, %reason, "construction rejected");
            return Err(ConstructionError {
                module: module.name().to_owned(),
                reason,
            });
        }
        let handle = NonNull::new(out).ok_or_else(|| ConstructionError {
            module: module.name().to_owned(),
            reason: "constructor returned a null handle".into(),
        })?;
        debug!(module = module.name(), role = %module.role(), "constructed instance");
        Ok(Self {
            module: Arc::clone(module),
            handle,
        })
    }

    pub(crate) fn module(&self) -> &ModuleHandle {
        &self.module
    }

    pub(crate) fn name(&self) -> &str {
        self.module.name()
    }

    pub(crate) fn as_ptr(&self) -> *mut c_void {
        self.handle.as_ptr()
    }
}

impl Drop for Instance {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        // SAFETY: handle came from this module's ds_construct and is
        // destroyed exactly once.
        unsafe { (self.module.table().destroy)(self.handle.as_ptr()) };
    }
}

/// One `DsArgValue` per record entry, in schema order. Text payloads
/// borrow from `record`.
fn marshal(record: &ArgRecord) -> Vec<DsArgValue> {
    record
        .values()
        .map(|value| match value {
            ArgValue::Integer(v) => DsArgValue::integer(*v),
            ArgValue::Real(v) => DsArgValue::real(*v),
            ArgValue::Text(v) => DsArgValue::text(v),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynsys_abi::DsArgKind;
    use dynsys_core::{ArgKind, ArgSpec, Schema};

    #[test]
    fn marshal_keeps_schema_order_and_kinds() {
        let schema = Schema::new(vec![
            ArgSpec::new("t_step", ArgKind::Real),
            ArgSpec::new("n", ArgKind::Integer),
            ArgSpec::new("file", ArgKind::Text),
        ])
        .unwrap();
        let record = schema
            .validate([
                ("file", ArgValue::from("out.txt")),
                ("n", ArgValue::from(3)),
                ("t_step", ArgValue::from(0.5)),
            ])
            .unwrap();
        let values = marshal(&record);
        let kinds: Vec<_> = values.iter().map(|v| DsArgKind::from_raw(v.kind)).collect();
        assert_eq!(
            kinds,
            [Some(DsArgKind::Real), Some(DsArgKind::Integer), Some(DsArgKind::Text)]
        );
        assert_eq!(values[0].real, 0.5);
        assert_eq!(values[1].integer, 3);
        assert_eq!(values[2].text.len, "out.txt".len());
    }
}
