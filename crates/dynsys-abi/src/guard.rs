//! Panic containment at the module boundary.
//!
//! Unwinding across `extern "C"` aborts the process, so every SDK
//! trampoline runs its body under [`guard`].

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::errbuf::write_error;
use crate::status::DsStatus;
use crate::types::DsErrorBuf;

/// Run `body`, mapping a panic to [`DsStatus::Panicked`] and writing the
/// panic message into `err`.
///
/// # Safety
///
/// `err` must satisfy the contract of [`write_error`].
#[allow(unsafe_code)]
pub unsafe fn guard(err: *mut DsErrorBuf, body: impl FnOnce() -> i32) -> i32 {
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(code) => code,
        Err(payload) => {
            let msg = format!("panic: {}", panic_message(payload.as_ref()));
            // SAFETY: forwarded caller contract.
            unsafe { write_error(err, &msg) };
            DsStatus::Panicked as i32
        }
    }
}

/// Run `body`, swallowing any panic. For entry points with no status.
pub fn guard_void(body: impl FnOnce()) {
    let _ = catch_unwind(AssertUnwindSafe(body));
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errbuf::ErrorSlot;

    #[test]
    #[allow(unsafe_code)]
    fn panic_becomes_status_and_message() {
        let mut slot = ErrorSlot::new();
        // SAFETY: as_raw yields a valid buffer.
        let rc = unsafe { guard(slot.as_raw(), || panic!("boom at t = 0.5")) };
        assert_eq!(rc, DsStatus::Panicked as i32);
        assert_eq!(slot.message(), "panic: boom at t = 0.5");
    }

    #[test]
    #[allow(unsafe_code)]
    fn normal_return_passes_through() {
        let mut slot = ErrorSlot::new();
        // SAFETY: as_raw yields a valid buffer.
        let rc = unsafe { guard(slot.as_raw(), || DsStatus::IoFailure as i32) };
        assert_eq!(rc, -5);
        assert!(slot.message().is_empty());
    }
}
