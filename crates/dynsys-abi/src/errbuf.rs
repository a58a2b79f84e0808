//! Writing and reading [`DsErrorBuf`] diagnostics.

use crate::types::DsErrorBuf;

/// Default capacity of an [`ErrorSlot`].
pub const ERROR_CAPACITY: usize = 512;

/// Copy `msg` into the caller's buffer, truncating on a char boundary.
///
/// A null `buf` or a buffer with null storage drops the message.
///
/// # Safety
///
/// `buf`, when non-null, must point at a `DsErrorBuf` whose `ptr` is
/// valid for writes of `cap` bytes.
#[allow(unsafe_code)]
pub unsafe fn write_error(buf: *mut DsErrorBuf, msg: &str) {
    if buf.is_null() {
        return;
    }
    // SAFETY: non-null per check, valid per contract.
    let buf = unsafe { &mut *buf };
    if buf.ptr.is_null() {
        buf.len = 0;
        return;
    }
    let mut end = msg.len().min(buf.cap);
    while !msg.is_char_boundary(end) {
        end -= 1;
    }
    // SAFETY: end <= cap; source and destination cannot overlap because
    // msg is a Rust string and ptr is caller storage.
    unsafe { std::ptr::copy_nonoverlapping(msg.as_ptr(), buf.ptr, end) };
    buf.len = end;
}

/// Owned storage for one diagnostic, reusable across calls.
///
/// The storage is boxed so the raw pointer handed out by
/// [`as_raw()`](Self::as_raw) stays put when the slot moves.
#[derive(Debug)]
pub struct ErrorSlot {
    storage: Box<[u8]>,
    raw: DsErrorBuf,
}

// SAFETY: the raw buffer only ever points into the slot's own boxed
// storage, which moves with it.
#[allow(unsafe_code)]
unsafe impl Send for ErrorSlot {}

impl ErrorSlot {
    /// A slot with [`ERROR_CAPACITY`] bytes.
    pub fn new() -> Self {
        Self::with_capacity(ERROR_CAPACITY)
    }

    /// A slot with `cap` bytes.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            storage: vec![0u8; cap].into_boxed_slice(),
            raw: DsErrorBuf {
                ptr: std::ptr::null_mut(),
                cap: 0,
                len: 0,
            },
        }
    }

    /// Clear the slot and return a buffer pointer for one call.
    pub fn as_raw(&mut self) -> *mut DsErrorBuf {
        self.raw = DsErrorBuf {
            ptr: self.storage.as_mut_ptr(),
            cap: self.storage.len(),
            len: 0,
        };
        &mut self.raw
    }

    /// The message written by the last call, lossily decoded.
    pub fn message(&self) -> String {
        let len = self.raw.len.min(self.storage.len());
        String::from_utf8_lossy(&self.storage[..len]).into_owned()
    }

    /// The message, or `fallback` if the callee wrote nothing.
    pub fn message_or(&self, fallback: impl FnOnce() -> String) -> String {
        let msg = self.message();
        if msg.is_empty() {
            fallback()
        } else {
            msg
        }
    }
}

impl Default for ErrorSlot {
    fn default() -> Self {
        Self::new()
    }
}
