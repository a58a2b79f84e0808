//! Status codes returned by every fallible entry point.
//!
//! [`DsStatus`] is a `repr(i32)` enum; `Ok` is zero and every failure is
//! negative. Values are ABI-stable: never renumber, only append.

/// C-compatible status code.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DsStatus {
    /// Success.
    Ok = 0,
    /// A handle is null or was already destroyed.
    InvalidHandle = -1,
    /// An argument is null, mistyped, out of range or otherwise invalid.
    InvalidArgument = -2,
    /// The constructor rejected well-typed arguments.
    ConstructionFailed = -3,
    /// A step produced a non-finite state.
    NumericalFailure = -4,
    /// Writing an output artifact failed.
    IoFailure = -5,
    /// The step budget was exhausted or a step made no progress.
    StepLimitExceeded = -6,
    /// A Rust panic was caught at the boundary.
    Panicked = -128,
}

impl DsStatus {
    /// Decode a raw status. Unknown values yield `None`.
    pub fn from_raw(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Ok,
            -1 => Self::InvalidHandle,
            -2 => Self::InvalidArgument,
            -3 => Self::ConstructionFailed,
            -4 => Self::NumericalFailure,
            -5 => Self::IoFailure,
            -6 => Self::StepLimitExceeded,
            -128 => Self::Panicked,
            _ => return None,
        })
    }

    /// The raw `i32` value.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// `true` for [`DsStatus::Ok`].
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}
