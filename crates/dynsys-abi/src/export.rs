//! `#[no_mangle]` export macros for plugin `cdylib` crates.
//!
//! Invoke exactly one of them, once, at the root of the crate that
//! builds the shared library:
//!
//! ```ignore
//! dynsys_abi::export_solver!(dynsys_models::Rk4);
//! ```
//!
//! Library crates that only provide plugin types must not invoke them;
//! linking two exporters into one binary would clash on symbol names.

/// Export the entry points shared by every role.
#[doc(hidden)]
#[macro_export]
macro_rules! __export_common {
    ($ty:ty, $role:path) => {
        /// ABI version of this module.
        #[no_mangle]
        #[allow(unsafe_code)]
        pub extern "C" fn ds_abi_version() -> u32 {
            $crate::sdk::trampoline::abi_version()
        }

        /// Role of this module.
        #[no_mangle]
        #[allow(unsafe_code)]
        pub extern "C" fn ds_role() -> i32 {
            $role as i32
        }

        /// Name of this module.
        #[no_mangle]
        #[allow(unsafe_code)]
        pub extern "C" fn ds_name() -> $crate::DsStr {
            $crate::sdk::trampoline::name::<$ty>()
        }

        /// Argument schema of this module.
        #[no_mangle]
        #[allow(unsafe_code)]
        pub extern "C" fn ds_schema() -> $crate::DsSchema {
            $crate::sdk::trampoline::schema::<$ty>()
        }

        /// Construct an instance from a validated argument block.
        ///
        /// # Safety
        ///
        /// See the ABI documentation of `ds_construct`.
        #[no_mangle]
        #[allow(unsafe_code)]
        pub unsafe extern "C" fn ds_construct(
            args: *const $crate::DsArgBlock,
            out_handle: *mut *mut ::core::ffi::c_void,
            err: *mut $crate::DsErrorBuf,
        ) -> i32 {
            unsafe { $crate::sdk::trampoline::construct::<$ty>(args, out_handle, err) }
        }

        /// Destroy an instance.
        ///
        /// # Safety
        ///
        /// `handle` must be null or come from `ds_construct`.
        #[no_mangle]
        #[allow(unsafe_code)]
        pub unsafe extern "C" fn ds_destroy(handle: *mut ::core::ffi::c_void) {
            unsafe { $crate::sdk::trampoline::destroy::<$ty>(handle) }
        }
    };
}

/// Export an [`OdePlugin`](crate::sdk::OdePlugin) type.
#[macro_export]
macro_rules! export_ode {
    ($ty:ty) => {
        $crate::__export_common!($ty, $crate::DsRole::Ode);

        /// Report `x_size` and `p_size`.
        ///
        /// # Safety
        ///
        /// See the ABI documentation of `ds_ode_sizes`.
        #[no_mangle]
        #[allow(unsafe_code)]
        pub unsafe extern "C" fn ds_ode_sizes(
            handle: *const ::core::ffi::c_void,
            out_x: *mut u64,
            out_p: *mut u64,
        ) -> i32 {
            unsafe { $crate::sdk::trampoline::ode_sizes::<$ty>(handle, out_x, out_p) }
        }

        /// Evaluate `dx/dt`.
        ///
        /// # Safety
        ///
        /// See the ABI documentation of `ds_ode_derivative`.
        #[no_mangle]
        #[allow(unsafe_code)]
        pub unsafe extern "C" fn ds_ode_derivative(
            handle: *const ::core::ffi::c_void,
            t: f64,
            x: *const f64,
            p: *const f64,
            n: u64,
            dxdt: *mut f64,
        ) -> i32 {
            unsafe { $crate::sdk::trampoline::ode_derivative::<$ty>(handle, t, x, p, n, dxdt) }
        }
    };
}

/// Export a [`SolverPlugin`](crate::sdk::SolverPlugin) type.
#[macro_export]
macro_rules! export_solver {
    ($ty:ty) => {
        $crate::__export_common!($ty, $crate::DsRole::Solver);

        /// Advance the viewed ODE by one step.
        ///
        /// # Safety
        ///
        /// See the ABI documentation of `ds_solver_step`.
        #[no_mangle]
        #[allow(unsafe_code)]
        pub unsafe extern "C" fn ds_solver_step(
            handle: *mut ::core::ffi::c_void,
            ode: *mut $crate::DsOdeView,
            t_limit: f64,
            err: *mut $crate::DsErrorBuf,
        ) -> i32 {
            unsafe { $crate::sdk::trampoline::solver_step::<$ty>(handle, ode, t_limit, err) }
        }
    };
}

/// Export a [`JobPlugin`](crate::sdk::JobPlugin) type.
#[macro_export]
macro_rules! export_job {
    ($ty:ty) => {
        $crate::__export_common!($ty, $crate::DsRole::Job);

        /// Run the driver.
        ///
        /// # Safety
        ///
        /// See the ABI documentation of `ds_job_run`.
        #[no_mangle]
        #[allow(unsafe_code)]
        pub unsafe extern "C" fn ds_job_run(
            handle: *mut ::core::ffi::c_void,
            ode: *mut $crate::DsOdeView,
            solver: *const $crate::DsSolverView,
            progress: *const $crate::DsProgressSink,
            err: *mut $crate::DsErrorBuf,
        ) -> i32 {
            unsafe {
                $crate::sdk::trampoline::job_run::<$ty>(handle, ode, solver, progress, err)
            }
        }
    };
}
