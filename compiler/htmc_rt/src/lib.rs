//! htmc runtime (`htmc_rt`)
//!
//! Everything a loaded artifact talks to. Generated code never performs I/O,
//! allocation, or request introspection directly; it calls through the
//! function slots of a [`RawHandover`] supplied by the host.
//!
//! # Layers
//!
//! - **ABI**: [`RawHandover`] and [`RawArg`], `#[repr(C)]` mirrors of
//!   `libhtmc/libhtmc.h`.
//! - **Glue**: the C sources compiled into every artifact ([`glue`]). They
//!   turn variadic `htmc_printf`-style calls into `htmc_arg_t` arrays so no
//!   variadic call ever crosses into Rust.
//! - **Table**: [`CapabilityTable`] owns the raw record, the resolved
//!   request, and a [`Backend`]; its trampolines dispatch slot calls to the
//!   backend.
//! - **Engines**: [`format::render`] and [`scan::scan`], shared by every
//!   backend.
//!
//! # Safety
//!
//! The trampolines receive pointers from generated C code. The glue only
//! ever passes back the handover pointer it was bound to and argument arrays
//! it built itself; the trampolines still reject null pointers.

#![warn(clippy::allow_attributes_without_reason)]
#![allow(
    unsafe_code,
    reason = "C-ABI trampolines and arena pointers require unsafe for raw pointer operations"
)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    reason = "C ABI integer widths differ from Rust's; casts follow C conversion rules"
)]

use std::ffi::{c_char, c_int, c_longlong, c_uint, c_void};

pub mod arena;
pub mod backend;
pub mod format;
pub mod glue;
pub mod request;
pub mod scan;
pub mod table;

pub use arena::BumpArena;
pub use backend::{Backend, DebugBackend, ProductionBackend};
pub use format::Arg;
pub use request::{QueryState, Request, RequestContext};
pub use scan::Scanned;
pub use table::CapabilityTable;

/// Version of the handover layout. Stored in `abi_version`.
pub const ABI_VERSION: u32 = 1;

/// Symbol every artifact exports: `int htmc_main(htmc_handover_t *)`.
pub const ENTRY_SYMBOL: &str = "htmc_main";

/// `htmc_arg_t.kind` values.
pub const ARG_INT: c_int = 0;
pub const ARG_FLOAT: c_int = 1;
pub const ARG_CHAR: c_int = 2;
pub const ARG_STR: c_int = 3;

/// Payload of one packed argument.
#[repr(C)]
#[derive(Clone, Copy)]
pub union RawArgValue {
    pub i: c_longlong,
    pub f: f64,
    pub s: *const c_char,
    pub ptr: *mut c_void,
}

/// `htmc_arg_t`: one argument of a formatted call.
///
/// For output calls `value` holds the argument itself; for scans it holds
/// the destination pointer in `ptr`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawArg {
    pub kind: c_int,
    pub value: RawArgValue,
}

pub type FormatFn =
    extern "C" fn(*mut RawHandover, *const c_char, *const RawArg, usize) -> c_int;
pub type AllocFn = extern "C" fn(*mut RawHandover, usize) -> *mut c_void;
pub type FreeFn = extern "C" fn(*mut RawHandover, *mut c_void);
pub type CleanupFn = extern "C" fn(*mut RawHandover);

/// Signature of the artifact entry point.
pub type EntryFn = unsafe extern "C" fn(*mut RawHandover) -> c_int;

/// `struct htmc_handover`: the record generated code receives.
///
/// Field order and types must match `libhtmc/libhtmc.h`.
#[repr(C)]
pub struct RawHandover {
    pub abi_version: c_uint,
    pub request_method: *const c_char,
    pub query_string: *const c_char,
    pub content_type: *const c_char,
    pub content_length: usize,
    pub request_body: *const c_char,
    pub write: FormatFn,
    pub query_scan: FormatFn,
    pub form_scan: FormatFn,
    pub alloc: AllocFn,
    pub free: FreeFn,
    pub cleanup: CleanupFn,
}
