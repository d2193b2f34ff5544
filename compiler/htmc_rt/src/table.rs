//! Capability table: the [`RawHandover`] an artifact receives, plus the
//! request and backend its slots dispatch to.
//!
//! The table is boxed so the raw record has a stable address. Because the
//! record is the first field of a `#[repr(C)]` struct, a trampoline can turn
//! the `htmc_handover_t *` it receives back into the owning table.

use std::ffi::{c_char, c_int, c_void, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};

use crate::backend::Backend;
use crate::format::Arg;
use crate::request::{Request, RequestContext};
use crate::scan::Scanned;
use crate::{RawArg, RawHandover, ABI_VERSION, ARG_CHAR, ARG_FLOAT, ARG_INT, ARG_STR};

/// Failure sentinel of the integer-returning slots.
const FAILURE: c_int = -1;

/// Printed for a null `%s` argument, as glibc does.
const NULL_STR: &[u8] = b"(null)";

#[repr(C)]
pub struct CapabilityTable<B: Backend> {
    // Must stay the first field.
    raw: RawHandover,
    request: Request,
    backend: B,
}

impl<B: Backend> CapabilityTable<B> {
    /// Build a table for one invocation. Request defaults are applied here.
    pub fn new(backend: B, context: RequestContext) -> Box<Self> {
        let request = Request::resolve(context);
        let raw = RawHandover {
            abi_version: ABI_VERSION,
            request_method: request.method().as_ptr(),
            query_string: request.query_string().as_ptr(),
            content_type: request.content_type().as_ptr(),
            content_length: request.content_length(),
            request_body: request.body().as_ptr(),
            write: write_trampoline::<B>,
            query_scan: query_scan_trampoline::<B>,
            form_scan: form_scan_trampoline::<B>,
            alloc: alloc_trampoline::<B>,
            free: free_trampoline::<B>,
            cleanup: cleanup_trampoline::<B>,
        };
        // The CStrings' heap buffers do not move with `request`.
        Box::new(Self {
            raw,
            request,
            backend,
        })
    }

    /// Pointer handed to the artifact entry point.
    ///
    /// Derived from the whole table, not the `raw` field, so trampolines may
    /// reach `request` and `backend` through it.
    pub fn as_raw_ptr(&mut self) -> *mut RawHandover {
        ptr::from_mut(self).cast::<RawHandover>()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run the backend's end-of-invocation cleanup.
    pub fn cleanup(&mut self) {
        self.backend.cleanup();
    }

    pub fn into_backend(self: Box<Self>) -> B {
        self.backend
    }
}

// ── Trampolines ─────────────────────────────────────────────────────────

/// Recover the table that owns `raw`.
///
/// # Safety
///
/// `raw` must be null or point to the `raw` field of a live
/// `CapabilityTable<B>` with no other active reference to it.
unsafe fn table_from_raw<'t, B: Backend>(raw: *mut RawHandover) -> Option<&'t mut CapabilityTable<B>> {
    raw.cast::<CapabilityTable<B>>().as_mut()
}

/// Run `f` at the ABI boundary: unwinding into C is undefined behavior.
fn guarded<T>(slot: &'static str, fallback: T, f: impl FnOnce() -> T) -> T {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        tracing::error!(slot, "panic in capability slot");
        fallback
    })
}

/// View the argument array the glue packed.
///
/// # Safety
///
/// `args` must be null with `nargs == 0`, or point to `nargs` valid records.
unsafe fn raw_args<'a>(args: *const RawArg, nargs: usize) -> &'a [RawArg] {
    if args.is_null() || nargs == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(args, nargs)
    }
}

/// Convert output arguments. `None` for an unknown kind.
///
/// # Safety
///
/// String arguments must be null or NUL-terminated.
unsafe fn output_args<'a>(raw: &[RawArg]) -> Option<Vec<Arg<'a>>> {
    raw.iter()
        .map(|arg| {
            Some(match arg.kind {
                ARG_INT => Arg::Int(arg.value.i),
                ARG_FLOAT => Arg::Float(arg.value.f),
                ARG_CHAR => Arg::Char(arg.value.i as u8),
                ARG_STR if arg.value.s.is_null() => Arg::Str(NULL_STR),
                ARG_STR => Arg::Str(CStr::from_ptr(arg.value.s).to_bytes()),
                _ => return None,
            })
        })
        .collect()
}

/// Store scanned values into the destinations, pairing them in order.
///
/// A destination whose kind does not match its value, or that is null, is
/// skipped.
///
/// # Safety
///
/// Each `ptr` must be valid for the C type its kind names; string
/// destinations must be large enough for the value and a NUL.
unsafe fn store_scanned(dests: &[RawArg], values: &[Scanned]) {
    for (dest, value) in dests.iter().zip(values) {
        let ptr = dest.value.ptr;
        if ptr.is_null() {
            continue;
        }
        match (dest.kind, value) {
            (ARG_INT, Scanned::Int(v)) => ptr.cast::<c_int>().write_unaligned(*v),
            (ARG_FLOAT, Scanned::Float(v)) => ptr.cast::<f32>().write_unaligned(*v),
            (ARG_CHAR, Scanned::Char(v)) => ptr.cast::<u8>().write(*v),
            (ARG_STR, Scanned::Str(v)) => {
                let dst = ptr.cast::<u8>();
                ptr::copy_nonoverlapping(v.as_ptr(), dst, v.len());
                dst.add(v.len()).write(0);
            }
            _ => tracing::warn!(kind = dest.kind, "scan destination kind mismatch"),
        }
    }
}

extern "C" fn write_trampoline<B: Backend>(
    raw: *mut RawHandover,
    fmt: *const c_char,
    args: *const RawArg,
    nargs: usize,
) -> c_int {
    guarded("write", FAILURE, || {
        // SAFETY: the glue passes the handover it was bound to, a C string
        // format, and an array of `nargs` packed arguments.
        unsafe {
            let Some(table) = table_from_raw::<B>(raw) else {
                return FAILURE;
            };
            if fmt.is_null() {
                return FAILURE;
            }
            let fmt = CStr::from_ptr(fmt).to_bytes();
            let Some(args) = output_args(raw_args(args, nargs)) else {
                return FAILURE;
            };
            match table.backend.write(fmt, &args) {
                Ok(n) => c_int::try_from(n).unwrap_or(c_int::MAX),
                Err(err) => {
                    tracing::warn!(%err, "write failed");
                    FAILURE
                }
            }
        }
    })
}

/// Which request text a scan reads.
#[derive(Clone, Copy)]
enum ScanSource {
    Query,
    Form,
}

/// Shared body of the scan slots.
///
/// # Safety
///
/// Same contract as the slots themselves.
unsafe fn scan_slot<B: Backend>(
    source: ScanSource,
    raw: *mut RawHandover,
    fmt: *const c_char,
    args: *const RawArg,
    nargs: usize,
) -> c_int {
    let Some(table) = table_from_raw::<B>(raw) else {
        return FAILURE;
    };
    if fmt.is_null() {
        return FAILURE;
    }
    let fmt = CStr::from_ptr(fmt).to_bytes();
    let CapabilityTable {
        request, backend, ..
    } = table;
    let scanned = match source {
        ScanSource::Query => backend.scan_query(request, fmt),
        ScanSource::Form => backend.scan_form(request, fmt),
    };
    match scanned {
        Some(values) => {
            store_scanned(raw_args(args, nargs), &values);
            0
        }
        None => FAILURE,
    }
}

extern "C" fn query_scan_trampoline<B: Backend>(
    raw: *mut RawHandover,
    fmt: *const c_char,
    args: *const RawArg,
    nargs: usize,
) -> c_int {
    // SAFETY: see `scan_slot`.
    guarded("query_scan", FAILURE, || unsafe {
        scan_slot::<B>(ScanSource::Query, raw, fmt, args, nargs)
    })
}

extern "C" fn form_scan_trampoline<B: Backend>(
    raw: *mut RawHandover,
    fmt: *const c_char,
    args: *const RawArg,
    nargs: usize,
) -> c_int {
    // SAFETY: see `scan_slot`.
    guarded("form_scan", FAILURE, || unsafe {
        scan_slot::<B>(ScanSource::Form, raw, fmt, args, nargs)
    })
}

extern "C" fn alloc_trampoline<B: Backend>(raw: *mut RawHandover, nbytes: usize) -> *mut c_void {
    guarded("alloc", ptr::null_mut(), || {
        // SAFETY: the glue passes the handover it was bound to.
        let Some(table) = (unsafe { table_from_raw::<B>(raw) }) else {
            return ptr::null_mut();
        };
        table
            .backend
            .alloc(nbytes)
            .map_or(ptr::null_mut(), |block| block.as_ptr().cast())
    })
}

extern "C" fn free_trampoline<B: Backend>(raw: *mut RawHandover, ptr: *mut c_void) {
    guarded("free", (), || {
        // SAFETY: the glue passes the handover it was bound to.
        let Some(table) = (unsafe { table_from_raw::<B>(raw) }) else {
            return;
        };
        if let Some(block) = NonNull::new(ptr.cast::<u8>()) {
            // SAFETY: generated code only frees blocks it got from `alloc`.
            unsafe { table.backend.free(block) };
        }
    });
}

extern "C" fn cleanup_trampoline<B: Backend>(raw: *mut RawHandover) {
    guarded("cleanup", (), || {
        // SAFETY: the glue passes the handover it was bound to.
        if let Some(table) = unsafe { table_from_raw::<B>(raw) } {
            table.cleanup();
        }
    });
}
