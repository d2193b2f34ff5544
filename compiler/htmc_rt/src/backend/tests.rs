use std::io::{self, Write};

use pretty_assertions::assert_eq;

use super::{Backend, DebugBackend, ProductionBackend};
use crate::format::Arg;
use crate::request::{Request, RequestContext};

#[test]
fn production_writes_rendered_output() {
    let mut backend = ProductionBackend::with_writer(Vec::new());
    let n = backend.write(b"<b>%d</b>", &[Arg::Int(12)]).unwrap();
    assert_eq!(n, 9);
    assert_eq!(backend.into_writer(), b"<b>12</b>".to_vec());
}

#[test]
fn production_alloc_free_round_trip() {
    let mut backend = ProductionBackend::with_writer(Vec::new());
    let block = backend.alloc(100).unwrap();
    assert_eq!(block.as_ptr() as usize % 16, 0);
    // SAFETY: block holds 100 bytes.
    unsafe {
        std::ptr::write_bytes(block.as_ptr(), 0xAB, 100);
        assert_eq!(*block.as_ptr().add(99), 0xAB);
    }
    assert_eq!(backend.live_blocks(), 1);
    // SAFETY: block came from this backend.
    unsafe { backend.free(block) };
    assert_eq!(backend.live_blocks(), 0);
}

#[test]
fn production_zero_byte_alloc_is_valid() {
    let mut backend = ProductionBackend::with_writer(Vec::new());
    let block = backend.alloc(0).unwrap();
    // SAFETY: block came from this backend.
    unsafe { backend.free(block) };
}

#[test]
fn production_form_scan_is_unsupported() {
    let mut backend = ProductionBackend::with_writer(Vec::new());
    let mut request = Request::resolve(RequestContext {
        body: Some(b"a=1".to_vec()),
        ..RequestContext::default()
    });
    assert_eq!(backend.scan_form(&mut request, b"a=%d"), None);
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn write_error_surfaces() {
    let mut backend = ProductionBackend::with_writer(BrokenPipe);
    assert!(backend.write(b"x", &[]).is_err());
}

#[test]
fn debug_allocations_past_capacity_fail() {
    let mut backend = DebugBackend::with_writer(Vec::new());
    for _ in 0..64 {
        assert!(backend.alloc(16).is_some());
    }
    assert_eq!(backend.arena().offset(), 1024);
    assert!(backend.alloc(1).is_none());
}

#[test]
fn debug_large_request_fails_on_the_overflowing_call() {
    let mut backend = DebugBackend::with_writer(Vec::new());
    assert!(backend.alloc(512).is_some());
    assert!(backend.alloc(500).is_some());
    assert!(backend.alloc(100).is_none());
    assert_eq!(backend.arena().offset(), 1024);
}

#[test]
fn debug_cleanup_rewinds_to_last_write() {
    let mut backend = DebugBackend::with_writer(Vec::new());
    backend.alloc(32).unwrap();
    backend.write(b"hi", &[]).unwrap();
    backend.alloc(64).unwrap();
    assert_eq!(backend.arena().offset(), 96);

    backend.cleanup();
    assert_eq!(backend.arena().offset(), 32);
    backend.cleanup();
    assert_eq!(backend.arena().offset(), 32);
    assert_eq!(backend.into_writer(), b"hi".to_vec());
}

#[test]
fn debug_custom_capacity() {
    let mut backend = DebugBackend::with_capacity(Vec::new(), 32);
    assert!(backend.alloc(32).is_some());
    assert!(backend.alloc(1).is_none());
}

#[test]
fn debug_free_is_a_no_op() {
    let mut backend = DebugBackend::with_writer(Vec::new());
    let block = backend.alloc(16).unwrap();
    // SAFETY: block came from this backend.
    unsafe { backend.free(block) };
    assert_eq!(backend.arena().offset(), 16);
}
