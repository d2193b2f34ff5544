//! Backends: what a capability table's slots actually do.
//!
//! [`ProductionBackend`] serves real requests: output to the writer
//! (standard output by default), blocks from the global allocator.
//! [`DebugBackend`] is for interactive runs: output to the console and a
//! small [`BumpArena`] so leaks stay bounded and visible.

use std::alloc::{self, Layout};
use std::io::{self, Stdout, Write};
use std::ptr::NonNull;

use crate::arena::BumpArena;
use crate::format::{self, Arg};
use crate::request::Request;
use crate::scan::Scanned;

/// Operations behind the capability table slots.
///
/// Sentinels are the trampolines' business; backends report failure with
/// `Err`/`None`.
pub trait Backend {
    /// Formatted output. Returns the number of bytes written.
    fn write(&mut self, fmt: &[u8], args: &[Arg<'_>]) -> io::Result<usize>;

    /// Match `fmt` against the query parameters.
    fn scan_query(&mut self, request: &mut Request, fmt: &[u8]) -> Option<Vec<Scanned>> {
        request.scan_query(fmt)
    }

    /// Match `fmt` against the request body. Not supported by default.
    fn scan_form(&mut self, request: &mut Request, fmt: &[u8]) -> Option<Vec<Scanned>> {
        let _ = (request, fmt);
        None
    }

    /// A block of at least `nbytes` bytes valid until the invocation ends.
    fn alloc(&mut self, nbytes: usize) -> Option<NonNull<u8>>;

    /// Release a block from [`alloc`](Self::alloc).
    ///
    /// # Safety
    ///
    /// `ptr` must come from this backend's `alloc` and not be freed yet.
    unsafe fn free(&mut self, ptr: NonNull<u8>);

    /// Called once after the entry point returns.
    fn cleanup(&mut self);
}

fn write_rendered<W: Write>(out: &mut W, fmt: &[u8], args: &[Arg<'_>]) -> io::Result<usize> {
    let rendered = format::render(fmt, args);
    out.write_all(&rendered)?;
    Ok(rendered.len())
}

// ── Production ──────────────────────────────────────────────────────────

/// Size header in front of every production block.
///
/// Holds the requested size so `free` can rebuild the layout; 16 bytes keeps
/// the returned block 16-byte aligned.
const HEADER_SIZE: usize = 16;
const BLOCK_ALIGN: usize = 16;

pub struct ProductionBackend<W: Write = Stdout> {
    out: W,
    live_blocks: usize,
}

impl ProductionBackend<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for ProductionBackend<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ProductionBackend<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            live_blocks: 0,
        }
    }

    /// Blocks allocated and not yet freed.
    pub fn live_blocks(&self) -> usize {
        self.live_blocks
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn layout_for(nbytes: usize) -> Option<Layout> {
        let total = nbytes.checked_add(HEADER_SIZE)?;
        Layout::from_size_align(total, BLOCK_ALIGN).ok()
    }
}

impl<W: Write> Backend for ProductionBackend<W> {
    fn write(&mut self, fmt: &[u8], args: &[Arg<'_>]) -> io::Result<usize> {
        write_rendered(&mut self.out, fmt, args)
    }

    fn alloc(&mut self, nbytes: usize) -> Option<NonNull<u8>> {
        let layout = Self::layout_for(nbytes)?;
        // SAFETY: layout size is at least HEADER_SIZE, never zero.
        let base = NonNull::new(unsafe { alloc::alloc(layout) })?;
        // SAFETY: base is valid for `layout.size()` bytes and 16-byte aligned.
        unsafe {
            base.cast::<usize>().as_ptr().write(nbytes);
            self.live_blocks += 1;
            Some(base.add(HEADER_SIZE))
        }
    }

    unsafe fn free(&mut self, ptr: NonNull<u8>) {
        // SAFETY: caller guarantees `ptr` came from `alloc`, which placed the
        // size header HEADER_SIZE bytes before it.
        unsafe {
            let base = ptr.sub(HEADER_SIZE);
            let nbytes = base.cast::<usize>().as_ptr().read();
            let Some(layout) = Self::layout_for(nbytes) else {
                return;
            };
            alloc::dealloc(base.as_ptr(), layout);
        }
        self.live_blocks = self.live_blocks.saturating_sub(1);
    }

    fn cleanup(&mut self) {
        if self.live_blocks > 0 {
            tracing::debug!(blocks = self.live_blocks, "blocks not freed by the artifact");
        }
        if let Err(err) = self.out.flush() {
            tracing::warn!(%err, "flushing output failed");
        }
    }
}

// ── Debug ───────────────────────────────────────────────────────────────

pub struct DebugBackend<W: Write = Stdout> {
    out: W,
    arena: BumpArena,
}

impl DebugBackend<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for DebugBackend<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> DebugBackend<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            arena: BumpArena::new(),
        }
    }

    /// Debug backend whose arena holds `capacity` bytes.
    pub fn with_capacity(out: W, capacity: usize) -> Self {
        Self {
            out,
            arena: BumpArena::with_capacity(capacity),
        }
    }

    pub fn arena(&self) -> &BumpArena {
        &self.arena
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }
}

impl<W: Write> Backend for DebugBackend<W> {
    /// Also marks the arena: `cleanup` rewinds to the offset seen here.
    fn write(&mut self, fmt: &[u8], args: &[Arg<'_>]) -> io::Result<usize> {
        self.arena.mark();
        let n = write_rendered(&mut self.out, fmt, args)?;
        self.out.flush()?;
        Ok(n)
    }

    fn alloc(&mut self, nbytes: usize) -> Option<NonNull<u8>> {
        self.arena.alloc(nbytes)
    }

    unsafe fn free(&mut self, ptr: NonNull<u8>) {
        if !self.arena.contains(ptr.as_ptr()) {
            tracing::warn!("free of a block the debug arena does not own");
        }
    }

    fn cleanup(&mut self) {
        self.arena.rewind();
        tracing::debug!(offset = self.arena.offset(), "debug arena rewound");
    }
}

#[cfg(test)]
mod tests;
