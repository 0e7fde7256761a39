//! Zstandard-backed codec engine
//!
//! Contexts and memory live in a handle arena; callers only ever see
//! [`ContextHandle`] and [`BufferHandle`] identifiers. The arena lock covers
//! handle lookup only. Each context and buffer has its own lock, so steps on
//! different contexts run in parallel.

use crate::engine::CodecEngine;
use crate::handle::{BufferHandle, ContextHandle, EndDirective, Region};
use crate::packed::StepResult;
use ferrozst_types::{Error, Result};

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};
use zstd::zstd_safe::{self, zstd_sys::ZSTD_EndDirective, CCtx, CParameter, DCtx, InBuffer, OutBuffer};

/// Status reported for unknown handles and out-of-bounds regions
/// (`ZSTD_error_GENERIC`).
const GENERIC_ERROR: u64 = 1;

type Shared<T> = Arc<Mutex<T>>;

struct CompressorSlot {
    cctx: CCtx<'static>,
    /// Set once an `End` step has flushed the whole frame
    frame_closed: bool,
}

struct DecompressorSlot {
    dctx: DCtx<'static>,
    /// Set while input of a frame has been consumed but the frame is not done
    frame_open: bool,
}

#[derive(Default)]
struct Arena {
    next_id: u32,
    released: Vec<NonZeroU32>,
    buffers: HashMap<u32, Shared<Vec<u8>>>,
    compressors: HashMap<u32, Shared<CompressorSlot>>,
    decompressors: HashMap<u32, Shared<DecompressorSlot>>,
}

impl Arena {
    /// Ids are shared across all three tables so a handle of one kind never
    /// aliases a live handle of another kind. Released ids are handed out
    /// again before fresh ones.
    fn issue_id(&mut self) -> Option<NonZeroU32> {
        if let Some(id) = self.released.pop() {
            return Some(id);
        }
        let id = self.next_id.checked_add(1)?;
        self.next_id = id;
        NonZeroU32::new(id)
    }

    /// Make `raw` available again once its entry was actually removed
    fn release_id(&mut self, removed: bool, raw: u32) {
        if let (true, Some(id)) = (removed, NonZeroU32::new(raw)) {
            self.released.push(id);
        }
    }
}

/// Codec engine backed by the Zstandard streaming API
pub struct ZstdEngine {
    arena: Mutex<Arena>,
}

impl ZstdEngine {
    /// Create an engine with an empty handle arena
    pub fn new() -> Self {
        Self {
            arena: Mutex::new(Arena::default()),
        }
    }

    /// Create an engine after checking the library can hand out contexts
    pub fn load() -> Result<Self> {
        let engine = Self::new();
        let trial = engine
            .create_compression_context()
            .ok_or_else(|| Error::initialization("Zstandard refused to create a context"))?;
        engine.free_compression_context(trial);
        debug!("Zstandard {} ready", zstd_safe::version_string());
        Ok(engine)
    }

    /// Number of live contexts and buffers, for leak checks
    pub fn live_handles(&self) -> usize {
        let arena = self.lock();
        arena.buffers.len() + arena.compressors.len() + arena.decompressors.len()
    }

    fn lock(&self) -> MutexGuard<'_, Arena> {
        lock(&self.arena)
    }

    fn buffer(&self, buffer: &BufferHandle) -> Option<Shared<Vec<u8>>> {
        self.lock().buffers.get(&buffer.raw()).cloned()
    }

    fn compressor(&self, ctx: &ContextHandle) -> Option<Shared<CompressorSlot>> {
        self.lock().compressors.get(&ctx.raw()).cloned()
    }

    fn decompressor(&self, ctx: &ContextHandle) -> Option<Shared<DecompressorSlot>> {
        self.lock().decompressors.get(&ctx.raw()).cloned()
    }

    /// Run `step` over the input and output regions of two distinct buffers
    fn with_regions<F>(&self, dst: Region<'_>, src: Region<'_>, step: F) -> i64
    where
        F: FnOnce(&[u8], &mut [u8]) -> i64,
    {
        if dst.buffer.raw() == src.buffer.raw() {
            return generic_error();
        }
        let (Some(src_memory), Some(dst_memory)) = (self.buffer(src.buffer), self.buffer(dst.buffer))
        else {
            return generic_error();
        };

        // Buffers are locked in id order so two steps can never deadlock.
        let (input, mut output) = if src.buffer.raw() < dst.buffer.raw() {
            let input = lock(&src_memory);
            (input, lock(&dst_memory))
        } else {
            let output = lock(&dst_memory);
            (lock(&src_memory), output)
        };

        let (Some(src_range), Some(dst_range)) = (src.range(), dst.range()) else {
            return generic_error();
        };
        match (input.get(src_range), output.get_mut(dst_range)) {
            (Some(input), Some(output)) => step(clamp_input(input), output),
            _ => generic_error(),
        }
    }
}

impl Default for ZstdEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Translate a zstd result into a status: sizes stay positive, error codes
/// (stored by zstd as `-(errno)` in a `size_t`) become negative.
fn status(result: zstd_safe::SafeResult) -> i64 {
    match result {
        Ok(value) => i64::try_from(value).unwrap_or(i64::MAX),
        Err(code) => StepResult::encode_error(code.wrapping_neg() as u64),
    }
}

fn step_result(consumed: usize, produced: usize) -> i64 {
    // Both are bounded by the slices handed to zstd, which are clamped below.
    StepResult::new(consumed as u32, produced as u32).encode()
}

fn generic_error() -> i64 {
    StepResult::encode_error(GENERIC_ERROR)
}

fn clamp_input(src: &[u8]) -> &[u8] {
    &src[..src.len().min(StepResult::MAX_CONSUMED as usize)]
}

impl CodecEngine for ZstdEngine {
    fn create_compression_context(&self) -> Option<ContextHandle> {
        let cctx = CCtx::try_create()?;
        let mut arena = self.lock();
        let id = arena.issue_id()?;
        let slot = CompressorSlot {
            cctx,
            frame_closed: false,
        };
        arena.compressors.insert(id.get(), Arc::new(Mutex::new(slot)));
        trace!("created compression context {}", id);
        Some(ContextHandle::from_raw(id))
    }

    fn create_decompression_context(&self) -> Option<ContextHandle> {
        let dctx = DCtx::try_create()?;
        let mut arena = self.lock();
        let id = arena.issue_id()?;
        let slot = DecompressorSlot {
            dctx,
            frame_open: false,
        };
        arena.decompressors.insert(id.get(), Arc::new(Mutex::new(slot)));
        trace!("created decompression context {}", id);
        Some(ContextHandle::from_raw(id))
    }

    fn free_compression_context(&self, ctx: ContextHandle) {
        let mut arena = self.lock();
        let removed = arena.compressors.remove(&ctx.raw()).is_some();
        arena.release_id(removed, ctx.raw());
    }

    fn free_decompression_context(&self, ctx: ContextHandle) {
        let mut arena = self.lock();
        let removed = arena.decompressors.remove(&ctx.raw()).is_some();
        arena.release_id(removed, ctx.raw());
    }

    fn init_compression_stream(&self, ctx: &ContextHandle, level: i32) -> i64 {
        let Some(slot) = self.compressor(ctx) else {
            return generic_error();
        };
        let mut slot = lock(&slot);
        slot.frame_closed = false;
        status(slot.cctx.set_parameter(CParameter::CompressionLevel(level)))
    }

    fn init_decompression_stream(&self, ctx: &ContextHandle) -> i64 {
        let Some(slot) = self.decompressor(ctx) else {
            return generic_error();
        };
        let mut slot = lock(&slot);
        slot.frame_open = false;
        status(slot.dctx.init())
    }

    fn compression_step(
        &self,
        ctx: &ContextHandle,
        dst: Region<'_>,
        src: Region<'_>,
        end: EndDirective,
    ) -> i64 {
        let Some(slot) = self.compressor(ctx) else {
            return generic_error();
        };
        let mut slot = lock(&slot);
        if end == EndDirective::End && src.len == 0 && slot.frame_closed {
            return step_result(0, 0);
        }

        self.with_regions(dst, src, |input, output| {
            let mut in_buf = InBuffer::around(input);
            let mut out_buf = OutBuffer::around(output);
            let directive = match end {
                EndDirective::Continue => ZSTD_EndDirective::ZSTD_e_continue,
                EndDirective::End => ZSTD_EndDirective::ZSTD_e_end,
            };
            match slot
                .cctx
                .compress_stream2(&mut out_buf, &mut in_buf, directive)
            {
                Ok(remaining) => {
                    if in_buf.pos > 0 {
                        slot.frame_closed = false;
                    }
                    if end == EndDirective::End && remaining == 0 {
                        slot.frame_closed = true;
                    }
                    step_result(in_buf.pos, out_buf.pos())
                }
                Err(code) => status(Err(code)),
            }
        })
    }

    fn decompression_step(&self, ctx: &ContextHandle, dst: Region<'_>, src: Region<'_>) -> i64 {
        let Some(slot) = self.decompressor(ctx) else {
            return generic_error();
        };
        let mut slot = lock(&slot);

        self.with_regions(dst, src, |input, output| {
            let mut in_buf = InBuffer::around(input);
            let mut out_buf = OutBuffer::around(output);
            match slot.dctx.decompress_stream(&mut out_buf, &mut in_buf) {
                Ok(hint) => {
                    // zstd returns 0 exactly when a frame is decoded and flushed
                    if in_buf.pos > 0 {
                        slot.frame_open = true;
                    }
                    if hint == 0 {
                        slot.frame_open = false;
                    }
                    step_result(in_buf.pos, out_buf.pos())
                }
                Err(code) => status(Err(code)),
            }
        })
    }

    fn decompression_frame_pending(&self, ctx: &ContextHandle) -> bool {
        let Some(slot) = self.decompressor(ctx) else {
            return false;
        };
        let pending = lock(&slot).frame_open;
        pending
    }

    fn recommended_compression_buffer_size(&self) -> usize {
        CCtx::out_size()
    }

    fn recommended_decompression_buffer_size(&self) -> usize {
        DCtx::out_size()
    }

    fn error_name(&self, code: u64) -> String {
        // zstd keys its names on the raw `size_t` form of the code
        zstd_safe::get_error_name((code as usize).wrapping_neg()).to_string()
    }

    fn allocate(&self, size: usize) -> Option<BufferHandle> {
        let mut memory = Vec::new();
        memory.try_reserve_exact(size).ok()?;
        memory.resize(size, 0);

        let mut arena = self.lock();
        let id = arena.issue_id()?;
        arena.buffers.insert(id.get(), Arc::new(Mutex::new(memory)));
        Some(BufferHandle::from_raw(id))
    }

    fn free(&self, buffer: BufferHandle) {
        let mut arena = self.lock();
        let removed = arena.buffers.remove(&buffer.raw()).is_some();
        arena.release_id(removed, buffer.raw());
    }

    fn write_memory(&self, buffer: &BufferHandle, offset: usize, data: &[u8]) -> Option<()> {
        let memory = self.buffer(buffer)?;
        let mut memory = lock(&memory);
        let end = offset.checked_add(data.len())?;
        memory.get_mut(offset..end)?.copy_from_slice(data);
        Some(())
    }

    fn read_memory(&self, region: Region<'_>) -> Option<Vec<u8>> {
        let memory = self.buffer(region.buffer)?;
        let memory = lock(&memory);
        memory.get(region.range()?).map(<[u8]>::to_vec)
    }
}
