//! The codec engine capability
//!
//! [`CodecEngine`] is the raw, handle-based interface the streaming engines are
//! written against. It deliberately mirrors a foreign module: status codes
//! instead of `Result`, `Option` instead of errors for null handles, and
//! memory reachable only through handles. The safe orchestration lives one
//! layer up in `ferrozst-compression`.

use crate::handle::{BufferHandle, ContextHandle, EndDirective, Region};

/// Raw codec capability: contexts, streaming steps and foreign memory
///
/// Statuses are signed: negative values carry an engine error code whose name
/// is available through [`CodecEngine::error_name`]. Step results are packed
/// as described in [`crate::StepResult`].
pub trait CodecEngine: Send + Sync {
    /// Create a compression context, `None` when the engine is out of memory
    fn create_compression_context(&self) -> Option<ContextHandle>;

    /// Create a decompression context, `None` when the engine is out of memory
    fn create_decompression_context(&self) -> Option<ContextHandle>;

    /// Release a compression context
    fn free_compression_context(&self, ctx: ContextHandle);

    /// Release a decompression context
    fn free_decompression_context(&self, ctx: ContextHandle);

    /// Prepare a compression context to start a new frame at `level`
    fn init_compression_stream(&self, ctx: &ContextHandle, level: i32) -> i64;

    /// Prepare a decompression context to read a new frame
    fn init_decompression_stream(&self, ctx: &ContextHandle) -> i64;

    /// Run one compression step from `src` into `dst`; returns a packed result
    fn compression_step(
        &self,
        ctx: &ContextHandle,
        dst: Region<'_>,
        src: Region<'_>,
        end: EndDirective,
    ) -> i64;

    /// Run one decompression step from `src` into `dst`; returns a packed result
    fn decompression_step(&self, ctx: &ContextHandle, dst: Region<'_>, src: Region<'_>) -> i64;

    /// Whether input of a frame has been consumed without the frame finishing
    ///
    /// A stream that ends while this is `true` was cut short.
    fn decompression_frame_pending(&self, ctx: &ContextHandle) -> bool;

    /// Output buffer size the engine recommends for compression steps
    fn recommended_compression_buffer_size(&self) -> usize;

    /// Output buffer size the engine recommends for decompression steps
    fn recommended_decompression_buffer_size(&self) -> usize;

    /// Human-readable name for an error code
    fn error_name(&self, code: u64) -> String;

    /// Allocate `size` bytes of foreign memory, `None` on failure
    fn allocate(&self, size: usize) -> Option<BufferHandle>;

    /// Release foreign memory
    fn free(&self, buffer: BufferHandle);

    /// Copy `data` into foreign memory at `offset`
    fn write_memory(&self, buffer: &BufferHandle, offset: usize, data: &[u8]) -> Option<()>;

    /// Copy a region of foreign memory out
    fn read_memory(&self, region: Region<'_>) -> Option<Vec<u8>>;
}
