//! Unified test utilities for ferrozst integration tests

use bytes::Bytes;
use ferrozst_codec::{
    BufferHandle, CodecEngine, ContextHandle, EndDirective, Region, ZstdEngine,
};
use ferrozst_compression::{Codec, Input};
use ferrozst_types::ProgressCallback;
use futures::stream::{self, Stream, StreamExt};

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Test data generation patterns
#[derive(Debug, Clone, Copy)]
pub enum TestDataPattern {
    /// All zeros - highly compressible
    Zeros,
    /// Deterministic pseudo-random bytes - incompressible
    Random,
    /// Repeating English text
    Text,
    /// Runs of zeros mixed with a byte ramp
    Mixed,
}

/// Generate test data with the given pattern
pub fn generate_test_data(size: usize, pattern: TestDataPattern) -> Vec<u8> {
    match pattern {
        TestDataPattern::Zeros => vec![0u8; size],
        TestDataPattern::Random => {
            // xorshift keeps the data reproducible across runs
            let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
            (0..size)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    (state >> 24) as u8
                })
                .collect()
        }
        TestDataPattern::Text => b"The quick brown fox jumps over the lazy dog. "
            .iter()
            .copied()
            .cycle()
            .take(size)
            .collect(),
        TestDataPattern::Mixed => (0..size)
            .map(|i| if i % 1000 < 200 { 0 } else { (i % 256) as u8 })
            .collect(),
    }
}

/// Split `data` into chunks of `chunk_size` bytes (the last may be shorter)
pub fn chunks_of(data: &[u8], chunk_size: usize) -> Vec<Bytes> {
    data.chunks(chunk_size.max(1))
        .map(Bytes::copy_from_slice)
        .collect()
}

/// A byte stream over the given chunks
pub fn chunk_stream(chunks: Vec<Bytes>) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    stream::iter(chunks.into_iter().map(Ok))
}

/// Stream input over `data` split into `chunk_size` pieces
pub fn stream_input(data: &[u8], chunk_size: usize) -> Input {
    Input::stream(chunk_stream(chunks_of(data, chunk_size)))
}

/// A stream that counts how many chunks have been pulled from it
pub fn counting_stream(
    chunks: Vec<Bytes>,
    reads: Arc<AtomicUsize>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    chunk_stream(chunks).inspect(move |_| {
        reads.fetch_add(1, Ordering::SeqCst);
    })
}

/// Records every progress value it is given
#[derive(Debug, Default, Clone)]
pub struct ProgressRecorder {
    values: Arc<Mutex<Vec<u64>>>,
}

impl ProgressRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback feeding this recorder
    pub fn callback(&self) -> ProgressCallback {
        let values = Arc::clone(&self.values);
        Arc::new(move |total: u64| {
            values
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(total);
        })
    }

    /// Values reported so far
    pub fn values(&self) -> Vec<u64> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

/// Zstandard engine that counts allocations and frees per handle
#[derive(Default)]
pub struct CountingEngine {
    inner: ZstdEngine,
    allocations: AtomicUsize,
    contexts: AtomicUsize,
    frees: Mutex<HashMap<u32, usize>>,
    worst_frees: AtomicUsize,
}

impl CountingEngine {
    /// Create a counting engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Foreign buffers allocated so far
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Contexts created so far
    pub fn contexts_created(&self) -> usize {
        self.contexts.load(Ordering::SeqCst)
    }

    /// Handles currently alive in the engine
    pub fn live_handles(&self) -> usize {
        self.inner.live_handles()
    }

    /// Highest number of times a single handle was freed
    ///
    /// The engine reuses freed ids, so each issuance of an id is counted
    /// separately.
    pub fn max_frees_per_handle(&self) -> usize {
        self.worst_frees.load(Ordering::SeqCst)
    }

    fn frees(&self) -> std::sync::MutexGuard<'_, HashMap<u32, usize>> {
        self.frees
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record_issue(&self, raw: Option<u32>) {
        if let Some(raw) = raw {
            self.frees().insert(raw, 0);
        }
    }

    fn record_free(&self, raw: u32) {
        let mut frees = self.frees();
        let count = frees.entry(raw).or_default();
        *count += 1;
        self.worst_frees.fetch_max(*count, Ordering::SeqCst);
    }
}

impl CodecEngine for CountingEngine {
    fn create_compression_context(&self) -> Option<ContextHandle> {
        self.contexts.fetch_add(1, Ordering::SeqCst);
        let ctx = self.inner.create_compression_context();
        self.record_issue(ctx.as_ref().map(ContextHandle::raw));
        ctx
    }

    fn create_decompression_context(&self) -> Option<ContextHandle> {
        self.contexts.fetch_add(1, Ordering::SeqCst);
        let ctx = self.inner.create_decompression_context();
        self.record_issue(ctx.as_ref().map(ContextHandle::raw));
        ctx
    }

    fn free_compression_context(&self, ctx: ContextHandle) {
        self.record_free(ctx.raw());
        self.inner.free_compression_context(ctx);
    }

    fn free_decompression_context(&self, ctx: ContextHandle) {
        self.record_free(ctx.raw());
        self.inner.free_decompression_context(ctx);
    }

    fn init_compression_stream(&self, ctx: &ContextHandle, level: i32) -> i64 {
        self.inner.init_compression_stream(ctx, level)
    }

    fn init_decompression_stream(&self, ctx: &ContextHandle) -> i64 {
        self.inner.init_decompression_stream(ctx)
    }

    fn compression_step(
        &self,
        ctx: &ContextHandle,
        dst: Region<'_>,
        src: Region<'_>,
        end: EndDirective,
    ) -> i64 {
        self.inner.compression_step(ctx, dst, src, end)
    }

    fn decompression_step(&self, ctx: &ContextHandle, dst: Region<'_>, src: Region<'_>) -> i64 {
        self.inner.decompression_step(ctx, dst, src)
    }

    fn decompression_frame_pending(&self, ctx: &ContextHandle) -> bool {
        self.inner.decompression_frame_pending(ctx)
    }

    fn recommended_compression_buffer_size(&self) -> usize {
        self.inner.recommended_compression_buffer_size()
    }

    fn recommended_decompression_buffer_size(&self) -> usize {
        self.inner.recommended_decompression_buffer_size()
    }

    fn error_name(&self, code: u64) -> String {
        self.inner.error_name(code)
    }

    fn allocate(&self, size: usize) -> Option<BufferHandle> {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        let buffer = self.inner.allocate(size);
        self.record_issue(buffer.as_ref().map(BufferHandle::raw));
        buffer
    }

    fn free(&self, buffer: BufferHandle) {
        self.record_free(buffer.raw());
        self.inner.free(buffer);
    }

    fn write_memory(&self, buffer: &BufferHandle, offset: usize, data: &[u8]) -> Option<()> {
        self.inner.write_memory(buffer, offset, data)
    }

    fn read_memory(&self, region: Region<'_>) -> Option<Vec<u8>> {
        self.inner.read_memory(region)
    }
}

/// A codec over a fresh [`CountingEngine`]
pub fn counting_codec() -> (Arc<CountingEngine>, Codec) {
    let engine = Arc::new(CountingEngine::new());
    let codec = Codec::with_engine(engine.clone());
    (engine, codec)
}
