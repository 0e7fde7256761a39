//! Instrumented codec engine for unit tests

use ferrozst_codec::{
    BufferHandle, CodecEngine, ContextHandle, EndDirective, Region, StepResult, ZstdEngine,
};

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Wraps [`ZstdEngine`], counting calls and injecting failures on request
#[derive(Default)]
pub struct InstrumentedEngine {
    inner: ZstdEngine,
    allocations: AtomicUsize,
    steps: AtomicUsize,
    frees: Mutex<HashMap<u32, usize>>,
    worst_frees: AtomicUsize,
    scripted: Mutex<VecDeque<i64>>,
    fail_contexts: AtomicBool,
    fail_init: AtomicBool,
    fail_alloc: AtomicBool,
}

impl InstrumentedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_context_creation(&self) {
        self.fail_contexts.store(true, Ordering::SeqCst);
    }

    pub fn fail_stream_init(&self) {
        self.fail_init.store(true, Ordering::SeqCst);
    }

    pub fn fail_allocations(&self) {
        self.fail_alloc.store(true, Ordering::SeqCst);
    }

    /// Return these raw results from the next step calls instead of running zstd
    pub fn script_steps(&self, results: impl IntoIterator<Item = i64>) {
        self.scripted.lock().unwrap().extend(results);
    }

    pub fn total_allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub fn step_calls(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn live_handles(&self) -> usize {
        self.inner.live_handles()
    }

    /// Most frees seen for one issuance of a handle id
    pub fn max_frees_per_handle(&self) -> usize {
        self.worst_frees.load(Ordering::SeqCst)
    }

    /// Ids are reused once freed, so counting restarts on every issuance
    fn record_issue(&self, raw: Option<u32>) {
        if let Some(raw) = raw {
            self.frees.lock().unwrap().insert(raw, 0);
        }
    }

    fn record_free(&self, raw: u32) {
        let mut frees = self.frees.lock().unwrap();
        let count = frees.entry(raw).or_default();
        *count += 1;
        self.worst_frees.fetch_max(*count, Ordering::SeqCst);
    }

    fn next_scripted(&self) -> Option<i64> {
        self.steps.fetch_add(1, Ordering::SeqCst);
        self.scripted.lock().unwrap().pop_front()
    }
}

impl CodecEngine for InstrumentedEngine {
    fn create_compression_context(&self) -> Option<ContextHandle> {
        if self.fail_contexts.load(Ordering::SeqCst) {
            return None;
        }
        let ctx = self.inner.create_compression_context();
        self.record_issue(ctx.as_ref().map(ContextHandle::raw));
        ctx
    }

    fn create_decompression_context(&self) -> Option<ContextHandle> {
        if self.fail_contexts.load(Ordering::SeqCst) {
            return None;
        }
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
        if self.fail_init.load(Ordering::SeqCst) {
            return StepResult::encode_error(1);
        }
        self.inner.init_compression_stream(ctx, level)
    }

    fn init_decompression_stream(&self, ctx: &ContextHandle) -> i64 {
        if self.fail_init.load(Ordering::SeqCst) {
            return StepResult::encode_error(1);
        }
        self.inner.init_decompression_stream(ctx)
    }

    fn compression_step(
        &self,
        ctx: &ContextHandle,
        dst: Region<'_>,
        src: Region<'_>,
        end: EndDirective,
    ) -> i64 {
        match self.next_scripted() {
            Some(raw) => raw,
            None => self.inner.compression_step(ctx, dst, src, end),
        }
    }

    fn decompression_step(&self, ctx: &ContextHandle, dst: Region<'_>, src: Region<'_>) -> i64 {
        match self.next_scripted() {
            Some(raw) => raw,
            None => self.inner.decompression_step(ctx, dst, src),
        }
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
        if self.fail_alloc.load(Ordering::SeqCst) {
            return None;
        }
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
