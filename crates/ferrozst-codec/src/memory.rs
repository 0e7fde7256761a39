//! Scoped ownership of engine-issued handles
//!
//! [`ForeignBuffer`] and [`CodecContext`] pair every allocation with exactly one
//! release: the handle is returned to the engine on `Drop`, so early returns
//! and `?` never leak foreign memory.

use crate::engine::CodecEngine;
use crate::handle::{BufferHandle, ContextHandle, Region};
use ferrozst_types::{Error, Result, StreamKind};

use std::sync::Arc;
use tracing::trace;

/// Foreign memory released when dropped
pub struct ForeignBuffer {
    codec: Arc<dyn CodecEngine>,
    handle: Option<BufferHandle>,
    len: usize,
}

impl ForeignBuffer {
    /// Allocate `len` bytes of foreign memory
    pub fn allocate(codec: &Arc<dyn CodecEngine>, len: usize) -> Result<Self> {
        let handle = codec
            .allocate(len)
            .ok_or_else(|| Error::allocation(format!("allocate({}) returned null", len)))?;
        trace!("allocated {:?} ({} bytes)", handle, len);
        Ok(Self {
            codec: Arc::clone(codec),
            handle: Some(handle),
            len,
        })
    }

    /// Allocate a buffer holding a copy of `data`
    pub fn copy_from(codec: &Arc<dyn CodecEngine>, data: &[u8]) -> Result<Self> {
        let buffer = Self::allocate(codec, data.len())?;
        codec
            .write_memory(buffer.handle(), 0, data)
            .ok_or_else(|| Error::allocation(format!("write of {} bytes rejected", data.len())))?;
        Ok(buffer)
    }

    /// Size of the allocation
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the allocation is zero-sized
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// View of `len` bytes starting at `offset`
    pub fn region(&self, offset: usize, len: usize) -> Region<'_> {
        self.handle().region(offset, len)
    }

    /// View of the whole allocation
    pub fn full(&self) -> Region<'_> {
        self.region(0, self.len)
    }

    /// Copy the first `len` bytes out of foreign memory
    pub fn read(&self, len: usize) -> Result<Vec<u8>> {
        self.codec
            .read_memory(self.region(0, len))
            .ok_or_else(|| Error::allocation(format!("read of {} bytes out of bounds", len)))
    }

    fn handle(&self) -> &BufferHandle {
        // Only `Drop` takes the handle
        self.handle.as_ref().expect("buffer handle present until drop")
    }
}

impl Drop for ForeignBuffer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            trace!("freeing {:?}", handle);
            self.codec.free(handle);
        }
    }
}

/// A compression or decompression context released when dropped
pub struct CodecContext {
    codec: Arc<dyn CodecEngine>,
    handle: Option<ContextHandle>,
    kind: StreamKind,
}

impl CodecContext {
    /// Create a context of `kind` and initialize its stream
    ///
    /// `level` is ignored for decompression contexts. If the stream fails to
    /// initialize, the half-built context is released before returning.
    pub fn open(codec: &Arc<dyn CodecEngine>, kind: StreamKind, level: i32) -> Result<Self> {
        let handle = match kind {
            StreamKind::Compress => codec.create_compression_context(),
            StreamKind::Decompress => codec.create_decompression_context(),
        }
        .ok_or_else(|| Error::initialization(format!("failed to create {} context", kind)))?;

        let context = Self {
            codec: Arc::clone(codec),
            handle: Some(handle),
            kind,
        };
        let status = match kind {
            StreamKind::Compress => codec.init_compression_stream(context.handle(), level),
            StreamKind::Decompress => codec.init_decompression_stream(context.handle()),
        };
        if status < 0 {
            let name = codec.error_name(status.unsigned_abs());
            return Err(Error::initialization(format!(
                "failed to initialize {} stream: {}",
                kind, name
            )));
        }
        trace!("opened {} context {:?}", kind, context.handle());
        Ok(context)
    }

    /// Handle to pass to step calls
    pub fn handle(&self) -> &ContextHandle {
        self.handle.as_ref().expect("context handle present until drop")
    }

    /// Operation this context was created for
    pub fn kind(&self) -> StreamKind {
        self.kind
    }
}

impl Drop for CodecContext {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            trace!("freeing {} context {:?}", self.kind, handle);
            match self.kind {
                StreamKind::Compress => self.codec.free_compression_context(handle),
                StreamKind::Decompress => self.codec.free_decompression_context(handle),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ZstdEngine;
    use ferrozst_types::ErrorKind;

    fn engine() -> (Arc<ZstdEngine>, Arc<dyn CodecEngine>) {
        let zstd = Arc::new(ZstdEngine::new());
        let codec: Arc<dyn CodecEngine> = zstd.clone();
        (zstd, codec)
    }

    #[test]
    fn test_buffer_is_freed_on_drop() {
        let (zstd, codec) = engine();
        {
            let buffer = ForeignBuffer::copy_from(&codec, b"abc").unwrap();
            assert_eq!(buffer.len(), 3);
            assert_eq!(buffer.read(3).unwrap(), b"abc");
            assert_eq!(zstd.live_handles(), 1);
        }
        assert_eq!(zstd.live_handles(), 0);
    }

    #[test]
    fn test_out_of_bounds_read_is_allocation_error() {
        let (_zstd, codec) = engine();
        let buffer = ForeignBuffer::allocate(&codec, 2).unwrap();
        assert_eq!(buffer.read(3).unwrap_err().kind(), ErrorKind::Allocation);
    }

    #[test]
    fn test_context_is_freed_on_drop() {
        let (zstd, codec) = engine();
        let compress = CodecContext::open(&codec, StreamKind::Compress, 3).unwrap();
        let decompress = CodecContext::open(&codec, StreamKind::Decompress, 0).unwrap();
        assert_eq!(compress.kind(), StreamKind::Compress);
        assert_eq!(zstd.live_handles(), 2);

        drop(compress);
        drop(decompress);
        assert_eq!(zstd.live_handles(), 0);
    }
}
