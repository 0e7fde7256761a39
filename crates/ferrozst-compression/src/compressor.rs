//! Compression engine
//!
//! Turns a sequence of plain chunks plus an end-of-stream flag into a sequence
//! of compressed chunks forming one Zstandard frame.

use crate::engine::{allocate_scratch, drive_steps, StreamEngine};
use bytes::Bytes;
use ferrozst_codec::{CodecContext, CodecEngine, EndDirective, ForeignBuffer};
use ferrozst_types::{CompressionLevel, Destroy, Error, Result, StreamKind};

use std::sync::Arc;
use tracing::debug;

/// Owns one compression context and one scratch buffer
///
/// Foreign resources are created on the first [`CompressionEngine::process`]
/// call and released by [`Destroy::destroy`] (or on drop).
pub struct CompressionEngine {
    codec: Arc<dyn CodecEngine>,
    level: CompressionLevel,
    context: Option<CodecContext>,
    scratch: Option<ForeignBuffer>,
    destroyed: bool,
}

impl CompressionEngine {
    /// Create an engine, rejecting levels outside `1..=19`
    ///
    /// Nothing is allocated in the codec engine yet.
    pub fn new(codec: Arc<dyn CodecEngine>, level: i32) -> Result<Self> {
        Ok(Self::with_level(codec, CompressionLevel::new(level)?))
    }

    /// Create an engine with an already validated level
    pub fn with_level(codec: Arc<dyn CodecEngine>, level: CompressionLevel) -> Self {
        Self {
            codec,
            level,
            context: None,
            scratch: None,
            destroyed: false,
        }
    }

    /// Configured compression level
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Scratch buffer size, once allocated
    pub fn buffer_size(&self) -> Option<usize> {
        self.scratch.as_ref().map(ForeignBuffer::len)
    }

    /// Compress `data`; `is_last` flushes and closes the frame
    ///
    /// An empty result is normal: the codec may buffer input until it has a
    /// full block.
    pub fn process(&mut self, data: &[u8], is_last: bool) -> Result<Bytes> {
        if self.destroyed {
            return Err(Error::lifecycle("compression engine used after destroy"));
        }

        if self.context.is_none() {
            let context =
                CodecContext::open(&self.codec, StreamKind::Compress, self.level.get())?;
            debug!("compression context ready at level {}", self.level.get());
            self.context = Some(context);
        }

        if data.is_empty() && !is_last {
            return Ok(Bytes::new());
        }

        if self.scratch.is_none() {
            let size = self.codec.recommended_compression_buffer_size();
            self.scratch = Some(allocate_scratch(&self.codec, size, StreamKind::Compress)?);
        }

        let (Some(context), Some(scratch)) = (&self.context, &self.scratch) else {
            return Err(Error::lifecycle("compression engine resources missing"));
        };

        let input = ForeignBuffer::copy_from(&self.codec, data)?;
        let end = EndDirective::for_last(is_last);
        let codec = &*self.codec;
        drive_steps(codec, &input, scratch, |dst, src| {
            codec.compression_step(context.handle(), dst, src, end)
        })
    }
}

impl Destroy for CompressionEngine {
    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.context = None;
        self.scratch = None;
        self.destroyed = true;
        debug!("compression engine destroyed");
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl StreamEngine for CompressionEngine {
    fn kind(&self) -> StreamKind {
        StreamKind::Compress
    }

    fn process_chunk(&mut self, chunk: &[u8]) -> Result<Bytes> {
        self.process(chunk, false)
    }

    fn finish(&mut self) -> Result<Bytes> {
        self.process(&[], true)
    }
}
