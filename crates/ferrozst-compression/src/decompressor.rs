//! Decompression engine

use crate::engine::{allocate_scratch, drive_steps, StreamEngine};
use bytes::Bytes;
use ferrozst_codec::{CodecContext, CodecEngine, ForeignBuffer};
use ferrozst_types::{Destroy, Error, Result, StreamKind};

use std::sync::Arc;
use tracing::{debug, warn};

/// Zstandard's `srcSize_wrong` code, reported when input stops inside a frame
const TRUNCATED_FRAME: u64 = 72;

/// Owns one decompression context and one scratch buffer
///
/// Compressed chunks may split frames at any byte; the context carries partial
/// frame state between calls. Concatenated frames decode to the concatenation
/// of their contents.
pub struct DecompressionEngine {
    codec: Arc<dyn CodecEngine>,
    context: Option<CodecContext>,
    scratch: Option<ForeignBuffer>,
    destroyed: bool,
}

impl DecompressionEngine {
    /// Create an engine; nothing is allocated until the first chunk
    pub fn new(codec: Arc<dyn CodecEngine>) -> Self {
        Self {
            codec,
            context: None,
            scratch: None,
            destroyed: false,
        }
    }

    /// Scratch buffer size, once allocated
    pub fn buffer_size(&self) -> Option<usize> {
        self.scratch.as_ref().map(ForeignBuffer::len)
    }

    /// Decompress the next piece of compressed input
    ///
    /// Empty input yields empty output without touching the engine. A frame
    /// may end in a later chunk; [`StreamEngine::finish`] rejects input that
    /// never completes it.
    pub fn process(&mut self, data: &[u8]) -> Result<Bytes> {
        if self.destroyed {
            return Err(Error::lifecycle("decompression engine used after destroy"));
        }

        if self.context.is_none() {
            self.context = Some(CodecContext::open(&self.codec, StreamKind::Decompress, 0)?);
            debug!("decompression context ready");
        }

        if data.is_empty() {
            return Ok(Bytes::new());
        }

        if self.scratch.is_none() {
            let size = self.codec.recommended_decompression_buffer_size();
            self.scratch = Some(allocate_scratch(&self.codec, size, StreamKind::Decompress)?);
        }

        let (Some(context), Some(scratch)) = (&self.context, &self.scratch) else {
            return Err(Error::lifecycle("decompression engine resources missing"));
        };

        let input = ForeignBuffer::copy_from(&self.codec, data)?;
        let codec = &*self.codec;
        drive_steps(codec, &input, scratch, |dst, src| {
            codec.decompression_step(context.handle(), dst, src)
        })
    }
}

impl Destroy for DecompressionEngine {
    fn destroy(&mut self) {
        if !self.destroyed {
            self.context = None;
            self.scratch = None;
            self.destroyed = true;
            debug!("decompression engine destroyed");
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl StreamEngine for DecompressionEngine {
    fn kind(&self) -> StreamKind {
        StreamKind::Decompress
    }

    fn process_chunk(&mut self, chunk: &[u8]) -> Result<Bytes> {
        self.process(chunk)
    }

    fn finish(&mut self) -> Result<Bytes> {
        if self.destroyed {
            return Err(Error::lifecycle("decompression engine used after destroy"));
        }
        if let Some(context) = &self.context {
            if self.codec.decompression_frame_pending(context.handle()) {
                warn!("compressed input ended inside a frame");
                return Err(Error::codec(TRUNCATED_FRAME, "truncated frame"));
            }
        }
        Ok(Bytes::new())
    }
}
