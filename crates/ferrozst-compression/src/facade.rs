//! Whole-call compress and decompress API
//!
//! A [`Codec`] owns the process-wide readiness of one codec engine and builds a
//! fresh engine instance for every call. Buffer input goes straight to the
//! engine; stream input is driven through a [`StreamPipeline`] and collected.

use crate::compressor::CompressionEngine;
use crate::decompressor::DecompressionEngine;
use crate::engine::StreamEngine;
use crate::pipeline::{ByteStream, StreamPipeline};
use bytes::Bytes;
use ferrozst_codec::{CodecEngine, EngineCell};
use ferrozst_types::{CompressionLevel, Destroy, ProgressCallback, ProgressReporter, Result};
use futures::stream::{Stream, StreamExt};

use once_cell::sync::Lazy;
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::debug;

/// Data handed to [`Codec::compress`] or [`Codec::decompress`]
pub enum Input {
    /// A complete in-memory buffer
    Buffer(Bytes),
    /// A byte stream read chunk by chunk
    Stream(ByteStream),
}

impl Input {
    /// Wrap any byte stream
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }
}

impl From<Bytes> for Input {
    fn from(data: Bytes) -> Self {
        Self::Buffer(data)
    }
}

impl From<Vec<u8>> for Input {
    fn from(data: Vec<u8>) -> Self {
        Self::Buffer(Bytes::from(data))
    }
}

impl From<&'static [u8]> for Input {
    fn from(data: &'static [u8]) -> Self {
        Self::Buffer(Bytes::from_static(data))
    }
}

impl From<&'static str> for Input {
    fn from(data: &'static str) -> Self {
        Self::Buffer(Bytes::from_static(data.as_bytes()))
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(data) => f.debug_tuple("Buffer").field(&data.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Options for compression
#[derive(Clone)]
pub struct CompressOptions {
    /// Compression level, `1..=19`
    pub level: i32,
    /// Receives the cumulative number of bytes produced
    pub on_progress: Option<ProgressCallback>,
}

impl CompressOptions {
    /// Set the compression level
    #[must_use]
    pub fn level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Set the progress callback
    #[must_use]
    pub fn on_progress(mut self, callback: impl ProgressReporter + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            level: CompressionLevel::DEFAULT,
            on_progress: None,
        }
    }
}

impl fmt::Debug for CompressOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressOptions")
            .field("level", &self.level)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Options for decompression
#[derive(Clone, Default)]
pub struct DecompressOptions {
    /// Receives the cumulative number of bytes produced
    pub on_progress: Option<ProgressCallback>,
}

impl DecompressOptions {
    /// Set the progress callback
    #[must_use]
    pub fn on_progress(mut self, callback: impl ProgressReporter + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for DecompressOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecompressOptions")
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Entry point for compress and decompress calls
///
/// Calls may run concurrently; each gets its own engine instance. The codec
/// engine itself is loaded once, by whichever call needs it first.
pub struct Codec {
    engine: EngineCell,
}

impl Codec {
    /// Codec backed by the Zstandard engine
    pub fn new() -> Self {
        Self::with_engine_cell(EngineCell::zstd())
    }

    /// Codec with a custom readiness cell
    pub fn with_engine_cell(engine: EngineCell) -> Self {
        Self { engine }
    }

    /// Codec around an already loaded engine
    pub fn with_engine(engine: Arc<dyn CodecEngine>) -> Self {
        Self::with_engine_cell(EngineCell::ready(engine))
    }

    /// Load the codec engine ahead of the first call; idempotent
    pub async fn initialize(&self) -> Result<()> {
        self.engine.init().await.map(|_| ())
    }

    /// Whether the codec engine has been loaded
    pub fn is_ready(&self) -> bool {
        self.engine.is_ready()
    }

    /// Compress `input` into one Zstandard frame
    ///
    /// The level is validated before the engine is touched.
    pub async fn compress(
        &self,
        input: impl Into<Input>,
        options: CompressOptions,
    ) -> Result<Vec<u8>> {
        let level = CompressionLevel::new(options.level)?;
        let codec = self.engine.init().await?;

        match input.into() {
            Input::Buffer(data) => {
                let mut engine = CompressionEngine::with_level(codec, level);
                let result = engine.process(&data, true);
                engine.destroy();
                let output = result?;
                debug!("compressed {} bytes into {}", data.len(), output.len());
                report_once(options.on_progress.as_ref(), output.len());
                Ok(output.to_vec())
            }
            Input::Stream(upstream) => {
                let pipeline =
                    StreamPipeline::new(upstream, move || {
                        Ok(CompressionEngine::with_level(codec, level))
                    })
                    .with_progress(options.on_progress);
                collect(pipeline).await
            }
        }
    }

    /// Decompress one or more concatenated Zstandard frames
    pub async fn decompress(
        &self,
        input: impl Into<Input>,
        options: DecompressOptions,
    ) -> Result<Vec<u8>> {
        let codec = self.engine.init().await?;

        match input.into() {
            Input::Buffer(data) => {
                let mut engine = DecompressionEngine::new(codec);
                let result = engine
                    .process(&data)
                    .and_then(|output| engine.finish().map(|_| output));
                engine.destroy();
                let output = result?;
                debug!("decompressed {} bytes into {}", data.len(), output.len());
                report_once(options.on_progress.as_ref(), output.len());
                Ok(output.to_vec())
            }
            Input::Stream(upstream) => {
                let pipeline =
                    StreamPipeline::new(upstream, move || Ok(DecompressionEngine::new(codec)))
                        .with_progress(options.on_progress);
                collect(pipeline).await
            }
        }
    }

    /// Build a compression pipeline over `upstream` without collecting it
    pub async fn compress_stream<S>(
        &self,
        upstream: S,
        options: CompressOptions,
    ) -> Result<StreamPipeline<CompressionEngine>>
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        let level = CompressionLevel::new(options.level)?;
        let codec = self.engine.init().await?;
        Ok(
            StreamPipeline::new(upstream, move || Ok(CompressionEngine::with_level(codec, level)))
                .with_progress(options.on_progress),
        )
    }

    /// Build a decompression pipeline over `upstream` without collecting it
    pub async fn decompress_stream<S>(
        &self,
        upstream: S,
        options: DecompressOptions,
    ) -> Result<StreamPipeline<DecompressionEngine>>
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        let codec = self.engine.init().await?;
        Ok(
            StreamPipeline::new(upstream, move || Ok(DecompressionEngine::new(codec)))
                .with_progress(options.on_progress),
        )
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

fn report_once(progress: Option<&ProgressCallback>, len: usize) {
    if len > 0 {
        if let Some(progress) = progress {
            progress.report_progress(len as u64);
        }
    }
}

async fn collect<E>(mut pipeline: StreamPipeline<E>) -> Result<Vec<u8>>
where
    E: crate::StreamEngine + Unpin,
{
    let mut output = Vec::new();
    while let Some(chunk) = pipeline.pull().await {
        output.extend_from_slice(&chunk?);
    }
    Ok(output)
}

static DEFAULT_CODEC: Lazy<Codec> = Lazy::new(Codec::new);

/// The process-wide codec behind [`compress`], [`decompress`] and [`initialize`]
pub fn default_codec() -> &'static Codec {
    &DEFAULT_CODEC
}

/// Load the process-wide codec engine; idempotent
pub async fn initialize() -> Result<()> {
    DEFAULT_CODEC.initialize().await
}

/// Compress with the process-wide codec
pub async fn compress(input: impl Into<Input>, options: CompressOptions) -> Result<Vec<u8>> {
    DEFAULT_CODEC.compress(input, options).await
}

/// Decompress with the process-wide codec
pub async fn decompress(input: impl Into<Input>, options: DecompressOptions) -> Result<Vec<u8>> {
    DEFAULT_CODEC.decompress(input, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InstrumentedEngine;
    use ferrozst_types::ErrorKind;
    use futures::stream;
    use rstest::rstest;
    use std::sync::Mutex;

    fn instrumented_codec() -> (Arc<InstrumentedEngine>, Codec) {
        let instrumented = Arc::new(InstrumentedEngine::new());
        let codec = Codec::with_engine(instrumented.clone());
        (instrumented, codec)
    }

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, impl ProgressReporter + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |total: u64| sink.lock().unwrap().push(total))
    }

    #[tokio::test]
    async fn test_buffer_round_trip() {
        let (instrumented, codec) = instrumented_codec();

        let frame = codec
            .compress("Hello, World!", CompressOptions::default())
            .await
            .unwrap();
        let plain = codec
            .decompress(frame, DecompressOptions::default())
            .await
            .unwrap();

        assert_eq!(plain, b"Hello, World!");
        assert_eq!(instrumented.live_handles(), 0);
    }

    #[rstest]
    #[case(0)]
    #[case(20)]
    #[tokio::test]
    async fn test_invalid_level_rejected_before_allocation(#[case] level: i32) {
        let (instrumented, codec) = instrumented_codec();

        let err = codec
            .compress(vec![1, 2, 3], CompressOptions::default().level(level))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(instrumented.total_allocations(), 0);
    }

    #[tokio::test]
    async fn test_buffer_progress_reported_once() {
        let (_instrumented, codec) = instrumented_codec();
        let (seen, callback) = recorder();

        let frame = codec
            .compress(vec![b'A'; 1000], CompressOptions::default().on_progress(callback))
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![frame.len() as u64]);
    }

    #[tokio::test]
    async fn test_stream_input_matches_buffer_input() {
        let (_instrumented, codec) = instrumented_codec();
        let upstream = stream::iter(vec![
            Ok(Bytes::from_static(b"First chunk. ")),
            Ok(Bytes::from_static(b"Second chunk. ")),
            Ok(Bytes::from_static(b"Third chunk.")),
        ]);

        let frame = codec
            .compress(Input::stream(upstream), CompressOptions::default())
            .await
            .unwrap();
        let plain = codec
            .decompress(frame, DecompressOptions::default())
            .await
            .unwrap();
        assert_eq!(plain, b"First chunk. Second chunk. Third chunk.");
    }

    #[tokio::test]
    async fn test_stream_error_propagates_and_releases() {
        let (instrumented, codec) = instrumented_codec();
        let upstream = stream::iter(vec![
            Ok(Bytes::from_static(b"data")),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "cut short")),
        ]);

        let err = codec
            .compress(Input::stream(upstream), CompressOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(instrumented.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_codec_error_releases_engine() {
        let (instrumented, codec) = instrumented_codec();

        let err = codec
            .decompress(vec![0xFF; 16], DecompressOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert_eq!(instrumented.live_handles(), 0);
        assert!(instrumented.max_frees_per_handle() <= 1);
    }

    #[tokio::test]
    async fn test_failed_engine_load_is_initialization_error() {
        let codec = Codec::with_engine_cell(EngineCell::with_loader(|| async {
            Err::<Arc<dyn CodecEngine>, _>(ferrozst_types::Error::other("no engine"))
        }));

        let err = codec.initialize().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initialization);
        let err = codec
            .compress("x", CompressOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initialization);
    }

    #[tokio::test]
    async fn test_default_codec_is_shared() {
        initialize().await.unwrap();
        initialize().await.unwrap();
        assert!(default_codec().is_ready());

        let frame = compress(vec![7u8; 64], CompressOptions::default())
            .await
            .unwrap();
        let plain = decompress(frame, DecompressOptions::default()).await.unwrap();
        assert_eq!(plain, vec![7u8; 64]);
    }

    #[test]
    fn test_options_debug_hides_callback() {
        let options = CompressOptions::default().on_progress(|_: u64| {});
        assert_eq!(
            format!("{:?}", options),
            "CompressOptions { level: 3, on_progress: true }"
        );
        assert_eq!(format!("{:?}", Input::from(vec![0u8; 4])), "Buffer(4)");
    }
}
