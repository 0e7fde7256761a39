//! Pull-driven stream pipeline
//!
//! [`StreamPipeline`] turns an upstream byte stream into an output byte stream
//! by running each chunk through a [`StreamEngine`]. Upstream is only read when
//! the consumer polls, so at most one upstream chunk and one output chunk are
//! in flight at a time.

use crate::engine::StreamEngine;
use bytes::Bytes;
use ferrozst_types::{ProgressCallback, Result, StreamStats};
use futures::stream::{BoxStream, Stream, StreamExt};

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tracing::{debug, warn};

/// Upstream input accepted by the pipeline and the facade
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

type EngineFactory<E> = Box<dyn FnOnce() -> Result<E> + Send>;

/// Pipeline lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing pulled yet; no engine exists
    Idle,
    /// Engine constructed, upstream open
    Active,
    /// Upstream ended, flushing the engine
    Draining,
    /// Tearing down after an upstream or engine error
    Erroring,
    /// Terminal; every further pull yields `None`
    Closed,
}

/// Backpressure-respecting transform from an input stream to an output stream
///
/// The engine is built on the first pull and destroyed exactly once, when the
/// stream ends, fails, is cancelled or is dropped. Empty engine output is never
/// emitted; instead the pipeline keeps reading upstream within the same pull.
pub struct StreamPipeline<E: StreamEngine> {
    upstream: Option<ByteStream>,
    factory: Option<EngineFactory<E>>,
    engine: Option<E>,
    state: PipelineState,
    stats: StreamStats,
    progress: Option<ProgressCallback>,
}

impl<E: StreamEngine> StreamPipeline<E> {
    /// Create a pipeline over `upstream`; `factory` builds the engine lazily
    pub fn new<S, F>(upstream: S, factory: F) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
        F: FnOnce() -> Result<E> + Send + 'static,
    {
        Self {
            upstream: Some(upstream.boxed()),
            factory: Some(Box::new(factory)),
            engine: None,
            state: PipelineState::Idle,
            stats: StreamStats::new(),
            progress: None,
        }
    }

    /// Report cumulative emitted bytes to `callback` after every emitted chunk
    #[must_use]
    pub fn with_progress(mut self, callback: impl Into<Option<ProgressCallback>>) -> Self {
        self.progress = callback.into();
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Byte accounting so far
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Stop the pipeline, releasing upstream and destroying the engine
    ///
    /// Later pulls yield `None`. Calling this on a closed pipeline does nothing.
    pub fn cancel(&mut self) {
        if self.state == PipelineState::Closed {
            return;
        }
        debug!("stream pipeline cancelled in state {:?}", self.state);
        self.close();
    }

    fn start(&mut self) -> Result<()> {
        if let Some(factory) = self.factory.take() {
            let engine = factory()?;
            debug!("{} pipeline started", engine.kind());
            self.engine = Some(engine);
        }
        self.state = PipelineState::Active;
        Ok(())
    }

    fn emit(&mut self, chunk: Bytes) -> Bytes {
        let total = self.stats.record_output(chunk.len());
        if let Some(progress) = &self.progress {
            progress.report_progress(total);
        }
        chunk
    }

    fn fail(&mut self, error: ferrozst_types::Error) -> ferrozst_types::Error {
        warn!("stream pipeline failed: {}", error);
        self.state = PipelineState::Erroring;
        self.close();
        error
    }

    fn close(&mut self) {
        self.upstream = None;
        self.factory = None;
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
        self.state = PipelineState::Closed;
    }

    fn finish(&mut self) -> Option<Result<Bytes>> {
        self.state = PipelineState::Draining;
        let tail = match self.engine.as_mut() {
            Some(engine) => engine.finish(),
            None => Ok(Bytes::new()),
        };
        match tail {
            Ok(tail) => {
                self.close();
                debug!(
                    "stream pipeline closed: {} bytes in, {} bytes out",
                    self.stats.bytes_in,
                    self.stats.bytes_out + tail.len() as u64
                );
                (!tail.is_empty()).then(|| Ok(self.emit(tail)))
            }
            Err(e) => Some(Err(self.fail(e))),
        }
    }
}

impl<E: StreamEngine + Unpin> StreamPipeline<E> {
    /// Produce the next non-empty output chunk
    ///
    /// `None` means the stream is finished. After an error is returned every
    /// later pull yields `None`.
    pub async fn pull(&mut self) -> Option<Result<Bytes>> {
        self.next().await
    }
}

impl<E: StreamEngine + Unpin> Stream for StreamPipeline<E> {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.state {
            PipelineState::Closed => return Poll::Ready(None),
            PipelineState::Idle => {
                if let Err(e) = this.start() {
                    return Poll::Ready(Some(Err(this.fail(e))));
                }
            }
            _ => {}
        }

        loop {
            let Some(upstream) = this.upstream.as_mut() else {
                this.close();
                return Poll::Ready(None);
            };

            let chunk = match ready!(upstream.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return Poll::Ready(Some(Err(this.fail(e.into())))),
                None => return Poll::Ready(this.finish()),
            };

            this.stats.record_input(chunk.len());
            let Some(engine) = this.engine.as_mut() else {
                this.close();
                return Poll::Ready(None);
            };
            match engine.process_chunk(&chunk) {
                Ok(out) if out.is_empty() => continue,
                Ok(out) => return Poll::Ready(Some(Ok(this.emit(out)))),
                Err(e) => return Poll::Ready(Some(Err(this.fail(e)))),
            }
        }
    }
}

impl<E: StreamEngine> Drop for StreamPipeline<E> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<E: StreamEngine> fmt::Debug for StreamPipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamPipeline")
            .field("state", &self.state)
            .field("stats", &self.stats)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}
