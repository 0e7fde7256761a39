//! One-time codec engine readiness
//!
//! [`EngineCell`] loads the codec engine at most once. Concurrent callers of
//! [`EngineCell::init`] all wait on the same in-flight load; once it succeeds
//! the engine is shared read-only by every caller. A failed load leaves the
//! cell empty so a later call can try again.

use crate::engine::CodecEngine;
use crate::zstd_engine::ZstdEngine;
use ferrozst_types::{Error, Result};

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Asynchronous engine constructor
pub type EngineLoader =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn CodecEngine>>> + Send + Sync>;

/// Single-flight holder for a loaded codec engine
pub struct EngineCell {
    engine: OnceCell<Arc<dyn CodecEngine>>,
    loader: EngineLoader,
}

impl EngineCell {
    /// Create a cell that loads its engine with `loader`
    pub fn new(loader: EngineLoader) -> Self {
        Self {
            engine: OnceCell::new(),
            loader,
        }
    }

    /// Create a cell from an async constructor
    pub fn with_loader<F, Fut>(load: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn CodecEngine>>> + Send + 'static,
    {
        Self::new(Arc::new(move || load().boxed()))
    }

    /// Create a cell that loads the Zstandard engine
    pub fn zstd() -> Self {
        Self::with_loader(|| async {
            let engine: Arc<dyn CodecEngine> = Arc::new(ZstdEngine::load()?);
            Ok::<_, Error>(engine)
        })
    }

    /// Create a cell that is already ready with `engine`
    pub fn ready(engine: Arc<dyn CodecEngine>) -> Self {
        let loaded = Arc::clone(&engine);
        let mut cell = Self::with_loader(move || {
            let engine = Arc::clone(&loaded);
            async move { Ok::<_, Error>(engine) }
        });
        cell.engine = OnceCell::new_with(Some(engine));
        cell
    }

    /// Load the engine if needed and return it
    pub async fn init(&self) -> Result<Arc<dyn CodecEngine>> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                debug!("loading codec engine");
                (self.loader)().await.map_err(|e| match e {
                    Error::Initialization { .. } => e,
                    other => Error::initialization(other.to_string()),
                })
            })
            .await
            .map_err(|e| {
                warn!("codec engine failed to load: {}", e);
                e
            })?;
        Ok(Arc::clone(engine))
    }

    /// Return the engine if it has finished loading
    pub fn get(&self) -> Result<Arc<dyn CodecEngine>> {
        self.engine
            .get()
            .map(Arc::clone)
            .ok_or_else(|| Error::lifecycle("codec engine used before initialize() completed"))
    }

    /// Whether the engine has finished loading
    pub fn is_ready(&self) -> bool {
        self.engine.initialized()
    }
}

impl Default for EngineCell {
    fn default() -> Self {
        Self::zstd()
    }
}
