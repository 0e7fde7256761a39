//! Foreign codec engine boundary for ferrozst
//!
//! This crate defines the raw capability the streaming engines drive and
//! provides the Zstandard implementation of it:
//!
//! - **[`CodecEngine`]**: handle-based contexts, streaming steps and foreign memory
//! - **[`StepResult`]**: decoding of the packed `consumed`/`produced` step result
//! - **[`ForeignBuffer`] / [`CodecContext`]**: scoped ownership of engine handles
//! - **[`EngineCell`]**: single-flight, process-wide engine readiness
//! - **[`ZstdEngine`]**: the engine backed by `zstd_safe`
//!
//! # Examples
//!
//! ```rust
//! use ferrozst_codec::{CodecEngine, EndDirective, StepResult, ZstdEngine};
//!
//! let engine = ZstdEngine::load()?;
//! let ctx = engine.create_compression_context().unwrap();
//! assert!(engine.init_compression_stream(&ctx, 3) >= 0);
//!
//! let cap = engine.recommended_compression_buffer_size();
//! let dst = engine.allocate(cap).unwrap();
//! let src = engine.allocate(5).unwrap();
//! engine.write_memory(&src, 0, b"hello").unwrap();
//!
//! let raw = engine.compression_step(&ctx, dst.region(0, cap), src.region(0, 5), EndDirective::End);
//! let step = StepResult::decode(raw).unwrap();
//! assert_eq!(step.consumed, 5);
//! assert!(step.produced > 0);
//!
//! engine.free(src);
//! engine.free(dst);
//! engine.free_compression_context(ctx);
//! # Ok::<(), ferrozst_types::Error>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod handle;
pub mod memory;
pub mod packed;
pub mod ready;
pub mod zstd_engine;

pub use engine::CodecEngine;
pub use handle::{BufferHandle, ContextHandle, EndDirective, Region};
pub use memory::{CodecContext, ForeignBuffer};
pub use packed::StepResult;
pub use ready::{EngineCell, EngineLoader};
pub use zstd_engine::ZstdEngine;
