//! Streaming Zstandard compression for ferrozst
//!
//! This crate drives a handle-based codec engine through whole-buffer and
//! chunked compression and decompression:
//!
//! - **Engines**: [`CompressionEngine`] and [`DecompressionEngine`] own one
//!   context and one scratch buffer each and turn chunks into chunks
//! - **Pipeline**: [`StreamPipeline`] is a pull-driven, backpressure-respecting
//!   `Stream` transform built on either engine
//! - **Facade**: [`compress`], [`decompress`] and [`initialize`] accept a
//!   buffer or a byte stream and return the whole result
//!
//! Every engine is destroyed exactly once, whether the call succeeds, fails
//! or is cancelled.
//!
//! # Examples
//!
//! ```rust
//! use ferrozst_compression::{compress, decompress, CompressOptions, DecompressOptions};
//!
//! # tokio_test::block_on(async {
//! let data = b"Hello, world! This is test data for compression.";
//!
//! let frame = compress(&data[..], CompressOptions::default().level(5)).await?;
//! let plain = decompress(frame, DecompressOptions::default()).await?;
//!
//! assert_eq!(&data[..], plain.as_slice());
//! # Ok::<(), ferrozst_types::Error>(())
//! # });
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod compressor;
pub mod decompressor;
pub mod engine;
pub mod facade;
pub mod pipeline;

#[cfg(test)]
mod error_tests;
#[cfg(test)]
mod test_support;

pub use compressor::CompressionEngine;
pub use decompressor::DecompressionEngine;
pub use engine::StreamEngine;
pub use facade::{
    compress, decompress, default_codec, initialize, Codec, CompressOptions, DecompressOptions,
    Input,
};
pub use pipeline::{ByteStream, PipelineState, StreamPipeline};
