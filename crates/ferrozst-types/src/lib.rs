//! Core type system and error handling for ferrozst
//!
//! This crate provides the foundational types shared by the codec boundary,
//! the streaming engines, configuration and the CLI:
//!
//! - **Error handling**: one error enum covering validation, initialization,
//!   allocation, codec, stall and lifecycle failures
//! - **Configuration**: validated compression level and chunk size newtypes
//! - **Traits**: engine teardown and progress reporting
//! - **Statistics**: byte accounting for streams
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use ferrozst_types::{CompressionLevel, ErrorKind};
//!
//! assert_eq!(CompressionLevel::new(19).unwrap().get(), 19);
//! assert_eq!(CompressionLevel::new(20).unwrap_err().kind(), ErrorKind::Validation);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use config::{ChunkSize, CompressionLevel};
pub use error::{Error, ErrorKind};
pub use result::Result;
pub use traits::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_stream_stats_accounting() {
        let mut stats = StreamStats::new();
        assert_eq!(stats.ratio(), 1.0);

        stats.record_input(1000);
        assert_eq!(stats.record_output(100), 100);
        assert_eq!(stats.record_output(50), 150);

        assert_eq!(stats.chunks_in, 1);
        assert_eq!(stats.chunks_out, 2);
        assert_eq!(stats.ratio(), 0.15);
    }

    #[test]
    fn test_closure_is_progress_reporter() {
        let seen = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |total: u64| {
            sink.store(total, Ordering::SeqCst);
        });

        callback.report_progress(42);
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_stream_kind_display() {
        assert_eq!(StreamKind::Compress.to_string(), "compress");
        assert_eq!(StreamKind::Decompress.to_string(), "decompress");
    }
}
