//! Core data types for ferrozst

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::ProgressReporter;

/// Shared progress callback handed to engines and pipelines
pub type ProgressCallback = Arc<dyn ProgressReporter>;

/// Direction of a codec operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StreamKind {
    /// Plain bytes in, compressed frames out
    Compress,
    /// Compressed frames in, plain bytes out
    Decompress,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compress => f.write_str("compress"),
            Self::Decompress => f.write_str("decompress"),
        }
    }
}

/// Byte accounting for one stream or whole-buffer call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StreamStats {
    /// Bytes read from upstream
    pub bytes_in: u64,
    /// Bytes emitted downstream
    pub bytes_out: u64,
    /// Upstream chunks consumed
    pub chunks_in: u64,
    /// Non-empty chunks emitted
    pub chunks_out: u64,
}

impl StreamStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Output size relative to input size; `1.0` when nothing was read
    pub fn ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            1.0
        } else {
            self.bytes_out as f64 / self.bytes_in as f64
        }
    }

    /// Record one upstream chunk
    pub fn record_input(&mut self, len: usize) {
        self.chunks_in += 1;
        self.bytes_in += len as u64;
    }

    /// Record one emitted chunk and return the new cumulative output total
    pub fn record_output(&mut self, len: usize) -> u64 {
        self.chunks_out += 1;
        self.bytes_out += len as u64;
        self.bytes_out
    }
}
