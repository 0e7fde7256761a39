//! Configuration types for ferrozst
//!
//! Validated newtypes shared by the engines, the configuration loader and the
//! CLI. Validation happens at construction so an invalid value never reaches
//! the codec engine.

use crate::{Error, Result};

/// Compression level with validation
///
/// The supported range is `1..=19`. The underlying Zstandard library accepts
/// levels up to 22, but levels above 19 need window sizes the streaming
/// scratch buffers are not sized for, so they are rejected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32", into = "i32"))]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Fastest compression
    pub const MIN: i32 = 1;
    /// Default compression
    pub const DEFAULT: i32 = 3;
    /// Best compression
    pub const MAX: i32 = 19;

    /// Create a new compression level with validation
    pub fn new(level: i32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level as u8))
        } else {
            Err(Error::validation(format!(
                "Compression level {} is outside the supported range {}..={}",
                level,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Get the compression level value
    pub fn get(self) -> i32 {
        i32::from(self.0)
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(Self::DEFAULT as u8)
    }
}

impl TryFrom<i32> for CompressionLevel {
    type Error = Error;

    fn try_from(level: i32) -> Result<Self> {
        Self::new(level)
    }
}

impl From<CompressionLevel> for i32 {
    fn from(level: CompressionLevel) -> Self {
        level.get()
    }
}

/// Read size used when turning a file or socket into a chunk stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct ChunkSize(usize);

impl ChunkSize {
    /// Minimum chunk size (4KB)
    pub const MIN: usize = 4 * 1024;
    /// Maximum chunk size (64MB)
    pub const MAX: usize = 64 * 1024 * 1024;
    /// Default chunk size (128KB), close to the codec's preferred input size
    pub const DEFAULT: usize = 128 * 1024;

    /// Create a new chunk size with validation
    pub fn new(size: usize) -> Result<Self> {
        if size < Self::MIN {
            Err(Error::validation(format!(
                "Chunk size {} is below minimum {}",
                size,
                Self::MIN
            )))
        } else if size > Self::MAX {
            Err(Error::validation(format!(
                "Chunk size {} exceeds maximum {}",
                size,
                Self::MAX
            )))
        } else {
            Ok(Self(size))
        }
    }

    /// Get the chunk size value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<usize> for ChunkSize {
    type Error = Error;

    fn try_from(size: usize) -> Result<Self> {
        Self::new(size)
    }
}

impl From<ChunkSize> for usize {
    fn from(size: ChunkSize) -> Self {
        size.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(10)]
    #[case(19)]
    fn test_valid_levels(#[case] level: i32) {
        assert_eq!(CompressionLevel::new(level).unwrap().get(), level);
    }

    #[rstest]
    #[case(-5)]
    #[case(0)]
    #[case(20)]
    #[case(22)]
    fn test_invalid_levels(#[case] level: i32) {
        let err = CompressionLevel::new(level).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_default_level() {
        assert_eq!(CompressionLevel::default().get(), 3);
    }

    #[test]
    fn test_chunk_size_validation() {
        assert!(ChunkSize::new(4096).is_ok());
        assert!(ChunkSize::new(1000).is_err());
        assert!(ChunkSize::new(ChunkSize::MAX + 1).is_err());
        assert_eq!(ChunkSize::default().get(), 128 * 1024);
    }
}
