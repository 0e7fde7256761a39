//! Opaque handles issued by a codec engine
//!
//! Handles are plain identifiers into engine-owned state. They are neither
//! `Clone` nor `Copy`: whoever receives a handle from the engine owns it and
//! gives it back exactly once through the matching free call.

use std::fmt;
use std::num::NonZeroU32;

/// Handle to a compression or decompression context
#[derive(PartialEq, Eq, Hash)]
pub struct ContextHandle(NonZeroU32);

impl ContextHandle {
    /// Wrap a raw identifier issued by an engine implementation
    pub fn from_raw(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    /// Raw identifier, for engine implementations only
    pub fn raw(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Handle to a block of foreign memory
#[derive(PartialEq, Eq, Hash)]
pub struct BufferHandle(NonZeroU32);

impl BufferHandle {
    /// Wrap a raw identifier issued by an engine implementation
    pub fn from_raw(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    /// Raw identifier, for engine implementations only
    pub fn raw(&self) -> u32 {
        self.0.get()
    }

    /// Borrow `len` bytes starting at `offset`
    pub fn region(&self, offset: usize, len: usize) -> Region<'_> {
        Region {
            buffer: self,
            offset,
            len,
        }
    }
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buf#{}", self.0)
    }
}

/// A `(buffer, offset, len)` view into foreign memory
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    /// Buffer the region lives in
    pub buffer: &'a BufferHandle,
    /// Start offset within the buffer
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
}

impl Region<'_> {
    /// Byte range covered by this region, or `None` on overflow
    pub fn range(&self) -> Option<std::ops::Range<usize>> {
        let end = self.offset.checked_add(self.len)?;
        Some(self.offset..end)
    }
}

/// End-of-stream directive for a compression step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndDirective {
    /// Keep buffering; emit whatever complete blocks are ready
    Continue,
    /// Flush everything and close the frame
    End,
}

impl EndDirective {
    /// Directive for a chunk, given whether it is the last one
    pub fn for_last(is_last: bool) -> Self {
        if is_last {
            Self::End
        } else {
            Self::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_range() {
        let handle = BufferHandle::from_raw(NonZeroU32::new(7).unwrap());
        let region = handle.region(10, 5);
        assert_eq!(region.range(), Some(10..15));
        assert_eq!(handle.region(usize::MAX, 1).range(), None);
    }

    #[test]
    fn test_handle_debug() {
        let ctx = ContextHandle::from_raw(NonZeroU32::new(3).unwrap());
        assert_eq!(format!("{:?}", ctx), "ctx#3");
    }

    #[test]
    fn test_end_directive() {
        assert_eq!(EndDirective::for_last(true), EndDirective::End);
        assert_eq!(EndDirective::for_last(false), EndDirective::Continue);
    }
}
