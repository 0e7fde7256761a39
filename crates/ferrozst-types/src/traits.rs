//! Core traits for ferrozst operations
//!
//! Behavior shared by the compression and decompression engines, and the
//! progress reporting hook used by the stream pipeline.

/// Explicit teardown of engine-owned foreign resources
///
/// Implementors release every context and buffer they hold. Calling
/// [`Destroy::destroy`] more than once is a no-op, and any processing attempted
/// afterwards fails with [`crate::Error::Lifecycle`].
pub trait Destroy {
    /// Release all owned resources and mark the instance destroyed
    fn destroy(&mut self);

    /// Whether [`Destroy::destroy`] has already run
    fn is_destroyed(&self) -> bool;
}

/// Trait for reporting progress during operations
pub trait ProgressReporter: Send + Sync {
    /// Report the cumulative number of output bytes written so far
    fn report_progress(&self, bytes_written: u64);
}

impl<F> ProgressReporter for F
where
    F: Fn(u64) + Send + Sync,
{
    fn report_progress(&self, bytes_written: u64) {
        self(bytes_written);
    }
}
