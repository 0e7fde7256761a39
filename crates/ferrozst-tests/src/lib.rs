//! ferrozst integration testing support
//!
//! Shared data generators, stream builders and a leak-counting codec engine
//! used by the integration tests in `tests/`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Common helpers used across the integration tests so each test reads as a
/// scenario rather than as setup code.
pub mod test_utils;
