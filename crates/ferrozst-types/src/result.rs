//! Result type alias for ferrozst operations

use crate::Error;

/// Result type alias for ferrozst operations
pub type Result<T> = std::result::Result<T, Error>;
