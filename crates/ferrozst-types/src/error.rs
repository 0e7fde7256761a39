//! Error types and handling for ferrozst
//!
//! Every failure the codec adapter can report is a variant of [`Error`]. The
//! engine-level variants (`Validation` through `Lifecycle`) map one-to-one onto
//! the failure modes of the compression and decompression engines; the rest are
//! ambient errors raised by I/O and configuration.

/// Main error type for ferrozst operations
#[derive(thiserror::Error, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// Caller-supplied parameter rejected before any engine resource was touched
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the rejected parameter
        message: String,
    },

    /// Codec engine, context or stream failed to initialize
    #[error("Initialization error: {message}")]
    Initialization {
        /// Description of the initialization failure
        message: String,
    },

    /// Foreign memory allocation or access failed
    #[error("Allocation error: {message}")]
    Allocation {
        /// Description of the allocation failure
        message: String,
    },

    /// A processing step reported a negative status
    #[error("Codec error {code}: {name}")]
    Codec {
        /// Engine error code (magnitude of the negative status)
        code: u64,
        /// Human-readable name resolved by the engine
        name: String,
    },

    /// A processing step consumed and produced nothing
    #[error("Codec stalled at input offset {offset} with {remaining} bytes unconsumed")]
    Stall {
        /// Input offset at which the step made no progress
        offset: usize,
        /// Input bytes left unconsumed
        remaining: usize,
    },

    /// Operation invoked on a destroyed or uninitialized engine
    #[error("Lifecycle error: {message}")]
    Lifecycle {
        /// Description of the lifecycle violation
        message: String,
    },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Parameter validation errors
    Validation,
    /// Initialization errors
    Initialization,
    /// Foreign memory errors
    Allocation,
    /// Engine step errors
    Codec,
    /// Non-progress errors
    Stall,
    /// Engine lifecycle errors
    Lifecycle,
    /// I/O related errors
    Io,
    /// Configuration errors
    Config,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Initialization { .. } => ErrorKind::Initialization,
            Self::Allocation { .. } => ErrorKind::Allocation,
            Self::Codec { .. } => ErrorKind::Codec,
            Self::Stall { .. } => ErrorKind::Stall,
            Self::Lifecycle { .. } => ErrorKind::Lifecycle,
            Self::Io { .. } => ErrorKind::Io,
            Self::Config { .. } => ErrorKind::Config,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new initialization error
    pub fn initialization<S: Into<String>>(message: S) -> Self {
        Self::Initialization {
            message: message.into(),
        }
    }

    /// Create a new allocation error
    pub fn allocation<S: Into<String>>(message: S) -> Self {
        Self::Allocation {
            message: message.into(),
        }
    }

    /// Create a new codec error from an engine error code and its resolved name
    pub fn codec<S: Into<String>>(code: u64, name: S) -> Self {
        Self::Codec {
            code,
            name: name.into(),
        }
    }

    /// Create a new stall error
    pub fn stall(offset: usize, remaining: usize) -> Self {
        Self::Stall { offset, remaining }
    }

    /// Create a new lifecycle error
    pub fn lifecycle<S: Into<String>>(message: S) -> Self {
        Self::Lifecycle {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
