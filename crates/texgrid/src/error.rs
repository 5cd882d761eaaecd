//! Error types and result handling for texture/array operations

use thiserror::Error;

/// Texture and array operation errors
#[derive(Debug, Error)]
pub enum TexError {
    /// Device memory exhausted
    #[error("device out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory {
        /// Requested bytes
        requested: usize,
        /// Bytes still available on the device
        available: usize,
    },

    /// Array extent is not allocatable
    #[error("invalid array dimensions: {width}x{height}x{depth}")]
    InvalidDimensions {
        /// Width in elements
        width: usize,
        /// Height in elements
        height: usize,
        /// Depth in elements
        depth: usize,
    },

    /// Unsupported channel bit-width/kind combination
    #[error("invalid channel format: {message}")]
    InvalidChannelFormat {
        /// Error message
        message: String,
    },

    /// Host buffer layout disagrees with the device-side extent
    #[error("shape mismatch: device side holds {expected} bytes, host buffer holds {actual}")]
    ShapeMismatch {
        /// Device-side byte length
        expected: usize,
        /// Host-side byte length
        actual: usize,
    },

    /// Malformed resource or texture descriptor combination
    #[error("invalid resource: {message}")]
    InvalidResource {
        /// Error message
        message: String,
    },

    /// Resource and texture descriptor cannot be bound together
    #[error("binding failed: {message}")]
    Binding {
        /// Error message
        message: String,
    },

    /// Synchronous access to memory with in-flight asynchronous operations
    #[error("synchronization required: {message}")]
    Synchronization {
        /// Error message
        message: String,
    },

    /// Invalid device ordinal
    #[error("invalid device ordinal: {device}")]
    InvalidDevice {
        /// Device ordinal
        device: i32,
    },

    /// Kernel launch configuration rejected
    #[error("invalid launch configuration: {message}")]
    InvalidLaunch {
        /// Error message
        message: String,
    },

    /// Invalid value error
    #[error("invalid value for {parameter}")]
    InvalidValue {
        /// Parameter name
        parameter: String,
    },
}

/// Result type for texture and array operations
pub type TexResult<T> = Result<T, TexError>;
