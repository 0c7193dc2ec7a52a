//! Error types for ROOT file reading and histogram arithmetic.

use thiserror::Error;

/// Errors that can occur reading ROOT files or combining histograms.
#[derive(Error, Debug)]
pub enum RootError {
    /// I/O error reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid ROOT file magic bytes.
    #[error("not a ROOT file (bad magic)")]
    BadMagic,

    /// Buffer underflow (tried to read past end).
    #[error("unexpected end of buffer at offset {offset}, need {need} bytes, have {have}")]
    BufferUnderflow {
        /// Current offset in buffer.
        offset: usize,
        /// Bytes requested.
        need: usize,
        /// Bytes remaining.
        have: usize,
    },

    /// Key not found in directory.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Unsupported object class.
    #[error("unsupported class: {0}")]
    UnsupportedClass(String),

    /// Decompression failure.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Object deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Histogram integral is zero or not finite, so it cannot be used as a
    /// normalization denominator.
    #[error("histogram '{name}' has unusable integral {integral}")]
    ZeroIntegral {
        /// Histogram name.
        name: String,
        /// Offending integral.
        integral: f64,
    },

    /// Two histograms were combined bin-by-bin but their axes differ.
    #[error("binning mismatch between '{left}' and '{right}': {detail}")]
    BinningMismatch {
        /// Left-hand histogram name.
        left: String,
        /// Right-hand histogram name.
        right: String,
        /// What differs.
        detail: String,
    },
}

/// Result alias for ROOT operations.
pub type Result<T> = std::result::Result<T, RootError>;
