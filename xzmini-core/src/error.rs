//! Error types for xzmini operations.
//!
//! [`XzError`] is what a decoding run reports to its caller. Each variant is
//! one diagnostic category; the display string is the human-readable
//! diagnostic printed by the status-code entry points.

use crate::check::CheckType;
use crate::traits::DecodeFault;
use std::io;
use thiserror::Error;

/// The main error type for xzmini operations.
#[derive(Debug, Error)]
pub enum XzError {
    /// I/O error while opening an input file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The decoder could not allocate its working memory.
    #[error("memory allocation failed")]
    MemError,

    /// The container needs a larger dictionary than the configured limit.
    #[error("memory usage limit reached: need {needed} bytes, limit is {limit}")]
    MemLimit {
        /// Dictionary size declared by the block header.
        needed: u64,
        /// Configured dictionary size limit.
        limit: u64,
    },

    /// The input does not start with an XZ stream header.
    #[error("not a recognized container")]
    Format,

    /// The container uses a filter, flag or reserved field this decoder does
    /// not support.
    #[error("unsupported options")]
    Options,

    /// Checksum mismatch, invalid compressed data, or truncated input.
    #[error("data is corrupt")]
    Corrupt,

    /// The integrity check cannot be verified and the configuration rejects
    /// unverified input.
    #[error("unsupported check {check}; refusing to decode without verifying integrity")]
    UnverifiedCheck {
        /// Check type declared by the stream header.
        check: CheckType,
    },

    /// The decoding engine broke its progress contract.
    #[error("internal inconsistency")]
    Internal,

    /// The output sink accepted fewer bytes than were flushed to it.
    #[error("write error: sink accepted {written} of {wanted} bytes")]
    Write {
        /// Bytes the sink accepted in the failing flush.
        written: usize,
        /// Bytes the flush tried to write.
        wanted: usize,
    },
}

/// Result type alias for xzmini operations.
pub type Result<T> = std::result::Result<T, XzError>;

impl XzError {
    /// Create a memory limit error.
    pub fn mem_limit(needed: u64, limit: u64) -> Self {
        Self::MemLimit { needed, limit }
    }

    /// Create a write error.
    pub fn write(written: usize, wanted: usize) -> Self {
        Self::Write { written, wanted }
    }
}

impl From<DecodeFault> for XzError {
    fn from(fault: DecodeFault) -> Self {
        match fault {
            DecodeFault::Mem => Self::MemError,
            DecodeFault::MemLimit { needed, limit } => Self::mem_limit(needed, limit),
            DecodeFault::Format => Self::Format,
            DecodeFault::Options => Self::Options,
            DecodeFault::Data | DecodeFault::Buf => Self::Corrupt,
        }
    }
}
