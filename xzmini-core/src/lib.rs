//! # xzmini Core
//!
//! Core components for the xzmini streaming decoder.
//!
//! - [`crc`]: CRC-32 with process-lifetime lookup tables
//! - [`check`]: integrity check types of the XZ stream flags
//! - [`traits`]: the decoding engine contract ([`DecoderEngine`], [`IoView`])
//! - [`transfer`]: bounded transfer primitives and byte source/sink traits
//! - [`error`]: Error types
//! - `mmap` (feature `mmap`): memory-mapped files as byte sources
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Streaming driver                                    │
//! │     staging buffers, outcome classifier, decompress()  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     XZ stream/block headers, index, checks             │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     LZMA2 chunks, LZMA range decoder, dictionary       │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     CRC-32, engine contract, transfer primitives       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use xzmini_core::crc::Crc32;
//! use xzmini_core::transfer::{stage_in, stage_out};
//!
//! let mut stage = [0u8; 8];
//! let n = stage_in(&mut stage, b"bounded", 0);
//!
//! let mut sink = [0u8; 4];
//! assert_eq!(stage_out(&stage[..n], &mut sink, 0), 4);
//! assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod check;
pub mod crc;
pub mod error;
#[cfg(feature = "mmap")]
pub mod mmap;
pub mod traits;
pub mod transfer;

// Re-exports for convenience
pub use check::CheckType;
pub use crc::Crc32;
pub use error::{Result, XzError};
#[cfg(feature = "mmap")]
pub use mmap::MappedSource;
pub use traits::{DecodeFault, DecodeStatus, DecodeWarning, DecoderEngine, IoView};
pub use transfer::{ByteSink, ByteSource, stage_in, stage_out};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::crc::Crc32;
    pub use crate::error::{Result, XzError};
    pub use crate::traits::{DecodeFault, DecodeStatus, DecodeWarning, DecoderEngine, IoView};
    pub use crate::transfer::{ByteSink, ByteSource};
}
