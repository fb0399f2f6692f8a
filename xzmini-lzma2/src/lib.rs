//! # xzmini LZMA2
//!
//! Resumable LZMA2 decoding for the xzmini container engine.
//!
//! LZMA (Lempel-Ziv-Markov chain Algorithm) combines an LZ77-style
//! dictionary with range coding over adaptive, context-dependent
//! probabilities. LZMA2 wraps LZMA data in chunks that can reset the
//! dictionary, the state or the properties, and can store incompressible
//! data verbatim.
//!
//! Decoding is incremental: [`Lzma2Decoder::run`] takes whatever input and
//! output space an [`IoView`](xzmini_core::IoView) offers, makes as much
//! progress as possible and returns, keeping its position in the chunk
//! structure for the next call.
//!
//! ## Modules
//!
//! - [`range_coder`]: range decoder over a buffered compressed chunk
//! - [`model`]: probability tables and the LZMA state machine
//! - [`decoder`]: LZMA symbol decoding (literals, matches, rep matches)
//! - [`dict`]: the circular dictionary window
//! - [`lzma2`]: LZMA2 chunk parsing
//!
//! ## Example
//!
//! ```rust
//! use xzmini_core::IoView;
//! use xzmini_lzma2::{AllocationPolicy, Lzma2Decoder, Lzma2Status};
//!
//! // One stored chunk with a dictionary reset, then the end marker.
//! let input = [0x01, 0x00, 0x04, b'h', b'e', b'l', b'l', b'o', 0x00];
//! let mut output = [0u8; 16];
//!
//! let mut lzma2 = Lzma2Decoder::new(AllocationPolicy::Dynamic, 1 << 20).unwrap();
//! lzma2.reset(0).unwrap();
//! let mut io = IoView::new(&input, 0, &mut output, 0);
//! assert_eq!(lzma2.run(&mut io), Ok(Lzma2Status::Finished));
//! let produced = io.out_pos();
//! assert_eq!(&output[..produced], b"hello");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decoder;
pub mod dict;
pub mod lzma2;
pub mod model;
pub mod range_coder;

// Re-exports
pub use decoder::LzmaDecoder;
pub use dict::{AllocationPolicy, Dictionary};
pub use lzma2::{DICT_PROPS_MAX, Lzma2Decoder, Lzma2Status, dict_size_from_props};
pub use model::{LzmaModel, LzmaProperties, State};
pub use range_coder::RangeDecoder;

use xzmini_core::traits::DecodeFault;

/// Result type of the codec layer; faults map onto engine statuses.
pub type Result<T> = std::result::Result<T, DecodeFault>;
