//! # xzmini
//!
//! Bounded-buffer streaming XZ decompression.
//!
//! Bytes flow from an input [`ByteSource`] through an input staging buffer,
//! a resumable [`XzDecoder`], an output staging buffer, and finally into an
//! output [`ByteSink`]. Neither the whole input nor the whole output is
//! ever copied; memory use is the two staging buffers plus the decoder's
//! dictionary.
//!
//! ## Features
//!
//! - Single-stream XZ with the LZMA2 filter
//! - CRC32 integrity checks verified; other checks skipped with a warning
//!   (or rejected, see [`CheckPolicy`])
//! - Configurable dictionary limit and allocation policy
//! - Memory-mapped input files (feature `mmap`)
//!
//! ## Example
//!
//! ```rust
//! const HELLO_XZ: &[u8] = include_bytes!("../tests/fixtures/hello.xz");
//!
//! let mut output = [0u8; 5];
//! let result = xzmini::decompress(HELLO_XZ, &mut output).unwrap();
//! assert_eq!(result.written, 5);
//! assert_eq!(&output, b"hello");
//!
//! // Status-code form, diagnostics written to the given writer.
//! let mut small = [0u8; 3];
//! let mut diagnostics = Vec::new();
//! assert_eq!(xzmini::decompress_status_to(HELLO_XZ, &mut small, &mut diagnostics), 1);
//! assert!(String::from_utf8_lossy(&diagnostics).starts_with("xzmini: write error"));
//! ```
//!
//! ## Custom engines
//!
//! [`StreamDriver`] works with any [`DecoderEngine`]:
//!
//! ```rust
//! use xzmini::{DecoderConfig, StreamDriver, XzDecoder};
//! use xzmini::AllocationPolicy;
//!
//! let config = DecoderConfig::default().with_buffer_size(256);
//! let engine = XzDecoder::new(AllocationPolicy::Preallocate, 1 << 20).unwrap();
//! let mut sink = vec![0u8; 16];
//! let err = StreamDriver::new(engine, &config)
//!     .run(b"not an xz file".as_slice(), &mut sink)
//!     .unwrap_err();
//! assert_eq!(err.to_string(), "not a recognized container");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod container;
pub mod decoder;
pub mod driver;
pub mod index;
pub mod outcome;
pub mod stage;

use std::io::{self, Write};

// Re-exports
pub use config::{CheckPolicy, DecoderConfig};
pub use decoder::XzDecoder;
pub use driver::{Decompressed, StreamDriver};
pub use outcome::{Outcome, classify};
pub use xzmini_core::error::{Result, XzError};
pub use xzmini_core::traits::{DecodeFault, DecodeStatus, DecodeWarning, DecoderEngine, IoView};
pub use xzmini_core::transfer::{ByteSink, ByteSource, stage_in, stage_out};
pub use xzmini_core::{CheckType, Crc32};
pub use xzmini_lzma2::AllocationPolicy;

#[cfg(feature = "mmap")]
pub use xzmini_core::MappedSource;

/// Prefix of diagnostic lines.
pub const PROGRAM_NAME: &str = "xzmini";

/// Decompress an XZ stream from `input` into `output` with the default
/// configuration.
///
/// `output` must be large enough for the whole payload; a smaller buffer
/// receives a prefix and the call fails with [`XzError::Write`].
pub fn decompress(input: &[u8], output: &mut [u8]) -> Result<Decompressed> {
    decompress_with(&DecoderConfig::DEFAULT, input, output)
}

/// Decompress from any byte source into any byte sink.
pub fn decompress_with<S, K>(
    config: &DecoderConfig,
    source: &S,
    sink: &mut K,
) -> Result<Decompressed>
where
    S: ByteSource + ?Sized,
    K: ByteSink + ?Sized,
{
    let engine = XzDecoder::new(config.allocation, config.dict_limit)?;
    StreamDriver::new(engine, config).run(source, sink)
}

/// Decompress a memory-mapped file into `output`.
#[cfg(feature = "mmap")]
pub fn decompress_file<P: AsRef<std::path::Path>>(
    path: P,
    output: &mut [u8],
) -> Result<Decompressed> {
    let source = MappedSource::open(path)?;
    decompress_with(&DecoderConfig::DEFAULT, &source, output)
}

/// Decompress and report the outcome as a process-style status code.
///
/// Returns `0` on success and `1` on failure. Warnings and the failure
/// diagnostic are written to standard error.
pub fn decompress_status(input: &[u8], output: &mut [u8]) -> i32 {
    decompress_status_to(input, output, &mut io::stderr().lock())
}

/// Like [`decompress_status`], writing diagnostics to `diagnostics`.
///
/// Each diagnostic is one line, `"xzmini: <message>"`. Failures writing to
/// `diagnostics` are ignored and do not change the returned status.
pub fn decompress_status_to<W: Write + ?Sized>(
    input: &[u8],
    output: &mut [u8],
    diagnostics: &mut W,
) -> i32 {
    let config = DecoderConfig::DEFAULT;
    let result = XzDecoder::new(config.allocation, config.dict_limit)
        .map_err(XzError::from)
        .and_then(|engine| {
            StreamDriver::new(engine, &config).run_observed(input, output, |warning| {
                let _ = writeln!(diagnostics, "{}: {}", PROGRAM_NAME, warning);
            })
        });

    match result {
        Ok(_) => 0,
        Err(err) => {
            let _ = writeln!(diagnostics, "{}: {}", PROGRAM_NAME, err);
            1
        }
    }
}
