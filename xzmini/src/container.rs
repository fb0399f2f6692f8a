//! XZ container structures.
//!
//! Based on the XZ file format specification:
//! <https://tukaani.org/xz/xz-file-format.txt>
//!
//! The stream header, stream footer and block header are fixed or
//! self-delimiting, so the engine collects each one completely and parses it
//! here in one go. Variable-length integers are decoded one byte at a time
//! with [`Vli`] so the index can be streamed.

use xzmini_core::check::CheckType;
use xzmini_core::crc::Crc32;
use xzmini_core::traits::DecodeFault;

/// Result type of container parsing.
pub type Result<T> = std::result::Result<T, DecodeFault>;

/// Stream header magic bytes: 0xFD, '7', 'z', 'X', 'Z', 0x00
pub const XZ_MAGIC: [u8; 6] = [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];

/// Stream footer magic bytes: 'Y', 'Z'
pub const FOOTER_MAGIC: [u8; 2] = [0x59, 0x5A];

/// Size of the stream header and of the stream footer.
pub const STREAM_HEADER_SIZE: usize = 12;

/// Largest possible block header.
pub const BLOCK_HEADER_SIZE_MAX: usize = 1024;

/// LZMA2 filter ID.
pub const FILTER_LZMA2: u8 = 0x21;

/// Maximum encoded length of a variable-length integer.
pub const VLI_BYTES_MAX: u32 = 9;

/// Stream flags shared by the stream header and footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFlags {
    /// Integrity check of every block.
    pub check: CheckType,
}

impl StreamFlags {
    /// Decode stream flags from 2 bytes.
    ///
    /// The first byte is reserved and the high nibble of the second byte
    /// must be clear; anything else is an unsupported option.
    pub fn decode(bytes: [u8; 2]) -> Result<Self> {
        if bytes[0] != 0x00 {
            return Err(DecodeFault::Options);
        }

        let check = CheckType::from_id(bytes[1]).ok_or(DecodeFault::Options)?;
        Ok(Self { check })
    }

    /// Encode stream flags to 2 bytes.
    pub fn encode(self) -> [u8; 2] {
        [0x00, self.check.id()]
    }
}

fn read_le32(bytes: &[u8]) -> u32 {
    let mut le = [0u8; 4];
    le.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(le)
}

/// Parse a stream header.
///
/// Checks the magic (format error), the CRC32 of the flags (data error) and
/// then the flags themselves (options error).
pub fn parse_stream_header(buf: &[u8; STREAM_HEADER_SIZE]) -> Result<StreamFlags> {
    if buf[..6] != XZ_MAGIC {
        return Err(DecodeFault::Format);
    }

    if Crc32::compute(&buf[6..8]) != read_le32(&buf[8..12]) {
        return Err(DecodeFault::Data);
    }

    StreamFlags::decode([buf[6], buf[7]])
}

/// Parse a stream footer and match it against the decoded stream.
///
/// `index_size` is the size of the index without its CRC32 field, which is
/// what the backward size field stores divided by four.
pub fn parse_stream_footer(
    buf: &[u8; STREAM_HEADER_SIZE],
    flags: StreamFlags,
    index_size: u64,
) -> Result<()> {
    if buf[10..12] != FOOTER_MAGIC {
        return Err(DecodeFault::Data);
    }

    if Crc32::compute(&buf[4..10]) != read_le32(&buf[..4]) {
        return Err(DecodeFault::Data);
    }

    if index_size >> 2 != u64::from(read_le32(&buf[4..8])) {
        return Err(DecodeFault::Data);
    }

    if buf[8..10] != flags.encode() {
        return Err(DecodeFault::Data);
    }

    Ok(())
}

/// Resumable decoder for one variable-length integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vli {
    value: u64,
    shift: u32,
}

impl Vli {
    /// Start a new integer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Returns the value once its last byte has been seen.
    ///
    /// A zero byte ending a multi-byte integer and integers longer than
    /// [`VLI_BYTES_MAX`] bytes are corrupt.
    pub fn feed(&mut self, byte: u8) -> Result<Option<u64>> {
        self.value |= u64::from(byte & 0x7F) << self.shift;

        if byte & 0x80 == 0 {
            if byte == 0 && self.shift != 0 {
                return Err(DecodeFault::Data);
            }
            let value = self.value;
            *self = Self::new();
            return Ok(Some(value));
        }

        self.shift += 7;
        if self.shift == 7 * VLI_BYTES_MAX {
            return Err(DecodeFault::Data);
        }
        Ok(None)
    }
}

/// Decode a complete integer from `buf` starting at `*pos`.
fn read_vli(buf: &[u8], pos: &mut usize) -> Result<u64> {
    let mut vli = Vli::new();
    while let Some(&byte) = buf.get(*pos) {
        *pos += 1;
        if let Some(value) = vli.feed(byte)? {
            return Ok(value);
        }
    }
    Err(DecodeFault::Data)
}

/// Parsed block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Size of the block header in bytes.
    pub size: usize,
    /// Compressed size, if stored.
    pub compressed: Option<u64>,
    /// Uncompressed size, if stored.
    pub uncompressed: Option<u64>,
    /// LZMA2 dictionary properties byte.
    pub dict_props: u8,
}

impl BlockHeader {
    /// Encoded block header size for a given first byte.
    pub fn size_from_byte(byte: u8) -> usize {
        (byte as usize + 1) * 4
    }

    /// Parse a complete block header, size byte and CRC32 included.
    ///
    /// Only a single LZMA2 filter is supported; other filter chains and
    /// reserved flags are unsupported options.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < 8 || buf.len() != Self::size_from_byte(buf[0]) {
            return Err(DecodeFault::Data);
        }

        let (body, crc) = buf.split_at(buf.len() - 4);
        if Crc32::compute(body) != read_le32(crc) {
            return Err(DecodeFault::Data);
        }

        let flags = body[1];
        if flags & 0x3F != 0 {
            return Err(DecodeFault::Options);
        }

        let mut pos = 2;
        let compressed = if flags & 0x40 != 0 {
            Some(read_vli(body, &mut pos)?)
        } else {
            None
        };
        let uncompressed = if flags & 0x80 != 0 {
            Some(read_vli(body, &mut pos)?)
        } else {
            None
        };

        // Filter flags: ID, size of properties, properties
        let filter = body.get(pos..pos + 2).ok_or(DecodeFault::Options)?;
        if filter != [FILTER_LZMA2, 0x01] {
            return Err(DecodeFault::Options);
        }
        pos += 2;

        let dict_props = *body.get(pos).ok_or(DecodeFault::Data)?;
        pos += 1;

        if body[pos..].iter().any(|&b| b != 0) {
            return Err(DecodeFault::Options);
        }

        Ok(Self {
            size: buf.len(),
            compressed,
            uncompressed,
            dict_props,
        })
    }
}
