//! Incremental XZ stream decoder.
//!
//! [`XzDecoder`] implements [`DecoderEngine`] for a single XZ stream:
//!
//! ```text
//! stream header
//! (block header, LZMA2 data, block padding, check)*
//! index, index padding, index CRC32
//! stream footer
//! ```
//!
//! Every step consumes as much staged input and fills as much output space
//! as it can, then returns. The decoder remembers its position in the
//! sequence above, so input and output may be split anywhere.

use crate::container::{
    BLOCK_HEADER_SIZE_MAX, BlockHeader, STREAM_HEADER_SIZE, StreamFlags, parse_stream_footer,
    parse_stream_header,
};
use crate::index::{IndexDecoder, IndexHash};
use log::debug;
use xzmini_core::check::CheckType;
use xzmini_core::crc::Crc32;
use xzmini_core::traits::{DecodeFault, DecodeStatus, DecodeWarning, DecoderEngine, IoView};
use xzmini_lzma2::{AllocationPolicy, Lzma2Decoder, Lzma2Status};

type Result<T> = std::result::Result<T, DecodeFault>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sequence {
    StreamHeader,
    BlockStart,
    BlockHeader,
    BlockUncompress,
    BlockPadding,
    BlockCheck,
    Index,
    IndexPadding,
    IndexCrc32,
    StreamFooter,
    Finished,
}

/// Collects a fixed-size header before it is parsed.
#[derive(Debug)]
struct Temp {
    buf: [u8; BLOCK_HEADER_SIZE_MAX],
    pos: usize,
    size: usize,
}

impl Temp {
    fn new(size: usize) -> Self {
        Self {
            buf: [0; BLOCK_HEADER_SIZE_MAX],
            pos: 0,
            size,
        }
    }

    fn expect(&mut self, size: usize) {
        self.pos = 0;
        self.size = size;
    }

    /// Returns `true` once `size` bytes have been collected.
    fn fill(&mut self, io: &mut IoView<'_>) -> bool {
        let src = io.take_input(self.size - self.pos);
        self.buf[self.pos..self.pos + src.len()].copy_from_slice(src);
        self.pos += src.len();
        self.pos == self.size
    }

    fn bytes(&self) -> &[u8] {
        &self.buf[..self.size]
    }

    fn stream_bytes(&self) -> [u8; STREAM_HEADER_SIZE] {
        let mut buf = [0u8; STREAM_HEADER_SIZE];
        buf.copy_from_slice(&self.buf[..STREAM_HEADER_SIZE]);
        buf
    }
}

/// Sizes of the block being decoded and the summary of finished blocks.
#[derive(Debug)]
struct BlockState {
    header: Option<BlockHeader>,
    compressed: u64,
    uncompressed: u64,
    count: u64,
    hash: IndexHash,
}

/// XZ stream decoder.
///
/// Only the LZMA2 filter is supported. CRC32 checks are verified; other
/// check types are skipped after a one-time
/// [`DecodeWarning::UnsupportedCheck`].
///
/// # Example
///
/// ```rust
/// use xzmini::{AllocationPolicy, DecodeStatus, DecoderEngine, IoView, XzDecoder};
///
/// let mut decoder = XzDecoder::new(AllocationPolicy::Dynamic, 1 << 26).unwrap();
/// let mut output = [0u8; 16];
/// let mut io = IoView::new(b"not xz at all", 0, &mut output, 0);
/// assert!(matches!(decoder.step(&mut io), DecodeStatus::Fatal(_)));
/// ```
#[derive(Debug)]
pub struct XzDecoder {
    sequence: Sequence,
    flags: StreamFlags,
    temp: Temp,
    block: BlockState,
    index: IndexDecoder,
    index_size: u64,
    /// CRC32 of the current block's output or of the index.
    crc: Crc32,
    /// Position within a check field being validated or skipped.
    check_pos: usize,
    lzma2: Lzma2Decoder,
    allow_buf_error: bool,
}

impl XzDecoder {
    /// Create a decoder.
    ///
    /// Blocks declaring a dictionary larger than `dict_limit` fail with
    /// [`DecodeFault::MemLimit`]. With [`AllocationPolicy::Preallocate`] the
    /// whole limit is allocated here.
    pub fn new(allocation: AllocationPolicy, dict_limit: u32) -> Result<Self> {
        Ok(Self {
            sequence: Sequence::StreamHeader,
            flags: StreamFlags {
                check: CheckType::None,
            },
            temp: Temp::new(STREAM_HEADER_SIZE),
            block: BlockState {
                header: None,
                compressed: 0,
                uncompressed: 0,
                count: 0,
                hash: IndexHash::new(),
            },
            index: IndexDecoder::new(0),
            index_size: 0,
            crc: Crc32::new(),
            check_pos: 0,
            lzma2: Lzma2Decoder::new(allocation, dict_limit)?,
            allow_buf_error: false,
        })
    }

    /// Check type declared by the stream header, once it has been read.
    pub fn check(&self) -> Option<CheckType> {
        match self.sequence {
            Sequence::StreamHeader => None,
            _ => Some(self.flags.check),
        }
    }

    fn decode(&mut self, io: &mut IoView<'_>) -> Result<DecodeStatus> {
        loop {
            match self.sequence {
                Sequence::StreamHeader => {
                    if !self.temp.fill(io) {
                        return Ok(DecodeStatus::Progress);
                    }

                    self.flags = parse_stream_header(&self.temp.stream_bytes())?;
                    debug!("xz: stream header, check {}", self.flags.check);
                    self.sequence = Sequence::BlockStart;

                    if !self.flags.check.is_verified() {
                        return Ok(DecodeStatus::Warning(DecodeWarning::UnsupportedCheck(
                            self.flags.check,
                        )));
                    }
                }
                Sequence::BlockStart => {
                    let Some(byte) = io.peek_byte() else {
                        return Ok(DecodeStatus::Progress);
                    };

                    if byte == 0x00 {
                        io.read_byte();
                        self.start_index();
                    } else {
                        self.temp.expect(BlockHeader::size_from_byte(byte));
                        self.sequence = Sequence::BlockHeader;
                    }
                }
                Sequence::BlockHeader => {
                    if !self.temp.fill(io) {
                        return Ok(DecodeStatus::Progress);
                    }
                    self.start_block()?;
                }
                Sequence::BlockUncompress => {
                    if self.decode_block(io)? == Lzma2Status::Running {
                        return Ok(DecodeStatus::Progress);
                    }
                    self.finish_block()?;
                }
                Sequence::BlockPadding => {
                    while self.block.compressed & 3 != 0 {
                        let Some(byte) = io.read_byte() else {
                            return Ok(DecodeStatus::Progress);
                        };
                        if byte != 0x00 {
                            return Err(DecodeFault::Data);
                        }
                        self.block.compressed += 1;
                    }
                    self.sequence = Sequence::BlockCheck;
                }
                Sequence::BlockCheck => {
                    let done = if self.flags.check == CheckType::Crc32 {
                        self.validate_crc(io)?
                    } else {
                        self.skip_check(io)
                    };
                    if !done {
                        return Ok(DecodeStatus::Progress);
                    }
                    self.sequence = Sequence::BlockStart;
                }
                Sequence::Index => loop {
                    let Some(byte) = io.read_byte() else {
                        return Ok(DecodeStatus::Progress);
                    };
                    self.index_byte(byte);
                    if self.index.feed(byte)? {
                        self.sequence = Sequence::IndexPadding;
                        break;
                    }
                },
                Sequence::IndexPadding => {
                    while self.index_size & 3 != 0 {
                        let Some(byte) = io.read_byte() else {
                            return Ok(DecodeStatus::Progress);
                        };
                        if byte != 0x00 {
                            return Err(DecodeFault::Data);
                        }
                        self.index_byte(byte);
                    }

                    if self.index.hash() != &self.block.hash {
                        return Err(DecodeFault::Data);
                    }
                    self.sequence = Sequence::IndexCrc32;
                }
                Sequence::IndexCrc32 => {
                    if !self.validate_crc(io)? {
                        return Ok(DecodeStatus::Progress);
                    }
                    self.temp.expect(STREAM_HEADER_SIZE);
                    self.sequence = Sequence::StreamFooter;
                }
                Sequence::StreamFooter => {
                    if !self.temp.fill(io) {
                        return Ok(DecodeStatus::Progress);
                    }
                    parse_stream_footer(&self.temp.stream_bytes(), self.flags, self.index_size)?;
                    debug!("xz: end of stream, {} blocks", self.block.count);
                    self.sequence = Sequence::Finished;
                }
                Sequence::Finished => return Ok(DecodeStatus::StreamEnd),
            }
        }
    }

    fn start_block(&mut self) -> Result<()> {
        let header = BlockHeader::parse(self.temp.bytes())?;
        debug!(
            "xz: block header, {} bytes, compressed {:?}, uncompressed {:?}, dict props {}",
            header.size, header.compressed, header.uncompressed, header.dict_props
        );

        self.lzma2.reset(header.dict_props)?;
        self.block.header = Some(header);
        self.block.compressed = 0;
        self.block.uncompressed = 0;
        self.sequence = Sequence::BlockUncompress;
        Ok(())
    }

    fn decode_block(&mut self, io: &mut IoView<'_>) -> Result<Lzma2Status> {
        let in_start = io.in_pos();
        let out_start = io.out_pos();
        let status = self.lzma2.run(io)?;

        self.block.compressed += (io.in_pos() - in_start) as u64;
        self.block.uncompressed += (io.out_pos() - out_start) as u64;
        if self.flags.check == CheckType::Crc32 {
            self.crc.update(io.produced_since(out_start));
        }

        let Some(header) = &self.block.header else {
            return Err(DecodeFault::Data);
        };
        if header.compressed.is_some_and(|size| self.block.compressed > size)
            || header.uncompressed.is_some_and(|size| self.block.uncompressed > size)
        {
            return Err(DecodeFault::Data);
        }

        Ok(status)
    }

    fn finish_block(&mut self) -> Result<()> {
        let Some(header) = self.block.header.take() else {
            return Err(DecodeFault::Data);
        };

        if header.compressed.is_some_and(|size| size != self.block.compressed)
            || header.uncompressed.is_some_and(|size| size != self.block.uncompressed)
        {
            return Err(DecodeFault::Data);
        }

        let unpadded = header.size as u64 + self.block.compressed + self.flags.check.size() as u64;
        self.block.hash.add(unpadded, self.block.uncompressed);
        self.block.count += 1;
        self.sequence = Sequence::BlockPadding;
        Ok(())
    }

    fn start_index(&mut self) {
        debug!("xz: index, {} blocks decoded", self.block.count);
        self.index = IndexDecoder::new(self.block.count);
        self.crc.reset();
        self.index_size = 0;
        self.index_byte(0x00);
        self.sequence = Sequence::Index;
    }

    fn index_byte(&mut self, byte: u8) {
        self.crc.update(&[byte]);
        self.index_size += 1;
    }

    /// Compare the next bytes against the running CRC32, little endian.
    fn validate_crc(&mut self, io: &mut IoView<'_>) -> Result<bool> {
        let expected = self.crc.value().to_le_bytes();
        while self.check_pos < expected.len() {
            let Some(byte) = io.read_byte() else {
                return Ok(false);
            };
            if byte != expected[self.check_pos] {
                return Err(DecodeFault::Data);
            }
            self.check_pos += 1;
        }

        self.check_pos = 0;
        self.crc.reset();
        Ok(true)
    }

    /// Skip a check field this decoder does not verify.
    fn skip_check(&mut self, io: &mut IoView<'_>) -> bool {
        let size = self.flags.check.size();
        self.check_pos += io.take_input(size - self.check_pos).len();
        if self.check_pos < size {
            return false;
        }
        self.check_pos = 0;
        true
    }
}

impl DecoderEngine for XzDecoder {
    fn step(&mut self, io: &mut IoView<'_>) -> DecodeStatus {
        let in_start = io.in_pos();
        let out_start = io.out_pos();

        let status = self.decode(io).unwrap_or_else(DecodeStatus::Fatal);

        // Two steps in a row without progress: the input is truncated.
        if status == DecodeStatus::Progress && in_start == io.in_pos() && out_start == io.out_pos()
        {
            if self.allow_buf_error {
                return DecodeStatus::Fatal(DecodeFault::Buf);
            }
            self.allow_buf_error = true;
        } else {
            self.allow_buf_error = false;
        }

        status
    }
}
