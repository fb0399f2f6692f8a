//! Resumable LZMA2 decoder.
//!
//! LZMA2 is a container format around LZMA that provides:
//! - Support for uncompressible chunks (stored as-is)
//! - Dictionary/state reset capability
//! - Chunk-based format for better streaming
//!
//! ## Chunk Format
//!
//! Each chunk starts with a control byte:
//! - 0x00: End of LZMA2 data
//! - 0x01: Uncompressed chunk, dictionary reset
//! - 0x02: Uncompressed chunk, no reset
//! - 0x80-0xFF: LZMA chunk. Bits 0-4 are bits 16-20 of the uncompressed
//!   size; bits 5-6 select the reset: none, state, state + new properties,
//!   or everything including the dictionary.
//!
//! [`Lzma2Decoder::run`] can return after any byte: the chunk header fields
//! are parsed one byte at a time and the decoder remembers where it stopped.

use crate::Result;
use crate::decoder::LzmaDecoder;
use crate::dict::{AllocationPolicy, Dictionary};
use crate::model::LzmaProperties;
use crate::range_coder::{RC_INIT_BYTES, RangeDecoder};
use log::trace;
use xzmini_core::traits::{DecodeFault, IoView};

/// Largest dictionary properties value accepted in a block header.
pub const DICT_PROPS_MAX: u8 = 39;

/// Dictionary size encoded by an LZMA2 dictionary properties byte.
///
/// Formula: `(2 | (props & 1)) << (props / 2 + 11)`. Returns `None` above
/// [`DICT_PROPS_MAX`].
pub fn dict_size_from_props(props: u8) -> Option<u32> {
    if props > DICT_PROPS_MAX {
        return None;
    }

    let base = 2 | (props as u32 & 1);
    Some(base << (props / 2 + 11))
}

/// Outcome of one [`Lzma2Decoder::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lzma2Status {
    /// More input or output space is needed.
    Running,
    /// The end-of-data control byte was consumed.
    Finished,
}

/// Chunk header fields, read one byte at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Header {
    Control,
    Uncompressed1,
    Uncompressed2,
    Compressed0,
    Compressed1,
    Properties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sequence {
    Header(Header),
    LzmaPrepare,
    LzmaFill,
    LzmaRun,
    Copy,
}

/// LZMA2 decoder.
#[derive(Debug)]
pub struct Lzma2Decoder {
    sequence: Sequence,
    /// Where to go after the compressed size has been read.
    next: Sequence,
    uncompressed: usize,
    compressed: usize,
    need_dict_reset: bool,
    need_props: bool,
    rc: RangeDecoder,
    lzma: LzmaDecoder,
    dict: Dictionary,
}

impl Lzma2Decoder {
    /// Create a decoder accepting dictionaries up to `dict_max` bytes.
    ///
    /// Fails with [`DecodeFault::Mem`] if the working memory cannot be
    /// allocated.
    pub fn new(policy: AllocationPolicy, dict_max: u32) -> Result<Self> {
        Ok(Self {
            sequence: Sequence::Header(Header::Control),
            next: Sequence::Header(Header::Control),
            uncompressed: 0,
            compressed: 0,
            need_dict_reset: true,
            need_props: true,
            rc: RangeDecoder::new()?,
            lzma: LzmaDecoder::new(),
            dict: Dictionary::new(policy, dict_max)?,
        })
    }

    /// Prepare for a new block with the given dictionary properties.
    pub fn reset(&mut self, dict_props: u8) -> Result<()> {
        let size = dict_size_from_props(dict_props).ok_or(DecodeFault::Options)?;
        self.dict.configure(size)?;

        self.lzma.clear_pending();
        self.sequence = Sequence::Header(Header::Control);
        self.need_dict_reset = true;
        self.need_props = true;
        Ok(())
    }

    /// Declared dictionary size of the current block.
    pub fn dict_size(&self) -> usize {
        self.dict.size()
    }

    /// Decode as much as `io` allows.
    pub fn run(&mut self, io: &mut IoView<'_>) -> Result<Lzma2Status> {
        loop {
            match self.sequence {
                Sequence::LzmaPrepare => {
                    if self.compressed < RC_INIT_BYTES {
                        return Err(DecodeFault::Data);
                    }
                    trace!(
                        "lzma2: lzma chunk, {} -> {} bytes",
                        self.compressed, self.uncompressed
                    );
                    self.rc.begin_chunk(self.compressed);
                    self.sequence = Sequence::LzmaFill;
                }
                Sequence::LzmaFill => {
                    if !self.rc.fill(io) {
                        return Ok(Lzma2Status::Running);
                    }
                    self.rc.init()?;
                    self.sequence = Sequence::LzmaRun;
                }
                Sequence::LzmaRun => {
                    if io.output_space() == 0 {
                        return Ok(Lzma2Status::Running);
                    }

                    self.dict
                        .set_limit(io.output_space().min(self.uncompressed));
                    self.lzma.run(&mut self.rc, &mut self.dict)?;
                    self.uncompressed -= self.dict.flush(io);

                    if self.uncompressed == 0 {
                        if self.lzma.pending() > 0 || !self.rc.is_finished() {
                            return Err(DecodeFault::Data);
                        }
                        self.sequence = Sequence::Header(Header::Control);
                    }
                }
                Sequence::Copy => {
                    self.dict.copy_stored(io, &mut self.compressed);
                    if self.compressed > 0 {
                        return Ok(Lzma2Status::Running);
                    }
                    self.sequence = Sequence::Header(Header::Control);
                }
                Sequence::Header(field) => {
                    let Some(byte) = io.read_byte() else {
                        return Ok(Lzma2Status::Running);
                    };
                    if self.header_byte(field, byte)? {
                        trace!("lzma2: end of data");
                        return Ok(Lzma2Status::Finished);
                    }
                }
            }
        }
    }

    /// Consume one chunk header byte. Returns `true` on the end marker.
    fn header_byte(&mut self, field: Header, byte: u8) -> Result<bool> {
        match field {
            Header::Control => {
                if byte == 0x00 {
                    return Ok(true);
                }
                self.start_chunk(byte)?;
            }
            Header::Uncompressed1 => {
                self.uncompressed += (byte as usize) << 8;
                self.sequence = Sequence::Header(Header::Uncompressed2);
            }
            Header::Uncompressed2 => {
                self.uncompressed += byte as usize + 1;
                self.sequence = Sequence::Header(Header::Compressed0);
            }
            Header::Compressed0 => {
                self.compressed = (byte as usize) << 8;
                self.sequence = Sequence::Header(Header::Compressed1);
            }
            Header::Compressed1 => {
                self.compressed += byte as usize + 1;
                self.sequence = self.next;
            }
            Header::Properties => {
                let props = LzmaProperties::from_lzma2_byte(byte).ok_or(DecodeFault::Data)?;
                self.lzma.set_properties(props);
                self.sequence = Sequence::LzmaPrepare;
            }
        }
        Ok(false)
    }

    fn start_chunk(&mut self, control: u8) -> Result<()> {
        if control >= 0xE0 || control == 0x01 {
            self.need_props = true;
            self.need_dict_reset = false;
            self.dict.reset();
        } else if self.need_dict_reset {
            return Err(DecodeFault::Data);
        }

        if control >= 0x80 {
            self.uncompressed = ((control & 0x1F) as usize) << 16;
            self.sequence = Sequence::Header(Header::Uncompressed1);

            if control >= 0xC0 {
                self.need_props = false;
                self.next = Sequence::Header(Header::Properties);
            } else if self.need_props {
                return Err(DecodeFault::Data);
            } else {
                self.next = Sequence::LzmaPrepare;
                if control >= 0xA0 {
                    self.lzma.reset();
                }
            }
        } else {
            if control > 0x02 {
                return Err(DecodeFault::Data);
            }
            trace!("lzma2: stored chunk, control {:#04x}", control);
            self.sequence = Sequence::Header(Header::Compressed0);
            self.next = Sequence::Copy;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Raw LZMA2 data for `b"abracadabra " * 8 + b"the end\n"` (4 KiB dictionary).
    const ABRACADABRA_LZMA2: [u8; 32] = [
        0xE0, 0x00, 0x67, 0x00, 0x18, 0x5D, 0x00, 0x30, 0x98, 0x8A, 0xAA, 0x9A, 0x59, 0xF5, 0x11,
        0xD8, 0x3E, 0xB4, 0x3B, 0x3F, 0xA7, 0x87, 0xB2, 0xCF, 0x36, 0xF8, 0x65, 0x9E, 0x92, 0xC2,
        0x00, 0x00,
    ];

    fn abracadabra() -> Vec<u8> {
        let mut data = b"abracadabra ".repeat(8);
        data.extend_from_slice(b"the end\n");
        data
    }

    fn decoder() -> Lzma2Decoder {
        let mut lzma2 = Lzma2Decoder::new(AllocationPolicy::Dynamic, 1 << 20).expect("alloc");
        lzma2.reset(0).expect("4 KiB dictionary");
        lzma2
    }

    /// Feed `input` in `in_step` pieces with `out_step` bytes of output room
    /// per call.
    fn decode_in_steps(input: &[u8], in_step: usize, out_step: usize) -> Result<Vec<u8>> {
        let mut lzma2 = decoder();
        let mut output = Vec::new();
        let mut in_pos = 0;

        loop {
            let end = (in_pos + in_step).min(input.len());
            let mut out = vec![0u8; out_step];
            let mut io = IoView::new(&input[..end], in_pos, &mut out, 0);
            let status = lzma2.run(&mut io)?;
            in_pos = io.in_pos();
            let produced = io.out_pos();
            output.extend_from_slice(&out[..produced]);

            if status == Lzma2Status::Finished {
                return Ok(output);
            }
            if in_pos == input.len() && produced == 0 && end == input.len() {
                return Err(DecodeFault::Buf);
            }
        }
    }

    #[test]
    fn test_dict_size_props() {
        assert_eq!(dict_size_from_props(0), Some(2 << 11));
        assert_eq!(dict_size_from_props(1), Some(3 << 11));
        assert_eq!(dict_size_from_props(22), Some(8 << 20));
        assert_eq!(dict_size_from_props(39), Some(3 << 30));
        assert_eq!(dict_size_from_props(40), None);
    }

    #[test]
    fn test_reset_rejects_large_dictionary_props() {
        let mut lzma2 = Lzma2Decoder::new(AllocationPolicy::Dynamic, 1 << 20).expect("alloc");
        assert_eq!(lzma2.reset(40), Err(DecodeFault::Options));
        assert!(matches!(
            lzma2.reset(22),
            Err(DecodeFault::MemLimit { needed, .. }) if needed == 8 << 20
        ));
        assert_eq!(lzma2.reset(16), Ok(()));
        assert_eq!(lzma2.dict_size(), 1 << 20);
    }

    #[test]
    fn test_stored_chunks() {
        let input = [0x01, 0x00, 0x02, b'a', b'b', b'c', 0x02, 0x00, 0x01, b'd', b'e', 0x00];
        assert_eq!(decode_in_steps(&input, 64, 64), Ok(b"abcde".to_vec()));
        assert_eq!(decode_in_steps(&input, 1, 1), Ok(b"abcde".to_vec()));
    }

    #[test]
    fn test_first_chunk_must_reset_dictionary() {
        let input = [0x02, 0x00, 0x00, b'a', 0x00];
        assert_eq!(decode_in_steps(&input, 64, 64), Err(DecodeFault::Data));
    }

    #[test]
    fn test_invalid_control_byte() {
        let input = [0x03, 0x00];
        assert_eq!(decode_in_steps(&input, 64, 64), Err(DecodeFault::Data));
        let input = [0x7F, 0x00];
        assert_eq!(decode_in_steps(&input, 64, 64), Err(DecodeFault::Data));
    }

    #[test]
    fn test_lzma_chunk_needs_properties_after_dict_reset() {
        // 0x80: LZMA chunk without state reset or properties.
        let input = [0x01, 0x00, 0x00, b'a', 0x80, 0x00, 0x00, 0x00, 0x04];
        assert_eq!(decode_in_steps(&input, 64, 64), Err(DecodeFault::Data));
    }

    #[test]
    fn test_lzma_chunk() {
        assert_eq!(
            decode_in_steps(&ABRACADABRA_LZMA2, 64, 4096),
            Ok(abracadabra())
        );
    }

    #[test]
    fn test_lzma_chunk_byte_by_byte() {
        assert_eq!(decode_in_steps(&ABRACADABRA_LZMA2, 1, 1), Ok(abracadabra()));
        assert_eq!(decode_in_steps(&ABRACADABRA_LZMA2, 3, 7), Ok(abracadabra()));
    }

    #[test]
    fn test_header_fields_resume_one_byte_at_a_time() {
        let mut lzma2 = decoder();
        let expected = [
            Sequence::Header(Header::Uncompressed1),
            Sequence::Header(Header::Uncompressed2),
            Sequence::Header(Header::Compressed0),
            Sequence::Header(Header::Compressed1),
            Sequence::Header(Header::Properties),
            Sequence::LzmaFill,
        ];

        for (pos, sequence) in expected.into_iter().enumerate() {
            let mut out = [0u8; 16];
            let mut io = IoView::new(&ABRACADABRA_LZMA2[..pos + 1], pos, &mut out, 0);
            assert_eq!(lzma2.run(&mut io), Ok(Lzma2Status::Running));
            assert_eq!(io.in_pos(), pos + 1);
            assert_eq!(lzma2.sequence, sequence, "after header byte {pos}");
        }
        assert_eq!(lzma2.uncompressed, 0x68);
        assert_eq!(lzma2.compressed, 0x19);
    }

    #[test]
    fn test_lzma_chunk_truncated() {
        let truncated = &ABRACADABRA_LZMA2[..20];
        assert_eq!(decode_in_steps(truncated, 64, 4096), Err(DecodeFault::Buf));
    }

    #[test]
    fn test_lzma_chunk_size_mismatch() {
        // Claim one byte less of uncompressed data than the chunk encodes.
        let mut input = ABRACADABRA_LZMA2;
        input[2] -= 1;
        assert_eq!(decode_in_steps(&input, 64, 4096), Err(DecodeFault::Data));
    }
}
