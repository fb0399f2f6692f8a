//! Range decoder for LZMA chunks.
//!
//! The range coder is an entropy coding method similar to arithmetic coding.
//! LZMA uses a specific variant with:
//! - 32-bit range tracking
//! - Normalization when range drops below 2^24
//! - 11-bit probability model (1024 = 50%)
//!
//! An LZMA2 chunk carries at most 64 KiB of compressed data and states its
//! exact size up front, so the decoder buffers the whole chunk before
//! decoding any of it. Symbol decoding then never has to suspend halfway
//! through a symbol; running out of buffered bytes means the chunk is
//! corrupt.

use crate::Result;
use xzmini_core::traits::{DecodeFault, IoView};

/// Number of bits in probability model.
pub const PROB_BITS: u32 = 11;

/// Initial probability (50%).
pub const PROB_INIT: u16 = 1 << (PROB_BITS - 1);

/// Maximum probability value.
pub const PROB_MAX: u16 = 1 << PROB_BITS;

/// Number of bits to shift for probability update.
pub const MOVE_BITS: u32 = 5;

/// Top value for range normalization.
const TOP_VALUE: u32 = 1 << 24;

/// Bytes consumed by range decoder initialization.
pub const RC_INIT_BYTES: usize = 5;

/// Largest compressed LZMA2 chunk.
pub const CHUNK_SIZE_MAX: usize = 1 << 16;

/// Range decoder over one buffered compressed chunk.
#[derive(Debug)]
pub struct RangeDecoder {
    buf: Vec<u8>,
    want: usize,
    pos: usize,
    range: u32,
    code: u32,
}

impl RangeDecoder {
    /// Create a decoder with room for the largest chunk.
    pub fn new() -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(CHUNK_SIZE_MAX)
            .map_err(|_| DecodeFault::Mem)?;
        Ok(Self {
            buf,
            want: 0,
            pos: 0,
            range: 0xFFFF_FFFF,
            code: 0,
        })
    }

    /// Start buffering a chunk of `size` compressed bytes.
    pub fn begin_chunk(&mut self, size: usize) {
        self.buf.clear();
        self.want = size.min(CHUNK_SIZE_MAX);
        self.pos = 0;
    }

    /// Buffer as much of the pending chunk as `io` offers.
    ///
    /// Returns `true` once the whole chunk is buffered.
    pub fn fill(&mut self, io: &mut IoView<'_>) -> bool {
        let missing = self.want - self.buf.len();
        self.buf.extend_from_slice(io.take_input(missing));
        self.buf.len() == self.want
    }

    /// Initialize range and code from the first five chunk bytes.
    pub fn init(&mut self) -> Result<()> {
        match self.buf.get(..RC_INIT_BYTES) {
            Some(&[0x00, b1, b2, b3, b4]) => {
                self.code = u32::from_be_bytes([b1, b2, b3, b4]);
                self.range = 0xFFFF_FFFF;
                self.pos = RC_INIT_BYTES;
                Ok(())
            }
            _ => Err(DecodeFault::Data),
        }
    }

    /// Whether the chunk ended cleanly: every byte consumed and code zero.
    pub fn is_finished(&self) -> bool {
        self.pos == self.buf.len() && self.code == 0
    }

    /// Normalize the range (refill when range gets small).
    #[inline]
    pub fn normalize(&mut self) -> Result<()> {
        if self.range < TOP_VALUE {
            let byte = *self.buf.get(self.pos).ok_or(DecodeFault::Data)?;
            self.pos += 1;
            self.range <<= 8;
            self.code = (self.code << 8) | byte as u32;
        }
        Ok(())
    }

    /// Decode a single bit with the given probability.
    #[inline]
    pub fn decode_bit(&mut self, prob: &mut u16) -> Result<u32> {
        self.normalize()?;

        let bound = (self.range >> PROB_BITS) * (*prob as u32);

        if self.code < bound {
            self.range = bound;
            *prob += (PROB_MAX - *prob) >> MOVE_BITS;
            Ok(0)
        } else {
            self.range -= bound;
            self.code -= bound;
            *prob -= *prob >> MOVE_BITS;
            Ok(1)
        }
    }

    /// Decode `count` bits with fixed probability, appended to `value`.
    pub fn decode_direct_bits(&mut self, mut value: u32, count: u32) -> Result<u32> {
        for _ in 0..count {
            self.normalize()?;
            self.range >>= 1;
            self.code = self.code.wrapping_sub(self.range);
            let mask = 0u32.wrapping_sub(self.code >> 31);
            self.code = self.code.wrapping_add(self.range & mask);
            value = (value << 1).wrapping_add(mask.wrapping_add(1));
        }
        Ok(value)
    }

    /// Decode a bit tree (normal order).
    pub fn decode_bit_tree(&mut self, probs: &mut [u16], num_bits: u32) -> Result<u32> {
        let mut index = 1usize;

        for _ in 0..num_bits {
            let bit = self.decode_bit(&mut probs[index])?;
            index = (index << 1) | bit as usize;
        }

        Ok((index as u32) - (1 << num_bits))
    }

    /// Decode a bit tree (reverse order).
    pub fn decode_bit_tree_reverse(&mut self, probs: &mut [u16], num_bits: u32) -> Result<u32> {
        let mut result = 0u32;
        let mut index = 1usize;

        for i in 0..num_bits {
            let bit = self.decode_bit(&mut probs[index])?;
            index = (index << 1) | bit as usize;
            result |= bit << i;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder_over(bytes: &[u8]) -> RangeDecoder {
        let mut rc = RangeDecoder::new().expect("alloc");
        rc.begin_chunk(bytes.len());
        let mut out = [0u8; 0];
        let mut io = IoView::new(bytes, 0, &mut out, 0);
        assert!(rc.fill(&mut io));
        rc
    }

    #[test]
    fn test_init_requires_zero_first_byte() {
        let mut rc = decoder_over(&[0x01, 0, 0, 0, 0]);
        assert_eq!(rc.init(), Err(DecodeFault::Data));

        let mut rc = decoder_over(&[0x00, 0, 0]);
        assert_eq!(rc.init(), Err(DecodeFault::Data));

        let mut rc = decoder_over(&[0x00, 0, 0, 0, 0]);
        assert_eq!(rc.init(), Ok(()));
        assert!(rc.is_finished());
    }

    #[test]
    fn test_fill_across_calls() {
        let mut rc = RangeDecoder::new().expect("alloc");
        rc.begin_chunk(6);
        let data = [0u8, 1, 2, 3, 4, 5, 6, 7];
        let mut out = [0u8; 0];

        let mut io = IoView::new(&data[..4], 0, &mut out, 0);
        assert!(!rc.fill(&mut io));
        assert_eq!(io.in_pos(), 4);

        let mut io = IoView::new(&data[4..], 0, &mut out, 0);
        assert!(rc.fill(&mut io));
        assert_eq!(io.in_pos(), 2);
    }

    #[test]
    fn test_zero_code_decodes_zero_bits() {
        // With code 0 every adaptive bit is 0 and its probability rises.
        let mut rc = decoder_over(&[0x00, 0, 0, 0, 0, 0, 0]);
        rc.init().expect("init");
        let mut prob = PROB_INIT;
        for _ in 0..8 {
            assert_eq!(rc.decode_bit(&mut prob), Ok(0));
        }
        assert!(prob > PROB_INIT);
    }

    #[test]
    fn test_direct_bits_all_ones() {
        // code = range - 1 yields 1 for every direct bit until normalization.
        let mut rc = decoder_over(&[0x00, 0xFF, 0xFF, 0xFF, 0xFE]);
        rc.init().expect("init");
        assert_eq!(rc.decode_direct_bits(0, 4), Ok(0b1111));
    }

    #[test]
    fn test_reading_past_chunk_is_corrupt() {
        let mut rc = decoder_over(&[0x00, 0, 0, 0, 0]);
        rc.init().expect("init");
        // Direct bits halve the range; after 8 of them normalization needs a
        // byte that the chunk does not have.
        assert_eq!(rc.decode_direct_bits(0, 9), Err(DecodeFault::Data));
    }
}
