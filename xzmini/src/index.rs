//! XZ index validation.
//!
//! The index lists one (unpadded size, uncompressed size) record per block.
//! Rather than storing the records, both the block decoder and the index
//! decoder fold them into an [`IndexHash`]; the index is valid when the two
//! hashes and the record counts agree.

use crate::container::{Result, Vli};
use xzmini_core::crc::Crc32;
use xzmini_core::traits::DecodeFault;

/// Running summary of block records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHash {
    unpadded: u64,
    uncompressed: u64,
    crc: Crc32,
}

impl IndexHash {
    /// Empty summary.
    pub fn new() -> Self {
        Self {
            unpadded: 0,
            uncompressed: 0,
            crc: Crc32::new(),
        }
    }

    /// Fold one record into the summary.
    pub fn add(&mut self, unpadded: u64, uncompressed: u64) {
        self.unpadded = self.unpadded.wrapping_add(unpadded);
        self.uncompressed = self.uncompressed.wrapping_add(uncompressed);
        self.crc.update(&unpadded.to_le_bytes());
        self.crc.update(&uncompressed.to_le_bytes());
    }
}

impl Default for IndexHash {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Count,
    Unpadded,
    Uncompressed,
}

/// Streaming decoder for the index records.
///
/// Fed one byte at a time, starting after the index indicator byte and
/// ending at the last record; padding and CRC32 are handled by the caller.
#[derive(Debug, Clone)]
pub struct IndexDecoder {
    field: Field,
    vli: Vli,
    blocks: u64,
    remaining: u64,
    unpadded: u64,
    hash: IndexHash,
}

impl IndexDecoder {
    /// Expect an index describing `blocks` blocks.
    pub fn new(blocks: u64) -> Self {
        Self {
            field: Field::Count,
            vli: Vli::new(),
            blocks,
            remaining: 0,
            unpadded: 0,
            hash: IndexHash::new(),
        }
    }

    /// Feed one byte. Returns `true` once the last record is complete.
    pub fn feed(&mut self, byte: u8) -> Result<bool> {
        let Some(value) = self.vli.feed(byte)? else {
            return Ok(false);
        };

        match self.field {
            Field::Count => {
                if value != self.blocks {
                    return Err(DecodeFault::Data);
                }
                self.remaining = value;
                self.field = Field::Unpadded;
            }
            Field::Unpadded => {
                self.unpadded = value;
                self.field = Field::Uncompressed;
            }
            Field::Uncompressed => {
                self.hash.add(self.unpadded, value);
                self.remaining -= 1;
                self.field = Field::Unpadded;
            }
        }

        Ok(self.remaining == 0)
    }

    /// Summary of the records decoded so far.
    pub fn hash(&self) -> &IndexHash {
        &self.hash
    }
}
