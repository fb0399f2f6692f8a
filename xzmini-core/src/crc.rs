//! CRC-32 for the XZ container.
//!
//! XZ protects its stream header, block headers, index and footer with
//! CRC-32 (ISO 3309, the same polynomial used by ZIP and GZIP), and CRC-32 is
//! also the one integrity check this decoder verifies on block data.
//!
//! ## Tables
//!
//! The lookup tables are evaluated at compile time and live in statics; they
//! are immutable for the whole process.
//!
//! Data of 16 bytes or more goes through the "slicing-by-8" path, which
//! folds 8 input bytes per iteration using 8 derived tables. Shorter updates
//! (header fields, single bytes) use the single-table loop.

const POLY: u32 = 0xEDB88320;

const fn build_tables() -> [[u32; 256]; 8] {
    let mut tables = [[0u32; 256]; 8];

    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        tables[0][i] = crc;
        i += 1;
    }

    let mut t = 1;
    while t < 8 {
        let mut i = 0usize;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = tables[0][(prev & 0xFF) as usize] ^ (prev >> 8);
            i += 1;
        }
        t += 1;
    }

    tables
}

/// CRC-32 slicing-by-8 tables (polynomial 0xEDB88320, reflected).
///
/// `CRC32_TABLES[0]` is the classic byte-at-a-time table.
static CRC32_TABLES: [[u32; 256]; 8] = build_tables();

/// CRC-32 calculator (ISO 3309).
///
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Initial value: 0xFFFFFFFF
/// - Final XOR: 0xFFFFFFFF
///
/// # Example
///
/// ```
/// use xzmini_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, ");
/// crc.update(b"World!");
/// assert_eq!(crc.value(), 0xEC4AC3D0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub const fn new() -> Self {
        Self { crc: 0xFFFFFFFF }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = 0xFFFFFFFF;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if data.len() >= 16 {
            self.crc = crc32_slice8(self.crc, data);
        } else {
            self.crc = crc32_bytes(self.crc, data);
        }
    }

    /// Current CRC value of everything fed so far.
    ///
    /// Non-consuming; the container decoder compares the running value byte
    /// by byte against a stored field as it streams in.
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Compute CRC-32 for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.value()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn crc32_bytes(mut crc: u32, data: &[u8]) -> u32 {
    let table = &CRC32_TABLES[0];
    for &byte in data {
        crc = table[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc
}

#[inline]
fn crc32_slice8(mut crc: u32, data: &[u8]) -> u32 {
    let t = &CRC32_TABLES;
    let mut chunks = data.chunks_exact(8);

    for chunk in &mut chunks {
        let lo = crc ^ u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        crc = t[7][(lo & 0xFF) as usize]
            ^ t[6][((lo >> 8) & 0xFF) as usize]
            ^ t[5][((lo >> 16) & 0xFF) as usize]
            ^ t[4][(lo >> 24) as usize]
            ^ t[3][chunk[4] as usize]
            ^ t[2][chunk[5] as usize]
            ^ t[1][chunk[6] as usize]
            ^ t[0][chunk[7] as usize];
    }

    crc32_bytes(crc, chunks.remainder())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_empty() {
        assert_eq!(Crc32::compute(b""), 0x00000000);
    }

    #[test]
    fn test_crc32_check() {
        // Standard CRC-32 check value for "123456789"
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_crc32_hello_world() {
        assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
    }

    #[test]
    fn test_crc32_value_is_repeatable() {
        let mut crc = Crc32::new();
        crc.update(b"1234");
        let first = crc.value();
        assert_eq!(first, crc.value());
        crc.update(b"56789");
        assert_eq!(crc.value(), 0xCBF43926);
    }

    #[test]
    fn test_crc32_reset() {
        let mut crc = Crc32::new();
        crc.update(b"garbage");
        crc.reset();
        crc.update(b"123456789");
        assert_eq!(crc.value(), 0xCBF43926);
    }

    #[test]
    fn test_xz_stream_flags_crc() {
        // Stream flags of an XZ stream using the CRC-32 check (00 01).
        assert_eq!(Crc32::compute(&[0x00, 0x01]), 0x36DE2269);
    }

    #[test]
    fn test_slice_tables_derived_from_base() {
        for t in 1..8 {
            for i in 0..256 {
                let prev = CRC32_TABLES[t - 1][i];
                let expected = CRC32_TABLES[0][(prev & 0xFF) as usize] ^ (prev >> 8);
                assert_eq!(CRC32_TABLES[t][i], expected, "table {} entry {}", t, i);
            }
        }
    }

    #[test]
    fn test_crc32_various_sizes() {
        // Sizes around the slicing threshold and the 8-byte stride.
        for size in [1, 7, 8, 15, 16, 17, 31, 32, 63, 64, 127, 128, 255, 256, 1025] {
            let data: Vec<u8> = (0..size).map(|i| (i * 31 + 7) as u8).collect();
            let whole = Crc32::compute(&data);

            let mut bytewise = Crc32::new();
            for &byte in &data {
                bytewise.update(&[byte]);
            }

            assert_eq!(whole, bytewise.value(), "CRC mismatch for size {}", size);
        }
    }
}
