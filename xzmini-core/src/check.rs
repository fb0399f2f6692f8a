//! Integrity check types declared by the XZ stream flags.

use std::fmt;

/// Check type from the low nibble of the second stream flags byte.
///
/// All sixteen IDs are valid in the container; only a few have names. The
/// size of a check field is a function of the ID alone, so a decoder can
/// skip checks it does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckType {
    /// No check (ID 0x00).
    None,
    /// CRC-32 (ID 0x01).
    Crc32,
    /// CRC-64 (ID 0x04).
    Crc64,
    /// SHA-256 (ID 0x0A).
    Sha256,
    /// Reserved ID without a defined algorithm.
    Reserved(u8),
}

impl CheckType {
    /// Largest valid check ID.
    pub const MAX_ID: u8 = 0x0F;

    /// Create from check ID. Returns `None` for IDs above [`Self::MAX_ID`].
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x00 => Some(Self::None),
            0x01 => Some(Self::Crc32),
            0x04 => Some(Self::Crc64),
            0x0A => Some(Self::Sha256),
            0x02..=Self::MAX_ID => Some(Self::Reserved(id)),
            _ => None,
        }
    }

    /// Check ID as stored in the stream flags.
    pub fn id(self) -> u8 {
        match self {
            Self::None => 0x00,
            Self::Crc32 => 0x01,
            Self::Crc64 => 0x04,
            Self::Sha256 => 0x0A,
            Self::Reserved(id) => id,
        }
    }

    /// Size of the check field in bytes.
    pub fn size(self) -> usize {
        match self.id() {
            0x00 => 0,
            0x01..=0x03 => 4,
            0x04..=0x06 => 8,
            0x07..=0x09 => 16,
            0x0A..=0x0C => 32,
            _ => 64,
        }
    }

    /// Whether this decoder can verify the check.
    pub fn is_verified(self) -> bool {
        matches!(self, Self::None | Self::Crc32)
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Crc32 => f.write_str("CRC32"),
            Self::Crc64 => f.write_str("CRC64"),
            Self::Sha256 => f.write_str("SHA-256"),
            Self::Reserved(id) => write!(f, "Unknown-{}", id),
        }
    }
}
