//! Dictionary (sliding window) for LZMA2 decoding.
//!
//! The dictionary is a circular buffer of the size declared by the block
//! header. Decoded bytes are written into it first and copied out to the
//! caller's output afterwards, so a match may reference anything still in
//! the window even after the output it produced has been flushed.
//!
//! Cursors, all within `0..=end`:
//!
//! - `start`: first byte not yet flushed to the output
//! - `pos`: next write position
//! - `full`: number of valid bytes (only grows until a reset)
//! - `limit`: decoding stops here so one flush never exceeds the output space

use crate::Result;
use xzmini_core::traits::{DecodeFault, IoView};

/// How the dictionary memory is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationPolicy {
    /// Allocate the full dictionary limit when the decoder is created.
    Preallocate,
    /// Allocate what a block header declares, growing as needed.
    #[default]
    Dynamic,
}

/// Circular dictionary buffer.
#[derive(Debug)]
pub struct Dictionary {
    buf: Vec<u8>,
    start: usize,
    pos: usize,
    full: usize,
    limit: usize,
    end: usize,
    size_max: usize,
    policy: AllocationPolicy,
}

impl Dictionary {
    /// Create a dictionary that will accept sizes up to `size_max`.
    ///
    /// With [`AllocationPolicy::Preallocate`] the whole `size_max` is
    /// allocated here.
    pub fn new(policy: AllocationPolicy, size_max: u32) -> Result<Self> {
        let size_max = size_max as usize;
        let mut buf = Vec::new();
        if policy == AllocationPolicy::Preallocate {
            grow(&mut buf, size_max)?;
        }

        Ok(Self {
            buf,
            start: 0,
            pos: 0,
            full: 0,
            limit: 0,
            end: 0,
            size_max,
            policy,
        })
    }

    /// Prepare for a block declaring a dictionary of `size` bytes.
    pub fn configure(&mut self, size: u32) -> Result<()> {
        let size = size as usize;
        if size > self.size_max {
            return Err(DecodeFault::MemLimit {
                needed: size as u64,
                limit: self.size_max as u64,
            });
        }

        if self.policy == AllocationPolicy::Dynamic && self.buf.len() < size {
            grow(&mut self.buf, size)?;
        }

        self.end = size;
        self.reset();
        Ok(())
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.start = 0;
        self.pos = 0;
        self.full = 0;
        self.limit = 0;
    }

    /// Declared dictionary size.
    pub fn size(&self) -> usize {
        self.end
    }

    /// Next write position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Allow decoding at most `out_max` more bytes before the next flush.
    pub fn set_limit(&mut self, out_max: usize) {
        self.limit = if self.end - self.pos <= out_max {
            self.end
        } else {
            self.pos + out_max
        };
    }

    /// Whether decoding may write another byte.
    #[inline]
    pub fn has_space(&self) -> bool {
        self.pos < self.limit
    }

    /// Byte at distance `dist + 1` behind the write position.
    ///
    /// Returns 0 for positions that were never written.
    #[inline]
    pub fn get(&self, dist: u32) -> u8 {
        let dist = dist as usize;
        if dist >= self.full {
            return 0;
        }
        let offset = if dist >= self.pos {
            self.end + self.pos - dist - 1
        } else {
            self.pos - dist - 1
        };
        self.buf[offset]
    }

    /// Append one byte.
    #[inline]
    pub fn put(&mut self, byte: u8) {
        self.buf[self.pos] = byte;
        self.pos += 1;
        if self.full < self.pos {
            self.full = self.pos;
        }
    }

    /// Copy up to `*len` bytes from distance `dist + 1`, stopping at the
    /// limit. `*len` is decreased by the number of bytes copied.
    ///
    /// Returns `false` if the distance reaches outside the valid history.
    pub fn repeat(&mut self, len: &mut u32, dist: u32) -> bool {
        let dist = dist as usize;
        if dist >= self.full {
            return false;
        }

        let left = (self.limit - self.pos).min(*len as usize);
        *len -= left as u32;

        let mut back = if dist >= self.pos {
            self.end + self.pos - dist - 1
        } else {
            self.pos - dist - 1
        };

        for _ in 0..left {
            self.buf[self.pos] = self.buf[back];
            self.pos += 1;
            back += 1;
            if back == self.end {
                back = 0;
            }
        }

        if self.full < self.pos {
            self.full = self.pos;
        }
        true
    }

    /// Copy a stored (uncompressed) chunk from input to both the dictionary
    /// and the output. `*left` is decreased by the bytes copied.
    pub fn copy_stored(&mut self, io: &mut IoView<'_>, left: &mut usize) {
        while *left > 0 && io.has_input() && io.output_space() > 0 {
            let n = (*left)
                .min(io.output_space())
                .min(self.end - self.pos);
            let src = io.take_input(n);
            let n = src.len();

            self.buf[self.pos..self.pos + n].copy_from_slice(src);
            self.pos += n;
            if self.full < self.pos {
                self.full = self.pos;
            }
            if self.pos == self.end {
                self.pos = 0;
            }

            io.write(src);
            *left -= n;
            self.start = self.pos;
        }
    }

    /// Move everything decoded since the last flush into the output.
    ///
    /// Returns the number of bytes flushed. The limit set before decoding
    /// guarantees they fit.
    pub fn flush(&mut self, io: &mut IoView<'_>) -> usize {
        let written = io.write(&self.buf[self.start..self.pos]);
        debug_assert_eq!(written, self.pos - self.start);

        if self.pos == self.end {
            self.pos = 0;
        }
        self.start = self.pos;
        written
    }
}

fn grow(buf: &mut Vec<u8>, size: usize) -> Result<()> {
    buf.clear();
    buf.try_reserve_exact(size).map_err(|_| DecodeFault::Mem)?;
    buf.resize(size, 0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(size: u32) -> Dictionary {
        let mut dict = Dictionary::new(AllocationPolicy::Dynamic, 1 << 16).expect("alloc");
        dict.configure(size).expect("configure");
        dict
    }

    #[test]
    fn test_memory_limit() {
        let mut dict = Dictionary::new(AllocationPolicy::Dynamic, 4096).expect("alloc");
        assert_eq!(
            dict.configure(8192),
            Err(DecodeFault::MemLimit {
                needed: 8192,
                limit: 4096
            })
        );
        assert_eq!(dict.configure(4096), Ok(()));
        assert_eq!(dict.size(), 4096);
    }

    #[test]
    fn test_preallocated_accepts_smaller_sizes() {
        let mut dict = Dictionary::new(AllocationPolicy::Preallocate, 8192).expect("alloc");
        assert_eq!(dict.configure(4096), Ok(()));
        assert_eq!(dict.configure(8192), Ok(()));
        assert!(dict.configure(8193).is_err());
    }

    #[test]
    fn test_put_repeat_flush() {
        let mut dict = dict(4096);
        let mut out = [0u8; 16];
        let mut io = IoView::new(&[], 0, &mut out, 0);

        dict.set_limit(16);
        dict.put(b'a');
        dict.put(b'b');
        let mut len = 6;
        assert!(dict.repeat(&mut len, 1));
        assert_eq!(len, 0);
        assert_eq!(dict.get(0), b'b');

        assert_eq!(dict.flush(&mut io), 8);
        assert_eq!(&out[..8], b"abababab");
    }

    #[test]
    fn test_repeat_stops_at_limit() {
        let mut dict = dict(4096);
        dict.set_limit(3);
        dict.put(b'x');
        let mut len = 10;
        assert!(dict.repeat(&mut len, 0));
        assert_eq!(len, 8);
        assert!(!dict.has_space());
    }

    #[test]
    fn test_repeat_rejects_distance_beyond_history() {
        let mut dict = dict(4096);
        dict.set_limit(8);
        assert!(!dict.repeat(&mut 2, 0));
        dict.put(1);
        assert!(!dict.repeat(&mut 2, 1));
        assert!(dict.repeat(&mut 2, 0));
    }

    #[test]
    fn test_wraparound() {
        let mut dict = dict(4096);
        let mut out = vec![0u8; 4096];
        for round in 0..3u8 {
            let mut io = IoView::new(&[], 0, &mut out, 0);
            dict.set_limit(4096);
            while dict.has_space() {
                dict.put(round);
            }
            assert_eq!(dict.flush(&mut io), 4096);
            assert_eq!(dict.pos(), 0);
        }
        // The whole window is still reachable after wrapping.
        assert_eq!(dict.get(4095), 2);
        dict.set_limit(1);
        let mut len = 1;
        assert!(dict.repeat(&mut len, 4095));
    }

    #[test]
    fn test_copy_stored_respects_output_space() {
        let mut dict = dict(4096);
        let input = b"stored chunk";
        let mut out = [0u8; 5];
        let mut left = input.len();

        let mut io = IoView::new(input, 0, &mut out, 0);
        dict.copy_stored(&mut io, &mut left);
        assert_eq!(io.in_pos(), 5);
        assert_eq!(left, input.len() - 5);
        assert_eq!(&out, b"store");
        assert_eq!(dict.get(0), b'e');
    }

    #[test]
    fn test_get_unwritten_is_zero() {
        let dict = dict(4096);
        assert_eq!(dict.get(0), 0);
        assert_eq!(dict.full, 0);
    }
}
