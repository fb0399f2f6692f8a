//! Decoder configuration.

use xzmini_lzma2::AllocationPolicy;

/// What to do when the stream's integrity check cannot be verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckPolicy {
    /// Report a warning and decode without verification.
    #[default]
    Warn,
    /// Treat the stream as an error.
    Reject,
}

/// Parameters of one decompression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// How dictionary memory is obtained.
    pub allocation: AllocationPolicy,
    /// Largest dictionary a block may declare, in bytes.
    pub dict_limit: u32,
    /// Capacity of the input staging buffer.
    pub input_buffer_size: usize,
    /// Capacity of the output staging buffer.
    pub output_buffer_size: usize,
    /// Handling of integrity checks this decoder does not implement.
    pub check_policy: CheckPolicy,
}

impl DecoderConfig {
    /// Default dictionary limit: 64 MiB.
    pub const DICT_LIMIT: u32 = 1 << 26;

    /// Default staging buffer capacity.
    pub const BUFFER_SIZE: usize = 8192;

    /// Dynamic allocation, 64 MiB dictionary limit, 8 KiB staging buffers,
    /// warn on unverified checks.
    pub const DEFAULT: Self = Self {
        allocation: AllocationPolicy::Dynamic,
        dict_limit: Self::DICT_LIMIT,
        input_buffer_size: Self::BUFFER_SIZE,
        output_buffer_size: Self::BUFFER_SIZE,
        check_policy: CheckPolicy::Warn,
    };

    /// Create the default configuration.
    pub fn new() -> Self {
        Self::DEFAULT
    }

    /// Set the allocation policy.
    pub fn with_allocation(mut self, allocation: AllocationPolicy) -> Self {
        self.allocation = allocation;
        self
    }

    /// Set the dictionary limit.
    pub fn with_dict_limit(mut self, dict_limit: u32) -> Self {
        self.dict_limit = dict_limit;
        self
    }

    /// Set both staging buffer capacities.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.input_buffer_size = size;
        self.output_buffer_size = size;
        self
    }

    /// Set the input staging buffer capacity.
    pub fn with_input_buffer_size(mut self, size: usize) -> Self {
        self.input_buffer_size = size;
        self
    }

    /// Set the output staging buffer capacity.
    pub fn with_output_buffer_size(mut self, size: usize) -> Self {
        self.output_buffer_size = size;
        self
    }

    /// Set the unverified-check policy.
    pub fn with_check_policy(mut self, check_policy: CheckPolicy) -> Self {
        self.check_policy = check_policy;
        self
    }

    /// Input staging capacity actually used (at least 1).
    pub fn input_capacity(&self) -> usize {
        self.input_buffer_size.max(1)
    }

    /// Output staging capacity actually used (at least 1).
    pub fn output_capacity(&self) -> usize {
        self.output_buffer_size.max(1)
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
