//! LZMA probability models.
//!
//! LZMA uses context-dependent probability models for:
//! - Literal decoding (context = previous byte + position)
//! - Match length decoding
//! - Distance decoding
//! - State machine transitions

use crate::range_coder::PROB_INIT;

/// Maximum number of position states (pb ≤ 4).
pub const POS_STATES_MAX: usize = 1 << 4;

/// Number of states in the LZMA state machine.
pub const NUM_STATES: usize = 12;

/// Number of states after which the next symbol is a literal.
const LIT_STATES: u8 = 7;

/// Number of bits for low length coding.
pub const LEN_LOW_BITS: u32 = 3;
/// Number of bits for mid length coding.
pub const LEN_MID_BITS: u32 = 3;
/// Number of bits for high length coding.
pub const LEN_HIGH_BITS: u32 = 8;

/// Number of low length symbols.
pub const LEN_LOW_SYMBOLS: usize = 1 << LEN_LOW_BITS;
/// Number of mid length symbols.
pub const LEN_MID_SYMBOLS: usize = 1 << LEN_MID_BITS;
/// Number of high length symbols.
pub const LEN_HIGH_SYMBOLS: usize = 1 << LEN_HIGH_BITS;

/// Minimum match length.
pub const MATCH_LEN_MIN: u32 = 2;

/// Number of length states used to pick a distance slot model.
pub const DIST_STATES: usize = 4;

/// Number of distance slots.
pub const DIST_SLOTS: usize = 64;

/// First slot whose distance has extra bits.
pub const DIST_MODEL_START: u32 = 4;

/// First slot whose extra bits are partly direct bits.
pub const DIST_MODEL_END: u32 = 14;

/// Number of alignment bits for distance decoding.
pub const ALIGN_BITS: u32 = 4;
/// Size of alignment table.
pub const ALIGN_SIZE: usize = 1 << ALIGN_BITS;

/// Distances below this are fully modelled.
pub const FULL_DISTANCES: usize = 1 << (DIST_MODEL_END / 2);

/// Size of the special distance table.
///
/// Slot `s` uses entries starting at `(base(s) - s)`, and reverse bit trees
/// index from 1, so one leading slot is never touched.
pub const SPECIAL_SIZE: usize = FULL_DISTANCES - DIST_MODEL_END as usize + 1;

/// Maximum number of literal coders (lc + lp ≤ 4 in LZMA2).
pub const LITERAL_CODERS_MAX: usize = 1 << 4;

/// Literal coder size (plain + matched mode).
pub const LITERAL_CODER_SIZE: usize = 0x300;

/// LZMA state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State(u8);

impl State {
    /// Initial state.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Get state value.
    pub fn value(self) -> usize {
        self.0 as usize
    }

    /// Check if the previous symbol was a literal.
    pub fn is_literal(self) -> bool {
        self.0 < LIT_STATES
    }

    /// Update state after literal.
    pub fn update_literal(&mut self) {
        self.0 = match self.0 {
            0..=3 => 0,
            4..=9 => self.0 - 3,
            _ => self.0 - 6,
        };
    }

    /// Update state after match.
    pub fn update_match(&mut self) {
        self.0 = if self.is_literal() { 7 } else { 10 };
    }

    /// Update state after long rep.
    pub fn update_long_rep(&mut self) {
        self.0 = if self.is_literal() { 8 } else { 11 };
    }

    /// Update state after short rep.
    pub fn update_short_rep(&mut self) {
        self.0 = if self.is_literal() { 9 } else { 11 };
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// LZMA properties (lc, lp, pb).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzmaProperties {
    /// Literal context bits.
    pub lc: u32,
    /// Literal position bits.
    pub lp: u32,
    /// Position bits.
    pub pb: u32,
}

impl LzmaProperties {
    /// Create new properties.
    pub fn new(lc: u32, lp: u32, pb: u32) -> Self {
        Self { lc, lp, pb }
    }

    /// Parse an LZMA2 properties byte.
    ///
    /// Returns `None` for values above `(4 * 5 + 4) * 9 + 8` and when
    /// `lc + lp > 4`, which LZMA2 forbids.
    pub fn from_lzma2_byte(byte: u8) -> Option<Self> {
        if byte > (4 * 5 + 4) * 9 + 8 {
            return None;
        }

        let pb = byte as u32 / 45;
        let remaining = byte as u32 - pb * 45;
        let lp = remaining / 9;
        let lc = remaining - lp * 9;

        if lc + lp > 4 {
            return None;
        }

        Some(Self { lc, lp, pb })
    }

    /// Encode to property byte.
    pub fn to_byte(self) -> u8 {
        ((self.pb * 45) + (self.lp * 9) + self.lc) as u8
    }

    /// Mask applied to the dictionary position to get the position state.
    pub fn pos_mask(self) -> usize {
        (1 << self.pb) - 1
    }

    /// Mask applied to the dictionary position for the literal context.
    pub fn literal_pos_mask(self) -> usize {
        (1 << self.lp) - 1
    }
}

impl Default for LzmaProperties {
    fn default() -> Self {
        Self { lc: 3, lp: 0, pb: 2 }
    }
}

/// Length decoder model.
#[derive(Debug, Clone)]
pub struct LengthModel {
    /// Choice bit (low vs mid+high).
    pub choice: u16,
    /// Choice2 bit (mid vs high).
    pub choice2: u16,
    /// Low length probabilities (per position state).
    pub low: [[u16; LEN_LOW_SYMBOLS]; POS_STATES_MAX],
    /// Mid length probabilities (per position state).
    pub mid: [[u16; LEN_MID_SYMBOLS]; POS_STATES_MAX],
    /// High length probabilities (shared).
    pub high: [u16; LEN_HIGH_SYMBOLS],
}

impl LengthModel {
    /// Create a new length model.
    pub fn new() -> Self {
        Self {
            choice: PROB_INIT,
            choice2: PROB_INIT,
            low: [[PROB_INIT; LEN_LOW_SYMBOLS]; POS_STATES_MAX],
            mid: [[PROB_INIT; LEN_MID_SYMBOLS]; POS_STATES_MAX],
            high: [PROB_INIT; LEN_HIGH_SYMBOLS],
        }
    }

    /// Reset the model.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for LengthModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Literal decoder model.
#[derive(Debug, Clone)]
pub struct LiteralModel {
    /// One coder per literal context; sized for the LZMA2 maximum so a
    /// properties change never reallocates.
    pub probs: Vec<[u16; LITERAL_CODER_SIZE]>,
}

impl LiteralModel {
    /// Create a new literal model.
    pub fn new() -> Self {
        Self {
            probs: vec![[PROB_INIT; LITERAL_CODER_SIZE]; LITERAL_CODERS_MAX],
        }
    }

    /// Reset the model.
    pub fn reset(&mut self) {
        for coder in &mut self.probs {
            coder.fill(PROB_INIT);
        }
    }

    /// Literal coder index for a dictionary position and previous byte.
    pub fn coder_index(pos: usize, prev_byte: u8, lc: u32, literal_pos_mask: usize) -> usize {
        let high = (pos & literal_pos_mask) << lc;
        let low = (prev_byte as usize) >> (8 - lc);
        high + low
    }
}

impl Default for LiteralModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Distance model.
#[derive(Debug, Clone)]
pub struct DistanceModel {
    /// Distance slot probabilities (per length state).
    pub slot: [[u16; DIST_SLOTS]; DIST_STATES],
    /// Reverse bit trees for slots 4..14, see [`SPECIAL_SIZE`].
    pub special: [u16; SPECIAL_SIZE],
    /// Alignment probabilities for the lowest four bits of large distances.
    pub align: [u16; ALIGN_SIZE],
}

impl DistanceModel {
    /// Create a new distance model.
    pub fn new() -> Self {
        Self {
            slot: [[PROB_INIT; DIST_SLOTS]; DIST_STATES],
            special: [PROB_INIT; SPECIAL_SIZE],
            align: [PROB_INIT; ALIGN_SIZE],
        }
    }

    /// Reset the model.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for DistanceModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete LZMA model containing all probability tables.
#[derive(Debug, Clone)]
pub struct LzmaModel {
    /// Is-match probabilities.
    pub is_match: [[u16; POS_STATES_MAX]; NUM_STATES],
    /// Is-rep probabilities.
    pub is_rep: [u16; NUM_STATES],
    /// Is-rep0 probabilities.
    pub is_rep0: [u16; NUM_STATES],
    /// Is-rep1 probabilities.
    pub is_rep1: [u16; NUM_STATES],
    /// Is-rep2 probabilities.
    pub is_rep2: [u16; NUM_STATES],
    /// Is-rep0-long probabilities.
    pub is_rep0_long: [[u16; POS_STATES_MAX]; NUM_STATES],

    /// Match length model.
    pub match_len: LengthModel,
    /// Rep match length model.
    pub rep_len: LengthModel,

    /// Literal model.
    pub literal: LiteralModel,

    /// Distance model.
    pub distance: DistanceModel,
}

impl LzmaModel {
    /// Create a new LZMA model.
    pub fn new() -> Self {
        Self {
            is_match: [[PROB_INIT; POS_STATES_MAX]; NUM_STATES],
            is_rep: [PROB_INIT; NUM_STATES],
            is_rep0: [PROB_INIT; NUM_STATES],
            is_rep1: [PROB_INIT; NUM_STATES],
            is_rep2: [PROB_INIT; NUM_STATES],
            is_rep0_long: [[PROB_INIT; POS_STATES_MAX]; NUM_STATES],
            match_len: LengthModel::new(),
            rep_len: LengthModel::new(),
            literal: LiteralModel::new(),
            distance: DistanceModel::new(),
        }
    }

    /// Reset all probabilities to initial values.
    pub fn reset(&mut self) {
        for state in &mut self.is_match {
            state.fill(PROB_INIT);
        }
        self.is_rep.fill(PROB_INIT);
        self.is_rep0.fill(PROB_INIT);
        self.is_rep1.fill(PROB_INIT);
        self.is_rep2.fill(PROB_INIT);
        for state in &mut self.is_rep0_long {
            state.fill(PROB_INIT);
        }
        self.match_len.reset();
        self.rep_len.reset();
        self.literal.reset();
        self.distance.reset();
    }
}

impl Default for LzmaModel {
    fn default() -> Self {
        Self::new()
    }
}
