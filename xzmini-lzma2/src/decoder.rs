//! LZMA symbol decoding.
//!
//! [`LzmaDecoder`] holds the probability model, the state machine and the
//! rep distances. It decodes symbols from a [`RangeDecoder`] into a
//! [`Dictionary`] until the dictionary limit is reached. A match cut short
//! by the limit stays pending and is finished at the start of the next run,
//! so decoding can stop at any output boundary.

use crate::Result;
use crate::dict::Dictionary;
use crate::model::{
    ALIGN_BITS, DIST_MODEL_END, DIST_MODEL_START, DIST_SLOTS, DIST_STATES, LEN_HIGH_BITS,
    LEN_LOW_BITS, LEN_LOW_SYMBOLS, LEN_MID_BITS, LEN_MID_SYMBOLS, LengthModel, LiteralModel,
    LzmaModel, LzmaProperties, MATCH_LEN_MIN, State,
};
use crate::range_coder::RangeDecoder;
use xzmini_core::traits::DecodeFault;

/// Decode a match length.
fn decode_length(rc: &mut RangeDecoder, model: &mut LengthModel, pos_state: usize) -> Result<u32> {
    if rc.decode_bit(&mut model.choice)? == 0 {
        let len = rc.decode_bit_tree(&mut model.low[pos_state], LEN_LOW_BITS)?;
        Ok(len + MATCH_LEN_MIN)
    } else if rc.decode_bit(&mut model.choice2)? == 0 {
        let len = rc.decode_bit_tree(&mut model.mid[pos_state], LEN_MID_BITS)?;
        Ok(len + MATCH_LEN_MIN + LEN_LOW_SYMBOLS as u32)
    } else {
        let len = rc.decode_bit_tree(&mut model.high, LEN_HIGH_BITS)?;
        Ok(len + MATCH_LEN_MIN + (LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS) as u32)
    }
}

/// LZMA decoder state.
#[derive(Debug)]
pub struct LzmaDecoder {
    model: LzmaModel,
    state: State,
    rep: [u32; 4],
    /// Bytes of the current match still to copy.
    len: u32,
    props: LzmaProperties,
    pos_mask: usize,
    literal_pos_mask: usize,
}

impl LzmaDecoder {
    /// Create a decoder with default properties.
    pub fn new() -> Self {
        let props = LzmaProperties::default();
        Self {
            model: LzmaModel::new(),
            state: State::new(),
            rep: [0; 4],
            len: 0,
            props,
            pos_mask: props.pos_mask(),
            literal_pos_mask: props.literal_pos_mask(),
        }
    }

    /// Apply new properties and reset the state.
    pub fn set_properties(&mut self, props: LzmaProperties) {
        self.props = props;
        self.pos_mask = props.pos_mask();
        self.literal_pos_mask = props.literal_pos_mask();
        self.reset();
    }

    /// Reset the state machine, rep distances and probabilities.
    pub fn reset(&mut self) {
        self.state = State::new();
        self.rep = [0; 4];
        self.len = 0;
        self.model.reset();
    }

    /// Drop any pending match, keeping the model.
    pub fn clear_pending(&mut self) {
        self.len = 0;
    }

    /// Bytes of an unfinished match.
    pub fn pending(&self) -> u32 {
        self.len
    }

    /// Decode until the dictionary limit is reached.
    pub fn run(&mut self, rc: &mut RangeDecoder, dict: &mut Dictionary) -> Result<()> {
        if dict.has_space() && self.len > 0 {
            dict.repeat(&mut self.len, self.rep[0]);
        }

        while dict.has_space() {
            let pos_state = dict.pos() & self.pos_mask;
            let state = self.state.value();

            if rc.decode_bit(&mut self.model.is_match[state][pos_state])? == 0 {
                self.decode_literal(rc, dict)?;
            } else {
                if rc.decode_bit(&mut self.model.is_rep[state])? == 0 {
                    self.decode_match(rc, pos_state)?;
                } else {
                    self.decode_rep_match(rc, pos_state)?;
                }

                if !dict.repeat(&mut self.len, self.rep[0]) {
                    return Err(DecodeFault::Data);
                }
            }
        }

        rc.normalize()
    }

    fn decode_literal(&mut self, rc: &mut RangeDecoder, dict: &mut Dictionary) -> Result<()> {
        let coder = LiteralModel::coder_index(
            dict.pos(),
            dict.get(0),
            self.props.lc,
            self.literal_pos_mask,
        );
        let probs = &mut self.model.literal.probs[coder];

        let byte = if self.state.is_literal() {
            rc.decode_bit_tree(&mut probs[..0x100], 8)?
        } else {
            let mut match_byte = (dict.get(self.rep[0]) as u32) << 1;
            let mut offset = 0x100u32;
            let mut symbol = 1u32;

            while symbol < 0x100 {
                let match_bit = match_byte & offset;
                match_byte <<= 1;
                let index = (offset + match_bit + symbol) as usize;
                if rc.decode_bit(&mut probs[index])? == 1 {
                    symbol = (symbol << 1) + 1;
                    offset = match_bit;
                } else {
                    symbol <<= 1;
                    offset ^= match_bit;
                }
            }

            symbol - 0x100
        };

        dict.put(byte as u8);
        self.state.update_literal();
        Ok(())
    }

    fn decode_match(&mut self, rc: &mut RangeDecoder, pos_state: usize) -> Result<()> {
        self.state.update_match();
        self.rep[3] = self.rep[2];
        self.rep[2] = self.rep[1];
        self.rep[1] = self.rep[0];

        self.len = decode_length(rc, &mut self.model.match_len, pos_state)?;

        let dist_state = ((self.len - MATCH_LEN_MIN) as usize).min(DIST_STATES - 1);
        let distance = &mut self.model.distance;
        let slot = rc.decode_bit_tree(&mut distance.slot[dist_state], DIST_SLOTS.trailing_zeros())?;

        self.rep[0] = if slot < DIST_MODEL_START {
            slot
        } else {
            let footer_bits = (slot >> 1) - 1;
            let base = (2 | (slot & 1)) << footer_bits;

            if slot < DIST_MODEL_END {
                let probs = &mut distance.special[(base - slot) as usize..];
                base + rc.decode_bit_tree_reverse(probs, footer_bits)?
            } else {
                let high = rc.decode_direct_bits(base >> footer_bits, footer_bits - ALIGN_BITS)?;
                (high << ALIGN_BITS) + rc.decode_bit_tree_reverse(&mut distance.align, ALIGN_BITS)?
            }
        };

        Ok(())
    }

    fn decode_rep_match(&mut self, rc: &mut RangeDecoder, pos_state: usize) -> Result<()> {
        let state = self.state.value();

        if rc.decode_bit(&mut self.model.is_rep0[state])? == 0 {
            if rc.decode_bit(&mut self.model.is_rep0_long[state][pos_state])? == 0 {
                self.state.update_short_rep();
                self.len = 1;
                return Ok(());
            }
        } else {
            let dist = if rc.decode_bit(&mut self.model.is_rep1[state])? == 0 {
                self.rep[1]
            } else {
                let dist = if rc.decode_bit(&mut self.model.is_rep2[state])? == 0 {
                    self.rep[2]
                } else {
                    let dist = self.rep[3];
                    self.rep[3] = self.rep[2];
                    dist
                };
                self.rep[2] = self.rep[1];
                dist
            };
            self.rep[1] = self.rep[0];
            self.rep[0] = dist;
        }

        self.state.update_long_rep();
        self.len = decode_length(rc, &mut self.model.rep_len, pos_state)?;
        Ok(())
    }
}

impl Default for LzmaDecoder {
    fn default() -> Self {
        Self::new()
    }
}
