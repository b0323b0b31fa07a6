//! Raw bit packing.
//!
//! Bits are accumulated least significant first and flushed as 32-bit
//! little-endian words, so the output is word-aligned whenever no bits are
//! pending. Nothing here knows about blocks or records.

use crate::{BitstreamError, Result};

/// Append-only bit buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// Flushed words. Always a multiple of 4 bytes.
    out: Vec<u8>,
    /// Pending bits, fewer than 32 between calls.
    cur: u64,
    cur_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits written so far, including pending ones.
    pub fn bit_position(&self) -> u64 {
        self.out.len() as u64 * 8 + u64::from(self.cur_bits)
    }

    /// Number of flushed bytes. Equals the byte position when aligned.
    pub fn byte_len(&self) -> usize {
        self.out.len()
    }

    pub fn is_aligned(&self) -> bool {
        self.cur_bits == 0
    }

    /// Write the low `width` bits of `value`.
    pub fn write_fixed(&mut self, value: u64, width: u32) -> Result<()> {
        if width > 64 {
            return Err(BitstreamError::InvalidFixedWidth(width));
        }
        if !fits(u128::from(value), width) {
            return Err(BitstreamError::ValueTooWide {
                value: u128::from(value),
                width,
            });
        }
        self.emit(value, width);
        Ok(())
    }

    /// Write `value` as `width`-bit chunks carrying `width - 1` payload bits,
    /// low-order chunk first. All chunks but the last set the high bit.
    pub fn write_vbr(&mut self, value: u128, width: u32) -> Result<()> {
        if !(2..=32).contains(&width) {
            return Err(BitstreamError::InvalidVbrWidth(width));
        }

        let payload = width - 1;
        let threshold = 1u128 << payload;
        let mut rest = value;
        while rest >= threshold {
            let chunk = (rest & (threshold - 1)) | threshold;
            self.emit(chunk as u64, width);
            rest >>= payload;
        }
        self.emit(rest as u64, width);
        Ok(())
    }

    pub fn write_char6(&mut self, ch: char) -> Result<()> {
        let code = encode_char6(ch).ok_or(BitstreamError::InvalidChar6(ch))?;
        self.emit(u64::from(code), 6);
        Ok(())
    }

    /// Write whole bytes. Used for blob payloads, which are aligned first.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.emit(u64::from(byte), 8);
        }
    }

    /// Zero-pad to the next 32-bit boundary.
    pub fn align32(&mut self) {
        if self.cur_bits > 0 {
            self.emit(0, 32 - self.cur_bits);
        }
    }

    /// Overwrite a previously flushed 32-bit word.
    pub fn patch_word(&mut self, byte_offset: usize, value: u32) -> Result<()> {
        if !byte_offset.is_multiple_of(4) || byte_offset + 4 > self.out.len() {
            return Err(BitstreamError::PatchOutOfBounds(byte_offset));
        }
        self.out[byte_offset..byte_offset + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Align and hand out the bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.align32();
        self.out
    }

    fn emit(&mut self, value: u64, width: u32) {
        let mut value = value;
        let mut width = width;
        while width > 0 {
            // At most 32 bits per step keeps `cur` within 63 bits.
            let take = width.min(32);
            let chunk = value & low_mask(take);
            self.cur |= chunk << self.cur_bits;
            self.cur_bits += take;
            if self.cur_bits >= 32 {
                self.out.extend_from_slice(&(self.cur as u32).to_le_bytes());
                self.cur >>= 32;
                self.cur_bits -= 32;
            }
            value >>= take;
            width -= take;
        }
    }
}

fn low_mask(width: u32) -> u64 {
    (1u64 << width) - 1
}

/// Whether `value` is representable in `width` bits.
pub fn fits(value: u128, width: u32) -> bool {
    width >= 128 || value >> width == 0
}

/// Map `[a-zA-Z0-9._]` to its 6-bit code.
pub fn encode_char6(ch: char) -> Option<u8> {
    match ch {
        'a'..='z' => Some(ch as u8 - b'a'),
        'A'..='Z' => Some(ch as u8 - b'A' + 26),
        '0'..='9' => Some(ch as u8 - b'0' + 52),
        '.' => Some(62),
        '_' => Some(63),
        _ => None,
    }
}

/// Inverse of [`encode_char6`].
pub fn decode_char6(code: u8) -> Option<char> {
    match code {
        0..=25 => Some((b'a' + code) as char),
        26..=51 => Some((b'A' + code - 26) as char),
        52..=61 => Some((b'0' + code - 52) as char),
        62 => Some('.'),
        63 => Some('_'),
        _ => None,
    }
}

pub fn is_char6(ch: char) -> bool {
    encode_char6(ch).is_some()
}

/// Whether every character of `s` has a char6 encoding.
pub fn is_char6_str(s: &str) -> bool {
    s.chars().all(is_char6)
}
