//! Bitstream container writer.
//!
//! This crate contains:
//! - `BitWriter`: fixed-width, VBR, char6 and blob bit packing
//! - Abbreviations: per-record operand templates (`Abbreviation`, `AbbrevOp`)
//! - Block scopes and the cross-block `BlockInfoRegistry`
//! - `BitStream`: nested blocks with back-patched lengths and record emission

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod abbrev;
mod block;
mod error;
mod stream;
mod writer;

#[cfg(any(test, feature = "reader"))]
pub mod reader;

#[cfg(test)]
mod stream_tests;

pub use abbrev::{AbbrevId, AbbrevOp, Abbreviation};
pub use block::{BlockInfoRegistry, BlockScope, MAX_ABBREV_WIDTH, MIN_ABBREV_WIDTH};
pub use error::{BitstreamError, Result};
pub use stream::{
    BLOCK_INFO_BLOCK_ID, BitStream, DEFINE_ABBREV, END_BLOCK, ENTER_SUBBLOCK,
    TOP_LEVEL_ABBREV_WIDTH, UNABBREV_RECORD,
};
pub use writer::{BitWriter, decode_char6, encode_char6, fits, is_char6, is_char6_str};
