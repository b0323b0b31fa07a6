//! Errors that can occur while writing a bitstream.

/// Error during bit packing, abbreviation handling, or block management.
///
/// Every variant is a contract violation by the caller: the stream that
/// produced it must be discarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitstreamError {
    /// Value has bits set above the requested width.
    #[error("value {value} does not fit in {width} bits")]
    ValueTooWide { value: u128, width: u32 },

    #[error("invalid fixed width: {0} (max 64)")]
    InvalidFixedWidth(u32),

    #[error("invalid VBR width: {0} (expected 2..=32)")]
    InvalidVbrWidth(u32),

    #[error("character {0:?} has no char6 encoding")]
    InvalidChar6(char),

    /// Abbreviation id widths must leave room for the four built-in codes.
    #[error("invalid abbreviation id width: {0} (expected 2..=32)")]
    InvalidAbbrevWidth(u32),

    #[error("invalid abbreviation \"{name}\": {reason}")]
    InvalidAbbreviation { name: String, reason: &'static str },

    #[error("duplicate abbreviation \"{name}\" in block {block_id}")]
    DuplicateAbbreviation { block_id: u32, name: String },

    #[error("unknown abbreviation \"{name}\" in block {block_id}")]
    UnknownAbbreviation { block_id: u32, name: String },

    #[error("unknown abbreviation id {id} in block {block_id}")]
    UnknownAbbrevId { block_id: u32, id: u32 },

    #[error("abbreviation \"{name}\" expects {expected} operands, got {actual}")]
    OperandCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("block {block_id} has no abbreviation id left in {width} bits")]
    AbbrevIdOverflow { block_id: u32, width: u32 },

    #[error("no block is open")]
    NoOpenBlock,

    #[error("cannot end block {requested}: innermost open block is {innermost}")]
    BlockMismatch { requested: u32, innermost: u32 },

    #[error("{0} block(s) still open at end of stream")]
    UnclosedBlocks(usize),

    #[error("block {0} length does not fit in a 32-bit word")]
    BlockTooLarge(u32),

    #[error("patch offset {0} does not address a written word")]
    PatchOutOfBounds(usize),

    /// Global abbreviations can only be added before the block-info block is
    /// written and before any block of that kind is entered.
    #[error("global abbreviations for block {0} can no longer be defined")]
    BlockInfoFrozen(u32),

    #[error("block {0} has global abbreviations but the block-info block was not written")]
    BlockInfoNotWritten(u32),

    #[error("block-info block already written")]
    BlockInfoAlreadyWritten,
}

/// Result type for bitstream operations.
pub type Result<T> = std::result::Result<T, BitstreamError>;
