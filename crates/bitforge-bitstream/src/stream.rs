//! Block-structured record stream.
//!
//! `BitStream` layers nested blocks, abbreviations and records on top of
//! [`BitWriter`]. Every block starts with a placeholder length word that is
//! back-patched when the block ends.

use std::collections::HashSet;
use std::rc::Rc;

use crate::abbrev::{AbbrevId, Abbreviation};
use crate::block::{BlockInfoRegistry, BlockScope, MAX_ABBREV_WIDTH, MIN_ABBREV_WIDTH};
use crate::writer::{BitWriter, fits};
use crate::{BitstreamError, Result};

/// Built-in abbreviation id: end the current block.
pub const END_BLOCK: u64 = 0;
/// Built-in abbreviation id: open a nested block.
pub const ENTER_SUBBLOCK: u64 = 1;
/// Built-in abbreviation id: define a block-local abbreviation.
pub const DEFINE_ABBREV: u64 = 2;
/// Built-in abbreviation id: record with every operand as VBR6.
pub const UNABBREV_RECORD: u64 = 3;

/// Abbreviation id width outside of any block.
pub const TOP_LEVEL_ABBREV_WIDTH: u32 = 2;

/// Id of the block-info block.
pub const BLOCK_INFO_BLOCK_ID: u32 = 0;
/// Abbreviation id width inside the block-info block.
const BLOCK_INFO_ABBREV_WIDTH: u32 = 2;
/// Block-info record selecting the block kind that following definitions apply to.
const BLOCK_INFO_CODE_SETBID: u32 = 1;

const BLOCK_ID_VBR: u32 = 8;
const ABBREV_WIDTH_VBR: u32 = 4;
const UNABBREV_VBR: u32 = 6;

/// Record stream writer.
///
/// Owns the bit buffer, the stack of open blocks, and the block-info
/// registry. [`BitStream::end`] consumes the stream, so nothing can be
/// written after the buffer is handed out.
#[derive(Debug, Default)]
pub struct BitStream {
    writer: BitWriter,
    scopes: Vec<BlockScope>,
    block_info: BlockInfoRegistry,
    block_info_written: bool,
    /// Block kinds entered at least once.
    entered: HashSet<u32>,
}

impl BitStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream whose blocks inherit the abbreviations in `block_info`.
    pub fn with_block_info(block_info: BlockInfoRegistry) -> Self {
        Self {
            block_info,
            ..Self::default()
        }
    }

    pub fn block_info(&self) -> &BlockInfoRegistry {
        &self.block_info
    }

    pub fn bit_position(&self) -> u64 {
        self.writer.bit_position()
    }

    /// Number of open blocks.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn current_width(&self) -> u32 {
        self.scopes
            .last()
            .map_or(TOP_LEVEL_ABBREV_WIDTH, BlockScope::abbrev_width)
    }

    /// Write a 32-bit file magic. Only meaningful at the start of the stream.
    pub fn write_magic(&mut self, magic: u32) -> Result<()> {
        self.writer.write_fixed(u64::from(magic), 32)
    }

    /// Open a nested block.
    ///
    /// Emits ENTER_SUBBLOCK in the enclosing block's id width, the block id,
    /// the new id width, and a placeholder length word.
    pub fn enter_block(&mut self, block_id: u32, abbrev_width: u32) -> Result<()> {
        if !(MIN_ABBREV_WIDTH..=MAX_ABBREV_WIDTH).contains(&abbrev_width) {
            return Err(BitstreamError::InvalidAbbrevWidth(abbrev_width));
        }
        let globals = self.block_info.abbreviations(block_id);
        if !globals.is_empty() && !self.block_info_written {
            return Err(BitstreamError::BlockInfoNotWritten(block_id));
        }

        let width = self.current_width();
        self.writer.write_fixed(ENTER_SUBBLOCK, width)?;
        self.writer.write_vbr(u128::from(block_id), BLOCK_ID_VBR)?;
        self.writer.write_vbr(u128::from(abbrev_width), ABBREV_WIDTH_VBR)?;
        self.writer.align32();

        let length_offset = self.writer.byte_len();
        self.writer.write_fixed(0, 32)?;

        let scope = BlockScope::new(block_id, abbrev_width, globals, length_offset);
        self.scopes.push(scope);
        self.entered.insert(block_id);

        tracing::trace!(block_id, depth = self.scopes.len(), "enter block");
        Ok(())
    }

    /// Close the innermost block, which must be `block_id`.
    ///
    /// The length word receives the number of 32-bit words written after it.
    pub fn end_block(&mut self, block_id: u32) -> Result<()> {
        match self.scopes.last() {
            None => return Err(BitstreamError::NoOpenBlock),
            Some(scope) if scope.id() != block_id => {
                return Err(BitstreamError::BlockMismatch {
                    requested: block_id,
                    innermost: scope.id(),
                });
            }
            Some(_) => {}
        }
        let Some(scope) = self.scopes.pop() else {
            return Err(BitstreamError::NoOpenBlock);
        };

        self.writer.write_fixed(END_BLOCK, scope.abbrev_width())?;
        self.writer.align32();

        let body_start = scope.length_offset() + 4;
        let words = (self.writer.byte_len() - body_start) / 4;
        let words = u32::try_from(words).map_err(|_| BitstreamError::BlockTooLarge(block_id))?;
        self.writer.patch_word(scope.length_offset(), words)?;

        tracing::trace!(block_id, words, "end block");
        Ok(())
    }

    /// Define an abbreviation for `block_id`.
    ///
    /// If the innermost open block is of kind `block_id`, the abbreviation is
    /// local to it and a DEFINE_ABBREV record is emitted. Otherwise it is
    /// registered globally, which is only allowed before the block-info block
    /// is written and before any block of that kind has been entered.
    pub fn define_abbreviation(&mut self, block_id: u32, abbr: Abbreviation) -> Result<AbbrevId> {
        if let Some(scope) = self.scopes.last_mut()
            && scope.id() == block_id
        {
            scope.check_new_name(abbr.name())?;
            let next = u128::from(AbbrevId::FIRST) + scope.len() as u128;
            if !fits(next, scope.abbrev_width()) {
                return Err(BitstreamError::AbbrevIdOverflow {
                    block_id,
                    width: scope.abbrev_width(),
                });
            }
            self.writer.write_fixed(DEFINE_ABBREV, scope.abbrev_width())?;
            abbr.write_definition(&mut self.writer)?;
            tracing::trace!(block_id, name = abbr.name(), "define local abbreviation");
            return Ok(scope.push(Rc::new(abbr)));
        }

        if self.block_info_written || self.entered.contains(&block_id) {
            return Err(BitstreamError::BlockInfoFrozen(block_id));
        }
        self.block_info.define(block_id, abbr)
    }

    /// Emit the block-info block describing every registered global abbreviation.
    ///
    /// After this call no more global abbreviations can be defined.
    pub fn write_block_info(&mut self) -> Result<()> {
        if self.block_info_written {
            return Err(BitstreamError::BlockInfoAlreadyWritten);
        }

        self.enter_block(BLOCK_INFO_BLOCK_ID, BLOCK_INFO_ABBREV_WIDTH)?;
        for (block_id, abbrevs) in self.block_info.iter() {
            if abbrevs.is_empty() {
                continue;
            }
            write_unabbreviated(
                &mut self.writer,
                BLOCK_INFO_ABBREV_WIDTH,
                BLOCK_INFO_CODE_SETBID,
                &[u64::from(block_id)],
            )?;
            for abbr in abbrevs {
                self.writer.write_fixed(DEFINE_ABBREV, BLOCK_INFO_ABBREV_WIDTH)?;
                abbr.write_definition(&mut self.writer)?;
            }
        }
        self.end_block(BLOCK_INFO_BLOCK_ID)?;

        self.block_info_written = true;
        Ok(())
    }

    /// Write a record using the abbreviation named `name` in the current block.
    pub fn write_record(&mut self, name: &str, operands: &[u64]) -> Result<()> {
        let scope = self.scopes.last().ok_or(BitstreamError::NoOpenBlock)?;
        let id = scope
            .lookup(name)
            .ok_or_else(|| BitstreamError::UnknownAbbreviation {
                block_id: scope.id(),
                name: name.to_owned(),
            })?;
        self.write_abbreviated(id, operands)
    }

    /// Write a record using an already resolved abbreviation id.
    pub fn write_abbreviated(&mut self, id: AbbrevId, operands: &[u64]) -> Result<()> {
        let scope = self.scopes.last().ok_or(BitstreamError::NoOpenBlock)?;
        let abbr = scope.get(id).ok_or(BitstreamError::UnknownAbbrevId {
            block_id: scope.id(),
            id: id.get(),
        })?;
        abbr.check_operand_count(operands.len())?;

        self.writer
            .write_fixed(u64::from(id.get()), scope.abbrev_width())?;
        abbr.write_operands(&mut self.writer, operands)
    }

    /// Write a record with no abbreviation: code, count, and operands as VBR6.
    pub fn write_unabbreviated_record(&mut self, code: u32, operands: &[u64]) -> Result<()> {
        let scope = self.scopes.last().ok_or(BitstreamError::NoOpenBlock)?;
        write_unabbreviated(&mut self.writer, scope.abbrev_width(), code, operands)
    }

    /// Finish the stream and return the bytes.
    pub fn end(self) -> Result<Vec<u8>> {
        if !self.scopes.is_empty() {
            return Err(BitstreamError::UnclosedBlocks(self.scopes.len()));
        }
        Ok(self.writer.finish())
    }
}

fn write_unabbreviated(
    writer: &mut BitWriter,
    abbrev_width: u32,
    code: u32,
    operands: &[u64],
) -> Result<()> {
    writer.write_fixed(UNABBREV_RECORD, abbrev_width)?;
    writer.write_vbr(u128::from(code), UNABBREV_VBR)?;
    writer.write_vbr(operands.len() as u128, UNABBREV_VBR)?;
    for &value in operands {
        writer.write_vbr(u128::from(value), UNABBREV_VBR)?;
    }
    Ok(())
}
