use bitforge_bitstream::{AbbrevOp, Abbreviation, BitStream};

use crate::constants::{block_id, strtab_code};
use crate::encoding::string_operands;
use crate::{Result, StringTable};

pub const STRTAB_ABBREV_WIDTH: u32 = 3;

/// The string table as one blob record, after the module block.
#[derive(Debug)]
pub struct StrtabBlock<'a> {
    strtab: &'a StringTable,
}

impl<'a> StrtabBlock<'a> {
    pub fn new(strtab: &'a StringTable) -> Self {
        Self { strtab }
    }

    pub fn build(&self, stream: &mut BitStream) -> Result<()> {
        let id = block_id::STRTAB;
        stream.enter_block(id, STRTAB_ABBREV_WIDTH)?;
        let blob = stream.define_abbreviation(
            id,
            Abbreviation::new(
                "blob",
                vec![AbbrevOp::literal(strtab_code::BLOB), AbbrevOp::blob()],
            )?,
        )?;
        stream.write_abbreviated(blob, &string_operands(self.strtab.bytes()))?;
        stream.end_block(id)?;
        Ok(())
    }
}
