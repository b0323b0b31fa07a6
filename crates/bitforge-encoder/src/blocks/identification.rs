use bitforge_bitstream::{AbbrevOp, Abbreviation, BitStream};

use crate::Result;
use crate::constants::{block_id, identification_code};
use crate::encoding::{string_element, string_operands};

pub const IDENTIFICATION_ABBREV_WIDTH: u32 = 5;

/// Producer string and epoch, written before the module block.
#[derive(Debug)]
pub struct IdentificationBlock<'a> {
    producer: &'a str,
    epoch: u64,
}

impl<'a> IdentificationBlock<'a> {
    pub fn new(producer: &'a str, epoch: u64) -> Self {
        Self { producer, epoch }
    }

    pub fn build(&self, stream: &mut BitStream) -> Result<()> {
        let id = block_id::IDENTIFICATION;
        stream.enter_block(id, IDENTIFICATION_ABBREV_WIDTH)?;

        let producer = self.producer.as_bytes();
        let string = stream.define_abbreviation(
            id,
            Abbreviation::new(
                "string",
                vec![
                    AbbrevOp::literal(identification_code::STRING),
                    AbbrevOp::array(string_element(producer)),
                ],
            )?,
        )?;
        let epoch = stream.define_abbreviation(
            id,
            Abbreviation::new(
                "epoch",
                vec![
                    AbbrevOp::literal(identification_code::EPOCH),
                    AbbrevOp::vbr(6),
                ],
            )?,
        )?;

        stream.write_abbreviated(string, &string_operands(producer))?;
        stream.write_abbreviated(epoch, &[self.epoch])?;
        stream.end_block(id)?;
        Ok(())
    }
}
