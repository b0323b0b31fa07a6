use bitforge_bitstream::{AbbrevOp, Abbreviation, BitStream};
use bitforge_ir::Module;

use crate::Result;
use crate::constants::{block_id, module_code};
use crate::encoding::{string_element, string_operands};

pub const MODULE_ABBREV_WIDTH: u32 = 3;

/// Target triple, data layout and source file name records.
///
/// Written inside the module block, after the block-info block.
#[derive(Debug)]
pub struct ModuleInfo<'m> {
    module: &'m Module,
}

impl<'m> ModuleInfo<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self { module }
    }

    pub fn build(&self, stream: &mut BitStream) -> Result<()> {
        if let Some(triple) = self.module.triple() {
            stream.write_unabbreviated_record(
                module_code::TRIPLE,
                &string_operands(triple.as_bytes()),
            )?;
        }
        if let Some(layout) = self.module.data_layout() {
            stream.write_unabbreviated_record(
                module_code::DATALAYOUT,
                &string_operands(layout.as_bytes()),
            )?;
        }
        if let Some(name) = self.module.source_filename() {
            let name = name.as_bytes();
            let abbr = Abbreviation::new(
                "source_filename",
                vec![
                    AbbrevOp::literal(module_code::SOURCE_FILENAME),
                    AbbrevOp::array(string_element(name)),
                ],
            )?;
            let id = stream.define_abbreviation(block_id::MODULE, abbr)?;
            stream.write_abbreviated(id, &string_operands(name))?;
        }
        Ok(())
    }
}
