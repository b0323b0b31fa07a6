//! Module writer: drives the block builders in container order.
//!
//! ```text
//! magic
//! IDENTIFICATION            (optional)
//! MODULE
//!   VERSION
//!   BLOCKINFO
//!   TRIPLE, DATALAYOUT, SOURCE_FILENAME
//!   TYPE
//!   GLOBALVAR*, FUNCTION*
//!   CONSTANTS               (module-level, if any)
//!   FUNCTION*               (one per defined function)
//! STRTAB
//! ```

use bitforge_bitstream::{BitStream, BlockInfoRegistry};
use bitforge_ir::{FuncId, Module};

use crate::blocks::{
    ConstantBlock, FunctionBlock, GlobalsBlock, IdentificationBlock, MODULE_ABBREV_WIDTH,
    ModuleInfo, StrtabBlock, TypeBlock,
};
use crate::constants::{MAGIC, MODULE_VERSION, block_id, module_code};
use crate::{EncodeConfig, Enumerator, Result, StringTable, TypeTable};

/// Encode `module` into a bitcode buffer.
///
/// The output length is a multiple of 4 bytes. Encoding the same module
/// with the same configuration always yields the same bytes.
pub fn encode(module: &Module, config: &EncodeConfig) -> Result<Vec<u8>> {
    let enumerator = Enumerator::enumerate(module);
    let types = TypeTable::collect(module);

    let mut registry = BlockInfoRegistry::new();
    ConstantBlock::register(&mut registry, &types)?;
    FunctionBlock::register(&mut registry)?;

    // Builders resolve abbreviation ids before the registry moves into the
    // stream.
    let constants = ConstantBlock::new(module, &types, &registry)?;
    let functions = FunctionBlock::new(module, &enumerator, &types, &registry)?;
    let globals = GlobalsBlock::new(module, &enumerator, &types);

    let mut stream = BitStream::with_block_info(registry);
    let mut strtab = StringTable::new();
    stream.write_magic(MAGIC)?;

    if config.identification {
        IdentificationBlock::new(&config.producer, config.epoch).build(&mut stream)?;
    }

    stream.enter_block(block_id::MODULE, MODULE_ABBREV_WIDTH)?;
    stream.write_unabbreviated_record(module_code::VERSION, &[MODULE_VERSION])?;
    stream.write_block_info()?;
    ModuleInfo::new(module).build(&mut stream)?;
    TypeBlock::new(&types).build(&mut stream)?;
    globals.build(&mut strtab, &mut stream)?;
    constants.build(enumerator.module_constants(), &mut stream)?;
    for index in 0..module.functions().len() {
        functions.build(FuncId::new(index), &mut stream)?;
    }
    stream.end_block(block_id::MODULE)?;

    StrtabBlock::new(&strtab).build(&mut stream)?;
    let bytes = stream.end()?;

    tracing::debug!(
        bytes = bytes.len(),
        types = types.len(),
        values = enumerator.module_value_count(),
        "encoded module"
    );
    Ok(bytes)
}
