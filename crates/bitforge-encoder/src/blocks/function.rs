use bitforge_bitstream::{AbbrevId, AbbrevOp, Abbreviation, BitStream, BlockInfoRegistry};
use bitforge_ir::{
    BlockId, FuncId, Function, InstId, InstKind, Instruction, IrError, Module, Value,
};

use super::ConstantBlock;
use crate::constants::{block_id, function_code, value_symtab_code};
use crate::encoding::{
    BINOP_WIDTH, CAST_OP_WIDTH, PREDICATE_WIDTH, binop, cast_op, int_predicate, string_element,
    string_operands,
};
use crate::{EncodeError, Enumerator, Result, TypeTable};

pub const FUNCTION_ABBREV_WIDTH: u32 = 6;
pub const VALUE_SYMTAB_ABBREV_WIDTH: u32 = 3;

const VALUE_VBR: u32 = 6;
const SYMTAB_VALUE_VBR: u32 = 8;

#[derive(Debug)]
struct FunctionAbbrevs {
    declareblocks: AbbrevId,
    ret_void: AbbrevId,
    ret: AbbrevId,
    jump: AbbrevId,
    branch: AbbrevId,
    unreachable: AbbrevId,
    cast: AbbrevId,
    binop: AbbrevId,
    icmp: AbbrevId,
}

#[derive(Debug)]
struct SymtabAbbrevs {
    entry8: AbbrevId,
    entry7: AbbrevId,
    entry6: AbbrevId,
    bbentry6: AbbrevId,
}

/// FUNCTION blocks: block count, local constants, one record per
/// instruction, and a VALUE_SYMTAB naming blocks, arguments and
/// instructions.
///
/// Operands are encoded relative to the instruction's ordinal, so a
/// reference to the previous value is `1`. Branch targets are absolute
/// block indices.
#[derive(Debug)]
pub struct FunctionBlock<'a> {
    module: &'a Module,
    enumerator: &'a Enumerator,
    types: &'a TypeTable,
    constants: ConstantBlock<'a>,
    abbrevs: FunctionAbbrevs,
    symtab: SymtabAbbrevs,
}

impl<'a> FunctionBlock<'a> {
    /// Register the global FUNCTION and VALUE_SYMTAB abbreviations.
    pub fn register(registry: &mut BlockInfoRegistry) -> Result<()> {
        let lit = AbbrevOp::literal;
        let value = || AbbrevOp::vbr(VALUE_VBR);
        let function = [
            Abbreviation::new(
                "declareblocks",
                vec![lit(function_code::DECLAREBLOCKS), value()],
            )?,
            Abbreviation::new("ret_void", vec![lit(function_code::INST_RET)])?,
            Abbreviation::new("ret", vec![lit(function_code::INST_RET), value()])?,
            Abbreviation::new("jump", vec![lit(function_code::INST_BR), value()])?,
            Abbreviation::new(
                "branch",
                vec![lit(function_code::INST_BR), value(), value(), value()],
            )?,
            Abbreviation::new("unreachable", vec![lit(function_code::INST_UNREACHABLE)])?,
            Abbreviation::new(
                "cast",
                vec![
                    lit(function_code::INST_CAST),
                    value(),
                    value(),
                    AbbrevOp::fixed(CAST_OP_WIDTH),
                ],
            )?,
            Abbreviation::new(
                "binop",
                vec![
                    lit(function_code::INST_BINOP),
                    value(),
                    value(),
                    AbbrevOp::fixed(BINOP_WIDTH),
                ],
            )?,
            Abbreviation::new(
                "icmp",
                vec![
                    lit(function_code::INST_CMP2),
                    value(),
                    value(),
                    AbbrevOp::fixed(PREDICATE_WIDTH),
                ],
            )?,
        ];
        registry.define_all(block_id::FUNCTION, function)?;

        let entry = |name: &str, element: AbbrevOp| {
            Abbreviation::new(
                name,
                vec![
                    lit(value_symtab_code::ENTRY),
                    AbbrevOp::vbr(SYMTAB_VALUE_VBR),
                    AbbrevOp::array(element),
                ],
            )
        };
        let symtab = [
            entry("entry8", AbbrevOp::fixed(8))?,
            entry("entry7", AbbrevOp::fixed(7))?,
            entry("entry6", AbbrevOp::char6())?,
            Abbreviation::new(
                "bbentry6",
                vec![
                    lit(value_symtab_code::BBENTRY),
                    AbbrevOp::vbr(SYMTAB_VALUE_VBR),
                    AbbrevOp::array(AbbrevOp::char6()),
                ],
            )?,
        ];
        registry.define_all(block_id::VALUE_SYMTAB, symtab)?;
        Ok(())
    }

    /// Resolve the registered abbreviations. Requires both
    /// [`FunctionBlock::register`] and [`ConstantBlock::register`].
    pub fn new(
        module: &'a Module,
        enumerator: &'a Enumerator,
        types: &'a TypeTable,
        registry: &BlockInfoRegistry,
    ) -> Result<Self> {
        let function = |name: &str| registry.resolve(block_id::FUNCTION, name);
        let abbrevs = FunctionAbbrevs {
            declareblocks: function("declareblocks")?,
            ret_void: function("ret_void")?,
            ret: function("ret")?,
            jump: function("jump")?,
            branch: function("branch")?,
            unreachable: function("unreachable")?,
            cast: function("cast")?,
            binop: function("binop")?,
            icmp: function("icmp")?,
        };

        let symtab = |name: &str| registry.resolve(block_id::VALUE_SYMTAB, name);
        let symtab = SymtabAbbrevs {
            entry8: symtab("entry8")?,
            entry7: symtab("entry7")?,
            entry6: symtab("entry6")?,
            bbentry6: symtab("bbentry6")?,
        };

        Ok(Self {
            module,
            enumerator,
            types,
            constants: ConstantBlock::new(module, types, registry)?,
            abbrevs,
            symtab,
        })
    }

    pub fn build(&self, func: FuncId, stream: &mut BitStream) -> Result<()> {
        let function = self
            .module
            .function(func)
            .ok_or(EncodeError::UnknownFunction(func))?;

        stream.enter_block(block_id::FUNCTION, FUNCTION_ABBREV_WIDTH)?;
        stream.write_abbreviated(
            self.abbrevs.declareblocks,
            &[function.blocks().len() as u64],
        )?;
        self.constants
            .build(self.enumerator.function_constants(func)?, stream)?;

        let mut count = 0usize;
        for (id, inst) in function.body() {
            self.write_instruction(stream, func, function, id, inst)?;
            count += 1;
        }

        self.write_symtab(stream, func, function)?;
        stream.end_block(block_id::FUNCTION)?;

        tracing::debug!(
            function = function.name(),
            blocks = function.blocks().len(),
            instructions = count,
            "wrote function block"
        );
        Ok(())
    }

    fn write_instruction(
        &self,
        stream: &mut BitStream,
        func: FuncId,
        function: &Function,
        id: InstId,
        inst: &Instruction,
    ) -> Result<()> {
        self.enumerator.check_value_order(func, id, inst)?;

        let position = self.enumerator.instruction_ordinal(func, id)?;
        let relative = |value: &Value| -> Result<u64> {
            Ok(u64::from(position - self.enumerator.get(*value)?))
        };
        let target = |block: &BlockId| -> Result<u64> {
            function
                .block(*block)
                .map(|_| block.index() as u64)
                .ok_or_else(|| IrError::UnknownBlock(*block).into())
        };

        let a = &self.abbrevs;
        match inst.kind() {
            InstKind::Ret(None) => stream.write_abbreviated(a.ret_void, &[])?,
            InstKind::Ret(Some(value)) => stream.write_abbreviated(a.ret, &[relative(value)?])?,
            InstKind::Jump(dest) => stream.write_abbreviated(a.jump, &[target(dest)?])?,
            InstKind::Branch {
                cond,
                on_true,
                on_false,
            } => stream.write_abbreviated(
                a.branch,
                &[target(on_true)?, target(on_false)?, relative(cond)?],
            )?,
            InstKind::Unreachable => stream.write_abbreviated(a.unreachable, &[])?,
            InstKind::Cast { op, value, to } => stream.write_abbreviated(
                a.cast,
                &[relative(value)?, self.types.get(to)?, cast_op(*op)],
            )?,
            InstKind::Binop { op, lhs, rhs } => stream.write_abbreviated(
                a.binop,
                &[relative(lhs)?, relative(rhs)?, binop(*op)],
            )?,
            InstKind::ICmp { pred, lhs, rhs } => stream.write_abbreviated(
                a.icmp,
                &[relative(lhs)?, relative(rhs)?, int_predicate(*pred)],
            )?,
        }
        Ok(())
    }

    /// Always written, even with no names, so every function block has the
    /// same shape.
    fn write_symtab(
        &self,
        stream: &mut BitStream,
        func: FuncId,
        function: &Function,
    ) -> Result<()> {
        stream.enter_block(block_id::VALUE_SYMTAB, VALUE_SYMTAB_ABBREV_WIDTH)?;

        for (index, bb) in function.blocks().iter().enumerate() {
            if let Some(name) = bb.name() {
                self.write_bbentry(stream, index as u64, name)?;
            }
        }
        for (index, arg) in function.args().iter().enumerate() {
            if let Some(name) = arg.name() {
                let ordinal = self.enumerator.get(Value::Argument(func, index as u32))?;
                self.write_entry(stream, ordinal, name)?;
            }
        }
        for (id, inst) in function.body() {
            if let Some(name) = inst.name() {
                let ordinal = self.enumerator.get(Value::Instruction(func, id))?;
                self.write_entry(stream, ordinal, name)?;
            }
        }

        stream.end_block(block_id::VALUE_SYMTAB)?;
        Ok(())
    }

    fn write_entry(&self, stream: &mut BitStream, ordinal: u32, name: &str) -> Result<()> {
        let bytes = name.as_bytes();
        let abbrev = match string_element(bytes) {
            AbbrevOp::Char6 => self.symtab.entry6,
            AbbrevOp::Fixed(7) => self.symtab.entry7,
            _ => self.symtab.entry8,
        };
        stream.write_abbreviated(abbrev, &with_prefix(u64::from(ordinal), bytes))?;
        Ok(())
    }

    fn write_bbentry(&self, stream: &mut BitStream, index: u64, name: &str) -> Result<()> {
        let bytes = name.as_bytes();
        let operands = with_prefix(index, bytes);
        if string_element(bytes) == AbbrevOp::Char6 {
            stream.write_abbreviated(self.symtab.bbentry6, &operands)?;
        } else {
            stream.write_unabbreviated_record(value_symtab_code::BBENTRY as u32, &operands)?;
        }
        Ok(())
    }
}

fn with_prefix(first: u64, bytes: &[u8]) -> Vec<u64> {
    let mut operands = Vec::with_capacity(bytes.len() + 1);
    operands.push(first);
    operands.extend(string_operands(bytes));
    operands
}
