use bitforge_bitstream::{AbbrevId, AbbrevOp, Abbreviation, BitStream};
use bitforge_ir::Type;

use crate::constants::{block_id, type_code};
use crate::{Result, TypeTable};

pub const TYPE_ABBREV_WIDTH: u32 = 4;

/// The TYPE block: one record per type table entry, in index order.
#[derive(Debug)]
pub struct TypeBlock<'t> {
    types: &'t TypeTable,
}

#[derive(Debug)]
struct TypeAbbrevs {
    pointer: AbbrevId,
    function: AbbrevId,
    struct_anon: AbbrevId,
    array: AbbrevId,
}

impl<'t> TypeBlock<'t> {
    pub fn new(types: &'t TypeTable) -> Self {
        Self { types }
    }

    pub fn build(&self, stream: &mut BitStream) -> Result<()> {
        stream.enter_block(block_id::TYPE, TYPE_ABBREV_WIDTH)?;
        let abbrevs = self.define_abbrevs(stream)?;

        stream.write_unabbreviated_record(type_code::NUMENTRY, &[self.types.len() as u64])?;
        for ty in self.types.iter() {
            self.write_type(stream, &abbrevs, ty)?;
        }

        stream.end_block(block_id::TYPE)?;
        Ok(())
    }

    fn define_abbrevs(&self, stream: &mut BitStream) -> Result<TypeAbbrevs> {
        let bits = self.types.index_width();
        let mut define = |name: &str, ops: Vec<AbbrevOp>| -> Result<AbbrevId> {
            Ok(stream.define_abbreviation(block_id::TYPE, Abbreviation::new(name, ops)?)?)
        };

        Ok(TypeAbbrevs {
            // Address space is always 0.
            pointer: define(
                "pointer",
                vec![
                    AbbrevOp::literal(type_code::POINTER),
                    AbbrevOp::fixed(bits),
                    AbbrevOp::literal(0),
                ],
            )?,
            function: define(
                "function",
                vec![
                    AbbrevOp::literal(type_code::FUNCTION),
                    AbbrevOp::fixed(1),
                    AbbrevOp::array(AbbrevOp::fixed(bits)),
                ],
            )?,
            struct_anon: define(
                "struct_anon",
                vec![
                    AbbrevOp::literal(type_code::STRUCT_ANON),
                    AbbrevOp::fixed(1),
                    AbbrevOp::array(AbbrevOp::fixed(bits)),
                ],
            )?,
            array: define(
                "array",
                vec![
                    AbbrevOp::literal(type_code::ARRAY),
                    AbbrevOp::vbr(8),
                    AbbrevOp::fixed(bits),
                ],
            )?,
        })
    }

    fn write_type(&self, stream: &mut BitStream, abbrevs: &TypeAbbrevs, ty: &Type) -> Result<()> {
        match ty {
            Type::Void => stream.write_unabbreviated_record(type_code::VOID, &[])?,
            Type::Label => stream.write_unabbreviated_record(type_code::LABEL, &[])?,
            Type::Float => stream.write_unabbreviated_record(type_code::FLOAT, &[])?,
            Type::Double => stream.write_unabbreviated_record(type_code::DOUBLE, &[])?,
            Type::Int(width) => {
                stream.write_unabbreviated_record(type_code::INTEGER, &[u64::from(*width)])?
            }
            Type::Pointer(pointee) => {
                stream.write_abbreviated(abbrevs.pointer, &[self.types.get(pointee)?])?
            }
            Type::Array { len, elem } => {
                stream.write_abbreviated(abbrevs.array, &[*len, self.types.get(elem)?])?
            }
            Type::Struct { fields, packed } => {
                let mut operands = vec![u64::from(*packed)];
                for field in fields {
                    operands.push(self.types.get(field)?);
                }
                stream.write_abbreviated(abbrevs.struct_anon, &operands)?
            }
            Type::Function {
                ret,
                params,
                var_args,
            } => {
                let mut operands = vec![u64::from(*var_args), self.types.get(ret)?];
                for param in params {
                    operands.push(self.types.get(param)?);
                }
                stream.write_abbreviated(abbrevs.function, &operands)?
            }
        }
        Ok(())
    }
}
