use bitforge_bitstream::{
    AbbrevId, AbbrevOp, Abbreviation, BitStream, BlockInfoRegistry, is_char6,
};
use bitforge_ir::{ConstId, Constant, Module, Type, Value};

use crate::constants::{block_id, constants_code};
use crate::encoding::{sign_extend, signed_vbr, string_operands};
use crate::{EncodeError, Result, TypeTable};

pub const CONSTANTS_ABBREV_WIDTH: u32 = 5;

/// CONSTANTS blocks, both the module-level one and those nested in function
/// blocks.
///
/// A SETTYPE record precedes every run of constants sharing one type.
/// Zero integers and all-zero byte arrays are written as NULL.
#[derive(Debug)]
pub struct ConstantBlock<'a> {
    module: &'a Module,
    types: &'a TypeTable,
    abbrevs: ConstantAbbrevs,
}

#[derive(Debug)]
struct ConstantAbbrevs {
    settype: AbbrevId,
    integer: AbbrevId,
    null: AbbrevId,
    undef: AbbrevId,
    cstring7: AbbrevId,
    cstring6: AbbrevId,
    string8: AbbrevId,
}

impl<'a> ConstantBlock<'a> {
    /// Register the global CONSTANTS abbreviations.
    ///
    /// SETTYPE uses a fixed field as wide as the type table needs, so the
    /// table must be complete before registration.
    pub fn register(registry: &mut BlockInfoRegistry, types: &TypeTable) -> Result<()> {
        let abbrs = [
            Abbreviation::new(
                "settype",
                vec![
                    AbbrevOp::literal(constants_code::SETTYPE),
                    AbbrevOp::fixed(types.index_width()),
                ],
            )?,
            Abbreviation::new(
                "integer",
                vec![AbbrevOp::literal(constants_code::INTEGER), AbbrevOp::vbr(8)],
            )?,
            Abbreviation::new("null", vec![AbbrevOp::literal(constants_code::NULL)])?,
            Abbreviation::new("undef", vec![AbbrevOp::literal(constants_code::UNDEF)])?,
            Abbreviation::new(
                "cstring7",
                vec![
                    AbbrevOp::literal(constants_code::CSTRING),
                    AbbrevOp::array(AbbrevOp::fixed(7)),
                ],
            )?,
            Abbreviation::new(
                "cstring6",
                vec![
                    AbbrevOp::literal(constants_code::CSTRING),
                    AbbrevOp::array(AbbrevOp::char6()),
                ],
            )?,
            Abbreviation::new(
                "string8",
                vec![
                    AbbrevOp::literal(constants_code::STRING),
                    AbbrevOp::array(AbbrevOp::fixed(8)),
                ],
            )?,
        ];
        registry.define_all(block_id::CONSTANTS, abbrs)?;
        Ok(())
    }

    pub fn new(
        module: &'a Module,
        types: &'a TypeTable,
        registry: &BlockInfoRegistry,
    ) -> Result<Self> {
        let resolve = |name: &str| registry.resolve(block_id::CONSTANTS, name);
        let abbrevs = ConstantAbbrevs {
            settype: resolve("settype")?,
            integer: resolve("integer")?,
            null: resolve("null")?,
            undef: resolve("undef")?,
            cstring7: resolve("cstring7")?,
            cstring6: resolve("cstring6")?,
            string8: resolve("string8")?,
        };
        Ok(Self {
            module,
            types,
            abbrevs,
        })
    }

    /// Write one CONSTANTS block holding `constants`, in order.
    ///
    /// Nothing is written when `constants` is empty.
    pub fn build(&self, constants: &[ConstId], stream: &mut BitStream) -> Result<()> {
        if constants.is_empty() {
            return Ok(());
        }

        stream.enter_block(block_id::CONSTANTS, CONSTANTS_ABBREV_WIDTH)?;
        let mut current: Option<Type> = None;
        for &id in constants {
            let constant = self
                .module
                .constant(id)
                .ok_or(EncodeError::Unenumerated(Value::Constant(id)))?;

            let ty = constant.ty();
            if current.as_ref() != Some(&ty) {
                stream.write_abbreviated(self.abbrevs.settype, &[self.types.get(&ty)?])?;
                current = Some(ty);
            }
            self.write_constant(stream, constant)?;
        }
        stream.end_block(block_id::CONSTANTS)?;

        tracing::trace!(constants = constants.len(), "wrote constants block");
        Ok(())
    }

    fn write_constant(&self, stream: &mut BitStream, constant: &Constant) -> Result<()> {
        let a = &self.abbrevs;
        match constant {
            Constant::Int { ty, value } => {
                let width = ty.int_width().unwrap_or(64);
                let value = sign_extend(*value, width);
                // Non-zero constants wider than 64 bits are rejected when interned.
                if value == 0 {
                    stream.write_abbreviated(a.null, &[])?;
                } else {
                    stream.write_abbreviated(a.integer, &[signed_vbr(value)])?;
                }
            }
            Constant::Null(_) => stream.write_abbreviated(a.null, &[])?,
            Constant::Undef(_) => stream.write_abbreviated(a.undef, &[])?,
            Constant::Data(bytes) => self.write_data(stream, bytes)?,
        }
        Ok(())
    }

    fn write_data(&self, stream: &mut BitStream, bytes: &[u8]) -> Result<()> {
        let a = &self.abbrevs;
        // Covers the empty array too.
        if bytes.iter().all(|&b| b == 0) {
            stream.write_abbreviated(a.null, &[])?;
            return Ok(());
        }

        let Some(text) = c_string_body(bytes) else {
            stream.write_abbreviated(a.string8, &string_operands(bytes))?;
            return Ok(());
        };

        let operands = string_operands(text);
        if text.iter().all(|&b| is_char6(char::from(b))) {
            stream.write_abbreviated(a.cstring6, &operands)?;
        } else if text.is_ascii() {
            stream.write_abbreviated(a.cstring7, &operands)?;
        } else {
            stream.write_unabbreviated_record(constants_code::CSTRING as u32, &operands)?;
        }
        Ok(())
    }
}

/// Bytes before the terminator, if `bytes` is nul-terminated with no
/// interior nul.
fn c_string_body(bytes: &[u8]) -> Option<&[u8]> {
    let (&last, body) = bytes.split_last()?;
    (last == 0 && !body.contains(&0)).then_some(body)
}
