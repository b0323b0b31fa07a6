//! Abbreviation definitions.
//!
//! An abbreviation is a template describing how each operand of a record is
//! encoded. The name is an encode-time handle only; the stream identifies an
//! abbreviation by its position in the enclosing block's abbreviation list.

use crate::writer::BitWriter;
use crate::{BitstreamError, Result};

/// Width of the operand count in a DEFINE_ABBREV record.
const NUM_OPS_VBR: u32 = 5;
/// Width of a literal value in a DEFINE_ABBREV record.
const LITERAL_VBR: u32 = 8;
/// Width of a fixed/VBR operand width in a DEFINE_ABBREV record.
const WIDTH_VBR: u32 = 5;
/// Width of array and blob lengths inside abbreviated records.
const LENGTH_VBR: u32 = 6;

/// One operand template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbbrevOp {
    /// Constant value implied by the abbreviation; encodes to zero bits.
    Literal(u64),
    Fixed(u32),
    Vbr(u32),
    /// Length-prefixed sequence of elements, all encoded with the inner op.
    Array(Box<AbbrevOp>),
    /// 6-bit character from `[a-zA-Z0-9._]`.
    Char6,
    /// Length-prefixed, 32-bit aligned raw bytes.
    Blob,
}

impl AbbrevOp {
    pub fn literal(value: u64) -> Self {
        Self::Literal(value)
    }

    pub fn fixed(width: u32) -> Self {
        Self::Fixed(width)
    }

    pub fn vbr(width: u32) -> Self {
        Self::Vbr(width)
    }

    pub fn array(element: AbbrevOp) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn char6() -> Self {
        Self::Char6
    }

    pub fn blob() -> Self {
        Self::Blob
    }

    /// Whether this op consumes all remaining operands.
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Blob)
    }

    /// Whether this op encodes exactly one operand.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Fixed(_) | Self::Vbr(_) | Self::Char6)
    }

    fn width_error(&self) -> Option<&'static str> {
        match self {
            Self::Fixed(width) if *width > 64 => Some("fixed width exceeds 64 bits"),
            Self::Vbr(width) if !(2..=32).contains(width) => Some("VBR width outside 2..=32"),
            _ => None,
        }
    }

    /// Encoding tag used in DEFINE_ABBREV records (literals have none).
    fn encoding(&self) -> u64 {
        match self {
            Self::Literal(_) => 0,
            Self::Fixed(_) => 1,
            Self::Vbr(_) => 2,
            Self::Array(_) => 3,
            Self::Char6 => 4,
            Self::Blob => 5,
        }
    }

    fn write_scalar(&self, writer: &mut BitWriter, value: u64) -> Result<()> {
        match self {
            Self::Fixed(width) => writer.write_fixed(value, *width),
            Self::Vbr(width) => writer.write_vbr(u128::from(value), *width),
            Self::Char6 => {
                let ch = u32::try_from(value)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                writer.write_char6(ch)
            }
            Self::Literal(_) | Self::Array(_) | Self::Blob => {
                unreachable!("write_scalar called on non-scalar op")
            }
        }
    }

    fn write_definition(&self, writer: &mut BitWriter) -> Result<()> {
        if let Self::Literal(value) = self {
            writer.write_fixed(1, 1)?;
            return writer.write_vbr(u128::from(*value), LITERAL_VBR);
        }

        writer.write_fixed(0, 1)?;
        writer.write_fixed(self.encoding(), 3)?;
        match self {
            Self::Fixed(width) | Self::Vbr(width) => {
                writer.write_vbr(u128::from(*width), WIDTH_VBR)
            }
            Self::Array(element) => element.write_definition(writer),
            _ => Ok(()),
        }
    }
}

/// Named, immutable record template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Abbreviation {
    name: String,
    ops: Vec<AbbrevOp>,
}

impl Abbreviation {
    /// Create an abbreviation, checking the operand layout.
    ///
    /// Array and blob ops must come last, and array elements must be scalar.
    pub fn new(name: impl Into<String>, ops: Vec<AbbrevOp>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason| BitstreamError::InvalidAbbreviation {
            name: name.clone(),
            reason,
        };

        if ops.is_empty() {
            return Err(invalid("no operands"));
        }
        for (i, op) in ops.iter().enumerate() {
            if op.is_variable() && i + 1 != ops.len() {
                return Err(invalid("array or blob operand must be last"));
            }
            if let AbbrevOp::Array(element) = op {
                if !element.is_scalar() {
                    return Err(invalid("array element must be fixed, VBR or char6"));
                }
                if let Some(reason) = element.width_error() {
                    return Err(invalid(reason));
                }
            }
            if let Some(reason) = op.width_error() {
                return Err(invalid(reason));
            }
        }

        Ok(Self { name, ops })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ops(&self) -> &[AbbrevOp] {
        &self.ops
    }

    /// Number of scalar operands a record must supply before any variable tail.
    pub fn scalar_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_scalar()).count()
    }

    pub fn has_variable_tail(&self) -> bool {
        self.ops.last().is_some_and(AbbrevOp::is_variable)
    }

    /// Check that `count` operands satisfy this template.
    pub fn check_operand_count(&self, count: usize) -> Result<()> {
        let expected = self.scalar_count();
        let ok = if self.has_variable_tail() {
            count >= expected
        } else {
            count == expected
        };
        if ok {
            Ok(())
        } else {
            Err(BitstreamError::OperandCountMismatch {
                name: self.name.clone(),
                expected,
                actual: count,
            })
        }
    }

    /// Emit the body of a DEFINE_ABBREV record (after the abbreviation id).
    pub(crate) fn write_definition(&self, writer: &mut BitWriter) -> Result<()> {
        // An array and its element count as two ops on the wire.
        let arrays = self
            .ops
            .iter()
            .filter(|op| matches!(op, AbbrevOp::Array(_)))
            .count();
        let wire_ops = self.ops.len() + arrays;
        writer.write_vbr(wire_ops as u128, NUM_OPS_VBR)?;
        for op in &self.ops {
            op.write_definition(writer)?;
        }
        Ok(())
    }

    /// Emit the operands of a record using this template.
    ///
    /// Literal ops consume nothing. A trailing array or blob consumes every
    /// operand left after the scalar ones.
    pub(crate) fn write_operands(
        &self,
        writer: &mut BitWriter,
        operands: &[u64],
    ) -> Result<()> {
        self.check_operand_count(operands.len())?;

        let (scalars, tail) = operands.split_at(self.scalar_count());
        let mut scalars = scalars.iter().copied();
        for op in &self.ops {
            match op {
                AbbrevOp::Literal(_) => {}
                AbbrevOp::Array(element) => {
                    writer.write_vbr(tail.len() as u128, LENGTH_VBR)?;
                    for &value in tail {
                        element.write_scalar(writer, value)?;
                    }
                }
                AbbrevOp::Blob => {
                    writer.write_vbr(tail.len() as u128, LENGTH_VBR)?;
                    writer.align32();
                    for &value in tail {
                        writer.write_fixed(value, 8)?;
                    }
                    writer.align32();
                }
                scalar => {
                    let value =
                        scalars
                            .next()
                            .ok_or_else(|| BitstreamError::OperandCountMismatch {
                                name: self.name.clone(),
                                expected: self.scalar_count(),
                                actual: operands.len(),
                            })?;
                    scalar.write_scalar(writer, value)?;
                }
            }
        }
        Ok(())
    }
}

/// Numeric abbreviation id as written to the stream.
///
/// Ids 0-3 are the built-in control codes, so the first defined abbreviation
/// of a block is id 4.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbbrevId(u32);

impl AbbrevId {
    /// First id available to defined abbreviations.
    pub const FIRST: u32 = 4;

    pub(crate) fn from_index(index: usize) -> Self {
        Self(Self::FIRST + index as u32)
    }

    /// Position in the block's abbreviation list.
    pub(crate) fn index(self) -> Option<usize> {
        self.0.checked_sub(Self::FIRST).map(|i| i as usize)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}
