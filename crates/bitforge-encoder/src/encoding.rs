//! Numeric encodings of IR enums and operand values.

use bitforge_bitstream::{AbbrevOp, is_char6_str};
use bitforge_ir::{BinOp, CallingConv, CastOp, IntPredicate, Linkage, UnnamedAddr};

/// Fixed width of cast opcodes in abbreviated records.
pub const CAST_OP_WIDTH: u32 = 4;
/// Fixed width of binary opcodes in abbreviated records.
pub const BINOP_WIDTH: u32 = 4;
/// Fixed width of comparison predicates in abbreviated records.
pub const PREDICATE_WIDTH: u32 = 6;

pub fn linkage(linkage: Linkage) -> u64 {
    match linkage {
        Linkage::External => 0,
        Linkage::Weak => 16,
        Linkage::Appending => 2,
        Linkage::Internal => 3,
        Linkage::LinkOnce => 18,
        Linkage::ExternWeak => 7,
        Linkage::Common => 8,
        Linkage::Private => 9,
        Linkage::WeakOdr => 17,
        Linkage::LinkOnceOdr => 19,
        Linkage::AvailableExternally => 12,
    }
}

pub fn cast_op(op: CastOp) -> u64 {
    match op {
        CastOp::Trunc => 0,
        CastOp::ZExt => 1,
        CastOp::SExt => 2,
        CastOp::FpToUi => 3,
        CastOp::FpToSi => 4,
        CastOp::UiToFp => 5,
        CastOp::SiToFp => 6,
        CastOp::FpTrunc => 7,
        CastOp::FpExt => 8,
        CastOp::PtrToInt => 9,
        CastOp::IntToPtr => 10,
        CastOp::BitCast => 11,
        CastOp::AddrSpaceCast => 12,
    }
}

pub fn binop(op: BinOp) -> u64 {
    match op {
        BinOp::Add => 0,
        BinOp::Sub => 1,
        BinOp::Mul => 2,
        BinOp::UDiv => 3,
        BinOp::SDiv => 4,
        BinOp::URem => 5,
        BinOp::SRem => 6,
        BinOp::Shl => 7,
        BinOp::LShr => 8,
        BinOp::AShr => 9,
        BinOp::And => 10,
        BinOp::Or => 11,
        BinOp::Xor => 12,
    }
}

pub fn int_predicate(pred: IntPredicate) -> u64 {
    match pred {
        IntPredicate::Eq => 32,
        IntPredicate::Ne => 33,
        IntPredicate::Ugt => 34,
        IntPredicate::Uge => 35,
        IntPredicate::Ult => 36,
        IntPredicate::Ule => 37,
        IntPredicate::Sgt => 38,
        IntPredicate::Sge => 39,
        IntPredicate::Slt => 40,
        IntPredicate::Sle => 41,
    }
}

pub fn unnamed_addr(value: UnnamedAddr) -> u64 {
    match value {
        UnnamedAddr::None => 0,
        UnnamedAddr::Global => 1,
        UnnamedAddr::Local => 2,
    }
}

pub fn calling_conv(cconv: CallingConv) -> u64 {
    match cconv {
        CallingConv::C => 0,
        CallingConv::Fast => 8,
        CallingConv::Cold => 9,
    }
}

/// `log2(align) + 1`, or 0 when unspecified.
pub fn alignment(align: Option<u32>) -> u64 {
    align.map_or(0, |a| u64::from(a.trailing_zeros()) + 1)
}

/// Sign-rotated integer: magnitude shifted left, sign in bit 0.
///
/// `i64::MIN` has no positive magnitude and encodes as `1`.
pub fn signed_vbr(value: i64) -> u64 {
    if value >= 0 {
        (value as u64) << 1
    } else {
        ((value.wrapping_neg() as u64) << 1) | 1
    }
}

/// Sign-extend the low `width` bits of `value`.
pub fn sign_extend(value: i64, width: u32) -> i64 {
    if width >= 64 {
        return value;
    }
    let shift = 64 - width;
    (value << shift) >> shift
}

/// Bits needed for fixed-width indices into a table of `count` entries.
pub fn index_width(count: usize) -> u32 {
    (usize::BITS - count.leading_zeros()).max(1)
}

/// Narrowest array element op able to hold every byte of `text`.
pub fn string_element(text: &[u8]) -> AbbrevOp {
    if std::str::from_utf8(text).is_ok_and(is_char6_str) {
        AbbrevOp::char6()
    } else if text.is_ascii() {
        AbbrevOp::fixed(7)
    } else {
        AbbrevOp::fixed(8)
    }
}

/// Bytes of `text` as record operands.
pub fn string_operands(text: &[u8]) -> Vec<u64> {
    text.iter().map(|&b| u64::from(b)).collect()
}
