//! Instructions.
//!
//! The instruction set is closed: every kind the encoder understands is a
//! variant of [`InstKind`].

use std::fmt;

use crate::types::Type;
use crate::value::{BlockId, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastOp {
    Trunc,
    ZExt,
    SExt,
    FpToUi,
    FpToSi,
    UiToFp,
    SiToFp,
    FpTrunc,
    FpExt,
    PtrToInt,
    IntToPtr,
    BitCast,
    AddrSpaceCast,
}

impl CastOp {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Trunc => "trunc",
            Self::ZExt => "zext",
            Self::SExt => "sext",
            Self::FpToUi => "fptoui",
            Self::FpToSi => "fptosi",
            Self::UiToFp => "uitofp",
            Self::SiToFp => "sitofp",
            Self::FpTrunc => "fptrunc",
            Self::FpExt => "fpext",
            Self::PtrToInt => "ptrtoint",
            Self::IntToPtr => "inttoptr",
            Self::BitCast => "bitcast",
            Self::AddrSpaceCast => "addrspacecast",
        }
    }

    /// Whether `self` converts a `from` value into `to`.
    pub fn accepts(self, from: &Type, to: &Type) -> bool {
        let is_fp = |ty: &Type| matches!(ty, Type::Float | Type::Double);
        let fp_rank = |ty: &Type| matches!(ty, Type::Double);
        match (self, from.int_width(), to.int_width()) {
            (Self::Trunc, Some(a), Some(b)) => a > b,
            (Self::ZExt | Self::SExt, Some(a), Some(b)) => a < b,
            (Self::FpToUi | Self::FpToSi, _, Some(_)) => is_fp(from),
            (Self::UiToFp | Self::SiToFp, Some(_), _) => is_fp(to),
            (Self::FpTrunc, ..) => is_fp(from) && is_fp(to) && fp_rank(from) && !fp_rank(to),
            (Self::FpExt, ..) => is_fp(from) && is_fp(to) && !fp_rank(from) && fp_rank(to),
            (Self::PtrToInt, _, Some(_)) => from.is_pointer(),
            (Self::IntToPtr, Some(_), _) => to.is_pointer(),
            (Self::BitCast, ..) => {
                from.is_first_class()
                    && to.is_first_class()
                    && from.is_pointer() == to.is_pointer()
            }
            (Self::AddrSpaceCast, ..) => from.is_pointer() && to.is_pointer(),
            _ => false,
        }
    }
}

impl fmt::Display for CastOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntPredicate {
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
    Sgt,
    Sge,
    Slt,
    Sle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstKind {
    Ret(Option<Value>),
    Jump(BlockId),
    Branch {
        cond: Value,
        on_true: BlockId,
        on_false: BlockId,
    },
    Unreachable,
    Cast {
        op: CastOp,
        value: Value,
        to: Type,
    },
    Binop {
        op: BinOp,
        lhs: Value,
        rhs: Value,
    },
    ICmp {
        pred: IntPredicate,
        lhs: Value,
        rhs: Value,
    },
}

impl InstKind {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Ret(_) | Self::Jump(_) | Self::Branch { .. } | Self::Unreachable
        )
    }

    /// Data operands in record order. Block targets are not values.
    pub fn operands(&self) -> Vec<Value> {
        match self {
            Self::Ret(value) => value.iter().copied().collect(),
            Self::Jump(_) | Self::Unreachable => Vec::new(),
            Self::Branch { cond, .. } => vec![*cond],
            Self::Cast { value, .. } => vec![*value],
            Self::Binop { lhs, rhs, .. } | Self::ICmp { lhs, rhs, .. } => vec![*lhs, *rhs],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub(crate) kind: InstKind,
    pub(crate) ty: Type,
    pub(crate) name: Option<String>,
    pub(crate) block: BlockId,
}

impl Instruction {
    pub fn kind(&self) -> &InstKind {
        &self.kind
    }

    /// Result type; `void` for instructions that produce no value.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn produces_value(&self) -> bool {
        !self.ty.is_void()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn block(&self) -> BlockId {
        self.block
    }
}
