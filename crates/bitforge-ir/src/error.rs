use crate::inst::CastOp;
use crate::types::Type;
use crate::value::{BlockId, Value};

/// Errors raised while building a module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IrError {
    #[error("type mismatch: expected `{expected}`, found `{actual}`")]
    TypeMismatch { expected: Type, actual: Type },

    #[error("expected an integer type, found `{0}`")]
    NotAnInteger(Type),

    #[error("expected a function type, found `{0}`")]
    NotAFunctionType(Type),

    #[error("integer width {0} is outside 1..=8388608")]
    InvalidIntWidth(u32),

    #[error("`{0}` cannot be used as a value type")]
    NotFirstClass(Type),

    #[error("`{child}` cannot appear inside `{parent}`")]
    InvalidElementType { parent: Type, child: Type },

    #[error("non-zero constants of type `i{0}` are wider than 64 bits")]
    WideIntConstant(u32),

    #[error("alignment {0} is not a power of two")]
    InvalidAlignment(u32),

    #[error("`{ty}` is not a valid type for {kind} constants")]
    InvalidConstantType { kind: &'static str, ty: Type },

    #[error("{value} does not fit in i{width}")]
    IntOutOfRange { value: i64, width: u32 },

    #[error("cannot {op} `{from}` to `{to}`")]
    InvalidCast { op: CastOp, from: Type, to: Type },

    #[error("value {0:?} does not belong to this module or function")]
    UnknownValue(Value),

    #[error("unknown basic block {0:?}")]
    UnknownBlock(BlockId),

    #[error("argument {index} out of range for a function with {count} parameters")]
    ArgumentOutOfRange { index: u32, count: usize },

    #[error("no insertion block selected")]
    NoInsertionBlock,

    #[error("basic block {0:?} already ends with a terminator")]
    BlockTerminated(BlockId),

    #[error("basic block {0:?} has no terminator")]
    UnterminatedBlock(BlockId),

    #[error("function `{0}` has no basic blocks")]
    EmptyFunction(String),

    #[error("{0:?} produces no value and cannot be named")]
    NotNameable(Value),
}

pub type Result<T> = std::result::Result<T, IrError>;
