use bitforge_bitstream::BitstreamError;
use bitforge_ir::{FuncId, InstId, IrError, Type, Value};

/// Errors raised while encoding a module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error(transparent)]
    Bitstream(#[from] BitstreamError),

    #[error(transparent)]
    Ir(#[from] IrError),

    #[error("value {0:?} has no ordinal")]
    Unenumerated(Value),

    #[error("instruction {inst:?} in `{function}` uses {operand:?} before it is defined")]
    ForwardReference {
        function: String,
        inst: InstId,
        operand: Value,
    },

    #[error("instruction {inst:?} in `{function}` uses {operand:?} from another function")]
    ForeignValue {
        function: String,
        inst: InstId,
        operand: Value,
    },

    #[error("unknown function {0:?}")]
    UnknownFunction(FuncId),

    #[error("type `{0}` is not in the type table")]
    UnknownType(Type),
}

pub type Result<T> = std::result::Result<T, EncodeError>;
