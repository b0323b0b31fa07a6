//! Value handles, constants and linkage attributes.

use crate::types::Type;
use crate::{IrError, Result};

macro_rules! define_id {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub(crate) u32);

            impl $name {
                #[inline]
                pub fn index(self) -> usize {
                    self.0 as usize
                }

                pub fn new(index: usize) -> Self {
                    Self(index as u32)
                }
            }
        )*
    };
}

define_id! {
    /// Global variable in a module.
    GlobalId;
    /// Function declaration (no body).
    DeclId;
    /// Function definition.
    FuncId;
    /// Interned constant.
    ConstId;
    /// Basic block within a function.
    BlockId;
    /// Instruction within a function, in creation order.
    InstId;
}

/// Reference to any value an instruction or initializer can use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Global(GlobalId),
    Declaration(DeclId),
    Function(FuncId),
    Constant(ConstId),
    Argument(FuncId, u32),
    Instruction(FuncId, InstId),
}

impl Value {
    /// Function that owns this value, if it is function-local.
    pub fn owner(self) -> Option<FuncId> {
        match self {
            Self::Argument(func, _) | Self::Instruction(func, _) => Some(func),
            _ => None,
        }
    }
}

/// Constant payloads. Equal constants are interned to one [`ConstId`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    /// Integer of type `ty`; wider types are sign-extended from `value`.
    Int { ty: Type, value: i64 },
    Null(Type),
    Undef(Type),
    /// Raw bytes of an `[N x i8]` array.
    Data(Vec<u8>),
}

impl Constant {
    pub fn ty(&self) -> Type {
        match self {
            Self::Int { ty, .. } | Self::Null(ty) | Self::Undef(ty) => ty.clone(),
            Self::Data(bytes) => Type::array(Type::i8(), bytes.len() as u64),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Self::Int { ty, .. } | Self::Null(ty) | Self::Undef(ty) = self {
            ty.validate()?;
        }
        match self {
            Self::Int { ty, .. } if !ty.is_int() => Err(IrError::InvalidConstantType {
                kind: "integer",
                ty: ty.clone(),
            }),
            Self::Int {
                ty: Type::Int(width),
                value,
            } if !int_fits(*value, *width) => Err(IrError::IntOutOfRange {
                value: *value,
                width: *width,
            }),
            Self::Int {
                ty: Type::Int(width),
                value,
            } if *width > 64 && *value != 0 => Err(IrError::WideIntConstant(*width)),
            Self::Null(ty) if !ty.is_pointer() => Err(IrError::InvalidConstantType {
                kind: "null",
                ty: ty.clone(),
            }),
            Self::Undef(ty) if !ty.is_first_class() || *ty == Type::Label => {
                Err(IrError::InvalidConstantType {
                    kind: "undef",
                    ty: ty.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Whether `value` is representable in `width` bits, read as either signed
/// or unsigned.
fn int_fits(value: i64, width: u32) -> bool {
    if width == 0 {
        return false;
    }
    if width >= 64 {
        return true;
    }
    let min = -(1i64 << (width - 1));
    let max = (1i64 << width) - 1;
    (min..=max).contains(&value)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Linkage {
    External,
    Weak,
    Appending,
    #[default]
    Internal,
    LinkOnce,
    ExternWeak,
    Common,
    Private,
    WeakOdr,
    LinkOnceOdr,
    AvailableExternally,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UnnamedAddr {
    #[default]
    None,
    Global,
    Local,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallingConv {
    #[default]
    C,
    Fast,
    Cold,
}
