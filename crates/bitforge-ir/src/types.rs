//! IR types.
//!
//! Types are structural: two equal `Type` values are the same type. Pointers
//! are typed and always live in address space 0.

use std::fmt;

use crate::{IrError, Result};

/// Largest integer width the format can describe.
pub const MAX_INT_WIDTH: u32 = 1 << 23;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Label,
    Float,
    Double,
    Int(u32),
    Pointer(Box<Type>),
    Array {
        len: u64,
        elem: Box<Type>,
    },
    Struct {
        fields: Vec<Type>,
        packed: bool,
    },
    Function {
        ret: Box<Type>,
        params: Vec<Type>,
        var_args: bool,
    },
}

impl Type {
    /// Integer type of `width` bits.
    pub fn int(width: u32) -> Result<Self> {
        if width == 0 || width > MAX_INT_WIDTH {
            return Err(IrError::InvalidIntWidth(width));
        }
        Ok(Self::Int(width))
    }

    pub fn i1() -> Self {
        Self::Int(1)
    }

    pub fn i8() -> Self {
        Self::Int(8)
    }

    pub fn i32() -> Self {
        Self::Int(32)
    }

    pub fn i64() -> Self {
        Self::Int(64)
    }

    pub fn ptr(self) -> Self {
        Self::Pointer(Box::new(self))
    }

    pub fn array(elem: Type, len: u64) -> Self {
        Self::Array {
            len,
            elem: Box::new(elem),
        }
    }

    pub fn structure(fields: Vec<Type>) -> Self {
        Self::Struct {
            fields,
            packed: false,
        }
    }

    pub fn packed_structure(fields: Vec<Type>) -> Self {
        Self::Struct {
            fields,
            packed: true,
        }
    }

    pub fn function(ret: Type, params: Vec<Type>) -> Self {
        Self::Function {
            ret: Box::new(ret),
            params,
            var_args: false,
        }
    }

    pub fn var_arg_function(ret: Type, params: Vec<Type>) -> Self {
        Self::Function {
            ret: Box::new(ret),
            params,
            var_args: true,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function { .. })
    }

    pub fn int_width(&self) -> Option<u32> {
        match self {
            Self::Int(width) => Some(*width),
            _ => None,
        }
    }

    /// Whether values of this type can be instruction operands.
    pub fn is_first_class(&self) -> bool {
        !matches!(self, Self::Void | Self::Function { .. })
    }

    /// Whether this type can be an array element, struct field or parameter.
    fn is_element(&self) -> bool {
        self.is_first_class() && *self != Self::Label
    }

    /// Check integer widths and nested types all the way down.
    pub fn validate(&self) -> Result<()> {
        for child in self.children() {
            child.validate()?;
        }
        let bad_child = match self {
            Self::Void | Self::Label | Self::Float | Self::Double => None,
            Self::Int(width) => {
                if *width == 0 || *width > MAX_INT_WIDTH {
                    return Err(IrError::InvalidIntWidth(*width));
                }
                None
            }
            Self::Pointer(pointee) => {
                matches!(pointee.as_ref(), Self::Void | Self::Label).then_some(pointee.as_ref())
            }
            Self::Array { elem, .. } => (!elem.is_element()).then_some(elem.as_ref()),
            Self::Struct { fields, .. } => fields.iter().find(|field| !field.is_element()),
            Self::Function { ret, params, .. } => {
                if !ret.is_void() && !ret.is_element() {
                    Some(ret.as_ref())
                } else {
                    params.iter().find(|param| !param.is_element())
                }
            }
        };
        match bad_child {
            Some(child) => Err(IrError::InvalidElementType {
                parent: self.clone(),
                child: child.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Return and parameter types of a function type.
    pub fn signature(&self) -> Result<(&Type, &[Type])> {
        match self {
            Self::Function { ret, params, .. } => Ok((ret, params)),
            other => Err(IrError::NotAFunctionType(other.clone())),
        }
    }

    /// Directly contained types, in record order.
    pub fn children(&self) -> Vec<&Type> {
        match self {
            Self::Void | Self::Label | Self::Float | Self::Double | Self::Int(_) => Vec::new(),
            Self::Pointer(pointee) => vec![pointee.as_ref()],
            Self::Array { elem, .. } => vec![elem.as_ref()],
            Self::Struct { fields, .. } => fields.iter().collect(),
            Self::Function { ret, params, .. } => {
                let mut children = Vec::with_capacity(params.len() + 1);
                children.push(ret.as_ref());
                children.extend(params);
                children
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Label => f.write_str("label"),
            Self::Float => f.write_str("float"),
            Self::Double => f.write_str("double"),
            Self::Int(width) => write!(f, "i{width}"),
            Self::Pointer(pointee) => write!(f, "{pointee}*"),
            Self::Array { len, elem } => write!(f, "[{len} x {elem}]"),
            Self::Struct { fields, packed } => {
                let (open, close) = if *packed { ("<{", "}>") } else { ("{", "}") };
                if fields.is_empty() {
                    return write!(f, "{open}{close}");
                }
                write!(f, "{open} ")?;
                write_list(f, fields)?;
                write!(f, " {close}")
            }
            Self::Function {
                ret,
                params,
                var_args,
            } => {
                write!(f, "{ret} (")?;
                write_list(f, params)?;
                if *var_args {
                    f.write_str(if params.is_empty() { "..." } else { ", ..." })?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}
