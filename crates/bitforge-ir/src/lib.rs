#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! In-memory IR for the bitforge encoder.
//!
//! Modules are built through [`Module`] and [`FunctionBuilder`], which check
//! operand types as instructions are appended. The encoder only reads a
//! finished module.

mod error;
mod inst;
mod module;
mod types;
mod value;

#[cfg(test)]
mod types_tests;

pub use error::{IrError, Result};
pub use inst::{BinOp, CastOp, InstKind, Instruction, IntPredicate};
pub use module::{
    Argument, BasicBlock, Declaration, Function, FunctionBuilder, Global, Module,
};
pub use types::{MAX_INT_WIDTH, Type};
pub use value::{
    BlockId, CallingConv, ConstId, Constant, DeclId, FuncId, GlobalId, InstId, Linkage,
    UnnamedAddr, Value,
};
