//! Block builders.
//!
//! Each builder owns one region of the container. Builders that use global
//! abbreviations register them through `register` before the stream is
//! created, and resolve them to numeric ids in `new`.

mod constant;
mod function;
mod globals;
mod identification;
mod module_info;
mod strtab;
mod types;

#[cfg(test)]
mod function_tests;
#[cfg(test)]
mod globals_tests;
#[cfg(test)]
mod types_tests;

pub use constant::{CONSTANTS_ABBREV_WIDTH, ConstantBlock};
pub use function::{FUNCTION_ABBREV_WIDTH, FunctionBlock, VALUE_SYMTAB_ABBREV_WIDTH};
pub use globals::GlobalsBlock;
pub use identification::{IDENTIFICATION_ABBREV_WIDTH, IdentificationBlock};
pub use module_info::{MODULE_ABBREV_WIDTH, ModuleInfo};
pub use strtab::{STRTAB_ABBREV_WIDTH, StrtabBlock};
pub use types::{TYPE_ABBREV_WIDTH, TypeBlock};
