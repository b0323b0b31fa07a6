//! Block ids and record codes of the bitcode container.

/// `'B' 'C' 0xC0DE`, read as a little-endian 32-bit word.
pub const MAGIC: u32 = 0xdec0_4342;

/// Module record layout version: relative value ids, names in the string table.
pub const MODULE_VERSION: u64 = 2;

pub mod block_id {
    pub const BLOCKINFO: u32 = 0;
    pub const MODULE: u32 = 8;
    pub const CONSTANTS: u32 = 11;
    pub const FUNCTION: u32 = 12;
    pub const IDENTIFICATION: u32 = 13;
    pub const VALUE_SYMTAB: u32 = 14;
    pub const TYPE: u32 = 17;
    pub const STRTAB: u32 = 23;
}

pub mod identification_code {
    pub const STRING: u64 = 1;
    pub const EPOCH: u64 = 2;
}

pub mod module_code {
    pub const VERSION: u32 = 1;
    pub const TRIPLE: u32 = 2;
    pub const DATALAYOUT: u32 = 3;
    pub const GLOBALVAR: u32 = 7;
    pub const FUNCTION: u32 = 8;
    pub const SOURCE_FILENAME: u64 = 16;
}

pub mod type_code {
    pub const NUMENTRY: u32 = 1;
    pub const VOID: u32 = 2;
    pub const FLOAT: u32 = 3;
    pub const DOUBLE: u32 = 4;
    pub const LABEL: u32 = 5;
    pub const INTEGER: u32 = 7;
    pub const POINTER: u64 = 8;
    pub const ARRAY: u64 = 11;
    pub const STRUCT_ANON: u64 = 18;
    pub const FUNCTION: u64 = 21;
}

pub mod constants_code {
    pub const SETTYPE: u64 = 1;
    pub const NULL: u64 = 2;
    pub const UNDEF: u64 = 3;
    pub const INTEGER: u64 = 4;
    pub const STRING: u64 = 8;
    pub const CSTRING: u64 = 9;
}

pub mod function_code {
    pub const DECLAREBLOCKS: u64 = 1;
    pub const INST_BINOP: u64 = 2;
    pub const INST_CAST: u64 = 3;
    pub const INST_RET: u64 = 10;
    pub const INST_BR: u64 = 11;
    pub const INST_UNREACHABLE: u64 = 15;
    pub const INST_CMP2: u64 = 28;
}

pub mod value_symtab_code {
    pub const ENTRY: u64 = 1;
    pub const BBENTRY: u64 = 2;
}

pub mod strtab_code {
    pub const BLOB: u64 = 1;
}
