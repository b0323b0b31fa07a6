#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Bitcode encoder for bitforge IR modules.
//!
//! Encoding runs in three phases:
//! - Enumeration: every value gets an ordinal (`Enumerator`), every type an
//!   index (`TypeTable`)
//! - Registration: block builders put their global abbreviations into one
//!   `BlockInfoRegistry`
//! - Emission: the module writer drives each block builder in container order

pub mod blocks;
mod config;
pub mod constants;
pub mod encoding;
mod enumerator;
mod error;
mod string_table;
mod type_table;
mod writer;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod type_table_tests;

pub use config::EncodeConfig;
pub use enumerator::Enumerator;
pub use error::{EncodeError, Result};
pub use string_table::{StringTable, StrtabRef};
pub use type_table::TypeTable;
pub use writer::encode;
