//! Symbol name table.
//!
//! Names of globals and functions are not stored in their records. Records
//! carry an `(offset, size)` slice into one shared byte table, written once
//! as the STRTAB blob after the module block.

use std::collections::HashMap;

/// Slice of the string table holding one name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StrtabRef {
    pub offset: u64,
    pub size: u64,
}

/// Deduplicating string table.
#[derive(Debug, Default)]
pub struct StringTable {
    bytes: Vec<u8>,
    lookup: HashMap<String, StrtabRef>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name`, returning the existing slice if it was added before.
    pub fn add(&mut self, name: &str) -> StrtabRef {
        if let Some(&slice) = self.lookup.get(name) {
            return slice;
        }

        let slice = StrtabRef {
            offset: self.bytes.len() as u64,
            size: name.len() as u64,
        };
        self.bytes.extend_from_slice(name.as_bytes());
        self.lookup.insert(name.to_owned(), slice);
        slice
    }

    /// Concatenated names, without separators.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
