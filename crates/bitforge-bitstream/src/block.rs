//! Block scopes and the block-info registry.

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::abbrev::{AbbrevId, Abbreviation};
use crate::{BitstreamError, Result};

/// Minimum abbreviation id width: ids 0-3 are reserved control codes.
pub const MIN_ABBREV_WIDTH: u32 = 2;
pub const MAX_ABBREV_WIDTH: u32 = 32;

/// Global abbreviations per block kind.
///
/// Every block of a registered kind sees these abbreviations first, at ids
/// starting from [`AbbrevId::FIRST`], followed by any block-local ones.
/// Kinds are kept in registration order so the block-info block is
/// deterministic.
#[derive(Debug, Default)]
pub struct BlockInfoRegistry {
    blocks: IndexMap<u32, Vec<Rc<Abbreviation>>>,
}

impl BlockInfoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global abbreviation for `block_id`.
    pub fn define(&mut self, block_id: u32, abbr: Abbreviation) -> Result<AbbrevId> {
        let list = self.blocks.entry(block_id).or_default();
        if list.iter().any(|a| a.name() == abbr.name()) {
            return Err(BitstreamError::DuplicateAbbreviation {
                block_id,
                name: abbr.name().to_owned(),
            });
        }

        let id = AbbrevId::from_index(list.len());
        list.push(Rc::new(abbr));
        Ok(id)
    }

    /// Register several global abbreviations for `block_id`, in order.
    pub fn define_all(
        &mut self,
        block_id: u32,
        abbrs: impl IntoIterator<Item = Abbreviation>,
    ) -> Result<()> {
        for abbr in abbrs {
            self.define(block_id, abbr)?;
        }
        Ok(())
    }

    /// Global abbreviations for `block_id` (empty if none).
    pub fn abbreviations(&self, block_id: u32) -> &[Rc<Abbreviation>] {
        self.blocks
            .get(&block_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve a global abbreviation name to its id.
    pub fn resolve(&self, block_id: u32, name: &str) -> Result<AbbrevId> {
        self.abbreviations(block_id)
            .iter()
            .position(|a| a.name() == name)
            .map(AbbrevId::from_index)
            .ok_or_else(|| BitstreamError::UnknownAbbreviation {
                block_id,
                name: name.to_owned(),
            })
    }

    /// Registered kinds with their abbreviations, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Rc<Abbreviation>])> {
        self.blocks.iter().map(|(&id, list)| (id, list.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.values().all(Vec::is_empty)
    }
}

/// State of one open block.
#[derive(Debug)]
pub struct BlockScope {
    id: u32,
    abbrev_width: u32,
    /// Inherited global abbreviations followed by local ones.
    abbrevs: Vec<Rc<Abbreviation>>,
    names: HashMap<String, AbbrevId>,
    /// Byte offset of the length placeholder word.
    length_offset: usize,
}

impl BlockScope {
    pub(crate) fn new(
        id: u32,
        abbrev_width: u32,
        globals: &[Rc<Abbreviation>],
        length_offset: usize,
    ) -> Self {
        let mut scope = Self {
            id,
            abbrev_width,
            abbrevs: Vec::with_capacity(globals.len()),
            names: HashMap::with_capacity(globals.len()),
            length_offset,
        };
        for abbr in globals {
            // The registry already rejected duplicate names.
            scope.push(Rc::clone(abbr));
        }
        scope
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn abbrev_width(&self) -> u32 {
        self.abbrev_width
    }

    pub(crate) fn length_offset(&self) -> usize {
        self.length_offset
    }

    /// Number of visible abbreviations (global and local).
    pub fn len(&self) -> usize {
        self.abbrevs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abbrevs.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<AbbrevId> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: AbbrevId) -> Option<&Abbreviation> {
        id.index()
            .and_then(|i| self.abbrevs.get(i))
            .map(Rc::as_ref)
    }

    pub(crate) fn check_new_name(&self, name: &str) -> Result<()> {
        if self.names.contains_key(name) {
            return Err(BitstreamError::DuplicateAbbreviation {
                block_id: self.id,
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, abbr: Rc<Abbreviation>) -> AbbrevId {
        let id = AbbrevId::from_index(self.abbrevs.len());
        self.names.insert(abbr.name().to_owned(), id);
        self.abbrevs.push(abbr);
        id
    }
}
