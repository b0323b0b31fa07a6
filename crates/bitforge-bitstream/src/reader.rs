//! Minimal bitstream reader used to check writer output in tests.
//!
//! Decodes blocks, abbreviated and unabbreviated records, block-local
//! abbreviation definitions and the block-info block. Every block's length
//! word is checked against the words actually consumed.

use std::collections::HashMap;

use crate::writer::decode_char6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("unexpected end of stream at bit {0}")]
    UnexpectedEof(u64),
    #[error("block {block_id} declares {declared} words but contains {actual}")]
    LengthMismatch {
        block_id: u32,
        declared: u32,
        actual: u32,
    },
    #[error("unknown abbreviation id {0}")]
    UnknownAbbrev(u64),
    #[error("invalid abbreviation definition")]
    InvalidDefinition,
    #[error("END_BLOCK outside of any block")]
    StrayEndBlock,
    #[error("stream ends inside a block")]
    UnterminatedBlock,
}

pub type ReadResult<T> = std::result::Result<T, ReadError>;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Op {
    Literal(u64),
    Fixed(u32),
    Vbr(u32),
    Array(Box<Op>),
    Char6,
    Blob,
}

/// A decoded record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Abbreviation id used, or `None` for UNABBREV_RECORD.
    pub abbrev_id: Option<u64>,
    pub code: u64,
    /// Operands including literal ones, excluding the code.
    pub operands: Vec<u64>,
}

/// A decoded block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub id: u32,
    pub abbrev_width: u32,
    /// Value of the length word.
    pub length_words: u32,
    /// Number of DEFINE_ABBREV records seen directly in this block.
    pub local_abbrevs: usize,
    pub items: Vec<Item>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Block(Block),
    Record(Record),
}

impl Block {
    /// Direct child blocks with the given id.
    pub fn blocks(&self, id: u32) -> impl Iterator<Item = &Block> {
        self.items.iter().filter_map(move |item| match item {
            Item::Block(b) if b.id == id => Some(b),
            _ => None,
        })
    }

    pub fn block(&self, id: u32) -> Option<&Block> {
        self.blocks(id).next()
    }

    /// Direct records, in order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.items.iter().filter_map(|item| match item {
            Item::Record(r) => Some(r),
            _ => None,
        })
    }

    pub fn records_with_code(&self, code: u64) -> impl Iterator<Item = &Record> {
        self.records().filter(move |r| r.code == code)
    }
}

/// Bit-level cursor over a byte buffer.
#[derive(Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.bytes.len() as u64 * 8
    }

    pub fn read_fixed(&mut self, width: u32) -> ReadResult<u64> {
        let mut value = 0u64;
        for i in 0..width {
            let byte = self.pos / 8;
            let bit = self.pos % 8;
            let Some(&b) = self.bytes.get(byte as usize) else {
                return Err(ReadError::UnexpectedEof(self.pos));
            };
            value |= u64::from((b >> bit) & 1) << i;
            self.pos += 1;
        }
        Ok(value)
    }

    pub fn read_vbr(&mut self, width: u32) -> ReadResult<u128> {
        let payload = width - 1;
        let flag = 1u64 << payload;
        let mut value = 0u128;
        let mut shift = 0u32;
        loop {
            let chunk = self.read_fixed(width)?;
            value |= u128::from(chunk & (flag - 1)) << shift;
            shift += payload;
            if chunk & flag == 0 {
                return Ok(value);
            }
        }
    }

    pub fn align32(&mut self) {
        let rem = self.pos % 32;
        if rem != 0 {
            self.pos += 32 - rem;
        }
    }
}

/// Decodes a whole stream into top-level items.
#[derive(Debug)]
pub struct StreamReader<'a> {
    bits: BitReader<'a>,
    /// Abbreviations learned from the block-info block, per block kind.
    block_info_abbrevs: HashMap<u32, Vec<Vec<Op>>>,
}

impl<'a> StreamReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bits: BitReader::new(bytes),
            block_info_abbrevs: HashMap::new(),
        }
    }

    /// Consume a 32-bit magic word.
    pub fn read_magic(&mut self) -> ReadResult<u32> {
        self.bits.read_fixed(32).map(|v| v as u32)
    }

    /// Read items until the end of the buffer.
    pub fn read_all(mut self) -> ReadResult<Vec<Item>> {
        let mut items = Vec::new();
        while !self.bits.at_end() {
            match self.bits.read_fixed(2)? {
                0 => return Err(ReadError::StrayEndBlock),
                1 => items.push(Item::Block(self.read_block()?)),
                other => return Err(ReadError::UnknownAbbrev(other)),
            }
        }
        Ok(items)
    }

    /// Read a block body after its ENTER_SUBBLOCK id.
    fn read_block(&mut self) -> ReadResult<Block> {
        let id = self.bits.read_vbr(8)? as u32;
        let abbrev_width = self.bits.read_vbr(4)? as u32;
        self.bits.align32();
        let length_words = self.bits.read_fixed(32)? as u32;
        let body_start = self.bits.position();

        let mut abbrevs: Vec<Vec<Op>> = self
            .block_info_abbrevs
            .get(&id)
            .cloned()
            .unwrap_or_default();
        let mut block = Block {
            id,
            abbrev_width,
            length_words,
            local_abbrevs: 0,
            items: Vec::new(),
        };
        let mut current_bid: Option<u32> = None;

        loop {
            if self.bits.at_end() {
                return Err(ReadError::UnterminatedBlock);
            }
            let abbrev_id = self.bits.read_fixed(abbrev_width)?;
            match abbrev_id {
                0 => {
                    self.bits.align32();
                    let actual = ((self.bits.position() - body_start) / 32) as u32;
                    if actual != length_words {
                        return Err(ReadError::LengthMismatch {
                            block_id: id,
                            declared: length_words,
                            actual,
                        });
                    }
                    return Ok(block);
                }
                1 => block.items.push(Item::Block(self.read_block()?)),
                2 => {
                    let ops = self.read_definition()?;
                    if id == 0 {
                        if let Some(bid) = current_bid {
                            self.block_info_abbrevs.entry(bid).or_default().push(ops);
                        }
                    } else {
                        abbrevs.push(ops);
                        block.local_abbrevs += 1;
                    }
                }
                3 => {
                    let code = self.bits.read_vbr(6)? as u64;
                    let count = self.bits.read_vbr(6)? as usize;
                    let mut operands = Vec::with_capacity(count);
                    for _ in 0..count {
                        operands.push(self.bits.read_vbr(6)? as u64);
                    }
                    if id == 0 && code == 1 {
                        current_bid = operands.first().map(|&v| v as u32);
                    }
                    block.items.push(Item::Record(Record {
                        abbrev_id: None,
                        code,
                        operands,
                    }));
                }
                n => {
                    let ops = abbrevs
                        .get((n - 4) as usize)
                        .cloned()
                        .ok_or(ReadError::UnknownAbbrev(n))?;
                    let mut values = self.read_abbreviated(&ops)?;
                    let code = if values.is_empty() { 0 } else { values.remove(0) };
                    block.items.push(Item::Record(Record {
                        abbrev_id: Some(n),
                        code,
                        operands: values,
                    }));
                }
            }
        }
    }

    fn read_definition(&mut self) -> ReadResult<Vec<Op>> {
        let count = self.bits.read_vbr(5)? as usize;
        let mut flat = Vec::with_capacity(count);
        for _ in 0..count {
            let is_literal = self.bits.read_fixed(1)? == 1;
            if is_literal {
                flat.push(Op::Literal(self.bits.read_vbr(8)? as u64));
                continue;
            }
            let op = match self.bits.read_fixed(3)? {
                1 => Op::Fixed(self.bits.read_vbr(5)? as u32),
                2 => Op::Vbr(self.bits.read_vbr(5)? as u32),
                3 => Op::Array(Box::new(Op::Literal(0))),
                4 => Op::Char6,
                5 => Op::Blob,
                _ => return Err(ReadError::InvalidDefinition),
            };
            flat.push(op);
        }

        // Fold the element op that follows an array marker into the array.
        let mut ops = Vec::with_capacity(flat.len());
        let mut iter = flat.into_iter();
        while let Some(op) = iter.next() {
            if let Op::Array(_) = op {
                let element = iter.next().ok_or(ReadError::InvalidDefinition)?;
                ops.push(Op::Array(Box::new(element)));
            } else {
                ops.push(op);
            }
        }
        Ok(ops)
    }

    fn read_abbreviated(&mut self, ops: &[Op]) -> ReadResult<Vec<u64>> {
        let mut values = Vec::new();
        for op in ops {
            match op {
                Op::Literal(v) => values.push(*v),
                Op::Array(element) => {
                    let len = self.bits.read_vbr(6)? as usize;
                    for _ in 0..len {
                        values.push(self.read_scalar(element)?);
                    }
                }
                Op::Blob => {
                    let len = self.bits.read_vbr(6)? as usize;
                    self.bits.align32();
                    for _ in 0..len {
                        values.push(self.bits.read_fixed(8)?);
                    }
                    self.bits.align32();
                }
                scalar => values.push(self.read_scalar(scalar)?),
            }
        }
        Ok(values)
    }

    fn read_scalar(&mut self, op: &Op) -> ReadResult<u64> {
        match op {
            Op::Fixed(width) => self.bits.read_fixed(*width),
            Op::Vbr(width) => Ok(self.bits.read_vbr(*width)? as u64),
            Op::Char6 => {
                let code = self.bits.read_fixed(6)? as u8;
                Ok(decode_char6(code).map_or(0, |c| c as u64))
            }
            Op::Literal(v) => Ok(*v),
            Op::Array(_) | Op::Blob => Err(ReadError::InvalidDefinition),
        }
    }
}

/// Decode a stream without magic into its top-level items.
pub fn read_items(bytes: &[u8]) -> ReadResult<Vec<Item>> {
    StreamReader::new(bytes).read_all()
}
