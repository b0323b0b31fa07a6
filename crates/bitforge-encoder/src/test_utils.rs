use std::fmt::Write as _;

use bitforge_bitstream::reader::{Block, Item, StreamReader, read_items};
use bitforge_bitstream::{BitStream, BlockInfoRegistry};
use bitforge_ir::Module;

use crate::constants::{MAGIC, block_id};
use crate::{EncodeConfig, encode};

/// Encode without the identification block, so snapshots don't depend on
/// the crate version.
pub fn encode_bare(module: &Module) -> Vec<u8> {
    encode(module, &EncodeConfig::new().identification(false)).unwrap()
}

/// Decode `bytes`, checking the magic word.
pub fn read(bytes: &[u8]) -> Vec<Item> {
    let mut reader = StreamReader::new(bytes);
    assert_eq!(reader.read_magic().unwrap(), MAGIC);
    reader.read_all().unwrap()
}

/// Decode a magic-less stream holding the block-info block for `registry`
/// followed by whatever `write` emits at top level.
pub fn emit(registry: BlockInfoRegistry, write: impl FnOnce(&mut BitStream)) -> Vec<Item> {
    let mut stream = BitStream::with_block_info(registry);
    stream.write_block_info().unwrap();
    write(&mut stream);
    read_items(&stream.end().unwrap()).unwrap()
}

/// The top-level block with `id`.
pub fn top_block(items: &[Item], id: u32) -> &Block {
    items
        .iter()
        .find_map(|item| match item {
            Item::Block(block) if block.id == id => Some(block),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no top-level block {id}"))
}

pub fn module_block(items: &[Item]) -> &Block {
    top_block(items, block_id::MODULE)
}

/// Operands of every direct record with `code`.
pub fn operands(block: &Block, code: u64) -> Vec<Vec<u64>> {
    block
        .records_with_code(code)
        .map(|record| record.operands.clone())
        .collect()
}

/// Text rendering of an encoded module: one line per block and record.
///
/// Records show `#id` for abbreviated records and `u` for unabbreviated
/// ones. Block lengths are left out so snapshots survive width changes.
pub fn dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for item in read(bytes) {
        dump_item(&mut out, &item, 0);
    }
    out
}

fn dump_item(out: &mut String, item: &Item, depth: usize) {
    let indent = "  ".repeat(depth);
    match item {
        Item::Block(block) => {
            writeln!(
                out,
                "{indent}{} width={}",
                block_name(block.id),
                block.abbrev_width
            )
            .unwrap();
            for child in &block.items {
                dump_item(out, child, depth + 1);
            }
        }
        Item::Record(record) => {
            let via = match record.abbrev_id {
                Some(id) => format!("#{id}"),
                None => "u".to_owned(),
            };
            writeln!(out, "{indent}{via} {} {:?}", record.code, record.operands).unwrap();
        }
    }
}

fn block_name(id: u32) -> String {
    let name = match id {
        block_id::BLOCKINFO => "BLOCKINFO",
        block_id::MODULE => "MODULE",
        block_id::CONSTANTS => "CONSTANTS",
        block_id::FUNCTION => "FUNCTION",
        block_id::IDENTIFICATION => "IDENTIFICATION",
        block_id::VALUE_SYMTAB => "VALUE_SYMTAB",
        block_id::TYPE => "TYPE",
        block_id::STRTAB => "STRTAB",
        other => return format!("BLOCK({other})"),
    };
    name.to_owned()
}
