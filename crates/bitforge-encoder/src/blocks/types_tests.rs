use bitforge_bitstream::BlockInfoRegistry;
use bitforge_ir::Type;

use crate::TypeTable;
use crate::blocks::{TYPE_ABBREV_WIDTH, TypeBlock};
use crate::constants::{block_id, type_code};
use crate::test_utils::{emit, top_block};

#[test]
fn one_record_per_type_in_index_order() {
    let mut table = TypeTable::new();
    table.add(&Type::function(Type::Void, vec![Type::i8().ptr(), Type::i32()]));
    table.add(&Type::array(Type::i8(), 4));
    table.add(&Type::structure(vec![Type::i32(), Type::Double]));

    let items = emit(BlockInfoRegistry::new(), |s| {
        TypeBlock::new(&table).build(s).unwrap()
    });
    let block = top_block(&items, block_id::TYPE);
    let records: Vec<(u64, Vec<u64>)> = block
        .records()
        .map(|r| (r.code, r.operands.clone()))
        .collect();

    assert_eq!(block.abbrev_width, TYPE_ABBREV_WIDTH);
    assert_eq!(block.local_abbrevs, 4);
    assert_eq!(
        records,
        vec![
            (1, vec![8]),
            (2, vec![]),
            (7, vec![8]),
            (8, vec![1, 0]),
            (7, vec![32]),
            (21, vec![0, 0, 2, 3]),
            (11, vec![4, 1]),
            (4, vec![]),
            (18, vec![0, 3, 6]),
        ]
    );
}

#[test]
fn scalar_types_are_unabbreviated() {
    let mut table = TypeTable::new();
    table.add(&Type::Float);
    table.add(&Type::Label);
    table.add(&Type::i64().ptr());

    let items = emit(BlockInfoRegistry::new(), |s| {
        TypeBlock::new(&table).build(s).unwrap()
    });
    let block = top_block(&items, block_id::TYPE);

    for record in block.records() {
        let abbreviated = record.abbrev_id.is_some();
        assert_eq!(abbreviated, record.code == type_code::POINTER, "{record:?}");
    }
}

#[test]
fn packed_struct_and_var_arg_flags() {
    let mut table = TypeTable::new();
    let packed = table.add(&Type::packed_structure(vec![Type::i8()]));
    let printf = table.add(&Type::var_arg_function(
        Type::i32(),
        vec![Type::i8().ptr()],
    ));

    let items = emit(BlockInfoRegistry::new(), |s| {
        TypeBlock::new(&table).build(s).unwrap()
    });
    let block = top_block(&items, block_id::TYPE);
    // Record 0 is NUMENTRY.
    let records: Vec<_> = block.records().skip(1).collect();

    assert_eq!(records[packed as usize].operands[0], 1);
    assert_eq!(records[printf as usize].operands[0], 1);
}
