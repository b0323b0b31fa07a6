use bitforge_bitstream::reader::Block;
use bitforge_ir::{BinOp, CastOp, IntPredicate, Module, Type};

use crate::constants::{block_id, function_code, value_symtab_code};
use crate::encoding::string_operands;
use crate::test_utils::{encode_bare, module_block, read};
use crate::{EncodeConfig, EncodeError, encode};

fn function_blocks(module: &Module) -> Vec<Block> {
    let items = read(&encode_bare(module));
    module_block(&items)
        .blocks(block_id::FUNCTION)
        .cloned()
        .collect()
}

fn records(block: &Block) -> Vec<(u64, Vec<u64>)> {
    block
        .records()
        .map(|r| (r.code, r.operands.clone()))
        .collect()
}

#[test]
fn ret_void() {
    let mut m = Module::new();
    let mut f = m
        .define_function("main", Type::function(Type::Void, vec![]))
        .unwrap();
    let entry = f.append_block(None);
    f.position_at_end(entry).unwrap();
    f.ret(None).unwrap();
    f.finish().unwrap();

    let blocks = function_blocks(&m);
    let block = &blocks[0];

    assert_eq!(
        records(block),
        vec![
            (function_code::DECLAREBLOCKS, vec![1]),
            (function_code::INST_RET, vec![]),
        ]
    );
    let symtab = block.block(block_id::VALUE_SYMTAB).unwrap();
    assert!(symtab.items.is_empty());
    assert!(block.block(block_id::CONSTANTS).is_none());
}

#[test]
fn operands_are_relative() {
    let mut m = Module::new();
    let mut f = m
        .define_function("double", Type::function(Type::i32(), vec![Type::i32()]))
        .unwrap();
    let entry = f.append_block(None);
    f.position_at_end(entry).unwrap();
    let x = f.arg(0).unwrap();
    let y = f.binop(BinOp::Add, x, x).unwrap();
    f.ret(Some(y)).unwrap();
    f.finish().unwrap();

    let blocks = function_blocks(&m);

    assert_eq!(
        records(&blocks[0]),
        vec![
            (function_code::DECLAREBLOCKS, vec![1]),
            (function_code::INST_BINOP, vec![1, 1, 0]),
            (function_code::INST_RET, vec![1]),
        ]
    );
}

#[test]
fn branches_use_block_indices() {
    let mut m = Module::new();
    let mut f = m
        .define_function("pick", Type::function(Type::i32(), vec![Type::i32()]))
        .unwrap();
    let zero = f.module().const_int(Type::i32(), 0).unwrap();
    let entry = f.append_block(None);
    let then = f.append_block(None);
    let other = f.append_block(None);
    f.position_at_end(entry).unwrap();
    let x = f.arg(0).unwrap();
    let cond = f.icmp(IntPredicate::Eq, x, zero).unwrap();
    f.branch(cond, then, other).unwrap();
    f.position_at_end(then).unwrap();
    f.ret(Some(x)).unwrap();
    f.position_at_end(other).unwrap();
    f.unreachable().unwrap();
    f.finish().unwrap();

    let blocks = function_blocks(&m);
    let block = &blocks[0];

    // pick = 0, x = 1, the zero = 2, cond = 3; void instructions sit at 4.
    assert_eq!(
        records(block),
        vec![
            (function_code::DECLAREBLOCKS, vec![3]),
            (function_code::INST_CMP2, vec![2, 1, 32]),
            (function_code::INST_BR, vec![1, 2, 1]),
            (function_code::INST_RET, vec![3]),
            (function_code::INST_UNREACHABLE, vec![]),
        ]
    );
    let constants = block.block(block_id::CONSTANTS).unwrap();
    assert_eq!(constants.records().count(), 2);
}

#[test]
fn unconditional_jump() {
    let mut m = Module::new();
    let mut f = m
        .define_function("hop", Type::function(Type::Void, vec![]))
        .unwrap();
    let entry = f.append_block(None);
    let exit = f.append_block(None);
    f.position_at_end(entry).unwrap();
    f.jump(exit).unwrap();
    f.position_at_end(exit).unwrap();
    f.ret(None).unwrap();
    f.finish().unwrap();

    let blocks = function_blocks(&m);

    assert_eq!(
        blocks[0].records_with_code(function_code::INST_BR).next().unwrap().operands,
        vec![1]
    );
}

#[test]
fn cast_carries_target_type() {
    let mut m = Module::new();
    let mut f = m
        .define_function("widen", Type::function(Type::i64(), vec![Type::i32()]))
        .unwrap();
    let entry = f.append_block(None);
    f.position_at_end(entry).unwrap();
    let x = f.arg(0).unwrap();
    let wide = f.cast(CastOp::SExt, x, Type::i64()).unwrap();
    f.ret(Some(wide)).unwrap();
    f.finish().unwrap();

    let types = crate::TypeTable::collect(&m);
    let i64_index = types.get(&Type::i64()).unwrap();
    let blocks = function_blocks(&m);
    let cast = blocks[0]
        .records_with_code(function_code::INST_CAST)
        .next()
        .unwrap();

    assert_eq!(cast.operands, vec![1, i64_index, 2]);
}

#[test]
fn symtab_names_blocks_arguments_and_values() {
    let mut m = Module::new();
    let mut f = m
        .define_function("named", Type::function(Type::i32(), vec![Type::i32()]))
        .unwrap();
    let entry = f.append_block(Some("entry"));
    let odd = f.append_block(Some("odd block"));
    f.position_at_end(entry).unwrap();
    let x = f.arg(0).unwrap();
    f.set_name(x, "x").unwrap();
    let sum = f.binop(BinOp::Add, x, x).unwrap();
    f.set_name(sum, "sum-1").unwrap();
    f.jump(odd).unwrap();
    f.position_at_end(odd).unwrap();
    f.ret(Some(sum)).unwrap();
    f.finish().unwrap();

    let blocks = function_blocks(&m);
    let symtab = blocks[0].block(block_id::VALUE_SYMTAB).unwrap();
    let entries: Vec<_> = symtab.records().collect();

    let with = |first: u64, text: &[u8]| {
        let mut ops = vec![first];
        ops.extend(string_operands(text));
        ops
    };
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].code, value_symtab_code::BBENTRY);
    assert_eq!(entries[0].operands, with(0, b"entry"));
    assert!(entries[0].abbrev_id.is_some());
    assert_eq!(entries[1].code, value_symtab_code::BBENTRY);
    assert_eq!(entries[1].operands, with(1, b"odd block"));
    assert_eq!(entries[1].abbrev_id, None);
    assert_eq!(entries[2].code, value_symtab_code::ENTRY);
    assert_eq!(entries[2].operands, with(1, b"x"));
    assert_eq!(entries[3].code, value_symtab_code::ENTRY);
    assert_eq!(entries[3].operands, with(2, b"sum-1"));
    assert_ne!(entries[2].abbrev_id, entries[3].abbrev_id);
}

#[test]
fn forward_reference_is_rejected() {
    let mut m = Module::new();
    let mut f = m
        .define_function("late", Type::function(Type::i32(), vec![Type::i32()]))
        .unwrap();
    let first = f.append_block(None);
    let second = f.append_block(None);
    f.position_at_end(second).unwrap();
    let x = f.arg(0).unwrap();
    let y = f.binop(BinOp::Mul, x, x).unwrap();
    f.ret(Some(y)).unwrap();
    f.position_at_end(first).unwrap();
    f.ret(Some(y)).unwrap();
    f.finish().unwrap();

    let err = encode(&m, &EncodeConfig::default()).unwrap_err();

    assert!(matches!(
        err,
        EncodeError::ForwardReference { ref function, .. } if function == "late"
    ));
}
