use bitforge_ir::{CallingConv, Linkage, Module, Type, UnnamedAddr};

use crate::TypeTable;
use crate::constants::{block_id, module_code, strtab_code};
use crate::test_utils::{encode_bare, module_block, operands, read, top_block};

#[test]
fn plain_global() {
    let mut m = Module::new();
    m.add_global("g", Type::i32()).unwrap();

    let items = read(&encode_bare(&m));
    let types = TypeTable::collect(&m);
    let ptr = types.get(&Type::i32().ptr()).unwrap();

    assert_eq!(
        operands(module_block(&items), u64::from(module_code::GLOBALVAR)),
        vec![vec![0, 1, ptr, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]]
    );
}

#[test]
fn global_with_initializer_and_attributes() {
    let mut m = Module::new();
    let g = m.add_global("answer", Type::i64()).unwrap();
    let value = m.const_int(Type::i64(), 42).unwrap();
    m.set_initializer(g, value).unwrap();
    m.global_mut(g)
        .unwrap()
        .set_const(true)
        .set_linkage(Linkage::External)
        .set_unnamed_addr(UnnamedAddr::Global)
        .set_attributes(2)
        .set_alignment(8)
        .unwrap();

    let items = read(&encode_bare(&m));
    let record = &operands(module_block(&items), u64::from(module_code::GLOBALVAR))[0];

    // The initializer is the only module constant, after the global: ordinal 1.
    assert_eq!(&record[..7], &[0, 6, record[2], 1, 2, 0, 4]);
    assert_eq!(record[10], 1);
    assert_eq!(record[14], 3);
}

#[test]
fn declarations_precede_definitions() {
    let mut m = Module::new();
    let unit = Type::function(Type::Void, vec![]);
    let mut f = m.define_function("body", unit.clone()).unwrap();
    f.set_calling_conv(CallingConv::Fast);
    let entry = f.append_block(None);
    f.position_at_end(entry).unwrap();
    f.ret(None).unwrap();
    f.finish().unwrap();
    m.declare_function("ext", unit.clone()).unwrap();

    let items = read(&encode_bare(&m));
    let types = TypeTable::collect(&m);
    let ty = types.get(&unit).unwrap();
    let records = operands(module_block(&items), u64::from(module_code::FUNCTION));

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.len() == 18));
    // ext: strtab "ext" at 0, prototype, external.
    assert_eq!(&records[0][..6], &[0, 3, ty, 0, 1, 0]);
    // body: after "ext", fast calling convention, defined.
    assert_eq!(&records[1][..6], &[3, 4, ty, 8, 0, 0]);
}

#[test]
fn names_land_in_string_table() {
    let mut m = Module::new();
    m.add_global("counter", Type::i32()).unwrap();
    m.declare_function("puts", Type::function(Type::i32(), vec![Type::i8().ptr()]))
        .unwrap();

    let items = read(&encode_bare(&m));
    let strtab = top_block(&items, block_id::STRTAB);
    let blob = &operands(strtab, strtab_code::BLOB)[0];
    let text: String = blob.iter().map(|&b| char::from(b as u8)).collect();

    assert_eq!(text, "counterputs");
}
