use bitforge_ir::{CastOp, Module, Type};

use crate::{EncodeError, TypeTable};

#[test]
fn new_table_is_empty() {
    let table = TypeTable::new();

    assert!(table.is_empty());
    assert_eq!(table.index_width(), 1);
}

#[test]
fn children_before_parents() {
    let mut table = TypeTable::new();
    let fn_ty = Type::function(Type::Void, vec![Type::i8().ptr(), Type::i32()]);
    let index = table.add(&fn_ty);

    let order: Vec<String> = table.iter().map(ToString::to_string).collect();
    assert_eq!(order, vec!["void", "i8", "i8*", "i32", "void (i8*, i32)"]);
    assert_eq!(index, 4);
}

#[test]
fn adding_twice_keeps_index() {
    let mut table = TypeTable::new();
    let first = table.add(&Type::i32());
    table.add(&Type::i64());

    assert_eq!(table.add(&Type::i32()), first);
    assert_eq!(table.len(), 2);
}

#[test]
fn unknown_type() {
    let table = TypeTable::new();

    assert_eq!(
        table.get(&Type::Float),
        Err(EncodeError::UnknownType(Type::Float))
    );
}

#[test]
fn collect_covers_module() {
    let mut module = Module::new();
    module.add_global("g", Type::i8()).unwrap();
    module
        .declare_function("ext", Type::function(Type::Void, vec![]))
        .unwrap();
    let fn_ty = Type::function(Type::i64(), vec![Type::i32()]);
    let mut f = module.define_function("widen", fn_ty.clone()).unwrap();
    let entry = f.append_block(None);
    f.position_at_end(entry).unwrap();
    let x = f.arg(0).unwrap();
    let wide = f.cast(CastOp::SExt, x, Type::i64()).unwrap();
    f.ret(Some(wide)).unwrap();
    f.finish().unwrap();

    let table = TypeTable::collect(&module);

    for ty in [
        Type::i8(),
        Type::i8().ptr(),
        Type::function(Type::Void, vec![]),
        fn_ty.clone(),
        fn_ty.ptr(),
        Type::i32(),
        Type::i64(),
    ] {
        assert!(table.get(&ty).is_ok(), "missing {ty}");
    }
}
