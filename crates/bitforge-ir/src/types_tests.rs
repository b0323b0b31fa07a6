use crate::{IrError, Type};

#[test]
fn int_width_bounds() {
    assert_eq!(Type::int(1), Ok(Type::i1()));
    assert_eq!(Type::int(8_388_608), Ok(Type::Int(8_388_608)));
    assert_eq!(Type::int(0), Err(IrError::InvalidIntWidth(0)));
    assert_eq!(
        Type::int(8_388_609),
        Err(IrError::InvalidIntWidth(8_388_609))
    );
}

#[test]
fn display() {
    let fn_ty = Type::var_arg_function(Type::i32(), vec![Type::i8().ptr()]);
    let st = Type::structure(vec![Type::i32(), Type::array(Type::i8(), 4)]);

    insta::assert_snapshot!(fn_ty, @"i32 (i8*, ...)");
    insta::assert_snapshot!(st, @"{ i32, [4 x i8] }");
    insta::assert_snapshot!(Type::packed_structure(vec![Type::Double]), @"<{ double }>");
    insta::assert_snapshot!(Type::structure(vec![]), @"{}");
    insta::assert_snapshot!(Type::function(Type::Void, vec![]), @"void ()");
}

#[test]
fn children_in_record_order() {
    let fn_ty = Type::function(Type::Void, vec![Type::i32(), Type::Float]);

    assert_eq!(fn_ty.children(), vec![&Type::Void, &Type::i32(), &Type::Float]);
    assert_eq!(Type::i8().ptr().children(), vec![&Type::i8()]);
    assert!(Type::Label.children().is_empty());
}

#[test]
fn signature_requires_function_type() {
    let fn_ty = Type::function(Type::i1(), vec![Type::i64()]);
    let (ret, params) = fn_ty.signature().unwrap();

    assert_eq!(ret, &Type::i1());
    assert_eq!(params, &[Type::i64()]);
    assert_eq!(
        Type::i32().signature(),
        Err(IrError::NotAFunctionType(Type::i32()))
    );
}

#[test]
fn first_class_types() {
    assert!(Type::i32().is_first_class());
    assert!(Type::Void.ptr().is_first_class());
    assert!(!Type::Void.is_first_class());
    assert!(!Type::function(Type::Void, vec![]).is_first_class());
}

#[test]
fn validate_checks_nested_types() {
    assert_eq!(Type::Int(0).validate(), Err(IrError::InvalidIntWidth(0)));
    assert_eq!(
        Type::array(Type::Int(8_388_609), 2).validate(),
        Err(IrError::InvalidIntWidth(8_388_609))
    );

    let void_array = Type::array(Type::Void, 3);
    assert_eq!(
        void_array.validate(),
        Err(IrError::InvalidElementType {
            parent: void_array.clone(),
            child: Type::Void,
        })
    );
    let label_field = Type::structure(vec![Type::i32(), Type::Label]);
    assert_eq!(
        label_field.validate(),
        Err(IrError::InvalidElementType {
            parent: label_field.clone(),
            child: Type::Label,
        })
    );
    let void_param = Type::function(Type::i32(), vec![Type::Void]);
    assert_eq!(
        void_param.validate(),
        Err(IrError::InvalidElementType {
            parent: void_param.clone(),
            child: Type::Void,
        })
    );
    let fn_ret = Type::function(Type::function(Type::Void, vec![]), vec![]);
    assert!(matches!(
        fn_ret.validate(),
        Err(IrError::InvalidElementType { .. })
    ));
    assert!(matches!(
        Type::Void.ptr().validate(),
        Err(IrError::InvalidElementType { .. })
    ));
}

#[test]
fn validate_accepts_well_formed_types() {
    let callback = Type::function(Type::Void, vec![Type::i8().ptr()]).ptr();
    let record = Type::packed_structure(vec![
        Type::array(Type::i32(), 0),
        callback,
        Type::Double,
    ]);

    assert_eq!(record.validate(), Ok(()));
    assert_eq!(
        Type::var_arg_function(Type::Void, vec![record]).validate(),
        Ok(())
    );
    assert_eq!(Type::Int(8_388_608).validate(), Ok(()));
}
