use crate::reader::{Item, read_items};
use crate::{AbbrevId, AbbrevOp, Abbreviation, BitStream, BitstreamError, BlockInfoRegistry};

const OUTER: u32 = 8;
const INNER: u32 = 12;

fn single_block(items: Vec<Item>) -> crate::reader::Block {
    assert_eq!(items.len(), 1, "expected one top-level block");
    match items.into_iter().next() {
        Some(Item::Block(b)) => b,
        other => panic!("expected block, got {other:?}"),
    }
}

fn code_abbr(name: &str) -> Abbreviation {
    Abbreviation::new(name, vec![AbbrevOp::literal(1), AbbrevOp::vbr(6)]).unwrap()
}

#[test]
fn empty_stream() {
    let stream = BitStream::new();

    assert_eq!(stream.end().unwrap(), Vec::<u8>::new());
}

#[test]
fn empty_block_bytes() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();
    stream.end_block(OUTER).unwrap();
    let bytes = stream.end().unwrap();

    // ENTER_SUBBLOCK(2 bits) | id 8 (vbr8) | width 3 (vbr4), then length 1,
    // then END_BLOCK padded to a word.
    assert_eq!(
        bytes,
        vec![0x21, 0x0c, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn nested_block_lengths_are_back_patched() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();
    stream.write_unabbreviated_record(1, &[2]).unwrap();
    stream.enter_block(INNER, 4).unwrap();
    stream.write_unabbreviated_record(7, &[1, 2, 3, 400]).unwrap();
    stream.end_block(INNER).unwrap();
    stream.end_block(OUTER).unwrap();
    let bytes = stream.end().unwrap();

    // The reader checks every length word against the words it consumed.
    let outer = single_block(read_items(&bytes).unwrap());
    let inner = outer.block(INNER).unwrap();

    assert_eq!(outer.id, OUTER);
    assert_eq!(inner.abbrev_width, 4);
    // Inner block: header word, length word, body; outer adds its own record
    // and END_BLOCK.
    assert!(outer.length_words > inner.length_words + 2);
    assert_eq!(
        (bytes.len() / 4) as u32,
        outer.length_words + 2,
        "outer block spans the whole stream"
    );
}

#[test]
fn end_block_without_open_block() {
    let mut stream = BitStream::new();

    assert_eq!(stream.end_block(OUTER), Err(BitstreamError::NoOpenBlock));
}

#[test]
fn end_block_out_of_order() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();
    stream.enter_block(INNER, 4).unwrap();

    assert_eq!(
        stream.end_block(OUTER),
        Err(BitstreamError::BlockMismatch {
            requested: OUTER,
            innermost: INNER,
        })
    );
    assert_eq!(stream.depth(), 2);
}

#[test]
fn end_with_open_blocks() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();

    assert_eq!(stream.end(), Err(BitstreamError::UnclosedBlocks(1)));
}

#[test]
fn abbrev_width_must_fit_control_codes() {
    let mut stream = BitStream::new();

    assert_eq!(
        stream.enter_block(OUTER, 1),
        Err(BitstreamError::InvalidAbbrevWidth(1))
    );
    assert_eq!(stream.bit_position(), 0);
}

#[test]
fn records_require_open_block() {
    let mut stream = BitStream::new();

    assert_eq!(
        stream.write_unabbreviated_record(1, &[]),
        Err(BitstreamError::NoOpenBlock)
    );
    assert_eq!(stream.write_record("x", &[]), Err(BitstreamError::NoOpenBlock));
}

#[test]
fn unabbreviated_record_round_trip() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();
    stream
        .write_unabbreviated_record(7, &[0, 63, 64, u64::MAX])
        .unwrap();
    stream.end_block(OUTER).unwrap();
    let block = single_block(read_items(&stream.end().unwrap()).unwrap());

    let record = block.records().next().unwrap();
    assert_eq!(record.abbrev_id, None);
    assert_eq!(record.code, 7);
    assert_eq!(record.operands, vec![0, 63, 64, u64::MAX]);
}

#[test]
fn unknown_abbreviation_name() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();

    assert_eq!(
        stream.write_record("missing", &[]),
        Err(BitstreamError::UnknownAbbreviation {
            block_id: OUTER,
            name: "missing".into(),
        })
    );
}

#[test]
fn local_abbreviation() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();
    let id = stream.define_abbreviation(OUTER, code_abbr("one")).unwrap();
    stream.write_record("one", &[9]).unwrap();
    stream.write_abbreviated(id, &[10]).unwrap();
    stream.end_block(OUTER).unwrap();
    let block = single_block(read_items(&stream.end().unwrap()).unwrap());

    assert_eq!(id.get(), AbbrevId::FIRST);
    assert_eq!(block.local_abbrevs, 1);
    let records: Vec<_> = block.records().collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].abbrev_id, Some(4));
    assert_eq!(records[0].code, 1);
    assert_eq!(records[0].operands, vec![9]);
    assert_eq!(records[1].operands, vec![10]);
}

#[test]
fn local_abbreviations_are_scoped_to_their_block() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();
    stream.define_abbreviation(OUTER, code_abbr("one")).unwrap();
    stream.end_block(OUTER).unwrap();
    stream.enter_block(OUTER, 3).unwrap();

    assert!(matches!(
        stream.write_record("one", &[1]),
        Err(BitstreamError::UnknownAbbreviation { .. })
    ));
}

#[test]
fn duplicate_local_abbreviation() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();
    stream.define_abbreviation(OUTER, code_abbr("one")).unwrap();
    let before = stream.bit_position();

    assert_eq!(
        stream.define_abbreviation(OUTER, code_abbr("one")),
        Err(BitstreamError::DuplicateAbbreviation {
            block_id: OUTER,
            name: "one".into(),
        })
    );
    assert_eq!(stream.bit_position(), before);
}

#[test]
fn operand_mismatch_writes_nothing() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();
    stream.define_abbreviation(OUTER, code_abbr("one")).unwrap();
    let before = stream.bit_position();

    assert!(matches!(
        stream.write_record("one", &[1, 2]),
        Err(BitstreamError::OperandCountMismatch {
            expected: 1,
            actual: 2,
            ..
        })
    ));
    assert_eq!(stream.bit_position(), before);
}

#[test]
fn abbrev_id_must_fit_block_width() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 2).unwrap();
    let before = stream.bit_position();

    // Id 4 needs three bits.
    assert_eq!(
        stream.define_abbreviation(OUTER, code_abbr("one")),
        Err(BitstreamError::AbbrevIdOverflow {
            block_id: OUTER,
            width: 2,
        })
    );
    assert_eq!(stream.bit_position(), before);
}

#[test]
fn local_abbreviations_fill_the_id_width() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();
    for name in ["a", "b", "c", "d"] {
        stream.define_abbreviation(OUTER, code_abbr(name)).unwrap();
    }

    assert_eq!(
        stream.define_abbreviation(OUTER, code_abbr("e")),
        Err(BitstreamError::AbbrevIdOverflow {
            block_id: OUTER,
            width: 3,
        })
    );
    stream.write_record("d", &[9]).unwrap();
    stream.end_block(OUTER).unwrap();
    stream.end().unwrap();
}

#[test]
fn global_abbreviations_are_inherited() {
    let mut registry = BlockInfoRegistry::new();
    let global = registry.define(INNER, code_abbr("global")).unwrap();
    let mut stream = BitStream::with_block_info(registry);

    stream.enter_block(OUTER, 3).unwrap();
    stream.write_block_info().unwrap();
    for value in [5, 6] {
        stream.enter_block(INNER, 4).unwrap();
        let local = stream.define_abbreviation(INNER, code_abbr("local")).unwrap();
        stream.write_abbreviated(global, &[value]).unwrap();
        stream.write_record("local", &[value + 100]).unwrap();
        stream.end_block(INNER).unwrap();
        assert_eq!(local.get(), AbbrevId::FIRST + 1);
    }
    stream.end_block(OUTER).unwrap();
    let outer = single_block(read_items(&stream.end().unwrap()).unwrap());

    assert_eq!(global.get(), AbbrevId::FIRST);
    let inners: Vec<_> = outer.blocks(INNER).collect();
    assert_eq!(inners.len(), 2);
    for (inner, value) in inners.iter().zip([5u64, 6]) {
        let records: Vec<_> = inner.records().collect();
        assert_eq!(records[0].abbrev_id, Some(4));
        assert_eq!(records[0].operands, vec![value]);
        assert_eq!(records[1].abbrev_id, Some(5));
        assert_eq!(records[1].operands, vec![value + 100]);
    }
}

#[test]
fn block_info_must_precede_blocks_with_globals() {
    let mut registry = BlockInfoRegistry::new();
    registry.define(INNER, code_abbr("global")).unwrap();
    let mut stream = BitStream::with_block_info(registry);

    assert_eq!(
        stream.enter_block(INNER, 4),
        Err(BitstreamError::BlockInfoNotWritten(INNER))
    );
}

#[test]
fn define_global_through_stream() {
    let mut stream = BitStream::new();
    stream.enter_block(OUTER, 3).unwrap();
    let id = stream.define_abbreviation(INNER, code_abbr("global")).unwrap();

    assert_eq!(id.get(), AbbrevId::FIRST);
    assert_eq!(stream.block_info().abbreviations(INNER).len(), 1);
}

#[test]
fn globals_frozen_after_block_info() {
    let mut stream = BitStream::new();
    stream.write_block_info().unwrap();

    assert_eq!(
        stream.define_abbreviation(INNER, code_abbr("late")),
        Err(BitstreamError::BlockInfoFrozen(INNER))
    );
    assert_eq!(
        stream.write_block_info(),
        Err(BitstreamError::BlockInfoAlreadyWritten)
    );
}

#[test]
fn globals_frozen_after_block_kind_entered() {
    let mut stream = BitStream::new();
    stream.enter_block(INNER, 4).unwrap();
    stream.end_block(INNER).unwrap();

    assert_eq!(
        stream.define_abbreviation(INNER, code_abbr("late")),
        Err(BitstreamError::BlockInfoFrozen(INNER))
    );
}

#[test]
fn registry_rejects_duplicates_and_resolves_names() {
    let mut registry = BlockInfoRegistry::new();
    registry.define(INNER, code_abbr("a")).unwrap();
    registry.define(INNER, code_abbr("b")).unwrap();

    assert!(matches!(
        registry.define(INNER, code_abbr("a")),
        Err(BitstreamError::DuplicateAbbreviation { .. })
    ));
    assert_eq!(registry.resolve(INNER, "b").unwrap().get(), 5);
    assert!(registry.resolve(OUTER, "a").is_err());
}

#[test]
fn block_info_layout() {
    let mut registry = BlockInfoRegistry::new();
    registry.define(INNER, code_abbr("global")).unwrap();
    let mut stream = BitStream::with_block_info(registry);
    stream.write_block_info().unwrap();
    let items = read_items(&stream.end().unwrap()).unwrap();

    insta::assert_debug_snapshot!(items, @r"
    [
        Block(
            Block {
                id: 0,
                abbrev_width: 2,
                length_words: 2,
                local_abbrevs: 0,
                items: [
                    Record(
                        Record {
                            abbrev_id: None,
                            code: 1,
                            operands: [
                                12,
                            ],
                        },
                    ),
                ],
            },
        ),
    ]
    ");
}
