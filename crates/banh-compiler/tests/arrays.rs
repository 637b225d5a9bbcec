use banh_compiler::error::ErrorKind;
use banh_compiler::{analyze, LangError, Parser, Program};

fn check(src: &str) -> Result<Program, LangError> {
    let mut program = Parser::from_source(src).parse_program()?;
    analyze(&mut program)?;
    Ok(program)
}

fn check_ok(src: &str) {
    if let Err(e) = check(src) {
        panic!("expected OK, got: {}", e);
    }
}

fn check_err(src: &str, want: fn(&ErrorKind) -> bool) {
    match check(src) {
        Ok(_) => panic!("expected an error"),
        Err(e) => assert!(want(&e.kind), "unexpected error: {}", e),
    }
}

fn in_main(body: &str) -> String {
    format!("hàm chính() -> Z32\n{}\n  trả về 0\nkết thúc\n", body)
}

#[test]
fn array_literal_fills_its_declared_range() {
    check_ok(&in_main("  biến a E mảng[1..3] E Z32 := {10, 20, 30}"));
    check_ok(&in_main("  biến a E mảng[0..0] E Z32 := {5}"));
}

#[test]
fn element_count_must_match_the_bounds() {
    check_err(&in_main("  biến a E mảng[1..3] E Z32 := {10, 20}"), |k| {
        matches!(k, ErrorKind::TypeMismatch(..))
    });
    check_err(&in_main("  biến a E mảng[1..3] E Z32 := {10, 20, 30, 40}"), |k| {
        matches!(k, ErrorKind::TypeMismatch(..))
    });
}

#[test]
fn elements_coerce_to_the_declared_element_type() {
    check_ok(&in_main("  biến a E mảng[0..1] E R64 := {1.5, 2.5}"));
    check_err(&in_main("  biến a E mảng[0..1] E Z32 := {1.5, 2.5}"), |k| {
        matches!(k, ErrorKind::TypeMismatch(..))
    });
}

#[test]
fn bounds_must_be_integer_expressions() {
    // rejected by the parser's bound check
    check_err(&in_main("  biến a E mảng[1.5..3] E Z32 := {1}"), |k| {
        matches!(k, ErrorKind::ExpectToken(..))
    });
}

#[test]
fn bounds_may_be_constant_expressions() {
    check_ok(&in_main("  biến a E mảng[1..1 + 2] E Z32 := {10, 20, 30}"));
}

#[test]
fn lower_bound_must_not_exceed_upper_bound() {
    check_err(&in_main("  biến a E mảng[3..1] E Z32 := {1}"), |k| {
        matches!(k, ErrorKind::InvalidArrayAccessRange(..))
    });
}

#[test]
fn index_count_must_match_dimensions() {
    check_err(
        &in_main("  biến a E mảng[1..3] E Z32 := {10, 20, 30}\n  in(a[1, 2])"),
        |k| matches!(k, ErrorKind::InvalidArrayAccessDim(2, 1)),
    );
}

#[test]
fn indices_must_be_integers() {
    check_err(
        &in_main("  biến a E mảng[1..3] E Z32 := {10, 20, 30}\n  in(a[1.5])"),
        |k| matches!(k, ErrorKind::InvalidArrayAccessIndex),
    );
}

#[test]
fn constant_indices_are_range_checked() {
    check_err(
        &in_main("  biến a E mảng[1..3] E Z32 := {10, 20, 30}\n  in(a[4])"),
        |k| matches!(k, ErrorKind::InvalidArrayAccessRange(4, 1, 3)),
    );
    check_err(
        &in_main("  biến a E mảng[1..3] E Z32 := {10, 20, 30}\n  in(a[0])"),
        |k| matches!(k, ErrorKind::InvalidArrayAccessRange(0, 1, 3)),
    );
    check_ok(&in_main("  biến a E mảng[1..3] E Z32 := {10, 20, 30}\n  in(a[2])"));
}

#[test]
fn matrix_indexes_with_one_group_or_nested_groups() {
    // both axes in one group, or one group per dimension
    check_ok(&in_main("  biến m E ma_trận[1..2][1..3] E Z32\n  biến x E Z32 := m[1, 2]"));
    check_ok(&in_main("  biến m E ma_trận[1..2][1..3] E Z32\n  biến x E Z32 := m[1][2]"));
    check_ok(&in_main("  biến m E ma_trận[1..2][1..3] E Z32\n  biến x E Z32 := m[2][3]"));
}

#[test]
fn nested_indices_are_range_checked_axis_by_axis() {
    check_err(
        &in_main("  biến m E ma_trận[1..2][1..3] E Z32\n  biến x E Z32 := m[3][1]"),
        |k| matches!(k, ErrorKind::InvalidArrayAccessRange(3, 1, 2)),
    );
    check_err(
        &in_main("  biến m E ma_trận[1..2][1..3] E Z32\n  biến x E Z32 := m[1][4]"),
        |k| matches!(k, ErrorKind::InvalidArrayAccessRange(4, 1, 3)),
    );
}

#[test]
fn indexing_past_the_last_dimension_fails() {
    check_err(
        &in_main("  biến a E mảng[1..3] E Z32 := {10, 20, 30}\n  in(a[1][1])"),
        |k| matches!(k, ErrorKind::InvalidArrayAccessType),
    );
    check_err(
        &in_main("  biến m E ma_trận[1..2][1..3] E Z32\n  in(m[1, 2, 3])"),
        |k| matches!(k, ErrorKind::InvalidArrayAccessDim(3, 2)),
    );
}

#[test]
fn a_partial_index_is_still_a_container() {
    check_err(
        &in_main("  biến m E ma_trận[1..2][1..3] E Z32\n  biến x E Z32 := m[1]"),
        |k| matches!(k, ErrorKind::TypeMismatch(..)),
    );
}

#[test]
fn only_containers_are_indexable() {
    check_err(&in_main("  biến x E Z32 := 1\n  in(x[0])"), |k| {
        matches!(k, ErrorKind::InvalidArrayAccessType)
    });
}

#[test]
fn index_expressions_type_as_the_element() {
    check_ok(&in_main(
        "  biến a E mảng[1..3] E Z32 := {10, 20, 30}\n  biến x E Z32 := a[1]\n  in(x)",
    ));
}
