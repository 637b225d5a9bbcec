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

#[test]
fn literal_narrowing_to_integer_targets() {
    check_ok("hàm chính() -> Z32\n  biến x E Z32 := 10\n  trả về x\nkết thúc\n");
    check_ok("hàm chính() -> Z32\n  biến x E N32 := 10\n  trả về 0\nkết thúc\n");
    check_ok("hàm chính() -> Z32\n  biến x E N64 := 10\n  trả về 0\nkết thúc\n");
    check_ok("hàm chính() -> Z32\n  biến x E Z64 := 10\n  trả về 0\nkết thúc\n");
}

#[test]
fn literal_narrowing_to_float_targets() {
    check_ok("hàm chính() -> Z32\n  biến x E R32 := 1.5\n  trả về 0\nkết thúc\n");
    check_ok("hàm chính() -> Z32\n  biến x E R64 := 1.5\n  trả về 0\nkết thúc\n");
}

#[test]
fn constant_expressions_narrow_as_a_whole() {
    check_ok("hàm chính() -> Z32\n  biến x E Z32 := 2 + 3 * 4\n  trả về x\nkết thúc\n");
}

#[test]
fn dotted_literal_never_narrows_to_integer() {
    check_err(
        "hàm chính() -> Z32\n  biến x E Z32 := 1.5\n  trả về 0\nkết thúc\n",
        |k| matches!(k, ErrorKind::TypeMismatch(..)),
    );
}

#[test]
fn widening_is_implicit() {
    check_ok(
        "hàm chính() -> Z32\n  biến a E Z32 := 1\n  biến b E Z64 := a\n  trả về 0\nkết thúc\n",
    );
    check_ok(
        "hàm chính() -> Z32\n  biến a E N32 := 1\n  biến b E N64 := a\n  trả về 0\nkết thúc\n",
    );
    check_ok(
        "hàm chính() -> Z32\n  biến a E R32 := 1.5\n  biến b E R64 := a\n  trả về 0\nkết thúc\n",
    );
}

#[test]
fn narrowing_a_variable_is_rejected() {
    check_err(
        "hàm chính() -> Z32\n  biến a E Z64 := 1\n  biến b E Z32 := a\n  trả về b\nkết thúc\n",
        |k| matches!(k, ErrorKind::TypeMismatch(a, b) if a == "Z64" && b == "Z32"),
    );
}

#[test]
fn signedness_never_changes_implicitly() {
    check_err(
        "hàm chính() -> Z32\n  biến a E N32 := 1\n  biến b E Z64 := a\n  trả về 0\nkết thúc\n",
        |k| matches!(k, ErrorKind::TypeMismatch(..)),
    );
}

#[test]
fn explicit_casts_between_numerics() {
    check_ok("hàm chính() -> Z32\n  biến x E R64 := R64(1)\n  trả về 0\nkết thúc\n");
    check_ok("hàm chính() -> Z32\n  biến x E Z32 := Z32(1.5)\n  trả về x\nkết thúc\n");
    check_ok("hàm chính() -> Z32\n  biến a E Z64 := 9\n  biến b E Z32 := Z32(a)\n  trả về b\nkết thúc\n");
    check_ok("hàm chính() -> Z32\n  biến a E N32 := 7\n  biến b E N64 := N64(a)\n  trả về 0\nkết thúc\n");
}

#[test]
fn explicit_cast_from_boolean_is_invalid() {
    check_err(
        "hàm chính() -> Z32\n  biến b E B1 := 1 bằng 1\n  biến x E Z32 := Z32(b)\n  trả về x\nkết thúc\n",
        |k| matches!(k, ErrorKind::InvalidCasting(..)),
    );
}

#[test]
fn return_values_follow_the_same_policy() {
    check_ok("hàm chính() -> Z32\n  trả về 42\nkết thúc\n");
    check_ok("hàm lớn() -> Z64\n  biến a E Z32 := 1\n  trả về a\nkết thúc\nhàm chính() -> Z32\n  trả về 0\nkết thúc\n");
    check_err(
        "hàm chính() -> Z32\n  biến a E Z64 := 1\n  trả về a\nkết thúc\n",
        |k| matches!(k, ErrorKind::ReturnTypeMismatch(..)),
    );
}
