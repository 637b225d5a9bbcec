use banh_compiler::compile;

fn compile_ok(src: &str) -> String {
    match compile(src) {
        Ok(ir) => ir,
        Err(e) => panic!("compile failed: {}", e),
    }
}

#[test]
fn hello_number_defines_main() {
    let ir = compile_ok("hàm chính() -> Z32\n  trả về 42\nkết thúc\n");
    assert!(ir.contains("define i32 @main()"), "ir:\n{}", ir);
    assert!(ir.contains("ret i32 42"), "ir:\n{}", ir);
}

#[test]
fn literal_narrowing_emits_no_runtime_cast() {
    let ir = compile_ok("hàm chính() -> Z32\n  biến x E Z32 := 10\n  trả về x\nkết thúc\n");
    assert!(ir.contains("store i32 10, i32* %x.addr"), "ir:\n{}", ir);
    assert!(!ir.contains("trunc"), "ir:\n{}", ir);
    assert!(!ir.contains("sext"), "ir:\n{}", ir);
}

#[test]
fn locals_live_in_entry_block_allocas() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  biến x E Z32 := 1\n  nếu x < 2 thì\n    biến y E Z32 := 2\n    in(y)\n  kết thúc\n  trả về 0\nkết thúc\n",
    );
    // both allocas precede the first branch
    let entry_end = ir.find("if.then.1:").expect("then block");
    let entry = &ir[..entry_end];
    assert!(entry.contains("%x.addr = alloca i32"), "ir:\n{}", ir);
    assert!(entry.contains("%y.addr = alloca i32"), "ir:\n{}", ir);
}

#[test]
fn if_else_makes_three_labeled_blocks() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  nếu 3 < 5 thì\n    trả về 1\n  không thì\n    trả về 0\n  kết thúc\nkết thúc\n",
    );
    assert!(ir.contains("icmp slt i64 3, 5"), "ir:\n{}", ir);
    assert!(ir.contains("br i1"), "ir:\n{}", ir);
    for label in ["if.then.1:", "if.else.1:", "if.end.1:"] {
        assert!(ir.contains(label), "missing {} in:\n{}", label, ir);
    }
    // the join block is unreachable here but still well formed
    assert!(ir.contains("ret i32 1"), "ir:\n{}", ir);
    assert!(ir.contains("ret i32 0"), "ir:\n{}", ir);
}

#[test]
fn integer_condition_compares_against_zero() {
    let ir = compile_ok("hàm chính() -> Z32\n  nếu 1 thì\n    in(1)\n  kết thúc\n  trả về 0\nkết thúc\n");
    assert!(ir.contains("icmp ne i64 1, 0"), "ir:\n{}", ir);
}

#[test]
fn if_without_else_still_joins() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  nếu 1 < 2 thì\n    in(7)\n  kết thúc\n  trả về 0\nkết thúc\n",
    );
    assert!(ir.contains("if.else.1:"), "ir:\n{}", ir);
    assert!(ir.contains("if.end.1:"), "ir:\n{}", ir);
    assert!(ir.matches("br label %if.end.1").count() >= 2, "ir:\n{}", ir);
}

#[test]
fn builtin_print_goes_through_printf() {
    let ir = compile_ok("hàm chính() -> Z32\n  in(42)\n  trả về 0\nkết thúc\n");
    assert!(ir.contains("declare i32 @printf(i8*, ...)"), "ir:\n{}", ir);
    assert!(
        ir.contains("@fmtstr_print_d = private unnamed_addr constant [4 x i8] c\"%d\\0A\\00\""),
        "ir:\n{}",
        ir
    );
    assert!(ir.contains("call i32 (i8*, ...) @printf(i8* %t0, i64 42)"), "ir:\n{}", ir);
}

#[test]
fn print_format_strings_are_interned_once() {
    let ir = compile_ok("hàm chính() -> Z32\n  in(1)\n  in(2)\n  in(3)\n  trả về 0\nkết thúc\n");
    assert_eq!(ir.matches("@fmtstr_print_d = ").count(), 1, "ir:\n{}", ir);
}

#[test]
fn print_picks_the_format_by_type() {
    let ir = compile_ok("hàm chính() -> Z32\n  in(1.5)\n  trả về 0\nkết thúc\n");
    assert!(ir.contains("@fmtstr_print_f"), "ir:\n{}", ir);
    assert!(ir.contains("c\"%f\\0A\\00\""), "ir:\n{}", ir);
}

#[test]
fn array_literal_lowers_to_a_constant_aggregate() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  biến a E mảng[1..3] E Z32 := {10, 20, 30}\n  trả về 0\nkết thúc\n",
    );
    assert!(ir.contains("%a.addr = alloca [3 x i32]"), "ir:\n{}", ir);
    assert!(
        ir.contains("store [3 x i32] [i32 10, i32 20, i32 30], [3 x i32]* %a.addr"),
        "ir:\n{}",
        ir
    );
}

#[test]
fn indexing_subtracts_the_lower_bound() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  biến a E mảng[1..3] E Z32 := {10, 20, 30}\n  trả về a[2]\nkết thúc\n",
    );
    assert!(ir.contains("sub i64 2, 1"), "ir:\n{}", ir);
    assert!(ir.contains("getelementptr [3 x i32], [3 x i32]* %a.addr, i64 0, i64"), "ir:\n{}", ir);
    assert!(ir.contains("load i32, i32*"), "ir:\n{}", ir);
}

#[test]
fn zero_based_arrays_index_directly() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  biến a E mảng[0..2] E Z32 := {10, 20, 30}\n  trả về a[1]\nkết thúc\n",
    );
    assert!(!ir.contains("sub i64"), "ir:\n{}", ir);
}

#[test]
fn procedures_return_void() {
    let ir = compile_ok(
        "thủ tục chào()\n  in(42)\nkết thúc\nhàm chính() -> Z32\n  chào()\n  trả về 0\nkết thúc\n",
    );
    assert!(ir.contains("define void @\"chào\"()"), "ir:\n{}", ir);
    assert!(ir.contains("ret void"), "ir:\n{}", ir);
    assert!(ir.contains("call void @\"chào\"()"), "ir:\n{}", ir);
}

#[test]
fn empty_bodies_get_exactly_one_default_return() {
    let ir = compile_ok("hàm chính() -> Z32\nkết thúc\n");
    assert_eq!(ir.matches("ret i32 0").count(), 1, "ir:\n{}", ir);
}

#[test]
fn unicode_function_names_are_quoted() {
    let ir = compile_ok(
        "hàm tổng(x E Z32, y E Z32) -> Z32\n  trả về x + y\nkết thúc\nhàm chính() -> Z32\n  trả về tổng(1, 2)\nkết thúc\n",
    );
    assert!(ir.contains("define i32 @\"tổng\"(i32 %x, i32 %y)"), "ir:\n{}", ir);
    assert!(ir.contains("call i32 @\"tổng\"(i32 1, i32 2)"), "ir:\n{}", ir);
}

#[test]
fn parameters_are_spilled_to_allocas() {
    let ir = compile_ok(
        "hàm đôi(x E Z32) -> Z32\n  trả về x + x\nkết thúc\nhàm chính() -> Z32\n  trả về đôi(21)\nkết thúc\n",
    );
    assert!(ir.contains("%x.addr = alloca i32"), "ir:\n{}", ir);
    assert!(ir.contains("store i32 %x, i32* %x.addr"), "ir:\n{}", ir);
    assert!(ir.contains("load i32, i32* %x.addr"), "ir:\n{}", ir);
}

#[test]
fn widening_inserts_an_extension_at_the_use() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  biến a E Z32 := 1\n  biến b E Z64 := a\n  trả về 0\nkết thúc\n",
    );
    assert!(ir.contains("sext i32"), "ir:\n{}", ir);
    assert!(ir.contains("to i64"), "ir:\n{}", ir);
}

#[test]
fn explicit_casts_dispatch_by_direction() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  biến a E Z64 := 9\n  biến b E Z32 := Z32(a)\n  biến c E N64 := N64(b)\n  biến r E R64 := R64(b)\n  biến z E Z32 := Z32(r)\n  trả về z\nkết thúc\n",
    );
    assert!(ir.contains("trunc i64"), "ir:\n{}", ir);
    // unsigned targets zero-extend
    assert!(ir.contains("zext i32"), "ir:\n{}", ir);
    assert!(ir.contains("sitofp i32"), "ir:\n{}", ir);
    assert!(ir.contains("fptosi double"), "ir:\n{}", ir);
}

#[test]
fn float_arithmetic_uses_float_instructions() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  biến x E R64 := 1.5 + 2.25\n  biến y E R64 := x * x\n  biến z E R64 := y / 2.0\n  biến b E B1 := z < 10.0\n  trả về 0\nkết thúc\n",
    );
    assert!(ir.contains("fadd double"), "ir:\n{}", ir);
    assert!(ir.contains("fmul double"), "ir:\n{}", ir);
    assert!(ir.contains("fdiv double"), "ir:\n{}", ir);
    assert!(ir.contains("fcmp olt double"), "ir:\n{}", ir);
}

#[test]
fn integer_division_is_signed() {
    let ir = compile_ok("hàm chính() -> Z32\n  biến x E Z32 := 7 / 2\n  trả về x\nkết thúc\n");
    assert!(ir.contains("sdiv i32"), "ir:\n{}", ir);
}

#[test]
fn logical_operators_lower_to_bitwise_i1() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  biến b E B1 := 1 < 2 và 3 < 4\n  biến c E B1 := b hoặc b\n  trả về 0\nkết thúc\n",
    );
    assert!(ir.contains("and i1"), "ir:\n{}", ir);
    assert!(ir.contains("or i1"), "ir:\n{}", ir);
}

#[test]
fn every_block_is_terminated() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  nếu 1 < 2 thì\n    nếu 2 < 3 thì\n      trả về 1\n    kết thúc\n  không thì\n    in(0)\n  kết thúc\n  trả về 9\nkết thúc\n",
    );
    let terminators = ir
        .lines()
        .filter(|l| {
            let l = l.trim();
            l.starts_with("ret ") || l == "ret void" || l.starts_with("br ") || l == "unreachable"
        })
        .count();
    let labels = ir.lines().filter(|l| l.trim_end().ends_with(':')).count();
    assert_eq!(terminators, labels, "ir:\n{}", ir);
}

#[test]
fn nested_ifs_get_fresh_ids() {
    let ir = compile_ok(
        "hàm chính() -> Z32\n  nếu 1 < 2 thì\n    nếu 2 < 3 thì\n      in(1)\n    kết thúc\n  kết thúc\n  trả về 0\nkết thúc\n",
    );
    assert!(ir.contains("if.then.1:"), "ir:\n{}", ir);
    assert!(ir.contains("if.then.2:"), "ir:\n{}", ir);
}
