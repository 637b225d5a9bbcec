use banh_compiler::types::{ContainerKind, Primitive};
use banh_compiler::token::{Keyword, Op, TokenKind};
use banh_compiler::Lexer;

fn kinds(src: &str) -> Vec<TokenKind> {
    Lexer::tokenize(src).into_iter().map(|t| t.kind).collect()
}

#[test]
fn function_header_tokens_and_positions() {
    let toks = Lexer::tokenize("hàm chính() -> Z32");
    let expected = [
        (TokenKind::Keyword(Keyword::Ham), 1, 1),
        (TokenKind::Ident("chính".into()), 1, 5),
        (TokenKind::LParen, 1, 10),
        (TokenKind::RParen, 1, 11),
        (TokenKind::Op(Op::Arrow), 1, 13),
        (TokenKind::Primitive(Primitive::Z32), 1, 16),
        (TokenKind::Eof, 1, 19),
    ];
    assert_eq!(toks.len(), expected.len());
    for (tok, (kind, line, column)) in toks.iter().zip(expected) {
        assert_eq!(tok.kind, kind);
        assert_eq!((tok.pos.line, tok.pos.column), (line, column), "for {:?}", tok.kind);
    }
}

#[test]
fn newlines_are_tokens() {
    assert_eq!(
        kinds("a\nb"),
        vec![
            TokenKind::Ident("a".into()),
            TokenKind::Newline,
            TokenKind::Ident("b".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comment_runs_to_end_of_line_but_newline_survives() {
    assert_eq!(
        kinds("a // ghi chú\nb"),
        vec![
            TokenKind::Ident("a".into()),
            TokenKind::Newline,
            TokenKind::Ident("b".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn multi_word_keywords_lex_as_one_token() {
    assert_eq!(kinds("kết thúc"), vec![TokenKind::Keyword(Keyword::KetThuc), TokenKind::Eof]);
    assert_eq!(kinds("trả về"), vec![TokenKind::Keyword(Keyword::TraVe), TokenKind::Eof]);
    assert_eq!(kinds("thủ tục"), vec![TokenKind::Keyword(Keyword::ThuTuc), TokenKind::Eof]);
    assert_eq!(kinds("không thì"), vec![TokenKind::Keyword(Keyword::KhongThi), TokenKind::Eof]);
    assert_eq!(kinds("trong khi"), vec![TokenKind::Keyword(Keyword::TrongKhi), TokenKind::Eof]);
}

#[test]
fn partial_prefix_of_multi_word_keyword_is_an_identifier() {
    assert_eq!(
        kinds("kết bạn"),
        vec![TokenKind::Ident("kết".into()), TokenKind::Ident("bạn".into()), TokenKind::Eof]
    );
    assert_eq!(kinds("trong"), vec![TokenKind::Ident("trong".into()), TokenKind::Eof]);
}

#[test]
fn unicode_identifiers_lex_as_single_tokens() {
    assert_eq!(
        kinds("tổng giá_trị"),
        vec![
            TokenKind::Ident("tổng".into()),
            TokenKind::Ident("giá_trị".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn member_operator_and_type_tables() {
    assert_eq!(
        kinds("x E mảng[1..3] E Z32"),
        vec![
            TokenKind::Ident("x".into()),
            TokenKind::Op(Op::Member),
            TokenKind::Container(ContainerKind::Array),
            TokenKind::LBrack,
            TokenKind::Number("1".into()),
            TokenKind::DotDot,
            TokenKind::Number("3".into()),
            TokenKind::RBrack,
            TokenKind::Op(Op::Member),
            TokenKind::Primitive(Primitive::Z32),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn primitive_aliases() {
    assert_eq!(kinds("số"), vec![TokenKind::Primitive(Primitive::R64), TokenKind::Eof]);
    assert_eq!(kinds("rỗng"), vec![TokenKind::Primitive(Primitive::Void), TokenKind::Eof]);
    assert_eq!(kinds("dãy"), vec![TokenKind::Primitive(Primitive::S32), TokenKind::Eof]);
}

#[test]
fn numbers_keep_their_lexemes() {
    assert_eq!(
        kinds("42 3.25 -7"),
        vec![
            TokenKind::Number("42".into()),
            TokenKind::Number("3.25".into()),
            TokenKind::Number("-7".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn range_dots_do_not_swallow_the_number() {
    assert_eq!(
        kinds("1..3"),
        vec![
            TokenKind::Number("1".into()),
            TokenKind::DotDot,
            TokenKind::Number("3".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn multi_char_operators() {
    assert_eq!(
        kinds("-> <= >= := !="),
        vec![
            TokenKind::Op(Op::Arrow),
            TokenKind::Op(Op::LessEq),
            TokenKind::Op(Op::GreaterEq),
            TokenKind::Op(Op::Assign),
            TokenKind::Op(Op::NotEq),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn eof_repeats() {
    let mut lexer = Lexer::new("a");
    assert_eq!(lexer.next_token().kind, TokenKind::Ident("a".into()));
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}

#[test]
fn positions_are_monotonic() {
    let src = "hàm chính() -> Z32\n  trả về 42\nkết thúc\n";
    let toks = Lexer::tokenize(src);
    for pair in toks.windows(2) {
        let (a, b) = (pair[0].pos, pair[1].pos);
        assert!(
            (b.line, b.column) >= (a.line, a.column),
            "{:?} precedes {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn decomposed_diacritics_normalize_to_the_same_keyword() {
    // "hàm" spelled with a combining grave accent
    let decomposed = "ha\u{0300}m";
    assert_eq!(kinds(decomposed), vec![TokenKind::Keyword(Keyword::Ham), TokenKind::Eof]);
}
