use crate::types::{ContainerKind, Primitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self { Self { line, column } }
}

/// Reserved words of the language. Multi-word keywords (`kết thúc`, `trả về`,
/// `không thì`, `thủ tục`, `trong khi`) are recognized by the lexer as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Ham,      // hàm
    ThuTuc,   // thủ tục
    Bien,     // biến
    Neu,      // nếu
    Thi,      // thì
    KhongThi, // không thì
    KetThuc,  // kết thúc
    TraVe,    // trả về
    TrongKhi, // trong khi
    Va,       // và
    Hoac,     // hoặc
    Bang,     // bằng
    Khac,     // khác
}

impl Keyword {
    pub fn lexeme(&self) -> &'static str {
        use Keyword::*;
        match self {
            Ham => "hàm",
            ThuTuc => "thủ tục",
            Bien => "biến",
            Neu => "nếu",
            Thi => "thì",
            KhongThi => "không thì",
            KetThuc => "kết thúc",
            TraVe => "trả về",
            TrongKhi => "trong khi",
            Va => "và",
            Hoac => "hoặc",
            Bang => "bằng",
            Khac => "khác",
        }
    }
}

/// Single-word keyword table.
pub fn lookup_keyword(ident: &str) -> Option<Keyword> {
    use Keyword::*;
    match ident {
        "hàm" => Some(Ham),
        "biến" => Some(Bien),
        "nếu" => Some(Neu),
        "thì" => Some(Thi),
        "và" => Some(Va),
        "hoặc" => Some(Hoac),
        "bằng" => Some(Bang),
        "khác" => Some(Khac),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Assign,    // := (also bare =)
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Percent,   // %
    Bang,      // !
    Less,      // <
    LessEq,    // <=
    Greater,   // >
    GreaterEq, // >=
    NotEq,     // !=
    Arrow,     // ->
    Member,    // E, the ∈ of `name E Type`
}

impl Op {
    pub fn glyph(&self) -> &'static str {
        use Op::*;
        match self {
            Assign => ":=",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            Bang => "!",
            Less => "<",
            LessEq => "<=",
            Greater => ">",
            GreaterEq => ">=",
            NotEq => "!=",
            Arrow => "->",
            Member => "E",
        }
    }
}

/// Single-character operator table.
pub fn lookup_operator(ch: char) -> Option<Op> {
    use Op::*;
    match ch {
        '=' => Some(Assign),
        '+' => Some(Plus),
        '-' => Some(Minus),
        '*' => Some(Star),
        '/' => Some(Slash),
        '%' => Some(Percent),
        '!' => Some(Bang),
        '<' => Some(Less),
        '>' => Some(Greater),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Eof,
    Newline,
    Keyword(Keyword),
    Ident(String),
    Number(String),
    Str(String),
    Op(Op),
    Primitive(Primitive),
    Container(ContainerKind),
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    DotDot,
    Comma,
    Semicolon,
    Unknown(char),
}

impl TokenKind {
    /// The surface form of the token, used in diagnostics.
    pub fn lexeme(&self) -> String {
        use TokenKind::*;
        match self {
            Eof => "EOF".into(),
            Newline => "\\n".into(),
            Keyword(kw) => kw.lexeme().into(),
            Ident(name) => name.clone(),
            Number(raw) => raw.clone(),
            Str(text) => format!("\"{}\"", text),
            Op(op) => op.glyph().into(),
            Primitive(p) => p.name().into(),
            Container(c) => c.name().into(),
            LParen => "(".into(),
            RParen => ")".into(),
            LBrack => "[".into(),
            RBrack => "]".into(),
            LBrace => "{".into(),
            RBrace => "}".into(),
            DotDot => "..".into(),
            Comma => ",".into(),
            Semicolon => ";".into(),
            Unknown(ch) => ch.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}
