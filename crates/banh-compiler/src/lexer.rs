use unicode_normalization::UnicodeNormalization;

use crate::token::{lookup_keyword, lookup_operator, Keyword, Op, Position, Token, TokenKind};
use crate::types::{lookup_container, lookup_primitive};

/// Multi-word keywords are tried before ordinary identifier lexing; on a
/// failed match the cursor rolls back to before the first word.
const MULTI_WORD_KEYWORDS: &[(&str, &str, Keyword)] = &[
    ("trong", "khi", Keyword::TrongKhi),
    ("trả", "về", Keyword::TraVe),
    ("kết", "thúc", Keyword::KetThuc),
    ("không", "thì", Keyword::KhongThi),
    ("thủ", "tục", Keyword::ThuTuc),
];

pub struct Lexer {
    input: Vec<char>,
    len: usize,
    idx: usize,
    line: u32,
    col: u32,
}

impl Lexer {
    /// The source is normalized to NFC so that composed and decomposed
    /// spellings of the same diacritics lex identically.
    pub fn new(source: &str) -> Self {
        let input: Vec<char> = source.nfc().collect();
        let len = input.len();
        Self { input, len, idx: 0, line: 1, col: 1 }
    }

    /// Lexes the entire source, ending with a single EOF token.
    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.col)
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.idx).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.idx + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        if self.idx >= self.len {
            return None;
        }
        let ch = self.input[self.idx];
        self.idx += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            // columns count code points, not bytes
            self.col += 1;
        }
        Some(ch)
    }

    fn is_ident_start(ch: char) -> bool {
        ch.is_alphabetic() || ch == '_'
    }

    fn is_ident_continue(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_'
    }

    /// Skips horizontal whitespace; each `\n` becomes its own token so the
    /// parser can see statement boundaries.
    fn skip_whitespace(&mut self) -> Option<Token> {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                let pos = self.pos();
                self.bump();
                return Some(Token { kind: TokenKind::Newline, pos });
            }
            if ch.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
        None
    }

    fn read_ident(&mut self) -> String {
        let mut s = String::new();
        while let Some(ch) = self.peek() {
            if Self::is_ident_continue(ch) {
                s.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn match_multi_word(&mut self, first: &str, second: &str) -> bool {
        let saved = (self.idx, self.line, self.col);
        if self.read_ident() != first {
            (self.idx, self.line, self.col) = saved;
            return false;
        }
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.bump();
        }
        if !self.peek().is_some_and(Self::is_ident_start) || self.read_ident() != second {
            (self.idx, self.line, self.col) = saved;
            return false;
        }
        true
    }

    fn read_keyword_or_ident(&mut self) -> Token {
        let pos = self.pos();
        for (first, second, keyword) in MULTI_WORD_KEYWORDS {
            if self.match_multi_word(first, second) {
                return Token { kind: TokenKind::Keyword(*keyword), pos };
            }
        }

        let ident = self.read_ident();

        // `E` is the membership operator, not an identifier
        if ident == "E" {
            return Token { kind: TokenKind::Op(Op::Member), pos };
        }
        if let Some(container) = lookup_container(&ident) {
            return Token { kind: TokenKind::Container(container), pos };
        }
        if let Some(primitive) = lookup_primitive(&ident) {
            return Token { kind: TokenKind::Primitive(primitive), pos };
        }
        if let Some(keyword) = lookup_keyword(&ident) {
            return Token { kind: TokenKind::Keyword(keyword), pos };
        }
        Token { kind: TokenKind::Ident(ident), pos }
    }

    fn read_number(&mut self) -> Token {
        let pos = self.pos();
        let mut raw = String::new();
        if self.peek() == Some('-') {
            raw.push('-');
            self.bump();
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                raw.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        // a single '.' only when digits follow, so `1..3` stays a range
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            raw.push('.');
            self.bump();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    raw.push(ch);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        Token { kind: TokenKind::Number(raw), pos }
    }

    fn read_string(&mut self) -> Token {
        let pos = self.pos();
        self.bump(); // opening quote
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == '"' {
                break;
            }
            text.push(ch);
            self.bump();
        }
        self.bump(); // closing quote, if any
        Token { kind: TokenKind::Str(text), pos }
    }

    /// Discards `// …` up to the end of the line; the newline still counts.
    fn skip_comment(&mut self) -> Token {
        self.bump();
        self.bump();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
        let pos = self.pos();
        self.bump();
        Token { kind: TokenKind::Newline, pos }
    }

    pub fn next_token(&mut self) -> Token {
        if let Some(newline) = self.skip_whitespace() {
            return newline;
        }

        let pos = self.pos();
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Token { kind: TokenKind::Eof, pos },
        };

        if Self::is_ident_start(ch) {
            return self.read_keyword_or_ident();
        }
        if ch.is_ascii_digit() || (ch == '-' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())) {
            return self.read_number();
        }
        if ch == '"' {
            return self.read_string();
        }

        let two = |kind: TokenKind, lexer: &mut Lexer| {
            lexer.bump();
            lexer.bump();
            Token { kind, pos }
        };
        match (ch, self.peek_at(1)) {
            ('/', Some('/')) => return self.skip_comment(),
            ('-', Some('>')) => return two(TokenKind::Op(Op::Arrow), self),
            ('<', Some('=')) => return two(TokenKind::Op(Op::LessEq), self),
            ('>', Some('=')) => return two(TokenKind::Op(Op::GreaterEq), self),
            (':', Some('=')) => return two(TokenKind::Op(Op::Assign), self),
            ('!', Some('=')) => return two(TokenKind::Op(Op::NotEq), self),
            ('.', Some('.')) => return two(TokenKind::DotDot, self),
            _ => {}
        }

        self.bump();
        if let Some(op) = lookup_operator(ch) {
            return Token { kind: TokenKind::Op(op), pos };
        }
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBrack,
            ']' => TokenKind::RBrack,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            _ => TokenKind::Unknown(ch),
        };
        Token { kind, pos }
    }
}
