use crate::ast::{BinOp, Expr, Function, Program, Stmt, Variable};
use crate::error::{CompileResult, ErrorKind, LangError};
use crate::lexer::Lexer;
use crate::token::{Keyword, Op, Token, TokenKind};
use crate::types::{Primitive, Type};

/// Binary operator precedence; higher binds tighter. `bằng`/`khác` are
/// keywords that act as operators, `!=` is their symbolic spelling.
fn binary_op(kind: &TokenKind) -> Option<(BinOp, i32)> {
    match kind {
        TokenKind::Keyword(Keyword::Hoac) => Some((BinOp::Or, 3)),
        TokenKind::Keyword(Keyword::Va) => Some((BinOp::And, 6)),
        TokenKind::Keyword(Keyword::Bang) => Some((BinOp::Eq, 12)),
        TokenKind::Keyword(Keyword::Khac) | TokenKind::Op(Op::NotEq) => Some((BinOp::Ne, 12)),
        TokenKind::Op(Op::Less) => Some((BinOp::Lt, 25)),
        TokenKind::Op(Op::LessEq) => Some((BinOp::Le, 25)),
        TokenKind::Op(Op::Greater) => Some((BinOp::Gt, 25)),
        TokenKind::Op(Op::GreaterEq) => Some((BinOp::Ge, 25)),
        TokenKind::Op(Op::Plus) => Some((BinOp::Add, 50)),
        TokenKind::Op(Op::Minus) => Some((BinOp::Sub, 50)),
        TokenKind::Op(Op::Star) => Some((BinOp::Mul, 100)),
        TokenKind::Op(Op::Slash) => Some((BinOp::Div, 100)),
        _ => None,
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    idx: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                pos: crate::token::Position::new(1, 1),
            });
        }
        Self { tokens, idx: 0 }
    }

    pub fn from_source(source: &str) -> Self {
        Self::new(Lexer::tokenize(source))
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.idx]
    }

    fn peek(&self) -> &Token {
        match self.tokens.get(self.idx + 1) {
            Some(token) => token,
            None => self.cur(),
        }
    }

    fn bump(&mut self) {
        if self.idx < self.tokens.len() - 1 {
            self.idx += 1;
        }
    }

    fn is_keyword(&self, keyword: Keyword) -> bool {
        self.cur().kind == TokenKind::Keyword(keyword)
    }

    fn skip_newlines(&mut self) {
        while self.cur().kind == TokenKind::Newline {
            self.bump();
        }
    }

    fn wrong_token(&self, expected: &str) -> LangError {
        LangError::new(ErrorKind::WrongToken(expected.into(), self.cur().kind.lexeme()))
            .at(self.cur().pos)
    }

    fn expect_token(&self, expected: &str) -> LangError {
        LangError::new(ErrorKind::ExpectToken(expected.into())).at(self.cur().pos)
    }

    fn unexpected_token(&self) -> LangError {
        LangError::new(ErrorKind::UnexpectedToken(self.cur().kind.lexeme())).at(self.cur().pos)
    }

    pub fn parse_program(&mut self) -> CompileResult<Program> {
        let mut functions = Vec::new();
        loop {
            self.skip_newlines();
            if self.cur().kind == TokenKind::Eof {
                break;
            }
            match self.cur().kind {
                TokenKind::Keyword(Keyword::Ham) => functions.push(self.parse_callable(false)?),
                TokenKind::Keyword(Keyword::ThuTuc) => functions.push(self.parse_callable(true)?),
                _ => return Err(self.unexpected_token()),
            }
        }
        Ok(Program { functions })
    }

    /// `hàm NAME(params) -> Type` or `thủ tục NAME(params)`; the body runs to
    /// `kết thúc`. A procedure always returns `rỗng` and its return
    /// statements must not carry a value.
    fn parse_callable(&mut self, is_procedure: bool) -> CompileResult<Function> {
        self.bump(); // hàm / thủ tục

        let (name, pos) = match &self.cur().kind {
            TokenKind::Ident(name) => (name.clone(), self.cur().pos),
            _ => return Err(self.expect_token("tên hàm")),
        };
        self.bump();

        if self.cur().kind != TokenKind::LParen {
            return Err(self.wrong_token("("));
        }
        self.bump();
        let mut parameters = Vec::new();
        if self.cur().kind != TokenKind::RParen {
            loop {
                parameters.push(self.parse_var_ident()?);
                if self.cur().kind == TokenKind::Comma {
                    self.bump();
                    continue;
                }
                if self.cur().kind != TokenKind::RParen {
                    return Err(self.wrong_token(")"));
                }
                break;
            }
        }
        self.bump(); // ')'

        let return_type = if is_procedure {
            Type::Primitive(Primitive::Void)
        } else {
            if self.cur().kind != TokenKind::Op(Op::Arrow) {
                return Err(self.wrong_token("->"));
            }
            self.bump();
            if !matches!(
                self.cur().kind,
                TokenKind::Ident(_) | TokenKind::Primitive(_) | TokenKind::Container(_)
            ) {
                return Err(self.expect_token("kiểu trả về"));
            }
            self.parse_type()?
        };

        if self.cur().kind != TokenKind::Newline {
            return Err(self.expect_token("xuống dòng"));
        }
        self.bump();

        let body = self.parse_stmt_block(&[Keyword::KetThuc])?;
        if is_procedure {
            for stmt in &body {
                if let Stmt::Return { value: Some(value), pos } = stmt {
                    return Err(LangError::new(ErrorKind::ReturnTypeMismatch(
                        value.ty().to_string(),
                        Primitive::Void.name().into(),
                    ))
                    .at(*pos));
                }
            }
        }

        if !self.is_keyword(Keyword::KetThuc) {
            return Err(self.wrong_token("kết thúc"));
        }
        self.bump();

        Ok(Function { name, parameters, return_type, body, pos })
    }

    /// Newline- or `;`-separated statements up to one of the terminating
    /// keywords (which is left for the caller).
    fn parse_stmt_block(&mut self, terminators: &[Keyword]) -> CompileResult<Vec<Stmt>> {
        let mut block = Vec::new();
        loop {
            self.skip_newlines();
            if self.cur().kind == TokenKind::Eof {
                break;
            }
            if terminators.iter().any(|kw| self.is_keyword(*kw)) {
                break;
            }
            block.push(self.parse_statement()?);
            match self.cur().kind {
                TokenKind::Newline | TokenKind::Semicolon => self.bump(),
                _ => return Err(self.expect_token("xuống dòng hoặc ';'")),
            }
        }
        Ok(block)
    }

    fn parse_statement(&mut self) -> CompileResult<Stmt> {
        self.skip_newlines();
        match self.cur().kind {
            TokenKind::Keyword(Keyword::Neu) => self.parse_if_stmt(),
            TokenKind::Keyword(Keyword::Bien) => self.parse_var_decl(),
            TokenKind::Keyword(Keyword::TraVe) => self.parse_return_stmt(),
            TokenKind::Ident(_) => {
                let pos = self.cur().pos;
                let expr = self.parse_expression(0)?;
                Ok(Stmt::Expr { expr, pos })
            }
            _ => Err(self.unexpected_token()),
        }
    }

    fn parse_var_decl(&mut self) -> CompileResult<Stmt> {
        let pos = self.cur().pos;
        self.bump(); // biến

        let var = self.parse_var_ident()?;

        if self.cur().kind == TokenKind::Op(Op::Assign) {
            self.bump();
            let value = match var.ty {
                Type::Primitive(_) | Type::Container { .. } => self.parse_expression(0)?,
                // struct values are not wired through yet
                _ => return Err(LangError::new(ErrorKind::UnknownIdentifierType).at(pos)),
            };
            return Ok(Stmt::VarDecl { var, value, pos });
        }

        let value = Expr::Uninitialized { pos: self.cur().pos };
        Ok(Stmt::VarDecl { var, value, pos })
    }

    /// `name E Type`, shared by parameters and variable declarations.
    fn parse_var_ident(&mut self) -> CompileResult<Variable> {
        let (name, pos) = match &self.cur().kind {
            TokenKind::Ident(name) => (name.clone(), self.cur().pos),
            _ => return Err(self.wrong_token("tên biến")),
        };
        self.bump();

        if self.cur().kind != TokenKind::Op(Op::Member) {
            return Err(self.wrong_token("E"));
        }
        self.bump();

        let ty = self.parse_type()?;
        Ok(Variable { name, ty, pos })
    }

    fn parse_type(&mut self) -> CompileResult<Type> {
        match self.cur().kind.clone() {
            TokenKind::Primitive(primitive) => {
                self.bump();
                Ok(Type::Primitive(primitive))
            }
            TokenKind::Ident(name) => {
                // nominal struct reference, resolution deferred
                self.bump();
                Ok(Type::Struct { name, fields: Vec::new() })
            }
            TokenKind::Container(kind) => {
                self.bump();
                let dimensions = kind.dimensions();
                let mut bounds = Vec::with_capacity(2 * dimensions);
                for _ in 0..dimensions {
                    if self.cur().kind != TokenKind::LBrack {
                        return Err(self.wrong_token("["));
                    }
                    self.bump();
                    let lower = self.parse_expression(0)?;
                    self.check_bound_type(&lower)?;
                    if self.cur().kind != TokenKind::DotDot {
                        return Err(self.wrong_token(".."));
                    }
                    self.bump();
                    let upper = self.parse_expression(0)?;
                    self.check_bound_type(&upper)?;
                    if self.cur().kind != TokenKind::RBrack {
                        return Err(self.wrong_token("]"));
                    }
                    self.bump();
                    bounds.push(lower);
                    bounds.push(upper);
                }
                if self.cur().kind != TokenKind::Op(Op::Member) {
                    return Err(self.wrong_token("E"));
                }
                self.bump();
                let element = self.parse_type()?;
                Ok(Type::Container { kind, element: Box::new(element), dimensions, bounds })
            }
            _ => Err(self.expect_token("kiểu dữ liệu")),
        }
    }

    /// Bounds must be integer-typed: a literal with an integer provisional
    /// type, or an operator tree over such literals. Floats and anything
    /// unresolved are rejected.
    fn check_bound_type(&self, bound: &Expr) -> CompileResult<()> {
        fn is_integer_tree(expr: &Expr) -> bool {
            match expr {
                Expr::Number { ty, .. } => ty.is_integer(),
                Expr::Binary { left, right, .. } => {
                    is_integer_tree(left) && is_integer_tree(right)
                }
                _ => false,
            }
        }
        if is_integer_tree(bound) {
            Ok(())
        } else {
            Err(LangError::new(ErrorKind::ExpectToken("số tự nhiên hoặc số nguyên".into()))
                .at(bound.pos()))
        }
    }

    fn parse_return_stmt(&mut self) -> CompileResult<Stmt> {
        let pos = self.cur().pos;
        self.bump(); // trả về
        match self.cur().kind {
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof => {
                Ok(Stmt::Return { value: None, pos })
            }
            TokenKind::Primitive(Primitive::Void) => {
                self.bump(); // trả về rỗng
                Ok(Stmt::Return { value: None, pos })
            }
            _ => {
                let value = self.parse_expression(0)?;
                Ok(Stmt::Return { value: Some(value), pos })
            }
        }
    }

    fn parse_if_stmt(&mut self) -> CompileResult<Stmt> {
        let pos = self.cur().pos;
        self.bump(); // nếu

        let condition = self.parse_expression(0)?;
        if !self.is_keyword(Keyword::Thi) {
            return Err(self.wrong_token("thì"));
        }
        self.bump();

        let then_block = self.parse_stmt_block(&[Keyword::KetThuc, Keyword::KhongThi])?;
        if self.is_keyword(Keyword::KetThuc) {
            self.bump();
            return Ok(Stmt::If { condition, then_block, else_block: Vec::new(), pos });
        }
        if !self.is_keyword(Keyword::KhongThi) {
            return Err(self.wrong_token("kết thúc"));
        }
        self.bump(); // không thì

        // `không thì nếu` cascades; the nested if owns the final `kết thúc`
        if self.is_keyword(Keyword::Neu) {
            let nested = self.parse_if_stmt()?;
            return Ok(Stmt::If { condition, then_block, else_block: vec![nested], pos });
        }

        if self.cur().kind != TokenKind::Newline {
            return Err(self.expect_token("xuống dòng"));
        }
        self.bump();
        let else_block = self.parse_stmt_block(&[Keyword::KetThuc])?;
        if !self.is_keyword(Keyword::KetThuc) {
            return Err(self.wrong_token("kết thúc"));
        }
        self.bump();

        Ok(Stmt::If { condition, then_block, else_block, pos })
    }

    fn parse_expression(&mut self, min_prec: i32) -> CompileResult<Expr> {
        let mut left = self.parse_primary()?;
        loop {
            let Some((op, prec)) = binary_op(&self.cur().kind) else { break };
            if prec < min_prec {
                break;
            }
            let pos = self.cur().pos;
            self.bump();
            // left-associative: the right side binds one level tighter
            let right = self.parse_expression(prec + 1)?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                ty: Type::Unknown,
                pos,
            };
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> CompileResult<Expr> {
        match self.cur().kind.clone() {
            TokenKind::Primitive(primitive) => self.parse_explicit_cast(primitive),
            TokenKind::Ident(name) => {
                if self.peek().kind == TokenKind::LParen {
                    return self.parse_call_expr(name);
                }
                if self.peek().kind == TokenKind::LBrack {
                    return self.parse_index_expr(name);
                }
                let pos = self.cur().pos;
                self.bump();
                Ok(Expr::Identifier { name, ty: Type::Unknown, pos })
            }
            TokenKind::Number(raw) => {
                let pos = self.cur().pos;
                self.bump();
                // provisional typing: R64 with a dot, Z64 otherwise
                let ty = if raw.contains('.') { Primitive::R64 } else { Primitive::Z64 };
                Ok(Expr::Number { value: raw, ty, pos })
            }
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expression(0)?;
                if self.cur().kind != TokenKind::RParen {
                    return Err(self.wrong_token(")"));
                }
                self.bump();
                Ok(expr)
            }
            TokenKind::LBrace => self.parse_array_literal(),
            _ => Err(self.unexpected_token()),
        }
    }

    fn parse_call_expr(&mut self, name: String) -> CompileResult<Expr> {
        let pos = self.cur().pos;
        self.bump(); // name
        self.bump(); // '('
        let mut arguments = Vec::new();
        if self.cur().kind != TokenKind::RParen {
            loop {
                arguments.push(self.parse_expression(0)?);
                if self.cur().kind == TokenKind::RParen {
                    break;
                }
                if self.cur().kind != TokenKind::Comma {
                    return Err(self.wrong_token(","));
                }
                self.bump();
            }
        }
        self.bump(); // ')'
        Ok(Expr::Call { name, arguments, return_type: Type::Unknown, pos })
    }

    /// `a[i, j]` indexes several axes at once; `a[i][j]` nests, one bracket
    /// group per dimension, each wrapping the previous access as its base.
    fn parse_index_expr(&mut self, name: String) -> CompileResult<Expr> {
        let pos = self.cur().pos;
        let mut expr = Expr::Identifier { name, ty: Type::Unknown, pos };
        self.bump(); // name
        while self.cur().kind == TokenKind::LBrack {
            self.bump(); // '['
            let mut indices = Vec::new();
            loop {
                indices.push(self.parse_expression(0)?);
                if self.cur().kind == TokenKind::Comma {
                    self.bump();
                    continue;
                }
                if self.cur().kind != TokenKind::RBrack {
                    return Err(self.wrong_token("]"));
                }
                break;
            }
            self.bump(); // ']'
            expr = Expr::Index { base: Box::new(expr), indices, ty: Type::Unknown, pos };
        }
        Ok(expr)
    }

    fn parse_array_literal(&mut self) -> CompileResult<Expr> {
        let pos = self.cur().pos;
        self.bump(); // '{'
        let mut elements = Vec::new();
        while self.cur().kind != TokenKind::RBrace {
            elements.push(self.parse_expression(0)?);
            match self.cur().kind {
                TokenKind::RBrace => break,
                TokenKind::Comma => self.bump(),
                _ => return Err(self.expect_token("}")),
            }
        }
        self.bump(); // '}'
        Ok(Expr::ArrayLiteral { elements, ty: Type::Unknown, pos })
    }

    fn parse_explicit_cast(&mut self, target: Primitive) -> CompileResult<Expr> {
        let pos = self.cur().pos;
        self.bump(); // the type name
        if self.cur().kind != TokenKind::LParen {
            return Err(self.wrong_token("("));
        }
        self.bump();
        let argument = self.parse_expression(0)?;
        if self.cur().kind != TokenKind::RParen {
            return Err(self.wrong_token(")"));
        }
        self.bump();
        Ok(Expr::Cast { target, argument: Box::new(argument), pos })
    }
}
