use crate::token::Position;
use crate::types::{Primitive, Type};

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Variable>,
    pub return_type: Type,
    pub body: Vec<Stmt>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl {
        var: Variable,
        value: Expr,
        pos: Position,
    },
    Return {
        value: Option<Expr>,
        pos: Position,
    },
    If {
        condition: Expr,
        then_block: Vec<Stmt>,
        /// Empty when there is no `không thì`; a single nested `If` models a
        /// cascading `không thì nếu`.
        else_block: Vec<Stmt>,
        pos: Position,
    },
    /// An expression in statement position, typically a call.
    Expr {
        expr: Expr,
        pos: Position,
    },
}

impl Stmt {
    pub fn pos(&self) -> Position {
        match self {
            Stmt::VarDecl { pos, .. }
            | Stmt::Return { pos, .. }
            | Stmt::If { pos, .. }
            | Stmt::Expr { pos, .. } => *pos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,  // hoặc
    And, // và
    Eq,  // bằng
    Ne,  // khác
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier {
        name: String,
        ty: Type,
        pos: Position,
    },
    /// The raw lexeme is preserved; the checker may retype (and the literal
    /// is re-read at the narrower type during lowering).
    Number {
        value: String,
        ty: Primitive,
        pos: Position,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        ty: Type,
        pos: Position,
    },
    Call {
        name: String,
        arguments: Vec<Expr>,
        return_type: Type,
        pos: Position,
    },
    Cast {
        target: Primitive,
        argument: Box<Expr>,
        pos: Position,
    },
    ArrayLiteral {
        elements: Vec<Expr>,
        ty: Type,
        pos: Position,
    },
    Index {
        base: Box<Expr>,
        indices: Vec<Expr>,
        ty: Type,
        pos: Position,
    },
    Uninitialized {
        pos: Position,
    },
}

impl Expr {
    pub fn pos(&self) -> Position {
        match self {
            Expr::Identifier { pos, .. }
            | Expr::Number { pos, .. }
            | Expr::Binary { pos, .. }
            | Expr::Call { pos, .. }
            | Expr::Cast { pos, .. }
            | Expr::ArrayLiteral { pos, .. }
            | Expr::Index { pos, .. }
            | Expr::Uninitialized { pos } => *pos,
        }
    }

    /// The type currently annotated on the node.
    pub fn ty(&self) -> Type {
        match self {
            Expr::Identifier { ty, .. } => ty.clone(),
            Expr::Number { ty, .. } => Type::Primitive(*ty),
            Expr::Binary { ty, .. } => ty.clone(),
            Expr::Call { return_type, .. } => return_type.clone(),
            Expr::Cast { target, .. } => Type::Primitive(*target),
            Expr::ArrayLiteral { ty, .. } => ty.clone(),
            Expr::Index { ty, .. } => ty.clone(),
            Expr::Uninitialized { .. } => Type::Unknown,
        }
    }
}
