use std::fmt;

use crate::ast::Expr;

/// Primitive type names. `Any` (`tuỳ`) is reserved for the built-in `in` and
/// has no entry in the lexer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    B1,
    N32,
    N64,
    Z32,
    Z64,
    R32,
    R64,
    C8,
    C16,
    C32,
    S8,
    S16,
    S32,
    Void,
    Any,
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        use Primitive::*;
        match self {
            B1 => "B1",
            N32 => "N32",
            N64 => "N64",
            Z32 => "Z32",
            Z64 => "Z64",
            R32 => "R32",
            R64 => "R64",
            C8 => "C8",
            C16 => "C16",
            C32 => "C32",
            S8 => "S8",
            S16 => "S16",
            S32 => "S32",
            Void => "rỗng",
            Any => "tuỳ",
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, Primitive::N32 | Primitive::N64)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Primitive::N32 | Primitive::N64 | Primitive::Z32 | Primitive::Z64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Primitive::R32 | Primitive::R64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Implicit widening: same kind and signedness, never narrower.
    pub fn widens_to(&self, target: Primitive) -> bool {
        use Primitive::*;
        if *self == target {
            return true;
        }
        matches!(
            (self, target),
            (R32, R64) | (Z32, Z64) | (N32, N64)
        )
    }

    /// Literal narrowing targets for a provisional literal type.
    pub fn narrows_to(&self, target: Primitive) -> bool {
        use Primitive::*;
        match self {
            R64 => matches!(target, R64 | R32),
            Z64 => matches!(target, Z64 | Z32 | N64 | N32),
            _ => false,
        }
    }
}

/// Primitive table, including the spelled-out aliases.
pub fn lookup_primitive(ident: &str) -> Option<Primitive> {
    use Primitive::*;
    match ident {
        "B1" => Some(B1),
        "N32" => Some(N32),
        "N64" => Some(N64),
        "Z32" => Some(Z32),
        "Z64" => Some(Z64),
        "R32" => Some(R32),
        "R64" => Some(R64),
        "số" => Some(R64),
        "C8" => Some(C8),
        "C16" => Some(C16),
        "C32" => Some(C32),
        "S8" => Some(S8),
        "S16" => Some(S16),
        "S32" => Some(S32),
        "dãy" => Some(S32),
        "rỗng" => Some(Void),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    Matrix,
    HashMap,
}

impl ContainerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::Array => "mảng",
            ContainerKind::Matrix => "ma_trận",
            ContainerKind::HashMap => "bảng_băm",
        }
    }

    pub fn dimensions(&self) -> usize {
        match self {
            ContainerKind::Array | ContainerKind::HashMap => 1,
            ContainerKind::Matrix => 2,
        }
    }
}

/// Container table.
pub fn lookup_container(ident: &str) -> Option<ContainerKind> {
    match ident {
        "mảng" => Some(ContainerKind::Array),
        "ma_trận" => Some(ContainerKind::Matrix),
        "bảng_băm" => Some(ContainerKind::HashMap),
        _ => None,
    }
}

/// A source-level type. Primitives compare structurally, structs nominally by
/// name. `Unknown` is the parser's placeholder; the checker must replace it.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Unknown,
    Primitive(Primitive),
    Struct {
        name: String,
        fields: Vec<(String, Type)>,
    },
    Container {
        kind: ContainerKind,
        element: Box<Type>,
        dimensions: usize,
        /// `[lo, hi]` per axis, so `bounds.len() == 2 * dimensions`.
        bounds: Vec<Expr>,
    },
}

impl Type {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => write!(f, "Unknown"),
            Type::Primitive(p) => write!(f, "{}", p.name()),
            Type::Struct { name, .. } => write!(f, "{}", name),
            Type::Container { kind, element, .. } => {
                write!(f, "{} E {}", kind.name(), element)
            }
        }
    }
}
