use std::fmt;

use thiserror::Error;

use crate::token::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Vi,
    En,
}

/// The closed set of front-end diagnostics. The `#[error]` templates are the
/// Vietnamese default; `message_en` renders the same kinds in English.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("Mong đợi {0} ở vị trí này.")]
    ExpectToken(String),
    #[error("Không mong đợi ký hiệu '{0}' ở vị trí này.")]
    UnexpectedToken(String),
    #[error("Mong đợi ký hiệu '{0}' thay vì '{1}' ở vị trí này.")]
    WrongToken(String, String),
    #[error("Sai kiểu '{0}' thay vì '{1}'.")]
    TypeMismatch(String, String),
    #[error("Không thể trả về giá trị kiểu '{0}', mong đợi kiểu '{1}'.")]
    ReturnTypeMismatch(String, String),
    #[error("Không tìm thấy định danh '{0}'.")]
    UndeclaredIdentifier(String),
    #[error("Thiếu câu lệnh trả về trong hàm có kiểu trả về '{0}'.")]
    MissingReturn(String),
    #[error("Hàm '{0}' không tồn tại.")]
    InvalidFunctionCall(String),
    #[error("Số lượng đối số ({0}) của lời gọi hàm không khớp với số lượng tham số ({1}) của hàm '{2}'.")]
    ArgumentCountMismatch(usize, usize, String),
    #[error("Đối số '{0}' khác kiểu với tham số '{1}'.")]
    ArgumentTypeMismatch(String, String),
    #[error("Lỗi khai báo lại biến '{0}'.")]
    RedeclarationVar(String),
    #[error("Lỗi khai báo lại hàm '{0}'.")]
    RedeclarationFunction(String),
    #[error("Biểu thức không xác định.")]
    UnknownExpression,
    #[error("Không thể đánh giá được cách sử dụng ký hiệu '{0}'.")]
    InvalidIdentifierUsage(String),
    #[error("Ký hiệu không xác định.")]
    UnknownIdentifierType,
    #[error("Không thể chuyển kiểu '{0}' sang kiểu '{1}'.")]
    InvalidCasting(String, String),
    #[error("Không thể thực hiện phép toán giữa '{0}' và '{1}'.")]
    ErrorBinaryExpr(String, String),
    #[error("Không thể truy cập phần tử của biến này với chỉ số khác số nguyên.")]
    InvalidArrayAccessIndex,
    #[error("Không thể truy cập phần tử của biểu thức này, làm ơn truy cập một biến thuộc kiểu mảng.")]
    InvalidArrayAccessType,
    #[error("Chiều của chỉ số ({0}) khác với chiều của biến ({1}).")]
    InvalidArrayAccessDim(usize, usize),
    #[error("Chỉ số ({0}) nằm ngoài giới hạn của mảng [{1}..{2}].")]
    InvalidArrayAccessRange(i64, i64, i64),
}

impl ErrorKind {
    pub fn message_en(&self) -> String {
        use ErrorKind::*;
        match self {
            ExpectToken(what) => format!("Expected {} here.", what),
            UnexpectedToken(got) => format!("Unexpected token '{}' here.", got),
            WrongToken(want, got) => format!("Expected token '{}' instead of '{}' here.", want, got),
            TypeMismatch(found, want) => format!("Wrong type '{}', expected '{}'.", found, want),
            ReturnTypeMismatch(found, want) => {
                format!("Cannot return a value of type '{}', expected '{}'.", found, want)
            }
            UndeclaredIdentifier(name) => format!("Identifier '{}' was not found.", name),
            MissingReturn(ret) => {
                format!("Missing return statement in a function returning '{}'.", ret)
            }
            InvalidFunctionCall(name) => format!("Function '{}' does not exist.", name),
            ArgumentCountMismatch(got, want, name) => format!(
                "The call passes {} argument(s) but function '{}' takes {}.",
                got, name, want
            ),
            ArgumentTypeMismatch(arg, param) => {
                format!("Argument '{}' does not match the type of parameter '{}'.", arg, param)
            }
            RedeclarationVar(name) => format!("Variable '{}' is declared twice.", name),
            RedeclarationFunction(name) => format!("Function '{}' is declared twice.", name),
            UnknownExpression => "Unknown expression.".into(),
            InvalidIdentifierUsage(name) => format!("Cannot make sense of symbol '{}' here.", name),
            UnknownIdentifierType => "Unknown symbol.".into(),
            InvalidCasting(from, to) => format!("Cannot cast type '{}' to type '{}'.", from, to),
            ErrorBinaryExpr(left, right) => {
                format!("Cannot apply the operation to '{}' and '{}'.", left, right)
            }
            InvalidArrayAccessIndex => "Elements can only be accessed with integer indices.".into(),
            InvalidArrayAccessType => {
                "This expression is not indexable, access a variable of an array type.".into()
            }
            InvalidArrayAccessDim(got, want) => format!(
                "The index has {} dimension(s) but the variable has {}.",
                got, want
            ),
            InvalidArrayAccessRange(idx, lo, hi) => {
                format!("Index ({}) lies outside the array bounds [{}..{}].", idx, lo, hi)
            }
        }
    }
}

/// A structured front-end error: kind, position, rendering locale.
#[derive(Debug, Clone, PartialEq)]
pub struct LangError {
    pub kind: ErrorKind,
    pub line: u32,
    pub column: u32,
    pub language: Language,
}

impl LangError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, line: 0, column: 0, language: Language::default() }
    }

    pub fn at(mut self, pos: Position) -> Self {
        self.line = pos.line;
        self.column = pos.column;
        self
    }

    pub fn in_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

impl fmt::Display for LangError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.language {
            Language::Vi => {
                write!(f, "[Dòng {}, Cột {}] {}", self.line, self.column, self.kind)
            }
            Language::En => {
                write!(f, "[Line {}, Column {}] {}", self.line, self.column, self.kind.message_en())
            }
        }
    }
}

impl std::error::Error for LangError {}

pub type CompileResult<T> = Result<T, LangError>;
