//! Data model for the emitted module. `Module` and its parts render to
//! textual LLVM IR through `Display`; the generator never prints directly.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum IrType {
    Void,
    I1,
    I8,
    I32,
    I64,
    Float,
    Double,
    Ptr(Box<IrType>),
    Array(u64, Box<IrType>),
}

impl IrType {
    pub fn ptr(inner: IrType) -> Self {
        IrType::Ptr(Box::new(inner))
    }

    pub fn array(len: u64, element: IrType) -> Self {
        IrType::Array(len, Box::new(element))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, IrType::I8 | IrType::I32 | IrType::I64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, IrType::Float | IrType::Double)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::I1 => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::Float => write!(f, "float"),
            IrType::Double => write!(f, "double"),
            IrType::Ptr(inner) => write!(f, "{}*", inner),
            IrType::Array(len, element) => write!(f, "[{} x {}]", len, element),
        }
    }
}

/// Quotes identifiers that fall outside LLVM's bare-name alphabet, so
/// Vietnamese function and variable names survive verbatim.
pub fn format_ident(name: &str) -> String {
    let bare = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'));
    if bare {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}

/// Decimal float syntax LLVM accepts: integral values gain a trailing `.0`,
/// everything else uses the shortest round-trip form.
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        let s = format!("{}", value);
        if s.contains('.') {
            s
        } else {
            format!("{}.0", s)
        }
    }
}

fn escape_bytes(data: &[u8]) -> String {
    let mut out = String::new();
    for &b in data {
        if b.is_ascii_graphic() && b != b'"' && b != b'\\' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{:02X}", b));
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Local(String, IrType),
    /// A module-level symbol; its type is the pointee.
    Global(String, IrType),
    ConstInt(IrType, i64),
    ConstFloat(IrType, f64),
    ConstArray(IrType, Vec<Value>),
}

impl Value {
    pub fn ty(&self) -> IrType {
        match self {
            Value::Local(_, ty) => ty.clone(),
            Value::Global(_, pointee) => IrType::ptr(pointee.clone()),
            Value::ConstInt(ty, _) => ty.clone(),
            Value::ConstFloat(ty, _) => ty.clone(),
            Value::ConstArray(ty, _) => ty.clone(),
        }
    }
}

impl fmt::Display for Value {
    /// The operand form, without its type.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Local(name, _) => write!(f, "%{}", format_ident(name)),
            Value::Global(name, _) => write!(f, "@{}", format_ident(name)),
            Value::ConstInt(_, v) => write!(f, "{}", v),
            Value::ConstFloat(_, v) => write!(f, "{}", format_float(*v)),
            Value::ConstArray(_, elements) => {
                write!(f, "[")?;
                for (i, el) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", el.ty(), el)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl fmt::Display for IntPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPredicate {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

impl fmt::Display for FloatPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FloatPredicate::Oeq => "oeq",
            FloatPredicate::One => "one",
            FloatPredicate::Olt => "olt",
            FloatPredicate::Ole => "ole",
            FloatPredicate::Ogt => "ogt",
            FloatPredicate::Oge => "oge",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    FAdd,
    Sub,
    FSub,
    Mul,
    FMul,
    SDiv,
    FDiv,
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "add",
            BinaryOp::FAdd => "fadd",
            BinaryOp::Sub => "sub",
            BinaryOp::FSub => "fsub",
            BinaryOp::Mul => "mul",
            BinaryOp::FMul => "fmul",
            BinaryOp::SDiv => "sdiv",
            BinaryOp::FDiv => "fdiv",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    Sext,
    Zext,
    Trunc,
    Sitofp,
    Fptosi,
    Fpext,
    Fptrunc,
}

impl fmt::Display for CastOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CastOp::Sext => "sext",
            CastOp::Zext => "zext",
            CastOp::Trunc => "trunc",
            CastOp::Sitofp => "sitofp",
            CastOp::Fptosi => "fptosi",
            CastOp::Fpext => "fpext",
            CastOp::Fptrunc => "fptrunc",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    /// Name of the produced value, without the `%` sigil; `None` for
    /// instructions used only for effect.
    pub result: Option<String>,
    pub kind: InstrKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstrKind {
    Alloca(IrType),
    Store {
        ty: IrType,
        value: Value,
        ptr: Value,
    },
    Load {
        ty: IrType,
        ptr: Value,
    },
    Binary {
        op: BinaryOp,
        ty: IrType,
        left: Value,
        right: Value,
    },
    ICmp {
        pred: IntPredicate,
        ty: IrType,
        left: Value,
        right: Value,
    },
    FCmp {
        pred: FloatPredicate,
        ty: IrType,
        left: Value,
        right: Value,
    },
    Cast {
        op: CastOp,
        value: Value,
        to: IrType,
    },
    Call {
        ret: IrType,
        /// Full function type, required at variadic call sites
        /// (e.g. `i32 (i8*, ...)`).
        signature: Option<String>,
        callee: String,
        args: Vec<Value>,
    },
    GetElementPtr {
        base_ty: IrType,
        ptr: Value,
        indices: Vec<Value>,
    },
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(result) = &self.result {
            write!(f, "%{} = ", format_ident(result))?;
        }
        match &self.kind {
            InstrKind::Alloca(ty) => write!(f, "alloca {}", ty),
            InstrKind::Store { ty, value, ptr } => {
                write!(f, "store {} {}, {}* {}", ty, value, ty, ptr)
            }
            InstrKind::Load { ty, ptr } => write!(f, "load {}, {}* {}", ty, ty, ptr),
            InstrKind::Binary { op, ty, left, right } => {
                write!(f, "{} {} {}, {}", op, ty, left, right)
            }
            InstrKind::ICmp { pred, ty, left, right } => {
                write!(f, "icmp {} {} {}, {}", pred, ty, left, right)
            }
            InstrKind::FCmp { pred, ty, left, right } => {
                write!(f, "fcmp {} {} {}, {}", pred, ty, left, right)
            }
            InstrKind::Cast { op, value, to } => {
                write!(f, "{} {} {} to {}", op, value.ty(), value, to)
            }
            InstrKind::Call { ret, signature, callee, args } => {
                match signature {
                    Some(sig) => write!(f, "call {} @{}(", sig, format_ident(callee))?,
                    None => write!(f, "call {} @{}(", ret, format_ident(callee))?,
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", arg.ty(), arg)?;
                }
                write!(f, ")")
            }
            InstrKind::GetElementPtr { base_ty, ptr, indices } => {
                write!(f, "getelementptr {}, {}* {}", base_ty, base_ty, ptr)?;
                for index in indices {
                    write!(f, ", {} {}", index.ty(), index)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Ret(Option<Value>),
    Br(String),
    CondBr {
        cond: Value,
        then_label: String,
        else_label: String,
    },
    Unreachable,
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Ret(None) => write!(f, "ret void"),
            Terminator::Ret(Some(value)) => write!(f, "ret {} {}", value.ty(), value),
            Terminator::Br(label) => write!(f, "br label %{}", format_ident(label)),
            Terminator::CondBr { cond, then_label, else_label } => write!(
                f,
                "br i1 {}, label %{}, label %{}",
                cond,
                format_ident(then_label),
                format_ident(else_label)
            ),
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub label: String,
    pub instrs: Vec<Instr>,
    pub terminator: Option<Terminator>,
}

impl Block {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), instrs: Vec::new(), terminator: None }
    }

    pub fn has_terminator(&self) -> bool {
        self.terminator.is_some()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.label)?;
        for instr in &self.instrs {
            writeln!(f, "  {}", instr)?;
        }
        if let Some(term) = &self.terminator {
            writeln!(f, "  {}", term)?;
        }
        Ok(())
    }
}

/// An interned constant, e.g. a `printf` format string.
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: String,
    pub data: Vec<u8>,
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{} = private unnamed_addr constant [{} x i8] c\"{}\"",
            format_ident(&self.name),
            self.data.len(),
            escape_bytes(&self.data)
        )
    }
}

/// An external function, e.g. `declare i32 @printf(i8*, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<IrType>,
    pub ret: IrType,
    pub variadic: bool,
}

impl fmt::Display for FuncDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "declare {} @{}(", self.ret, format_ident(&self.name))?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        if self.variadic {
            if !self.params.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "...")?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<(String, IrType)>,
    pub ret: IrType,
    pub blocks: Vec<Block>,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define {} @{}(", self.ret, format_ident(&self.name))?;
        for (i, (name, ty)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} %{}", ty, format_ident(name))?;
        }
        writeln!(f, ") {{")?;
        for block in &self.blocks {
            write!(f, "{}", block)?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub globals: Vec<Global>,
    pub declarations: Vec<FuncDecl>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named constant, interning it on first use.
    pub fn intern_global(&mut self, name: &str, data: &[u8]) -> Value {
        if let Some(existing) = self.globals.iter().find(|g| g.name == name) {
            let ty = IrType::array(existing.data.len() as u64, IrType::I8);
            return Value::Global(existing.name.clone(), ty);
        }
        self.globals.push(Global { name: name.into(), data: data.to_vec() });
        Value::Global(name.into(), IrType::array(data.len() as u64, IrType::I8))
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote_any = false;
        for global in &self.globals {
            writeln!(f, "{}", global)?;
            wrote_any = true;
        }
        if !self.declarations.is_empty() {
            if wrote_any {
                writeln!(f)?;
            }
            for decl in &self.declarations {
                writeln!(f, "{}", decl)?;
            }
            wrote_any = true;
        }
        for function in &self.functions {
            if wrote_any {
                writeln!(f)?;
            }
            writeln!(f, "{}", function)?;
            wrote_any = true;
        }
        Ok(())
    }
}
