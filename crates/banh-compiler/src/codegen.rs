use std::collections::HashMap;

use crate::ast::{BinOp, Expr, Function as AstFunction, Program, Stmt};
use crate::error::{CompileResult, ErrorKind, LangError};
use crate::ir::{
    BinaryOp, Block, CastOp, FloatPredicate, FuncDecl, Function, Instr, InstrKind, IntPredicate,
    IrType, Module, Terminator, Value,
};
use crate::token::Position;
use crate::typeck::const_fold_int;
use crate::types::{ContainerKind, Primitive, Type};

#[derive(Debug, Clone)]
struct SymbolInfo {
    alloca: String,
    ty: IrType,
    source: Type,
}

#[derive(Debug, Clone)]
struct FnSig {
    emitted_name: String,
    param_count: usize,
    ret: IrType,
    source_ret: Type,
}

/// Mutable lowering state: the module under construction plus the blocks and
/// symbol table of the function currently being emitted.
pub struct CodegenContext {
    module: Module,
    blocks: Vec<Block>,
    current: usize,
    symbols: HashMap<String, SymbolInfo>,
    signatures: HashMap<String, FnSig>,
    temp_counter: u32,
    if_counter: u32,
}

impl CodegenContext {
    fn new() -> Self {
        Self {
            module: Module::new(),
            blocks: Vec::new(),
            current: 0,
            symbols: HashMap::new(),
            signatures: HashMap::new(),
            temp_counter: 0,
            if_counter: 0,
        }
    }

    fn emit(&mut self, instr: Instr) {
        self.blocks[self.current].instrs.push(instr);
    }

    fn emit_value(&mut self, kind: InstrKind, ty: IrType) -> Value {
        let name = self.fresh_temp();
        self.emit(Instr { result: Some(name.clone()), kind });
        Value::Local(name, ty)
    }

    fn fresh_temp(&mut self) -> String {
        let n = self.temp_counter;
        self.temp_counter += 1;
        format!("t{}", n)
    }

    fn next_if_id(&mut self) -> u32 {
        self.if_counter += 1;
        self.if_counter
    }

    /// Sets the block terminator unless one exists; statements after a
    /// `trả về` cannot overwrite it.
    fn terminate(&mut self, term: Terminator) {
        let block = &mut self.blocks[self.current];
        if block.terminator.is_none() {
            block.terminator = Some(term);
        }
    }

    /// Allocas always land in the entry block, wherever the declaration
    /// appears.
    fn entry_alloca(&mut self, name: &str, ty: IrType, source: Type) -> Value {
        let alloca = format!("{}.addr", name);
        self.blocks[0]
            .instrs
            .push(Instr { result: Some(alloca.clone()), kind: InstrKind::Alloca(ty.clone()) });
        self.symbols.insert(
            name.into(),
            SymbolInfo { alloca: alloca.clone(), ty: ty.clone(), source },
        );
        Value::Local(alloca, IrType::ptr(ty))
    }
}

/// Lowers a fully type-annotated program to an IR module.
pub fn generate(program: &Program) -> CompileResult<Module> {
    let mut ctx = CodegenContext::new();
    ctx.module.declarations.push(FuncDecl {
        name: "printf".into(),
        params: vec![IrType::ptr(IrType::I8)],
        ret: IrType::I32,
        variadic: true,
    });

    // signatures first, so calls may reference functions defined later
    for function in &program.functions {
        let emitted_name =
            if function.name == "chính" { "main".to_string() } else { function.name.clone() };
        let ret = llvm_type(&function.return_type).map_err(|e| e.at(function.pos))?;
        ctx.signatures.insert(
            function.name.clone(),
            FnSig {
                emitted_name,
                param_count: function.parameters.len(),
                ret,
                source_ret: function.return_type.clone(),
            },
        );
    }

    for function in &program.functions {
        gen_function(&mut ctx, function)?;
    }
    Ok(ctx.module)
}

fn gen_function(ctx: &mut CodegenContext, function: &AstFunction) -> CompileResult<()> {
    // the entry point becomes @main and must return Z32
    let name = if function.name == "chính" {
        if function.return_type != Type::Primitive(Primitive::Z32) {
            return Err(LangError::new(ErrorKind::ReturnTypeMismatch(
                function.return_type.to_string(),
                Primitive::Z32.name().into(),
            ))
            .at(function.pos));
        }
        "main".to_string()
    } else {
        function.name.clone()
    };

    let ret = llvm_type(&function.return_type).map_err(|e| e.at(function.pos))?;
    let mut params = Vec::new();
    for param in &function.parameters {
        params.push((param.name.clone(), llvm_type(&param.ty).map_err(|e| e.at(param.pos))?));
    }

    ctx.blocks = vec![Block::new("entry")];
    ctx.current = 0;
    ctx.symbols.clear();
    ctx.temp_counter = 0;
    ctx.if_counter = 0;

    for (param, (param_name, param_ty)) in function.parameters.iter().zip(params.iter()) {
        let slot = ctx.entry_alloca(&param.name, param_ty.clone(), param.ty.clone());
        ctx.emit(Instr {
            result: None,
            kind: InstrKind::Store {
                ty: param_ty.clone(),
                value: Value::Local(param_name.clone(), param_ty.clone()),
                ptr: slot,
            },
        });
    }

    for stmt in &function.body {
        gen_stmt(ctx, stmt)?;
    }

    if !ctx.blocks[ctx.current].has_terminator() {
        let default = match &ret {
            IrType::I1 | IrType::I8 | IrType::I32 | IrType::I64 => {
                Terminator::Ret(Some(Value::ConstInt(ret.clone(), 0)))
            }
            IrType::Float | IrType::Double => {
                Terminator::Ret(Some(Value::ConstFloat(ret.clone(), 0.0)))
            }
            IrType::Void => Terminator::Ret(None),
            _ => Terminator::Unreachable,
        };
        ctx.terminate(default);
    }

    let blocks = std::mem::take(&mut ctx.blocks);
    ctx.module.functions.push(Function { name, params, ret, blocks });
    Ok(())
}

fn gen_stmt(ctx: &mut CodegenContext, stmt: &Stmt) -> CompileResult<()> {
    match stmt {
        Stmt::VarDecl { var, value, pos } => {
            let ty = llvm_type(&var.ty).map_err(|e| e.at(*pos))?;
            let slot = ctx.entry_alloca(&var.name, ty.clone(), var.ty.clone());
            if !matches!(value, Expr::Uninitialized { .. }) {
                let init = gen_expr(ctx, value)?;
                ctx.emit(Instr { result: None, kind: InstrKind::Store { ty, value: init, ptr: slot } });
            }
            Ok(())
        }
        Stmt::Return { value, .. } => {
            let term = match value {
                Some(expr) => Terminator::Ret(Some(gen_expr(ctx, expr)?)),
                None => Terminator::Ret(None),
            };
            ctx.terminate(term);
            Ok(())
        }
        Stmt::If { condition, then_block, else_block, .. } => {
            let mut cond = gen_expr(ctx, condition)?;
            if cond.ty() != IrType::I1 {
                let ty = cond.ty();
                if !ty.is_integer() {
                    return Err(LangError::new(ErrorKind::TypeMismatch(
                        condition.ty().to_string(),
                        Primitive::B1.name().into(),
                    ))
                    .at(condition.pos()));
                }
                cond = ctx.emit_value(
                    InstrKind::ICmp {
                        pred: IntPredicate::Ne,
                        ty: ty.clone(),
                        left: cond,
                        right: Value::ConstInt(ty, 0),
                    },
                    IrType::I1,
                );
            }

            let id = ctx.next_if_id();
            let then_label = format!("if.then.{}", id);
            let else_label = format!("if.else.{}", id);
            let end_label = format!("if.end.{}", id);

            ctx.blocks.push(Block::new(then_label.clone()));
            let then_idx = ctx.blocks.len() - 1;
            ctx.blocks.push(Block::new(else_label.clone()));
            let else_idx = ctx.blocks.len() - 1;
            ctx.blocks.push(Block::new(end_label.clone()));
            let end_idx = ctx.blocks.len() - 1;

            ctx.terminate(Terminator::CondBr { cond, then_label, else_label });

            ctx.current = then_idx;
            for s in then_block {
                gen_stmt(ctx, s)?;
            }
            if !ctx.blocks[ctx.current].has_terminator() {
                ctx.terminate(Terminator::Br(end_label.clone()));
            }

            ctx.current = else_idx;
            for s in else_block {
                gen_stmt(ctx, s)?;
            }
            if !ctx.blocks[ctx.current].has_terminator() {
                ctx.terminate(Terminator::Br(end_label));
            }

            ctx.current = end_idx;
            Ok(())
        }
        Stmt::Expr { expr, .. } => {
            gen_expr(ctx, expr)?;
            Ok(())
        }
    }
}

fn gen_expr(ctx: &mut CodegenContext, expr: &Expr) -> CompileResult<Value> {
    match expr {
        Expr::Identifier { name, ty, pos } => {
            let info = match ctx.symbols.get(name) {
                Some(info) => info.clone(),
                None => {
                    return Err(LangError::new(ErrorKind::UndeclaredIdentifier(name.clone()))
                        .at(*pos))
                }
            };
            let loaded = ctx.emit_value(
                InstrKind::Load {
                    ty: info.ty.clone(),
                    ptr: Value::Local(info.alloca.clone(), IrType::ptr(info.ty.clone())),
                },
                info.ty.clone(),
            );
            Ok(widen_value(ctx, loaded, &info.source, ty))
        }
        Expr::Number { value, ty, pos } => const_number(value, *ty, *pos),
        Expr::Binary { left, op, right, pos, .. } => {
            let lhs = gen_expr(ctx, left)?;
            let rhs = gen_expr(ctx, right)?;
            gen_binary(ctx, *op, lhs, rhs, *pos)
        }
        Expr::Call { name, arguments, return_type, pos } => {
            gen_call(ctx, name, arguments, return_type, *pos)
        }
        Expr::Cast { target, argument, pos } => gen_cast(ctx, *target, argument, *pos),
        Expr::ArrayLiteral { elements, ty, pos } => {
            let array_ty = llvm_type(ty).map_err(|e| e.at(*pos))?;
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                let value = gen_expr(ctx, element)?;
                // aggregates are materialized as constants only
                if !matches!(
                    value,
                    Value::ConstInt(..) | Value::ConstFloat(..) | Value::ConstArray(..)
                ) {
                    return Err(LangError::new(ErrorKind::TypeMismatch(
                        element.ty().to_string(),
                        "hằng số".into(),
                    ))
                    .at(element.pos()));
                }
                values.push(value);
            }
            Ok(Value::ConstArray(array_ty, values))
        }
        Expr::Index { base, indices, ty, pos } => gen_index(ctx, base, indices, ty, *pos),
        Expr::Uninitialized { pos } => {
            Err(LangError::new(ErrorKind::UnknownExpression).at(*pos))
        }
    }
}

/// Bridges an implicit widening the checker annotated onto a value-producing
/// node: the stored slot keeps its declared type, the use site gets the
/// extension.
fn widen_value(ctx: &mut CodegenContext, value: Value, source: &Type, annotated: &Type) -> Value {
    let (Some(from), Some(to)) = (source.as_primitive(), annotated.as_primitive()) else {
        return value;
    };
    let (op, to_ir) = match (from, to) {
        (Primitive::Z32, Primitive::Z64) => (CastOp::Sext, IrType::I64),
        (Primitive::N32, Primitive::N64) => (CastOp::Zext, IrType::I64),
        (Primitive::R32, Primitive::R64) => (CastOp::Fpext, IrType::Double),
        _ => return value,
    };
    ctx.emit_value(InstrKind::Cast { op, value, to: to_ir.clone() }, to_ir)
}

fn const_number(raw: &str, ty: Primitive, pos: Position) -> CompileResult<Value> {
    let invalid = || LangError::new(ErrorKind::UnknownExpression).at(pos);
    match ty {
        Primitive::N32 | Primitive::Z32 => {
            let v: i32 = raw.parse().map_err(|_| invalid())?;
            Ok(Value::ConstInt(IrType::I32, v as i64))
        }
        Primitive::N64 | Primitive::Z64 => {
            let v: i64 = raw.parse().map_err(|_| invalid())?;
            Ok(Value::ConstInt(IrType::I64, v))
        }
        Primitive::R32 => {
            let v: f32 = raw.parse().map_err(|_| invalid())?;
            Ok(Value::ConstFloat(IrType::Float, v as f64))
        }
        Primitive::R64 => {
            let v: f64 = raw.parse().map_err(|_| invalid())?;
            Ok(Value::ConstFloat(IrType::Double, v))
        }
        _ => Err(invalid()),
    }
}

fn gen_binary(
    ctx: &mut CodegenContext,
    op: BinOp,
    left: Value,
    right: Value,
    pos: Position,
) -> CompileResult<Value> {
    let ty = left.ty();
    let is_float = ty.is_float();
    let incompatible = LangError::new(ErrorKind::ErrorBinaryExpr(
        left.ty().to_string(),
        right.ty().to_string(),
    ))
    .at(pos);

    let arith = |op: BinaryOp, ctx: &mut CodegenContext, left: Value, right: Value, ty: IrType| {
        let result_ty = ty.clone();
        ctx.emit_value(InstrKind::Binary { op, ty, left, right }, result_ty)
    };

    match op {
        BinOp::Add => {
            let op = if is_float { BinaryOp::FAdd } else { BinaryOp::Add };
            Ok(arith(op, ctx, left, right, ty))
        }
        BinOp::Sub => {
            let op = if is_float { BinaryOp::FSub } else { BinaryOp::Sub };
            Ok(arith(op, ctx, left, right, ty))
        }
        BinOp::Mul => {
            let op = if is_float { BinaryOp::FMul } else { BinaryOp::Mul };
            Ok(arith(op, ctx, left, right, ty))
        }
        BinOp::Div => {
            if is_float {
                Ok(arith(BinaryOp::FDiv, ctx, left, right, ty))
            } else if ty.is_integer() {
                // unsigned operands divide as signed for now
                Ok(arith(BinaryOp::SDiv, ctx, left, right, ty))
            } else {
                Err(incompatible)
            }
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne => {
            if is_float {
                let pred = match op {
                    BinOp::Lt => FloatPredicate::Olt,
                    BinOp::Le => FloatPredicate::Ole,
                    BinOp::Gt => FloatPredicate::Ogt,
                    BinOp::Ge => FloatPredicate::Oge,
                    BinOp::Eq => FloatPredicate::Oeq,
                    _ => FloatPredicate::One,
                };
                Ok(ctx.emit_value(InstrKind::FCmp { pred, ty, left, right }, IrType::I1))
            } else if ty.is_integer() {
                let pred = match op {
                    BinOp::Lt => IntPredicate::Slt,
                    BinOp::Le => IntPredicate::Sle,
                    BinOp::Gt => IntPredicate::Sgt,
                    BinOp::Ge => IntPredicate::Sge,
                    BinOp::Eq => IntPredicate::Eq,
                    _ => IntPredicate::Ne,
                };
                Ok(ctx.emit_value(InstrKind::ICmp { pred, ty, left, right }, IrType::I1))
            } else {
                Err(incompatible)
            }
        }
        BinOp::And => Ok(arith(BinaryOp::And, ctx, left, right, IrType::I1)),
        BinOp::Or => Ok(arith(BinaryOp::Or, ctx, left, right, IrType::I1)),
    }
}

fn gen_call(
    ctx: &mut CodegenContext,
    name: &str,
    arguments: &[Expr],
    return_type: &Type,
    pos: Position,
) -> CompileResult<Value> {
    if name == "in" {
        return gen_print(ctx, arguments, pos);
    }

    let sig = match ctx.signatures.get(name) {
        Some(sig) => sig.clone(),
        None => return Err(LangError::new(ErrorKind::InvalidFunctionCall(name.into())).at(pos)),
    };
    if arguments.len() != sig.param_count {
        return Err(LangError::new(ErrorKind::ArgumentCountMismatch(
            arguments.len(),
            sig.param_count,
            name.into(),
        ))
        .at(pos));
    }

    let mut args = Vec::with_capacity(arguments.len());
    for argument in arguments {
        args.push(gen_expr(ctx, argument)?);
    }

    let kind = InstrKind::Call {
        ret: sig.ret.clone(),
        signature: None,
        callee: sig.emitted_name.clone(),
        args,
    };
    if sig.ret == IrType::Void {
        ctx.emit(Instr { result: None, kind });
        // a void call produces no value; statement position discards this
        return Ok(Value::ConstInt(IrType::I32, 0));
    }
    let value = ctx.emit_value(kind, sig.ret.clone());
    Ok(widen_value(ctx, value, &sig.source_ret, return_type))
}

/// The built-in `in`: pick a format by the argument's lowered type, intern
/// the format string once per format, and call `printf`.
fn gen_print(ctx: &mut CodegenContext, arguments: &[Expr], pos: Position) -> CompileResult<Value> {
    if arguments.len() != 1 {
        return Err(LangError::new(ErrorKind::ArgumentCountMismatch(
            arguments.len(),
            1,
            "in".into(),
        ))
        .at(pos));
    }
    let mut arg = gen_expr(ctx, &arguments[0])?;

    let (fmt, suffix) = match arg.ty() {
        IrType::I32 | IrType::I64 => ("%d", "d"),
        IrType::Float | IrType::Double => ("%f", "f"),
        IrType::Ptr(inner) if *inner == IrType::I8 => ("%s", "s"),
        other => {
            return Err(LangError::new(ErrorKind::TypeMismatch(
                other.to_string(),
                "kiểu in được".into(),
            ))
            .at(pos))
        }
    };
    // C varargs promote float to double
    if arg.ty() == IrType::Float {
        arg = ctx.emit_value(
            InstrKind::Cast { op: CastOp::Fpext, value: arg, to: IrType::Double },
            IrType::Double,
        );
    }

    let mut data = fmt.as_bytes().to_vec();
    data.push(b'\n');
    data.push(0);
    let global = ctx.module.intern_global(&format!("fmtstr_print_{}", suffix), &data);
    let global_ty = match &global {
        Value::Global(_, pointee) => pointee.clone(),
        _ => IrType::array(data.len() as u64, IrType::I8),
    };
    let fmt_ptr = ctx.emit_value(
        InstrKind::GetElementPtr {
            base_ty: global_ty,
            ptr: global,
            indices: vec![Value::ConstInt(IrType::I64, 0), Value::ConstInt(IrType::I64, 0)],
        },
        IrType::ptr(IrType::I8),
    );

    Ok(ctx.emit_value(
        InstrKind::Call {
            ret: IrType::I32,
            signature: Some("i32 (i8*, ...)".into()),
            callee: "printf".into(),
            args: vec![fmt_ptr, arg],
        },
        IrType::I32,
    ))
}

fn gen_cast(
    ctx: &mut CodegenContext,
    target: Primitive,
    argument: &Expr,
    pos: Position,
) -> CompileResult<Value> {
    let value = gen_expr(ctx, argument)?;
    let from = value.ty();
    let to = llvm_type(&Type::Primitive(target)).map_err(|e| e.at(pos))?;

    let bits = |ty: &IrType| match ty {
        IrType::I8 => 8,
        IrType::I32 | IrType::Float => 32,
        IrType::I64 | IrType::Double => 64,
        _ => 0,
    };

    if from == to {
        return Ok(value);
    }
    if from.is_integer() && to.is_integer() {
        let op = if bits(&from) < bits(&to) {
            // unsigned targets zero-extend, signed targets sign-extend
            if target.is_unsigned() { CastOp::Zext } else { CastOp::Sext }
        } else {
            CastOp::Trunc
        };
        return Ok(ctx.emit_value(InstrKind::Cast { op, value, to: to.clone() }, to));
    }
    if from.is_integer() && to.is_float() {
        return Ok(ctx.emit_value(
            InstrKind::Cast { op: CastOp::Sitofp, value, to: to.clone() },
            to,
        ));
    }
    if from.is_float() && to.is_integer() {
        return Ok(ctx.emit_value(
            InstrKind::Cast { op: CastOp::Fptosi, value, to: to.clone() },
            to,
        ));
    }
    if from.is_float() && to.is_float() {
        let op = if bits(&from) < bits(&to) { CastOp::Fpext } else { CastOp::Fptrunc };
        return Ok(ctx.emit_value(InstrKind::Cast { op, value, to: to.clone() }, to));
    }
    Err(LangError::new(ErrorKind::InvalidCasting(from.to_string(), target.name().into())).at(pos))
}

/// Array element access: GEP with the lower bound subtracted, then a load.
fn gen_index(
    ctx: &mut CodegenContext,
    base: &Expr,
    indices: &[Expr],
    element_ty: &Type,
    pos: Position,
) -> CompileResult<Value> {
    let Expr::Identifier { name, .. } = base else {
        return Err(LangError::new(ErrorKind::InvalidArrayAccessType).at(pos));
    };
    let info = match ctx.symbols.get(name) {
        Some(info) => info.clone(),
        None => return Err(LangError::new(ErrorKind::UndeclaredIdentifier(name.clone())).at(pos)),
    };
    let Type::Container { kind, bounds, element, .. } = &info.source else {
        return Err(LangError::new(ErrorKind::InvalidArrayAccessType).at(pos));
    };
    if *kind != ContainerKind::Array {
        return Err(LangError::new(ErrorKind::TypeMismatch(
            info.source.to_string(),
            "kiểu được LLVM hỗ trợ".into(),
        ))
        .at(pos));
    }
    let lo = match const_fold_int(&bounds[0]) {
        Some(lo) => lo,
        None => return Err(LangError::new(ErrorKind::InvalidArrayAccessIndex).at(pos)),
    };

    let index = gen_expr(ctx, &indices[0])?;
    let index_ty = index.ty();
    let adjusted = if lo != 0 {
        ctx.emit_value(
            InstrKind::Binary {
                op: BinaryOp::Sub,
                ty: index_ty.clone(),
                left: index,
                right: Value::ConstInt(index_ty.clone(), lo),
            },
            index_ty,
        )
    } else {
        index
    };

    let source_element = (**element).clone();
    let elem_ir = llvm_type(&source_element).map_err(|e| e.at(pos))?;
    let slot = ctx.emit_value(
        InstrKind::GetElementPtr {
            base_ty: info.ty.clone(),
            ptr: Value::Local(info.alloca.clone(), IrType::ptr(info.ty.clone())),
            indices: vec![Value::ConstInt(IrType::I64, 0), adjusted],
        },
        IrType::ptr(elem_ir.clone()),
    );
    let loaded = ctx.emit_value(InstrKind::Load { ty: elem_ir.clone(), ptr: slot }, elem_ir);
    Ok(widen_value(ctx, loaded, &source_element, element_ty))
}

/// Primitive and one-dimensional array lowering; matrices, hash maps,
/// structs and the char/string primitives have no IR mapping yet.
fn llvm_type(ty: &Type) -> CompileResult<IrType> {
    let unsupported = |ty: &Type| {
        LangError::new(ErrorKind::TypeMismatch(ty.to_string(), "kiểu được LLVM hỗ trợ".into()))
    };
    match ty {
        Type::Primitive(p) => match p {
            Primitive::B1 => Ok(IrType::I1),
            Primitive::N32 | Primitive::Z32 => Ok(IrType::I32),
            Primitive::N64 | Primitive::Z64 => Ok(IrType::I64),
            Primitive::R32 => Ok(IrType::Float),
            Primitive::R64 => Ok(IrType::Double),
            Primitive::Void => Ok(IrType::Void),
            _ => Err(unsupported(ty)),
        },
        Type::Container { kind: ContainerKind::Array, element, bounds, .. } => {
            let element_ir = llvm_type(element)?;
            let (Some(lo), Some(hi)) = (const_fold_int(&bounds[0]), const_fold_int(&bounds[1]))
            else {
                return Err(LangError::new(ErrorKind::InvalidArrayAccessIndex));
            };
            if lo > hi {
                return Err(LangError::new(ErrorKind::InvalidArrayAccessRange(hi, lo, hi)));
            }
            Ok(IrType::array((hi - lo + 1) as u64, element_ir))
        }
        _ => Err(unsupported(ty)),
    }
}
