use std::collections::HashMap;

use crate::ast::{BinOp, Expr, Function, Program, Stmt};
use crate::error::{CompileResult, ErrorKind, LangError};
use crate::token::Position;
use crate::types::{ContainerKind, Primitive, Type};

#[derive(Debug, Clone)]
pub struct FuncSig {
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

/// One link of the scope chain. Variables and functions are distinct
/// namespaces; resolving a variable never falls through to a function.
#[derive(Debug, Default)]
struct Scope {
    variables: HashMap<String, Type>,
    functions: HashMap<String, FuncSig>,
}

pub struct TypeChecker {
    /// Scope chain; index 0 is the global scope with the built-ins.
    scopes: Vec<Scope>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        let mut global = Scope::default();
        global.functions.insert(
            "in".into(),
            FuncSig {
                parameters: vec![Type::Primitive(Primitive::Any)],
                return_type: Type::Primitive(Primitive::Z32),
            },
        );
        Self { scopes: vec![global] }
    }

    /// Declares every top-level signature before checking any body, so
    /// forward references and mutual recursion resolve.
    pub fn analyze_program(&mut self, program: &mut Program) -> CompileResult<()> {
        for function in &program.functions {
            let sig = FuncSig {
                parameters: function.parameters.iter().map(|p| p.ty.clone()).collect(),
                return_type: function.return_type.clone(),
            };
            let global = &mut self.scopes[0];
            if global.functions.contains_key(&function.name) {
                return Err(LangError::new(ErrorKind::RedeclarationFunction(function.name.clone()))
                    .at(function.pos));
            }
            global.functions.insert(function.name.clone(), sig);
        }

        for function in &mut program.functions {
            self.check_function(function)?;
        }
        Ok(())
    }

    fn check_function(&mut self, function: &mut Function) -> CompileResult<()> {
        self.scopes.push(Scope::default());
        let result = self.check_function_inner(function);
        self.scopes.pop();
        result
    }

    fn check_function_inner(&mut self, function: &mut Function) -> CompileResult<()> {
        for param in &function.parameters {
            self.validate_declared_type(&param.ty, param.pos)?;
            self.declare_variable(&param.name, param.ty.clone(), param.pos)?;
        }
        let expected = function.return_type.clone();
        for stmt in &mut function.body {
            self.check_stmt(stmt, &expected)?;
        }
        Ok(())
    }

    fn declare_variable(&mut self, name: &str, ty: Type, pos: Position) -> CompileResult<()> {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.variables.contains_key(name) {
                return Err(LangError::new(ErrorKind::RedeclarationVar(name.into())).at(pos));
            }
            scope.variables.insert(name.into(), ty);
        }
        Ok(())
    }

    fn resolve_variable(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|scope| scope.variables.get(name))
    }

    fn resolve_function(&self, name: &str) -> Option<&FuncSig> {
        self.scopes.iter().rev().find_map(|scope| scope.functions.get(name))
    }

    fn check_stmt(&mut self, stmt: &mut Stmt, expected_return: &Type) -> CompileResult<()> {
        match stmt {
            Stmt::VarDecl { var, value, pos } => {
                self.validate_declared_type(&var.ty, *pos)?;
                if !matches!(value, Expr::Uninitialized { .. }) {
                    self.check_expr(value)?;
                    self.coerce_expr(value, &var.ty).map_err(|e| e.at(*pos))?;
                }
                self.declare_variable(&var.name, var.ty.clone(), var.pos)
            }
            Stmt::Return { value, pos } => match value {
                Some(expr) => {
                    self.check_expr(expr)?;
                    self.coerce_expr(expr, expected_return).map_err(|e| {
                        let kind = match e.kind {
                            ErrorKind::TypeMismatch(found, want) => {
                                ErrorKind::ReturnTypeMismatch(found, want)
                            }
                            other => other,
                        };
                        LangError::new(kind).at(*pos)
                    })
                }
                None => {
                    if *expected_return != Type::Primitive(Primitive::Void) {
                        return Err(LangError::new(ErrorKind::ReturnTypeMismatch(
                            Primitive::Void.name().into(),
                            expected_return.to_string(),
                        ))
                        .at(*pos));
                    }
                    Ok(())
                }
            },
            Stmt::If { condition, then_block, else_block, .. } => {
                self.check_expr(condition)?;
                // B1 branches directly; integers compare against zero
                match condition.ty() {
                    Type::Primitive(p) if p == Primitive::B1 || p.is_integer() => {}
                    other => {
                        return Err(LangError::new(ErrorKind::TypeMismatch(
                            other.to_string(),
                            Primitive::B1.name().into(),
                        ))
                        .at(condition.pos()))
                    }
                }
                for s in then_block {
                    self.check_stmt(s, expected_return)?;
                }
                for s in else_block {
                    self.check_stmt(s, expected_return)?;
                }
                Ok(())
            }
            Stmt::Expr { expr, .. } => {
                self.check_expr(expr)?;
                Ok(())
            }
        }
    }

    fn check_expr(&mut self, expr: &mut Expr) -> CompileResult<Type> {
        match expr {
            Expr::Identifier { name, ty, pos } => {
                if let Some(var_ty) = self.resolve_variable(name) {
                    *ty = var_ty.clone();
                    return Ok(ty.clone());
                }
                if self.resolve_function(name).is_some() {
                    return Err(LangError::new(ErrorKind::InvalidIdentifierUsage(name.clone()))
                        .at(*pos));
                }
                Err(LangError::new(ErrorKind::UndeclaredIdentifier(name.clone())).at(*pos))
            }
            Expr::Number { ty, .. } => Ok(Type::Primitive(*ty)),
            Expr::Binary { left, op, right, ty, pos } => {
                self.check_expr(left)?;
                self.check_expr(right)?;
                let op = *op;
                let pos = *pos;
                if op.is_logical() {
                    for side in [left.as_mut(), right.as_mut()] {
                        if side.ty() != Type::Primitive(Primitive::B1) {
                            return Err(LangError::new(ErrorKind::TypeMismatch(
                                side.ty().to_string(),
                                Primitive::B1.name().into(),
                            ))
                            .at(side.pos()));
                        }
                    }
                    *ty = Type::Primitive(Primitive::B1);
                } else {
                    let unified = self.unify_operands(left, right, pos)?;
                    *ty = if op.is_comparison() {
                        Type::Primitive(Primitive::B1)
                    } else {
                        Type::Primitive(unified)
                    };
                }
                Ok(ty.clone())
            }
            Expr::Call { name, arguments, return_type, pos } => {
                let sig = match self.resolve_function(name) {
                    Some(sig) => sig.clone(),
                    None => {
                        return Err(LangError::new(ErrorKind::InvalidFunctionCall(name.clone()))
                            .at(*pos))
                    }
                };
                if sig.parameters.len() != arguments.len() {
                    return Err(LangError::new(ErrorKind::ArgumentCountMismatch(
                        arguments.len(),
                        sig.parameters.len(),
                        name.clone(),
                    ))
                    .at(*pos));
                }
                for (argument, param_ty) in arguments.iter_mut().zip(sig.parameters.iter()) {
                    self.check_expr(argument)?;
                    if *param_ty == Type::Primitive(Primitive::Any) {
                        continue;
                    }
                    let found = argument.ty();
                    self.coerce_expr(argument, param_ty).map_err(|_| {
                        LangError::new(ErrorKind::ArgumentTypeMismatch(
                            found.to_string(),
                            param_ty.to_string(),
                        ))
                        .at(argument.pos())
                    })?;
                }
                *return_type = sig.return_type.clone();
                Ok(return_type.clone())
            }
            Expr::Cast { target, argument, pos } => {
                let source = self.check_expr(argument)?;
                match source.as_primitive() {
                    Some(p) if p.is_numeric() && target.is_numeric() => {
                        Ok(Type::Primitive(*target))
                    }
                    _ => Err(LangError::new(ErrorKind::InvalidCasting(
                        source.to_string(),
                        target.name().into(),
                    ))
                    .at(*pos)),
                }
            }
            Expr::ArrayLiteral { elements, ty, pos } => {
                let pos = *pos;
                if elements.is_empty() {
                    return Err(LangError::new(ErrorKind::UnknownExpression).at(pos));
                }
                let element_ty = {
                    let (first, rest) = elements.split_at_mut(1);
                    let element_ty = self.check_expr(&mut first[0])?;
                    for element in rest {
                        self.check_expr(element)?;
                        self.coerce_expr(element, &element_ty)
                            .map_err(|e| e.at(element.pos()))?;
                    }
                    element_ty
                };
                let upper = elements.len() as i64 - 1;
                *ty = Type::Container {
                    kind: ContainerKind::Array,
                    element: Box::new(element_ty),
                    dimensions: 1,
                    bounds: vec![integer_literal(0, pos), integer_literal(upper, pos)],
                };
                Ok(ty.clone())
            }
            Expr::Index { base, indices, ty, pos } => {
                let base_ty = self.check_expr(base)?;
                let Type::Container { kind, element, dimensions, bounds } = base_ty else {
                    return Err(LangError::new(ErrorKind::InvalidArrayAccessType).at(*pos));
                };
                if indices.len() > dimensions {
                    return Err(LangError::new(ErrorKind::InvalidArrayAccessDim(
                        indices.len(),
                        dimensions,
                    ))
                    .at(*pos));
                }
                for (axis, index) in indices.iter_mut().enumerate() {
                    self.check_expr(index)?;
                    match index.ty() {
                        Type::Primitive(p) if p.is_integer() => {}
                        _ => {
                            return Err(LangError::new(ErrorKind::InvalidArrayAccessIndex)
                                .at(index.pos()))
                        }
                    }
                    // constant indices are checked against constant bounds
                    if let (Some(value), Some(lo), Some(hi)) = (
                        const_fold_int(index),
                        const_fold_int(&bounds[2 * axis]),
                        const_fold_int(&bounds[2 * axis + 1]),
                    ) {
                        if value < lo || value > hi {
                            return Err(LangError::new(ErrorKind::InvalidArrayAccessRange(
                                value, lo, hi,
                            ))
                            .at(index.pos()));
                        }
                    }
                }
                // a shorter group peels the leading axes; a nested index
                // then consumes the remainder one dimension at a time
                *ty = if indices.len() == dimensions {
                    (*element).clone()
                } else {
                    Type::Container {
                        kind,
                        element,
                        dimensions: dimensions - indices.len(),
                        bounds: bounds[2 * indices.len()..].to_vec(),
                    }
                };
                Ok(ty.clone())
            }
            Expr::Uninitialized { .. } => Ok(Type::Unknown),
        }
    }

    /// Rejects struct-typed declarations (not wired through yet) and folds
    /// container bounds: integer constants with `lo <= hi` per axis.
    fn validate_declared_type(&self, ty: &Type, pos: Position) -> CompileResult<()> {
        match ty {
            Type::Unknown => Err(LangError::new(ErrorKind::UnknownIdentifierType).at(pos)),
            Type::Primitive(_) => Ok(()),
            Type::Struct { .. } => {
                Err(LangError::new(ErrorKind::UnknownIdentifierType).at(pos))
            }
            Type::Container { element, dimensions, bounds, .. } => {
                for axis in 0..*dimensions {
                    let lo = const_fold_int(&bounds[2 * axis]);
                    let hi = const_fold_int(&bounds[2 * axis + 1]);
                    let (Some(lo), Some(hi)) = (lo, hi) else {
                        return Err(LangError::new(ErrorKind::InvalidArrayAccessIndex).at(pos));
                    };
                    if lo > hi {
                        return Err(LangError::new(ErrorKind::InvalidArrayAccessRange(hi, lo, hi))
                            .at(pos));
                    }
                }
                self.validate_declared_type(element, pos)
            }
        }
    }

    /// Applies the cast policy to make `expr` assignable to `target`:
    /// literal narrowing first, then implicit widening. Errors carry no
    /// position; callers attach the statement position.
    fn coerce_expr(&mut self, expr: &mut Expr, target: &Type) -> CompileResult<()> {
        let mismatch = |found: &Type, want: &Type| {
            LangError::new(ErrorKind::TypeMismatch(found.to_string(), want.to_string()))
        };
        match target {
            Type::Primitive(want) => {
                let found = expr.ty();
                let Some(have) = found.as_primitive() else {
                    return Err(mismatch(&found, target));
                };
                if have == *want {
                    return Ok(());
                }
                if is_const_foldable(expr)
                    && have.narrows_to(*want)
                    && !(want.is_integer() && literal_contains_dot(expr))
                {
                    retype_literal(expr, *want);
                    return Ok(());
                }
                if have.widens_to(*want) && widenable_node(expr) {
                    cast_expr(expr, *want);
                    return Ok(());
                }
                Err(mismatch(&found, target))
            }
            Type::Container { kind, element, dimensions, bounds } => {
                if let Expr::ArrayLiteral { elements, ty, .. } = expr {
                    if *kind != ContainerKind::Array {
                        return Err(mismatch(&ty.clone(), target));
                    }
                    let (Some(lo), Some(hi)) =
                        (const_fold_int(&bounds[0]), const_fold_int(&bounds[1]))
                    else {
                        return Err(mismatch(&ty.clone(), target));
                    };
                    // the element count must fill [lo..hi] exactly
                    if elements.len() as i64 != hi - lo + 1 {
                        return Err(mismatch(&ty.clone(), target));
                    }
                    for el in elements.iter_mut() {
                        self.coerce_expr(el, element)?;
                    }
                    *ty = target.clone();
                    return Ok(());
                }
                // container-typed expression: element-wise widening
                let found = expr.ty();
                let Type::Container {
                    kind: have_kind,
                    element: have_element,
                    dimensions: have_dims,
                    bounds: have_bounds,
                } = &found
                else {
                    return Err(mismatch(&found, target));
                };
                if have_kind != kind || have_dims != dimensions {
                    return Err(mismatch(&found, target));
                }
                for axis in 0..*dimensions {
                    let have_len = axis_length(have_bounds, axis);
                    let want_len = axis_length(bounds, axis);
                    if have_len.is_none() || have_len != want_len {
                        return Err(mismatch(&found, target));
                    }
                }
                match (have_element.as_primitive(), element.as_primitive()) {
                    (Some(have), Some(want)) if have.widens_to(want) => Ok(()),
                    _ => Err(mismatch(&found, target)),
                }
            }
            _ => Err(mismatch(&expr.ty(), target)),
        }
    }

    /// Unifies two operand types for arithmetic or comparison. Both sides
    /// must be numeric; a foldable literal narrows toward the other side,
    /// otherwise the narrower side widens.
    fn unify_operands(
        &mut self,
        left: &mut Expr,
        right: &mut Expr,
        pos: Position,
    ) -> CompileResult<Primitive> {
        let incompatible = |l: &Expr, r: &Expr| {
            LangError::new(ErrorKind::ErrorBinaryExpr(l.ty().to_string(), r.ty().to_string()))
                .at(pos)
        };
        let (Some(lp), Some(rp)) = (left.ty().as_primitive(), right.ty().as_primitive()) else {
            return Err(incompatible(left, right));
        };
        if !lp.is_numeric() || !rp.is_numeric() {
            return Err(incompatible(left, right));
        }
        if lp == rp {
            return Ok(lp);
        }
        if is_const_foldable(right)
            && rp.narrows_to(lp)
            && !(lp.is_integer() && literal_contains_dot(right))
        {
            retype_literal(right, lp);
            return Ok(lp);
        }
        if is_const_foldable(left)
            && lp.narrows_to(rp)
            && !(rp.is_integer() && literal_contains_dot(left))
        {
            retype_literal(left, rp);
            return Ok(rp);
        }
        if lp.widens_to(rp) && widenable_node(left) {
            cast_expr(left, rp);
            return Ok(rp);
        }
        if rp.widens_to(lp) && widenable_node(right) {
            cast_expr(right, lp);
            return Ok(lp);
        }
        Err(incompatible(left, right))
    }
}

/// Entry point: refines the AST's placeholder types in place.
pub fn analyze(program: &mut Program) -> CompileResult<()> {
    TypeChecker::new().analyze_program(program)
}

fn integer_literal(value: i64, pos: Position) -> Expr {
    Expr::Number { value: value.to_string(), ty: Primitive::Z64, pos }
}

/// A literal, or a binary tree of literals.
fn is_const_foldable(expr: &Expr) -> bool {
    match expr {
        Expr::Number { .. } => true,
        Expr::Binary { left, right, .. } => is_const_foldable(left) && is_const_foldable(right),
        _ => false,
    }
}

/// True when any literal in the tree was written with a decimal point; such
/// values never narrow to an integer type.
fn literal_contains_dot(expr: &Expr) -> bool {
    match expr {
        Expr::Number { value, .. } => value.contains('.'),
        Expr::Binary { left, right, .. } => {
            literal_contains_dot(left) || literal_contains_dot(right)
        }
        _ => false,
    }
}

/// Rewrites the type of a constant-foldable tree in place (literal
/// narrowing; the literal text is re-read at the new type during lowering).
fn retype_literal(expr: &mut Expr, target: Primitive) {
    match expr {
        Expr::Number { ty, .. } => *ty = target,
        Expr::Binary { left, right, ty, .. } => {
            retype_literal(left, target);
            retype_literal(right, target);
            *ty = Type::Primitive(target);
        }
        _ => {}
    }
}

/// An explicit cast pins its own type; every other value-producing node can
/// absorb an implicit widening through its annotation.
fn widenable_node(expr: &Expr) -> bool {
    !matches!(expr, Expr::Cast { .. })
}

/// Applies a widening to an already-checked expression: identifiers, calls
/// and index accesses have their annotation rewritten, literal trees and
/// array literals propagate recursively.
fn cast_expr(expr: &mut Expr, target: Primitive) {
    match expr {
        Expr::Identifier { ty, .. } => *ty = Type::Primitive(target),
        Expr::Call { return_type, .. } => *return_type = Type::Primitive(target),
        Expr::Index { ty, .. } => *ty = Type::Primitive(target),
        Expr::Number { ty, .. } => *ty = target,
        Expr::Binary { left, right, ty, .. } => {
            cast_expr(left, target);
            cast_expr(right, target);
            *ty = Type::Primitive(target);
        }
        Expr::ArrayLiteral { elements, .. } => {
            for element in elements {
                cast_expr(element, target);
            }
        }
        Expr::Cast { .. } | Expr::Uninitialized { .. } => {}
    }
}

/// Folds an integer-typed literal tree to its value; `None` when the tree is
/// not constant (or divides by zero).
pub(crate) fn const_fold_int(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Number { value, ty, .. } if ty.is_integer() => value.parse().ok(),
        Expr::Binary { left, op, right, .. } => {
            let l = const_fold_int(left)?;
            let r = const_fold_int(right)?;
            match op {
                BinOp::Add => l.checked_add(r),
                BinOp::Sub => l.checked_sub(r),
                BinOp::Mul => l.checked_mul(r),
                BinOp::Div => l.checked_div(r),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Constant length of one axis, `hi - lo + 1`.
fn axis_length(bounds: &[Expr], axis: usize) -> Option<i64> {
    let lo = const_fold_int(bounds.get(2 * axis)?)?;
    let hi = const_fold_int(bounds.get(2 * axis + 1)?)?;
    Some(hi - lo + 1)
}
