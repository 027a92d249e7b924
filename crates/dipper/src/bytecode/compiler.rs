//! Lowers a type-annotated AST function into a sealed [`FuncObj`].
//!
//! The compiler walks statements in source order, reserving typed data
//! registers as expression results are discovered. Every expression
//! compilation returns the register index that will hold its result at run
//! time. Control flow is emitted single-pass: branches are emitted with
//! placeholder targets and patched once the join point's index is known.
//! When both operands of a binary expression are literals the operation is
//! evaluated at compile time through the same operator family the VM would
//! use, so folding cannot change semantics.

use super::builder::FuncBuilder;
use super::op::{Opcode, UNUSED};
use crate::ast::{Expr, ExprNode, Function, IfArm, Stmt, StmtNode};
use crate::builtins::Builtin;
use crate::errors::{CompileError, SourcePos};
use crate::function::{FuncObj, Param};
use crate::module::{Module, NameKind};
use crate::ops::{ArithOp, CmpOp};
use crate::value::{Kind, StructDef, Value};

/// Stream index literals baked into `WRITE*` instructions.
const STDOUT: i32 = 1;

/// ASCII space, written between `print` items.
const SPACE: i64 = 32;

pub struct Compiler<'a> {
    module: &'a Module,
    b: FuncBuilder,
    /// Register holding the separator code point, reserved on first use.
    space_slot: Option<usize>,
}

impl<'a> Compiler<'a> {
    /// Compiles one AST function against the enclosing module and returns
    /// the sealed function object.
    pub fn compile_function(
        filename: &str,
        func: &Function,
        module: &'a Module,
    ) -> Result<FuncObj, CompileError> {
        let params = func
            .args
            .iter()
            .map(|arg| Param::new(&arg.name, &arg.ty))
            .collect();
        let mut compiler = Self {
            module,
            b: FuncBuilder::new(&func.name, filename, params, &func.return_type),
            space_slot: None,
        };
        compiler.b.set_location(func.pos);
        compiler.compile_block(&func.body)?;
        Ok(compiler.b.seal())
    }

    fn compile_block(&mut self, body: &[StmtNode]) -> Result<(), CompileError> {
        for node in body {
            self.compile_stmt(node)?;
        }
        Ok(())
    }

    // ==================================================================
    // Statements
    // ==================================================================

    fn compile_stmt(&mut self, node: &StmtNode) -> Result<(), CompileError> {
        self.b.set_location(node.pos);
        match &node.stmt {
            Stmt::Assign { name, ty, value } => {
                let idx = self.compile_expr(value)?;
                if let Some(declared) = ty {
                    self.check_declared_type(declared, idx, node.pos)?;
                }
                self.b.bind(name, idx);
                Ok(())
            }

            Stmt::Inplace { name, op, value } => {
                let var_idx = self.resolve_name(name, node.pos)?;
                let rhs_idx = self.compile_expr(value)?;
                self.b.set_location(node.pos);
                self.b
                    .emit((*op).into(), var_idx as i32, rhs_idx as i32, var_idx as i32);
                Ok(())
            }

            Stmt::Call(call) => {
                self.compile_expr(call)?;
                Ok(())
            }

            Stmt::Print { items, newline } => self.compile_print(items, *newline, node.pos),

            Stmt::Return(value) => {
                let idx = match value {
                    Some(expr) => self.compile_expr(expr)? as i32,
                    None => UNUSED,
                };
                self.b.set_location(node.pos);
                self.b.emit(Opcode::Ret, idx, UNUSED, UNUSED);
                Ok(())
            }

            Stmt::If { arms, else_body } => self.compile_if(arms, else_body.as_deref()),

            Stmt::For {
                var,
                start,
                end,
                body,
            } => self.compile_for(var, start, end, body, node.pos),
        }
    }

    fn compile_print(
        &mut self,
        items: &[ExprNode],
        newline: bool,
        pos: SourcePos,
    ) -> Result<(), CompileError> {
        if items.is_empty() {
            self.b.emit(Opcode::Writenl, STDOUT, UNUSED, UNUSED);
            return Ok(());
        }
        for (i, item) in items.iter().enumerate() {
            let idx = self.compile_expr(item)?;
            self.b.set_location(pos);
            self.b.emit(Opcode::Writeo, STDOUT, idx as i32, UNUSED);
            if i < items.len() - 1 {
                let space = match self.space_slot {
                    Some(idx) => idx,
                    None => {
                        let idx = self.b.reserve(Value::Int(SPACE));
                        self.space_slot = Some(idx);
                        idx
                    }
                };
                self.b.emit(Opcode::Writei, STDOUT, space as i32, UNUSED);
            }
        }
        if newline {
            self.b.emit(Opcode::Writenl, STDOUT, UNUSED, UNUSED);
        }
        Ok(())
    }

    /// Lowers an `if`/`elif`/`else` chain.
    ///
    /// Each arm's condition falls through into its block and branches ahead
    /// (`BF`) when false; the branch target is patched when the next arm or
    /// the end label is emitted. Every block except the last jumps to the
    /// shared end label.
    fn compile_if(
        &mut self,
        arms: &[IfArm],
        else_body: Option<&[StmtNode]>,
    ) -> Result<(), CompileError> {
        self.b.emit_label("if");
        let mut pending_bf = 0;
        let mut end_jumps = Vec::new();

        for (i, arm) in arms.iter().enumerate() {
            if i > 0 {
                let start = self.b.emit_label("elif");
                self.b.set_branch(pending_bf, start)?;
            }
            self.b.set_location(arm.pos);
            let cond_idx = self.compile_expr(&arm.cond)?;
            self.b.set_location(arm.pos);
            pending_bf = self.b.emit(Opcode::Bf, cond_idx as i32, UNUSED, UNUSED);

            self.compile_block(&arm.body)?;

            let last_block = i == arms.len() - 1 && else_body.is_none();
            if !last_block {
                end_jumps.push(self.b.emit(Opcode::Jmp, UNUSED, UNUSED, UNUSED));
            }
        }

        let has_else = if let Some(body) = else_body {
            let start = self.b.emit_label("else");
            self.b.set_branch(pending_bf, start)?;
            self.compile_block(body)?;
            true
        } else {
            false
        };

        let end = self.b.emit_label("end if");
        if !has_else {
            self.b.set_branch(pending_bf, end)?;
        }
        for ptr in end_jumps {
            self.b.set_branch(ptr, end)?;
        }
        Ok(())
    }

    /// Lowers `for var in start..end { body }` as a counted loop: seed the
    /// loop register, run the body, increment, and branch back while the
    /// counter differs from the end bound.
    fn compile_for(
        &mut self,
        var: &str,
        start: &ExprNode,
        end: &ExprNode,
        body: &[StmtNode],
        pos: SourcePos,
    ) -> Result<(), CompileError> {
        let start_idx = self.compile_expr(start)?;
        let end_idx = self.compile_expr(end)?;
        for (label, idx) in [("start", start_idx), ("end", end_idx)] {
            if self.b.slot_kind(idx) != Kind::Int {
                return Err(CompileError::new(
                    format!(
                        "for-loop range {label} must be an integer (got {})",
                        self.b.slot_kind(idx)
                    ),
                    pos,
                ));
            }
        }

        let loop_idx = self.b.reserve(Value::Int(0));
        self.b.bind(var, loop_idx);
        self.b.set_location(pos);
        self.b.emit(Opcode::Set, start_idx as i32, loop_idx as i32, UNUSED);
        let top = self.b.emit_label(format!("for {var}"));

        self.compile_block(body)?;

        self.b.set_location(pos);
        self.b.emit(Opcode::Addi, loop_idx as i32, 1, UNUSED);
        self.b
            .emit(Opcode::Bne, loop_idx as i32, end_idx as i32, top as i32);
        Ok(())
    }

    // ==================================================================
    // Expressions
    // ==================================================================

    /// Compiles an expression and returns the index of the register that
    /// will hold its result.
    fn compile_expr(&mut self, node: &ExprNode) -> Result<usize, CompileError> {
        self.b.set_location(node.pos);
        match &node.expr {
            Expr::Int(v) => Ok(self.b.reserve(Value::Int(*v))),
            Expr::Float(v) => Ok(self.b.reserve(Value::Float(*v))),
            Expr::Str(s) => Ok(self.b.reserve(Value::Str(s.clone()))),

            Expr::Name(name) => self.resolve_name(name, node.pos),

            Expr::Arith { lhs, op, rhs } => self.compile_arith(lhs, *op, rhs, node.pos),
            Expr::Compare { lhs, op, rhs } => self.compile_compare(lhs, *op, rhs, node.pos),

            Expr::Call { target, args } => self.compile_call(target, args, node.pos),
        }
    }

    fn compile_arith(
        &mut self,
        lhs: &ExprNode,
        op: ArithOp,
        rhs: &ExprNode,
        pos: SourcePos,
    ) -> Result<usize, CompileError> {
        // Both operands literal: evaluate now and reserve the result.
        if let (Some(a), Some(b)) = (literal_value(lhs), literal_value(rhs)) {
            let folded = fold_arith(&a, op, &b, pos)?;
            return Ok(self.b.reserve(folded));
        }

        let a_idx = self.compile_expr(lhs)?;
        let b_idx = self.compile_expr(rhs)?;
        let result = self.arith_result_slot(op, a_idx, b_idx, pos)?;
        self.b.set_location(pos);
        self.b
            .emit(op.into(), a_idx as i32, b_idx as i32, result as i32);
        Ok(result)
    }

    /// Reserves the result register for an arithmetic expression, inferring
    /// its type from the operand registers: string concat if either side is
    /// a string, list concat if either is a list, float if either is a
    /// float, int otherwise. Unknown (`auto`) operands default to int.
    fn arith_result_slot(
        &mut self,
        op: ArithOp,
        a_idx: usize,
        b_idx: usize,
        pos: SourcePos,
    ) -> Result<usize, CompileError> {
        let lk = self.b.slot_kind(a_idx);
        let rk = self.b.slot_kind(b_idx);
        let unsupported = || {
            CompileError::new(
                format!("unsupported operator '{op}' for types {lk} and {rk}"),
                pos,
            )
        };
        let concat_only = |slot: Value, b: &mut FuncBuilder| {
            if op == ArithOp::Add {
                Ok(b.reserve(slot))
            } else {
                Err(unsupported())
            }
        };
        match (lk, rk) {
            (Kind::Str, Kind::Str | Kind::Null) | (Kind::Null, Kind::Str) => {
                concat_only(Value::Str(String::new()), &mut self.b)
            }
            (Kind::List, Kind::List | Kind::Null) | (Kind::Null, Kind::List) => {
                concat_only(Value::List(Vec::new()), &mut self.b)
            }
            (Kind::Float, Kind::Float | Kind::Int | Kind::Null)
            | (Kind::Int | Kind::Null, Kind::Float) => Ok(self.b.reserve(Value::Float(0.0))),
            (Kind::Int | Kind::Null, Kind::Int | Kind::Null) => {
                Ok(self.b.reserve(Value::Int(0)))
            }
            _ => Err(unsupported()),
        }
    }

    fn compile_compare(
        &mut self,
        lhs: &ExprNode,
        op: CmpOp,
        rhs: &ExprNode,
        pos: SourcePos,
    ) -> Result<usize, CompileError> {
        if let (Some(a), Some(b)) = (literal_value(lhs), literal_value(rhs)) {
            let folded = a
                .op_bool(op, &b)
                .map_err(|e| CompileError::new(e.to_string(), pos))?;
            return Ok(self.b.reserve(Value::Bool(folded)));
        }

        let a_idx = self.compile_expr(lhs)?;
        let b_idx = self.compile_expr(rhs)?;
        self.check_comparable(op, a_idx, b_idx, pos)?;
        let result = self.b.reserve(Value::Bool(false));
        self.b.set_location(pos);
        self.b
            .emit(op.into(), a_idx as i32, b_idx as i32, result as i32);
        Ok(result)
    }

    fn check_comparable(
        &self,
        op: CmpOp,
        a_idx: usize,
        b_idx: usize,
        pos: SourcePos,
    ) -> Result<(), CompileError> {
        let lk = self.b.slot_kind(a_idx);
        let rk = self.b.slot_kind(b_idx);
        let numeric = |k: Kind| matches!(k, Kind::Int | Kind::Float | Kind::Null);
        let legal = if op.is_equality() {
            lk == rk || lk == Kind::Null || rk == Kind::Null || (numeric(lk) && numeric(rk))
        } else {
            numeric(lk) && numeric(rk)
        };
        if legal {
            Ok(())
        } else {
            Err(CompileError::new(
                format!("unsupported operator '{op}' for types {lk} and {rk}"),
                pos,
            ))
        }
    }

    /// Compiles a call. Builtins lower to their specialized opcodes;
    /// everything else resolves through the enclosing module to either a
    /// function call or a struct construction, both emitted as `CALL`.
    fn compile_call(
        &mut self,
        target: &str,
        args: &[ExprNode],
        pos: SourcePos,
    ) -> Result<usize, CompileError> {
        let name = last_segment(target);

        if let Some(builtin) = Builtin::lookup(name) {
            return self.compile_builtin(builtin, args, pos);
        }

        let (arity, ret_value) = match self.module.kind_of(name) {
            NameKind::Func => {
                let proto = self.module.get_func(name).expect("kind_of said func");
                let ret = self.type_default(&proto.return_type.clone(), pos)?;
                (proto.arity(), ret)
            }
            NameKind::Struct => {
                let def = self.module.get_struct(name).expect("kind_of said struct");
                (def.fields.len(), Value::Struct(StructDef::instantiate(def)))
            }
            _ => {
                return Err(CompileError::new(
                    format!("unknown function or struct '{name}'"),
                    pos,
                ))
            }
        };

        if args.len() != arity {
            return Err(CompileError::new(
                format!(
                    "wrong number of arguments for {name}: expected {arity}, got {}",
                    args.len()
                ),
                pos,
            ));
        }

        let mut arg_idxs = Vec::with_capacity(args.len());
        for arg in args {
            arg_idxs.push(self.compile_expr(arg)?);
        }

        let list_idx = self.b.reserve(Value::List(Vec::new()));
        self.b.set_location(pos);
        // reset the args list so call sites inside loops don't accumulate
        self.b.emit(Opcode::ListNew, list_idx as i32, UNUSED, UNUSED);
        for arg_idx in arg_idxs {
            self.b
                .emit(Opcode::ListAdd, list_idx as i32, arg_idx as i32, UNUSED);
        }
        let name_idx = self.b.reserve(Value::Str(name.to_owned()));
        let ret_idx = self.b.reserve(ret_value);
        self.b
            .emit(Opcode::Call, name_idx as i32, list_idx as i32, ret_idx as i32);
        Ok(ret_idx)
    }

    fn compile_builtin(
        &mut self,
        builtin: Builtin,
        args: &[ExprNode],
        pos: SourcePos,
    ) -> Result<usize, CompileError> {
        if args.len() != builtin.arity() {
            return Err(CompileError::new(
                format!(
                    "wrong number of arguments for {builtin}: expected {}, got {}",
                    builtin.arity(),
                    args.len()
                ),
                pos,
            ));
        }
        let arg_idx = self.compile_expr(&args[0])?;
        self.b.set_location(pos);
        match builtin {
            Builtin::Len => {
                let result = self.b.reserve(Value::Int(0));
                self.b.emit(Opcode::Len, arg_idx as i32, result as i32, UNUSED);
                Ok(result)
            }
            Builtin::Sqrt => {
                let result = self.b.reserve(Value::Float(0.0));
                self.b.emit(Opcode::Sqrt, arg_idx as i32, result as i32, UNUSED);
                Ok(result)
            }
        }
    }

    // ==================================================================
    // Helpers
    // ==================================================================

    fn resolve_name(&self, name: &str, pos: SourcePos) -> Result<usize, CompileError> {
        self.b
            .lookup(last_segment(name))
            .ok_or_else(|| CompileError::new(format!("variable '{name}' not defined"), pos))
    }

    /// The default value for a declared type name, resolving struct names
    /// through the module.
    fn type_default(&self, ty: &str, pos: SourcePos) -> Result<Value, CompileError> {
        if let Some(value) = Value::default_for_type(ty) {
            return Ok(value);
        }
        match self.module.get_struct(ty) {
            Some(def) => Ok(Value::Struct(StructDef::instantiate(def))),
            None => Err(CompileError::new(format!("unknown type '{ty}'"), pos)),
        }
    }

    fn check_declared_type(
        &self,
        declared: &str,
        idx: usize,
        pos: SourcePos,
    ) -> Result<(), CompileError> {
        let value = self.b.template_value(idx);
        let inferred = value.kind();
        if inferred == Kind::Null {
            // unknown at compile time; the runtime assigns will catch it
            return Ok(());
        }
        if crate::value::type_accepts(declared, value) {
            Ok(())
        } else {
            Err(CompileError::new(
                format!("declared type '{declared}' does not match expression type '{inferred}'"),
                pos,
            ))
        }
    }
}

/// The value of a literal expression, if the node is one.
fn literal_value(node: &ExprNode) -> Option<Value> {
    match &node.expr {
        Expr::Int(v) => Some(Value::Int(*v)),
        Expr::Float(v) => Some(Value::Float(*v)),
        Expr::Str(s) => Some(Value::Str(s.clone())),
        _ => None,
    }
}

/// Evaluates `a op b` at compile time via the operator family the result
/// kind dictates: string concat if either side is a string, float if either
/// is a float, int otherwise.
fn fold_arith(a: &Value, op: ArithOp, b: &Value, pos: SourcePos) -> Result<Value, CompileError> {
    let result = if a.kind() == Kind::Str || b.kind() == Kind::Str {
        a.op_str(op, b).map(Value::Str)
    } else if a.kind() == Kind::Float || b.kind() == Kind::Float {
        a.op_float(op, b).map(Value::Float)
    } else {
        a.op_int(op, b).map(Value::Int)
    };
    result.map_err(|e| CompileError::new(e.to_string(), pos))
}

/// The final component of a (possibly dotted) name.
fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast;
    use crate::bytecode::Instr;
    use pretty_assertions::assert_eq;

    fn pos() -> SourcePos {
        SourcePos::new(1, 1)
    }

    fn expr(e: Expr) -> ExprNode {
        ExprNode { expr: e, pos: pos() }
    }

    fn stmt(s: Stmt) -> StmtNode {
        StmtNode { stmt: s, pos: pos() }
    }

    fn int(v: i64) -> ExprNode {
        expr(Expr::Int(v))
    }

    fn func_with_body(body: Vec<StmtNode>) -> ast::Function {
        ast::Function {
            name: "main".to_owned(),
            args: vec![],
            return_type: "auto".to_owned(),
            body,
            pos: pos(),
        }
    }

    fn compile(body: Vec<StmtNode>) -> FuncObj {
        let module = Module::new("test");
        Compiler::compile_function("<test>", &func_with_body(body), &module).unwrap()
    }

    #[test]
    fn literal_pair_is_folded() {
        let func = compile(vec![stmt(Stmt::Return(Some(expr(Expr::Arith {
            lhs: Box::new(int(5)),
            op: ArithOp::Add,
            rhs: Box::new(int(5)),
        }))))]);
        // one folded constant, no ADD instruction
        assert!(func.bytecode.iter().all(|i| i.op != Opcode::Add));
        assert_eq!(func.template.len(), 1);
        assert_eq!(func.template[0].as_int().unwrap(), 10);
    }

    #[test]
    fn variable_operand_is_not_folded() {
        let func = compile(vec![
            stmt(Stmt::Assign {
                name: "x".to_owned(),
                ty: None,
                value: int(5),
            }),
            stmt(Stmt::Return(Some(expr(Expr::Arith {
                lhs: Box::new(expr(Expr::Name("x".to_owned()))),
                op: ArithOp::Add,
                rhs: Box::new(int(1)),
            })))),
        ]);
        assert!(func.bytecode.iter().any(|i| i.op == Opcode::Add));
    }

    #[test]
    fn unknown_variable_is_a_compile_error() {
        let module = Module::new("test");
        let func = func_with_body(vec![stmt(Stmt::Return(Some(expr(Expr::Name(
            "nope".to_owned(),
        )))))]);
        let err = Compiler::compile_function("<test>", &func, &module).unwrap_err();
        assert!(err.message.contains("nope"));
    }

    #[test]
    fn unknown_callee_is_a_compile_error() {
        let module = Module::new("test");
        let func = func_with_body(vec![stmt(Stmt::Call(expr(Expr::Call {
            target: "missing".to_owned(),
            args: vec![],
        })))]);
        assert!(Compiler::compile_function("<test>", &func, &module).is_err());
    }

    #[test]
    fn string_minus_string_is_rejected() {
        let func = func_with_body(vec![
            stmt(Stmt::Assign {
                name: "s".to_owned(),
                ty: None,
                value: expr(Expr::Str("a".to_owned())),
            }),
            stmt(Stmt::Return(Some(expr(Expr::Arith {
                lhs: Box::new(expr(Expr::Name("s".to_owned()))),
                op: ArithOp::Sub,
                rhs: Box::new(expr(Expr::Name("s".to_owned()))),
            })))),
        ]);
        let module = Module::new("test");
        assert!(Compiler::compile_function("<test>", &func, &module).is_err());
    }

    #[test]
    fn every_function_ends_with_ret() {
        let func = compile(vec![stmt(Stmt::Print {
            items: vec![],
            newline: true,
        })]);
        assert_eq!(func.bytecode.last().unwrap().op, Opcode::Ret);
    }

    #[test]
    fn branch_targets_are_patched_in_range() {
        let arm = IfArm {
            cond: expr(Expr::Compare {
                lhs: Box::new(expr(Expr::Name("x".to_owned()))),
                op: CmpOp::Gt,
                rhs: Box::new(int(1)),
            }),
            body: vec![stmt(Stmt::Return(Some(int(1))))],
            pos: pos(),
        };
        let func = compile(vec![
            stmt(Stmt::Assign {
                name: "x".to_owned(),
                ty: None,
                value: int(5),
            }),
            stmt(Stmt::If {
                arms: vec![arm],
                else_body: Some(vec![stmt(Stmt::Return(Some(int(2))))]),
            }),
        ]);
        for instr in &func.bytecode {
            if let Some(target) = instr.branch_target() {
                assert!(target >= 0, "unpatched branch in {}", instr.render());
                assert!((target as usize) < func.bytecode.len());
            }
        }
    }

    #[test]
    fn shadowing_rebinds_without_touching_old_slot() {
        let func = compile(vec![
            stmt(Stmt::Assign {
                name: "x".to_owned(),
                ty: None,
                value: int(1),
            }),
            stmt(Stmt::Assign {
                name: "x".to_owned(),
                ty: None,
                value: int(2),
            }),
        ]);
        // both literals still live in distinct registers
        assert_eq!(func.template[0].as_int().unwrap(), 1);
        assert_eq!(func.template[1].as_int().unwrap(), 2);
        assert_eq!(func.bindings["x"], 1);
    }

    #[test]
    fn for_loop_shape() {
        let func = compile(vec![stmt(Stmt::For {
            var: "i".to_owned(),
            start: int(0),
            end: int(3),
            body: vec![],
        })]);
        let ops: Vec<Opcode> = func.bytecode.iter().map(|i| i.op).collect();
        assert!(ops.contains(&Opcode::Set));
        assert!(ops.contains(&Opcode::Addi));
        assert!(ops.contains(&Opcode::Bne));
        // the BNE target points at the loop-top label
        let bne: &Instr = func
            .bytecode
            .iter()
            .find(|i| i.op == Opcode::Bne)
            .expect("loop emits BNE");
        assert_eq!(func.bytecode[bne.c as usize].op, Opcode::Label);
    }

    #[test]
    fn for_loop_rejects_non_integer_bounds() {
        let func = func_with_body(vec![stmt(Stmt::For {
            var: "i".to_owned(),
            start: expr(Expr::Str("a".to_owned())),
            end: int(3),
            body: vec![],
        })]);
        let module = Module::new("test");
        assert!(Compiler::compile_function("<test>", &func, &module).is_err());
    }

    #[test]
    fn register_args_are_valid_template_indices() {
        let func = compile(vec![
            stmt(Stmt::Assign {
                name: "x".to_owned(),
                ty: None,
                value: int(5),
            }),
            stmt(Stmt::Print {
                items: vec![expr(Expr::Name("x".to_owned())), int(7)],
                newline: true,
            }),
            stmt(Stmt::Return(Some(expr(Expr::Name("x".to_owned()))))),
        ]);
        for instr in &func.bytecode {
            let skip = instr.op.branch_slot();
            for (slot, arg) in instr.args().iter().enumerate() {
                if Some(slot) == skip || instr.op == Opcode::Writeo && slot == 0 {
                    continue;
                }
                assert!(
                    *arg == UNUSED || (*arg as usize) < func.template.len(),
                    "bad register {arg} in {}",
                    instr.render()
                );
            }
        }
    }
}
