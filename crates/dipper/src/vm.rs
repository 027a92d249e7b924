//! The register-based virtual machine.
//!
//! Execution is strictly single-threaded: one call stack, one instruction
//! pointer per frame, no suspension points. Each frame owns a deep copy of
//! its function's data template; the only mutation crossing frames is the
//! return value written into the caller's designated slot.
//!
//! `PASS` and `LABEL` are skipped during fetch. `CALL` advances the
//! caller's pointer before pushing the callee frame, so the caller resumes
//! past its `CALL` when the callee returns.

use std::rc::Rc;

use log::{trace, warn};

use crate::bytecode::{Instr, Opcode, UNUSED};
use crate::errors::{FrameTrace, RunError, VmError};
use crate::function::FuncObj;
use crate::io::{StreamId, StreamSet};
use crate::module::Module;
use crate::ops::{ArithOp, CmpOp};
use crate::value::{Kind, Value};

/// Hard bound on call depth; exceeding it is fatal.
pub const MAX_CALL_DEPTH: usize = 500_000;

/// An activation record: the function, its live register file, the
/// instruction pointer, and the caller-side slot the next `CALL` from this
/// frame will receive its return value in.
#[derive(Debug)]
pub struct Frame {
    func: Rc<FuncObj>,
    data: Vec<Value>,
    ptr: usize,
    ret_slot: i32,
}

impl Frame {
    /// Builds a frame from a function's template and positional arguments.
    pub fn new(func: Rc<FuncObj>, args: Vec<Value>) -> Result<Self, RunError> {
        let data = func.frame_data(args)?;
        Ok(Self {
            func,
            data,
            ptr: 0,
            ret_slot: UNUSED,
        })
    }
}

/// What the dispatch loop should do after one instruction.
enum Next {
    Advance,
    Jump(usize),
    Push(Frame),
    /// `RET` with its operand register (or -1).
    Return(i32),
    Exit(i32),
}

/// Executes a module's `main` until the call stack empties, `EXIT` runs,
/// or a fatal error occurs.
pub struct VirtualMachine {
    module: Module,
    argv: Vec<String>,
}

impl VirtualMachine {
    #[must_use]
    pub fn new(module: Module, argv: Vec<String>) -> Self {
        Self { module, argv }
    }

    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Runs to completion and returns the exit status: the `EXIT` operand,
    /// or 0 when the outermost frame returns normally.
    pub fn run(&self, streams: &mut impl StreamSet) -> Result<i32, VmError> {
        self.run_observed(streams, |_| {})
    }

    /// Like [`Self::run`], additionally invoking `observer` with the
    /// terminal return value when the outermost frame returns. Used by test
    /// harnesses to extract results.
    pub fn run_observed(
        &self,
        streams: &mut impl StreamSet,
        mut observer: impl FnMut(&Value),
    ) -> Result<i32, VmError> {
        let Some(main) = self.module.get_func("main") else {
            streams
                .write(StreamId::Stderr, b"no main function, exiting\n")
                .map_err(VmError::from)?;
            return Ok(0);
        };
        let args = match main.arity() {
            0 => Vec::new(),
            1 => {
                let argv = self.argv.iter().cloned().map(Value::Str).collect();
                vec![Value::List(argv)]
            }
            _ => return Err(RunError::MainArity.into()),
        };
        let mut stack = vec![Frame::new(Rc::clone(main), args).map_err(VmError::from)?];

        loop {
            let depth = stack.len();
            let frame = stack.last_mut().expect("call stack never runs dry here");

            if frame.func.bytecode.is_empty() {
                warn!("empty frame for '{}'; exiting", frame.func.name);
                return Ok(0);
            }

            // no-ops are skipped during fetch
            while matches!(
                frame.func.bytecode[frame.ptr].op,
                Opcode::Pass | Opcode::Label
            ) {
                frame.ptr += 1;
                if frame.ptr >= frame.func.bytecode.len() {
                    let err = RunError::RanOffEnd(frame.func.name.clone());
                    return Err(VmError::from(err));
                }
            }

            let instr = frame.func.bytecode[frame.ptr];
            trace!("{:>4} {}", frame.ptr, instr.render());

            match Self::exec(&self.module, frame, streams, instr, depth) {
                Ok(Next::Advance) => frame.ptr += 1,
                Ok(Next::Jump(target)) => frame.ptr = target,
                Ok(Next::Push(callee)) => {
                    // the caller resumes past its CALL on return
                    frame.ptr += 1;
                    stack.push(callee);
                }
                Ok(Next::Return(slot)) => {
                    let mut done = stack.pop().expect("RET executed on a live frame");
                    let value = if slot >= 0 {
                        std::mem::replace(&mut done.data[slot as usize], Value::Null)
                    } else {
                        Value::Null
                    };
                    match stack.last_mut() {
                        None => {
                            observer(&value);
                            return Ok(0);
                        }
                        Some(caller) => {
                            if caller.ret_slot >= 0 {
                                caller.data[caller.ret_slot as usize] = value;
                            }
                        }
                    }
                }
                Ok(Next::Exit(status)) => return Ok(status),
                Err(error) => {
                    let trace = trace_of(frame, instr);
                    return Err(VmError {
                        error,
                        trace: Some(trace),
                    });
                }
            }
        }
    }

    /// Executes one instruction against the current frame. `depth` is the
    /// current call-stack depth, checked before pushing a callee frame.
    fn exec(
        module: &Module,
        frame: &mut Frame,
        streams: &mut impl StreamSet,
        instr: Instr,
        depth: usize,
    ) -> Result<Next, RunError> {
        let Instr { op, a, b, c } = instr;
        match op {
            Opcode::Pass | Opcode::Label => Ok(Next::Advance),

            Opcode::Jmp => {
                let target = branch_target(frame, a)?;
                if target <= frame.ptr {
                    // backward transfer: potential trace head (loop start)
                    trace!("trace head candidate: {}:{target}", frame.func.name);
                }
                Ok(Next::Jump(target))
            }

            Opcode::Bt | Opcode::Bf => {
                let cond = reg(&frame.data, a)?.truthy();
                if cond == (op == Opcode::Bt) {
                    Ok(Next::Jump(branch_target(frame, b)?))
                } else {
                    Ok(Next::Advance)
                }
            }

            Opcode::Beq | Opcode::Bne => {
                let cmp = if op == Opcode::Beq { CmpOp::Eq } else { CmpOp::Neq };
                let taken = {
                    let lhs = reg(&frame.data, a)?;
                    let rhs = reg(&frame.data, b)?;
                    lhs.op_bool(cmp, rhs)?
                };
                if taken {
                    let target = branch_target(frame, c)?;
                    if target <= frame.ptr {
                        trace!("trace head candidate: {}:{target}", frame.func.name);
                    }
                    Ok(Next::Jump(target))
                } else {
                    Ok(Next::Advance)
                }
            }

            Opcode::Set => {
                let src = reg(&frame.data, a)?.clone();
                reg_mut(&mut frame.data, b)?.assign_from(&src)?;
                Ok(Next::Advance)
            }

            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                let arith = arith_of(op);
                let kind = reg(&frame.data, c)?.kind();
                let result = {
                    let lhs = reg(&frame.data, a)?;
                    let rhs = reg(&frame.data, b)?;
                    match kind {
                        Kind::Int => Value::Int(lhs.op_int(arith, rhs)?),
                        Kind::Float => Value::Float(lhs.op_float(arith, rhs)?),
                        Kind::Str => Value::Str(lhs.op_str(arith, rhs)?),
                        Kind::List => Value::List(lhs.op_list(arith, rhs)?),
                        other => {
                            return Err(RunError::BadRegister(c, other.name()));
                        }
                    }
                };
                reg_mut(&mut frame.data, c)?.assign_from(&result)?;
                Ok(Next::Advance)
            }

            Opcode::Addi | Opcode::Subi | Opcode::Muli | Opcode::Divi => {
                let lit = i64::from(b);
                let slot = reg_mut(&mut frame.data, a)?;
                let Value::Int(cur) = slot else {
                    return Err(RunError::BadRegister(a, "int"));
                };
                *cur = match op {
                    Opcode::Addi => cur.wrapping_add(lit),
                    Opcode::Subi => cur.wrapping_sub(lit),
                    Opcode::Muli => cur.wrapping_mul(lit),
                    _ => {
                        if lit == 0 {
                            return Err(crate::errors::ValueError::DivisionByZero.into());
                        }
                        cur.wrapping_div(lit)
                    }
                };
                Ok(Next::Advance)
            }

            Opcode::Eq
            | Opcode::Neq
            | Opcode::Gt
            | Opcode::Lt
            | Opcode::Gte
            | Opcode::Lte => {
                let result = {
                    let lhs = reg(&frame.data, a)?;
                    let rhs = reg(&frame.data, b)?;
                    lhs.op_bool(cmp_of(op), rhs)?
                };
                reg_mut(&mut frame.data, c)?.assign_bool(result)?;
                Ok(Next::Advance)
            }

            Opcode::Sqrt => {
                let value = reg(&frame.data, a)?.as_float()?;
                reg_mut(&mut frame.data, b)?.assign_float(value.sqrt())?;
                Ok(Next::Advance)
            }

            Opcode::Len => {
                let len = reg(&frame.data, a)?.len()? as i64;
                reg_mut(&mut frame.data, b)?.assign_int(len)?;
                Ok(Next::Advance)
            }

            Opcode::Writei => {
                let stream = StreamId::from_index(a)?;
                let Value::Int(point) = reg(&frame.data, b)? else {
                    return Err(RunError::BadRegister(b, "int"));
                };
                let byte =
                    u8::try_from(*point).map_err(|_| RunError::BadCodePoint(*point))?;
                streams.write(stream, &[byte])?;
                Ok(Next::Advance)
            }

            Opcode::Writeo => {
                let stream = StreamId::from_index(a)?;
                let text = reg(&frame.data, b)?.display();
                streams.write(stream, text.as_bytes())?;
                Ok(Next::Advance)
            }

            Opcode::Writenl => {
                streams.write(StreamId::from_index(a)?, b"\n")?;
                Ok(Next::Advance)
            }

            Opcode::Call => {
                let Value::Str(name) = reg(&frame.data, a)? else {
                    return Err(RunError::BadRegister(a, "str"));
                };
                let name = name.clone();
                let Value::List(args) = reg(&frame.data, b)? else {
                    return Err(RunError::BadRegister(b, "list"));
                };
                let args = args.clone();

                if let Some(func) = module.get_func(&name) {
                    if depth >= MAX_CALL_DEPTH {
                        return Err(RunError::StackOverflow(MAX_CALL_DEPTH));
                    }
                    frame.ret_slot = c;
                    let callee = Frame::new(Rc::clone(func), args)?;
                    Ok(Next::Push(callee))
                } else if let Some(def) = module.get_struct(&name) {
                    if args.len() != def.fields.len() {
                        return Err(RunError::ArityMismatch {
                            name,
                            expected: def.fields.len(),
                            found: args.len(),
                        });
                    }
                    let def = Rc::clone(def);
                    let slot = reg_mut(&mut frame.data, c)?;
                    let Value::Struct(inst) = slot else {
                        return Err(RunError::BadConstructTarget(name));
                    };
                    if !Rc::ptr_eq(&inst.def, &def) {
                        return Err(RunError::BadConstructTarget(name));
                    }
                    inst.bind_fields(args)?;
                    Ok(Next::Advance)
                } else {
                    Err(RunError::UnknownCallee(name))
                }
            }

            Opcode::Ret => Ok(Next::Return(a)),

            Opcode::Exit => {
                let Value::Int(status) = reg(&frame.data, a)? else {
                    return Err(RunError::BadRegister(a, "int"));
                };
                Ok(Next::Exit(*status as i32))
            }

            Opcode::ListNew => {
                *reg_mut(&mut frame.data, a)? = Value::List(Vec::new());
                Ok(Next::Advance)
            }

            Opcode::ListAdd => {
                let item = reg(&frame.data, b)?.clone();
                let Value::List(items) = reg_mut(&mut frame.data, a)? else {
                    return Err(RunError::BadRegister(a, "list"));
                };
                items.push(item);
                Ok(Next::Advance)
            }

            Opcode::ListRem => {
                list_remove(&mut frame.data, a, b)?;
                Ok(Next::Advance)
            }

            Opcode::ListPop => {
                let popped = list_remove(&mut frame.data, a, b)?;
                *reg_mut(&mut frame.data, c)? = popped;
                Ok(Next::Advance)
            }
        }
    }
}

fn reg(data: &[Value], idx: i32) -> Result<&Value, RunError> {
    usize::try_from(idx)
        .ok()
        .and_then(|i| data.get(i))
        .ok_or(RunError::BadRegisterIndex(idx))
}

fn reg_mut(data: &mut [Value], idx: i32) -> Result<&mut Value, RunError> {
    usize::try_from(idx)
        .ok()
        .and_then(|i| data.get_mut(i))
        .ok_or(RunError::BadRegisterIndex(idx))
}

fn branch_target(frame: &Frame, target: i32) -> Result<usize, RunError> {
    usize::try_from(target)
        .ok()
        .filter(|t| *t < frame.func.bytecode.len())
        .ok_or(RunError::BadBranchTarget(target))
}

/// Pops `data[list_idx][data[pos_idx]]` out of the list, bounds-checked.
fn list_remove(data: &mut [Value], list_idx: i32, pos_idx: i32) -> Result<Value, RunError> {
    let Value::Int(pos) = reg(data, pos_idx)? else {
        return Err(RunError::BadRegister(pos_idx, "int"));
    };
    let pos = *pos;
    let Value::List(items) = reg_mut(data, list_idx)? else {
        return Err(RunError::BadRegister(list_idx, "list"));
    };
    let idx = usize::try_from(pos)
        .ok()
        .filter(|i| *i < items.len())
        .ok_or(crate::errors::ValueError::IndexOutOfRange {
            index: pos,
            len: items.len(),
        })?;
    Ok(items.remove(idx))
}

fn arith_of(op: Opcode) -> ArithOp {
    match op {
        Opcode::Add => ArithOp::Add,
        Opcode::Sub => ArithOp::Sub,
        Opcode::Mul => ArithOp::Mul,
        _ => ArithOp::Div,
    }
}

fn cmp_of(op: Opcode) -> CmpOp {
    match op {
        Opcode::Eq => CmpOp::Eq,
        Opcode::Neq => CmpOp::Neq,
        Opcode::Gt => CmpOp::Gt,
        Opcode::Lt => CmpOp::Lt,
        Opcode::Gte => CmpOp::Gte,
        _ => CmpOp::Lte,
    }
}

fn trace_of(frame: &Frame, instr: Instr) -> FrameTrace {
    let registers = frame
        .data
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let name = frame
                .func
                .slot_name(i)
                .map(|n| format!(" (name: {n})"))
                .unwrap_or_default();
            format!("{i:>3} : {}{name}", value.repr())
        })
        .collect();
    FrameTrace {
        function: frame.func.name.clone(),
        filename: frame.func.filename.clone(),
        pos: frame
            .func
            .annotations
            .get(frame.ptr)
            .map(|ann| ann.pos)
            .unwrap_or_default(),
        instr_index: frame.ptr,
        instr: instr.render(),
        registers,
    }
}
