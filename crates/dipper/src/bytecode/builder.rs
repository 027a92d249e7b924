//! Emission state for one function being compiled.
//!
//! `FuncBuilder` owns the growing instruction stream and data template,
//! hands out register indices, records per-instruction annotations, and
//! rewrites branch targets once forward destinations are known.

use ahash::AHashMap;

use super::op::{Annotation, Instr, Opcode, UNUSED};
use crate::errors::{CompileError, SourcePos};
use crate::function::{FuncObj, Param};
use crate::value::{Kind, Value};

pub struct FuncBuilder {
    name: String,
    filename: String,
    params: Vec<Param>,
    return_type: String,
    bytecode: Vec<Instr>,
    annotations: Vec<Annotation>,
    template: Vec<Value>,
    bindings: AHashMap<String, usize>,
    /// Source position stamped onto subsequently emitted instructions.
    current_pos: SourcePos,
    /// One-shot comment attached to the next emitted instruction.
    pending_comment: Option<String>,
}

impl FuncBuilder {
    /// Starts a builder for the given signature. The declared arguments are
    /// reserved first, in order, each pre-populated with the default value
    /// of its declared type, and registered under their names.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        filename: impl Into<String>,
        params: Vec<Param>,
        return_type: impl Into<String>,
    ) -> Self {
        let mut builder = Self {
            name: name.into(),
            filename: filename.into(),
            params: Vec::new(),
            return_type: return_type.into(),
            bytecode: Vec::new(),
            annotations: Vec::new(),
            template: Vec::new(),
            bindings: AHashMap::new(),
            current_pos: SourcePos::default(),
            pending_comment: None,
        };
        for param in &params {
            let default = Value::default_for_type(&param.ty).unwrap_or(Value::Null);
            let idx = builder.reserve(default);
            builder.bind(&param.name, idx);
        }
        builder.params = params;
        builder
    }

    /// Sets the source position stamped onto instructions emitted from here.
    pub fn set_location(&mut self, pos: SourcePos) {
        self.current_pos = pos;
    }

    #[must_use]
    pub fn location(&self) -> SourcePos {
        self.current_pos
    }

    /// Appends a default-initialized register to the template and returns
    /// its index. Registers are append-only; indices never move.
    pub fn reserve(&mut self, value: Value) -> usize {
        self.template.push(value);
        self.template.len() - 1
    }

    /// Binds (or rebinds) a declared name to a register index. Rebinding
    /// changes what the name resolves to from this point on without
    /// touching the previously bound slot.
    pub fn bind(&mut self, name: &str, idx: usize) {
        self.bindings.insert(name.to_owned(), idx);
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.bindings.get(name).copied()
    }

    /// The kind of the value a register will hold when the frame starts.
    #[must_use]
    pub fn slot_kind(&self, idx: usize) -> Kind {
        self.template[idx].kind()
    }

    #[must_use]
    pub fn template_value(&self, idx: usize) -> &Value {
        &self.template[idx]
    }

    /// Emits one instruction and returns its index ("pointer").
    pub fn emit(&mut self, op: Opcode, a: i32, b: i32, c: i32) -> usize {
        self.bytecode.push(Instr::new(op, a, b, c));
        self.annotations.push(Annotation {
            pos: self.current_pos,
            comment: self.pending_comment.take().unwrap_or_default(),
        });
        self.bytecode.len() - 1
    }

    /// Emits a `LABEL` no-op carrying a comment, and returns its index for
    /// use as a branch target.
    pub fn emit_label(&mut self, text: impl Into<String>) -> usize {
        self.pending_comment = Some(text.into());
        self.emit(Opcode::Label, UNUSED, UNUSED, UNUSED)
    }

    #[must_use]
    pub fn current_ptr(&self) -> usize {
        self.bytecode.len() - 1
    }

    #[must_use]
    pub fn last_opcode(&self) -> Option<Opcode> {
        self.bytecode.last().map(|instr| instr.op)
    }

    /// Rewrites the branch target of a previously emitted branch or jump.
    /// Fails for instructions that carry no branch target.
    pub fn set_branch(&mut self, ptr: usize, target: usize) -> Result<(), CompileError> {
        let instr = &mut self.bytecode[ptr];
        let Some(slot) = instr.op.branch_slot() else {
            return Err(CompileError::new(
                format!("unsupported instruction for branch patch ({})", instr.op),
                self.current_pos,
            ));
        };
        let target = target as i32;
        match slot {
            0 => instr.a = target,
            1 => instr.b = target,
            _ => instr.c = target,
        }
        Ok(())
    }

    /// Closes the function: guarantees a trailing `RET` and bundles the
    /// instruction stream, template, and bindings into a [`FuncObj`].
    #[must_use]
    pub fn seal(mut self) -> FuncObj {
        if self.last_opcode() != Some(Opcode::Ret) {
            self.emit(Opcode::Ret, UNUSED, UNUSED, UNUSED);
        }
        FuncObj {
            name: self.name,
            filename: self.filename,
            params: self.params,
            return_type: self.return_type,
            bytecode: self.bytecode,
            annotations: self.annotations,
            template: self.template,
            bindings: self.bindings,
        }
    }
}
