//! Compiled function objects.
//!
//! A [`FuncObj`] bundles everything the VM needs to execute one function:
//! the instruction stream, the pristine data-register template, the
//! name-to-register bindings, and the argument descriptor. Frames are built
//! by deep-copying the template and substituting the positional arguments
//! into the first `arity` slots.

use std::fmt::Write;
use std::str::FromStr;

use ahash::AHashMap;

use crate::bytecode::{Annotation, Instr, Opcode, UNUSED};
use crate::errors::{ParseError, RunError, SourcePos};
use crate::value::Value;

/// A declared parameter: name plus declared type name (`auto` when
/// unannotated).
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// A sealed (or prototype) function.
///
/// Prototypes are installed during the first module pass with an empty
/// instruction stream so signatures resolve before any body compiles; the
/// second pass replaces them with sealed objects.
#[derive(Debug, Clone)]
pub struct FuncObj {
    pub name: String,
    pub filename: String,
    pub params: Vec<Param>,
    pub return_type: String,
    pub bytecode: Vec<Instr>,
    /// One entry per instruction; diagnostics only.
    pub annotations: Vec<Annotation>,
    /// The pristine register file. The first `arity()` slots are the
    /// declared arguments, in order.
    pub template: Vec<Value>,
    /// Declared-name to register-index bindings at the end of compilation.
    pub bindings: AHashMap<String, usize>,
}

impl FuncObj {
    /// A signature-only prototype with no body.
    #[must_use]
    pub fn prototype(
        name: impl Into<String>,
        filename: impl Into<String>,
        params: Vec<Param>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            params,
            return_type: return_type.into(),
            bytecode: Vec::new(),
            annotations: Vec::new(),
            template: Vec::new(),
            bindings: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Builds the register file for a new frame: a deep copy of the
    /// template with the positional arguments substituted into the leading
    /// slots. The argument count must match the declared arity exactly.
    pub fn frame_data(&self, args: Vec<Value>) -> Result<Vec<Value>, RunError> {
        if args.len() != self.arity() {
            return Err(RunError::ArityMismatch {
                name: self.name.clone(),
                expected: self.arity(),
                found: args.len(),
            });
        }
        let mut data = self.template.clone();
        for (slot, arg) in data.iter_mut().zip(args) {
            *slot = arg;
        }
        Ok(data)
    }

    /// Assembles a function from mnemonic text, for tests and debugging.
    ///
    /// One instruction per line, `#` starts a comment:
    ///
    /// ```text
    /// ADD  0  1  2     # data2 = data0 + data1
    /// RET  2
    /// ```
    pub fn assemble(
        name: impl Into<String>,
        text: &str,
        template: Vec<Value>,
        argcount: usize,
    ) -> Result<Self, ParseError> {
        let mut bytecode = Vec::new();
        for (lineno, raw) in text.lines().enumerate() {
            let pos = SourcePos::new(lineno as u32 + 1, 1);
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let mnemonic = parts.next().expect("non-empty line has a first token");
            let op = Opcode::from_str(mnemonic)
                .map_err(|_| ParseError::new(format!("unknown instruction '{mnemonic}'"), pos))?;
            let mut args = [UNUSED; 3];
            for slot in &mut args {
                match parts.next() {
                    Some(tok) => {
                        *slot = tok.parse().map_err(|_| {
                            ParseError::new(format!("bad instruction argument '{tok}'"), pos)
                        })?;
                    }
                    None => break,
                }
            }
            if parts.next().is_some() {
                return Err(ParseError::new("too many instruction arguments", pos));
            }
            bytecode.push(Instr::new(op, args[0], args[1], args[2]));
        }
        let annotations = bytecode.iter().map(|_| Annotation::default()).collect();
        let params = (0..argcount).map(|i| Param::new(format!("arg{i}"), "auto")).collect();
        Ok(Self {
            name: name.into(),
            filename: "<assembled>".to_owned(),
            params,
            return_type: "auto".to_owned(),
            bytecode,
            annotations,
            template,
            bindings: AHashMap::new(),
        })
    }

    /// The name bound to a register index, if any. Linear scan; used only
    /// for dumps and error reports.
    #[must_use]
    pub fn slot_name(&self, idx: usize) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, slot)| **slot == idx)
            .map(|(name, _)| name.as_str())
    }

    /// Human-readable listing of the instruction stream and data template,
    /// used by the `-c` dump and runtime error reports.
    #[must_use]
    pub fn disassemble(&self) -> String {
        let mut names_by_slot: AHashMap<usize, &str> = AHashMap::new();
        for (name, idx) in &self.bindings {
            names_by_slot.insert(*idx, name);
        }

        let mut out = String::new();
        out.push_str("bytecode:\n");
        for (i, instr) in self.bytecode.iter().enumerate() {
            let comment = self
                .annotations
                .get(i)
                .filter(|ann| !ann.comment.is_empty())
                .map(|ann| format!("  ; {}", ann.comment))
                .unwrap_or_default();
            let _ = writeln!(out, "    {i:>3} : {}{comment}", instr.render());
        }
        out.push_str("data:\n");
        for (i, value) in self.template.iter().enumerate() {
            let name = names_by_slot
                .get(&i)
                .map(|n| format!(" (name: {n})"))
                .unwrap_or_default();
            let _ = writeln!(out, "    {i:>3} : {}{name}", value.repr());
        }
        out
    }
}
