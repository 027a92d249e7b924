//! The instruction set: opcodes, encoded instructions, and annotations.
//!
//! Instructions are fixed-width 4-tuples `(opcode, a, b, c)`; `-1` marks an
//! unused argument slot. Register arguments index into the owning function's
//! data template, branch arguments index into its bytecode.

use strum::{Display, EnumString};

use crate::errors::SourcePos;
use crate::ops::{ArithOp, CmpOp};

/// Sentinel for an unused instruction argument.
pub const UNUSED: i32 = -1;

/// VM opcodes. The `Display`/`FromStr` forms are the assembler mnemonics
/// (`LIST_ADD`, `WRITENL`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    Pass,
    Label,
    Call,
    Bt,
    Bf,
    Beq,
    Bne,
    Jmp,
    Ret,
    Set,
    Addi,
    Subi,
    Muli,
    Divi,
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    Sqrt,
    Len,
    Exit,
    Writei,
    Writeo,
    Writenl,
    ListNew,
    ListAdd,
    ListRem,
    ListPop,
}

impl Opcode {
    /// Which argument slot holds this instruction's branch target, if it
    /// has one. Only these opcodes may be rewritten by branch patching.
    #[must_use]
    pub fn branch_slot(self) -> Option<usize> {
        match self {
            Self::Jmp => Some(0),
            Self::Bt | Self::Bf => Some(1),
            Self::Beq | Self::Bne => Some(2),
            _ => None,
        }
    }
}

impl From<ArithOp> for Opcode {
    fn from(op: ArithOp) -> Self {
        match op {
            ArithOp::Add => Self::Add,
            ArithOp::Sub => Self::Sub,
            ArithOp::Mul => Self::Mul,
            ArithOp::Div => Self::Div,
        }
    }
}

impl From<CmpOp> for Opcode {
    fn from(op: CmpOp) -> Self {
        match op {
            CmpOp::Eq => Self::Eq,
            CmpOp::Neq => Self::Neq,
            CmpOp::Gt => Self::Gt,
            CmpOp::Lt => Self::Lt,
            CmpOp::Gte => Self::Gte,
            CmpOp::Lte => Self::Lte,
        }
    }
}

/// One encoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instr {
    pub op: Opcode,
    pub a: i32,
    pub b: i32,
    pub c: i32,
}

impl Instr {
    #[must_use]
    pub fn new(op: Opcode, a: i32, b: i32, c: i32) -> Self {
        Self { op, a, b, c }
    }

    /// The argument slots in order.
    #[must_use]
    pub fn args(&self) -> [i32; 3] {
        [self.a, self.b, self.c]
    }

    /// The branch target of this instruction, if it is a branch or jump.
    #[must_use]
    pub fn branch_target(&self) -> Option<i32> {
        self.op.branch_slot().map(|slot| self.args()[slot])
    }

    /// Disassembler form: mnemonic plus the used arguments.
    #[must_use]
    pub fn render(&self) -> String {
        let args: Vec<String> = self
            .args()
            .iter()
            .filter(|v| **v != UNUSED)
            .map(ToString::to_string)
            .collect();
        if args.is_empty() {
            self.op.to_string()
        } else {
            format!("{} ({})", self.op, args.join(", "))
        }
    }
}

/// Per-instruction diagnostic context: where in the source this instruction
/// came from and an optional compiler note (label text and the like).
#[derive(Debug, Clone, Default)]
pub struct Annotation {
    pub pos: SourcePos,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn mnemonics_round_trip() {
        assert_eq!(Opcode::ListAdd.to_string(), "LIST_ADD");
        assert_eq!(Opcode::Writenl.to_string(), "WRITENL");
        assert_eq!(Opcode::from_str("BNE").unwrap(), Opcode::Bne);
        assert_eq!(Opcode::from_str("LIST_POP").unwrap(), Opcode::ListPop);
        assert!(Opcode::from_str("NOPE").is_err());
    }

    #[test]
    fn branch_slots() {
        assert_eq!(Opcode::Jmp.branch_slot(), Some(0));
        assert_eq!(Opcode::Bf.branch_slot(), Some(1));
        assert_eq!(Opcode::Bne.branch_slot(), Some(2));
        assert_eq!(Opcode::Add.branch_slot(), None);
        let i = Instr::new(Opcode::Bf, 3, 17, UNUSED);
        assert_eq!(i.branch_target(), Some(17));
    }

    #[test]
    fn render_skips_unused_args() {
        let i = Instr::new(Opcode::Ret, UNUSED, UNUSED, UNUSED);
        assert_eq!(i.render(), "RET");
        let i = Instr::new(Opcode::Add, 0, 1, 2);
        assert_eq!(i.render(), "ADD (0, 1, 2)");
    }
}
