//! Operator enums shared by the AST, the compiler, and the value system.

use strum::Display;

/// Arithmetic operators. These are the ops the in-place statements
/// (`+=` etc.) and the `ADD`/`SUB`/`MUL`/`DIV` opcodes accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ArithOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
}

/// Comparison operators; always produce a bool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CmpOp {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Neq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = "<=")]
    Lte,
    #[strum(serialize = ">=")]
    Gte,
}

impl CmpOp {
    /// True for `==` and `!=`, which are defined for every kind that has
    /// equality; the ordering operators are numeric-only.
    #[must_use]
    pub fn is_equality(self) -> bool {
        matches!(self, Self::Eq | Self::Neq)
    }
}
