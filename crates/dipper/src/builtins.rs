//! Native builtin functions.
//!
//! Builtins are resolved by name at compile time and lower to specialized
//! opcodes instead of `CALL`; there is no runtime lookup. Adding a builtin
//! means adding a variant here and an emitter arm in the compiler.

use strum::Display;

/// The builtin functions the compiler recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin {
    /// `len(x)` — element or character count; lowers to `LEN`.
    Len,
    /// `sqrt(x)` — square root of an int or float; lowers to `SQRT`.
    Sqrt,
}

impl Builtin {
    /// Resolves a call-target name to a builtin.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "len" => Some(Self::Len),
            "sqrt" => Some(Self::Sqrt),
            _ => None,
        }
    }

    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Len | Self::Sqrt => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(Builtin::lookup("len"), Some(Builtin::Len));
        assert_eq!(Builtin::lookup("sqrt"), Some(Builtin::Sqrt));
        assert_eq!(Builtin::lookup("frobnicate"), None);
    }
}
