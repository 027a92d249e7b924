//! Error types for every stage of the pipeline.
//!
//! Each stage has its own error type carrying whatever context that stage can
//! know: parse and compile errors carry a source position, value errors carry
//! the offending kinds, and VM errors optionally carry a snapshot of the
//! failing frame. Rendering into user-facing diagnostics (source excerpt,
//! column arrow, register dump) lives in [`crate::report`].

use std::fmt;

use thiserror::Error;

/// A line/column pair into the original source text. Both are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePos {
    pub line: u32,
    pub col: u32,
}

impl SourcePos {
    #[must_use]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

/// Source text failed to tokenize or did not match the grammar.
#[derive(Debug, Clone, Error)]
#[error("ParseError: {message}")]
pub struct ParseError {
    pub message: String,
    pub pos: SourcePos,
}

impl ParseError {
    pub fn new(message: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

/// The AST could not be lowered to bytecode.
///
/// Covers unknown names, unknown callees, arity mismatches, unsupported
/// operator/type combinations, malformed AST shapes, and branch patches onto
/// non-branch instructions.
#[derive(Debug, Clone, Error)]
#[error("CompileError: {message}")]
pub struct CompileError {
    pub message: String,
    pub pos: SourcePos,
}

impl CompileError {
    pub fn new(message: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

/// An operation rejected by the value system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("unsupported operator '{op}' for types {lhs} and {rhs}")]
    UnsupportedOperator {
        op: String,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("cannot assign {found} into a {expected} register")]
    AssignMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("unhashable type: {0}")]
    Unhashable(&'static str),
    #[error("type {0} has no length")]
    NoLength(&'static str),
    #[error("type {0} is not numeric")]
    NotNumeric(&'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("list index {index} out of range (len {len})")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("field '{field}' of struct {def} expects {expected}, got {found}")]
    FieldMismatch {
        def: String,
        field: String,
        expected: String,
        found: &'static str,
    },
}

/// A fatal condition hit while executing bytecode.
#[derive(Debug, Clone, Error)]
pub enum RunError {
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("unknown function or struct '{0}'")]
    UnknownCallee(String),
    #[error("wrong number of arguments for {name}: expected {expected}, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("main function must accept zero or one arguments")]
    MainArity,
    #[error("call stack exceeded {0} frames")]
    StackOverflow(usize),
    #[error("invalid stream index {0}")]
    BadStream(i32),
    #[error("code point {0} does not fit in a byte")]
    BadCodePoint(i64),
    #[error("stream write failed: {0}")]
    StreamWrite(String),
    #[error("register {0} does not hold a {1}")]
    BadRegister(i32, &'static str),
    #[error("register index {0} out of range")]
    BadRegisterIndex(i32),
    #[error("branch target {0} out of range")]
    BadBranchTarget(i32),
    #[error("instruction pointer ran past the end of '{0}'")]
    RanOffEnd(String),
    #[error("struct '{0}' constructed into a register of the wrong type")]
    BadConstructTarget(String),
}

/// Snapshot of the frame that was executing when a [`RunError`] surfaced.
///
/// All fields are pre-rendered strings so the snapshot stays detached from
/// the value system; it exists only to feed the error reporter.
#[derive(Debug, Clone)]
pub struct FrameTrace {
    pub function: String,
    pub filename: String,
    pub pos: SourcePos,
    pub instr_index: usize,
    pub instr: String,
    pub registers: Vec<String>,
}

/// A [`RunError`] together with the frame context it surfaced in.
#[derive(Debug, Clone)]
pub struct VmError {
    pub error: RunError,
    pub trace: Option<FrameTrace>,
}

impl std::error::Error for VmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.trace {
            Some(trace) => write!(
                f,
                "RuntimeError in {} at instruction {} ({}): {}",
                trace.function, trace.instr_index, trace.instr, self.error
            ),
            None => write!(f, "RuntimeError: {}", self.error),
        }
    }
}

impl From<RunError> for VmError {
    fn from(error: RunError) -> Self {
        Self { error, trace: None }
    }
}
