//! The abstract syntax tree the compiler consumes.
//!
//! Every node carries the source position it was parsed at; positions flow
//! into bytecode annotations and compile-error diagnostics. Dotted names
//! are kept as a single string and resolved by their final segment.

use std::fmt::Write;

use crate::errors::SourcePos;
use crate::ops::{ArithOp, CmpOp};

/// An expression with its source position.
#[derive(Debug, Clone)]
pub struct ExprNode {
    pub expr: Expr,
    pub pos: SourcePos,
}

#[derive(Debug, Clone)]
pub enum Expr {
    /// Integer literal (`42`, `42i`).
    Int(i64),
    /// Float literal (`1.5`, `1.5f`).
    Float(f64),
    /// Double-quoted string literal.
    Str(String),
    /// Variable reference, possibly dotted.
    Name(String),
    /// Arithmetic expression: `operand op operand`.
    Arith {
        lhs: Box<ExprNode>,
        op: ArithOp,
        rhs: Box<ExprNode>,
    },
    /// Comparison expression: `operand cmp operand`.
    Compare {
        lhs: Box<ExprNode>,
        op: CmpOp,
        rhs: Box<ExprNode>,
    },
    /// Function or struct-constructor call.
    Call { target: String, args: Vec<ExprNode> },
}

impl Expr {
    /// True for literal nodes, the only operands eligible for constant
    /// folding.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_) | Self::Str(_))
    }
}

/// A statement with its source position.
#[derive(Debug, Clone)]
pub struct StmtNode {
    pub stmt: Stmt,
    pub pos: SourcePos,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `name = expr` or `name : type = expr`.
    Assign {
        name: String,
        ty: Option<String>,
        value: ExprNode,
    },
    /// `name += expr` and friends.
    Inplace {
        name: String,
        op: ArithOp,
        value: ExprNode,
    },
    /// A call evaluated for its side effects.
    Call(ExprNode),
    /// `print a b c` — `newline` is false when the statement ends with `,`.
    Print { items: Vec<ExprNode>, newline: bool },
    /// `return` with an optional value.
    Return(Option<ExprNode>),
    /// An `if`/`elif`/`else` chain.
    If {
        arms: Vec<IfArm>,
        else_body: Option<Vec<StmtNode>>,
    },
    /// `for var in start..end { body }`.
    For {
        var: String,
        start: ExprNode,
        end: ExprNode,
        body: Vec<StmtNode>,
    },
}

/// One `if` or `elif` arm: condition plus block.
#[derive(Debug, Clone)]
pub struct IfArm {
    pub cond: ExprNode,
    pub body: Vec<StmtNode>,
    pub pos: SourcePos,
}

/// A declared function argument.
#[derive(Debug, Clone)]
pub struct Arg {
    pub name: String,
    pub ty: String,
    pub pos: SourcePos,
}

/// A top-level function definition.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub args: Vec<Arg>,
    pub return_type: String,
    pub body: Vec<StmtNode>,
    pub pos: SourcePos,
}

/// One struct field: `name : type`.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: String,
    pub pos: SourcePos,
}

/// A top-level struct definition.
#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<Field>,
    pub pos: SourcePos,
}

/// A top-level item.
#[derive(Debug, Clone)]
pub enum Item {
    Function(Function),
    Struct(StructDecl),
}

impl Item {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Function(f) => &f.name,
            Self::Struct(s) => &s.name,
        }
    }

    #[must_use]
    pub fn pos(&self) -> SourcePos {
        match self {
            Self::Function(f) => f.pos,
            Self::Struct(s) => s.pos,
        }
    }
}

// ----------------------------------------------------------------------
// Tree dump (the `-p` flag)
// ----------------------------------------------------------------------

/// Renders a parsed program as an indented tree.
#[must_use]
pub fn render_program(items: &[Item]) -> String {
    let mut out = String::new();
    for item in items {
        match item {
            Item::Function(f) => {
                let args: Vec<String> = f
                    .args
                    .iter()
                    .map(|a| format!("{}:{}", a.name, a.ty))
                    .collect();
                let _ = writeln!(
                    out,
                    "<Function {}({}) -> {}>",
                    f.name,
                    args.join(", "),
                    f.return_type
                );
                render_block(&mut out, &f.body, 1);
            }
            Item::Struct(s) => {
                let _ = writeln!(out, "<Struct {}>", s.name);
                for field in &s.fields {
                    let _ = writeln!(out, "    <Field {}:{}>", field.name, field.ty);
                }
            }
        }
    }
    out
}

fn render_block(out: &mut String, body: &[StmtNode], level: usize) {
    let pad = "    ".repeat(level);
    for node in body {
        match &node.stmt {
            Stmt::Assign { name, ty, value } => {
                let ty = ty.as_deref().unwrap_or("auto");
                let _ = writeln!(out, "{pad}<Assign {name}:{ty} = {}>", render_expr(value));
            }
            Stmt::Inplace { name, op, value } => {
                let _ = writeln!(out, "{pad}<Inplace {name} {op}= {}>", render_expr(value));
            }
            Stmt::Call(call) => {
                let _ = writeln!(out, "{pad}<CallStatement {}>", render_expr(call));
            }
            Stmt::Print { items, newline } => {
                let parts: Vec<String> = items.iter().map(render_expr).collect();
                let suffix = if *newline { "" } else { " (no newline)" };
                let _ = writeln!(out, "{pad}<Print {}{suffix}>", parts.join(" "));
            }
            Stmt::Return(value) => match value {
                Some(v) => {
                    let _ = writeln!(out, "{pad}<Return {}>", render_expr(v));
                }
                None => {
                    let _ = writeln!(out, "{pad}<Return>");
                }
            },
            Stmt::If { arms, else_body } => {
                for (i, arm) in arms.iter().enumerate() {
                    let label = if i == 0 { "If" } else { "Elif" };
                    let _ = writeln!(out, "{pad}<{label} {}>", render_expr(&arm.cond));
                    render_block(out, &arm.body, level + 1);
                }
                if let Some(body) = else_body {
                    let _ = writeln!(out, "{pad}<Else>");
                    render_block(out, body, level + 1);
                }
            }
            Stmt::For {
                var,
                start,
                end,
                body,
            } => {
                let _ = writeln!(
                    out,
                    "{pad}<ForLoop {var} in {}..{}>",
                    render_expr(start),
                    render_expr(end)
                );
                render_block(out, body, level + 1);
            }
        }
    }
}

fn render_expr(node: &ExprNode) -> String {
    match &node.expr {
        Expr::Int(v) => v.to_string(),
        Expr::Float(v) => crate::value::format_float(*v),
        Expr::Str(s) => format!("\"{s}\""),
        Expr::Name(n) => n.clone(),
        Expr::Arith { lhs, op, rhs } => {
            format!("({} {op} {})", render_expr(lhs), render_expr(rhs))
        }
        Expr::Compare { lhs, op, rhs } => {
            format!("({} {op} {})", render_expr(lhs), render_expr(rhs))
        }
        Expr::Call { target, args } => {
            let parts: Vec<String> = args.iter().map(render_expr).collect();
            format!("{target}({})", parts.join(", "))
        }
    }
}
