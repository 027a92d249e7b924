//! Recursive-descent parser producing the AST of [`crate::ast`].
//!
//! Statements end at newlines; blocks are brace-delimited. Newlines are
//! insignificant inside parentheses (call arguments, parameter lists) and
//! around block braces.

use crate::ast::{
    Arg, Expr, ExprNode, Field, Function, IfArm, Item, Stmt, StmtNode, StructDecl,
};
use crate::errors::{ParseError, SourcePos};
use crate::lexer::{tokenize, Token, TokenPos};
use crate::ops::{ArithOp, CmpOp};

/// Parses a whole source file into top-level items.
pub fn parse(source: &str) -> Result<Vec<Item>, ParseError> {
    let tokens = tokenize(source)?;
    Parser { tokens, idx: 0 }.program()
}

struct Parser {
    tokens: Vec<TokenPos>,
    idx: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.idx].token
    }

    fn pos(&self) -> SourcePos {
        self.tokens[self.idx].pos
    }

    fn bump(&mut self) -> TokenPos {
        let tok = self.tokens[self.idx].clone();
        if self.idx < self.tokens.len() - 1 {
            self.idx += 1;
        }
        tok
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<TokenPos, ParseError> {
        if self.peek() == token {
            Ok(self.bump())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> ParseError {
        ParseError::new(
            format!("expected {what}, found {}", self.peek().describe()),
            self.pos(),
        )
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Token::Newline) {
            self.bump();
        }
    }

    fn ident(&mut self, what: &str) -> Result<(String, SourcePos), ParseError> {
        match self.peek() {
            Token::Ident(_) => {
                let tok = self.bump();
                let Token::Ident(name) = tok.token else {
                    unreachable!()
                };
                Ok((name, tok.pos))
            }
            _ => Err(self.unexpected(what)),
        }
    }

    // ==================================================================
    // Items
    // ==================================================================

    fn program(&mut self) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                Token::Eof => return Ok(items),
                Token::Fn => items.push(Item::Function(self.function()?)),
                Token::Struct => items.push(Item::Struct(self.struct_decl()?)),
                _ => return Err(self.unexpected("'fn' or 'struct'")),
            }
        }
    }

    fn function(&mut self) -> Result<Function, ParseError> {
        let pos = self.expect(&Token::Fn, "'fn'")?.pos;
        let (name, _) = self.ident("function name")?;

        self.expect(&Token::LParen, "'('")?;
        let mut args = Vec::new();
        self.skip_newlines();
        while !self.eat(&Token::RParen) {
            let (arg_name, arg_pos) = self.ident("argument name")?;
            let ty = if self.eat(&Token::Colon) {
                self.type_name()?
            } else {
                "auto".to_owned()
            };
            args.push(Arg {
                name: arg_name,
                ty,
                pos: arg_pos,
            });
            self.skip_newlines();
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RParen, "',' or ')'")?;
                break;
            }
            self.skip_newlines();
        }

        let return_type = if self.eat(&Token::Arrow) {
            self.type_name()?
        } else {
            "auto".to_owned()
        };

        let body = self.block()?;
        Ok(Function {
            name,
            args,
            return_type,
            body,
            pos,
        })
    }

    fn struct_decl(&mut self) -> Result<StructDecl, ParseError> {
        let pos = self.expect(&Token::Struct, "'struct'")?.pos;
        let (name, _) = self.ident("struct name")?;
        self.expect(&Token::LBrace, "'{'")?;

        let mut fields = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat(&Token::RBrace) {
                break;
            }
            let (field_name, field_pos) = self.ident("field name")?;
            self.expect(&Token::Colon, "':'")?;
            let ty = self.type_name()?;
            fields.push(Field {
                name: field_name,
                ty,
                pos: field_pos,
            });
            // fields are separated by commas or newlines
            self.eat(&Token::Comma);
        }
        Ok(StructDecl { name, fields, pos })
    }

    /// A type name: an identifier or a bracketed element type (`[str]`).
    fn type_name(&mut self) -> Result<String, ParseError> {
        if self.eat(&Token::LBracket) {
            let (inner, _) = self.ident("element type")?;
            self.expect(&Token::RBracket, "']'")?;
            Ok(format!("[{inner}]"))
        } else {
            let (name, _) = self.ident("type name")?;
            Ok(name)
        }
    }

    // ==================================================================
    // Statements
    // ==================================================================

    fn block(&mut self) -> Result<Vec<StmtNode>, ParseError> {
        self.skip_newlines();
        self.expect(&Token::LBrace, "'{'")?;
        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat(&Token::RBrace) {
                return Ok(body);
            }
            body.push(self.statement()?);
        }
    }

    fn statement(&mut self) -> Result<StmtNode, ParseError> {
        let pos = self.pos();
        let stmt = match self.peek() {
            Token::Return => {
                self.bump();
                let value = match self.peek() {
                    Token::Newline | Token::RBrace | Token::Eof => None,
                    _ => Some(self.expression()?),
                };
                Stmt::Return(value)
            }
            Token::Print => {
                self.bump();
                self.print_statement()?
            }
            Token::If => self.if_statement()?,
            Token::For => self.for_statement()?,
            Token::Ident(_) => self.simple_statement()?,
            _ => return Err(self.unexpected("a statement")),
        };
        self.end_of_statement()?;
        Ok(StmtNode { stmt, pos })
    }

    fn end_of_statement(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Token::Newline => {
                self.bump();
                Ok(())
            }
            Token::RBrace | Token::Eof => Ok(()),
            _ => Err(self.unexpected("end of statement")),
        }
    }

    fn print_statement(&mut self) -> Result<Stmt, ParseError> {
        let mut items = Vec::new();
        let mut newline = true;
        loop {
            match self.peek() {
                Token::Newline | Token::RBrace | Token::Eof => break,
                Token::Comma => {
                    // trailing comma suppresses the newline
                    self.bump();
                    newline = false;
                    break;
                }
                _ => items.push(self.expression()?),
            }
        }
        Ok(Stmt::Print { items, newline })
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.expect(&Token::If, "'if'")?.pos;
        let cond = self.expression()?;
        let body = self.block()?;
        let mut arms = vec![IfArm { cond, body, pos }];
        let mut else_body = None;

        loop {
            // peek past statement separators for a chained elif/else
            let checkpoint = self.idx;
            self.skip_newlines();
            match self.peek() {
                Token::Elif => {
                    let pos = self.bump().pos;
                    let cond = self.expression()?;
                    let body = self.block()?;
                    arms.push(IfArm { cond, body, pos });
                }
                Token::Else => {
                    self.bump();
                    else_body = Some(self.block()?);
                    break;
                }
                _ => {
                    self.idx = checkpoint;
                    break;
                }
            }
        }
        Ok(Stmt::If { arms, else_body })
    }

    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&Token::For, "'for'")?;
        let (var, _) = self.ident("loop variable")?;
        self.expect(&Token::In, "'in'")?;
        let start = self.expression()?;
        self.expect(&Token::DotDot, "'..'")?;
        let end = self.expression()?;
        let body = self.block()?;
        Ok(Stmt::For {
            var,
            start,
            end,
            body,
        })
    }

    /// Statements that begin with an identifier: assignment, typed
    /// assignment, in-place update, or a call.
    fn simple_statement(&mut self) -> Result<Stmt, ParseError> {
        let checkpoint = self.idx;
        let (name, _) = self.ident("a name")?;

        let ty = if self.eat(&Token::Colon) {
            Some(self.type_name()?)
        } else {
            None
        };

        if self.eat(&Token::Assign) {
            let value = self.expression()?;
            return Ok(Stmt::Assign { name, ty, value });
        }

        if ty.is_none() {
            let inplace = match self.peek() {
                Token::PlusAssign => Some(ArithOp::Add),
                Token::MinusAssign => Some(ArithOp::Sub),
                Token::StarAssign => Some(ArithOp::Mul),
                Token::SlashAssign => Some(ArithOp::Div),
                _ => None,
            };
            if let Some(op) = inplace {
                self.bump();
                let value = self.expression()?;
                return Ok(Stmt::Inplace { name, op, value });
            }

            // not an assignment: re-parse as an expression statement,
            // which must be a call
            self.idx = checkpoint;
            let expr = self.expression()?;
            if matches!(expr.expr, Expr::Call { .. }) {
                return Ok(Stmt::Call(expr));
            }
            return Err(ParseError::new(
                "expression statements must be calls",
                expr.pos,
            ));
        }

        Err(self.unexpected("'=' after typed name"))
    }

    // ==================================================================
    // Expressions
    // ==================================================================

    fn expression(&mut self) -> Result<ExprNode, ParseError> {
        let lhs = self.arith()?;
        let op = match self.peek() {
            Token::EqEq => Some(CmpOp::Eq),
            Token::NotEq => Some(CmpOp::Neq),
            Token::Lt => Some(CmpOp::Lt),
            Token::Gt => Some(CmpOp::Gt),
            Token::Lte => Some(CmpOp::Lte),
            Token::Gte => Some(CmpOp::Gte),
            _ => None,
        };
        let Some(op) = op else { return Ok(lhs) };
        self.bump();
        let rhs = self.arith()?;
        let pos = lhs.pos;
        Ok(ExprNode {
            expr: Expr::Compare {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            },
            pos,
        })
    }

    fn arith(&mut self) -> Result<ExprNode, ParseError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Token::Plus => ArithOp::Add,
                Token::Minus => ArithOp::Sub,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.term()?;
            let pos = lhs.pos;
            lhs = ExprNode {
                expr: Expr::Arith {
                    lhs: Box::new(lhs),
                    op,
                    rhs: Box::new(rhs),
                },
                pos,
            };
        }
    }

    fn term(&mut self) -> Result<ExprNode, ParseError> {
        let mut lhs = self.primary()?;
        loop {
            let op = match self.peek() {
                Token::Star => ArithOp::Mul,
                Token::Slash => ArithOp::Div,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.primary()?;
            let pos = lhs.pos;
            lhs = ExprNode {
                expr: Expr::Arith {
                    lhs: Box::new(lhs),
                    op,
                    rhs: Box::new(rhs),
                },
                pos,
            };
        }
    }

    fn primary(&mut self) -> Result<ExprNode, ParseError> {
        let pos = self.pos();
        match self.peek().clone() {
            Token::Int(v) => {
                self.bump();
                Ok(ExprNode {
                    expr: Expr::Int(v),
                    pos,
                })
            }
            Token::Float(v) => {
                self.bump();
                Ok(ExprNode {
                    expr: Expr::Float(v),
                    pos,
                })
            }
            Token::Str(s) => {
                self.bump();
                Ok(ExprNode {
                    expr: Expr::Str(s),
                    pos,
                })
            }
            Token::Minus => {
                // negative numeric literal
                self.bump();
                match self.peek().clone() {
                    Token::Int(v) => {
                        self.bump();
                        Ok(ExprNode {
                            expr: Expr::Int(-v),
                            pos,
                        })
                    }
                    Token::Float(v) => {
                        self.bump();
                        Ok(ExprNode {
                            expr: Expr::Float(-v),
                            pos,
                        })
                    }
                    _ => Err(self.unexpected("a numeric literal after '-'")),
                }
            }
            Token::LParen => {
                self.bump();
                self.skip_newlines();
                let inner = self.expression()?;
                self.skip_newlines();
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(_) => {
                let name = self.dotted_name()?;
                if self.eat(&Token::LParen) {
                    let args = self.call_args()?;
                    Ok(ExprNode {
                        expr: Expr::Call { target: name, args },
                        pos,
                    })
                } else {
                    Ok(ExprNode {
                        expr: Expr::Name(name),
                        pos,
                    })
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn dotted_name(&mut self) -> Result<String, ParseError> {
        let (mut name, _) = self.ident("a name")?;
        while self.eat(&Token::Dot) {
            let (part, _) = self.ident("a name after '.'")?;
            name.push('.');
            name.push_str(&part);
        }
        Ok(name)
    }

    fn call_args(&mut self) -> Result<Vec<ExprNode>, ParseError> {
        let mut args = Vec::new();
        self.skip_newlines();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            self.skip_newlines();
            if self.eat(&Token::Comma) {
                self.skip_newlines();
                continue;
            }
            self.expect(&Token::RParen, "',' or ')'")?;
            return Ok(args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one_fn(source: &str) -> Function {
        let items = parse(source).unwrap();
        let Item::Function(f) = items.into_iter().next().unwrap() else {
            panic!("expected a function")
        };
        f
    }

    #[test]
    fn function_signature() {
        let f = parse_one_fn("fn add(x : int, y : int) -> int { return x + y }");
        assert_eq!(f.name, "add");
        assert_eq!(f.args.len(), 2);
        assert_eq!(f.args[0].ty, "int");
        assert_eq!(f.return_type, "int");
        assert_eq!(f.body.len(), 1);
    }

    #[test]
    fn untyped_args_default_to_auto() {
        let f = parse_one_fn("fn add(x, y) { return x }");
        assert_eq!(f.args[0].ty, "auto");
        assert_eq!(f.return_type, "auto");
    }

    #[test]
    fn struct_fields() {
        let items = parse("struct Point { x:int, y:int }").unwrap();
        let Item::Struct(s) = &items[0] else {
            panic!("expected a struct")
        };
        assert_eq!(s.name, "Point");
        assert_eq!(s.fields.len(), 2);
        assert_eq!(s.fields[1].ty, "int");
    }

    #[test]
    fn typed_assignment() {
        let f = parse_one_fn("fn main() { x : float = 4.0\nreturn x }");
        let Stmt::Assign { name, ty, .. } = &f.body[0].stmt else {
            panic!("expected assignment")
        };
        assert_eq!(name, "x");
        assert_eq!(ty.as_deref(), Some("float"));
    }

    #[test]
    fn precedence_multiplication_binds_tighter() {
        let f = parse_one_fn("fn main() { return 1 + 2 * 3 }");
        let Stmt::Return(Some(expr)) = &f.body[0].stmt else {
            panic!()
        };
        let Expr::Arith { op, rhs, .. } = &expr.expr else {
            panic!("expected top-level add")
        };
        assert_eq!(*op, ArithOp::Add);
        assert!(matches!(rhs.expr, Expr::Arith { op: ArithOp::Mul, .. }));
    }

    #[test]
    fn comparison_wraps_arithmetic() {
        let f = parse_one_fn("fn main() { return len(x) == 8 }");
        let Stmt::Return(Some(expr)) = &f.body[0].stmt else {
            panic!()
        };
        assert!(matches!(
            expr.expr,
            Expr::Compare { op: CmpOp::Eq, .. }
        ));
    }

    #[test]
    fn print_trailing_comma_suppresses_newline() {
        let f = parse_one_fn("fn main() { print 1 2 ,\nprint 3 }");
        let Stmt::Print { items, newline } = &f.body[0].stmt else {
            panic!()
        };
        assert_eq!(items.len(), 2);
        assert!(!newline);
        let Stmt::Print { newline, .. } = &f.body[1].stmt else {
            panic!()
        };
        assert!(*newline);
    }

    #[test]
    fn if_elif_else_chain() {
        let f = parse_one_fn(
            "fn main() {
                if x > 1 { return 1 }
                elif x > 0 { return 2 }
                else { return 3 }
            }",
        );
        let Stmt::If { arms, else_body } = &f.body[0].stmt else {
            panic!()
        };
        assert_eq!(arms.len(), 2);
        assert!(else_body.is_some());
    }

    #[test]
    fn for_loop_over_range() {
        let f = parse_one_fn("fn main() { for i in 0..10 { x += 1 } }");
        let Stmt::For { var, .. } = &f.body[0].stmt else {
            panic!()
        };
        assert_eq!(var, "i");
    }

    #[test]
    fn call_statement() {
        let f = parse_one_fn("fn main() { go(1, 2) }");
        assert!(matches!(f.body[0].stmt, Stmt::Call(_)));
    }

    #[test]
    fn bare_name_statement_is_rejected() {
        assert!(parse("fn main() { x }").is_err());
    }

    #[test]
    fn parse_error_carries_position() {
        let err = parse("fn main() {\n  ?\n}").unwrap_err();
        assert_eq!(err.pos.line, 2);
    }

    #[test]
    fn main_function_source_round_trip() {
        let items = parse(
            "# comment
            fn fib(n:int) -> int {
                if n < 2 { return n }
                return fib(n - 2) + fib(n - 1)
            }
            fn main() {
                return fib(10)
            }",
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(crate::ast::render_program(&items).lines().count() > 4, true);
    }
}
