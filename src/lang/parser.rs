// This file is part of cminic, an ahead-of-time compiler.
// Copyright (C) 2020 Jeffrey Sharp
//
// cminic is free software: you can redistribute it and/or modify it
// under the terms of the GNU General Public License as published
// by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// cminic is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with cminic.  If not, see <http://www.gnu.org/licenses/>.

//! Recursive-descent parser with one-token lookahead, no backtracking.
//!
//! Produces a [`Program`] from a token sequence. Local variable
//! resolution happens here, inline with parsing, per function.

use crate::error::ParseError;
use crate::lang::ast::{BinOp, Expr, Function, LocalVar, Program, Stmt};
use crate::lang::token::{Token, TokenKind};

const MAX_ARGS: usize = 6;

/// Parses a complete token sequence into a [`Program`].
pub fn parse(source: &str, tokens: &[Token]) -> Result<Program, ParseError> {
    Parser::new(source, tokens).program()
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

/// Per-function state: the variable table being built as names are
/// first encountered. Explicit and passed through recursion, not global,
/// so a function's locals never leak into its neighbors.
struct FuncState {
    locals: Vec<LocalVar>,
}

impl FuncState {
    fn new() -> Self {
        Self { locals: Vec::new() }
    }

    fn declare(&mut self, name: &str) -> usize {
        self.locals.push(LocalVar { name: name.to_string(), offset: (self.locals.len() + 1) * 8 });
        self.locals.last().unwrap().offset
    }

    /// Looks up `name`, inserting it as a fresh local if not yet seen.
    fn resolve(&mut self, name: &str) -> usize {
        if let Some(v) = self.locals.iter().find(|v| v.name == name) {
            v.offset
        } else {
            self.declare(name)
        }
    }
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self { source, tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn text(&self, tok: &Token) -> &str {
        tok.text(self.source)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// If the current token is SIGN with lexeme `sign`, consumes it.
    fn consume(&mut self, sign: &str) -> bool {
        if self.current().is_sign(self.source, sign) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_sign(&mut self, sign: &str) -> Result<(), ParseError> {
        if self.consume(sign) {
            Ok(())
        } else {
            Err(ParseError::new(
                self.current().start,
                format!("expected `{}`", sign),
            ))
        }
    }

    fn expect_kind(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.current().kind == kind {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                self.current().start,
                format!("expected {:?}", kind),
            ))
        }
    }

    fn at_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    // program = function* EOF
    fn program(&mut self) -> Result<Program, ParseError> {
        let mut functions = Vec::new();
        while !self.at_eof() {
            functions.push(self.function()?);
        }
        Ok(functions)
    }

    // function = ident "(" params? ")" "{" stmt* "}"
    fn function(&mut self) -> Result<Function, ParseError> {
        let name_tok = self.expect_kind(TokenKind::Ident)?;
        let name = self.text(&name_tok).to_string();

        let mut state = FuncState::new();
        self.expect_sign("(")?;
        let param_count = self.params(&mut state)?;
        self.expect_sign(")")?;

        self.expect_sign("{")?;
        let mut body = Vec::new();
        while !self.current().is_sign(self.source, "}") {
            body.push(self.stmt(&mut state)?);
        }
        self.expect_sign("}")?;

        Ok(Function { name, params: param_count, locals: state.locals, body })
    }

    // params = ident ("," ident)*
    fn params(&mut self, state: &mut FuncState) -> Result<usize, ParseError> {
        if self.current().is_sign(self.source, ")") {
            return Ok(0);
        }
        let mut count = 0usize;
        loop {
            let tok = self.expect_kind(TokenKind::Ident)?;
            let name = self.text(&tok).to_string();
            state.declare(&name);
            count += 1;
            if !self.consume(",") {
                break;
            }
        }
        Ok(count)
    }

    fn stmt(&mut self, state: &mut FuncState) -> Result<Stmt, ParseError> {
        if self.consume("{") {
            let mut stmts = Vec::new();
            while !self.current().is_sign(self.source, "}") {
                stmts.push(self.stmt(state)?);
            }
            self.expect_sign("}")?;
            return Ok(Stmt::Block(stmts));
        }

        if self.current().kind == TokenKind::If {
            self.advance();
            self.expect_sign("(")?;
            let cond = self.expr(state)?;
            self.expect_sign(")")?;
            let then = Box::new(self.stmt(state)?);
            let alt = if self.current().kind == TokenKind::Else {
                self.advance();
                Some(Box::new(self.stmt(state)?))
            } else {
                None
            };
            return Ok(Stmt::If { cond, then, alt });
        }

        if self.current().kind == TokenKind::While {
            self.advance();
            self.expect_sign("(")?;
            let cond = self.expr(state)?;
            self.expect_sign(")")?;
            let body = Box::new(self.stmt(state)?);
            return Ok(Stmt::While { cond, body });
        }

        if self.current().kind == TokenKind::For {
            self.advance();
            self.expect_sign("(")?;
            let init = if !self.current().is_sign(self.source, ";") {
                Some(self.expr(state)?)
            } else {
                None
            };
            self.expect_sign(";")?;
            let cond = if !self.current().is_sign(self.source, ";") {
                Some(self.expr(state)?)
            } else {
                None
            };
            self.expect_sign(";")?;
            let step = if !self.current().is_sign(self.source, ")") {
                Some(self.expr(state)?)
            } else {
                None
            };
            self.expect_sign(")")?;
            let body = Box::new(self.stmt(state)?);
            return Ok(Stmt::For { init, cond, step, body });
        }

        if self.current().kind == TokenKind::Return {
            self.advance();
            let e = self.expr(state)?;
            self.expect_sign(";")?;
            return Ok(Stmt::Return(e));
        }

        let e = self.expr(state)?;
        self.expect_sign(";")?;
        Ok(Stmt::Expr(e))
    }

    // expr = assign
    fn expr(&mut self, state: &mut FuncState) -> Result<Expr, ParseError> {
        self.assign(state)
    }

    // assign = equality ("=" assign)?      (right-associative)
    fn assign(&mut self, state: &mut FuncState) -> Result<Expr, ParseError> {
        let lhs = self.equality(state)?;
        if self.consume("=") {
            let rhs = self.assign(state)?;
            return Ok(Expr::Assign { lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        Ok(lhs)
    }

    // equality = relational (("==" | "!=") relational)*
    fn equality(&mut self, state: &mut FuncState) -> Result<Expr, ParseError> {
        let mut lhs = self.relational(state)?;
        loop {
            let op = if self.consume("==") {
                BinOp::Eq
            } else if self.consume("!=") {
                BinOp::Ne
            } else {
                break;
            };
            let rhs = self.relational(state)?;
            lhs = Expr::Bin { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    // relational = add (("<" | "<=" | ">" | ">=") add)*
    fn relational(&mut self, state: &mut FuncState) -> Result<Expr, ParseError> {
        let mut lhs = self.add(state)?;
        loop {
            if self.consume("<=") {
                let rhs = self.add(state)?;
                lhs = Expr::Bin { op: BinOp::Lte, lhs: Box::new(lhs), rhs: Box::new(rhs) };
            } else if self.consume("<") {
                let rhs = self.add(state)?;
                lhs = Expr::Bin { op: BinOp::Lt, lhs: Box::new(lhs), rhs: Box::new(rhs) };
            } else if self.consume(">=") {
                // a >= b  =>  LTE(b, a)
                let rhs = self.add(state)?;
                lhs = Expr::Bin { op: BinOp::Lte, lhs: Box::new(rhs), rhs: Box::new(lhs) };
            } else if self.consume(">") {
                // a > b  =>  LT(b, a)
                let rhs = self.add(state)?;
                lhs = Expr::Bin { op: BinOp::Lt, lhs: Box::new(rhs), rhs: Box::new(lhs) };
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    // add = mul (("+" | "-") mul)*
    fn add(&mut self, state: &mut FuncState) -> Result<Expr, ParseError> {
        let mut lhs = self.mul(state)?;
        loop {
            let op = if self.consume("+") {
                BinOp::Add
            } else if self.consume("-") {
                BinOp::Sub
            } else {
                break;
            };
            let rhs = self.mul(state)?;
            lhs = Expr::Bin { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    // mul = unary (("*" | "/") unary)*
    fn mul(&mut self, state: &mut FuncState) -> Result<Expr, ParseError> {
        let mut lhs = self.unary(state)?;
        loop {
            let op = if self.consume("*") {
                BinOp::Mul
            } else if self.consume("/") {
                BinOp::Div
            } else {
                break;
            };
            let rhs = self.unary(state)?;
            lhs = Expr::Bin { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    // unary = "+" primary | "-" primary | primary
    fn unary(&mut self, state: &mut FuncState) -> Result<Expr, ParseError> {
        if self.consume("+") {
            return self.primary(state);
        }
        if self.consume("-") {
            let rhs = self.primary(state)?;
            return Ok(Expr::Bin {
                op: BinOp::Sub,
                lhs: Box::new(Expr::Num(0)),
                rhs: Box::new(rhs),
            });
        }
        self.primary(state)
    }

    // primary = "(" expr ")" | ident ("(" args? ")")? | num
    fn primary(&mut self, state: &mut FuncState) -> Result<Expr, ParseError> {
        if self.consume("(") {
            let e = self.expr(state)?;
            self.expect_sign(")")?;
            return Ok(e);
        }

        if self.current().kind == TokenKind::Ident {
            let tok = self.advance();
            let name = self.text(&tok).to_string();

            if self.consume("(") {
                let args = self.args(state)?;
                self.expect_sign(")")?;
                if args.len() > MAX_ARGS {
                    // The grammar does not bound argument count; the
                    // emitter does. Caught here so the error carries a
                    // source offset instead of surfacing as an internal
                    // error deep in code generation.
                    return Err(ParseError::new(
                        tok.start,
                        format!("call to `{}` has more than {} arguments", name, MAX_ARGS),
                    ));
                }
                return Ok(Expr::FunCall { name, args });
            }

            let offset = state.resolve(&name);
            return Ok(Expr::LVar { offset });
        }

        let tok = self.expect_kind(TokenKind::Num)?;
        Ok(Expr::Num(tok.value.unwrap()))
    }

    // args = assign ("," assign)*
    fn args(&mut self, state: &mut FuncState) -> Result<Vec<Expr>, ParseError> {
        if self.current().is_sign(self.source, ")") {
            return Ok(Vec::new());
        }
        let mut args = vec![self.assign(state)?];
        while self.consume(",") {
            args.push(self.assign(state)?);
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::lexer::tokenize;

    fn parse_src(src: &str) -> Program {
        let tokens = tokenize(src).unwrap();
        parse(src, &tokens).unwrap()
    }

    #[test]
    fn params_get_offsets_first() {
        let prog = parse_src("f(a, b){ c=1; return a; }");
        let names: Vec<_> = prog[0].locals.iter().map(|l| (l.name.clone(), l.offset)).collect();
        assert_eq!(names, vec![
            ("a".to_string(), 8),
            ("b".to_string(), 16),
            ("c".to_string(), 24),
        ]);
        assert_eq!(prog[0].params, 2);
    }

    #[test]
    fn repeated_name_reuses_offset() {
        let prog = parse_src("f(){ a=1; a=2; return a; }");
        assert_eq!(prog[0].locals.len(), 1);
        assert_eq!(prog[0].locals[0].offset, 8);
    }

    #[test]
    fn gt_lowers_to_swapped_lt() {
        let prog = parse_src("f(){ return 1 > 2; }");
        match &prog[0].body[0] {
            Stmt::Return(Expr::Bin { op: BinOp::Lt, lhs, rhs }) => {
                assert!(matches!(**lhs, Expr::Num(2)));
                assert!(matches!(**rhs, Expr::Num(1)));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn gte_lowers_to_swapped_lte() {
        let prog = parse_src("f(){ return 1 >= 2; }");
        match &prog[0].body[0] {
            Stmt::Return(Expr::Bin { op: BinOp::Lte, lhs, rhs }) => {
                assert!(matches!(**lhs, Expr::Num(2)));
                assert!(matches!(**rhs, Expr::Num(1)));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn unary_minus_lowers_to_zero_minus_x() {
        let prog = parse_src("f(){ return -5; }");
        match &prog[0].body[0] {
            Stmt::Return(Expr::Bin { op: BinOp::Sub, lhs, rhs }) => {
                assert!(matches!(**lhs, Expr::Num(0)));
                assert!(matches!(**rhs, Expr::Num(5)));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn assign_is_right_associative() {
        let prog = parse_src("f(){ a=b=1; return a; }");
        match &prog[0].body[0] {
            Stmt::Expr(Expr::Assign { rhs, .. }) => {
                assert!(matches!(**rhs, Expr::Assign { .. }));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn mul_binds_tighter_than_add() {
        let prog = parse_src("f(){ return 1+2*3; }");
        match &prog[0].body[0] {
            Stmt::Return(Expr::Bin { op: BinOp::Add, rhs, .. }) => {
                assert!(matches!(**rhs, Expr::Bin { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn too_many_arguments_is_a_parse_error() {
        let tokens = tokenize("f(){ return g(1,2,3,4,5,6,7); }").unwrap();
        let err = parse("f(){ return g(1,2,3,4,5,6,7); }", &tokens).unwrap_err();
        assert!(err.message.contains("more than 6"));
    }

    #[test]
    fn missing_semicolon_points_at_closing_brace() {
        let src = "main(){ return 1 }";
        let tokens = tokenize(src).unwrap();
        let err = parse(src, &tokens).unwrap_err();
        assert_eq!(err.offset, src.len() - 1);
    }
}
