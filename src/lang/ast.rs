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

//! The abstract syntax tree produced by the parser and consumed by the
//! code generator.

/// A binary operator, after normalization.
///
/// `>` and `>=` do not appear here: the parser lowers them to `Lt`/`Lte`
/// with swapped operands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Lte,
}

/// An expression node.
#[derive(Clone, Debug)]
pub enum Expr {
    /// An integer literal.
    Num(i64),

    /// A reference to a local variable, by its stack-frame offset.
    LVar { offset: usize },

    /// A binary operation.
    Bin { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },

    /// `lhs = rhs`. `lhs` must be an `LVar`; the parser enforces this, and
    /// the emitter treats violation as an internal error.
    Assign { lhs: Box<Expr>, rhs: Box<Expr> },

    /// A call to a named function with up to 6 arguments.
    FunCall { name: String, args: Vec<Expr> },
}

/// A statement node.
#[derive(Clone, Debug)]
pub enum Stmt {
    /// A bare expression, evaluated and discarded.
    Expr(Expr),

    /// `return expr;`
    Return(Expr),

    /// `if (cond) then [else alt]`
    If { cond: Expr, then: Box<Stmt>, alt: Option<Box<Stmt>> },

    /// `while (cond) body`
    While { cond: Expr, body: Box<Stmt> },

    /// `for ([init]; [cond]; [step]) body`
    For {
        init: Option<Expr>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },

    /// `{ stmts... }`
    Block(Vec<Stmt>),
}

/// A local variable's slot in a function's stack frame.
#[derive(Clone, Debug)]
pub struct LocalVar {
    pub name: String,

    /// Byte offset from `rbp`, assigned in first-encounter order starting
    /// at 8 and increasing by 8 (parameters are encountered first).
    pub offset: usize,
}

/// A function definition: a name, up to 6 parameters, and a body.
///
/// `locals` holds every local variable in the function, parameters
/// included, in the order they were first encountered; `params` is the
/// count of leading entries in `locals` that are parameters.
#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    pub params: usize,
    pub locals: Vec<LocalVar>,
    pub body: Vec<Stmt>,
}

impl Function {
    /// Total bytes to reserve on the stack for this function's locals.
    pub fn frame_size(&self) -> usize {
        self.locals.len() * 8
    }
}

/// A translation unit: the functions defined in one source file.
pub type Program = Vec<Function>;
