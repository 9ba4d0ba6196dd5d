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

//! Structured error types for the three compiler stages.

use thiserror::Error;

/// Failure to tokenize a source string.
///
/// Carries the byte offset at which no lexer rule matched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LexError {
    pub offset: usize,
    pub message: String,
}

impl LexError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self { offset, message: message.into() }
    }
}

/// Failure to parse a token sequence into the AST.
///
/// Carries the byte offset of the token that violated the grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self { offset, message: message.into() }
    }
}

/// A programming error: an AST shape the emitter does not expect.
///
/// Unlike [`LexError`] and [`ParseError`], this signals a bug in the
/// compiler itself (an unreachable node kind, a malformed invariant that
/// the parser should have prevented), not a problem with the user's
/// source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("assign target is not a local variable")]
    AssignTargetNotLocal,

    #[error("call to `{name}` has {count} arguments, more than the 6 supported")]
    TooManyArguments { name: String, count: usize },

    #[error("unreachable AST node reached the emitter")]
    UnreachableNode,
}

/// A compiler-stage error, unified for the top-level driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl CompileError {
    /// The byte offset to underline, if this error has one.
    ///
    /// `InternalError` has no source offset: it is a compiler bug, not a
    /// location in the user's program.
    pub fn offset(&self) -> Option<usize> {
        match self {
            CompileError::Lex(e) => Some(e.offset),
            CompileError::Parse(e) => Some(e.offset),
            CompileError::Internal(_) => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal(_))
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
