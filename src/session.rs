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

//! Drives the lexer, parser, and emitter over one source string.

use log::info;

use crate::codegen;
use crate::error::Result;
use crate::lang::{lexer, parser};

/// A compilation session: one source string in, one assembly listing out.
///
/// Holds no state across calls; [`compile`][Session::compile] is the
/// entire surface.
#[derive(Debug, Default)]
pub struct Session;

impl Session {
    pub fn new() -> Self {
        Self
    }

    /// Runs the full pipeline: lex, parse, emit.
    pub fn compile(&self, source: &str) -> Result<String> {
        info!("tokenizing {} bytes of source", source.len());
        let tokens = lexer::tokenize(source)?;

        info!("parsing {} tokens", tokens.len());
        let program = parser::parse(source, &tokens)?;

        info!("emitting {} function(s)", program.len());
        let asm = codegen::emit(&program)?;

        Ok(asm)
    }
}
