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

//! Front end: lexical analysis, the abstract syntax tree, and the parser.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;
