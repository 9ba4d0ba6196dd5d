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

#![allow(dead_code)]

mod codegen;
mod error;
mod lang;
mod message;
mod session;
mod util;

use std::env::args;
use std::io::{stderr, stdout, IsTerminal, Write};
use std::process::ExitCode;

use session::Session;

/// The name of the compiler.
pub const PROGRAM_NAME: &str = "cminic";

fn main() -> ExitCode {
    env_logger::init();
    colored::control::set_override(stderr().is_terminal());

    let mut argv = args();
    argv.next();

    let source = match (argv.next(), argv.next()) {
        (Some(source), None) => source,
        _ => {
            let _ = writeln!(stderr(), "invalid argument count");
            return ExitCode::FAILURE;
        }
    };

    let asm = match Session::new().compile(&source) {
        Ok(asm) => asm,
        Err(err) => {
            let _ = message::render(&mut stderr(), &source, &err);
            return ExitCode::FAILURE;
        }
    };

    if write!(stdout(), "{}", asm).is_err() {
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
