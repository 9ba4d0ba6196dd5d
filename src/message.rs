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

//! Compiler diagnostics.

use std::fmt::{self, Display, Formatter};
use std::io::Write;

use colored::Colorize;

use crate::error::CompileError;

/// Diagnostic severity levels.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    /// A problem with the user's source text; lexing or parsing stopped.
    Error,

    /// A bug in the compiler itself: an internal invariant was violated.
    Fatal,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Severity::Error => write!(f, "{}", "error: ".red().bold()),
            Severity::Fatal => write!(f, "{}", "internal error: ".red().bold()),
        }
    }
}

/// Writes the source line, a caret underlining the offending offset, and
/// the error message to `sink`.
///
/// When the error carries no offset (an [`InternalError`][crate::error::InternalError]),
/// only the message is written.
pub fn render(sink: &mut impl Write, source: &str, error: &CompileError) -> std::io::Result<()> {
    let severity = if error.is_internal() { Severity::Fatal } else { Severity::Error };

    if let Some(offset) = error.offset() {
        writeln!(sink, "{}", source)?;
        writeln!(sink, "{}^ {}{}", " ".repeat(offset), severity, error)?;
    } else {
        writeln!(sink, "{}{}", severity, error)?;
    }

    Ok(())
}
