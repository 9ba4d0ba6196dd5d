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

//! Turns a source string into a token sequence.

use log::trace;

use crate::error::LexError;
use crate::lang::token::{Token, TokenKind};

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("return", TokenKind::Return),
    ("if",     TokenKind::If),
    ("else",   TokenKind::Else),
    ("while",  TokenKind::While),
    ("for",    TokenKind::For),
];

const MULTI_SIGNS:  &[&str] = &[">=", "<=", "==", "!="];
const SINGLE_SIGNS: &[char] = &[
    '>', '<', '(', ')', '{', '}', '+', '-', '*', '/', ';', '=', ',',
];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Converts `source` into a token sequence ending in exactly one EOF.
///
/// Tries rules in a fixed order at each position: keywords, then
/// multi-character signs, then single-character signs, then numbers,
/// then identifiers. The first rule that matches wins.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let c = bytes[pos] as char;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if let Some(tok) = try_keyword(source, pos) {
            trace!("lexed keyword at {}", pos);
            pos += tok.len;
            tokens.push(tok);
            continue;
        }

        if let Some(tok) = try_multi_sign(source, pos) {
            pos += tok.len;
            tokens.push(tok);
            continue;
        }

        if let Some(tok) = try_single_sign(source, pos) {
            pos += tok.len;
            tokens.push(tok);
            continue;
        }

        if let Some(tok) = try_number(source, pos) {
            pos += tok.len;
            tokens.push(tok);
            continue;
        }

        if let Some(tok) = try_ident(source, pos) {
            pos += tok.len;
            tokens.push(tok);
            continue;
        }

        return Err(LexError::new(pos, "unrecognized character"));
    }

    tokens.push(Token::new(TokenKind::Eof, bytes.len(), 0));
    Ok(tokens)
}

fn try_keyword(source: &str, pos: usize) -> Option<Token> {
    let rest = &source[pos..];
    for (text, kind) in KEYWORDS {
        if let Some(tail) = rest.strip_prefix(text) {
            let boundary = tail.chars().next().map_or(true, |c| !is_ident_continue(c));
            if boundary {
                return Some(Token::new(*kind, pos, text.len()));
            }
        }
    }
    None
}

fn try_multi_sign(source: &str, pos: usize) -> Option<Token> {
    let rest = &source[pos..];
    for sign in MULTI_SIGNS {
        if rest.starts_with(sign) {
            return Some(Token::new(TokenKind::Sign, pos, sign.len()));
        }
    }
    None
}

fn try_single_sign(source: &str, pos: usize) -> Option<Token> {
    let c = source[pos..].chars().next()?;
    if SINGLE_SIGNS.contains(&c) {
        Some(Token::new(TokenKind::Sign, pos, c.len_utf8()))
    } else {
        None
    }
}

fn try_number(source: &str, pos: usize) -> Option<Token> {
    let rest = &source[pos..];
    let len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    let text = &rest[..len];
    // A maximal decimal run is expected to fit a machine int; overflow
    // here would indicate a pathological input, not a lexer bug.
    let value: i64 = text.parse().unwrap_or(i64::MAX);
    Some(Token::with_value(TokenKind::Num, pos, len, value))
}

fn try_ident(source: &str, pos: usize) -> Option<Token> {
    let mut chars = source[pos..].char_indices();
    let (_, first) = chars.next()?;
    if !is_ident_start(first) {
        return None;
    }
    let mut len = first.len_utf8();
    for (offset, c) in chars {
        if !is_ident_continue(c) {
            break;
        }
        len = offset + c.len_utf8();
    }
    Some(Token::new(TokenKind::Ident, pos, len))
}
