//! Docstring extraction and cleanup

use std::iter::Peekable;
use std::str::Chars;

use super::lexer::{Token, TokenKind};
use super::{matching_close, top_level_position};

/// Docstring of a body whose first statement starts at `tokens`.
///
/// The statement qualifies when it is one or more adjacent plain string
/// literals, possibly wrapped in parentheses and optionally terminated by
/// `;`. Bytes and f-strings never count.
pub(crate) fn docstring_from_tokens(tokens: &[Token]) -> Option<String> {
    let end = top_level_position(tokens, 0, ";").unwrap_or(tokens.len());
    let literals = unparenthesize(&tokens[..end]);
    if literals.is_empty() || !literals.iter().all(|t| matches!(t.kind, TokenKind::Str(_))) {
        return None;
    }

    let mut raw_doc = String::new();
    for token in literals {
        let TokenKind::Str(lit) = &token.kind else {
            return None;
        };
        if lit.is_bytes() || lit.is_formatted() {
            return None;
        }
        if lit.is_raw() {
            raw_doc.push_str(&lit.body);
        } else {
            raw_doc.push_str(&decode_escapes(&lit.body));
        }
    }

    Some(clean_doc(&raw_doc))
}

/// Strip parentheses that enclose the whole expression.
fn unparenthesize(mut expr: &[Token]) -> &[Token] {
    while expr.first().is_some_and(|t| t.is_op("("))
        && matching_close(expr, 0) == Some(expr.len() - 1)
    {
        expr = &expr[1..expr.len() - 1];
    }
    expr
}

/// Decode Python string escapes in a non-raw literal body.
pub(crate) fn decode_escapes(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None => out.push('\\'),
            Some('\n') => {}
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\x0b'),
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(value));
            }
            Some(kind @ ('x' | 'u' | 'U')) => {
                let width = match kind {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                match read_hex(&mut chars, width).and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(kind);
                    }
                }
            }
            Some('N') => match read_char_name(&mut chars) {
                Some(decoded) => out.push(decoded),
                None => out.push_str("\\N"),
            },
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

/// Consume exactly `width` hex digits, or nothing at all.
fn read_hex(chars: &mut Peekable<Chars<'_>>, width: usize) -> Option<u32> {
    let mut lookahead = chars.clone();
    let mut value = 0u32;
    for _ in 0..width {
        let digit = lookahead.next()?.to_digit(16)?;
        value = value * 16 + digit;
    }
    *chars = lookahead;
    Some(value)
}

/// Consume a `{NAME}` suffix naming a Unicode character, or nothing at all.
fn read_char_name(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    let mut lookahead = chars.clone();
    if lookahead.next()? != '{' {
        return None;
    }
    let mut name = String::new();
    loop {
        match lookahead.next()? {
            '}' => break,
            c => name.push(c),
        }
    }
    let decoded = unicode_names2::character(&name.to_ascii_uppercase())?;
    *chars = lookahead;
    Some(decoded)
}

/// Normalize docstring indentation the way Python's `inspect.cleandoc` does.
///
/// The first line loses its leading whitespace, the common margin of the
/// remaining non-blank lines is removed, and blank lines at either end are
/// dropped.
pub fn clean_doc(doc: &str) -> String {
    let expanded = expand_tabs(doc, 8);
    let mut lines: Vec<String> = expanded.split('\n').map(str::to_string).collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter_map(|line| {
            let content = line.trim_start();
            if content.is_empty() {
                None
            } else {
                Some(line.chars().count() - content.chars().count())
            }
        })
        .min();

    lines[0] = lines[0].trim_start().to_string();
    if let Some(margin) = margin {
        for line in lines.iter_mut().skip(1) {
            *line = line.chars().skip(margin).collect();
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }

    lines.join("\n")
}

fn expand_tabs(text: &str, tab_size: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let spaces = tab_size - column % tab_size;
                out.extend(std::iter::repeat(' ').take(spaces));
                column += spaces;
            }
            '\n' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}
