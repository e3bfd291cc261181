//! Python module scanner
//!
//! Finds the functions defined directly in a module body without running
//! the module. The view matches what Python's own `ast` reports for the
//! module's top-level `def` statements:
//!
//! - only plain `def` at column zero counts (`async def`, methods and
//!   nested or conditional definitions do not)
//! - parameters are the regular positional-or-keyword ones; positional-only,
//!   keyword-only, `*args` and `**kwargs` are left out
//! - the docstring is cleaned like `inspect.cleandoc`

mod docstring;
mod error;
mod lexer;

#[cfg(test)]
mod tests;

pub use docstring::clean_doc;
pub use error::ParseError;

use std::path::Path;

use crate::models::{ModuleInfo, PythonFunction};
use docstring::docstring_from_tokens;
use lexer::{logical_lines, LogicalLine, Token, TokenKind};

/// Read a Python file and extract its top-level functions.
///
/// The module name is the file stem.
pub fn extract_top_level_functions(path: &Path) -> Result<ModuleInfo, ParseError> {
    let bytes = std::fs::read(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let source = String::from_utf8(bytes).map_err(|_| ParseError::Encoding {
        path: path.display().to_string(),
    })?;
    let source = match source.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => source,
    };

    let functions = parse_functions(&source)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::debug!(
        "Scanned {}: {} top-level function(s)",
        path.display(),
        functions.len()
    );

    Ok(ModuleInfo {
        name,
        path: path.to_path_buf(),
        source,
        functions,
    })
}

/// Extract top-level functions from Python source text.
pub fn parse_functions(source: &str) -> Result<Vec<PythonFunction>, ParseError> {
    let lines = logical_lines(source)?;
    let mut functions = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if line.indent != 0 || !line.starts_with_name("def") {
            continue;
        }

        let header = parse_def_header(line)?;
        let doc = match header.inline_body {
            Some(start) => docstring_from_tokens(&line.tokens[start..]),
            None => lines
                .get(idx + 1)
                .filter(|next| next.indent > 0)
                .and_then(|next| docstring_from_tokens(&next.tokens)),
        };

        functions.push(PythonFunction {
            name: header.name,
            args: header.args,
            doc,
        });
    }

    Ok(functions)
}

struct DefHeader {
    name: String,
    args: Vec<String>,
    /// Index of the first body token when the body shares the header line
    inline_body: Option<usize>,
}

fn parse_def_header(line: &LogicalLine) -> Result<DefHeader, ParseError> {
    let tokens = &line.tokens;

    let name = match tokens.get(1).map(|t| &t.kind) {
        Some(TokenKind::Name(name)) => name.clone(),
        _ => return Err(ParseError::invalid_definition(line.line, "expected function name")),
    };

    let mut idx = 2;
    // PEP 695 type parameters: def f[T](x: T)
    if tokens.get(idx).is_some_and(|t| t.is_op("[")) {
        idx = matching_close(tokens, idx)
            .ok_or_else(|| ParseError::invalid_definition(line.line, "unclosed type parameters"))?
            + 1;
    }

    if !tokens.get(idx).is_some_and(|t| t.is_op("(")) {
        return Err(ParseError::invalid_definition(
            line.line,
            format!("expected '(' after '{}'", name),
        ));
    }
    let close = matching_close(tokens, idx)
        .ok_or_else(|| ParseError::invalid_definition(line.line, "unclosed parameter list"))?;
    let args = positional_args(&tokens[idx + 1..close]);

    let colon = top_level_position(tokens, close + 1, ":").ok_or_else(|| {
        ParseError::invalid_definition(line.line, format!("missing ':' after '{}(...)'", name))
    })?;
    let inline_body = (colon + 1 < tokens.len()).then_some(colon + 1);

    Ok(DefHeader {
        name,
        args,
        inline_body,
    })
}

/// Regular parameters from the tokens between a parameter list's parentheses.
fn positional_args(params: &[Token]) -> Vec<String> {
    let mut args = Vec::new();
    let mut keyword_only = false;

    for group in split_parameters(params) {
        let Some(first) = group.first() else {
            continue;
        };
        match &first.kind {
            // everything before `/` was positional-only
            TokenKind::Op(op) if op == "/" => args.clear(),
            TokenKind::Op(op) if op == "*" => keyword_only = true,
            TokenKind::Op(op) if op == "**" => {}
            TokenKind::Name(name) if !keyword_only => args.push(name.clone()),
            _ => {}
        }
    }

    args
}

/// Split a parameter list on its separating commas.
///
/// Commas between a `lambda` keyword and its `:` belong to the lambda's own
/// parameters, so `a=lambda x, y: x + y` stays one group.
fn split_parameters(params: &[Token]) -> Vec<&[Token]> {
    let mut groups = Vec::new();
    let mut depth = 0;
    let mut open_lambdas = 0;
    let mut start = 0;
    for (idx, token) in params.iter().enumerate() {
        if depth == 0 {
            if token.is_name("lambda") {
                open_lambdas += 1;
            } else if open_lambdas > 0 && token.is_op(":") {
                open_lambdas -= 1;
            } else if open_lambdas == 0 && token.is_op(",") {
                groups.push(&params[start..idx]);
                start = idx + 1;
            }
        }
        depth += bracket_delta(token);
    }
    groups.push(&params[start..]);
    groups
}

fn bracket_delta(token: &Token) -> i32 {
    match &token.kind {
        TokenKind::Op(op) => match op.as_str() {
            "(" | "[" | "{" => 1,
            ")" | "]" | "}" => -1,
            _ => 0,
        },
        _ => 0,
    }
}

/// Index of the bracket closing the one opened at `open`.
fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0;
    for (offset, token) in tokens[open..].iter().enumerate() {
        depth += bracket_delta(token);
        if depth == 0 {
            return Some(open + offset);
        }
    }
    None
}

/// First occurrence of `op` at bracket depth zero, starting at `from`.
fn top_level_position(tokens: &[Token], from: usize, op: &str) -> Option<usize> {
    let mut depth = 0;
    for (offset, token) in tokens.get(from..)?.iter().enumerate() {
        if depth == 0 && token.is_op(op) {
            return Some(from + offset);
        }
        depth += bracket_delta(token);
    }
    None
}
