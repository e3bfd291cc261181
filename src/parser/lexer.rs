//! Python tokenizer
//!
//! Just enough of Python's lexical grammar to find statement boundaries:
//! strings (all quote styles and prefixes), comments, brackets, and
//! backslash continuations. Tokens are grouped into logical lines, each
//! tagged with the indentation of the physical line it starts on.

use super::ParseError;

/// A string literal as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StringLiteral {
    /// Lowercased prefix letters (`r`, `b`, `f`, `u`, `rb`, ...)
    pub prefix: String,
    /// Raw text between the quotes, escapes not yet decoded
    pub body: String,
}

impl StringLiteral {
    pub fn is_raw(&self) -> bool {
        self.prefix.contains('r')
    }

    pub fn is_bytes(&self) -> bool {
        self.prefix.contains('b')
    }

    pub fn is_formatted(&self) -> bool {
        self.prefix.contains('f')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Name(String),
    Str(StringLiteral),
    Number,
    Op(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    pub fn is_name(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Name(n) if n == name)
    }

    pub fn is_op(&self, op: &str) -> bool {
        matches!(&self.kind, TokenKind::Op(o) if o == op)
    }
}

/// One logical line: a statement header or simple statement, with all
/// bracketed and continued physical lines folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogicalLine {
    /// Indentation width of the first physical line
    pub indent: usize,
    /// 1-based line number where the logical line starts
    pub line: usize,
    pub tokens: Vec<Token>,
}

impl LogicalLine {
    pub fn starts_with_name(&self, name: &str) -> bool {
        self.tokens.first().is_some_and(|t| t.is_name(name))
    }
}

const THREE_CHAR_OPS: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];
const TWO_CHAR_OPS: &[&str] = &[
    "**", "//", "->", ":=", "==", "!=", "<=", ">=", "<<", ">>", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "@=",
];

/// Split Python source into logical lines.
pub(crate) fn logical_lines(source: &str) -> Result<Vec<LogicalLine>, ParseError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        let normalized = source.replace("\r\n", "\n").replace('\r', "\n");
        Self {
            chars: normalized.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(mut self) -> Result<Vec<LogicalLine>, ParseError> {
        let mut lines = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut brackets: Vec<(char, usize)> = Vec::new();
        let mut at_line_start = true;
        let mut indent = 0;
        let mut start_line = 1;

        while let Some(c) = self.peek() {
            if at_line_start {
                indent = self.skip_indentation();
                at_line_start = false;
                continue;
            }

            let token = match c {
                '\n' => {
                    self.pos += 1;
                    self.line += 1;
                    if brackets.is_empty() {
                        if !current.is_empty() {
                            lines.push(LogicalLine {
                                indent,
                                line: start_line,
                                tokens: std::mem::take(&mut current),
                            });
                        }
                        at_line_start = true;
                    }
                    continue;
                }
                ' ' | '\t' | '\x0c' => {
                    self.pos += 1;
                    continue;
                }
                '#' => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                    continue;
                }
                '\\' => {
                    if self.peek_at(1) == Some('\n') {
                        self.pos += 2;
                        self.line += 1;
                        continue;
                    }
                    return Err(ParseError::UnexpectedCharacter {
                        found: c,
                        line: self.line,
                    });
                }
                '"' | '\'' => self.lex_string(String::new())?,
                c if c.is_alphabetic() || c == '_' => self.lex_name_or_prefixed_string()?,
                c if c.is_ascii_digit()
                    || (c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) =>
                {
                    self.lex_number()
                }
                '(' | '[' | '{' => {
                    brackets.push((c, self.line));
                    self.pos += 1;
                    self.op_token(c.to_string())
                }
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match brackets.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => {
                            return Err(ParseError::UnbalancedBracket {
                                found: c,
                                line: self.line,
                            })
                        }
                    }
                    self.pos += 1;
                    self.op_token(c.to_string())
                }
                _ => self.lex_operator(),
            };

            if current.is_empty() {
                start_line = token.line;
            }
            current.push(token);
        }

        if let Some((open, line)) = brackets.pop() {
            return Err(ParseError::UnclosedBracket { open, line });
        }
        if !current.is_empty() {
            lines.push(LogicalLine {
                indent,
                line: start_line,
                tokens: current,
            });
        }

        Ok(lines)
    }

    fn skip_indentation(&mut self) -> usize {
        let mut width = 0;
        while let Some(c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.pos += 1;
        }
        width
    }

    fn op_token(&self, op: String) -> Token {
        Token {
            kind: TokenKind::Op(op),
            line: self.line,
        }
    }

    fn lex_operator(&mut self) -> Token {
        let rest: String = self.chars[self.pos..].iter().take(3).collect();
        for width in [3, 2] {
            let table = if width == 3 { THREE_CHAR_OPS } else { TWO_CHAR_OPS };
            if let Some(op) = table.iter().find(|op| rest.starts_with(**op)) {
                self.pos += width;
                return self.op_token(op.to_string());
            }
        }
        let c = self.chars[self.pos];
        self.pos += 1;
        self.op_token(c.to_string())
    }

    fn lex_number(&mut self) -> Token {
        let line = self.line;
        let start = self.pos;
        while let Some(c) = self.peek() {
            let is_exponent_sign = (c == '+' || c == '-')
                && matches!(self.chars.get(self.pos.wrapping_sub(1)), Some('e' | 'E'))
                && !self.chars[start..self.pos]
                    .iter()
                    .take(2)
                    .any(|c| matches!(c, 'x' | 'X'));
            if c.is_alphanumeric() || c == '_' || c == '.' || is_exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        Token {
            kind: TokenKind::Number,
            line,
        }
    }

    fn lex_name_or_prefixed_string(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        if matches!(self.peek(), Some('"' | '\'')) && is_string_prefix(&name) {
            return self.lex_string(name.to_ascii_lowercase());
        }

        Ok(Token {
            kind: TokenKind::Name(name),
            line,
        })
    }

    fn lex_string(&mut self, prefix: String) -> Result<Token, ParseError> {
        let start_line = self.line;
        let quote = self.chars[self.pos];
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        let mut body = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(ParseError::UnterminatedString { line: start_line });
            };

            if c == '\\' {
                body.push(c);
                self.pos += 1;
                if let Some(escaped) = self.peek() {
                    if escaped == '\n' {
                        self.line += 1;
                    }
                    body.push(escaped);
                    self.pos += 1;
                }
                continue;
            }

            if c == quote {
                if !triple {
                    self.pos += 1;
                    break;
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.pos += 3;
                    break;
                }
            }

            if c == '\n' {
                if !triple {
                    return Err(ParseError::UnterminatedString { line: start_line });
                }
                self.line += 1;
            }

            body.push(c);
            self.pos += 1;
        }

        Ok(Token {
            kind: TokenKind::Str(StringLiteral { prefix, body }),
            line: start_line,
        })
    }
}

fn is_string_prefix(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}
