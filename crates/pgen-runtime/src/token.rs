//! Terminal tokens consumed by the parser driver.

use std::fmt;

/// Names of the terminal classes every symbol registry knows about.
pub mod names {
    pub const EOF: &str = "EOF";
    pub const EPSILON: &str = "EPSILON";
    pub const IDENT: &str = "IDENT";
    pub const NUM: &str = "NUM";
    pub const STRING: &str = "STRING";
    pub const CHAR: &str = "CHAR";
    pub const NEWLINE: &str = "NEWLINE";
    pub const INDENT: &str = "INDENT";
    pub const DEDENT: &str = "DEDENT";

    /// Token classes, in registration order. `EOF` and `EPSILON` always come first.
    pub const TOKEN_CLASSES: &[&str] = &[
        EOF, EPSILON, IDENT, NUM, STRING, CHAR, NEWLINE, INDENT, DEDENT,
    ];

    /// Reserved words recognized as keyword tokens by default.
    pub const KEYWORDS: &[&str] = &[
        "import", "extern", "type", "if", "else", "then", "in", "for", "while", "unary", "binary",
        "var", "true", "false",
    ];

    /// Operator and punctuation lexemes.
    pub const OPERATORS: &[&str] = &[
        "..", "...", "||", "&&", "!", "%", "&", "^", "*", "/", "+", "-", "<", "=", ">", "<=", ">=",
        "==", "!=", "?", "@", "|", ":", ";", "(", ")", "[", "]", "{", "}", ",",
    ];
}

/// A position in the source text. Both fields are 1-based.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The terminal class of a token.
///
/// Keywords and operators carry their lexeme, which is also the name of
/// the terminal symbol they are matched against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TerminalKind {
    Eof,
    Ident,
    Num,
    Str,
    Char,
    Newline,
    Indent,
    Dedent,
    Keyword(String),
}

impl TerminalKind {
    /// The name of the terminal symbol this kind maps onto.
    pub fn name(&self) -> &str {
        match self {
            Self::Eof => names::EOF,
            Self::Ident => names::IDENT,
            Self::Num => names::NUM,
            Self::Str => names::STRING,
            Self::Char => names::CHAR,
            Self::Newline => names::NEWLINE,
            Self::Indent => names::INDENT,
            Self::Dedent => names::DEDENT,
            Self::Keyword(lexeme) => lexeme,
        }
    }
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TerminalKind,
    pub location: Location,
    pub value: TokenValue,
}

impl Token {
    pub fn new(kind: TerminalKind, location: Location, value: TokenValue) -> Self {
        Self {
            kind,
            location,
            value,
        }
    }

    pub fn eof(location: Location) -> Self {
        Self::new(TerminalKind::Eof, location, TokenValue::None)
    }

    pub fn keyword(lexeme: impl Into<String>, location: Location) -> Self {
        Self::new(
            TerminalKind::Keyword(lexeme.into()),
            location,
            TokenValue::None,
        )
    }

    pub fn ident(name: impl Into<String>, location: Location) -> Self {
        Self::new(TerminalKind::Ident, location, TokenValue::Str(name.into()))
    }

    pub fn int(value: i64, location: Location) -> Self {
        Self::new(TerminalKind::Num, location, TokenValue::Int(value))
    }
}
