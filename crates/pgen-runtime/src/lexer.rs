//! A small reference tokenizer producing [`Token`]s.

use crate::token::{names, Location, TerminalKind, Token, TokenValue};
use logos::Logos;

#[derive(Logos, Debug, Copy, Clone, PartialEq)]
#[logos(skip r"([ \t\r\f]+|#[^\n]*)")]
enum RawToken<'source> {
    #[token("\n")]
    Newline,

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    Float(&'source str),

    #[regex(r"[0-9]+")]
    Int(&'source str),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident(&'source str),

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str(&'source str),

    #[regex(r"'([^'\\\n]|\\.)'")]
    Char(&'source str),

    #[regex(r"\.\.\.?|\|\||&&|<=|>=|==|!=|[!%&^*/+\-<=>?@|:;()\[\]{},]")]
    Op(&'source str),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("{location}: unrecognized input `{text}`")]
    Unrecognized { text: String, location: Location },

    #[error("{location}: invalid number literal `{text}`")]
    InvalidNumber { text: String, location: Location },
}

/// Tokenizer over a source string.
///
/// Identifiers listed as keywords become keyword tokens. Operators are
/// always keyword tokens named by their lexeme.
pub struct Lexer<'source, 'k> {
    inner: logos::SpannedIter<'source, RawToken<'source>>,
    source: &'source str,
    line: u32,
    line_start: usize,
    keywords: Vec<&'k str>,
    newlines: bool,
}

impl<'source, 'k> Lexer<'source, 'k> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: RawToken::lexer(source).spanned(),
            source,
            line: 1,
            line_start: 0,
            keywords: names::KEYWORDS.to_vec(),
            newlines: false,
        }
    }

    /// Replace the default reserved words.
    pub fn with_keywords<I>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = &'k str>,
    {
        self.keywords = keywords.into_iter().collect();
        self
    }

    /// Emit `NEWLINE` tokens instead of skipping line breaks.
    pub fn with_newlines(mut self, newlines: bool) -> Self {
        self.newlines = newlines;
        self
    }
}

impl Iterator for Lexer<'_, '_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (raw, span) = self.inner.next()?;
            let column = u32::try_from(span.start - self.line_start + 1).unwrap_or(u32::MAX);
            let location = Location::new(self.line, column);

            let Ok(raw) = raw else {
                return Some(Err(LexError::Unrecognized {
                    text: self.source[span].to_owned(),
                    location,
                }));
            };

            let token = match raw {
                RawToken::Newline => {
                    self.line += 1;
                    self.line_start = span.end;
                    if !self.newlines {
                        continue;
                    }
                    Token::new(TerminalKind::Newline, location, TokenValue::None)
                }
                RawToken::Int(text) => match text.parse::<i64>() {
                    Ok(n) => Token::int(n, location),
                    Err(_) => {
                        return Some(Err(LexError::InvalidNumber {
                            text: text.to_owned(),
                            location,
                        }))
                    }
                },
                RawToken::Float(text) => match text.parse::<f64>() {
                    Ok(n) => Token::new(TerminalKind::Num, location, TokenValue::Float(n)),
                    Err(_) => {
                        return Some(Err(LexError::InvalidNumber {
                            text: text.to_owned(),
                            location,
                        }))
                    }
                },
                RawToken::Ident(name) => {
                    if self.keywords.contains(&name) {
                        Token::keyword(name, location)
                    } else {
                        Token::ident(name, location)
                    }
                }
                RawToken::Str(text) => Token::new(
                    TerminalKind::Str,
                    location,
                    TokenValue::Str(unescape(&text[1..text.len() - 1])),
                ),
                RawToken::Char(text) => {
                    let c = unescape(&text[1..text.len() - 1])
                        .chars()
                        .next()
                        .unwrap_or_default();
                    Token::new(TerminalKind::Char, location, TokenValue::Char(c))
                }
                RawToken::Op(op) => Token::keyword(op, location),
            };
            return Some(Ok(token));
        }
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Tokenize the whole source with the default keywords.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<String> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind.name().to_owned())
            .collect()
    }

    #[test]
    fn arithmetic() {
        assert_eq!(
            kinds("1 + 2*(x - 3.5)"),
            ["NUM", "+", "NUM", "*", "(", "IDENT", "-", "NUM", ")"]
        );
    }

    #[test]
    fn keywords_and_ranges() {
        assert_eq!(
            kinds("for i in 0..10"),
            ["for", "IDENT", "in", "NUM", "..", "NUM"]
        );
        assert_eq!(kinds("a <= b != c"), ["IDENT", "<=", "IDENT", "!=", "IDENT"]);
    }

    #[test]
    fn custom_keywords() {
        let tokens: Vec<_> = Lexer::new("if foo")
            .with_keywords(["foo"])
            .map(|t| t.unwrap().kind)
            .collect();
        assert_eq!(
            tokens,
            [TerminalKind::Ident, TerminalKind::Keyword("foo".into())]
        );
    }

    #[test]
    fn values_and_locations() {
        let tokens = tokenize("x = \"a\\tb\"\n  'c' 42").unwrap();
        assert_eq!(tokens[2].value, TokenValue::Str("a\tb".into()));
        assert_eq!(tokens[3].value, TokenValue::Char('c'));
        assert_eq!(tokens[3].location, Location::new(2, 3));
        assert_eq!(tokens[4].value, TokenValue::Int(42));
    }

    #[test]
    fn newlines_on_request() {
        let tokens: Vec<_> = Lexer::new("1\n2")
            .with_newlines(true)
            .map(|t| t.unwrap().kind)
            .collect();
        assert_eq!(tokens[1], TerminalKind::Newline);
    }

    #[test]
    fn unrecognized_input() {
        assert!(matches!(
            tokenize("1 $ 2"),
            Err(LexError::Unrecognized { location, .. }) if location == Location::new(1, 3)
        ));
    }
}
