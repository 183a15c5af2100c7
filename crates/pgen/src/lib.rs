//! LALR(1) parser generator.
//!
//! A grammar text is compiled into an [`Automaton`], whose table drives the
//! shift-reduce parser of [`pgen_runtime`] to build an AST.

pub mod automaton;
pub mod emit;
pub mod error;
pub mod grammar;
pub mod lalr;
pub mod lr0;
pub mod rules;
pub mod sets;
pub mod symbol;
pub mod table;
pub mod types;
mod util;

pub use crate::{
    automaton::{Automaton, Config, Limits, LookaheadMode},
    error::GrammarError,
    symbol::SymbolRegistry,
};
pub use pgen_runtime as runtime;

use pgen_runtime::{lexer::LexError, lexer::Lexer, AstNode, ParseError, Token};
use std::fmt;

/// Compile the grammar text with the default terminals and limits.
pub fn build(source: &str) -> Result<Automaton, GrammarError> {
    Automaton::generate(source)
}

/// Parse a token stream with the automaton's table.
pub fn parse<I, E>(automaton: &Automaton, tokens: I) -> Result<AstNode, ParseError<E>>
where
    I: IntoIterator<Item = Result<Token, E>>,
    E: fmt::Display,
{
    pgen_runtime::parse(automaton, tokens)
}

/// Tokenize `source` with the reference lexer and parse it.
///
/// Identifiers the grammar uses as literals are lexed as keywords.
pub fn parse_str(automaton: &Automaton, source: &str) -> Result<AstNode, ParseError<LexError>> {
    let lexer = Lexer::new(source).with_keywords(automaton.keywords().iter().map(String::as_str));
    parse(automaton, lexer)
}
