//! Runtime for parsers generated by `pgen`: the table-driven driver and the
//! AST it builds.

pub mod action;
pub mod ast;
pub mod definition;
pub mod lexer;
pub mod parser;
pub mod token;

pub use crate::{
    ast::AstNode,
    definition::{Action, ParseTable},
    parser::{parse, ParseError, Parser},
    token::{Location, TerminalKind, Token, TokenValue},
};
