//! Parser.

use crate::{
    action::{self, ActionError},
    ast::{AstNode, NodeKind},
    definition::{Action, ParseTable},
    token::{Location, Token},
};
use std::fmt;

/// The shift-reduce driver over a parse table.
///
/// The table is never mutated, so one table can back any number of parsers.
/// A parser owns its stack, which is reset at the start of every parse.
#[derive(Debug)]
pub struct Parser<TDef> {
    definition: TDef,
    stack: Vec<(u16, Option<AstNode>)>,
}

impl<TDef> Parser<TDef>
where
    TDef: ParseTable,
{
    /// Create an instance of `Parser` using the specified parse table.
    pub fn new(definition: TDef) -> Self {
        Self {
            definition,
            stack: vec![],
        }
    }

    pub fn definition(&self) -> &TDef {
        &self.definition
    }

    /// Consume the tokens until the input is accepted or rejected.
    ///
    /// An `EOF` token is synthesized once the iterator is exhausted.
    pub fn parse<I, E>(&mut self, tokens: I) -> Result<AstNode, ParseError<E>>
    where
        I: IntoIterator<Item = Result<Token, E>>,
        E: fmt::Display,
    {
        let span = tracing::trace_span!("parse");
        let _entered = span.enter();

        self.stack.clear();
        self.stack.push((0, None));

        let mut tokens = tokens.into_iter();
        let mut last_location = Location::default();
        let mut lookahead = next_token(&mut tokens, &mut last_location)?;
        let mut terminal = self.terminal_of(&lookahead)?;

        loop {
            let current = self
                .stack
                .last()
                .map(|(state, _)| *state)
                .ok_or(ParseError::EmptyStack)?;

            match self.definition.action(current, terminal) {
                Action::Shift(next) => {
                    tracing::trace!("shift {} => S#{:03}", lookahead.kind, next);
                    let upcoming = next_token(&mut tokens, &mut last_location)?;
                    let token = std::mem::replace(&mut lookahead, upcoming);
                    terminal = self.terminal_of(&lookahead)?;
                    self.stack.push((next, Some(AstNode::leaf(token))));
                }

                Action::Reduce(rule_index) => {
                    let rule = self
                        .definition
                        .rule(rule_index)
                        .ok_or(ParseError::UnknownRule(rule_index))?;
                    tracing::trace!("reduce R#{:03} {}", rule_index, rule.action);

                    if self.stack.len() <= rule.symbol_count {
                        return Err(ParseError::EmptyStack);
                    }
                    let children: Vec<_> = self
                        .stack
                        .drain(self.stack.len() - rule.symbol_count..)
                        .map(|(_, node)| node)
                        .collect();
                    let node = action::reduce(rule.action, children, lookahead.location)?;

                    let top = self
                        .stack
                        .last()
                        .map(|(state, _)| *state)
                        .ok_or(ParseError::EmptyStack)?;
                    let next =
                        self.definition
                            .goto(top, rule.lhs)
                            .ok_or(ParseError::MissingGoto {
                                state: top,
                                nonterminal: rule.lhs,
                            })?;
                    self.stack.push((next, node));
                }

                Action::Accept => {
                    tracing::trace!("accept");
                    let (_, node) = self.stack.pop().ok_or(ParseError::EmptyStack)?;
                    self.stack.clear();
                    // an empty derivation of the start symbol
                    return Ok(node.unwrap_or_else(|| {
                        AstNode::new(NodeKind::Block(vec![]), lookahead.location)
                    }));
                }

                Action::Error | Action::Goto(_) => {
                    let name = self
                        .definition
                        .symbol_name(terminal)
                        .unwrap_or_default()
                        .to_owned();
                    tracing::trace!("no action for {} in S#{:03}", name, current);
                    self.stack.clear();
                    return Err(ParseError::Syntax {
                        state: current,
                        terminal,
                        name,
                        location: lookahead.location,
                    });
                }
            }
        }
    }

    fn terminal_of<E>(&self, token: &Token) -> Result<u16, ParseError<E>>
    where
        E: fmt::Display,
    {
        self.definition
            .terminal_index(token.kind.name())
            .ok_or_else(|| ParseError::UnknownTerminal {
                name: token.kind.name().to_owned(),
                location: token.location,
            })
    }
}

fn next_token<I, E>(tokens: &mut I, last_location: &mut Location) -> Result<Token, ParseError<E>>
where
    I: Iterator<Item = Result<Token, E>>,
    E: fmt::Display,
{
    match tokens.next().transpose().map_err(ParseError::Lexer)? {
        Some(token) => {
            *last_location = token.location;
            Ok(token)
        }
        None => Ok(Token::eof(*last_location)),
    }
}

/// Parse the tokens against the table with a fresh driver.
pub fn parse<TDef, I, E>(definition: TDef, tokens: I) -> Result<AstNode, ParseError<E>>
where
    TDef: ParseTable,
    I: IntoIterator<Item = Result<Token, E>>,
    E: fmt::Display,
{
    Parser::new(definition).parse(tokens)
}

/// Convenience for parsing a token list that cannot fail to lex.
pub fn parse_tokens<TDef>(
    definition: TDef,
    tokens: impl IntoIterator<Item = Token>,
) -> Result<AstNode, ParseError<std::convert::Infallible>>
where
    TDef: ParseTable,
{
    parse(definition, tokens.into_iter().map(Ok))
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError<L: fmt::Display> {
    #[error("from lexer: {}", _0)]
    Lexer(L),

    #[error("{location}: unexpected {name} in state {state}")]
    Syntax {
        state: u16,
        terminal: u16,
        name: String,
        location: Location,
    },

    #[error("{location}: `{name}` is not a terminal of this grammar")]
    UnknownTerminal { name: String, location: Location },

    #[error("from semantic action: {}", _0)]
    Action(#[from] ActionError),

    #[error("no goto for nonterminal {nonterminal} in state {state}")]
    MissingGoto { state: u16, nonterminal: u16 },

    #[error("unknown rule {}", _0)]
    UnknownRule(u16),

    #[error("empty node stack")]
    EmptyStack,
}

impl<L: fmt::Display> ParseError<L> {
    /// The failing state and terminal, if the table had no action.
    pub fn failing_cell(&self) -> Option<(u16, u16)> {
        match self {
            Self::Syntax {
                state, terminal, ..
            } => Some((*state, *terminal)),
            _ => None,
        }
    }
}
