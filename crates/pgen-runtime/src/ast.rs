//! Abstract syntax tree built by the parser driver.

use crate::token::{Location, TerminalKind, Token, TokenValue};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: NodeKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Literal(Literal),
    Ident(String),

    /// A shifted keyword or operator that no action has consumed yet.
    Token(String),

    Unary {
        op: String,
        operand: Box<AstNode>,
    },
    Binary {
        op: String,
        lhs: Box<AstNode>,
        rhs: Box<AstNode>,
    },
    Assign {
        target: Box<AstNode>,
        value: Box<AstNode>,
    },
    Var {
        name: String,
        init: Option<Box<AstNode>>,
    },
    If {
        cond: Box<AstNode>,
        then: Box<AstNode>,
        otherwise: Option<Box<AstNode>>,
    },
    For {
        var: String,
        start: Box<AstNode>,
        end: Box<AstNode>,
        step: Option<Box<AstNode>>,
        body: Box<AstNode>,
    },
    While {
        cond: Box<AstNode>,
        body: Box<AstNode>,
    },
    Call {
        callee: String,
        args: Vec<AstNode>,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: Box<AstNode>,
    },
    Type {
        name: String,
        fields: Vec<AstNode>,
    },
    Block(Vec<AstNode>),
}

impl AstNode {
    pub fn new(kind: NodeKind, location: Location) -> Self {
        Self { kind, location }
    }

    /// Materialize the leaf node for a shifted token.
    pub fn leaf(token: Token) -> Self {
        let Token {
            kind,
            location,
            value,
        } = token;
        let kind = match (kind, value) {
            (TerminalKind::Ident, TokenValue::Str(name)) => NodeKind::Ident(name),
            (_, TokenValue::Int(n)) => NodeKind::Literal(Literal::Int(n)),
            (_, TokenValue::Float(n)) => NodeKind::Literal(Literal::Float(n)),
            (_, TokenValue::Char(c)) => NodeKind::Literal(Literal::Char(c)),
            (TerminalKind::Str, TokenValue::Str(s)) => NodeKind::Literal(Literal::Str(s)),
            (TerminalKind::Keyword(lexeme), _) if lexeme == "true" => {
                NodeKind::Literal(Literal::Bool(true))
            }
            (TerminalKind::Keyword(lexeme), _) if lexeme == "false" => {
                NodeKind::Literal(Literal::Bool(false))
            }
            (kind, _) => NodeKind::Token(kind.name().to_owned()),
        };
        Self { kind, location }
    }

    /// The identifier name if this node is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// The lexeme if this node is a keyword or operator leaf.
    pub fn as_token(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Token(lexeme) => Some(lexeme),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{:?}", n),
            Self::Str(s) => write!(f, "{:?}", s),
            Self::Char(c) => write!(f, "{:?}", c),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Literal(lit) => write!(f, "{}", lit),
            NodeKind::Ident(name) => f.write_str(name),
            NodeKind::Token(lexeme) => f.write_str(lexeme),
            NodeKind::Unary { op, operand } => write!(f, "{}{}", op, operand),
            NodeKind::Binary { op, lhs, rhs } => write!(f, "({}{}{})", lhs, op, rhs),
            NodeKind::Assign { target, value } => write!(f, "{} = {}", target, value),
            NodeKind::Var { name, init } => match init {
                Some(init) => write!(f, "var {} = {}", name, init),
                None => write!(f, "var {}", name),
            },
            NodeKind::If {
                cond,
                then,
                otherwise,
            } => {
                write!(f, "if {} then {}", cond, then)?;
                if let Some(otherwise) = otherwise {
                    write!(f, " else {}", otherwise)?;
                }
                Ok(())
            }
            NodeKind::For {
                var,
                start,
                end,
                step,
                body,
            } => {
                write!(f, "for {} in {}..", var, start)?;
                if let Some(step) = step {
                    write!(f, "{}..", step)?;
                }
                write!(f, "{} {}", end, body)
            }
            NodeKind::While { cond, body } => write!(f, "while {} {}", cond, body),
            NodeKind::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            NodeKind::Function { name, params, body } => {
                write!(f, "{}({}) = {}", name, params.join(", "), body)
            }
            NodeKind::Type { name, fields } => {
                write!(f, "type {} = {{", name)?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                f.write_str("}")
            }
            NodeKind::Block(nodes) => {
                for (i, node) in nodes.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", node)?;
                }
                Ok(())
            }
        }
    }
}
