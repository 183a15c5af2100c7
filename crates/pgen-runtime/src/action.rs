//! Semantic actions run on reduction.

use crate::{
    ast::{AstNode, NodeKind},
    token::Location,
};
use std::{fmt, ops::RangeInclusive};

/// The node constructor selected by an action name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ActionKind {
    Unop,
    Binop,
    Assign,
    Var,
    If,
    For,
    While,
    Call,
    Func,
    Type,
    Block,
}

impl ActionKind {
    pub const ALL: &'static [Self] = &[
        Self::Unop,
        Self::Binop,
        Self::Assign,
        Self::Var,
        Self::If,
        Self::For,
        Self::While,
        Self::Call,
        Self::Func,
        Self::Type,
        Self::Block,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unop" => Some(Self::Unop),
            "binop" => Some(Self::Binop),
            "assign" => Some(Self::Assign),
            "var" => Some(Self::Var),
            "if" => Some(Self::If),
            "for" => Some(Self::For),
            "while" => Some(Self::While),
            "call" => Some(Self::Call),
            "func" => Some(Self::Func),
            "type" => Some(Self::Type),
            "block" | "list" => Some(Self::Block),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Unop => "unop",
            Self::Binop => "binop",
            Self::Assign => "assign",
            Self::Var => "var",
            Self::If => "if",
            Self::For => "for",
            Self::While => "while",
            Self::Call => "call",
            Self::Func => "func",
            Self::Type => "type",
            Self::Block => "block",
        }
    }

    /// The number of child indexes the constructor accepts.
    pub const fn arity(self) -> RangeInclusive<usize> {
        match self {
            Self::Unop => 2..=2,
            Self::Binop => 3..=3,
            Self::Assign => 2..=2,
            Self::Var => 1..=2,
            Self::If => 2..=3,
            Self::For => 4..=5,
            Self::While => 2..=2,
            Self::Call => 1..=2,
            Self::Func => 2..=3,
            Self::Type => 1..=2,
            Self::Block => 0..=usize::MAX,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed view of the semantic action attached to a rule.
///
/// Without a `kind`, the child at `indexes[0]` (or 0) is forwarded as is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ActionRef<'a> {
    pub kind: Option<ActionKind>,
    pub indexes: &'a [u8],
}

impl ActionRef<'_> {
    pub const PASS_THROUGH: ActionRef<'static> = ActionRef {
        kind: None,
        indexes: &[],
    };
}

impl fmt::Display for ActionRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        if let Some(kind) = self.kind {
            write!(f, " {}", kind)?;
        }
        for index in self.indexes {
            write!(f, " {}", index)?;
        }
        f.write_str(" }")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("`{action}`: child index {index} is out of range ({len} symbols)")]
    IndexOutOfRange {
        action: &'static str,
        index: usize,
        len: usize,
    },

    #[error("`{action}`: child {index} produced no node")]
    MissingChild { action: &'static str, index: usize },

    #[error("`{action}`: child {index} must be an operator token")]
    ExpectedOperator { action: &'static str, index: usize },

    #[error("`{action}`: child {index} must be an identifier")]
    ExpectedIdent { action: &'static str, index: usize },

    #[error("`{action}` takes {expected:?} indexes, but {found} were given")]
    Arity {
        action: &'static str,
        expected: RangeInclusive<usize>,
        found: usize,
    },
}

/// Synthesize the node for a reduction from the popped children.
///
/// `location` is used when the result does not inherit one from a child.
pub fn reduce(
    action: ActionRef<'_>,
    children: Vec<Option<AstNode>>,
    location: Location,
) -> Result<Option<AstNode>, ActionError> {
    let Some(kind) = action.kind else {
        let index = action.indexes.first().map_or(0, |&i| usize::from(i));
        if children.is_empty() && action.indexes.is_empty() {
            return Ok(None);
        }
        let mut children = Children::new("pass-through", children);
        return children.optional(index);
    };

    let found = action.indexes.len();
    if !kind.arity().contains(&found) {
        return Err(ActionError::Arity {
            action: kind.name(),
            expected: kind.arity(),
            found,
        });
    }

    let mut c = Children::new(kind.name(), children);
    let ix = |n: usize| usize::from(action.indexes[n]);

    let node = match kind {
        ActionKind::Unop => NodeKind::Unary {
            op: c.operator(ix(0))?,
            operand: c.boxed(ix(1))?,
        },
        ActionKind::Binop => NodeKind::Binary {
            lhs: c.boxed(ix(0))?,
            op: c.operator(ix(1))?,
            rhs: c.boxed(ix(2))?,
        },
        ActionKind::Assign => NodeKind::Assign {
            target: c.boxed(ix(0))?,
            value: c.boxed(ix(1))?,
        },
        ActionKind::Var => NodeKind::Var {
            name: c.ident(ix(0))?,
            init: if found == 2 {
                c.optional(ix(1))?.map(Box::new)
            } else {
                None
            },
        },
        ActionKind::If => NodeKind::If {
            cond: c.boxed(ix(0))?,
            then: c.boxed(ix(1))?,
            otherwise: if found == 3 {
                c.optional(ix(2))?.map(Box::new)
            } else {
                None
            },
        },
        ActionKind::For => {
            let var = c.ident(ix(0))?;
            let start = c.boxed(ix(1))?;
            let (step, end, body) = if found == 5 {
                (Some(c.boxed(ix(2))?), c.boxed(ix(3))?, c.boxed(ix(4))?)
            } else {
                (None, c.boxed(ix(2))?, c.boxed(ix(3))?)
            };
            NodeKind::For {
                var,
                start,
                end,
                step,
                body,
            }
        }
        ActionKind::While => NodeKind::While {
            cond: c.boxed(ix(0))?,
            body: c.boxed(ix(1))?,
        },
        ActionKind::Call => NodeKind::Call {
            callee: c.ident(ix(0))?,
            args: if found == 2 {
                c.list(ix(1))?
            } else {
                vec![]
            },
        },
        ActionKind::Func => {
            let name = c.ident(ix(0))?;
            let params = if found == 3 {
                let mut params = vec![];
                for param in c.list(ix(1))? {
                    match param.kind {
                        NodeKind::Ident(name) => params.push(name),
                        _ => {
                            return Err(ActionError::ExpectedIdent {
                                action: kind.name(),
                                index: ix(1),
                            })
                        }
                    }
                }
                params
            } else {
                vec![]
            };
            NodeKind::Function {
                name,
                params,
                body: c.boxed(ix(found - 1))?,
            }
        }
        ActionKind::Type => NodeKind::Type {
            name: c.ident(ix(0))?,
            fields: if found == 2 {
                c.list(ix(1))?
            } else {
                vec![]
            },
        },
        ActionKind::Block => {
            let mut nodes = vec![];
            for n in 0..found {
                nodes.extend(c.list(ix(n))?);
            }
            NodeKind::Block(nodes)
        }
    };

    let location = c.first_location.unwrap_or(location);
    Ok(Some(AstNode::new(node, location)))
}

/// The popped children of a reduction, each of which can be taken once.
struct Children {
    action: &'static str,
    nodes: Vec<Option<AstNode>>,
    first_location: Option<Location>,
}

impl Children {
    fn new(action: &'static str, nodes: Vec<Option<AstNode>>) -> Self {
        let first_location = nodes.iter().flatten().map(|node| node.location).next();
        Self {
            action,
            nodes,
            first_location,
        }
    }

    fn optional(&mut self, index: usize) -> Result<Option<AstNode>, ActionError> {
        let len = self.nodes.len();
        let slot = self
            .nodes
            .get_mut(index)
            .ok_or(ActionError::IndexOutOfRange {
                action: self.action,
                index,
                len,
            })?;
        Ok(slot.take())
    }

    fn required(&mut self, index: usize) -> Result<AstNode, ActionError> {
        self.optional(index)?.ok_or(ActionError::MissingChild {
            action: self.action,
            index,
        })
    }

    fn boxed(&mut self, index: usize) -> Result<Box<AstNode>, ActionError> {
        self.required(index).map(Box::new)
    }

    fn operator(&mut self, index: usize) -> Result<String, ActionError> {
        match self.required(index)?.kind {
            NodeKind::Token(lexeme) => Ok(lexeme),
            _ => Err(ActionError::ExpectedOperator {
                action: self.action,
                index,
            }),
        }
    }

    fn ident(&mut self, index: usize) -> Result<String, ActionError> {
        match self.required(index)?.kind {
            NodeKind::Ident(name) => Ok(name),
            _ => Err(ActionError::ExpectedIdent {
                action: self.action,
                index,
            }),
        }
    }

    /// A block child is spliced, an empty child yields nothing, anything
    /// else becomes a single element.
    fn list(&mut self, index: usize) -> Result<Vec<AstNode>, ActionError> {
        Ok(match self.optional(index)? {
            Some(AstNode {
                kind: NodeKind::Block(nodes),
                ..
            }) => nodes,
            Some(node) => vec![node],
            None => vec![],
        })
    }
}
