use crate::symbol::RegistryError;
use pgen_runtime::token::Location;
use std::{fmt, ops::RangeInclusive};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal => f.write_str("terminal"),
            Self::Nonterminal => f.write_str("nonterminal"),
        }
    }
}

/// Errors that abort automaton generation.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("{location}: {message}")]
    Syntax { location: Location, message: String },

    #[error("{location}: undefined {kind} `{name}`")]
    UnresolvedSymbol {
        name: String,
        kind: SymbolKind,
        location: Location,
    },

    #[error("too many {what} (the limit is {limit})")]
    CapacityExceeded { what: &'static str, limit: usize },

    #[error("{location}: invalid semantic action: {reason}")]
    InvalidAction {
        location: Location,
        reason: ActionProblem,
    },

    #[error("from symbol registry")]
    Registry(
        #[from]
        #[source]
        RegistryError,
    ),
}

impl GrammarError {
    pub(crate) fn syntax(location: Location, message: impl Into<String>) -> Self {
        Self::Syntax {
            location,
            message: message.into(),
        }
    }

    pub(crate) fn capacity(what: &'static str, limit: usize) -> Self {
        Self::CapacityExceeded { what, limit }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionProblem {
    UnknownName(String),
    Arity {
        name: &'static str,
        expected: RangeInclusive<usize>,
        found: usize,
    },
    IndexOutOfRange {
        index: u8,
        len: usize,
    },
}

impl fmt::Display for ActionProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownName(name) => write!(f, "unknown action `{}`", name),
            Self::Arity {
                name,
                expected,
                found,
            } => {
                let (lo, hi) = (expected.start(), expected.end());
                if lo == hi {
                    write!(f, "`{}` takes {} indexes, found {}", name, lo, found)
                } else {
                    write!(
                        f,
                        "`{}` takes {} to {} indexes, found {}",
                        name, lo, hi, found
                    )
                }
            }
            Self::IndexOutOfRange { index, len } => write!(
                f,
                "index {} is out of range for an alternative of {} symbols",
                index, len
            ),
        }
    }
}
