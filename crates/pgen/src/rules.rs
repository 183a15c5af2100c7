//! Flattened production rules.

use crate::{
    automaton::Limits,
    error::{ActionProblem, GrammarError, SymbolKind},
    grammar::{Alternative, Grammar, ItemKind},
    symbol::{SymbolId, SymbolRegistry},
    util::display_fn,
};
use pgen_runtime::action::{ActionKind, ActionRef};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u16);

impl RuleId {
    /// The augmented start rule `S' -> Start`.
    pub const START: Self = Self(0);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u16 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::START => write!(f, "R#Start"),
            _ => write!(f, "R#{:03}", self.0),
        }
    }
}

/// The validated semantic action of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleAction {
    pub kind: Option<ActionKind>,
    pub indexes: Vec<u8>,
}

impl RuleAction {
    pub fn as_ref(&self) -> ActionRef<'_> {
        ActionRef {
            kind: self.kind,
            indexes: &self.indexes,
        }
    }
}

/// Anything with a left-hand side and a right-hand side of symbols.
pub trait Production {
    fn lhs(&self) -> SymbolId;
    fn rhs(&self) -> &[SymbolId];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRule {
    pub lhs: SymbolId,
    pub rhs: Vec<SymbolId>,
    pub action: RuleAction,
}

impl Production for ParseRule {
    fn lhs(&self) -> SymbolId {
        self.lhs
    }

    fn rhs(&self) -> &[SymbolId] {
        &self.rhs
    }
}

impl ParseRule {
    pub fn display<'r>(&'r self, registry: &'r SymbolRegistry) -> impl fmt::Display + 'r {
        display_fn(move |f| {
            write!(f, "{} ->", registry.display(self.lhs))?;
            if self.rhs.is_empty() {
                f.write_str(" ε")?;
            }
            for &symbol in &self.rhs {
                write!(f, " {}", registry.display(symbol))?;
            }
            Ok(())
        })
    }
}

/// The name of the augmented start symbol.
pub const AUGMENTED_START: &str = "S'";

/// Turn the grammar into indexed rules, rule 0 being `S' -> start`.
///
/// Each character class is expanded into one rule per member.
pub fn flatten(
    grammar: &Grammar,
    registry: &mut SymbolRegistry,
    limits: &Limits,
) -> Result<Vec<ParseRule>, GrammarError> {
    let accept = registry.nonterminal(AUGMENTED_START)?;
    let mut rules = vec![ParseRule {
        lhs: accept,
        rhs: vec![grammar.start()],
        action: RuleAction::default(),
    }];

    for rule in grammar.rules() {
        for alternative in &rule.alternatives {
            let action = validate_action(alternative)?;
            let choices = resolve_items(grammar, registry, alternative)?;
            if choices.len() > limits.max_rhs_len {
                return Err(GrammarError::capacity(
                    "symbols on a right-hand side",
                    limits.max_rhs_len,
                ));
            }

            let mut expanded = vec![vec![]];
            for choice in &choices {
                expanded = expanded
                    .into_iter()
                    .flat_map(|prefix: Vec<SymbolId>| {
                        choice.iter().map(move |&symbol| {
                            let mut rhs = prefix.clone();
                            rhs.push(symbol);
                            rhs
                        })
                    })
                    .collect();
            }

            for rhs in expanded {
                if rules.len() >= limits.max_rules {
                    return Err(GrammarError::capacity("rules", limits.max_rules));
                }
                rules.push(ParseRule {
                    lhs: rule.lhs,
                    rhs,
                    action: action.clone(),
                });
            }
        }
    }

    if rules.len() > usize::from(u16::MAX) {
        return Err(GrammarError::capacity("rules", usize::from(u16::MAX)));
    }
    tracing::debug!("flattened into {} rules", rules.len());
    Ok(rules)
}

/// Resolve each item into the symbols it may stand for.
fn resolve_items(
    grammar: &Grammar,
    registry: &SymbolRegistry,
    alternative: &Alternative,
) -> Result<Vec<Vec<SymbolId>>, GrammarError> {
    let terminal = |name: &str, location| {
        registry
            .terminal_index(name)
            .ok_or_else(|| GrammarError::UnresolvedSymbol {
                name: name.to_owned(),
                kind: SymbolKind::Terminal,
                location,
            })
    };

    alternative
        .items
        .iter()
        .map(|item| match &item.kind {
            ItemKind::Nonterminal(name) => registry
                .index_of(name)
                .filter(|&id| grammar.rule(id).is_some())
                .map(|id| vec![id])
                .ok_or_else(|| GrammarError::UnresolvedSymbol {
                    name: name.clone(),
                    kind: SymbolKind::Nonterminal,
                    location: item.location,
                }),
            ItemKind::TokenClass(name) | ItemKind::Literal(name) => {
                terminal(name, item.location).map(|id| vec![id])
            }
            ItemKind::CharClass { members, .. } => members
                .iter()
                .map(|member| terminal(member, item.location))
                .collect(),
        })
        .collect()
}

fn validate_action(alternative: &Alternative) -> Result<RuleAction, GrammarError> {
    let Some(action) = &alternative.action else {
        return Ok(RuleAction::default());
    };
    let invalid = |reason| GrammarError::InvalidAction {
        location: action.location,
        reason,
    };

    let kind = match &action.name {
        Some(name) => Some(
            ActionKind::from_name(name)
                .ok_or_else(|| invalid(ActionProblem::UnknownName(name.clone())))?,
        ),
        None => None,
    };
    let (name, arity) = match kind {
        Some(kind) => (kind.name(), kind.arity()),
        None => ("pass-through", 0..=1),
    };
    if !arity.contains(&action.indexes.len()) {
        return Err(invalid(ActionProblem::Arity {
            name,
            expected: arity,
            found: action.indexes.len(),
        }));
    }

    let len = alternative.items.len();
    if let Some(&index) = action.indexes.iter().find(|&&i| usize::from(i) >= len) {
        return Err(invalid(ActionProblem::IndexOutOfRange { index, len }));
    }

    Ok(RuleAction {
        kind,
        indexes: action.indexes.clone(),
    })
}
