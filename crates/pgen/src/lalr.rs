//! LALR(1) lookaheads.
//!
//! Every nonterminal occurrence is relabelled with the pair of LR(0) states
//! it spans, which gives an augmented grammar whose plain follow sets are
//! exactly the LALR(1) lookaheads of the original one.

use crate::{
    automaton::Limits,
    error::GrammarError,
    lr0::{Lr0Automaton, ParseItem, ParseState, StateId},
    rules::{ParseRule, Production, RuleId},
    sets::Analysis,
    symbol::{SymbolId, SymbolRegistry},
    types::Map,
    util::display_fn,
};
use pgen_runtime::Action;
use std::fmt;

/// A rule walked through the automaton from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentedRule {
    pub origin: RuleId,
    pub from: StateId,
    pub to: StateId,
    pub lhs: SymbolId,
    pub rhs: Vec<SymbolId>,
}

impl Production for AugmentedRule {
    fn lhs(&self) -> SymbolId {
        self.lhs
    }

    fn rhs(&self) -> &[SymbolId] {
        &self.rhs
    }
}

type Label = (SymbolId, StateId, StateId);

#[derive(Debug)]
pub struct AugmentedGrammar {
    rules: Vec<AugmentedRule>,
    labels: Map<Label, SymbolId>,
    base: usize,
    analysis: Analysis,
}

impl AugmentedGrammar {
    pub fn build(
        rules: &[ParseRule],
        lr0: &Lr0Automaton,
        registry: &SymbolRegistry,
        limits: &Limits,
    ) -> Result<Self, GrammarError> {
        let span = tracing::trace_span!("augment");
        let _entered = span.enter();

        let mut labeller = Labeller {
            labels: Map::default(),
            base: registry.len(),
            limits,
        };
        let transition = |state: StateId, symbol: SymbolId| match lr0.table.get(state, symbol) {
            Action::Shift(next) | Action::Goto(next) => StateId::from_raw(next),
            action => unreachable!("{:?} has no transition on {:?} ({:?})", state, symbol, action),
        };

        let mut augmented = vec![];
        for (index, state) in lr0.states.iter().enumerate() {
            let from = StateId::from_raw(index as u16);
            for item in state.items.iter().filter(|item| item.dot == 0) {
                let rule = &rules[item.rule.index()];

                let mut current = from;
                let mut rhs = Vec::with_capacity(rule.rhs.len());
                for &symbol in &rule.rhs {
                    let next = transition(current, symbol);
                    rhs.push(if registry.is_terminal(symbol) {
                        symbol
                    } else {
                        labeller.label((symbol, current, next))?
                    });
                    current = next;
                }

                let lhs = if item.rule == RuleId::START {
                    rule.lhs
                } else {
                    labeller.label((rule.lhs, from, transition(from, rule.lhs)))?
                };

                if augmented.len() >= limits.max_augmented_rules {
                    return Err(GrammarError::capacity(
                        "augmented rules",
                        limits.max_augmented_rules,
                    ));
                }
                augmented.push(AugmentedRule {
                    origin: item.rule,
                    from,
                    to: current,
                    lhs,
                    rhs,
                });
            }
        }

        let symbol_count = labeller.base + labeller.labels.len();
        tracing::debug!(
            "{} augmented rules over {} labelled nonterminals",
            augmented.len(),
            labeller.labels.len()
        );
        let analysis = Analysis::compute(&augmented, symbol_count, registry.terminal_count());

        Ok(Self {
            rules: augmented,
            labels: labeller.labels,
            base: labeller.base,
            analysis,
        })
    }

    pub fn rules(&self) -> &[AugmentedRule] {
        &self.rules
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn symbol_count(&self) -> usize {
        self.base + self.labels.len()
    }

    /// The original symbol and the states spanned by a labelled nonterminal.
    pub fn label(&self, symbol: SymbolId) -> Option<Label> {
        let index = symbol.index().checked_sub(self.base)?;
        self.labels.get_index(index).map(|(&label, _)| label)
    }

    pub fn display<'a>(&'a self, registry: &'a SymbolRegistry) -> impl fmt::Display + 'a {
        let symbol = move |id: SymbolId| {
            display_fn(move |f| match self.label(id) {
                Some((symbol, from, to)) => write!(
                    f,
                    "{}[{}:{}]",
                    registry.display(symbol),
                    from.into_raw(),
                    to.into_raw()
                ),
                None => write!(f, "{}", registry.display(id)),
            })
        };
        display_fn(move |f| {
            for rule in &self.rules {
                write!(f, "{:?}: {} ->", rule.origin, symbol(rule.lhs))?;
                for &s in &rule.rhs {
                    write!(f, " {}", symbol(s))?;
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }
}

struct Labeller<'a> {
    labels: Map<Label, SymbolId>,
    base: usize,
    limits: &'a Limits,
}

impl Labeller<'_> {
    fn label(&mut self, label: Label) -> Result<SymbolId, GrammarError> {
        if let Some(&id) = self.labels.get(&label) {
            return Ok(id);
        }
        let index = self.base + self.labels.len();
        if index >= self.limits.max_symbols {
            return Err(GrammarError::capacity("symbols", self.limits.max_symbols));
        }
        let id = SymbolId::from_index(index)
            .ok_or_else(|| GrammarError::capacity("symbols", usize::from(u16::MAX)))?;
        self.labels.insert(label, id);
        Ok(id)
    }
}

/// Union the follow set of each augmented left-hand side into the
/// lookaheads of the matching completed item in the rule's end state.
pub fn propagate(states: &mut [ParseState], rules: &[ParseRule], augmented: &AugmentedGrammar) {
    for rule in &augmented.rules {
        let completed = ParseItem::completed(rule.origin, rules);
        let state = &mut states[rule.to.index()];
        let Some(position) = state.position(completed) else {
            unreachable!("{:?} does not complete {:?}", rule.to, rule.origin)
        };
        state
            .lookaheads
            .entry(position)
            .or_default()
            .union_except(augmented.analysis.follow(rule.lhs), SymbolId::EPSILON);
    }
}

/// SLR(1) lookaheads: the follow set of the unlabelled left-hand side.
pub fn slr(states: &mut [ParseState], rules: &[ParseRule], analysis: &Analysis) {
    for state in states {
        let completed: Vec<_> = state.completed(rules).collect();
        for (position, item) in completed {
            let lhs = rules[item.rule.index()].lhs;
            state
                .lookaheads
                .entry(position)
                .or_default()
                .union_except(analysis.follow(lhs), SymbolId::EPSILON);
        }
    }
}
