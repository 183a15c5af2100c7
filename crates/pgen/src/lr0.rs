//! The canonical LR(0) collection, built with closure and goto.

use crate::{
    automaton::Limits,
    error::GrammarError,
    rules::{ParseRule, RuleId},
    sets::Analysis,
    symbol::{SymbolId, SymbolRegistry},
    table::ParsingTable,
    types::{Map, Set, SymbolSet},
    util::display_fn,
};
use pgen_runtime::Action;
use std::{collections::VecDeque, fmt};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u16);

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

impl StateId {
    pub const INITIAL: Self = Self(0);

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

/// A rule matched up to `dot`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParseItem {
    pub rule: RuleId,
    pub dot: u16,
}

impl ParseItem {
    pub const fn new(rule: RuleId, dot: u16) -> Self {
        Self { rule, dot }
    }

    /// The item with the whole right-hand side matched.
    pub fn completed(rule: RuleId, rules: &[ParseRule]) -> Self {
        Self::new(rule, rules[rule.index()].rhs.len() as u16)
    }

    pub fn next_symbol(&self, rules: &[ParseRule]) -> Option<SymbolId> {
        rules[self.rule.index()]
            .rhs
            .get(usize::from(self.dot))
            .copied()
    }

    pub fn is_completed(&self, rules: &[ParseRule]) -> bool {
        usize::from(self.dot) == rules[self.rule.index()].rhs.len()
    }

    fn advance(self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self
        }
    }

    pub fn display<'a>(
        &'a self,
        rules: &'a [ParseRule],
        registry: &'a SymbolRegistry,
    ) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            let rule = &rules[self.rule.index()];
            write!(f, "{} ->", registry.display(rule.lhs))?;
            for (i, &symbol) in rule.rhs.iter().enumerate() {
                if i == usize::from(self.dot) {
                    f.write_str(" .")?;
                }
                write!(f, " {}", registry.display(symbol))?;
            }
            if self.is_completed(rules) {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// An item set: the kernel items first, then the ones added by closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseState {
    pub items: Vec<ParseItem>,
    pub kernel_len: usize,

    /// Lookaheads of the completed items, keyed by item position.
    pub lookaheads: Map<usize, SymbolSet>,
}

impl ParseState {
    pub fn kernel(&self) -> &[ParseItem] {
        &self.items[..self.kernel_len]
    }

    pub fn position(&self, item: ParseItem) -> Option<usize> {
        self.items.iter().position(|&i| i == item)
    }

    /// The completed items and their positions.
    pub fn completed<'a>(
        &'a self,
        rules: &'a [ParseRule],
    ) -> impl Iterator<Item = (usize, ParseItem)> + 'a {
        self.items
            .iter()
            .copied()
            .enumerate()
            .filter(move |(_, item)| item.is_completed(rules))
    }

    pub fn lookahead(&self, position: usize) -> Option<&SymbolSet> {
        self.lookaheads.get(&position)
    }
}

#[derive(Debug)]
pub struct Lr0Automaton {
    pub states: Vec<ParseState>,

    /// Shift and goto actions, one row per state.
    pub table: ParsingTable,
}

/// Calculate the LR(0) automaton of the flattened rules.
///
/// Transitions are written to the table as they are discovered.
pub fn lr0(
    rules: &[ParseRule],
    analysis: &Analysis,
    limits: &Limits,
) -> Result<Lr0Automaton, GrammarError> {
    let mut builder = Builder {
        rules,
        analysis,
        limits,
        states: vec![],
        kernels: Map::default(),
        table: ParsingTable::new(analysis.len()),
        pending: VecDeque::new(),
    };

    builder.intern(vec![ParseItem::new(RuleId::START, 0)])?;

    while let Some(current) = builder.pending.pop_front() {
        let mut transitions = Map::<SymbolId, Vec<ParseItem>>::default();
        for item in &builder.states[current.index()].items {
            if let Some(symbol) = item.next_symbol(rules) {
                transitions.entry(symbol).or_default().push(item.advance());
            }
        }

        for (symbol, kernel) in transitions {
            let next = builder.intern(kernel)?;
            let action = if analysis.is_terminal(symbol) {
                Action::Shift(next.into_raw())
            } else {
                Action::Goto(next.into_raw())
            };
            tracing::trace!("{:?} --{:?}--> {:?}", current, symbol, next);
            builder.table.set(current, symbol, action);
        }
    }

    Ok(Lr0Automaton {
        states: builder.states,
        table: builder.table,
    })
}

struct Builder<'a> {
    rules: &'a [ParseRule],
    analysis: &'a Analysis,
    limits: &'a Limits,
    states: Vec<ParseState>,
    kernels: Map<Vec<ParseItem>, StateId>,
    table: ParsingTable,
    pending: VecDeque<StateId>,
}

impl Builder<'_> {
    /// Find the state with this kernel, or create it.
    fn intern(&mut self, kernel: Vec<ParseItem>) -> Result<StateId, GrammarError> {
        let mut key = kernel.clone();
        key.sort_unstable();
        if let Some(&id) = self.kernels.get(&key) {
            return Ok(id);
        }

        let max_states = self.limits.max_states.min(usize::from(u16::MAX));
        if self.states.len() >= max_states {
            return Err(GrammarError::capacity("states", self.limits.max_states));
        }
        let id = StateId(self.states.len() as u16);

        self.kernels.insert(key, id);
        self.states.push(closure(kernel, self.rules, self.analysis));
        self.table.add_row();
        self.pending.push_back(id);
        Ok(id)
    }
}

/// Expand the kernel with `(r, 0)` for every rule `r` of every nonterminal
/// that follows a dot.
pub fn closure(kernel: Vec<ParseItem>, rules: &[ParseRule], analysis: &Analysis) -> ParseState {
    let mut items: Set<ParseItem> = kernel.into_iter().collect();
    let kernel_len = items.len();

    let mut i = 0;
    while let Some(&item) = items.get_index(i) {
        if let Some(symbol) = item.next_symbol(rules) {
            if !analysis.is_terminal(symbol) {
                for &rule in analysis.rule_list(symbol) {
                    items.insert(ParseItem::new(rule, 0));
                }
            }
        }
        i += 1;
    }

    ParseState {
        items: items.into_iter().collect(),
        kernel_len,
        lookaheads: Map::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{grammar::Grammar, rules::flatten};

    struct Fixture {
        registry: SymbolRegistry,
        rules: Vec<ParseRule>,
        lr0: Lr0Automaton,
    }

    fn build(source: &str, limits: &Limits) -> Result<Fixture, GrammarError> {
        let mut registry = SymbolRegistry::new();
        let grammar = Grammar::parse(source, &mut registry)?;
        let rules = flatten(&grammar, &mut registry, limits)?;
        let analysis = Analysis::compute(&rules, registry.len(), registry.terminal_count());
        let lr0 = lr0(&rules, &analysis, limits)?;
        Ok(Fixture {
            registry,
            rules,
            lr0,
        })
    }

    impl Fixture {
        fn items(&self, state: usize) -> Vec<String> {
            self.lr0.states[state]
                .items
                .iter()
                .map(|item| item.display(&self.rules, &self.registry).to_string())
                .collect()
        }

        fn id(&self, name: &str) -> SymbolId {
            self.registry.index_of(name).unwrap()
        }
    }

    const EXPR: &str = "e = e '+' t | t; t = t '*' f | f; f = '(' e ')' | NUM;";

    #[test]
    fn initial_state_closure() {
        let fx = build(EXPR, &Limits::default()).unwrap();
        assert_eq!(fx.lr0.states[0].kernel_len, 1);
        assert_eq!(
            fx.items(0),
            [
                "S' -> . e",
                "e -> . e + t",
                "e -> . t",
                "t -> . t * f",
                "t -> . f",
                "f -> . ( e )",
                "f -> . NUM",
            ]
        );
    }

    #[test]
    fn dragon_book_state_count() {
        let fx = build(EXPR, &Limits::default()).unwrap();
        assert_eq!(fx.lr0.states.len(), 12);
        assert_eq!(fx.lr0.table.state_count(), 12);
    }

    #[test]
    fn transitions_are_recorded() {
        let fx = build(EXPR, &Limits::default()).unwrap();
        let s0 = StateId::INITIAL;
        assert!(matches!(fx.lr0.table.get(s0, fx.id("NUM")), Action::Shift(_)));
        assert!(matches!(fx.lr0.table.get(s0, fx.id("(")), Action::Shift(_)));
        assert!(matches!(fx.lr0.table.get(s0, fx.id("e")), Action::Goto(_)));
        assert_eq!(fx.lr0.table.get(s0, fx.id("+")), Action::Error);

        let Action::Goto(after_e) = fx.lr0.table.get(s0, fx.id("e")) else {
            unreachable!()
        };
        assert_eq!(
            fx.items(usize::from(after_e)),
            ["S' -> e .", "e -> e . + t"]
        );
    }

    #[test]
    fn states_are_deduplicated_by_kernel() {
        let fx = build(EXPR, &Limits::default()).unwrap();
        let s0 = StateId::INITIAL;
        let Action::Shift(paren) = fx.lr0.table.get(s0, fx.id("(")) else {
            unreachable!()
        };
        let paren = StateId::from_raw(paren);
        // `( (` loops back to the same state.
        assert_eq!(fx.lr0.table.get(paren, fx.id("(")), Action::Shift(paren.into_raw()));
        assert_eq!(fx.lr0.table.get(paren, fx.id("NUM")), fx.lr0.table.get(s0, fx.id("NUM")));
    }

    #[test]
    fn state_limit_is_fatal() {
        let limits = Limits {
            max_states: 5,
            ..Limits::default()
        };
        assert!(matches!(
            build(EXPR, &limits),
            Err(GrammarError::CapacityExceeded { what: "states", limit: 5 })
        ));
    }
}
