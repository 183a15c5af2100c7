//! Generation of the LALR(1) automaton.

use crate::{
    error::GrammarError,
    grammar::Grammar,
    lalr::{self, AugmentedGrammar},
    lr0::{self, Lr0Automaton, ParseItem, ParseState, StateId},
    rules::{self, ParseRule, RuleId},
    sets::Analysis,
    symbol::{SymbolId, SymbolRegistry},
    table::{self, display_action, ConflictReport, ParsingTable},
    types::Set,
    util::{display_fn, write_joined},
};
use pgen_runtime::{
    definition::{ParseTable, RuleRef},
    Action,
};
use std::fmt;

/// Upper bounds on the generated tables. Exceeding one aborts generation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Limits {
    pub max_states: usize,
    pub max_rules: usize,
    pub max_augmented_rules: usize,
    pub max_rhs_len: usize,
    pub max_symbols: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_states: 1024,
            max_rules: 256,
            max_augmented_rules: 4096,
            max_rhs_len: 16,
            max_symbols: 8192,
        }
    }
}

/// How the lookaheads of completed items are computed.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LookaheadMode {
    /// Follow sets of the state-labelled grammar.
    #[default]
    Lalr,

    /// Follow sets of the plain grammar. Accepts fewer grammars.
    Slr,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    limits: Limits,
    mode: LookaheadMode,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute lookaheads with the LALR(1) method. This is the default.
    pub fn use_lalr(&mut self) -> &mut Self {
        self.mode = LookaheadMode::Lalr;
        self
    }

    /// Compute lookaheads from the plain follow sets, as an SLR(1) generator would.
    pub fn use_slr(&mut self) -> &mut Self {
        self.mode = LookaheadMode::Slr;
        self
    }

    pub fn limits(&mut self, limits: Limits) -> &mut Self {
        self.limits = limits;
        self
    }

    pub fn max_states(&mut self, max: usize) -> &mut Self {
        self.limits.max_states = max;
        self
    }

    pub fn max_rules(&mut self, max: usize) -> &mut Self {
        self.limits.max_rules = max;
        self
    }

    pub fn max_symbols(&mut self, max: usize) -> &mut Self {
        self.limits.max_symbols = max;
        self
    }

    /// Bound the rules of the state-labelled grammar built for LALR lookaheads.
    pub fn max_augmented_rules(&mut self, max: usize) -> &mut Self {
        self.limits.max_augmented_rules = max;
        self
    }

    pub fn max_rhs_len(&mut self, max: usize) -> &mut Self {
        self.limits.max_rhs_len = max;
        self
    }

    pub fn generate(&self, source: &str) -> Result<Automaton, GrammarError> {
        Automaton::generate_with_config(source, SymbolRegistry::new(), self)
    }

    /// Generate with a custom terminal set.
    pub fn generate_with_registry(
        &self,
        source: &str,
        registry: SymbolRegistry,
    ) -> Result<Automaton, GrammarError> {
        Automaton::generate_with_config(source, registry, self)
    }
}

/// The generated automaton and its complete parse table.
///
/// Immutable once built, so one automaton may serve any number of parsers.
#[derive(Debug, Clone)]
pub struct Automaton {
    symbols: SymbolRegistry,
    grammar: Grammar,
    rules: Vec<ParseRule>,
    analysis: Analysis,
    states: Vec<ParseState>,
    table: ParsingTable,
    final_state: StateId,
    conflicts: ConflictReport,
    mode: LookaheadMode,
}

impl Automaton {
    pub fn generate(source: &str) -> Result<Self, GrammarError> {
        Self::generate_with_config(source, SymbolRegistry::new(), &Config::new())
    }

    pub fn generate_with_config(
        source: &str,
        mut symbols: SymbolRegistry,
        config: &Config,
    ) -> Result<Self, GrammarError> {
        let span = tracing::debug_span!("build");
        let _entered = span.enter();
        let limits = &config.limits;

        let grammar = Grammar::parse(source, &mut symbols)?;
        let rules = rules::flatten(&grammar, &mut symbols, limits)?;
        if symbols.len() > limits.max_symbols {
            return Err(GrammarError::capacity("symbols", limits.max_symbols));
        }

        let analysis = Analysis::compute(&rules, symbols.len(), symbols.terminal_count());
        let mut lr0 = lr0::lr0(&rules, &analysis, limits)?;
        tracing::debug!(
            "{} LR(0) states over {} symbols",
            lr0.states.len(),
            symbols.len()
        );

        match config.mode {
            LookaheadMode::Lalr => {
                let augmented = AugmentedGrammar::build(&rules, &lr0, &symbols, limits)?;
                lalr::propagate(&mut lr0.states, &rules, &augmented);
            }
            LookaheadMode::Slr => lalr::slr(&mut lr0.states, &rules, &analysis),
        }
        let Lr0Automaton { states, mut table } = lr0;

        let (final_state, conflicts) = table::complete(&states, &rules, &mut table, &symbols);
        if !conflicts.is_empty() {
            tracing::warn!(
                "{} shift/reduce and {} reduce/reduce conflicts",
                conflicts.shift_reduce(),
                conflicts.reduce_reduce()
            );
        }
        tracing::debug!("final state is {:?}", final_state);

        Ok(Self {
            symbols,
            grammar,
            rules,
            analysis,
            states,
            table,
            final_state,
            conflicts,
            mode: config.mode,
        })
    }

    pub fn symbols(&self) -> &SymbolRegistry {
        &self.symbols
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Literal lexemes the grammar refers to.
    pub fn keywords(&self) -> &Set<String> {
        self.grammar.keywords()
    }

    pub fn rules(&self) -> &[ParseRule] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> Option<&ParseRule> {
        self.rules.get(id.index())
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &ParseState)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(i, state)| (StateId::from_raw(i as u16), state))
    }

    pub fn state(&self, id: StateId) -> Option<&ParseState> {
        self.states.get(id.index())
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn table(&self) -> &ParsingTable {
        &self.table
    }

    pub fn final_state(&self) -> StateId {
        self.final_state
    }

    pub fn conflicts(&self) -> &ConflictReport {
        &self.conflicts
    }

    pub fn mode(&self) -> LookaheadMode {
        self.mode
    }

    pub fn display_item(&self, item: ParseItem) -> impl fmt::Display + '_ {
        display_fn(move |f| write!(f, "{}", item.display(&self.rules, &self.symbols)))
    }

    /// The kernel items of a state on one line.
    pub fn display_kernel(&self, id: StateId) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            let Some(state) = self.state(id) else {
                return Ok(());
            };
            let items = state.kernel().iter().map(|&item| self.display_item(item));
            write_joined(f, items, "; ")
        })
    }

    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            for (id, state) in self.states() {
                if id != StateId::INITIAL {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:?}", id)?;

                writeln!(f, "## kernels")?;
                for (position, &item) in state.items.iter().enumerate() {
                    if position == state.kernel_len {
                        writeln!(f, "## closure")?;
                    }
                    write!(f, "- {}", self.display_item(item))?;
                    if let Some(lookaheads) = state.lookahead(position) {
                        f.write_str("  [")?;
                        let names = lookaheads.iter().map(|t| self.symbols.display(t));
                        write_joined(f, names, " ")?;
                        f.write_str("]")?;
                    }
                    writeln!(f)?;
                }

                let row = self.table.row(id);
                writeln!(f, "## actions")?;
                for (terminal, _) in self.symbols.terminals() {
                    let action = row[terminal.index()];
                    if !action.is_error() {
                        writeln!(
                            f,
                            "- {} => {}",
                            self.symbols.display(terminal),
                            display_action(action, &self.rules, &self.symbols)
                        )?;
                    }
                }

                writeln!(f, "## gotos")?;
                for (nonterminal, name) in self.symbols.nonterminals() {
                    if let Action::Goto(next) = row[nonterminal.index()] {
                        writeln!(f, "- {} => goto({:?})", name, StateId::from_raw(next))?;
                    }
                }
            }
            Ok(())
        })
    }
}

impl ParseTable for Automaton {
    fn action(&self, state: u16, symbol: u16) -> Action {
        self.table
            .get(StateId::from_raw(state), SymbolId::from_raw(symbol))
    }

    fn rule(&self, rule: u16) -> Option<RuleRef<'_>> {
        let rule = self.rules.get(usize::from(rule))?;
        Some(RuleRef {
            lhs: rule.lhs.into_raw(),
            symbol_count: rule.rhs.len(),
            action: rule.action.as_ref(),
        })
    }

    fn terminal_index(&self, name: &str) -> Option<u16> {
        self.symbols.terminal_index(name).map(SymbolId::into_raw)
    }

    fn symbol_name(&self, symbol: u16) -> Option<&str> {
        self.symbols.name_of(SymbolId::from_raw(symbol))
    }
}
