//! The action/goto table and its completion with reductions.

use crate::{
    lr0::{ParseItem, ParseState, StateId},
    rules::{ParseRule, RuleId},
    symbol::{SymbolId, SymbolRegistry},
    util::display_fn,
};
use pgen_runtime::Action;
use std::fmt;

/// A dense `states x symbols` table of actions.
///
/// Terminal columns hold shifts, reductions and accepts; nonterminal
/// columns hold gotos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingTable {
    symbol_count: usize,
    cells: Vec<Action>,
}

impl ParsingTable {
    pub fn new(symbol_count: usize) -> Self {
        Self {
            symbol_count,
            cells: vec![],
        }
    }

    pub(crate) fn add_row(&mut self) {
        self.cells
            .resize(self.cells.len() + self.symbol_count, Action::Error);
    }

    pub fn get(&self, state: StateId, symbol: SymbolId) -> Action {
        if symbol.index() >= self.symbol_count {
            return Action::Error;
        }
        self.cells
            .get(state.index() * self.symbol_count + symbol.index())
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn set(&mut self, state: StateId, symbol: SymbolId, action: Action) {
        let index = state.index() * self.symbol_count + symbol.index();
        self.cells[index] = action;
    }

    pub fn row(&self, state: StateId) -> &[Action] {
        let start = state.index() * self.symbol_count;
        &self.cells[start..start + self.symbol_count]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Action]> + '_ {
        self.cells.chunks(self.symbol_count.max(1))
    }

    pub fn state_count(&self) -> usize {
        self.cells.len() / self.symbol_count.max(1)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShiftReduce => f.write_str("shift/reduce"),
            Self::ReduceReduce => f.write_str("reduce/reduce"),
        }
    }
}

/// A cell that more than one action competed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    pub terminal: SymbolId,
    pub kind: ConflictKind,
    pub kept: Action,
    pub dropped: Action,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    conflicts: Vec<Conflict>,
}

impl ConflictReport {
    pub fn shift_reduce(&self) -> usize {
        self.count(ConflictKind::ShiftReduce)
    }

    pub fn reduce_reduce(&self) -> usize {
        self.count(ConflictKind::ReduceReduce)
    }

    fn count(&self, kind: ConflictKind) -> usize {
        self.conflicts.iter().filter(|c| c.kind == kind).count()
    }

    pub fn total(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conflict> + '_ {
        self.conflicts.iter()
    }

    pub fn display<'a>(
        &'a self,
        rules: &'a [ParseRule],
        registry: &'a SymbolRegistry,
    ) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            for conflict in &self.conflicts {
                writeln!(
                    f,
                    "{} conflict in {:?} on {}: kept {}, dropped {}",
                    conflict.kind,
                    conflict.state,
                    registry.display(conflict.terminal),
                    display_action(conflict.kept, rules, registry),
                    display_action(conflict.dropped, rules, registry),
                )?;
            }
            Ok(())
        })
    }
}

pub(crate) fn display_action<'a>(
    action: Action,
    rules: &'a [ParseRule],
    registry: &'a SymbolRegistry,
) -> impl fmt::Display + 'a {
    display_fn(move |f| match action {
        Action::Error => f.write_str("error"),
        Action::Shift(n) => write!(f, "shift({:?})", StateId::from_raw(n)),
        Action::Goto(n) => write!(f, "goto({:?})", StateId::from_raw(n)),
        Action::Accept => f.write_str("accept"),
        Action::Reduce(r) => match rules.get(usize::from(r)) {
            Some(rule) => write!(f, "reduce({})", rule.display(registry)),
            None => write!(f, "reduce({:?})", RuleId::from_raw(r)),
        },
    })
}

/// Install accept and reduce actions once every completed item has its
/// lookaheads, returning the final state.
///
/// A shift already in place always wins. Between two reductions the lower
/// rule index wins, accept counting as rule 0. Conflicts are recorded and
/// reported but never fatal.
pub fn complete(
    states: &[ParseState],
    rules: &[ParseRule],
    table: &mut ParsingTable,
    registry: &SymbolRegistry,
) -> (StateId, ConflictReport) {
    let mut report = ConflictReport::default();
    let mut final_state = None;
    let accept = ParseItem::completed(RuleId::START, rules);

    for (index, state) in states.iter().enumerate() {
        let id = StateId::from_raw(index as u16);
        for (position, item) in state.completed(rules) {
            if item == accept {
                final_state = Some(id);
                install(table, id, SymbolId::EOF, Action::Accept, &mut report);
                continue;
            }
            let Some(lookaheads) = state.lookahead(position) else {
                continue;
            };
            for terminal in lookaheads.iter() {
                install(
                    table,
                    id,
                    terminal,
                    Action::Reduce(item.rule.into_raw()),
                    &mut report,
                );
            }
        }
    }

    for conflict in report.iter() {
        tracing::warn!(
            "{} conflict in {:?} on {}: kept {}, dropped {}",
            conflict.kind,
            conflict.state,
            registry.display(conflict.terminal),
            display_action(conflict.kept, rules, registry),
            display_action(conflict.dropped, rules, registry),
        );
    }

    match final_state {
        Some(id) => (id, report),
        None => unreachable!("the start symbol always has a goto from the initial state"),
    }
}

fn install(
    table: &mut ParsingTable,
    state: StateId,
    terminal: SymbolId,
    candidate: Action,
    report: &mut ConflictReport,
) {
    let current = table.get(state, terminal);
    let (kind, kept, dropped) = match current {
        Action::Error => {
            table.set(state, terminal, candidate);
            return;
        }
        Action::Shift(_) => (ConflictKind::ShiftReduce, current, candidate),
        Action::Reduce(_) | Action::Accept => {
            if reduce_rank(candidate) < reduce_rank(current) {
                table.set(state, terminal, candidate);
                (ConflictKind::ReduceReduce, candidate, current)
            } else {
                (ConflictKind::ReduceReduce, current, candidate)
            }
        }
        Action::Goto(_) => unreachable!("goto in the terminal column of {:?}", state),
    };
    report.conflicts.push(Conflict {
        state,
        terminal,
        kind,
        kept,
        dropped,
    });
}

fn reduce_rank(action: Action) -> u16 {
    match action {
        Action::Reduce(rule) => rule,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(raw: u16) -> SymbolId {
        SymbolId::from_raw(raw)
    }

    fn table() -> ParsingTable {
        let mut table = ParsingTable::new(4);
        table.add_row();
        table.add_row();
        table
    }

    #[test]
    fn cells_default_to_error() {
        let table = table();
        assert_eq!(table.state_count(), 2);
        assert_eq!(table.get(StateId::from_raw(1), sym(3)), Action::Error);
        assert_eq!(table.get(StateId::from_raw(7), sym(0)), Action::Error);
        assert_eq!(table.get(StateId::INITIAL, sym(9)), Action::Error);
        assert_eq!(table.rows().count(), 2);
    }

    #[test]
    fn shift_is_never_overwritten() {
        let mut table = table();
        let mut report = ConflictReport::default();
        let s1 = StateId::from_raw(1);
        table.set(s1, sym(2), Action::Shift(0));
        install(&mut table, s1, sym(2), Action::Reduce(3), &mut report);

        assert_eq!(table.get(s1, sym(2)), Action::Shift(0));
        assert_eq!(report.shift_reduce(), 1);
        assert_eq!(report.reduce_reduce(), 0);
        assert_eq!(report.iter().next().map(|c| c.dropped), Some(Action::Reduce(3)));
    }

    #[test]
    fn lowest_rule_wins_reduce_reduce() {
        let mut table = table();
        let mut report = ConflictReport::default();
        let s0 = StateId::INITIAL;
        install(&mut table, s0, sym(2), Action::Reduce(5), &mut report);
        install(&mut table, s0, sym(2), Action::Reduce(3), &mut report);
        install(&mut table, s0, sym(2), Action::Reduce(4), &mut report);
        assert_eq!(table.get(s0, sym(2)), Action::Reduce(3));
        assert_eq!(report.reduce_reduce(), 2);

        install(&mut table, s0, sym(0), Action::Reduce(1), &mut report);
        install(&mut table, s0, sym(0), Action::Accept, &mut report);
        assert_eq!(table.get(s0, sym(0)), Action::Accept);
        assert_eq!(report.total(), 3);
    }
}
