//! Nullable, first and follow sets, computed to a fixed point.

use crate::{
    rules::{Production, RuleId},
    symbol::SymbolId,
    types::SymbolSet,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolAnalysis {
    pub is_nullable: bool,

    /// Terminals that can begin a derivation, plus `EPSILON` if nullable.
    pub first_set: SymbolSet,

    /// Terminals that can immediately follow the symbol. Never has `EPSILON`.
    pub follow_set: SymbolSet,

    /// Rules whose left-hand side is the symbol.
    pub rule_list: Vec<RuleId>,
}

/// The per-symbol analysis of a rule set.
///
/// The first rule's left-hand side is taken as the start symbol and
/// seeded with `EOF`.
#[derive(Debug, Clone)]
pub struct Analysis {
    symbols: Vec<SymbolAnalysis>,
    terminal_count: usize,
}

impl Analysis {
    pub fn compute<P: Production>(rules: &[P], symbol_count: usize, terminal_count: usize) -> Self {
        let mut symbols = vec![SymbolAnalysis::default(); symbol_count];
        for (index, symbol) in symbols.iter_mut().enumerate().take(terminal_count) {
            if let Some(id) = SymbolId::from_index(index) {
                symbol.first_set.insert(id);
            }
        }
        for (index, rule) in rules.iter().enumerate() {
            symbols[rule.lhs().index()]
                .rule_list
                .extend(u16::try_from(index).ok().map(RuleId::from_raw));
        }
        if let Some(start) = rules.first() {
            symbols[start.lhs().index()]
                .follow_set
                .insert(SymbolId::EOF);
        }

        let mut analysis = Self {
            symbols,
            terminal_count,
        };
        let mut passes = 1;
        while analysis.refine(rules) {
            passes += 1;
        }
        tracing::trace!("symbol sets converged after {} passes", passes);
        analysis
    }

    /// Run one pass over every set, returning whether anything was added.
    pub fn refine<P: Production>(&mut self, rules: &[P]) -> bool {
        let nullable = self.refine_nullable(rules);
        let first = self.refine_first(rules);
        let follow = self.refine_follow(rules);
        nullable || first || follow
    }

    fn refine_nullable<P: Production>(&mut self, rules: &[P]) -> bool {
        let mut changed = false;
        for rule in rules {
            let lhs = rule.lhs().index();
            if !self.symbols[lhs].is_nullable
                && rule.rhs().iter().all(|&symbol| self.is_nullable(symbol))
            {
                self.symbols[lhs].is_nullable = true;
                changed = true;
            }
        }
        changed
    }

    fn refine_first<P: Production>(&mut self, rules: &[P]) -> bool {
        let mut changed = false;
        for rule in rules {
            let (mut first, nullable) = self.first_of_sequence(rule.rhs());
            if nullable {
                first.insert(SymbolId::EPSILON);
            }
            changed |= self.symbols[rule.lhs().index()]
                .first_set
                .union_with(&first);
        }
        changed
    }

    fn refine_follow<P: Production>(&mut self, rules: &[P]) -> bool {
        let mut changed = false;
        for rule in rules {
            let rhs = rule.rhs();
            for (j, &symbol) in rhs.iter().enumerate() {
                if self.is_terminal(symbol) {
                    continue;
                }
                let (mut follow, rest_nullable) = self.first_of_sequence(&rhs[j + 1..]);
                if rest_nullable {
                    follow.union_with(&self.symbols[rule.lhs().index()].follow_set);
                }
                changed |= self.symbols[symbol.index()]
                    .follow_set
                    .union_except(&follow, SymbolId::EPSILON);
            }
        }
        changed
    }

    /// First set of a symbol sequence without `EPSILON`, and whether the
    /// whole sequence is nullable.
    pub fn first_of_sequence(&self, symbols: &[SymbolId]) -> (SymbolSet, bool) {
        let mut first = SymbolSet::default();
        for &symbol in symbols {
            first.union_except(&self.symbols[symbol.index()].first_set, SymbolId::EPSILON);
            if !self.is_nullable(symbol) {
                return (first, false);
            }
        }
        (first, true)
    }

    pub fn is_terminal(&self, symbol: SymbolId) -> bool {
        symbol.index() < self.terminal_count
    }

    pub fn symbol(&self, symbol: SymbolId) -> &SymbolAnalysis {
        &self.symbols[symbol.index()]
    }

    pub fn is_nullable(&self, symbol: SymbolId) -> bool {
        self.symbols[symbol.index()].is_nullable
    }

    pub fn first(&self, symbol: SymbolId) -> &SymbolSet {
        &self.symbols[symbol.index()].first_set
    }

    pub fn follow(&self, symbol: SymbolId) -> &SymbolSet {
        &self.symbols[symbol.index()].follow_set
    }

    pub fn rule_list(&self, symbol: SymbolId) -> &[RuleId] {
        &self.symbols[symbol.index()].rule_list
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
