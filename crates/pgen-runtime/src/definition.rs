//! Parser definition.

use crate::action::{ActionKind, ActionRef};

/// The action stored in a `(state, symbol)` cell of the parse table.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Action {
    #[default]
    Error,

    /// Consume the lookahead terminal and push the state.
    Shift(u16),

    /// Reduce with the rule of this index.
    Reduce(u16),

    Accept,

    /// The state to enter after reducing to this nonterminal.
    Goto(u16),
}

/// The persisted form of an [`Action`]: a code plus a state or rule target.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActionCode {
    Error = 0,
    Shift = 1,
    Reduce = 2,
    Accept = 3,
    Goto = 4,
}

impl Action {
    pub const fn from_parts(code: ActionCode, target: u16) -> Self {
        match code {
            ActionCode::Error => Self::Error,
            ActionCode::Shift => Self::Shift(target),
            ActionCode::Reduce => Self::Reduce(target),
            ActionCode::Accept => Self::Accept,
            ActionCode::Goto => Self::Goto(target),
        }
    }

    pub const fn into_parts(self) -> (ActionCode, u16) {
        match self {
            Self::Error => (ActionCode::Error, 0),
            Self::Shift(n) => (ActionCode::Shift, n),
            Self::Reduce(n) => (ActionCode::Reduce, n),
            Self::Accept => (ActionCode::Accept, 0),
            Self::Goto(n) => (ActionCode::Goto, n),
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

/// What the driver needs to know about a rule to reduce it.
#[derive(Debug, Copy, Clone)]
pub struct RuleRef<'a> {
    pub lhs: u16,
    pub symbol_count: usize,
    pub action: ActionRef<'a>,
}

/// The trait for abstracting the generated LALR(1) parse table.
pub trait ParseTable {
    /// Return the cell at the specified state and symbol index.
    fn action(&self, state: u16, symbol: u16) -> Action;

    /// Return the rule of the specified index.
    fn rule(&self, rule: u16) -> Option<RuleRef<'_>>;

    /// Map a terminal name onto its symbol index.
    fn terminal_index(&self, name: &str) -> Option<u16>;

    /// The name of a symbol, for diagnostics.
    fn symbol_name(&self, symbol: u16) -> Option<&str>;

    /// Return the state to enter after reducing to `nonterminal` in `state`.
    fn goto(&self, state: u16, nonterminal: u16) -> Option<u16> {
        match self.action(state, nonterminal) {
            Action::Goto(next) => Some(next),
            _ => None,
        }
    }
}

macro_rules! impl_parse_table_for_pointer {
    ($($Ptr:ty),*) => {$(
        impl<T: ?Sized> ParseTable for $Ptr
        where
            T: ParseTable,
        {
            fn action(&self, state: u16, symbol: u16) -> Action {
                (**self).action(state, symbol)
            }

            fn rule(&self, rule: u16) -> Option<RuleRef<'_>> {
                (**self).rule(rule)
            }

            fn terminal_index(&self, name: &str) -> Option<u16> {
                (**self).terminal_index(name)
            }

            fn symbol_name(&self, symbol: u16) -> Option<&str> {
                (**self).symbol_name(symbol)
            }
        }
    )*};
}
impl_parse_table_for_pointer!(&T, std::rc::Rc<T>, std::sync::Arc<T>);

/// A rule in the persisted layout.
#[derive(Debug, Copy, Clone)]
pub struct StaticRule {
    pub lhs: u16,
    pub rhs: &'static [u16],
    pub action: Option<ActionKind>,
    pub indexes: &'static [u8],
}

/// A parse table emitted ahead of time as flat arrays.
#[derive(Debug, Copy, Clone)]
pub struct StaticTable {
    /// Symbol names, indexed by symbol. Terminals come first.
    pub symbols: &'static [&'static str],
    pub terminal_count: u16,
    pub rules: &'static [StaticRule],

    /// `table[state * symbols.len() + symbol]`
    pub table: &'static [(ActionCode, u16)],

    /// Kernel items of each state, for diagnostics.
    pub kernels: &'static [&'static str],
}

impl ParseTable for StaticTable {
    fn action(&self, state: u16, symbol: u16) -> Action {
        let width = self.symbols.len();
        let symbol = usize::from(symbol);
        if symbol >= width {
            return Action::Error;
        }
        match self.table.get(usize::from(state) * width + symbol) {
            Some(&(code, target)) => Action::from_parts(code, target),
            None => Action::Error,
        }
    }

    fn rule(&self, rule: u16) -> Option<RuleRef<'_>> {
        let rule = self.rules.get(usize::from(rule))?;
        Some(RuleRef {
            lhs: rule.lhs,
            symbol_count: rule.rhs.len(),
            action: ActionRef {
                kind: rule.action,
                indexes: rule.indexes,
            },
        })
    }

    fn terminal_index(&self, name: &str) -> Option<u16> {
        self.symbols
            .get(..usize::from(self.terminal_count))?
            .iter()
            .position(|&symbol| symbol == name)
            .and_then(|i| u16::try_from(i).ok())
    }

    fn symbol_name(&self, symbol: u16) -> Option<&str> {
        self.symbols.get(usize::from(symbol)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_round_trip() {
        for action in [
            Action::Error,
            Action::Shift(3),
            Action::Reduce(7),
            Action::Accept,
            Action::Goto(12),
        ] {
            let (code, target) = action.into_parts();
            assert_eq!(Action::from_parts(code, target), action);
        }
    }

    #[test]
    fn static_table_lookup() {
        static TABLE: StaticTable = StaticTable {
            symbols: &["EOF", "EPSILON", "NUM", "S'", "e"],
            terminal_count: 3,
            rules: &[StaticRule {
                lhs: 3,
                rhs: &[4],
                action: None,
                indexes: &[],
            }],
            table: &[
                (ActionCode::Error, 0),
                (ActionCode::Error, 0),
                (ActionCode::Shift, 1),
                (ActionCode::Error, 0),
                (ActionCode::Goto, 2),
            ],
            kernels: &["S' -> . e"],
        };
        assert_eq!(TABLE.action(0, 2), Action::Shift(1));
        assert_eq!(TABLE.goto(0, 4), Some(2));
        assert_eq!(TABLE.action(1, 0), Action::Error);
        assert_eq!(TABLE.terminal_index("NUM"), Some(2));
        assert_eq!(TABLE.terminal_index("e"), None);
        assert_eq!(TABLE.rule(0).map(|r| r.symbol_count), Some(1));
    }

    #[test]
    fn terminal_count_past_symbols() {
        let table = StaticTable {
            symbols: &["EOF", "EPSILON"],
            terminal_count: 5,
            rules: &[],
            table: &[],
            kernels: &[],
        };
        assert_eq!(table.terminal_index("EOF"), None);
        assert_eq!(table.symbol_name(1), Some("EPSILON"));
    }
}
