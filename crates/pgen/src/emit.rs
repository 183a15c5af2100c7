//! Ahead-of-time emission of the parse table as Rust source.
//!
//! The generated module defines a `PARSE_TABLE: StaticTable` that drives
//! `pgen_runtime::parse` without running the generator again.

use crate::{automaton::Automaton, lr0::StateId, util::display_fn};
use pgen_runtime::definition::ActionCode;
use std::fmt;

/// `Display`s the tables of an automaton as a Rust module.
#[derive(Debug, Copy, Clone)]
pub struct RustTables<'a> {
    automaton: &'a Automaton,
    runtime: &'a str,
}

impl<'a> RustTables<'a> {
    pub fn new(automaton: &'a Automaton) -> Self {
        Self {
            automaton,
            runtime: "::pgen_runtime",
        }
    }

    /// The path the generated code uses to refer to the runtime crate.
    pub fn runtime_path(mut self, path: &'a str) -> Self {
        self.runtime = path;
        self
    }
}

/// The table cells in the persisted, row-major layout.
pub fn flat_table(automaton: &Automaton) -> Vec<(ActionCode, u16)> {
    automaton
        .table()
        .rows()
        .flatten()
        .map(|action| action.into_parts())
        .collect()
}

/// Kernel items of each state, one string per state.
pub fn kernels(automaton: &Automaton) -> Vec<String> {
    automaton
        .states()
        .map(|(id, _)| automaton.display_kernel(id).to_string())
        .collect()
}

impl fmt::Display for RustTables<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let automaton = self.automaton;
        let symbols = automaton.symbols();
        let runtime = self.runtime;

        writeln!(f, "// @generated by pgen. Do not edit.")?;
        writeln!(f)?;
        writeln!(f, "#[allow(unused_imports)]")?;
        writeln!(f, "use {}::action::ActionKind;", runtime)?;
        writeln!(
            f,
            "use {}::definition::{{ActionCode as A, StaticRule, StaticTable}};",
            runtime
        )?;
        writeln!(f)?;

        writeln!(f, "pub const SYMBOLS: &[&str] = &[")?;
        for (_, name) in symbols.iter() {
            writeln!(f, "    {:?},", name)?;
        }
        writeln!(f, "];")?;
        writeln!(f)?;
        writeln!(
            f,
            "pub const TERMINAL_COUNT: u16 = {};",
            symbols.terminal_count()
        )?;
        writeln!(f)?;

        writeln!(f, "pub const RULES: &[StaticRule] = &[")?;
        for rule in automaton.rules() {
            let rhs = display_fn(|f| {
                for (i, symbol) in rule.rhs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", symbol.into_raw())?;
                }
                Ok(())
            });
            let action = display_fn(|f| match rule.action.kind {
                Some(kind) => write!(f, "Some(ActionKind::{:?})", kind),
                None => f.write_str("None"),
            });
            writeln!(
                f,
                "    StaticRule {{ lhs: {}, rhs: &[{}], action: {}, indexes: &{:?} }}, // {}",
                rule.lhs.into_raw(),
                rhs,
                action,
                rule.action.indexes,
                rule.display(symbols),
            )?;
        }
        writeln!(f, "];")?;
        writeln!(f)?;

        let width = automaton.table().symbol_count();
        let cells = flat_table(automaton);
        writeln!(f, "pub const TABLE: &[(A, u16)] = &[")?;
        for (state, row) in cells.chunks(width.max(1)).enumerate() {
            writeln!(f, "    // {:?}", StateId::from_raw(state as u16))?;
            f.write_str("   ")?;
            for (code, target) in row {
                write!(f, " (A::{:?}, {}),", code, target)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "];")?;
        writeln!(f)?;

        writeln!(f, "pub const KERNELS: &[&str] = &[")?;
        for kernel in kernels(automaton) {
            writeln!(f, "    {:?},", kernel)?;
        }
        writeln!(f, "];")?;
        writeln!(f)?;

        writeln!(f, "pub static PARSE_TABLE: StaticTable = StaticTable {{")?;
        writeln!(f, "    symbols: SYMBOLS,")?;
        writeln!(f, "    terminal_count: TERMINAL_COUNT,")?;
        writeln!(f, "    rules: RULES,")?;
        writeln!(f, "    table: TABLE,")?;
        writeln!(f, "    kernels: KERNELS,")?;
        writeln!(f, "}};")?;
        Ok(())
    }
}
