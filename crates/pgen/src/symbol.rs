//! Symbol registry: dense indexes for terminals and nonterminals.

use crate::types::Set;
use pgen_runtime::token::names;
use std::fmt;

/// Dense index of a grammar symbol.
///
/// Terminals occupy `[0, terminal_count)` and nonterminals follow them.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u16);

impl SymbolId {
    pub const EOF: Self = Self(0);
    pub const EPSILON: Self = Self(1);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u16 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        u16::try_from(index).ok().map(Self)
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EOF => write!(f, "#EOF"),
            Self::EPSILON => write!(f, "#EPSILON"),
            _ => write!(f, "#{:03}", self.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("terminal `{}` is registered after the first nonterminal", _0)]
    TerminalAfterNonterminal(String),

    #[error("symbol `{}` is already registered", _0)]
    Duplicate(String),

    #[error("`{}` is a terminal and cannot be defined by a rule", _0)]
    NotNonterminal(String),

    #[error("the symbol index space is exhausted")]
    Overflow,
}

/// Assigns every symbol name exactly one index.
///
/// `EOF` and `EPSILON` are always terminals 0 and 1.
#[derive(Debug, Clone)]
pub struct SymbolRegistry {
    names: Set<String>,
    terminal_count: usize,
    /// Reserved words registered as terminals once a grammar quotes them.
    reserved: &'static [&'static str],
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolRegistry {
    /// The registry with the default token classes and operators.
    ///
    /// Reserved words stay free for use as rule names until a grammar
    /// quotes them, see [`SymbolRegistry::reserved_word`].
    pub fn new() -> Self {
        let names: Set<String> = names::TOKEN_CLASSES
            .iter()
            .chain(names::OPERATORS)
            .map(|&name| name.to_owned())
            .collect();
        let terminal_count = names.len();
        Self {
            names,
            terminal_count,
            reserved: names::KEYWORDS,
        }
    }

    /// A registry with only `EOF`, `EPSILON` and the specified terminals.
    pub fn with_terminals<I, S>(terminals: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self {
            names: [names::EOF, names::EPSILON]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            terminal_count: 2,
            reserved: &[],
        };
        for name in terminals {
            registry.terminal(name)?;
        }
        Ok(registry)
    }

    /// Register a new terminal. Only allowed before any nonterminal.
    pub fn terminal(&mut self, name: impl Into<String>) -> Result<SymbolId, RegistryError> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        if self.names.len() != self.terminal_count {
            return Err(RegistryError::TerminalAfterNonterminal(name));
        }
        let id = self.push(name)?;
        self.terminal_count += 1;
        Ok(id)
    }

    /// Register `lexeme` as a terminal if it is a reserved word not seen yet.
    ///
    /// Returns `None` for lexemes outside the reserved set.
    pub fn reserved_word(&mut self, lexeme: &str) -> Result<Option<SymbolId>, RegistryError> {
        if let Some(id) = self.index_of(lexeme) {
            return Ok(Some(id).filter(|&id| self.is_terminal(id)));
        }
        if !self.reserved.contains(&lexeme) {
            return Ok(None);
        }
        self.terminal(lexeme).map(Some)
    }

    /// Return the index of the nonterminal, registering it on first sight.
    pub fn nonterminal(&mut self, name: &str) -> Result<SymbolId, RegistryError> {
        match self.index_of(name) {
            Some(id) if self.is_terminal(id) => Err(RegistryError::NotNonterminal(name.to_owned())),
            Some(id) => Ok(id),
            None => self.push(name.to_owned()),
        }
    }

    fn push(&mut self, name: String) -> Result<SymbolId, RegistryError> {
        let id = SymbolId::from_index(self.names.len()).ok_or(RegistryError::Overflow)?;
        if id.into_raw() == u16::MAX {
            return Err(RegistryError::Overflow);
        }
        self.names.insert(name);
        Ok(id)
    }

    pub fn index_of(&self, name: &str) -> Option<SymbolId> {
        self.names.get_index_of(name).and_then(SymbolId::from_index)
    }

    pub fn name_of(&self, id: SymbolId) -> Option<&str> {
        self.names.get_index(id.index()).map(String::as_str)
    }

    /// The index of `name` if it is a registered terminal.
    pub fn terminal_index(&self, name: &str) -> Option<SymbolId> {
        self.index_of(name).filter(|&id| self.is_terminal(id))
    }

    pub fn is_terminal(&self, id: SymbolId) -> bool {
        id.index() < self.terminal_count
    }

    pub fn terminal_count(&self) -> usize {
        self.terminal_count
    }

    pub fn nonterminal_count(&self) -> usize {
        self.names.len() - self.terminal_count
    }

    /// The total number of registered symbols.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| Some((SymbolId::from_index(i)?, name.as_str())))
    }

    pub fn terminals(&self) -> impl Iterator<Item = (SymbolId, &str)> + '_ {
        self.iter().take(self.terminal_count)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = (SymbolId, &str)> + '_ {
        self.iter().skip(self.terminal_count)
    }

    /// Helper for printing a symbol by name.
    pub fn display(&self, id: SymbolId) -> impl fmt::Display + '_ {
        crate::util::display_fn(move |f| match self.name_of(id) {
            Some(name) => f.write_str(name),
            None => write!(f, "{:?}", id),
        })
    }
}
