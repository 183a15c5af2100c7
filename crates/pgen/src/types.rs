//! Utility types.

use crate::symbol::SymbolId;
use std::fmt;

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;

/// A set of symbol indexes, used for first/follow/lookahead sets.
#[derive(Default, Clone)]
pub struct SymbolSet {
    inner: bit_set::BitSet,
}

impl SymbolSet {
    pub fn contains(&self, id: SymbolId) -> bool {
        self.inner.contains(id.index())
    }

    pub fn insert(&mut self, id: SymbolId) -> bool {
        self.inner.insert(id.index())
    }

    pub fn remove(&mut self, id: SymbolId) -> bool {
        self.inner.remove(id.index())
    }

    /// Add every element of `other`, returning whether `self` grew.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }

    /// Like `union_with`, but never adds `excluded`.
    pub fn union_except(&mut self, other: &Self, excluded: SymbolId) -> bool {
        let had = self.contains(excluded);
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        if !had {
            self.remove(excluded);
        }
        self.inner.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.inner.iter().filter_map(SymbolId::from_index)
    }
}

impl PartialEq for SymbolSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}
impl Eq for SymbolSet {}

impl fmt::Debug for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<SymbolId> for SymbolSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = SymbolId>,
    {
        Self {
            inner: iter.into_iter().map(SymbolId::index).collect(),
        }
    }
}
