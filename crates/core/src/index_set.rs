//! Sets of positions within an ordered view.

use alloc::collections::btree_set;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::ops::Range;

/// An ordered set of non-negative positions.
///
/// Positions are kept sorted, so consumers can apply removals back to front
/// with [`IndexSet::iter_rev`] and insertions front to back with
/// [`IndexSet::iter`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IndexSet {
    indices: BTreeSet<usize>,
}

impl IndexSet {
    /// Creates an empty index set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an index. Returns false if it was already present.
    #[inline]
    pub fn insert(&mut self, index: usize) -> bool {
        self.indices.insert(index)
    }

    /// Removes an index. Returns true if it was present.
    #[inline]
    pub fn remove(&mut self, index: usize) -> bool {
        self.indices.remove(&index)
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Smallest index in the set.
    pub fn first(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    /// Largest index in the set.
    pub fn last(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    /// Iterates in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Iterates in descending order.
    pub fn iter_rev(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().rev().copied()
    }

    /// Returns the maximal runs of consecutive indices, ascending.
    ///
    /// `{1, 2, 3, 7, 9, 10}` yields `[1..4, 7..8, 9..11]`.
    pub fn ranges(&self) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = Vec::new();
        for index in self.iter() {
            match ranges.last_mut() {
                Some(run) if run.end == index => run.end += 1,
                _ => ranges.push(index..index + 1),
            }
        }
        ranges
    }

    /// Clears all indices.
    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Returns the indices as a sorted vector.
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }
}

impl FromIterator<usize> for IndexSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            indices: iter.into_iter().collect(),
        }
    }
}

impl Extend<usize> for IndexSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        self.indices.extend(iter);
    }
}

impl<const N: usize> From<[usize; N]> for IndexSet {
    fn from(indices: [usize; N]) -> Self {
        indices.into_iter().collect()
    }
}

impl IntoIterator for IndexSet {
    type Item = usize;
    type IntoIter = btree_set::IntoIter<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.into_iter()
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = usize;
    type IntoIter = core::iter::Copied<btree_set::Iter<'a, usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter().copied()
    }
}
