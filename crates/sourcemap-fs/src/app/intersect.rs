//! Set intersection used whenever a dataset is narrowed.

use std::collections::HashSet;
use std::hash::Hash;

/// Elements present in both `lhs` and `rhs`, each at most once, in `lhs` order.
pub fn intersect<T>(lhs: &[T], rhs: &[T]) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    let rhs: HashSet<&T> = rhs.iter().collect();
    let mut seen: HashSet<&T> = HashSet::with_capacity(lhs.len().min(rhs.len()));
    lhs.iter()
        .filter(|item| rhs.contains(item) && seen.insert(*item))
        .cloned()
        .collect()
}
