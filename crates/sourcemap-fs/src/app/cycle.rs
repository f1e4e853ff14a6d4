//! Detects when the swimlane revisits an item an earlier tool already selected.

use crate::domain::model::Item;

/// A repeated selection: tool `to` selected the same item as the earlier tool `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CycleEdge {
    pub from: usize,
    pub to: usize,
}

/// Every pair of positions holding the same selected item.
///
/// Scans right to left, pairing each selection with every earlier equal one. Empty slots never
/// take part.
pub fn detect(selections: &[Option<Item>]) -> Vec<CycleEdge> {
    let mut edges = Vec::new();
    for to in (1..selections.len()).rev() {
        let Some(current) = selections[to] else {
            continue;
        };
        for from in (0..to).rev() {
            if selections[from] == Some(current) {
                edges.push(CycleEdge { from, to });
            }
        }
    }
    edges
}

/// Holds the last computed report. Recomputed from scratch on every swimlane change.
#[derive(Debug, Default, Clone)]
pub struct CycleDetector {
    edges: Vec<CycleEdge>,
}

impl CycleDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute from the current selections. Returns `true` when the report changed.
    pub fn update(&mut self, selections: &[Option<Item>]) -> bool {
        let edges = detect(selections);
        if edges == self.edges {
            return false;
        }
        if !edges.is_empty() {
            tracing::debug!(edges = edges.len(), "navigation cycle detected");
        }
        self.edges = edges;
        true
    }

    pub fn edges(&self) -> &[CycleEdge] {
        &self.edges
    }

    pub fn has_cycle(&self) -> bool {
        !self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::model::{ChunkId, ModuleId};

    const A: Item = Item::Chunk(ChunkId(0));
    const B: Item = Item::Module(ModuleId(0));

    fn sorted(mut edges: Vec<CycleEdge>) -> Vec<(usize, usize)> {
        edges.sort();
        edges.into_iter().map(|edge| (edge.from, edge.to)).collect()
    }

    #[test]
    fn repeated_item_forms_an_edge() {
        assert_eq!(sorted(detect(&[Some(A), Some(B), Some(A)])), vec![(0, 2)]);
    }

    #[test]
    fn distinct_items_have_no_cycle() {
        assert!(detect(&[Some(A), Some(B), None]).is_empty());
        assert!(detect(&[]).is_empty());
        assert!(detect(&[Some(A)]).is_empty());
    }

    #[test]
    fn empty_selections_never_match() {
        assert!(detect(&[None, None, Some(A), None]).is_empty());
    }

    #[test]
    fn every_repeat_is_reported() {
        let edges = detect(&[Some(A), Some(B), Some(A), Some(B)]);
        assert_eq!(sorted(edges), vec![(0, 2), (1, 3)]);

        let edges = detect(&[Some(A), Some(A), Some(A)]);
        assert_eq!(sorted(edges), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn detector_reports_changes_only() {
        let mut detector = CycleDetector::new();
        assert!(!detector.update(&[Some(A), Some(B)]));
        assert!(!detector.has_cycle());
        assert!(detector.update(&[Some(A), Some(B), Some(A)]));
        assert!(detector.has_cycle());
        assert!(!detector.update(&[Some(A), Some(B), Some(A)]));
        assert!(detector.update(&[Some(A), Some(B)]));
        assert!(detector.edges().is_empty());
    }
}
