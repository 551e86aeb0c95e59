use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

use crate::tree::{CsgError, CsgStore, Node, NodeId};

/// Node counts over the DAG reachable from a root. Shared nodes count once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub nodes: usize,
    pub primitives: usize,
    pub transforms: usize,
    pub unions: usize,
    pub differences: usize,
    pub intersections: usize,
    pub empties: usize,
    /// Nodes referenced by more than one parent.
    pub shared: usize,
    /// Longest root-to-leaf path, counted in nodes.
    pub depth: usize,
}

pub fn stats(store: &CsgStore, root: NodeId) -> Result<TreeStats, CsgError> {
    let mut s = TreeStats::default();
    let counts = store.reference_counts(root)?;
    let mut depth: SecondaryMap<NodeId, usize> = SecondaryMap::new();

    for id in store.post_order(root)? {
        let node = store.get(id)?;
        s.nodes += 1;
        match node {
            Node::Empty => s.empties += 1,
            Node::Primitive(_) => s.primitives += 1,
            Node::Transform { .. } => s.transforms += 1,
            Node::Union(_) => s.unions += 1,
            Node::Difference { .. } => s.differences += 1,
            Node::Intersection(_) => s.intersections += 1,
        }
        if counts.get(id).copied().unwrap_or(0) > 1 {
            s.shared += 1;
        }
        let below = node
            .children()
            .iter()
            .filter_map(|c| depth.get(*c).copied())
            .max()
            .unwrap_or(0);
        depth.insert(id, below + 1);
    }
    s.depth = depth.get(root).copied().unwrap_or(0);
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_count_shared_once() {
        let mut store = CsgStore::new();
        let master = store.cylinder(10.0, 1.0, true, 16).unwrap();
        let a = store.translate(master, 0.0, 0.0, 1.0).unwrap();
        let b = store.translate(master, 0.0, 0.0, 2.0).unwrap();
        let root = store.union(vec![a, b]).unwrap();

        let s = stats(&store, root).unwrap();
        assert_eq!(s.nodes, 4);
        assert_eq!(s.primitives, 1);
        assert_eq!(s.transforms, 2);
        assert_eq!(s.unions, 1);
        assert_eq!(s.shared, 1);
        assert_eq!(s.depth, 3);
    }
}
