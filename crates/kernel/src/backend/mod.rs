pub mod scad;

use slotmap::SecondaryMap;

use crate::geometry::transform::Transform;
use crate::primitive::Primitive;
use crate::tree::{CsgError, CsgStore, Node, NodeId};

pub use scad::ScadEmitter;

/// Visitor that realizes a CSG tree in some target representation.
///
/// Implement this trait to hand the tree to a mesher, an exporter, or an
/// analysis pass. `evaluate` drives it bottom-up and calls each node once,
/// even when the node is shared by several parents.
pub trait CsgBackend {
    type Output: Clone;

    fn empty(&mut self) -> Result<Self::Output, CsgError>;

    fn primitive(&mut self, primitive: &Primitive) -> Result<Self::Output, CsgError>;

    fn transform(&mut self, transform: &Transform, child: Self::Output) -> Result<Self::Output, CsgError>;

    fn union(&mut self, children: Vec<Self::Output>) -> Result<Self::Output, CsgError>;

    fn difference(
        &mut self,
        base: Self::Output,
        cutters: Vec<Self::Output>,
    ) -> Result<Self::Output, CsgError>;

    fn intersection(&mut self, children: Vec<Self::Output>) -> Result<Self::Output, CsgError>;

    /// Called for nodes referenced by more than one parent. `index` counts
    /// shared nodes in evaluation order. The returned value replaces `output`
    /// for every parent.
    fn shared(&mut self, _index: usize, output: Self::Output) -> Result<Self::Output, CsgError> {
        Ok(output)
    }
}

/// Evaluate the tree under `root` with `backend`.
pub fn evaluate<B: CsgBackend>(
    store: &CsgStore,
    root: NodeId,
    backend: &mut B,
) -> Result<B::Output, CsgError> {
    let counts = store.reference_counts(root)?;
    let mut done: SecondaryMap<NodeId, B::Output> = SecondaryMap::new();
    let mut shared = 0;

    for id in store.post_order(root)? {
        let fetch = |child: &NodeId| done.get(*child).cloned().ok_or(CsgError::UnknownNode);
        let output = match store.get(id)? {
            Node::Empty => backend.empty()?,
            Node::Primitive(p) => backend.primitive(p)?,
            Node::Transform { transform, child } => {
                let child = fetch(child)?;
                backend.transform(transform, child)?
            }
            Node::Union(children) => {
                let children = children.iter().map(fetch).collect::<Result<Vec<_>, _>>()?;
                backend.union(children)?
            }
            Node::Difference { base, cutters } => {
                let base = fetch(base)?;
                let cutters = cutters.iter().map(fetch).collect::<Result<Vec<_>, _>>()?;
                backend.difference(base, cutters)?
            }
            Node::Intersection(children) => {
                let children = children.iter().map(fetch).collect::<Result<Vec<_>, _>>()?;
                backend.intersection(children)?
            }
        };
        let output = if counts.get(id).copied().unwrap_or(0) > 1 {
            shared += 1;
            backend.shared(shared - 1, output)?
        } else {
            output
        };
        done.insert(id, output);
    }

    done.remove(root).ok_or(CsgError::UnknownNode)
}
