use crate::geometry::point::Point3d;
use crate::tree::{CsgError, CsgStore, Node, NodeId};

/// Point membership in the solid under `root`, boundary inclusive.
///
/// This is the reference evaluator for the tree: it needs no mesh, so tests
/// can probe phase alignment of swept parts directly.
pub fn contains(store: &CsgStore, root: NodeId, point: &Point3d) -> Result<bool, CsgError> {
    match store.get(root)? {
        Node::Empty => Ok(false),
        Node::Primitive(p) => Ok(p.contains(point)),
        Node::Transform { transform, child } => match transform.inverse() {
            Some(inv) => contains(store, *child, &inv.transform_point(point)),
            None => Ok(false),
        },
        Node::Union(children) => {
            for child in children {
                if contains(store, *child, point)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Node::Difference { base, cutters } => {
            if !contains(store, *base, point)? {
                return Ok(false);
            }
            for cutter in cutters {
                if contains(store, *cutter, point)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Node::Intersection(children) => {
            for child in children {
                if !contains(store, *child, point)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}
