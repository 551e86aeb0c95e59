use serde::Serialize;
use sha2::{Digest, Sha256};
use slotmap::SecondaryMap;

use crate::geometry::transform::Transform;
use crate::primitive::Primitive;
use crate::tree::{CsgError, CsgStore, Node, NodeId};

/// Node with children replaced by their position in the post-order list,
/// so the digest does not depend on arena keys.
#[derive(Serialize)]
enum CanonicalNode<'a> {
    Empty,
    Primitive(&'a Primitive),
    Transform { transform: &'a Transform, child: usize },
    Union(Vec<usize>),
    Difference { base: usize, cutters: Vec<usize> },
    Intersection(Vec<usize>),
}

/// SHA-256 (lowercase hex) of the tree under `root`.
pub fn fingerprint(store: &CsgStore, root: NodeId) -> Result<String, CsgError> {
    let order = store.post_order(root)?;
    let mut position: SecondaryMap<NodeId, usize> = SecondaryMap::new();
    let mut canonical = Vec::with_capacity(order.len());

    for (i, id) in order.iter().enumerate() {
        let pos = |c: &NodeId| position.get(*c).copied().ok_or(CsgError::UnknownNode);
        let node = match store.get(*id)? {
            Node::Empty => CanonicalNode::Empty,
            Node::Primitive(p) => CanonicalNode::Primitive(p),
            Node::Transform { transform, child } => CanonicalNode::Transform {
                transform,
                child: pos(child)?,
            },
            Node::Union(c) => CanonicalNode::Union(c.iter().map(pos).collect::<Result<_, _>>()?),
            Node::Difference { base, cutters } => CanonicalNode::Difference {
                base: pos(base)?,
                cutters: cutters.iter().map(pos).collect::<Result<_, _>>()?,
            },
            Node::Intersection(c) => {
                CanonicalNode::Intersection(c.iter().map(pos).collect::<Result<_, _>>()?)
            }
        };
        canonical.push(node);
        position.insert(*id, i);
    }

    Ok(hex_digest(&canonical_json(&canonical)?))
}

fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CsgError> {
    serde_json::to_vec(value).map_err(|e| CsgError::Serialization {
        message: e.to_string(),
    })
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(store: &mut CsgStore, z: f64) -> NodeId {
        let a = store.cylinder(10.0, 1.0, true, 16).unwrap();
        let b = store.translate(a, 0.0, 0.0, z).unwrap();
        store.union(vec![a, b]).unwrap()
    }

    #[test]
    fn test_equal_trees_equal_fingerprints() {
        let mut s1 = CsgStore::new();
        let _ = s1.sphere(3.0, 8).unwrap();
        let r1 = build(&mut s1, 4.0);
        let mut s2 = CsgStore::new();
        let r2 = build(&mut s2, 4.0);
        assert_eq!(fingerprint(&s1, r1).unwrap(), fingerprint(&s2, r2).unwrap());
        assert_eq!(fingerprint(&s1, r1).unwrap().len(), 64);
    }

    #[test]
    fn test_different_trees_differ() {
        let mut s1 = CsgStore::new();
        let r1 = build(&mut s1, 4.0);
        let mut s2 = CsgStore::new();
        let r2 = build(&mut s2, 4.5);
        assert_ne!(fingerprint(&s1, r1).unwrap(), fingerprint(&s2, r2).unwrap());
    }

    #[test]
    fn test_serialization_failure_is_an_error() {
        // JSON object keys must be strings.
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1u8], 0u8);
        let err = canonical_json(&map).unwrap_err();
        assert!(matches!(err, CsgError::Serialization { .. }));
        assert!(canonical_json(&[1u8, 2]).is_ok());
    }
}
