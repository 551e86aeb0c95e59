use tracing::debug;

use crate::backend::{evaluate, CsgBackend};
use crate::geometry::transform::{BoundingBox, Transform};
use crate::primitive::Primitive;
use crate::tree::{CsgError, CsgStore, NodeId};

/// Conservative axis-aligned bounds of the solid under `root`.
///
/// A difference keeps its base box and an intersection clips to the overlap
/// of its operands, so intersecting with an untwisted cylinder yields exactly
/// that cylinder's height.
pub fn bounds(store: &CsgStore, root: NodeId) -> Result<BoundingBox, CsgError> {
    let bb = evaluate(store, root, &mut BoundsBackend)?;
    debug!(min = ?bb.min.to_array(), max = ?bb.max.to_array(), "tree bounds");
    Ok(bb)
}

struct BoundsBackend;

impl CsgBackend for BoundsBackend {
    type Output = BoundingBox;

    fn empty(&mut self) -> Result<BoundingBox, CsgError> {
        Ok(BoundingBox::empty())
    }

    fn primitive(&mut self, primitive: &Primitive) -> Result<BoundingBox, CsgError> {
        Ok(primitive.bounds())
    }

    fn transform(&mut self, transform: &Transform, child: BoundingBox) -> Result<BoundingBox, CsgError> {
        Ok(child.transformed(transform))
    }

    fn union(&mut self, children: Vec<BoundingBox>) -> Result<BoundingBox, CsgError> {
        Ok(children
            .iter()
            .fold(BoundingBox::empty(), |acc, bb| acc.union(bb)))
    }

    fn difference(&mut self, base: BoundingBox, _cutters: Vec<BoundingBox>) -> Result<BoundingBox, CsgError> {
        Ok(base)
    }

    fn intersection(&mut self, children: Vec<BoundingBox>) -> Result<BoundingBox, CsgError> {
        let mut iter = children.into_iter();
        let first = iter.next().ok_or(CsgError::EmptyOperands {
            operation: "intersection",
        })?;
        Ok(iter.fold(first, |acc, bb| acc.intersection(&bb)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::LinearExtrude;
    use crate::profile::Shape2d;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_intersection_clips_to_cylinder_height() {
        let mut store = CsgStore::new();
        let rod = store
            .linear_extrude(
                LinearExtrude::new(Shape2d::circle(1.0).offset(2.0, 0.0), 40.0)
                    .twisted(720.0, 80)
                    .centered(),
            )
            .unwrap();
        let clip = store.cylinder(7.5, 10.0, true, 32).unwrap();
        let piece = store.intersection(vec![rod, clip]).unwrap();
        let placed = store.translate(piece, 0.0, 0.0, 12.0).unwrap();

        let bb = bounds(&store, placed).unwrap();
        assert_abs_diff_eq!(bb.size().z, 7.5, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.center().z, 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max.x, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_difference_keeps_base_box() {
        let mut store = CsgStore::new();
        let disc = store.cylinder(5.0, 10.0, true, 32).unwrap();
        let hole = store.cylinder(20.0, 2.0, true, 32).unwrap();
        let root = store.difference(disc, vec![hole]).unwrap();
        let bb = bounds(&store, root).unwrap();
        assert_abs_diff_eq!(bb.size().z, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max.x, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_union_with_empty_ignores_empty() {
        let mut store = CsgStore::new();
        let nothing = store.empty();
        let cube = store.cuboid([1.0, 2.0, 3.0], false).unwrap();
        let root = store.union(vec![nothing, cube]).unwrap();
        let bb = bounds(&store, root).unwrap();
        assert_abs_diff_eq!(bb.max.z, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.min.x, 0.0, epsilon = 1e-12);
    }
}
