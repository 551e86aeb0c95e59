//! Property-based tests for kernel invariants using the `proptest` crate.

use proptest::prelude::*;

use csg_kernel::analysis::{bounds, contains, fingerprint};
use csg_kernel::geometry::point::Point3d;
use csg_kernel::geometry::transform::Transform;
use csg_kernel::primitive::LinearExtrude;
use csg_kernel::profile::Shape2d;
use csg_kernel::tree::{CsgStore, NodeId};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_point() -> impl Strategy<Value = (f64, f64, f64)> {
    (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0)
}

fn arb_angle_deg() -> impl Strategy<Value = f64> {
    -720.0f64..720.0
}

const TOL: f64 = 1e-6;

fn helix_rod(store: &mut CsgStore, height: f64, twist: f64) -> NodeId {
    store
        .linear_extrude(
            LinearExtrude::new(Shape2d::ellipse(1.0, 1.4).offset(2.5, 0.0), height)
                .twisted(twist, 64)
                .centered(),
        )
        .unwrap()
}

// ---------------------------------------------------------------------------
// 1. Helical placement is invertible
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn helical_inverse_round_trip(
        (x, y, z) in arb_point(),
        lift in -100.0f64..100.0,
        rot in arb_angle_deg(),
    ) {
        let t = Transform::helical(lift, rot);
        let inv = t.inverse().unwrap();
        let p = Point3d::new(x, y, z);
        let back = inv.transform_point(&t.transform_point(&p));
        prop_assert!(back.distance_to(&p) < TOL);
    }
}

// ---------------------------------------------------------------------------
// 2. `then` applies left to right
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn then_matches_sequential_application(
        (x, y, z) in arb_point(),
        (dx, dy, dz) in arb_point(),
        rot in arb_angle_deg(),
    ) {
        let a = Transform::translation(dx, dy, dz);
        let b = Transform::rotation_z_deg(rot);
        let p = Point3d::new(x, y, z);
        let composed = a.then(&b).transform_point(&p);
        let stepwise = b.transform_point(&a.transform_point(&p));
        prop_assert!(composed.distance_to(&stepwise) < TOL);
    }
}

// ---------------------------------------------------------------------------
// 3. The profile centre follows the twist at every height
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn twisted_rod_tracks_its_phase(
        height in 1.0f64..200.0,
        twist in arb_angle_deg(),
        frac in 0.0f64..1.0,
    ) {
        let mut store = CsgStore::new();
        let rod = helix_rod(&mut store, height, twist);
        let z = -height / 2.0 + frac * height;
        let angle = twist * frac;
        let on_path = Point3d::cylindrical(2.5, angle, z);
        let opposite = Point3d::cylindrical(2.5, angle + 180.0, z);
        prop_assert!(contains(&store, rod, &on_path).unwrap());
        prop_assert!(!contains(&store, rod, &opposite).unwrap());
    }
}

// ---------------------------------------------------------------------------
// 4. Every contained point lies inside the reported bounds
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn contained_points_lie_in_bounds(
        twist in arb_angle_deg(),
        lift in -50.0f64..50.0,
        rot in arb_angle_deg(),
        (x, y, z) in (-6.0f64..6.0, -6.0f64..6.0, -70.0f64..70.0),
    ) {
        let mut store = CsgStore::new();
        let rod = helix_rod(&mut store, 20.0, twist);
        let placed = store.transform(rod, Transform::helical(lift, rot)).unwrap();
        let clip = store.cylinder(12.0, 10.0, true, 32).unwrap();
        let root = store.intersection(vec![placed, clip]).unwrap();

        let bb = bounds(&store, root).unwrap();
        let p = Point3d::new(x, y, z);
        if contains(&store, root, &p).unwrap() {
            prop_assert!(bb.contains_point(&p));
        }
        prop_assert!(bb.size().z <= 12.0 + TOL);
    }
}

// ---------------------------------------------------------------------------
// 5. Fingerprints depend only on structure
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn fingerprint_is_deterministic(
        height in 1.0f64..100.0,
        twist in arb_angle_deg(),
        padding in 0usize..4,
    ) {
        let mut s1 = CsgStore::new();
        for _ in 0..padding {
            s1.empty();
        }
        let r1 = helix_rod(&mut s1, height, twist);
        let mut s2 = CsgStore::new();
        let r2 = helix_rod(&mut s2, height, twist);
        prop_assert_eq!(fingerprint(&s1, r1).unwrap(), fingerprint(&s2, r2).unwrap());
    }
}
