use nalgebra::{Matrix4, Point3, Rotation3, Translation3, Vector3};
use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// A 4x4 affine transformation stored in column-major order.
///
/// Composition and inversion go through `nalgebra`; the flat array is what
/// gets serialized, so fingerprints do not depend on the matrix library.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Column-major 4x4 matrix entries.
    pub m: [f64; 16],
}

impl Transform {
    fn from_matrix(matrix: Matrix4<f64>) -> Self {
        let mut m = [0.0; 16];
        m.copy_from_slice(matrix.as_slice());
        Self { m }
    }

    pub fn matrix(&self) -> Matrix4<f64> {
        Matrix4::from_column_slice(&self.m)
    }

    pub fn identity() -> Self {
        Self::from_matrix(Matrix4::identity())
    }

    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self::from_matrix(Translation3::new(dx, dy, dz).to_homogeneous())
    }

    pub fn scaling(sx: f64, sy: f64, sz: f64) -> Self {
        Self::from_matrix(Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz)))
    }

    /// Reflection through the XY plane (z → −z).
    pub fn mirror_z() -> Self {
        Self::scaling(1.0, 1.0, -1.0)
    }

    /// Counter-clockwise rotation about +Z by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        Self::from_matrix(Rotation3::from_axis_angle(&Vector3::z_axis(), angle).to_homogeneous())
    }

    /// Counter-clockwise rotation about +Z by `deg` degrees.
    pub fn rotation_z_deg(deg: f64) -> Self {
        Self::rotation_z(deg.to_radians())
    }

    /// Rotation about +X by `deg` degrees.
    pub fn rotation_x_deg(deg: f64) -> Self {
        Self::from_matrix(
            Rotation3::from_axis_angle(&Vector3::x_axis(), deg.to_radians()).to_homogeneous(),
        )
    }

    /// Helical placement: rotate by `rot_deg` about Z, then lift by `z`.
    pub fn helical(z: f64, rot_deg: f64) -> Self {
        Self::rotation_z_deg(rot_deg).then(&Self::translation(0.0, 0.0, z))
    }

    /// Transform a point (applies translation).
    pub fn transform_point(&self, p: &Point3d) -> Point3d {
        let q = self.matrix().transform_point(&Point3::new(p.x, p.y, p.z));
        Point3d::new(q.x, q.y, q.z)
    }

    /// Transform a vector (no translation).
    pub fn transform_vector(&self, v: &Vec3) -> Vec3 {
        let q = self.matrix().transform_vector(&Vector3::new(v.x, v.y, v.z));
        Vec3::new(q.x, q.y, q.z)
    }

    /// Apply `self` first, then `next`.
    pub fn then(&self, next: &Transform) -> Transform {
        Self::from_matrix(next.matrix() * self.matrix())
    }

    /// Compute the inverse transform. Returns None if the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix().try_inverse().map(Self::from_matrix)
    }

    /// Row-major rows, as `multmatrix` expects them.
    pub fn rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.m[c * 4 + r];
            }
        }
        rows
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    pub fn new(min: Point3d, max: Point3d) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Box around a Z-axis cylinder of `radius` spanning `z0..z1`.
    pub fn cylinder(radius: f64, z0: f64, z1: f64) -> Self {
        Self::new(
            Point3d::new(-radius, -radius, z0),
            Point3d::new(radius, radius, z1),
        )
    }

    pub fn from_points(points: &[Point3d]) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_to_include(p);
        }
        bb
    }

    pub fn expand_to_include(&mut self, p: &Point3d) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point3d::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3d::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Overlap of two boxes; empty (invalid) when they are disjoint.
    pub fn intersection(&self, other: &Self) -> Self {
        let bb = Self {
            min: Point3d::new(
                self.min.x.max(other.min.x),
                self.min.y.max(other.min.y),
                self.min.z.max(other.min.z),
            ),
            max: Point3d::new(
                self.max.x.min(other.max.x),
                self.max.y.min(other.max.y),
                self.max.z.min(other.max.z),
            ),
        };
        if bb.is_valid() { bb } else { Self::empty() }
    }

    /// Box around the eight transformed corners.
    pub fn transformed(&self, t: &Transform) -> Self {
        if !self.is_valid() {
            return *self;
        }
        let corners: Vec<Point3d> = (0..8)
            .map(|i| {
                let x = if i & 1 == 0 { self.min.x } else { self.max.x };
                let y = if i & 2 == 0 { self.min.y } else { self.max.y };
                let z = if i & 4 == 0 { self.min.z } else { self.max.z };
                t.transform_point(&Point3d::new(x, y, z))
            })
            .collect();
        Self::from_points(&corners)
    }

    pub fn contains_point(&self, p: &Point3d) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn center(&self) -> Point3d {
        self.min.midpoint(&self.max)
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest distance of any corner from the Z axis.
    pub fn radial_extent(&self) -> f64 {
        let x = self.min.x.abs().max(self.max.x.abs());
        let y = self.min.y.abs().max(self.max.y.abs());
        x.hypot(y)
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }
}
