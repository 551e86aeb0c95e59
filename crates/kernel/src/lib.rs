//! Typed constructive solid geometry for swept, twisted parts.
//!
//! Builders insert immutable nodes into a [`CsgStore`]; analysis passes and
//! backends walk the resulting DAG from a root [`NodeId`].

pub mod analysis;
pub mod backend;
pub mod geometry;
pub mod primitive;
pub mod profile;
pub mod tree;

pub use backend::{evaluate, CsgBackend, ScadEmitter};
pub use geometry::point::{Point2d, Point3d};
pub use geometry::transform::{BoundingBox, Transform};
pub use geometry::vector::Vec3;
pub use primitive::{ExternalPart, LinearExtrude, Primitive};
pub use profile::Shape2d;
pub use tree::{CsgError, CsgStore, Node, NodeId};
