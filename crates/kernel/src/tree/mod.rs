//! Arena-backed constructive solid geometry tree.
//!
//! Nodes are immutable once inserted and may be shared by several parents,
//! so a tree is really a DAG rooted at whichever node the caller keeps.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::geometry::transform::Transform;
use crate::primitive::{ExternalPart, LinearExtrude, Primitive};
use crate::profile::Shape2d;

new_key_type! {
    pub struct NodeId;
}

/// Failures raised while building a tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CsgError {
    #[error("invalid dimension for {parameter}: {value}")]
    InvalidDimension { parameter: &'static str, value: f64 },

    #[error("profile needs at least {required} points, got {provided}")]
    InsufficientProfile { required: usize, provided: usize },

    #[error("{operation} needs at least one operand")]
    EmptyOperands { operation: &'static str },

    #[error("node is not part of this store")]
    UnknownNode,

    #[error("cannot serialize tree: {message}")]
    Serialization { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// The empty set. Identity for union, absorbing for intersection.
    Empty,
    Primitive(Primitive),
    Transform { transform: Transform, child: NodeId },
    Union(Vec<NodeId>),
    Difference { base: NodeId, cutters: Vec<NodeId> },
    Intersection(Vec<NodeId>),
}

impl Node {
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Empty | Node::Primitive(_) => Vec::new(),
            Node::Transform { child, .. } => vec![*child],
            Node::Union(c) | Node::Intersection(c) => c.clone(),
            Node::Difference { base, cutters } => {
                let mut c = Vec::with_capacity(cutters.len() + 1);
                c.push(*base);
                c.extend_from_slice(cutters);
                c
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Empty => "empty",
            Node::Primitive(_) => "primitive",
            Node::Transform { .. } => "transform",
            Node::Union(_) => "union",
            Node::Difference { .. } => "difference",
            Node::Intersection(_) => "intersection",
        }
    }
}

/// Arena owning every node of one build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsgStore {
    nodes: SlotMap<NodeId, Node>,
}

impl CsgStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, CsgError> {
        self.nodes.get(id).ok_or(CsgError::UnknownNode)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    fn check(&self, ids: &[NodeId]) -> Result<(), CsgError> {
        if ids.iter().all(|id| self.nodes.contains_key(*id)) {
            Ok(())
        } else {
            Err(CsgError::UnknownNode)
        }
    }

    // ── Leaves ──────────────────────────────────────────────────────────

    pub fn empty(&mut self) -> NodeId {
        self.nodes.insert(Node::Empty)
    }

    pub fn primitive(&mut self, primitive: Primitive) -> Result<NodeId, CsgError> {
        primitive.validate()?;
        Ok(self.nodes.insert(Node::Primitive(primitive)))
    }

    pub fn cylinder(
        &mut self,
        height: f64,
        r: f64,
        center: bool,
        segments: u32,
    ) -> Result<NodeId, CsgError> {
        self.cone(height, r, r, center, segments)
    }

    pub fn cone(
        &mut self,
        height: f64,
        r_bottom: f64,
        r_top: f64,
        center: bool,
        segments: u32,
    ) -> Result<NodeId, CsgError> {
        self.primitive(Primitive::Cylinder {
            height,
            r_bottom,
            r_top,
            center,
            segments,
        })
    }

    pub fn cuboid(&mut self, size: [f64; 3], center: bool) -> Result<NodeId, CsgError> {
        self.primitive(Primitive::Cuboid { size, center })
    }

    pub fn sphere(&mut self, r: f64, segments: u32) -> Result<NodeId, CsgError> {
        self.primitive(Primitive::Sphere { r, segments })
    }

    pub fn linear_extrude(&mut self, extrude: LinearExtrude) -> Result<NodeId, CsgError> {
        self.primitive(Primitive::LinearExtrude(extrude))
    }

    pub fn rotate_extrude(
        &mut self,
        profile: Shape2d,
        angle_deg: f64,
        segments: u32,
    ) -> Result<NodeId, CsgError> {
        self.primitive(Primitive::RotateExtrude {
            profile,
            angle_deg,
            segments,
        })
    }

    pub fn external(&mut self, part: ExternalPart) -> Result<NodeId, CsgError> {
        self.primitive(Primitive::External(part))
    }

    // ── Placement ───────────────────────────────────────────────────────

    /// Wrap `child` in a transform. Identity transforms return `child` itself.
    pub fn transform(&mut self, child: NodeId, transform: Transform) -> Result<NodeId, CsgError> {
        self.check(&[child])?;
        if transform.is_identity() {
            return Ok(child);
        }
        Ok(self.nodes.insert(Node::Transform { transform, child }))
    }

    pub fn translate(&mut self, child: NodeId, dx: f64, dy: f64, dz: f64) -> Result<NodeId, CsgError> {
        self.transform(child, Transform::translation(dx, dy, dz))
    }

    pub fn rotate_z(&mut self, child: NodeId, deg: f64) -> Result<NodeId, CsgError> {
        self.transform(child, Transform::rotation_z_deg(deg))
    }

    pub fn mirror_z(&mut self, child: NodeId) -> Result<NodeId, CsgError> {
        self.transform(child, Transform::mirror_z())
    }

    // ── Booleans ────────────────────────────────────────────────────────

    /// Union of `children`; a single child is returned unchanged.
    #[instrument(skip(self, children), fields(operands = children.len()))]
    pub fn union(&mut self, children: Vec<NodeId>) -> Result<NodeId, CsgError> {
        self.check(&children)?;
        match children.len() {
            0 => Err(CsgError::EmptyOperands { operation: "union" }),
            1 => Ok(children[0]),
            _ => {
                debug!("union node");
                Ok(self.nodes.insert(Node::Union(children)))
            }
        }
    }

    /// `base` minus every cutter; without cutters `base` is returned unchanged.
    #[instrument(skip(self, base, cutters), fields(cutters = cutters.len()))]
    pub fn difference(&mut self, base: NodeId, cutters: Vec<NodeId>) -> Result<NodeId, CsgError> {
        self.check(&[base])?;
        self.check(&cutters)?;
        if cutters.is_empty() {
            return Ok(base);
        }
        debug!("difference node");
        Ok(self.nodes.insert(Node::Difference { base, cutters }))
    }

    #[instrument(skip(self, children), fields(operands = children.len()))]
    pub fn intersection(&mut self, children: Vec<NodeId>) -> Result<NodeId, CsgError> {
        self.check(&children)?;
        match children.len() {
            0 => Err(CsgError::EmptyOperands {
                operation: "intersection",
            }),
            1 => Ok(children[0]),
            _ => {
                debug!("intersection node");
                Ok(self.nodes.insert(Node::Intersection(children)))
            }
        }
    }

    /// Nodes reachable from `root`, children before parents, each once.
    pub fn post_order(&self, root: NodeId) -> Result<Vec<NodeId>, CsgError> {
        let mut order = Vec::new();
        let mut visited = slotmap::SecondaryMap::new();
        self.visit(root, &mut visited, &mut order)?;
        Ok(order)
    }

    fn visit(
        &self,
        id: NodeId,
        visited: &mut slotmap::SecondaryMap<NodeId, ()>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), CsgError> {
        if visited.contains_key(id) {
            return Ok(());
        }
        for child in self.get(id)?.children() {
            self.visit(child, visited, order)?;
        }
        visited.insert(id, ());
        order.push(id);
        Ok(())
    }

    /// How many parents reachable from `root` reference each node.
    pub fn reference_counts(
        &self,
        root: NodeId,
    ) -> Result<slotmap::SecondaryMap<NodeId, usize>, CsgError> {
        let mut counts = slotmap::SecondaryMap::new();
        for id in self.post_order(root)? {
            if let Some(entry) = counts.entry(id) {
                entry.or_insert(0);
            }
            for child in self.get(id)?.children() {
                if let Some(entry) = counts.entry(child) {
                    *entry.or_insert(0) += 1;
                }
            }
        }
        Ok(counts)
    }
}
