use serde::{Deserialize, Serialize};

use crate::geometry::point::{Point2d, Point3d};
use crate::geometry::transform::BoundingBox;
use crate::profile::Shape2d;
use crate::tree::CsgError;

/// Twisted (and optionally tapered) extrusion of a profile along +Z.
///
/// The cross-section at height `t` above the bottom is rotated
/// counter-clockwise by `twist_deg * t / height` and scaled by
/// `1 + (scale - 1) * t / height` per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearExtrude {
    pub profile: Shape2d,
    pub height: f64,
    pub twist_deg: f64,
    pub scale: [f64; 2],
    pub center: bool,
    pub slices: u32,
}

impl LinearExtrude {
    pub fn new(profile: Shape2d, height: f64) -> Self {
        Self {
            profile,
            height,
            twist_deg: 0.0,
            scale: [1.0, 1.0],
            center: false,
            slices: 1,
        }
    }

    pub fn twisted(mut self, twist_deg: f64, slices: u32) -> Self {
        self.twist_deg = twist_deg;
        self.slices = slices.max(1);
        self
    }

    pub fn scaled(mut self, sx: f64, sy: f64) -> Self {
        self.scale = [sx, sy];
        self
    }

    pub fn centered(mut self) -> Self {
        self.center = true;
        self
    }

    fn z_bottom(&self) -> f64 {
        if self.center { -self.height / 2.0 } else { 0.0 }
    }

    fn is_straight(&self) -> bool {
        self.twist_deg == 0.0
    }
}

/// Geometry produced by third-party generators. Only the parameters and a
/// solid-of-revolution envelope are known here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExternalPart {
    /// ISO metric thread along +Z starting at z = 0.
    IsoThread {
        diameter: f64,
        pitch: f64,
        length: f64,
        internal: bool,
        lead_in: bool,
    },
    /// Hose barb stack along +Z starting at z = 0, bore included.
    HoseBarb {
        hose_id: f64,
        barb_count: u32,
        length: f64,
        bore: f64,
    },
}

impl ExternalPart {
    /// Outer radius of the envelope.
    pub fn envelope_radius(&self) -> f64 {
        match self {
            Self::IsoThread { diameter, .. } => diameter / 2.0,
            // Barb crests flare past the nominal hose ID.
            Self::HoseBarb { hose_id, .. } => hose_id / 2.0 * 1.15,
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            Self::IsoThread { length, .. } | Self::HoseBarb { length, .. } => *length,
        }
    }

    fn validate(&self) -> Result<(), CsgError> {
        match self {
            Self::IsoThread {
                diameter,
                pitch,
                length,
                ..
            } => {
                positive("thread diameter", *diameter)?;
                positive("thread pitch", *pitch)?;
                positive("thread length", *length)
            }
            Self::HoseBarb {
                hose_id,
                barb_count,
                length,
                bore,
            } => {
                positive("barb hose id", *hose_id)?;
                positive("barb count", *barb_count as f64)?;
                positive("barb length", *length)?;
                positive("barb bore", *bore)?;
                if bore >= hose_id {
                    return Err(CsgError::InvalidDimension {
                        parameter: "barb bore (must be below hose id)",
                        value: *bore,
                    });
                }
                Ok(())
            }
        }
    }

    fn contains(&self, p: &Point3d) -> bool {
        if p.z < 0.0 || p.z > self.length() {
            return false;
        }
        let r = p.radial_distance();
        match self {
            Self::HoseBarb { bore, .. } => r >= bore / 2.0 && r <= self.envelope_radius(),
            Self::IsoThread { .. } => r <= self.envelope_radius(),
        }
    }
}

/// Leaf solids of the CSG tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    /// Cone frustum along +Z; `center` spans `-h/2..h/2` instead of `0..h`.
    Cylinder {
        height: f64,
        r_bottom: f64,
        r_top: f64,
        center: bool,
        segments: u32,
    },
    Cuboid {
        size: [f64; 3],
        center: bool,
    },
    Sphere {
        r: f64,
        segments: u32,
    },
    LinearExtrude(LinearExtrude),
    /// Revolution of a profile (X = radius, Y = height) about Z.
    RotateExtrude {
        profile: Shape2d,
        angle_deg: f64,
        segments: u32,
    },
    External(ExternalPart),
}

impl Primitive {
    pub fn validate(&self) -> Result<(), CsgError> {
        match self {
            Self::Cylinder {
                height,
                r_bottom,
                r_top,
                ..
            } => {
                positive("cylinder height", *height)?;
                non_negative("cylinder bottom radius", *r_bottom)?;
                non_negative("cylinder top radius", *r_top)?;
                positive("cylinder radius", r_bottom.max(*r_top))
            }
            Self::Cuboid { size, .. } => {
                positive("cuboid x", size[0])?;
                positive("cuboid y", size[1])?;
                positive("cuboid z", size[2])
            }
            Self::Sphere { r, .. } => positive("sphere radius", *r),
            Self::LinearExtrude(e) => {
                positive("extrusion height", e.height)?;
                non_negative("extrusion x scale", e.scale[0])?;
                non_negative("extrusion y scale", e.scale[1])?;
                if !e.twist_deg.is_finite() {
                    return Err(CsgError::InvalidDimension {
                        parameter: "extrusion twist",
                        value: e.twist_deg,
                    });
                }
                e.profile.validate()
            }
            Self::RotateExtrude {
                profile, angle_deg, ..
            } => {
                positive("revolution angle", *angle_deg)?;
                profile.validate()?;
                let (lo, _) = profile.bounds();
                if lo.x < 0.0 {
                    return Err(CsgError::InvalidDimension {
                        parameter: "revolved profile crosses the axis at x",
                        value: lo.x,
                    });
                }
                Ok(())
            }
            Self::External(part) => part.validate(),
        }
    }

    /// Conservative axis-aligned bounds in the primitive's own frame.
    pub fn bounds(&self) -> BoundingBox {
        match self {
            Self::Cylinder {
                height,
                r_bottom,
                r_top,
                center,
                ..
            } => {
                let z0 = if *center { -height / 2.0 } else { 0.0 };
                BoundingBox::cylinder(r_bottom.max(*r_top), z0, z0 + height)
            }
            Self::Cuboid { size, center } => {
                let lo = if *center {
                    Point3d::new(-size[0] / 2.0, -size[1] / 2.0, -size[2] / 2.0)
                } else {
                    Point3d::ORIGIN
                };
                BoundingBox::new(lo, Point3d::new(lo.x + size[0], lo.y + size[1], lo.z + size[2]))
            }
            Self::Sphere { r, .. } => {
                BoundingBox::new(Point3d::new(-r, -r, -r), Point3d::new(*r, *r, *r))
            }
            Self::LinearExtrude(e) => {
                let z0 = e.z_bottom();
                let z1 = z0 + e.height;
                if e.is_straight() {
                    // Scaling is linear in t, so the extremes sit at the two caps.
                    let (lo, hi) = e.profile.bounds();
                    let (sx, sy) = (e.scale[0], e.scale[1]);
                    BoundingBox::new(
                        Point3d::new(lo.x.min(lo.x * sx), lo.y.min(lo.y * sy), z0),
                        Point3d::new(hi.x.max(hi.x * sx), hi.y.max(hi.y * sy), z1),
                    )
                } else {
                    let s = e.scale[0].max(e.scale[1]).max(1.0);
                    BoundingBox::cylinder(e.profile.max_radius() * s, z0, z1)
                }
            }
            Self::RotateExtrude { profile, .. } => {
                let (lo, hi) = profile.bounds();
                BoundingBox::new(Point3d::new(-hi.x, -hi.x, lo.y), Point3d::new(hi.x, hi.x, hi.y))
            }
            Self::External(part) => BoundingBox::cylinder(part.envelope_radius(), 0.0, part.length()),
        }
    }

    /// Point membership in the primitive's own frame, boundary inclusive.
    pub fn contains(&self, p: &Point3d) -> bool {
        match self {
            Self::Cylinder {
                height,
                r_bottom,
                r_top,
                center,
                ..
            } => {
                let z0 = if *center { -height / 2.0 } else { 0.0 };
                let t = p.z - z0;
                if t < 0.0 || t > *height {
                    return false;
                }
                let r = r_bottom + (r_top - r_bottom) * t / height;
                p.radial_distance() <= r
            }
            Self::Cuboid { .. } => self.bounds().contains_point(p),
            Self::Sphere { r, .. } => p.distance_to(&Point3d::ORIGIN) <= *r,
            Self::LinearExtrude(e) => {
                let t = p.z - e.z_bottom();
                if t < 0.0 || t > e.height {
                    return false;
                }
                let f = t / e.height;
                let local = Point2d::new(p.x, p.y).rotated_deg(-e.twist_deg * f);
                let sx = 1.0 + (e.scale[0] - 1.0) * f;
                let sy = 1.0 + (e.scale[1] - 1.0) * f;
                if sx <= 0.0 || sy <= 0.0 {
                    return false;
                }
                e.profile.contains(Point2d::new(local.x / sx, local.y / sy))
            }
            Self::RotateExtrude {
                profile, angle_deg, ..
            } => {
                if *angle_deg < 360.0 {
                    let phi = p.y.atan2(p.x).to_degrees().rem_euclid(360.0);
                    if phi > *angle_deg {
                        return false;
                    }
                }
                profile.contains(Point2d::new(p.radial_distance(), p.z))
            }
            Self::External(part) => part.contains(p),
        }
    }
}

fn positive(parameter: &'static str, value: f64) -> Result<(), CsgError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CsgError::InvalidDimension { parameter, value })
    }
}

fn non_negative(parameter: &'static str, value: f64) -> Result<(), CsgError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CsgError::InvalidDimension { parameter, value })
    }
}
