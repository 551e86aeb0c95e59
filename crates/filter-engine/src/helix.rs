use csg_kernel::{CsgError, CsgStore, LinearExtrude, NodeId, Point3d, Shape2d, Transform};

use crate::config::ParameterSet;
use crate::error::FilterError;

/// A helix of constant twist rate (degrees per millimetre) about the Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelicalPath {
    pub radius: f64,
    pub twist_rate: f64,
}

impl HelicalPath {
    /// `revolutions` full turns over `total_length`.
    pub fn new(radius: f64, total_length: f64, revolutions: f64) -> Result<Self, FilterError> {
        if !(total_length > 0.0 && total_length.is_finite()) {
            return Err(CsgError::InvalidDimension {
                parameter: "helix total length",
                value: total_length,
            }
            .into());
        }
        Ok(Self {
            radius,
            twist_rate: 360.0 * revolutions / total_length,
        })
    }

    pub fn from_params(params: &ParameterSet) -> Result<Self, FilterError> {
        Self::new(
            params.helix_path_radius_mm,
            params.insert_length_mm,
            params.number_of_complete_revolutions,
        )
    }

    /// Phase angle in degrees at height `z`.
    pub fn rotation_at(&self, z: f64) -> f64 {
        self.twist_rate * z
    }

    /// Twist accumulated over `length`.
    pub fn twist_over(&self, length: f64) -> f64 {
        self.twist_rate * length
    }

    /// Axial advance per full turn. Infinite for an untwisted path.
    pub fn pitch(&self) -> f64 {
        360.0 / self.twist_rate
    }

    /// Centre of the swept profile at height `z`.
    pub fn center_at(&self, z: f64) -> Point3d {
        Point3d::cylindrical(self.radius, self.rotation_at(z), z)
    }

    /// Sweep `shape` from `z0` over `length` so that its section at height
    /// `z` is rotated by `rotation_at(z) + phase_deg`.
    pub fn sweep(
        &self,
        store: &mut CsgStore,
        shape: Shape2d,
        z0: f64,
        length: f64,
        phase_deg: f64,
        slices: u32,
    ) -> Result<NodeId, FilterError> {
        helical_sweep(store, shape, z0, length, self.twist_rate, phase_deg, [1.0, 1.0], slices)
    }
}

/// Twisted extrusion placed so its section angle at height `z` is
/// `rate * z + phase_deg`, whatever `z0` is. `scale` tapers the section
/// linearly from the bottom to the top.
#[allow(clippy::too_many_arguments)]
pub fn helical_sweep(
    store: &mut CsgStore,
    shape: Shape2d,
    z0: f64,
    length: f64,
    rate: f64,
    phase_deg: f64,
    scale: [f64; 2],
    slices: u32,
) -> Result<NodeId, FilterError> {
    let extrude = LinearExtrude::new(shape, length)
        .twisted(rate * length, slices)
        .scaled(scale[0], scale[1]);
    let raw = store.linear_extrude(extrude)?;
    Ok(store.transform(raw, Transform::helical(z0, rate * z0 + phase_deg))?)
}
