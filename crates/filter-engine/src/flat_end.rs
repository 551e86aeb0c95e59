use csg_kernel::{CsgStore, LinearExtrude, NodeId, Shape2d};
use tracing::{info, instrument};

use crate::config::ParameterSet;
use crate::error::FilterError;
use crate::helix::HelicalPath;
use crate::profile::CrossSectionProfile;
use crate::segment::AxialLayout;
use crate::slit::SlitSpec;

/// Standalone screw section with exactly flat end faces.
///
/// The twisted solid is swept longer than `height` and then clipped by an
/// untwisted cylinder of exact height, so the ends stay flat for any twist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatEndScrew {
    pub height: f64,
    /// Twist in degrees over `height`.
    pub twist: f64,
    pub slits: u32,
}

impl FlatEndScrew {
    pub fn new(height: f64, twist: f64, slits: u32) -> Self {
        Self { height, twist, slits }
    }

    /// One bin of the configured modular assembly.
    pub fn from_params(params: &ParameterSet) -> Result<Self, FilterError> {
        let layout = AxialLayout::from_params(params)?;
        let path = HelicalPath::from_params(params)?;
        Ok(Self::new(layout.bin_length, path.twist_over(layout.bin_length), params.slits_per_bin))
    }

    /// Path with this screw's own twist rate.
    pub fn path(&self, radius: f64) -> Result<HelicalPath, FilterError> {
        HelicalPath::new(radius, self.height, self.twist / 360.0)
    }

    #[instrument(skip_all, fields(height = self.height, twist = self.twist, slits = self.slits))]
    pub fn build(
        &self,
        store: &mut CsgStore,
        params: &ParameterSet,
        profile: &CrossSectionProfile,
    ) -> Result<NodeId, FilterError> {
        let pad = params.cut_padding_mm;
        let path = self.path(profile.path_radius)?;

        let solid = centered_twist(store, params, profile.outer(), self.height + 2.0 * pad, &path)?;
        let void = centered_twist(store, params, profile.void(), self.height + 4.0 * pad, &path)?;
        let mut cutters = vec![void];
        if let Some(spec) = SlitSpec::spread(params, self.height, self.slits) {
            cutters.extend(spec.knives(store, &path, params)?);
        }
        let body = store.difference(solid, cutters)?;

        let stencil = store.cylinder(
            self.height,
            params.helix_outer_radius() + pad,
            true,
            params.facet_segments,
        )?;
        info!(cutters = self.slits + 1, "built flat-end screw");
        Ok(store.intersection(vec![body, stencil])?)
    }
}

fn centered_twist(
    store: &mut CsgStore,
    params: &ParameterSet,
    shape: Shape2d,
    length: f64,
    path: &HelicalPath,
) -> Result<NodeId, FilterError> {
    let twist = path.twist_over(length);
    let sweep = LinearExtrude::new(shape, length)
        .twisted(twist, params.slices_for(length))
        .centered();
    let raw = store.linear_extrude(sweep)?;
    Ok(store.rotate_z(raw, -twist / 2.0)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use csg_kernel::analysis::{bounds, contains};

    #[test]
    fn test_exact_height_with_twist() {
        let params = ParameterSet::default();
        let profile = CrossSectionProfile::from_params(&params);
        for twist in [0.0, 90.0, 720.0, -300.0] {
            let mut store = CsgStore::new();
            let screw = FlatEndScrew::new(20.0, twist, 2);
            let node = screw.build(&mut store, &params, &profile).unwrap();
            let bb = bounds(&store, node).unwrap();
            assert_abs_diff_eq!(bb.min.z, -10.0, epsilon = 1e-9);
            assert_abs_diff_eq!(bb.max.z, 10.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_end_faces_cut_flat() {
        let params = ParameterSet::default();
        let profile = CrossSectionProfile::from_params(&params);
        let mut store = CsgStore::new();
        let screw = FlatEndScrew::new(20.0, 180.0, 0);
        let path = screw.path(profile.path_radius).unwrap();
        let node = screw.build(&mut store, &params, &profile).unwrap();
        // Wall point beside the channel, just inside and just past the top face.
        let r = profile.path_radius + profile.void_radius + 0.2;
        let inside = csg_kernel::Point3d::cylindrical(r, path.rotation_at(9.9), 9.9);
        let outside = csg_kernel::Point3d::cylindrical(r, path.rotation_at(10.1), 10.1);
        assert!(contains(&store, node, &inside).unwrap());
        assert!(!contains(&store, node, &outside).unwrap());
        // Channel stays open.
        assert!(!contains(&store, node, &path.center_at(0.0)).unwrap());
    }

    #[test]
    fn test_from_params_uses_bin() {
        let params = ParameterSet {
            insert_length_mm: 175.0,
            number_of_complete_revolutions: 12.0,
            num_bins: 3,
            slits_per_bin: 2,
            ..ParameterSet::default()
        };
        let screw = FlatEndScrew::from_params(&params).unwrap();
        assert_abs_diff_eq!(screw.height, 155.0 / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(screw.twist, 360.0 * 12.0 / 175.0 * screw.height, epsilon = 1e-9);
        assert_eq!(screw.slits, 2);
    }
}
