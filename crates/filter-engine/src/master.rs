//! Full-length reference sweeps in the global frame.
//!
//! A twisted extrusion always starts its phase at zero at its own origin, so
//! a short piece swept directly at height `z` would not line up with its
//! neighbours. Every piece is instead cut from the one master sweep after
//! moving the frame back by `(-z, -rotation)`, and then moved forward again.

use csg_kernel::{CsgStore, LinearExtrude, NodeId, Transform};
use tracing::{debug, info, instrument};

use crate::config::ParameterSet;
use crate::error::FilterError;
use crate::helix::HelicalPath;
use crate::profile::CrossSectionProfile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterHelix {
    /// Solid screw, section angle `twist_rate * z` at global height `z`.
    pub solid: NodeId,
    /// Flow channel with the same phase.
    pub void: NodeId,
    pub path: HelicalPath,
    /// Axial extent `total_length + cut_padding`.
    pub span: f64,
}

/// Master sweeps seen from a piece's local frame, where their phase is zero
/// at the local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    pub z: f64,
    pub rotation: f64,
    master: MasterHelix,
    back: Transform,
}

impl LocalFrame {
    pub fn solid(&self, store: &mut CsgStore) -> Result<NodeId, FilterError> {
        Ok(store.transform(self.master.solid, self.back)?)
    }

    pub fn void(&self, store: &mut CsgStore) -> Result<NodeId, FilterError> {
        Ok(store.transform(self.master.void, self.back)?)
    }

    pub fn path(&self) -> &HelicalPath {
        &self.master.path
    }
}

impl MasterHelix {
    #[instrument(skip_all, fields(length = params.insert_length_mm, twist_rate = path.twist_rate))]
    pub fn build(
        store: &mut CsgStore,
        params: &ParameterSet,
        path: HelicalPath,
        profile: &CrossSectionProfile,
    ) -> Result<Self, FilterError> {
        let span = params.insert_length_mm + params.cut_padding_mm;
        let slices = params.slices_for(span);
        let solid = centered_sweep(store, profile.outer(), span, &path, slices)?;
        let void = centered_sweep(store, profile.void(), span, &path, slices)?;
        info!(span, slices, "built master helix");
        Ok(Self {
            solid,
            void,
            path,
            span,
        })
    }

    /// Local frame for a piece centred at global height `z`.
    pub fn frame_at(&self, z: f64) -> LocalFrame {
        let rotation = self.path.rotation_at(z);
        let back = Transform::translation(0.0, 0.0, -z).then(&Transform::rotation_z_deg(-rotation));
        LocalFrame {
            z,
            rotation,
            master: *self,
            back,
        }
    }

    /// Build a piece in the local frame at `z` with `build`, then place it
    /// forward by `(+z, +rotation)`.
    pub fn phase_corrected<F>(
        &self,
        store: &mut CsgStore,
        z: f64,
        build: F,
    ) -> Result<NodeId, FilterError>
    where
        F: FnOnce(&mut CsgStore, &LocalFrame) -> Result<NodeId, FilterError>,
    {
        let frame = self.frame_at(z);
        let local = build(store, &frame)?;
        debug!(z, rotation = frame.rotation, "placing phase-corrected piece");
        Ok(store.transform(local, Transform::helical(z, frame.rotation))?)
    }
}

/// Centred extrusion spanning `span`, pre-rotated by half its twist so the
/// section angle at `z` is `twist_rate * z`.
fn centered_sweep(
    store: &mut CsgStore,
    shape: csg_kernel::Shape2d,
    span: f64,
    path: &HelicalPath,
    slices: u32,
) -> Result<NodeId, FilterError> {
    let twist = path.twist_over(span);
    let raw = store.linear_extrude(LinearExtrude::new(shape, span).twisted(twist, slices).centered())?;
    Ok(store.rotate_z(raw, -twist / 2.0)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csg_kernel::analysis::{bounds, contains};
    use csg_kernel::Point3d;

    fn setup() -> (CsgStore, ParameterSet, MasterHelix) {
        let params = ParameterSet {
            insert_length_mm: 175.0,
            number_of_complete_revolutions: 12.0,
            ..ParameterSet::default()
        };
        let mut store = CsgStore::new();
        let path = HelicalPath::from_params(&params).unwrap();
        let profile = CrossSectionProfile::from_params(&params);
        let master = MasterHelix::build(&mut store, &params, path, &profile).unwrap();
        (store, params, master)
    }

    #[test]
    fn test_master_phase_matches_path() {
        let (store, _, master) = setup();
        for z in [-80.0, -10.0, 0.0, 10.0, 43.7, 87.0] {
            let on = master.path.center_at(z);
            let off = Point3d::cylindrical(master.path.radius, master.path.rotation_at(z) + 180.0, z);
            assert!(contains(&store, master.solid, &on).unwrap(), "z = {z}");
            assert!(contains(&store, master.void, &on).unwrap());
            assert!(!contains(&store, master.solid, &off).unwrap());
        }
    }

    #[test]
    fn test_master_spans_padded_length() {
        let (store, params, master) = setup();
        let bb = bounds(&store, master.solid).unwrap();
        assert!((bb.size().z - (params.insert_length_mm + params.cut_padding_mm)).abs() < 1e-9);
    }

    #[test]
    fn test_local_frame_has_zero_phase_at_origin() {
        let (mut store, _, master) = setup();
        let frame = master.frame_at(10.0);
        let local = frame.solid(&mut store).unwrap();
        // Local origin: profile centre on +X.
        assert!(contains(&store, local, &Point3d::new(master.path.radius, 0.0, 0.0)).unwrap());
        // Local z = 3 corresponds to rotation twist_rate * 3.
        let p = Point3d::cylindrical(master.path.radius, master.path.rotation_at(3.0), 3.0);
        assert!(contains(&store, local, &p).unwrap());
    }

    #[test]
    fn test_round_trip_restores_global_phase() {
        let (mut store, _, master) = setup();
        let piece = master
            .phase_corrected(&mut store, 10.0, |store, frame| {
                let solid = frame.solid(store)?;
                let clip = store.cylinder(4.0, 10.0, true, 32)?;
                Ok(store.intersection(vec![solid, clip])?)
            })
            .unwrap();
        for z in [8.5, 10.0, 11.5] {
            assert!(contains(&store, piece, &master.path.center_at(z)).unwrap());
        }
        assert!(!contains(&store, piece, &master.path.center_at(13.0)).unwrap());
    }
}
