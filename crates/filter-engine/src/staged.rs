//! Single separator cell: an outer wall tube around a central core, with
//! stacked stages of twisted ramp plates. The gaps between stages are
//! drop-out zones.

use csg_kernel::{CsgStore, NodeId, Shape2d};
use tracing::{debug, instrument};

use crate::config::ParameterSet;
use crate::error::FilterError;
use crate::helix::{helical_sweep, HelicalPath};

/// Radial overlap of each ramp into the wall and core so the union fuses.
const FUSE_OVERLAP_MM: f64 = 0.1;

/// Stage extents as fractions of the cell height.
pub fn stage_fractions(num_stages: u32) -> Result<&'static [(f64, f64)], FilterError> {
    match num_stages {
        1 => Ok(&[(0.0, 1.0)]),
        2 => Ok(&[(0.0, 0.45), (0.55, 1.0)]),
        3 => Ok(&[(0.0, 0.28), (0.36, 0.64), (0.72, 1.0)]),
        n => Err(FilterError::config(format!("no stage table for {n} stages"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    pub index: u32,
    pub z_start: f64,
    pub z_end: f64,
    /// Share of the cell's total revolutions swept by this stage.
    pub revolutions: f64,
}

impl Stage {
    pub fn length(&self) -> f64 {
        self.z_end - self.z_start
    }
}

/// Geometry of one staged cell standing on z = 0.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedCell {
    pub height: f64,
    pub outer_radius: f64,
    pub inner_radius: f64,
    pub core_radius: f64,
    pub ramp_thickness: f64,
    pub helices: u32,
    pub path: HelicalPath,
    pub stages: Vec<Stage>,
}

impl StagedCell {
    pub fn from_params(params: &ParameterSet) -> Result<Self, FilterError> {
        let height = params.insert_length_mm;
        let path = HelicalPath::from_params(params)?;
        let stages = stage_fractions(params.num_stages)?
            .iter()
            .zip(0..)
            .map(|(&(a, b), index)| Stage {
                index,
                z_start: a * height,
                z_end: b * height,
                revolutions: params.number_of_complete_revolutions * (b - a),
            })
            .collect();
        Ok(Self {
            height,
            outer_radius: params.cell_diameter_mm / 2.0,
            inner_radius: params.cell_inner_radius(),
            core_radius: params.cell_core_radius_mm,
            ramp_thickness: params.ramp_thickness_mm,
            helices: params.helices,
            path,
            stages,
        })
    }

    #[instrument(skip_all, fields(stages = self.stages.len(), helices = self.helices))]
    pub fn build(&self, store: &mut CsgStore, params: &ParameterSet) -> Result<NodeId, FilterError> {
        let pad = params.cut_padding_mm;
        let seg = params.facet_segments;

        let shell = store.cylinder(self.height, self.outer_radius, false, seg)?;
        let bore = store.cylinder(self.height + 2.0 * pad, self.inner_radius, false, seg)?;
        let bore = store.translate(bore, 0.0, 0.0, -pad)?;
        let wall = store.difference(shell, vec![bore])?;
        let core = store.cylinder(self.height, self.core_radius, false, seg)?;

        let mut parts = vec![wall, core];
        for stage in &self.stages {
            parts.extend(self.ramps(store, params, stage)?);
        }
        Ok(store.union(parts)?)
    }

    /// `helices` plates of one stage, spaced evenly in angle.
    pub fn ramps(
        &self,
        store: &mut CsgStore,
        params: &ParameterSet,
        stage: &Stage,
    ) -> Result<Vec<NodeId>, FilterError> {
        let t = self.ramp_thickness;
        let plate = Shape2d::rect(
            self.core_radius - FUSE_OVERLAP_MM,
            -t / 2.0,
            self.inner_radius + FUSE_OVERLAP_MM,
            t / 2.0,
        );
        let len = stage.length();
        debug!(
            stage = stage.index,
            z_start = stage.z_start,
            phase = self.path.rotation_at(stage.z_start),
            revolutions = stage.revolutions,
            "stage ramps"
        );
        (0..self.helices)
            .map(|j| {
                let phase = j as f64 * 360.0 / self.helices as f64;
                helical_sweep(
                    store,
                    plate.clone(),
                    stage.z_start,
                    len,
                    self.path.twist_rate,
                    phase,
                    [1.0, 1.0],
                    params.slices_for(len),
                )
            })
            .collect()
    }
}
