use csg_kernel::{CsgStore, NodeId};
use tracing::{debug, instrument};

use crate::config::ParameterSet;
use crate::error::FilterError;
use crate::master::MasterHelix;
use crate::slit::SlitSpec;

/// Axial tiling of the insert: `num_bins + 1` spacers alternating with
/// `num_bins` bins, centred on z = 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxialLayout {
    pub total_length: f64,
    pub num_bins: u32,
    pub spacer_height: f64,
    pub bin_length: f64,
}

impl AxialLayout {
    pub fn new(total_length: f64, num_bins: u32, spacer_height: f64) -> Result<Self, FilterError> {
        if num_bins == 0 {
            return Err(FilterError::config("an axial layout needs at least one bin"));
        }
        let bin_length = (total_length - (num_bins + 1) as f64 * spacer_height) / num_bins as f64;
        if !(bin_length > 0.0) {
            return Err(FilterError::config(format!(
                "{} spacers of {spacer_height}mm leave no room in {total_length}mm",
                num_bins + 1
            )));
        }
        Ok(Self {
            total_length,
            num_bins,
            spacer_height,
            bin_length,
        })
    }

    pub fn from_params(params: &ParameterSet) -> Result<Self, FilterError> {
        Self::new(params.insert_length_mm, params.num_bins, params.spacer_height_mm)
    }

    fn stride(&self) -> f64 {
        self.bin_length + self.spacer_height
    }

    pub fn segment_center(&self, index: u32) -> f64 {
        -self.total_length / 2.0 + self.spacer_height + self.bin_length / 2.0 + index as f64 * self.stride()
    }

    pub fn spacer_center(&self, index: u32) -> f64 {
        -self.total_length / 2.0 + self.spacer_height / 2.0 + index as f64 * self.stride()
    }

    /// `(bottom, top)` of bin `index`.
    pub fn segment_range(&self, index: u32) -> (f64, f64) {
        let c = self.segment_center(index);
        (c - self.bin_length / 2.0, c + self.bin_length / 2.0)
    }

    /// `(bottom, top)` of spacer `index`.
    pub fn spacer_range(&self, index: u32) -> (f64, f64) {
        let c = self.spacer_center(index);
        (c - self.spacer_height / 2.0, c + self.spacer_height / 2.0)
    }
}

/// One screw section between two spacers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub index: u32,
    pub z_center: f64,
    pub half_length: f64,
    /// `twist_rate * z_center`.
    pub local_rotation: f64,
    pub node: NodeId,
}

/// Slice the master solid into one phase-placed segment per bin, cutting
/// the ejection slits in each segment's local frame.
#[instrument(skip_all, fields(bins = layout.num_bins, bin_length = layout.bin_length))]
pub fn build_segments(
    store: &mut CsgStore,
    params: &ParameterSet,
    layout: &AxialLayout,
    master: &MasterHelix,
) -> Result<Vec<Segment>, FilterError> {
    let slits = SlitSpec::for_bin(params, layout.bin_length);
    // Oversized in diameter so it only limits length.
    let stencil_radius = params.helix_outer_radius() + params.cut_padding_mm;

    (0..layout.num_bins)
        .map(|index| {
            let z_center = layout.segment_center(index);
            let node = master.phase_corrected(store, z_center, |store, frame| {
                let solid = frame.solid(store)?;
                let stencil = store.cylinder(layout.bin_length, stencil_radius, true, params.facet_segments)?;
                let piece = store.intersection(vec![solid, stencil])?;
                let knives = match &slits {
                    Some(spec) => spec.knives(store, frame.path(), params)?,
                    None => Vec::new(),
                };
                Ok(store.difference(piece, knives)?)
            })?;
            let segment = Segment {
                index,
                z_center,
                half_length: layout.bin_length / 2.0,
                local_rotation: master.path.rotation_at(z_center),
                node,
            };
            debug!(index, z_center, rotation = segment.local_rotation, "segment");
            Ok(segment)
        })
        .collect()
}
