//! Ejection slits: radial cuts from the flow channel out through the screw
//! wall, twisted with the helix so a slit always faces the channel's local
//! radial-outward direction.

use csg_kernel::{CsgStore, NodeId, Point2d, Shape2d};
use tracing::{debug, instrument};

use crate::config::{ParameterSet, SlitKind};
use crate::error::FilterError;
use crate::helix::{helical_sweep, HelicalPath};

/// Cutting tool description for one bin. Never part of the output itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SlitSpec {
    pub axial_length: f64,
    pub kind: SlitKind,
    /// Slit centres in the bin's local frame.
    pub positions: Vec<f64>,
    pub width: f64,
    /// Inner edge, on the helix path.
    pub inner_radius: f64,
    /// Knives are clipped to this radius.
    pub envelope_radius: f64,
}

impl SlitSpec {
    /// Slits for a bin of `bin_length` centred on local z = 0. The first one
    /// ends `slit_end_margin_mm` below the bin top, the rest follow every
    /// `bin_length / slits_per_bin` below it.
    pub fn for_bin(params: &ParameterSet, bin_length: f64) -> Option<Self> {
        let kind = params.slit_kind();
        if kind == SlitKind::None {
            return None;
        }
        let n = params.slits_per_bin;
        let a = params.slit_axial_length_mm;
        let spacing = bin_length / n as f64;
        let positions = (0..n)
            .map(|k| bin_length / 2.0 - params.slit_end_margin_mm - k as f64 * spacing - a / 2.0)
            .collect();
        Some(Self::with_positions(params, kind, positions))
    }

    /// `count` slits spread evenly over a piece of `length` centred on z = 0.
    pub fn spread(params: &ParameterSet, length: f64, count: u32) -> Option<Self> {
        let kind = params.slit_kind();
        if kind == SlitKind::None || count == 0 {
            return None;
        }
        let step = length / count as f64;
        let positions = (0..count)
            .map(|k| -length / 2.0 + (k as f64 + 0.5) * step)
            .collect();
        Some(Self::with_positions(params, kind, positions))
    }

    fn with_positions(params: &ParameterSet, kind: SlitKind, positions: Vec<f64>) -> Self {
        Self {
            axial_length: params.slit_axial_length_mm,
            kind,
            positions,
            width: params.slit_width_mm,
            inner_radius: params.helix_path_radius_mm,
            envelope_radius: params.cut_envelope_radius(),
        }
    }

    /// One knife per position, phase-matched to `path` in the local frame.
    #[instrument(skip_all, fields(slits = self.positions.len(), kind = ?self.kind))]
    pub fn knives(
        &self,
        store: &mut CsgStore,
        path: &HelicalPath,
        params: &ParameterSet,
    ) -> Result<Vec<NodeId>, FilterError> {
        self.positions
            .iter()
            .map(|&offset| {
                debug!(offset, yrot = path.rotation_at(offset), "slit knife");
                self.knife(store, path, params, offset)
            })
            .collect()
    }

    fn knife(
        &self,
        store: &mut CsgStore,
        path: &HelicalPath,
        params: &ParameterSet,
        offset: f64,
    ) -> Result<NodeId, FilterError> {
        let a = self.axial_length;
        let pad = params.cut_padding_mm;
        let bottom = offset - a / 2.0;
        let r_in = self.inner_radius;
        let r_out = self.envelope_radius + pad;
        let w = self.width;
        let rate = path.twist_rate;
        let slices = |len: f64| params.slices_for(len).max(4);

        let cutter = match self.kind {
            SlitKind::None => return Err(FilterError::config("slit knife requested for slit type none")),
            SlitKind::Simple => {
                let wedge = Shape2d::polygon(vec![
                    Point2d::new(r_in, -w / 4.0),
                    Point2d::new(r_out, -w / 2.0),
                    Point2d::new(r_out, w / 2.0),
                    Point2d::new(r_in, w / 4.0),
                ]);
                let len = a + 2.0 * pad;
                helical_sweep(store, wedge, bottom - pad, len, rate, 0.0, [1.0, 1.0], slices(len))?
            }
            SlitKind::Ramped { chamfer_height } => {
                // Half-width lead-in, widening to full width at its top.
                let lead_profile = Shape2d::polygon(vec![
                    Point2d::new(r_in, 0.0),
                    Point2d::new(r_out, -w / 4.0),
                    Point2d::new(r_out, w / 4.0),
                ]);
                let lead = helical_sweep(
                    store,
                    lead_profile,
                    bottom,
                    chamfer_height,
                    rate,
                    0.0,
                    [1.0, 2.0],
                    slices(chamfer_height),
                )?;
                let open_len = a - chamfer_height + pad;
                let open = helical_sweep(
                    store,
                    Shape2d::rect(r_in, -w / 2.0, r_out, w / 2.0),
                    bottom + chamfer_height,
                    open_len,
                    rate,
                    0.0,
                    [1.0, 1.0],
                    slices(open_len),
                )?;
                store.union(vec![lead, open])?
            }
        };

        // Exact axial length, radially clipped to the cut envelope.
        let slab = store.cylinder(a, self.envelope_radius, true, params.facet_segments)?;
        let slab = store.translate(slab, 0.0, 0.0, offset)?;
        Ok(store.intersection(vec![cutter, slab])?)
    }
}
