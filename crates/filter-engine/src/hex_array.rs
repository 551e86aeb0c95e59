use csg_kernel::{CsgStore, NodeId, Point2d};
use tracing::{debug, instrument};

use crate::config::ParameterSet;
use crate::error::FilterError;

/// Placement of one cell in a hexagonal array. Owns no geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayCell {
    /// 0 for the centre cell.
    pub ring: u32,
    /// Position within the ring, counter-clockwise from +X.
    pub index: u32,
    pub offset: Point2d,
}

/// Centre cell plus `6 * l` cells on each ring `l` in `1..=layers`, laid
/// along the hexagon edges between corners `l * spacing` out at every 60°.
pub fn hex_layout(layers: u32, spacing: f64) -> Vec<ArrayCell> {
    let mut cells = vec![ArrayCell {
        ring: 0,
        index: 0,
        offset: Point2d::ORIGIN,
    }];
    for ring in 1..=layers {
        let l = ring as f64;
        let corner = |k: u32| Point2d::new(l * spacing, 0.0).rotated_deg(60.0 * k as f64);
        let mut index = 0;
        for k in 0..6 {
            let (a, b) = (corner(k), corner(k + 1));
            for i in 0..ring {
                let t = i as f64 / l;
                cells.push(ArrayCell {
                    ring,
                    index,
                    offset: Point2d::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t),
                });
                index += 1;
            }
        }
    }
    cells
}

/// Number of cells in a layout of `layers` rings, `None` if it overflows.
pub fn cell_count(layers: u32) -> Option<usize> {
    let l = u64::from(layers);
    let cells = l.checked_mul(l + 1)?.checked_mul(3)?.checked_add(1)?;
    usize::try_from(cells).ok()
}

/// Smallest radius enclosing every cell of `diameter`.
pub fn enclosing_radius(cells: &[ArrayCell], diameter: f64) -> f64 {
    cells.iter().map(|c| c.offset.norm()).fold(0.0, f64::max) + diameter / 2.0
}

/// Build one child per cell with `build` and move it onto the cell's offset.
pub fn place_cells<F>(store: &mut CsgStore, cells: &[ArrayCell], mut build: F) -> Result<Vec<NodeId>, FilterError>
where
    F: FnMut(&mut CsgStore, &ArrayCell) -> Result<NodeId, FilterError>,
{
    cells
        .iter()
        .map(|cell| {
            let child = build(store, cell)?;
            Ok(store.translate(child, cell.offset.x, cell.offset.y, 0.0)?)
        })
        .collect()
}

/// Plate below z = 0 joining every cell, with one flow bore under each.
#[instrument(skip_all, fields(cells = cells.len()))]
pub fn base_plate(store: &mut CsgStore, params: &ParameterSet, cells: &[ArrayCell]) -> Result<NodeId, FilterError> {
    let t = params.base_plate_thickness_mm;
    let pad = params.cut_padding_mm;
    let radius = enclosing_radius(cells, params.cell_diameter_mm);
    let plate = store.cylinder(t, radius, false, params.facet_segments)?;
    let plate = store.translate(plate, 0.0, 0.0, -t)?;
    let bore = store.cylinder(t + 2.0 * pad, params.cell_inner_radius(), false, params.facet_segments)?;
    let bore = store.translate(bore, 0.0, 0.0, -t - pad)?;
    let bores = place_cells(store, cells, |_, _| Ok(bore))?;
    debug!(radius, thickness = t, "base plate");
    Ok(store.difference(plate, bores)?)
}
