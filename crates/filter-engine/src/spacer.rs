//! Bulkhead discs between segments.
//!
//! Each spacer is built in its phase-corrected local frame: a disc with a
//! socket for the master solid, a rim seal groove, inlet fittings on the end
//! spacers and an optional support lattice reaching into the next bin.
//! Segments end flush at the spacer faces and seat into the socket when the
//! printed parts are assembled; the union does not fuse them.

use csg_kernel::{CsgStore, ExternalPart, NodeId, Point2d, Shape2d};
use tracing::{debug, instrument};

use crate::config::{InletKind, ParameterSet};
use crate::error::FilterError;
use crate::helix::helical_sweep;
use crate::master::{LocalFrame, MasterHelix};
use crate::segment::AxialLayout;

/// Helical struts bonding a spacer to the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportLattice {
    pub bundles: u32,
    pub strut_radius: f64,
    pub placement_radius: f64,
    /// Local start height; the struts overlap half of each spacer.
    pub z_start: f64,
    pub length: f64,
    /// Twist of the right-handed struts over `length`; left-handed use the negation.
    pub twist: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacer {
    pub index: u32,
    pub is_base: bool,
    pub is_top: bool,
    pub z_center: f64,
    pub local_rotation: f64,
    pub inlet: Option<InletKind>,
    pub support: Option<SupportLattice>,
    pub node: NodeId,
}

/// Strut centre radius: midway between the slit envelope and the groove floor.
pub fn support_radius(params: &ParameterSet) -> f64 {
    (params.cut_envelope_radius() + params.spacer_radius() - params.groove_depth()) / 2.0
}

/// Annular groove `[r_inner, r_outer]` of the O-ring width centred at `z`:
/// a rectangular gland section revolved a full turn.
pub fn ring_groove(
    store: &mut CsgStore,
    params: &ParameterSet,
    r_inner: f64,
    r_outer: f64,
    z: f64,
) -> Result<NodeId, FilterError> {
    let w = params.groove_width();
    let section = Shape2d::rect(r_inner, z - w / 2.0, r_outer, z + w / 2.0);
    Ok(store.rotate_extrude(section, 360.0, params.facet_segments)?)
}

/// Rim groove of a part with outer radius `radius`, cut inward.
pub fn seal_groove(
    store: &mut CsgStore,
    params: &ParameterSet,
    radius: f64,
    z: f64,
) -> Result<NodeId, FilterError> {
    ring_groove(store, params, radius - params.groove_depth(), radius + params.cut_padding_mm, z)
}

/// Inlet fitting along +Z from z = 0, with a flange filling
/// `[-recess_depth, 0]`. Returns the node and the stub length.
pub fn inlet_fitting(
    store: &mut CsgStore,
    params: &ParameterSet,
    kind: InletKind,
) -> Result<Option<(NodeId, f64)>, FilterError> {
    let (stub, length) = match kind {
        InletKind::None => return Ok(None),
        InletKind::Threaded(t) => (
            store.external(ExternalPart::IsoThread {
                diameter: t.diameter,
                pitch: t.pitch,
                length: t.length,
                internal: false,
                lead_in: true,
            })?,
            t.length,
        ),
        InletKind::PressFit(f) => (
            store.cylinder(f.length, f.outer_diameter / 2.0, false, params.facet_segments)?,
            f.length,
        ),
        InletKind::Barb(b) => (
            store.external(ExternalPart::HoseBarb {
                hose_id: b.hose_id,
                barb_count: b.barb_count,
                length: b.length,
                bore: params.inlet_bore_mm,
            })?,
            b.length,
        ),
    };
    let depth = params.inlet_recess_depth_mm;
    let flange = store.cylinder(depth, params.inlet_flange_diameter_mm / 2.0, false, params.facet_segments)?;
    let flange = store.translate(flange, 0.0, 0.0, -depth)?;
    Ok(Some((store.union(vec![flange, stub])?, length)))
}

/// Move a node built along +Z at the origin onto a face at `face_z`,
/// pointing outward (down for the base).
fn onto_face(
    store: &mut CsgStore,
    node: NodeId,
    is_base: bool,
    at: Point2d,
    face_z: f64,
) -> Result<NodeId, FilterError> {
    let node = if is_base { store.mirror_z(node)? } else { node };
    Ok(store.translate(node, at.x, at.y, face_z)?)
}

#[instrument(skip_all, fields(spacers = layout.num_bins + 1))]
pub fn build_spacers(
    store: &mut CsgStore,
    params: &ParameterSet,
    layout: &AxialLayout,
    master: &MasterHelix,
) -> Result<Vec<Spacer>, FilterError> {
    (0..=layout.num_bins)
        .map(|index| {
            let is_base = index == 0;
            let is_top = index == layout.num_bins;
            let inlet = match params.inlet_kind() {
                InletKind::None => None,
                kind if is_base || is_top => Some(kind),
                _ => None,
            };
            let support = (params.add_helical_support && !is_top).then(|| SupportLattice {
                bundles: params.support_density,
                strut_radius: params.support_strut_radius_mm,
                placement_radius: support_radius(params),
                z_start: 0.0,
                length: layout.bin_length + layout.spacer_height,
                twist: master.path.twist_over(layout.bin_length + layout.spacer_height),
            });
            let z_center = layout.spacer_center(index);
            let node = master.phase_corrected(store, z_center, |store, frame| {
                spacer_body(store, params, layout, frame, is_base, inlet, support.as_ref())
            })?;
            debug!(index, z_center, inlet = ?inlet, support = support.is_some(), "spacer");
            Ok(Spacer {
                index,
                is_base,
                is_top,
                z_center,
                local_rotation: master.path.rotation_at(z_center),
                inlet,
                support,
                node,
            })
        })
        .collect()
}

fn spacer_body(
    store: &mut CsgStore,
    params: &ParameterSet,
    layout: &AxialLayout,
    frame: &LocalFrame,
    is_base: bool,
    inlet: Option<InletKind>,
    support: Option<&SupportLattice>,
) -> Result<NodeId, FilterError> {
    let h = layout.spacer_height;
    let radius = params.spacer_radius();
    let pad = params.cut_padding_mm;

    let disc = store.cylinder(h, radius, true, params.facet_segments)?;
    let socket = frame.solid(store)?;
    let groove = seal_groove(store, params, radius, 0.0)?;
    let mut cutters = vec![socket, groove];

    let mut fitting = None;
    if let Some(kind) = inlet {
        let face_z = if is_base { -h / 2.0 } else { h / 2.0 };
        // Barb inlets sit on the channel at its phase on this face.
        let at = match kind {
            InletKind::Barb(_) => {
                Point2d::new(params.helix_path_radius_mm, 0.0).rotated_deg(frame.path().rotation_at(face_z))
            }
            _ => Point2d::ORIGIN,
        };
        let depth = params.inlet_recess_depth_mm;
        let recess = store.cylinder(depth + pad, params.inlet_flange_diameter_mm / 2.0, false, params.facet_segments)?;
        let recess = store.translate(recess, 0.0, 0.0, -depth)?;
        cutters.push(onto_face(store, recess, is_base, at, face_z)?);

        if let Some((node, length)) = inlet_fitting(store, params, kind)? {
            let bore = store.cylinder(length + h / 2.0 + pad, params.inlet_bore_mm / 2.0, false, params.facet_segments)?;
            let bore = store.translate(bore, 0.0, 0.0, -h / 2.0)?;
            fitting = Some((
                onto_face(store, node, is_base, at, face_z)?,
                onto_face(store, bore, is_base, at, face_z)?,
            ));
        }
    }

    let body = store.difference(disc, cutters)?;
    let mut parts = vec![body];
    if let Some((node, _)) = fitting {
        parts.push(node);
    }
    if let Some(lattice) = support {
        parts.push(support_lattice(store, params, frame, lattice)?);
    }
    let joined = store.union(parts)?;
    match fitting {
        Some((_, bore)) => Ok(store.difference(joined, vec![bore])?),
        None => Ok(joined),
    }
}

/// Bundles of right-handed, left-handed and straight struts at 0/120/240
/// degrees, repeated every `360 / bundles` degrees.
fn support_lattice(
    store: &mut CsgStore,
    params: &ParameterSet,
    frame: &LocalFrame,
    lattice: &SupportLattice,
) -> Result<NodeId, FilterError> {
    let rate = frame.path().twist_rate;
    let shape = Shape2d::circle(lattice.strut_radius).offset(lattice.placement_radius, 0.0);
    let slices = params.slices_for(lattice.length);
    let mut struts = Vec::with_capacity(3 * lattice.bundles as usize);
    for b in 0..lattice.bundles {
        let base = b as f64 * 360.0 / lattice.bundles as f64;
        for (handed_rate, offset) in [(rate, 0.0), (-rate, 120.0), (0.0, 240.0)] {
            struts.push(helical_sweep(
                store,
                shape.clone(),
                lattice.z_start,
                lattice.length,
                handed_rate,
                base + offset,
                [1.0, 1.0],
                slices,
            )?);
        }
    }
    Ok(store.union(struts)?)
}
