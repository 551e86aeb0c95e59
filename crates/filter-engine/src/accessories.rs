//! Parts that mate with the filter tube: an adapter cap, a tube-to-tube
//! coupling and a standing holder. All stand on z = 0 and grow along +Z.

use csg_kernel::{CsgStore, NodeId};
use tracing::{debug, instrument};

use crate::config::ParameterSet;
use crate::error::FilterError;
use crate::spacer::{inlet_fitting, ring_groove};

/// Outer O-ring groove cut outward into a socket wall at height `z`.
fn socket_groove(store: &mut CsgStore, params: &ParameterSet, z: f64) -> Result<NodeId, FilterError> {
    let rs = params.socket_radius();
    ring_groove(store, params, rs - params.cut_padding_mm, rs + params.groove_depth(), z)
}

/// Socket bore of the tube OD plus fit clearance, `depth` deep from `z`.
fn socket(store: &mut CsgStore, params: &ParameterSet, z: f64, depth: f64) -> Result<NodeId, FilterError> {
    let pad = params.cut_padding_mm;
    let bore = store.cylinder(depth + 2.0 * pad, params.socket_radius(), false, params.facet_segments)?;
    Ok(store.translate(bore, 0.0, 0.0, z - pad)?)
}

/// Cup over the tube end with the inlet fitting on its end plate, pointing down.
#[instrument(skip_all, fields(inlet = ?params.inlet_type))]
pub fn hose_adapter_cap(store: &mut CsgStore, params: &ParameterSet) -> Result<NodeId, FilterError> {
    let wall = params.cap_wall_mm;
    let depth = params.socket_depth_mm;
    let pad = params.cut_padding_mm;
    let outer = params.socket_radius() + wall;

    let cup = store.cylinder(depth + wall, outer, false, params.facet_segments)?;
    let mut cutters = vec![socket(store, params, wall, depth)?];
    if params.add_outer_o_rings {
        cutters.push(socket_groove(store, params, wall + depth / 2.0)?);
    }
    let body = store.difference(cup, cutters)?;

    let (joined, reach) = match inlet_fitting(store, params, params.inlet_kind())? {
        Some((fitting, length)) => {
            let fitting = store.mirror_z(fitting)?;
            (store.union(vec![body, fitting])?, length)
        }
        None => (body, 0.0),
    };
    let bore = store.cylinder(reach + wall + 2.0 * pad, params.inlet_bore_mm / 2.0, false, params.facet_segments)?;
    let bore = store.translate(bore, 0.0, 0.0, -reach - pad)?;
    debug!(outer, reach, "adapter cap");
    Ok(store.difference(joined, vec![bore])?)
}

/// Sleeve joining two tubes end to end, with a stop lip between the sockets.
#[instrument(skip_all)]
pub fn custom_coupling(store: &mut CsgStore, params: &ParameterSet) -> Result<NodeId, FilterError> {
    let depth = params.socket_depth_mm;
    let stop = params.coupling_stop_width_mm;
    let pad = params.cut_padding_mm;
    let length = 2.0 * depth + stop;

    let sleeve = store.cylinder(length, params.socket_radius() + params.cap_wall_mm, false, params.facet_segments)?;
    let lower = store.cylinder(depth + pad, params.socket_radius(), false, params.facet_segments)?;
    let lower = store.translate(lower, 0.0, 0.0, -pad)?;
    let upper = store.cylinder(depth + pad, params.socket_radius(), false, params.facet_segments)?;
    let upper = store.translate(upper, 0.0, 0.0, depth + stop)?;
    let through = store.cylinder(length + 2.0 * pad, params.tube_inner_radius(), false, params.facet_segments)?;
    let through = store.translate(through, 0.0, 0.0, -pad)?;

    let mut cutters = vec![lower, upper, through];
    if params.add_outer_o_rings {
        cutters.push(socket_groove(store, params, depth / 2.0)?);
        cutters.push(socket_groove(store, params, length - depth / 2.0)?);
    }
    debug!(length, "coupling");
    Ok(store.difference(sleeve, cutters)?)
}

/// Base disc with a tube socket on top and a flow bore through the base.
#[instrument(skip_all)]
pub fn filter_holder(store: &mut CsgStore, params: &ParameterSet) -> Result<NodeId, FilterError> {
    let base_t = params.holder_base_thickness_mm;
    let depth = params.socket_depth_mm;
    let pad = params.cut_padding_mm;

    let base = store.cylinder(base_t, params.holder_base_diameter_mm / 2.0, false, params.facet_segments)?;
    let collar = store.cylinder(depth, params.socket_radius() + params.cap_wall_mm, false, params.facet_segments)?;
    let collar = store.translate(collar, 0.0, 0.0, base_t)?;
    let body = store.union(vec![base, collar])?;

    let flow = store.cylinder(base_t + 2.0 * pad, params.tube_inner_radius(), false, params.facet_segments)?;
    let flow = store.translate(flow, 0.0, 0.0, -pad)?;
    let mut cutters = vec![socket(store, params, base_t, depth)?, flow];
    if params.add_outer_o_rings {
        cutters.push(socket_groove(store, params, base_t + depth / 2.0)?);
    }
    Ok(store.difference(body, cutters)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InletType;
    use approx::assert_abs_diff_eq;
    use csg_kernel::analysis::{bounds, contains};
    use csg_kernel::Point3d;

    #[test]
    fn test_cap_socket_and_fitting() {
        let params = ParameterSet {
            inlet_type: InletType::Pressfit,
            ..ParameterSet::default()
        };
        let mut store = CsgStore::new();
        let cap = hose_adapter_cap(&mut store, &params).unwrap();
        let bb = bounds(&store, cap).unwrap();
        assert_abs_diff_eq!(bb.min.z, -params.pressfit_length_mm, epsilon = 1e-9);
        assert_abs_diff_eq!(bb.max.z, params.socket_depth_mm + params.cap_wall_mm, epsilon = 1e-9);

        let tube_wall = Point3d::new(params.tube_od_mm / 2.0 - 0.5, 0.0, 10.0);
        assert!(!contains(&store, cap, &tube_wall).unwrap());
        let cap_wall = Point3d::new(params.socket_radius() + params.cap_wall_mm / 2.0, 0.0, 10.0);
        assert!(contains(&store, cap, &cap_wall).unwrap());
        // Press-fit stub wall, bore open.
        assert!(contains(&store, cap, &Point3d::new(2.0, 0.0, -4.0)).unwrap());
        assert!(!contains(&store, cap, &Point3d::new(0.0, 0.0, -4.0)).unwrap());
        assert!(!contains(&store, cap, &Point3d::new(0.0, 0.0, 1.0)).unwrap());
    }

    #[test]
    fn test_cap_o_ring_groove() {
        let mut params = ParameterSet::default();
        let z = params.cap_wall_mm + params.socket_depth_mm / 2.0;
        let probe = Point3d::new(params.socket_radius() + params.groove_depth() / 2.0, 0.0, z);
        let mut store = CsgStore::new();
        let plain = hose_adapter_cap(&mut store, &params).unwrap();
        assert!(contains(&store, plain, &probe).unwrap());
        params.add_outer_o_rings = true;
        let grooved = hose_adapter_cap(&mut store, &params).unwrap();
        assert!(!contains(&store, grooved, &probe).unwrap());
    }

    #[test]
    fn test_coupling_stop_lip() {
        let params = ParameterSet::default();
        let mut store = CsgStore::new();
        let coupling = custom_coupling(&mut store, &params).unwrap();
        let mid = params.socket_depth_mm + params.coupling_stop_width_mm / 2.0;
        let lip = Point3d::new(params.tube_inner_radius() + 0.5, 0.0, mid);
        let in_socket = Point3d::new(params.tube_inner_radius() + 0.5, 0.0, params.socket_depth_mm / 2.0);
        assert!(contains(&store, coupling, &lip).unwrap());
        assert!(!contains(&store, coupling, &in_socket).unwrap());
        assert!(!contains(&store, coupling, &Point3d::new(0.0, 0.0, mid)).unwrap());
        let bb = bounds(&store, coupling).unwrap();
        assert_abs_diff_eq!(bb.size().z, 2.0 * params.socket_depth_mm + params.coupling_stop_width_mm, epsilon = 1e-9);
    }

    #[test]
    fn test_holder_base_and_socket() {
        let params = ParameterSet::default();
        let mut store = CsgStore::new();
        let holder = filter_holder(&mut store, &params).unwrap();
        let bb = bounds(&store, holder).unwrap();
        assert_abs_diff_eq!(bb.max.x, params.holder_base_diameter_mm / 2.0, epsilon = 1e-9);
        let t = params.holder_base_thickness_mm;
        assert!(!contains(&store, holder, &Point3d::new(0.0, 0.0, t / 2.0)).unwrap());
        assert!(contains(&store, holder, &Point3d::new(params.tube_inner_radius() + 1.0, 0.0, t / 2.0)).unwrap());
        assert!(!contains(&store, holder, &Point3d::new(params.tube_od_mm / 2.0 - 0.5, 0.0, t + 5.0)).unwrap());
    }
}
