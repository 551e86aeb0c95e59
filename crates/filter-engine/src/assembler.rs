use csg_kernel::analysis::{self, TreeStats};
use csg_kernel::{BoundingBox, CsgStore, NodeId, ScadEmitter};
use tracing::{info, instrument};

use crate::accessories;
use crate::config::{ParameterSet, PartKind};
use crate::error::FilterError;
use crate::flat_end::FlatEndScrew;
use crate::helix::HelicalPath;
use crate::hex_array::{self, ArrayCell};
use crate::master::MasterHelix;
use crate::profile::CrossSectionProfile;
use crate::segment::{build_segments, AxialLayout, Segment};
use crate::spacer::{build_spacers, Spacer};
use crate::staged::StagedCell;
use crate::validate::validate;

/// Finished build: the arena, its root and the pieces it was made from.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub part: PartKind,
    pub root: NodeId,
    pub segments: Vec<Segment>,
    pub spacers: Vec<Spacer>,
    pub cells: Vec<ArrayCell>,
    pub master: Option<MasterHelix>,
    pub store: CsgStore,
}

impl Assembly {
    pub fn bounds(&self) -> Result<BoundingBox, FilterError> {
        Ok(analysis::bounds(&self.store, self.root)?)
    }

    /// Content hash of the tree under `root`.
    pub fn fingerprint(&self) -> Result<String, FilterError> {
        Ok(analysis::fingerprint(&self.store, self.root)?)
    }

    pub fn stats(&self) -> Result<TreeStats, FilterError> {
        Ok(analysis::stats(&self.store, self.root)?)
    }

    pub fn to_scad(&self, profile_segments: u32) -> Result<String, FilterError> {
        Ok(ScadEmitter::new(profile_segments).render(&self.store, self.root)?)
    }
}

/// Validate `params` and build the selected part, or its fluid negative.
#[instrument(skip_all, fields(part = ?params.part_to_generate))]
pub fn build(params: &ParameterSet) -> Result<Assembly, FilterError> {
    validate(params)?;

    let mut store = CsgStore::new();
    let mut assembly = match params.part_to_generate {
        PartKind::ModularFilterAssembly => modular(&mut store, params)?,
        PartKind::HexArrayFilter => cell_array(&mut store, params, params.hex_array_layers, true)?,
        PartKind::SingleCellFilter => cell_array(&mut store, params, 0, false)?,
        PartKind::FlatEndScrew => {
            let profile = CrossSectionProfile::from_params(params);
            let root = FlatEndScrew::from_params(params)?.build(&mut store, params, &profile)?;
            Assembly::part(PartKind::FlatEndScrew, root)
        }
        PartKind::HoseAdapterCap => {
            Assembly::part(PartKind::HoseAdapterCap, accessories::hose_adapter_cap(&mut store, params)?)
        }
        PartKind::CustomCoupling => {
            Assembly::part(PartKind::CustomCoupling, accessories::custom_coupling(&mut store, params)?)
        }
        PartKind::FilterHolder => {
            Assembly::part(PartKind::FilterHolder, accessories::filter_holder(&mut store, params)?)
        }
    };

    if params.generate_cfd_volume {
        assembly.root = fluid_volume(&mut store, params, &assembly)?;
    }
    if params.cut_for_visibility {
        assembly.root = quadrant_cutaway(&mut store, params, assembly.root)?;
    }
    assembly.store = store;

    let stats = assembly.stats()?;
    info!(
        nodes = stats.nodes,
        primitives = stats.primitives,
        shared = stats.shared,
        depth = stats.depth,
        cfd = params.generate_cfd_volume,
        "assembly complete"
    );
    Ok(assembly)
}

impl Assembly {
    fn part(part: PartKind, root: NodeId) -> Self {
        Self {
            part,
            root,
            segments: Vec::new(),
            spacers: Vec::new(),
            cells: Vec::new(),
            master: None,
            store: CsgStore::new(),
        }
    }
}

/// Segments and spacers cut from one master helix, with the master void
/// subtracted once from their union.
fn modular(store: &mut CsgStore, params: &ParameterSet) -> Result<Assembly, FilterError> {
    let path = HelicalPath::from_params(params)?;
    let profile = CrossSectionProfile::from_params(params);
    let master = MasterHelix::build(store, params, path, &profile)?;
    let layout = AxialLayout::from_params(params)?;

    let segments = build_segments(store, params, &layout, &master)?;
    let spacers = build_spacers(store, params, &layout, &master)?;
    let pieces = segments
        .iter()
        .map(|s| s.node)
        .chain(spacers.iter().map(|s| s.node))
        .collect();
    let joined = store.union(pieces)?;
    let root = store.difference(joined, vec![master.void])?;
    info!(
        segments = segments.len(),
        spacers = spacers.len(),
        bin_length = layout.bin_length,
        "modular assembly"
    );
    Ok(Assembly {
        part: PartKind::ModularFilterAssembly,
        root,
        segments,
        spacers,
        cells: Vec::new(),
        master: Some(master),
        store: CsgStore::new(),
    })
}

/// Replicated staged cells on a hex layout. The cell is built once and shared.
fn cell_array(
    store: &mut CsgStore,
    params: &ParameterSet,
    layers: u32,
    with_plate: bool,
) -> Result<Assembly, FilterError> {
    let cell = StagedCell::from_params(params)?.build(store, params)?;
    let cells = hex_array::hex_layout(layers, params.hex_cell_spacing_mm);
    let mut parts = hex_array::place_cells(store, &cells, |_, _| Ok(cell))?;
    if with_plate {
        parts.push(hex_array::base_plate(store, params, &cells)?);
    }
    let root = store.union(parts)?;
    info!(cells = cells.len(), layers, "cell array");
    let part = if with_plate {
        PartKind::HexArrayFilter
    } else {
        PartKind::SingleCellFilter
    };
    Ok(Assembly {
        cells,
        ..Assembly::part(part, root)
    })
}

/// Fluid domain: the enclosing tube interior minus the part.
fn fluid_volume(store: &mut CsgStore, params: &ParameterSet, assembly: &Assembly) -> Result<NodeId, FilterError> {
    let bb = analysis::bounds(store, assembly.root)?;
    let radius = match assembly.part {
        PartKind::ModularFilterAssembly | PartKind::FlatEndScrew => params.tube_inner_radius(),
        PartKind::HexArrayFilter | PartKind::SingleCellFilter => {
            hex_array::enclosing_radius(&assembly.cells, params.cell_diameter_mm)
        }
        PartKind::HoseAdapterCap | PartKind::CustomCoupling | PartKind::FilterHolder => bb.radial_extent(),
    };
    let length = bb.size().z;
    let interior = store.cylinder(length, radius, false, params.facet_segments)?;
    let interior = store.translate(interior, 0.0, 0.0, bb.min.z)?;
    info!(radius, length, "fluid volume");
    Ok(store.difference(interior, vec![assembly.root])?)
}

/// Remove the +X/+Y quadrant so the interior can be inspected.
fn quadrant_cutaway(store: &mut CsgStore, params: &ParameterSet, root: NodeId) -> Result<NodeId, FilterError> {
    let bb = analysis::bounds(store, root)?;
    let pad = params.cut_padding_mm;
    let reach = bb.radial_extent() + pad;
    let quadrant = store.cuboid([reach, reach, bb.size().z + 2.0 * pad], false)?;
    let quadrant = store.translate(quadrant, 0.0, 0.0, bb.min.z - pad)?;
    Ok(store.difference(root, vec![quadrant])?)
}
