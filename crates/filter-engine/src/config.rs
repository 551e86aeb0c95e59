//! The parameter record every builder reads from.
//!
//! Field names follow the established parameter vocabulary (including the
//! upper-case feature flags), so existing JSON records and `-D key=value`
//! overrides load unchanged. Missing fields fall back to [`Default`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::FilterError;

/// Which part to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    #[default]
    ModularFilterAssembly,
    HexArrayFilter,
    SingleCellFilter,
    HoseAdapterCap,
    FlatEndScrew,
    CustomCoupling,
    FilterHolder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InletType {
    #[default]
    None,
    Threaded,
    #[serde(alias = "press_fit")]
    Pressfit,
    Barb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlitType {
    None,
    #[default]
    Simple,
    Ramped,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreadSpec {
    pub diameter: f64,
    pub pitch: f64,
    pub length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressFitSpec {
    pub outer_diameter: f64,
    pub length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarbSpec {
    pub hose_id: f64,
    pub barb_count: u32,
    pub length: f64,
}

/// Inlet fitting, resolved from the flat `inlet_*` fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InletKind {
    None,
    Threaded(ThreadSpec),
    PressFit(PressFitSpec),
    Barb(BarbSpec),
}

/// Ejection slit style, resolved from the flat `slit_*` fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlitKind {
    None,
    Simple,
    Ramped { chamfer_height: f64 },
}

/// Every dimension (millimetres unless noted) and feature flag of one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub part_to_generate: PartKind,

    // Tube
    pub tube_od_mm: f64,
    pub tube_wall_mm: f64,
    /// Diametral gap between spacer rim and tube bore.
    pub tube_clearance_mm: f64,
    pub insert_length_mm: f64,

    // Helix
    pub helix_path_radius_mm: f64,
    pub helix_profile_radius_mm: f64,
    pub helix_void_profile_radius_mm: f64,
    /// Tangential stretch of the circular profile.
    pub helix_profile_scale_ratio: f64,
    pub channel_tolerance_mm: f64,
    pub number_of_complete_revolutions: f64,

    // Bins and spacers
    pub num_bins: u32,
    pub spacer_height_mm: f64,
    pub oring_cross_section_mm: f64,

    // Ejection slits
    pub slit_type: SlitType,
    pub slits_per_bin: u32,
    pub slit_axial_length_mm: f64,
    pub slit_chamfer_height: f64,
    pub slit_width_mm: f64,
    pub slit_end_margin_mm: f64,
    pub slit_overcut_mm: f64,

    // Inlets
    pub inlet_type: InletType,
    pub inlet_flange_diameter_mm: f64,
    pub inlet_recess_depth_mm: f64,
    pub inlet_bore_mm: f64,
    pub inlet_thread_diameter_mm: f64,
    pub inlet_thread_pitch_mm: f64,
    pub inlet_thread_length_mm: f64,
    pub pressfit_od_mm: f64,
    pub pressfit_length_mm: f64,
    pub barb_hose_id_mm: f64,
    pub barb_count: u32,
    pub barb_length_mm: f64,

    // Support lattice
    #[serde(rename = "ADD_HELICAL_SUPPORT")]
    pub add_helical_support: bool,
    pub support_density: u32,
    pub support_strut_radius_mm: f64,

    // Staged cells and hex array
    pub num_stages: u32,
    pub helices: u32,
    pub hex_array_layers: u32,
    pub cell_diameter_mm: f64,
    pub cell_wall_mm: f64,
    pub cell_core_radius_mm: f64,
    pub ramp_thickness_mm: f64,
    pub hex_cell_spacing_mm: f64,
    pub base_plate_thickness_mm: f64,

    // Accessories
    pub fit_clearance_mm: f64,
    pub cap_wall_mm: f64,
    pub socket_depth_mm: f64,
    pub coupling_stop_width_mm: f64,
    pub holder_base_diameter_mm: f64,
    pub holder_base_thickness_mm: f64,

    // Output modes
    #[serde(rename = "GENERATE_CFD_VOLUME")]
    pub generate_cfd_volume: bool,
    #[serde(rename = "ADD_OUTER_O_RINGS")]
    pub add_outer_o_rings: bool,
    #[serde(rename = "CUT_FOR_VISIBILITY")]
    pub cut_for_visibility: bool,

    // Resolution and robustness
    pub facet_segments: u32,
    pub extrude_slices_per_mm: f64,
    /// Extra length/diameter on every cutting tool.
    pub cut_padding_mm: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            part_to_generate: PartKind::ModularFilterAssembly,

            tube_od_mm: 32.0,
            tube_wall_mm: 1.5,
            tube_clearance_mm: 0.4,
            insert_length_mm: 50.0,

            helix_path_radius_mm: 2.0,
            helix_profile_radius_mm: 1.8,
            helix_void_profile_radius_mm: 1.0,
            helix_profile_scale_ratio: 1.4,
            channel_tolerance_mm: 0.2,
            number_of_complete_revolutions: 2.0,

            num_bins: 1,
            spacer_height_mm: 5.0,
            oring_cross_section_mm: 1.5,

            slit_type: SlitType::Simple,
            slits_per_bin: 1,
            slit_axial_length_mm: 1.5,
            slit_chamfer_height: 0.5,
            slit_width_mm: 2.0,
            slit_end_margin_mm: 1.0,
            slit_overcut_mm: 0.25,

            inlet_type: InletType::None,
            inlet_flange_diameter_mm: 10.0,
            inlet_recess_depth_mm: 1.5,
            inlet_bore_mm: 2.0,
            inlet_thread_diameter_mm: 8.0,
            inlet_thread_pitch_mm: 1.25,
            inlet_thread_length_mm: 6.0,
            pressfit_od_mm: 6.0,
            pressfit_length_mm: 8.0,
            barb_hose_id_mm: 6.0,
            barb_count: 3,
            barb_length_mm: 12.0,

            add_helical_support: false,
            support_density: 2,
            support_strut_radius_mm: 0.8,

            num_stages: 2,
            helices: 2,
            hex_array_layers: 1,
            cell_diameter_mm: 20.0,
            cell_wall_mm: 1.2,
            cell_core_radius_mm: 2.0,
            ramp_thickness_mm: 1.2,
            hex_cell_spacing_mm: 21.0,
            base_plate_thickness_mm: 3.0,

            fit_clearance_mm: 0.3,
            cap_wall_mm: 2.5,
            socket_depth_mm: 15.0,
            coupling_stop_width_mm: 3.0,
            holder_base_diameter_mm: 50.0,
            holder_base_thickness_mm: 4.0,

            generate_cfd_volume: false,
            add_outer_o_rings: false,
            cut_for_visibility: false,

            facet_segments: 64,
            extrude_slices_per_mm: 2.0,
            cut_padding_mm: 1.0,
        }
    }
}

impl ParameterSet {
    pub fn from_json_str(json: &str) -> Result<Self, FilterError> {
        serde_json::from_str(json).map_err(|e| FilterError::config(format!("invalid parameters: {e}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FilterError::config(format!("cannot read {}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded parameter file");
        Self::from_json_str(&text)
    }

    /// Apply one `key=value` override. Values are read as JSON where they
    /// parse (numbers, `true`/`false`) and as bare strings otherwise.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), FilterError> {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| FilterError::config(format!("override `{assignment}` is not key=value")))?;
        let (key, raw) = (key.trim(), raw.trim());

        let mut record = serde_json::to_value(&*self)
            .map_err(|e| FilterError::config(format!("cannot serialize parameters: {e}")))?;
        let fields = record
            .as_object_mut()
            .ok_or_else(|| FilterError::config("parameters are not a record"))?;
        if !fields.contains_key(key) {
            return Err(FilterError::config(format!("unknown parameter `{key}`")));
        }
        let value = serde_json::from_str::<Value>(raw)
            .unwrap_or_else(|_| Value::String(raw.trim_matches('"').to_string()));
        fields.insert(key.to_string(), value);

        *self = serde_json::from_value(record)
            .map_err(|e| FilterError::config(format!("bad value for `{key}`: {e}")))?;
        debug!(key, value = raw, "applied override");
        Ok(())
    }

    /// Lowercase hex SHA-256 of the canonical JSON form. Equal records give
    /// equal fingerprints.
    pub fn fingerprint(&self) -> Result<String, FilterError> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| FilterError::config(format!("cannot serialize parameters: {e}")))?;
        Ok(csg_kernel::analysis::hex_digest(&bytes))
    }

    pub fn inlet_kind(&self) -> InletKind {
        match self.inlet_type {
            InletType::None => InletKind::None,
            InletType::Threaded => InletKind::Threaded(ThreadSpec {
                diameter: self.inlet_thread_diameter_mm,
                pitch: self.inlet_thread_pitch_mm,
                length: self.inlet_thread_length_mm,
            }),
            InletType::Pressfit => InletKind::PressFit(PressFitSpec {
                outer_diameter: self.pressfit_od_mm,
                length: self.pressfit_length_mm,
            }),
            InletType::Barb => InletKind::Barb(BarbSpec {
                hose_id: self.barb_hose_id_mm,
                barb_count: self.barb_count,
                length: self.barb_length_mm,
            }),
        }
    }

    pub fn slit_kind(&self) -> SlitKind {
        match self.slit_type {
            SlitType::None => SlitKind::None,
            _ if self.slits_per_bin == 0 => SlitKind::None,
            SlitType::Simple => SlitKind::Simple,
            SlitType::Ramped => SlitKind::Ramped {
                chamfer_height: self.slit_chamfer_height,
            },
        }
    }

    // ── Derived dimensions ──────────────────────────────────────────────

    pub fn tube_id(&self) -> f64 {
        self.tube_od_mm - 2.0 * self.tube_wall_mm
    }

    pub fn tube_inner_radius(&self) -> f64 {
        self.tube_id() / 2.0
    }

    pub fn spacer_radius(&self) -> f64 {
        (self.tube_id() - self.tube_clearance_mm) / 2.0
    }

    pub fn helix_outer_radius(&self) -> f64 {
        self.helix_path_radius_mm + self.helix_profile_radius_mm
    }

    /// Flow channel radius including the printing tolerance.
    pub fn void_radius(&self) -> f64 {
        self.helix_void_profile_radius_mm + self.channel_tolerance_mm
    }

    /// Radius every slit knife is clipped to.
    pub fn cut_envelope_radius(&self) -> f64 {
        self.helix_outer_radius() + self.slit_overcut_mm
    }

    pub fn groove_depth(&self) -> f64 {
        0.8 * self.oring_cross_section_mm
    }

    pub fn groove_width(&self) -> f64 {
        1.1 * self.oring_cross_section_mm
    }

    /// Tube socket radius of the accessory parts.
    pub fn socket_radius(&self) -> f64 {
        (self.tube_od_mm + self.fit_clearance_mm) / 2.0
    }

    /// Extrusion slices for a sweep of `length`.
    pub fn slices_for(&self, length: f64) -> u32 {
        (length.abs() * self.extrude_slices_per_mm).ceil().max(1.0) as u32
    }

    pub fn cell_inner_radius(&self) -> f64 {
        self.cell_diameter_mm / 2.0 - self.cell_wall_mm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let p = ParameterSet::from_json_str(
            r#"{"num_bins": 3, "insert_length_mm": 175, "GENERATE_CFD_VOLUME": true}"#,
        )
        .unwrap();
        assert_eq!(p.num_bins, 3);
        assert_eq!(p.insert_length_mm, 175.0);
        assert!(p.generate_cfd_volume);
        assert_eq!(p.tube_od_mm, 32.0);
    }

    #[test]
    fn test_enums_parse_snake_case() {
        let p = ParameterSet::from_json_str(
            r#"{"part_to_generate": "hex_array_filter", "inlet_type": "pressfit", "slit_type": "ramped"}"#,
        )
        .unwrap();
        assert_eq!(p.part_to_generate, PartKind::HexArrayFilter);
        assert!(matches!(p.inlet_kind(), InletKind::PressFit(_)));
        assert_eq!(p.slit_kind(), SlitKind::Ramped { chamfer_height: 0.5 });
    }

    #[test]
    fn test_unknown_enum_rejected() {
        let err = ParameterSet::from_json_str(r#"{"inlet_type": "flange"}"#).unwrap_err();
        assert!(matches!(err, FilterError::Config { .. }));
    }

    #[test]
    fn test_overrides() {
        let mut p = ParameterSet::default();
        p.apply_override("num_bins=3").unwrap();
        p.apply_override("GENERATE_CFD_VOLUME=true").unwrap();
        p.apply_override("inlet_type=barb").unwrap();
        p.apply_override("part_to_generate=\"flat_end_screw\"").unwrap();
        assert_eq!(p.num_bins, 3);
        assert!(p.generate_cfd_volume);
        assert_eq!(p.inlet_type, InletType::Barb);
        assert_eq!(p.part_to_generate, PartKind::FlatEndScrew);

        assert!(p.apply_override("no_such_key=1").is_err());
        assert!(p.apply_override("num_bins").is_err());
        assert!(p.apply_override("num_bins=many").is_err());
        assert_eq!(p.num_bins, 3);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = ParameterSet::default();
        let mut b = a.clone();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        b.num_bins = 2;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn test_derived_dimensions() {
        let p = ParameterSet::default();
        assert_eq!(p.tube_id(), 29.0);
        assert!((p.spacer_radius() - 14.3).abs() < 1e-12);
        assert!((p.helix_outer_radius() - 3.8).abs() < 1e-12);
        assert!((p.groove_depth() - 1.2).abs() < 1e-12);
        assert_eq!(p.slices_for(10.0), 20);
    }
}
