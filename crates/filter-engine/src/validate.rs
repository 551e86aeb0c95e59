//! Feasibility checks run before any geometry is built.
//!
//! A declarative CSG tree cannot abort half way, so every infeasible
//! combination is collected here and reported together.

use tracing::{instrument, warn};

use crate::config::{InletKind, ParameterSet, PartKind, SlitKind};
use crate::error::{ConfigIssue, FilterError, MAX_BINS, MAX_HEX_LAYERS};

/// Every issue found in `params`, in a stable order.
pub fn check(params: &ParameterSet) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    check_common(params, &mut issues);
    match params.part_to_generate {
        PartKind::ModularFilterAssembly => {
            check_axial_layout(params, &mut issues);
            check_slits(params, &mut issues);
            check_spacer(params, &mut issues);
            check_inlet(params, &mut issues);
            if params.add_helical_support {
                check_support(params, &mut issues);
            }
        }
        PartKind::FlatEndScrew => {
            check_axial_layout(params, &mut issues);
            check_slits(params, &mut issues);
        }
        PartKind::HexArrayFilter | PartKind::SingleCellFilter => check_cells(params, &mut issues),
        PartKind::HoseAdapterCap => {
            check_accessory(params, &mut issues);
            check_fitting(params, &mut issues);
        }
        PartKind::CustomCoupling | PartKind::FilterHolder => check_accessory(params, &mut issues),
    }
    issues
}

/// Fail with `InvalidConfiguration` if `params` has any issue.
#[instrument(skip(params), fields(part = ?params.part_to_generate))]
pub fn validate(params: &ParameterSet) -> Result<(), FilterError> {
    let issues = check(params);
    if issues.is_empty() {
        return Ok(());
    }
    for issue in &issues {
        warn!(%issue, "infeasible parameters");
    }
    Err(FilterError::InvalidConfiguration { issues })
}

fn positive(issues: &mut Vec<ConfigIssue>, parameter: &'static str, value: f64) -> bool {
    if value > 0.0 && value.is_finite() {
        true
    } else {
        issues.push(ConfigIssue::NonPositive { parameter, value });
        false
    }
}

fn check_common(p: &ParameterSet, issues: &mut Vec<ConfigIssue>) {
    let mut tube = positive(issues, "tube_od_mm", p.tube_od_mm) & positive(issues, "tube_wall_mm", p.tube_wall_mm);
    let helix = positive(issues, "helix_path_radius_mm", p.helix_path_radius_mm)
        & positive(issues, "helix_profile_radius_mm", p.helix_profile_radius_mm)
        & positive(issues, "helix_void_profile_radius_mm", p.helix_void_profile_radius_mm);
    positive(issues, "helix_profile_scale_ratio", p.helix_profile_scale_ratio);
    positive(issues, "insert_length_mm", p.insert_length_mm);
    positive(issues, "number_of_complete_revolutions", p.number_of_complete_revolutions);
    positive(issues, "extrude_slices_per_mm", p.extrude_slices_per_mm);
    positive(issues, "cut_padding_mm", p.cut_padding_mm);
    if p.channel_tolerance_mm < 0.0 {
        issues.push(ConfigIssue::NonPositive {
            parameter: "channel_tolerance_mm",
            value: p.channel_tolerance_mm,
        });
    }
    if p.facet_segments < 3 {
        issues.push(ConfigIssue::NonPositive {
            parameter: "facet_segments (at least 3)",
            value: p.facet_segments as f64,
        });
    }

    if tube && p.tube_wall_mm >= p.tube_od_mm / 2.0 {
        issues.push(ConfigIssue::TubeWall {
            wall: p.tube_wall_mm,
            radius: p.tube_od_mm / 2.0,
        });
        // No bore left to fit anything into.
        tube = false;
    }
    if helix {
        if p.helix_profile_radius_mm >= p.helix_path_radius_mm {
            issues.push(ConfigIssue::SelfIntersection {
                profile: p.helix_profile_radius_mm,
                path: p.helix_path_radius_mm,
            });
        }
        if p.void_radius() >= p.helix_profile_radius_mm {
            issues.push(ConfigIssue::WallThickness {
                void: p.void_radius(),
                profile: p.helix_profile_radius_mm,
            });
        }
    }
    if tube && helix && p.helix_outer_radius() > p.tube_inner_radius() {
        issues.push(ConfigIssue::TubeFit {
            outer: p.helix_outer_radius(),
            tube: p.tube_inner_radius(),
        });
    }
}

fn check_axial_layout(p: &ParameterSet, issues: &mut Vec<ConfigIssue>) {
    if p.num_bins == 0 || p.num_bins > MAX_BINS {
        issues.push(ConfigIssue::BinCount {
            count: p.num_bins,
            max: MAX_BINS,
        });
        return;
    }
    if !positive(issues, "spacer_height_mm", p.spacer_height_mm) {
        return;
    }
    if p.insert_length_mm > 0.0 && (p.num_bins + 1) as f64 * p.spacer_height_mm >= p.insert_length_mm {
        issues.push(ConfigIssue::SpacersConsumeLength {
            spacers: p.num_bins + 1,
            height: p.spacer_height_mm,
            length: p.insert_length_mm,
        });
    }
}

fn bin_length(p: &ParameterSet) -> f64 {
    (p.insert_length_mm - (p.num_bins + 1) as f64 * p.spacer_height_mm) / p.num_bins.max(1) as f64
}

fn check_slits(p: &ParameterSet, issues: &mut Vec<ConfigIssue>) {
    let kind = p.slit_kind();
    if kind == SlitKind::None {
        return;
    }
    let ok = positive(issues, "slit_axial_length_mm", p.slit_axial_length_mm)
        & positive(issues, "slit_width_mm", p.slit_width_mm);
    if p.slit_end_margin_mm < 0.0 {
        issues.push(ConfigIssue::NonPositive {
            parameter: "slit_end_margin_mm",
            value: p.slit_end_margin_mm,
        });
    }
    if let SlitKind::Ramped { chamfer_height } = kind {
        if positive(issues, "slit_chamfer_height", chamfer_height)
            && chamfer_height >= p.slit_axial_length_mm
        {
            issues.push(ConfigIssue::ChamferTooLong {
                chamfer: chamfer_height,
                axial: p.slit_axial_length_mm,
            });
        }
    }
    let bin = bin_length(p);
    if ok && bin > 0.0 {
        let span = p.slit_axial_length_mm + p.slit_end_margin_mm;
        let pitch = bin / p.slits_per_bin as f64;
        if span > pitch {
            issues.push(ConfigIssue::SlitLongerThanBin { span, pitch });
        }
    }
}

fn check_spacer(p: &ParameterSet, issues: &mut Vec<ConfigIssue>) {
    if !positive(issues, "oring_cross_section_mm", p.oring_cross_section_mm) {
        return;
    }
    if p.groove_width() > p.spacer_height_mm {
        issues.push(ConfigIssue::GrooveWiderThanSpacer {
            width: p.groove_width(),
            height: p.spacer_height_mm,
        });
    }
    let floor = p.spacer_radius() - p.groove_depth();
    if floor <= p.cut_envelope_radius() {
        issues.push(ConfigIssue::GrooveReachesSocket {
            floor,
            socket: p.cut_envelope_radius(),
        });
    }
}

/// Fitting dimensions shared by spacer inlets and the adapter cap.
fn check_fitting(p: &ParameterSet, issues: &mut Vec<ConfigIssue>) {
    match p.inlet_kind() {
        InletKind::None => {}
        InletKind::Threaded(t) => {
            positive(issues, "inlet_thread_diameter_mm", t.diameter);
            positive(issues, "inlet_thread_pitch_mm", t.pitch);
            positive(issues, "inlet_thread_length_mm", t.length);
        }
        InletKind::PressFit(f) => {
            positive(issues, "pressfit_od_mm", f.outer_diameter);
            positive(issues, "pressfit_length_mm", f.length);
        }
        InletKind::Barb(b) => {
            positive(issues, "barb_hose_id_mm", b.hose_id);
            positive(issues, "barb_count", b.barb_count as f64);
            positive(issues, "barb_length_mm", b.length);
            if p.inlet_bore_mm >= b.hose_id {
                issues.push(ConfigIssue::NonPositive {
                    parameter: "barb wall (barb_hose_id_mm - inlet_bore_mm)",
                    value: b.hose_id - p.inlet_bore_mm,
                });
            }
        }
    }
    positive(issues, "inlet_bore_mm", p.inlet_bore_mm);
}

fn check_inlet(p: &ParameterSet, issues: &mut Vec<ConfigIssue>) {
    let kind = p.inlet_kind();
    if kind == InletKind::None {
        return;
    }
    check_fitting(p, issues);
    if !(positive(issues, "inlet_flange_diameter_mm", p.inlet_flange_diameter_mm)
        & positive(issues, "inlet_recess_depth_mm", p.inlet_recess_depth_mm))
    {
        return;
    }
    let flange = p.inlet_flange_diameter_mm / 2.0;
    let (reach, channel) = match kind {
        // Offset onto the channel, so it always reaches it.
        InletKind::Barb(_) => (p.helix_path_radius_mm + flange, 0.0),
        _ => (flange, p.helix_path_radius_mm - p.void_radius()),
    };
    if flange < channel {
        issues.push(ConfigIssue::InletMissesChannel { flange, channel });
    }
    if reach >= p.spacer_radius() - p.groove_depth() {
        issues.push(ConfigIssue::InletTooWide {
            reach,
            spacer: p.spacer_radius() - p.groove_depth(),
        });
    }
    if p.inlet_recess_depth_mm >= p.spacer_height_mm {
        issues.push(ConfigIssue::InletRecessTooDeep {
            depth: p.inlet_recess_depth_mm,
            height: p.spacer_height_mm,
        });
    }
}

fn check_support(p: &ParameterSet, issues: &mut Vec<ConfigIssue>) {
    if p.support_density == 0 {
        issues.push(ConfigIssue::NonPositive {
            parameter: "support_density",
            value: 0.0,
        });
    }
    if !positive(issues, "support_strut_radius_mm", p.support_strut_radius_mm) {
        return;
    }
    let radius = crate::spacer::support_radius(p);
    let strut = p.support_strut_radius_mm;
    if radius - strut <= p.cut_envelope_radius() || radius + strut >= p.spacer_radius() - p.groove_depth() {
        issues.push(ConfigIssue::SupportStrutFit { radius, strut });
    }
}

fn check_cells(p: &ParameterSet, issues: &mut Vec<ConfigIssue>) {
    if !(1..=3).contains(&p.helices) {
        issues.push(ConfigIssue::HelixCount { count: p.helices });
    }
    if !(1..=3).contains(&p.num_stages) {
        issues.push(ConfigIssue::StageCount { count: p.num_stages });
    }
    let ok = positive(issues, "cell_diameter_mm", p.cell_diameter_mm)
        & positive(issues, "cell_wall_mm", p.cell_wall_mm)
        & positive(issues, "cell_core_radius_mm", p.cell_core_radius_mm)
        & positive(issues, "ramp_thickness_mm", p.ramp_thickness_mm);
    if ok && p.cell_core_radius_mm >= p.cell_inner_radius() {
        issues.push(ConfigIssue::CellCore {
            core: p.cell_core_radius_mm,
            inner: p.cell_inner_radius(),
        });
    }
    if p.part_to_generate == PartKind::HexArrayFilter {
        positive(issues, "base_plate_thickness_mm", p.base_plate_thickness_mm);
        if p.hex_array_layers > MAX_HEX_LAYERS {
            issues.push(ConfigIssue::HexLayers {
                count: p.hex_array_layers,
                max: MAX_HEX_LAYERS,
            });
        }
        if p.hex_array_layers > 0 && p.hex_cell_spacing_mm < p.cell_diameter_mm {
            issues.push(ConfigIssue::CellOverlap {
                spacing: p.hex_cell_spacing_mm,
                diameter: p.cell_diameter_mm,
            });
        }
    }
}

fn check_accessory(p: &ParameterSet, issues: &mut Vec<ConfigIssue>) {
    positive(issues, "fit_clearance_mm", p.fit_clearance_mm);
    positive(issues, "cap_wall_mm", p.cap_wall_mm);
    positive(issues, "socket_depth_mm", p.socket_depth_mm);
    match p.part_to_generate {
        PartKind::CustomCoupling => {
            positive(issues, "coupling_stop_width_mm", p.coupling_stop_width_mm);
        }
        PartKind::FilterHolder => {
            positive(issues, "holder_base_thickness_mm", p.holder_base_thickness_mm);
            if p.holder_base_diameter_mm < 2.0 * (p.socket_radius() + p.cap_wall_mm) {
                issues.push(ConfigIssue::NonPositive {
                    parameter: "holder base margin (holder_base_diameter_mm - collar diameter)",
                    value: p.holder_base_diameter_mm - 2.0 * (p.socket_radius() + p.cap_wall_mm),
                });
            }
        }
        _ => {}
    }
    if p.add_outer_o_rings {
        positive(issues, "oring_cross_section_mm", p.oring_cross_section_mm);
        if p.groove_depth() >= p.cap_wall_mm {
            issues.push(ConfigIssue::NonPositive {
                parameter: "cap wall left under the o-ring groove",
                value: p.cap_wall_mm - p.groove_depth(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ParameterSet {
        ParameterSet {
            tube_od_mm: 32.0,
            tube_wall_mm: 1.5,
            helix_path_radius_mm: 2.0,
            helix_profile_radius_mm: 1.8,
            helix_void_profile_radius_mm: 1.0,
            insert_length_mm: 50.0,
            ..ParameterSet::default()
        }
    }

    fn messages(p: &ParameterSet) -> String {
        match validate(p) {
            Ok(()) => String::new(),
            Err(e) => e.to_string().to_lowercase(),
        }
    }

    #[test]
    fn test_valid_parameters() {
        assert!(validate(&base()).is_ok());
        assert!(validate(&ParameterSet::default()).is_ok());
    }

    #[test]
    fn test_self_intersection_center() {
        let mut p = base();
        p.helix_path_radius_mm = 1.8;
        p.helix_profile_radius_mm = 2.5;
        assert!(messages(&p).contains("self-intersection"));
    }

    #[test]
    fn test_wall_thickness() {
        let mut p = base();
        p.helix_profile_radius_mm = 1.5;
        p.helix_void_profile_radius_mm = 1.5;
        assert!(messages(&p).contains("wall thickness"));
    }

    #[test]
    fn test_tube_fit() {
        let mut p = base();
        p.helix_path_radius_mm = 10.0;
        p.helix_profile_radius_mm = 5.0;
        assert!(messages(&p).contains("intersect the tube"));
    }

    #[test]
    fn test_negative_dimensions() {
        let mut p = base();
        p.insert_length_mm = -10.0;
        assert!(messages(&p).contains("positive"));
    }

    #[test]
    fn test_reported_failure_case() {
        let p = ParameterSet {
            part_to_generate: PartKind::ModularFilterAssembly,
            num_bins: 1,
            number_of_complete_revolutions: 2.0,
            helix_path_radius_mm: 1.8,
            helix_profile_radius_mm: 2.5,
            helix_void_profile_radius_mm: 1.0,
            helix_profile_scale_ratio: 1.4,
            tube_od_mm: 32.0,
            insert_length_mm: 50.0,
            generate_cfd_volume: true,
            ..ParameterSet::default()
        };
        assert!(messages(&p).contains("self-intersection"));
    }

    #[test]
    fn test_all_issues_reported() {
        let mut p = base();
        p.num_bins = 0;
        p.helix_path_radius_mm = 1.0;
        let issues = check(&p);
        assert!(issues.iter().any(|i| matches!(i, ConfigIssue::BinCount { .. })));
        assert!(issues.iter().any(|i| matches!(i, ConfigIssue::SelfIntersection { .. })));
    }

    #[test]
    fn test_bin_and_stage_bounds() {
        let mut p = base();
        p.num_bins = MAX_BINS + 1;
        assert!(check(&p).contains(&ConfigIssue::BinCount {
            count: MAX_BINS + 1,
            max: MAX_BINS
        }));

        let mut p = base();
        p.part_to_generate = PartKind::HexArrayFilter;
        p.helices = 4;
        p.num_stages = 0;
        let issues = check(&p);
        assert!(issues.contains(&ConfigIssue::HelixCount { count: 4 }));
        assert!(issues.contains(&ConfigIssue::StageCount { count: 0 }));
    }

    #[test]
    fn test_spacers_consume_length() {
        let mut p = base();
        p.num_bins = 9;
        p.spacer_height_mm = 5.0;
        assert!(check(&p)
            .iter()
            .any(|i| matches!(i, ConfigIssue::SpacersConsumeLength { spacers: 10, .. })));
    }

    #[test]
    fn test_ramped_chamfer_must_fit() {
        let mut p = base();
        p.slit_type = crate::config::SlitType::Ramped;
        p.slit_chamfer_height = 2.0;
        p.slit_axial_length_mm = 1.5;
        assert!(check(&p)
            .iter()
            .any(|i| matches!(i, ConfigIssue::ChamferTooLong { .. })));
    }

    #[test]
    fn test_too_many_slits() {
        let mut p = base();
        p.slits_per_bin = 30;
        assert!(check(&p)
            .iter()
            .any(|i| matches!(i, ConfigIssue::SlitLongerThanBin { .. })));
    }

    #[test]
    fn test_inlets_checked_only_when_requested() {
        let mut p = base();
        p.inlet_flange_diameter_mm = 40.0;
        assert!(validate(&p).is_ok());
        p.inlet_type = crate::config::InletType::Threaded;
        assert!(check(&p)
            .iter()
            .any(|i| matches!(i, ConfigIssue::InletTooWide { .. })));
    }

    /// The single issue `p` trips.
    fn sole_issue(p: &ParameterSet) -> ConfigIssue {
        let mut issues = check(p);
        assert_eq!(issues.len(), 1, "{issues:?}");
        issues.remove(0)
    }

    #[test]
    fn test_groove_wider_than_spacer() {
        let mut p = base();
        p.oring_cross_section_mm = 5.0;
        assert!(matches!(sole_issue(&p), ConfigIssue::GrooveWiderThanSpacer { height, .. } if height == 5.0));
    }

    #[test]
    fn test_groove_reaches_socket() {
        let mut p = base();
        p.spacer_height_mm = 15.0;
        p.oring_cross_section_mm = 13.0;
        assert!(matches!(sole_issue(&p), ConfigIssue::GrooveReachesSocket { floor, socket } if floor <= socket));
    }

    #[test]
    fn test_inlet_misses_channel() {
        let mut p = base();
        p.inlet_type = crate::config::InletType::Threaded;
        p.inlet_flange_diameter_mm = 1.0;
        assert!(matches!(sole_issue(&p), ConfigIssue::InletMissesChannel { flange, .. } if flange == 0.5));
    }

    #[test]
    fn test_inlet_recess_too_deep() {
        let mut p = base();
        p.inlet_type = crate::config::InletType::Threaded;
        p.inlet_recess_depth_mm = p.spacer_height_mm;
        assert_eq!(
            sole_issue(&p),
            ConfigIssue::InletRecessTooDeep {
                depth: 5.0,
                height: 5.0
            }
        );
    }

    #[test]
    fn test_cell_core_inside_bore() {
        let mut p = base();
        p.part_to_generate = PartKind::SingleCellFilter;
        p.cell_core_radius_mm = 9.0;
        assert!(matches!(sole_issue(&p), ConfigIssue::CellCore { core, .. } if core == 9.0));
    }

    #[test]
    fn test_hex_cells_overlap() {
        let mut p = base();
        p.part_to_generate = PartKind::HexArrayFilter;
        p.hex_cell_spacing_mm = 19.0;
        assert_eq!(
            sole_issue(&p),
            ConfigIssue::CellOverlap {
                spacing: 19.0,
                diameter: 20.0
            }
        );
    }

    #[test]
    fn test_tube_wall_fills_tube() {
        let mut p = base();
        p.part_to_generate = PartKind::CustomCoupling;
        p.tube_wall_mm = 16.0;
        assert_eq!(
            sole_issue(&p),
            ConfigIssue::TubeWall {
                wall: 16.0,
                radius: 16.0
            }
        );
    }

    #[test]
    fn test_hex_layer_bound() {
        let mut p = base();
        p.part_to_generate = PartKind::HexArrayFilter;
        p.hex_array_layers = MAX_HEX_LAYERS;
        assert!(validate(&p).is_ok());
        p.hex_array_layers = 5_000_000;
        assert_eq!(
            sole_issue(&p),
            ConfigIssue::HexLayers {
                count: 5_000_000,
                max: MAX_HEX_LAYERS
            }
        );
        assert!(matches!(validate(&p), Err(FilterError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_support_defaults_fit() {
        let mut p = base();
        p.add_helical_support = true;
        assert!(validate(&p).is_ok());
        p.support_strut_radius_mm = 6.0;
        assert!(check(&p)
            .iter()
            .any(|i| matches!(i, ConfigIssue::SupportStrutFit { .. })));
    }
}
