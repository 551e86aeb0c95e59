use csg_kernel::CsgError;
use thiserror::Error;

/// Largest supported bin count.
pub const MAX_BINS: u32 = 64;

/// Largest supported number of rings around the centre cell of a hex array.
pub const MAX_HEX_LAYERS: u32 = 10;

/// Failures of a filter build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("invalid configuration: {}", join_issues(issues))]
    InvalidConfiguration { issues: Vec<ConfigIssue> },

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(#[from] CsgError),

    #[error("configuration error: {message}")]
    Config { message: String },
}

impl FilterError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Issues carried by an `InvalidConfiguration`, empty otherwise.
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            Self::InvalidConfiguration { issues } => issues,
            _ => &[],
        }
    }
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One infeasible parameter combination, found before any geometry is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigIssue {
    #[error("{parameter} must be positive, got {value}")]
    NonPositive { parameter: &'static str, value: f64 },

    #[error("num_bins must be within 1..={max}, got {count}")]
    BinCount { count: u32, max: u32 },

    #[error("helices must be within 1..=3, got {count}")]
    HelixCount { count: u32 },

    #[error("num_stages must be within 1..=3, got {count}")]
    StageCount { count: u32 },

    #[error("hex_array_layers must be within 0..={max}, got {count}")]
    HexLayers { count: u32, max: u32 },

    #[error(
        "helix profile radius ({profile}mm) must be strictly less than helix path radius \
         ({path}mm) to avoid center-axis self-intersection"
    )]
    SelfIntersection { profile: f64, path: f64 },

    #[error(
        "void radius with channel tolerance ({void}mm) is >= profile radius ({profile}mm), \
         giving zero or negative wall thickness"
    )]
    WallThickness { void: f64, profile: f64 },

    #[error(
        "helix outer radius ({outer:.2}mm) exceeds tube inner radius ({tube:.2}mm); \
         it would intersect the tube wall"
    )]
    TubeFit { outer: f64, tube: f64 },

    #[error("tube wall ({wall}mm) must be thinner than the tube radius ({radius}mm)")]
    TubeWall { wall: f64, radius: f64 },

    #[error("{spacers} spacers of {height}mm leave no room for bins in {length}mm")]
    SpacersConsumeLength { spacers: u32, height: f64, length: f64 },

    #[error("seal groove width ({width:.2}mm) exceeds spacer height ({height}mm)")]
    GrooveWiderThanSpacer { width: f64, height: f64 },

    #[error(
        "seal groove floor (r = {floor:.2}mm) reaches the helix socket (r = {socket:.2}mm)"
    )]
    GrooveReachesSocket { floor: f64, socket: f64 },

    #[error("slit chamfer height ({chamfer}mm) must be below slit axial length ({axial}mm)")]
    ChamferTooLong { chamfer: f64, axial: f64 },

    #[error(
        "slit of {span:.2}mm (length plus end margin) does not fit the {pitch:.2}mm \
         available per slit in a bin"
    )]
    SlitLongerThanBin { span: f64, pitch: f64 },

    #[error("inlet flange (r = {flange:.2}mm) does not reach the flow channel (r = {channel:.2}mm)")]
    InletMissesChannel { flange: f64, channel: f64 },

    #[error("inlet flange reaches r = {reach:.2}mm, outside the spacer (r = {spacer:.2}mm)")]
    InletTooWide { reach: f64, spacer: f64 },

    #[error("inlet recess depth ({depth}mm) must be below spacer height ({height}mm)")]
    InletRecessTooDeep { depth: f64, height: f64 },

    #[error(
        "support struts at r = {radius:.2}mm with radius {strut}mm do not fit between \
         the slit envelope and the seal groove"
    )]
    SupportStrutFit { radius: f64, strut: f64 },

    #[error("cell core radius ({core}mm) must be below cell inner radius ({inner}mm)")]
    CellCore { core: f64, inner: f64 },

    #[error("hex cell spacing ({spacing}mm) is smaller than the cell diameter ({diameter}mm)")]
    CellOverlap { spacing: f64, diameter: f64 },
}
