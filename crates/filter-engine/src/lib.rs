//! Procedural geometry for helical inertial-separator filters.
//!
//! A [`ParameterSet`] is validated and turned into one CSG tree. Every
//! twisted piece of the modular filter is cut from a single master helix so
//! the twist phase runs through all segments and spacers without a seam.

pub mod accessories;
pub mod assembler;
pub mod config;
pub mod error;
pub mod flat_end;
pub mod helix;
pub mod hex_array;
pub mod master;
pub mod profile;
pub mod segment;
pub mod slit;
pub mod spacer;
pub mod staged;
pub mod validate;

pub use assembler::{build, Assembly};
pub use config::{InletKind, InletType, ParameterSet, PartKind, SlitKind, SlitType};
pub use error::{ConfigIssue, FilterError, MAX_BINS, MAX_HEX_LAYERS};
pub use flat_end::FlatEndScrew;
pub use helix::{helical_sweep, HelicalPath};
pub use hex_array::{hex_layout, place_cells, ArrayCell};
pub use master::{LocalFrame, MasterHelix};
pub use profile::CrossSectionProfile;
pub use segment::{AxialLayout, Segment};
pub use slit::SlitSpec;
pub use spacer::{Spacer, SupportLattice};
pub use staged::{Stage, StagedCell};
pub use validate::{check, validate};
