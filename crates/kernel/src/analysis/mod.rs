//! Read-only passes over a finished tree.

pub mod bounds;
pub mod classify;
pub mod fingerprint;
pub mod stats;

pub use bounds::bounds;
pub use classify::contains;
pub use fingerprint::{fingerprint, hex_digest};
pub use stats::{stats, TreeStats};
