use csg_kernel::Shape2d;

use crate::config::ParameterSet;

/// Cross-section of the helical screw: a circle stretched tangentially by
/// `scale_ratio` and centred on the helix path.
///
/// Only the tangential (Y) axis is scaled, so the radial extent of a profile
/// of radius `r` stays `[path_radius - r, path_radius + r]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossSectionProfile {
    pub path_radius: f64,
    pub scale_ratio: f64,
    pub outer_radius: f64,
    pub void_radius: f64,
}

impl CrossSectionProfile {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            path_radius: params.helix_path_radius_mm,
            scale_ratio: params.helix_profile_scale_ratio,
            outer_radius: params.helix_profile_radius_mm,
            void_radius: params.void_radius(),
        }
    }

    pub fn at(&self, radius: f64) -> Shape2d {
        Shape2d::ellipse(radius, radius * self.scale_ratio).offset(self.path_radius, 0.0)
    }

    /// Solid screw section.
    pub fn outer(&self) -> Shape2d {
        self.at(self.outer_radius)
    }

    /// Flow channel section, tolerance included.
    pub fn void(&self) -> Shape2d {
        self.at(self.void_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csg_kernel::Point2d;

    #[test]
    fn test_radial_extent_unscaled() {
        let profile = CrossSectionProfile::from_params(&ParameterSet::default());
        let (lo, hi) = profile.outer().bounds();
        assert!((lo.x - 0.2).abs() < 1e-12);
        assert!((hi.x - 3.8).abs() < 1e-12);
        assert!((hi.y - 1.8 * 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_void_nested_in_outer() {
        let profile = CrossSectionProfile::from_params(&ParameterSet::default());
        let edge = Point2d::new(3.1, 0.0);
        assert!(profile.void().contains(edge));
        assert!(profile.outer().contains(edge));
        assert!(!profile.void().contains(Point2d::new(3.5, 0.0)));
        assert!(profile.outer().contains(Point2d::new(3.5, 0.0)));
    }
}
