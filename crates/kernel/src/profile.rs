//! Planar cross-sections consumed by extrusions.
//!
//! Profiles live in the XY plane of the extrusion's local frame. For a
//! `RotateExtrude` the X coordinate is the radius and Y becomes Z.

use serde::{Deserialize, Serialize};

use crate::geometry::point::Point2d;
use crate::tree::CsgError;

/// Samples used when searching the farthest point of an ellipse.
const ELLIPSE_SAMPLES: usize = 720;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape2d {
    Circle { r: f64 },
    /// Axis-aligned ellipse centred on the origin.
    Ellipse { rx: f64, ry: f64 },
    Rect { min: Point2d, max: Point2d },
    /// Simple polygon, either winding.
    Polygon { points: Vec<Point2d> },
    Offset { dx: f64, dy: f64, shape: Box<Shape2d> },
    /// Counter-clockwise rotation about the origin.
    Rotated { deg: f64, shape: Box<Shape2d> },
}

impl Shape2d {
    pub fn circle(r: f64) -> Self {
        Self::Circle { r }
    }

    pub fn ellipse(rx: f64, ry: f64) -> Self {
        Self::Ellipse { rx, ry }
    }

    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::Rect {
            min: Point2d::new(x0.min(x1), y0.min(y1)),
            max: Point2d::new(x0.max(x1), y0.max(y1)),
        }
    }

    pub fn polygon(points: Vec<Point2d>) -> Self {
        Self::Polygon { points }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::Offset {
            dx,
            dy,
            shape: Box::new(self),
        }
    }

    pub fn rotated(self, deg: f64) -> Self {
        Self::Rotated {
            deg,
            shape: Box::new(self),
        }
    }

    /// Reject degenerate dimensions before the shape enters a tree.
    pub fn validate(&self) -> Result<(), CsgError> {
        match self {
            Self::Circle { r } => positive("circle radius", *r),
            Self::Ellipse { rx, ry } => {
                positive("ellipse x radius", *rx)?;
                positive("ellipse y radius", *ry)
            }
            Self::Rect { min, max } => {
                positive("rectangle width", max.x - min.x)?;
                positive("rectangle height", max.y - min.y)
            }
            Self::Polygon { points } => {
                if points.len() < 3 {
                    return Err(CsgError::InsufficientProfile {
                        required: 3,
                        provided: points.len(),
                    });
                }
                Ok(())
            }
            Self::Offset { shape, .. } | Self::Rotated { shape, .. } => shape.validate(),
        }
    }

    /// Point membership, boundary inclusive.
    pub fn contains(&self, p: Point2d) -> bool {
        match self {
            Self::Circle { r } => p.norm() <= *r,
            Self::Ellipse { rx, ry } => (p.x / rx).powi(2) + (p.y / ry).powi(2) <= 1.0,
            Self::Rect { min, max } => {
                p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
            }
            Self::Polygon { points } => polygon_contains(points, p),
            Self::Offset { dx, dy, shape } => shape.contains(p.offset(-dx, -dy)),
            Self::Rotated { deg, shape } => shape.contains(p.rotated_deg(-deg)),
        }
    }

    /// Axis-aligned bounds `(min, max)`. Conservative under rotation.
    pub fn bounds(&self) -> (Point2d, Point2d) {
        match self {
            Self::Circle { r } => (Point2d::new(-r, -r), Point2d::new(*r, *r)),
            Self::Ellipse { rx, ry } => (Point2d::new(-rx, -ry), Point2d::new(*rx, *ry)),
            Self::Rect { min, max } => (*min, *max),
            Self::Polygon { points } => {
                let mut lo = Point2d::new(f64::INFINITY, f64::INFINITY);
                let mut hi = Point2d::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
                for p in points {
                    lo.x = lo.x.min(p.x);
                    lo.y = lo.y.min(p.y);
                    hi.x = hi.x.max(p.x);
                    hi.y = hi.y.max(p.y);
                }
                (lo, hi)
            }
            Self::Offset { dx, dy, shape } => {
                let (lo, hi) = shape.bounds();
                (lo.offset(*dx, *dy), hi.offset(*dx, *dy))
            }
            Self::Rotated { deg, shape } => {
                if let Self::Circle { r } = shape.as_ref() {
                    return (Point2d::new(-r, -r), Point2d::new(*r, *r));
                }
                let (lo, hi) = shape.bounds();
                let corners = [
                    Point2d::new(lo.x, lo.y),
                    Point2d::new(hi.x, lo.y),
                    Point2d::new(hi.x, hi.y),
                    Point2d::new(lo.x, hi.y),
                ]
                .map(|c| c.rotated_deg(*deg));
                Self::polygon(corners.to_vec()).bounds()
            }
        }
    }

    /// Farthest distance from the origin of any point in the shape.
    ///
    /// This is the radius a twisted sweep of the shape can reach.
    pub fn max_radius(&self) -> f64 {
        self.farthest_from(Point2d::ORIGIN)
    }

    fn farthest_from(&self, q: Point2d) -> f64 {
        match self {
            Self::Circle { r } => q.norm() + r,
            Self::Ellipse { rx, ry } => ellipse_farthest(*rx, *ry, q),
            Self::Rect { min, max } => [
                Point2d::new(min.x, min.y),
                Point2d::new(max.x, min.y),
                Point2d::new(max.x, max.y),
                Point2d::new(min.x, max.y),
            ]
            .iter()
            .map(|c| c.distance_to(&q))
            .fold(0.0, f64::max),
            Self::Polygon { points } => points
                .iter()
                .map(|c| c.distance_to(&q))
                .fold(0.0, f64::max),
            Self::Offset { dx, dy, shape } => shape.farthest_from(q.offset(-dx, -dy)),
            Self::Rotated { deg, shape } => shape.farthest_from(q.rotated_deg(-deg)),
        }
    }
}

fn positive(parameter: &'static str, value: f64) -> Result<(), CsgError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CsgError::InvalidDimension { parameter, value })
    }
}

/// Even-odd ray cast.
fn polygon_contains(points: &[Point2d], p: Point2d) -> bool {
    let mut inside = false;
    let n = points.len();
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x <= x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Farthest distance from `q` to the ellipse boundary: coarse scan, then a
/// golden-section refinement around the best sample.
fn ellipse_farthest(rx: f64, ry: f64, q: Point2d) -> f64 {
    let dist = |theta: f64| Point2d::new(rx * theta.cos(), ry * theta.sin()).distance_to(&q);
    let step = std::f64::consts::TAU / ELLIPSE_SAMPLES as f64;
    let best = (0..ELLIPSE_SAMPLES)
        .map(|i| i as f64 * step)
        .fold(0.0, |best: f64, theta| if dist(theta) > dist(best) { theta } else { best });

    let phi = (5.0f64.sqrt() - 1.0) / 2.0;
    let (mut lo, mut hi) = (best - step, best + step);
    for _ in 0..60 {
        let a = hi - phi * (hi - lo);
        let b = lo + phi * (hi - lo);
        if dist(a) > dist(b) {
            hi = b;
        } else {
            lo = a;
        }
    }
    dist(0.5 * (lo + hi)).max(dist(best))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_offset_ellipse_membership() {
        let s = Shape2d::ellipse(1.0, 2.0).offset(3.0, 0.0);
        assert!(s.contains(Point2d::new(3.0, 1.9)));
        assert!(!s.contains(Point2d::new(3.0, 2.1)));
        assert!(!s.contains(Point2d::ORIGIN));
    }

    #[test]
    fn test_offset_circle_max_radius() {
        let s = Shape2d::circle(1.5).offset(2.0, 0.0);
        assert_abs_diff_eq!(s.max_radius(), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn test_elongated_ellipse_reaches_past_axis_tip() {
        // Tangentially stretched enough that the farthest point leaves the X axis.
        let s = Shape2d::ellipse(1.0, 3.0).offset(1.0, 0.0);
        let (c, a, b) = (1.0f64, 1.0f64, 3.0f64);
        let u = a * c / (b * b - a * a);
        let expected = ((c + a * u).powi(2) + b * b * (1.0 - u * u)).sqrt();
        assert_abs_diff_eq!(s.max_radius(), expected, epsilon = 1e-9);
        assert!(s.max_radius() > c + a);
    }

    #[test]
    fn test_polygon_contains_triangle() {
        let tri = Shape2d::polygon(vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(4.0, -1.0),
            Point2d::new(4.0, 1.0),
        ]);
        assert!(tri.contains(Point2d::new(3.0, 0.0)));
        assert!(!tri.contains(Point2d::new(1.0, 0.9)));
        assert!(!tri.contains(Point2d::new(-0.1, 0.0)));
    }

    #[test]
    fn test_rotated_rect_bounds_are_conservative() {
        let s = Shape2d::rect(0.0, -0.5, 2.0, 0.5).rotated(90.0);
        let (lo, hi) = s.bounds();
        assert!(lo.y <= 0.0 + 1e-12 && hi.y >= 2.0 - 1e-12);
        assert!(s.contains(Point2d::new(0.0, 1.0)));
    }

    #[test]
    fn test_validate_rejects_degenerate() {
        assert!(Shape2d::circle(0.0).validate().is_err());
        assert!(Shape2d::polygon(vec![Point2d::ORIGIN, Point2d::new(1.0, 0.0)])
            .validate()
            .is_err());
        assert!(Shape2d::ellipse(1.0, 1.4).offset(2.0, 0.0).validate().is_ok());
    }
}
