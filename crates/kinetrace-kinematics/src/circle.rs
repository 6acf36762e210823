//! Least-squares circle fit.
//!
//! Coope's linear formulation: for each point, `x² + y² = c1·x + c2·y + c3`.
//! The center is `(c1, c2) / 2` and the radius `sqrt(c3 + |center|²)`.

use glam::{DMat3, DVec3};
use kinetrace_core::Point2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Determinant of the normal matrix, relative to its diagonal, under which
/// the points are considered collinear.
const SINGULAR_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl Circle {
    /// Result of a failed or degenerate fit.
    pub const EMPTY: Self = Self {
        center: Point2::ZERO,
        radius: 0.0,
    };

    pub fn new(center: Point2, radius: f64) -> Self {
        Self { center, radius }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.radius.is_finite() && self.radius > 0.0)
    }
}

impl Default for Circle {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Fit the best circle through `points`.
///
/// Returns [`Circle::EMPTY`] for fewer than three points, collinear points,
/// or any non-finite result.
pub fn fit_circle(points: &[Point2]) -> Circle {
    if points.len() < 3 {
        return Circle::EMPTY;
    }

    // Normal equations AᵀA z = Aᵀb with rows (x, y, 1) and b = x² + y².
    let mut ata = DMat3::ZERO;
    let mut atb = DVec3::ZERO;
    for p in points {
        let row = DVec3::new(p.x, p.y, 1.0);
        let b = p.length_squared();
        ata = ata + DMat3::from_cols(row * row.x, row * row.y, row * row.z);
        atb += row * b;
    }

    let det = ata.determinant();
    let scale = ata.x_axis.x * ata.y_axis.y * ata.z_axis.z;
    if !det.is_finite() || det.abs() <= SINGULAR_TOLERANCE * scale.abs() {
        debug!(points = points.len(), "Circle fit on degenerate points");
        return Circle::EMPTY;
    }

    let z = ata.inverse() * atb;
    let center = Point2::new(z.x * 0.5, z.y * 0.5);
    let radius = (z.z + center.length_squared()).sqrt();

    let circle = Circle::new(center, radius);
    if circle.is_empty() || !center.is_finite() {
        return Circle::EMPTY;
    }
    circle
}
