//! Cartesian ⇄ spherical conversion in the ISO (physics) convention.
//!
//! - `r` is the distance from the origin, `r >= 0`.
//! - `theta` is the polar angle measured from the +Z axis, in `[0, π]`.
//! - `phi` is the azimuth in the XY plane measured from the +X axis, in `(-π, π]`.
//!
//! The two free functions are algebraic inverses for every point with `r > 0`.
//! At the origin `theta` is undefined (`z / r` divides by zero) and the raw
//! conversion yields NaN; [`SphericalCoord::from_cartesian`] turns that case
//! into `None` so callers can report it instead of propagating NaN. On the
//! polar axis (`x = y = 0`) `atan2` still returns a value, but it carries no
//! geometric meaning.

use std::f64::consts::PI;

use super::Point3;

/// A point expressed as `(r, theta, phi)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalCoord {
    pub r: f64,
    pub theta: f64,
    pub phi: f64,
}

impl SphericalCoord {
    #[must_use]
    pub const fn new(r: f64, theta: f64, phi: f64) -> Self {
        Self { r, theta, phi }
    }

    /// Converts a Cartesian point.
    ///
    /// Returns `None` for the origin, where the polar angle is undefined, and
    /// for points with non-finite coordinates.
    #[must_use]
    pub fn from_cartesian(point: Point3) -> Option<Self> {
        if !point.is_finite() {
            return None;
        }
        let (r, theta, phi) = cartesian_to_spherical(point.x, point.y, point.z);
        if r > 0.0 && theta.is_finite() {
            Some(Self::new(r, theta, phi))
        } else {
            None
        }
    }

    #[must_use]
    pub fn to_cartesian(self) -> Point3 {
        let (x, y, z) = spherical_to_cartesian(self.r, self.theta, self.phi);
        Point3::new(x, y, z)
    }

    /// Same direction, different radial distance.
    #[must_use]
    pub const fn with_radius(self, r: f64) -> Self {
        Self::new(r, self.theta, self.phi)
    }
}

/// `(x, y, z) -> (r, theta, phi)`.
///
/// `theta = acos(z / r)`, `phi = atan2(y, x)`. The ratio is clamped to
/// `[-1, 1]` so roundoff near the poles cannot push `acos` out of its domain;
/// NaN (the `r = 0` case) passes through the clamp unchanged.
#[must_use]
pub fn cartesian_to_spherical(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let r = (x * x + y * y + z * z).sqrt();
    let theta = (z / r).clamp(-1.0, 1.0).acos();
    let mut phi = y.atan2(x);
    // atan2(-0.0, x < 0) is -π; fold it onto π.
    if phi <= -PI {
        phi = PI;
    }
    (r, theta, phi)
}

/// `(r, theta, phi) -> (x, y, z)`.
#[must_use]
pub fn spherical_to_cartesian(r: f64, theta: f64, phi: f64) -> (f64, f64, f64) {
    let (sin_theta, cos_theta) = theta.sin_cos();
    let (sin_phi, cos_phi) = phi.sin_cos();
    (
        r * sin_theta * cos_phi,
        r * sin_theta * sin_phi,
        r * cos_theta,
    )
}
