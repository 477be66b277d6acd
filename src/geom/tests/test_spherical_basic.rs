//! Tests for the ISO spherical coordinate conversion.

use crate::geom::{Point3, SphericalCoord, cartesian_to_spherical, spherical_to_cartesian};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

const EPS: f64 = 1e-12;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPS,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn axis_points_map_to_expected_angles() {
    let (r, theta, phi) = cartesian_to_spherical(1.0, 0.0, 0.0);
    assert_close(r, 1.0);
    assert_close(theta, FRAC_PI_2);
    assert_close(phi, 0.0);

    let (r, theta, phi) = cartesian_to_spherical(0.0, 2.0, 0.0);
    assert_close(r, 2.0);
    assert_close(theta, FRAC_PI_2);
    assert_close(phi, FRAC_PI_2);

    let (_, theta, _) = cartesian_to_spherical(0.0, 0.0, 3.0);
    assert_close(theta, 0.0);

    let (_, theta, _) = cartesian_to_spherical(0.0, 0.0, -3.0);
    assert_close(theta, PI);
}

#[test]
fn azimuth_is_signed_and_quadrant_aware() {
    let (_, _, phi) = cartesian_to_spherical(-1.0, -1.0, 0.0);
    assert_close(phi, -3.0 * FRAC_PI_4);

    let (_, _, phi) = cartesian_to_spherical(-1.0, 1.0, 0.0);
    assert_close(phi, 3.0 * FRAC_PI_4);
}

#[test]
fn negative_x_axis_has_azimuth_pi_not_minus_pi() {
    let (_, _, phi) = cartesian_to_spherical(-1.0, -0.0, 0.0);
    assert_close(phi, PI);
    let (_, _, phi) = cartesian_to_spherical(-1.0, 0.0, 0.0);
    assert_close(phi, PI);
}

#[test]
fn spherical_to_cartesian_matches_closed_form() {
    let (x, y, z) = spherical_to_cartesian(2.0, FRAC_PI_2, FRAC_PI_2);
    assert_close(x, 0.0);
    assert_close(y, 2.0);
    assert_close(z, 0.0);

    let (x, y, z) = spherical_to_cartesian(1.0, 0.0, 1.234);
    assert_close(x, 0.0);
    assert_close(y, 0.0);
    assert_close(z, 1.0);
}

#[test]
fn round_trip_reproduces_points() {
    let samples = [
        [1.0, 2.0, 3.0],
        [-0.5, 0.25, -4.0],
        [1e-3, -2e-3, 5e-4],
        [100.0, -30.0, 0.0],
        [-7.0, -7.0, 7.0],
    ];
    for [x, y, z] in samples {
        let (r, theta, phi) = cartesian_to_spherical(x, y, z);
        let (rx, ry, rz) = spherical_to_cartesian(r, theta, phi);
        let scale = r.max(1.0);
        assert!((rx - x).abs() < 1e-12 * scale, "x: {rx} vs {x}");
        assert!((ry - y).abs() < 1e-12 * scale, "y: {ry} vs {y}");
        assert!((rz - z).abs() < 1e-12 * scale, "z: {rz} vs {z}");
    }
}

#[test]
fn origin_has_undefined_polar_angle() {
    let (r, theta, _) = cartesian_to_spherical(0.0, 0.0, 0.0);
    assert_close(r, 0.0);
    assert!(theta.is_nan());

    assert!(SphericalCoord::from_cartesian(Point3::ORIGIN).is_none());
}

#[test]
fn from_cartesian_rejects_non_finite_points() {
    assert!(SphericalCoord::from_cartesian(Point3::new(f64::NAN, 0.0, 1.0)).is_none());
    assert!(SphericalCoord::from_cartesian(Point3::new(0.0, f64::INFINITY, 1.0)).is_none());
}

#[test]
fn with_radius_keeps_direction() {
    let p = Point3::new(3.0, -4.0, 12.0);
    let coord = SphericalCoord::from_cartesian(p).expect("non-singular");
    assert_close(coord.r, 13.0);

    let scaled = coord.with_radius(26.0).to_cartesian();
    assert!((scaled.x - 6.0).abs() < 1e-12);
    assert!((scaled.y + 8.0).abs() < 1e-12);
    assert!((scaled.z - 24.0).abs() < 1e-12);
}
