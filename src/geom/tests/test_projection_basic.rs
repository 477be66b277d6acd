//! Tests for radial projection of meshes.

use crate::equation::RadiusFunction;
use crate::geom::{
    Point3, ProjectionError, SphericalCoord, SurfaceMesh, Vec3, icosphere, octasphere,
    project_mesh,
};
use std::f64::consts::FRAC_PI_2;

fn norm(p: [f64; 3]) -> f64 {
    Point3::from_array(p).norm()
}

/// A lumpy closed mesh: an icosphere with every vertex pushed to a different radius.
fn lumpy_sphere() -> SurfaceMesh {
    let base = icosphere(1);
    let positions = base
        .positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let scale = 0.5 + (i % 7) as f64 * 0.3;
            Vec3::from_array(*p).mul_scalar(scale).to_array()
        })
        .collect();
    base.with_positions(positions)
}

#[test]
fn icosphere_projected_to_constant_two() {
    let mesh = icosphere(0);
    assert_eq!(mesh.vertex_count(), 12);

    let f = RadiusFunction::compile("2").expect("compile");
    let (projected, diag) = project_mesh(&mesh, &f).expect("projection");

    assert_eq!(projected.vertex_count(), 12);
    for (input, output) in mesh.positions.iter().zip(&projected.positions) {
        assert!((norm(*output) - 2.0).abs() < 1e-5, "norm {}", norm(*output));
        // Same direction as the input vertex.
        let dir_in = Vec3::from_array(*input).normalized().unwrap();
        let dir_out = Vec3::from_array(*output).normalized().unwrap();
        assert!(dir_in.dot(dir_out) > 1.0 - 1e-12);
    }
    assert!((diag.min_radius - 2.0).abs() < 1e-12);
    assert!((diag.max_radius - 2.0).abs() < 1e-12);
    assert_eq!(diag.negative_radius_count, 0);
}

#[test]
fn constant_one_puts_every_vertex_on_the_unit_sphere() {
    let mesh = lumpy_sphere();
    let f = RadiusFunction::compile("1").expect("compile");
    let (projected, _) = project_mesh(&mesh, &f).expect("projection");

    for p in &projected.positions {
        assert!((norm(*p) - 1.0).abs() < 1e-12);
    }
}

#[test]
fn topology_and_attributes_pass_through_unchanged() {
    let mut mesh = icosphere(2);
    mesh.topology.normals = Some(mesh.positions.clone());

    let f = RadiusFunction::compile("1 + 0.2*sin(3*theta)*cos(2*phi)").expect("compile");
    let (projected, diag) = project_mesh(&mesh, &f).expect("projection");

    assert_eq!(projected.vertex_count(), mesh.vertex_count());
    assert_eq!(projected.topology, mesh.topology);
    assert_eq!(diag.vertex_count, mesh.vertex_count());
    assert_eq!(diag.polygon_count, mesh.polygon_count());
    projected.validate().expect("valid output");
}

#[test]
fn field_equal_to_original_radius_reproduces_the_mesh() {
    let mesh = lumpy_sphere();
    // Look the original radius up by direction; every vertex of the lumpy
    // sphere has a distinct direction.
    let samples: Vec<SphericalCoord> = mesh
        .positions
        .iter()
        .map(|p| SphericalCoord::from_cartesian(Point3::from_array(*p)).unwrap())
        .collect();
    let field = |theta: f64, phi: f64| {
        samples
            .iter()
            .find(|c| (c.theta - theta).abs() < 1e-15 && (c.phi - phi).abs() < 1e-15)
            .map_or(f64::NAN, |c| c.r)
    };

    let (projected, _) = project_mesh(&mesh, &field).expect("projection");
    for (input, output) in mesh.positions.iter().zip(&projected.positions) {
        let distance = Point3::from_array(*input).distance_to(Point3::from_array(*output));
        assert!(distance < 1e-12, "moved by {distance}");
    }
}

#[test]
fn projection_is_deterministic() {
    let mesh = icosphere(3);
    let f = RadiusFunction::compile("1 + 0.1*cos(4*phi) + 0.05*sin(5*theta)").expect("compile");

    let (a, _) = project_mesh(&mesh, &f).expect("projection");
    let (b, _) = project_mesh(&mesh, &f).expect("projection");

    for (pa, pb) in a.positions.iter().zip(&b.positions) {
        for axis in 0..3 {
            assert_eq!(pa[axis].to_bits(), pb[axis].to_bits());
        }
    }
}

#[test]
fn fourfold_azimuthal_equation_keeps_quarter_turn_symmetry() {
    let mesh = octasphere(3);
    let f = RadiusFunction::compile("1+0.1*cos(4*phi)").expect("compile");
    let (projected, _) = project_mesh(&mesh, &f).expect("projection");

    let find_vertex = |target: Vec3| {
        mesh.positions
            .iter()
            .position(|p| (Vec3::from_array(*p) - target).length() < 1e-9)
    };

    let mut checked = 0;
    for (i, p) in mesh.positions.iter().enumerate() {
        let rotated = Vec3::from_array(*p).rotate_z(FRAC_PI_2);
        let j = find_vertex(rotated).expect("octasphere is quarter-turn symmetric");
        let expected = Vec3::from_array(projected.positions[i]).rotate_z(FRAC_PI_2);
        let actual = Vec3::from_array(projected.positions[j]);
        assert!(
            (expected - actual).length() < 1e-9,
            "vertex {i} -> {j}: {expected:?} vs {actual:?}"
        );
        checked += 1;
    }
    assert_eq!(checked, mesh.vertex_count());
}

#[test]
fn vertex_at_origin_is_a_singularity() {
    let mut mesh = icosphere(0);
    mesh.positions[5] = [0.0, 0.0, 0.0];

    let f = RadiusFunction::compile("1").expect("compile");
    let error = project_mesh(&mesh, &f).unwrap_err();
    assert_eq!(error, ProjectionError::Singularity { index: 5 });
}

#[test]
fn non_finite_vertex_is_rejected() {
    let mut mesh = icosphere(0);
    mesh.positions[2] = [f64::NAN, 0.0, 1.0];

    let f = RadiusFunction::compile("1").expect("compile");
    let error = project_mesh(&mesh, &f).unwrap_err();
    assert_eq!(error, ProjectionError::InvalidGeometry { index: 2 });
}

#[test]
fn non_finite_radius_is_an_error_not_nan_output() {
    let mesh = SurfaceMesh::new(
        vec![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        vec![vec![0, 1, 2]],
    );
    // log(theta) is -inf at the north pole.
    let f = RadiusFunction::compile("log(theta)").expect("compile");
    let error = project_mesh(&mesh, &f).unwrap_err();
    assert!(matches!(error, ProjectionError::NonFiniteRadius { index: 0, .. }), "{error:?}");
}

#[test]
fn negative_radius_is_reflected_and_counted() {
    let mesh = icosphere(0);
    let f = RadiusFunction::compile("-1").expect("compile");
    let (projected, diag) = project_mesh(&mesh, &f).expect("projection");

    assert_eq!(diag.negative_radius_count, mesh.vertex_count());
    assert_eq!(diag.warnings.len(), 1);
    for (input, output) in mesh.positions.iter().zip(&projected.positions) {
        let sum = Vec3::from_array(*input) + Vec3::from_array(*output);
        assert!(sum.length() < 1e-12);
    }
}

#[test]
fn empty_mesh_is_rejected() {
    let f = RadiusFunction::compile("1").expect("compile");
    let error = project_mesh(&SurfaceMesh::default(), &f).unwrap_err();
    assert_eq!(error, ProjectionError::EmptyMesh);
}
