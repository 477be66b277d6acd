//! Unit-sphere meshes used as projection bases and in tests.
//!
//! Both start from a regular polyhedron and split every triangle into four
//! per subdivision level, pushing new vertices onto the unit sphere. Shared
//! edge midpoints are cached so the result stays watertight.

use std::collections::HashMap;

use super::mesh::SurfaceMesh;
use super::Vec3;

/// Icosahedron-based sphere: 12 vertices at level 0, `10 * 4^n + 2` in general.
#[must_use]
pub fn icosphere(subdivisions: usize) -> SurfaceMesh {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let corners = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ];
    let faces = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    subdivided_sphere(&corners, &faces, subdivisions)
}

/// Octahedron-based sphere: 6 vertices at level 0.
///
/// Symmetric under 90° rotations about every coordinate axis, which makes it
/// handy for checking azimuthal symmetry of projected surfaces.
#[must_use]
pub fn octasphere(subdivisions: usize) -> SurfaceMesh {
    let corners = [
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
    ];
    let faces = [
        [4, 0, 1],
        [4, 1, 2],
        [4, 2, 3],
        [4, 3, 0],
        [5, 1, 0],
        [5, 2, 1],
        [5, 3, 2],
        [5, 0, 3],
    ];
    subdivided_sphere(&corners, &faces, subdivisions)
}

fn subdivided_sphere(corners: &[[f64; 3]], faces: &[[u32; 3]], subdivisions: usize) -> SurfaceMesh {
    let mut positions: Vec<Vec3> = corners
        .iter()
        .map(|&c| on_unit_sphere(Vec3::from_array(c)))
        .collect();
    let mut triangles: Vec<[u32; 3]> = faces.to_vec();

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut next = Vec::with_capacity(triangles.len() * 4);
        for &[a, b, c] in &triangles {
            let ab = midpoint(&mut positions, &mut midpoints, a, b);
            let bc = midpoint(&mut positions, &mut midpoints, b, c);
            let ca = midpoint(&mut positions, &mut midpoints, c, a);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        triangles = next;
    }

    SurfaceMesh::new(
        positions.into_iter().map(Vec3::to_array).collect(),
        triangles.into_iter().map(|tri| tri.to_vec()).collect(),
    )
}

fn midpoint(
    positions: &mut Vec<Vec3>,
    cache: &mut HashMap<(u32, u32), u32>,
    a: u32,
    b: u32,
) -> u32 {
    let key = if a < b { (a, b) } else { (b, a) };
    *cache.entry(key).or_insert_with(|| {
        let mid = (positions[a as usize] + positions[b as usize]) * 0.5;
        positions.push(on_unit_sphere(mid));
        u32::try_from(positions.len() - 1).unwrap_or(u32::MAX)
    })
}

fn on_unit_sphere(v: Vec3) -> Vec3 {
    // Polyhedron corners and edge midpoints are never at the origin.
    v.normalized().unwrap_or(Vec3::Z)
}
