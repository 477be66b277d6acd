//! Radial projection of a mesh onto a surface `r = f(theta, phi)`.
//!
//! Every vertex keeps its direction from the origin and gets a new distance:
//!
//! 1. convert the vertex to `(r, theta, phi)`;
//! 2. drop `r` and evaluate `rho = f(theta, phi)`;
//! 3. convert `(rho, theta, phi)` back to Cartesian.
//!
//! The map is per-vertex and pure, so the output has the same vertex count and
//! order as the input, and polygons, normals and appearance are copied through
//! untouched. With the `parallel` feature the map runs on rayon; results are
//! identical to the serial path.
//!
//! # Example
//!
//! ```ignore
//! use parmodel_surface::equation::RadiusFunction;
//! use parmodel_surface::geom::{icosphere, project_mesh};
//!
//! let f = RadiusFunction::compile("1 + 0.1*cos(4*phi)")?;
//! let (mesh, diag) = project_mesh(&icosphere(2), &f)?;
//! ```

use thiserror::Error;

use super::mesh::SurfaceMesh;
use super::spherical::SphericalCoord;
use super::Point3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A scalar radius over the sphere of directions.
///
/// `Sync` because the projector may evaluate it from several threads.
pub trait RadialField: Sync {
    fn radius(&self, theta: f64, phi: f64) -> f64;
}

impl<F> RadialField for F
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    fn radius(&self, theta: f64, phi: f64) -> f64 {
        self(theta, phi)
    }
}

// ============================================================================
// Error types
// ============================================================================

/// Errors that abort the projection of one mesh.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    /// The input mesh has no vertices.
    #[error("input mesh has no vertices")]
    EmptyMesh,

    /// A vertex has NaN/Inf coordinates.
    #[error("vertex {index} has non-finite coordinates")]
    InvalidGeometry { index: usize },

    /// A vertex sits exactly at the origin, where the polar angle is undefined.
    #[error("vertex {index} lies at the origin; its polar angle is undefined")]
    Singularity { index: usize },

    /// The radius function produced NaN/Inf.
    #[error("radius function returned {value} at vertex {index} (theta={theta}, phi={phi})")]
    NonFiniteRadius {
        index: usize,
        theta: f64,
        phi: f64,
        value: f64,
    },
}

// ============================================================================
// Diagnostics
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionDiagnostics {
    pub vertex_count: usize,
    pub polygon_count: usize,
    /// Smallest radius produced by the field.
    pub min_radius: f64,
    /// Largest radius produced by the field.
    pub max_radius: f64,
    pub mean_radius: f64,
    /// Vertices whose radius came out negative (reflected through the origin).
    pub negative_radius_count: usize,
    pub warnings: Vec<String>,
}

impl ProjectionDiagnostics {
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "vertices={} polygons={} radius=[{:.6}, {:.6}] mean={:.6} negative={}",
            self.vertex_count,
            self.polygon_count,
            self.min_radius,
            self.max_radius,
            self.mean_radius,
            self.negative_radius_count
        )
    }
}

// ============================================================================
// Projection
// ============================================================================

/// Moves every vertex of `mesh` onto the surface `r = field(theta, phi)`.
///
/// # Errors
/// Fails on an empty mesh, a non-finite vertex, a vertex at the origin, or a
/// non-finite radius. The whole mesh fails; no partial output is returned.
pub fn project_mesh(
    mesh: &SurfaceMesh,
    field: &impl RadialField,
) -> Result<(SurfaceMesh, ProjectionDiagnostics), ProjectionError> {
    if mesh.positions.is_empty() {
        return Err(ProjectionError::EmptyMesh);
    }

    let projected = project_positions(&mesh.positions, field)?;
    let diagnostics = diagnose(mesh, &projected);

    let positions = projected.into_iter().map(|(position, _)| position).collect();
    Ok((mesh.with_positions(positions), diagnostics))
}

/// Projects a single point. Returns the new position and the radius used.
///
/// # Errors
/// See [`project_mesh`]; `index` is only used for error reporting.
pub fn project_point(
    index: usize,
    position: [f64; 3],
    field: &impl RadialField,
) -> Result<([f64; 3], f64), ProjectionError> {
    let point = Point3::from_array(position);
    if !point.is_finite() {
        return Err(ProjectionError::InvalidGeometry { index });
    }
    let coord =
        SphericalCoord::from_cartesian(point).ok_or(ProjectionError::Singularity { index })?;

    let rho = field.radius(coord.theta, coord.phi);
    if !rho.is_finite() {
        return Err(ProjectionError::NonFiniteRadius {
            index,
            theta: coord.theta,
            phi: coord.phi,
            value: rho,
        });
    }

    Ok((coord.with_radius(rho).to_cartesian().to_array(), rho))
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallel")] {
        fn project_positions(
            positions: &[[f64; 3]],
            field: &impl RadialField,
        ) -> Result<Vec<([f64; 3], f64)>, ProjectionError> {
            positions
                .par_iter()
                .enumerate()
                .map(|(index, position)| project_point(index, *position, field))
                .collect()
        }
    } else {
        fn project_positions(
            positions: &[[f64; 3]],
            field: &impl RadialField,
        ) -> Result<Vec<([f64; 3], f64)>, ProjectionError> {
            positions
                .iter()
                .enumerate()
                .map(|(index, position)| project_point(index, *position, field))
                .collect()
        }
    }
}

fn diagnose(mesh: &SurfaceMesh, projected: &[([f64; 3], f64)]) -> ProjectionDiagnostics {
    let mut min_radius = f64::INFINITY;
    let mut max_radius = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut negative_radius_count = 0;

    for &(_, rho) in projected {
        min_radius = min_radius.min(rho);
        max_radius = max_radius.max(rho);
        sum += rho;
        if rho < 0.0 {
            negative_radius_count += 1;
        }
    }

    let mut warnings = Vec::new();
    if negative_radius_count > 0 {
        let message = format!(
            "{negative_radius_count} vertices received a negative radius and were reflected through the origin"
        );
        log::warn!("{message}");
        warnings.push(message);
    }

    #[allow(clippy::cast_precision_loss)]
    let mean_radius = sum / projected.len() as f64;

    ProjectionDiagnostics {
        vertex_count: projected.len(),
        polygon_count: mesh.polygon_count(),
        min_radius,
        max_radius,
        mean_radius,
        negative_radius_count,
        warnings,
    }
}
