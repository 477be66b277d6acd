mod core;
mod mesh;
mod primitives;
mod projection;
mod spherical;

pub use self::core::{Point3, Vec3};
pub use mesh::{Appearance, Colours, SurfaceMesh, Topology};
pub use primitives::{icosphere, octasphere};
pub use projection::{
    ProjectionDiagnostics, ProjectionError, RadialField, project_mesh, project_point,
};
pub use spherical::{SphericalCoord, cartesian_to_spherical, spherical_to_cartesian};

#[cfg(test)]
mod tests;
