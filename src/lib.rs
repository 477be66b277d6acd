#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Parametric surface modelling: morph sphere-topology meshes so that every
//! vertex sits at the radius given by a user equation `r(theta, phi)`.

pub mod equation;
pub mod geom;
pub mod io;
pub mod pipeline;

pub use equation::{CompileError, RadiusFunction};
pub use geom::{ProjectionDiagnostics, ProjectionError, RadialField, SurfaceMesh, project_mesh};
pub use io::{MeshIoError, MeshStore, ObjStore};
pub use pipeline::{BatchReport, PipelineConfig, run_batch};
