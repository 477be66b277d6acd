//! Reading and writing surface meshes.
//!
//! Two text formats share the `.obj` extension in this domain: MNI/BIC polygon
//! objects (as produced by CIVET and friends) and Wavefront OBJ. [`ObjStore`]
//! sniffs the content on load and writes a mesh back in the format it came
//! from.

mod mni;
mod wavefront;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::geom::SurfaceMesh;

pub use mni::{parse_mni, write_mni};
pub use wavefront::{parse_wavefront, write_wavefront};

/// Content-level problems, independent of where the text came from.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormatError {
    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: String },
    #[error("unexpected end of data while reading {0}")]
    UnexpectedEof(&'static str),
    #[error("expected a number for {what}, found `{token}`")]
    InvalidNumber { what: &'static str, token: String },
    #[error("unsupported content: {0}")]
    Unsupported(String),
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
}

#[derive(Debug, Error)]
pub enum MeshIoError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not read mesh {}: {source}", .path.display())]
    Format { path: PathBuf, source: FormatError },
}

/// Load/save collaborator used by the pipeline.
pub trait MeshStore {
    /// # Errors
    /// Returns [`MeshIoError`] when the file cannot be read or parsed.
    fn load(&self, path: &Path) -> Result<SurfaceMesh, MeshIoError>;

    /// # Errors
    /// Returns [`MeshIoError`] when the file cannot be written.
    fn save(&self, mesh: &SurfaceMesh, path: &Path) -> Result<(), MeshIoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFormat {
    /// MNI/BIC ASCII polygon object (`P` header).
    Mni,
    Wavefront,
}

impl SurfaceFormat {
    /// Detects the format from the first non-blank token.
    #[must_use]
    pub fn sniff(text: &str) -> Self {
        match text.split_whitespace().next() {
            Some("P") => Self::Mni,
            _ => Self::Wavefront,
        }
    }

    /// The format a mesh should be written in: MNI when it carries MNI
    /// appearance data.
    #[must_use]
    pub fn of(mesh: &SurfaceMesh) -> Self {
        if mesh.topology.appearance.is_some() {
            Self::Mni
        } else {
            Self::Wavefront
        }
    }

    /// # Errors
    /// Returns a [`FormatError`] describing the first problem in `text`.
    pub fn parse(self, text: &str) -> Result<SurfaceMesh, FormatError> {
        match self {
            Self::Mni => parse_mni(text),
            Self::Wavefront => parse_wavefront(text),
        }
    }

    /// # Errors
    /// Propagates write failures from `w`.
    pub fn write(self, mesh: &SurfaceMesh, w: &mut impl Write) -> std::io::Result<()> {
        match self {
            Self::Mni => write_mni(mesh, w),
            Self::Wavefront => write_wavefront(mesh, w),
        }
    }
}

/// Filesystem store for `.obj` surfaces in either format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjStore;

impl MeshStore for ObjStore {
    fn load(&self, path: &Path) -> Result<SurfaceMesh, MeshIoError> {
        let io_error = |source| MeshIoError::Io {
            path: path.to_path_buf(),
            source,
        };
        let format_error = |source| MeshIoError::Format {
            path: path.to_path_buf(),
            source,
        };

        let bytes = fs::read(path).map_err(io_error)?;
        if bytes.first() == Some(&b'p') {
            return Err(format_error(FormatError::Unsupported(
                "binary MNI polygon objects".to_string(),
            )));
        }
        let text = String::from_utf8(bytes).map_err(|_| {
            format_error(FormatError::Unsupported("file is not UTF-8 text".to_string()))
        })?;

        let format = SurfaceFormat::sniff(&text);
        let mesh = format.parse(&text).map_err(format_error)?;
        log::debug!(
            "loaded {} ({format:?}): vertices={} polygons={}",
            path.display(),
            mesh.vertex_count(),
            mesh.polygon_count()
        );
        Ok(mesh)
    }

    fn save(&self, mesh: &SurfaceMesh, path: &Path) -> Result<(), MeshIoError> {
        let io_error = |source| MeshIoError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let file = File::create(path).map_err(io_error)?;
        let mut w = BufWriter::new(file);
        let format = SurfaceFormat::of(mesh);
        format.write(mesh, &mut w).map_err(io_error)?;
        w.flush().map_err(io_error)?;

        log::debug!("wrote {} ({format:?})", path.display());
        Ok(())
    }
}

/// Whitespace token reader shared by the parsers.
struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
        }
    }

    fn next_token(&mut self, what: &'static str) -> Result<&'a str, FormatError> {
        self.inner.next().ok_or(FormatError::UnexpectedEof(what))
    }

    fn next_f64(&mut self, what: &'static str) -> Result<f64, FormatError> {
        let token = self.next_token(what)?;
        parse_number(token, what)
    }

    fn next_usize(&mut self, what: &'static str) -> Result<usize, FormatError> {
        let token = self.next_token(what)?;
        parse_number(token, what)
    }
}

fn parse_number<T: std::str::FromStr>(token: &str, what: &'static str) -> Result<T, FormatError> {
    token.parse().map_err(|_| FormatError::InvalidNumber {
        what,
        token: token.to_owned(),
    })
}
