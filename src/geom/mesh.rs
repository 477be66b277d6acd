/// A closed surface mesh: vertex positions plus a connectivity/attribute block
/// that geometry operations carry through without looking at it.
///
/// Vertex `i` of an operation's output always corresponds to vertex `i` of its
/// input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceMesh {
    pub positions: Vec<[f64; 3]>,
    pub topology: Topology,
}

/// Everything about a mesh except its vertex positions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Topology {
    /// Polygons as vertex index lists (triangles for sphere-topology inputs,
    /// but any polygon size is carried).
    pub polygons: Vec<Vec<u32>>,
    /// Per-vertex normals as read from the source file. Not recomputed when
    /// positions change.
    pub normals: Option<Vec<[f64; 3]>>,
    /// Rendering attributes of MNI polygon objects. `Some` marks a mesh that
    /// came from (and should be written back as) an MNI `.obj`.
    pub appearance: Option<Appearance>,
}

/// Surface properties and colours of an MNI polygon object.
#[derive(Debug, Clone, PartialEq)]
pub struct Appearance {
    /// Ambient, diffuse, specular, specular exponent, opacity.
    pub surface_properties: [f64; 5],
    pub colours: Colours,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            surface_properties: [0.3, 0.3, 0.4, 10.0, 1.0],
            colours: Colours::One([1.0, 1.0, 1.0, 1.0]),
        }
    }
}

/// RGBA colours, stored the way MNI objects flag them.
#[derive(Debug, Clone, PartialEq)]
pub enum Colours {
    One([f64; 4]),
    PerItem(Vec<[f64; 4]>),
    PerVertex(Vec<[f64; 4]>),
}

impl Colours {
    /// The MNI colour flag: 0 = one colour, 1 = per item, 2 = per vertex.
    #[must_use]
    pub const fn flag(&self) -> u32 {
        match self {
            Self::One(_) => 0,
            Self::PerItem(_) => 1,
            Self::PerVertex(_) => 2,
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[[f64; 4]] {
        match self {
            Self::One(colour) => std::slice::from_ref(colour),
            Self::PerItem(colours) | Self::PerVertex(colours) => colours,
        }
    }
}

impl SurfaceMesh {
    /// Create a mesh with positions and polygons only.
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, polygons: Vec<Vec<u32>>) -> Self {
        Self {
            positions,
            topology: Topology {
                polygons,
                normals: None,
                appearance: None,
            },
        }
    }

    /// A copy of this mesh with its vertex array substituted.
    ///
    /// The caller is responsible for keeping the vertex count; [`Self::validate`]
    /// catches a mismatch.
    #[must_use]
    pub fn with_positions(&self, positions: Vec<[f64; 3]>) -> Self {
        Self {
            positions,
            topology: self.topology.clone(),
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn polygon_count(&self) -> usize {
        self.topology.polygons.len()
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    /// Returns true if all polygon indices are within bounds.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len();
        self.topology
            .polygons
            .iter()
            .flatten()
            .all(|&i| (i as usize) < n)
    }

    /// Returns true if every per-vertex buffer matches `positions.len()`.
    #[must_use]
    pub fn has_valid_attribute_lengths(&self) -> bool {
        let n = self.positions.len();
        let normals_ok = self
            .topology
            .normals
            .as_ref()
            .is_none_or(|normals| normals.len() == n);
        let colours_ok = match self.topology.appearance.as_ref().map(|a| &a.colours) {
            Some(Colours::PerVertex(colours)) => colours.len() == n,
            Some(Colours::PerItem(colours)) => colours.len() == self.polygon_count(),
            Some(Colours::One(_)) | None => true,
        };
        normals_ok && colours_ok
    }

    /// Checks coordinates, index bounds, polygon sizes and attribute lengths.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if self.topology.polygons.iter().any(|p| p.len() < 3) {
            return Err("mesh has polygons with fewer than 3 vertices".to_string());
        }
        if !self.has_valid_attribute_lengths() {
            return Err("mesh attribute buffers do not match vertex or polygon count".to_string());
        }
        Ok(())
    }
}
