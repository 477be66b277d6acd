//! Wavefront OBJ: `v`, `vn` and `f` records. Everything else is skipped.

use std::io::Write;

use super::{FormatError, parse_number};
use crate::geom::{SurfaceMesh, Topology};

/// Parses Wavefront OBJ text.
///
/// Face corners may use any of the `v`, `v/vt`, `v//vn`, `v/vt/vn` forms and
/// negative (relative) indices. Normals are kept only when there is exactly one
/// per vertex, which is how per-vertex normals are usually written.
///
/// # Errors
/// Returns a [`FormatError`] with the offending line number.
pub fn parse_wavefront(text: &str) -> Result<SurfaceMesh, FormatError> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut polygons = Vec::new();

    for (number, raw) in text.lines().enumerate() {
        let line = number + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        let mut fields = content.split_whitespace();
        let Some(record) = fields.next() else {
            continue;
        };

        match record {
            "v" => positions.push(read_vector(&mut fields, line, "vertex position")?),
            "vn" => normals.push(read_vector(&mut fields, line, "vertex normal")?),
            "f" => {
                let polygon = fields
                    .map(|corner| resolve_corner(corner, positions.len(), line))
                    .collect::<Result<Vec<u32>, _>>()?;
                if polygon.len() < 3 {
                    return Err(FormatError::Syntax {
                        line,
                        reason: format!("face has {} corners, need at least 3", polygon.len()),
                    });
                }
                polygons.push(polygon);
            }
            _ => {}
        }
    }

    let normals = if normals.len() == positions.len() && !normals.is_empty() {
        Some(normals)
    } else {
        if !normals.is_empty() {
            log::debug!(
                "dropping {} normals that do not map one-to-one onto {} vertices",
                normals.len(),
                positions.len()
            );
        }
        None
    };

    let mesh = SurfaceMesh {
        positions,
        topology: Topology {
            polygons,
            normals,
            appearance: None,
        },
    };
    mesh.validate().map_err(FormatError::InvalidMesh)?;
    Ok(mesh)
}

/// Writes `mesh` as Wavefront OBJ with 1-based indices.
///
/// # Errors
/// Propagates write failures from `w`.
pub fn write_wavefront(mesh: &SurfaceMesh, w: &mut impl Write) -> std::io::Result<()> {
    writeln!(w, "# parmodel-surface")?;
    for p in &mesh.positions {
        writeln!(w, "v {} {} {}", p[0], p[1], p[2])?;
    }

    let has_normals = match mesh.topology.normals.as_deref() {
        Some(normals) => {
            for n in normals {
                writeln!(w, "vn {} {} {}", n[0], n[1], n[2])?;
            }
            true
        }
        None => false,
    };

    for polygon in &mesh.topology.polygons {
        write!(w, "f")?;
        for &index in polygon {
            let i = u64::from(index) + 1;
            if has_normals {
                write!(w, " {i}//{i}")?;
            } else {
                write!(w, " {i}")?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

fn read_vector<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line: usize,
    what: &'static str,
) -> Result<[f64; 3], FormatError> {
    let mut out = [0.0; 3];
    for value in &mut out {
        let token = fields.next().ok_or_else(|| FormatError::Syntax {
            line,
            reason: format!("{what} needs three coordinates"),
        })?;
        *value = parse_number(token, what)?;
    }
    Ok(out)
}

fn resolve_corner(corner: &str, vertex_count: usize, line: usize) -> Result<u32, FormatError> {
    let head = corner.split('/').next().unwrap_or(corner);
    let raw: i64 = parse_number(head, "face index")?;

    #[allow(clippy::cast_possible_wrap)]
    let count = vertex_count as i64;
    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r - 1),
        r => Some(count + r),
    };

    resolved
        .filter(|&index| (0..count).contains(&index))
        .and_then(|index| u32::try_from(index).ok())
        .ok_or_else(|| FormatError::Syntax {
            line,
            reason: format!("face index {raw} does not refer to a vertex defined above"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vertices_faces_and_skips_other_records() {
        let text = "# a quad split in two
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
s off
f 1 2 3
f 1/1 3/1 4/1
";
        let mesh = parse_wavefront(text).expect("parse");
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.topology.polygons, vec![vec![0, 1, 2], vec![0, 2, 3]]);
        assert!(mesh.topology.normals.is_none());
        assert!(mesh.topology.appearance.is_none());
    }

    #[test]
    fn resolves_relative_indices_and_normals() {
        let text = "v 0 0 1
v 1 0 0
v 0 1 0
vn 0 0 1
vn 1 0 0
vn 0 1 0
f -3//-3 -2//-2 -1//-1
";
        let mesh = parse_wavefront(text).expect("parse");
        assert_eq!(mesh.topology.polygons, vec![vec![0, 1, 2]]);
        assert_eq!(mesh.topology.normals.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn forward_references_are_rejected_with_line_number() {
        let text = "v 0 0 0\nv 1 0 0\nf 1 2 3\nv 0 1 0\n";
        let error = parse_wavefront(text).unwrap_err();
        assert!(matches!(error, FormatError::Syntax { line: 3, .. }), "{error:?}");
    }

    #[test]
    fn malformed_coordinates_are_reported() {
        let error = parse_wavefront("v 0 zero 0\n").unwrap_err();
        assert_eq!(
            error,
            FormatError::InvalidNumber {
                what: "vertex position",
                token: "zero".to_owned(),
            }
        );
    }

    #[test]
    fn writes_normals_with_shared_indices() {
        let text = "v 0 0 1\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvn 1 0 0\nvn 0 1 0\nf 1//1 2//2 3//3\n";
        let mesh = parse_wavefront(text).expect("parse");

        let mut buffer = Vec::new();
        write_wavefront(&mesh, &mut buffer).expect("write");
        let written = String::from_utf8(buffer).expect("utf8");

        assert!(written.contains("\nf 1//1 2//2 3//3\n"));
        assert_eq!(parse_wavefront(&written).expect("reparse"), mesh);
    }
}
