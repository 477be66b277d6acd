//! MNI/BIC ASCII polygon objects.
//!
//! Layout, whitespace-separated:
//!
//! ```text
//! P <ambient> <diffuse> <specular> <exponent> <opacity> <n_points>
//! <x y z> * n_points
//! <nx ny nz> * n_points
//! <n_items>
//! <colour_flag> <r g b a> * (1 | n_items | n_points)
//! <end_index> * n_items
//! <index> * end_index[n_items - 1]
//! ```

use std::io::Write;

use super::{FormatError, Tokens};
use crate::geom::{Appearance, Colours, SurfaceMesh, Topology};

const INDICES_PER_LINE: usize = 8;

/// Parses an ASCII MNI polygon object.
///
/// # Errors
/// Returns a [`FormatError`] for truncated data, malformed numbers, unknown
/// colour flags, and inconsistent index tables.
pub fn parse_mni(text: &str) -> Result<SurfaceMesh, FormatError> {
    let mut tokens = Tokens::new(text);
    // Header counts are untrusted. No more values than this fit in `text`.
    let max_values = text.len() / 2 + 1;

    let tag = tokens.next_token("object type")?;
    if tag != "P" {
        return Err(FormatError::Unsupported(format!(
            "MNI object type `{tag}` (only polygon objects are supported)"
        )));
    }

    let mut surface_properties = [0.0; 5];
    for value in &mut surface_properties {
        *value = tokens.next_f64("surface properties")?;
    }

    let n_points = tokens.next_usize("point count")?;
    let positions = read_triples(&mut tokens, n_points, max_values, "point coordinates")?;
    let normals = read_triples(&mut tokens, n_points, max_values, "normals")?;

    let n_items = tokens.next_usize("polygon count")?;
    let colour_flag = tokens.next_usize("colour flag")?;
    let colours = match colour_flag {
        0 => Colours::One(read_colour(&mut tokens)?),
        1 => Colours::PerItem(read_colours(&mut tokens, n_items)?),
        2 => Colours::PerVertex(read_colours(&mut tokens, n_points)?),
        other => {
            return Err(FormatError::Unsupported(format!("colour flag {other}")));
        }
    };

    let mut end_indices = Vec::with_capacity(n_items.min(max_values));
    for _ in 0..n_items {
        end_indices.push(tokens.next_usize("end indices")?);
    }

    let index_count = end_indices.last().copied().unwrap_or(0);
    let mut indices = Vec::with_capacity(index_count.min(max_values));
    for _ in 0..index_count {
        let index = tokens.next_usize("polygon indices")?;
        let index = u32::try_from(index).map_err(|_| {
            FormatError::InvalidMesh(format!("index {index} does not fit in 32 bits"))
        })?;
        indices.push(index);
    }

    let mut polygons = Vec::with_capacity(end_indices.len());
    let mut start = 0;
    for &end in &end_indices {
        if end < start || end > indices.len() {
            return Err(FormatError::InvalidMesh(format!(
                "end index {end} is out of order or past {} indices",
                indices.len()
            )));
        }
        polygons.push(indices[start..end].to_vec());
        start = end;
    }

    let mesh = SurfaceMesh {
        positions,
        topology: Topology {
            polygons,
            normals: Some(normals),
            appearance: Some(Appearance {
                surface_properties,
                colours,
            }),
        },
    };
    mesh.validate().map_err(FormatError::InvalidMesh)?;
    Ok(mesh)
}

/// Writes `mesh` as an ASCII MNI polygon object.
///
/// Meshes without stored normals get zero normals; meshes without appearance
/// get [`Appearance::default`].
///
/// # Errors
/// Propagates write failures from `w`.
pub fn write_mni(mesh: &SurfaceMesh, w: &mut impl Write) -> std::io::Result<()> {
    let appearance = mesh.topology.appearance.clone().unwrap_or_default();
    let [ambient, diffuse, specular, exponent, opacity] = appearance.surface_properties;

    writeln!(
        w,
        "P {ambient} {diffuse} {specular} {exponent} {opacity} {}",
        mesh.vertex_count()
    )?;
    for p in &mesh.positions {
        writeln!(w, " {} {} {}", p[0], p[1], p[2])?;
    }
    writeln!(w)?;

    match mesh.topology.normals.as_deref() {
        Some(normals) => {
            for n in normals {
                writeln!(w, " {} {} {}", n[0], n[1], n[2])?;
            }
        }
        None => {
            for _ in &mesh.positions {
                writeln!(w, " 0 0 0")?;
            }
        }
    }
    writeln!(w)?;

    writeln!(w, " {}", mesh.polygon_count())?;
    write!(w, " {}", appearance.colours.flag())?;
    for [r, g, b, a] in appearance.colours.as_slice() {
        write!(w, " {r} {g} {b} {a}")?;
    }
    writeln!(w)?;
    writeln!(w)?;

    let mut end = 0;
    let end_indices: Vec<usize> = mesh
        .topology
        .polygons
        .iter()
        .map(|polygon| {
            end += polygon.len();
            end
        })
        .collect();
    write_wrapped(w, end_indices.iter())?;
    writeln!(w)?;
    write_wrapped(w, mesh.topology.polygons.iter().flatten())?;
    Ok(())
}

fn write_wrapped<T: std::fmt::Display>(
    w: &mut impl Write,
    values: impl Iterator<Item = T>,
) -> std::io::Result<()> {
    let mut column = 0;
    for value in values {
        write!(w, " {value}")?;
        column += 1;
        if column == INDICES_PER_LINE {
            writeln!(w)?;
            column = 0;
        }
    }
    if column > 0 {
        writeln!(w)?;
    }
    Ok(())
}

fn read_triples(
    tokens: &mut Tokens<'_>,
    count: usize,
    max_values: usize,
    what: &'static str,
) -> Result<Vec<[f64; 3]>, FormatError> {
    let mut out = Vec::with_capacity(count.min(max_values / 3));
    for _ in 0..count {
        out.push([tokens.next_f64(what)?, tokens.next_f64(what)?, tokens.next_f64(what)?]);
    }
    Ok(out)
}

fn read_colour(tokens: &mut Tokens<'_>) -> Result<[f64; 4], FormatError> {
    let mut colour = [0.0; 4];
    for channel in &mut colour {
        *channel = tokens.next_f64("colours")?;
    }
    Ok(colour)
}

fn read_colours(tokens: &mut Tokens<'_>, count: usize) -> Result<Vec<[f64; 4]>, FormatError> {
    (0..count).map(|_| read_colour(tokens)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TETRAHEDRON: &str = "P 0.3 0.3 0.4 10 1 4
 1 1 1
 1 -1 -1
 -1 1 -1
 -1 -1 1

 0.577 0.577 0.577
 0.577 -0.577 -0.577
 -0.577 0.577 -0.577
 -0.577 -0.577 0.577

 4
 0 1 1 1 1

 3 6 9 12

 0 1 2 0 3 1 0 2 3 1 3 2
";

    #[test]
    fn parses_tetrahedron() {
        let mesh = parse_mni(TETRAHEDRON).expect("parse");
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.polygon_count(), 4);
        assert_eq!(mesh.positions[3], [-1.0, -1.0, 1.0]);
        assert_eq!(mesh.topology.polygons[1], vec![0, 3, 1]);

        let normals = mesh.topology.normals.as_ref().expect("normals");
        assert_eq!(normals[0], [0.577, 0.577, 0.577]);

        let appearance = mesh.topology.appearance.as_ref().expect("appearance");
        assert_eq!(appearance.surface_properties, [0.3, 0.3, 0.4, 10.0, 1.0]);
        assert_eq!(appearance.colours, Colours::One([1.0, 1.0, 1.0, 1.0]));
    }

    #[test]
    fn written_object_parses_back_identically() {
        let mesh = parse_mni(TETRAHEDRON).expect("parse");
        let mut buffer = Vec::new();
        write_mni(&mesh, &mut buffer).expect("write");
        let text = String::from_utf8(buffer).expect("utf8");

        assert!(text.starts_with("P 0.3 0.3 0.4 10 1 4\n"));
        assert_eq!(parse_mni(&text).expect("reparse"), mesh);
    }

    #[test]
    fn per_vertex_colours_are_read() {
        let text = "P 0.3 0.3 0.4 10 1 3
 1 0 0  0 1 0  0 0 1
 1 0 0  0 1 0  0 0 1
 1
 2 1 0 0 1  0 1 0 1  0 0 1 1
 3
 0 1 2";
        let mesh = parse_mni(text).expect("parse");
        let appearance = mesh.topology.appearance.expect("appearance");
        assert!(matches!(appearance.colours, Colours::PerVertex(ref c) if c.len() == 3));
    }

    #[test]
    fn truncated_data_is_reported() {
        let text = "P 0.3 0.3 0.4 10 1 4\n 1 1 1\n 1 -1";
        let error = parse_mni(text).unwrap_err();
        assert_eq!(error, FormatError::UnexpectedEof("point coordinates"));
    }

    #[test]
    fn absurd_header_counts_fail_without_allocating() {
        for header in [
            "P 0.3 0.3 0.4 10 1 1000000000000000000\n 1 0 0\n",
            "P 0.3 0.3 0.4 10 1 100000000000000\n 1 0 0\n",
        ] {
            let error = parse_mni(header).unwrap_err();
            assert_eq!(error, FormatError::UnexpectedEof("point coordinates"));
        }

        let huge_items =
            TETRAHEDRON.replace("\n 4\n 0 1 1 1 1", "\n 100000000000000\n 0 1 1 1 1");
        assert!(matches!(parse_mni(&huge_items), Err(FormatError::UnexpectedEof(_))));

        let huge_end = TETRAHEDRON.replace(" 3 6 9 12", " 3 6 9 1000000000000000");
        assert_eq!(
            parse_mni(&huge_end).unwrap_err(),
            FormatError::UnexpectedEof("polygon indices")
        );
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let text = TETRAHEDRON.replace(" 0 1 2 0 3 1", " 0 1 7 0 3 1");
        let error = parse_mni(&text).unwrap_err();
        assert!(matches!(error, FormatError::InvalidMesh(_)), "{error:?}");
    }

    #[test]
    fn unknown_colour_flag_is_unsupported() {
        let text = TETRAHEDRON.replace(" 0 1 1 1 1", " 5 1 1 1 1");
        assert!(matches!(parse_mni(&text), Err(FormatError::Unsupported(_))));
    }
}
