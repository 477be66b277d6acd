//! Input discovery: glob matching under the input directory and the mirrored
//! output paths.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;
use wildmatch::WildMatch;

/// One input file and the output path it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("cannot read input directory {}: {source}", .path.display())]
    InputDirectory {
        path: PathBuf,
        source: walkdir::Error,
    },
}

#[derive(Debug)]
enum Segment {
    AnyDepth,
    Name(WildMatch),
}

/// Glob over `/`-separated relative paths.
///
/// `*` and `?` stay within one path segment; a `**` segment matches zero or
/// more whole directories, so `**/*.obj` also matches `lh.obj` at the top.
#[derive(Debug)]
pub struct GlobPattern {
    segments: Vec<Segment>,
}

impl GlobPattern {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .map(|segment| match segment {
                "**" => Segment::AnyDepth,
                name => Segment::Name(WildMatch::new(name)),
            })
            .collect();
        Self { segments }
    }

    #[must_use]
    pub fn matches(&self, relative: &Path) -> bool {
        let names: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        match_segments(&self.segments, &names)
    }
}

fn match_segments(segments: &[Segment], names: &[&str]) -> bool {
    match segments.split_first() {
        None => names.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=names.len()).any(|skip| match_segments(rest, &names[skip..]))
        }
        Some((Segment::Name(pattern), rest)) => names
            .split_first()
            .is_some_and(|(head, tail)| pattern.matches(head) && match_segments(rest, tail)),
    }
}

/// Walks `input_dir` for files matching `pattern` and pairs each with the same
/// relative path under `output_dir`. Results are sorted by input path.
///
/// Unreadable entries below the root are skipped with a warning.
///
/// # Errors
/// Returns [`DiscoveryError`] if `input_dir` itself cannot be read.
pub fn discover_pairs(
    input_dir: &Path,
    output_dir: &Path,
    pattern: &str,
) -> Result<Vec<PathPair>, DiscoveryError> {
    let glob = GlobPattern::new(pattern);
    let mut pairs = Vec::new();

    for entry in WalkDir::new(input_dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(DiscoveryError::InputDirectory {
                    path: input_dir.to_path_buf(),
                    source,
                });
            }
            Err(error) => {
                log::warn!("skipping unreadable entry: {error}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(input_dir) else {
            continue;
        };
        if glob.matches(relative) {
            pairs.push(PathPair {
                input: entry.path().to_path_buf(),
                output: output_dir.join(relative),
            });
        }
    }

    pairs.sort_by(|a, b| a.input.cmp(&b.input));
    log::debug!(
        "discovered {} file(s) matching `{pattern}` under {}",
        pairs.len(),
        input_dir.display()
    );
    Ok(pairs)
}

/// First `*.mnc` volume directly inside `dir`, by file name.
#[must_use]
pub fn find_volume(dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .find(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("mnc")))
}
