//! Batch orchestration: discovery, optional inflation, projection and
//! optional masking, one input file at a time.
//!
//! Each job walks `Discovered → Inflated → Projected → Masked → Done`, skipping
//! the stages that are not configured. A failure in any stage fails only that
//! job; the batch carries on with the next file.

mod discover;
mod tools;

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::equation::RadiusFunction;
use crate::geom::{ProjectionDiagnostics, ProjectionError, project_mesh};
use crate::io::{MeshIoError, MeshStore};

pub use discover::{DiscoveryError, GlobPattern, PathPair, discover_pairs, find_volume};
pub use tools::{
    DEFAULT_INFLATE_TOOL, DEFAULT_MASK_TOOL, ProcessRunner, ToolError, ToolInvocation,
    ToolRunner, ToolSettings,
};

pub const DEFAULT_INPUT_PATTERN: &str = "**/*.obj";
/// Environment variable naming the root of the installed MNI model data.
pub const DATAPATH_ENV: &str = "MNI_DATAPATH";
/// Template volume used for masking when none is found or given, relative to
/// [`DATAPATH_ENV`].
pub const DEFAULT_TEMPLATE: &str = "icbm152_model_09c/mni_icbm152_t1_tal_nlin_sym_09c.mnc";
pub const MASK_EXTENSION: &str = "mnc";

const INFLATED_SUFFIX: &str = "_inflated";
const PROJECTED_SUFFIX: &str = "_projected";

// ─── Configuration ──────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InflationParseError {
    #[error("expected two comma-separated parameters, found {0}")]
    WrongCount(usize),
    #[error("inflation parameter `{0}` is not a number")]
    NotNumeric(String),
}

/// The two numeric parameters forwarded to the inflation tool.
///
/// The text is kept as given so the tool sees exactly what the user typed.
#[derive(Debug, Clone, PartialEq)]
pub struct InflationParameters {
    args: [String; 2],
    values: [f64; 2],
}

impl InflationParameters {
    #[must_use]
    pub fn args(&self) -> &[String; 2] {
        &self.args
    }

    #[must_use]
    pub fn values(&self) -> [f64; 2] {
        self.values
    }
}

impl FromStr for InflationParameters {
    type Err = InflationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [first, second] = parts.as_slice() else {
            return Err(InflationParseError::WrongCount(parts.len()));
        };

        let parse = |text: &str| {
            text.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| InflationParseError::NotNumeric(text.to_string()))
        };
        let values = [parse(*first)?, parse(*second)?];

        Ok(Self {
            args: [(*first).to_string(), (*second).to_string()],
            values,
        })
    }
}

impl fmt::Display for InflationParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.args[0], self.args[1])
    }
}

/// Where the masking template comes from.
///
/// A `*.mnc` volume in the input directory wins; otherwise `fallback_template`
/// is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskSettings {
    pub fallback_template: Option<PathBuf>,
}

impl MaskSettings {
    /// Uses `explicit` when given, else `$MNI_DATAPATH/<DEFAULT_TEMPLATE>`.
    #[must_use]
    pub fn with_fallback(explicit: Option<PathBuf>) -> Self {
        let fallback_template = explicit.or_else(|| {
            std::env::var_os(DATAPATH_ENV)
                .filter(|root| !root.is_empty())
                .map(|root| PathBuf::from(root).join(DEFAULT_TEMPLATE))
        });
        Self { fallback_template }
    }

    #[must_use]
    pub fn resolve_template(&self, input_dir: &Path) -> Option<PathBuf> {
        if let Some(found) = find_volume(input_dir) {
            log::debug!("using template volume {} from the input directory", found.display());
            return Some(found);
        }
        self.fallback_template
            .as_ref()
            .filter(|path| path.is_file())
            .cloned()
    }
}

/// Everything a batch needs. Built once, then only borrowed.
#[derive(Debug)]
pub struct PipelineConfig {
    pub equation: RadiusFunction,
    pub inflation: Option<InflationParameters>,
    pub mask: Option<MaskSettings>,
    pub tools: ToolSettings,
}

impl PipelineConfig {
    #[must_use]
    pub fn new(equation: RadiusFunction) -> Self {
        Self {
            equation,
            inflation: None,
            mask: None,
            tools: ToolSettings::default(),
        }
    }
}

// ─── Jobs ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Discovered,
    Inflated,
    Projected,
    Masked,
    Done,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discovered => "discovery",
            Self::Inflated => "inflation",
            Self::Projected => "projection",
            Self::Masked => "masking",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum JobErrorKind {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Mesh(#[from] MeshIoError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("no template volume in the input directory and no usable fallback")]
    MissingTemplate,
    #[error("cannot create {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A failed job: which file, which stage was being entered, and why.
#[derive(Debug, Error)]
#[error("{}: {stage} failed: {kind}", .input.display())]
pub struct JobError {
    pub input: PathBuf,
    pub stage: JobStage,
    #[source]
    pub kind: JobErrorKind,
}

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub input: PathBuf,
    /// The projected surface.
    pub output: PathBuf,
    pub inflated: Option<PathBuf>,
    pub mask: Option<PathBuf>,
    pub diagnostics: ProjectionDiagnostics,
}

/// `dir/name.ext` → `dir/name<suffix>.ext`
#[must_use]
pub fn with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Runs one file through the configured stages.
///
/// `template` is the already-resolved masking template; it is only consulted
/// when masking is enabled.
///
/// # Errors
/// Returns a [`JobError`] naming the stage that failed.
pub fn run_job(
    config: &PipelineConfig,
    pair: &PathPair,
    template: Option<&Path>,
    store: &impl MeshStore,
    runner: &impl ToolRunner,
) -> Result<JobOutcome, JobError> {
    let fail = |stage: JobStage| {
        move |kind: JobErrorKind| JobError {
            input: pair.input.clone(),
            stage,
            kind,
        }
    };
    let input = pair.input.display();
    log::debug!("{input}: {}", JobStage::Discovered);

    let (source, output, inflated) = match &config.inflation {
        Some(parameters) => {
            let inflated = with_stem_suffix(&pair.output, INFLATED_SUFFIX);
            ensure_parent(&inflated).map_err(fail(JobStage::Inflated))?;
            let invocation = config.tools.inflate(&pair.input, &inflated, parameters);
            runner
                .run(&invocation)
                .map_err(|error| fail(JobStage::Inflated)(error.into()))?;
            log::debug!("{input}: {} -> {}", JobStage::Inflated, inflated.display());

            let projected = with_stem_suffix(&pair.output, PROJECTED_SUFFIX);
            (inflated.clone(), projected, Some(inflated))
        }
        None => (pair.input.clone(), pair.output.clone(), None),
    };

    let mesh = store
        .load(&source)
        .map_err(|error| fail(JobStage::Projected)(error.into()))?;
    let (projected, diagnostics) = project_mesh(&mesh, &config.equation)
        .map_err(|error| fail(JobStage::Projected)(error.into()))?;
    store
        .save(&projected, &output)
        .map_err(|error| fail(JobStage::Projected)(error.into()))?;
    log::debug!("{input}: {} -> {}", JobStage::Projected, output.display());

    let mask = match &config.mask {
        Some(_) => {
            let template =
                template.ok_or_else(|| fail(JobStage::Masked)(JobErrorKind::MissingTemplate))?;
            let mask = output.with_extension(MASK_EXTENSION);
            let invocation = config.tools.mask(template, &output, &mask);
            runner
                .run(&invocation)
                .map_err(|error| fail(JobStage::Masked)(error.into()))?;
            log::debug!("{input}: {} -> {}", JobStage::Masked, mask.display());
            Some(mask)
        }
        None => None,
    };

    log::info!("{input}: {}; {}", JobStage::Done, diagnostics.summary());

    Ok(JobOutcome {
        input: pair.input.clone(),
        output,
        inflated,
        mask,
        diagnostics,
    })
}

fn ensure_parent(path: &Path) -> Result<(), JobErrorKind> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| JobErrorKind::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

// ─── Batches ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: Vec<JobOutcome>,
    pub failed: Vec<JobError>,
}

impl BatchReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} file(s) processed, {} failed",
            self.completed.len() + self.failed.len(),
            self.failed.len()
        )
    }
}

/// Runs every pair in order. Failures are logged and collected; they never
/// stop the batch.
pub fn run_batch(
    config: &PipelineConfig,
    input_dir: &Path,
    pairs: &[PathPair],
    store: &impl MeshStore,
    runner: &impl ToolRunner,
) -> BatchReport {
    let template = config
        .mask
        .as_ref()
        .and_then(|mask| mask.resolve_template(input_dir));
    if config.mask.is_some() {
        match &template {
            Some(path) => log::info!("masking with template {}", path.display()),
            None => log::warn!("masking requested but no template volume is available"),
        }
    }

    let mut report = BatchReport::default();
    for pair in pairs {
        match run_job(config, pair, template.as_deref(), store, runner) {
            Ok(outcome) => report.completed.push(outcome),
            Err(error) => {
                log::error!("{error}");
                report.failed.push(error);
            }
        }
    }
    log::info!("{}", report.summary());
    report
}
