use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use parmodel_surface::pipeline::{
    BatchReport, DEFAULT_INFLATE_TOOL, DEFAULT_INPUT_PATTERN, DEFAULT_MASK_TOOL,
    InflationParameters, MaskSettings, PipelineConfig, ProcessRunner, ToolSettings,
    discover_pairs, run_batch,
};
use parmodel_surface::{ObjStore, RadiusFunction};

/// parm - create surfaces from spherical functions
///
/// Every input surface is projected radially so that each vertex lies at
/// r(theta, phi), with theta the polar angle from +z and phi the azimuth.
#[derive(Parser, Debug)]
#[command(name = "parm")]
#[command(version)]
struct Cli {
    /// Radius equation, e.g. "1 + 0.1*cos(4*phi)"
    #[arg(short, long, value_name = "EXPR")]
    equation: String,

    /// Glob selecting input surfaces, relative to INPUTDIR
    #[arg(short, long, value_name = "GLOB", default_value = DEFAULT_INPUT_PATTERN)]
    input: String,

    /// Inflate each input to a sphere first, passing P1 and P2 to the tool
    #[arg(long = "inflate_to_sphere_implicit", value_name = "P1,P2")]
    inflate: Option<InflationParameters>,

    /// Rasterise each projected surface into a .mnc mask
    #[arg(long)]
    mask: bool,

    /// Template volume for masking when INPUTDIR holds no .mnc file
    #[arg(long, value_name = "PATH")]
    template: Option<PathBuf>,

    /// Inflation program
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_INFLATE_TOOL)]
    inflate_tool: String,

    /// Mask program
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_MASK_TOOL)]
    mask_tool: String,

    /// Directory searched for input surfaces
    inputdir: PathBuf,

    /// Directory receiving results, mirroring INPUTDIR's layout
    outputdir: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<BatchReport> {
    log::info!(
        "parm {} - create surfaces from spherical functions",
        env!("CARGO_PKG_VERSION")
    );

    let equation = RadiusFunction::compile(&cli.equation)
        .with_context(|| format!("invalid equation `{}`", cli.equation))?;
    log::info!("r(theta, phi) = {}", equation.source());

    let config = PipelineConfig {
        equation,
        inflation: cli.inflate,
        mask: cli.mask.then(|| MaskSettings::with_fallback(cli.template)),
        tools: ToolSettings {
            inflate_program: cli.inflate_tool,
            mask_program: cli.mask_tool,
        },
    };

    let pairs = discover_pairs(&cli.inputdir, &cli.outputdir, &cli.input)?;
    if pairs.is_empty() {
        log::warn!(
            "no files matching `{}` under {}",
            cli.input,
            cli.inputdir.display()
        );
    }

    Ok(run_batch(&config, &cli.inputdir, &pairs, &ObjStore, &ProcessRunner))
}
