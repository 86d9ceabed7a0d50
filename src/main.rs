use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing::Level;

use volume_preview::{FileStatus, PipelineConfig, Plane, RotationArg, run_batch};

#[derive(Parser, Debug)]
#[command(name = "volume-preview", version)]
/// Render slice images and animations for every scan in a directory.
struct Cli {
    /// Directory of NIfTI files or DICOM series directories.
    input: PathBuf,

    /// Output root; one sub-directory is created per input.
    output: PathBuf,

    /// JSON pipeline configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rotation override, e.g. `axial=90`. May be repeated.
    #[arg(long = "rotate", value_name = "PLANE=DEGREES")]
    rotations: Vec<RotationArg>,

    /// Planes to render, in panel order.
    #[arg(long, value_delimiter = ',')]
    planes: Option<Vec<Plane>>,

    /// Process at most this many inputs.
    #[arg(long)]
    limit: Option<usize>,

    /// Stop at the first file that fails to load or encode.
    #[arg(long)]
    fail_fast: bool,

    /// Log per-frame progress.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match (cli.verbose, cli.quiet) {
        (true, _) => Level::DEBUG,
        (_, true) => Level::WARN,
        _ => Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("read config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    for arg in &cli.rotations {
        config.rotations = config.rotations.with(arg.plane, arg.degrees);
    }
    if let Some(planes) = cli.planes {
        config.planes = planes;
    }
    if cli.limit.is_some() {
        config.max_files = cli.limit;
    }
    config.fail_fast |= cli.fail_fast;
    let config = config.validated().context("invalid configuration")?;

    let report = run_batch(&cli.input, &cli.output, &config)
        .with_context(|| format!("process {}", cli.input.display()))?;

    for (path, status) in &report.files {
        match status {
            FileStatus::Encoded(summary) => println!(
                "ok       {} ({} slices, {} composites, {} animations)",
                path.display(),
                summary.slice_images,
                summary.composite_images,
                summary.animations.len()
            ),
            FileStatus::Skipped(reason) => println!("skipped  {} ({reason})", path.display()),
            FileStatus::Failed(reason) => println!("failed   {} ({reason})", path.display()),
        }
    }

    if report.failed() > 0 {
        anyhow::bail!("{} of {} inputs failed", report.failed(), report.files.len());
    }
    Ok(())
}
