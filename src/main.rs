//! aortaline - centerline extraction and scoring for tubular meshes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use aortaline::entry::{extract_from_file, run_batch, score_files, SCORES_FILE};
use aortaline::io::output::write_centerline_csv;
use aortaline::{CenterlineError, PipelineConfig, SliceAxis};

#[derive(Parser)]
#[command(name = "aortaline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pipeline configuration (TOML); defaults are used for missing fields
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the centerline of one mesh
    Extract {
        /// Input mesh (.obj, .stl or .csv point list)
        input: PathBuf,

        /// Output CSV (default: <input stem>_centerline.csv next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the slicing axis
        #[arg(long, value_parser = parse_axis)]
        axis: Option<SliceAxis>,

        /// Override the slab thickness
        #[arg(long)]
        dz: Option<f64>,
    },

    /// Score a centerline CSV against a ground-truth path
    Score {
        /// Predicted centerline CSV
        predicted: PathBuf,

        /// Ground-truth .pth file or directory of .pth segments
        ground_truth: PathBuf,

        /// Override the resampling resolution
        #[arg(short, long)]
        num_points: Option<usize>,
    },

    /// Extract and score every mesh in a directory
    Batch {
        /// Directory of meshes
        models: PathBuf,

        /// Ground-truth root holding <model>/paths/*.pth
        ground_truth: PathBuf,

        /// Output directory for centerlines and scores
        output: PathBuf,
    },
}

fn parse_axis(s: &str) -> Result<SliceAxis, String> {
    match s.to_ascii_lowercase().as_str() {
        "x" | "0" => Ok(SliceAxis::X),
        "y" | "1" => Ok(SliceAxis::Y),
        "z" | "2" => Ok(SliceAxis::Z),
        other => Err(format!("unknown axis '{}', expected x, y or z", other)),
    }
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "aortaline=info",
            2 => "aortaline=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_toml_file(p)
            .with_context(|| format!("Failed to load configuration from {:?}", p)),
        None => Ok(PipelineConfig::default()),
    }
}

fn run_extract(
    input: &Path,
    output: Option<&Path>,
    axis: Option<SliceAxis>,
    dz: Option<f64>,
    mut config: PipelineConfig,
) -> Result<()> {
    if let Some(axis) = axis {
        config.centerline.axis = axis;
    }
    if let Some(dz) = dz {
        config.centerline.dz = dz;
    }

    let centerline = extract_from_file(input, &config)?;
    let output = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "model".to_string());
            input.with_file_name(format!("{}_centerline.csv", stem))
        }
    };
    write_centerline_csv(&output, &centerline.positions())?;
    println!(
        "{} centerline points ({:.2} mm) -> {}",
        centerline.len(),
        centerline.length(),
        output.display()
    );
    Ok(())
}

fn run_score(
    predicted: &Path,
    ground_truth: &Path,
    num_points: Option<usize>,
    mut config: PipelineConfig,
) -> Result<()> {
    if let Some(n) = num_points {
        config.evaluation.num_points = n;
    }
    let scores = score_files(predicted, ground_truth, &config)?;
    println!("mean_closest  {:.4}", scores.mean_closest);
    println!("hausdorff     {:.4}", scores.hausdorff);
    println!("hausdorff95   {:.4}", scores.hausdorff95);
    println!("avg_symmetric {:.4}", scores.avg_symmetric);
    for (tol, frac) in scores
        .accuracy
        .tolerances
        .iter()
        .zip(&scores.accuracy.fractions)
    {
        println!("within {:>5.2}  {:>6.1}%", tol, frac * 100.0);
    }
    Ok(())
}

fn run_batch_command(
    models: &Path,
    ground_truth: &Path,
    output: &Path,
    config: PipelineConfig,
) -> Result<()> {
    let reports = run_batch(models, ground_truth, output, &config)?;
    let scored = reports.iter().filter(|r| r.scores.is_some()).count();
    println!(
        "{} of {} model(s) scored -> {}",
        scored,
        reports.len(),
        output.join(SCORES_FILE).display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Extract {
            input,
            output,
            axis,
            dz,
        } => run_extract(input, output.as_deref(), *axis, *dz, config),
        Commands::Score {
            predicted,
            ground_truth,
            num_points,
        } => run_score(predicted, ground_truth, *num_points, config),
        Commands::Batch {
            models,
            ground_truth,
            output,
        } => run_batch_command(models, ground_truth, output, config),
    });

    if let Err(e) = &result {
        if !cli.quiet {
            if let Some(err) = e.downcast_ref::<CenterlineError>() {
                eprintln!("Error: {}", err);
                eprintln!("  Code: {}", err.code());
            } else {
                eprintln!("Error: {}", e);
            }
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
