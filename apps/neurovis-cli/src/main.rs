//! neurovis - plot RSA results from the command line
//!
//! # Usage
//!
//! ```bash
//! # RDM heatmap, rescaled, with condition labels
//! neurovis rdm rdm.csv -o rdm.png --rescale --conditions face,house,car
//!
//! # Correlation time courses from an [n, ts] CSV
//! neurovis timecourse corrs.csv -o corrs.svg --labels early,late --step 0.01
//!
//! # Channel hotmap, smoothed
//! neurovis hotmap corrs.csv -o hotmap.png --smooth
//!
//! # Every brain view of a result map
//! neurovis brain rsa_result.nii.gz --out-dir figures --threshold 10
//!
//! # Summary of an FDR / FWE / cluster pass over a p-value map
//! neurovis correct p.nii.gz --alpha 0.05 --threshold 5
//! ```
//!
//! Log output is controlled through `RUST_LOG` (default `info`).

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use neurovis_core::{Figure, PlotConfig};

#[derive(Parser, Debug)]
#[command(name = "neurovis")]
#[command(author, version, about = "Plot and correct RSA results", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output resolution, overriding the configured DPI
    #[arg(long, global = true)]
    dpi: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plot an RDM stored as a square CSV matrix
    Rdm {
        input: PathBuf,

        /// Output image (.png or .svg)
        #[arg(short, long)]
        output: PathBuf,

        /// Min-max rescale the off-diagonal entries
        #[arg(long)]
        rescale: bool,

        /// Write each cell's value on the heatmap
        #[arg(long)]
        values: bool,

        /// Comma-separated condition labels
        #[arg(long, value_delimiter = ',')]
        conditions: Option<Vec<String>>,

        /// Colormap name (append `_r` to reverse)
        #[arg(long)]
        cmap: Option<String>,
    },

    /// Plot correlation time courses from an [n, ts] CSV
    Timecourse {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Comma-separated curve labels
        #[arg(long, value_delimiter = ',')]
        labels: Option<Vec<String>>,

        /// Time of the first sample in seconds
        #[arg(long, default_value_t = 0.0)]
        start: f64,

        /// Seconds between samples
        #[arg(long, default_value_t = 0.1)]
        step: f64,
    },

    /// Plot a channel × time hotmap from an [n_chls, ts] CSV
    Hotmap {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Treat the input as neural pattern similarities
        #[arg(long)]
        nps: bool,

        /// Plot absolute similarities (with --nps)
        #[arg(long, requires = "nps")]
        abs: bool,

        /// Spline-upsample and low-pass filter each channel
        #[arg(long)]
        smooth: bool,

        /// Comma-separated channel labels
        #[arg(long, value_delimiter = ',')]
        labels: Option<Vec<String>>,

        #[arg(long, default_value_t = 0.0)]
        start: f64,

        #[arg(long, default_value_t = 0.1)]
        step: f64,

        /// Lower color limit
        #[arg(long, default_value_t = 0.0)]
        vmin: f64,

        /// Upper color limit
        #[arg(long, default_value_t = 1.0)]
        vmax: f64,

        /// Colormap name (append `_r` to reverse)
        #[arg(long)]
        cmap: Option<String>,
    },

    /// Draw brain views of a NIfTI result map
    Brain {
        input: PathBuf,

        /// Directory receiving one image per view
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = BrainView::All)]
        view: BrainView,

        /// Minimum cluster size in voxels
        #[arg(long)]
        threshold: Option<usize>,

        /// Background volume replacing the templates
        #[arg(long)]
        background: Option<PathBuf>,

        /// Montage cuts per axis as x,y,z counts
        #[arg(long, value_delimiter = ',', num_args = 3, default_values_t = [6, 6, 6])]
        cuts: Vec<usize>,

        /// Image format of the written views
        #[arg(long, default_value = "png")]
        format: String,
    },

    /// Correct a p-value map and print a JSON summary
    Correct {
        input: PathBuf,

        /// Significance level applied to the corrected maps
        #[arg(long, default_value_t = 0.05)]
        alpha: f64,

        #[arg(long, value_enum, default_value_t = FdrRanks::HalfRank)]
        fdr: FdrRanks,

        /// Minimum cluster size in voxels
        #[arg(long)]
        threshold: Option<usize>,

        /// ROI mask; voxels outside it are ignored
        #[arg(long)]
        mask: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BrainView {
    Regions,
    Montage,
    Glass,
    Surface,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FdrRanks {
    HalfRank,
    Bh,
}

fn load_config(path: Option<&PathBuf>) -> Result<PlotConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => PlotConfig::load(path)?,
        None => PlotConfig::load_default()?,
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_ref())?;
    let mut fig = Figure::from_config(&config);
    if let Some(dpi) = cli.dpi {
        fig = fig.with_dpi(dpi);
    }
    tracing::debug!(?cli, "neurovis v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Rdm {
            input,
            output,
            rescale,
            values,
            conditions,
            cmap,
        } => {
            let opts = neurovis_core::RdmOptions {
                rescale,
                conditions,
                colormap: commands::colormap(cmap.as_deref())?,
                ..Default::default()
            };
            commands::rdm(fig, &input, &output, &opts, values)
        }
        Commands::Timecourse {
            input,
            output,
            labels,
            start,
            step,
        } => commands::timecourse(fig, &input, &output, labels, (start, step)),
        Commands::Hotmap {
            input,
            output,
            nps,
            abs,
            smooth,
            labels,
            start,
            step,
            vmin,
            vmax,
            cmap,
        } => {
            let opts = neurovis_core::HotmapOptions {
                chllabels: labels,
                time_unit: (start, step),
                lim: (vmin, vmax),
                smooth,
                colormap: commands::colormap(cmap.as_deref())?,
                ..Default::default()
            };
            commands::hotmap(fig, &input, &output, opts, nps.then_some(abs))
        }
        Commands::Brain {
            input,
            out_dir,
            view,
            threshold,
            background,
            cuts,
            format,
        } => {
            let cuts: [usize; 3] = cuts
                .as_slice()
                .try_into()
                .map_err(|_| "--cuts takes exactly three counts")?;
            let request = commands::BrainRequest {
                view,
                threshold,
                background,
                cuts,
                format,
            };
            commands::brain(fig, &config, &input, &out_dir, &request)
        }
        Commands::Correct {
            input,
            alpha,
            fdr,
            threshold,
            mask,
        } => {
            let method = match fdr {
                FdrRanks::HalfRank => neurovis_stats::FdrMethod::HalfRank,
                FdrRanks::Bh => neurovis_stats::FdrMethod::BenjaminiHochberg,
            };
            let summary = commands::correct(&input, alpha, method, threshold, mask.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}
