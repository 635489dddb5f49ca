use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipforge")]
#[command(author, version, about = "Single-job media editing pipeline")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a single video through the editing pipeline
    Run {
        /// Source video (never modified)
        #[arg(required = true)]
        input: PathBuf,

        /// Output file
        #[arg(short, long, required_unless_present = "output_dir", conflicts_with = "output_dir")]
        output: Option<PathBuf>,

        /// Output directory; the file is named after the source
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Replacement audio track to overlay
        #[arg(short, long)]
        audio: Option<PathBuf>,

        /// Replace the original audio even if the video has some
        #[arg(long)]
        override_audio: bool,

        /// Audio resample-rate multiplier (> 0)
        #[arg(long, allow_negative_numbers = true)]
        pitch: Option<f64>,

        /// Clockwise rotation in degrees
        #[arg(long, allow_negative_numbers = true)]
        rotate: Option<f64>,

        /// Brightness offset (neutral 0)
        #[arg(long, allow_negative_numbers = true)]
        brightness: Option<f64>,

        /// Contrast multiplier (neutral 1)
        #[arg(long, allow_negative_numbers = true)]
        contrast: Option<f64>,

        /// Saturation multiplier (neutral 1)
        #[arg(long)]
        saturation: Option<f64>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
