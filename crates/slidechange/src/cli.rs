use std::path::PathBuf;

use clap::{Parser, Subcommand};

use slidechange_core::config::{
    DEFAULT_MIN_PEAK_HEIGHT, DEFAULT_PIXEL_STRIDE, DEFAULT_VALIDATION_TOLERANCE,
};

#[derive(Parser)]
#[command(name = "slidechange", about = "Detects when visual changes begin in a video")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Find the times at which changes (e.g. slide animations) begin.
    Analyze {
        /// Video to analyze.
        input: PathBuf,

        /// Analyze every Nth frame.
        #[arg(long, default_value_t = 1)]
        fps_factor: u32,

        /// Compare every Nth pixel of each frame.
        #[arg(long, default_value_t = DEFAULT_PIXEL_STRIDE)]
        pixel_stride: usize,

        /// Pipe-delimited proposed change times in seconds, e.g. "1.5|4.25".
        #[arg(long)]
        validation_times: Option<String>,

        /// Allowed difference in seconds between proposed and detected times.
        /// Also the minimum spacing between detected changes.
        #[arg(long, default_value_t = DEFAULT_VALIDATION_TOLERANCE)]
        validation_tolerance: f64,

        /// Smoothed change a peak must reach to count as a change.
        #[arg(long, default_value_t = DEFAULT_MIN_PEAK_HEIGHT)]
        min_peak_height: f64,

        /// Write the report as length-delimited protobuf to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory to save the frames where changes start.
        #[arg(long)]
        debug_frames: Option<PathBuf>,

        /// TrueType font used to annotate debug frames.
        #[arg(long, requires = "debug_frames")]
        font: Option<PathBuf>,
    },

    /// Save the frame at a time offset as a PNG.
    Grab {
        /// Video to take the frame from.
        input: PathBuf,

        /// Time offset: SS, MM:SS or HH:MM:SS.xxx.
        #[arg(short, long)]
        time: String,

        /// Directory to save the frame in.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}
