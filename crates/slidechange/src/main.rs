mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use prost::Message;
use tracing::{info, warn};

use slidechange_core::config::RunParams;
use slidechange_core::grab::grab_frame;
use slidechange_core::pipeline::{self, PipelineConfig};
use slidechange_core::report::ChangeReport;
use slidechange_proto::proto;

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Analyze {
            input,
            fps_factor,
            pixel_stride,
            validation_times,
            validation_tolerance,
            min_peak_height,
            output,
            debug_frames,
            font,
        } => {
            info!(?input, fps_factor, pixel_stride, "starting analysis");

            let config = PipelineConfig {
                params: RunParams {
                    fps_factor,
                    pixel_stride,
                    validation_tolerance,
                    min_peak_height,
                },
                proposed_times: validation_times,
                debug_frames_dir: debug_frames,
                font,
            };

            let report = pipeline::run_pipeline(&input, &config).context("analysis failed")?;

            print_report(&report);

            if let Some(output) = &output {
                write_report(&report.to_proto(), output)?;
            }

            if report.passed() == Some(false) {
                warn!("validation failed");
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        cli::Command::Grab {
            input,
            time,
            output_dir,
        } => {
            let path = grab_frame(&input, &time, &output_dir).context("frame grab failed")?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_report(report: &ChangeReport) {
    println!();
    print!("{}", report.detections_table());
    println!();

    let times: Vec<String> = report
        .start_times()
        .iter()
        .map(|t| format!("{t:.3}"))
        .collect();
    println!("Change start times: [{}]", times.join(", "));

    if let Some(summary) = report.validation_summary() {
        println!();
        print!("{summary}");
    }
}

/// Serialize the report as length-delimited protobuf and write to file.
fn write_report(report: &proto::ChangeReport, output: &Path) -> Result<()> {
    info!(?output, detections = report.detections.len(), "writing protobuf output");

    let mut buf = Vec::new();
    report
        .encode_length_delimited(&mut buf)
        .context("failed to encode ChangeReport")?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).context("failed to create output directory")?;
    }

    std::fs::write(output, &buf)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(?output, bytes = buf.len(), "protobuf output written");
    Ok(())
}
