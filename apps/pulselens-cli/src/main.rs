use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pulselens_ops::{init_tracing, PulseReport, ReportStore};
use pulselens_pipeline::find_heart_rate;
use pulselens_types::{config::PulseConfig, result::PipelineReport};
use pulselens_vision::{DirectoryFrameSource, FrameSource};
use tracing::{info, warn};

/// Estimate heart rate and HRV from a directory of video frames.
#[derive(Debug, Parser)]
#[command(name = "pulselens", version)]
struct Args {
    /// Directory holding the frames as image files, ordered by name.
    #[arg(long)]
    frames: PathBuf,
    /// TOML configuration file.
    #[arg(long, env = "PULSELENS_CONFIG", default_value = "configs/dev.toml")]
    config: PathBuf,
    #[arg(long)]
    fps: Option<f64>,
    #[arg(long)]
    freq_min: Option<f64>,
    #[arg(long)]
    freq_max: Option<f64>,
    #[arg(long)]
    batch_size: Option<usize>,
    /// Print the result as JSON instead of text.
    #[arg(long)]
    json: bool,
    /// Persist a report under `ops.report_dir`.
    #[arg(long)]
    save_report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config.ops)?;

    let frames = DirectoryFrameSource::new(&args.frames)
        .load_frames()
        .await
        .with_context(|| format!("loading frames from {}", args.frames.display()))?;
    info!("Analyzing {} frames at {} fps", frames.len(), config.pipeline.fps);

    let pipeline_config = config.clone();
    let report = tokio::task::spawn_blocking(move || find_heart_rate(frames, &pipeline_config))
        .await
        .context("analysis worker stopped unexpectedly")??;

    if !report.detected() {
        warn!("No heart rate detected in the supplied frames");
    }
    print_report(&report, args.json)?;

    if args.save_report {
        let store = ReportStore::open(&config.ops.report_dir)?;
        let path = store.save(&PulseReport::new(config, report))?;
        println!("Report saved to {}", path.display());
    }
    Ok(())
}

/// File config (or defaults when it is missing or invalid) with CLI overrides on top.
/// Overrides that leave the config invalid are an error.
fn load_config(args: &Args) -> Result<PulseConfig> {
    let mut config = match PulseConfig::from_file(&args.config) {
        Ok(cfg) => match cfg.validate() {
            Ok(()) => cfg,
            Err(err) => {
                eprintln!(
                    "Invalid config in '{}': {err}. Falling back to internal defaults.",
                    args.config.display()
                );
                PulseConfig::default()
            }
        },
        Err(err) => {
            eprintln!(
                "Failed to load config from '{}': {err}. Falling back to internal defaults.",
                args.config.display()
            );
            PulseConfig::default()
        }
    };
    apply_overrides(&mut config, args);
    config
        .validate()
        .context("invalid command-line overrides")?;
    Ok(config)
}

fn apply_overrides(config: &mut PulseConfig, args: &Args) {
    if let Some(fps) = args.fps {
        config.pipeline.fps = fps;
    }
    if let Some(freq_min) = args.freq_min {
        config.pipeline.freq_min = freq_min;
    }
    if let Some(freq_max) = args.freq_max {
        config.pipeline.freq_max = freq_max;
    }
    if let Some(batch_size) = args.batch_size {
        config.pipeline.batch_size = batch_size;
    }
}

fn print_report(report: &PipelineReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    let result = &report.result;
    if report.detected() {
        println!("Heart Rate: {:.1} BPM", result.heart_rate_bpm);
    } else {
        println!("Heart Rate: Failed to detect");
    }
    if result.hrv_metrics.valid {
        println!("SDNN: {:.2} ms", result.hrv_metrics.sdnn_ms);
        println!("RMSSD: {:.2} ms", result.hrv_metrics.rmssd_ms);
    } else {
        println!("HRV: not enough peaks for analysis");
    }
    println!(
        "({} frames in {} batches)",
        report.frame_count, report.batch_count
    );
    Ok(())
}
