// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rtm3d::config::{overlay, ConfigFile, RunOptions};
use rtm3d::engine::{ProgressInfo, RtmEngine};
use rtm3d::io::{self, OutputFormat};

#[derive(Parser, Debug)]
#[command(
    name = "rtm3d-cli",
    version,
    about = "Single-shot acoustic reverse-time migration of a 2D velocity model"
)]
struct Cli {
    /// JSON config file (flat object; command-line flags take precedence)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory containing x.json, z.json and vel.json
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// X axis JSON array
    #[arg(long)]
    x_file: Option<PathBuf>,

    /// Z axis JSON array
    #[arg(long)]
    z_file: Option<PathBuf>,

    /// 2D values array ([nz][nx] JSON, or .npy)
    #[arg(long)]
    values_file: Option<PathBuf>,

    /// Keep every n-th model column (>= 1)
    #[arg(long)]
    decim_x: Option<usize>,

    /// Keep every n-th model row (>= 1)
    #[arg(long)]
    decim_z: Option<usize>,

    /// Crop to at most n columns after decimation (0 keeps all)
    #[arg(long)]
    crop_x: Option<usize>,

    /// Crop to at most n rows after decimation (0 keeps all)
    #[arg(long)]
    crop_z: Option<usize>,

    /// Cross-line extent in cells
    #[arg(long)]
    ny: Option<usize>,

    /// Cross-line spacing
    #[arg(long)]
    dy: Option<f32>,

    /// Time step in seconds
    #[arg(long)]
    dt: Option<f32>,

    /// Number of time steps
    #[arg(long)]
    nt: Option<usize>,

    /// Source peak frequency in Hz
    #[arg(long)]
    f0: Option<f32>,

    /// Absorbing layer thickness in cells
    #[arg(long)]
    pml: Option<usize>,

    /// Cells between receivers
    #[arg(long)]
    receiver_stride: Option<usize>,

    /// Output file path
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: pgm8, float32_raw or npy
    #[arg(long)]
    output_format: Option<String>,

    /// Number of Rayon worker threads
    #[arg(long)]
    threads: Option<usize>,

    /// Print propagation progress to stderr (see --progress-interval)
    #[arg(long)]
    progress: bool,

    /// Progress reporting interval in milliseconds (used with --progress)
    #[arg(long, default_value = "500")]
    progress_interval: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Resolve run options: defaults, then the config file, then `--data-dir`,
/// then explicit flags.
fn resolve_options(cli: &Cli) -> Result<RunOptions> {
    let mut opts = RunOptions::default();

    if let Some(path) = &cli.config {
        let cfg = ConfigFile::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?;
        cfg.apply(&mut opts)?;
    }
    if let Some(dir) = &cli.data_dir {
        opts.set_data_dir(dir);
    }
    if let Some(v) = &cli.x_file {
        opts.x_file = Some(v.clone());
    }
    if let Some(v) = &cli.z_file {
        opts.z_file = Some(v.clone());
    }
    if let Some(v) = &cli.values_file {
        opts.values_file = Some(v.clone());
    }
    if let Some(v) = &cli.output {
        opts.output_file = v.clone();
    }
    if let Some(v) = &cli.output_format {
        opts.output_format = v
            .parse::<OutputFormat>()
            .with_context(|| format!("invalid --output-format: {}", v))?;
    }

    overlay(&mut opts.load.decim_x, cli.decim_x);
    overlay(&mut opts.load.decim_z, cli.decim_z);
    overlay(&mut opts.load.crop_x, cli.crop_x);
    overlay(&mut opts.load.crop_z, cli.crop_z);

    overlay(&mut opts.rtm.ny, cli.ny);
    overlay(&mut opts.rtm.dy, cli.dy);
    overlay(&mut opts.rtm.dt, cli.dt);
    overlay(&mut opts.rtm.nt, cli.nt);
    overlay(&mut opts.rtm.f0, cli.f0);
    overlay(&mut opts.rtm.pml, cli.pml);
    overlay(&mut opts.rtm.receiver_stride, cli.receiver_stride);

    opts.validate()?;
    Ok(opts)
}

fn parse_level(s: &str) -> Level {
    match s.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn run(cli: &Cli) -> Result<()> {
    let opts = resolve_options(cli)?;
    let model = opts.load_model().context("failed to load velocity model")?;
    let mut engine = RtmEngine::new(model, opts.rtm)?;
    let (model, cfg) = (engine.model(), engine.config());
    info!(
        nx = model.nx,
        nz = model.nz,
        dx = model.dx,
        dz = model.dz,
        vmax = model.max_velocity(),
        ny = cfg.ny,
        nt = cfg.nt,
        dt = cfg.dt,
        history_mib = engine.history_bytes() as f64 / (1024.0 * 1024.0),
        "model loaded"
    );

    if let Some(threads) = cli.threads {
        engine = engine.with_threads(threads);
    }

    let progress_cb: Option<Box<dyn Fn(ProgressInfo) + Sync>> = if cli.progress {
        Some(Box::new(|info: ProgressInfo| {
            eprintln!(
                "[{:.1}s] {} step {}/{}",
                info.elapsed.as_secs_f64(),
                info.stage,
                info.step,
                info.total_steps,
            );
        }))
    } else {
        None
    };
    let engine = engine.with_progress_interval(Duration::from_millis(cli.progress_interval));

    let result = engine.run(progress_cb.as_deref())?;

    let written = io::write_image(&opts.output_file, &result, opts.output_format)
        .with_context(|| format!("failed to write '{}'", opts.output_file.display()))?;
    for path in &written {
        info!(path = %path.display(), format = %opts.output_format, "image written");
    }
    println!("RTM done. inline image: {}", opts.output_file.display());
    println!("grid nx={} nz={}", result.nx, result.nz);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&cli.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("rtm3d-cli").chain(args.iter().copied()))
    }

    #[test]
    fn data_dir_and_rtm_settings() {
        let cli = parse(&[
            "--data-dir",
            "data",
            "--decim-x",
            "10",
            "--decim-z",
            "12",
            "--crop-x",
            "50",
            "--crop-z",
            "40",
            "--ny",
            "20",
            "--dy",
            "18",
            "--dt",
            "0.001",
            "--nt",
            "100",
            "--f0",
            "10",
            "--pml",
            "8",
            "--receiver-stride",
            "4",
            "--output",
            "output/a.pgm",
        ])
        .unwrap();
        let o = resolve_options(&cli).unwrap();
        assert_eq!(o.x_file, Some(PathBuf::from("data/x.json")));
        assert_eq!(o.z_file, Some(PathBuf::from("data/z.json")));
        assert_eq!(o.values_file, Some(PathBuf::from("data/vel.json")));
        assert_eq!(o.load.decim_x, 10);
        assert_eq!(o.load.crop_z, 40);
        assert_eq!(o.rtm.nt, 100);
        assert_eq!(o.rtm.ny, 20);
        assert_eq!(o.rtm.receiver_stride, 4);
        assert_eq!(o.output_file, PathBuf::from("output/a.pgm"));
    }

    #[test]
    fn rejects_unknown_argument() {
        assert!(parse(&["--unknown", "x"]).is_err());
        assert!(parse(&["positional"]).is_err());
    }

    #[test]
    fn rejects_missing_input() {
        let cli = parse(&["--nt", "100"]).unwrap();
        assert!(resolve_options(&cli).is_err());
    }

    #[test]
    fn rejects_bad_format_and_values() {
        let cli = parse(&["--data-dir", "d", "--output-format", "png"]).unwrap();
        assert!(resolve_options(&cli).is_err());
        let cli = parse(&["--data-dir", "d", "--pml", "0"]).unwrap();
        assert!(resolve_options(&cli).is_err());
        assert!(parse(&["--nt", "ten"]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let path = std::env::temp_dir().join(format!("rtm3d_cli_cfg_{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"data_dir": "data", "output_file": "output/out.bin",
                "output_format": "float32_raw", "nt": 90, "ny": 12}"#,
        )
        .unwrap();
        let cfg_arg = path.to_string_lossy().to_string();
        let cli = parse(&["--config", &cfg_arg, "--ny", "16"]).unwrap();
        let o = resolve_options(&cli).unwrap();
        assert_eq!(o.values_file, Some(PathBuf::from("data/vel.json")));
        assert_eq!(o.output_file, PathBuf::from("output/out.bin"));
        assert_eq!(o.output_format, OutputFormat::Float32Raw);
        assert_eq!(o.rtm.nt, 90);
        assert_eq!(o.rtm.ny, 16);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn log_levels() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("bogus"), Level::INFO);
    }
}
