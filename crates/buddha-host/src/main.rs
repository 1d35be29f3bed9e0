//! CLI front end: parses a view/render configuration, drives the
//! coordinator through its command queue, and writes a PNG once enough
//! samples have accumulated.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::Rng;
use serde::Deserialize;

use buddha_core::{Command, Event, Host, IterWindow, ViewParams};

#[derive(Parser, Debug)]
#[command(about = "render a colored Buddhabrot via parallel Metropolis-Hastings sampling")]
struct Cli {
    /// TOML config file; CLI flags override values it sets
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path
    #[arg(long, default_value = "buddhabrot.png")]
    out: PathBuf,

    /// Render width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Render height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Real part of the view center
    #[arg(long, default_value_t = -0.4)]
    center_re: f64,

    /// Imaginary part of the view center
    #[arg(long, default_value_t = 0.0)]
    center_im: f64,

    /// Pixels per unit of the complex plane
    #[arg(long, default_value_t = 400.0)]
    scale: f64,

    /// Number of sampling worker threads
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Seconds to sample before writing the final image
    #[arg(long, default_value_t = 30)]
    seconds: u64,

    /// Red channel iteration window, "low:high"
    #[arg(long, default_value = "5000:50000")]
    red_window: String,

    /// Green channel iteration window, "low:high"
    #[arg(long, default_value = "500:5000")]
    green_window: String,

    /// Blue channel iteration window, "low:high"
    #[arg(long, default_value = "50:500")]
    blue_window: String,

    /// Contrast setting, 0..=300
    #[arg(long, default_value_t = 0)]
    contrast: u32,

    /// Lightness setting, 0..=200
    #[arg(long, default_value_t = 0)]
    lightness: u32,

    /// Base RNG seed for reproducible runs; a fresh one is drawn if omitted
    #[arg(long)]
    seed: Option<u64>,
}

/// On-disk config, loaded with `--config`. CLI flags override these
/// when both are given.
#[derive(Deserialize, Default)]
struct FileConfig {
    width: Option<u32>,
    height: Option<u32>,
    center_re: Option<f64>,
    center_im: Option<f64>,
    scale: Option<f64>,
    threads: Option<usize>,
    seconds: Option<u64>,
    red_window: Option<String>,
    green_window: Option<String>,
    blue_window: Option<String>,
    contrast: Option<u32>,
    lightness: Option<u32>,
}

fn parse_window(s: &str) -> Result<IterWindow> {
    let (low, high) =
        s.split_once(':').with_context(|| format!("expected LOW:HIGH, got '{s}'"))?;
    let low: u32 = low.parse().with_context(|| format!("invalid low bound in '{s}'"))?;
    let high: u32 = high.parse().with_context(|| format!("invalid high bound in '{s}'"))?;
    IterWindow::new(low, high).map_err(|e| anyhow::anyhow!(e.to_string()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut cli = Cli::parse();

    if let Some(path) = &cli.config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let file: FileConfig =
            toml::from_str(&text).with_context(|| format!("invalid TOML in {}", path.display()))?;
        apply_file_config(&mut cli, file);
    }

    if cli.threads == 0 {
        bail!("--threads must be at least 1");
    }
    if cli.seconds == 0 {
        bail!("--seconds must be at least 1");
    }

    let windows = [
        parse_window(&cli.red_window)?,
        parse_window(&cli.green_window)?,
        parse_window(&cli.blue_window)?,
    ];

    let view = ViewParams::derive(
        cli.center_re,
        cli.center_im,
        cli.scale,
        cli.width,
        cli.height,
        windows,
    )
    .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let base_seed = cli.seed.unwrap_or_else(|| rand::rng().random::<u64>());
    tracing::debug!(target: "buddha.host", base_seed, "using RNG seed");
    let (host, events) = Host::launch(view, cli.threads, base_seed);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            tracing::info!(target: "buddha.host", "received interrupt, shutting down");
            shutdown.store(true, Ordering::Relaxed);
        })
        .context("failed to install Ctrl-C handler")?;
    }

    host.send(Command::Start);
    expect_event(&events, "WorkersStarted")?;
    host.send(Command::SetContrast(cli.contrast));
    host.send(Command::SetLightness(cli.lightness));

    tracing::info!(
        target: "buddha.host",
        threads = cli.threads,
        seconds = cli.seconds,
        out = %cli.out.display(),
        "sampling"
    );

    let deadline = std::time::Instant::now() + Duration::from_secs(cli.seconds);
    while std::time::Instant::now() < deadline && !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(500));
    }

    host.send(Command::UpdateImage);
    let frame_ready = expect_event(&events, "FrameReady")?;
    if !matches!(frame_ready, Event::FrameReady(_)) {
        bail!("expected a rendered frame, got {frame_ready:?}");
    }

    host.send(Command::SaveScreenshot(cli.out.clone()));
    match events.recv_timeout(Duration::from_secs(10)) {
        Ok(Event::ScreenshotSaved(path)) => {
            tracing::info!(target: "buddha.host", out = %path.display(), "wrote image");
        }
        Ok(Event::ScreenshotFailed(reason)) => bail!("failed to save screenshot: {reason}"),
        Ok(other) => bail!("unexpected event while saving screenshot: {other:?}"),
        Err(e) => bail!("timed out waiting for screenshot event: {e}"),
    }

    host.send(Command::Stop);
    expect_event(&events, "WorkersStopped")?;
    host.shutdown();
    Ok(())
}

fn expect_event(events: &crossbeam_channel::Receiver<Event>, what: &str) -> Result<Event> {
    events
        .recv_timeout(Duration::from_secs(10))
        .with_context(|| format!("timed out waiting for {what}"))
}

fn apply_file_config(cli: &mut Cli, file: FileConfig) {
    if let Some(v) = file.width {
        cli.width = v;
    }
    if let Some(v) = file.height {
        cli.height = v;
    }
    if let Some(v) = file.center_re {
        cli.center_re = v;
    }
    if let Some(v) = file.center_im {
        cli.center_im = v;
    }
    if let Some(v) = file.scale {
        cli.scale = v;
    }
    if let Some(v) = file.threads {
        cli.threads = v;
    }
    if let Some(v) = file.seconds {
        cli.seconds = v;
    }
    if let Some(v) = file.red_window {
        cli.red_window = v;
    }
    if let Some(v) = file.green_window {
        cli.green_window = v;
    }
    if let Some(v) = file.blue_window {
        cli.blue_window = v;
    }
    if let Some(v) = file.contrast {
        cli.contrast = v;
    }
    if let Some(v) = file.lightness {
        cli.lightness = v;
    }
}
