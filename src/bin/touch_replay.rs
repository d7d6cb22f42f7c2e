//! Replay a JSON touch script into a PNG frame sequence.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use touch_indicators::config::OverlayConfig;
use touch_indicators::replay::{replay_to_dir, TouchScript};

#[derive(Debug, Parser)]
#[command(name = "touch_replay", version, about = "Render touch indicators for a scripted session")]
struct Args {
    /// Touch script (JSON)
    script: PathBuf,

    /// Directory the frames are written to
    #[arg(short, long, default_value = "frames")]
    out: PathBuf,

    /// Output framerate
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Overlay configuration (JSON); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    touch_indicators::init_tracing("touch_indicators=info,touch_replay=info");
    let args = Args::parse();

    let script = TouchScript::load(&args.script)
        .with_context(|| format!("Failed to load touch script {:?}", args.script))?;
    let config = match &args.config {
        Some(path) => OverlayConfig::load(path)
            .with_context(|| format!("Failed to load overlay configuration {:?}", path))?,
        None => OverlayConfig::default(),
    };

    let report = replay_to_dir(&script, config, args.fps, &args.out)
        .with_context(|| format!("Replay into {:?} failed", args.out))?;

    println!(
        "{} frame(s) written to {} (peak {} indicator(s), {} fault(s))",
        report.frames,
        args.out.display(),
        report.peak_indicators,
        report.fault_total
    );
    for fault in &report.faults {
        println!("  {}", fault);
    }
    Ok(())
}
