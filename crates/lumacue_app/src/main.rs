// SPDX-License-Identifier: MIT OR Apache-2.0
//! `LumaCue` - time-driven cue runner for synchronized light shows.
//!
//! Loads a show definition, registers logging handlers for every cue name
//! the show uses, and drives the sequence to completion - either from a
//! free-running polling clock or (with the `audio` feature) from a music
//! file's playback position.

#[cfg(feature = "audio")]
mod audio;

use clap::Parser;
use lumacue_sequencer::{Sequence, ShowRunner};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Command line options
#[derive(Debug, Parser)]
#[command(name = "lumacue", version, about = "Time-driven cue runner")]
struct Args {
    /// Show definition file (JSON)
    show: PathBuf,

    /// Polling rate in ticks per second
    #[arg(long, default_value_t = 60.0)]
    rate: f64,

    /// Music file whose playback position drives the show (requires a build
    /// with the `audio` feature)
    #[arg(long)]
    audio: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("lumacue_app=info".parse().unwrap())
        .add_directive("lumacue_sequencer=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LumaCue v{}", env!("CARGO_PKG_VERSION"));

    let mut sequence = match Sequence::from_file(&args.show) {
        Ok(sequence) => sequence,
        Err(e) => {
            tracing::error!("Failed to load show {:?}: {e}", args.show);
            std::process::exit(1);
        }
    };

    for name in sequence.action_names() {
        let label = name.clone();
        sequence.register_callback(name, move |params| match serde_json::to_string(params) {
            Ok(json) => tracing::info!(cue = %label, parameters = %json, "cue fired"),
            Err(_) => tracing::info!(cue = %label, "cue fired"),
        });
    }

    let sequence = Arc::new(Mutex::new(sequence));

    if let Some(music) = args.audio {
        run_synced_to_audio(sequence, &music, args.rate);
        return;
    }

    let tick = Duration::from_secs_f64(1.0 / args.rate.max(1.0));
    let mut runner = ShowRunner::new("lumacue", tick, sequence);
    runner.start();
    runner.join();
}

#[cfg(feature = "audio")]
fn run_synced_to_audio(sequence: Arc<Mutex<Sequence>>, music: &std::path::Path, rate: f64) {
    let tick = Duration::from_secs_f64(1.0 / rate.max(1.0));
    if let Err(e) = audio::run_synced(sequence, music, tick) {
        tracing::error!("Audio-synced run failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "audio"))]
fn run_synced_to_audio(_sequence: Arc<Mutex<Sequence>>, _music: &std::path::Path, _rate: f64) {
    tracing::error!("This build has no audio support; rebuild with --features audio");
    std::process::exit(1);
}
