// SPDX-License-Identifier: MIT OR Apache-2.0
//! Audio-synchronized driver: plays a music file and advances the show
//! from the playback position.

use lumacue_sequencer::Sequence;
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Error setting up or driving audio playback
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// Music file could not be opened
    #[error("failed to open music file: {0}")]
    Io(#[from] std::io::Error),

    /// No audio output device available
    #[error("failed to open audio output: {0}")]
    Stream(#[from] rodio::StreamError),

    /// Audio sink could not be created
    #[error("failed to create audio sink: {0}")]
    Play(#[from] rodio::PlayError),

    /// Music file could not be decoded
    #[error("failed to decode music file: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

/// Play `music` and drive the sequence from the sink's playback position,
/// polling every `tick`, until the show completes or playback ends
pub fn run_synced(
    sequence: Arc<Mutex<Sequence>>,
    music: &Path,
    tick: Duration,
) -> Result<(), AudioError> {
    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;

    let file = File::open(music)?;
    sink.append(Decoder::new(BufReader::new(file))?);

    tracing::info!(music = %music.display(), "audio-synced show started");
    sequence.lock().reset();

    loop {
        let position = sink.get_pos().as_secs_f64();
        let still_active = sequence.lock().advance(position);
        if !still_active {
            tracing::info!(position, "show finished");
            break;
        }
        if sink.empty() {
            tracing::warn!(position, "music ended with cues still pending");
            break;
        }
        std::thread::sleep(tick);
    }

    Ok(())
}
