// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed-rate polling driver for a shared sequence.

use crate::sequence::Sequence;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Drives a shared [`Sequence`] on a dedicated thread at a fixed tick rate
///
/// The runner resets the sequence when started, captures a monotonic start
/// instant, and advances the sequence with the elapsed time each tick. The
/// loop ends on its own once no element remains active; stopping early is
/// cooperative via [`stop`](Self::stop).
///
/// A runner is one possible driver. An external time source (an audio
/// playback clock) can instead call [`Sequence::advance`] directly at its
/// own cadence.
pub struct ShowRunner {
    name: String,
    tick: Duration,
    sequence: Arc<Mutex<Sequence>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ShowRunner {
    /// Create a runner driving `sequence` every `tick`
    pub fn new(name: impl Into<String>, tick: Duration, sequence: Arc<Mutex<Sequence>>) -> Self {
        Self {
            name: name.into(),
            tick,
            sequence,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// The shared sequence this runner drives
    pub fn sequence(&self) -> Arc<Mutex<Sequence>> {
        Arc::clone(&self.sequence)
    }

    /// The runner's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tick interval
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Reset the sequence and start the polling thread
    ///
    /// Does nothing if a thread is already attached; after a run has ended,
    /// call [`join`](Self::join) or [`stop`](Self::stop) before starting
    /// again.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        self.sequence.lock().reset();
        self.running.store(true, Ordering::Relaxed);

        let name = self.name.clone();
        let tick = self.tick;
        let sequence = Arc::clone(&self.sequence);
        let running = Arc::clone(&self.running);
        let started = Instant::now();

        tracing::info!(runner = %self.name, "show runner started");
        self.handle = Some(std::thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                let tick_start = Instant::now();
                let elapsed = started.elapsed().as_secs_f64();
                let still_active = sequence.lock().advance(elapsed);
                if !still_active {
                    tracing::info!(runner = %name, elapsed, "show finished");
                    running.store(false, Ordering::Relaxed);
                    break;
                }

                // Sleep out the remainder of the tick outside the lock.
                let spent = tick_start.elapsed();
                if spent < tick {
                    std::thread::sleep(tick - spent);
                }
            }
        }));
    }

    /// Signal the polling thread to stop and wait for it
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.join();
    }

    /// Wait for the polling thread to end, naturally or after `stop`
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(runner = %self.name, "show runner thread panicked");
            }
        }
    }

    /// Whether the polling thread is still driving the sequence
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Drop for ShowRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::trigger::TriggerElement;

    #[test]
    fn test_runs_to_completion() {
        let mut sequence = Sequence::new();
        sequence.push_element(TriggerElement::once(0.02).with_action(Action::new("cue")));

        let fired = Arc::new(Mutex::new(0u32));
        {
            let fired = Arc::clone(&fired);
            sequence.register_callback("cue", move |_| *fired.lock() += 1);
        }

        let mut runner = ShowRunner::new(
            "test",
            Duration::from_millis(5),
            Arc::new(Mutex::new(sequence)),
        );
        runner.start();
        runner.join();

        assert_eq!(*fired.lock(), 1);
        assert!(!runner.is_running());
    }

    #[test]
    fn test_stop_before_completion() {
        let mut sequence = Sequence::new();
        sequence.push_element(TriggerElement::periodic(0.0, 60.0).with_action(Action::new("cue")));

        let mut runner = ShowRunner::new(
            "test",
            Duration::from_millis(5),
            Arc::new(Mutex::new(sequence)),
        );
        runner.start();
        assert!(runner.is_running());

        runner.stop();
        assert!(!runner.is_running());
        assert!(runner.sequence().lock().is_active());
    }
}
