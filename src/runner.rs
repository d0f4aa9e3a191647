//! The scoring loop: line events and the periodic tick on one thread.
//!
//! The loop waits for lines with a timeout that ends at the next tick
//! deadline, so line handling and tick handling never interleave and the
//! engine needs no lock. Ticks are never skipped: if the loop falls behind,
//! every missed deadline still runs its tick.

use crate::core::{Engine, RawSample, TickReport};
use crate::publish::SnapshotPublisher;
use crate::source::RawLine;
use crate::stats::SharedSessionLog;
use chrono::Utc;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Longest single wait on the line channel, so a stop request is noticed.
const MAX_WAIT: Duration = Duration::from_millis(100);

/// Why [`Runner::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The running flag was cleared
    Stopped,
    /// The line source closed its channel
    SourceClosed,
}

/// Owns the engine and drives it from lines and ticks.
#[derive(Debug)]
pub struct Runner {
    engine: Engine,
    tick_interval: Duration,
    publisher: SnapshotPublisher,
    log: SharedSessionLog,
}

impl Runner {
    pub fn new(
        engine: Engine,
        tick_interval: Duration,
        publisher: SnapshotPublisher,
        log: SharedSessionLog,
    ) -> Self {
        Self {
            engine,
            tick_interval,
            publisher,
            log,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Decode and apply one raw line.
    pub fn handle_line(&mut self, line: &RawLine) -> Option<RawSample> {
        let sample = self.engine.ingest_line(&line.text, line.received_at);
        self.log.record_line(sample.map(|s| s.kind));
        sample
    }

    /// Run one tick and publish its snapshot.
    pub fn run_tick(&mut self) -> TickReport {
        let report = self.engine.tick(Utc::now());
        let delivered = self.publisher.publish(&report.snapshot);
        self.log.record_tick(report.warnings.len(), delivered > 0);
        report
    }

    /// Run until `running` is cleared or the line channel disconnects.
    ///
    /// `on_tick` sees every tick report, after the snapshot was published.
    pub fn run<F>(&mut self, lines: &Receiver<RawLine>, running: &AtomicBool, mut on_tick: F) -> RunEnd
    where
        F: FnMut(&TickReport),
    {
        let mut next_tick = Instant::now() + self.tick_interval;
        tracing::info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            "scoring loop started"
        );

        while running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= next_tick {
                let report = self.run_tick();
                on_tick(&report);
                next_tick += self.tick_interval;
                continue;
            }

            let wait = (next_tick - now).min(MAX_WAIT);
            match lines.recv_timeout(wait) {
                Ok(line) => {
                    self.handle_line(&line);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::info!(ticks = self.engine.tick_count(), "line source disconnected");
                    return RunEnd::SourceClosed;
                }
            }
        }

        RunEnd::Stopped
    }
}
