//! Background line reader feeding a bounded channel.
//!
//! The reader thread splits its input on `\n`, decodes each line lossily
//! (serial links deliver the odd corrupt byte) and stamps the arrival time.
//! The channel disconnects when the input ends or the reader is stopped.

use crate::source::types::{LineSource, RawLine, SourceError};
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Configuration for a [`LineReader`].
#[derive(Debug, Clone)]
pub struct LineReaderConfig {
    pub source: LineSource,
    /// Delay after each line, for replaying captured logs in real time
    pub pace: Option<Duration>,
    /// Capacity of the line channel
    pub capacity: usize,
}

impl Default for LineReaderConfig {
    fn default() -> Self {
        Self {
            source: LineSource::Stdin,
            pace: None,
            capacity: 10_000,
        }
    }
}

/// Reads lines on a background thread.
pub struct LineReader {
    config: LineReaderConfig,
    sender: Option<Sender<RawLine>>,
    receiver: Receiver<RawLine>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl LineReader {
    pub fn new(config: LineReaderConfig) -> Self {
        let (sender, receiver) = bounded(config.capacity.max(1));
        Self {
            config,
            sender: Some(sender),
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Open the configured source and start reading.
    pub fn start(&mut self) -> Result<(), SourceError> {
        match self.config.source.clone() {
            LineSource::Stdin => self.start_with(BufReader::new(std::io::stdin())),
            LineSource::Path(path) => {
                let file = File::open(&path).map_err(|source| SourceError::Open {
                    path: path.clone(),
                    source,
                })?;
                self.start_with(BufReader::new(file))
            }
        }
    }

    /// Start reading from an already opened reader.
    ///
    /// A reader can only be started once; its channel closes for good when
    /// the input ends.
    pub fn start_with<R>(&mut self, reader: R) -> Result<(), SourceError>
    where
        R: BufRead + Send + 'static,
    {
        let sender = self.sender.take().ok_or(SourceError::AlreadyStarted)?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let pace = self.config.pace;
        let source = self.config.source.to_string();

        let handle = thread::Builder::new()
            .name("line-reader".into())
            .spawn(move || {
                read_lines(reader, &sender, &running, pace);
                running.store(false, Ordering::SeqCst);
                tracing::info!(%source, "line source closed");
            })
            .map_err(SourceError::Spawn)?;

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Ask the reader thread to stop after its current line.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for raw lines.
    pub fn receiver(&self) -> &Receiver<RawLine> {
        &self.receiver
    }

    /// Wait for the reader thread to finish, if it has been started.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                tracing::warn!("line reader thread panicked");
            }
        }
    }
}

fn read_lines<R: BufRead>(
    mut reader: R,
    sender: &Sender<RawLine>,
    running: &AtomicBool,
    pace: Option<Duration>,
) {
    let mut buf = Vec::with_capacity(64);

    while running.load(Ordering::SeqCst) {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = RawLine {
                    text: String::from_utf8_lossy(&buf).into_owned(),
                    received_at: Utc::now(),
                };
                if sender.send(line).is_err() {
                    // Receiver gone, nobody is listening any more.
                    break;
                }
                if let Some(delay) = pace {
                    thread::sleep(delay);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("line source read failed: {e}");
                break;
            }
        }
    }
}
