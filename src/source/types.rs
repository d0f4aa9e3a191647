//! Types shared by line sources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One line as received from the device, before decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl RawLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// Where lines are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSource {
    /// Standard input
    Stdin,
    /// A serial device node or a captured log file
    Path(PathBuf),
}

impl LineSource {
    /// `-` means standard input, anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            LineSource::Stdin
        } else {
            LineSource::Path(PathBuf::from(arg))
        }
    }
}

impl fmt::Display for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSource::Stdin => f.write_str("stdin"),
            LineSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Errors that can occur while setting up a line source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line reader was already started")]
    AlreadyStarted,

    #[error("Failed to spawn reader thread: {0}")]
    Spawn(#[source] std::io::Error),
}
