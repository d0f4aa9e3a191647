//! Line sources for the strain sensor agent.
//!
//! The device writes one reading per text line over a serial link. This
//! module reads such lines from stdin, a device node or a captured log and
//! hands them to the scoring loop through a channel.

pub mod reader;
pub mod types;

// Re-export commonly used types
pub use reader::{LineReader, LineReaderConfig};
pub use types::{LineSource, RawLine, SourceError};
