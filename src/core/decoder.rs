//! Decoding of raw device lines into typed samples.
//!
//! The device prints one reading per line as `<Channel>:<value>`, e.g.
//! `Pressure1:160` or `Tilt: 700`. The channel names are fixed by the
//! firmware. Anything that does not match is line noise from a live byte
//! stream and is dropped without error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One physical sensor signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Accelerometer X axis (`X`)
    AxisX,
    /// Accelerometer Y axis (`Y`)
    AxisY,
    /// Wrist rotation (`Tilt`)
    Tilt,
    /// Right finger pressure pad (`Pressure1`)
    PressureA,
    /// Left finger pressure pad (`Pressure2`)
    PressureB,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 5] = [
        ChannelKind::AxisX,
        ChannelKind::AxisY,
        ChannelKind::Tilt,
        ChannelKind::PressureA,
        ChannelKind::PressureB,
    ];

    /// Name used for this channel on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            ChannelKind::AxisX => "X",
            ChannelKind::AxisY => "Y",
            ChannelKind::Tilt => "Tilt",
            ChannelKind::PressureA => "Pressure1",
            ChannelKind::PressureB => "Pressure2",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.wire_name())
    }
}

/// Returned when a channel name is not part of the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel;

impl FromStr for ChannelKind {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelKind::ALL
            .into_iter()
            .find(|kind| kind.wire_name() == s)
            .ok_or(UnknownChannel)
    }
}

/// A decoded reading, consumed immediately by the sample store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub kind: ChannelKind,
    pub value: f64,
    pub arrived_at: DateTime<Utc>,
}

impl RawSample {
    pub fn new(kind: ChannelKind, value: f64, arrived_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            value,
            arrived_at,
        }
    }
}

/// Decode one line into a channel and its value.
///
/// Returns `None` for anything that is not exactly `<Channel>:<digits>`
/// after trimming; whitespace between the colon and the digits is allowed.
pub fn decode_line(line: &str) -> Option<(ChannelKind, f64)> {
    let (name, value) = line.trim().split_once(':')?;
    let kind = name.parse::<ChannelKind>().ok()?;

    let digits = value.trim_start();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let value = digits.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some((kind, value))
}
