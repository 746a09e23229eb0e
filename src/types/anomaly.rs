//! Non-fatal decode diagnostics

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dump::Position;

/// Where the cursor diverged from a declared offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum AnomalyKind {
    /// Next-segment pointer of the trackpoint chain outside the tolerated skip
    TrackpointChain,
    /// Logpoint segment not contiguous with the previous one
    LogpointChain,
    /// Ride summary not directly after the lap block
    SummaryOffset,
}

/// Cursor position that did not match a chain- or table-declared offset.
///
/// The decoder resynchronizes to `declared` and keeps going; the record is kept so
/// callers can judge how trustworthy a decoded track is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct OffsetAnomaly {
    pub kind: AnomalyKind,
    /// Absolute offset the chain or table pointed at
    pub declared: u32,
    /// Absolute offset the cursor had reached
    pub actual: u64,
    /// `declared - actual`
    pub diff: i64,
}

impl OffsetAnomaly {
    /// Build the record and emit it as a warning.
    pub(crate) fn record(kind: AnomalyKind, declared: u32, position: Position) -> Self {
        let anomaly = Self {
            kind,
            declared,
            actual: position.absolute(),
            diff: position.diff_to(declared),
        };
        warn!(
            kind = ?anomaly.kind,
            declared = format_args!("{:#x}", anomaly.declared),
            actual = format_args!("{:#x}", anomaly.actual),
            diff = anomaly.diff,
            "Unexpected offset, resynchronizing"
        );
        anomaly
    }
}
