//! Trackpoint and logpoint samples and the segments that hold them

use serde::{Deserialize, Serialize};

/// Timestamped position and elevation sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TrackPoint {
    /// Epoch seconds
    pub timestamp: u32,
    /// Degrees
    pub longitude: f64,
    /// Degrees
    pub latitude: f64,
    /// Meters, after smoothing
    pub elevation: f64,
}

/// Timestamped sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LogPoint {
    /// Epoch seconds
    pub timestamp: u32,
    /// km/h
    pub speed: f64,
    /// Beats per minute. Not recorded by the supported logpoint formats.
    pub heartrate: Option<u16>,
    /// Revolutions per minute. Not recorded by the supported logpoint formats.
    pub cadence: Option<u16>,
}

/// Contiguous run of trackpoints sharing one format and one baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TrackPointSegment {
    pub timestamp: u32,
    pub segment_type: u8,
    pub format: u16,
    /// Offset of the matching logpoint segment, relative to the logpoint region
    pub logpoint_offset: u32,
    pub points: Vec<TrackPoint>,
}

/// Contiguous run of logpoints, index-aligned with a [`TrackPointSegment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LogPointSegment {
    pub timestamp: u32,
    pub segment_type: u8,
    pub format: u16,
    pub points: Vec<LogPoint>,
}

/// One step of the time-ordered merge of a trackpoint and a logpoint segment.
///
/// At least one side is always present; both are present when the samples share
/// a timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedSample<'a> {
    pub trackpoint: Option<&'a TrackPoint>,
    pub logpoint: Option<&'a LogPoint>,
}

impl MergedSample<'_> {
    pub fn timestamp(&self) -> u32 {
        match (self.trackpoint, self.logpoint) {
            (Some(tp), _) => tp.timestamp,
            (None, Some(lp)) => lp.timestamp,
            (None, None) => 0,
        }
    }
}
