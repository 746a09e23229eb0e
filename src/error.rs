//! Error types for flash history decoding.
//!
//! Every fatal condition raised while decoding a dump is a [`DecodeError`].
//! Recoverable irregularities (offset drift between chained records) are not
//! errors; they are reported as [`OffsetAnomaly`](crate::OffsetAnomaly) records
//! and decoding continues.
//!
//! ## Error Categories
//!
//! - **Format Errors**: a segment carries a format tag the decoder does not know
//! - **Chain Errors**: the trackpoint and logpoint chains disagree with each other,
//!   or the trackpoint chain loops back on itself
//! - **Byte Source Errors**: the dump could not be read (I/O, out-of-range offset)
//! - **Config Errors**: a device profile could not be loaded
//!
//! ## Per-track Failures
//!
//! A decode error only ever aborts the track being decoded. Other tracks in the
//! same history remain decodable:
//!
//! ```rust
//! use ridelog::{DecodeError, SampleStream};
//!
//! let error = DecodeError::unrecognized_format(SampleStream::Trackpoints, 0x0199, 12, 0x36018);
//! assert!(error.is_format_error());
//! assert!(!error.is_device_fault());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for decode operations.
pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

/// Which of the two chained sample streams a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum SampleStream {
    Trackpoints,
    Logpoints,
}

impl std::fmt::Display for SampleStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleStream::Trackpoints => f.write_str("trackpoint"),
            SampleStream::Logpoints => f.write_str("logpoint"),
        }
    }
}

/// Main error type for decode operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("Unrecognized {stream} segment format {format:#06x} ({count} points) at offset {offset:#x}")]
    UnrecognizedFormat { stream: SampleStream, format: u16, count: u32, offset: u64 },

    #[error("Trackpoint chain revisits the segment at offset {offset:#x}")]
    ChainLoop { offset: u64 },

    #[error(
        "Segment {index}: trackpoint segment type {trackpoint:#04x} does not match logpoint segment type {logpoint:#04x}"
    )]
    SegmentTypeMismatch { index: usize, trackpoint: u8, logpoint: u8 },

    #[error("Read of {len} bytes at offset {offset:#x} is outside the dump ({available} bytes)")]
    OutOfRange { offset: u64, len: usize, available: usize },

    #[error("Flash dump file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Byte source failure: {reason}")]
    Source {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Device profile error in {context}: {details}")]
    Config { context: String, details: String },
}

impl DecodeError {
    /// Returns whether the failure comes from reading the device rather than
    /// from the content of the dump.
    pub fn is_device_fault(&self) -> bool {
        match self {
            DecodeError::OutOfRange { .. } => true,
            DecodeError::File { .. } => true,
            DecodeError::Source { .. } => true,
            DecodeError::UnrecognizedFormat { .. } => false,
            DecodeError::SegmentTypeMismatch { .. } => false,
            DecodeError::ChainLoop { .. } => false,
            DecodeError::Config { .. } => false,
        }
    }

    /// Returns whether the dump uses a record format this decoder does not support.
    pub fn is_format_error(&self) -> bool {
        matches!(self, DecodeError::UnrecognizedFormat { .. })
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            DecodeError::UnrecognizedFormat { .. } => vec![
                "Skip this track and decode the rest of the history",
                "Capture the dump so the new format can be added",
            ],
            DecodeError::SegmentTypeMismatch { .. } => vec![
                "Check that the device profile matches the device model",
                "Re-read the dump from the device",
            ],
            DecodeError::ChainLoop { .. } => vec![
                "Skip this track and decode the rest of the history",
                "Re-read the dump from the device",
            ],
            DecodeError::OutOfRange { .. } => vec![
                "Check that the dump is complete",
                "Check that the device profile matches the device model",
            ],
            DecodeError::File { .. } => {
                vec!["Check file exists and is readable", "Check file permissions"]
            }
            DecodeError::Source { .. } => {
                vec!["Reconnect the device", "Retry the read"]
            }
            DecodeError::Config { .. } => {
                vec!["Check the profile YAML syntax", "Remove unknown keys from the profile"]
            }
        }
    }

    /// Helper constructor for unknown segment formats.
    pub fn unrecognized_format(stream: SampleStream, format: u16, count: u32, offset: u64) -> Self {
        DecodeError::UnrecognizedFormat { stream, format, count, offset }
    }

    /// Helper constructor for out-of-range reads.
    pub fn out_of_range(offset: u64, len: usize, available: usize) -> Self {
        DecodeError::OutOfRange { offset, len, available }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        DecodeError::File { path, source }
    }

    /// Helper constructor for failures reported by an external byte source.
    pub fn source_failed(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        DecodeError::Source { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for profile errors.
    pub fn config_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        DecodeError::Config { context: context.into(), details: details.into() }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_yaml_ng::Error> for DecodeError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        DecodeError::Config { context: "YAML parsing".to_string(), details: err.to_string() }
    }
}
