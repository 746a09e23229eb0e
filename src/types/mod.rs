//! Decoded ride history types.
//!
//! Everything the decoders produce is a plain value type that derives `serde`
//! traits, so exporters can serialize decoded rides without touching the decoder:
//! - [`TrackPointSegment`] / [`TrackPoint`] hold position and elevation samples
//! - [`LogPointSegment`] / [`LogPoint`] hold sensor samples
//! - [`Summary`] holds per-lap and whole-ride aggregates
//! - [`OffsetAnomaly`] records a non-fatal irregularity found while decoding

mod anomaly;
mod points;
mod summary;

pub use anomaly::{AnomalyKind, OffsetAnomaly};
pub use points::{LogPoint, LogPointSegment, MergedSample, TrackPoint, TrackPointSegment};
pub use summary::{AvgMax, Summary};
