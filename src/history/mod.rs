//! Ride history decoding
//!
//! [`read_history`] turns the device's history table into a list of [`Track`]s.
//! A track holds only the table metadata until one of its accessors is called;
//! each decoded part (trackpoint chain, logpoint segments, summaries) is then
//! computed once and cached on the track.
//!
//! Decoding a track never depends on another track, so a caller can skip a
//! track that fails and keep the rest:
//!
//! ```rust,no_run
//! use ridelog::{DeviceModel, FlashDump, decode_history, read_history};
//!
//! fn export() -> ridelog::Result<()> {
//!     let dump = FlashDump::open("rider20.bin")?;
//!     let tracks = read_history(&dump, DeviceModel::Rider20.layout())?;
//!     for (track, record) in tracks.iter().zip(decode_history(&tracks)) {
//!         match record {
//!             Ok(ride) => println!("{}: {} laps", ride.name, ride.laps.len()),
//!             Err(e) => eprintln!("skipping {}: {}", track.name, e),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! The caches are `once_cell::sync::OnceCell`s, so a `Track` may be shared between
//! threads and every part is still decoded at most once.

pub mod index;
pub mod logpoints;
pub mod merge;
pub mod smoothing;
pub mod summary;
pub mod trackpoints;

pub use index::{read_history, read_record};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dump::ByteSource;
use crate::{
    LogPointSegment, MemoryLayout, MergedSample, OffsetAnomaly, Result, Summary,
    TrackPointSegment,
};

/// Decode result together with the non-fatal anomalies found producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub anomalies: Vec<OffsetAnomaly>,
}

/// Whole-ride summary and the complete lap list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct RideSummary {
    pub summary: Summary,
    /// Recorded laps, plus the reconstructed trailing lap when there is one
    pub laps: Vec<Summary>,
    /// Whether the last entry of `laps` was reconstructed rather than recorded
    pub synthesized_last_lap: bool,
}

/// Owned snapshot of a fully decoded track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct RideRecord {
    pub timestamp: u32,
    pub name: String,
    pub trackpoints: Vec<TrackPointSegment>,
    pub logpoints: Vec<LogPointSegment>,
    pub summary: Summary,
    pub laps: Vec<Summary>,
    pub synthesized_last_lap: bool,
    pub anomalies: Vec<OffsetAnomaly>,
}

/// Metadata of one history table record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    /// Epoch seconds
    pub timestamp: u32,
    pub name: String,
    pub lap_count: u8,
    /// Relative to the trackpoint region
    pub trackpoints_offset: u32,
    /// Relative to the summary region
    pub summary_offset: u32,
    /// Relative to the summary region; only present when `lap_count > 0`
    pub laps_offset: Option<u32>,
}

/// One recorded ride.
pub struct Track<'d> {
    source: &'d dyn ByteSource,
    layout: MemoryLayout,
    /// Epoch seconds
    pub timestamp: u32,
    pub name: String,
    pub lap_count: u8,
    trackpoints_offset: u32,
    summary_offset: u32,
    laps_offset: Option<u32>,
    trackpoints: OnceCell<Decoded<Vec<TrackPointSegment>>>,
    logpoints: OnceCell<Decoded<Vec<LogPointSegment>>>,
    summaries: OnceCell<Decoded<RideSummary>>,
}

impl std::fmt::Debug for Track<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Track")
            .field("timestamp", &self.timestamp)
            .field("name", &self.name)
            .field("lap_count", &self.lap_count)
            .field("trackpoints_offset", &self.trackpoints_offset)
            .field("summary_offset", &self.summary_offset)
            .field("laps_offset", &self.laps_offset)
            .finish_non_exhaustive()
    }
}

impl<'d> Track<'d> {
    pub(crate) fn new(source: &'d dyn ByteSource, layout: MemoryLayout, record: TrackRecord) -> Self {
        let TrackRecord {
            timestamp,
            name,
            lap_count,
            trackpoints_offset,
            summary_offset,
            laps_offset,
        } = record;

        Self {
            source,
            layout,
            timestamp,
            name,
            lap_count,
            trackpoints_offset,
            summary_offset,
            laps_offset,
            trackpoints: OnceCell::new(),
            logpoints: OnceCell::new(),
            summaries: OnceCell::new(),
        }
    }

    /// Offset of the first trackpoint segment, relative to the trackpoint region.
    pub fn trackpoints_offset(&self) -> u32 {
        self.trackpoints_offset
    }

    /// Offset of the ride summary, relative to the summary region.
    pub fn summary_offset(&self) -> u32 {
        self.summary_offset
    }

    /// Offset of the first lap record, relative to the summary region.
    pub fn laps_offset(&self) -> Option<u32> {
        self.laps_offset
    }

    fn decoded_trackpoints(&self) -> Result<&Decoded<Vec<TrackPointSegment>>> {
        self.trackpoints.get_or_try_init(|| {
            trackpoints::read_trackpoint_segments(self.source, &self.layout, self.trackpoints_offset)
        })
    }

    fn decoded_logpoints(&self) -> Result<&Decoded<Vec<LogPointSegment>>> {
        self.logpoints.get_or_try_init(|| {
            let segments = self.trackpoints()?;
            logpoints::read_logpoint_segments(self.source, &self.layout, segments)
        })
    }

    fn decoded_summaries(&self) -> Result<&Decoded<RideSummary>> {
        self.summaries.get_or_try_init(|| {
            let recorded = summary::read_summaries(
                self.source,
                &self.layout,
                self.summary_offset,
                self.laps_offset,
                self.lap_count,
            )?;
            let summary::RecordedSummaries { summary, mut laps } = recorded.value;

            let mut synthesized_last_lap = false;
            if laps.last().is_some_and(|last| last.end < summary.end) {
                let merged = self.merged_segments()?;
                if let Some(lap) =
                    summary::synthesize_last_lap(&laps, &summary, merged.into_iter().flatten())
                {
                    laps.push(lap);
                    synthesized_last_lap = true;
                }
            }

            Ok(Decoded {
                value: RideSummary { summary, laps, synthesized_last_lap },
                anomalies: recorded.anomalies,
            })
        })
    }

    /// Trackpoint segments, decoded on first access.
    pub fn trackpoints(&self) -> Result<&[TrackPointSegment]> {
        Ok(&self.decoded_trackpoints()?.value)
    }

    /// Logpoint segments, index-aligned with [`trackpoints`](Self::trackpoints).
    pub fn logpoints(&self) -> Result<&[LogPointSegment]> {
        Ok(&self.decoded_logpoints()?.value)
    }

    /// Each trackpoint/logpoint segment pair merged in time order.
    pub fn merged_segments(&self) -> Result<Vec<Vec<MergedSample<'_>>>> {
        let trackpoints = self.trackpoints()?;
        let logpoints = self.logpoints()?;
        Ok(merge::merge_segments(trackpoints, logpoints))
    }

    /// Whole-ride summary and lap list, including a reconstructed trailing lap.
    pub fn ride_summary(&self) -> Result<&RideSummary> {
        Ok(&self.decoded_summaries()?.value)
    }

    pub fn summary(&self) -> Result<&Summary> {
        Ok(&self.ride_summary()?.summary)
    }

    pub fn laps(&self) -> Result<&[Summary]> {
        Ok(&self.ride_summary()?.laps)
    }

    /// Anomalies found by every part decoded so far.
    pub fn anomalies(&self) -> Vec<OffsetAnomaly> {
        let trackpoints = self.trackpoints.get().map(|d| d.anomalies.as_slice());
        let logpoints = self.logpoints.get().map(|d| d.anomalies.as_slice());
        let summaries = self.summaries.get().map(|d| d.anomalies.as_slice());
        [trackpoints, logpoints, summaries].into_iter().flatten().flatten().copied().collect()
    }

    /// Decode every part of the track and return an owned snapshot.
    pub fn decode(&self) -> Result<RideRecord> {
        let trackpoints = self.trackpoints()?.to_vec();
        let logpoints = self.logpoints()?.to_vec();
        let ride = self.ride_summary()?.clone();

        Ok(RideRecord {
            timestamp: self.timestamp,
            name: self.name.clone(),
            trackpoints,
            logpoints,
            summary: ride.summary,
            laps: ride.laps,
            synthesized_last_lap: ride.synthesized_last_lap,
            anomalies: self.anomalies(),
        })
    }
}

/// Decode every track, keeping failures per track.
pub fn decode_history(tracks: &[Track<'_>]) -> Vec<Result<RideRecord>> {
    tracks
        .iter()
        .map(|track| {
            let record = track.decode();
            if let Err(e) = &record {
                warn!(name = %track.name, timestamp = track.timestamp, error = %e, "Track failed to decode");
            }
            record
        })
        .collect()
}
