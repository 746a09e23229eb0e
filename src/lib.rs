//! Decoder for ride history stored in the flash memory of Rider 20 cycling computers.
//!
//! ridelog reads a raw flash image and reconstructs every recorded ride: GPS
//! trackpoints with smoothed elevation, speed logpoints, per-lap summaries and the
//! whole-ride summary.
//!
//! # Features
//!
//! - **History table**: one [`Track`] per recorded ride, decoded lazily
//! - **Drift tolerant**: small offset drift between chained records is corrected
//!   and reported as [`OffsetAnomaly`] records instead of failing the ride
//! - **Lap reconstruction**: the lap still running when a ride was stopped is
//!   rebuilt from the ride totals and the samples
//! - **Per-track failures**: a corrupted ride never prevents decoding the others
//!
//! ## Example
//!
//! ```rust,no_run
//! use ridelog::{DeviceModel, FlashDump, read_history};
//!
//! fn main() -> ridelog::Result<()> {
//!     let dump = FlashDump::open("rider20.bin")?;
//!     for track in read_history(&dump, DeviceModel::Rider20.layout())? {
//!         let summary = track.summary()?;
//!         println!("{}: {:.1} km in {} laps", track.name, summary.distance / 1000.0, track.laps()?.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Memory offsets for other firmware revisions can be supplied through a
//! [`DeviceProfile`] loaded from YAML.

// Core types and error handling
mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

// Data source
pub mod dump;
pub mod profile;

// Decoders
pub mod history;

// Core exports
pub use error::*;
pub use types::*;

pub use dump::{ByteSource, Cursor, FlashDump, Position};
pub use profile::{DeviceModel, DeviceProfile, LayoutOverrides, MemoryLayout};

// Main API exports
pub use history::{
    Decoded, RideRecord, RideSummary, Track, TrackRecord, decode_history, read_history,
};
