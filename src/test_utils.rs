//! Synthetic flash images for tests and benchmarks
//!
//! Real dumps contain personal ride data, so the decoders are exercised against
//! images assembled here. [`DumpBuilder`] writes records at the same offsets the
//! device firmware uses; [`synthetic_ride`] assembles a complete two-lap history
//! whose trailing lap has to be reconstructed.

use crate::{DeviceModel, FlashDump, MemoryLayout};

/// Format tag of a regular trackpoint segment.
pub const TRACKPOINT_FORMAT: u16 = 0x0160;
/// Format tag of a logpoint segment holding speed only.
pub const LOGPOINT_FORMAT: u16 = 0x0104;
/// Terminal "next segment" pointer.
pub const END_OF_CHAIN: u32 = 0xFFFF_FFFF;

/// One 6-byte trackpoint delta record.
#[derive(Debug, Clone, Copy)]
pub struct Delta {
    pub lon: i16,
    pub lat: i16,
    pub elevation: i8,
    pub dt: u8,
}

impl Delta {
    pub fn new(lon: i16, lat: i16, elevation: i8, dt: u8) -> Self {
        Self { lon, lat, elevation, dt }
    }
}

/// Trackpoint segment header and body.
#[derive(Debug, Clone)]
pub struct TrackSegmentSpec {
    pub timestamp: u32,
    pub lon: i32,
    pub lat: i32,
    /// Raw baseline; meters are `(raw - 4000) / 4`
    pub elevation_raw: u16,
    pub format: u16,
    pub segment_type: u8,
    /// Relative next-segment pointer, or [`END_OF_CHAIN`]
    pub next: u32,
    /// Relative offset of the matching logpoint segment
    pub logpoint_offset: u32,
    pub deltas: Vec<Delta>,
}

impl TrackSegmentSpec {
    pub fn new(timestamp: u32, deltas: Vec<Delta>) -> Self {
        Self {
            timestamp,
            lon: 10_000_000,
            lat: 20_000_000,
            elevation_raw: 4200,
            format: TRACKPOINT_FORMAT,
            segment_type: 1,
            next: END_OF_CHAIN,
            logpoint_offset: 0,
            deltas,
        }
    }

    /// Encoded size of header plus body.
    pub fn len(&self) -> u32 {
        0x28 + 6 * self.deltas.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

/// Logpoint segment header and body.
#[derive(Debug, Clone)]
pub struct LogSegmentSpec {
    pub timestamp: u32,
    pub format: u16,
    pub segment_type: u8,
    /// Raw speed bytes; km/h are `raw / 8 * 3.6`
    pub speeds: Vec<u8>,
}

impl LogSegmentSpec {
    pub fn new(timestamp: u32, speeds: Vec<u8>) -> Self {
        Self { timestamp, format: LOGPOINT_FORMAT, segment_type: 1, speeds }
    }

    pub fn len(&self) -> u32 {
        0x10 + self.speeds.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }
}

/// Raw 32-byte summary record.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryRecord {
    pub start: u32,
    pub end: u32,
    pub distance: u32,
    pub ride_time: u32,
    pub calories: u16,
    pub altitude_gain: u16,
    pub altitude_loss: u16,
    pub speed: (u8, u8),
    pub heartrate: (u8, u8),
    pub cadence: (u8, u8),
}

/// One 156-byte history table record.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub timestamp: u32,
    pub name: String,
    pub trackpoints: u32,
    pub summary: u32,
    pub laps: u32,
    pub lap_count: u8,
}

/// Writes device records into an erased (0xFF-filled) flash image.
#[derive(Debug, Clone)]
pub struct DumpBuilder {
    data: Vec<u8>,
    layout: MemoryLayout,
}

impl DumpBuilder {
    pub fn new(layout: MemoryLayout, size: usize) -> Self {
        Self { data: vec![0xFF; size], layout }
    }

    /// Image large enough for every Rider 20 region.
    pub fn rider20() -> Self {
        let layout = DeviceModel::Rider20.layout();
        Self::new(layout, layout.logpoints as usize + 0x4000)
    }

    pub fn layout(&self) -> MemoryLayout {
        self.layout
    }

    pub fn write_bytes(&mut self, offset: u32, bytes: &[u8]) -> &mut Self {
        let start = offset as usize;
        let end = start + bytes.len();
        if end > self.data.len() {
            self.data.resize(end, 0xFF);
        }
        self.data[start..end].copy_from_slice(bytes);
        self
    }

    pub fn write_u8(&mut self, offset: u32, value: u8) -> &mut Self {
        self.write_bytes(offset, &[value])
    }

    pub fn write_u16(&mut self, offset: u32, value: u16) -> &mut Self {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    pub fn write_u32(&mut self, offset: u32, value: u32) -> &mut Self {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Write a trackpoint segment at `rel` in the trackpoint region.
    ///
    /// The header count is the number of delta records. Returns the relative offset
    /// just past the body.
    pub fn trackpoint_segment(&mut self, rel: u32, spec: &TrackSegmentSpec) -> u32 {
        self.trackpoint_segment_with_count(rel, spec, spec.deltas.len() as u32)
    }

    /// Like [`trackpoint_segment`](Self::trackpoint_segment) with an explicit header count.
    pub fn trackpoint_segment_with_count(
        &mut self,
        rel: u32,
        spec: &TrackSegmentSpec,
        count: u32,
    ) -> u32 {
        let at = self.layout.trackpoints + rel;
        let mut header = [0u8; 0x28];
        header[0x00..0x04].copy_from_slice(&spec.timestamp.to_le_bytes());
        header[0x04..0x08].copy_from_slice(&spec.lon.to_le_bytes());
        header[0x08..0x0c].copy_from_slice(&spec.lat.to_le_bytes());
        header[0x14..0x16].copy_from_slice(&spec.elevation_raw.to_le_bytes());
        header[0x18..0x1a].copy_from_slice(&spec.format.to_le_bytes());
        header[0x1a] = spec.segment_type;
        header[0x1c..0x20].copy_from_slice(&spec.next.to_le_bytes());
        header[0x20..0x24].copy_from_slice(&count.to_le_bytes());
        header[0x24..0x28].copy_from_slice(&spec.logpoint_offset.to_le_bytes());
        self.write_bytes(at, &header);

        let mut body = Vec::with_capacity(spec.deltas.len() * 6);
        for delta in &spec.deltas {
            body.extend_from_slice(&delta.lon.to_le_bytes());
            body.extend_from_slice(&delta.lat.to_le_bytes());
            body.push(delta.elevation as u8);
            body.push(delta.dt);
        }
        self.write_bytes(at + 0x28, &body);
        rel + spec.len()
    }

    /// Write a logpoint segment at `rel` in the logpoint region.
    ///
    /// Returns the relative offset just past the body.
    pub fn logpoint_segment(&mut self, rel: u32, spec: &LogSegmentSpec) -> u32 {
        let at = self.layout.logpoints + rel;
        let mut header = [0u8; 0x10];
        header[0x00..0x04].copy_from_slice(&spec.timestamp.to_le_bytes());
        header[0x08..0x0a].copy_from_slice(&spec.format.to_le_bytes());
        header[0x0a..0x0c].copy_from_slice(&(spec.speeds.len() as u16).to_le_bytes());
        header[0x0c] = spec.segment_type;
        self.write_bytes(at, &header);
        self.write_bytes(at + 0x10, &spec.speeds);
        rel + spec.len()
    }

    /// Write a summary record at `rel` in the summary region.
    pub fn summary(&mut self, rel: u32, record: &SummaryRecord) -> &mut Self {
        let mut bytes = [0u8; 32];
        bytes[0x00..0x04].copy_from_slice(&record.start.to_le_bytes());
        bytes[0x04..0x08].copy_from_slice(&record.end.to_le_bytes());
        bytes[0x08..0x0c].copy_from_slice(&record.distance.to_le_bytes());
        bytes[0x0c..0x10].copy_from_slice(&record.ride_time.to_le_bytes());
        bytes[0x10..0x12].copy_from_slice(&record.calories.to_le_bytes());
        bytes[0x12..0x14].copy_from_slice(&record.altitude_gain.to_le_bytes());
        bytes[0x14..0x16].copy_from_slice(&record.altitude_loss.to_le_bytes());
        bytes[0x16] = record.speed.0;
        bytes[0x17] = record.speed.1;
        bytes[0x18] = record.heartrate.0;
        bytes[0x19] = record.heartrate.1;
        bytes[0x1a] = record.cadence.0;
        bytes[0x1b] = record.cadence.1;
        let at = self.layout.summaries + rel;
        self.write_bytes(at, &bytes)
    }

    /// Write the history table header and records.
    pub fn history(&mut self, records: &[HistoryRecord]) -> &mut Self {
        let base = self.layout.history;
        let mut header = [0u8; 24];
        header[0x08..0x0a].copy_from_slice(&(records.len() as u16).to_le_bytes());
        self.write_bytes(base, &header);

        for (i, record) in records.iter().enumerate() {
            let mut bytes = [0u8; 156];
            bytes[0x00..0x04].copy_from_slice(&record.timestamp.to_le_bytes());
            let name = record.name.as_bytes();
            let len = name.len().min(16);
            bytes[0x04..0x04 + len].copy_from_slice(&name[..len]);
            bytes[0x88..0x8c].copy_from_slice(&record.trackpoints.to_le_bytes());
            bytes[0x8c..0x90].copy_from_slice(&record.summary.to_le_bytes());
            bytes[0x90..0x94].copy_from_slice(&record.laps.to_le_bytes());
            bytes[0x94] = record.lap_count;
            self.write_bytes(base + 24 + 156 * i as u32, &bytes);
        }
        self
    }

    pub fn build(self) -> FlashDump {
        FlashDump::from_bytes(self.data)
    }
}

/// Start of the synthetic ride, epoch seconds.
pub const RIDE_START: u32 = 1_600_000_000;

/// A two-segment ride with two recorded laps and an unrecorded trailing lap.
///
/// - segment 0: 11 trackpoints, 10 s apart, and 26 logpoints
/// - segment 1: 11 trackpoints, 10 s apart, starting 100 s after segment 0 ends
/// - laps: `[0, 60)` and `[60, 120)` relative to [`RIDE_START`], ride ends at +300
///
/// The second track in the history points at a trackpoint segment with an
/// unknown format so callers can check that one bad track does not affect others.
pub fn synthetic_ride() -> FlashDump {
    let mut builder = DumpBuilder::rider20();

    let deltas: Vec<Delta> = (0..10).map(|i| Delta::new(100, -50, 20 + i as i8, 10)).collect();

    let mut first = TrackSegmentSpec::new(RIDE_START, deltas.clone());
    first.logpoint_offset = 0;
    let first_end = builder.trackpoint_segment(0, &first);
    first.next = first_end;
    builder.trackpoint_segment(0, &first);

    let first_log = LogSegmentSpec::new(RIDE_START, (0..26).map(|i| 40 + i as u8).collect());
    let log_end = builder.logpoint_segment(0, &first_log);

    let mut second = TrackSegmentSpec::new(RIDE_START + 200, deltas);
    second.lon = 10_001_000;
    second.lat = 19_999_500;
    second.logpoint_offset = log_end;
    builder.trackpoint_segment(first_end, &second);

    let second_log = LogSegmentSpec::new(RIDE_START + 200, (0..26).map(|i| 80 + i as u8).collect());
    builder.logpoint_segment(log_end, &second_log);

    builder
        .summary(0, &SummaryRecord {
            start: RIDE_START,
            end: RIDE_START + 60,
            distance: 500,
            ride_time: 60,
            calories: 10,
            altitude_gain: 5,
            altitude_loss: 1,
            speed: (64, 80),
            ..SummaryRecord::default()
        })
        .summary(32, &SummaryRecord {
            start: RIDE_START + 60,
            end: RIDE_START + 120,
            distance: 700,
            ride_time: 120,
            calories: 14,
            altitude_gain: 7,
            altitude_loss: 2,
            speed: (72, 96),
            ..SummaryRecord::default()
        })
        .summary(64, &SummaryRecord {
            start: RIDE_START,
            end: RIDE_START + 300,
            distance: 2500,
            ride_time: 280,
            calories: 50,
            altitude_gain: 30,
            altitude_loss: 9,
            speed: (76, 110),
            heartrate: (130, 171),
            cadence: (0, 0),
        });

    let mut broken = TrackSegmentSpec::new(RIDE_START + 10_000, vec![Delta::new(1, 1, 0, 1)]);
    broken.format = 0x0199;
    builder.trackpoint_segment(0x2000, &broken);
    builder.summary(0x200, &SummaryRecord {
        start: RIDE_START + 10_000,
        end: RIDE_START + 10_001,
        ..SummaryRecord::default()
    });

    builder.history(&[
        HistoryRecord {
            timestamp: RIDE_START,
            name: "Morning loop".to_string(),
            trackpoints: 0,
            summary: 64,
            laps: 0,
            lap_count: 2,
        },
        HistoryRecord {
            timestamp: RIDE_START + 10_000,
            name: "Broken".to_string(),
            trackpoints: 0x2000,
            summary: 0x200,
            laps: 0,
            lap_count: 0,
        },
    ]);

    builder.build()
}
