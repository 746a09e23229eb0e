//! Trackpoint segment chain
//!
//! Trackpoints are stored as a linked chain of variable-length segments. Each
//! segment header carries a baseline position, elevation and timestamp followed by
//! `count` 6-byte delta records:
//!
//! | Offset | Field                                          |
//! |--------|------------------------------------------------|
//! | 0x00   | u32 timestamp                                  |
//! | 0x04   | i32 start longitude, micro-degrees             |
//! | 0x08   | i32 start latitude, micro-degrees              |
//! | 0x14   | u16 elevation baseline, `(raw - 4000) / 4` m   |
//! | 0x18   | u16 format tag                                 |
//! | 0x1a   | u8 segment type                                |
//! | 0x1c   | u32 next segment, relative, or `0xFFFFFFFF`    |
//! | 0x20   | u32 delta record count                         |
//! | 0x24   | u32 logpoint segment offset, relative          |
//! | 0x28   | delta records                                  |
//!
//! The firmware sometimes writes one more delta record than the header count
//! admits, so the position reached after a body can trail the next-segment pointer
//! by a few bytes. That gap is skipped silently; anything else is recorded as an
//! [`OffsetAnomaly`] and the cursor jumps to the declared offset. A chain that
//! leads back to a segment it already decoded fails with
//! [`DecodeError::ChainLoop`].

use std::collections::HashSet;

use tracing::{debug, trace};

use super::Decoded;
use super::smoothing::smooth_elevation;
use crate::dump::cursor::region_offset;
use crate::dump::{ByteSource, Cursor, Position};
use crate::{
    AnomalyKind, DecodeError, MemoryLayout, OffsetAnomaly, Result, SampleStream, TrackPoint,
    TrackPointSegment,
};

/// Next-segment pointer that terminates the chain.
pub const END_OF_CHAIN: u32 = 0xFFFF_FFFF;

/// Largest forward gap between a body and the next segment that is expected.
pub const TOLERATED_DRIFT: i64 = 6;

const HEADER_LEN: u32 = 0x28;
const DELTA_LEN: u32 = 6;

const FORMATS: [u16; 2] = [0x0160, 0x0161];
const EMPTY_FORMATS: [u16; 2] = [0x0140, 0x0141];

/// How to get from the end of one segment to the start of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStep {
    /// Cursor already sits on the next segment
    Continue,
    /// Small forward gap left by an unreported trailing point
    Skip(u32),
    /// Gap outside the tolerated range; resynchronize and report
    Drift(i64),
}

/// Classify the gap between `position` and the declared next segment.
pub fn chain_step(position: Position, declared: u32) -> ChainStep {
    match position.diff_to(declared) {
        0 => ChainStep::Continue,
        diff @ 1..=TOLERATED_DRIFT => ChainStep::Skip(diff as u32),
        diff => ChainStep::Drift(diff),
    }
}

/// Whether a trackpoint segment with this format and count can be decoded.
pub fn is_supported_format(format: u16, count: u32) -> bool {
    FORMATS.contains(&format) || (count == 0 && EMPTY_FORMATS.contains(&format))
}

/// Decode the whole chain starting at `chain_offset` (relative to the trackpoint region).
pub fn read_trackpoint_segments(
    source: &dyn ByteSource,
    layout: &MemoryLayout,
    chain_offset: u32,
) -> Result<Decoded<Vec<TrackPointSegment>>> {
    let start = region_offset(layout.trackpoints, chain_offset)?;
    let mut cursor = source.read_from_offset(start)?;
    let mut segments = Vec::new();
    let mut anomalies = Vec::new();
    let mut visited = HashSet::new();

    loop {
        let offset = cursor.absolute();
        if !visited.insert(offset) {
            return Err(DecodeError::ChainLoop { offset });
        }

        let (segment, next) = read_trackpoint_segment(&mut cursor)?;
        segments.push(segment);

        if next == END_OF_CHAIN {
            break;
        }

        let declared = region_offset(layout.trackpoints, next)?;
        match chain_step(cursor.position(), declared) {
            ChainStep::Continue => {}
            ChainStep::Skip(bytes) => {
                trace!(bytes, "Skipping unreported trailing trackpoint");
                cursor.advance(bytes);
            }
            ChainStep::Drift(diff) => {
                anomalies.push(OffsetAnomaly::record(
                    AnomalyKind::TrackpointChain,
                    declared,
                    cursor.position(),
                ));
                match u32::try_from(diff) {
                    Ok(bytes) => cursor.advance(bytes),
                    Err(_) => cursor = source.read_from_offset(declared)?,
                }
            }
        }
    }

    debug!(segments = segments.len(), anomalies = anomalies.len(), "Decoded trackpoint chain");
    Ok(Decoded { value: segments, anomalies })
}

/// Decode one segment and leave the cursor just past its body.
///
/// Returns the segment and its raw next-segment pointer.
pub fn read_trackpoint_segment(cursor: &mut Cursor<'_>) -> Result<(TrackPointSegment, u32)> {
    let timestamp = cursor.u32_at(0x00)?;
    let lon_start = cursor.i32_at(0x04)?;
    let lat_start = cursor.i32_at(0x08)?;
    let elevation_start = (f64::from(cursor.u16_at(0x14)?) - 4000.0) / 4.0;
    let format = cursor.u16_at(0x18)?;
    let segment_type = cursor.u8_at(0x1a)?;
    let next = cursor.u32_at(0x1c)?;
    let count = cursor.u32_at(0x20)?;
    let logpoint_offset = cursor.u32_at(0x24)?;

    if !is_supported_format(format, count) {
        return Err(DecodeError::unrecognized_format(
            SampleStream::Trackpoints,
            format,
            count,
            cursor.absolute(),
        ));
    }

    trace!(
        offset = format_args!("{:#x}", cursor.absolute()),
        timestamp, format, segment_type, count, "Trackpoint segment header"
    );

    cursor.advance(HEADER_LEN);

    let points = if count > 0 {
        read_trackpoints(cursor, timestamp, lon_start, lat_start, elevation_start, count)?
    } else {
        Vec::new()
    };

    let segment = TrackPointSegment { timestamp, segment_type, format, logpoint_offset, points };
    Ok((segment, next))
}

/// Expand `count` delta records into `count + 1` points, baseline first.
fn read_trackpoints(
    cursor: &mut Cursor<'_>,
    timestamp: u32,
    lon: i32,
    lat: i32,
    elevation: f64,
    count: u32,
) -> Result<Vec<TrackPoint>> {
    let mut time = timestamp;
    let mut lon = i64::from(lon);
    let mut lat = i64::from(lat);
    let mut elevation = elevation;

    let capacity = (count as usize).min(cursor.remaining() / DELTA_LEN as usize);
    let mut points = Vec::with_capacity(capacity + 1);
    points.push(TrackPoint {
        timestamp: time,
        longitude: lon as f64 / 1_000_000.0,
        latitude: lat as f64 / 1_000_000.0,
        elevation,
    });

    for _ in 0..count {
        time = time.wrapping_add(u32::from(cursor.u8_at(0x05)?));

        let code = cursor.i8_at(0x04)?;
        if code != -1 && code != 0 {
            elevation = (f64::from(code) - 10.0) * 10.0;
        }

        lon += i64::from(cursor.i16_at(0x00)?);
        lat += i64::from(cursor.i16_at(0x02)?);

        points.push(TrackPoint {
            timestamp: time,
            longitude: lon as f64 / 1_000_000.0,
            latitude: lat as f64 / 1_000_000.0,
            elevation,
        });

        cursor.advance(DELTA_LEN);
    }

    smooth_elevation(&mut points);
    Ok(points)
}
