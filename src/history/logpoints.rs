//! Logpoint segments
//!
//! Every trackpoint segment names the offset of a logpoint segment holding the
//! sensor samples recorded over the same interval. Logpoint segments are written
//! back to back, so the decoder keeps a single cursor running across them and only
//! re-seeks when a trackpoint header points somewhere else.

use tracing::{debug, trace};

use super::Decoded;
use crate::dump::cursor::region_offset;
use crate::dump::{ByteSource, Cursor};
use crate::{
    AnomalyKind, DecodeError, LogPoint, LogPointSegment, MemoryLayout, OffsetAnomaly, Result,
    SampleStream, TrackPointSegment,
};

const HEADER_LEN: u32 = 0x10;
const RECORD_LEN: u32 = 1;

/// Seconds between consecutive logpoints.
pub const SAMPLE_INTERVAL: u32 = 4;

const FORMATS: [u16; 2] = [0x0104, 0x8104];

/// Convert a raw speed byte (1/8 m/s) to km/h.
pub fn speed_kmh(raw: u8) -> f64 {
    f64::from(raw) / 8.0 * 60.0 * 60.0 / 1000.0
}

/// Decode the logpoint segment matching each trackpoint segment, in order.
pub fn read_logpoint_segments(
    source: &dyn ByteSource,
    layout: &MemoryLayout,
    trackpoints: &[TrackPointSegment],
) -> Result<Decoded<Vec<LogPointSegment>>> {
    let mut segments = Vec::with_capacity(trackpoints.len());
    let mut anomalies = Vec::new();
    let mut current: Option<Cursor<'_>> = None;

    for (index, tseg) in trackpoints.iter().enumerate() {
        let offset = region_offset(layout.logpoints, tseg.logpoint_offset)?;

        let mut cursor = match current.take() {
            None => source.read_from_offset(offset)?,
            Some(cursor) if cursor.position().is_at(offset) => cursor,
            Some(cursor) => {
                anomalies.push(OffsetAnomaly::record(
                    AnomalyKind::LogpointChain,
                    offset,
                    cursor.position(),
                ));
                source.read_from_offset(offset)?
            }
        };

        let segment = read_logpoint_segment(&mut cursor)?;

        if segment.segment_type != tseg.segment_type {
            return Err(DecodeError::SegmentTypeMismatch {
                index,
                trackpoint: tseg.segment_type,
                logpoint: segment.segment_type,
            });
        }

        segments.push(segment);
        current = Some(cursor);
    }

    debug!(segments = segments.len(), anomalies = anomalies.len(), "Decoded logpoint segments");
    Ok(Decoded { value: segments, anomalies })
}

/// Decode one segment and leave the cursor just past its body.
pub fn read_logpoint_segment(cursor: &mut Cursor<'_>) -> Result<LogPointSegment> {
    let timestamp = cursor.u32_at(0x00)?;
    let format = cursor.u16_at(0x08)?;
    let count = cursor.u16_at(0x0a)?;
    let segment_type = cursor.u8_at(0x0c)?;
    let header_offset = cursor.absolute();

    trace!(
        offset = format_args!("{:#x}", header_offset),
        timestamp, format, segment_type, count, "Logpoint segment header"
    );

    cursor.advance(HEADER_LEN);

    let mut points = Vec::new();
    if count > 0 {
        if !FORMATS.contains(&format) {
            return Err(DecodeError::unrecognized_format(
                SampleStream::Logpoints,
                format,
                u32::from(count),
                header_offset,
            ));
        }
        points = read_logpoints(cursor, timestamp, count)?;
    }

    Ok(LogPointSegment { timestamp, segment_type, format, points })
}

fn read_logpoints(cursor: &mut Cursor<'_>, timestamp: u32, count: u16) -> Result<Vec<LogPoint>> {
    let mut time = timestamp;
    let mut points = Vec::with_capacity(usize::from(count));

    for _ in 0..count {
        points.push(LogPoint {
            timestamp: time,
            speed: speed_kmh(cursor.u8_at(0x00)?),
            heartrate: None,
            cadence: None,
        });
        time = time.wrapping_add(SAMPLE_INTERVAL);
        cursor.advance(RECORD_LEN);
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceModel;
    use crate::history::trackpoints::read_trackpoint_segments;
    use crate::test_utils::{Delta, DumpBuilder, LogSegmentSpec, TrackSegmentSpec};

    /// Two chained trackpoint segments with their logpoint segments.
    fn two_segment_dump(
        second_log_at: Option<u32>,
        second_log_type: u8,
    ) -> (crate::FlashDump, MemoryLayout) {
        let mut builder = DumpBuilder::rider20();
        let layout = builder.layout();

        let first_log = LogSegmentSpec::new(1000, vec![16, 24, 32]);
        let first_log_end = builder.logpoint_segment(0, &first_log);
        let second_log_at = second_log_at.unwrap_or(first_log_end);
        let mut second_log = LogSegmentSpec::new(2000, vec![8, 0]);
        second_log.segment_type = second_log_type;
        builder.logpoint_segment(second_log_at, &second_log);

        let mut first = TrackSegmentSpec::new(1000, vec![Delta::new(1, 1, 0, 4); 2]);
        first.next = first.len();
        let first_end = builder.trackpoint_segment(0, &first);
        let mut second = TrackSegmentSpec::new(2000, vec![Delta::new(1, 1, 0, 4)]);
        second.logpoint_offset = second_log_at;
        builder.trackpoint_segment(first_end, &second);

        (builder.build(), layout)
    }

    #[test]
    fn speed_and_timestamps_decode() {
        let (dump, layout) = two_segment_dump(None, 1);
        let tracks = read_trackpoint_segments(&dump, &layout, 0).expect("trackpoints decode");
        let decoded = read_logpoint_segments(&dump, &layout, &tracks.value).expect("decodes");

        assert!(decoded.anomalies.is_empty());
        assert_eq!(decoded.value.len(), 2);

        let first = &decoded.value[0];
        assert_eq!(first.points[0].speed, 7.2);
        assert_eq!(first.points[1].speed, speed_kmh(24));
        for (n, point) in first.points.iter().enumerate() {
            assert_eq!(point.timestamp, first.timestamp + 4 * n as u32);
            assert_eq!(point.heartrate, None);
        }
        assert_eq!(decoded.value[1].points[1].speed, 0.0);
    }

    #[test]
    fn discontinuity_is_flagged_and_reseeked() {
        let (dump, layout) = two_segment_dump(Some(0x400), 1);
        let tracks = read_trackpoint_segments(&dump, &layout, 0).expect("trackpoints decode");
        let decoded = read_logpoint_segments(&dump, &layout, &tracks.value).expect("decodes");

        assert_eq!(decoded.anomalies.len(), 1);
        assert_eq!(decoded.anomalies[0].kind, AnomalyKind::LogpointChain);
        assert_eq!(decoded.anomalies[0].declared, layout.logpoints + 0x400);
        assert_eq!(decoded.value[1].timestamp, 2000);
    }

    #[test]
    fn segment_type_mismatch_aborts() {
        let (dump, layout) = two_segment_dump(None, 7);
        let tracks = read_trackpoint_segments(&dump, &layout, 0).expect("trackpoints decode");
        let error = read_logpoint_segments(&dump, &layout, &tracks.value).unwrap_err();

        assert!(matches!(
            error,
            DecodeError::SegmentTypeMismatch { index: 1, trackpoint: 1, logpoint: 7 }
        ));
    }

    #[test]
    fn unknown_format_with_samples_is_rejected() {
        let mut builder = DumpBuilder::rider20();
        let mut spec = LogSegmentSpec::new(1000, vec![1, 2]);
        spec.format = 0x0204;
        builder.logpoint_segment(0, &spec);
        let dump = builder.build();

        let mut cursor = dump.read_from_offset(DeviceModel::Rider20.layout().logpoints).unwrap();
        let error = read_logpoint_segment(&mut cursor).unwrap_err();
        assert!(matches!(
            error,
            DecodeError::UnrecognizedFormat { stream: SampleStream::Logpoints, format: 0x0204, .. }
        ));
    }

    #[test]
    fn unknown_format_without_samples_is_accepted() {
        let mut builder = DumpBuilder::rider20();
        let mut spec = LogSegmentSpec::new(1000, Vec::new());
        spec.format = 0x0204;
        builder.logpoint_segment(0, &spec);
        let dump = builder.build();

        let mut cursor = dump.read_from_offset(DeviceModel::Rider20.layout().logpoints).unwrap();
        let segment = read_logpoint_segment(&mut cursor).expect("empty segment decodes");
        assert!(segment.points.is_empty());
        assert_eq!(cursor.position().rel, HEADER_LEN);
    }
}
