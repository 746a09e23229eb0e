//! Lap and ride summaries
//!
//! Summaries are 32-byte records in the summary region. A ride's recorded laps sit
//! back to back and are normally followed directly by the whole-ride summary:
//!
//! | Offset | Field                               |
//! |--------|-------------------------------------|
//! | 0x00   | u32 start                           |
//! | 0x04   | u32 end                             |
//! | 0x08   | u32 distance, m                     |
//! | 0x0c   | u32 ride time, s                    |
//! | 0x10   | u16 calories                        |
//! | 0x12   | u16 altitude gain, m                |
//! | 0x14   | u16 altitude loss, m                |
//! | 0x16   | u8 avg / u8 max speed, 1/8 m/s      |
//! | 0x18   | u8 avg / u8 max heart rate          |
//! | 0x1a   | u8 avg / u8 max cadence             |
//!
//! The device does not record the lap that is still running when a ride is
//! stopped; [`synthesize_last_lap`] rebuilds it from the ride totals and the
//! decoded samples.

use tracing::debug;

use super::Decoded;
use super::logpoints::speed_kmh;
use crate::dump::cursor::region_offset;
use crate::dump::{ByteSource, Cursor};
use crate::{AnomalyKind, AvgMax, MemoryLayout, MergedSample, OffsetAnomaly, Result, Summary};

/// Stride of summary records.
pub const RECORD_LEN: u32 = 32;

/// Laps and whole-ride summary as stored on the device.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSummaries {
    pub summary: Summary,
    pub laps: Vec<Summary>,
}

fn avg_max(avg: f64, max: f64) -> Option<AvgMax> {
    (max > 0.0).then(|| AvgMax::new(avg, max))
}

/// Parse the summary record at the cursor's current position.
pub fn read_summary(cursor: &Cursor<'_>) -> Result<Summary> {
    Ok(Summary {
        start: cursor.u32_at(0x00)?,
        end: cursor.u32_at(0x04)?,
        distance: f64::from(cursor.u32_at(0x08)?),
        ride_time: cursor.u32_at(0x0c)?,
        calories: i32::from(cursor.u16_at(0x10)?),
        altitude_gain: i32::from(cursor.u16_at(0x12)?),
        altitude_loss: i32::from(cursor.u16_at(0x14)?),
        speed: avg_max(speed_kmh(cursor.u8_at(0x16)?), speed_kmh(cursor.u8_at(0x17)?)),
        heartrate: avg_max(f64::from(cursor.u8_at(0x18)?), f64::from(cursor.u8_at(0x19)?)),
        cadence: avg_max(f64::from(cursor.u8_at(0x1a)?), f64::from(cursor.u8_at(0x1b)?)),
    })
}

/// Parse `count` consecutive lap records, leaving the cursor after the last one.
pub fn read_laps(cursor: &mut Cursor<'_>, count: u8) -> Result<Vec<Summary>> {
    let mut laps = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        laps.push(read_summary(cursor)?);
        cursor.advance(RECORD_LEN);
    }
    Ok(laps)
}

/// Read the recorded laps (if any) and the whole-ride summary.
///
/// The ride summary is expected right after the lap block; if the block ends
/// elsewhere the mismatch is reported and the summary is read from its declared
/// offset.
pub fn read_summaries(
    source: &dyn ByteSource,
    layout: &MemoryLayout,
    summary_offset: u32,
    laps_offset: Option<u32>,
    lap_count: u8,
) -> Result<Decoded<RecordedSummaries>> {
    let mut anomalies = Vec::new();
    let mut laps = Vec::new();
    let mut lap_cursor = None;

    if let Some(offset) = laps_offset {
        let mut cursor = source.read_from_offset(region_offset(layout.summaries, offset)?)?;
        laps = read_laps(&mut cursor, lap_count)?;
        lap_cursor = Some(cursor);
    }

    let declared = region_offset(layout.summaries, summary_offset)?;
    let cursor = match lap_cursor {
        Some(cursor) if cursor.position().is_at(declared) => cursor,
        Some(cursor) => {
            anomalies.push(OffsetAnomaly::record(
                AnomalyKind::SummaryOffset,
                declared,
                cursor.position(),
            ));
            source.read_from_offset(declared)?
        }
        None => source.read_from_offset(declared)?,
    };

    let summary = read_summary(&cursor)?;
    debug!(laps = laps.len(), start = summary.start, end = summary.end, "Decoded summaries");

    Ok(Decoded { value: RecordedSummaries { summary, laps }, anomalies })
}

fn subtract_recorded(candidate: &mut Summary, recorded: &Summary) {
    candidate.distance -= recorded.distance;
    // Carried forward, not subtracted. Unconfirmed against device output.
    candidate.ride_time = recorded.ride_time;
    candidate.calories -= recorded.calories;
    candidate.altitude_gain -= recorded.altitude_gain;
    candidate.altitude_loss -= recorded.altitude_loss;
}

/// Rebuild the lap the device did not record at the end of a ride.
///
/// Returns `None` when there are no recorded laps or the last one already ends
/// with the ride. `samples` is the merged trackpoint/logpoint stream of the whole
/// ride in time order.
///
/// Totals start from the whole-ride summary. Recorded laps are consumed in order
/// as the sample stream passes their end, each subtracting its distance,
/// calories and altitude from the candidate while its ride time replaces the
/// candidate's. Speed, heart rate and cadence are averaged over the positive
/// samples after the last recorded lap.
pub fn synthesize_last_lap<'a, I>(laps: &[Summary], summary: &Summary, samples: I) -> Option<Summary>
where
    I: IntoIterator<Item = MergedSample<'a>>,
{
    let last_recorded = laps.last()?;
    if last_recorded.end >= summary.end {
        return None;
    }

    let mut lap = Summary {
        start: last_recorded.end,
        end: summary.end,
        distance: summary.distance,
        ride_time: summary.ride_time,
        calories: summary.calories,
        altitude_gain: summary.altitude_gain,
        altitude_loss: summary.altitude_loss,
        speed: None,
        heartrate: None,
        cadence: None,
    };

    let mut recorded = laps.iter();
    let mut current = recorded.next();
    if let Some(first) = current {
        subtract_recorded(&mut lap, first);
    }

    let mut speed = Vec::new();
    let mut heartrate = Vec::new();
    let mut cadence = Vec::new();

    for sample in samples {
        let timestamp = sample.timestamp();

        if timestamp > lap.start {
            if let Some(lp) = sample.logpoint {
                if lp.speed > 0.0 {
                    speed.push(lp.speed);
                }
                if let Some(hr) = lp.heartrate.filter(|&hr| hr > 0) {
                    heartrate.push(f64::from(hr));
                }
                if let Some(cad) = lp.cadence.filter(|&cad| cad > 0) {
                    cadence.push(f64::from(cad));
                }
            }
        } else if current.is_some_and(|rec| timestamp <= rec.end) {
            continue;
        } else {
            current = recorded.next();
            if let Some(next) = current {
                subtract_recorded(&mut lap, next);
            }
        }
    }

    lap.speed = AvgMax::from_samples(&speed);
    lap.heartrate = AvgMax::from_samples(&heartrate);
    lap.cadence = AvgMax::from_samples(&cadence);

    debug!(
        start = lap.start,
        end = lap.end,
        distance = lap.distance,
        samples = speed.len(),
        "Synthesized trailing lap"
    );
    Some(lap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{DumpBuilder, SummaryRecord};
    use crate::{LogPoint, TrackPoint};

    fn record(start: u32, end: u32, distance: u32) -> SummaryRecord {
        SummaryRecord {
            start,
            end,
            distance,
            ride_time: end - start,
            calories: 10,
            altitude_gain: 4,
            altitude_loss: 2,
            speed: (80, 120),
            heartrate: (140, 180),
            cadence: (0, 0),
        }
    }

    #[test]
    fn summary_fields_decode() {
        let mut builder = DumpBuilder::rider20();
        builder.summary(0, &record(100, 400, 1234));
        let layout = builder.layout();
        let dump = builder.build();

        let decoded = read_summaries(&dump, &layout, 0, None, 0).expect("decodes");
        let summary = decoded.value.summary;

        assert!(decoded.anomalies.is_empty());
        assert!(decoded.value.laps.is_empty());
        assert_eq!((summary.start, summary.end), (100, 400));
        assert_eq!(summary.distance, 1234.0);
        assert_eq!(summary.ride_time, 300);
        assert_eq!(summary.calories, 10);
        assert_eq!(summary.speed, Some(AvgMax::new(36.0, 54.0)));
        assert_eq!(summary.heartrate, Some(AvgMax::new(140.0, 180.0)));
        assert_eq!(summary.cadence, None);
    }

    #[test]
    fn laps_followed_by_summary_need_no_reseek() {
        let mut builder = DumpBuilder::rider20();
        builder
            .summary(0x40, &record(0, 100, 10))
            .summary(0x60, &record(100, 200, 20))
            .summary(0x80, &record(0, 250, 40));
        let layout = builder.layout();
        let dump = builder.build();

        let decoded = read_summaries(&dump, &layout, 0x80, Some(0x40), 2).expect("decodes");
        assert!(decoded.anomalies.is_empty());
        assert_eq!(decoded.value.laps.len(), 2);
        assert_eq!(decoded.value.laps[1].distance, 20.0);
        assert_eq!(decoded.value.summary.end, 250);
    }

    #[test]
    fn misplaced_summary_is_flagged() {
        let mut builder = DumpBuilder::rider20();
        builder.summary(0x40, &record(0, 100, 10)).summary(0x100, &record(0, 250, 40));
        let layout = builder.layout();
        let dump = builder.build();

        let decoded = read_summaries(&dump, &layout, 0x100, Some(0x40), 1).expect("decodes");
        assert_eq!(decoded.anomalies.len(), 1);
        assert_eq!(decoded.anomalies[0].kind, AnomalyKind::SummaryOffset);
        assert_eq!(decoded.anomalies[0].diff, 0x100 - 0x60);
        assert_eq!(decoded.value.summary.distance, 40.0);
    }

    fn lap(start: u32, end: u32, distance: f64, ride_time: u32) -> Summary {
        Summary {
            start,
            end,
            distance,
            ride_time,
            calories: 5,
            altitude_gain: 3,
            altitude_loss: 1,
            ..Summary::default()
        }
    }

    #[test]
    fn trailing_lap_gets_remaining_totals_and_sample_stats() {
        let laps = [lap(0, 100, 1000.0, 100), lap(100, 200, 1500.0, 95)];
        let summary = Summary {
            start: 0,
            end: 300,
            distance: 4000.0,
            ride_time: 290,
            calories: 30,
            altitude_gain: 20,
            altitude_loss: 10,
            ..Summary::default()
        };

        let trackpoints: Vec<TrackPoint> = (0..=30)
            .map(|i| TrackPoint { timestamp: i * 10, longitude: 0.0, latitude: 0.0, elevation: 0.0 })
            .collect();
        let logpoints: Vec<LogPoint> = (0..=30)
            .map(|i| LogPoint {
                timestamp: i * 10,
                speed: if i > 20 { f64::from(i) } else { 99.0 },
                heartrate: Some(if i == 25 { 0 } else { 120 + i as u16 }),
                cadence: None,
            })
            .collect();
        let samples = trackpoints
            .iter()
            .zip(&logpoints)
            .map(|(tp, lp)| MergedSample { trackpoint: Some(tp), logpoint: Some(lp) });

        let synthesized = synthesize_last_lap(&laps, &summary, samples).expect("lap synthesized");

        assert_eq!((synthesized.start, synthesized.end), (200, 300));
        assert_eq!(synthesized.distance, 1500.0);
        assert_eq!(synthesized.ride_time, 95);
        assert_eq!(synthesized.calories, 20);
        assert_eq!(synthesized.altitude_gain, 14);
        assert_eq!(synthesized.altitude_loss, 8);

        // Samples at 210..=300 s
        let speed = synthesized.speed.expect("speed samples");
        assert!((speed.avg - 25.5).abs() < 1e-9);
        assert_eq!(speed.max, 30.0);
        let heartrate = synthesized.heartrate.expect("heart rate samples");
        assert_eq!(heartrate.max, 150.0);
        assert!((heartrate.avg - (1455.0 - 145.0) / 9.0).abs() < 1e-9);
        assert_eq!(synthesized.cadence, None);

        let total: f64 = laps.iter().map(|l| l.distance).sum::<f64>() + synthesized.distance;
        assert!((total - summary.distance).abs() < 1e-9);
    }

    #[test]
    fn complete_lap_list_is_left_alone() {
        let laps = [lap(0, 100, 1000.0, 100)];
        let summary = Summary { start: 0, end: 100, distance: 1000.0, ..Summary::default() };
        assert_eq!(synthesize_last_lap(&laps, &summary, std::iter::empty()), None);
        assert_eq!(synthesize_last_lap(&[], &summary, std::iter::empty()), None);
    }
}
