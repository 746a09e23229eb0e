//! Time-ordered merge of trackpoint and logpoint segments

use std::cmp::Ordering;

use crate::{LogPointSegment, MergedSample, TrackPointSegment};

/// Merge-join one segment pair by timestamp.
///
/// Samples sharing a timestamp are paired; otherwise the earlier sample is
/// emitted on its own.
pub fn merge_segment<'a>(
    trackpoints: &'a TrackPointSegment,
    logpoints: &'a LogPointSegment,
) -> Vec<MergedSample<'a>> {
    let mut merged = Vec::with_capacity(trackpoints.points.len().max(logpoints.points.len()));
    let mut tps = trackpoints.points.iter().peekable();
    let mut lps = logpoints.points.iter().peekable();

    loop {
        let sample = match (tps.peek(), lps.peek()) {
            (Some(tp), Some(lp)) => match tp.timestamp.cmp(&lp.timestamp) {
                Ordering::Less => MergedSample { trackpoint: tps.next(), logpoint: None },
                Ordering::Greater => MergedSample { trackpoint: None, logpoint: lps.next() },
                Ordering::Equal => MergedSample { trackpoint: tps.next(), logpoint: lps.next() },
            },
            (Some(_), None) => MergedSample { trackpoint: tps.next(), logpoint: None },
            (None, Some(_)) => MergedSample { trackpoint: None, logpoint: lps.next() },
            (None, None) => break,
        };
        merged.push(sample);
    }

    merged
}

/// Merge every index-aligned segment pair.
pub fn merge_segments<'a>(
    trackpoints: &'a [TrackPointSegment],
    logpoints: &'a [LogPointSegment],
) -> Vec<Vec<MergedSample<'a>>> {
    trackpoints.iter().zip(logpoints).map(|(tseg, lseg)| merge_segment(tseg, lseg)).collect()
}
