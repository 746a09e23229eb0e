//! Elevation smoothing
//!
//! Raw elevations are quantized to 10 m steps, so every decoded trackpoint segment
//! runs through a causal moving average: the window grows to [`WINDOW`] samples and
//! then slides, each output depending only on the current and previous samples.

use std::collections::VecDeque;

use crate::TrackPoint;

/// Number of raw elevations averaged once the window is full.
pub const WINDOW: usize = 30;

/// Replace each point's elevation with the mean of the last [`WINDOW`] raw values.
pub fn smooth_elevation(points: &mut [TrackPoint]) {
    let mut window: VecDeque<f64> = VecDeque::with_capacity(WINDOW);
    let mut sum = 0.0;

    for point in points.iter_mut() {
        window.push_back(point.elevation);
        sum += point.elevation;

        point.elevation = sum / window.len() as f64;

        if window.len() == WINDOW {
            if let Some(oldest) = window.pop_front() {
                sum -= oldest;
            }
        }
    }
}
