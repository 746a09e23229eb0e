//! Ride and lap summaries

use serde::{Deserialize, Serialize};

/// Average and maximum of a sampled quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct AvgMax {
    pub avg: f64,
    pub max: f64,
}

impl AvgMax {
    pub fn new(avg: f64, max: f64) -> Self {
        Self { avg, max }
    }

    /// Arithmetic mean and maximum of `values`, or `None` when empty.
    pub fn from_samples(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self { avg: sum / values.len() as f64, max })
    }
}

/// Aggregate statistics for a whole ride or a single lap.
///
/// Totals are signed so that a synthesized trailing lap, which is derived by
/// subtraction, can represent whatever the device reported.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Summary {
    /// Epoch seconds
    pub start: u32,
    /// Epoch seconds
    pub end: u32,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub ride_time: u32,
    /// kcal
    pub calories: i32,
    /// Meters
    pub altitude_gain: i32,
    /// Meters
    pub altitude_loss: i32,
    /// km/h
    pub speed: Option<AvgMax>,
    /// bpm
    pub heartrate: Option<AvgMax>,
    /// rpm
    pub cadence: Option<AvgMax>,
}
