//! Absolute weight history for a single soap.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::records::{SoapKey, WeightReading};
use crate::series::MIN_X_DAYS;

/// The Y axis of a weight history reaches at least 5% below the baseline.
pub const HISTORY_FLOOR_RATIO: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub day: i64,
    pub weight_g: f64,
}

/// Weight over time for one soap, with chart bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightHistory {
    pub key: SoapKey,
    /// Sorted by date; same-day readings keep their recorded order.
    pub points: Vec<HistoryPoint>,
    pub baseline_weight_g: f64,
    pub y_floor: f64,
    pub x_max: i64,
}

impl WeightHistory {
    /// Build the history of `key` from all readings.
    ///
    /// Rows with an unreadable date or weight are skipped. Returns `None`
    /// when the soap has no usable reading.
    pub fn build(key: &SoapKey, readings: &[WeightReading]) -> Option<Self> {
        let mut valid: Vec<(NaiveDate, f64)> = readings
            .iter()
            .filter(|r| &r.key == key)
            .filter_map(WeightReading::valid)
            .collect();
        valid.sort_by_key(|(date, _)| *date);

        let &(baseline_date, baseline_weight) = valid.first()?;
        let points: Vec<HistoryPoint> = valid
            .iter()
            .map(|&(date, weight_g)| HistoryPoint {
                date,
                day: (date - baseline_date).num_days(),
                weight_g,
            })
            .collect();

        let min_weight = points
            .iter()
            .map(|p| p.weight_g)
            .fold(f64::INFINITY, f64::min);
        let max_day = points.iter().map(|p| p.day).max().unwrap_or(0);

        Some(Self {
            key: key.clone(),
            points,
            baseline_weight_g: baseline_weight,
            y_floor: min_weight.min(baseline_weight * HISTORY_FLOOR_RATIO),
            x_max: max_day.max(MIN_X_DAYS),
        })
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.last()
    }

    /// Upper Y bound: the heaviest reading.
    pub fn y_max(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.weight_g)
            .fold(self.baseline_weight_g, f64::max)
    }
}

/// Most recent usable reading of a soap; on equal dates the later row wins.
pub fn last_reading<'a>(key: &SoapKey, readings: &'a [WeightReading]) -> Option<&'a WeightReading> {
    readings
        .iter()
        .filter(|r| &r.key == key && r.valid().is_some())
        .max_by_key(|r| r.date)
}

/// Soaps ordered by their most recent reading date, newest first.
///
/// Soaps without any dated reading are not listed. Ties are broken by key.
pub fn soaps_by_recent_activity(readings: &[WeightReading]) -> Vec<(SoapKey, NaiveDate)> {
    let mut latest: HashMap<&SoapKey, NaiveDate> = HashMap::new();
    for r in readings {
        let Some(date) = r.date else { continue };
        latest
            .entry(&r.key)
            .and_modify(|d| *d = (*d).max(date))
            .or_insert(date);
    }
    let mut out: Vec<(SoapKey, NaiveDate)> =
        latest.into_iter().map(|(k, d)| (k.clone(), d)).collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}
