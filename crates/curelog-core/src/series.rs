//! Retained-weight series builder.
//!
//! Turns the raw readings and batch records into one normalised curve per
//! label: days since the first reading on the X axis, weight as a fraction
//! of that first reading on the Y axis. Pure and synchronous; inputs are
//! borrowed and never modified.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::filter::{SeriesFilter, distinct_types};
use crate::label::make_label;
use crate::records::{BatchRecord, SoapKey, UNCATEGORIZED, WeightReading};

/// Absolute scale tolerance in grams.
pub const MEASUREMENT_TOLERANCE_G: f64 = 0.1;

/// The X axis always spans at least this many days.
pub const MIN_X_DAYS: i64 = 10;

/// The Y axis always reaches down to at least this fraction.
pub const MAX_Y_FLOOR: f64 = 0.9;

/// Upper bound of the Y axis.
pub const Y_MAX: f64 = 1.0;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SeriesError {
    /// One or both sheets are empty, or nothing plottable is left.
    #[error("no readings or batch info available")]
    NoData,
    /// The filters removed every row.
    #[error("no data matches the filters")]
    NoMatch,
}

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub day: i64,
    pub retained: f64,
    /// Half-width of the tolerance band around `retained`.
    pub band: f64,
}

impl SeriesPoint {
    pub fn lower(&self) -> f64 {
        self.retained - self.band
    }

    pub fn upper(&self) -> f64 {
        self.retained + self.band
    }
}

/// Curve for one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetainedSeries {
    pub label: String,
    pub key: SoapKey,
    pub soap_type: String,
    pub baseline_weight_g: f64,
    pub baseline_date: NaiveDate,
    /// Sorted by day; the first point is always `(0, 1.0)`.
    pub points: Vec<SeriesPoint>,
}

impl RetainedSeries {
    /// Fractional tolerance used for every point of this series.
    pub fn tolerance(&self) -> f64 {
        MEASUREMENT_TOLERANCE_G / self.baseline_weight_g
    }

    pub fn last_day(&self) -> i64 {
        self.points.last().map(|p| p.day).unwrap_or(0)
    }
}

/// All surviving series plus the shared axis bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSet {
    /// In order of each label's first appearance in the readings.
    pub series: Vec<RetainedSeries>,
    /// X axis upper bound; the lower bound is 0.
    pub x_max: i64,
    /// Y axis lower bound; the upper bound is [`Y_MAX`].
    pub y_min: f64,
}

impl SeriesSet {
    pub fn get(&self, label: &str) -> Option<&RetainedSeries> {
        self.series.iter().find(|s| s.label == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// A reading joined to its batch record.
struct JoinedRow<'a> {
    reading: &'a WeightReading,
    soap_type: &'a str,
    label: String,
}

/// Build one retained-weight series per label.
///
/// Readings are joined to batches on (soap name, batch number); unmatched
/// readings are typed `Uncategorized`. The baseline is the earliest dated
/// reading of a group; if its weight is blank or zero the group is left
/// out. Other rows with an unreadable date or weight are dropped from their
/// group, and groups with fewer than two usable readings are left out too.
pub fn build_retained_series(
    readings: &[WeightReading],
    batches: &[BatchRecord],
    filter: &SeriesFilter,
) -> Result<SeriesSet, SeriesError> {
    if readings.is_empty() || batches.is_empty() {
        return Err(SeriesError::NoData);
    }

    let rows: Vec<JoinedRow<'_>> = join(readings, batches)
        .into_iter()
        .filter(|r| filter.accepts(&r.reading.key.soap_name, r.soap_type))
        .collect();
    if rows.is_empty() {
        return Err(SeriesError::NoMatch);
    }

    let mut series = Vec::new();
    let mut max_day: i64 = 0;
    let mut min_retained: f64 = Y_MAX;

    for (label, group) in group_by_label(rows) {
        let Some(s) = build_one(label, group) else {
            continue;
        };
        max_day = max_day.max(s.last_day());
        min_retained = s
            .points
            .iter()
            .map(|p| p.retained)
            .fold(min_retained, f64::min);
        series.push(s);
    }

    if series.is_empty() {
        return Err(if filter.is_active() {
            SeriesError::NoMatch
        } else {
            SeriesError::NoData
        });
    }

    Ok(SeriesSet {
        series,
        x_max: max_day.max(MIN_X_DAYS),
        y_min: min_retained.min(MAX_Y_FLOOR),
    })
}

/// Sorted distinct types of the joined readings, for a type selector.
pub fn available_types(readings: &[WeightReading], batches: &[BatchRecord]) -> Vec<String> {
    let rows = join(readings, batches);
    distinct_types(rows.iter().map(|r| r.soap_type))
}

fn join<'a>(readings: &'a [WeightReading], batches: &'a [BatchRecord]) -> Vec<JoinedRow<'a>> {
    // First record wins if a key was entered twice.
    let mut types: HashMap<&SoapKey, &str> = HashMap::with_capacity(batches.len());
    for b in batches {
        types.entry(&b.key).or_insert_with(|| b.resolved_type());
    }

    readings
        .iter()
        .map(|reading| {
            let soap_type = types.get(&reading.key).copied().unwrap_or(UNCATEGORIZED);
            JoinedRow {
                reading,
                soap_type,
                label: make_label(
                    &reading.key.soap_name,
                    &reading.key.batch_number,
                    soap_type,
                ),
            }
        })
        .collect()
}

fn group_by_label(rows: Vec<JoinedRow<'_>>) -> Vec<(String, Vec<JoinedRow<'_>>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<JoinedRow<'_>>)> = Vec::new();
    for row in rows {
        match index.get(&row.label) {
            Some(&i) => groups[i].1.push(row),
            None => {
                index.insert(row.label.clone(), groups.len());
                groups.push((row.label.clone(), vec![row]));
            }
        }
    }
    groups
}

fn build_one(label: String, group: Vec<JoinedRow<'_>>) -> Option<RetainedSeries> {
    let first = group.first()?;
    let key = first.reading.key.clone();
    let soap_type = first.soap_type.to_string();

    let total = group.len();
    let mut dated: Vec<(NaiveDate, Option<f64>)> = group
        .iter()
        .filter_map(|r| Some((r.reading.date?, r.reading.weight_g)))
        .collect();
    // Stable: same-day readings keep their recorded order.
    dated.sort_by_key(|(date, _)| *date);

    // The earliest dated row is the baseline even when its weight is unreadable.
    let (baseline_date, baseline_weight) = match dated.first() {
        Some(&(date, Some(weight))) if weight != 0.0 => (date, weight),
        _ => {
            debug!(label = %label, "skipping series with missing or zero baseline weight");
            return None;
        }
    };

    let valid: Vec<(NaiveDate, f64)> = dated
        .iter()
        .filter_map(|&(date, weight)| Some((date, weight?)))
        .collect();
    if valid.len() < total {
        debug!(
            label = %label,
            dropped = total - valid.len(),
            "dropped readings with unreadable date or weight"
        );
    }
    if valid.len() < 2 {
        debug!(label = %label, readings = valid.len(), "skipping series with fewer than two readings");
        return None;
    }

    let band = MEASUREMENT_TOLERANCE_G / baseline_weight;
    let mut points: Vec<SeriesPoint> = valid
        .iter()
        .map(|&(date, weight)| SeriesPoint {
            day: (date - baseline_date).num_days(),
            retained: weight / baseline_weight,
            band,
        })
        .collect();
    anchor_at_origin(&mut points, band);

    Some(RetainedSeries {
        label,
        key,
        soap_type,
        baseline_weight_g: baseline_weight,
        baseline_date,
        points,
    })
}

/// Make sure the curve starts at `(0, 1.0)`, then order points by day.
fn anchor_at_origin(points: &mut Vec<SeriesPoint>, band: f64) {
    if !points.iter().any(|p| p.day == 0) {
        points.insert(
            0,
            SeriesPoint {
                day: 0,
                retained: 1.0,
                band,
            },
        );
    }
    points.sort_by_key(|p| p.day);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TypeFilter;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + chrono::Days::new(day as u64)
    }

    fn batch(name: &str, number: &str, soap_type: &str) -> BatchRecord {
        BatchRecord {
            key: SoapKey::new(name, number),
            soap_type: soap_type.to_string(),
            height_mm: None,
            width_mm: None,
            thickness_mm: None,
            surface_area: None,
            notes: String::new(),
            initial_weight_g: None,
            initial_date: Some(date(0)),
        }
    }

    fn reading(name: &str, number: &str, day: u32, weight: f64) -> WeightReading {
        WeightReading::new(SoapKey::new(name, number), date(day), weight)
    }

    fn lavender() -> (Vec<WeightReading>, Vec<BatchRecord>) {
        (
            vec![
                reading("Lavender", "", 0, 100.0),
                reading("Lavender", "", 3, 94.0),
                reading("Lavender", "", 7, 88.0),
            ],
            vec![batch("Lavender", "", "Bar")],
        )
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn lavender_example() {
        let (readings, batches) = lavender();
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        assert_eq!(set.len(), 1);

        let s = set.get("Lavender – Bar").unwrap();
        let pairs: Vec<(i64, f64)> = s.points.iter().map(|p| (p.day, p.retained)).collect();
        assert_eq!(pairs, vec![(0, 1.0), (3, 0.94), (7, 0.88)]);
        assert!(approx(s.points[1].band, 0.001));
        assert!(approx(s.points[1].lower(), 0.939));
        assert!(approx(s.points[1].upper(), 0.941));
        assert_eq!(s.baseline_weight_g, 100.0);
        assert_eq!(set.x_max, 10);
        assert_eq!(set.y_min, 0.88);
    }

    #[test]
    fn band_is_constant_not_compounded() {
        let (readings, batches) = lavender();
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        let s = &set.series[0];
        assert!(s.points.iter().all(|p| p.band == s.tolerance()));
    }

    #[test]
    fn empty_inputs_are_no_data() {
        let (readings, batches) = lavender();
        let f = SeriesFilter::default();
        assert_eq!(
            build_retained_series(&[], &batches, &f),
            Err(SeriesError::NoData)
        );
        assert_eq!(
            build_retained_series(&readings, &[], &f),
            Err(SeriesError::NoData)
        );
    }

    #[test]
    fn type_filter_keeps_matching_label_only() {
        let readings = vec![
            reading("Lavender", "", 0, 100.0),
            reading("Lavender", "", 30, 80.0),
            reading("Oat", "2", 0, 200.0),
            reading("Oat", "2", 12, 190.0),
        ];
        let batches = vec![batch("Lavender", "", "Bar"), batch("Oat", "2", "Facial")];
        let f = SeriesFilter::new(TypeFilter::Only("Facial".into()), "");
        let set = build_retained_series(&readings, &batches, &f).unwrap();

        assert_eq!(set.labels().collect::<Vec<_>>(), vec!["Oat (Batch 2) – Facial"]);
        // Bounds ignore the filtered-out Lavender curve.
        assert_eq!(set.x_max, 12);
        assert_eq!(set.y_min, 0.9);
    }

    #[test]
    fn search_matches_name_case_insensitively() {
        let readings = vec![
            reading("Lavender", "", 0, 100.0),
            reading("Lavender", "", 1, 99.0),
            reading("Oat", "", 0, 100.0),
            reading("Oat", "", 1, 99.0),
        ];
        let batches = vec![batch("Lavender", "", "Bar"), batch("Oat", "", "Bar")];
        let f = SeriesFilter::new(TypeFilter::All, "lAvEn");
        let set = build_retained_series(&readings, &batches, &f).unwrap();
        assert_eq!(set.labels().collect::<Vec<_>>(), vec!["Lavender – Bar"]);
    }

    #[test]
    fn filter_removing_everything_is_no_match() {
        let (readings, batches) = lavender();
        let f = SeriesFilter::new(TypeFilter::Only("Liquid".into()), "");
        assert_eq!(
            build_retained_series(&readings, &batches, &f),
            Err(SeriesError::NoMatch)
        );
        let f = SeriesFilter::new(TypeFilter::All, "rose");
        assert_eq!(
            build_retained_series(&readings, &batches, &f),
            Err(SeriesError::NoMatch)
        );
    }

    #[test]
    fn single_reading_is_excluded() {
        let readings = vec![reading("Solo", "", 0, 100.0)];
        let batches = vec![batch("Solo", "", "Bar")];

        let unfiltered = build_retained_series(&readings, &batches, &SeriesFilter::default());
        assert_eq!(unfiltered, Err(SeriesError::NoData));

        let filtered = build_retained_series(
            &readings,
            &batches,
            &SeriesFilter::new(TypeFilter::Only("Bar".into()), ""),
        );
        assert_eq!(filtered, Err(SeriesError::NoMatch));
    }

    #[test]
    fn single_reading_does_not_hide_other_series() {
        let (mut readings, mut batches) = lavender();
        readings.push(reading("Solo", "", 0, 50.0));
        batches.push(batch("Solo", "", "Bar"));
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        assert_eq!(set.labels().collect::<Vec<_>>(), vec!["Lavender – Bar"]);
    }

    #[test]
    fn zero_baseline_is_excluded() {
        let readings = vec![
            reading("Zero", "", 0, 0.0),
            reading("Zero", "", 2, 50.0),
            reading("Zero", "", 4, 40.0),
        ];
        let batches = vec![batch("Zero", "", "Bar")];
        assert_eq!(
            build_retained_series(&readings, &batches, &SeriesFilter::default()),
            Err(SeriesError::NoData)
        );
    }

    #[test]
    fn unreadable_weight_drops_only_that_row() {
        let (mut readings, batches) = lavender();
        readings.insert(
            1,
            WeightReading {
                key: SoapKey::new("Lavender", ""),
                date: Some(date(2)),
                weight_g: None,
            },
        );
        readings.push(WeightReading {
            key: SoapKey::new("Lavender", ""),
            date: None,
            weight_g: Some(10.0),
        });
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        let days: Vec<i64> = set.series[0].points.iter().map(|p| p.day).collect();
        assert_eq!(days, vec![0, 3, 7]);
    }

    #[test]
    fn unreadable_rows_can_leave_too_few_readings() {
        let readings = vec![
            reading("Oat", "", 0, 100.0),
            WeightReading {
                key: SoapKey::new("Oat", ""),
                date: Some(date(1)),
                weight_g: None,
            },
        ];
        let batches = vec![batch("Oat", "", "Bar")];
        assert_eq!(
            build_retained_series(&readings, &batches, &SeriesFilter::default()),
            Err(SeriesError::NoData)
        );
    }

    #[test]
    fn blank_weight_on_earliest_date_excludes_group() {
        let readings = vec![
            WeightReading {
                key: SoapKey::new("Oat", ""),
                date: Some(date(0)),
                weight_g: None,
            },
            reading("Oat", "", 3, 94.0),
            reading("Oat", "", 7, 88.0),
        ];
        let batches = vec![batch("Oat", "", "Bar")];
        assert_eq!(
            build_retained_series(&readings, &batches, &SeriesFilter::default()),
            Err(SeriesError::NoData)
        );
        let f = SeriesFilter::new(TypeFilter::Only("Bar".into()), "");
        assert_eq!(
            build_retained_series(&readings, &batches, &f),
            Err(SeriesError::NoMatch)
        );
    }

    #[test]
    fn undated_row_does_not_become_baseline() {
        let readings = vec![
            WeightReading {
                key: SoapKey::new("Oat", ""),
                date: None,
                weight_g: Some(500.0),
            },
            reading("Oat", "", 0, 100.0),
            reading("Oat", "", 4, 96.0),
        ];
        let batches = vec![batch("Oat", "", "Bar")];
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        assert_eq!(set.series[0].baseline_weight_g, 100.0);
        assert_eq!(set.series[0].points[1].retained, 0.96);
    }

    #[test]
    fn baseline_is_earliest_date_not_first_row() {
        let readings = vec![
            reading("Oat", "", 5, 90.0),
            reading("Oat", "", 0, 100.0),
            reading("Oat", "", 2, 95.0),
        ];
        let batches = vec![batch("Oat", "", "")];
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        let s = set.get("Oat – Uncategorized").unwrap();
        assert_eq!(s.baseline_date, date(0));
        let days: Vec<i64> = s.points.iter().map(|p| p.day).collect();
        assert_eq!(days, vec![0, 2, 5]);
        assert_eq!(s.points[2].retained, 90.0 / 100.0);
    }

    #[test]
    fn unmatched_reading_is_uncategorized() {
        let readings = vec![reading("Ghost", "9", 0, 80.0), reading("Ghost", "9", 4, 76.0)];
        let batches = vec![batch("Other", "", "Bar")];
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        let s = set.get("Ghost (Batch 9) – Uncategorized").unwrap();
        assert_eq!(s.soap_type, UNCATEGORIZED);

        let f = SeriesFilter::new(TypeFilter::Only(UNCATEGORIZED.into()), "");
        assert_eq!(build_retained_series(&readings, &batches, &f).unwrap().len(), 1);
    }

    #[test]
    fn same_day_readings_are_both_kept() {
        let readings = vec![
            reading("Oat", "", 0, 100.0),
            reading("Oat", "", 3, 97.0),
            reading("Oat", "", 3, 96.0),
        ];
        let batches = vec![batch("Oat", "", "Bar")];
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        let pairs: Vec<(i64, f64)> = set.series[0]
            .points
            .iter()
            .map(|p| (p.day, p.retained))
            .collect();
        assert_eq!(pairs, vec![(0, 1.0), (3, 0.97), (3, 0.96)]);
    }

    #[test]
    fn long_curves_extend_x_axis_and_deep_loss_lowers_y() {
        let readings = vec![reading("Oat", "", 0, 100.0), reading("Oat", "", 45, 70.0)];
        let batches = vec![batch("Oat", "", "Bar")];
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        assert_eq!(set.x_max, 45);
        assert_eq!(set.y_min, 0.7);
    }

    #[test]
    fn invariants_hold_across_many_series() {
        let mut readings = Vec::new();
        let mut batches = Vec::new();
        for i in 0..8u32 {
            let name = format!("Soap{i}");
            batches.push(batch(&name, "", if i % 2 == 0 { "Bar" } else { "Liquid" }));
            for d in [6 * i, 0, 2 * i + 1, 3 * i + 2] {
                readings.push(reading(&name, "", d, 120.0 - (d as f64) * 0.7));
            }
        }
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        assert_eq!(set.len(), 8);
        assert!(set.x_max >= MIN_X_DAYS);
        assert!(set.y_min <= MAX_Y_FLOOR);
        for s in &set.series {
            assert_eq!(s.points[0].day, 0);
            assert_eq!(s.points[0].retained, 1.0);
            assert!(s.points.windows(2).all(|w| w[0].day <= w[1].day));
            assert!(s.points.iter().all(|p| p.retained <= 1.0));
        }
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let readings = vec![
            reading("Zinnia", "", 0, 100.0),
            reading("Aloe", "", 0, 100.0),
            reading("Zinnia", "", 1, 99.0),
            reading("Aloe", "", 1, 99.0),
        ];
        let batches = vec![batch("Aloe", "", "Bar"), batch("Zinnia", "", "Bar")];
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        assert_eq!(
            set.labels().collect::<Vec<_>>(),
            vec!["Zinnia – Bar", "Aloe – Bar"]
        );
    }

    #[test]
    fn anchor_inserts_origin_when_missing() {
        let mut points = vec![
            SeriesPoint {
                day: 4,
                retained: 0.95,
                band: 0.01,
            },
            SeriesPoint {
                day: 2,
                retained: 0.97,
                band: 0.01,
            },
        ];
        anchor_at_origin(&mut points, 0.01);
        let pairs: Vec<(i64, f64)> = points.iter().map(|p| (p.day, p.retained)).collect();
        assert_eq!(pairs, vec![(0, 1.0), (2, 0.97), (4, 0.95)]);
    }

    #[test]
    fn anchor_leaves_existing_origin() {
        let mut points = vec![SeriesPoint {
            day: 0,
            retained: 1.0,
            band: 0.01,
        }];
        anchor_at_origin(&mut points, 0.01);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn available_types_include_default() {
        let readings = vec![reading("Ghost", "", 0, 1.0), reading("Oat", "", 0, 1.0)];
        let batches = vec![batch("Oat", "", "Bar")];
        assert_eq!(
            available_types(&readings, &batches),
            vec!["Bar".to_string(), UNCATEGORIZED.to_string()]
        );
    }

    #[test]
    fn series_set_serializes() {
        let (readings, batches) = lavender();
        let set = build_retained_series(&readings, &batches, &SeriesFilter::default()).unwrap();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["x_max"], 10);
        assert_eq!(json["series"][0]["label"], "Lavender – Bar");
        assert_eq!(json["series"][0]["points"][2]["day"], 7);
    }
}
