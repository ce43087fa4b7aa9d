//! Human-readable output: soap cards, reading tables, and chart wiring.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use curelog_core::cells::format_date;
use curelog_core::{BatchRecord, SeriesSet, SurfaceArea, WeightHistory, WeightReading};

use crate::chart::{self, Chart, Line};

pub const CHART_WIDTH: usize = 60;
pub const CHART_HEIGHT: usize = 16;

// ── Soap card ──

/// Print a batch record as a vertical card.
pub fn print_soap_card(record: &BatchRecord) {
    println!("=== {} ===", record.key);
    println!();

    println!("Identity");
    field("soap name", &record.key.soap_name);
    field("batch", or_dash(&record.key.batch_number));
    field("type", record.resolved_type());
    field("notes", or_dash(&record.notes));
    println!();

    println!("Dimensions");
    field(
        "size (h x w x t)",
        &format!(
            "{} x {} x {} mm",
            opt(record.height_mm),
            opt(record.width_mm),
            opt(record.thickness_mm)
        ),
    );
    let area = match record.surface_area() {
        Some(SurfaceArea::Stored(v)) => format!("{v} mm³"),
        Some(SurfaceArea::Calculated(v)) => format!("{v:.0} mm³ (calculated)"),
        None => "unknown".to_string(),
    };
    field("surface area", &area);
    println!();

    println!("Baseline");
    field(
        "initial weight",
        &record
            .initial_weight_g
            .map(|w| format!("{w} g"))
            .unwrap_or_else(|| "-".into()),
    );
    field(
        "initial date",
        &record
            .initial_date
            .map(format_date)
            .unwrap_or_else(|| "-".into()),
    );
    println!();
}

fn field(name: &str, value: &str) {
    println!("  {:<26} {}", name, value);
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

fn opt(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "?".into())
}

// ── Readings table ──

/// Readings as a two-column batch (`date`, `weight_g`), sorted by date with
/// unreadable dates last.
pub fn readings_batch(readings: &[WeightReading]) -> anyhow::Result<RecordBatch> {
    let mut sorted: Vec<&WeightReading> = readings.iter().collect();
    sorted.sort_by_key(|r| (r.date.is_none(), r.date));

    let dates: Vec<Option<String>> = sorted.iter().map(|r| r.date.map(format_date)).collect();
    let weights: Vec<Option<f64>> = sorted.iter().map(|r| r.weight_g).collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("date", DataType::Utf8, true),
        Field::new("weight_g", DataType::Float64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(dates)),
        Arc::new(Float64Array::from(weights)),
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}

pub fn print_readings_table(readings: &[WeightReading]) -> anyhow::Result<()> {
    let batch = readings_batch(readings)?;
    println!("{}", pretty_format_batches(&[batch])?);
    Ok(())
}

// ── Charts ──

/// One chart line per retained series, with the tolerance band.
pub fn retained_lines(set: &SeriesSet) -> Vec<Line> {
    set.series
        .iter()
        .map(|s| Line {
            label: format!("{} (±{:.2}%)", s.label, s.tolerance() * 100.0),
            points: s
                .points
                .iter()
                .map(|p| (p.day as f64, p.retained, p.band))
                .collect(),
        })
        .collect()
}

pub fn print_retained_chart(set: &SeriesSet) {
    let lines = retained_lines(set);
    let chart = Chart {
        width: CHART_WIDTH,
        height: CHART_HEIGHT,
        x_range: (0.0, set.x_max as f64),
        y_range: (set.y_min, curelog_core::series::Y_MAX),
        y_format: chart::percent,
    };
    println!("Soap Retained Weight Over Time");
    println!();
    println!("{}", chart.render(&lines));
    println!("{:>10}Days Since Baseline", "");
    println!();
    println!("{}", chart::legend(&lines));
}

pub fn print_history_chart(history: &WeightHistory) {
    let line = Line {
        label: "Weight (g)".into(),
        points: history
            .points
            .iter()
            .map(|p| (p.day as f64, p.weight_g, 0.0))
            .collect(),
    };
    let chart = Chart {
        width: CHART_WIDTH,
        height: CHART_HEIGHT,
        x_range: (0.0, history.x_max as f64),
        y_range: (history.y_floor, history.y_max()),
        y_format: chart::grams,
    };
    println!("Weight Loss Over Time");
    println!();
    println!("{}", chart.render(std::slice::from_ref(&line)));
    println!("{:>10}Days Since Baseline", "");
}
