//! Subcommand handlers. Each reads a fresh snapshot from the store.

use anyhow::{Context, bail};
use chrono::NaiveDate;
use curelog_core::{
    SeriesError, SeriesFilter, SoapKey, TypeFilter, WeightHistory, available_types,
    build_retained_series, last_reading, soaps_by_recent_activity,
};
use curelog_store::{NewSoap, SoapLedger, TabularStore};
use tracing::info;

use crate::display;

/// Outcome of `overview`, kept separate from printing for tests.
#[derive(Debug)]
pub enum Overview {
    Chart(curelog_core::SeriesSet),
    NoData,
    NoMatch,
}

pub fn overview_data<S: TabularStore>(
    ledger: &SoapLedger<S>,
    filter: &SeriesFilter,
) -> anyhow::Result<Overview> {
    let snap = ledger.snapshot().context("reading sheets")?;
    Ok(
        match build_retained_series(&snap.readings, &snap.batches, filter) {
            Ok(set) => Overview::Chart(set),
            Err(SeriesError::NoData) => Overview::NoData,
            Err(SeriesError::NoMatch) => Overview::NoMatch,
        },
    )
}

/// Filter for the overview; the search text is matched as typed.
pub fn overview_filter(soap_type: &str, search: &str) -> SeriesFilter {
    SeriesFilter::new(TypeFilter::from_selector(soap_type), search)
}

pub fn overview<S: TabularStore>(
    ledger: &SoapLedger<S>,
    soap_type: &str,
    search: &str,
    json: bool,
) -> anyhow::Result<()> {
    let filter = overview_filter(soap_type, search);
    info!(?filter, "building overview");
    match overview_data(ledger, &filter)? {
        Overview::Chart(set) if json => println!("{}", serde_json::to_string_pretty(&set)?),
        Overview::Chart(set) => display::print_retained_chart(&set),
        Overview::NoData => println!("No readings or batch info available."),
        Overview::NoMatch => println!("No data matches your filters."),
    }
    Ok(())
}

pub fn types<S: TabularStore>(ledger: &SoapLedger<S>) -> anyhow::Result<()> {
    let snap = ledger.snapshot().context("reading sheets")?;
    println!("{}", curelog_core::filter::ALL_TYPES);
    for t in available_types(&snap.readings, &snap.batches) {
        println!("{t}");
    }
    Ok(())
}

pub fn show<S: TabularStore>(
    ledger: &SoapLedger<S>,
    name: Option<&str>,
    batch: &str,
) -> anyhow::Result<()> {
    let Some(name) = name else {
        return list_soaps(ledger);
    };
    let key = SoapKey::new(name, batch);
    let record = ledger
        .find_batch(&key)?
        .with_context(|| format!("could not find soap batch data for {key}"))?;
    let readings = ledger.readings_for(&key)?;

    display::print_soap_card(&record);
    println!("Daily Weights");
    display::print_readings_table(&readings)?;
    println!();
    match WeightHistory::build(&key, &readings) {
        Some(history) => display::print_history_chart(&history),
        None => println!("No readable weights recorded yet."),
    }
    Ok(())
}

fn list_soaps<S: TabularStore>(ledger: &SoapLedger<S>) -> anyhow::Result<()> {
    let snap = ledger.snapshot().context("reading sheets")?;
    if snap.batches.is_empty() {
        println!("No soaps in your database yet.");
        return Ok(());
    }
    for (key, last) in soaps_by_recent_activity(&snap.readings) {
        println!("  {:<40} last reading {}", key.to_string(), last);
    }
    Ok(())
}

pub fn create<S: TabularStore>(ledger: &mut SoapLedger<S>, soap: NewSoap) -> anyhow::Result<()> {
    let record = ledger.create_soap(soap).context("creating soap")?;
    println!("Soap batch {} created and first reading added.", record.key);
    Ok(())
}

pub fn add_reading<S: TabularStore>(
    ledger: &mut SoapLedger<S>,
    key: &SoapKey,
    date: NaiveDate,
    weight_g: f64,
) -> anyhow::Result<()> {
    let readings = ledger.readings_for(key)?;
    match last_reading(key, &readings).and_then(|r| r.valid()) {
        Some((last_date, last_weight)) => println!(
            "Last recorded weight: {last_weight:.1} g on {}",
            last_date.format("%Y-%m-%d")
        ),
        None => println!("No previous readings found."),
    }
    ledger
        .add_reading(key, date, weight_g)
        .with_context(|| format!("adding reading for {key}"))?;
    println!("Reading added.");
    Ok(())
}

pub fn delete<S: TabularStore>(
    ledger: &mut SoapLedger<S>,
    key: &SoapKey,
    confirmed: bool,
) -> anyhow::Result<()> {
    if !confirmed {
        bail!("refusing to delete {key} and all its readings without --yes");
    }
    let removed = ledger
        .delete_soap(key)
        .with_context(|| format!("deleting {key}"))?;
    println!(
        "Deleted {key}: {} batch row(s), {} reading(s).",
        removed.batches, removed.readings
    );
    Ok(())
}
